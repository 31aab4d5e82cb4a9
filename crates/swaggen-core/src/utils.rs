//! String transformation utilities for code generation

const HTTP_VERBS: [&str; 5] = ["get", "post", "put", "patch", "delete"];

/// Split an identifier-ish string into lowercase words.
///
/// Separators are any non-alphanumeric characters. Case changes start a new
/// word, and a run of capitals followed by a lowercase letter keeps its last
/// capital for the next word (`getHTTPResponse` -> `get`, `http`, `response`).
pub fn split_words(s: &str) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &ch) in chars.iter().enumerate() {
        if !ch.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if ch.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|c| c.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower)
            {
                words.push(std::mem::take(&mut current));
            }
        }
        current.extend(ch.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

/// Convert a string to snake_case
pub fn to_snake_case(s: &str) -> String {
    split_words(s).join("_")
}

/// Convert a string to UpperCamelCase (PascalCase)
pub fn to_upper_camel_case(s: &str) -> String {
    split_words(s).iter().map(|w| capitalize(w)).collect()
}

/// Convert a string to lowerCamelCase
pub fn to_lower_camel_case(s: &str) -> String {
    let words = split_words(s);
    let mut out = String::new();
    for (i, word) in words.iter().enumerate() {
        if i == 0 {
            out.push_str(word);
        } else {
            out.push_str(&capitalize(word));
        }
    }
    out
}

/// Upper-case the first character only, leaving the rest untouched
pub fn upper_first(s: &str) -> String {
    capitalize(s)
}

/// Normalize a tag into a domain name: lowercase, runs of non-alphanumerics
/// become a single `-`, no leading or trailing `-`.
pub fn normalize_tag(tag: &str) -> String {
    let mut out = String::with_capacity(tag.len());
    let mut pending_dash = false;
    for ch in tag.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.extend(ch.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    out
}

/// Make a declared schema name safe to use as a TypeScript identifier
pub fn sanitize_identifier(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if out.chars().next().map_or(true, |c| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// File-name form of a group key: every non-word character becomes `_`
pub fn file_stem(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Non-empty `/`-separated segments of a path
pub fn path_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// If `segment` is a `{param}` placeholder, return the bare param name
pub fn path_param_name(segment: &str) -> Option<&str> {
    segment
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .filter(|s| !s.is_empty())
}

/// Collapse a schema name mangled with the API base path.
///
/// Names like `Body_upload_photo_api_v1_projects_photos_post` become
/// `Body_upload_photo_post`: the base path and the resource segments between
/// it and the trailing HTTP verb are dropped. Without a verb the name becomes
/// `<prefix>_<suffix>`. Names without the base path are returned unchanged.
pub fn strip_api_base_path(name: &str, base_path: &str) -> String {
    let base = base_path.trim_matches('/');
    if base.is_empty() {
        return name.to_string();
    }
    // ASCII folding keeps byte offsets valid for slicing `name`
    let marker = format!("_{}_", base.replace('/', "_")).to_ascii_lowercase();
    let lowered = name.to_ascii_lowercase();

    let Some(start) = lowered.find(&marker) else {
        return name.to_string();
    };
    // only a single occurrence splits cleanly
    if lowered[start + marker.len()..].contains(&marker) {
        return name.to_string();
    }
    let prefix = &name[..start];
    let suffix = &name[start + marker.len()..];

    let parts: Vec<&str> = suffix.split('_').collect();
    let verb_index = parts
        .iter()
        .rposition(|p| HTTP_VERBS.contains(&p.to_lowercase().as_str()));

    match verb_index {
        Some(i) if i > 0 => format!("{}_{}", prefix, parts[i..].join("_")),
        _ => format!("{}_{}", prefix, suffix),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_words() {
        assert_eq!(split_words("getHTTPResponse"), vec!["get", "http", "response"]);
        assert_eq!(split_words("lead_id"), vec!["lead", "id"]);
        assert_eq!(split_words("List all  leads!"), vec!["list", "all", "leads"]);
        assert!(split_words("__").is_empty());
    }

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("findPetsByStatus"), "find_pets_by_status");
        assert_eq!(to_snake_case("find-pets-by-status"), "find_pets_by_status");
        assert_eq!(to_snake_case("HTTPResponse"), "http_response");
    }

    #[test]
    fn test_to_upper_camel_case() {
        assert_eq!(to_upper_camel_case("lead_id"), "LeadId");
        assert_eq!(to_upper_camel_case("LeadUpdate"), "LeadUpdate");
        assert_eq!(to_upper_camel_case("FIND_PETS"), "FindPets");
        assert_eq!(to_upper_camel_case("v1"), "V1");
    }

    #[test]
    fn test_to_lower_camel_case() {
        assert_eq!(to_lower_camel_case("List all leads"), "listAllLeads");
        assert_eq!(to_lower_camel_case("Create-Widget"), "createWidget");
        assert_eq!(to_lower_camel_case(""), "");
    }

    #[test]
    fn test_normalize_tag() {
        assert_eq!(normalize_tag("Lead Management"), "lead-management");
        assert_eq!(normalize_tag("  --Users__ "), "users");
        assert_eq!(normalize_tag("A & B"), "a-b");
    }

    #[test]
    fn test_path_helpers() {
        let segs: Vec<_> = path_segments("/api/widgets/{id}/").collect();
        assert_eq!(segs, vec!["api", "widgets", "{id}"]);
        assert_eq!(path_param_name("{id}"), Some("id"));
        assert_eq!(path_param_name("widgets"), None);
        assert_eq!(path_param_name("{}"), None);
    }

    #[test]
    fn test_sanitize_identifier() {
        assert_eq!(sanitize_identifier("Lead.Out"), "Lead_Out");
        assert_eq!(sanitize_identifier("1Thing"), "_1Thing");
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("user.profiles"), "user_profiles");
        assert_eq!(file_stem("v2-items"), "v2_items");
        assert_eq!(file_stem("leads"), "leads");
    }

    #[test]
    fn test_strip_api_base_path() {
        assert_eq!(
            strip_api_base_path("Body_upload_project_photo_api_v1_project_photos__post", "api/v1"),
            "Body_upload_project_photo_post"
        );
        assert_eq!(
            strip_api_base_path("Body_login_api_auth_token", "api"),
            "Body_login_auth_token"
        );
        assert_eq!(strip_api_base_path("LeadOut", "api"), "LeadOut");
        assert_eq!(strip_api_base_path("LeadOut", ""), "LeadOut");
    }

    #[test]
    fn test_strip_api_base_path_non_ascii() {
        // U+212A KELVIN SIGN lowercases to a one-byte `k`
        assert_eq!(strip_api_base_path("\u{212A}_api_x", "api"), "\u{212A}_x");
        assert_eq!(
            strip_api_base_path("\u{130}nfo_api_items_get", "api"),
            "\u{130}nfo_get"
        );
        assert_eq!(strip_api_base_path("\u{212A}elvin", "api"), "\u{212A}elvin");
    }
}
