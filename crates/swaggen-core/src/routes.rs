//! Route grouping and endpoint naming.
//!
//! Routes are bucketed by the path segment right after the API base path,
//! and every (path, verb) pair inside a bucket gets a stable identifier.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Serialize;

use crate::openapi::{HttpMethod, Operation, ParamLocation, Route};
use crate::utils::{path_param_name, path_segments, to_lower_camel_case, to_upper_camel_case};

/// Bucket for paths too short to have a group segment
pub const FALLBACK_GROUP: &str = "api";

/// Query parameters that mark a paginated list endpoint
pub const LIST_MARKERS: [&str; 5] = ["limit", "page", "page_size", "offset", "cursor"];

/// One operation's identity inside a group
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EndpointKey {
    pub path: String,
    pub method: HttpMethod,
}

impl EndpointKey {
    pub fn new(path: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            path: path.into(),
            method,
        }
    }
}

/// Operations sharing a group segment, keyed by (path, verb)
#[derive(Debug, Clone, PartialEq)]
pub struct RouteGroup {
    pub key: String,
    pub entries: IndexMap<EndpointKey, Operation>,
}

pub type RouteGroups = IndexMap<String, RouteGroup>;

/// The grouping segment of `path`: segment `1 + depth` of the `/`-split path
pub fn group_key(path: &str, depth: usize) -> String {
    path.split('/')
        .nth(1 + depth)
        .map(|segment| path_param_name(segment).unwrap_or(segment))
        .filter(|segment| !segment.is_empty())
        .unwrap_or(FALLBACK_GROUP)
        .to_string()
}

/// Group routes by their grouping segment, preserving declaration order.
pub fn group(routes: &[Route], depth: usize) -> RouteGroups {
    let mut groups = RouteGroups::new();
    for route in routes {
        let key = group_key(&route.path, depth);
        let group = groups.entry(key.clone()).or_insert_with(|| RouteGroup {
            key,
            entries: IndexMap::new(),
        });
        for (method, operation) in &route.operations {
            group
                .entries
                .insert(EndpointKey::new(route.path.clone(), *method), operation.clone());
        }
    }
    log::info!("Grouped {} routes into {} groups", routes.len(), groups.len());
    groups
}

/// Path segments after the API base path
pub fn relative_segments<'p>(path: &'p str, base_path: &str) -> Vec<&'p str> {
    let segments: Vec<&str> = path_segments(path).collect();
    let base: Vec<&str> = path_segments(base_path).collect();
    if !base.is_empty() && segments.len() >= base.len() && segments[..base.len()] == base[..] {
        segments[base.len()..].to_vec()
    } else {
        segments
    }
}

/// `/api/leads/{id}` to `/api/leads/${id}`
pub fn url_template(path: &str) -> String {
    path.replace('{', "${")
}

/// Everything the namer looks at
#[derive(Debug, Clone)]
pub struct NamingInput<'a> {
    pub path: &'a str,
    pub method: HttpMethod,
    pub summary: Option<&'a str>,
    pub query_params: Vec<&'a str>,
    pub path_params: Vec<&'a str>,
    pub base_path: &'a str,
}

impl<'a> NamingInput<'a> {
    pub fn from_operation(
        key: &'a EndpointKey,
        operation: &'a Operation,
        base_path: &'a str,
    ) -> Self {
        Self {
            path: &key.path,
            method: key.method,
            summary: operation.summary.as_deref(),
            query_params: operation
                .params_in(ParamLocation::Query)
                .map(|p| p.name.as_str())
                .collect(),
            path_params: operation
                .params_in(ParamLocation::Path)
                .map(|p| p.name.as_str())
                .collect(),
            base_path,
        }
    }

    /// Paginated query parameters or a literal `list` segment
    pub fn is_list(&self) -> bool {
        self.method == HttpMethod::Get
            && (self.query_params.iter().any(|q| LIST_MARKERS.contains(q))
                || relative_segments(self.path, self.base_path)
                    .iter()
                    .any(|s| s.eq_ignore_ascii_case("list")))
    }
}

/// Derive an endpoint identifier.
///
/// First match wins: the summary, camel-cased; otherwise a name built from
/// the operation's shape (list, single-resource GET, mutation, plain path).
/// The verb is always appended, so two verbs on one path never collide.
pub fn name_endpoint(input: &NamingInput<'_>) -> String {
    let from_summary = input.summary.map(to_lower_camel_case).filter(|s| !s.is_empty());
    let base = from_summary
        .or_else(|| shape_name(input))
        .unwrap_or_else(|| "endpoint".to_string());
    format!("{}{}", base, input.method.suffix())
}

fn shape_name(input: &NamingInput<'_>) -> Option<String> {
    let segments = relative_segments(input.path, input.base_path);
    let literals: Vec<&str> = segments
        .iter()
        .copied()
        .filter(|s| path_param_name(s).is_none())
        .collect();
    let resource = to_upper_camel_case(literals.first().copied().unwrap_or_default());
    let has_path_params = segments.iter().any(|s| path_param_name(s).is_some())
        || !input.path_params.is_empty();

    let name = if input.is_list() {
        format!("list{}", resource)
    } else if input.method == HttpMethod::Get && has_path_params {
        let composed: String = segments
            .iter()
            .map(|s| to_upper_camel_case(path_param_name(s).unwrap_or(s)))
            .collect();
        format!("get{}", composed)
    } else if input.method.is_mutation() {
        mutation_name(input, &segments, &literals, &resource)
    } else {
        plain_name(&literals)
    };

    (!name.is_empty()).then_some(name)
}

/// Literal segments joined as lowerCamel: `/users/me` gives `usersMe`
fn plain_name(literals: &[&str]) -> String {
    to_lower_camel_case(&literals.join("_"))
}

fn mutation_name(
    input: &NamingInput<'_>,
    segments: &[&str],
    literals: &[&str],
    resource: &str,
) -> String {
    let params: String = segments
        .iter()
        .filter_map(|s| path_param_name(s))
        .map(to_upper_camel_case)
        .collect();

    // `/transactions/{id}/void` names the action `void`
    if let [_, .., last] = literals {
        if !last.starts_with(|c: char| c.is_ascii_digit()) {
            return format!("{}{}{}", to_lower_camel_case(last), resource, params);
        }
    }
    match input.method {
        HttpMethod::Post if literals.len() == 1 => format!("insert{}", resource),
        HttpMethod::Put | HttpMethod::Patch => format!("update{}{}", resource, params),
        HttpMethod::Delete => format!("delete{}{}", resource, params),
        _ => plain_name(literals),
    }
}

/// Name every endpoint of a group; residual clashes get `2`, `3`, ... in
/// (path, verb) order.
pub fn assign_names(group: &RouteGroup, base_path: &str) -> IndexMap<EndpointKey, String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut names = IndexMap::new();
    for (key, operation) in &group.entries {
        let name = name_endpoint(&NamingInput::from_operation(key, operation, base_path));
        let count = seen.entry(name.clone()).or_insert(0);
        *count += 1;
        let unique = if *count == 1 {
            name
        } else {
            log::debug!("{} {}: name {} already used in group {}", key.method, key.path, name, group.key);
            format!("{}{}", name, count)
        };
        names.insert(key.clone(), unique);
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openapi::OpenApiContext;
    use serde_json::json;

    fn input<'a>(path: &'a str, method: HttpMethod, query: Vec<&'a str>) -> NamingInput<'a> {
        let path_params = path_segments(path).filter_map(path_param_name).collect();
        NamingInput {
            path,
            method,
            summary: None,
            query_params: query,
            path_params,
            base_path: "api",
        }
    }

    #[test]
    fn test_group_key() {
        assert_eq!(group_key("/api/leads/{id}", 1), "leads");
        assert_eq!(group_key("/api/v1/leads", 2), "leads");
        assert_eq!(group_key("/api", 1), FALLBACK_GROUP);
        assert_eq!(group_key("/api/", 1), FALLBACK_GROUP);
        assert_eq!(group_key("/{tenant}/users", 0), "tenant");
    }

    #[test]
    fn test_group_keeps_every_verb() {
        let spec = OpenApiContext::new(json!({
            "paths": {
                "/api/widgets/{id}": {
                    "get": { "responses": {} },
                    "patch": { "responses": {} }
                },
                "/api/widgets": { "get": { "responses": {} } }
            }
        }));
        let groups = group(&spec.normalize().routes, 1);
        let widgets = &groups["widgets"];
        assert_eq!(widgets.entries.len(), 3);
        assert!(widgets.entries.contains_key(&EndpointKey::new("/api/widgets/{id}", HttpMethod::Get)));
        assert!(widgets.entries.contains_key(&EndpointKey::new("/api/widgets/{id}", HttpMethod::Patch)));
    }

    #[test]
    fn test_list_detection_and_naming() {
        let leads = input("/api/leads", HttpMethod::Get, vec!["limit", "page"]);
        assert!(leads.is_list());
        assert_eq!(name_endpoint(&leads), "listLeadsGet");

        let explicit = input("/api/leads/list", HttpMethod::Get, vec![]);
        assert!(explicit.is_list());

        let create = input("/api/leads", HttpMethod::Post, vec!["limit"]);
        assert!(!create.is_list());
    }

    #[test]
    fn test_single_resource_get() {
        let get = input("/api/users/{username}", HttpMethod::Get, vec![]);
        assert_eq!(name_endpoint(&get), "getUsersUsernameGet");
        let nested = input("/api/leads/{lead_id}/notes", HttpMethod::Get, vec![]);
        assert_eq!(name_endpoint(&nested), "getLeadsLeadIdNotesGet");
        let me = input("/api/users/me", HttpMethod::Get, vec![]);
        assert!(!me.is_list());
        assert_eq!(name_endpoint(&me), "usersMeGet");
    }

    #[test]
    fn test_plain_collection_get() {
        let leads = input("/api/leads", HttpMethod::Get, vec![]);
        assert!(!leads.is_list());
        assert_eq!(name_endpoint(&leads), "leadsGet");

        let filtered = input("/api/pet/findByStatus", HttpMethod::Get, vec!["status"]);
        assert!(!filtered.is_list());
        assert_eq!(name_endpoint(&filtered), "petFindByStatusGet");

        let root = input("/api", HttpMethod::Get, vec![]);
        assert_eq!(name_endpoint(&root), "endpointGet");
    }

    #[test]
    fn test_mutation_names() {
        assert_eq!(
            name_endpoint(&input("/api/leads", HttpMethod::Post, vec![])),
            "insertLeadsPost"
        );
        assert_eq!(
            name_endpoint(&input("/api/leads/{lead_id}", HttpMethod::Patch, vec![])),
            "updateLeadsLeadIdPatch"
        );
        assert_eq!(
            name_endpoint(&input("/api/leads/{lead_id}", HttpMethod::Delete, vec![])),
            "deleteLeadsLeadIdDelete"
        );
        assert_eq!(
            name_endpoint(&input("/api/transactions/{id}/void", HttpMethod::Post, vec![])),
            "voidTransactionsIdPost"
        );
        assert_eq!(
            name_endpoint(&input("/api/users/{username}/change-password", HttpMethod::Put, vec![])),
            "changePasswordUsersUsernamePut"
        );
    }

    #[test]
    fn test_summary_and_verb_uniqueness() {
        let mut get = input("/api/widgets/{id}", HttpMethod::Get, vec![]);
        let patch = input("/api/widgets/{id}", HttpMethod::Patch, vec![]);
        assert_ne!(name_endpoint(&get), name_endpoint(&patch));

        get.summary = Some("Fetch one widget");
        assert_eq!(name_endpoint(&get), "fetchOneWidgetGet");
        get.summary = Some("!!!");
        assert_eq!(name_endpoint(&get), "getWidgetsIdGet");
    }

    #[test]
    fn test_assign_names_deduplicates() {
        let spec = OpenApiContext::new(json!({
            "paths": {
                "/api/reports/a": { "get": { "summary": "Run report", "responses": {} } },
                "/api/reports/b": { "get": { "summary": "Run report", "responses": {} } }
            }
        }));
        let groups = group(&spec.normalize().routes, 1);
        let names: Vec<String> = assign_names(&groups["reports"], "api").into_values().collect();
        assert_eq!(names, vec!["runReportGet".to_string(), "runReportGet2".to_string()]);
    }

    #[test]
    fn test_relative_segments_and_url_template() {
        assert_eq!(relative_segments("/api/v1/leads", "api/v1"), vec!["leads"]);
        assert_eq!(relative_segments("/health", "api"), vec!["health"]);
        assert_eq!(url_template("/api/leads/{lead_id}"), "/api/leads/${lead_id}");
    }
}
