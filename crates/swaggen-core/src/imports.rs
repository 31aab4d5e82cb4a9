//! Cross-fragment import resolution.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::domain::DomainMap;
use crate::schema::types::{schema_ident, type_ident};
use crate::schema::RefTarget;
use crate::utils::sanitize_identifier;

/// One imported identifier and the module it comes from
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ImportSpec {
    pub name: String,
    pub path: String,
}

/// Imports sharing a module, as rendered on one `import` line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportLine {
    pub path: String,
    pub names: Vec<String>,
}

/// Where the importing fragment lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin<'a> {
    /// A model file under `models/<domain>/`
    Model(&'a str),
    /// Any other fragment, `depth` directories below the output root
    Artifact { depth: usize },
}

/// Which identifier of a referenced type is imported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// The zod schema constant
    Schema,
    /// The TypeScript type
    Type,
}

/// Module path of model `to_name` in domain `to_domain`, seen from `from`.
///
/// Same-domain model imports stay relative to the directory. Everything
/// else is either parent-relative or, with an alias root, absolute.
pub fn module_path(from: Origin<'_>, to_domain: &str, to_name: &str, alias_root: Option<&str>) -> String {
    let file = sanitize_identifier(to_name);
    match (from, alias_root) {
        (Origin::Model(domain), _) if domain == to_domain => format!("./{}", file),
        (_, Some(root)) => format!("{}/models/{}/{}", root.trim_end_matches('/'), to_domain, file),
        (Origin::Model(_), None) => format!("../{}/{}", to_domain, file),
        (Origin::Artifact { depth }, None) => {
            format!("{}models/{}/{}", parent_prefix(depth), to_domain, file)
        }
    }
}

/// Path from a fragment at `depth` to another artifact's module, given
/// relative to the output root without extension.
pub fn artifact_path(depth: usize, target: &str, alias_root: Option<&str>) -> String {
    match alias_root {
        Some(root) => format!("{}/{}", root.trim_end_matches('/'), target),
        None => format!("{}{}", parent_prefix(depth), target),
    }
}

fn parent_prefix(depth: usize) -> String {
    if depth == 0 {
        "./".to_string()
    } else {
        "../".repeat(depth)
    }
}

/// Resolves model references to import specs for one fragment.
pub struct ImportResolver<'a> {
    domains: &'a DomainMap,
    alias_root: Option<&'a str>,
}

impl<'a> ImportResolver<'a> {
    pub fn new(domains: &'a DomainMap, alias_root: Option<&'a str>) -> Self {
        Self {
            domains,
            alias_root,
        }
    }

    pub fn alias_root(&self) -> Option<&'a str> {
        self.alias_root
    }

    /// Import specs for every resolved reference, deduplicated on
    /// (identifier, path).
    pub fn resolve<'r, I>(&self, from: Origin<'_>, references: I, binding: Binding) -> BTreeSet<ImportSpec>
    where
        I: IntoIterator<Item = &'r (String, RefTarget)>,
    {
        references
            .into_iter()
            .filter_map(|(name, target)| {
                let ident = match binding {
                    Binding::Schema if *target != RefTarget::Unresolved => Some(schema_ident(name)),
                    Binding::Schema => None,
                    Binding::Type => type_ident(name, *target),
                }?;
                let domain = self.domains.type_domain(name);
                Some(ImportSpec {
                    name: ident,
                    path: module_path(from, domain, name, self.alias_root),
                })
            })
            .collect()
    }

    pub fn artifact(&self, depth: usize, target: &str) -> String {
        artifact_path(depth, target, self.alias_root)
    }
}

/// Group import specs by module path, both levels sorted
pub fn group_lines<'s>(specs: impl IntoIterator<Item = &'s ImportSpec>) -> Vec<ImportLine> {
    let mut by_path: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for spec in specs {
        by_path.entry(&spec.path).or_default().insert(&spec.name);
    }
    by_path
        .into_iter()
        .map(|(path, names)| ImportLine {
            path: path.to_string(),
            names: names.into_iter().map(String::from).collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_domain_patterns;
    use crate::domain::{classify, NamePatterns};
    use crate::openapi::OpenApiContext;
    use serde_json::json;

    fn domains() -> DomainMap {
        let spec = OpenApiContext::new(json!({
            "components": { "schemas": {
                "Lead": { "type": "object", "properties": { "branch": { "$ref": "#/components/schemas/Branch" } } },
                "Branch": { "type": "object", "properties": { "id": { "type": "integer" } } }
            }},
            "paths": {
                "/api/leads": { "get": { "tags": ["Leads"], "responses": {
                    "200": { "description": "ok", "content": { "application/json": {
                        "schema": { "$ref": "#/components/schemas/Lead" } } } }
                }}},
                "/api/branches": { "get": { "tags": ["Branches"], "responses": {
                    "200": { "description": "ok", "content": { "application/json": {
                        "schema": { "$ref": "#/components/schemas/Branch" } } } }
                }}}
            }
        }))
        .normalize();
        let patterns = NamePatterns::compile(&default_domain_patterns()).expect("patterns");
        classify(&spec.type_definitions, &spec.routes, &patterns, "api").domains
    }

    #[test]
    fn test_module_paths() {
        assert_eq!(module_path(Origin::Model("leads"), "leads", "Lead", None), "./Lead");
        assert_eq!(module_path(Origin::Model("leads"), "branches", "Branch", None), "../branches/Branch");
        assert_eq!(
            module_path(Origin::Model("leads"), "branches", "Branch", Some("@/api")),
            "@/api/models/branches/Branch"
        );
        assert_eq!(
            module_path(Origin::Artifact { depth: 2 }, "leads", "Lead", None),
            "../../models/leads/Lead"
        );
        assert_eq!(
            module_path(Origin::Artifact { depth: 1 }, "leads", "Lead", Some("@/api/")),
            "@/api/models/leads/Lead"
        );
        assert_eq!(artifact_path(0, "slices/LeadSlice", None), "./slices/LeadSlice");
    }

    #[test]
    fn test_resolve_uses_domains() {
        let domains = domains();
        let resolver = ImportResolver::new(&domains, None);
        let refs = vec![
            ("Branch".to_string(), RefTarget::Model),
            ("Ghost".to_string(), RefTarget::Unresolved),
        ];
        let imports = resolver.resolve(Origin::Model("leads"), &refs, Binding::Schema);
        assert_eq!(
            imports.into_iter().collect::<Vec<_>>(),
            vec![ImportSpec {
                name: "BranchSchema".into(),
                path: "../branches/Branch".into()
            }]
        );

        let types = resolver.resolve(Origin::Artifact { depth: 2 }, &refs, Binding::Type);
        assert_eq!(types.len(), 1);
        assert!(types.contains(&ImportSpec {
            name: "IBranchSerializer".into(),
            path: "../../models/branches/Branch".into()
        }));
    }

    #[test]
    fn test_dedup_on_name_and_path() {
        let specs = [
            ImportSpec { name: "IUserSerializer".into(), path: "../a/User".into() },
            ImportSpec { name: "IUserSerializer".into(), path: "../b/User".into() },
            ImportSpec { name: "IUserSerializer".into(), path: "../a/User".into() },
        ];
        let set: BTreeSet<ImportSpec> = specs.iter().cloned().collect();
        assert_eq!(set.len(), 2);

        let lines = group_lines(&set);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].path, "../a/User");
    }
}
