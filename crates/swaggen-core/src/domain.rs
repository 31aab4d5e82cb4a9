//! Domain classification of declared types and routes.
//!
//! Every type name ends up in exactly one domain. Classification runs three
//! passes over the declared types:
//!
//! 1. direct: the first tag of the first operation mentioning the type, else
//!    the first matching name pattern;
//! 2. wrappers: pagination, array, and data envelopes inherit the domain of
//!    the type they wrap unless an operation tags them directly;
//! 3. closure: still-uncategorized types adopt the domain of a categorized
//!    type that references them, for a bounded number of rounds.
//!
//! Anything left over lands in [`UNCATEGORIZED`].

use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value as JsonValue;

use crate::config::DomainPattern;
use crate::error::Warning;
use crate::openapi::{collect_refs, schema_ref, Route};
use crate::utils::{normalize_tag, split_words, strip_api_base_path, to_upper_camel_case};

pub const UNCATEGORIZED: &str = "uncategorized";

/// Upper bound on closure rounds
pub const MAX_CLOSURE_ROUNDS: usize = 5;

/// Ordered name heuristics, compiled
#[derive(Debug, Clone, Default)]
pub struct NamePatterns(Vec<(Regex, String)>);

impl NamePatterns {
    pub fn compile(patterns: &[DomainPattern]) -> crate::Result<Self> {
        patterns
            .iter()
            .map(|p| -> crate::Result<(Regex, String)> { Ok((p.compile()?, p.domain.clone())) })
            .collect::<crate::Result<Vec<_>>>()
            .map(Self)
    }

    /// Domain of the first pattern matching `name`
    pub fn domain_for(&self, name: &str) -> Option<String> {
        self.0.iter().find_map(|(regex, template)| {
            let captures = regex.captures(name)?;
            let mut expanded = String::new();
            captures.expand(template, &mut expanded);
            let domain = normalize_tag(&split_words(&expanded).join(" "));
            (!domain.is_empty()).then_some(domain)
        })
    }
}

/// Domain assignments for types and routes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DomainMap {
    types: IndexMap<String, String>,
    /// Cleaned spellings of type names (see [`strip_api_base_path`])
    aliases: IndexMap<String, String>,
    routes: IndexMap<String, String>,
}

impl DomainMap {
    /// Domain of a type, looked up by declared name or cleaned alias
    pub fn type_domain(&self, name: &str) -> &str {
        self.types
            .get(name)
            .or_else(|| self.aliases.get(name))
            .map(String::as_str)
            .unwrap_or(UNCATEGORIZED)
    }

    /// Domain of a route, from its first tag
    pub fn route_domain(&self, path: &str) -> &str {
        self.routes.get(path).map(String::as_str).unwrap_or(UNCATEGORIZED)
    }

    pub fn types(&self) -> impl Iterator<Item = (&str, &str)> {
        self.types.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of types per domain
    pub fn distribution(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for domain in self.types.values() {
            *counts.entry(domain.as_str()).or_insert(0) += 1;
        }
        counts
    }
}

/// Output of the classifier stage
#[derive(Debug, Clone, Default)]
pub struct Classification {
    pub domains: DomainMap,
    pub warnings: Vec<Warning>,
}

/// If `schema` only envelopes another type, the wrapped type's name.
///
/// Recognised shapes: `{properties: {results: {items: $ref}}}`,
/// `{items: $ref}` without properties, and `{properties: {data: {items: $ref}}}`.
pub fn wrapped_type(schema: &JsonValue) -> Option<&str> {
    let items_ref = |key: &str| {
        schema
            .get("properties")?
            .get(key)?
            .get("items")
            .and_then(schema_ref)
    };
    items_ref("results")
        .or_else(|| {
            if schema.get("properties").is_none() {
                schema.get("items").and_then(schema_ref)
            } else {
                None
            }
        })
        .or_else(|| items_ref("data"))
}

/// Whether `schema` names `name` directly: as itself, as array items, or as
/// an `anyOf`/`oneOf`/`allOf` member.
fn mentions(schema: &JsonValue, name: &str) -> bool {
    if schema_ref(schema) == Some(name) {
        return true;
    }
    if schema.get("items").and_then(schema_ref) == Some(name) {
        return true;
    }
    ["anyOf", "oneOf", "allOf"].iter().any(|key| {
        schema
            .get(*key)
            .and_then(JsonValue::as_array)
            .is_some_and(|options| options.iter().any(|o| schema_ref(o) == Some(name)))
    })
}

/// First normalized tag of the first operation mentioning each type, with
/// paths in declaration order and verbs in emission order.
fn direct_tags(names: &[&String], routes: &[Route]) -> HashMap<String, String> {
    let mut found = HashMap::new();
    for route in routes {
        for operation in route.operations.values() {
            let Some(tag) = operation.tags.first() else {
                continue;
            };
            for name in names {
                if found.contains_key(name.as_str()) {
                    continue;
                }
                if operation.schemas().any(|s| mentions(s, name)) {
                    found.insert((*name).clone(), normalize_tag(tag));
                }
            }
        }
    }
    found
}

/// Assign a domain to every declared type and every route.
pub fn classify(
    definitions: &IndexMap<String, JsonValue>,
    routes: &[Route],
    patterns: &NamePatterns,
    api_base_path: &str,
) -> Classification {
    let names: Vec<&String> = definitions.keys().collect();
    let tagged = direct_tags(&names, routes);
    let mut warnings = Vec::new();

    let mut assigned: IndexMap<String, String> = IndexMap::new();
    let mut wrappers = Vec::new();

    // pass 1: direct tag, then name pattern
    for (name, schema) in definitions {
        if let Some(wrapped) = wrapped_type(schema) {
            wrappers.push((name, wrapped));
            continue;
        }
        let domain = tagged
            .get(name)
            .cloned()
            .or_else(|| patterns.domain_for(name))
            .unwrap_or_else(|| UNCATEGORIZED.to_string());
        log::debug!("{} -> {}", name, domain);
        assigned.insert(name.clone(), domain);
    }

    // pass 2: wrappers
    for (name, wrapped) in wrappers {
        let domain = tagged.get(name).cloned().or_else(|| {
            let exact = assigned
                .get(wrapped)
                .filter(|d| d.as_str() != UNCATEGORIZED)
                .cloned();
            exact.or_else(|| {
                assigned
                    .iter()
                    .find(|(other, d)| d.as_str() != UNCATEGORIZED && other.ends_with(wrapped))
                    .map(|(_, d)| d.clone())
            })
        });
        let domain = domain.unwrap_or_else(|| {
            log::debug!("wrapper {} wraps uncategorized type {}", name, wrapped);
            UNCATEGORIZED.to_string()
        });
        log::debug!("{} -> {} (wrapper of {})", name, domain, wrapped);
        assigned.insert(name.clone(), domain);
    }

    // pass 3: closure over references
    let references: IndexMap<&String, _> = definitions
        .iter()
        .map(|(name, schema)| (name, collect_refs(schema)))
        .collect();
    let mut rounds = 0;
    loop {
        let pending: Vec<String> = names
            .iter()
            .filter(|n| assigned.get(n.as_str()).map(String::as_str) == Some(UNCATEGORIZED))
            .map(|n| (*n).clone())
            .collect();
        if pending.is_empty() || rounds == MAX_CLOSURE_ROUNDS {
            break;
        }
        rounds += 1;

        let mut progressed = false;
        for name in &pending {
            let adopted = references.iter().find_map(|(referencer, refs)| {
                let domain = assigned.get(referencer.as_str())?;
                (domain != UNCATEGORIZED && refs.contains(name)).then(|| domain.clone())
            });
            if let Some(domain) = adopted {
                log::debug!("{} -> {} (referenced)", name, domain);
                assigned.insert(name.clone(), domain);
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
    }

    let leftover: Vec<String> = names
        .iter()
        .filter(|n| assigned.get(n.as_str()).map(String::as_str) == Some(UNCATEGORIZED))
        .map(|n| (*n).clone())
        .collect();
    if !leftover.is_empty() {
        warnings.push(Warning::exhausted(leftover));
    }

    // restore declaration order and record cleaned aliases
    let mut domains = DomainMap::default();
    for name in &names {
        let domain = assigned
            .get(name.as_str())
            .cloned()
            .unwrap_or_else(|| UNCATEGORIZED.to_string());
        domains.types.insert((*name).clone(), domain);
    }
    for (name, domain) in &domains.types {
        let cleaned = to_upper_camel_case(&strip_api_base_path(name, api_base_path));
        if !cleaned.is_empty() && &cleaned != name && !domains.types.contains_key(&cleaned) {
            domains.aliases.entry(cleaned).or_insert_with(|| domain.clone());
        }
    }

    for route in routes {
        let tag = route.operations.values().find_map(|op| op.tags.first());
        let domain = tag.map(|t| normalize_tag(t)).filter(|d| !d.is_empty());
        domains.routes.insert(
            route.path.clone(),
            domain.unwrap_or_else(|| UNCATEGORIZED.to_string()),
        );
    }

    log::info!(
        "Classified {} types into domains: {:?}",
        domains.types.len(),
        domains.distribution()
    );

    Classification { domains, warnings }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_domain_patterns;
    use crate::openapi::OpenApiContext;
    use serde_json::json;

    fn run(doc: JsonValue) -> Classification {
        let normalized = OpenApiContext::new(doc).normalize();
        let patterns = NamePatterns::compile(&default_domain_patterns()).unwrap();
        classify(&normalized.type_definitions, &normalized.routes, &patterns, "api")
    }

    #[test]
    fn test_direct_tag_wins_with_first_tag() {
        let result = run(json!({
            "paths": {
                "/api/leads": {
                    "get": {
                        "tags": ["Lead Management", "CRM"],
                        "responses": { "200": { "content": { "application/json": {
                            "schema": { "type": "array", "items": { "$ref": "#/components/schemas/LeadOut" } }
                        } } } }
                    }
                }
            },
            "components": { "schemas": { "LeadOut": { "type": "object", "properties": {} } } }
        }));
        assert_eq!(result.domains.type_domain("LeadOut"), "lead-management");
        assert_eq!(result.domains.route_domain("/api/leads"), "lead-management");
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_name_patterns() {
        let patterns = NamePatterns::compile(&default_domain_patterns()).unwrap();
        assert_eq!(
            patterns.domain_for("app__schemas__billing_automation_schemas__ChargeCardRequest"),
            Some("billing-automation".to_string())
        );
        assert_eq!(
            patterns.domain_for("App_schemas_paymentGatewaySchemas_PaymentResponse"),
            Some("payment-gateway".to_string())
        );
        assert_eq!(patterns.domain_for("LeadOut"), None);
    }

    #[test]
    fn test_literal_pattern_domain() {
        let patterns =
            NamePatterns::compile(&[DomainPattern::new("^Billing", "Billing Ops")]).unwrap();
        assert_eq!(patterns.domain_for("BillingPlan"), Some("billing-ops".to_string()));
    }

    #[test]
    fn test_wrapper_inherits_wrapped_domain() {
        let result = run(json!({
            "paths": {
                "/api/members/{id}": {
                    "get": {
                        "tags": ["Members"],
                        "responses": { "200": { "schema": { "$ref": "#/definitions/MemberOut" } } }
                    }
                }
            },
            "definitions": {
                "PaginatedMemberOut": {
                    "type": "object",
                    "properties": {
                        "results": { "type": "array", "items": { "$ref": "#/definitions/MemberOut" } },
                        "total": { "type": "integer" }
                    }
                },
                "MemberOut": { "type": "object", "properties": { "id": { "type": "integer" } } }
            }
        }));
        assert_eq!(result.domains.type_domain("PaginatedMemberOut"), "members");
        assert_eq!(
            result.domains.types().map(|(n, _)| n).collect::<Vec<_>>(),
            vec!["PaginatedMemberOut", "MemberOut"]
        );
    }

    #[test]
    fn test_directly_tagged_wrapper_keeps_its_tag() {
        let result = run(json!({
            "paths": {
                "/api/members": {
                    "get": {
                        "tags": ["Reports"],
                        "responses": { "200": { "schema": { "$ref": "#/definitions/MemberPage" } } }
                    }
                },
                "/api/members/{id}": {
                    "get": {
                        "tags": ["Members"],
                        "responses": { "200": { "schema": { "$ref": "#/definitions/Member" } } }
                    }
                }
            },
            "definitions": {
                "MemberPage": { "properties": { "data": { "items": { "$ref": "#/definitions/Member" } } } },
                "Member": { "type": "object", "properties": {} }
            }
        }));
        assert_eq!(result.domains.type_domain("MemberPage"), "reports");
        assert_eq!(result.domains.type_domain("Member"), "members");
    }

    #[test]
    fn test_wrapper_suffix_match() {
        let result = run(json!({
            "paths": {
                "/api/x": { "get": { "tags": ["Billing"], "responses": { "200": {
                    "schema": { "$ref": "#/definitions/app__Invoice" }
                } } } }
            },
            "definitions": {
                "InvoiceList": { "type": "array", "items": { "$ref": "#/definitions/Invoice" } },
                "app__Invoice": { "type": "object", "properties": {} }
            }
        }));
        assert_eq!(result.domains.type_domain("InvoiceList"), "billing");
    }

    #[test]
    fn test_closure_adopts_referencer_domain() {
        let result = run(json!({
            "paths": {
                "/api/orders": { "post": { "tags": ["Orders"], "responses": { "201": {
                    "schema": { "$ref": "#/definitions/Order" }
                } } } }
            },
            "definitions": {
                "Order": { "type": "object", "properties": { "line": { "$ref": "#/definitions/Line" } } },
                "Line": { "type": "object", "properties": { "sku": { "$ref": "#/definitions/Sku" } } },
                "Sku": { "type": "object", "properties": {} }
            }
        }));
        assert_eq!(result.domains.type_domain("Line"), "orders");
        assert_eq!(result.domains.type_domain("Sku"), "orders");
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_reference_cycle_terminates_uncategorized() {
        let result = run(json!({
            "definitions": {
                "A": { "type": "object", "properties": { "b": { "$ref": "#/definitions/B" } } },
                "B": { "type": "object", "properties": { "a": { "$ref": "#/definitions/A" } } }
            }
        }));
        assert_eq!(result.domains.type_domain("A"), UNCATEGORIZED);
        assert_eq!(result.domains.type_domain("B"), UNCATEGORIZED);
        assert!(matches!(
            &result.warnings[0],
            Warning::DomainResolutionExhausted { names } if names.len() == 2
        ));
    }

    #[test]
    fn test_cleaned_alias_lookup() {
        let result = run(json!({
            "paths": {
                "/api/projects/photos": { "post": { "tags": ["Projects"], "requestBody": { "content": {
                    "multipart/form-data": { "schema": { "$ref": "#/components/schemas/Body_upload_photo_api_projects_photos_post" } }
                } }, "responses": {} } }
            },
            "components": { "schemas": {
                "Body_upload_photo_api_projects_photos_post": { "type": "object", "properties": {} }
            } }
        }));
        assert_eq!(result.domains.type_domain("BodyUploadPhotoPost"), "projects");
        assert_eq!(result.domains.aliases().count(), 1);
    }

    #[test]
    fn test_unknown_name_is_uncategorized() {
        let result = run(json!({}));
        assert_eq!(result.domains.type_domain("Nope"), UNCATEGORIZED);
        assert_eq!(result.domains.route_domain("/nope"), UNCATEGORIZED);
    }
}
