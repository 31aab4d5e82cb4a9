//! The generation plan: every decision the fragment builders consume.
//!
//! [`plan`] runs the pipeline stages in order (normalize, compile, classify,
//! group and name, synthesize parameters) and gathers their warnings. It
//! performs no I/O.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::config::Config;
use crate::domain::{classify, DomainMap, NamePatterns, UNCATEGORIZED};
use crate::error::{Result, Warning};
use crate::openapi::{
    schema_ref, HttpMethod, OpenApiContext, Operation, ParamLocation, FORM_URLENCODED, JSON_CONTENT,
};
use crate::params::{synthesize, ParamInterface};
use crate::routes::{self, assign_names, url_template, EndpointKey, NamingInput, RouteGroup};
use crate::schema::typescript::{references, ts_type};
use crate::schema::{self, CompiledTypes, RefTarget, TypeCompiler};
use crate::utils::{file_stem, sanitize_identifier, to_lower_camel_case, to_upper_camel_case, upper_first};

#[derive(Debug, Clone)]
pub struct GenerationPlan {
    pub title: Option<String>,
    pub version: Option<String>,
    pub types: CompiledTypes,
    pub domains: DomainMap,
    pub groups: Vec<PlannedGroup>,
    /// Every non-fatal diagnostic raised while planning, in stage order
    pub warnings: Vec<Warning>,
}

impl GenerationPlan {
    pub fn group(&self, key: &str) -> Option<&PlannedGroup> {
        self.groups.iter().find(|g| g.key == key)
    }

    pub fn endpoints(&self) -> impl Iterator<Item = &Endpoint> {
        self.groups.iter().flat_map(|g| g.endpoints.iter())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlannedGroup {
    pub key: String,
    /// Key with non-word characters replaced, used in file and import paths
    pub file_stem: String,
    /// camelCase identifier derived from the key
    pub ident: String,
    pub pascal: String,
    pub domain: String,
    pub cache_tag: String,
    pub endpoints: Vec<Endpoint>,
}

impl PlannedGroup {
    pub fn param_interfaces(&self) -> impl Iterator<Item = &ParamInterface> {
        self.endpoints.iter().filter_map(|e| e.param_interface.as_ref())
    }

    /// Declared types the group's endpoints return or accept
    pub fn references(&self) -> Vec<(String, RefTarget)> {
        let mut out: Vec<(String, RefTarget)> = Vec::new();
        let all = self.endpoints.iter().flat_map(|e| {
            e.references
                .iter()
                .chain(e.param_interface.iter().flat_map(|p| p.references.iter()))
        });
        for reference in all {
            if !out.contains(reference) {
                out.push(reference.clone());
            }
        }
        out
    }
}

/// Everything a template needs to know about one (path, verb)
#[derive(Debug, Clone, Serialize)]
pub struct Endpoint {
    pub name: String,
    pub export_name: String,
    pub path: String,
    pub http_method: String,
    pub is_query: bool,
    pub is_mutation: bool,
    pub is_list: bool,
    /// Path with `{p}` rewritten to `${p}`
    pub url_template: String,
    pub path_params: Vec<String>,
    pub query_params: Vec<String>,
    pub form_params: Vec<String>,
    pub has_body: bool,
    pub param_interface: Option<ParamInterface>,
    /// TypeScript type of the success response
    pub response_type: String,
    pub response_model: Option<String>,
    pub response_is_array: bool,
    pub response_is_paginated: bool,
    pub request_body_model: Option<String>,
    pub request_body_is_array: bool,
    pub content_type: String,
    pub summary: Option<String>,
    pub tags: Vec<String>,
    pub cache_tag: String,
    #[serde(skip)]
    pub references: Vec<(String, RefTarget)>,
}

/// A model reference as a response or body shape
#[derive(Debug, Clone, PartialEq, Eq)]
struct ModelShape {
    name: String,
    is_array: bool,
    is_paginated: bool,
}

fn model_shape(schema: &JsonValue) -> Option<ModelShape> {
    let shape = |name: &str, is_array, is_paginated| ModelShape {
        name: name.to_string(),
        is_array,
        is_paginated,
    };
    if let Some(name) = schema_ref(schema) {
        return Some(shape(name, false, false));
    }
    if let Some(name) = schema.get("items").and_then(schema_ref) {
        return Some(shape(name, true, false));
    }
    schema
        .pointer("/properties/results/items")
        .and_then(schema_ref)
        .map(|name| shape(name, false, true))
}

/// `<GROUP>_LIST`
pub fn cache_tag(group_key: &str) -> String {
    format!("{}_LIST", sanitize_identifier(&group_key.replace('-', "_")).to_uppercase())
}

/// Run every pipeline stage over `spec` under `config`.
pub fn plan(spec: &OpenApiContext, config: &Config) -> Result<GenerationPlan> {
    let patterns = NamePatterns::compile(&config.domain_patterns)?;
    let normalized = spec.normalize();
    let mut warnings = normalized.warnings;
    log::info!(
        "Planning {} definitions across {} paths",
        normalized.type_definitions.len(),
        normalized.routes.len()
    );

    let mut types = schema::compile(&normalized.type_definitions);
    warnings.append(&mut types.warnings);

    let classification = classify(
        &normalized.type_definitions,
        &normalized.routes,
        &patterns,
        config.base_path(),
    );
    warnings.extend(classification.warnings);
    let domains = classification.domains;

    let compiler = TypeCompiler::new(&normalized.type_definitions, &types.enums);
    let grouped = routes::group(&normalized.routes, config.grouping_depth());
    let groups = grouped
        .values()
        .map(|group| plan_group(group, config.base_path(), &compiler, &types, &domains, &mut warnings))
        .collect();

    Ok(GenerationPlan {
        title: spec.title().map(String::from),
        version: spec.version().map(String::from),
        types,
        domains,
        groups,
        warnings,
    })
}

fn plan_group(
    group: &RouteGroup,
    base_path: &str,
    compiler: &TypeCompiler<'_>,
    types: &CompiledTypes,
    domains: &DomainMap,
    warnings: &mut Vec<Warning>,
) -> PlannedGroup {
    let names = assign_names(group, base_path);
    let tag = cache_tag(&group.key);
    let domain = group
        .entries
        .keys()
        .map(|key| domains.route_domain(&key.path))
        .find(|d| *d != UNCATEGORIZED)
        .unwrap_or(UNCATEGORIZED)
        .to_string();

    let endpoints = group
        .entries
        .iter()
        .map(|(key, operation)| {
            let name = names
                .get(key)
                .cloned()
                .unwrap_or_else(|| routes::name_endpoint(&NamingInput::from_operation(key, operation, base_path)));
            plan_endpoint(name, key, operation, base_path, compiler, types, &tag, warnings)
        })
        .collect::<Vec<_>>();

    log::debug!("Group {} ({}): {} endpoints", group.key, domain, endpoints.len());
    PlannedGroup {
        ident: to_lower_camel_case(&group.key),
        pascal: to_upper_camel_case(&group.key),
        file_stem: file_stem(&group.key),
        key: group.key.clone(),
        domain,
        cache_tag: tag,
        endpoints,
    }
}

#[allow(clippy::too_many_arguments)]
fn plan_endpoint(
    name: String,
    key: &EndpointKey,
    operation: &Operation,
    base_path: &str,
    compiler: &TypeCompiler<'_>,
    types: &CompiledTypes,
    cache_tag: &str,
    warnings: &mut Vec<Warning>,
) -> Endpoint {
    let names_in = |location: ParamLocation| {
        operation
            .params_in(location)
            .map(|p| p.name.clone())
            .collect::<Vec<_>>()
    };
    let declared = |shape: ModelShape| types.get(&shape.name).is_some().then_some(shape);

    let param_interface = synthesize(key, operation, base_path, compiler, warnings);

    let mut nested = BTreeSet::new();
    let (response_type, references) = match operation.success_schema() {
        Some(raw) => {
            let location = format!("{} {} response", key.method, key.path);
            let compiled = compiler.compile_schema(raw, &location, warnings, &mut nested);
            (ts_type(&compiled), references(&compiled))
        }
        None => ("void".to_string(), Vec::new()),
    };
    let response = operation.success_schema().and_then(model_shape).and_then(declared);

    let legacy_body = operation
        .params_in(ParamLocation::Body)
        .next()
        .map(|p| &p.schema);
    let body_schema = legacy_body.or_else(|| operation.request_body.as_ref().and_then(|b| b.schema()));
    let request = body_schema.and_then(model_shape).and_then(declared);

    let form_params = names_in(ParamLocation::Form);
    let content_type = match &operation.request_body {
        Some(body) if form_params.is_empty() => body.preferred_content_type().to_string(),
        _ if !form_params.is_empty() => FORM_URLENCODED.to_string(),
        _ => JSON_CONTENT.to_string(),
    };

    let is_list = NamingInput::from_operation(key, operation, base_path).is_list();
    log::debug!("{} {} -> {}", key.method, key.path, name);

    Endpoint {
        export_name: upper_first(&name),
        name,
        path: key.path.clone(),
        http_method: key.method.upper().to_string(),
        is_query: key.method == HttpMethod::Get,
        is_mutation: key.method.is_mutation(),
        is_list,
        url_template: url_template(&key.path),
        path_params: names_in(ParamLocation::Path),
        query_params: names_in(ParamLocation::Query),
        has_body: body_schema.is_some(),
        form_params,
        param_interface,
        response_type,
        response_is_array: response.as_ref().is_some_and(|r| r.is_array),
        response_is_paginated: response.as_ref().is_some_and(|r| r.is_paginated),
        response_model: response.map(|r| r.name),
        request_body_is_array: request.as_ref().is_some_and(|r| r.is_array),
        request_body_model: request.map(|r| r.name),
        content_type,
        summary: operation.summary.clone(),
        tags: operation.tags.clone(),
        cache_tag: cache_tag.to_string(),
        references,
    }
}
