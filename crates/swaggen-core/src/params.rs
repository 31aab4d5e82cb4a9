//! Parameter interfaces: the typed object each generated call accepts.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::Warning;
use crate::openapi::{HttpMethod, Operation, ParamLocation};
use crate::routes::{relative_segments, EndpointKey};
use crate::schema::typescript::{references, ts_type};
use crate::schema::{FieldSchema, RefTarget, TypeCompiler};
use crate::utils::{path_param_name, path_segments, to_upper_camel_case};

/// Field name a request body is exposed under
pub const BODY_FIELD: &str = "body";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamField {
    pub name: String,
    pub location: ParamLocation,
    pub required: bool,
    /// TypeScript type expression
    pub ts_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamInterface {
    pub name: String,
    pub fields: Vec<ParamField>,
    /// Declared types the fields mention
    #[serde(skip)]
    pub references: Vec<(String, RefTarget)>,
}

impl ParamInterface {
    pub fn field(&self, name: &str) -> Option<&ParamField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn fields_in(&self, location: ParamLocation) -> impl Iterator<Item = &ParamField> {
        self.fields.iter().filter(move |f| f.location == location)
    }
}

/// `I<Segments><Verb>Params`, built from the path below the base path with
/// `{param}` segments unwrapped.
pub fn interface_name(path: &str, method: HttpMethod, base_path: &str) -> String {
    let mut segments = relative_segments(path, base_path);
    if segments.is_empty() {
        segments = path_segments(path).collect();
    }
    let stem: String = segments
        .iter()
        .map(|s| to_upper_camel_case(path_param_name(s).unwrap_or(s)))
        .collect();
    let stem = if stem.is_empty() { "Root".to_string() } else { stem };
    format!("I{}{}Params", stem, method.suffix())
}

/// Derive the parameter interface of one operation.
///
/// Path, query and form parameters each become a field. A legacy body
/// parameter or a `requestBody` becomes a single `body` field; when both are
/// present the legacy one wins. Enum references resolve through the
/// compiler's enum registry. Returns `None` when nothing remains.
pub fn synthesize(
    key: &EndpointKey,
    operation: &Operation,
    base_path: &str,
    compiler: &TypeCompiler<'_>,
    warnings: &mut Vec<Warning>,
) -> Option<ParamInterface> {
    let location = format!("{} {}", key.method, key.path);
    let mut fields: Vec<ParamField> = Vec::new();
    let mut refs: Vec<(String, RefTarget)> = Vec::new();
    let mut nested = BTreeSet::new();

    let mut push = |name: &str,
                    param_location: ParamLocation,
                    required: bool,
                    schema: FieldSchema,
                    description: Option<String>| {
        if fields.iter().any(|f| f.name == name) {
            log::debug!("{}: duplicate parameter {} ignored", location, name);
            return;
        }
        for reference in references(&schema) {
            if !refs.contains(&reference) {
                refs.push(reference);
            }
        }
        fields.push(ParamField {
            name: name.to_string(),
            location: param_location,
            required,
            ts_type: ts_type(&schema),
            description,
        });
    };

    let ordered = [
        ParamLocation::Path,
        ParamLocation::Query,
        ParamLocation::Form,
        ParamLocation::Body,
    ];
    for param_location in ordered {
        for param in operation.params_in(param_location) {
            let param_site = format!("{} {} param {}", key.method, key.path, param.name);
            let schema = compiler.compile_schema(&param.schema, &param_site, warnings, &mut nested);
            let name = if param_location == ParamLocation::Body {
                BODY_FIELD
            } else {
                param.name.as_str()
            };
            push(name, param_location, param.required, schema, param.description.clone());
        }
    }

    let has_legacy_body = operation
        .parameters
        .iter()
        .any(|p| matches!(p.location, ParamLocation::Body | ParamLocation::Form));
    if let Some(body) = &operation.request_body {
        match body.schema() {
            Some(_) if has_legacy_body => {
                log::debug!("{} {}: requestBody ignored next to legacy body parameters", key.method, key.path);
            }
            Some(raw) => {
                let body_site = format!("{} {} body", key.method, key.path);
                let schema = compiler.compile_schema(raw, &body_site, warnings, &mut nested);
                push(BODY_FIELD, ParamLocation::Body, body.required, schema, None);
            }
            None => {
                warnings.push(Warning::malformed(
                    format!("{} {}", key.method, key.path),
                    "request body declares no schema",
                ));
            }
        }
    }

    if fields.is_empty() {
        return None;
    }

    Some(ParamInterface {
        name: interface_name(&key.path, key.method, base_path),
        fields,
        references: refs,
    })
}
