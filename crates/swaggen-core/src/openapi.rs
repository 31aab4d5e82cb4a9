//! OpenAPI specification loading and normalization.
//!
//! This module loads a specification document from disk or over HTTP and
//! folds either dialect (Swagger 2.0 `definitions`, OpenAPI 3.x
//! `components.schemas`) into one canonical [`NormalizedSpec`].
//!
//! # Examples
//!
//! ```no_run
//! use swaggen_core::openapi::OpenApiContext;
//! use swaggen_core::error::Result;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<()> {
//! let spec = OpenApiContext::from_file_or_url("openapi.json").await?;
//! if let Some(title) = spec.title() {
//!     println!("API Title: {}", title);
//! }
//! let normalized = spec.normalize();
//! println!("{} routes", normalized.routes.len());
//! # Ok(())
//! # }
//! ```

// Internal imports (std, crate)
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use crate::error::Warning;
use crate::utils::{path_param_name, path_segments};

// External imports (alphabetized)
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map as JsonMap, Value as JsonValue, json};
use tokio::fs;
use url::Url;

/// Represents an OpenAPI specification
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct OpenApiContext {
    /// The raw JSON value of the OpenAPI spec
    pub json: JsonValue,
}

/// Which flavour of specification document was loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Swagger 2.0: `definitions`, body/formData parameters
    Legacy,
    /// OpenAPI 3.x: `components.schemas`, `requestBody`
    Modern,
}

impl OpenApiContext {
    pub fn new(json: JsonValue) -> Self {
        Self { json }
    }

    /// Load a spec from a file path or an http(s) URL (YAML or JSON)
    pub async fn from_file_or_url<P: AsRef<str>>(location: P) -> crate::Result<Self> {
        let location = location.as_ref();

        match Url::parse(location) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Self::from_url(url.as_str()).await,
            _ => Self::from_file(location).await,
        }
    }

    /// Load a spec from a file (supports both YAML and JSON)
    pub async fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).await?;
        Self::parse_content(&content).map_err(|e| {
            crate::Error::openapi(format!(
                "Failed to parse OpenAPI spec at {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Fetch a spec over HTTP (supports both YAML and JSON)
    pub async fn from_url(url: &str) -> crate::Result<Self> {
        log::info!("Fetching specification from {}", url);
        let response = reqwest::get(url).await?;

        if !response.status().is_success() {
            return Err(crate::Error::openapi(format!(
                "Failed to fetch OpenAPI spec from {}: HTTP {}",
                url,
                response.status()
            )));
        }

        let content = response.text().await?;
        Self::parse_content(&content).map_err(|e| {
            crate::Error::openapi(format!("Failed to parse OpenAPI spec from {}: {}", url, e))
        })
    }

    /// Parse content as either JSON or YAML
    pub fn parse_content(content: &str) -> Result<Self, String> {
        if let Ok(json) = serde_json::from_str(content) {
            return Ok(Self { json });
        }
        if let Ok(json) = serde_yaml::from_str(content) {
            return Ok(Self { json });
        }
        Err("content is neither valid JSON nor YAML".to_string())
    }

    /// Get a reference to the raw JSON value
    pub fn as_json(&self) -> &JsonValue {
        &self.json
    }

    /// Get the title of the API
    pub fn title(&self) -> Option<&str> {
        self.json.get("info")?.get("title")?.as_str()
    }

    /// Get the version of the API
    pub fn version(&self) -> Option<&str> {
        self.json.get("info")?.get("version")?.as_str()
    }

    pub fn dialect(&self) -> Dialect {
        if self.json.get("swagger").is_some() || self.json.get("definitions").is_some() {
            Dialect::Legacy
        } else {
            Dialect::Modern
        }
    }

    /// Fold the document into type definitions and routes.
    ///
    /// Never fails: missing sections yield empty collections and malformed
    /// entries are skipped with a warning.
    pub fn normalize(&self) -> NormalizedSpec {
        let mut warnings = Vec::new();

        if !self.json.is_object() {
            warnings.push(Warning::malformed("document", "root is not an object"));
            return NormalizedSpec {
                warnings,
                ..Default::default()
            };
        }

        let mut type_definitions = IndexMap::new();
        let sections = [
            self.json.pointer("/components/schemas"),
            self.json.get("definitions"),
        ];
        for section in sections.into_iter().flatten() {
            let Some(map) = section.as_object() else {
                warnings.push(Warning::malformed("schemas", "schema section is not an object"));
                continue;
            };
            for (name, schema) in map {
                type_definitions
                    .entry(name.clone())
                    .or_insert_with(|| schema.clone());
            }
        }

        let mut routes = Vec::new();
        if let Some(paths) = self.json.get("paths").and_then(JsonValue::as_object) {
            for (path, item) in paths {
                match item.as_object() {
                    Some(item) => routes.push(self.parse_route(path, item, &mut warnings)),
                    None => warnings.push(Warning::malformed(path.as_str(), "path item is not an object")),
                }
            }
        }

        log::debug!(
            "Normalized {} type definitions and {} routes",
            type_definitions.len(),
            routes.len()
        );

        NormalizedSpec {
            type_definitions,
            routes,
            warnings,
        }
    }

    fn parse_route(
        &self,
        path: &str,
        item: &JsonMap<String, JsonValue>,
        warnings: &mut Vec<Warning>,
    ) -> Route {
        let shared = self.extract_parameters(item.get("parameters"), path, warnings);
        let mut operations = IndexMap::new();

        for method in HttpMethod::ALL {
            let Some(op) = item.get(method.as_str()) else {
                continue;
            };
            let location = format!("{} {}", method.upper(), path);
            let Some(op) = op.as_object() else {
                warnings.push(Warning::malformed(location, "operation is not an object"));
                continue;
            };
            operations.insert(method, self.parse_operation(path, &location, op, &shared, warnings));
        }

        Route {
            path: path.to_string(),
            operations,
        }
    }

    fn parse_operation(
        &self,
        path: &str,
        location: &str,
        op: &JsonMap<String, JsonValue>,
        shared: &[Parameter],
        warnings: &mut Vec<Warning>,
    ) -> Operation {
        let own = self.extract_parameters(op.get("parameters"), location, warnings);

        // operation-level parameters override path-level ones with the same (name, in)
        let mut parameters: Vec<Parameter> = shared
            .iter()
            .filter(|p| !own.iter().any(|o| o.name == p.name && o.location == p.location))
            .cloned()
            .collect();
        parameters.extend(own);

        for segment in path_segments(path) {
            let Some(name) = path_param_name(segment) else {
                continue;
            };
            if !parameters
                .iter()
                .any(|p| p.location == ParamLocation::Path && p.name == name)
            {
                warnings.push(Warning::malformed(
                    location,
                    format!("path parameter '{}' is not declared; assuming string", name),
                ));
                parameters.push(Parameter {
                    name: name.to_string(),
                    location: ParamLocation::Path,
                    required: true,
                    schema: json!({ "type": "string" }),
                    description: None,
                });
            }
        }

        let summary = op
            .get("summary")
            .and_then(JsonValue::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from);
        let tags = op
            .get("tags")
            .and_then(JsonValue::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(JsonValue::as_str)
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Operation {
            operation_id: op
                .get("operationId")
                .and_then(JsonValue::as_str)
                .map(String::from),
            summary,
            tags,
            parameters,
            request_body: self.extract_request_body(op.get("requestBody"), location, warnings),
            responses: self.extract_responses(op.get("responses"), location, warnings),
        }
    }

    /// Follow a local `$ref` (`#/...`) to its target, if any
    fn resolve<'a>(&'a self, value: &'a JsonValue) -> Option<&'a JsonValue> {
        match value.get("$ref").and_then(JsonValue::as_str) {
            Some(reference) => self.json.pointer(reference.strip_prefix('#')?),
            None => Some(value),
        }
    }

    pub fn extract_parameters(
        &self,
        raw: Option<&JsonValue>,
        location: &str,
        warnings: &mut Vec<Warning>,
    ) -> Vec<Parameter> {
        let Some(list) = raw.and_then(JsonValue::as_array) else {
            return Vec::new();
        };

        let mut parameters = Vec::new();
        for entry in list {
            let Some(param) = self.resolve(entry) else {
                let reference = entry.get("$ref").and_then(JsonValue::as_str).unwrap_or_default();
                warnings.push(Warning::unresolvable(location, ref_name(reference)));
                continue;
            };
            let Some(name) = param.get("name").and_then(JsonValue::as_str) else {
                warnings.push(Warning::malformed(location, "parameter without a name"));
                continue;
            };
            let kind = param.get("in").and_then(JsonValue::as_str).unwrap_or_default();
            let Some(param_location) = ParamLocation::from_openapi(kind) else {
                log::debug!("{}: skipping {} parameter '{}'", location, kind, name);
                continue;
            };

            let schema = match param.get("schema") {
                Some(schema) => schema.clone(),
                // legacy non-body parameters carry their type inline
                None => {
                    let inline: JsonMap<String, JsonValue> = param
                        .as_object()
                        .map(|obj| {
                            obj.iter()
                                .filter(|(k, _)| {
                                    !matches!(k.as_str(), "name" | "in" | "required" | "description")
                                })
                                .map(|(k, v)| (k.clone(), v.clone()))
                                .collect()
                        })
                        .unwrap_or_default();
                    JsonValue::Object(inline)
                }
            };

            parameters.push(Parameter {
                name: name.to_string(),
                location: param_location,
                required: param_location == ParamLocation::Path
                    || param.get("required").and_then(JsonValue::as_bool).unwrap_or(false),
                schema,
                description: param
                    .get("description")
                    .and_then(JsonValue::as_str)
                    .map(String::from),
            });
        }
        parameters
    }

    fn extract_request_body(
        &self,
        raw: Option<&JsonValue>,
        location: &str,
        warnings: &mut Vec<Warning>,
    ) -> Option<RequestBody> {
        let raw = raw?;
        let Some(body) = self.resolve(raw) else {
            let reference = raw.get("$ref").and_then(JsonValue::as_str).unwrap_or_default();
            warnings.push(Warning::unresolvable(location, ref_name(reference)));
            return None;
        };
        let Some(content) = body.get("content").and_then(JsonValue::as_object) else {
            warnings.push(Warning::malformed(location, "request body without content"));
            return None;
        };

        Some(RequestBody {
            content: content
                .iter()
                .map(|(ct, media)| (ct.clone(), media.get("schema").cloned()))
                .collect(),
            // an absent flag counts as required; only an explicit `false` relaxes it
            required: body.get("required").and_then(JsonValue::as_bool).unwrap_or(true),
        })
    }

    fn extract_responses(
        &self,
        raw: Option<&JsonValue>,
        location: &str,
        warnings: &mut Vec<Warning>,
    ) -> IndexMap<String, Option<JsonValue>> {
        let Some(map) = raw.and_then(JsonValue::as_object) else {
            if raw.is_none() {
                warnings.push(Warning::malformed(location, "operation without responses"));
            }
            return IndexMap::new();
        };

        map.iter()
            .map(|(status, response)| {
                let schema = self.resolve(response).and_then(|response| {
                    // legacy responses carry the schema directly
                    if let Some(schema) = response.get("schema") {
                        return Some(schema.clone());
                    }
                    let content = response.get("content")?.as_object()?;
                    content
                        .get("application/json")
                        .and_then(|media| media.get("schema"))
                        .or_else(|| content.values().find_map(|media| media.get("schema")))
                        .cloned()
                });
                (status.clone(), schema)
            })
            .collect()
    }
}

/// Canonical form of a specification document
#[derive(Debug, Clone, Default)]
pub struct NormalizedSpec {
    /// Declared schemas in declaration order
    pub type_definitions: IndexMap<String, JsonValue>,
    /// Paths in declaration order
    pub routes: Vec<Route>,
    pub warnings: Vec<Warning>,
}

/// HTTP verbs that produce operations, in emission order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 5] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Patch => "patch",
            Self::Delete => "delete",
        }
    }

    /// `GET`, `POST`, ...
    pub fn upper(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// `Get`, `Post`, ...
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Get => "Get",
            Self::Post => "Post",
            Self::Put => "Put",
            Self::Patch => "Patch",
            Self::Delete => "Delete",
        }
    }

    pub fn is_mutation(&self) -> bool {
        !matches!(self, Self::Get)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.upper())
    }
}

/// A path template and the operations declared on it
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub path: String,
    pub operations: IndexMap<HttpMethod, Operation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    /// Tags in declaration order
    pub tags: Vec<String>,
    /// Path-level and operation-level parameters, merged
    pub parameters: Vec<Parameter>,
    pub request_body: Option<RequestBody>,
    /// Status code to response schema (if the response declares one)
    pub responses: IndexMap<String, Option<JsonValue>>,
}

impl Operation {
    pub fn params_in(&self, location: ParamLocation) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter().filter(move |p| p.location == location)
    }

    /// The success response schema: 200, 201, 202, `default`, then any
    /// other 2xx code in declaration order.
    pub fn success_schema(&self) -> Option<&JsonValue> {
        const PREFERRED: [&str; 4] = ["200", "201", "202", "default"];

        PREFERRED
            .iter()
            .filter_map(|status| self.responses.get(*status))
            .chain(
                self.responses
                    .iter()
                    .filter(|(status, _)| status.starts_with('2') && !PREFERRED.contains(&status.as_str()))
                    .map(|(_, schema)| schema),
            )
            .find_map(Option::as_ref)
    }

    /// Every schema this operation mentions directly: parameters, request
    /// body content, and responses.
    pub fn schemas(&self) -> impl Iterator<Item = &JsonValue> {
        self.parameters
            .iter()
            .map(|p| &p.schema)
            .chain(
                self.request_body
                    .iter()
                    .flat_map(|body| body.content.values().flatten()),
            )
            .chain(self.responses.values().flatten())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub location: ParamLocation,
    pub required: bool,
    /// The parameter's schema; legacy inline types are folded into one
    pub schema: JsonValue,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    Path,
    Query,
    /// Legacy `in: body`
    Body,
    /// Legacy `in: formData`
    Form,
}

impl ParamLocation {
    /// Map an OpenAPI `in` value; header and cookie parameters are not modelled
    pub fn from_openapi(value: &str) -> Option<Self> {
        match value {
            "path" => Some(Self::Path),
            "query" => Some(Self::Query),
            "body" => Some(Self::Body),
            "formData" => Some(Self::Form),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestBody {
    /// Content type to schema
    pub content: IndexMap<String, Option<JsonValue>>,
    pub required: bool,
}

pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
pub const JSON_CONTENT: &str = "application/json";

impl RequestBody {
    /// Form-urlencoded wins, then JSON, then the first declared type
    pub fn preferred_content_type(&self) -> &str {
        if self.content.contains_key(FORM_URLENCODED) {
            FORM_URLENCODED
        } else if self.content.contains_key(JSON_CONTENT) {
            JSON_CONTENT
        } else {
            self.content.keys().next().map(String::as_str).unwrap_or(JSON_CONTENT)
        }
    }

    /// Schema of the preferred content type
    pub fn schema(&self) -> Option<&JsonValue> {
        self.content.get(self.preferred_content_type())?.as_ref()
    }
}

/// The type name a `$ref` string points at (its last path segment)
pub fn ref_name(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}

/// The referenced type name, if `schema` is a bare `$ref`
pub fn schema_ref(schema: &JsonValue) -> Option<&str> {
    schema.get("$ref").and_then(JsonValue::as_str).map(ref_name)
}

/// Every type name referenced anywhere inside `schema`
pub fn collect_refs(schema: &JsonValue) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    let mut stack = vec![schema];
    while let Some(value) = stack.pop() {
        match value {
            JsonValue::Object(map) => {
                for (key, inner) in map {
                    match (key.as_str(), inner) {
                        ("$ref", JsonValue::String(r)) => {
                            names.insert(ref_name(r).to_string());
                        }
                        _ => stack.push(inner),
                    }
                }
            }
            JsonValue::Array(items) => stack.extend(items),
            _ => {}
        }
    }
    names
}
