//! Schema compilation: raw JSON schemas to [`FieldSchema`] trees.
//!
//! Compilation runs in two passes. The first collects every declared enum so
//! that the second, which compiles fields, can tell a reference to an enum
//! from a reference to a model no matter the declaration order.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use super::types::{
    CompiledType, CompiledTypes, Constraints, EnumRegistry, Field, FieldSchema, PrimitiveKind,
    RefTarget, TypeKind,
};
use crate::error::Warning;
use crate::openapi::ref_name;

/// Inline nesting deeper than this compiles to `Unknown`
pub const MAX_INLINE_DEPTH: usize = 32;

/// Compile every declared type definition.
pub fn compile(definitions: &IndexMap<String, JsonValue>) -> CompiledTypes {
    let enums = collect_enums(definitions);
    let compiler = TypeCompiler::new(definitions, &enums);

    let mut warnings = Vec::new();
    let types: IndexMap<String, CompiledType> = definitions
        .iter()
        .map(|(name, raw)| (name.clone(), compiler.compile_definition(name, raw, &mut warnings)))
        .collect();

    log::info!(
        "Compiled {} type definitions ({} enums)",
        types.len(),
        enums.len()
    );

    CompiledTypes {
        types,
        enums,
        warnings,
    }
}

/// A schema is an enum iff it is a string with a non-empty literal list
pub fn is_enum_schema(raw: &JsonValue) -> bool {
    raw.get("type").and_then(JsonValue::as_str) == Some("string")
        && raw
            .get("enum")
            .and_then(JsonValue::as_array)
            .is_some_and(|values| !values.is_empty())
}

/// First pass: the names of all declared enums
pub fn collect_enums(definitions: &IndexMap<String, JsonValue>) -> EnumRegistry {
    let mut registry = EnumRegistry::default();
    for (name, raw) in definitions {
        if is_enum_schema(raw) {
            registry.insert(name.clone());
        }
    }
    registry
}

fn literal_values(raw: &JsonValue) -> Vec<String> {
    raw.get("enum")
        .and_then(JsonValue::as_array)
        .map(|values| {
            values
                .iter()
                .filter(|v| !v.is_null())
                .map(|v| match v {
                    JsonValue::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn is_null_schema(raw: &JsonValue) -> bool {
    raw.get("type").and_then(JsonValue::as_str) == Some("null")
}

fn flag(raw: &JsonValue, key: &str) -> bool {
    raw.get(key).and_then(JsonValue::as_bool).unwrap_or(false)
}

/// Compiles schemas against a fixed set of declared names and enums.
pub struct TypeCompiler<'a> {
    declared: &'a IndexMap<String, JsonValue>,
    enums: &'a EnumRegistry,
}

impl<'a> TypeCompiler<'a> {
    pub fn new(declared: &'a IndexMap<String, JsonValue>, enums: &'a EnumRegistry) -> Self {
        Self { declared, enums }
    }

    pub fn compile_definition(
        &self,
        name: &str,
        raw: &JsonValue,
        warnings: &mut Vec<Warning>,
    ) -> CompiledType {
        let mut nested = BTreeSet::new();

        let kind = if raw.as_object().map_or(true, |obj| obj.is_empty()) {
            warnings.push(Warning::malformed(name, "empty schema"));
            TypeKind::Alias {
                schema: FieldSchema::Unknown,
            }
        } else if is_enum_schema(raw) {
            TypeKind::Enum {
                values: literal_values(raw),
            }
        } else if let Some(properties) = raw.get("properties") {
            TypeKind::Object {
                fields: self.compile_fields(name, raw, properties, 1, warnings, &mut nested),
            }
        } else {
            if raw.get("type").and_then(JsonValue::as_str) == Some("object")
                && raw.get("additionalProperties").is_none()
            {
                warnings.push(Warning::malformed(
                    name,
                    "object without properties; treating as a free-form record",
                ));
            }
            TypeKind::Alias {
                schema: self.compile_at(raw, name, 0, warnings, &mut nested),
            }
        };

        nested.remove(name);
        log::debug!("Compiled {} with {} nested references", name, nested.len());

        CompiledType {
            name: name.to_string(),
            kind,
            nested,
        }
    }

    /// Compile a free-standing schema, such as a parameter's or a body's.
    pub fn compile_schema(
        &self,
        raw: &JsonValue,
        location: &str,
        warnings: &mut Vec<Warning>,
        nested: &mut BTreeSet<String>,
    ) -> FieldSchema {
        self.compile_at(raw, location, 0, warnings, nested)
    }

    fn compile_fields(
        &self,
        location: &str,
        raw: &JsonValue,
        properties: &JsonValue,
        depth: usize,
        warnings: &mut Vec<Warning>,
        nested: &mut BTreeSet<String>,
    ) -> Vec<Field> {
        let Some(properties) = properties.as_object() else {
            warnings.push(Warning::malformed(location, "properties is not an object"));
            return Vec::new();
        };
        let required: BTreeSet<&str> = raw
            .get("required")
            .and_then(JsonValue::as_array)
            .map(|names| names.iter().filter_map(JsonValue::as_str).collect())
            .unwrap_or_default();

        properties
            .iter()
            .map(|(field_name, field_raw)| {
                let field_location = format!("{}.{}", location, field_name);
                Field {
                    name: field_name.clone(),
                    schema: self.compile_at(field_raw, &field_location, depth, warnings, nested),
                    required: required.contains(field_name.as_str()),
                    description: field_raw
                        .get("description")
                        .and_then(JsonValue::as_str)
                        .map(String::from),
                }
            })
            .collect()
    }

    fn compile_at(
        &self,
        raw: &JsonValue,
        location: &str,
        depth: usize,
        warnings: &mut Vec<Warning>,
        nested: &mut BTreeSet<String>,
    ) -> FieldSchema {
        if depth > MAX_INLINE_DEPTH {
            warnings.push(Warning::malformed(
                location,
                format!("nesting deeper than {} levels", MAX_INLINE_DEPTH),
            ));
            return FieldSchema::Unknown;
        }
        let Some(obj) = raw.as_object().filter(|obj| !obj.is_empty()) else {
            warnings.push(Warning::malformed(location, "empty schema"));
            return FieldSchema::Unknown;
        };

        let compiled = if let Some(reference) = obj.get("$ref").and_then(JsonValue::as_str) {
            self.compile_ref(ref_name(reference), location, warnings, nested)
        } else if let Some(branches) = obj
            .get("anyOf")
            .or_else(|| obj.get("oneOf"))
            .and_then(JsonValue::as_array)
        {
            self.compile_union(branches, location, depth, warnings, nested)
        } else if let Some(members) = obj.get("allOf").and_then(JsonValue::as_array) {
            let mut compiled: Vec<FieldSchema> = members
                .iter()
                .map(|m| self.compile_at(m, location, depth + 1, warnings, nested))
                .collect();
            match compiled.len() {
                0 => FieldSchema::Unknown,
                1 => compiled.remove(0),
                _ => FieldSchema::Intersection { members: compiled },
            }
        } else {
            self.compile_typed(raw, location, depth, warnings, nested)
        };

        if flag(raw, "nullable") || flag(raw, "x-nullable") {
            FieldSchema::nullable(compiled)
        } else {
            compiled
        }
    }

    fn compile_ref(
        &self,
        name: &str,
        location: &str,
        warnings: &mut Vec<Warning>,
        nested: &mut BTreeSet<String>,
    ) -> FieldSchema {
        let target = if self.enums.contains(name) {
            RefTarget::Enum
        } else if self.declared.contains_key(name) {
            RefTarget::Model
        } else {
            warnings.push(Warning::unresolvable(location, name));
            RefTarget::Unresolved
        };
        if target != RefTarget::Unresolved {
            nested.insert(name.to_string());
        }
        FieldSchema::Reference {
            name: name.to_string(),
            target,
        }
    }

    fn compile_union(
        &self,
        branches: &[JsonValue],
        location: &str,
        depth: usize,
        warnings: &mut Vec<Warning>,
        nested: &mut BTreeSet<String>,
    ) -> FieldSchema {
        let has_null = branches.iter().any(is_null_schema);
        let mut compiled: Vec<FieldSchema> = branches
            .iter()
            .filter(|b| !is_null_schema(b))
            .map(|b| self.compile_at(b, location, depth + 1, warnings, nested))
            .collect();

        let inner = match compiled.len() {
            0 => return FieldSchema::Unknown,
            1 => compiled.remove(0),
            _ => FieldSchema::Union { branches: compiled },
        };
        if has_null {
            FieldSchema::nullable(inner)
        } else {
            inner
        }
    }

    fn compile_typed(
        &self,
        raw: &JsonValue,
        location: &str,
        depth: usize,
        warnings: &mut Vec<Warning>,
        nested: &mut BTreeSet<String>,
    ) -> FieldSchema {
        // OpenAPI 3.1 spells nullability as `type: [T, "null"]`
        let (declared, nullable) = match raw.get("type") {
            Some(JsonValue::String(t)) => (Some(t.as_str()), false),
            Some(JsonValue::Array(types)) => {
                let names: Vec<&str> = types.iter().filter_map(JsonValue::as_str).collect();
                let non_null: Vec<&str> = names.iter().copied().filter(|t| *t != "null").collect();
                let declared = if non_null.len() == 1 { Some(non_null[0]) } else { None };
                (declared, names.contains(&"null"))
            }
            _ => (None, false),
        };

        let declared = declared.or_else(|| {
            if raw.get("properties").is_some() {
                Some("object")
            } else if raw.get("items").is_some() {
                Some("array")
            } else if raw.get("enum").is_some() {
                Some("string")
            } else {
                None
            }
        });

        let compiled = match declared {
            Some("string") => FieldSchema::Primitive {
                primitive: PrimitiveKind::String,
                constraints: Constraints {
                    min_length: raw.get("minLength").and_then(JsonValue::as_u64),
                    max_length: raw.get("maxLength").and_then(JsonValue::as_u64),
                    pattern: raw.get("pattern").and_then(JsonValue::as_str).map(String::from),
                    format: raw.get("format").and_then(JsonValue::as_str).map(String::from),
                    literals: literal_values(raw),
                    ..Default::default()
                },
            },
            Some(kind @ ("integer" | "number")) => FieldSchema::Primitive {
                primitive: if kind == "integer" {
                    PrimitiveKind::Integer
                } else {
                    PrimitiveKind::Number
                },
                constraints: Constraints {
                    minimum: raw.get("minimum").and_then(JsonValue::as_number).cloned(),
                    maximum: raw.get("maximum").and_then(JsonValue::as_number).cloned(),
                    ..Default::default()
                },
            },
            Some("boolean") => FieldSchema::primitive(PrimitiveKind::Boolean),
            Some("file") => FieldSchema::primitive(PrimitiveKind::File),
            Some("array") => {
                let element = match raw.get("items") {
                    Some(items) => self.compile_at(items, location, depth + 1, warnings, nested),
                    None => {
                        warnings.push(Warning::malformed(location, "array without items"));
                        FieldSchema::Unknown
                    }
                };
                FieldSchema::Array {
                    element: Box::new(element),
                }
            }
            Some("object") => {
                let fields = match raw.get("properties") {
                    Some(properties) => {
                        self.compile_fields(location, raw, properties, depth + 1, warnings, nested)
                    }
                    None => Vec::new(),
                };
                FieldSchema::Object { fields }
            }
            Some("null") => FieldSchema::Unknown,
            Some(other) => {
                warnings.push(Warning::malformed(location, format!("unknown type '{}'", other)));
                FieldSchema::Unknown
            }
            None => {
                log::debug!("{}: schema declares no type", location);
                FieldSchema::Unknown
            }
        };

        if nullable {
            FieldSchema::nullable(compiled)
        } else {
            compiled
        }
    }
}
