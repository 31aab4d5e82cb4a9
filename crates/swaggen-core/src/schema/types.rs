//! Compiled representation of declared schemas.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Number;

use crate::error::Warning;
use crate::utils::sanitize_identifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    String,
    Integer,
    Number,
    Boolean,
    /// Legacy `type: file` upload fields
    File,
}

/// Validation constraints carried by a primitive.
///
/// String kinds use the length, pattern, format and enum slots; numeric kinds
/// use `minimum`/`maximum`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Constraints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,
    /// Inline literal values (`enum` on a field rather than a named type)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub literals: Vec<String>,
}

impl Constraints {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// What a `$ref` resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RefTarget {
    Model,
    Enum,
    /// The name is not declared in the document
    Unresolved,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldSchema {
    Primitive {
        primitive: PrimitiveKind,
        #[serde(skip_serializing_if = "Constraints::is_empty")]
        constraints: Constraints,
    },
    Reference {
        name: String,
        target: RefTarget,
    },
    Array {
        element: Box<FieldSchema>,
    },
    /// Inline object; an empty field list means a free-form record
    Object {
        fields: Vec<Field>,
    },
    Union {
        branches: Vec<FieldSchema>,
    },
    /// `allOf` with more than one member
    Intersection {
        members: Vec<FieldSchema>,
    },
    Nullable {
        inner: Box<FieldSchema>,
    },
    Unknown,
}

impl FieldSchema {
    pub fn primitive(primitive: PrimitiveKind) -> Self {
        Self::Primitive {
            primitive,
            constraints: Constraints::default(),
        }
    }

    pub fn nullable(inner: FieldSchema) -> Self {
        match inner {
            // nullable of nullable is still just nullable
            already @ Self::Nullable { .. } => already,
            Self::Unknown => Self::Unknown,
            inner => Self::Nullable {
                inner: Box::new(inner),
            },
        }
    }

    /// The referenced name if this is (an array of / a nullable) reference
    pub fn referenced_name(&self) -> Option<&str> {
        match self {
            Self::Reference { name, .. } => Some(name),
            Self::Array { element } => element.referenced_name(),
            Self::Nullable { inner } => inner.referenced_name(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    pub schema: FieldSchema,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeKind {
    Object { fields: Vec<Field> },
    Enum { values: Vec<String> },
    /// A named alias for a non-object schema (e.g. a constrained string)
    Alias { schema: FieldSchema },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledType {
    pub name: String,
    pub kind: TypeKind,
    /// Declared names this type references, directly or through nesting
    pub nested: BTreeSet<String>,
}

impl CompiledType {
    pub fn is_enum(&self) -> bool {
        matches!(self.kind, TypeKind::Enum { .. })
    }
}

/// Names of every declared enum, collected before any field is compiled
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnumRegistry(BTreeSet<String>);

impl EnumRegistry {
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn insert(&mut self, name: impl Into<String>) {
        self.0.insert(name.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Output of the compiler stage
#[derive(Debug, Clone, Default)]
pub struct CompiledTypes {
    pub types: IndexMap<String, CompiledType>,
    pub enums: EnumRegistry,
    pub warnings: Vec<Warning>,
}

impl CompiledTypes {
    pub fn get(&self, name: &str) -> Option<&CompiledType> {
        self.types.get(name)
    }
}

/// `I<Name>Serializer`, the inferred TypeScript type of a model
pub fn serializer_ident(name: &str) -> String {
    format!("I{}Serializer", sanitize_identifier(name))
}

/// `<Name>Schema`, the zod schema constant of a model or enum
pub fn schema_ident(name: &str) -> String {
    format!("{}Schema", sanitize_identifier(name))
}

/// `<Name>Values`, the literal list exported next to an enum
pub fn values_ident(name: &str) -> String {
    format!("{}Values", sanitize_identifier(name))
}

/// Identifier used where a TypeScript type is expected
pub fn type_ident(name: &str, target: RefTarget) -> Option<String> {
    match target {
        RefTarget::Model => Some(serializer_ident(name)),
        RefTarget::Enum => Some(sanitize_identifier(name)),
        RefTarget::Unresolved => None,
    }
}
