//! Rendering of compiled schemas as TypeScript type expressions.

use super::types::{type_ident, FieldSchema, PrimitiveKind, RefTarget};
use super::zod::{js_string, property_key};

/// Render a schema as a TypeScript type, e.g. `ILeadSerializer[]`.
pub fn ts_type(schema: &FieldSchema) -> String {
    match schema {
        FieldSchema::Primitive {
            primitive,
            constraints,
        } => match primitive {
            PrimitiveKind::String if !constraints.literals.is_empty() => constraints
                .literals
                .iter()
                .map(|v| js_string(v))
                .collect::<Vec<_>>()
                .join(" | "),
            PrimitiveKind::String => "string".to_string(),
            PrimitiveKind::Integer | PrimitiveKind::Number => "number".to_string(),
            PrimitiveKind::Boolean => "boolean".to_string(),
            PrimitiveKind::File => "File".to_string(),
        },
        FieldSchema::Reference { name, target } => {
            type_ident(name, *target).unwrap_or_else(|| "any".to_string())
        }
        FieldSchema::Array { element } => {
            let inner = ts_type(element);
            if needs_parens(element) {
                format!("({})[]", inner)
            } else {
                format!("{}[]", inner)
            }
        }
        FieldSchema::Object { fields } if fields.is_empty() => "Record<string, any>".to_string(),
        FieldSchema::Object { fields } => {
            let members: Vec<String> = fields
                .iter()
                .map(|f| {
                    format!(
                        "{}{}: {}",
                        property_key(&f.name),
                        if f.required { "" } else { "?" },
                        ts_type(&f.schema)
                    )
                })
                .collect();
            format!("{{ {} }}", members.join("; "))
        }
        FieldSchema::Union { branches } => branches.iter().map(ts_type).collect::<Vec<_>>().join(" | "),
        FieldSchema::Intersection { members } => {
            members.iter().map(ts_type).collect::<Vec<_>>().join(" & ")
        }
        FieldSchema::Nullable { inner } => format!("{} | null", ts_type(inner)),
        FieldSchema::Unknown => "any".to_string(),
    }
}

fn needs_parens(schema: &FieldSchema) -> bool {
    match schema {
        FieldSchema::Union { .. } | FieldSchema::Intersection { .. } | FieldSchema::Nullable { .. } => {
            true
        }
        FieldSchema::Primitive {
            primitive: PrimitiveKind::String,
            constraints,
        } => constraints.literals.len() > 1,
        _ => false,
    }
}

/// Every resolved reference inside a schema, in first-seen order
pub fn references(schema: &FieldSchema) -> Vec<(String, RefTarget)> {
    let mut out = Vec::new();
    let mut stack = vec![schema];
    while let Some(current) = stack.pop() {
        match current {
            FieldSchema::Reference { name, target } if *target != RefTarget::Unresolved => {
                if !out.iter().any(|(n, _)| n == name) {
                    out.push((name.clone(), *target));
                }
            }
            FieldSchema::Array { element } => stack.push(element),
            FieldSchema::Nullable { inner } => stack.push(inner),
            FieldSchema::Object { fields } => stack.extend(fields.iter().rev().map(|f| &f.schema)),
            FieldSchema::Union { branches } => stack.extend(branches.iter().rev()),
            FieldSchema::Intersection { members } => stack.extend(members.iter().rev()),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::{Constraints, Field};

    fn model(name: &str) -> FieldSchema {
        FieldSchema::Reference {
            name: name.into(),
            target: RefTarget::Model,
        }
    }

    #[test]
    fn test_ts_types() {
        assert_eq!(ts_type(&model("Lead")), "ILeadSerializer");
        assert_eq!(
            ts_type(&FieldSchema::Reference {
                name: "LeadStatus".into(),
                target: RefTarget::Enum
            }),
            "LeadStatus"
        );
        assert_eq!(
            ts_type(&FieldSchema::Array {
                element: Box::new(model("Lead"))
            }),
            "ILeadSerializer[]"
        );
        assert_eq!(
            ts_type(&FieldSchema::Array {
                element: Box::new(FieldSchema::nullable(FieldSchema::primitive(
                    PrimitiveKind::Integer
                )))
            }),
            "(number | null)[]"
        );
        assert_eq!(
            ts_type(&FieldSchema::Primitive {
                primitive: PrimitiveKind::String,
                constraints: Constraints {
                    literals: vec!["asc".into(), "desc".into()],
                    ..Default::default()
                }
            }),
            "'asc' | 'desc'"
        );
        assert_eq!(
            ts_type(&FieldSchema::Reference {
                name: "Ghost".into(),
                target: RefTarget::Unresolved
            }),
            "any"
        );
    }

    #[test]
    fn test_inline_object_type() {
        let object = FieldSchema::Object {
            fields: vec![Field {
                name: "page".into(),
                schema: FieldSchema::primitive(PrimitiveKind::Integer),
                required: false,
                description: None,
            }],
        };
        assert_eq!(ts_type(&object), "{ page?: number }");
    }

    #[test]
    fn test_references_are_deduplicated_in_order() {
        let schema = FieldSchema::Union {
            branches: vec![
                model("B"),
                FieldSchema::Array {
                    element: Box::new(model("A")),
                },
                model("B"),
                FieldSchema::Reference {
                    name: "Ghost".into(),
                    target: RefTarget::Unresolved,
                },
            ],
        };
        let names: Vec<String> = references(&schema).into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["B".to_string(), "A".to_string()]);
    }
}
