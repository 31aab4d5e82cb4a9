//! Rendering of compiled schemas as zod expressions.

use super::types::{schema_ident, Constraints, Field, FieldSchema, PrimitiveKind, RefTarget};

const DATE_REGEX: &str = r"/^\d{4}-\d{2}-\d{2}$/";

/// Render a schema as a zod expression, e.g. `z.string().max(40)`.
pub fn zod_expr(schema: &FieldSchema) -> String {
    match schema {
        FieldSchema::Primitive {
            primitive,
            constraints,
        } => primitive_expr(*primitive, constraints),
        // model references are lazy so that mutually referencing models load in any order
        FieldSchema::Reference {
            name,
            target: RefTarget::Model,
        } => format!("z.lazy(() => {})", schema_ident(name)),
        FieldSchema::Reference {
            name,
            target: RefTarget::Enum,
        } => schema_ident(name),
        FieldSchema::Reference {
            target: RefTarget::Unresolved,
            ..
        } => "z.any()".to_string(),
        FieldSchema::Array { element } => format!("z.array({})", zod_expr(element)),
        FieldSchema::Object { fields } if fields.is_empty() => {
            "z.record(z.string(), z.any())".to_string()
        }
        FieldSchema::Object { fields } => {
            let body: Vec<String> = fields
                .iter()
                .map(|f| format!("{}: {}", property_key(&f.name), field_expr(f)))
                .collect();
            format!("z.object({{ {} }})", body.join(", "))
        }
        FieldSchema::Union { branches } => {
            let rendered: Vec<String> = branches.iter().map(zod_expr).collect();
            format!("z.union([{}])", rendered.join(", "))
        }
        FieldSchema::Intersection { members } => {
            let mut rendered = members.iter().map(zod_expr);
            let first = rendered.next().unwrap_or_else(|| "z.any()".to_string());
            rendered.fold(first, |acc, next| format!("{}.and({})", acc, next))
        }
        FieldSchema::Nullable { inner } => format!("{}.nullable()", zod_expr(inner)),
        FieldSchema::Unknown => "z.any()".to_string(),
    }
}

/// A field's expression, with `.optional()` when it is not required
pub fn field_expr(field: &Field) -> String {
    let expr = zod_expr(&field.schema);
    if field.required {
        expr
    } else {
        format!("{}.optional()", expr)
    }
}

/// Object keys that are not plain identifiers are quoted
pub fn property_key(name: &str) -> String {
    let plain = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if plain {
        name.to_string()
    } else {
        js_string(name)
    }
}

/// A single-quoted JavaScript string literal
pub fn js_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

fn primitive_expr(kind: PrimitiveKind, c: &Constraints) -> String {
    match kind {
        PrimitiveKind::String if !c.literals.is_empty() => {
            let values: Vec<String> = c.literals.iter().map(|v| js_string(v)).collect();
            format!("z.enum([{}])", values.join(", "))
        }
        PrimitiveKind::String => {
            let mut expr = String::from("z.string()");
            match c.format.as_deref() {
                Some("date") => expr.push_str(&format!(".regex({})", DATE_REGEX)),
                Some("date-time") => expr.push_str(".datetime()"),
                Some("uri") | Some("url") => expr.push_str(".url()"),
                Some("email") => expr.push_str(".email()"),
                Some("uuid") => expr.push_str(".uuid()"),
                _ => {}
            }
            if let Some(max) = c.max_length {
                expr.push_str(&format!(".max({})", max));
            }
            if let Some(min) = c.min_length {
                expr.push_str(&format!(".min({})", min));
            }
            if let Some(pattern) = &c.pattern {
                expr.push_str(&format!(".regex(new RegExp({}))", js_string(pattern)));
            }
            expr
        }
        PrimitiveKind::Integer | PrimitiveKind::Number => {
            let mut expr = if kind == PrimitiveKind::Integer {
                String::from("z.number().int()")
            } else {
                String::from("z.number()")
            };
            if let Some(max) = &c.maximum {
                expr.push_str(&format!(".max({})", max));
            }
            if let Some(min) = &c.minimum {
                expr.push_str(&format!(".min({})", min));
            }
            expr
        }
        PrimitiveKind::Boolean => "z.boolean()".to_string(),
        PrimitiveKind::File => "z.instanceof(File)".to_string(),
    }
}
