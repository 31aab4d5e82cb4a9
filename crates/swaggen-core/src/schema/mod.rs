//! Type graph compilation: declared schemas to typed field trees, and the
//! renderers emitters use to print them.

pub mod compiler;
pub mod types;
pub mod typescript;
pub mod zod;

pub use compiler::{compile, TypeCompiler};
pub use types::{
    CompiledType, CompiledTypes, EnumRegistry, Field, FieldSchema, PrimitiveKind, RefTarget,
    TypeKind,
};
