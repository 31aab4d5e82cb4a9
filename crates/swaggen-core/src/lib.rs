//! Swaggen Core Library
//!
//! This library turns an OpenAPI or Swagger document into a typed TypeScript
//! client: zod models, fetch services, Redux thunks, form slices, parameter
//! interfaces, cache tags, React hooks and store wiring.
//!
//! The translation pipeline is pure: [`openapi`] normalizes the document,
//! [`schema`] compiles declared types, [`domain`] places them into modules,
//! [`routes`] groups and names endpoints, [`params`] derives parameter
//! interfaces and [`imports`] resolves cross-module imports. [`plan`] runs
//! the stages in order; [`builders`] and [`templates`] turn the plan into
//! files.

pub mod builders;
pub mod config;
pub mod domain;
pub mod error;
pub mod generate;
pub mod imports;
pub mod openapi;
pub mod params;
pub mod plan;
pub mod routes;
pub mod schema;
pub mod templates;
pub mod utils;

pub use crate::{
    config::{ArtifactKind, Config, DomainPattern},
    error::{Error, Result, Warning},
    generate::{generate, generate_from_spec, GenerationReport},
    openapi::OpenApiContext,
    plan::GenerationPlan,
    templates::{TemplateDir, TemplateManager},
};
