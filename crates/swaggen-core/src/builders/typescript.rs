//! TypeScript/Redux fragment builders.
//!
//! One builder per artifact kind. Each reads the plan, resolves its imports
//! and serializes a context for its template.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::Serialize;

use super::{Fragment, FragmentBuilder};
use crate::config::{ArtifactKind, Config};
use crate::imports::{group_lines, Binding, ImportLine, ImportResolver, ImportSpec, Origin};
use crate::openapi::ParamLocation;
use crate::params::{ParamInterface, BODY_FIELD};
use crate::plan::{Endpoint, GenerationPlan, PlannedGroup};
use crate::schema::types::{schema_ident, serializer_ident, values_ident};
use crate::schema::typescript::ts_type;
use crate::schema::zod::{field_expr, js_string, property_key, zod_expr};
use crate::schema::{CompiledType, RefTarget, TypeKind};
use crate::utils::{path_param_name, sanitize_identifier, to_lower_camel_case};

/// Services and thunks live two directories below the output root
const NESTED_DEPTH: usize = 2;
/// Params, slices, hooks, tags and the store live one below
const FLAT_DEPTH: usize = 1;

fn resolver<'a>(plan: &'a GenerationPlan, config: &'a Config) -> ImportResolver<'a> {
    let alias = config.alias_imports.then_some(config.alias_root.as_str());
    ImportResolver::new(&plan.domains, alias)
}

fn fragment<T: Serialize>(
    kind: ArtifactKind,
    target: impl Into<PathBuf>,
    template: &'static str,
    context: &T,
) -> crate::Result<Fragment> {
    Ok(Fragment {
        kind,
        target: target.into(),
        template,
        context: serde_json::to_value(context)?,
    })
}

fn line(path: String, names: impl IntoIterator<Item = String>) -> Option<ImportLine> {
    let names: BTreeSet<String> = names.into_iter().collect();
    (!names.is_empty()).then(|| ImportLine {
        path,
        names: names.into_iter().collect(),
    })
}

/// `params.x`, or `params['x-y']` when the name is not an identifier
fn param_access(name: &str) -> String {
    if property_key(name) == name {
        format!("params.{}", name)
    } else {
        format!("params[{}]", js_string(name))
    }
}

// models

#[derive(Debug, Serialize)]
struct ModelField {
    key: String,
    zod: String,
    ts: String,
    optional: bool,
    description: Option<String>,
}

#[derive(Debug, Serialize)]
struct ModelContext<'a> {
    name: &'a str,
    domain: &'a str,
    schema_ident: String,
    type_ident: String,
    fields: Vec<ModelField>,
    alias_expr: Option<String>,
    values: Vec<String>,
    values_ident: String,
    imports: Vec<ImportLine>,
}

/// Path of a model file relative to the output directory
pub fn model_target(domain: &str, name: &str) -> PathBuf {
    PathBuf::from("models")
        .join(domain)
        .join(format!("{}.ts", sanitize_identifier(name)))
}

pub struct ModelBuilder;

impl ModelBuilder {
    fn context<'a>(
        compiled: &'a CompiledType,
        domain: &'a str,
        plan: &GenerationPlan,
        resolver: &ImportResolver<'_>,
    ) -> ModelContext<'a> {
        let references: Vec<(String, RefTarget)> = compiled
            .nested
            .iter()
            .map(|name| {
                let target = if plan.types.enums.contains(name) {
                    RefTarget::Enum
                } else {
                    RefTarget::Model
                };
                (name.clone(), target)
            })
            .collect();
        let imports = resolver.resolve(Origin::Model(domain), &references, Binding::Schema);

        let mut context = ModelContext {
            name: &compiled.name,
            domain,
            schema_ident: schema_ident(&compiled.name),
            type_ident: serializer_ident(&compiled.name),
            fields: Vec::new(),
            alias_expr: None,
            values: Vec::new(),
            values_ident: values_ident(&compiled.name),
            imports: group_lines(&imports),
        };
        match &compiled.kind {
            TypeKind::Object { fields } => {
                context.fields = fields
                    .iter()
                    .map(|f| ModelField {
                        key: property_key(&f.name),
                        zod: field_expr(f),
                        ts: ts_type(&f.schema),
                        optional: !f.required,
                        description: f.description.clone(),
                    })
                    .collect();
            }
            TypeKind::Enum { values } => {
                context.type_ident = sanitize_identifier(&compiled.name);
                context.values = values.iter().map(|v| js_string(v)).collect();
            }
            TypeKind::Alias { schema } => context.alias_expr = Some(zod_expr(schema)),
        }
        context
    }
}

impl FragmentBuilder for ModelBuilder {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Models
    }

    fn build(&self, plan: &GenerationPlan, config: &Config) -> crate::Result<Vec<Fragment>> {
        let resolver = resolver(plan, config);
        plan.types
            .types
            .values()
            .map(|compiled| {
                let domain = plan.domains.type_domain(&compiled.name);
                let context = Self::context(compiled, domain, plan, &resolver);
                let template = if compiled.is_enum() {
                    "enum.ts.tera"
                } else {
                    "model.ts.tera"
                };
                fragment(self.kind(), model_target(domain, &compiled.name), template, &context)
            })
            .collect()
    }
}

// params

#[derive(Debug, Serialize)]
struct InterfaceContext<'a> {
    name: &'a str,
    fields: Vec<InterfaceField<'a>>,
}

#[derive(Debug, Serialize)]
struct InterfaceField<'a> {
    key: String,
    ts_type: &'a str,
    optional: bool,
    location: ParamLocation,
    description: Option<&'a str>,
}

fn interface_context(interface: &ParamInterface) -> InterfaceContext<'_> {
    InterfaceContext {
        name: &interface.name,
        fields: interface
            .fields
            .iter()
            .map(|f| InterfaceField {
                key: property_key(&f.name),
                ts_type: &f.ts_type,
                optional: !f.required,
                location: f.location,
                description: f.description.as_deref(),
            })
            .collect(),
    }
}

fn param_references(group: &PlannedGroup) -> Vec<(String, RefTarget)> {
    let mut out: Vec<(String, RefTarget)> = Vec::new();
    for reference in group.param_interfaces().flat_map(|p| p.references.iter()) {
        if !out.contains(reference) {
            out.push(reference.clone());
        }
    }
    out
}

#[derive(Debug, Serialize)]
struct ParamsContext<'a> {
    group: &'a str,
    interfaces: Vec<InterfaceContext<'a>>,
    imports: Vec<ImportLine>,
}

pub struct ParamsBuilder;

impl FragmentBuilder for ParamsBuilder {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Params
    }

    fn build(&self, plan: &GenerationPlan, config: &Config) -> crate::Result<Vec<Fragment>> {
        let resolver = resolver(plan, config);
        plan.groups
            .iter()
            .filter(|group| group.param_interfaces().next().is_some())
            .map(|group| {
                let imports = resolver.resolve(
                    Origin::Artifact { depth: FLAT_DEPTH },
                    &param_references(group),
                    Binding::Type,
                );
                let context = ParamsContext {
                    group: &group.key,
                    interfaces: group.param_interfaces().map(interface_context).collect(),
                    imports: group_lines(&imports),
                };
                fragment(
                    self.kind(),
                    format!("params/{}.params.ts", group.file_stem),
                    "params.ts.tera",
                    &context,
                )
            })
            .collect()
    }
}

/// Module path of a group's parameter interfaces, seen from `depth`.
///
/// With params excluded the services module exports them instead.
fn params_module(group: &PlannedGroup, depth: usize, config: &Config, resolver: &ImportResolver<'_>) -> String {
    if config.is_enabled(ArtifactKind::Params) {
        resolver.artifact(depth, &format!("params/{}.params", group.file_stem))
    } else {
        resolver.artifact(depth, &services_module(group))
    }
}

fn services_module(group: &PlannedGroup) -> String {
    format!("services/{}/{}", group.file_stem, group.file_stem)
}

fn thunks_module(group: &PlannedGroup) -> String {
    format!("thunks/{}/{}.thunk", group.file_stem, group.file_stem)
}

fn interface_names(group: &PlannedGroup) -> impl Iterator<Item = String> + '_ {
    group.param_interfaces().map(|p| p.name.clone())
}

fn model_imports(
    group: &PlannedGroup,
    depth: usize,
    resolver: &ImportResolver<'_>,
) -> BTreeSet<ImportSpec> {
    let response_refs: Vec<(String, RefTarget)> = group
        .endpoints
        .iter()
        .flat_map(|e| e.references.iter().cloned())
        .collect();
    resolver.resolve(Origin::Artifact { depth }, &response_refs, Binding::Type)
}

// services

#[derive(Debug, Serialize)]
struct ServiceEndpoint<'a> {
    #[serde(flatten)]
    endpoint: &'a Endpoint,
    /// Template literal with `${params.x}` substitutions
    url: String,
    params_type: Option<&'a str>,
    query: Vec<String>,
    body: Option<String>,
}

impl<'a> ServiceEndpoint<'a> {
    fn new(endpoint: &'a Endpoint) -> Self {
        let url = endpoint
            .path
            .split('/')
            .map(|segment| match path_param_name(segment) {
                Some(name) => format!("${{encodeURIComponent(String({}))}}", param_access(name)),
                None => segment.to_string(),
            })
            .collect::<Vec<_>>()
            .join("/");
        let interface = endpoint.param_interface.as_ref();
        let query = interface
            .map(|p| {
                p.fields_in(ParamLocation::Query)
                    .map(|f| format!("{}: {}", property_key(&f.name), param_access(&f.name)))
                    .collect()
            })
            .unwrap_or_default();
        let body = interface.and_then(|p| {
            let form: Vec<String> = p
                .fields_in(ParamLocation::Form)
                .map(|f| format!("{}: {}", property_key(&f.name), param_access(&f.name)))
                .collect();
            if !form.is_empty() {
                Some(format!("{{ {} }}", form.join(", ")))
            } else {
                p.field(BODY_FIELD).map(|_| param_access(BODY_FIELD))
            }
        });
        Self {
            endpoint,
            url,
            params_type: interface.map(|p| p.name.as_str()),
            query,
            body,
        }
    }
}

#[derive(Debug, Serialize)]
struct ServiceContext<'a> {
    group: &'a PlannedGroup,
    endpoints: Vec<ServiceEndpoint<'a>>,
    /// Interfaces declared here when the params artifact is excluded
    local_interfaces: Vec<InterfaceContext<'a>>,
    imports: Vec<ImportLine>,
}

pub struct ServiceBuilder;

impl FragmentBuilder for ServiceBuilder {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Services
    }

    fn build(&self, plan: &GenerationPlan, config: &Config) -> crate::Result<Vec<Fragment>> {
        let resolver = resolver(plan, config);
        let params_enabled = config.is_enabled(ArtifactKind::Params);
        plan.groups
            .iter()
            .map(|group| {
                let mut imports = model_imports(group, NESTED_DEPTH, &resolver);
                let local_interfaces = if params_enabled {
                    Vec::new()
                } else {
                    imports.extend(resolver.resolve(
                        Origin::Artifact { depth: NESTED_DEPTH },
                        &param_references(group),
                        Binding::Type,
                    ));
                    group.param_interfaces().map(interface_context).collect()
                };
                let mut lines = group_lines(&imports);
                if params_enabled {
                    lines.extend(line(
                        params_module(group, NESTED_DEPTH, config, &resolver),
                        interface_names(group),
                    ));
                }
                let context = ServiceContext {
                    group,
                    endpoints: group.endpoints.iter().map(ServiceEndpoint::new).collect(),
                    local_interfaces,
                    imports: lines,
                };
                fragment(
                    self.kind(),
                    format!("{}.ts", services_module(group)),
                    "service.ts.tera",
                    &context,
                )
            })
            .collect()
    }
}

// thunks and hooks

#[derive(Debug, Serialize)]
struct GroupContext<'a> {
    group: &'a PlannedGroup,
    imports: Vec<ImportLine>,
    use_store: bool,
}

fn group_context<'a>(
    group: &'a PlannedGroup,
    depth: usize,
    upstream: Option<ImportLine>,
    config: &Config,
    resolver: &ImportResolver<'_>,
) -> GroupContext<'a> {
    let mut imports = group_lines(&model_imports(group, depth, resolver));
    imports.extend(line(params_module(group, depth, config, resolver), interface_names(group)));
    imports.extend(upstream);
    GroupContext {
        group,
        imports,
        use_store: config.is_enabled(ArtifactKind::Store),
    }
}

pub struct ThunkBuilder;

impl FragmentBuilder for ThunkBuilder {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Thunks
    }

    fn build(&self, plan: &GenerationPlan, config: &Config) -> crate::Result<Vec<Fragment>> {
        let resolver = resolver(plan, config);
        plan.groups
            .iter()
            .map(|group| {
                let services = line(
                    resolver.artifact(NESTED_DEPTH, &services_module(group)),
                    group.endpoints.iter().map(|e| e.name.clone()),
                );
                let context = group_context(group, NESTED_DEPTH, services, config, &resolver);
                fragment(
                    self.kind(),
                    format!("{}.ts", thunks_module(group)),
                    "thunk.ts.tera",
                    &context,
                )
            })
            .collect()
    }
}

pub struct HooksBuilder;

impl FragmentBuilder for HooksBuilder {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Hooks
    }

    fn build(&self, plan: &GenerationPlan, config: &Config) -> crate::Result<Vec<Fragment>> {
        let resolver = resolver(plan, config);
        plan.groups
            .iter()
            .map(|group| {
                let thunks = line(
                    resolver.artifact(FLAT_DEPTH, &thunks_module(group)),
                    group.endpoints.iter().map(|e| format!("{}Thunk", e.name)),
                );
                let context = group_context(group, FLAT_DEPTH, thunks, config, &resolver);
                fragment(
                    self.kind(),
                    format!("hooks/{}.hooks.ts", group.file_stem),
                    "hooks.ts.tera",
                    &context,
                )
            })
            .collect()
    }
}

// slices and store

/// Form-state slice of one object model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SliceSpec {
    /// Model name with `Upsert`/`GetToAlter` stripped
    pub name: String,
    pub model: String,
    pub ident: String,
    pub file: String,
    pub form_key: String,
    pub constant: String,
}

/// Slices for every object model, first model wins on a shared slice name
pub fn slice_specs(plan: &GenerationPlan) -> Vec<SliceSpec> {
    let mut seen = BTreeSet::new();
    plan.types
        .types
        .values()
        .filter(|t| matches!(t.kind, TypeKind::Object { .. }))
        .filter_map(|t| {
            let stripped = t
                .name
                .strip_suffix("Upsert")
                .or_else(|| t.name.strip_suffix("GetToAlter"))
                .filter(|s| !s.is_empty())
                .unwrap_or(&t.name);
            let name = sanitize_identifier(stripped);
            if !seen.insert(name.clone()) {
                log::debug!("Slice {} already generated; skipping {}", name, t.name);
                return None;
            }
            Some(SliceSpec {
                ident: to_lower_camel_case(&name),
                file: format!("{}Slice", name),
                form_key: format!("{}-form-slice", name),
                constant: name.to_uppercase(),
                model: t.name.clone(),
                name,
            })
        })
        .collect()
}

#[derive(Debug, Serialize)]
struct SliceContext<'a> {
    slice: &'a SliceSpec,
    type_ident: String,
    imports: Vec<ImportLine>,
}

pub struct SliceBuilder;

impl FragmentBuilder for SliceBuilder {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Slices
    }

    fn build(&self, plan: &GenerationPlan, config: &Config) -> crate::Result<Vec<Fragment>> {
        let resolver = resolver(plan, config);
        slice_specs(plan)
            .iter()
            .map(|slice| {
                let reference = [(slice.model.clone(), RefTarget::Model)];
                let imports = resolver.resolve(Origin::Artifact { depth: FLAT_DEPTH }, &reference, Binding::Type);
                let context = SliceContext {
                    slice,
                    type_ident: serializer_ident(&slice.model),
                    imports: group_lines(&imports),
                };
                fragment(
                    self.kind(),
                    format!("slices/{}.ts", slice.file),
                    "slice.ts.tera",
                    &context,
                )
            })
            .collect()
    }
}

#[derive(Debug, Serialize)]
struct StoreContext {
    slices: Vec<SliceSpec>,
}

pub struct StoreBuilder;

impl FragmentBuilder for StoreBuilder {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Store
    }

    fn build(&self, plan: &GenerationPlan, config: &Config) -> crate::Result<Vec<Fragment>> {
        let slices = if config.is_enabled(ArtifactKind::Slices) {
            slice_specs(plan)
        } else {
            Vec::new()
        };
        let context = StoreContext { slices };
        Ok(vec![
            fragment(self.kind(), "redux/store.ts", "store.ts.tera", &context)?,
            fragment(self.kind(), "redux/hooks.ts", "redux_hooks.ts.tera", &context)?,
        ])
    }
}

// tags

#[derive(Debug, Serialize)]
struct TagsContext {
    tags: Vec<String>,
}

pub struct TagsBuilder;

impl FragmentBuilder for TagsBuilder {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Tags
    }

    fn build(&self, plan: &GenerationPlan, _config: &Config) -> crate::Result<Vec<Fragment>> {
        let mut tags: Vec<String> = Vec::new();
        for group in &plan.groups {
            if !tags.contains(&group.cache_tag) {
                tags.push(group.cache_tag.clone());
            }
        }
        Ok(vec![fragment(
            self.kind(),
            "constants/tags.ts",
            "tags.ts.tera",
            &TagsContext { tags },
        )?])
    }
}
