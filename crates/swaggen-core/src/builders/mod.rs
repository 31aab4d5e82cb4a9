//! Fragment builders: turn the generation plan into template contexts.
pub mod typescript;

use std::path::PathBuf;

use serde_json::Value as JsonValue;

use crate::config::{ArtifactKind, Config};
use crate::plan::GenerationPlan;

/// One output file before rendering
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub kind: ArtifactKind,
    /// Path relative to the output directory
    pub target: PathBuf,
    /// Name of the template that renders it
    pub template: &'static str,
    pub context: JsonValue,
}

/// Trait for converting a generation plan into the fragments of one artifact kind.
pub trait FragmentBuilder {
    fn kind(&self) -> ArtifactKind;

    fn build(&self, plan: &GenerationPlan, config: &Config) -> crate::Result<Vec<Fragment>>;
}

pub struct Fragments;

impl Fragments {
    /// Build the fragments of every artifact kind `config` leaves enabled,
    /// in emission order.
    pub fn build_all(plan: &GenerationPlan, config: &Config) -> crate::Result<Vec<Fragment>> {
        let mut fragments = Vec::new();
        for kind in ArtifactKind::all() {
            if !config.is_enabled(kind) {
                log::debug!("Skipping excluded artifact kind: {}", kind);
                continue;
            }
            let built = Self::get_builder(kind).build(plan, config)?;
            log::debug!("Built {} {} fragments", built.len(), kind);
            fragments.extend(built);
        }
        Ok(fragments)
    }

    pub fn get_builder(kind: ArtifactKind) -> Box<dyn FragmentBuilder> {
        match kind {
            ArtifactKind::Models => Box::new(typescript::ModelBuilder),
            ArtifactKind::Params => Box::new(typescript::ParamsBuilder),
            ArtifactKind::Services => Box::new(typescript::ServiceBuilder),
            ArtifactKind::Thunks => Box::new(typescript::ThunkBuilder),
            ArtifactKind::Slices => Box::new(typescript::SliceBuilder),
            ArtifactKind::Tags => Box::new(typescript::TagsBuilder),
            ArtifactKind::Hooks => Box::new(typescript::HooksBuilder),
            ArtifactKind::Store => Box::new(typescript::StoreBuilder),
        }
    }
}
