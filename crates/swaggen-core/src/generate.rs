//! Code generation functionality for swaggen

use std::path::{Path, PathBuf};

use crate::{
    builders::Fragments,
    config::Config,
    error::{Result, Warning},
    openapi::OpenApiContext,
    plan::plan,
    templates::TemplateManager,
};

/// What a generation run produced
#[derive(Debug, Clone, Default)]
pub struct GenerationReport {
    /// Written files, in emission order
    pub written: Vec<PathBuf>,
    pub warnings: Vec<Warning>,
}

/// Main entry point for code generation
pub async fn generate(config: &Config) -> Result<GenerationReport> {
    config.validate()?;

    // 1. Load the specification document
    let spec = OpenApiContext::from_file_or_url(&config.spec_location).await?;

    // 2. Plan, render and write
    generate_from_spec(&spec, config).await
}

/// Generate from an already loaded document.
///
/// Every fragment is rendered before anything touches the output directory,
/// so a template failure never leaves a cleaned but empty tree behind.
pub async fn generate_from_spec(spec: &OpenApiContext, config: &Config) -> Result<GenerationReport> {
    config.validate()?;

    let plan = plan(spec, config)?;
    if !plan.warnings.is_empty() {
        log::warn!("Planning finished with {} warnings", plan.warnings.len());
    }

    let fragments = Fragments::build_all(&plan, config)?;
    let template_manager = TemplateManager::new(config.template_dir.as_ref().map(PathBuf::from)).await?;

    let output_dir = Path::new(&config.output_dir);
    let rendered = fragments
        .iter()
        .map(|fragment| Ok((output_dir.join(&fragment.target), template_manager.render_fragment(fragment)?)))
        .collect::<Result<Vec<_>>>()?;

    if config.clean && tokio::fs::try_exists(output_dir).await? {
        log::info!("Cleaning output directory: {}", output_dir.display());
        tokio::fs::remove_dir_all(output_dir).await?;
    }
    tokio::fs::create_dir_all(output_dir).await?;

    let mut written = Vec::with_capacity(rendered.len());
    for (path, content) in rendered {
        TemplateManager::write_output(&path, &content).await?;
        written.push(path);
    }
    log::info!("Wrote {} files to {}", written.len(), output_dir.display());

    // 3. Post-generation hooks
    TemplateManager::execute_post_generation_hooks(&config.post_generate, output_dir).await?;

    Ok(GenerationReport {
        written,
        warnings: plan.warnings,
    })
}
