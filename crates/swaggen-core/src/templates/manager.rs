//! Template loading, rendering and post-generation hooks

use std::error::Error as _;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value as JsonValue;
use tera::{Context, Tera};

use super::{TemplateDir, BUILTIN_TEMPLATES};
use crate::builders::Fragment;
use crate::error::{Error, Result};

/// Manages loading and rendering of code generation templates
#[derive(Debug, Clone)]
pub struct TemplateManager {
    /// Cached Tera template engine instance
    tera: Arc<Tera>,
    /// Override directory, if one was configured or discovered
    template_dir: Option<TemplateDir>,
}

impl TemplateManager {
    /// Create a TemplateManager holding the built-in templates, with any
    /// `.tera` file from the override directory replacing the one of the
    /// same name.
    pub async fn new(template_dir: Option<PathBuf>) -> Result<Self> {
        let template_dir = TemplateDir::discover(template_dir.as_deref())?;

        let mut tera = Tera::default();
        tera.add_raw_templates(BUILTIN_TEMPLATES.iter().copied())
            .map_err(|e| Error::template(format!("Failed to parse built-in templates: {}", describe(&e))))?;

        if let Some(dir) = &template_dir {
            let mut overrides = Vec::new();
            for path in Self::discover_template_files(dir.template_path()).await? {
                let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                log::info!("Using template override: {}", path.display());
                overrides.push((name.to_string(), tokio::fs::read_to_string(&path).await?));
            }
            tera.add_raw_templates(overrides).map_err(|e| {
                Error::template(format!(
                    "Failed to parse templates in {}: {}",
                    dir.display(),
                    describe(&e)
                ))
            })?;
        }

        Ok(Self {
            tera: Arc::new(tera),
            template_dir,
        })
    }

    pub fn template_dir(&self) -> Option<&TemplateDir> {
        self.template_dir.as_ref()
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template(name).is_ok()
    }

    /// `.tera` files directly inside `dir`, sorted by name
    pub async fn discover_template_files(dir: &Path) -> Result<Vec<PathBuf>> {
        let mut templates = Vec::new();
        let mut entries = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("tera") {
                templates.push(path);
            }
        }
        templates.sort();
        Ok(templates)
    }

    /// Render one template with a JSON object context
    pub fn render(&self, template_name: &str, context: &JsonValue) -> Result<String> {
        if !context.is_object() {
            return Err(Error::template(format!(
                "Context for template '{}' must be a JSON object",
                template_name
            )));
        }
        let tera_context = Context::from_value(context.clone())?;

        self.tera.render(template_name, &tera_context).map_err(|e| {
            log::error!("Template rendering failed for '{}': {}", template_name, e);
            Error::template(format!(
                "Failed to render template '{}': {}",
                template_name,
                describe(&e)
            ))
        })
    }

    /// Render the template a fragment names with the fragment's context
    pub fn render_fragment(&self, fragment: &Fragment) -> Result<String> {
        self.render(fragment.template, &fragment.context)
    }

    /// Write rendered content, creating parent directories
    pub async fn write_output(output_path: &Path, content: &str) -> Result<()> {
        let parent = output_path.parent().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Invalid output path: {}", output_path.display()),
            )
        })?;
        tokio::fs::create_dir_all(parent).await?;

        log::debug!("Writing {} ({} bytes)", output_path.display(), content.len());
        tokio::fs::write(output_path, content).await?;
        Ok(())
    }

    /// Run shell commands in `output_path`, stopping at the first failure
    pub async fn execute_post_generation_hooks(commands: &[String], output_path: &Path) -> Result<()> {
        use tokio::process::Command as AsyncCommand;

        for command in commands {
            log::info!("Running post-generation hook: {}", command);
            let output = AsyncCommand::new("sh")
                .arg("-c")
                .arg(command)
                .current_dir(output_path)
                .output()
                .await
                .map_err(|e| {
                    io::Error::new(
                        e.kind(),
                        format!("Failed to execute post-generation hook '{}': {}", command, e),
                    )
                })?;

            if !output.status.success() {
                return Err(Error::template(format!(
                    "Post-generation hook '{}' failed with status {}\n{}{}",
                    command,
                    output.status,
                    String::from_utf8_lossy(&output.stderr),
                    String::from_utf8_lossy(&output.stdout)
                )));
            }
        }
        Ok(())
    }
}

/// Tera nests the useful part of an error in its sources
fn describe(error: &tera::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
