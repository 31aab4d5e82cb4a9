//! Resolution of the template override directory

use std::io;
use std::path::{Path, PathBuf};

use super::TEMPLATE_SET;

/// Environment variable naming an override directory
pub const TEMPLATE_DIR_ENV: &str = "SWAGGEN_TEMPLATE_DIR";

/// A directory of `.tera` files that override built-in templates by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateDir {
    /// Directory that was configured or discovered
    root_dir: PathBuf,
    /// Directory the templates are read from (`root_dir` or its
    /// `typescript_redux` subdirectory)
    template_path: PathBuf,
}

impl TemplateDir {
    pub fn new(root_dir: PathBuf) -> Self {
        let nested = root_dir.join(TEMPLATE_SET);
        let template_path = if root_dir.ends_with(TEMPLATE_SET) || !nested.is_dir() {
            root_dir.clone()
        } else {
            nested
        };
        Self {
            root_dir,
            template_path,
        }
    }

    /// Returns a displayable version of the template path
    pub fn display(&self) -> std::path::Display<'_> {
        self.template_path.display()
    }

    /// Find the override directory.
    ///
    /// An explicit directory must exist. Without one, `SWAGGEN_TEMPLATE_DIR`
    /// and then `~/.swaggen/templates` are tried; finding neither is not an
    /// error, the built-in templates are used as they are.
    pub fn discover(custom_dir: Option<&Path>) -> io::Result<Option<Self>> {
        if let Some(dir) = custom_dir {
            if !dir.is_dir() {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("Template directory not found: {}", dir.display()),
                ));
            }
            return Ok(Some(Self::new(dir.to_path_buf())));
        }
        Ok(Self::find_template_base_dir().map(Self::new))
    }

    fn find_template_base_dir() -> Option<PathBuf> {
        // 1. Check environment variable
        if let Ok(dir) = std::env::var(TEMPLATE_DIR_ENV) {
            let path = PathBuf::from(dir);
            if path.is_dir() {
                return Some(path);
            }
            log::warn!("{} points at a missing directory: {}", TEMPLATE_DIR_ENV, path.display());
        }

        // 2. Check in the user's home directory
        let templates_dir = dirs::home_dir()?.join(".swaggen").join("templates");
        templates_dir.is_dir().then_some(templates_dir)
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn template_path(&self) -> &Path {
        &self.template_path
    }
}
