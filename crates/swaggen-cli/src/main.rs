//! swaggen CLI entrypoint
//! Parses command-line arguments and dispatches to the core generator.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use swaggen_core::{ArtifactKind, Config};
use tracing_subscriber::EnvFilter;

const PRETTIER_HOOK: &str = "npx prettier --write .";

#[derive(Parser)]
#[command(name = "swaggen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Generate a TypeScript client and Redux state from an OpenAPI spec
    Generate {
        /// Path or URL to the OpenAPI or Swagger document (YAML or JSON)
        ///
        /// Example: --url path/to/openapi.json
        /// Example: --url http://localhost:8000/openapi.json
        #[arg(short, long)]
        url: Option<String>,
        /// Output directory for generated code
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// YAML configuration file; flags override its values
        #[arg(long)]
        config: Option<PathBuf>,
        /// Remove the output directory before writing
        #[arg(short, long)]
        clean: bool,
        /// Artifact kinds to skip (models, params, services, thunks, slices, tags, hooks, store)
        #[arg(short, long, value_delimiter = ',', num_args = 1..)]
        exclude: Vec<ArtifactKind>,
        /// Path prefix shared by every route, e.g. `api` or `api/v1`
        #[arg(short = 'b', long)]
        api_base_path: Option<String>,
        /// Import models through the alias root instead of relative paths
        #[arg(long)]
        use_alias: bool,
        /// Directory with `.tera` files overriding the built-in templates
        #[arg(long)]
        template_dir: Option<PathBuf>,
        /// Run prettier over the output after writing
        #[arg(long)]
        prettier: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging; the fmt subscriber also picks up `log` records from the core
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Generate {
            url,
            output,
            config,
            clean,
            exclude,
            api_base_path,
            use_alias,
            template_dir,
            prettier,
        } => {
            let mut config = match &config {
                Some(path) => Config::from_file(path)
                    .await
                    .with_context(|| format!("Failed to load config file {}", path.display()))?,
                None => Config::default(),
            };

            if let Some(url) = url {
                config.spec_location = url;
            }
            if let Some(output) = output {
                config.output_dir = output.to_string_lossy().into_owned();
            }
            if let Some(base) = api_base_path {
                config.api_base_path = base;
            }
            if let Some(dir) = template_dir {
                config.template_dir = Some(dir.to_string_lossy().into_owned());
            }
            config.clean |= clean;
            config.alias_imports |= use_alias;
            for kind in exclude {
                if !config.exclude.contains(&kind) {
                    config.exclude.push(kind);
                }
            }
            if prettier && !config.post_generate.iter().any(|c| c == PRETTIER_HOOK) {
                config.post_generate.push(PRETTIER_HOOK.to_string());
            }

            config.validate().context("Invalid configuration")?;
            tracing::debug!("Resolved configuration: {:?}", config);
            tracing::info!("Loading spec from: {}", config.spec_location);

            let report = swaggen_core::generate(&config)
                .await
                .with_context(|| format!("Failed to generate from {}", config.spec_location))?;

            println!(
                "Generated {} files in {} ({} warnings)",
                report.written.len(),
                config.output_dir,
                report.warnings.len()
            );
        }
    }
    Ok(())
}
