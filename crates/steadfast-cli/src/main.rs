//! `steadfast` command-line interface.
//!
//! Prints check-in nudges and journaling prompt cards as JSON on stdout.
//! Logs go to stderr, filtered by `RUST_LOG` (default `info`).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

use steadfast_core::{
    CheckInContext, ContentLibrary, IdentityProfile, NudgeComposer, Persona, PromptRequest,
};
use steadfast_runtime::{PromptProvider, RuntimeConfig};

#[derive(Debug, Parser)]
#[command(name = "steadfast")]
#[command(about = "Grounding nudges and journaling prompts for student check-ins")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compose nudges for a check-in
    Suggest {
        /// Emotion tag (repeatable)
        #[arg(long = "emotion")]
        emotions: Vec<String>,

        /// Self-reported peer pressure
        #[arg(long, default_value_t = 0)]
        pressure: u32,

        /// Identity value (repeatable); ignored when --profile is given
        #[arg(long = "value")]
        values: Vec<String>,

        /// Identity profile file (YAML or JSON)
        #[arg(long)]
        profile: Option<PathBuf>,

        /// Content library override (YAML or JSON)
        #[arg(long)]
        content: Option<PathBuf>,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Generate one journaling prompt card
    Prompt {
        /// Persona tag; anything other than "explorer" means anchored
        #[arg(long, default_value = "anchored")]
        persona: String,

        #[arg(long, default_value = "")]
        intention: String,

        /// Identity value (repeatable)
        #[arg(long = "value")]
        values: Vec<String>,

        /// Content library override (YAML or JSON)
        #[arg(long)]
        content: Option<PathBuf>,

        /// Seed for the local deck draw
        #[arg(long)]
        seed: Option<u64>,

        /// Never contact the external provider
        #[arg(long, default_value_t = false)]
        local_only: bool,
    },

    /// Check a content library file against the schema
    ValidateContent {
        file: PathBuf,
    },

    /// Print the built-in content library
    ShowContent {
        #[arg(long, value_enum, default_value_t = Format::Yaml)]
        format: Format,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Yaml,
    Json,
}

fn load_library(path: Option<&Path>) -> Result<Arc<ContentLibrary>> {
    match path {
        Some(path) => {
            let library = ContentLibrary::from_file(path)
                .with_context(|| format!("Failed to load content library {}", path.display()))?;
            Ok(Arc::new(library))
        }
        None => Ok(ContentLibrary::builtin()),
    }
}

fn load_profile(path: &Path) -> Result<IdentityProfile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read profile {}", path.display()))?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let profile = if is_json {
        IdentityProfile::from_json(&contents)?
    } else {
        IdentityProfile::from_yaml(&contents)?
    };
    Ok(profile)
}

fn rng_for(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Suggest {
            emotions,
            pressure,
            values,
            profile,
            content,
            seed,
        } => {
            let composer = NudgeComposer::new(load_library(content.as_deref())?);
            let profile = match profile {
                Some(path) => Some(load_profile(&path)?),
                None if !values.is_empty() => Some(IdentityProfile::with_values(values)),
                None => None,
            };
            let context = CheckInContext::new(emotions, pressure);

            let nudges = composer.compose(&context, profile.as_ref(), &mut rng_for(seed));
            println!("{}", serde_json::to_string_pretty(&nudges)?);
        }

        Commands::Prompt {
            persona,
            intention,
            values,
            content,
            seed,
            local_only,
        } => {
            let config = if local_only {
                RuntimeConfig::local_only()
            } else {
                RuntimeConfig::from_env()
            };
            tracing::debug!(configured = config.is_configured(), timeout = ?config.timeout, "Runtime configuration");

            let mut builder = PromptProvider::builder()
                .config(config)
                .library(load_library(content.as_deref())?);
            if let Some(seed) = seed {
                builder = builder.seed(seed);
            }
            let provider = builder.build();

            let request =
                PromptRequest::new(Persona::from_tag(&persona), intention).with_values(values);
            let card = provider.generate_prompt(&request).await;
            println!("{}", serde_json::to_string_pretty(&card)?);
        }

        Commands::ValidateContent { file } => {
            let library = ContentLibrary::from_file(&file)
                .with_context(|| format!("{} is not a valid content library", file.display()))?;
            tracing::info!(
                file = %file.display(),
                anchored = library.deck(Persona::Anchored).len(),
                explorer = library.deck(Persona::Explorer).len(),
                reminders = library.value_reminders().len(),
                grounding = library.grounding_prompts().len(),
                "Content library is valid"
            );
            println!("ok");
        }

        Commands::ShowContent { format } => {
            let library = ContentLibrary::builtin();
            match format {
                Format::Yaml => print!("{}", serde_yaml::to_string(library.as_ref())?),
                Format::Json => println!("{}", serde_json::to_string_pretty(library.as_ref())?),
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    run(Cli::parse()).await
}
