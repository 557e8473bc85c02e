mod config;
mod generate_cmd;
mod prompt_cmd;
mod serve_cmd;
#[cfg(test)]
mod test_util;

use std::sync::Arc;

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use lessonplan_core::LessonPlanService;
use lessonplan_core::gateway::{GatewayConfig, GeminiGateway};

use config::{LessonPlanConfig, Overrides};

#[derive(Parser)]
#[command(name = "lessonplan", about = "BNCC-aligned lesson plan generator")]
struct Cli {
    /// Model identifier (overrides LESSONPLAN_MODEL env var)
    #[arg(long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a lessonplan config file
    Init {
        /// Gemini API key to store (otherwise read GEMINI_API_KEY at runtime)
        #[arg(long)]
        api_key: Option<String>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Run the HTTP generation endpoint
    Serve {
        /// Address to bind (overrides LESSONPLAN_BIND)
        #[arg(long)]
        bind: Option<String>,
        /// Port to listen on (overrides LESSONPLAN_PORT)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Generate one lesson plan from a request body
    Generate {
        /// Path to a JSON request body, or `-` for stdin
        file: String,
    },
    /// Print the instruction the model would receive for a request body
    Prompt {
        /// Path to a JSON request body, or `-` for stdin
        file: String,
    },
    /// Print shell completions
    Completions {
        shell: Shell,
    },
}

fn cmd_init(api_key: Option<String>, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let has_key = api_key.is_some();
    let cfg = config::ConfigFile {
        model: config::ModelSection {
            api_key,
            name: Some(lessonplan_core::gateway::GenerationConfig::DEFAULT_MODEL.to_string()),
            timeout_secs: Some(GatewayConfig::DEFAULT_TIMEOUT_SECS),
            ..config::ModelSection::default()
        },
        server: config::ServerSection {
            bind: Some(config::DEFAULT_BIND.to_string()),
            port: Some(config::DEFAULT_PORT),
        },
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    if has_key {
        println!("  model.api_key = <set>");
    } else {
        println!("  model.api_key not set; export {} before serving.", config::API_KEY_ENV);
    }
    println!();
    println!("Next: run `lessonplan serve` to start the endpoint.");

    Ok(())
}

fn build_service(resolved: LessonPlanConfig) -> anyhow::Result<LessonPlanService> {
    if resolved.gateway.api_key.is_none() {
        tracing::warn!(
            "no model API key configured; generation requests will fail until {} is set",
            config::API_KEY_ENV
        );
    }
    let gateway = GeminiGateway::new(resolved.gateway).context("failed to build model gateway")?;
    Ok(LessonPlanService::new(Arc::new(gateway)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let model = cli.model.as_deref();

    match cli.command {
        Commands::Init { api_key, force } => {
            cmd_init(api_key, force)?;
        }
        Commands::Serve { bind, port } => {
            let resolved = LessonPlanConfig::resolve(Overrides {
                model,
                bind: bind.as_deref(),
                port,
            })?;
            let (bind, port) = (resolved.bind.clone(), resolved.port);
            let service = build_service(resolved)?;
            serve_cmd::run_serve(service, &bind, port).await?;
        }
        Commands::Generate { file } => {
            let resolved = LessonPlanConfig::resolve(Overrides {
                model,
                ..Overrides::default()
            })?;
            let body = generate_cmd::read_input(&file)?;
            let service = build_service(resolved)?;
            if !generate_cmd::run_generate(&service, &body).await? {
                std::process::exit(1);
            }
        }
        Commands::Prompt { file } => {
            let body = generate_cmd::read_input(&file)?;
            println!("{}", prompt_cmd::render_prompt(&body)?);
        }
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "lessonplan",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}
