use clap::{Parser, Subcommand};
use cli::{GenerateJob, init_settings, parse_commands};
use color_eyre::eyre::Result;
use smoothness::SmoothnessCommand;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a smoothness map from a diffuse image
    Generate {
        /// Path to the original diffuse image
        #[arg(short, long)]
        diffuse: PathBuf,
        /// Path to an edited diffuse image (used instead of the original when given)
        #[arg(long)]
        edited_diffuse: Option<PathBuf>,
        /// Path to the metallic map (flat non-metal when omitted)
        #[arg(short, long)]
        metallic: Option<PathBuf>,
        /// Project settings file (.json or .toml) to start from
        #[arg(short, long)]
        settings: Option<PathBuf>,
        /// Output path for the 16-bit smoothness map
        #[arg(short, long)]
        output: PathBuf,
        /// JSON parameter edit applied after loading settings (repeatable)
        #[arg(long = "apply")]
        apply: Vec<String>,
        /// Save the final settings to this file (.json or .toml)
        #[arg(long)]
        save_settings: Option<PathBuf>,
    },
    /// Write a project settings file with default values
    InitSettings {
        /// Output path (.json or .toml)
        #[arg(short, long)]
        output: PathBuf,
    },
    /// List the parameter edit commands
    Commands,
    /// Print the JSON schema of the parameter edit commands
    Schema,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            diffuse,
            edited_diffuse,
            metallic,
            settings,
            output,
            apply,
            save_settings,
        } => {
            let job = GenerateJob {
                diffuse,
                edited_diffuse,
                metallic,
                settings,
                output,
                commands: parse_commands(&apply)?,
                save_settings,
            };
            let report = job.run()?;
            info!(
                "Generated {}x{} smoothness map ({} blur runs, {} composite runs)",
                report.width, report.height, report.blur_runs, report.composite_runs
            );
        }
        Commands::InitSettings { output } => {
            init_settings(output.clone())?;
            info!("Default settings saved to: {:?}", output);
        }
        Commands::Commands => {
            for name in SmoothnessCommand::command_names() {
                println!("{name}");
            }
        }
        Commands::Schema => {
            let schema = SmoothnessCommand::schema();
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
    }

    Ok(())
}
