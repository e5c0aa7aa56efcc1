use clap::{Parser, Subcommand};
use std::path::PathBuf;
use truthlens_classifiers::EnsembleConfig;
use truthlens_core::PredictionMode;

#[derive(Parser, Debug)]
#[command(name = "truthlens")]
#[command(author, version, about = "Ensemble fake/real news classifier")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify a text (from --text or stdin) and print the result as JSON
    Predict {
        /// Configuration file (defaults to ./truthlens.yaml if present)
        #[arg(short, long, env = "TRUTHLENS_CONFIG")]
        config: Option<PathBuf>,

        /// Text to classify; read from stdin when absent
        #[arg(short, long)]
        text: Option<String>,

        /// Deciding model: ensemble, classical or transformer
        #[arg(short, long, default_value = "ensemble", value_parser = parse_mode)]
        mode: PredictionMode,

        /// Override the models directory
        #[arg(long)]
        models_dir: Option<PathBuf>,

        /// Override the inference device (cpu, cuda, metal)
        #[arg(long)]
        device: Option<String>,

        /// Include per-model votes
        #[arg(short, long)]
        breakdown: bool,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,

        /// Enable verbose logging
        #[arg(short, long)]
        verbose: bool,
    },

    /// Load and validate every artifact, then print a summary
    Check {
        /// Configuration file (defaults to ./truthlens.yaml if present)
        #[arg(short, long, env = "TRUTHLENS_CONFIG")]
        config: Option<PathBuf>,

        /// Override the models directory
        #[arg(long)]
        models_dir: Option<PathBuf>,

        /// Enable verbose logging
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the normalized text and the classical preprocessing string
    Clean {
        /// Text to clean; read from stdin when absent
        #[arg(short, long)]
        text: Option<String>,

        /// Skip stemming
        #[arg(long)]
        no_stem: bool,

        /// Keep English stopwords
        #[arg(long)]
        keep_stopwords: bool,
    },
}

fn parse_mode(s: &str) -> Result<PredictionMode, String> {
    s.parse()
}

/// Apply command-line overrides on top of a loaded configuration
pub fn apply_overrides(
    mut config: EnsembleConfig,
    models_dir: Option<PathBuf>,
    device: Option<String>,
) -> EnsembleConfig {
    if let Some(dir) = models_dir {
        config.artifacts.models_dir = dir;
    }
    if let Some(device) = device {
        config.inference.device = device;
    }
    config
}
