use anyhow::Context;
use clap::Parser;
use std::io::Read;
use tracing::info;
use truthlens_classifiers::{
    clean_text, ClassicalPreprocessor, EnsembleConfig, EnsemblePipeline, PreprocessOptions,
};
use truthlens_cli::cli::{apply_overrides, Cli, Commands};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Predict {
            config,
            text,
            mode,
            models_dir,
            device,
            breakdown,
            pretty,
            verbose,
        } => {
            init_logging(verbose);

            let loaded = EnsembleConfig::load(config.as_deref())?;
            let config = apply_overrides(loaded, models_dir, device);
            let mut pipeline = EnsemblePipeline::from_config(&config)?;
            if breakdown {
                pipeline = pipeline.with_breakdown(true);
            }

            let text = read_input(text)?;
            let result = pipeline.predict_with_mode(&text, mode)?;
            info!(
                label = %result.final_prediction,
                confidence = result.confidence,
                "Prediction complete"
            );

            let json = if pretty {
                serde_json::to_string_pretty(&result)?
            } else {
                serde_json::to_string(&result)?
            };
            println!("{}", json);
        }

        Commands::Check {
            config,
            models_dir,
            verbose,
        } => {
            init_logging(verbose);

            let loaded = EnsembleConfig::load(config.as_deref())?;
            let config = apply_overrides(loaded, models_dir, None);
            let pipeline = EnsemblePipeline::from_config(&config)?;
            println!(
                "{}",
                serde_json::to_string_pretty(pipeline.context().summary())?
            );
        }

        Commands::Clean {
            text,
            no_stem,
            keep_stopwords,
        } => {
            let text = read_input(text)?;
            let preprocessor = ClassicalPreprocessor::new(PreprocessOptions {
                apply_stemming: !no_stem,
                remove_stopwords: !keep_stopwords,
            });

            println!("normalized:   {}", clean_text(&text));
            println!("preprocessed: {}", preprocessor.preprocess(&text));
        }
    }

    Ok(())
}

/// Use `--text` when given, otherwise all of stdin
fn read_input(text: Option<String>) -> anyhow::Result<String> {
    match text {
        Some(text) => Ok(text),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read text from stdin")?;
            Ok(buf)
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        "truthlens_cli=debug,truthlens_classifiers=debug"
    } else {
        "truthlens_cli=warn,truthlens_classifiers=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
