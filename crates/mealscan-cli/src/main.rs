//! Mealscan CLI - classify food photos against a local model
//!
//! Examples:
//!   mealscan classify lunch.jpg --model models/food_fp16.onnx
//!   mealscan inspect --model models/food_fp16.onnx

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use mealscan_core::{Classification, ClassifierEngine, EngineConfig, TensorLayout};

/// Food-image classification against a local ONNX model
#[derive(Parser)]
#[command(
    name = "mealscan",
    about = "Classify food photos with a local model",
    version = env!("CARGO_PKG_VERSION"),
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the model artifact
    #[arg(long, global = true, value_name = "PATH")]
    model: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a single image file
    Classify {
        /// Image to classify (JPEG, PNG, ...)
        image: PathBuf,

        /// Number of ranked predictions to show
        #[arg(long, default_value_t = 5)]
        top: usize,

        /// Print the raw JSON result instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print the loaded model's derived signature
    Inspect,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = EngineConfig::default();
    if let Some(model) = cli.model {
        config.model_path = model;
    }

    match cli.command {
        Commands::Classify { image, top, json } => classify(config, &image, top, json),
        Commands::Inspect => inspect(config),
    }
}

fn classify(mut config: EngineConfig, image: &PathBuf, top: usize, json: bool) -> anyhow::Result<()> {
    config.top_k = top;
    let engine = ClassifierEngine::load(config).context("failed to load model")?;

    let bytes = std::fs::read(image)
        .with_context(|| format!("failed to read image {}", image.display()))?;
    let outcome = engine.classify(&bytes);

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return if outcome.is_success() {
            Ok(())
        } else {
            bail!("classification failed")
        };
    }

    match outcome {
        Classification::Success(ranked) => {
            println!(
                "{}  ({})",
                ranked.predicted_label, ranked.confidence_percentage
            );
            println!();
            for (rank, prediction) in ranked.top_predictions.iter().enumerate() {
                println!(
                    "  {}. {:<30} {}",
                    rank + 1,
                    prediction.label,
                    prediction.confidence_percentage
                );
            }
            Ok(())
        }
        Classification::Failure { stage, message } => {
            bail!("classification failed at {stage} stage: {message}")
        }
    }
}

fn inspect(config: EngineConfig) -> anyhow::Result<()> {
    let engine = ClassifierEngine::load(config).context("failed to load model")?;
    let signature = engine.signature();
    let input = &signature.input;

    println!("model:    {}", engine.model_name());
    println!(
        "input:    {}x{}x{} ({})",
        input.height,
        input.width,
        input.channels,
        match input.layout {
            TensorLayout::Nhwc => "NHWC",
            TensorLayout::Nchw => "NCHW",
        }
    );
    println!(
        "classes:  {}",
        signature
            .output
            .num_classes
            .map(|n| n.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    );
    println!(
        "labels:   {}{}",
        engine.labels().len(),
        if engine.labels().is_synthesized() {
            " (synthesized placeholders)"
        } else {
            ""
        }
    );
    Ok(())
}
