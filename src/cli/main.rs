use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use diabetes_risk::{
    config::Config,
    ml::{ArtifactPair, PredictionService, Trainer},
    models::PatientRecord,
    observability::init_tracing,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "diabetes-risk-cli")]
#[command(about = "Diabetes risk trainer and offline predictor", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file layered over the built-in defaults
    #[arg(short, long, env = "CONFIG_PATH", default_value = "config/default.toml")]
    config: PathBuf,

    /// Override the scaler artifact path
    #[arg(long, global = true)]
    scaler: Option<PathBuf>,

    /// Override the model artifact path
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a model and write the artifact pair
    Train {
        /// Labeled CSV dataset
        #[arg(short, long)]
        dataset: Option<PathBuf>,

        /// Seed for minority oversampling
        #[arg(long)]
        seed: Option<u64>,

        /// Cross-validation folds
        #[arg(long)]
        folds: Option<usize>,

        /// Write the training report as JSON
        #[arg(short, long)]
        report: Option<PathBuf>,
    },

    /// Classify one patient record with the artifact pair
    Predict {
        #[command(flatten)]
        record: RecordArgs,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the metadata stored with the artifact pair
    Inspect,
}

/// All eight measurements are required
#[derive(Args)]
struct RecordArgs {
    #[arg(long)]
    pregnancies: f64,

    #[arg(long)]
    glucose: f64,

    #[arg(long)]
    blood_pressure: f64,

    #[arg(long)]
    skin_thickness: f64,

    #[arg(long)]
    insulin: f64,

    #[arg(long)]
    bmi: f64,

    #[arg(long)]
    diabetes_pedigree: f64,

    #[arg(long)]
    age: f64,
}

impl From<RecordArgs> for PatientRecord {
    fn from(args: RecordArgs) -> Self {
        PatientRecord::from_features([
            args.pregnancies,
            args.glucose,
            args.blood_pressure,
            args.skin_thickness,
            args.insulin,
            args.bmi,
            args.diabetes_pedigree,
            args.age,
        ])
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load_from(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;
    if let Some(path) = cli.scaler {
        config.artifacts.scaler_path = path;
    }
    if let Some(path) = cli.model {
        config.artifacts.model_path = path;
    }

    init_tracing(&config.observability);

    match cli.command {
        Commands::Train {
            dataset,
            seed,
            folds,
            report,
        } => {
            if let Some(dataset) = dataset {
                config.training.dataset_path = dataset;
            }
            if let Some(seed) = seed {
                config.training.random_seed = seed;
            }
            if let Some(folds) = folds {
                config.training.cv_folds = folds;
            }

            let trainer = Trainer::new(config.training.clone());
            let (pair, training_report) = trainer.run().with_context(|| {
                format!(
                    "training on {} failed",
                    config.training.dataset_path.display()
                )
            })?;

            pair.save(&config.artifacts.scaler_path, &config.artifacts.model_path)
                .context("failed to save artifact pair")?;

            if let Some(path) = report {
                training_report
                    .write_json(&path)
                    .with_context(|| format!("failed to write report to {}", path.display()))?;
                tracing::info!(path = %path.display(), "Training report written");
            }

            println!(
                "Best parameters: {} (cv accuracy {:.4})",
                training_report.best_params, training_report.best_cv_accuracy
            );
            println!("Scaler: {}", config.artifacts.scaler_path.display());
            println!("Model:  {}", config.artifacts.model_path.display());
        }

        Commands::Predict { record, json } => {
            let service = PredictionService::load(&config.artifacts)
                .context("failed to load artifact pair")?;
            let record = PatientRecord::from(record);
            let prediction = service.predict(&record)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&prediction)?);
            } else {
                println!("{}", prediction.value.headline());
                println!("{}", prediction.value.advice());
            }
        }

        Commands::Inspect => {
            let pair = ArtifactPair::load(&config.artifacts.scaler_path, &config.artifacts.model_path)
                .context("failed to load artifact pair")?;
            println!("{}", serde_json::to_string_pretty(&pair.info())?);
        }
    }

    Ok(())
}
