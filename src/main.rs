//! Premium AutoML - Main Entry Point

use clap::Parser;
use premium_automl::cli::{cmd_predict, cmd_records, cmd_train, Cli, Commands, PredictArgs};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "premium_automl=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train { config, data, artifacts } => {
            cmd_train(config.as_deref(), data.as_deref(), artifacts.as_deref())?;
        }
        Commands::Predict {
            age,
            sex,
            bmi,
            children,
            smoker,
            region,
            save,
            name,
            artifacts,
            log_dir,
        } => {
            let fields = PredictArgs {
                age: &age,
                sex: &sex,
                bmi: &bmi,
                children: &children,
                smoker: &smoker,
                region: &region,
            };
            cmd_predict(&fields, save, name.as_deref(), &artifacts, &log_dir)?;
        }
        Commands::Records { artifacts } => {
            cmd_records(&artifacts)?;
        }
    }

    Ok(())
}
