use anyhow::Context;
use clap::Parser;
use csv_tidy::core::etl::TidyReport;
use csv_tidy::core::report;
use csv_tidy::domain::ports::ConfigProvider;
use csv_tidy::utils::error::ErrorSeverity;
use csv_tidy::utils::{logger, validation::Validate};
use csv_tidy::{CliConfig, LocalSink, TidyEngine, TidyError, TomlConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting csv-tidy");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let result = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path);
            let mut config = TomlConfig::from_file(path)
                .with_context(|| format!("failed to load config file '{}'", path))?;
            config.apply_overrides(cli.input.as_deref(), &cli.disable);
            execute(config).await
        }
        None => execute(cli.clone()).await,
    };

    match result {
        Ok(report) => {
            let snapshot = &report.snapshot;
            println!("Cleaned CSV saved to: {}", report.output_path);
            println!("{}", report::summary(snapshot));

            if let Some(limit) = cli.preview {
                println!("{}", report::preview_table(snapshot, limit));
            }
            if !snapshot.errors.is_empty() {
                println!("{}", report::error_table(&snapshot.errors));
            }
            if let Some(path) = &cli.errors_json {
                let json = serde_json::to_string_pretty(&snapshot.errors)
                    .map_err(TidyError::from)?;
                tokio::fs::write(path, json)
                    .await
                    .with_context(|| format!("failed to write error report to '{}'", path))?;
                tracing::info!("Error report written to {}", path);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!(
                "csv-tidy failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("{}", e.user_friendly_message());
            eprintln!("Suggestion: {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
            Ok(())
        }
    }
}

async fn execute<C>(config: C) -> Result<TidyReport, TidyError>
where
    C: ConfigProvider + Validate,
{
    config.validate()?;

    let sink = LocalSink::new(config.output_path().to_string());
    TidyEngine::new(config, sink).run().await
}
