use crate::core::session::{RunOutcome, Session};
use crate::core::transform::TransformPipeline;
use crate::domain::model::ParseSnapshot;
use crate::domain::ports::{ConfigProvider, ResultSink};
use crate::utils::error::{Result, TidyError};
use crate::utils::validation::validate_required_field;

#[derive(Debug, Clone)]
pub struct TidyReport {
    pub output_path: String,
    pub snapshot: ParseSnapshot,
}

/// Import → transform → parse → serialize → sink, once, from a config.
pub struct TidyEngine<C: ConfigProvider, S: ResultSink> {
    config: C,
    sink: S,
}

impl<C: ConfigProvider, S: ResultSink> TidyEngine<C, S> {
    pub fn new(config: C, sink: S) -> Self {
        Self { config, sink }
    }

    pub fn session(&self) -> Result<Session> {
        let pipeline = TransformPipeline::default();
        let selection = pipeline
            .default_selection()
            .without(self.config.disabled_transforms())?;

        Ok(Session::new(
            pipeline,
            self.config.parse_options(),
            self.config.serializer_options(),
            self.config.batch_size(),
        )
        .with_selection(selection))
    }

    pub async fn run(&self) -> Result<TidyReport> {
        let input = self.config.input_path().map(str::to_string);
        let input = validate_required_field("input", &input)?;
        let session = self.session()?;

        tracing::info!("Reading {}", input);
        let bytes = tokio::fs::read(input).await?;

        let mut progress = session.subscribe();
        let watcher = tokio::spawn(async move {
            while progress.changed().await.is_ok() {
                let snapshot = progress.borrow_and_update().clone();
                tracing::debug!(
                    "Run {}: {} rows processed{}",
                    snapshot.run,
                    snapshot.rows_processed,
                    if snapshot.complete { " (complete)" } else { "" }
                );
            }
        });

        let outcome = session.import(bytes).await;
        watcher.abort();

        let snapshot = match outcome? {
            RunOutcome::Completed(snapshot) => snapshot,
            RunOutcome::Superseded { run } => {
                return Err(TidyError::NotReady {
                    reason: format!("run {} was superseded", run),
                })
            }
        };

        for error in &snapshot.errors {
            tracing::warn!("Row {}: {}", error.row, error.message);
        }

        let output_path = session.export(&self.sink, self.config.file_name()).await?;
        Ok(TidyReport {
            output_path,
            snapshot,
        })
    }
}
