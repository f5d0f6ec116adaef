//! The single "current result" of an interactive cleanup session.
//!
//! Every parse run gets a [`RunToken`]. Starting a run supersedes all earlier
//! tokens, and a run may only publish while its token is still the newest, so
//! a slow run can never overwrite the result of a newer one.

use crate::core::parser::ParseRun;
use crate::core::transform::{TransformPipeline, TransformSelection};
use crate::domain::model::{Artifact, ParseOptions, ParseSnapshot, RawDocument, SerializerOptions};
use crate::domain::ports::ResultSink;
use crate::utils::error::{Result, TidyError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio::sync::watch;

pub const DEFAULT_BATCH_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunToken {
    run: u64,
}

impl RunToken {
    pub fn id(&self) -> u64 {
        self.run
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed(ParseSnapshot),
    /// A newer run started before this one finished; nothing of it was kept.
    Superseded { run: u64 },
}

impl RunOutcome {
    pub fn completed(self) -> Option<ParseSnapshot> {
        match self {
            RunOutcome::Completed(snapshot) => Some(snapshot),
            RunOutcome::Superseded { .. } => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Inputs {
    document: RawDocument,
    selection: TransformSelection,
}

pub struct Session {
    pipeline: TransformPipeline,
    parse_options: ParseOptions,
    serializer_options: SerializerOptions,
    batch_size: usize,
    generation: AtomicU64,
    slot: watch::Sender<ParseSnapshot>,
    inputs: Mutex<Inputs>,
}

impl Session {
    pub fn new(
        pipeline: TransformPipeline,
        parse_options: ParseOptions,
        serializer_options: SerializerOptions,
        batch_size: usize,
    ) -> Self {
        let (slot, _) = watch::channel(ParseSnapshot::settled(0));
        let selection = pipeline.default_selection();

        Self {
            pipeline,
            parse_options,
            serializer_options,
            batch_size: batch_size.max(1),
            generation: AtomicU64::new(0),
            slot,
            inputs: Mutex::new(Inputs {
                document: RawDocument::default(),
                selection,
            }),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(
            TransformPipeline::default(),
            ParseOptions::default(),
            SerializerOptions::default(),
            DEFAULT_BATCH_SIZE,
        )
    }

    /// Replaces the initial all-enabled selection without starting a run.
    pub fn with_selection(self, selection: TransformSelection) -> Self {
        self.lock_inputs().selection = selection;
        self
    }

    /// Receives every snapshot the current run publishes.
    pub fn subscribe(&self) -> watch::Receiver<ParseSnapshot> {
        self.slot.subscribe()
    }

    pub fn current(&self) -> ParseSnapshot {
        self.slot.borrow().clone()
    }

    pub fn selection(&self) -> TransformSelection {
        self.lock_inputs().selection.clone()
    }

    pub fn document(&self) -> RawDocument {
        self.lock_inputs().document.clone()
    }

    fn lock_inputs(&self) -> std::sync::MutexGuard<'_, Inputs> {
        // Inputs are plain values; a poisoned lock still holds a usable copy.
        self.inputs.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Supersedes every earlier run and resets the slot to an empty snapshot.
    pub fn begin(&self) -> RunToken {
        let run = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.slot.send_replace(ParseSnapshot::empty(run));
        tracing::debug!("Started parse run {}", run);
        RunToken { run }
    }

    pub fn is_current(&self, token: &RunToken) -> bool {
        self.generation.load(Ordering::SeqCst) == token.run
    }

    /// Writes the snapshot only if `token` is still the newest run.
    pub fn publish(&self, token: &RunToken, snapshot: ParseSnapshot) -> bool {
        let published = self.slot.send_if_modified(|current| {
            if self.is_current(token) {
                *current = snapshot;
                true
            } else {
                false
            }
        });

        if !published {
            tracing::debug!("Dropped snapshot from superseded run {}", token.run);
        }
        published
    }

    /// Replaces the document and restarts parsing from scratch.
    ///
    /// Undecodable input clears the session and is returned as an error.
    pub async fn import(&self, bytes: Vec<u8>) -> Result<RunOutcome> {
        let document = match RawDocument::from_bytes(bytes) {
            Ok(document) => document,
            Err(e) => {
                self.lock_inputs().document = RawDocument::default();
                let token = self.begin();
                self.publish(&token, ParseSnapshot::settled(token.id()));
                tracing::error!("Import failed: {}", e);
                return Err(e);
            }
        };

        tracing::info!("Imported document ({} bytes)", document.as_str().len());
        self.lock_inputs().document = document;
        self.rerun().await
    }

    /// Switches one transform on or off and re-runs the pipeline.
    pub async fn set_transform(&self, id: &str, enabled: bool) -> Result<RunOutcome> {
        let selection = self.selection().with(id, enabled)?;
        tracing::info!("Transform '{}' {}", id, if enabled { "enabled" } else { "disabled" });
        self.lock_inputs().selection = selection;
        self.rerun().await
    }

    /// Applies the pipeline to the current document and parses the result,
    /// yielding to the scheduler between batches.
    pub async fn rerun(&self) -> Result<RunOutcome> {
        let token = self.begin();
        let (document, selection) = {
            let inputs = self.lock_inputs();
            (inputs.document.clone(), inputs.selection.clone())
        };
        let pre_parsed = self.pipeline.apply(&document, &selection);

        let mut run = ParseRun::new(
            token.id(),
            pre_parsed,
            self.parse_options,
            self.serializer_options,
        );

        while !run.is_exhausted() {
            let snapshot = run.advance(self.batch_size)?;
            if !self.publish(&token, snapshot) {
                return Ok(RunOutcome::Superseded { run: token.id() });
            }
            tokio::task::yield_now().await;
        }

        let finished = run.finish()?;
        if !self.publish(&token, finished.clone()) {
            return Ok(RunOutcome::Superseded { run: token.id() });
        }
        Ok(RunOutcome::Completed(finished))
    }

    /// Hands the serialized result of the current run to `sink`.
    pub async fn export(&self, sink: &dyn ResultSink, file_name: &str) -> Result<String> {
        let snapshot = self.current();
        if !snapshot.complete {
            return Err(TidyError::NotReady {
                reason: "parsing has not finished".to_string(),
            });
        }
        if snapshot.rows.is_empty() {
            return Err(TidyError::NotReady {
                reason: "the parsed result has no rows".to_string(),
            });
        }
        let serialized = snapshot.serialized.as_deref().ok_or_else(|| TidyError::NotReady {
            reason: "the result has not been serialized".to_string(),
        })?;

        let artifact = Artifact::from_text(file_name, serialized);
        tracing::info!("Exporting {} ({} bytes)", artifact.name, artifact.size);
        sink.deliver(&artifact).await
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::with_defaults()
    }
}
