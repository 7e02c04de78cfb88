//! Aggregation pipeline: discover files, process them on a bounded worker
//! pool, and fold every file's results into one run state.
//!
//! Each worker pulls one [`FileJob`] at a time from a bounded queue and runs
//! it to completion on the blocking thread pool with its own [`Dict`], so
//! tokenizing never takes a lock. The shared [`RunState`] (global dictionary,
//! progress and output sink) sits behind a single mutex that is taken once
//! per finished file and once per emitted field. The first worker error
//! aborts the run.

use crate::extractor::Extractor;
use crate::progress::{FileOutcome, RunSummary};
use logsift_core::{
    Config, Dict, DictPolicy, Error, Field, FieldSink, PartKind, ValueKind,
};
use logsift_feeds::{discover, FileJob};
use parking_lot::Mutex;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info};

// ---------------------------------------------------------------------------
// Shared run state
// ---------------------------------------------------------------------------

/// The only state shared between workers.
pub struct RunState<S> {
    pub dict: Dict,
    pub summary: RunSummary,
    pub sink: S,
}

impl<S> RunState<S> {
    /// Fold one finished file into the run. Called once per file.
    pub fn merge_result(&mut self, outcome: FileOutcome) -> Result<(), Error> {
        outcome.dict.merge_into(&mut self.dict)?;
        self.summary.record_file(&outcome);
        info!(
            file = %outcome.source.label(),
            entries = outcome.entries,
            dropped = outcome.dropped,
            bytes = outcome.bytes,
            "file complete"
        );
        Ok(())
    }
}

/// Per-worker handle forwarding fields to the shared sink under the run lock.
struct LockedSink<S> {
    state: Arc<Mutex<RunState<S>>>,
    /// `accepts` answers, computed once: `[part][kind]`.
    accepts: [[bool; 2]; 4],
}

fn part_index(part: PartKind) -> usize {
    match part {
        PartKind::Full => 0,
        PartKind::Name => 1,
        PartKind::Mids => 2,
        PartKind::Ends => 3,
    }
}

fn kind_index(kind: ValueKind) -> usize {
    match kind {
        ValueKind::Int => 0,
        ValueKind::String => 1,
    }
}

impl<S: FieldSink> LockedSink<S> {
    fn new(state: Arc<Mutex<RunState<S>>>) -> Self {
        let mut accepts = [[false; 2]; 4];
        {
            let guard = state.lock();
            for part in PartKind::ALL {
                for kind in ValueKind::ALL {
                    accepts[part_index(part)][kind_index(kind)] = guard.sink.accepts(part, kind);
                }
            }
        }
        Self { state, accepts }
    }
}

impl<S: FieldSink> FieldSink for LockedSink<S> {
    fn accepts(&self, part: PartKind, kind: ValueKind) -> bool {
        self.accepts[part_index(part)][kind_index(kind)]
    }

    fn emit(&mut self, field: &Field) -> io::Result<()> {
        let mut state = self.state.lock();
        state.sink.emit(field)?;
        state.summary.fields_emitted += 1;
        Ok(())
    }

    fn emit_raw(&mut self, lines: &[String]) -> io::Result<()> {
        self.state.lock().sink.emit_raw(lines)
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// What a finished run hands back.
pub struct RunReport<S> {
    pub dict: Dict,
    pub summary: RunSummary,
    pub sink: S,
}

pub struct Pipeline<S> {
    config: Config,
    dirs: Vec<PathBuf>,
    sink: S,
    dict_path: Option<PathBuf>,
}

impl<S: FieldSink + Send + 'static> Pipeline<S> {
    pub fn new(config: Config, dirs: Vec<PathBuf>, sink: S) -> Self {
        Self {
            config,
            dirs,
            sink,
            dict_path: None,
        }
    }

    /// Persist the global dictionary snapshot as JSON after the run.
    pub fn with_dict_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.dict_path = Some(path.into());
        self
    }

    pub async fn run(self) -> Result<RunReport<S>, Error> {
        let Pipeline {
            config,
            dirs,
            sink,
            dict_path,
        } = self;
        config.validate()?;

        let catalog = config.catalog();
        let found = tokio::task::spawn_blocking(move || discover(&dirs, &catalog))
            .await
            .map_err(|e| Error::Worker(e.to_string()))??;

        let policy = Arc::new(config.dict_policy());
        let value_types: Arc<[ValueKind]> = config.extract.value_types.clone().into();
        let workers = config.pipeline.effective_workers().min(found.jobs.len()).max(1);
        let queue_depth = config.pipeline.effective_queue_depth().max(1);

        let state = Arc::new(Mutex::new(RunState {
            dict: Dict::new(Arc::clone(&policy)),
            summary: RunSummary::from_discovery(&found),
            sink,
        }));

        info!(
            files = found.jobs.len(),
            workers,
            queue_depth,
            "starting workers"
        );

        let (tx, rx) = mpsc::channel::<FileJob>(queue_depth);
        let rx = Arc::new(tokio::sync::Mutex::new(rx));

        let mut set = JoinSet::new();
        for worker in 0..workers {
            let rx = Arc::clone(&rx);
            let state = Arc::clone(&state);
            let policy = Arc::clone(&policy);
            let value_types = Arc::clone(&value_types);
            set.spawn(async move {
                loop {
                    let next = rx.lock().await.recv().await;
                    let Some(job) = next else {
                        break;
                    };
                    debug!(worker, file = %job.source.label(), "picked up");

                    let shared = Arc::clone(&state);
                    let policy = Arc::clone(&policy);
                    let value_types = Arc::clone(&value_types);
                    let outcome = tokio::task::spawn_blocking(move || {
                        process_file(&job, &value_types, policy, shared)
                    })
                    .await
                    .map_err(|e| Error::Worker(e.to_string()))??;

                    state.lock().merge_result(outcome)?;
                }
                Ok::<(), Error>(())
            });
        }

        let jobs = found.jobs;
        let producer = tokio::spawn(async move {
            for job in jobs {
                // Every worker has gone away; the run is failing.
                if tx.send(job).await.is_err() {
                    break;
                }
            }
        });

        let mut first_error = None;
        while let Some(joined) = set.join_next().await {
            let result = joined.map_err(|e| Error::Worker(e.to_string())).and_then(|r| r);
            if let Err(e) = result {
                if first_error.is_none() {
                    first_error = Some(e);
                    set.abort_all();
                }
            }
        }
        producer.abort();
        if let Some(e) = first_error {
            return Err(e);
        }

        let state = Arc::try_unwrap(state)
            .map_err(|_| Error::Worker("run state still shared after workers finished".into()))?
            .into_inner();

        if let Some(path) = dict_path {
            write_snapshot(&path, &state.dict, &state.summary)?;
        }

        let summary = &state.summary;
        info!(
            files = summary.files_processed,
            skipped = summary.files_skipped,
            entries = summary.entries,
            dropped = summary.entries_dropped,
            fields = summary.fields_emitted,
            names = state.dict.len(),
            "run complete"
        );

        Ok(RunReport {
            dict: state.dict,
            summary: state.summary,
            sink: state.sink,
        })
    }
}

/// Segment and extract one file with a private dictionary.
fn process_file<S: FieldSink>(
    job: &FileJob,
    value_types: &[ValueKind],
    policy: Arc<DictPolicy>,
    state: Arc<Mutex<RunState<S>>>,
) -> Result<FileOutcome, Error> {
    let mut entries = logsift_feeds::open(job)?;
    let extractor = Extractor::new(job.meta, value_types, &job.source);
    let mut sink = LockedSink::new(state);
    let mut outcome = FileOutcome::new(Arc::clone(&job.source), Dict::new(policy));

    for entry in entries.by_ref() {
        let entry = entry.map_err(|e| Error::io(job.source.path(), e))?;
        outcome.entries += 1;
        match extractor.extract(&entry, &mut outcome.dict, &mut sink)? {
            Some(ts) => outcome.observe(ts),
            None => outcome.dropped += 1,
        }
    }
    outcome.bytes = entries.offset();
    if outcome.dropped > 0 {
        debug!(
            file = %job.source.label(),
            dropped = outcome.dropped,
            "entries without a matching prefix were dropped"
        );
    }
    Ok(outcome)
}

fn write_snapshot(path: &std::path::Path, dict: &Dict, summary: &RunSummary) -> Result<(), Error> {
    let file = std::fs::File::create(path).map_err(|e| Error::io(path, e))?;
    let snapshot = dict.snapshot(summary.min_timestamp, summary.max_timestamp);
    serde_json::to_writer_pretty(BufWriter::new(file), &snapshot)?;
    info!(path = %path.display(), names = dict.len(), "dictionary written");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
