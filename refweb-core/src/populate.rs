use crate::config::PopulationSettings;
use crate::engine::{GraphEngine, ReadMode};
use crate::error::{CoreError, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::task;
use tracing::{info, warn};

/// Options for configuring a population run
#[derive(Debug, Clone)]
pub struct PopulationOptions {
    pub depth: u32,
    pub max_storage_bytes: u64,
    pub pacing: Duration,
    pub denylist: Vec<String>,
    pub show_progress_bars: bool,
}

impl From<&PopulationSettings> for PopulationOptions {
    fn from(settings: &PopulationSettings) -> Self {
        Self {
            depth: settings.depth,
            max_storage_bytes: settings.max_storage_bytes,
            pacing: Duration::from_millis(settings.pacing_ms),
            denylist: settings.denylist.clone(),
            show_progress_bars: settings.show_progress_bars,
        }
    }
}

impl Default for PopulationOptions {
    fn default() -> Self {
        Self::from(&PopulationSettings::default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationFailure {
    pub name: String,
    pub reason: String,
}

/// Outcome of a population run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulationManifest {
    pub depth: u32,
    pub succeeded: usize,
    pub failed: Vec<PopulationFailure>,
    /// Candidates never attempted because the storage ceiling was reached
    pub skipped: usize,
    pub stopped_at_capacity: bool,
    pub initial_storage_bytes: Option<u64>,
    pub final_storage_bytes: Option<u64>,
}

/// Callback for reporting population progress
pub type PopulationProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Sequential batch driver that refreshes the cache for every document
pub struct Populator {
    engine: Arc<GraphEngine>,
    running: AtomicBool,
}

struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Populator {
    pub fn new(engine: Arc<GraphEngine>) -> Self {
        Self {
            engine,
            running: AtomicBool::new(false),
        }
    }

    pub fn engine(&self) -> &Arc<GraphEngine> {
        &self.engine
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Refresh every non-denylisted document at `options.depth`, stopping
    /// once the store reaches `options.max_storage_bytes`. Per-document
    /// failures are recorded in the manifest and never abort the run.
    pub async fn populate(
        &self,
        options: PopulationOptions,
        progress_callback: Option<PopulationProgressCallback>,
    ) -> Result<PopulationManifest> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(CoreError::PopulationInProgress);
        }
        let _guard = RunGuard(&self.running);

        let PopulationOptions {
            depth,
            max_storage_bytes,
            pacing,
            denylist,
            show_progress_bars,
        } = options;

        let report = |message: String| {
            if let Some(ref cb) = progress_callback {
                cb(message);
            }
        };

        let purge_terms = denylist.clone();
        match self.blocking(move |engine| engine.cache().purge_matching(&purge_terms)).await {
            Ok(removed) if removed > 0 => info!("Purged {} denylisted cache entries", removed),
            Ok(_) => {}
            Err(e) => warn!("Could not purge denylisted entries: {}", e),
        }

        let initial_storage_bytes = match self.storage_bytes().await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!("Could not read initial storage size: {}", e);
                None
            }
        };

        let candidates = self.engine.population_candidates(&denylist);
        let total = candidates.len();
        info!(
            "Starting population of {} documents at depth {} (ceiling {} bytes)",
            total, depth, max_storage_bytes
        );
        report(format!("Populating {} documents at depth {}", total, depth));

        let progress_bar = if show_progress_bars {
            let pb = ProgressBar::new(total as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=>-"),
            );
            Some(pb)
        } else {
            None
        };

        let mut manifest = PopulationManifest {
            depth,
            initial_storage_bytes,
            ..PopulationManifest::default()
        };

        for (index, name) in candidates.into_iter().enumerate() {
            if index > 0 && !pacing.is_zero() {
                tokio::time::sleep(pacing).await;
            }

            match self.storage_bytes().await {
                Ok(bytes) if bytes >= max_storage_bytes => {
                    manifest.stopped_at_capacity = true;
                    manifest.skipped = total - index;
                    warn!(
                        "Storage at {} bytes reached the {} byte ceiling; skipping {} documents",
                        bytes, max_storage_bytes, manifest.skipped
                    );
                    report(format!("Storage ceiling reached at {} bytes", bytes));
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("Size check failed before {:?}: {}", name, e);
                    manifest.failed.push(PopulationFailure {
                        name,
                        reason: e.to_string(),
                    });
                    if let Some(ref pb) = progress_bar {
                        pb.inc(1);
                    }
                    continue;
                }
            }

            if let Some(ref pb) = progress_bar {
                pb.set_message(name.clone());
            }

            let item = name.clone();
            let outcome = task::spawn_blocking({
                let engine = self.engine.clone();
                move || engine.connected_graph(&item, depth, ReadMode::Population)
            })
            .await;

            match outcome {
                Ok(Ok(_)) => {
                    manifest.succeeded += 1;
                    report(format!("Populated {}", name));
                }
                Ok(Err(e)) => {
                    warn!("Population of {:?} failed: {}", name, e);
                    report(format!("Failed {}: {}", name, e));
                    manifest.failed.push(PopulationFailure {
                        name,
                        reason: e.to_string(),
                    });
                }
                Err(join_error) => {
                    let reason = if join_error.is_panic() {
                        format!("task panicked: {}", join_error)
                    } else {
                        join_error.to_string()
                    };
                    warn!("Population of {:?} aborted: {}", name, reason);
                    report(format!("Failed {}: {}", name, reason));
                    manifest.failed.push(PopulationFailure { name, reason });
                }
            }

            if let Some(ref pb) = progress_bar {
                pb.inc(1);
            }
        }

        manifest.final_storage_bytes = match self.storage_bytes().await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!("Could not read final storage size: {}", e);
                None
            }
        };

        if let Some(pb) = progress_bar {
            pb.finish_with_message(format!(
                "done: {} succeeded, {} failed",
                manifest.succeeded,
                manifest.failed.len()
            ));
        }
        info!(
            "Population finished: {} succeeded, {} failed, {} skipped",
            manifest.succeeded,
            manifest.failed.len(),
            manifest.skipped
        );

        Ok(manifest)
    }

    async fn storage_bytes(&self) -> Result<u64> {
        self.blocking(|engine| engine.store().storage_bytes()).await
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&GraphEngine) -> Result<T> + Send + 'static,
    {
        let engine = self.engine.clone();
        task::spawn_blocking(move || f(&engine)).await?
    }
}
