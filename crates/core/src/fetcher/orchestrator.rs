//! Spawns and supervises the external download utility, driving queue
//! entries through their lifecycle.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::Utc;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::{broadcast, oneshot};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::catalog::CatalogError;
use crate::metadata::EpisodeCache;
use crate::metrics;
use crate::naming;
use crate::queue::{HistoryStore, QueueEntry, QueueStatus, QueueStore};

use super::config::FetcherConfig;
use super::progress::parse_progress;

/// Marker file written into a pid's working directory before spawning;
/// its presence identifies directories owned by this orchestrator.
pub const START_MARKER: &str = ".grab-started";

const STDERR_TAIL_LINES: usize = 20;

/// Errors surfaced synchronously by `download`.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Unknown pid: {0}")]
    UnknownPid(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Download utility not found at {path}")]
    ExecutableNotFound { path: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Shared handles needed by the supervision tasks.
#[derive(Clone)]
struct FetchContext {
    config: Arc<FetcherConfig>,
    queue: Arc<QueueStore>,
    history: Arc<HistoryStore>,
    active: Arc<Mutex<HashMap<String, oneshot::Sender<()>>>>,
}

/// Launches the external download utility per accepted pid and tracks the
/// resulting processes.
pub struct DownloadFetcher {
    ctx: FetchContext,
    episodes: Arc<EpisodeCache>,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl DownloadFetcher {
    pub fn new(
        config: FetcherConfig,
        queue: Arc<QueueStore>,
        history: Arc<HistoryStore>,
        episodes: Arc<EpisodeCache>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            ctx: FetchContext {
                config: Arc::new(config),
                queue,
                history,
                active: Arc::new(Mutex::new(HashMap::new())),
            },
            episodes,
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        }
    }

    /// Accept a download and start it asynchronously.
    ///
    /// Invalid input (a pid the catalog does not know) is surfaced here;
    /// everything after acceptance is reported through the queue.
    pub async fn download(&self, pid: &str, app_id: Option<&str>) -> Result<(), FetchError> {
        if let Some(existing) = self.ctx.queue.get(pid) {
            if !existing.status.is_terminal() {
                info!("Pid {} is already queued, ignoring duplicate request", pid);
                return Ok(());
            }
        }

        let details = self
            .episodes
            .details(pid)
            .await?
            .ok_or_else(|| FetchError::UnknownPid(pid.to_string()))?;

        let nzb_name = naming::release_name(
            &details.title,
            details.kind,
            details.series,
            details.episode,
            details.episode_title.as_deref(),
            None,
        );

        let mut entry = QueueEntry::new(pid, nzb_name, details.kind).with_details(details);
        if let Some(app_id) = app_id {
            entry = entry.with_app_id(app_id);
        }
        self.ctx.queue.insert(entry);

        let (kill_tx, kill_rx) = oneshot::channel();
        self.ctx
            .active
            .lock()
            .unwrap()
            .insert(pid.to_string(), kill_tx);

        metrics::DOWNLOADS_STARTED.inc();
        info!("Accepted download for pid {}", pid);

        tokio::spawn(run_download(self.ctx.clone(), pid.to_string(), kill_rx));

        Ok(())
    }

    /// Best-effort termination. Safe in every queue state for the pid,
    /// including none at all; calling it twice is a no-op the second time.
    pub async fn cancel(&self, pid: &str) {
        let handle = self.ctx.active.lock().unwrap().remove(pid);

        if let Some(kill_tx) = handle {
            // The supervision task drives the entry to Cancelled.
            let _ = kill_tx.send(());
            info!("Cancel signalled for pid {}", pid);
            return;
        }

        // No live process: archive whatever entry is left.
        if let Some(entry) = self.ctx.queue.remove(pid) {
            metrics::DOWNLOADS_CANCELLED.inc();
            if let Err(e) = self.ctx.history.add_archive(entry).await {
                warn!("Failed to archive cancelled pid {}: {}", pid, e);
            }
        } else {
            debug!("Cancel for unknown pid {} is a no-op", pid);
        }
    }

    /// Spawn the utility's cache-rebuild invocation asynchronously; on
    /// completion, orphaned working directories are reconciled.
    pub fn refresh_cache(&self) {
        tokio::spawn(run_refresh(self.ctx.clone()));
    }

    /// Reconcile working directories left behind by processes that died
    /// without reaching a terminal queue transition. Idempotent.
    pub async fn cleanup_failed_downloads(&self) {
        cleanup_orphans(&self.ctx).await;
    }

    /// Start the periodic cache-refresh schedule.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Fetcher already running");
            return;
        }

        let interval_hours = self.ctx.config.refresh_interval_hours;
        if interval_hours == 0 {
            info!("Cache refresh schedule disabled");
            return;
        }

        let ctx = self.ctx.clone();
        let running = Arc::clone(&self.running);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!("Cache refresh schedule started ({}h interval)", interval_hours);
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Cache refresh schedule received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(Duration::from_secs(interval_hours * 3600)) => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                        run_refresh(ctx.clone()).await;
                    }
                }
            }
        });
    }

    /// Stop the refresh schedule.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        let _ = self.shutdown_tx.send(());
    }
}

enum SuperviseEnd {
    Exited(std::process::ExitStatus),
    Killed,
    TimedOut,
}

enum Outcome {
    Complete,
    Cancelled,
    Failed(String),
}

async fn run_download(ctx: FetchContext, pid: String, mut kill_rx: oneshot::Receiver<()>) {
    // A cancel may have landed between acceptance and here.
    match kill_rx.try_recv() {
        Ok(()) => {
            finalize_cancel(&ctx, &pid).await;
            return;
        }
        Err(oneshot::error::TryRecvError::Closed) => return,
        Err(oneshot::error::TryRecvError::Empty) => {}
    }

    if ctx
        .queue
        .update(&pid, |e| e.status = QueueStatus::Downloading)
        .is_none()
    {
        // Entry vanished before the process started.
        ctx.active.lock().unwrap().remove(&pid);
        return;
    }

    let started = Instant::now();
    let outcome = match supervise(&ctx, &pid, &mut kill_rx).await {
        Ok(outcome) => outcome,
        Err(e) => Outcome::Failed(e.to_string()),
    };

    ctx.active.lock().unwrap().remove(&pid);

    match outcome {
        Outcome::Complete => {
            let entry = ctx.queue.update(&pid, |e| {
                e.status = QueueStatus::Complete;
                e.size_left_bytes = Some(0);
                e.eta_secs = Some(0);
            });

            if let Some(entry) = entry {
                ctx.queue.remove(&pid);
                if let Err(e) = ctx.history.add_history(entry).await {
                    warn!("Failed to persist history for pid {}: {}", pid, e);
                }
            }

            metrics::DOWNLOADS_COMPLETED.inc();
            metrics::DOWNLOAD_DURATION
                .with_label_values(&["success"])
                .observe(started.elapsed().as_secs_f64());
            info!("Download of pid {} complete", pid);
        }
        Outcome::Cancelled => {
            finalize_cancel(&ctx, &pid).await;
        }
        Outcome::Failed(reason) => {
            // Retained in the queue for operator visibility.
            ctx.queue.update(&pid, |e| e.status = QueueStatus::Failed);
            metrics::DOWNLOADS_FAILED.inc();
            metrics::DOWNLOAD_DURATION
                .with_label_values(&["failed"])
                .observe(started.elapsed().as_secs_f64());
            error!("Download of pid {} failed: {}", pid, reason);
        }
    }
}

async fn supervise(
    ctx: &FetchContext,
    pid: &str,
    kill_rx: &mut oneshot::Receiver<()>,
) -> Result<Outcome, FetchError> {
    let work_dir = ctx.config.work_dir(pid);
    tokio::fs::create_dir_all(&work_dir).await?;
    tokio::fs::write(work_dir.join(START_MARKER), Utc::now().to_rfc3339()).await?;

    let args = ctx.config.download_args(pid, &work_dir);
    debug!("Spawning {:?} {:?}", ctx.config.executable, args);

    let mut child = Command::new(&ctx.config.executable)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                FetchError::ExecutableNotFound {
                    path: ctx.config.executable.to_string_lossy().to_string(),
                }
            } else {
                FetchError::Io(e)
            }
        })?;

    let stdout = child.stdout.take().expect("stdout is piped");
    let stderr = child.stderr.take().expect("stderr is piped");

    // Stderr is logged, never fatal by itself; keep a tail for diagnostics.
    let stderr_task = tokio::spawn(async move {
        let mut tail: Vec<String> = Vec::new();
        let mut lines = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            debug!("fetcher stderr: {}", line);
            if tail.len() == STDERR_TAIL_LINES {
                tail.remove(0);
            }
            tail.push(line);
        }
        tail
    });

    let mut lines = BufReader::new(stdout).lines();
    let deadline = Duration::from_secs(ctx.config.timeout_secs);

    let result = timeout(deadline, async {
        loop {
            tokio::select! {
                _ = &mut *kill_rx => {
                    let _ = child.kill().await;
                    return Ok::<SuperviseEnd, std::io::Error>(SuperviseEnd::Killed);
                }
                line = lines.next_line() => {
                    match line? {
                        Some(line) => apply_progress(ctx, pid, &line),
                        None => break,
                    }
                }
            }
        }

        let status = child.wait().await?;
        Ok(SuperviseEnd::Exited(status))
    })
    .await;

    let end = match result {
        Ok(Ok(end)) => end,
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => {
            let _ = child.kill().await;
            SuperviseEnd::TimedOut
        }
    };

    // Only a reaped child guarantees stderr EOF; a killed process may have
    // left grandchildren holding the pipe open.
    let stderr_tail = match &end {
        SuperviseEnd::Exited(_) => stderr_task.await.unwrap_or_default(),
        _ => {
            stderr_task.abort();
            Vec::new()
        }
    };

    match end {
        SuperviseEnd::Exited(status) if status.success() => {
            remove_work_dir(ctx, pid).await;
            Ok(Outcome::Complete)
        }
        SuperviseEnd::Exited(status) => Ok(Outcome::Failed(format!(
            "utility exited with {:?}: {}",
            status.code(),
            stderr_tail.join(" / ")
        ))),
        SuperviseEnd::Killed => {
            remove_work_dir(ctx, pid).await;
            Ok(Outcome::Cancelled)
        }
        SuperviseEnd::TimedOut => Ok(Outcome::Failed(format!(
            "timed out after {}s",
            ctx.config.timeout_secs
        ))),
    }
}

fn apply_progress(ctx: &FetchContext, pid: &str, line: &str) {
    let Some(progress) = parse_progress(line) else {
        return;
    };

    ctx.queue.update(pid, |e| {
        if let Some(total) = progress.total_bytes {
            e.size_bytes = Some(total);
        }
        if let Some(left) = progress.bytes_left() {
            e.size_left_bytes = Some(left);
        }
        if let Some(eta) = progress.eta_secs {
            e.eta_secs = Some(eta);
        }
    });
}

async fn finalize_cancel(ctx: &FetchContext, pid: &str) {
    remove_work_dir(ctx, pid).await;

    if let Some(entry) = ctx.queue.remove(pid) {
        metrics::DOWNLOADS_CANCELLED.inc();
        if let Err(e) = ctx.history.add_archive(entry).await {
            warn!("Failed to archive cancelled pid {}: {}", pid, e);
        }
    }
    info!("Download of pid {} cancelled", pid);
}

async fn remove_work_dir(ctx: &FetchContext, pid: &str) {
    let work_dir = ctx.config.work_dir(pid);
    if let Err(e) = tokio::fs::remove_dir_all(&work_dir).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to remove working dir {:?}: {}", work_dir, e);
        }
    }
}

async fn run_refresh(ctx: FetchContext) {
    info!("Starting cache refresh");

    let output = Command::new(&ctx.config.executable)
        .args(ctx.config.refresh_args())
        .stdin(Stdio::null())
        .output()
        .await;

    match output {
        Ok(output) if output.status.success() => {
            info!("Cache refresh finished");
        }
        Ok(output) => {
            error!(
                "Cache refresh exited with {:?}: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr)
            );
        }
        Err(e) => {
            error!("Cache refresh failed to start: {}", e);
        }
    }

    cleanup_orphans(&ctx).await;
}

/// Remove per-pid working directories with no live process behind them,
/// failing any queue entry the dead process left in a non-terminal state.
async fn cleanup_orphans(ctx: &FetchContext) {
    let mut dir = match tokio::fs::read_dir(&ctx.config.download_dir).await {
        Ok(dir) => dir,
        Err(_) => return,
    };

    while let Ok(Some(item)) = dir.next_entry().await {
        let is_dir = item
            .file_type()
            .await
            .map(|t| t.is_dir())
            .unwrap_or(false);
        if !is_dir {
            continue;
        }

        let path = item.path();
        let has_marker = tokio::fs::try_exists(path.join(START_MARKER))
            .await
            .unwrap_or(false);
        if !has_marker {
            // Not one of ours.
            continue;
        }

        let pid = item.file_name().to_string_lossy().to_string();
        if ctx.active.lock().unwrap().contains_key(&pid) {
            continue;
        }

        if let Some(entry) = ctx.queue.get(&pid) {
            if !entry.status.is_terminal() {
                warn!("Pid {} has an orphaned download, marking failed", pid);
                ctx.queue.update(&pid, |e| e.status = QueueStatus::Failed);
                metrics::DOWNLOADS_FAILED.inc();
            }
        }

        if let Err(e) = tokio::fs::remove_dir_all(&path).await {
            warn!("Failed to remove orphaned dir {:?}: {}", path, e);
        } else {
            info!("Removed orphaned download dir for pid {}", pid);
        }
    }
}
