use crossbeam::channel::{unbounded, Receiver, Sender};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{debug, info, warn};

use crate::buffer::document::{count_lines, LineReader};
use crate::buffer::{self, LineEnding, SharedWindow, Window};
use crate::error::{CoreError, CoreResult};

/// Rows scanned between progress reports
const PROGRESS_INTERVAL: usize = 4096;

/// Flag raised when a rebuild should stop early.
#[derive(Debug, Clone, Default)]
pub struct CancellationSignal {
    cancelled: Arc<AtomicBool>,
}

impl CancellationSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// A request to rebuild the window around `target_row`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadRequest {
    pub target_row: usize,
    pub generation: u64,
}

/// Where the worker reads lines from
#[derive(Debug, Clone)]
pub struct Source {
    pub path: PathBuf,
    pub ending: LineEnding,
}

#[derive(Debug)]
enum LoaderMessage {
    Load {
        request: LoadRequest,
        source: Source,
        signal: CancellationSignal,
    },
    Shutdown,
}

#[derive(Debug)]
pub enum LoaderResponse {
    /// Rows read so far by the rebuild
    Progress { generation: u64, rows_scanned: usize },
    /// The rebuilt window is now resident
    Published { request: LoadRequest },
    Failed { generation: u64, error: CoreError },
    Cancelled { generation: u64 },
    /// Finished, but a newer request had already been issued
    Stale { generation: u64 },
}

impl LoaderResponse {
    pub fn generation(&self) -> u64 {
        match self {
            LoaderResponse::Progress { generation, .. }
            | LoaderResponse::Failed { generation, .. }
            | LoaderResponse::Cancelled { generation }
            | LoaderResponse::Stale { generation } => *generation,
            LoaderResponse::Published { request } => request.generation,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, LoaderResponse::Progress { .. })
    }
}

/// How a request was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// A new rebuild was queued
    Issued(LoadRequest),
    /// The target was close enough to the rebuild already in flight
    Coalesced(LoadRequest),
}

/// Background window rebuilder.
///
/// Owns one worker thread. The worker only ever holds `Arc` handles, so it
/// can outlive the session briefly during shutdown without touching freed
/// state.
pub struct PrefetchLoader {
    cmd_tx: Sender<LoaderMessage>,
    resp_rx: Receiver<LoaderResponse>,
    handle: Option<thread::JoinHandle<()>>,
    latest: Arc<AtomicU64>,
    active: Option<(LoadRequest, CancellationSignal)>,
    shared: SharedWindow,
    tolerance: usize,
}

impl PrefetchLoader {
    pub fn new(shared: SharedWindow, capacity: usize, tolerance: usize) -> Self {
        let (cmd_tx, cmd_rx) = unbounded::<LoaderMessage>();
        let (resp_tx, resp_rx) = unbounded::<LoaderResponse>();
        let latest = Arc::new(AtomicU64::new(0));

        let worker_latest = Arc::clone(&latest);
        let worker_shared = Arc::clone(&shared);
        let handle = thread::spawn(move || {
            Self::loader_worker(cmd_rx, resp_tx, worker_shared, worker_latest, capacity);
        });

        Self {
            cmd_tx,
            resp_rx,
            handle: Some(handle),
            latest,
            active: None,
            shared,
            tolerance,
        }
    }

    fn loader_worker(
        cmd_rx: Receiver<LoaderMessage>,
        resp_tx: Sender<LoaderResponse>,
        shared: SharedWindow,
        latest: Arc<AtomicU64>,
        capacity: usize,
    ) {
        while let Ok(message) = cmd_rx.recv() {
            let (request, source, signal) = match message {
                LoaderMessage::Load {
                    request,
                    source,
                    signal,
                } => (request, source, signal),
                LoaderMessage::Shutdown => break,
            };
            let generation = request.generation;

            let built = build_window(&source, request.target_row, capacity, &signal, |rows| {
                let _ = resp_tx.send(LoaderResponse::Progress {
                    generation,
                    rows_scanned: rows,
                });
            });

            let response = match built {
                Ok(Some((window, total_lines))) => {
                    let mut resident = buffer::lock(&shared);
                    if signal.is_cancelled() {
                        LoaderResponse::Cancelled { generation }
                    } else {
                        let newest = latest.load(Ordering::SeqCst);
                        match resident.publish(generation, newest, window, total_lines) {
                            Ok(()) => LoaderResponse::Published { request },
                            Err(_) => LoaderResponse::Stale { generation },
                        }
                    }
                }
                Ok(None) => LoaderResponse::Cancelled { generation },
                Err(error) => LoaderResponse::Failed { generation, error },
            };

            if resp_tx.send(response).is_err() {
                break;
            }
        }
    }

    /// Ask for a window around `target_row`.
    ///
    /// A target within the tolerance of the rebuild in flight joins it;
    /// anything else cancels that rebuild and queues a new one behind it.
    pub fn request(&mut self, target_row: usize, source: Source) -> CoreResult<RequestOutcome> {
        if let Some((active, _)) = &self.active {
            if active.target_row.abs_diff(target_row) <= self.tolerance {
                debug!(target_row, generation = active.generation, "coalesced load request");
                return Ok(RequestOutcome::Coalesced(*active));
            }
        }

        if let Some((superseded, signal)) = self.active.take() {
            signal.cancel();
            debug!(generation = superseded.generation, "superseded in-flight load");
        }

        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let request = LoadRequest {
            target_row,
            generation,
        };
        let signal = CancellationSignal::new();

        self.cmd_tx
            .send(LoaderMessage::Load {
                request,
                source,
                signal: signal.clone(),
            })
            .map_err(|e| CoreError::LoadFailed(format!("loader stopped: {}", e)))?;

        info!(target_row, generation, "window load requested");
        self.active = Some((request, signal));
        Ok(RequestOutcome::Issued(request))
    }

    /// Stop the rebuild in flight, if any. The window stays as it is.
    ///
    /// The signal is raised under the resident lock, the same lock the worker
    /// checks it under before publishing. Returns `None` when there was
    /// nothing to stop or the rebuild had already been published; in the
    /// latter case the loader stays busy until its `Published` response is
    /// received.
    pub fn cancel(&mut self) -> Option<LoadRequest> {
        let (request, signal) = self.active.as_ref()?;
        let request = *request;
        {
            let resident = buffer::lock(&self.shared);
            if resident.applied_generation >= request.generation {
                debug!(generation = request.generation, "cancel arrived after publish");
                return None;
            }
            signal.cancel();
        }

        self.active = None;
        info!(generation = request.generation, "window load cancelled");
        Some(request)
    }

    pub fn is_busy(&self) -> bool {
        self.active.is_some()
    }

    /// The rebuild in flight
    pub fn active(&self) -> Option<LoadRequest> {
        self.active.as_ref().map(|(request, _)| *request)
    }

    /// Newest generation issued so far
    pub fn latest_generation(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    /// Non-blocking poll for the next worker response
    pub fn try_recv_response(&mut self) -> Option<LoaderResponse> {
        let response = self.resp_rx.try_recv().ok()?;

        if response.is_terminal() && self.active().map(|r| r.generation) == Some(response.generation()) {
            self.active = None;
        }

        match &response {
            LoaderResponse::Published { request } => {
                info!(
                    target_row = request.target_row,
                    generation = request.generation,
                    "window published"
                );
            }
            LoaderResponse::Failed { generation, error } => {
                warn!(generation, %error, "window load failed");
            }
            LoaderResponse::Stale { generation } => {
                debug!(generation, "discarded stale window");
            }
            _ => {}
        }

        Some(response)
    }

    pub fn shutdown(mut self) {
        self.stop();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    fn stop(&mut self) {
        if let Some((_, signal)) = self.active.take() {
            signal.cancel();
        }
        let _ = self.cmd_tx.send(LoaderMessage::Shutdown);
    }
}

impl Drop for PrefetchLoader {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Stream `source` and collect up to `capacity` rows starting at
/// `max(target_row - capacity / 2, 0)`.
///
/// Returns `Ok(None)` if `signal` was raised before the window was complete.
/// The returned count is the document's current line count.
pub fn build_window(
    source: &Source,
    target_row: usize,
    capacity: usize,
    signal: &CancellationSignal,
    mut on_progress: impl FnMut(usize),
) -> CoreResult<Option<(Window, usize)>> {
    let load_err =
        |e: std::io::Error| CoreError::LoadFailed(format!("{}: {}", source.path.display(), e));

    let start = Window::start_for(target_row, capacity);
    let file = File::open(&source.path).map_err(load_err)?;
    let mut reader = LineReader::new(BufReader::new(file), source.ending);

    let mut lines = Vec::with_capacity(capacity);
    let mut row = 0;
    while lines.len() < capacity {
        if signal.is_cancelled() {
            return Ok(None);
        }
        let Some(line) = reader.next_line().map_err(load_err)? else {
            break;
        };
        if row >= start {
            lines.push(line);
        }
        row += 1;
        if row % PROGRESS_INTERVAL == 0 {
            on_progress(row);
        }
    }

    if signal.is_cancelled() {
        return Ok(None);
    }

    let total_lines = count_lines(&source.path).map_err(load_err)?.max(row);
    if lines.is_empty() {
        if total_lines == 0 {
            return Ok(Some((Window::synthetic(capacity), 1)));
        }
        return Err(CoreError::LoadFailed(format!(
            "{}: row {} is past the end of the file ({} lines)",
            source.path.display(),
            start,
            total_lines
        )));
    }

    Ok(Some((Window::from_rows(start, lines, capacity), total_lines)))
}
