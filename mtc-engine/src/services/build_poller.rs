//! Build status poller
//!
//! Converts the one-shot "get build status" endpoint into a live progress
//! stream. One polling loop runs per watched build id and fans out over a
//! broadcast channel; the most recent emission is cached and replayed to
//! subscribers that attach mid-stream, and the loop tears down when the
//! subscriber count reaches zero. This keeps N UI panels watching the same
//! build on a single polling loop.
//!
//! Fetches for one build are strictly sequential: each tick waits out the
//! poll interval before the next fetch, and a failed attempt is not
//! retried early — the next tick is the retry.

use crate::api::MachineApi;
use crate::notify::ConnectivityProbe;
use futures::stream::Stream;
use mtc_common::models::{BuildJob, BuildState};
use mtc_common::{Error, Result};
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

/// Stream of build observations; yields an error only for a Faulted build
pub type BuildProgressStream = Pin<Box<dyn Stream<Item = Result<BuildJob>> + Send>>;

#[derive(Debug, Clone)]
enum WatchEvent {
    /// A new observation (terminal states included)
    Progress(BuildJob),
    /// The build ended Faulted; carries the build message
    Failed(String),
    /// The server no longer reports the build
    Ended,
}

struct WatchState {
    tx: broadcast::Sender<WatchEvent>,
    last: Option<WatchEvent>,
}

type WatchHandle = Arc<Mutex<WatchState>>;

/// Shared, de-duplicated build progress polling
#[derive(Clone)]
pub struct BuildPoller {
    api: Arc<MachineApi>,
    connectivity: Arc<dyn ConnectivityProbe>,
    poll_rate: Duration,
    capacity: usize,
    watches: Arc<Mutex<HashMap<String, WatchHandle>>>,
}

impl BuildPoller {
    pub fn new(
        api: Arc<MachineApi>,
        connectivity: Arc<dyn ConnectivityProbe>,
        poll_rate: Duration,
        capacity: usize,
    ) -> Self {
        Self {
            api,
            connectivity,
            poll_rate,
            capacity,
            watches: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Watch a build from a just-fetched observation onward
    ///
    /// Joins the existing watch when one is already running for this build
    /// id; otherwise seeds a new one with `build` as the first emission and
    /// starts the polling loop behind it.
    pub fn watch(&self, build: BuildJob) -> BuildProgressStream {
        let mut watches = self.watches.lock().unwrap();
        if let Some(handle) = watches.get(&build.id) {
            return stream_from(handle);
        }

        let (tx, _) = broadcast::channel(self.capacity);
        let seed = if build.state == BuildState::Faulted {
            WatchEvent::Failed(build.message.clone())
        } else {
            WatchEvent::Progress(build.clone())
        };
        let handle: WatchHandle = Arc::new(Mutex::new(WatchState {
            tx,
            last: Some(seed),
        }));
        watches.insert(build.id.clone(), handle.clone());

        let stream = stream_from(&handle);
        if build.state.is_active() {
            tokio::spawn(poll_loop(
                Arc::clone(&self.api),
                Arc::clone(&self.connectivity),
                Arc::clone(&self.watches),
                handle,
                build,
                self.poll_rate,
            ));
        } else {
            // Already terminal: nothing to poll, but late subscribers
            // still get the replayed observation
            watches.remove(&build.id);
        }
        stream
    }

    /// One-shot current status fetch
    ///
    /// 403/404 mean "no build has ever run" or "not visible" and fold to
    /// None, as does being offline; other failures propagate.
    pub async fn current_build(&self, id: &str) -> Result<Option<BuildJob>> {
        if !self.connectivity.is_online() {
            return Ok(None);
        }
        match self.api.get_build(id, None).await {
            Ok(dto) => Ok(Some(BuildJob::from(dto))),
            Err(Error::Http {
                status: 403 | 404, ..
            }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Number of builds currently being polled (test hook)
    pub fn active_watch_count(&self) -> usize {
        self.watches.lock().unwrap().len()
    }
}

fn emit(handle: &WatchHandle, event: WatchEvent) {
    let mut state = handle.lock().unwrap();
    state.last = Some(event.clone());
    // A send error only means no subscriber is currently attached; the
    // last-value cache still serves late arrivals
    let _ = state.tx.send(event);
}

/// Subscribe to a watch: replay the cached observation, then follow live
/// emissions until the stream's terminal event
fn stream_from(handle: &WatchHandle) -> BuildProgressStream {
    let (mut rx, replay) = {
        let state = handle.lock().unwrap();
        (state.tx.subscribe(), state.last.clone())
    };

    Box::pin(async_stream::stream! {
        if let Some(event) = replay {
            match event {
                WatchEvent::Progress(job) => {
                    let terminal = job.state.is_terminal();
                    yield Ok(job);
                    if terminal {
                        return;
                    }
                }
                WatchEvent::Failed(message) => {
                    yield Err(Error::BuildFaulted(message));
                    return;
                }
                WatchEvent::Ended => return,
            }
        }
        loop {
            match rx.recv().await {
                Ok(WatchEvent::Progress(job)) => {
                    let terminal = job.state.is_terminal();
                    yield Ok(job);
                    if terminal {
                        return;
                    }
                }
                Ok(WatchEvent::Failed(message)) => {
                    yield Err(Error::BuildFaulted(message));
                    return;
                }
                Ok(WatchEvent::Ended) => return,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "build watch subscriber lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return,
            }
        }
    })
}

async fn poll_loop(
    api: Arc<MachineApi>,
    connectivity: Arc<dyn ConnectivityProbe>,
    watches: Arc<Mutex<HashMap<String, WatchHandle>>>,
    handle: WatchHandle,
    seed: BuildJob,
    poll_rate: Duration,
) {
    let build_id = seed.id.clone();
    // The previously observed revision + 1 is the next minimum-revision
    // cursor, letting a long-poll-capable server block until there is
    // something new
    let mut min_revision = seed.revision + 1;
    let mut last_key = Some(observation_key(&seed));

    loop {
        tokio::time::sleep(poll_rate).await;

        let receivers = handle.lock().unwrap().tx.receiver_count();
        if receivers == 0 {
            tracing::debug!(build_id = %build_id, "last subscriber detached; stopping poll");
            break;
        }

        if !connectivity.is_online() {
            // No network I/O while offline; the build is re-queried on the
            // first tick after connectivity returns
            continue;
        }

        match api.get_build(&build_id, Some(min_revision)).await {
            Ok(build_dto) => {
                let job = BuildJob::from(build_dto);
                min_revision = job.revision + 1;

                let key = observation_key(&job);
                if last_key.as_ref() == Some(&key) {
                    continue;
                }
                last_key = Some(key);

                if job.state == BuildState::Faulted {
                    tracing::warn!(build_id = %build_id, message = %job.message, "build faulted");
                    emit(&handle, WatchEvent::Failed(job.message));
                    break;
                }
                let terminal = job.state.is_terminal();
                tracing::debug!(
                    build_id = %build_id,
                    state = ?job.state,
                    percent = job.percent_completed,
                    "build progress"
                );
                emit(&handle, WatchEvent::Progress(job));
                if terminal {
                    break;
                }
            }
            Err(Error::Http {
                status: 403 | 404, ..
            }) => {
                tracing::debug!(build_id = %build_id, "build no longer visible");
                emit(&handle, WatchEvent::Ended);
                break;
            }
            Err(e) => {
                // Next scheduled tick is the retry; no backoff, no jitter
                tracing::warn!(build_id = %build_id, error = %e, "build status fetch failed");
            }
        }
    }

    watches.lock().unwrap().remove(&build_id);
}

/// Key under which consecutive observations are considered identical
fn observation_key(job: &BuildJob) -> (BuildState, i64, f64) {
    (job.state, job.queue_depth, job.percent_completed)
}
