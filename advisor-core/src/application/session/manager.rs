use super::errors::{BuildError, SessionError};
use super::{AgentSession, SessionBuilder};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tracing::{error, info, warn};
use utoipa::ToSchema;

type BuildOutcome = Result<Arc<AgentSession>, Arc<BuildError>>;
type BuildFuture = Shared<BoxFuture<'static, BuildOutcome>>;

enum SessionState {
    Uninitialized,
    Building { generation: u64, future: BuildFuture },
    Ready(Arc<AgentSession>),
}

/// Observable state, e.g. for health checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Uninitialized,
    Building,
    Ready,
}

/// Owns the process-wide agent session.
///
/// The lock is only held to read or swap the state, never across an await.
/// The first caller stores a shared handle to the build before any work
/// starts; later callers clone that handle. The build runs on its own task,
/// so it completes even if every waiter goes away, and it settles the state
/// itself: `Ready` on success, `Uninitialized` on failure.
pub struct AgentSessionManager {
    builder: Arc<dyn SessionBuilder>,
    state: Arc<Mutex<SessionState>>,
    builds: AtomicU64,
}

impl AgentSessionManager {
    pub fn new(builder: Arc<dyn SessionBuilder>) -> Self {
        Self {
            builder,
            state: Arc::new(Mutex::new(SessionState::Uninitialized)),
            builds: AtomicU64::new(0),
        }
    }

    /// Return the ready session, building it first if needed.
    pub async fn acquire(&self) -> Result<Arc<AgentSession>, SessionError> {
        let future = {
            let mut state = lock(&self.state);
            match &*state {
                SessionState::Ready(session) => return Ok(Arc::clone(session)),
                SessionState::Building { future, .. } => future.clone(),
                SessionState::Uninitialized => {
                    let generation = self.builds.fetch_add(1, Ordering::SeqCst) + 1;
                    let future = self.start_build(generation);
                    *state = SessionState::Building {
                        generation,
                        future: future.clone(),
                    };
                    future
                }
            }
        };

        future.await.map_err(SessionError::from)
    }

    pub fn status(&self) -> SessionStatus {
        match &*lock(&self.state) {
            SessionState::Uninitialized => SessionStatus::Uninitialized,
            SessionState::Building { .. } => SessionStatus::Building,
            SessionState::Ready(_) => SessionStatus::Ready,
        }
    }

    /// The cached session, if one is ready. Never starts a build.
    pub fn ready(&self) -> Option<Arc<AgentSession>> {
        match &*lock(&self.state) {
            SessionState::Ready(session) => Some(Arc::clone(session)),
            _ => None,
        }
    }

    /// Number of builds started so far.
    pub fn builds_started(&self) -> u64 {
        self.builds.load(Ordering::SeqCst)
    }

    fn start_build(&self, generation: u64) -> BuildFuture {
        let builder = Arc::clone(&self.builder);
        let state = Arc::clone(&self.state);
        let task_state = Arc::clone(&self.state);

        let task = tokio::spawn(async move {
            let started = Instant::now();
            info!(generation, "Building agent session");
            let outcome: BuildOutcome = builder.build().await.map(Arc::new).map_err(Arc::new);
            let elapsed_ms = started.elapsed().as_millis() as u64;
            match &outcome {
                Ok(session) => info!(
                    generation,
                    elapsed_ms,
                    tools = session.namespace().len(),
                    "Agent session ready"
                ),
                Err(err) => warn!(
                    generation,
                    elapsed_ms,
                    %err,
                    "Agent session build failed; next request will retry"
                ),
            }
            settle(&task_state, generation, &outcome);
            outcome
        });

        async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(join_error) => {
                    error!(generation, %join_error, "Agent session build task did not finish");
                    let outcome: BuildOutcome =
                        Err(Arc::new(BuildError::Aborted(join_error.to_string())));
                    settle(&state, generation, &outcome);
                    outcome
                }
            }
        }
        .boxed()
        .shared()
    }
}

/// Leave `Building` for the given generation. A stale generation is ignored.
fn settle(state: &Mutex<SessionState>, generation: u64, outcome: &BuildOutcome) {
    let mut state = lock(state);
    let current = matches!(
        &*state,
        SessionState::Building { generation: active, .. } if *active == generation
    );
    if !current {
        return;
    }
    *state = match outcome {
        Ok(session) => SessionState::Ready(Arc::clone(session)),
        Err(_) => SessionState::Uninitialized,
    };
}

fn lock(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
