//! Per-section fetch state machine.
//!
//! ```text
//! Idle ──ensure_loaded──▶ Loading ──ok──▶ Loaded ──invalidate──▶ Stale
//!   ▲                       │                                     │
//!   └────────err────────────┘◀──────────────ensure_loaded─────────┘
//! ```
//!
//! A failed fetch returns the cache to the phase it left (`Idle` or `Stale`).
//! Calls made while a fetch is in flight join it instead of starting another.
//!
//! Every cache belongs to a scope (the session's organization epoch). `reset`
//! moves it to a new scope, and callers still holding the old one are turned
//! away before they can start a fetch.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, warn};

use crate::error::SyncError;

use super::Section;

type SharedFetch<T> = Shared<BoxFuture<'static, Result<Arc<T>, SyncError>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionPhase {
    /// Never loaded for the current organization
    Idle,
    Loading,
    Loaded,
    /// Invalidated; data kept but must be refetched before the next read
    Stale,
}

/// Non-blocking view of a section: last known data plus a loading flag
#[derive(Debug)]
pub struct SectionSnapshot<T> {
    pub phase: SectionPhase,
    pub data: Option<Arc<T>>,
    pub loading: bool,
}

impl<T> Clone for SectionSnapshot<T> {
    fn clone(&self) -> Self {
        Self {
            phase: self.phase,
            data: self.data.clone(),
            loading: self.loading,
        }
    }
}

struct InFlight<T> {
    generation: u64,
    prior: SectionPhase,
    fetch: SharedFetch<T>,
}

struct State<T> {
    phase: SectionPhase,
    data: Option<Arc<T>>,
    data_generation: u64,
    in_flight: Option<InFlight<T>>,
    last_generation: u64,
    scope: u64,
}

pub struct SectionCache<T> {
    section: Section,
    state: Mutex<State<T>>,
}

impl<T: Send + Sync + 'static> SectionCache<T> {
    pub fn new(section: Section) -> Self {
        Self {
            section,
            state: Mutex::new(State {
                phase: SectionPhase::Idle,
                data: None,
                data_generation: 0,
                in_flight: None,
                last_generation: 0,
                scope: 0,
            }),
        }
    }

    pub fn section(&self) -> Section {
        self.section
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        // State is only ever replaced field by field, so a poisoned guard is still consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn phase(&self) -> SectionPhase {
        self.lock().phase
    }

    pub fn snapshot(&self) -> SectionSnapshot<T> {
        let state = self.lock();
        SectionSnapshot {
            phase: state.phase,
            data: state.data.clone(),
            loading: state.phase == SectionPhase::Loading,
        }
    }

    /// Mark loaded data stale. Returns whether the phase changed.
    pub fn invalidate(&self) -> bool {
        let mut state = self.lock();
        if state.phase == SectionPhase::Loaded {
            state.phase = SectionPhase::Stale;
            debug!(section = %self.section, "Section invalidated");
            true
        } else {
            false
        }
    }

    /// Back to `Idle` with no data, owned by `scope` from now on. An in-flight
    /// fetch is detached and its result will be discarded when it lands.
    pub fn reset(&self, scope: u64) {
        let mut state = self.lock();
        state.scope = scope;
        if let Some(in_flight) = state.in_flight.take() {
            debug!(
                section = %self.section,
                generation = in_flight.generation,
                "Detaching in-flight fetch"
            );
        }
        state.phase = SectionPhase::Idle;
        state.data = None;
        state.data_generation = 0;
    }

    /// Return loaded data, fetching first when the section is `Idle` or `Stale`.
    ///
    /// `fetch` is only invoked when this call starts a new fetch. Callers that
    /// arrive while a fetch is in flight await that fetch and get its result.
    /// A `scope` older than the cache's fails with `OrganizationChanged`.
    pub async fn ensure_loaded<F, Fut>(&self, scope: u64, fetch: F) -> Result<Arc<T>, SyncError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, SyncError>> + Send + 'static,
    {
        let (generation, shared) = {
            let mut state = self.lock();

            if state.scope != scope {
                debug!(
                    section = %self.section,
                    scope,
                    current = state.scope,
                    "Rejecting load for superseded organization"
                );
                return Err(SyncError::OrganizationChanged);
            }

            if state.phase == SectionPhase::Loaded {
                if let Some(ref data) = state.data {
                    return Ok(Arc::clone(data));
                }
            }

            if let Some(ref in_flight) = state.in_flight {
                debug!(
                    section = %self.section,
                    generation = in_flight.generation,
                    "Joining in-flight fetch"
                );
                (in_flight.generation, in_flight.fetch.clone())
            } else {
                state.last_generation += 1;
                let generation = state.last_generation;
                let shared = fetch().map(|result| result.map(Arc::new)).boxed().shared();
                state.in_flight = Some(InFlight {
                    generation,
                    prior: state.phase,
                    fetch: shared.clone(),
                });
                debug!(
                    section = %self.section,
                    generation,
                    from = ?state.phase,
                    "Section loading"
                );
                state.phase = SectionPhase::Loading;
                (generation, shared)
            }
        };

        let result = shared.await;
        self.complete(generation, &result);
        result
    }

    /// Apply a finished fetch, unless the cache moved on since it started.
    fn complete(&self, generation: u64, result: &Result<Arc<T>, SyncError>) {
        let mut state = self.lock();

        let current = state
            .in_flight
            .as_ref()
            .is_some_and(|in_flight| in_flight.generation == generation);
        if !current {
            if state.data_generation != generation {
                debug!(
                    section = %self.section,
                    generation,
                    "Discarding result of superseded fetch"
                );
            }
            return;
        }

        let Some(in_flight) = state.in_flight.take() else {
            return;
        };
        match result {
            Ok(data) => {
                state.data = Some(Arc::clone(data));
                state.data_generation = generation;
                state.phase = SectionPhase::Loaded;
                debug!(section = %self.section, generation, "Section loaded");
            }
            Err(e) => {
                state.phase = in_flight.prior;
                warn!(
                    section = %self.section,
                    generation,
                    error = %e,
                    "Section fetch failed"
                );
            }
        }
    }
}
