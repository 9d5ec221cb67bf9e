use crate::error::LookupError;
use crate::service::{DefinitionResult, DefinitionService};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Identifies one `submit`; later submissions always get larger ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct RequestId(u64);

/// A validated search waiting for its pipeline to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSearch {
    pub id: RequestId,
    pub term: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InteractionState {
    #[default]
    Idle,
    Loading {
        term: String,
    },
    Success {
        result: DefinitionResult,
        expanded: bool,
    },
    Failed {
        term: String,
        message: String,
    },
}

impl InteractionState {
    pub fn is_loading(&self) -> bool {
        matches!(self, InteractionState::Loading { .. })
    }
}

/// Owns the per-search state machine.
///
/// Only the outcome of the most recently issued request is ever applied;
/// anything older is dropped on arrival.
#[derive(Debug, Default)]
pub struct SearchController {
    state: InteractionState,
    latest: u64,
}

impl SearchController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    fn next_id(&mut self) -> RequestId {
        self.latest += 1;
        RequestId(self.latest)
    }

    /// Starts a search for `raw_term`.
    ///
    /// Blank input fails immediately and returns `None`; it still retires any
    /// in-flight request so that request cannot overwrite the validation error.
    pub fn submit(&mut self, raw_term: &str) -> Option<PendingSearch> {
        let id = self.next_id();
        let term = raw_term.trim();
        if term.is_empty() {
            self.state = InteractionState::Failed {
                term: String::new(),
                message: LookupError::Validation.user_message().to_string(),
            };
            return None;
        }
        self.state = InteractionState::Loading {
            term: term.to_string(),
        };
        Some(PendingSearch {
            id,
            term: term.to_string(),
        })
    }

    /// Applies the outcome of request `id` and returns the state it produced,
    /// or `None` when the request is stale.
    pub fn complete(
        &mut self,
        id: RequestId,
        term: &str,
        outcome: Result<DefinitionResult, LookupError>,
    ) -> Option<InteractionState> {
        if id.0 != self.latest {
            debug!(?id, latest = self.latest, term, "discarding stale search result");
            return None;
        }
        self.state = match outcome {
            Ok(result) => InteractionState::Success {
                result,
                expanded: false,
            },
            Err(err) => InteractionState::Failed {
                term: term.to_string(),
                message: err.user_message().to_string(),
            },
        };
        Some(self.state.clone())
    }

    /// Flips the expanded view. Returns `false` outside `Success`.
    pub fn toggle_expand(&mut self) -> bool {
        match &mut self.state {
            InteractionState::Success { expanded, .. } => {
                *expanded = !*expanded;
                true
            }
            _ => false,
        }
    }
}

/// Drives a [`SearchController`] with a [`DefinitionService`].
///
/// The controller lock is only held for synchronous transitions, never across
/// the network calls.
#[derive(Clone)]
pub struct SearchSession {
    controller: Arc<Mutex<SearchController>>,
    service: Arc<DefinitionService>,
}

impl SearchSession {
    pub fn new(service: DefinitionService) -> Self {
        Self {
            controller: Arc::new(Mutex::new(SearchController::new())),
            service: Arc::new(service),
        }
    }

    pub fn snapshot(&self) -> InteractionState {
        self.controller.lock().state().clone()
    }

    pub fn begin(&self, raw_term: &str) -> Option<PendingSearch> {
        let pending = self.controller.lock().submit(raw_term);
        match &pending {
            Some(pending) => info!(id = ?pending.id, term = %pending.term, "search started"),
            None => debug!("rejected blank search term"),
        }
        pending
    }

    /// Resolves `pending` and applies its outcome, returning the state this
    /// request produced (`None` if a newer search superseded it). The lookup
    /// runs on its own task so a panic inside it still ends the search.
    pub async fn run(&self, pending: PendingSearch) -> Option<InteractionState> {
        let service = Arc::clone(&self.service);
        let term = pending.term.clone();
        let outcome = match tokio::spawn(async move { service.fetch_definition(&term).await }).await
        {
            Ok(outcome) => outcome,
            Err(join_err) => {
                warn!(id = ?pending.id, error = %join_err, "lookup task ended abnormally");
                Err(LookupError::Unknown(join_err.to_string()))
            }
        };
        if let Err(err) = &outcome {
            warn!(id = ?pending.id, term = %pending.term, error = %err, "search failed");
        }
        self.controller
            .lock()
            .complete(pending.id, &pending.term, outcome)
    }

    /// Runs one search to completion and returns the resulting state.
    pub async fn search(&self, raw_term: &str) -> InteractionState {
        let applied = match self.begin(raw_term) {
            Some(pending) => self.run(pending).await,
            None => None,
        };
        applied.unwrap_or_else(|| self.snapshot())
    }

    pub fn toggle_expand(&self) -> InteractionState {
        let mut controller = self.controller.lock();
        controller.toggle_expand();
        controller.state().clone()
    }
}
