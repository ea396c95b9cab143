use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::{sync::watch, task::JoinHandle};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

/// FetchError
///
/// Classification of everything that can go wrong between issuing a GET and
/// holding a decoded payload. The `Display` output is the human-readable
/// message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The request never reached a server (refused, DNS failure, unroutable).
    #[error("Network error: Unable to connect to the server")]
    Unreachable,
    /// The server answered outside the 2xx range. `reason` is empty for
    /// codes without a standard phrase.
    #[error("Server error: HTTP error! status: {status}{}", reason_suffix(.reason))]
    HttpStatus { status: u16, reason: String },
    /// The body arrived but was not the JSON we expected.
    #[error("{0}")]
    Decode(String),
    #[error("An unexpected error occurred")]
    Unknown,
}

fn reason_suffix(reason: &str) -> String {
    if reason.is_empty() {
        String::new()
    } else {
        format!(" - {reason}")
    }
}

impl FetchError {
    /// Builds the status error from a response status, using the canonical
    /// reason phrase as the status text.
    pub fn from_status(status: reqwest::StatusCode) -> Self {
        Self::HttpStatus {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
        }
    }

    /// Maps a client error onto the taxonomy: a status present means the
    /// server answered, a connect-phase failure means unreachable.
    /// Body decode failures are `Decode`, anything else `Unknown`.
    pub fn classify(err: &reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::from_status(status);
        }
        if err.is_connect() {
            return Self::Unreachable;
        }
        if err.is_decode() {
            return Self::Decode(err.to_string());
        }
        tracing::warn!(error = %err, "unclassified fetch failure");
        Self::Unknown
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Phase
///
/// The observable lifecycle stage of a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Phase {
    Idle,
    Loading,
    Loaded,
    Failed,
}

/// FetchState
///
/// One snapshot of a controller. `data` and `error` are never both set.
#[derive(Debug, Clone)]
pub struct FetchState<T> {
    resource: String,
    data: Option<T>,
    error: Option<FetchError>,
    loading: bool,
    attempt: u64,
}

impl<T> FetchState<T> {
    fn new(resource: String) -> Self {
        Self {
            resource,
            data: None,
            error: None,
            loading: false,
            attempt: 0,
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }

    pub fn error(&self) -> Option<&FetchError> {
        self.error.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Number of requests started by this controller so far. Bumped by every
    /// refetch and resource change.
    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    pub fn phase(&self) -> Phase {
        if self.loading {
            Phase::Loading
        } else if self.error.is_some() {
            Phase::Failed
        } else if self.data.is_some() {
            Phase::Loaded
        } else {
            Phase::Idle
        }
    }

    /// Moves to the start of a new request cycle and returns the request to
    /// issue, if any. An empty resource settles straight into `Idle`.
    fn begin(&mut self) -> Option<(String, u64)> {
        self.attempt += 1;
        self.error = None;
        if self.resource.is_empty() {
            self.loading = false;
            self.data = None;
            return None;
        }
        self.loading = true;
        Some((self.resource.clone(), self.attempt))
    }

    /// Applies an outcome if it belongs to the latest started request.
    /// Returns false for superseded outcomes, leaving the state untouched.
    fn settle(&mut self, attempt: u64, outcome: Result<T, FetchError>) -> bool {
        if attempt != self.attempt {
            return false;
        }
        self.loading = false;
        match outcome {
            Ok(data) => {
                self.data = Some(data);
                self.error = None;
            }
            Err(err) => {
                self.data = None;
                self.error = Some(err);
            }
        }
        true
    }
}

/// FetchController
///
/// Owns the request lifecycle for one resource locator and publishes every
/// transition on a watch channel. Consumers either await `settled()` or keep a
/// `subscribe()` receiver and react to changes.
///
/// Only the most recently started request may commit: each start bumps the
/// attempt counter, and outcomes carrying an older attempt are dropped inside
/// the channel's write lock. Superseded tasks are also aborted so their
/// sockets are released early.
///
/// Must be created inside a tokio runtime.
pub struct FetchController<T> {
    id: Uuid,
    client: reqwest::Client,
    state: Arc<watch::Sender<FetchState<T>>>,
    in_flight: Mutex<Option<JoinHandle<()>>>,
}

impl<T> FetchController<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Creates a controller for `resource` and starts its first request
    /// immediately. An empty locator issues nothing and stays idle.
    pub fn invoke(client: reqwest::Client, resource: impl Into<String>) -> Self {
        let (state, _) = watch::channel(FetchState::new(resource.into()));
        let controller = Self {
            id: Uuid::new_v4(),
            client,
            state: Arc::new(state),
            in_flight: Mutex::new(None),
        };
        controller.restart(None);
        controller
    }

    /// Latest published state.
    pub fn snapshot(&self) -> FetchState<T> {
        self.state.borrow().clone()
    }

    /// A receiver that observes every subsequent transition.
    pub fn subscribe(&self) -> watch::Receiver<FetchState<T>> {
        self.state.subscribe()
    }

    /// Waits until the current cycle is no longer loading and returns that
    /// state.
    pub async fn settled(&self) -> FetchState<T> {
        let mut rx = self.state.subscribe();
        let settled = rx
            .wait_for(|state| !state.is_loading())
            .await
            .map(|state| state.clone());
        settled.unwrap_or_else(|_| self.snapshot())
    }

    /// Re-runs the whole lifecycle against the current resource. Any request
    /// still in flight is superseded. Previously loaded data stays visible
    /// while the new request is loading.
    pub fn refetch(&self) {
        self.restart(None);
    }

    /// Points the controller at a new locator. Data belonging to the old
    /// locator is cleared and any outstanding request for it is superseded.
    /// Setting the same locator again is a no-op.
    pub fn set_resource(&self, resource: impl Into<String>) {
        let resource = resource.into();
        if self.state.borrow().resource == resource {
            return;
        }
        self.restart(Some(resource));
    }

    fn restart(&self, resource: Option<String>) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);

        let mut request = None;
        self.state.send_modify(|state| {
            if let Some(resource) = resource {
                state.resource = resource;
                state.data = None;
            }
            request = state.begin();
        });

        if let Some(previous) = in_flight.take() {
            previous.abort();
        }

        let Some((resource, attempt)) = request else {
            tracing::debug!(controller = %self.id, "empty resource, fetch idle");
            return;
        };

        tracing::debug!(controller = %self.id, attempt, %resource, "fetch started");
        let client = self.client.clone();
        let state = Arc::clone(&self.state);
        let id = self.id;
        *in_flight = Some(tokio::spawn(async move {
            let outcome = request_json::<T>(&client, &resource).await;
            if let Err(err) = &outcome {
                tracing::warn!(controller = %id, attempt, %resource, error = %err, "fetch failed");
            }
            let committed = state.send_if_modified(|current| current.settle(attempt, outcome));
            if !committed {
                tracing::debug!(controller = %id, attempt, "discarding superseded fetch outcome");
            }
        }));
    }
}

impl<T> Drop for FetchController<T> {
    fn drop(&mut self) {
        let in_flight = self.in_flight.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = in_flight.take() {
            handle.abort();
        }
    }
}

/// One GET, status check, then JSON decode.
async fn request_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    resource: &str,
) -> Result<T, FetchError> {
    let response = client
        .get(resource)
        .send()
        .await
        .map_err(|err| FetchError::classify(&err))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::from_status(status));
    }

    let body = response
        .bytes()
        .await
        .map_err(|err| FetchError::classify(&err))?;
    Ok(serde_json::from_slice(&body)?)
}
