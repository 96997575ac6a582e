//! List-fetch screens.
//!
//! # Responsibility
//! - Issue one GET per screen creation on a worker thread.
//! - Apply the response on the caller's thread as a bound adapter or an
//!   explicit failure state.
//!
//! # Invariants
//! - At most one request is in flight per screen.
//! - State only moves `Created → AwaitingResponse → Bound | Failed`.
//! - A response arriving after the screen is dropped is discarded.

use super::adapter::{AdapterError, JsonArrayAdapter, Projection};
use super::http::{FetchError, FetchResult, HttpClient};
use crate::config::AppConfig;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Row layout shared by the built-in screens.
pub const ROW_LAYOUT: &str = "item_listview_t_i";
/// Text slot shared by the built-in screens.
pub const NAME_SLOT: &str = "tv_name";

#[derive(Debug)]
pub enum ScreenError {
    Fetch(FetchError),
    Adapter(AdapterError),
    /// The worker could not be started or exited without a response.
    Worker(String),
}

impl Display for ScreenError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fetch(err) => write!(f, "{err}"),
            Self::Adapter(err) => write!(f, "{err}"),
            Self::Worker(message) => write!(f, "request worker failed: {message}"),
        }
    }
}

impl Error for ScreenError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Fetch(err) => Some(err),
            Self::Adapter(err) => Some(err),
            Self::Worker(_) => None,
        }
    }
}

impl From<FetchError> for ScreenError {
    fn from(value: FetchError) -> Self {
        Self::Fetch(value)
    }
}

impl From<AdapterError> for ScreenError {
    fn from(value: AdapterError) -> Self {
        Self::Adapter(value)
    }
}

/// What a screen fetches and how rows are projected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenSpec {
    pub name: &'static str,
    pub url: String,
    pub projection: Projection,
}

/// Goods-type list: `name` into the name slot.
pub fn goods_type_screen(config: &AppConfig) -> ScreenSpec {
    ScreenSpec {
        name: "goods_type",
        url: config.goods_type_endpoint.clone(),
        projection: single_field_projection("name"),
    }
}

/// Leave-message list: `context` into the name slot.
pub fn leave_message_screen(config: &AppConfig) -> ScreenSpec {
    ScreenSpec {
        name: "leave_message",
        url: config.leave_message_endpoint.clone(),
        projection: single_field_projection("context"),
    }
}

/// Looks up a built-in screen by its `name`.
pub fn builtin_screen(name: &str, config: &AppConfig) -> Option<ScreenSpec> {
    match name.trim() {
        "goods_type" => Some(goods_type_screen(config)),
        "leave_message" => Some(leave_message_screen(config)),
        _ => None,
    }
}

fn single_field_projection(field: &'static str) -> Projection {
    Projection {
        layout: ROW_LAYOUT.to_string(),
        fields: vec![field.to_string()],
        slots: vec![NAME_SLOT.to_string()],
    }
}

#[derive(Debug)]
pub enum ScreenState {
    Created,
    AwaitingResponse,
    Bound(JsonArrayAdapter),
    Failed(ScreenError),
}

impl ScreenState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::AwaitingResponse => "awaiting_response",
            Self::Bound(_) => "bound",
            Self::Failed(_) => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Bound(_) | Self::Failed(_))
    }

    pub fn adapter(&self) -> Option<&JsonArrayAdapter> {
        match self {
            Self::Bound(adapter) => Some(adapter),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ScreenError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// One list screen instance.
#[derive(Debug)]
pub struct ListScreen {
    spec: ScreenSpec,
    state: ScreenState,
    pending: Option<Receiver<FetchResult<String>>>,
}

impl ListScreen {
    pub fn new(spec: ScreenSpec) -> Self {
        Self {
            spec,
            state: ScreenState::Created,
            pending: None,
        }
    }

    pub fn spec(&self) -> &ScreenSpec {
        &self.spec
    }

    pub fn state(&self) -> &ScreenState {
        &self.state
    }

    /// Starts the single GET for this screen.
    ///
    /// Ignored (with a warning) unless the screen is still `Created`.
    pub fn on_view_created(&mut self, client: Arc<dyn HttpClient>) {
        if !matches!(self.state, ScreenState::Created) {
            warn!(
                "event=screen_request module=fetch status=skipped screen={} state={}",
                self.spec.name,
                self.state.label()
            );
            return;
        }

        let (sender, receiver) = mpsc::channel();
        let url = self.spec.url.clone();
        let spawned = thread::Builder::new()
            .name(format!("xbase-fetch-{}", self.spec.name))
            .spawn(move || {
                let result = client.get(&url);
                // Receiver is gone when the screen was dropped.
                let _ = sender.send(result);
            });

        match spawned {
            Ok(_) => {
                info!(
                    "event=screen_request module=fetch status=start screen={} url={}",
                    self.spec.name, self.spec.url
                );
                self.pending = Some(receiver);
                self.state = ScreenState::AwaitingResponse;
            }
            Err(err) => self.fail(ScreenError::Worker(err.to_string())),
        }
    }

    /// Applies a delivered response without blocking.
    pub fn poll(&mut self) -> &ScreenState {
        let received = match &self.pending {
            Some(receiver) => receiver.try_recv(),
            None => return &self.state,
        };
        match received {
            Ok(result) => self.deliver(result),
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => self.worker_lost(),
        }
        &self.state
    }

    /// Blocks up to `timeout` for the response, then applies it.
    ///
    /// Leaves the screen `AwaitingResponse` when the timeout elapses.
    pub fn wait(&mut self, timeout: Duration) -> &ScreenState {
        let received = match &self.pending {
            Some(receiver) => receiver.recv_timeout(timeout),
            None => return &self.state,
        };
        match received {
            Ok(result) => self.deliver(result),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => self.worker_lost(),
        }
        &self.state
    }

    /// Applies one response: binds rows on success, records failure otherwise.
    ///
    /// Only a screen in `AwaitingResponse` accepts a response; anything
    /// delivered before `on_view_created` or after settling is dropped.
    pub fn deliver(&mut self, result: FetchResult<String>) {
        if !matches!(self.state, ScreenState::AwaitingResponse) {
            warn!(
                "event=screen_bind module=fetch status=skipped screen={} state={}",
                self.spec.name,
                self.state.label()
            );
            return;
        }
        self.pending = None;
        let bound = result
            .map_err(ScreenError::from)
            .and_then(|body| Ok(JsonArrayAdapter::from_json(&body, &self.spec.projection)?));

        match bound {
            Ok(adapter) => {
                info!(
                    "event=screen_bind module=fetch status=ok screen={} rows={}",
                    self.spec.name,
                    adapter.count()
                );
                self.state = ScreenState::Bound(adapter);
            }
            Err(err) => self.fail(err),
        }
    }

    fn worker_lost(&mut self) {
        self.fail(ScreenError::Worker(
            "worker exited without a response".to_string(),
        ));
    }

    fn fail(&mut self, err: ScreenError) {
        error!(
            "event=screen_bind module=fetch status=error screen={} error={}",
            self.spec.name, err
        );
        self.pending = None;
        self.state = ScreenState::Failed(err);
    }
}
