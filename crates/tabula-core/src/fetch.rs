//! Data reload plumbing.
//!
//! A table never fetches data itself. On reload it creates a [`FetchContext`]
//! and hands it to a [`DataSource`]. The source either delivers rows with
//! [`FetchContext::succeed`] or reports failure with [`FetchContext::error`].
//! Both consume the context, so each reload reports at most once.
//!
//! Outcomes travel back over a channel. The table applies them when polled
//! and right after a synchronous source returns, so a source may complete
//! inline or from another thread.

use crate::types::Row;
use crossbeam_channel::{Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a failed reload should affect the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FetchErrorConfig {
    /// Clear the dataset
    pub reset_data: bool,

    /// Raise the user-visible loading error indicator
    pub display_error: bool,
}

impl Default for FetchErrorConfig {
    fn default() -> Self {
        FetchErrorConfig {
            reset_data: true,
            display_error: true,
        }
    }
}

impl FetchErrorConfig {
    /// Keep the current data and stay silent
    pub fn quiet() -> Self {
        FetchErrorConfig {
            reset_data: false,
            display_error: false,
        }
    }
}

/// Result of one reload, as reported by the data source
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Replace the dataset with these rows
    Loaded(Vec<Row>),
    /// The fetch failed
    Failed(FetchErrorConfig),
}

/// Reload lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchState {
    /// No request outstanding
    #[default]
    Idle,
    /// A context has been handed out and not yet reported
    Loading,
}

impl fmt::Display for FetchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchState::Idle => write!(f, "idle"),
            FetchState::Loading => write!(f, "loading"),
        }
    }
}

/// Per-reload handle given to a [`DataSource`].
#[derive(Debug)]
pub struct FetchContext {
    sender: Sender<FetchOutcome>,
}

impl FetchContext {
    /// Create a context and the receiving end of its outcome channel
    pub fn new() -> (Self, Receiver<FetchOutcome>) {
        let (sender, receiver) = crossbeam_channel::bounded(1);
        (FetchContext { sender }, receiver)
    }

    /// Deliver freshly loaded rows
    pub fn succeed(self, rows: Vec<Row>) {
        let _ = self.sender.send(FetchOutcome::Loaded(rows));
    }

    /// Report a failed fetch
    pub fn error(self, config: FetchErrorConfig) {
        let _ = self.sender.send(FetchOutcome::Failed(config));
    }

    /// Report a failed fetch with the default policy (reset data, show error)
    pub fn fail(self) {
        self.error(FetchErrorConfig::default());
    }
}

/// The external collaborator that loads table data.
pub trait DataSource {
    /// Start loading; report through `context`
    fn fetch(&self, context: FetchContext);
}

impl<F> DataSource for F
where
    F: Fn(FetchContext),
{
    fn fetch(&self, context: FetchContext) {
        self(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_config_defaults() {
        let config = FetchErrorConfig::default();
        assert!(config.reset_data);
        assert!(config.display_error);

        let partial: FetchErrorConfig = serde_json::from_str(r#"{"resetData":false}"#).unwrap();
        assert!(!partial.reset_data);
        assert!(partial.display_error);
    }

    #[test]
    fn test_context_reports_once() {
        let (context, receiver) = FetchContext::new();
        context.fail();

        assert_eq!(
            receiver.try_recv().unwrap(),
            FetchOutcome::Failed(FetchErrorConfig::default())
        );
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_closure_data_source() {
        let source = |context: FetchContext| context.succeed(vec![Row::new()]);
        let (context, receiver) = FetchContext::new();
        source.fetch(context);

        assert_eq!(
            receiver.try_recv().unwrap(),
            FetchOutcome::Loaded(vec![Row::new()])
        );
    }

    #[test]
    fn test_dropped_context_disconnects() {
        let (context, receiver) = FetchContext::new();
        drop(context);
        assert_eq!(
            receiver.try_recv(),
            Err(crossbeam_channel::TryRecvError::Disconnected)
        );
    }
}
