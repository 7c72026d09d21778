//! Orchestrator state and its reducer.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

/// What a view renders from: data, loading, error and refetching.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchState {
    /// Stored payload.
    pub data: Value,
    /// A fetch with the loader shown is in flight.
    pub loading: bool,
    /// Message of the last failed fetch.
    pub error: Option<String>,
    /// A background refetch is in flight.
    pub refetching: bool,
}

impl FetchState {
    /// Initial state from construction options.
    pub fn new(data: Value, loading: bool) -> Self {
        Self {
            data,
            loading,
            error: None,
            refetching: false,
        }
    }

    /// Deserialize the stored payload.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.data.clone())
    }

    /// Check if the last fetch failed.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// A state transition.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchAction {
    /// A fetch with loader started.
    Init,
    /// A fetch succeeded with this data.
    Success(Value),
    /// A fetch failed with this message.
    Error(String),
    /// The caller overwrote the data.
    AlterData(Value),
}

impl FetchAction {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Success(_) => "success",
            Self::Error(_) => "error",
            Self::AlterData(_) => "alter_data",
        }
    }
}

/// Apply a transition to a state.
pub fn reduce(state: &FetchState, action: FetchAction) -> FetchState {
    match action {
        FetchAction::Init => FetchState {
            loading: true,
            error: None,
            ..state.clone()
        },
        FetchAction::Success(data) => FetchState {
            data,
            loading: false,
            error: state.error.clone(),
            refetching: false,
        },
        FetchAction::Error(message) => FetchState {
            data: Value::Null,
            loading: false,
            error: Some(message),
            refetching: false,
        },
        FetchAction::AlterData(data) => FetchState {
            data,
            loading: false,
            ..state.clone()
        },
    }
}
