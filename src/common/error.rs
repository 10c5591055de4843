//! Error types for planner_server

use crate::broker::BrokerError;
use crate::server::{BootstrapStep, ServerState};

/// Errors raised by the planning engine behind the service objects
#[derive(Debug, thiserror::Error)]
pub enum PlanningError {
    /// No steering method has been selected yet
    #[error("no steering method selected")]
    NoSteeringMethod,
    /// No distance function has been selected yet
    #[error("no distance function selected")]
    NoDistanceFunction,
    /// The steering method could not connect the two configurations
    #[error("steering method {0} failed to connect configurations")]
    SteeringFailed(&'static str),
    /// A configuration or path sample hits an obstacle
    #[error("configuration in collision with obstacle {0}")]
    Collision(String),
    /// Path index out of range
    #[error("wrong path id: {id}, number of paths: {count}")]
    UnknownPath { id: usize, count: usize },
    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type alias for planning operations
pub type PlanningResult<T> = Result<T, PlanningError>;

/// Main error type for the server lifecycle
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// A bootstrap sub-step failed; the whole initialization is abandoned
    #[error("{step}: {source}")]
    Bootstrap {
        step: BootstrapStep,
        #[source]
        source: BrokerError,
    },

    /// Another server instance is still registered in this process
    #[error("a planning server is already running in this process")]
    AlreadyRunning,

    /// Operation not allowed in the current lifecycle state
    #[error("invalid server state: expected {expected}, found {actual}")]
    InvalidState {
        expected: ServerState,
        actual: ServerState,
    },

    /// The broker failed while processing requests
    #[error("request processing failed: {0}")]
    Request(#[source] BrokerError),

    /// Configuration file could not be parsed
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Configuration could not be serialized
    #[error("Configuration serialization error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for server operations
pub type ServerResult<T> = Result<T, ServerError>;
