//! Error types for the object broker

use super::ObjectId;

/// Result type alias for broker operations
pub type BrokerResult<T> = std::result::Result<T, BrokerError>;

/// Failures of the broker runtime itself
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BrokerError {
    /// The broker handle could not be created
    #[error("broker initialization failed: {0}")]
    Initialization(String),

    /// An initial reference could not be resolved
    #[error("invalid initial reference: {0}")]
    InvalidReference(String),

    /// A policy is not supported by this adapter
    #[error("invalid policy: {0}")]
    InvalidPolicy(String),

    /// A child adapter with this name already exists
    #[error("adapter already exists: {0}")]
    AdapterAlreadyExists(String),

    /// No object is active under this identifier
    #[error("object does not exist: {0}")]
    ObjectNotExist(ObjectId),

    /// No binding exists under this name
    #[error("name not found: {0}")]
    NameNotFound(String),

    /// The request queue is full
    #[error("request queue is full")]
    QueueFull,

    /// The broker has been shut down
    #[error("broker has been shut down")]
    ShutDown,

    /// Generic broker fault
    #[error("broker internal error: {0}")]
    Internal(String),
}

/// Failure of a single remote call, reported to that call's caller only
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CallFault {
    /// The target object does not implement the operation
    #[error("bad operation: {0}")]
    BadOperation(String),

    /// Wrong number or type of arguments
    #[error("bad parameter: {0}")]
    BadParam(String),

    /// The operation was understood but the planner refused it
    #[error("{0}")]
    Failed(String),

    /// The target object is not active
    #[error("object does not exist: {0}")]
    ObjectNotExist(ObjectId),

    /// The call could not be delivered right now
    #[error("transient failure: {0}")]
    Transient(String),

    /// The servant failed unexpectedly
    #[error("internal fault: {0}")]
    Internal(String),
}
