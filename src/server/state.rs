//! Lifecycle states and bootstrap steps of the planning server

use std::fmt;

use crate::services::ServiceRole;

/// Lifecycle of a [`PlanningServer`](super::PlanningServer)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Uninitialized,
    /// Broker handle acquired
    BrokerReady,
    /// Single-threaded child adapter created
    DomainReady,
    /// Service objects activated in the child adapter
    ServicesActivated,
    /// Service objects bound in the naming directory
    Bound,
    /// Adapter manager active, requests are dispatched
    Serving,
    ShuttingDown,
    Destroyed,
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServerState::Uninitialized => "uninitialized",
            ServerState::BrokerReady => "broker ready",
            ServerState::DomainReady => "domain ready",
            ServerState::ServicesActivated => "services activated",
            ServerState::Bound => "bound",
            ServerState::Serving => "serving",
            ServerState::ShuttingDown => "shutting down",
            ServerState::Destroyed => "destroyed",
        };
        f.write_str(name)
    }
}

/// Bootstrap sub-step, each with its own diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapStep {
    BrokerInit,
    ResolveRootAdapter,
    CreatePolicy,
    CreateDomain,
    DestroyPolicy,
    ActivateServices,
    ResolveNaming,
    NamingContext,
    Reference(ServiceRole),
    Bind(ServiceRole),
    ActivateManager,
}

impl fmt::Display for BootstrapStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootstrapStep::BrokerInit => write!(f, "failed to initialize the broker"),
            BootstrapStep::ResolveRootAdapter => write!(f, "failed to resolve the root adapter"),
            BootstrapStep::CreatePolicy => write!(f, "failed to create thread policy"),
            BootstrapStep::CreateDomain => write!(f, "failed to create the child adapter"),
            BootstrapStep::DestroyPolicy => write!(f, "failed to destroy thread policy"),
            BootstrapStep::ActivateServices => write!(f, "failed to create and activate service objects"),
            BootstrapStep::ResolveNaming => write!(f, "failed to resolve the naming service"),
            BootstrapStep::NamingContext => write!(f, "failed to create or resolve the naming context"),
            BootstrapStep::Reference(role) => write!(f, "failed to get a reference to the {} object", role),
            BootstrapStep::Bind(role) => write!(f, "failed to bind the {} object", role),
            BootstrapStep::ActivateManager => write!(f, "failed to activate the adapter manager"),
        }
    }
}
