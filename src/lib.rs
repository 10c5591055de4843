//! planner_server - remote access to a motion planner through an object broker
//!
//! This crate provides the lifecycle of a planning server (broker
//! bootstrap, service activation, naming bindings and request processing)
//! and the registries of steering methods and distance functions the
//! remote callers select by name.

// Core modules
pub mod common;
pub mod config;

// Broker and server
pub mod broker;
pub mod server;
pub mod services;

// Planning
pub mod distance;
pub mod path_planning;
pub mod planner;
pub mod steering;
pub mod strategy;

// Re-export common types for convenience
pub use common::{Gear, LocalPath, Point2D, Pose2D};
pub use common::{DistanceFunction, SteeringMethod, StrategyFactory};
pub use common::{PlanningError, ServerError, ServerResult};
pub use config::ServerConfig;
pub use planner::{PlanningEngine, ProblemSolver, SharedPlanner};
pub use server::{PlanningServer, ServerContext, ServerState, ShutdownHandle};
pub use services::{DefaultServices, ServiceHook, ServiceRole};
pub use strategy::{DistanceFunctionRegistry, SteeringMethodRegistry, StrategyRegistry};
