//! Name-keyed strategy registries
//!
//! One registry per strategy category. Factories are registered once under
//! a name and looked up by that name when a remote caller selects a
//! strategy.

pub mod registry;

pub use registry::{DistanceFunctionRegistry, SteeringMethodRegistry, StrategyRegistry};
