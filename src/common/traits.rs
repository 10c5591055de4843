//! Common traits defining the interchangeable strategies of the planner

use std::sync::Arc;

use crate::common::types::*;

/// Trait for steering methods: build a local path between two poses
pub trait SteeringMethod: Send + Sync {
    /// Name of the algorithm family
    fn name(&self) -> &'static str;

    /// Whether the method was built as oriented
    fn is_oriented(&self) -> bool;

    /// Compute a local path from `from` to `to`, or `None` if the
    /// method cannot connect the two poses
    fn steer(&self, from: &Pose2D, to: &Pose2D) -> Option<LocalPath>;
}

/// Trait for distance functions between two poses
pub trait DistanceFunction: Send + Sync {
    /// Name of the algorithm family
    fn name(&self) -> &'static str;

    /// Whether the function was built as oriented
    fn is_oriented(&self) -> bool;

    /// Distance from `from` to `to`; `f64::INFINITY` when unreachable
    fn distance(&self, from: &Pose2D, to: &Pose2D) -> f64;
}

/// Factory producing one strategy instance per call.
///
/// The meaning of `oriented` belongs entirely to the concrete strategy.
pub trait StrategyFactory: Send + Sync {
    /// Strategy category produced by this factory
    type Strategy: ?Sized;

    /// Build a new strategy instance
    fn construct(&self, oriented: bool) -> Arc<Self::Strategy>;
}
