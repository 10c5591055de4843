//! Weighted Euclidean distance

use std::sync::Arc;

use crate::common::{normalize_angle, DistanceFunction, Pose2D, StrategyFactory};

/// Weight of one radian of heading difference, in meters
pub const DEFAULT_YAW_WEIGHT: f64 = 1.0;

/// Euclidean distance plus the weighted heading difference.
///
/// Symmetric, so `oriented` is only reported.
#[derive(Debug, Clone)]
pub struct LinearDistance {
    oriented: bool,
    yaw_weight: f64,
}

impl LinearDistance {
    pub fn new(oriented: bool) -> Self {
        Self::with_yaw_weight(oriented, DEFAULT_YAW_WEIGHT)
    }

    pub fn with_yaw_weight(oriented: bool, yaw_weight: f64) -> Self {
        Self { oriented, yaw_weight }
    }
}

impl DistanceFunction for LinearDistance {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn is_oriented(&self) -> bool {
        self.oriented
    }

    fn distance(&self, from: &Pose2D, to: &Pose2D) -> f64 {
        from.position().distance(&to.position()) + self.yaw_weight * normalize_angle(to.yaw - from.yaw).abs()
    }
}

#[derive(Debug, Default)]
pub struct LinearDistanceFactory;

impl StrategyFactory for LinearDistanceFactory {
    type Strategy = dyn DistanceFunction;

    fn construct(&self, oriented: bool) -> Arc<dyn DistanceFunction> {
        Arc::new(LinearDistance::new(oriented))
    }
}
