//! Length of the shortest Reeds-Shepp curve

use std::sync::Arc;

use crate::common::{DistanceFunction, Pose2D, StrategyFactory};
use crate::path_planning::reeds_shepp_path;
use crate::steering::reeds_shepp::{same_pose, DEFAULT_TURNING_RADIUS};
use crate::steering::DEFAULT_STEP_SIZE;

/// Oriented instances only count forward-driven curves and return
/// `f64::INFINITY` when none exists.
#[derive(Debug, Clone)]
pub struct ReedsSheppDistance {
    turning_radius: f64,
    oriented: bool,
}

impl ReedsSheppDistance {
    pub fn new(turning_radius: f64, oriented: bool) -> Self {
        Self { turning_radius, oriented }
    }
}

impl DistanceFunction for ReedsSheppDistance {
    fn name(&self) -> &'static str {
        "rs"
    }

    fn is_oriented(&self) -> bool {
        self.oriented
    }

    fn distance(&self, from: &Pose2D, to: &Pose2D) -> f64 {
        if same_pose(from, to) {
            return 0.0;
        }
        reeds_shepp_path::shortest_length(
            from,
            to,
            1.0 / self.turning_radius,
            DEFAULT_STEP_SIZE,
            self.oriented,
        )
        .unwrap_or(f64::INFINITY)
    }
}

#[derive(Debug)]
pub struct ReedsSheppDistanceFactory {
    turning_radius: f64,
}

impl ReedsSheppDistanceFactory {
    pub fn new(turning_radius: f64) -> Self {
        Self { turning_radius }
    }
}

impl Default for ReedsSheppDistanceFactory {
    fn default() -> Self {
        Self::new(DEFAULT_TURNING_RADIUS)
    }
}

impl StrategyFactory for ReedsSheppDistanceFactory {
    type Strategy = dyn DistanceFunction;

    fn construct(&self, oriented: bool) -> Arc<dyn DistanceFunction> {
        Arc::new(ReedsSheppDistance::new(self.turning_radius, oriented))
    }
}
