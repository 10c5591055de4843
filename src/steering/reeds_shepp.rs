//! Reeds-Shepp steering method for car-like robots

use std::sync::Arc;

use crate::common::{normalize_angle, LocalPath, Pose2D, SteeringMethod, StrategyFactory};
use crate::path_planning::reeds_shepp_path;
use crate::steering::DEFAULT_STEP_SIZE;

/// Turning radius used by the factory registered under `rs` [m]
pub const DEFAULT_TURNING_RADIUS: f64 = 1.0;

// Below this the two poses are the same configuration
const SAME_POSE_TOLERANCE: f64 = 1e-9;

/// Shortest Reeds-Shepp curve between two poses.
///
/// When oriented, only forward-driven curves are accepted.
#[derive(Debug, Clone)]
pub struct ReedsSheppSteeringMethod {
    turning_radius: f64,
    oriented: bool,
    step_size: f64,
}

impl ReedsSheppSteeringMethod {
    pub fn new(turning_radius: f64, oriented: bool) -> Self {
        Self {
            turning_radius,
            oriented,
            step_size: DEFAULT_STEP_SIZE,
        }
    }

    pub fn turning_radius(&self) -> f64 {
        self.turning_radius
    }
}

pub(crate) fn same_pose(from: &Pose2D, to: &Pose2D) -> bool {
    from.position().distance(&to.position()) <= SAME_POSE_TOLERANCE
        && normalize_angle(to.yaw - from.yaw).abs() <= SAME_POSE_TOLERANCE
}

impl SteeringMethod for ReedsSheppSteeringMethod {
    fn name(&self) -> &'static str {
        "rs"
    }

    fn is_oriented(&self) -> bool {
        self.oriented
    }

    fn steer(&self, from: &Pose2D, to: &Pose2D) -> Option<LocalPath> {
        if same_pose(from, to) {
            return LocalPath::forward(vec![*from]);
        }
        let path = reeds_shepp_path::shortest_path(
            from,
            to,
            1.0 / self.turning_radius,
            self.step_size,
            self.oriented,
        )?;
        LocalPath::new(path.poses(), path.directions)
    }
}

/// Factory registered under `rs`
#[derive(Debug)]
pub struct ReedsSheppSteeringMethodFactory {
    turning_radius: f64,
}

impl ReedsSheppSteeringMethodFactory {
    pub fn new(turning_radius: f64) -> Self {
        Self { turning_radius }
    }
}

impl Default for ReedsSheppSteeringMethodFactory {
    fn default() -> Self {
        Self::new(DEFAULT_TURNING_RADIUS)
    }
}

impl StrategyFactory for ReedsSheppSteeringMethodFactory {
    type Strategy = dyn SteeringMethod;

    fn construct(&self, oriented: bool) -> Arc<dyn SteeringMethod> {
        Arc::new(ReedsSheppSteeringMethod::new(self.turning_radius, oriented))
    }
}
