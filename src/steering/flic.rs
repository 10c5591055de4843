//! Flat-output steering method.
//!
//! The flat outputs of a car-like robot are the position of the rear axle
//! center; any smooth planar curve whose tangent matches the headings at both
//! ends is feasible. The curve used here is the cubic Bezier leaving the start
//! along its heading and entering the goal along its heading.

use std::sync::Arc;

use crate::common::{LocalPath, Pose2D, SteeringMethod, StrategyFactory, MAX_PATH_SAMPLES};
use crate::path_planning::bezier_path::{self, DEFAULT_OFFSET};
use crate::steering::DEFAULT_STEP_SIZE;

#[derive(Debug, Clone)]
pub struct FlicSteeringMethod {
    oriented: bool,
    offset: f64,
    step_size: f64,
}

impl FlicSteeringMethod {
    pub fn new(oriented: bool) -> Self {
        Self {
            oriented,
            offset: DEFAULT_OFFSET,
            step_size: DEFAULT_STEP_SIZE,
        }
    }

    /// Forward-driven curve from `from` to `to`
    fn forward_curve(&self, from: &Pose2D, to: &Pose2D) -> Option<LocalPath> {
        let cp = bezier_path::four_control_points(from, to, self.offset);
        let segments = (bezier_path::approx_length(&cp) / self.step_size).ceil();
        if !(segments < MAX_PATH_SAMPLES as f64) {
            return None;
        }
        let n = segments as usize + 1;
        let mut poses = bezier_path::calc_bezier_poses(&cp, from.yaw, n);
        // Endpoints are exact, not sampled
        let last = poses.len() - 1;
        poses[0] = *from;
        poses[last] = *to;
        LocalPath::forward(poses)
    }
}

impl SteeringMethod for FlicSteeringMethod {
    fn name(&self) -> &'static str {
        "flic"
    }

    fn is_oriented(&self) -> bool {
        self.oriented
    }

    fn steer(&self, from: &Pose2D, to: &Pose2D) -> Option<LocalPath> {
        let forward = self.forward_curve(from, to)?;
        if self.oriented {
            return Some(forward);
        }
        // Driving backwards from `from` to `to` follows the forward curve
        // from `to` to `from` in the opposite direction
        let backward = self.forward_curve(to, from)?.reversed();
        if backward.length() < forward.length() {
            Some(backward)
        } else {
            Some(forward)
        }
    }
}

/// Factory registered under `flic`
#[derive(Debug, Default)]
pub struct FlicSteeringMethodFactory;

impl StrategyFactory for FlicSteeringMethodFactory {
    type Strategy = dyn SteeringMethod;

    fn construct(&self, oriented: bool) -> Arc<dyn SteeringMethod> {
        Arc::new(FlicSteeringMethod::new(oriented))
    }
}
