//! Approximate length of the flat-output curve

use std::sync::Arc;

use crate::common::{DistanceFunction, Pose2D, StrategyFactory};
use crate::path_planning::bezier_path::{self, DEFAULT_OFFSET};

/// Mean of the chord and the control polygon of the cubic joining the two
/// poses. Non-oriented instances take the shorter of the forward and
/// backward curves and are symmetric.
#[derive(Debug, Clone)]
pub struct ApproxFlicDistance {
    oriented: bool,
    offset: f64,
}

impl ApproxFlicDistance {
    pub fn new(oriented: bool) -> Self {
        Self {
            oriented,
            offset: DEFAULT_OFFSET,
        }
    }

    fn forward_length(&self, from: &Pose2D, to: &Pose2D) -> f64 {
        bezier_path::approx_length(&bezier_path::four_control_points(from, to, self.offset))
    }
}

impl DistanceFunction for ApproxFlicDistance {
    fn name(&self) -> &'static str {
        "flic"
    }

    fn is_oriented(&self) -> bool {
        self.oriented
    }

    fn distance(&self, from: &Pose2D, to: &Pose2D) -> f64 {
        let forward = self.forward_length(from, to);
        if self.oriented {
            forward
        } else {
            forward.min(self.forward_length(to, from))
        }
    }
}

/// Factory registered under `flic`
#[derive(Debug, Default)]
pub struct ApproxFlicDistanceFactory;

impl StrategyFactory for ApproxFlicDistanceFactory {
    type Strategy = dyn DistanceFunction;

    fn construct(&self, oriented: bool) -> Arc<dyn DistanceFunction> {
        Arc::new(ApproxFlicDistance::new(oriented))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_straight_line() {
        let d = ApproxFlicDistance::new(true);
        let a = Pose2D::new(0.0, 0.0, 0.0);
        let b = Pose2D::new(6.0, 0.0, 0.0);
        assert_relative_eq!(d.distance(&a, &b), 6.0, epsilon = 1e-9);
    }

    #[test]
    fn test_non_oriented_is_symmetric() {
        let d = ApproxFlicDistance::new(false);
        let a = Pose2D::new(0.0, 0.0, 0.3);
        let b = Pose2D::new(-2.0, 1.0, -1.2);
        assert_relative_eq!(d.distance(&a, &b), d.distance(&b, &a), epsilon = 1e-12);
    }

    #[test]
    fn test_oriented_penalizes_backing_up() {
        let a = Pose2D::new(0.0, 0.0, 0.0);
        let b = Pose2D::new(-3.0, 0.0, 0.0);
        let oriented = ApproxFlicDistance::new(true).distance(&a, &b);
        let free = ApproxFlicDistance::new(false).distance(&a, &b);
        assert_relative_eq!(free, 3.0, epsilon = 1e-9);
        assert!(oriented > free);
    }
}
