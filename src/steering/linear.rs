//! Straight-line steering method

use std::sync::Arc;

use crate::common::{normalize_angle, LocalPath, Pose2D, SteeringMethod, StrategyFactory, MAX_PATH_SAMPLES};
use crate::steering::DEFAULT_STEP_SIZE;

/// Interpolates position and heading linearly.
///
/// The path is the same in both directions, so `oriented` is only reported.
#[derive(Debug, Clone)]
pub struct LinearSteeringMethod {
    oriented: bool,
    step_size: f64,
}

impl LinearSteeringMethod {
    pub fn new(oriented: bool) -> Self {
        Self::with_step(oriented, DEFAULT_STEP_SIZE)
    }

    pub fn with_step(oriented: bool, step_size: f64) -> Self {
        Self { oriented, step_size }
    }
}

impl SteeringMethod for LinearSteeringMethod {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn is_oriented(&self) -> bool {
        self.oriented
    }

    fn steer(&self, from: &Pose2D, to: &Pose2D) -> Option<LocalPath> {
        let dist = from.position().distance(&to.position());
        let dyaw = normalize_angle(to.yaw - from.yaw);
        let segments = (dist / self.step_size).ceil();
        if !(segments <= MAX_PATH_SAMPLES as f64) {
            return None;
        }
        let n = (segments as usize).max(1);

        let poses = (0..=n)
            .map(|i| {
                let t = i as f64 / n as f64;
                Pose2D::new(
                    from.x + t * (to.x - from.x),
                    from.y + t * (to.y - from.y),
                    normalize_angle(from.yaw + t * dyaw),
                )
            })
            .collect();
        LocalPath::forward(poses)
    }
}

/// Factory registered under `linear`
#[derive(Debug, Default)]
pub struct LinearSteeringMethodFactory;

impl StrategyFactory for LinearSteeringMethodFactory {
    type Strategy = dyn SteeringMethod;

    fn construct(&self, oriented: bool) -> Arc<dyn SteeringMethod> {
        Arc::new(LinearSteeringMethod::new(oriented))
    }
}
