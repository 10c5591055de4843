use log::{debug, info};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::common::{
    CircleObstacle, DistanceFunction, LocalPath, PlanningError, PlanningResult, Pose2D, SteeringMethod,
};
use crate::planner::PlanningEngine;

/// Radius of the disc approximating the robot footprint [m]
pub const DEFAULT_ROBOT_RADIUS: f64 = 0.3;

/// Problem definition and path store for one car-like robot
pub struct ProblemSolver {
    robot_name: String,
    robot_radius: f64,
    current: Pose2D,
    init: Option<Pose2D>,
    goals: Vec<Pose2D>,
    obstacles: BTreeMap<String, CircleObstacle>,
    steering: Option<Arc<dyn SteeringMethod>>,
    distance: Option<Arc<dyn DistanceFunction>>,
    paths: Vec<LocalPath>,
}

impl ProblemSolver {
    pub fn new() -> Self {
        Self::with_robot_radius(DEFAULT_ROBOT_RADIUS)
    }

    pub fn with_robot_radius(robot_radius: f64) -> Self {
        Self {
            robot_name: String::new(),
            robot_radius,
            current: Pose2D::origin(),
            init: None,
            goals: Vec::new(),
            obstacles: BTreeMap::new(),
            steering: None,
            distance: None,
            paths: Vec::new(),
        }
    }

    pub fn robot_radius(&self) -> f64 {
        self.robot_radius
    }

    /// Steer with the selected method and reject paths hitting an obstacle
    fn steer_valid(&self, from: &Pose2D, to: &Pose2D) -> PlanningResult<LocalPath> {
        let steering = self.steering.as_ref().ok_or(PlanningError::NoSteeringMethod)?;
        let path = steering
            .steer(from, to)
            .ok_or(PlanningError::SteeringFailed(steering.name()))?;

        match path.poses().iter().find_map(|q| self.collision(q)) {
            Some(obstacle) => Err(PlanningError::Collision(obstacle)),
            None => Ok(path),
        }
    }
}

impl Default for ProblemSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl PlanningEngine for ProblemSolver {
    fn robot_name(&self) -> &str {
        &self.robot_name
    }

    fn set_robot_name(&mut self, name: &str) {
        self.robot_name = name.to_string();
    }

    fn current_config(&self) -> Pose2D {
        self.current
    }

    fn set_current_config(&mut self, config: Pose2D) {
        self.current = config;
    }

    fn init_config(&self) -> Option<Pose2D> {
        self.init
    }

    fn set_init_config(&mut self, config: Pose2D) {
        self.init = Some(config);
    }

    fn goal_configs(&self) -> &[Pose2D] {
        &self.goals
    }

    fn add_goal_config(&mut self, config: Pose2D) {
        self.goals.push(config);
    }

    fn reset_goal_configs(&mut self) {
        self.goals.clear();
    }

    fn add_obstacle(&mut self, name: &str, obstacle: CircleObstacle) {
        if self.obstacles.insert(name.to_string(), obstacle).is_some() {
            debug!("obstacle {} replaced", name);
        }
    }

    fn remove_obstacle(&mut self, name: &str) -> PlanningResult<()> {
        self.obstacles
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| PlanningError::InvalidParameter(format!("no obstacle named {}", name)))
    }

    fn obstacle_names(&self) -> Vec<String> {
        self.obstacles.keys().cloned().collect()
    }

    fn collision(&self, config: &Pose2D) -> Option<String> {
        let center = config.position();
        self.obstacles
            .iter()
            .find(|(_, o)| CircleObstacle::new(o.x, o.y, o.radius + self.robot_radius).contains(&center))
            .map(|(name, _)| name.clone())
    }

    fn set_steering_method(&mut self, steering: Arc<dyn SteeringMethod>) {
        info!(
            "steering method set to {} (oriented: {})",
            steering.name(),
            steering.is_oriented()
        );
        self.steering = Some(steering);
    }

    fn steering_method(&self) -> Option<Arc<dyn SteeringMethod>> {
        self.steering.clone()
    }

    fn set_distance(&mut self, distance: Arc<dyn DistanceFunction>) {
        info!(
            "distance function set to {} (oriented: {})",
            distance.name(),
            distance.is_oriented()
        );
        self.distance = Some(distance);
    }

    fn distance_function(&self) -> Option<Arc<dyn DistanceFunction>> {
        self.distance.clone()
    }

    fn distance(&self, from: &Pose2D, to: &Pose2D) -> PlanningResult<f64> {
        let distance = self.distance.as_ref().ok_or(PlanningError::NoDistanceFunction)?;
        Ok(distance.distance(from, to))
    }

    fn direct_path(&mut self, from: &Pose2D, to: &Pose2D) -> PlanningResult<usize> {
        let path = self.steer_valid(from, to)?;
        self.paths.push(path);
        let id = self.paths.len() - 1;
        debug!("stored direct path {} ({} samples)", id, self.paths[id].len());
        Ok(id)
    }

    fn append_direct_path(&mut self, id: usize, to: &Pose2D) -> PlanningResult<()> {
        let from = self.path(id)?.end();
        let tail = self.steer_valid(&from, to)?;
        self.paths[id].append(&tail);
        Ok(())
    }

    fn paths(&self) -> &[LocalPath] {
        &self.paths
    }

    fn clear_paths(&mut self) {
        self.paths.clear();
    }
}
