//! Planning engine behind the service objects
//!
//! The engine stores the problem definition (robot, obstacles, initial and
//! goal configurations), the selected strategies and the paths built so far.
//! It performs no roadmap search: `direct_path` makes a single steering call.

pub mod problem_solver;

use parking_lot::Mutex;
use std::sync::Arc;

use crate::common::{CircleObstacle, DistanceFunction, LocalPath, PlanningResult, Pose2D, SteeringMethod};

pub use problem_solver::ProblemSolver;

/// Planning engine shared between the server and its service objects
pub type SharedPlanner = Arc<Mutex<dyn PlanningEngine>>;

/// Operations the service objects forward to the planner
pub trait PlanningEngine: Send {
    fn robot_name(&self) -> &str;
    fn set_robot_name(&mut self, name: &str);

    fn current_config(&self) -> Pose2D;
    fn set_current_config(&mut self, config: Pose2D);

    fn init_config(&self) -> Option<Pose2D>;
    fn set_init_config(&mut self, config: Pose2D);

    fn goal_configs(&self) -> &[Pose2D];
    fn add_goal_config(&mut self, config: Pose2D);
    fn reset_goal_configs(&mut self);

    /// Add or replace a named obstacle
    fn add_obstacle(&mut self, name: &str, obstacle: CircleObstacle);
    fn remove_obstacle(&mut self, name: &str) -> PlanningResult<()>;
    fn obstacle_names(&self) -> Vec<String>;

    /// Name of the first obstacle hit by the robot at `config`, if any
    fn collision(&self, config: &Pose2D) -> Option<String>;

    fn is_config_valid(&self, config: &Pose2D) -> bool {
        self.collision(config).is_none()
    }

    fn set_steering_method(&mut self, steering: Arc<dyn SteeringMethod>);
    fn steering_method(&self) -> Option<Arc<dyn SteeringMethod>>;

    fn set_distance(&mut self, distance: Arc<dyn DistanceFunction>);
    fn distance_function(&self) -> Option<Arc<dyn DistanceFunction>>;

    /// Distance between two configurations under the selected function
    fn distance(&self, from: &Pose2D, to: &Pose2D) -> PlanningResult<f64>;

    /// Steer from `from` to `to`, check the result against the obstacles and
    /// store it. Returns the index of the new path.
    fn direct_path(&mut self, from: &Pose2D, to: &Pose2D) -> PlanningResult<usize>;

    /// Extend path `id` with a direct path from its end to `to`
    fn append_direct_path(&mut self, id: usize, to: &Pose2D) -> PlanningResult<()>;

    fn paths(&self) -> &[LocalPath];

    fn path(&self, id: usize) -> PlanningResult<&LocalPath> {
        let paths = self.paths();
        paths.get(id).ok_or(crate::common::PlanningError::UnknownPath {
            id,
            count: paths.len(),
        })
    }

    fn clear_paths(&mut self);
}
