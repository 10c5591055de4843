//! Obstacle service: circular obstacles and collision queries

use std::sync::Arc;

use crate::broker::{CallFault, Servant, Value};
use crate::common::CircleObstacle;
use crate::server::ServerContext;
use crate::services::{arg_config, arg_double, arg_str, expect_arity, planning_fault, ServiceRole};

pub struct ObstacleServant {
    context: Arc<ServerContext>,
}

impl ObstacleServant {
    pub fn new(context: Arc<ServerContext>) -> Self {
        Self { context }
    }
}

impl Servant for ObstacleServant {
    fn interface(&self) -> &'static str {
        ServiceRole::Obstacle.id()
    }

    fn dispatch(&mut self, operation: &str, args: &[Value]) -> Result<Value, CallFault> {
        let mut planner = self.context.planner().lock();
        match operation {
            "addCircularObstacle" => {
                expect_arity(operation, args, 4)?;
                let name = arg_str(operation, args, 0)?;
                let x = arg_double(operation, args, 1)?;
                let y = arg_double(operation, args, 2)?;
                let radius = arg_double(operation, args, 3)?;
                if radius.is_nan() || radius <= 0.0 {
                    return Err(CallFault::BadParam(format!("radius must be positive, got {}", radius)));
                }
                planner.add_obstacle(name, CircleObstacle::new(x, y, radius));
                Ok(Value::Unit)
            }
            "removeObstacle" => {
                expect_arity(operation, args, 1)?;
                planner
                    .remove_obstacle(arg_str(operation, args, 0)?)
                    .map_err(planning_fault)?;
                Ok(Value::Unit)
            }
            "getObstacleNames" => {
                expect_arity(operation, args, 0)?;
                Ok(Value::StrSeq(planner.obstacle_names()))
            }
            "collisionFree" => {
                expect_arity(operation, args, 1)?;
                let config = arg_config(operation, args, 0)?;
                Ok(Value::Bool(planner.is_config_valid(&config)))
            }
            _ => Err(CallFault::BadOperation(operation.to_string())),
        }
    }
}
