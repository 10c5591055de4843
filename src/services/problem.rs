//! Problem service: problem definition, strategy selection and direct paths

use log::warn;
use std::sync::Arc;

use crate::broker::{CallFault, Servant, Value};
use crate::server::ServerContext;
use crate::services::{
    arg_bool, arg_config, arg_double, arg_index, arg_str, config_value, expect_arity, planning_fault, ServiceRole,
};

pub struct ProblemServant {
    context: Arc<ServerContext>,
}

impl ProblemServant {
    pub fn new(context: Arc<ServerContext>) -> Self {
        Self { context }
    }

    fn select_steering_method(&self, operation: &str, args: &[Value]) -> Result<Value, CallFault> {
        expect_arity(operation, args, 2)?;
        let name = arg_str(operation, args, 0)?;
        let oriented = arg_bool(operation, args, 1)?;
        if self.context.select_steering_method(name, oriented) {
            Ok(Value::Unit)
        } else {
            warn!("unknown steering method '{}' requested", name);
            Err(CallFault::Failed(format!("unknown steering method: {}", name)))
        }
    }

    fn select_distance(&self, operation: &str, args: &[Value]) -> Result<Value, CallFault> {
        expect_arity(operation, args, 2)?;
        let name = arg_str(operation, args, 0)?;
        let oriented = arg_bool(operation, args, 1)?;
        if self.context.select_distance_function(name, oriented) {
            Ok(Value::Unit)
        } else {
            warn!("unknown distance function '{}' requested", name);
            Err(CallFault::Failed(format!("unknown distance function: {}", name)))
        }
    }
}

impl Servant for ProblemServant {
    fn interface(&self) -> &'static str {
        ServiceRole::Problem.id()
    }

    fn dispatch(&mut self, operation: &str, args: &[Value]) -> Result<Value, CallFault> {
        // Strategy selection locks the planner itself
        match operation {
            "selectSteeringMethod" => return self.select_steering_method(operation, args),
            "selectDistance" => return self.select_distance(operation, args),
            _ => {}
        }

        let mut planner = self.context.planner().lock();
        match operation {
            "setInitialConfig" => {
                expect_arity(operation, args, 1)?;
                planner.set_init_config(arg_config(operation, args, 0)?);
                Ok(Value::Unit)
            }
            "getInitialConfig" => {
                expect_arity(operation, args, 0)?;
                planner
                    .init_config()
                    .map(|q| config_value(&q))
                    .ok_or_else(|| CallFault::Failed("no initial configuration defined".to_string()))
            }
            "addGoalConfig" => {
                expect_arity(operation, args, 1)?;
                planner.add_goal_config(arg_config(operation, args, 0)?);
                Ok(Value::Unit)
            }
            "getGoalConfigs" => {
                expect_arity(operation, args, 0)?;
                Ok(Value::FloatSeqSeq(
                    planner.goal_configs().iter().map(|q| q.to_vec()).collect(),
                ))
            }
            "resetGoalConfigs" => {
                expect_arity(operation, args, 0)?;
                planner.reset_goal_configs();
                Ok(Value::Unit)
            }
            "distance" => {
                expect_arity(operation, args, 2)?;
                let q1 = arg_config(operation, args, 0)?;
                let q2 = arg_config(operation, args, 1)?;
                planner.distance(&q1, &q2).map(Value::Double).map_err(planning_fault)
            }
            "directPath" => {
                expect_arity(operation, args, 2)?;
                let q1 = arg_config(operation, args, 0)?;
                let q2 = arg_config(operation, args, 1)?;
                let id = planner.direct_path(&q1, &q2).map_err(planning_fault)?;
                Ok(Value::Long(id as i64))
            }
            "appendDirectPath" => {
                expect_arity(operation, args, 2)?;
                let id = arg_index(operation, args, 0)?;
                let q = arg_config(operation, args, 1)?;
                planner.append_direct_path(id, &q).map_err(planning_fault)?;
                Ok(Value::Unit)
            }
            "numberPaths" => {
                expect_arity(operation, args, 0)?;
                Ok(Value::Long(planner.paths().len() as i64))
            }
            "pathLength" => {
                expect_arity(operation, args, 1)?;
                let path = planner
                    .path(arg_index(operation, args, 0)?)
                    .map_err(planning_fault)?;
                Ok(Value::Double(path.length()))
            }
            "configAtParam" => {
                expect_arity(operation, args, 2)?;
                let s = arg_double(operation, args, 1)?;
                let path = planner
                    .path(arg_index(operation, args, 0)?)
                    .map_err(planning_fault)?;
                Ok(config_value(&path.config_at_param(s)))
            }
            "getWaypoints" => {
                expect_arity(operation, args, 1)?;
                let path = planner
                    .path(arg_index(operation, args, 0)?)
                    .map_err(planning_fault)?;
                Ok(Value::FloatSeqSeq(path.poses().iter().map(|q| q.to_vec()).collect()))
            }
            "clearPaths" => {
                expect_arity(operation, args, 0)?;
                planner.clear_paths();
                Ok(Value::Unit)
            }
            _ => Err(CallFault::BadOperation(operation.to_string())),
        }
    }
}
