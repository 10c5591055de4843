//! Robot service: identity and current configuration of the robot

use std::sync::Arc;

use crate::broker::{CallFault, Servant, Value};
use crate::common::Pose2D;
use crate::server::ServerContext;
use crate::services::{arg_config, arg_str, config_value, expect_arity, ServiceRole};

pub struct RobotServant {
    context: Arc<ServerContext>,
}

impl RobotServant {
    pub fn new(context: Arc<ServerContext>) -> Self {
        Self { context }
    }
}

impl Servant for RobotServant {
    fn interface(&self) -> &'static str {
        ServiceRole::Robot.id()
    }

    fn dispatch(&mut self, operation: &str, args: &[Value]) -> Result<Value, CallFault> {
        let mut planner = self.context.planner().lock();
        match operation {
            "setRobotName" => {
                expect_arity(operation, args, 1)?;
                planner.set_robot_name(arg_str(operation, args, 0)?);
                Ok(Value::Unit)
            }
            "getRobotName" => {
                expect_arity(operation, args, 0)?;
                Ok(Value::Str(planner.robot_name().to_string()))
            }
            "getConfigSize" => {
                expect_arity(operation, args, 0)?;
                Ok(Value::Long(Pose2D::DOF as i64))
            }
            "setCurrentConfig" => {
                expect_arity(operation, args, 1)?;
                planner.set_current_config(arg_config(operation, args, 0)?);
                Ok(Value::Unit)
            }
            "getCurrentConfig" => {
                expect_arity(operation, args, 0)?;
                Ok(config_value(&planner.current_config()))
            }
            _ => Err(CallFault::BadOperation(operation.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::ProblemSolver;
    use crate::services::WRONG_CONFIG_SIZE;
    use parking_lot::Mutex;

    fn servant() -> RobotServant {
        RobotServant::new(Arc::new(ServerContext::new(Arc::new(Mutex::new(ProblemSolver::new())))))
    }

    #[test]
    fn test_robot_name() {
        let mut robot = servant();
        robot.dispatch("setRobotName", &[Value::Str("buggy".into())]).unwrap();
        assert_eq!(robot.dispatch("getRobotName", &[]), Ok(Value::Str("buggy".into())));
    }

    #[test]
    fn test_current_config() {
        let mut robot = servant();
        assert_eq!(robot.dispatch("getConfigSize", &[]), Ok(Value::Long(3)));
        robot
            .dispatch("setCurrentConfig", &[Value::FloatSeq(vec![1.0, -1.0, 0.25])])
            .unwrap();
        assert_eq!(
            robot.dispatch("getCurrentConfig", &[]),
            Ok(Value::FloatSeq(vec![1.0, -1.0, 0.25]))
        );
    }

    #[test]
    fn test_wrong_config_size_is_rejected() {
        let mut robot = servant();
        let result = robot.dispatch("setCurrentConfig", &[Value::FloatSeq(vec![1.0; 4])]);
        assert_eq!(result, Err(CallFault::BadParam(WRONG_CONFIG_SIZE.to_string())));
        assert_eq!(robot.dispatch("getCurrentConfig", &[]), Ok(Value::FloatSeq(vec![0.0; 3])));
    }

    #[test]
    fn test_unknown_operation() {
        let mut robot = servant();
        assert!(matches!(robot.dispatch("fly", &[]), Err(CallFault::BadOperation(_))));
        assert!(matches!(robot.dispatch("getRobotName", &[Value::Unit]), Err(CallFault::BadParam(_))));
    }
}
