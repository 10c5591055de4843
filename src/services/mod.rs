//! Service objects exposed through the broker
//!
//! Robot, Obstacle and Problem forward remote calls to the planning engine
//! held by the [`ServerContext`]. They are created and activated in the
//! serving domain by a [`ServiceHook`]; the server then binds each one in
//! the naming directory under its role id with kind `Object`.

pub mod obstacle;
pub mod problem;
pub mod robot;

use log::{debug, warn};
use std::fmt;
use std::sync::Arc;

use crate::broker::{BrokerResult, CallFault, NamePath, ObjectAdapter, ObjectId, Servant, Value};
use crate::common::{PlanningError, Pose2D};
use crate::server::ServerContext;

pub use obstacle::ObstacleServant;
pub use problem::ProblemServant;
pub use robot::RobotServant;

/// Kind of every service binding
pub const OBJECT_KIND: &str = "Object";

/// Fault returned when a configuration does not have one value per dof
pub const WRONG_CONFIG_SIZE: &str = "robot nb dof is different from config size";

/// Role of a service object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceRole {
    Robot,
    Obstacle,
    Problem,
}

impl ServiceRole {
    /// Activation and binding order
    pub const ALL: [ServiceRole; 3] = [ServiceRole::Robot, ServiceRole::Obstacle, ServiceRole::Problem];

    /// Id of the naming binding, also the servant interface name
    pub fn id(self) -> &'static str {
        match self {
            ServiceRole::Robot => "Robot",
            ServiceRole::Obstacle => "Obstacle",
            ServiceRole::Problem => "Problem",
        }
    }

    /// Name under which the object is bound, relative to the server context
    pub fn name(self) -> NamePath {
        NamePath::single(self.id(), OBJECT_KIND)
    }
}

impl fmt::Display for ServiceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Service object activated in the serving domain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivatedService {
    pub role: ServiceRole,
    pub id: ObjectId,
}

/// Creates the service objects and activates them in `domain`.
///
/// Called once during bootstrap. On error nothing must remain active.
pub trait ServiceHook {
    fn create_and_activate(
        &self,
        context: &Arc<ServerContext>,
        domain: &dyn ObjectAdapter,
    ) -> BrokerResult<Vec<ActivatedService>>;
}

/// Activates one Robot, one Obstacle and one Problem servant
#[derive(Debug, Default)]
pub struct DefaultServices;

impl DefaultServices {
    fn servant(role: ServiceRole, context: &Arc<ServerContext>) -> Box<dyn Servant> {
        let context = Arc::clone(context);
        match role {
            ServiceRole::Robot => Box::new(RobotServant::new(context)),
            ServiceRole::Obstacle => Box::new(ObstacleServant::new(context)),
            ServiceRole::Problem => Box::new(ProblemServant::new(context)),
        }
    }
}

impl ServiceHook for DefaultServices {
    fn create_and_activate(
        &self,
        context: &Arc<ServerContext>,
        domain: &dyn ObjectAdapter,
    ) -> BrokerResult<Vec<ActivatedService>> {
        let mut activated: Vec<ActivatedService> = Vec::with_capacity(ServiceRole::ALL.len());
        for role in ServiceRole::ALL {
            match domain.activate_object(Self::servant(role, context)) {
                Ok(id) => {
                    debug!("{} object activated as {}", role, id);
                    activated.push(ActivatedService { role, id });
                }
                Err(e) => {
                    for service in activated.iter().rev() {
                        if let Err(err) = domain.deactivate_object(service.id) {
                            warn!("failed to deactivate {} object: {}", service.role, err);
                        }
                    }
                    return Err(e);
                }
            }
        }
        Ok(activated)
    }
}

// Argument decoding shared by the servants

pub(crate) fn expect_arity(operation: &str, args: &[Value], n: usize) -> Result<(), CallFault> {
    if args.len() != n {
        return Err(CallFault::BadParam(format!(
            "{} expects {} argument(s), got {}",
            operation,
            n,
            args.len()
        )));
    }
    Ok(())
}

fn wrong_type(operation: &str, index: usize, expected: &str, found: &Value) -> CallFault {
    CallFault::BadParam(format!(
        "argument {} of {} must be a {}, got {}",
        index,
        operation,
        expected,
        found.type_name()
    ))
}

pub(crate) fn arg_str<'a>(operation: &str, args: &'a [Value], index: usize) -> Result<&'a str, CallFault> {
    args[index].as_str().ok_or_else(|| wrong_type(operation, index, "string", &args[index]))
}

pub(crate) fn arg_bool(operation: &str, args: &[Value], index: usize) -> Result<bool, CallFault> {
    args[index].as_bool().ok_or_else(|| wrong_type(operation, index, "boolean", &args[index]))
}

fn not_finite(operation: &str, index: usize) -> CallFault {
    CallFault::BadParam(format!("argument {} of {} must be finite", index, operation))
}

/// Finite double argument
pub(crate) fn arg_double(operation: &str, args: &[Value], index: usize) -> Result<f64, CallFault> {
    let value = args[index]
        .as_double()
        .ok_or_else(|| wrong_type(operation, index, "double", &args[index]))?;
    if !value.is_finite() {
        return Err(not_finite(operation, index));
    }
    Ok(value)
}

pub(crate) fn arg_index(operation: &str, args: &[Value], index: usize) -> Result<usize, CallFault> {
    let value = args[index]
        .as_long()
        .ok_or_else(|| wrong_type(operation, index, "long", &args[index]))?;
    usize::try_from(value).map_err(|_| CallFault::BadParam(format!("wrong path id: {}", value)))
}

/// Configuration argument: a float sequence with one value per dof
pub(crate) fn arg_config(operation: &str, args: &[Value], index: usize) -> Result<Pose2D, CallFault> {
    let dofs = args[index]
        .as_float_seq()
        .ok_or_else(|| wrong_type(operation, index, "floatSeq", &args[index]))?;
    let config = Pose2D::from_slice(dofs).ok_or_else(|| CallFault::BadParam(WRONG_CONFIG_SIZE.to_string()))?;
    if !dofs.iter().all(|v| v.is_finite()) {
        return Err(not_finite(operation, index));
    }
    Ok(config)
}

pub(crate) fn config_value(config: &Pose2D) -> Value {
    Value::FloatSeq(config.to_vec())
}

pub(crate) fn planning_fault(err: PlanningError) -> CallFault {
    match err {
        PlanningError::UnknownPath { .. } | PlanningError::InvalidParameter(_) => CallFault::BadParam(err.to_string()),
        _ => CallFault::Failed(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::{Broker, LocalBroker, ThreadModel};
    use crate::planner::ProblemSolver;
    use parking_lot::Mutex;

    fn context() -> Arc<ServerContext> {
        Arc::new(ServerContext::new(Arc::new(Mutex::new(ProblemSolver::new()))))
    }

    fn child_adapter(broker: &LocalBroker) -> Box<dyn ObjectAdapter> {
        let root = broker.resolve_root_adapter().unwrap();
        let policy = root.create_thread_policy(ThreadModel::SingleThread).unwrap();
        root.create_child("child", policy.as_ref()).unwrap()
    }

    #[test]
    fn test_role_names() {
        assert_eq!(ServiceRole::Robot.name().to_string(), "Robot.Object");
        assert_eq!(ServiceRole::Obstacle.name().to_string(), "Obstacle.Object");
        assert_eq!(ServiceRole::Problem.name().to_string(), "Problem.Object");
    }

    #[test]
    fn test_default_services_activates_three_objects() {
        let broker = LocalBroker::default();
        let domain = child_adapter(&broker);
        let services = DefaultServices.create_and_activate(&context(), domain.as_ref()).unwrap();
        let roles: Vec<ServiceRole> = services.iter().map(|s| s.role).collect();
        assert_eq!(roles, ServiceRole::ALL.to_vec());
        for service in &services {
            assert_eq!(domain.reference(service.id).unwrap().interface, service.role.id());
        }
    }

    #[test]
    fn test_config_argument_checks_size() {
        let args = vec![Value::FloatSeq(vec![1.0, 2.0])];
        assert_eq!(
            arg_config("setInitialConfig", &args, 0),
            Err(CallFault::BadParam(WRONG_CONFIG_SIZE.to_string()))
        );
        let args = vec![Value::Str("q".into())];
        assert!(matches!(arg_config("setInitialConfig", &args, 0), Err(CallFault::BadParam(_))));
        let args = vec![Value::FloatSeq(vec![1.0, 2.0, 0.5])];
        assert_eq!(arg_config("setInitialConfig", &args, 0), Ok(Pose2D::new(1.0, 2.0, 0.5)));
    }

    #[test]
    fn test_non_finite_arguments_are_bad_param() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let args = vec![Value::FloatSeq(vec![0.0, 0.0, bad])];
            assert!(matches!(arg_config("distance", &args, 0), Err(CallFault::BadParam(_))));
            let args = vec![Value::FloatSeq(vec![bad, 0.0, 0.0])];
            assert!(matches!(arg_config("directPath", &args, 0), Err(CallFault::BadParam(_))));
            assert!(matches!(
                arg_double("configAtParam", &[Value::Double(bad)], 0),
                Err(CallFault::BadParam(_))
            ));
        }
        // Large but finite values are accepted
        let args = vec![Value::FloatSeq(vec![0.0, 0.0, 1e300])];
        assert_eq!(arg_config("distance", &args, 0), Ok(Pose2D::new(0.0, 0.0, 1e300)));
    }

    #[test]
    fn test_negative_path_id_is_bad_param() {
        let args = vec![Value::Long(-1)];
        assert!(matches!(arg_index("pathLength", &args, 0), Err(CallFault::BadParam(_))));
        assert_eq!(arg_index("pathLength", &[Value::Long(2)], 0), Ok(2));
    }
}
