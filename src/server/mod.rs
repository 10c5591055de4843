//! Planning server lifecycle
//!
//! [`PlanningServer`] drives the bootstrap of the broker:
//!
//! 1. acquire the broker handle from the process arguments
//! 2. build the serving domain: a child of the root adapter created under a
//!    single-thread policy, so that every call runs on the thread that
//!    processes requests
//! 3. let a [`ServiceHook`] activate the Robot, Obstacle and Problem objects
//! 4. bind each object in the naming directory
//! 5. activate the domain's adapter manager
//!
//! Steps 1-3 are [`PlanningServer::initialize`], steps 4-5
//! [`PlanningServer::start`]. The first failing step is logged, reported as
//! [`ServerError::Bootstrap`] and leaves the server outside `Serving`.

pub mod context;
#[cfg(test)]
mod fault_injection;
pub mod state;

use log::{error, info, warn};
use std::sync::Arc;

use crate::broker::{Broker, BrokerError, BrokerRuntime, ObjectAdapter, ThreadModel};
use crate::common::{ServerError, ServerResult};
use crate::config::ServerConfig;
use crate::planner::SharedPlanner;
use crate::services::{ActivatedService, ServiceHook};

pub use context::ServerContext;
pub use state::{BootstrapStep, ServerState};

/// Logs and wraps the failure of a bootstrap step
fn bootstrap_failure(step: BootstrapStep) -> impl FnOnce(BrokerError) -> ServerError {
    move |source| {
        error!("{}: {}", step, source);
        ServerError::Bootstrap { step, source }
    }
}

/// Stops a blocking request loop from another thread
#[derive(Clone)]
pub struct ShutdownHandle {
    broker: Arc<dyn Broker>,
}

impl ShutdownHandle {
    /// Ask the broker to stop; queued calls are still dispatched
    pub fn shutdown(&self) {
        self.broker.shutdown(false);
    }
}

/// Process-wide planning server.
///
/// At most one instance exists per process; its [`ServerContext`] is
/// reachable through [`ServerContext::current`] until it is shut down.
pub struct PlanningServer {
    config: ServerConfig,
    context: Arc<ServerContext>,
    state: ServerState,
    broker: Option<Arc<dyn Broker>>,
    domain: Option<Box<dyn ObjectAdapter>>,
    services: Vec<ActivatedService>,
}

impl PlanningServer {
    /// Register a new server around `planner`.
    ///
    /// Fails with [`ServerError::AlreadyRunning`] while another server is
    /// alive in this process.
    pub fn new(planner: SharedPlanner, config: ServerConfig) -> ServerResult<Self> {
        let context = Arc::new(ServerContext::new(planner));
        if !ServerContext::install(&context) {
            warn!("refusing to create a second planning server");
            return Err(ServerError::AlreadyRunning);
        }
        Ok(Self {
            config,
            context,
            state: ServerState::Uninitialized,
            broker: None,
            domain: None,
            services: Vec::new(),
        })
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn context(&self) -> &Arc<ServerContext> {
        &self.context
    }

    /// Service objects activated in the serving domain
    pub fn services(&self) -> &[ActivatedService] {
        &self.services
    }

    /// Handle stopping the request loop, once the broker has been acquired
    pub fn shutdown_handle(&self) -> Option<ShutdownHandle> {
        self.broker.as_ref().map(|broker| ShutdownHandle {
            broker: Arc::clone(broker),
        })
    }

    fn expect_state(&self, expected: ServerState) -> ServerResult<()> {
        if self.state != expected {
            return Err(ServerError::InvalidState {
                expected,
                actual: self.state,
            });
        }
        Ok(())
    }

    fn broker(&self, expected: ServerState) -> ServerResult<&Arc<dyn Broker>> {
        self.broker.as_ref().ok_or(ServerError::InvalidState {
            expected,
            actual: self.state,
        })
    }

    fn domain(&self, expected: ServerState) -> ServerResult<&dyn ObjectAdapter> {
        self.domain.as_deref().ok_or(ServerError::InvalidState {
            expected,
            actual: self.state,
        })
    }

    /// Acquire the broker, build the serving domain and activate the
    /// service objects through `hook`
    pub fn initialize(&mut self, runtime: &dyn BrokerRuntime, args: &[String], hook: &dyn ServiceHook) -> ServerResult<()> {
        self.expect_state(ServerState::Uninitialized)?;

        let broker = runtime.init(args).map_err(bootstrap_failure(BootstrapStep::BrokerInit))?;
        self.broker = Some(Arc::clone(&broker));
        self.state = ServerState::BrokerReady;

        let root = broker
            .resolve_root_adapter()
            .map_err(bootstrap_failure(BootstrapStep::ResolveRootAdapter))?;
        let policy = root
            .create_thread_policy(ThreadModel::SingleThread)
            .map_err(bootstrap_failure(BootstrapStep::CreatePolicy))?;
        let domain = match root.create_child(&self.config.domain.name, policy.as_ref()) {
            Ok(domain) => domain,
            Err(e) => {
                if let Err(err) = policy.destroy() {
                    warn!("failed to destroy thread policy: {}", err);
                }
                return Err(bootstrap_failure(BootstrapStep::CreateDomain)(e));
            }
        };
        // The domain is kept even if the policy cannot be destroyed
        self.domain = Some(domain);
        policy
            .destroy()
            .map_err(bootstrap_failure(BootstrapStep::DestroyPolicy))?;
        self.state = ServerState::DomainReady;
        info!("serving domain {} ready", self.config.domain.name);

        let services = hook
            .create_and_activate(&self.context, self.domain(ServerState::DomainReady)?)
            .map_err(bootstrap_failure(BootstrapStep::ActivateServices))?;
        self.services = services;
        self.state = ServerState::ServicesActivated;
        info!("{} service objects activated", self.services.len());
        Ok(())
    }

    /// Bind the service objects and start dispatching requests
    pub fn start(&mut self) -> ServerResult<()> {
        self.expect_state(ServerState::ServicesActivated)?;
        let broker = self.broker(ServerState::ServicesActivated)?;
        let domain = self.domain(ServerState::ServicesActivated)?;

        let naming = broker
            .resolve_naming_service()
            .map_err(bootstrap_failure(BootstrapStep::ResolveNaming))?;
        let context = naming
            .create_or_resolve_context(&self.config.naming.context_path())
            .map_err(bootstrap_failure(BootstrapStep::NamingContext))?;

        for service in &self.services {
            let reference = domain
                .reference(service.id)
                .map_err(bootstrap_failure(BootstrapStep::Reference(service.role)))?;
            let name = service.role.name();
            context
                .rebind(&name, &reference)
                .map_err(bootstrap_failure(BootstrapStep::Bind(service.role)))?;
            info!("{} object bound as {}", service.role, context.path().join(&name));
        }
        self.state = ServerState::Bound;

        self.domain(ServerState::Bound)?
            .activate_manager()
            .map_err(bootstrap_failure(BootstrapStep::ActivateManager))?;
        self.state = ServerState::Serving;
        info!("planning server ready to serve requests");
        Ok(())
    }

    /// Full bootstrap: [`initialize`](Self::initialize) then
    /// [`start`](Self::start)
    pub fn launch(&mut self, runtime: &dyn BrokerRuntime, args: &[String], hook: &dyn ServiceHook) -> ServerResult<()> {
        self.initialize(runtime, args, hook)?;
        self.start()
    }

    /// Dispatch requests.
    ///
    /// Blocking mode runs the broker loop until it is shut down. Polling mode
    /// dispatches at most one pending call and returns immediately.
    pub fn process_request(&self, blocking: bool) -> ServerResult<()> {
        self.expect_state(ServerState::Serving)?;
        let broker = self.broker(ServerState::Serving)?;
        if blocking {
            broker.run().map_err(ServerError::Request)
        } else if broker.work_pending() {
            broker.perform_work().map_err(ServerError::Request)
        } else {
            Ok(())
        }
    }

    /// True when a call is waiting for dispatch
    pub fn has_pending_requests(&self) -> bool {
        self.state == ServerState::Serving && self.broker.as_ref().map_or(false, |b| b.work_pending())
    }

    /// Deactivate the service objects, stop the broker and release the
    /// process-wide context. Calling it again does nothing.
    pub fn shutdown(&mut self) {
        if self.state == ServerState::Destroyed {
            return;
        }
        self.state = ServerState::ShuttingDown;

        if let Some(domain) = self.domain.as_deref() {
            for service in self.services.drain(..) {
                if let Err(e) = domain.deactivate_object(service.id) {
                    warn!("failed to deactivate {} object: {}", service.role, e);
                }
            }
        }
        if let Some(broker) = self.broker.take() {
            broker.shutdown(false);
        }
        self.domain = None;
        ServerContext::uninstall(&self.context);
        self.state = ServerState::Destroyed;
        info!("planning server shut down");
    }
}

impl Drop for PlanningServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::fault_injection::{Fault, FaultyRuntime, FailingHook};
    use super::*;
    use crate::broker::{CallFault, LocalRuntime, NamePath, Value};
    use crate::planner::ProblemSolver;
    use crate::services::{DefaultServices, ServiceRole};
    use parking_lot::{Mutex, MutexGuard};

    // Servers register a process-wide context, so tests building one run
    // one at a time
    static SERIAL: Mutex<()> = parking_lot::const_mutex(());

    fn serial() -> MutexGuard<'static, ()> {
        SERIAL.lock()
    }

    fn server() -> PlanningServer {
        PlanningServer::new(Arc::new(Mutex::new(ProblemSolver::new())), ServerConfig::default()).unwrap()
    }

    fn bound_name(role: ServiceRole) -> NamePath {
        ServerConfig::default().naming.context_path().join(&role.name())
    }

    #[test]
    fn test_launch_binds_services() {
        let _guard = serial();
        let runtime = LocalRuntime::default();
        let mut server = server();
        server.launch(&runtime, &[], &DefaultServices).unwrap();
        assert_eq!(server.state(), ServerState::Serving);
        assert_eq!(server.services().len(), 3);

        let client = runtime.client();
        for role in ServiceRole::ALL {
            let reference = client.resolve(&bound_name(role)).unwrap();
            assert_eq!(reference.interface, role.id());
            assert_eq!(reference.adapter, "child");
        }
    }

    #[test]
    fn test_singleton_accessor() {
        let _guard = serial();
        assert!(ServerContext::current().is_none());
        let mut server = server();
        let current = ServerContext::current().unwrap();
        assert!(Arc::ptr_eq(&current, server.context()));

        let second = PlanningServer::new(Arc::new(Mutex::new(ProblemSolver::new())), ServerConfig::default());
        assert!(matches!(second, Err(ServerError::AlreadyRunning)));
        // The refused server did not clear the live one
        assert!(ServerContext::current().is_some());

        server.shutdown();
        assert!(ServerContext::current().is_none());
        assert_eq!(server.state(), ServerState::Destroyed);
        server.shutdown();
        assert_eq!(server.state(), ServerState::Destroyed);
    }

    #[test]
    fn test_drop_releases_singleton() {
        let _guard = serial();
        {
            let runtime = LocalRuntime::default();
            let mut server = server();
            server.launch(&runtime, &[], &DefaultServices).unwrap();
        }
        assert!(ServerContext::current().is_none());
        let _next = server();
    }

    #[test]
    fn test_process_request_requires_serving() {
        let _guard = serial();
        let runtime = LocalRuntime::default();
        let mut server = server();
        assert!(matches!(
            server.process_request(false),
            Err(ServerError::InvalidState { expected: ServerState::Serving, .. })
        ));
        server.initialize(&runtime, &[], &DefaultServices).unwrap();
        assert_eq!(server.state(), ServerState::ServicesActivated);
        assert!(server.process_request(false).is_err());
        assert!(server.initialize(&runtime, &[], &DefaultServices).is_err());
        server.start().unwrap();
        assert!(server.process_request(false).is_ok());
    }

    #[test]
    fn test_polling_dispatches_one_call() {
        let _guard = serial();
        let runtime = LocalRuntime::default();
        let mut server = server();
        server.launch(&runtime, &[], &DefaultServices).unwrap();

        // Nothing pending: returns at once
        server.process_request(false).unwrap();

        let client = runtime.client();
        let robot = client.resolve(&bound_name(ServiceRole::Robot)).unwrap();
        let first = client
            .send(&robot, "setRobotName", vec![Value::Str("buggy".into())])
            .unwrap();
        let second = client.send(&robot, "getRobotName", vec![]).unwrap();
        assert!(server.has_pending_requests());

        server.process_request(false).unwrap();
        assert_eq!(first.try_take(), Some(Ok(Value::Unit)));
        assert!(second.try_take().is_none());
        assert!(server.has_pending_requests());
        server.process_request(false).unwrap();
        assert_eq!(second.try_take(), Some(Ok(Value::Str("buggy".into()))));
        assert!(!server.has_pending_requests());
    }

    #[test]
    fn test_faulty_call_keeps_serving() {
        let _guard = serial();
        let runtime = LocalRuntime::default();
        let mut server = server();
        server.launch(&runtime, &[], &DefaultServices).unwrap();

        let client = runtime.client();
        let problem = client.resolve(&bound_name(ServiceRole::Problem)).unwrap();
        let bad = client
            .send(&problem, "selectSteeringMethod", vec![Value::Str("dubins".into()), Value::Bool(false)])
            .unwrap();
        let good = client
            .send(&problem, "selectSteeringMethod", vec![Value::Str("rs".into()), Value::Bool(false)])
            .unwrap();
        server.process_request(false).unwrap();
        server.process_request(false).unwrap();

        assert!(matches!(bad.try_take(), Some(Err(CallFault::Failed(_)))));
        assert_eq!(good.try_take(), Some(Ok(Value::Unit)));
        assert_eq!(server.state(), ServerState::Serving);
        let planner = server.context().planner().lock();
        assert_eq!(planner.steering_method().unwrap().name(), "rs");
    }

    #[test]
    fn test_shutdown_deactivates_services() {
        let _guard = serial();
        let runtime = LocalRuntime::default();
        let mut server = server();
        server.launch(&runtime, &[], &DefaultServices).unwrap();
        let client = runtime.client();
        let robot = client.resolve(&bound_name(ServiceRole::Robot)).unwrap();

        server.shutdown();
        assert!(server.services().is_empty());
        assert!(runtime.broker().is_shut_down());
        assert!(client.send(&robot, "getRobotName", vec![]).is_err());
        assert!(server.process_request(false).is_err());
    }

    fn assert_fails_at(fault: Fault, step: BootstrapStep, reached: ServerState) {
        let runtime = FaultyRuntime::new(fault);
        let mut server = server();
        match server.launch(&runtime, &[], &DefaultServices) {
            Err(ServerError::Bootstrap { step: failed, .. }) => assert_eq!(failed, step),
            other => panic!("expected failure at {:?}, got {:?}", step, other.err()),
        }
        assert_eq!(server.state(), reached);
        assert!(server.process_request(false).is_err());
        server.shutdown();
        assert!(ServerContext::current().is_none());
    }

    #[test]
    fn test_every_bootstrap_step_failure_is_reported() {
        let _guard = serial();
        use ServerState::*;
        let cases = [
            (Fault::BrokerInit, BootstrapStep::BrokerInit, Uninitialized),
            (Fault::RootAdapter, BootstrapStep::ResolveRootAdapter, BrokerReady),
            (Fault::CreatePolicy, BootstrapStep::CreatePolicy, BrokerReady),
            (Fault::CreateChild, BootstrapStep::CreateDomain, BrokerReady),
            (Fault::DestroyPolicy, BootstrapStep::DestroyPolicy, BrokerReady),
            (Fault::NamingService, BootstrapStep::ResolveNaming, ServicesActivated),
            (Fault::NamingContext, BootstrapStep::NamingContext, ServicesActivated),
            (Fault::ActivateManager, BootstrapStep::ActivateManager, Bound),
        ];
        for (fault, step, reached) in cases {
            assert_fails_at(fault, step, reached);
        }
        for role in ServiceRole::ALL {
            assert_fails_at(Fault::Reference(role), BootstrapStep::Reference(role), ServicesActivated);
            assert_fails_at(Fault::Bind(role), BootstrapStep::Bind(role), ServicesActivated);
        }
    }

    #[test]
    fn test_hook_failure_is_reported() {
        let _guard = serial();
        let runtime = LocalRuntime::default();
        let mut server = server();
        let result = server.launch(&runtime, &[], &FailingHook);
        assert!(matches!(
            result,
            Err(ServerError::Bootstrap { step: BootstrapStep::ActivateServices, .. })
        ));
        assert_eq!(server.state(), ServerState::DomainReady);
        assert!(server.services().is_empty());
    }

    #[test]
    fn test_first_bind_failure_stops_binding() {
        let _guard = serial();
        let runtime = FaultyRuntime::new(Fault::Bind(ServiceRole::Obstacle));
        let mut server = server();
        assert!(server.launch(&runtime, &[], &DefaultServices).is_err());

        let client = runtime.inner().client();
        let context = ServerConfig::default().naming.context_path();
        assert!(client.resolve(&context.join(&ServiceRole::Robot.name())).is_ok());
        assert!(client.resolve(&context.join(&ServiceRole::Obstacle.name())).is_err());
        assert!(client.resolve(&context.join(&ServiceRole::Problem.name())).is_err());
    }

    #[test]
    fn test_blocking_loop_stops_on_shutdown_handle() {
        let _guard = serial();
        let runtime = LocalRuntime::default();
        let mut server = server();
        assert!(server.shutdown_handle().is_none());
        server.launch(&runtime, &[], &DefaultServices).unwrap();

        let handle = server.shutdown_handle().unwrap();
        let client = runtime.client();
        let robot = client.resolve(&bound_name(ServiceRole::Robot)).unwrap();
        let caller = std::thread::spawn(move || {
            let reply = client.invoke(&robot, "getConfigSize", vec![]);
            handle.shutdown();
            reply
        });

        server.process_request(true).unwrap();
        assert_eq!(caller.join().unwrap(), Ok(Value::Long(3)));
        server.shutdown();
        assert_eq!(server.state(), ServerState::Destroyed);
    }
}
