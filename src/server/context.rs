//! Shared planner façade and the process-wide accessor

use log::debug;
use parking_lot::{const_mutex, Mutex, RwLock, RwLockReadGuard};
use std::sync::Arc;

use crate::common::{DistanceFunction, SteeringMethod, StrategyFactory};
use crate::planner::SharedPlanner;
use crate::strategy::{DistanceFunctionRegistry, SteeringMethodRegistry};

// Context of the live server, if any
static CURRENT: Mutex<Option<Arc<ServerContext>>> = const_mutex(None);

/// Planning engine plus the two strategy registries.
///
/// Service objects hold a clone of the `Arc`; anything else in the process
/// reaches the live server's context through [`ServerContext::current`].
pub struct ServerContext {
    planner: SharedPlanner,
    steering_methods: RwLock<SteeringMethodRegistry>,
    distance_functions: RwLock<DistanceFunctionRegistry>,
}

impl ServerContext {
    /// Context with the built-in `linear`, `rs` and `flic` strategies
    pub fn new(planner: SharedPlanner) -> Self {
        Self::with_registries(
            planner,
            SteeringMethodRegistry::with_builtins(),
            DistanceFunctionRegistry::with_builtins(),
        )
    }

    pub fn with_registries(
        planner: SharedPlanner,
        steering_methods: SteeringMethodRegistry,
        distance_functions: DistanceFunctionRegistry,
    ) -> Self {
        Self {
            planner,
            steering_methods: RwLock::new(steering_methods),
            distance_functions: RwLock::new(distance_functions),
        }
    }

    /// Context of the planning server alive in this process
    pub fn current() -> Option<Arc<ServerContext>> {
        CURRENT.lock().clone()
    }

    /// Make `context` the process-wide one; false if another is installed
    pub(crate) fn install(context: &Arc<ServerContext>) -> bool {
        let mut current = CURRENT.lock();
        if current.is_some() {
            return false;
        }
        *current = Some(Arc::clone(context));
        true
    }

    /// Clear the process-wide context if it is `context`
    pub(crate) fn uninstall(context: &Arc<ServerContext>) {
        let mut current = CURRENT.lock();
        if current.as_ref().is_some_and(|c| Arc::ptr_eq(c, context)) {
            *current = None;
            debug!("process-wide server context cleared");
        }
    }

    pub fn planner(&self) -> &SharedPlanner {
        &self.planner
    }

    pub fn steering_methods(&self) -> RwLockReadGuard<'_, SteeringMethodRegistry> {
        self.steering_methods.read()
    }

    pub fn distance_functions(&self) -> RwLockReadGuard<'_, DistanceFunctionRegistry> {
        self.distance_functions.read()
    }

    pub fn add_steering_method_factory(
        &self,
        name: &str,
        factory: Box<dyn StrategyFactory<Strategy = dyn SteeringMethod>>,
    ) -> bool {
        self.steering_methods.write().register(name, factory)
    }

    pub fn add_distance_function_factory(
        &self,
        name: &str,
        factory: Box<dyn StrategyFactory<Strategy = dyn DistanceFunction>>,
    ) -> bool {
        self.distance_functions.write().register(name, factory)
    }

    pub fn create_steering_method(&self, name: &str, oriented: bool) -> Option<Arc<dyn SteeringMethod>> {
        self.steering_methods.read().construct(name, oriented)
    }

    pub fn create_distance_function(&self, name: &str, oriented: bool) -> Option<Arc<dyn DistanceFunction>> {
        self.distance_functions.read().construct(name, oriented)
    }

    /// Build the named steering method and hand it to the planner
    pub fn select_steering_method(&self, name: &str, oriented: bool) -> bool {
        match self.create_steering_method(name, oriented) {
            Some(steering) => {
                self.planner.lock().set_steering_method(steering);
                true
            }
            None => false,
        }
    }

    /// Build the named distance function and hand it to the planner
    pub fn select_distance_function(&self, name: &str, oriented: bool) -> bool {
        match self.create_distance_function(name, oriented) {
            Some(distance) => {
                self.planner.lock().set_distance(distance);
                true
            }
            None => false,
        }
    }
}
