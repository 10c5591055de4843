use log::{debug, warn};
use std::collections::HashMap;
use std::sync::Arc;

use crate::common::{DistanceFunction, SteeringMethod, StrategyFactory};
use crate::distance::{ApproxFlicDistanceFactory, LinearDistanceFactory, ReedsSheppDistanceFactory};
use crate::steering::{FlicSteeringMethodFactory, LinearSteeringMethodFactory, ReedsSheppSteeringMethodFactory};

/// Turning radius of the Reeds-Shepp built-ins
pub const BUILTIN_TURNING_RADIUS: f64 = 1.0;

type BoxedFactory<S> = Box<dyn StrategyFactory<Strategy = S>>;

/// Map from strategy name to the factory that builds it.
///
/// A name is bound at most once: registering a taken name is refused and
/// leaves the existing factory in place.
pub struct StrategyRegistry<S: ?Sized> {
    category: &'static str,
    factories: HashMap<String, BoxedFactory<S>>,
}

pub type SteeringMethodRegistry = StrategyRegistry<dyn SteeringMethod>;
pub type DistanceFunctionRegistry = StrategyRegistry<dyn DistanceFunction>;

impl<S: ?Sized> StrategyRegistry<S> {
    /// Empty registry; `category` only labels log lines
    pub fn new(category: &'static str) -> Self {
        Self {
            category,
            factories: HashMap::new(),
        }
    }

    pub fn category(&self) -> &'static str {
        self.category
    }

    /// Take ownership of `factory` under `name`.
    ///
    /// Returns false, dropping `factory`, when `name` is already taken.
    pub fn register(&mut self, name: &str, factory: BoxedFactory<S>) -> bool {
        if self.factories.contains_key(name) {
            warn!("{} factory '{}' is already registered", self.category, name);
            return false;
        }
        self.factories.insert(name.to_string(), factory);
        debug!("registered {} factory '{}'", self.category, name);
        true
    }

    pub fn has(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Build a new strategy, or `None` when no factory has this name
    pub fn construct(&self, name: &str, oriented: bool) -> Option<Arc<S>> {
        match self.factories.get(name) {
            Some(factory) => Some(factory.construct(oriented)),
            None => {
                debug!("no {} factory named '{}'", self.category, name);
                None
            }
        }
    }

    /// Remove and release the factory bound to `name`
    pub fn unregister(&mut self, name: &str) -> bool {
        self.factories.remove(name).is_some()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl SteeringMethodRegistry {
    /// Registry holding `linear`, `rs` and `flic`
    pub fn with_builtins() -> Self {
        let mut registry = Self::new("steering method");
        registry.register("linear", Box::new(LinearSteeringMethodFactory));
        registry.register(
            "rs",
            Box::new(ReedsSheppSteeringMethodFactory::new(BUILTIN_TURNING_RADIUS)),
        );
        registry.register("flic", Box::new(FlicSteeringMethodFactory));
        registry
    }
}

impl DistanceFunctionRegistry {
    /// Registry holding `linear`, `rs` and `flic`
    pub fn with_builtins() -> Self {
        let mut registry = Self::new("distance function");
        registry.register("linear", Box::new(LinearDistanceFactory));
        registry.register("rs", Box::new(ReedsSheppDistanceFactory::new(BUILTIN_TURNING_RADIUS)));
        registry.register("flic", Box::new(ApproxFlicDistanceFactory));
        registry
    }
}
