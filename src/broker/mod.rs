//! Request-oriented object broker
//!
//! The server only orchestrates a broker runtime, it never implements one.
//! These traits are the seams it drives:
//!
//! - [`BrokerRuntime`] hands out the process-wide [`Broker`] handle
//! - [`Broker`] resolves the root [`ObjectAdapter`] and the naming service,
//!   and runs the request loop
//! - [`ObjectAdapter`] derives child adapters under a [`ThreadPolicy`] and
//!   activates [`Servant`]s
//! - [`NamingDirectory`] / [`NamingContext`] bind object references to
//!   symbolic names
//!
//! [`local`] is an in-process implementation used by the binary and the tests.

pub mod error;
pub mod local;

use std::fmt;
use std::sync::Arc;

pub use error::{BrokerError, BrokerResult, CallFault};
pub use local::{BrokerClient, LocalBroker, LocalRuntime, PendingReply};

/// Value carried by a remote call, as argument or result
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Unit,
    Bool(bool),
    Long(i64),
    Double(f64),
    Str(String),
    FloatSeq(Vec<f64>),
    FloatSeqSeq(Vec<Vec<f64>>),
    StrSeq(Vec<String>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Unit => "unit",
            Value::Bool(_) => "boolean",
            Value::Long(_) => "long",
            Value::Double(_) => "double",
            Value::Str(_) => "string",
            Value::FloatSeq(_) => "floatSeq",
            Value::FloatSeqSeq(_) => "floatSeqSeq",
            Value::StrSeq(_) => "stringSeq",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Doubles, and longs widened to double
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            Value::Long(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_float_seq(&self) -> Option<&[f64]> {
        match self {
            Value::FloatSeq(v) => Some(v),
            _ => None,
        }
    }
}

/// One segment of a symbolic name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NameComponent {
    pub id: String,
    pub kind: String,
}

impl NameComponent {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self { id: id.into(), kind: kind.into() }
    }
}

impl fmt::Display for NameComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind.is_empty() {
            write!(f, "{}", self.id)
        } else {
            write!(f, "{}.{}", self.id, self.kind)
        }
    }
}

/// Symbolic name in the naming directory
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NamePath(pub Vec<NameComponent>);

impl NamePath {
    pub fn new(components: Vec<NameComponent>) -> Self {
        Self(components)
    }

    /// Single-segment name
    pub fn single(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self(vec![NameComponent::new(id, kind)])
    }

    pub fn components(&self) -> &[NameComponent] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `self` followed by `other`
    pub fn join(&self, other: &NamePath) -> NamePath {
        let mut components = self.0.clone();
        components.extend(other.0.iter().cloned());
        NamePath(components)
    }
}

impl fmt::Display for NamePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, c) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

/// Identifier of an activated object inside its adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Remote-callable reference to an activated object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub id: ObjectId,
    pub adapter: String,
    pub interface: String,
}

/// Threading model requested for an adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadModel {
    /// Every call runs on the thread that drives the request loop
    SingleThread,
    /// Calls may run concurrently on broker-owned threads
    Concurrent,
}

/// Process-wide broker factory
pub trait BrokerRuntime {
    /// Acquire a broker handle from the process arguments
    fn init(&self, args: &[String]) -> BrokerResult<Arc<dyn Broker>>;
}

/// Broker handle: adapters, naming service and request loop
pub trait Broker: Send + Sync {
    /// Resolve the root object adapter
    fn resolve_root_adapter(&self) -> BrokerResult<Box<dyn ObjectAdapter>>;

    /// Resolve the naming service
    fn resolve_naming_service(&self) -> BrokerResult<Box<dyn NamingDirectory>>;

    /// True if at least one call is waiting to be dispatched
    fn work_pending(&self) -> bool;

    /// Dispatch at most one pending call
    fn perform_work(&self) -> BrokerResult<()>;

    /// Dispatch calls until the broker is shut down
    fn run(&self) -> BrokerResult<()>;

    /// Stop the broker. With `wait_for_completion == false` the call returns
    /// immediately and already queued calls drain in the request loop.
    fn shutdown(&self, wait_for_completion: bool);
}

/// Threading policy object, destroyed once the adapter has been created
pub trait ThreadPolicy: Send {
    fn model(&self) -> ThreadModel;

    fn destroy(self: Box<Self>) -> BrokerResult<()>;
}

/// Object adapter: activates servants and controls dispatch to them
pub trait ObjectAdapter: Send + Sync {
    fn name(&self) -> &str;

    fn create_thread_policy(&self, model: ThreadModel) -> BrokerResult<Box<dyn ThreadPolicy>>;

    /// Derive a child adapter using `policy`
    fn create_child(&self, name: &str, policy: &dyn ThreadPolicy) -> BrokerResult<Box<dyn ObjectAdapter>>;

    /// Activate a servant; the adapter takes ownership of it
    fn activate_object(&self, servant: Box<dyn Servant>) -> BrokerResult<ObjectId>;

    /// Remote-callable reference to an active object
    fn reference(&self, id: ObjectId) -> BrokerResult<ObjectRef>;

    /// Deactivate and destroy an object
    fn deactivate_object(&self, id: ObjectId) -> BrokerResult<()>;

    /// Start dispatching calls to this adapter's objects
    fn activate_manager(&self) -> BrokerResult<()>;

    fn is_active(&self) -> bool;
}

/// Root of the naming directory
pub trait NamingDirectory: Send {
    /// Create the context at `path`, or resolve it if it already exists
    fn create_or_resolve_context(&self, path: &NamePath) -> BrokerResult<Box<dyn NamingContext>>;
}

/// Naming context holding bindings
pub trait NamingContext: Send {
    fn path(&self) -> &NamePath;

    /// Bind `object` under `name`, silently replacing any existing binding
    fn rebind(&self, name: &NamePath, object: &ObjectRef) -> BrokerResult<()>;

    fn resolve(&self, name: &NamePath) -> BrokerResult<ObjectRef>;
}

/// Remotely callable object
pub trait Servant: Send {
    /// Interface name reported in object references
    fn interface(&self) -> &'static str;

    /// Execute one operation
    fn dispatch(&mut self, operation: &str, args: &[Value]) -> Result<Value, CallFault>;
}
