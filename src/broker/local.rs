//! In-process broker
//!
//! Remote callers hold a [`BrokerClient`] and queue calls on a bounded
//! crossbeam channel. Nothing is dispatched until the thread driving the
//! request loop calls [`Broker::perform_work`] or [`Broker::run`]; servants
//! therefore always execute on that single thread, one call at a time.

use crossbeam_channel::{bounded, select, Receiver, Sender, TrySendError};
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::{
    Broker, BrokerError, BrokerResult, BrokerRuntime, CallFault, NamePath, NamingContext,
    NamingDirectory, ObjectAdapter, ObjectId, ObjectRef, Servant, ThreadModel, ThreadPolicy, Value,
};

/// Name of the root adapter
pub const ROOT_ADAPTER: &str = "RootPOA";

/// Default capacity of the request queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

type Reply = Result<Value, CallFault>;

/// Bindings of the naming directory, keyed by full path
type NameTable = Mutex<BTreeMap<NamePath, ObjectRef>>;

struct Call {
    target: ObjectId,
    operation: String,
    args: Vec<Value>,
    reply: Sender<Reply>,
}

struct ActiveObject {
    adapter: String,
    interface: &'static str,
    // None while the servant is dispatching
    servant: Option<Box<dyn Servant>>,
}

struct Core {
    sender: Sender<Call>,
    requests: Receiver<Call>,
    stop_tx: Sender<()>,
    stop_rx: Receiver<()>,
    objects: Mutex<HashMap<ObjectId, ActiveObject>>,
    // adapter name -> manager active
    adapters: Mutex<HashMap<String, bool>>,
    names: Arc<NameTable>,
    next_id: AtomicU64,
    shut_down: Arc<AtomicBool>,
}

impl Core {
    fn new(queue_capacity: usize) -> Self {
        let (sender, requests) = bounded(queue_capacity.max(1));
        let (stop_tx, stop_rx) = bounded(1);
        Self {
            sender,
            requests,
            stop_tx,
            stop_rx,
            objects: Mutex::new(HashMap::new()),
            adapters: Mutex::new(HashMap::new()),
            names: Arc::new(Mutex::new(BTreeMap::new())),
            next_id: AtomicU64::new(1),
            shut_down: Arc::new(AtomicBool::new(false)),
        }
    }

    fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    fn dispatch(&self, call: Call) {
        let taken = {
            let mut objects = self.objects.lock();
            match objects.get_mut(&call.target) {
                None => Err(CallFault::ObjectNotExist(call.target)),
                Some(object) => {
                    let active = self.adapters.lock().get(&object.adapter).copied().unwrap_or(false);
                    if !active {
                        Err(CallFault::Transient(format!(
                            "adapter {} is not dispatching",
                            object.adapter
                        )))
                    } else {
                        object
                            .servant
                            .take()
                            .ok_or_else(|| CallFault::Transient("object is busy".to_string()))
                    }
                }
            }
        };

        let reply = match taken {
            Err(fault) => Err(fault),
            Ok(mut servant) => {
                let result = panic::catch_unwind(AssertUnwindSafe(|| {
                    servant.dispatch(&call.operation, &call.args)
                }));
                // Put the servant back unless it was deactivated meanwhile
                if let Some(object) = self.objects.lock().get_mut(&call.target) {
                    object.servant = Some(servant);
                }
                match result {
                    Ok(reply) => reply,
                    Err(_) => {
                        warn!("servant {} panicked in {}", call.target, call.operation);
                        Err(CallFault::Internal(format!("servant panicked in {}", call.operation)))
                    }
                }
            }
        };

        if let Err(ref fault) = reply {
            debug!("call {}::{} failed: {}", call.target, call.operation, fault);
        }
        // The caller may have stopped waiting
        let _ = call.reply.send(reply);
    }

    /// Dispatch whatever was queued before the shutdown request
    fn drain(&self) {
        let mut drained = 0usize;
        while let Ok(call) = self.requests.try_recv() {
            self.dispatch(call);
            drained += 1;
        }
        if drained > 0 {
            debug!("drained {} queued calls", drained);
        }
    }
}

impl Drop for Core {
    fn drop(&mut self) {
        while let Ok(call) = self.requests.try_recv() {
            let _ = call
                .reply
                .send(Err(CallFault::Transient("broker shut down".to_string())));
        }
    }
}

/// In-process broker handle
pub struct LocalBroker {
    core: Arc<Core>,
}

impl LocalBroker {
    pub fn new(queue_capacity: usize) -> Self {
        Self { core: Arc::new(Core::new(queue_capacity)) }
    }

    /// Handle for callers living on other threads
    pub fn client(&self) -> BrokerClient {
        BrokerClient {
            sender: self.core.sender.clone(),
            names: Arc::clone(&self.core.names),
            shut_down: Arc::clone(&self.core.shut_down),
        }
    }

    /// Number of calls waiting for dispatch
    pub fn pending(&self) -> usize {
        self.core.requests.len()
    }

    pub fn is_shut_down(&self) -> bool {
        self.core.is_shut_down()
    }
}

impl Default for LocalBroker {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

impl Broker for LocalBroker {
    fn resolve_root_adapter(&self) -> BrokerResult<Box<dyn ObjectAdapter>> {
        if self.core.is_shut_down() {
            return Err(BrokerError::ShutDown);
        }
        self.core.adapters.lock().entry(ROOT_ADAPTER.to_string()).or_insert(false);
        Ok(Box::new(LocalAdapter {
            core: Arc::clone(&self.core),
            name: ROOT_ADAPTER.to_string(),
        }))
    }

    fn resolve_naming_service(&self) -> BrokerResult<Box<dyn NamingDirectory>> {
        Ok(Box::new(LocalNaming { names: Arc::clone(&self.core.names) }))
    }

    fn work_pending(&self) -> bool {
        !self.core.requests.is_empty()
    }

    fn perform_work(&self) -> BrokerResult<()> {
        if let Ok(call) = self.core.requests.try_recv() {
            self.core.dispatch(call);
        }
        Ok(())
    }

    fn run(&self) -> BrokerResult<()> {
        info!("broker request loop started");
        loop {
            if self.core.is_shut_down() {
                self.core.drain();
                break;
            }
            select! {
                recv(self.core.requests) -> msg => match msg {
                    Ok(call) => self.core.dispatch(call),
                    Err(_) => break,
                },
                recv(self.core.stop_rx) -> _ => {
                    self.core.drain();
                    break;
                }
            }
        }
        info!("broker request loop stopped");
        Ok(())
    }

    fn shutdown(&self, wait_for_completion: bool) {
        if self.core.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }
        debug!("broker shutdown requested (wait_for_completion={})", wait_for_completion);
        // Wake a blocked run loop; a full slot means a wake-up is already pending
        let _ = self.core.stop_tx.try_send(());
    }
}

/// In-process broker runtime: one broker per runtime
pub struct LocalRuntime {
    broker: Arc<LocalBroker>,
}

impl LocalRuntime {
    pub fn new(queue_capacity: usize) -> Self {
        Self { broker: Arc::new(LocalBroker::new(queue_capacity)) }
    }

    pub fn client(&self) -> BrokerClient {
        self.broker.client()
    }

    pub fn broker(&self) -> Arc<LocalBroker> {
        Arc::clone(&self.broker)
    }
}

impl Default for LocalRuntime {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

impl BrokerRuntime for LocalRuntime {
    fn init(&self, args: &[String]) -> BrokerResult<Arc<dyn Broker>> {
        if self.broker.is_shut_down() {
            return Err(BrokerError::Initialization("broker has already been shut down".to_string()));
        }
        debug!("local broker initialized with {} argument(s)", args.len());
        let broker: Arc<dyn Broker> = self.broker.clone();
        Ok(broker)
    }
}

struct LocalPolicy {
    model: ThreadModel,
}

impl ThreadPolicy for LocalPolicy {
    fn model(&self) -> ThreadModel {
        self.model
    }

    fn destroy(self: Box<Self>) -> BrokerResult<()> {
        Ok(())
    }
}

struct LocalAdapter {
    core: Arc<Core>,
    name: String,
}

impl ObjectAdapter for LocalAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn create_thread_policy(&self, model: ThreadModel) -> BrokerResult<Box<dyn ThreadPolicy>> {
        Ok(Box::new(LocalPolicy { model }))
    }

    fn create_child(&self, name: &str, policy: &dyn ThreadPolicy) -> BrokerResult<Box<dyn ObjectAdapter>> {
        if policy.model() != ThreadModel::SingleThread {
            return Err(BrokerError::InvalidPolicy(
                "the local broker only serves single-threaded adapters".to_string(),
            ));
        }
        let mut adapters = self.core.adapters.lock();
        if adapters.contains_key(name) {
            return Err(BrokerError::AdapterAlreadyExists(name.to_string()));
        }
        adapters.insert(name.to_string(), false);
        debug!("adapter {} created under {}", name, self.name);
        Ok(Box::new(LocalAdapter {
            core: Arc::clone(&self.core),
            name: name.to_string(),
        }))
    }

    fn activate_object(&self, servant: Box<dyn Servant>) -> BrokerResult<ObjectId> {
        if self.core.is_shut_down() {
            return Err(BrokerError::ShutDown);
        }
        let id = ObjectId(self.core.next_id.fetch_add(1, Ordering::Relaxed));
        let interface = servant.interface();
        self.core.objects.lock().insert(
            id,
            ActiveObject {
                adapter: self.name.clone(),
                interface,
                servant: Some(servant),
            },
        );
        debug!("activated {} object {} in {}", interface, id, self.name);
        Ok(id)
    }

    fn reference(&self, id: ObjectId) -> BrokerResult<ObjectRef> {
        let objects = self.core.objects.lock();
        match objects.get(&id) {
            Some(object) if object.adapter == self.name => Ok(ObjectRef {
                id,
                adapter: self.name.clone(),
                interface: object.interface.to_string(),
            }),
            _ => Err(BrokerError::ObjectNotExist(id)),
        }
    }

    fn deactivate_object(&self, id: ObjectId) -> BrokerResult<()> {
        let removed = {
            let mut objects = self.core.objects.lock();
            match objects.get(&id) {
                Some(object) if object.adapter == self.name => objects.remove(&id),
                _ => None,
            }
        };
        // Servant dropped outside the lock
        match removed {
            Some(object) => {
                debug!("deactivated {} object {}", object.interface, id);
                Ok(())
            }
            None => Err(BrokerError::ObjectNotExist(id)),
        }
    }

    fn activate_manager(&self) -> BrokerResult<()> {
        if self.core.is_shut_down() {
            return Err(BrokerError::ShutDown);
        }
        self.core.adapters.lock().insert(self.name.clone(), true);
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.core.adapters.lock().get(&self.name).copied().unwrap_or(false)
    }
}

struct LocalNaming {
    names: Arc<NameTable>,
}

impl NamingDirectory for LocalNaming {
    fn create_or_resolve_context(&self, path: &NamePath) -> BrokerResult<Box<dyn NamingContext>> {
        Ok(Box::new(LocalNamingContext {
            names: Arc::clone(&self.names),
            path: path.clone(),
        }))
    }
}

struct LocalNamingContext {
    names: Arc<NameTable>,
    path: NamePath,
}

impl NamingContext for LocalNamingContext {
    fn path(&self) -> &NamePath {
        &self.path
    }

    fn rebind(&self, name: &NamePath, object: &ObjectRef) -> BrokerResult<()> {
        let full = self.path.join(name);
        if let Some(previous) = self.names.lock().insert(full.clone(), object.clone()) {
            debug!("{} rebound (was {})", full, previous.id);
        }
        Ok(())
    }

    fn resolve(&self, name: &NamePath) -> BrokerResult<ObjectRef> {
        let full = self.path.join(name);
        self.names
            .lock()
            .get(&full)
            .cloned()
            .ok_or_else(|| BrokerError::NameNotFound(full.to_string()))
    }
}

/// Caller-side handle on a [`LocalBroker`]
#[derive(Clone)]
pub struct BrokerClient {
    sender: Sender<Call>,
    names: Arc<NameTable>,
    shut_down: Arc<AtomicBool>,
}

impl BrokerClient {
    /// Look up a full path in the naming directory
    pub fn resolve(&self, path: &NamePath) -> BrokerResult<ObjectRef> {
        self.names
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| BrokerError::NameNotFound(path.to_string()))
    }

    /// Queue a call without waiting for it
    pub fn send(&self, target: &ObjectRef, operation: &str, args: Vec<Value>) -> BrokerResult<PendingReply> {
        if self.shut_down.load(Ordering::Acquire) {
            return Err(BrokerError::ShutDown);
        }
        let (reply, rx) = bounded(1);
        let call = Call {
            target: target.id,
            operation: operation.to_string(),
            args,
            reply,
        };
        match self.sender.try_send(call) {
            Ok(()) => Ok(PendingReply { rx }),
            Err(TrySendError::Full(_)) => Err(BrokerError::QueueFull),
            Err(TrySendError::Disconnected(_)) => Err(BrokerError::ShutDown),
        }
    }

    /// Queue a call and block until it has been dispatched.
    ///
    /// Must not be used from the thread driving the request loop.
    pub fn invoke(&self, target: &ObjectRef, operation: &str, args: Vec<Value>) -> Reply {
        self.send(target, operation, args)
            .map_err(|e| CallFault::Transient(e.to_string()))?
            .wait()
    }
}

/// Reply slot of a queued call
pub struct PendingReply {
    rx: Receiver<Reply>,
}

impl PendingReply {
    /// Block until the reply arrives
    pub fn wait(self) -> Reply {
        self.rx
            .recv()
            .unwrap_or_else(|_| Err(CallFault::Transient("reply channel closed".to_string())))
    }

    pub fn wait_timeout(self, timeout: Duration) -> Option<Reply> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Take the reply if it has already arrived
    pub fn try_take(&self) -> Option<Reply> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    struct Echo;

    impl Servant for Echo {
        fn interface(&self) -> &'static str {
            "Echo"
        }

        fn dispatch(&mut self, operation: &str, args: &[Value]) -> Result<Value, CallFault> {
            match operation {
                "echo" => Ok(args.first().cloned().unwrap_or(Value::Unit)),
                "panic" => panic!("echo servant asked to panic"),
                other => Err(CallFault::BadOperation(other.to_string())),
            }
        }
    }

    fn serving_domain(broker: &LocalBroker) -> Box<dyn ObjectAdapter> {
        let root = broker.resolve_root_adapter().unwrap();
        let policy = root.create_thread_policy(ThreadModel::SingleThread).unwrap();
        let child = root.create_child("child", policy.as_ref()).unwrap();
        policy.destroy().unwrap();
        child
    }

    #[test]
    fn test_child_requires_single_thread_policy() {
        let broker = LocalBroker::default();
        let root = broker.resolve_root_adapter().unwrap();
        let policy = root.create_thread_policy(ThreadModel::Concurrent).unwrap();
        let result = root.create_child("child", policy.as_ref());
        assert!(matches!(result, Err(BrokerError::InvalidPolicy(_))));
    }

    #[test]
    fn test_duplicate_child_adapter_rejected() {
        let broker = LocalBroker::default();
        let _child = serving_domain(&broker);
        let root = broker.resolve_root_adapter().unwrap();
        let policy = root.create_thread_policy(ThreadModel::SingleThread).unwrap();
        let result = root.create_child("child", policy.as_ref());
        assert!(matches!(result, Err(BrokerError::AdapterAlreadyExists(_))));
    }

    #[test]
    fn test_poll_without_pending_calls_is_noop() {
        let broker = LocalBroker::default();
        assert!(!broker.work_pending());
        broker.perform_work().unwrap();
        assert_eq!(broker.pending(), 0);
    }

    #[test]
    fn test_inactive_adapter_answers_transient() {
        let broker = LocalBroker::default();
        let domain = serving_domain(&broker);
        let id = domain.activate_object(Box::new(Echo)).unwrap();
        let target = domain.reference(id).unwrap();

        let reply = broker.client().send(&target, "echo", vec![Value::Long(1)]).unwrap();
        broker.perform_work().unwrap();
        assert!(matches!(reply.try_take(), Some(Err(CallFault::Transient(_)))));
    }

    #[test]
    fn test_poll_dispatches_exactly_one_call() {
        let broker = LocalBroker::default();
        let domain = serving_domain(&broker);
        let id = domain.activate_object(Box::new(Echo)).unwrap();
        domain.activate_manager().unwrap();
        let target = domain.reference(id).unwrap();
        let client = broker.client();

        let first = client.send(&target, "echo", vec![Value::Long(1)]).unwrap();
        let second = client.send(&target, "echo", vec![Value::Long(2)]).unwrap();
        assert_eq!(broker.pending(), 2);

        broker.perform_work().unwrap();
        assert_eq!(first.try_take(), Some(Ok(Value::Long(1))));
        assert!(second.try_take().is_none());
        assert_eq!(broker.pending(), 1);

        broker.perform_work().unwrap();
        assert_eq!(second.try_take(), Some(Ok(Value::Long(2))));
    }

    #[test]
    fn test_servant_panic_is_isolated() {
        let broker = LocalBroker::default();
        let domain = serving_domain(&broker);
        let id = domain.activate_object(Box::new(Echo)).unwrap();
        domain.activate_manager().unwrap();
        let target = domain.reference(id).unwrap();
        let client = broker.client();

        let bad = client.send(&target, "panic", vec![]).unwrap();
        let good = client.send(&target, "echo", vec![Value::Bool(true)]).unwrap();
        broker.perform_work().unwrap();
        broker.perform_work().unwrap();
        assert!(matches!(bad.try_take(), Some(Err(CallFault::Internal(_)))));
        assert_eq!(good.try_take(), Some(Ok(Value::Bool(true))));
    }

    #[test]
    fn test_deactivated_object_does_not_exist() {
        let broker = LocalBroker::default();
        let domain = serving_domain(&broker);
        let id = domain.activate_object(Box::new(Echo)).unwrap();
        domain.activate_manager().unwrap();
        let target = domain.reference(id).unwrap();
        domain.deactivate_object(id).unwrap();

        let reply = broker.client().send(&target, "echo", vec![]).unwrap();
        broker.perform_work().unwrap();
        assert_eq!(reply.try_take(), Some(Err(CallFault::ObjectNotExist(id))));
        assert!(domain.deactivate_object(id).is_err());
    }

    #[test]
    fn test_rebind_replaces_silently() {
        let broker = LocalBroker::default();
        let domain = serving_domain(&broker);
        let first = domain.reference(domain.activate_object(Box::new(Echo)).unwrap()).unwrap();
        let second = domain.reference(domain.activate_object(Box::new(Echo)).unwrap()).unwrap();

        let naming = broker.resolve_naming_service().unwrap();
        let context = naming
            .create_or_resolve_context(&NamePath::single("hpp", "corbaserver"))
            .unwrap();
        let name = NamePath::single("Robot", "Object");
        context.rebind(&name, &first).unwrap();
        context.rebind(&name, &second).unwrap();
        assert_eq!(context.resolve(&name).unwrap(), second);

        let full = context.path().join(&name);
        assert_eq!(broker.client().resolve(&full).unwrap(), second);
    }

    #[test]
    fn test_run_returns_after_shutdown_from_other_thread() {
        let broker = Arc::new(LocalBroker::default());
        let domain = serving_domain(&broker);
        let id = domain.activate_object(Box::new(Echo)).unwrap();
        domain.activate_manager().unwrap();
        let target = domain.reference(id).unwrap();
        let client = broker.client();

        let remote = Arc::clone(&broker);
        let caller = thread::spawn(move || {
            let reply = client.invoke(&target, "echo", vec![Value::Str("hi".into())]);
            remote.shutdown(false);
            reply
        });

        broker.run().unwrap();
        assert_eq!(caller.join().unwrap(), Ok(Value::Str("hi".into())));
        assert!(broker.is_shut_down());
        assert!(matches!(
            broker.client().send(&domain.reference(id).unwrap(), "echo", vec![]),
            Err(BrokerError::ShutDown)
        ));
    }

    #[test]
    fn test_full_queue_is_reported() {
        let broker = LocalBroker::new(1);
        let domain = serving_domain(&broker);
        let target = domain.reference(domain.activate_object(Box::new(Echo)).unwrap()).unwrap();
        let client = broker.client();
        let _first = client.send(&target, "echo", vec![]).unwrap();
        assert!(matches!(client.send(&target, "echo", vec![]), Err(BrokerError::QueueFull)));
    }

    #[test]
    fn test_queued_calls_fail_when_broker_dropped() {
        let broker = LocalBroker::default();
        let domain = serving_domain(&broker);
        let target = domain.reference(domain.activate_object(Box::new(Echo)).unwrap()).unwrap();
        let reply = broker.client().send(&target, "echo", vec![]).unwrap();
        drop(domain);
        drop(broker);
        assert!(matches!(reply.wait(), Err(CallFault::Transient(_))));
    }
}
