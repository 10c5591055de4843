//! Broker wrappers failing one chosen bootstrap operation

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::broker::{
    Broker, BrokerError, BrokerResult, BrokerRuntime, LocalRuntime, NamePath, NamingContext, NamingDirectory,
    ObjectAdapter, ObjectId, ObjectRef, Servant, ThreadModel, ThreadPolicy,
};
use crate::server::ServerContext;
use crate::services::{ActivatedService, ServiceHook, ServiceRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    BrokerInit,
    RootAdapter,
    CreatePolicy,
    CreateChild,
    DestroyPolicy,
    NamingService,
    NamingContext,
    Reference(ServiceRole),
    Bind(ServiceRole),
    ActivateManager,
}

fn injected(what: &str) -> BrokerError {
    BrokerError::Internal(format!("injected {} failure", what))
}

pub struct FaultyRuntime {
    inner: LocalRuntime,
    fault: Fault,
}

impl FaultyRuntime {
    pub fn new(fault: Fault) -> Self {
        Self {
            inner: LocalRuntime::default(),
            fault,
        }
    }

    pub fn inner(&self) -> &LocalRuntime {
        &self.inner
    }
}

impl BrokerRuntime for FaultyRuntime {
    fn init(&self, args: &[String]) -> BrokerResult<Arc<dyn Broker>> {
        if self.fault == Fault::BrokerInit {
            return Err(BrokerError::Initialization("injected failure".to_string()));
        }
        Ok(Arc::new(FaultyBroker {
            inner: self.inner.init(args)?,
            fault: self.fault,
        }))
    }
}

struct FaultyBroker {
    inner: Arc<dyn Broker>,
    fault: Fault,
}

impl Broker for FaultyBroker {
    fn resolve_root_adapter(&self) -> BrokerResult<Box<dyn ObjectAdapter>> {
        if self.fault == Fault::RootAdapter {
            return Err(BrokerError::InvalidReference("RootPOA".to_string()));
        }
        Ok(Box::new(FaultyAdapter::new(self.inner.resolve_root_adapter()?, self.fault)))
    }

    fn resolve_naming_service(&self) -> BrokerResult<Box<dyn NamingDirectory>> {
        if self.fault == Fault::NamingService {
            return Err(BrokerError::InvalidReference("NameService".to_string()));
        }
        Ok(Box::new(FaultyNaming {
            inner: self.inner.resolve_naming_service()?,
            fault: self.fault,
        }))
    }

    fn work_pending(&self) -> bool {
        self.inner.work_pending()
    }

    fn perform_work(&self) -> BrokerResult<()> {
        self.inner.perform_work()
    }

    fn run(&self) -> BrokerResult<()> {
        self.inner.run()
    }

    fn shutdown(&self, wait_for_completion: bool) {
        self.inner.shutdown(wait_for_completion)
    }
}

struct FaultyPolicy {
    inner: Box<dyn ThreadPolicy>,
    fault: Fault,
}

impl ThreadPolicy for FaultyPolicy {
    fn model(&self) -> ThreadModel {
        self.inner.model()
    }

    fn destroy(self: Box<Self>) -> BrokerResult<()> {
        let FaultyPolicy { inner, fault } = *self;
        inner.destroy()?;
        if fault == Fault::DestroyPolicy {
            return Err(injected("policy destroy"));
        }
        Ok(())
    }
}

struct FaultyAdapter {
    inner: Box<dyn ObjectAdapter>,
    fault: Fault,
    interfaces: Mutex<HashMap<ObjectId, &'static str>>,
}

impl FaultyAdapter {
    fn new(inner: Box<dyn ObjectAdapter>, fault: Fault) -> Self {
        Self {
            inner,
            fault,
            interfaces: Mutex::new(HashMap::new()),
        }
    }
}

impl ObjectAdapter for FaultyAdapter {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn create_thread_policy(&self, model: ThreadModel) -> BrokerResult<Box<dyn ThreadPolicy>> {
        if self.fault == Fault::CreatePolicy {
            return Err(injected("policy creation"));
        }
        Ok(Box::new(FaultyPolicy {
            inner: self.inner.create_thread_policy(model)?,
            fault: self.fault,
        }))
    }

    fn create_child(&self, name: &str, policy: &dyn ThreadPolicy) -> BrokerResult<Box<dyn ObjectAdapter>> {
        if self.fault == Fault::CreateChild {
            return Err(BrokerError::AdapterAlreadyExists(name.to_string()));
        }
        Ok(Box::new(FaultyAdapter::new(self.inner.create_child(name, policy)?, self.fault)))
    }

    fn activate_object(&self, servant: Box<dyn Servant>) -> BrokerResult<ObjectId> {
        let interface = servant.interface();
        let id = self.inner.activate_object(servant)?;
        self.interfaces.lock().insert(id, interface);
        Ok(id)
    }

    fn reference(&self, id: ObjectId) -> BrokerResult<ObjectRef> {
        if let Fault::Reference(role) = self.fault {
            if self.interfaces.lock().get(&id) == Some(&role.id()) {
                return Err(injected("reference"));
            }
        }
        self.inner.reference(id)
    }

    fn deactivate_object(&self, id: ObjectId) -> BrokerResult<()> {
        self.interfaces.lock().remove(&id);
        self.inner.deactivate_object(id)
    }

    fn activate_manager(&self) -> BrokerResult<()> {
        if self.fault == Fault::ActivateManager {
            return Err(injected("manager activation"));
        }
        self.inner.activate_manager()
    }

    fn is_active(&self) -> bool {
        self.inner.is_active()
    }
}

struct FaultyNaming {
    inner: Box<dyn NamingDirectory>,
    fault: Fault,
}

impl NamingDirectory for FaultyNaming {
    fn create_or_resolve_context(&self, path: &NamePath) -> BrokerResult<Box<dyn NamingContext>> {
        if self.fault == Fault::NamingContext {
            return Err(injected("naming context"));
        }
        Ok(Box::new(FaultyContext {
            inner: self.inner.create_or_resolve_context(path)?,
            fault: self.fault,
        }))
    }
}

struct FaultyContext {
    inner: Box<dyn NamingContext>,
    fault: Fault,
}

impl NamingContext for FaultyContext {
    fn path(&self) -> &NamePath {
        self.inner.path()
    }

    fn rebind(&self, name: &NamePath, object: &ObjectRef) -> BrokerResult<()> {
        if let Fault::Bind(role) = self.fault {
            if *name == role.name() {
                return Err(injected("bind"));
            }
        }
        self.inner.rebind(name, object)
    }

    fn resolve(&self, name: &NamePath) -> BrokerResult<ObjectRef> {
        self.inner.resolve(name)
    }
}

/// Service hook that activates nothing and fails
pub struct FailingHook;

impl ServiceHook for FailingHook {
    fn create_and_activate(
        &self,
        _context: &Arc<ServerContext>,
        _domain: &dyn ObjectAdapter,
    ) -> BrokerResult<Vec<ActivatedService>> {
        Err(injected("service activation"))
    }
}
