//! Component update service.
//!
//! Keeps the ordered registry of installed components and checks them one at
//! a time, each through its own sequential checker. Unlike a single batched
//! check, a failure for one component does not stop the others. The finish
//! callback fires once, after the last component.

mod error;
mod status;
mod throttle;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::runtime::Handle;

use crate::configurator::Configurator;
use crate::persisted_data::PersistedData;
use crate::update_checker::{
    check, sequential_factory, CheckRequest, CheckResult, CheckerFactory, ComponentDescriptor,
    ComponentMap, ErrorCategory, ProtocolError,
};

pub use error::ServiceError;
pub use status::ComponentStatus;

use throttle::RetryAfterGate;

/// Fired once when a full update pass is over.
pub type OnFinished = Box<dyn FnOnce() + Send + 'static>;

/// Fired once with the outcome of an on-demand check.
pub type OnDemandCallback = Box<dyn FnOnce(ComponentStatus) + Send + 'static>;

struct ServiceInner {
    config: Arc<Configurator>,
    metadata: Arc<PersistedData>,
    checker_factory: CheckerFactory,
    components: RwLock<Vec<ComponentDescriptor>>,
    statuses: RwLock<HashMap<String, ComponentStatus>>,
    gate: RetryAfterGate,
    next_session: AtomicU64,
    /// Serializes update passes so two passes never interleave their requests.
    run_lock: tokio::sync::Mutex<()>,
}

/// Cheap to clone; clones share the same registry and state.
#[derive(Clone)]
pub struct UpdateService {
    inner: Arc<ServiceInner>,
}

impl UpdateService {
    /// `inner` creates the underlying batch checker; every component is checked
    /// through a sequential checker wrapped around it.
    pub fn new(
        config: Arc<Configurator>,
        metadata: Arc<PersistedData>,
        inner: CheckerFactory,
    ) -> Self {
        Self {
            inner: Arc::new(ServiceInner {
                config,
                metadata,
                checker_factory: sequential_factory(inner),
                components: RwLock::new(Vec::new()),
                statuses: RwLock::new(HashMap::new()),
                gate: RetryAfterGate::default(),
                next_session: AtomicU64::new(1),
                run_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }

    pub fn register_component(&self, descriptor: ComponentDescriptor) -> Result<(), ServiceError> {
        if descriptor.id.trim().is_empty() {
            return Err(ServiceError::InvalidComponent);
        }
        let mut components = self.inner.components.write().unwrap_or_else(|e| e.into_inner());
        if components.iter().any(|c| c.id == descriptor.id) {
            return Err(ServiceError::AlreadyRegistered(descriptor.id));
        }
        tracing::debug!(id = %descriptor.id, version = %descriptor.version, "component registered");
        self.inner.set_status(&descriptor.id, ComponentStatus::New);
        components.push(descriptor);
        Ok(())
    }

    /// Returns false if `id` was not registered.
    pub fn unregister_component(&self, id: &str) -> bool {
        let mut components = self.inner.components.write().unwrap_or_else(|e| e.into_inner());
        let before = components.len();
        components.retain(|c| c.id != id);
        let removed = components.len() != before;
        if removed {
            self.inner
                .statuses
                .write()
                .unwrap_or_else(|e| e.into_inner())
                .remove(id);
            tracing::debug!(id, "component unregistered");
        }
        removed
    }

    /// Registered components, in registration order.
    pub fn components(&self) -> Vec<ComponentDescriptor> {
        self.inner
            .components
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn status(&self, id: &str) -> Option<ComponentStatus> {
        self.inner
            .statuses
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
    }

    /// Time left before the server's retry-after hint expires.
    pub fn throttled_for(&self) -> Option<Duration> {
        self.inner.gate.remaining()
    }

    /// Check every registered component, one after another.
    ///
    /// Returns immediately; `on_finished` fires once after the last component
    /// (or right away, asynchronously, if nothing is registered).
    pub fn check_for_updates(&self, on_finished: OnFinished) -> Result<(), ServiceError> {
        let runtime = Handle::try_current().map_err(|_| ServiceError::NoRuntime)?;
        let (order, components) = self.inner.snapshot();

        if order.is_empty() {
            tracing::debug!("no components registered; nothing to check");
            runtime.spawn(async move { on_finished() });
            return Ok(());
        }

        tracing::info!(count = order.len(), "checking components for updates");
        let inner = Arc::clone(&self.inner);
        runtime.spawn(async move {
            let _pass = inner.run_lock.lock().await;
            for id in &order {
                inner.update_component(id, &components).await;
            }
            tracing::debug!("update pass finished");
            on_finished();
        });
        Ok(())
    }

    /// Check a single registered component now.
    pub fn on_demand_update(&self, id: &str, callback: OnDemandCallback) -> Result<(), ServiceError> {
        let runtime = Handle::try_current().map_err(|_| ServiceError::NoRuntime)?;
        let (order, components) = self.inner.snapshot();
        if !order.iter().any(|c| c == id) {
            return Err(ServiceError::UnknownComponent(id.to_string()));
        }

        let inner = Arc::clone(&self.inner);
        let id = id.to_string();
        runtime.spawn(async move {
            let _pass = inner.run_lock.lock().await;
            let status = inner.update_component(&id, &components).await;
            callback(status);
        });
        Ok(())
    }
}

impl ServiceInner {
    fn set_status(&self, id: &str, status: ComponentStatus) {
        self.statuses
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id.to_string(), status);
    }

    /// Registration order plus a shared descriptor map, frozen for one pass.
    fn snapshot(&self) -> (Vec<String>, Arc<ComponentMap>) {
        let components = self.components.read().unwrap_or_else(|e| e.into_inner());
        let order = components.iter().map(|c| c.id.clone()).collect();
        let map = components
            .iter()
            .map(|c| (c.id.clone(), c.clone()))
            .collect::<ComponentMap>();
        (order, Arc::new(map))
    }

    fn new_session_id(&self) -> String {
        let n = self.next_session.fetch_add(1, Ordering::Relaxed);
        format!("{{sequpd-{}-{}}}", std::process::id(), n)
    }

    async fn update_component(&self, id: &str, components: &Arc<ComponentMap>) -> ComponentStatus {
        if let Some(left) = self.gate.remaining() {
            tracing::debug!(id, retry_in_secs = left.as_secs(), "update check throttled");
            self.set_status(id, ComponentStatus::Throttled);
            return ComponentStatus::Throttled;
        }

        self.set_status(id, ComponentStatus::Checking);
        let request = CheckRequest {
            session_id: self.new_session_id(),
            ids: vec![id.to_string()],
            components: Arc::clone(components),
            additional_attributes: self.config.extra_attributes().clone(),
            enabled_component_updates: self.config.enabled_component_updates(),
        };

        let mut checker = (self.checker_factory)(Arc::clone(&self.config), Arc::clone(&self.metadata));
        let result = match check(checker.as_mut(), request).await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(id, "update check could not run: {}", e);
                CheckResult::failure(
                    ErrorCategory::UpdateCheck,
                    ProtocolError::Internal.code(),
                    Duration::ZERO,
                )
            }
        };

        self.gate.note(result.retry_after);
        self.metadata.record_outcome(id, &result);
        let status = ComponentStatus::from_result(id, &result);
        tracing::debug!(id, status = %status.label(), "component check complete");
        self.set_status(id, status.clone());
        status
    }
}
