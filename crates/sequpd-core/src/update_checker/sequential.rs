//! Batch-to-single decorator: one underlying check per component id, in order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;

use crate::configurator::Configurator;
use crate::persisted_data::PersistedData;

use super::guard::SessionGuard;
use super::session::{Session, StepOutcome};
use super::types::{CheckRequest, CheckResult, ErrorCategory, ProtocolError};
use super::{check, CheckerError, CheckerFactory, UpdateCheckCallback, UpdateChecker};

/// Issues one check per id through a fresh inner checker, never two at once.
///
/// Results are concatenated in id order and delivered once all ids succeed.
/// The first failure is delivered as-is and the remaining ids are skipped.
pub struct SequentialUpdateChecker {
    config: Arc<Configurator>,
    metadata: Arc<PersistedData>,
    inner: CheckerFactory,
    active: Arc<AtomicBool>,
}

impl SequentialUpdateChecker {
    pub fn new(
        config: Arc<Configurator>,
        metadata: Arc<PersistedData>,
        inner: CheckerFactory,
    ) -> Self {
        tracing::trace!("SequentialUpdateChecker created");
        Self {
            config,
            metadata,
            inner,
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    /// True while a session is running (between a successful call and its callback).
    pub fn is_checking(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

impl UpdateChecker for SequentialUpdateChecker {
    fn check_for_updates(
        &mut self,
        request: CheckRequest,
        callback: UpdateCheckCallback,
    ) -> Result<(), CheckerError> {
        if request.ids.is_empty() {
            return Err(CheckerError::EmptyIdentifiers);
        }
        let runtime = Handle::try_current().map_err(|_| CheckerError::NoRuntime)?;
        let guard =
            SessionGuard::try_acquire(&self.active).ok_or(CheckerError::SessionInProgress)?;

        tracing::debug!(
            session_id = %request.session_id,
            ids = ?request.ids,
            "sequential update check started"
        );

        let session = Session::new(request);
        let inner = Arc::clone(&self.inner);
        let config = Arc::clone(&self.config);
        let metadata = Arc::clone(&self.metadata);

        runtime.spawn(async move {
            let result = run_session(session, inner, config, metadata).await;
            // Idle again before the caller hears back, so the callback may start a new session.
            drop(guard);
            callback(result);
        });
        Ok(())
    }
}

async fn run_session(
    mut session: Session,
    inner: CheckerFactory,
    config: Arc<Configurator>,
    metadata: Arc<PersistedData>,
) -> CheckResult {
    loop {
        let step = run_step(&session, &inner, &config, &metadata).await;
        let failed = !step.is_success();
        match session.record(step) {
            StepOutcome::Continue => {}
            StepOutcome::Done(result) => {
                if failed {
                    tracing::debug!(
                        session_id = %session.session_id(),
                        id = %session.current_id(),
                        error = result.error,
                        category = ?result.error_category,
                        "sequential update check stopped on failure"
                    );
                } else {
                    tracing::debug!(
                        session_id = %session.session_id(),
                        steps = session.len(),
                        "sequential update check finished"
                    );
                }
                return result;
            }
        }
    }
}

/// Run the step under the cursor on a single-use inner checker.
async fn run_step(
    session: &Session,
    inner: &CheckerFactory,
    config: &Arc<Configurator>,
    metadata: &Arc<PersistedData>,
) -> CheckResult {
    tracing::trace!(
        session_id = %session.session_id(),
        id = %session.current_id(),
        cursor = session.cursor(),
        "checking next component"
    );

    let mut checker = inner(Arc::clone(config), Arc::clone(metadata));
    let result = check(checker.as_mut(), session.step_request()).await;
    drop(checker);

    match result {
        Ok(r) => {
            tracing::trace!(id = %session.current_id(), error = r.error, "step result available");
            r
        }
        Err(e) => {
            tracing::warn!(id = %session.current_id(), "update check step produced no result: {}", e);
            CheckResult::failure(
                ErrorCategory::UpdateCheck,
                ProtocolError::Internal.code(),
                Duration::ZERO,
            )
        }
    }
}

/// Factory whose checkers run `inner` once per component id.
pub fn sequential_factory(inner: CheckerFactory) -> CheckerFactory {
    Arc::new(
        move |config: Arc<Configurator>, metadata: Arc<PersistedData>| -> Box<dyn UpdateChecker> {
            Box::new(SequentialUpdateChecker::new(
                config,
                metadata,
                Arc::clone(&inner),
            ))
        },
    )
}
