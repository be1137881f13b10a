//! Scripted update checker for integration tests.
//!
//! Answers each id from a fixed script after a short delay and records every
//! request it sees, so tests can assert ordering, overlap, and instance churn.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sequpd_core::configurator::Configurator;
use sequpd_core::persisted_data::PersistedData;
use sequpd_core::update_checker::{
    CheckRequest, CheckResult, CheckerError, CheckerFactory, ComponentDescriptor, ComponentMap,
    ErrorCategory, ProtocolResults, UpdateCheckCallback, UpdateChecker, UpdateResult,
    UpdateStatus,
};

/// How the scripted checker answers for one id.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Success with one result per payload name.
    Ok(Vec<String>),
    /// Success advertising an update to `version`.
    Update(String),
    Fail {
        category: ErrorCategory,
        error: i32,
        retry_after: Duration,
    },
    /// Success carrying a retry-after hint.
    OkRetryAfter(Duration),
    /// Never fire the callback (drop it).
    Drop,
}

impl Reply {
    pub fn ok(payload: &[&str]) -> Self {
        Reply::Ok(payload.iter().map(|s| s.to_string()).collect())
    }

    pub fn fail(error: i32) -> Self {
        Reply::Fail {
            category: ErrorCategory::UpdateCheck,
            error,
            retry_after: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Start(Vec<String>),
    End(Vec<String>),
}

#[derive(Default)]
pub struct Recorder {
    events: Mutex<Vec<Event>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    instances: AtomicUsize,
}

impl Recorder {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// Ids of every request issued, in issue order.
    pub fn requests(&self) -> Vec<Vec<String>> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Start(ids) => Some(ids),
                Event::End(_) => None,
            })
            .collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn instances(&self) -> usize {
        self.instances.load(Ordering::SeqCst)
    }

    fn push(&self, e: Event) {
        self.events.lock().unwrap().push(e);
    }
}

pub struct Script {
    replies: HashMap<String, Reply>,
    delay: Duration,
}

impl Script {
    pub fn new(replies: &[(&str, Reply)]) -> Arc<Self> {
        Arc::new(Self {
            replies: replies
                .iter()
                .map(|(id, r)| (id.to_string(), r.clone()))
                .collect(),
            delay: Duration::from_millis(5),
        })
    }

    /// Combined answer for a batch: first failure wins, otherwise payloads concatenated.
    fn answer(&self, ids: &[String]) -> Option<CheckResult> {
        let mut list = Vec::new();
        let mut retry_after = Duration::ZERO;
        for id in ids {
            match self.replies.get(id).cloned().unwrap_or_else(|| Reply::ok(&[])) {
                Reply::Ok(names) => list.extend(names.into_iter().map(|n| UpdateResult {
                    app_id: n,
                    status: UpdateStatus::NoUpdate,
                    next_version: None,
                    codebase: None,
                })),
                Reply::Update(version) => list.push(UpdateResult {
                    app_id: id.clone(),
                    status: UpdateStatus::UpdateAvailable,
                    next_version: Some(version),
                    codebase: None,
                }),
                Reply::OkRetryAfter(d) => {
                    retry_after = d;
                    list.push(UpdateResult {
                        app_id: id.clone(),
                        status: UpdateStatus::NoUpdate,
                        next_version: None,
                        codebase: None,
                    });
                }
                Reply::Fail {
                    category,
                    error,
                    retry_after,
                } => return Some(CheckResult::failure(category, error, retry_after)),
                Reply::Drop => return None,
            }
        }
        Some(CheckResult::success(ProtocolResults { list }, retry_after))
    }
}

pub struct ScriptedChecker {
    script: Arc<Script>,
    recorder: Arc<Recorder>,
    used: bool,
}

impl ScriptedChecker {
    pub fn new(script: Arc<Script>, recorder: Arc<Recorder>) -> Self {
        recorder.instances.fetch_add(1, Ordering::SeqCst);
        Self {
            script,
            recorder,
            used: false,
        }
    }
}

impl UpdateChecker for ScriptedChecker {
    fn check_for_updates(
        &mut self,
        request: CheckRequest,
        callback: UpdateCheckCallback,
    ) -> Result<(), CheckerError> {
        assert!(!self.used, "scripted checker instance reused across steps");
        self.used = true;

        let ids = request.ids.clone();
        self.recorder.push(Event::Start(ids.clone()));
        let now = self.recorder.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.recorder.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let script = Arc::clone(&self.script);
        let recorder = Arc::clone(&self.recorder);
        tokio::spawn(async move {
            tokio::time::sleep(script.delay).await;
            let answer = script.answer(&ids);
            recorder.in_flight.fetch_sub(1, Ordering::SeqCst);
            recorder.push(Event::End(ids));
            if let Some(result) = answer {
                callback(result);
            }
        });
        Ok(())
    }
}

pub fn factory(script: Arc<Script>, recorder: Arc<Recorder>) -> CheckerFactory {
    Arc::new(
        move |_: Arc<Configurator>, _: Arc<PersistedData>| -> Box<dyn UpdateChecker> {
            Box::new(ScriptedChecker::new(
                Arc::clone(&script),
                Arc::clone(&recorder),
            ))
        },
    )
}

pub fn configurator() -> Arc<Configurator> {
    Arc::new(Configurator::new(
        url::Url::parse("https://updates.example.org/").unwrap(),
    ))
}

pub fn descriptor(id: &str) -> ComponentDescriptor {
    ComponentDescriptor {
        id: id.to_string(),
        name: id.to_string(),
        version: "1.0.0".to_string(),
        fingerprint: None,
    }
}

pub fn request(ids: &[&str]) -> CheckRequest {
    let components: ComponentMap = ids.iter().map(|id| (id.to_string(), descriptor(id))).collect();
    CheckRequest {
        session_id: "{test-session}".to_string(),
        ids: ids.iter().map(|s| s.to_string()).collect(),
        components: Arc::new(components),
        additional_attributes: BTreeMap::new(),
        enabled_component_updates: true,
    }
}

pub fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}
