//! Bookkeeping for one in-flight sequential check: cursor and accumulator.

use super::types::{CheckRequest, CheckResult, ErrorCategory, ProtocolResults};

/// What the driver should do after a step completes.
#[derive(Debug)]
pub(super) enum StepOutcome {
    /// Issue the next step (cursor already advanced).
    Continue,
    /// Session finished; deliver this result.
    Done(CheckResult),
}

/// State owned by exactly one `check_for_updates` call.
///
/// The cursor only moves forward. The accumulator holds results for ids
/// strictly before the cursor.
#[derive(Debug)]
pub(super) struct Session {
    request: CheckRequest,
    cursor: usize,
    accumulated: ProtocolResults,
}

impl Session {
    pub(super) fn new(request: CheckRequest) -> Self {
        debug_assert!(!request.ids.is_empty());
        Self {
            request,
            cursor: 0,
            accumulated: ProtocolResults::default(),
        }
    }

    pub(super) fn session_id(&self) -> &str {
        &self.request.session_id
    }

    pub(super) fn cursor(&self) -> usize {
        self.cursor
    }

    pub(super) fn len(&self) -> usize {
        self.request.ids.len()
    }

    pub(super) fn current_id(&self) -> &str {
        &self.request.ids[self.cursor]
    }

    /// Singleton request for the id under the cursor.
    pub(super) fn step_request(&self) -> CheckRequest {
        self.request.for_single(self.current_id())
    }

    /// Fold in the result of the step under the cursor.
    ///
    /// A failure ends the session and is passed through unchanged; anything
    /// accumulated so far is discarded.
    pub(super) fn record(&mut self, result: CheckResult) -> StepOutcome {
        if result.error != 0 {
            return StepOutcome::Done(result);
        }

        if let Some(results) = result.results {
            self.accumulated.list.extend(results.list);
        }

        if self.cursor + 1 == self.len() {
            let aggregated = std::mem::take(&mut self.accumulated);
            return StepOutcome::Done(CheckResult {
                results: Some(aggregated),
                error_category: ErrorCategory::None,
                error: 0,
                retry_after: result.retry_after,
            });
        }

        self.cursor += 1;
        StepOutcome::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::update_checker::types::{ComponentMap, UpdateResult, UpdateStatus};
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use std::time::Duration;

    fn request(ids: &[&str]) -> CheckRequest {
        CheckRequest {
            session_id: "s".to_string(),
            ids: ids.iter().map(|s| s.to_string()).collect(),
            components: Arc::new(ComponentMap::new()),
            additional_attributes: BTreeMap::new(),
            enabled_component_updates: true,
        }
    }

    fn ok(app: &str, retry_secs: u64) -> CheckResult {
        CheckResult::success(
            ProtocolResults {
                list: vec![UpdateResult {
                    app_id: app.to_string(),
                    status: UpdateStatus::NoUpdate,
                    next_version: None,
                    codebase: None,
                }],
            },
            Duration::from_secs(retry_secs),
        )
    }

    #[test]
    fn cursor_advances_and_last_step_aggregates() {
        let mut s = Session::new(request(&["a", "b", "c"]));
        assert_eq!(s.current_id(), "a");
        assert_eq!(s.step_request().ids, vec!["a".to_string()]);

        assert!(matches!(s.record(ok("a", 1)), StepOutcome::Continue));
        assert_eq!(s.cursor(), 1);
        assert_eq!(s.current_id(), "b");
        assert!(matches!(s.record(ok("b", 2)), StepOutcome::Continue));

        match s.record(ok("c", 9)) {
            StepOutcome::Done(r) => {
                assert_eq!(r.error, 0);
                assert_eq!(r.error_category, ErrorCategory::None);
                assert_eq!(r.retry_after, Duration::from_secs(9));
                let ids: Vec<_> = r.results.unwrap().list.into_iter().map(|u| u.app_id).collect();
                assert_eq!(ids, vec!["a", "b", "c"]);
            }
            StepOutcome::Continue => panic!("expected Done after last id"),
        }
    }

    #[test]
    fn failure_is_passed_through_and_drops_accumulated() {
        let mut s = Session::new(request(&["a", "b", "c"]));
        assert!(matches!(s.record(ok("a", 0)), StepOutcome::Continue));
        let failure = CheckResult::failure(ErrorCategory::UpdateCheck, 7, Duration::from_secs(30));
        match s.record(failure.clone()) {
            StepOutcome::Done(r) => assert_eq!(r, failure),
            StepOutcome::Continue => panic!("failure must end the session"),
        }
    }

    #[test]
    fn success_without_payload_counts_as_empty() {
        let mut s = Session::new(request(&["a"]));
        let bare = CheckResult {
            results: None,
            ..CheckResult::default()
        };
        match s.record(bare) {
            StepOutcome::Done(r) => assert_eq!(r.results, Some(ProtocolResults::default())),
            StepOutcome::Continue => panic!("single id should finish"),
        }
    }
}
