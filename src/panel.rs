//! Interpretation panel state for clients that fire a new interpretation
//! whenever the visible result set changes.
//!
//! Each [`InterpretationPanel::begin`] hands out a [`Ticket`] stamped with a
//! fresh generation. An outcome is applied only if its ticket is still the
//! latest one, so a slow response for an old query never overwrites the
//! panel after a newer request has started.

use parking_lot::Mutex;

use crate::llm::interpret::{InterpretError, InterpretationRequest, Interpreter};
use crate::models::InterpretationResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Debug, Clone, PartialEq)]
pub enum PanelState {
    Idle,
    Loading,
    Ready(InterpretationResult),
    Failed(String),
}

/// Latest issued generation plus the state it governs. Both change under
/// the same lock.
struct Slot {
    generation: u64,
    state: PanelState,
}

pub struct InterpretationPanel {
    slot: Mutex<Slot>,
}

impl Default for InterpretationPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl InterpretationPanel {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                generation: 0,
                state: PanelState::Idle,
            }),
        }
    }

    /// Start a new request. Any ticket issued earlier becomes stale.
    pub fn begin(&self) -> Ticket {
        let mut slot = self.slot.lock();
        slot.generation += 1;
        slot.state = PanelState::Loading;
        Ticket(slot.generation)
    }

    /// Drop back to idle (e.g. the query was cleared) and invalidate
    /// outstanding tickets.
    pub fn reset(&self) {
        let mut slot = self.slot.lock();
        slot.generation += 1;
        slot.state = PanelState::Idle;
    }

    /// Apply an outcome. Returns `false` and leaves state untouched when the
    /// ticket has been superseded.
    pub fn finish(
        &self,
        ticket: Ticket,
        outcome: Result<InterpretationResult, InterpretError>,
    ) -> bool {
        let mut slot = self.slot.lock();
        if slot.generation != ticket.0 {
            tracing::debug!("Discarding stale interpretation (ticket {})", ticket.0);
            return false;
        }
        slot.state = match outcome {
            Ok(result) => PanelState::Ready(result),
            Err(e) => PanelState::Failed(failure_message(&e)),
        };
        true
    }

    pub fn state(&self) -> PanelState {
        self.slot.lock().state.clone()
    }

    /// Begin, interpret, finish. Returns whether the outcome was applied.
    pub async fn run(&self, interpreter: &Interpreter, request: &InterpretationRequest) -> bool {
        let ticket = self.begin();
        let outcome = interpreter.interpret(request).await;
        self.finish(ticket, outcome)
    }
}

/// The `error` string a client would read from the HTTP body.
fn failure_message(err: &InterpretError) -> String {
    err.body()
        .get("error")
        .and_then(|v| v.as_str())
        .unwrap_or("Interpretation failed")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::{ChatMessage, ChatModel};
    use crate::models::AssetSummary;
    use async_trait::async_trait;
    use std::sync::Arc;
    use tokio::sync::Notify;

    fn result(summary: &str) -> InterpretationResult {
        InterpretationResult {
            board_title: Some("Sea Salt".into()),
            curatorial_summary: summary.into(),
            why_it_matters: vec![],
            context_pulse: vec![],
        }
    }

    fn board_request(q: &str) -> InterpretationRequest {
        InterpretationRequest::Board {
            query: q.into(),
            assets: vec![AssetSummary {
                title: Some("Coastal Stripe".into()),
                ..Default::default()
            }],
        }
    }

    #[test]
    fn test_initial_state_is_idle() {
        assert_eq!(InterpretationPanel::new().state(), PanelState::Idle);
    }

    #[test]
    fn test_stale_outcome_is_discarded() {
        let panel = InterpretationPanel::new();
        let first = panel.begin();
        let second = panel.begin();

        assert!(panel.finish(second, Ok(result("new"))));
        assert!(!panel.finish(first, Ok(result("old"))));
        assert_eq!(panel.state(), PanelState::Ready(result("new")));
    }

    #[test]
    fn test_stale_outcome_cannot_clear_loading() {
        let panel = InterpretationPanel::new();
        let first = panel.begin();
        let _second = panel.begin();
        assert!(!panel.finish(first, Err(InterpretError::EmptyResponse)));
        assert_eq!(panel.state(), PanelState::Loading);
    }

    #[test]
    fn test_failure_message_uses_error_body() {
        let panel = InterpretationPanel::new();
        let ticket = panel.begin();
        assert!(panel.finish(ticket, Err(InterpretError::Validation("Missing asset"))));
        assert_eq!(panel.state(), PanelState::Failed("Missing asset".into()));
    }

    #[test]
    fn test_reset_invalidates_outstanding_ticket() {
        let panel = InterpretationPanel::new();
        let ticket = panel.begin();
        panel.reset();
        assert!(!panel.finish(ticket, Ok(result("late"))));
        assert_eq!(panel.state(), PanelState::Idle);
    }

    #[test]
    fn test_tickets_are_fresh_across_reset() {
        let panel = InterpretationPanel::new();
        let first = panel.begin();
        panel.reset();
        let second = panel.begin();
        assert_ne!(first, second);
        assert!(panel.finish(second, Ok(result("after reset"))));
        assert_eq!(panel.state(), PanelState::Ready(result("after reset")));
    }

    #[test]
    fn test_concurrent_begins_leave_one_live_ticket() {
        let panel = Arc::new(InterpretationPanel::new());
        let tickets: Vec<Ticket> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8).map(|_| s.spawn(|| panel.begin())).collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        let applied = tickets
            .into_iter()
            .filter(|t| panel.finish(*t, Ok(result("x"))))
            .count();
        assert_eq!(applied, 1);
    }

    /// Replies keyed by query; the "slow" query waits until released.
    struct GatedModel {
        gate: Notify,
    }

    #[async_trait]
    impl ChatModel for GatedModel {
        fn missing_credential(&self) -> Option<&'static str> {
            None
        }

        async fn complete_json(&self, messages: &[ChatMessage]) -> anyhow::Result<Option<String>> {
            let user = &messages[1].content;
            if user.contains("\"slow\"") {
                self.gate.notified().await;
                return Ok(Some(r#"{"curatorial_summary": "slow"}"#.into()));
            }
            Ok(Some(r#"{"curatorial_summary": "fast"}"#.into()))
        }
    }

    #[tokio::test]
    async fn test_run_keeps_latest_when_earlier_finishes_last() {
        let model = Arc::new(GatedModel {
            gate: Notify::new(),
        });
        let interpreter = Interpreter::new(model.clone());
        let panel = Arc::new(InterpretationPanel::new());

        let slow = {
            let panel = panel.clone();
            let interpreter = interpreter.clone();
            tokio::spawn(async move { panel.run(&interpreter, &board_request("slow")).await })
        };
        // Let the slow request register its ticket before the fast one starts
        while panel.state() != PanelState::Loading {
            tokio::task::yield_now().await;
        }
        tokio::task::yield_now().await;

        assert!(panel.run(&interpreter, &board_request("fast")).await);
        model.gate.notify_one();
        assert!(!slow.await.unwrap());

        match panel.state() {
            PanelState::Ready(r) => assert_eq!(r.curatorial_summary, "fast"),
            other => panic!("unexpected state: {other:?}"),
        }
    }
}
