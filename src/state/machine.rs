use super::error::{StateError, StateResult};
use super::{SessionEvent, SessionState, StateTransition};

#[derive(Debug)]
pub struct StateMachine {
    state: SessionState,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            state: SessionState::default(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn can_transition(&self, event: SessionEvent) -> bool {
        self.next_state(event).is_some()
    }

    pub fn next_state(&self, event: SessionEvent) -> Option<SessionState> {
        use SessionEvent::*;
        use SessionState::*;
        match (self.state, event) {
            (Idle, BeginPicking) => Some(Picking),
            (Picking, SelectionAborted) => Some(Restoring),
            (Idle | Picking, BeginCapture) => Some(Hiding),
            (Hiding, UiHidden) => Some(AwaitingCompositorSettle),
            (AwaitingCompositorSettle, SettleElapsed) => Some(Capturing),
            (Capturing, CaptureSucceeded) => Some(PostProcessing),
            (Capturing, CaptureFailed) => Some(Restoring),
            (PostProcessing, PostActionsFinished) => Some(Restoring),
            (Restoring, UiRestored) => Some(Idle),
            _ => None,
        }
    }

    pub fn transition(&mut self, event: SessionEvent) -> StateResult<StateTransition> {
        tracing::debug!(from = ?self.state, event = ?event, "request state transition");
        let next = self.next_state(event).ok_or_else(|| {
            let from = self.state;
            tracing::warn!(from = ?from, event = ?event, "invalid state transition requested");
            StateError::InvalidStateTransition { from, event }
        })?;

        let applied = StateTransition::new(self.state, event, next);
        self.state = next;
        Ok(applied)
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for StateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionState::{:?}", self.state)
    }
}
