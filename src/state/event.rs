use super::model::SessionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    BeginPicking,
    SelectionAborted,
    BeginCapture,
    UiHidden,
    SettleElapsed,
    CaptureSucceeded,
    CaptureFailed,
    PostActionsFinished,
    UiRestored,
}

/// One applied edge of the session table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransition {
    pub from: SessionState,
    pub event: SessionEvent,
    pub to: SessionState,
}

impl StateTransition {
    pub const fn new(from: SessionState, event: SessionEvent, to: SessionState) -> Self {
        Self { from, event, to }
    }
}
