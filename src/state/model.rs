/// Lifecycle of one capture session, from the palette's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    /// An interactive region or window selection is open.
    Picking,
    Hiding,
    AwaitingCompositorSettle,
    Capturing,
    PostProcessing,
    Restoring,
}

impl SessionState {
    pub const fn is_idle(self) -> bool {
        matches!(self, Self::Idle)
    }
}
