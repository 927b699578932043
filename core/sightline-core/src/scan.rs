//! Scan state machine.
//!
//! ```text
//! Stopped ──start──▶ Running ──pause──▶ Paused
//!    ▲                 │  ▲               │
//!    └──────stop───────┘  └────resume─────┘
//!    ▲                                    │
//!    └────────────────stop────────────────┘
//! ```
//!
//! Any other request is a no-op. Only `Running` lets snapshots through. The
//! side effects of a transition (clearing tables, flushing) belong to the
//! tracker; this type only answers whether the transition happened.

use crate::types::ScanState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanCommand {
    Start,
    Pause,
    Resume,
    Stop,
}

#[derive(Debug, Default)]
pub struct ScanController {
    state: ScanState,
}

impl ScanController {
    pub fn new() -> Self {
        ScanController::default()
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn accepts_snapshots(&self) -> bool {
        self.state == ScanState::Running
    }

    /// Applies a command and returns the new state if it changed.
    ///
    /// `Start` always lands in `Running`, including a restart from `Running`
    /// or `Paused`, so it reports a transition even when the state matches.
    pub fn apply(&mut self, command: ScanCommand) -> Option<ScanState> {
        let next = match (command, self.state) {
            (ScanCommand::Start, _) => ScanState::Running,
            (ScanCommand::Pause, ScanState::Running) => ScanState::Paused,
            (ScanCommand::Resume, ScanState::Paused) => ScanState::Running,
            (ScanCommand::Stop, ScanState::Running | ScanState::Paused) => ScanState::Stopped,
            _ => return None,
        };
        self.state = next;
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_stopped() {
        let scan = ScanController::new();
        assert_eq!(scan.state(), ScanState::Stopped);
        assert!(!scan.accepts_snapshots());
    }

    #[test]
    fn test_full_cycle() {
        let mut scan = ScanController::new();
        assert_eq!(scan.apply(ScanCommand::Start), Some(ScanState::Running));
        assert_eq!(scan.apply(ScanCommand::Pause), Some(ScanState::Paused));
        assert!(!scan.accepts_snapshots());
        assert_eq!(scan.apply(ScanCommand::Resume), Some(ScanState::Running));
        assert_eq!(scan.apply(ScanCommand::Stop), Some(ScanState::Stopped));
    }

    #[test]
    fn test_invalid_transitions_are_noops() {
        let mut scan = ScanController::new();
        assert_eq!(scan.apply(ScanCommand::Pause), None);
        assert_eq!(scan.apply(ScanCommand::Resume), None);
        assert_eq!(scan.apply(ScanCommand::Stop), None);
        assert_eq!(scan.state(), ScanState::Stopped);

        scan.apply(ScanCommand::Start);
        assert_eq!(scan.apply(ScanCommand::Resume), None);
        assert_eq!(scan.state(), ScanState::Running);
    }

    #[test]
    fn test_start_from_paused_restarts() {
        let mut scan = ScanController::new();
        scan.apply(ScanCommand::Start);
        scan.apply(ScanCommand::Pause);
        assert_eq!(scan.apply(ScanCommand::Start), Some(ScanState::Running));
    }
}
