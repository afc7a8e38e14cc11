/*!
 * Session State
 */

use crate::monitoring::trace_startup;
use std::cell::Cell;

/// Whether a checkpoint/restore session is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    InProgress,
}

/// Marks a session in progress until dropped
///
/// Dropping resets the state on every exit path, early returns included.
pub(crate) struct SessionGuard<'a> {
    state: &'a Cell<SessionState>,
    trace_startup_time: bool,
}

impl<'a> SessionGuard<'a> {
    pub fn enter(state: &'a Cell<SessionState>, trace_startup_time: bool) -> Self {
        debug_assert_eq!(state.get(), SessionState::Idle);
        state.set(SessionState::InProgress);
        Self {
            state,
            trace_startup_time,
        }
    }
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        if self.trace_startup_time {
            trace_startup("restore-finish");
        }
        self.state.set(SessionState::Idle);
    }
}
