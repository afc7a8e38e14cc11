/*!
 * Thread Interrupt Status
 * Per-thread interrupted flag re-asserted when an interruption is absorbed
 * into an aggregate
 */

use std::cell::Cell;

thread_local! {
    static INTERRUPTED: Cell<bool> = const { Cell::new(false) };
}

/// Mark the calling thread as interrupted
pub fn interrupt() {
    INTERRUPTED.with(|flag| flag.set(true));
}

/// Whether the calling thread is marked as interrupted
pub fn is_interrupted() -> bool {
    INTERRUPTED.with(|flag| flag.get())
}

/// Read and clear the calling thread's interrupt status
pub fn take_interrupted() -> bool {
    INTERRUPTED.with(|flag| flag.replace(false))
}
