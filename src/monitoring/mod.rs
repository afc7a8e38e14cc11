/*!
 * Monitoring
 * Tracing setup and session spans
 */

pub mod tracer;

pub use tracer::{epoch_nanos, init_tracing, trace_startup, SessionSpan, STARTUP_TARGET};
