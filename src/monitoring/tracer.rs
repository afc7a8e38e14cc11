/*!
 * Session Tracing
 * Structured tracing for checkpoint/restore sessions using the tracing crate
 */

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, span, warn, Level};
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::core::limits::{ENV_TRACE_JSON, SLOW_SESSION_MS};

/// Target of the startup-time trace lines
pub const STARTUP_TARGET: &str = "crac::startup";

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - CRAC_TRACE_JSON: Enable JSON output (default: false)
///
/// Does nothing if a global subscriber is already installed.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var(ENV_TRACE_JSON)
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()
    };

    if installed.is_ok() {
        info!(json = use_json, "Structured tracing initialized");
    }
}

/// Wall-clock nanoseconds, as printed in startup-time trace lines
pub fn epoch_nanos() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default()
}

/// Emit one startup-time trace line (`STARTUPTIME <nanos> <event>`)
pub fn trace_startup(event: &str) {
    let nanos = epoch_nanos();
    info!(target: STARTUP_TARGET, nanos = %nanos, event, "STARTUPTIME {} {}", nanos, event);
}

/// Span covering one checkpoint/restore session
pub struct SessionSpan {
    span: tracing::Span,
    start: Instant,
    session: u64,
}

impl SessionSpan {
    pub fn new(session: u64) -> Self {
        let span = span!(
            Level::INFO,
            "checkpoint_restore",
            session = session,
            dry_run = tracing::field::Empty,
            claimed = tracing::field::Empty,
            engine_status = tracing::field::Empty,
            result = tracing::field::Empty,
            causes = tracing::field::Empty,
            duration_ms = tracing::field::Empty,
        );

        let entered = span.enter();
        debug!(session, "session started");
        drop(entered);

        Self {
            span,
            start: Instant::now(),
            session,
        }
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    /// Enter the span for the duration of the returned guard
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }

    pub fn record_engine_call(&self, dry_run: bool, claimed: usize) {
        self.span.record("dry_run", dry_run);
        self.span.record("claimed", claimed);
    }

    pub fn record_engine_status(&self, status: &str) {
        self.span.record("engine_status", status);
    }

    /// Record the session outcome and the number of causes raised
    pub fn record_result(&self, result: &str, causes: usize) {
        self.span.record("result", result);
        self.span.record("causes", causes);
    }
}

impl Drop for SessionSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        let _entered = self.span.enter();
        self.span.record("duration_ms", duration.as_millis() as u64);

        if duration > Duration::from_millis(SLOW_SESSION_MS) {
            warn!(
                session = self.session,
                duration_ms = duration.as_millis() as u64,
                slow = true,
                "slow checkpoint/restore session"
            );
        } else {
            debug!(
                session = self.session,
                duration_us = duration.as_micros() as u64,
                "session completed"
            );
        }
    }
}
