//! Diagnostics hooks.
//!
//! The core reports noteworthy events (frame watchdog trips, CPU faults,
//! ROM loads) through a process-wide callback instead of linking a logger.
//! A frontend installs a plain function once; until then every report is
//! dropped after a single atomic load, and the message is only formatted
//! when a sink is actually there to receive it.

use std::fmt;
use std::sync::OnceLock;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Debug,
    Warn,
}

/// Callback receiving one formatted diagnostic line.
pub type Sink = fn(level: Level, target: &'static str, message: &str);

static SINK: OnceLock<Sink> = OnceLock::new();

/// Install the process-wide sink. Returns false if one was already
/// installed; the first installation wins for the life of the process.
pub fn install_sink(sink: Sink) -> bool {
    SINK.set(sink).is_ok()
}

pub(crate) fn emit(level: Level, target: &'static str, args: fmt::Arguments) {
    let Some(sink) = SINK.get() else {
        return;
    };
    // Literal messages reach the sink without an allocation.
    match args.as_str() {
        Some(message) => sink(level, target, message),
        None => sink(level, target, &args.to_string()),
    }
}
