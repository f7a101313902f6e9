//! Reflection diagnostics: a process-wide, swappable sink with a `log`
//! fallback.
//!
//! Library consumers that just want ordinary logging need to do nothing;
//! diagnostics route to the `log` facade by default. Tools that capture or
//! redirect reflection output install a [`DiagnosticSink`].

use core::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Severity of a reflection diagnostic.
///
/// Errors accompany a failed call; warnings mark individual elements that
/// were skipped or only partially resolved; info carries per-call summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Successful-call summaries.
    Info,
    /// An element was skipped or degraded; the call still succeeds.
    Warning,
    /// The call failed; the message mirrors the returned error.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

/// Receives reflection diagnostics in place of the `log` facade.
pub trait DiagnosticSink: Send + Sync {
    /// Called once per diagnostic, in emission order within a call.
    fn emit(&self, severity: Severity, message: &str);
}

static SINK: RwLock<Option<Arc<dyn DiagnosticSink>>> = RwLock::new(None);

/// Installs `sink` as the process-wide diagnostic sink, replacing any
/// previous one.
pub fn set_diagnostic_sink(sink: Arc<dyn DiagnosticSink>) {
    *SINK.write().unwrap_or_else(PoisonError::into_inner) = Some(sink);
}

/// Removes the installed sink; diagnostics fall back to the `log` facade.
pub fn clear_diagnostic_sink() {
    *SINK.write().unwrap_or_else(PoisonError::into_inner) = None;
}

pub(crate) fn emit(severity: Severity, args: fmt::Arguments<'_>) {
    let guard = SINK.read().unwrap_or_else(PoisonError::into_inner);
    match guard.as_deref() {
        Some(sink) => {
            let message = args.to_string();
            sink.emit(severity, &message);
        }
        None => match severity {
            Severity::Info => log::info!("{args}"),
            Severity::Warning => log::warn!("{args}"),
            Severity::Error => log::error!("{args}"),
        },
    }
}

macro_rules! diag_info {
    ($($arg:tt)*) => {
        $crate::diag::emit($crate::diag::Severity::Info, format_args!($($arg)*))
    };
}

macro_rules! diag_warn {
    ($($arg:tt)*) => {
        $crate::diag::emit($crate::diag::Severity::Warning, format_args!($($arg)*))
    };
}

macro_rules! diag_error {
    ($($arg:tt)*) => {
        $crate::diag::emit($crate::diag::Severity::Error, format_args!($($arg)*))
    };
}

pub(crate) use {diag_error, diag_info, diag_warn};
