//! Status-tagged logging macros.
//!
//! Every macro forwards to `tracing` with a `status` field so the terminal
//! formatter can pick the matching prefix. Library code that just wants
//! diagnostics should call `tracing` directly.

#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::tracing::info!(status = "info", $($arg)*)
    };
}

#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => {
        $crate::tracing::info!(status = "success", $($arg)*)
    };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::tracing::warn!(status = "warn", $($arg)*)
    };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::tracing::error!(status = "error", $($arg)*)
    };
}
