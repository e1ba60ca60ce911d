//! Generic error handling utilities
//!
//! Separates errors the caller can fix (bad arguments, invalid parameter
//! shapes) from backend and system failures, so front ends can report the
//! former verbatim and keep the latter's details at debug level.

/// Trait for errors that can distinguish between user-actionable and system errors
///
/// When `is_user_actionable()` returns `true`, `user_message()` must return
/// `Some(message)`; otherwise it must return `None`.
pub trait ContextualError: std::error::Error {
    /// Returns true if this error carries a message the user can act on
    ///
    /// Validation failures (too many extra fields, conflicting retry timing)
    /// are user-actionable. Backend failures and decode mismatches are not.
    fn is_user_actionable(&self) -> bool;

    /// Returns the specific user message if this is a user-actionable error
    fn user_message(&self) -> Option<&str>;
}

/// Log errors with appropriate detail level based on error specificity
///
/// User-actionable errors log their own message; system errors log the
/// operation context. Full details always go to debug level.
///
/// # Examples
/// ```rust
/// # use pgq_client::core::error_handling::log_error_with_context;
/// # use pgq_client::core::validation::ValidationError;
/// let err = ValidationError::new("queue name is required when consumer name is given");
/// log_error_with_context(&err, "Listing consumers");
/// // Logs: "FATAL: queue name is required when consumer name is given"
/// ```
pub fn log_error_with_context<E: ContextualError + std::fmt::Display + std::fmt::Debug>(
    error: &E,
    operation_context: &str,
) {
    match error.user_message() {
        Some(user_msg) if error.is_user_actionable() => log::error!("FATAL: {}", user_msg),
        _ => log::error!("FATAL: {} failed: {}", operation_context, error),
    }
    log::debug!("DETAIL: {}", error);
    log::debug!("DEBUG_DETAILS: {:?}", error);
}
