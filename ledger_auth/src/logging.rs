//! Security event logging.
//!
//! Events go through the `log` facade under the `security` target so that
//! binaries can route them separately. Only event kinds, user IDs and short
//! reasons are logged; secrets, tokens and passwords never are.

use crate::auth::UserId;

/// Log target for security events
pub const SECURITY_TARGET: &str = "security";

/// Log security event with structured data
///
/// # Arguments
///
/// * `event_type` - Type of security event
/// * `user_id` - Optional user ID
/// * `message` - Event message
///
/// # Example
///
/// ```
/// use ledger_auth::logging::log_security_event;
///
/// log_security_event("login_failed", Some(123), "wrong password");
/// ```
pub fn log_security_event(event_type: &str, user_id: Option<UserId>, message: &str) {
    match user_id {
        Some(id) => log::warn!(
            target: SECURITY_TARGET,
            "SECURITY: {event_type} user_id={id}: {message}"
        ),
        None => log::warn!(target: SECURITY_TARGET, "SECURITY: {event_type}: {message}"),
    }
}
