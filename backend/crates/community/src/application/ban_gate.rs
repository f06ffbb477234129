//! Ban Gate
//!
//! Page requests from a client carrying the cached ban signal are sent to
//! the banned surface. The signal is a cookie, so the gate never touches
//! the store; the authoritative check happens when the identity is
//! resolved.

/// Banned surface
pub const BANNED_PATH: &str = "/banned";

/// Cookie value meaning "banned"
pub const BAN_SIGNAL_SET: &str = "1";

/// Cookie value written on a clean login and on logout
pub const BAN_SIGNAL_CLEAR: &str = "0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Pass,
    RedirectToBanned,
}

/// Paths the gate never redirects
pub fn is_exempt(path: &str) -> bool {
    path.starts_with("/api")
        || path.starts_with("/_next")
        || path == "/favicon.ico"
        || path.starts_with(BANNED_PATH)
}

pub fn evaluate(path: &str, ban_signal: Option<&str>) -> GateDecision {
    if ban_signal == Some(BAN_SIGNAL_SET) && !is_exempt(path) {
        GateDecision::RedirectToBanned
    } else {
        GateDecision::Pass
    }
}
