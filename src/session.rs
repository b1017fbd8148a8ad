use std::time::{SystemTime, UNIX_EPOCH};

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Generate the per-process session identifier sent as `thread_id` on every
/// chat request: `session-<unix-millis>-<9 random chars>`.
///
/// This is a correlation nonce for the backend's conversation memory, not a
/// security token. Collisions are harmless.
pub fn generate_session_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);

    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(|b| (b as char).to_ascii_lowercase())
        .collect();

    format!("session-{}-{}", millis, suffix)
}
