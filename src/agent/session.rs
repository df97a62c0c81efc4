use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};

/// One id per page load: millisecond timestamp plus a random suffix. Not a
/// stable cross-visit identity.
pub fn new_session_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();

    format!("{:x}-{}", Utc::now().timestamp_millis(), suffix)
}
