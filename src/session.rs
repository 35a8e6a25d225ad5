//! Tracking session identifiers.
//!
//! Identifiers look like `session_<unix millis>_<9 base-36 chars>`. They are
//! unique in practice within one agent lifetime, not unpredictable.

use chrono::Utc;
use uuid::Uuid;

/// Prefix of every generated session identifier.
pub const SESSION_PREFIX: &str = "session_";

/// Length of the random base-36 suffix.
const SUFFIX_LEN: u32 = 9;

const BASE36_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generate a fresh session identifier.
pub fn generate_session_id() -> String {
    let millis = Utc::now().timestamp_millis();
    let random = (Uuid::new_v4().as_u128() >> 64) as u64;
    format!("{SESSION_PREFIX}{millis}_{}", base36_suffix(random))
}

/// Encode `value` as exactly [`SUFFIX_LEN`] base-36 digits.
fn base36_suffix(value: u64) -> String {
    let mut remaining = value % 36u64.pow(SUFFIX_LEN);
    let mut digits = vec![b'0'; SUFFIX_LEN as usize];
    for slot in digits.iter_mut().rev() {
        *slot = BASE36_DIGITS[(remaining % 36) as usize];
        remaining /= 36;
    }
    String::from_utf8_lossy(&digits).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_shape() {
        let id = generate_session_id();
        let rest = id.strip_prefix(SESSION_PREFIX).unwrap();
        let (millis, suffix) = rest.split_once('_').unwrap();

        assert!(millis.parse::<i64>().unwrap() > 0);
        assert_eq!(suffix.len(), 9);
        assert!(suffix.bytes().all(|b| BASE36_DIGITS.contains(&b)));
    }

    #[test]
    fn test_session_ids_differ() {
        assert_ne!(generate_session_id(), generate_session_id());
    }

    #[test]
    fn test_base36_suffix_padding() {
        assert_eq!(base36_suffix(0), "000000000");
        assert_eq!(base36_suffix(35), "00000000z");
        assert_eq!(base36_suffix(36), "000000010");
    }
}
