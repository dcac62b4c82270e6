//! Pid v3 issuance.

use crate::error::PidError;
use uuid::Uuid;

/// Length of a pid v3.
pub const PID_V3_LENGTH: usize = 23;

/// Characters of a pid v3: digits and consonants that cannot be misread.
const PID_V3_ALPHABET: &[u8] = b"bcdfghjkmnpqrstvwxyzBCDFGHJKLMNPQRSTVWXYZ3456789";

/// Everything known about an article when asking for its pid v3.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PidRequest {
    pub v2: String,
    pub v3: Option<String>,
    pub aop: Option<String>,
    pub doi: Option<String>,
    pub filename: String,
}

/// The authority for pid v3 values.
pub trait PidIssuer: Send + Sync {
    /// Returns the pid v3 registered for `request.v2`, registering one if needed.
    fn issue_pid_v3(&self, request: &PidRequest) -> Result<String, PidError>;
}

/// Generates a random pid v3.
///
/// Only for use when no [`PidIssuer`] is configured.
pub fn generate_pid_v3() -> String {
    let mut bytes = Vec::with_capacity(32);
    bytes.extend_from_slice(Uuid::new_v4().as_bytes());
    bytes.extend_from_slice(Uuid::new_v4().as_bytes());
    bytes
        .iter()
        .take(PID_V3_LENGTH)
        .map(|b| PID_V3_ALPHABET[*b as usize % PID_V3_ALPHABET.len()] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_pid_v3() {
        let pid = generate_pid_v3();
        assert_eq!(pid.len(), PID_V3_LENGTH);
        assert!(pid.bytes().all(|b| PID_V3_ALPHABET.contains(&b)));
        assert_ne!(pid, generate_pid_v3());
    }
}
