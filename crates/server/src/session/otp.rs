use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rand::Rng;
use shared::UserType;

#[derive(Debug, Clone)]
struct OtpEntry {
    code: String,
    expires_at: DateTime<Utc>,
    failed_attempts: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpCheck {
    Valid,
    Invalid,
    /// Expired, never issued, or burned by too many wrong guesses
    Unavailable,
}

/// One-time login codes, keyed by role and normalized email
pub struct OtpStore {
    codes: DashMap<(UserType, String), OtpEntry>,
    ttl: Duration,
    max_attempts: u32,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl OtpStore {
    pub fn new(ttl: Duration, max_attempts: u32) -> Self {
        Self {
            codes: DashMap::new(),
            ttl,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Issue a fresh 6-digit code, replacing any earlier one
    pub fn issue(&self, user_type: UserType, email: &str, now: DateTime<Utc>) -> String {
        let code = format!("{:06}", rand::thread_rng().gen_range(0..1_000_000));
        self.codes.insert(
            (user_type, normalize_email(email)),
            OtpEntry {
                code: code.clone(),
                expires_at: now + self.ttl,
                failed_attempts: 0,
            },
        );
        code
    }

    /// A valid code is consumed
    pub fn verify(&self, user_type: UserType, email: &str, code: &str, now: DateTime<Utc>) -> OtpCheck {
        let key = (user_type, normalize_email(email));

        let check = match self.codes.get_mut(&key) {
            None => return OtpCheck::Unavailable,
            Some(entry) if entry.expires_at <= now => OtpCheck::Unavailable,
            Some(entry) if entry.code == code.trim() => OtpCheck::Valid,
            Some(mut entry) => {
                entry.failed_attempts += 1;
                if entry.failed_attempts >= self.max_attempts {
                    OtpCheck::Unavailable
                } else {
                    return OtpCheck::Invalid;
                }
            }
        };

        self.codes.remove(&key);
        check
    }

    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.codes.len();
        self.codes.retain(|_, entry| entry.expires_at > now);
        before - self.codes.len()
    }
}
