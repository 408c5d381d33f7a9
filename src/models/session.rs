// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authentication ticket and the persisted session around it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tickets this close to expiry are treated as already expired.
pub const TICKET_EXPIRY_MARGIN_SECS: i64 = 60;

/// Opaque bearer ticket issued by LibreLinkUp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTicket {
    pub token: String,
    /// Expiry as a Unix timestamp (seconds)
    pub expires: i64,
    /// Lifetime in milliseconds, as reported upstream
    #[serde(default)]
    pub duration: i64,
}

impl AuthTicket {
    /// Whether the ticket is missing its token or expires within the margin.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.token.is_empty() || now.timestamp() + TICKET_EXPIRY_MARGIN_SECS >= self.expires
    }
}

/// Minimal profile of the logged-in account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// LibreLinkUp account ID (hashed into the `Account-Id` header)
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
}

impl UserProfile {
    /// Display name, e.g. "Jane Doe".
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Persisted session: the current ticket plus the profile it belongs to.
///
/// `version` increases on every ticket replacement so a reader can tell
/// which of two racing writers won.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub version: u64,
    pub ticket: AuthTicket,
    pub profile: UserProfile,
    /// Regional API base URL the ticket was issued by
    pub api_base_url: String,
}

impl StoredSession {
    /// Replace the ticket, bumping the version.
    pub fn with_ticket(&self, ticket: AuthTicket) -> Self {
        Self {
            version: self.version + 1,
            ticket,
            profile: self.profile.clone(),
            api_base_url: self.api_base_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ticket(expires: i64) -> AuthTicket {
        AuthTicket {
            token: "tok".to_string(),
            expires,
            duration: 15_552_000_000,
        }
    }

    #[test]
    fn test_ticket_expiry_uses_margin() {
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 15, 0, 0).unwrap();
        assert!(!ticket(now.timestamp() + 3600).is_expired(now));
        assert!(ticket(now.timestamp() + 30).is_expired(now));
        assert!(ticket(now.timestamp() - 1).is_expired(now));
    }

    #[test]
    fn test_empty_token_is_expired() {
        let now = Utc::now();
        let t = AuthTicket {
            token: String::new(),
            expires: now.timestamp() + 3600,
            duration: 0,
        };
        assert!(t.is_expired(now));
    }

    #[test]
    fn test_with_ticket_bumps_version() {
        let session = StoredSession {
            version: 3,
            ticket: ticket(100),
            profile: UserProfile {
                id: "u1".to_string(),
                first_name: "Jane".to_string(),
                last_name: "Doe".to_string(),
                email: "jane@example.com".to_string(),
            },
            api_base_url: "https://api.libreview.io".to_string(),
        };

        let renewed = session.with_ticket(ticket(200));
        assert_eq!(renewed.version, 4);
        assert_eq!(renewed.ticket.expires, 200);
        assert_eq!(renewed.profile, session.profile);
        assert_eq!(renewed.profile.display_name(), "Jane Doe");
    }
}
