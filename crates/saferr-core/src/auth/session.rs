use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// The authenticated identity returned by login and registration.
///
/// Sessions have no refresh flow: once `expiration` passes the user has to
/// log in again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct Session {
    pub token: String,
    #[serde(deserialize_with = "expiration::deserialize")]
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub expiration: DateTime<Utc>,
    pub user_id: String,
    pub username: String,
    pub brand_id: String,
    pub brand_name: String,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiration
    }

    /// A session is usable while it carries a token and has not expired
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.token.is_empty() && !self.is_expired_at(now)
    }

    pub fn time_until_expiry(&self) -> Duration {
        self.expiration - Utc::now()
    }

    /// Get minutes remaining until expiry (for display)
    pub fn minutes_until_expiry(&self) -> i64 {
        self.time_until_expiry().num_minutes().max(0)
    }
}

/// The backend sometimes omits the UTC designator on `expiration`; such
/// timestamps are read as UTC.
mod expiration {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid expiration timestamp: {raw}"))
        })
    }

    pub(super) fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_expiring_at(expiration: DateTime<Utc>) -> Session {
        Session {
            token: "xyz".to_string(),
            expiration,
            user_id: "u1".to_string(),
            username: "brand1".to_string(),
            brand_id: "b1".to_string(),
            brand_name: "Acme".to_string(),
        }
    }

    #[test]
    fn test_future_expiration_is_valid() {
        let now = Utc::now();
        for minutes in [1, 30, 60 * 24 * 365] {
            let session = session_expiring_at(now + Duration::minutes(minutes));
            assert!(session.is_valid_at(now));
            assert!(!session.is_expired_at(now));
        }
    }

    #[test]
    fn test_past_expiration_is_invalid() {
        let now = Utc::now();
        for minutes in [0, 1, 60 * 24 * 365] {
            let session = session_expiring_at(now - Duration::minutes(minutes));
            assert!(!session.is_valid_at(now));
        }
    }

    #[test]
    fn test_empty_token_is_invalid() {
        let mut session = session_expiring_at(Utc::now() + Duration::hours(1));
        session.token.clear();
        assert!(!session.is_valid_at(Utc::now()));
    }

    #[test]
    fn test_parse_login_payload() {
        let json = r#"{"token":"xyz","expiration":"2000-01-01T00:00:00Z","userId":"u1","username":"brand1","brandId":"b1","brandName":"Acme"}"#;
        let session: Session = serde_json::from_str(json).unwrap();
        assert_eq!(session.token, "xyz");
        assert_eq!(session.brand_name, "Acme");
        assert!(session.is_expired());
    }

    #[test]
    fn test_expiration_without_offset_is_utc() {
        let parsed = expiration::parse("2031-05-04T10:20:30.1234567").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2031-05-04T10:20:30.123456700+00:00");

        let parsed = expiration::parse("2031-05-04T12:00:00+02:00").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2031-05-04T10:00:00+00:00");

        assert!(expiration::parse("tomorrow").is_none());
    }

    #[test]
    fn test_json_round_trip() {
        let session = session_expiring_at(Utc::now() + Duration::hours(1));
        let json = serde_json::to_string(&session).unwrap();
        assert!(json.contains("\"brandName\":\"Acme\""));
        let back: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(back, session);
    }

    #[cfg(feature = "ts")]
    #[test]
    fn test_ts_binding_types_expiration_as_string() {
        use ts_rs::TS;
        let binding = Session::inline();
        assert!(binding.contains("expiration: string"), "{binding}");
        assert!(binding.contains("brandName: string"), "{binding}");
    }
}
