//! # Services
//!
//! Application logic sitting between the HTTP edge and the ports.

mod community;
mod user;

pub use community::{CommunityService, NewAnnouncement, NewCommunity, NewEvent, EventUpdate};
pub use user::{Registration, UserService};

use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};

/// Parses an RFC 3339 / ISO-8601 timestamp into UTC.
pub fn parse_timestamp(field: &str, raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| AppError::Validation(format!("{field} must be an RFC 3339 timestamp")))
}

/// Trims `value` and rejects it when nothing is left.
fn required(field: &str, value: String) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_offsets_into_utc() {
        let parsed = parse_timestamp("date", "2024-03-01T10:00:00+02:00").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-03-01T08:00:00+00:00");
    }

    #[test]
    fn rejects_non_rfc3339_dates() {
        for raw in ["", "yesterday", "2024-03-01", "2024-03-01 10:00:00"] {
            let err = parse_timestamp("date", raw).unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{raw:?} accepted");
        }
    }

    #[test]
    fn required_trims_and_rejects_blank() {
        assert_eq!(required("name", "  C1 ".into()).unwrap(), "C1");
        assert!(matches!(
            required("name", "   ".into()),
            Err(AppError::Validation(msg)) if msg == "name is required"
        ));
    }
}
