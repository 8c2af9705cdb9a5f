use chrono::{Datelike, Utc};
use uuid::Uuid;

use crate::error::ApiError;

pub const USERNAME_MIN_CHARS: usize = 3;
pub const USERNAME_MAX_CHARS: usize = 30;
pub const COMMENT_MAX_CHARS: usize = 1000;
pub const EARLIEST_ALBUM_YEAR: i32 = 1900;

/// Rating bounds for reviews embedded in artists and albums
pub const EMBEDDED_RATING: (i64, i64) = (1, 5);
/// Rating bounds for standalone album reviews
pub const STANDALONE_RATING: (i64, i64) = (1, 10);

/// Trimmed, non-empty value of a required field.
pub fn required(field: &str, value: Option<String>) -> Result<String, ApiError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ApiError::missing_field(field)),
    }
}

/// Trimmed value of an optional field; blank counts as absent.
pub fn optional(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Present but blank is an error; absent is fine.
pub fn non_blank(field: &str, value: Option<String>) -> Result<Option<String>, ApiError> {
    match value {
        None => Ok(None),
        Some(v) => {
            let v = v.trim().to_string();
            if v.is_empty() {
                Err(ApiError::invalid_field(field, format!("{} must not be empty", field)))
            } else {
                Ok(Some(v))
            }
        }
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_username(username: &str) -> Result<(), ApiError> {
    let len = username.chars().count();
    if !(USERNAME_MIN_CHARS..=USERNAME_MAX_CHARS).contains(&len) {
        return Err(ApiError::invalid_field(
            "username",
            format!(
                "Username must be between {} and {} characters",
                USERNAME_MIN_CHARS, USERNAME_MAX_CHARS
            ),
        ));
    }
    Ok(())
}

/// Accepts `local@domain.tld` shapes: no whitespace, a non-empty local part and a
/// dotted domain with non-empty labels on both sides of some dot.
pub fn validate_email(email: &str) -> Result<(), ApiError> {
    let invalid = || ApiError::invalid_field("email", "Invalid email format");

    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let shaped = email.match_indices('@').any(|(at, _)| {
        let domain = &email[at + 1..];
        at > 0
            && domain
                .match_indices('.')
                .any(|(dot, _)| dot > 0 && dot + 1 < domain.len())
    });

    if shaped {
        Ok(())
    } else {
        Err(invalid())
    }
}

pub fn validate_album_year(year: i32) -> Result<(), ApiError> {
    let current = Utc::now().year();
    if year < EARLIEST_ALBUM_YEAR || year > current {
        return Err(ApiError::invalid_field(
            "year",
            format!("Year must be between {} and {}", EARLIEST_ALBUM_YEAR, current),
        ));
    }
    Ok(())
}

/// Whole-number rating within `(min, max)`; anything else is `INVALID_RATING`.
pub fn validate_rating(rating: Option<f64>, (min, max): (i64, i64)) -> Result<i16, ApiError> {
    let rating = rating.ok_or_else(|| ApiError::missing_field("rating"))?;
    if rating.fract() != 0.0 || rating < min as f64 || rating > max as f64 {
        return Err(ApiError::InvalidRating { min, max });
    }
    Ok(rating as i16)
}

pub fn validate_comment_length(comment: &str) -> Result<(), ApiError> {
    if comment.chars().count() > COMMENT_MAX_CHARS {
        return Err(ApiError::invalid_field(
            "comment",
            format!("Comment must be at most {} characters", COMMENT_MAX_CHARS),
        ));
    }
    Ok(())
}

/// Parses a path or body id; `what` names the entity in the error.
pub fn parse_id(what: &str, raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::invalid_id(format!("{} id", what)))
}
