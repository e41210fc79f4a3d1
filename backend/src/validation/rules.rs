//! Common validation rules shared across request payloads.

use validator::ValidationError;

pub const MAX_COMMENT_LENGTH: usize = 500;

/// Validates an ISO 3166-1 alpha-2 country code such as `DE` or `GB`.
pub fn validate_country_code(code: &str) -> Result<(), ValidationError> {
    if code.len() != 2 || !code.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(ValidationError::new("country_code_invalid"));
    }
    Ok(())
}

/// Validates a `#RRGGBB` color used to render leave types.
pub fn validate_hex_color(color: &str) -> Result<(), ValidationError> {
    let Some(hex) = color.strip_prefix('#') else {
        return Err(ValidationError::new("color_invalid"));
    };
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValidationError::new("color_invalid"));
    }
    Ok(())
}

/// Validates approval and rejection comments.
///
/// Requirements:
/// - At most 500 characters once trimmed
pub fn validate_decision_comment(comment: &str) -> Result<(), ValidationError> {
    if comment.trim().chars().count() > MAX_COMMENT_LENGTH {
        return Err(ValidationError::new("comment_too_long"));
    }
    Ok(())
}

/// Rejects names that are blank once trimmed.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}
