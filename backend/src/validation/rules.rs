//! Common validation rules shared across request payloads.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use url::Url;
use validator::ValidationError;

/// Validates a robot base address.
///
/// Accepts `http(s)://host[:port][/prefix]` or a bare `host:port`, which the
/// client treats as plain HTTP.
pub fn validate_robot_address(address: &str) -> Result<(), ValidationError> {
    let trimmed = address.trim();
    if trimmed.is_empty() || trimmed.len() > 255 {
        return Err(ValidationError::new("robot_address_invalid_length"));
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };

    match Url::parse(&candidate) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() => Ok(()),
        _ => Err(ValidationError::new("robot_address_invalid")),
    }
}

/// Validates that an image payload is standard base64, with or without a
/// `data:image/...;base64,` prefix.
pub fn validate_image_base64(content: &str) -> Result<(), ValidationError> {
    let payload = strip_data_url_prefix(content);
    if payload.is_empty() {
        return Err(ValidationError::new("image_content_empty"));
    }
    STANDARD
        .decode(payload)
        .map(|_| ())
        .map_err(|_| ValidationError::new("image_content_not_base64"))
}

pub fn strip_data_url_prefix(content: &str) -> &str {
    let trimmed = content.trim();
    match trimmed.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => trimmed,
    }
}
