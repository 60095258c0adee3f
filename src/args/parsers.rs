use crate::error::ConfigError;

/// Splits a `Key: Value` header on the first colon.
pub(crate) fn parse_header(s: &str) -> Result<(String, String), ConfigError> {
    match s.split_once(':') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_owned(), value.trim().to_owned()))
        }
        Some(_) | None => Err(ConfigError::InvalidHeaderFormat {
            value: s.to_owned(),
        }),
    }
}
