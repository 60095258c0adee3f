use std::time::Duration;

use crate::error::ConfigError;

const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_HOUR: u64 = 3_600;
const SECS_PER_DAY: u64 = 86_400;

/// Parses `<digits><unit>` where unit is `ms`, `s`, `m`, `h` or `d`; bare
/// digits are seconds. Zero is rejected.
pub(crate) fn parse_duration_value(value: &str) -> Result<Duration, ConfigError> {
    let duration = parse_duration_allow_zero(value)?;
    if duration.is_zero() {
        return Err(ConfigError::DurationZero);
    }
    Ok(duration)
}

pub(crate) fn parse_duration_allow_zero(value: &str) -> Result<Duration, ConfigError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::DurationEmpty);
    }

    let digits_len = value
        .chars()
        .take_while(char::is_ascii_digit)
        .count();
    if digits_len == 0 {
        return Err(ConfigError::InvalidDurationFormat {
            value: value.to_owned(),
        });
    }
    let (num_part, unit_part) = value.split_at(digits_len);
    let number: u64 = num_part
        .parse()
        .map_err(|err| ConfigError::InvalidDurationNumber {
            value: value.to_owned(),
            source: err,
        })?;

    let unit = if unit_part.is_empty() { "s" } else { unit_part.trim() };
    let duration = match unit {
        "ms" => Duration::from_millis(number),
        "s" => Duration::from_secs(number),
        "m" => Duration::from_secs(scale(number, SECS_PER_MINUTE)?),
        "h" => Duration::from_secs(scale(number, SECS_PER_HOUR)?),
        "d" => Duration::from_secs(scale(number, SECS_PER_DAY)?),
        _ => {
            return Err(ConfigError::InvalidDurationUnit {
                unit: unit.to_owned(),
            });
        }
    };
    Ok(duration)
}

fn scale(number: u64, factor: u64) -> Result<u64, ConfigError> {
    number
        .checked_mul(factor)
        .ok_or(ConfigError::DurationOverflow)
}
