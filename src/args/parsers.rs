use std::time::Duration;

use crate::error::{AppError, AppResult, ValidationError};

/// Parses durations such as `250ms`, `30s`, `2m`, `1h`, or compounds like
/// `1m30s`. A bare number means seconds.
pub(crate) fn parse_duration_arg(s: &str) -> AppResult<Duration> {
    let value = s.trim();
    if value.is_empty() {
        return Err(AppError::validation(ValidationError::DurationEmpty));
    }
    if value.bytes().all(|byte| byte.is_ascii_digit()) {
        return non_zero(Duration::from_secs(parse_number(value, value)?));
    }

    let mut total = Duration::ZERO;
    let mut rest = value;
    while !rest.is_empty() {
        let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits_len == 0 {
            return Err(AppError::validation(
                ValidationError::InvalidDurationFormat {
                    value: value.to_owned(),
                },
            ));
        }
        let (number_part, tail) = rest.split_at(digits_len);
        let unit_len = tail
            .bytes()
            .take_while(|byte| byte.is_ascii_alphabetic())
            .count();
        let (unit, remainder) = tail.split_at(unit_len);
        let component = component_duration(parse_number(number_part, value)?, unit)?;
        total = total
            .checked_add(component)
            .ok_or_else(|| AppError::validation(ValidationError::DurationOverflow))?;
        rest = remainder;
    }
    non_zero(total)
}

fn parse_number(digits: &str, value: &str) -> AppResult<u64> {
    digits.parse().map_err(|err| {
        AppError::validation(ValidationError::InvalidDurationNumber {
            value: value.to_owned(),
            source: err,
        })
    })
}

fn component_duration(number: u64, unit: &str) -> AppResult<Duration> {
    let seconds_per_unit = match unit {
        "ms" => return Ok(Duration::from_millis(number)),
        "s" => 1,
        "m" => 60,
        "h" => 3600,
        _ => {
            return Err(AppError::validation(ValidationError::InvalidDurationUnit {
                unit: unit.to_owned(),
            }));
        }
    };
    number
        .checked_mul(seconds_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| AppError::validation(ValidationError::DurationOverflow))
}

fn non_zero(duration: Duration) -> AppResult<Duration> {
    if duration.is_zero() {
        return Err(AppError::validation(ValidationError::DurationZero));
    }
    Ok(duration)
}
