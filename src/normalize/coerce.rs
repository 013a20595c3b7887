//! Value coercion for loosely-typed upstream fields.
//!
//! Every function returns `None` when the value does not type-check, which
//! lets the caller fall through to the next alias.

use serde_json::{Number, Value};

use statuswatch_types::MAX_SCORE;

/// Non-negative integer from a number or numeric string.
///
/// Floats truncate toward zero and negatives clamp to zero.
pub fn non_negative(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => from_number(n),
        Value::String(s) => from_text(s.trim()),
        _ => None,
    }
}

/// Player count. Arrays (player lists) count their elements.
pub fn count(value: &Value) -> Option<u32> {
    match value {
        Value::Array(players) => Some(saturate(players.len() as u64)),
        other => non_negative(other).map(saturate),
    }
}

/// Team score. Anything above `MAX_SCORE` is noise and resets to zero.
pub fn score(value: &Value) -> Option<u8> {
    non_negative(value).map(|n| if n > u64::from(MAX_SCORE) { 0 } else { n as u8 })
}

/// Elapsed seconds from a seconds count or an `MM:SS` / `HH:MM:SS` string.
pub fn game_time(value: &Value) -> Option<u64> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            clock(s).or_else(|| from_text(s))
        }
        other => non_negative(other),
    }
}

/// Trimmed, non-empty map name.
pub fn map_name(value: &Value) -> Option<String> {
    let name = value.as_str()?.trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// Parse `MM:SS` or `HH:MM:SS` into seconds.
pub fn clock(text: &str) -> Option<u64> {
    let parts = text
        .split(':')
        .map(|part| {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                None
            } else {
                part.parse::<u64>().ok()
            }
        })
        .collect::<Option<Vec<u64>>>()?;

    match parts.as_slice() {
        [minutes, seconds] if *seconds < 60 => minutes.checked_mul(60)?.checked_add(*seconds),
        [hours, minutes, seconds] if *minutes < 60 && *seconds < 60 => hours
            .checked_mul(3600)?
            .checked_add(minutes * 60 + seconds),
        _ => None,
    }
}

fn from_number(n: &Number) -> Option<u64> {
    if let Some(u) = n.as_u64() {
        Some(u)
    } else if n.as_i64().is_some() {
        // as_u64 failed, so the integer is negative
        Some(0)
    } else {
        n.as_f64().and_then(from_float)
    }
}

fn from_text(text: &str) -> Option<u64> {
    if text.is_empty() {
        return None;
    }
    if let Ok(u) = text.parse::<u64>() {
        return Some(u);
    }
    if text.parse::<i64>().is_ok() {
        return Some(0);
    }
    text.parse::<f64>().ok().and_then(from_float)
}

fn from_float(f: f64) -> Option<u64> {
    if !f.is_finite() {
        None
    } else if f <= 0.0 {
        Some(0)
    } else {
        // `as` saturates at u64::MAX
        Some(f.trunc() as u64)
    }
}

fn saturate(n: u64) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_non_negative() {
        assert_eq!(non_negative(&json!(12)), Some(12));
        assert_eq!(non_negative(&json!(12.9)), Some(12));
        assert_eq!(non_negative(&json!(-4)), Some(0));
        assert_eq!(non_negative(&json!(-0.5)), Some(0));
        assert_eq!(non_negative(&json!(" 17 ")), Some(17));
        assert_eq!(non_negative(&json!("3.7")), Some(3));
        assert_eq!(non_negative(&json!("-2")), Some(0));
        assert_eq!(non_negative(&json!("twelve")), None);
        assert_eq!(non_negative(&json!("")), None);
        assert_eq!(non_negative(&json!(true)), None);
        assert_eq!(non_negative(&Value::Null), None);
    }

    #[test]
    fn test_count_saturates_and_counts_lists() {
        assert_eq!(count(&json!(5_000_000_000u64)), Some(u32::MAX));
        assert_eq!(count(&json!(["a", "b", "c"])), Some(3));
        assert_eq!(count(&json!({"n": 1})), None);
    }

    #[test]
    fn test_score_resets_out_of_range() {
        assert_eq!(score(&json!(0)), Some(0));
        assert_eq!(score(&json!(5)), Some(5));
        assert_eq!(score(&json!(6)), Some(0));
        assert_eq!(score(&json!(4.9)), Some(4));
        assert_eq!(score(&json!(-1)), Some(0));
        assert_eq!(score(&json!("3")), Some(3));
        assert_eq!(score(&json!([1, 2])), None);
    }

    #[test]
    fn test_clock() {
        assert_eq!(clock("12:34"), Some(754));
        assert_eq!(clock("00:00"), Some(0));
        assert_eq!(clock("1:02:03"), Some(3723));
        assert_eq!(clock("90:00"), Some(5400));
        assert_eq!(clock("12:60"), None);
        assert_eq!(clock("1:60:00"), None);
        assert_eq!(clock("12"), None);
        assert_eq!(clock("a:b"), None);
        assert_eq!(clock("1:2:3:4"), None);
        assert_eq!(clock(":30"), None);
        assert_eq!(clock("-1:30"), None);
    }

    #[test]
    fn test_game_time() {
        assert_eq!(game_time(&json!("  45:10 ")), Some(2710));
        assert_eq!(game_time(&json!(754)), Some(754));
        assert_eq!(game_time(&json!(754.8)), Some(754));
        assert_eq!(game_time(&json!("754")), Some(754));
        assert_eq!(game_time(&json!("soon")), None);
        assert_eq!(game_time(&json!("")), None);
    }

    #[test]
    fn test_map_name() {
        assert_eq!(map_name(&json!("  Carentan ")), Some("Carentan".to_string()));
        assert_eq!(map_name(&json!("   ")), None);
        assert_eq!(map_name(&json!(7)), None);
    }
}
