//! Expiration filter, grounded in `epgttx/ttx_ov.cc`'s slot-list trim before
//! XMLTV export.

use chrono::NaiveDateTime;

/// A slot with no parsed stop-time is treated as if it ran 120 minutes,
/// matching the original's fallback duration when no end-time, next-slot
/// start, or next-page start was available.
const DEFAULT_DURATION_MIN: i64 = 120;

/// Returns `true` if the programme should be dropped: its effective
/// stop-time (explicit, or start + the default duration) is older than
/// `now - expire_min` minutes.
pub fn is_expired(start: NaiveDateTime, stop: Option<NaiveDateTime>, now: NaiveDateTime, expire_min: i64) -> bool {
    let effective_stop = stop.unwrap_or(start + chrono::Duration::minutes(DEFAULT_DURATION_MIN));
    effective_stop < now - chrono::Duration::minutes(expire_min)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(days_minutes_offset: i64, now: NaiveDateTime) -> NaiveDateTime {
        now + chrono::Duration::minutes(days_minutes_offset)
    }

    #[test]
    fn slot_past_threshold_with_explicit_stop_is_dropped() {
        let now = NaiveDateTime::parse_from_str("2024-05-01 12:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let stop = at(-61, now);
        assert!(is_expired(stop, Some(stop), now, 60));
    }

    #[test]
    fn slot_within_threshold_with_explicit_stop_is_kept() {
        let now = NaiveDateTime::parse_from_str("2024-05-01 12:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let stop = at(-59, now);
        assert!(!is_expired(stop, Some(stop), now, 60));
    }

    #[test]
    fn slot_with_undefined_stop_uses_default_duration() {
        let now = NaiveDateTime::parse_from_str("2024-05-01 12:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let start = at(-121, now);
        assert!(is_expired(start, None, now, 60));
    }
}
