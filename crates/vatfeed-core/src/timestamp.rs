//! Conversions between the feed's compact `YYYYMMDDHHMMSS` stamps, epoch
//! seconds and the ISO-8601 strings used by the JSON feed.

use time::format_description::well_known::{Iso8601, Rfc3339};
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

const STAMP_LEN: usize = 14;

/// Epoch seconds (UTC) for a `YYYYMMDDHHMMSS` stamp.
///
/// Anything that is not exactly fourteen digits forming a real calendar
/// instant yields `None`. Out-of-range fields are not rolled over:
/// `20130631000000` (June 31st) is rejected rather than read as July 1st.
pub fn convert_timestamp(stamp: &str) -> Option<i64> {
    let stamp = stamp.trim();
    if stamp.len() != STAMP_LEN || !stamp.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }

    let number = |range: std::ops::Range<usize>| stamp.get(range)?.parse::<u16>().ok();
    let year = i32::from(number(0..4)?);
    let month = Month::try_from(u8::try_from(number(4..6)?).ok()?).ok()?;
    let day = u8::try_from(number(6..8)?).ok()?;
    let hour = u8::try_from(number(8..10)?).ok()?;
    let minute = u8::try_from(number(10..12)?).ok()?;
    let second = u8::try_from(number(12..14)?).ok()?;

    let date = Date::from_calendar_date(year, month, day).ok()?;
    let time = Time::from_hms(hour, minute, second).ok()?;
    Some(PrimitiveDateTime::new(date, time).assume_utc().unix_timestamp())
}

/// `YYYYMMDDHHMMSS` in UTC for an ISO-8601 timestamp; empty when unparsable.
pub fn iso_to_stamp(value: &str) -> String {
    OffsetDateTime::parse(value, &Rfc3339)
        .or_else(|_| OffsetDateTime::parse(value, &Iso8601::DEFAULT))
        .map(|parsed| format_stamp(parsed.to_offset(UtcOffset::UTC)))
        .unwrap_or_default()
}

pub fn format_stamp(value: OffsetDateTime) -> String {
    format!(
        "{:04}{:02}{:02}{:02}{:02}{:02}",
        value.year(),
        u8::from(value.month()),
        value.day(),
        value.hour(),
        value.minute(),
        value.second()
    )
}

pub fn now_epoch() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_feed_stamp_to_epoch() {
        assert_eq!(convert_timestamp("20130601000000"), Some(1_370_044_800));
    }

    #[test]
    fn rejects_malformed_stamps() {
        assert_eq!(convert_timestamp(""), None);
        assert_eq!(convert_timestamp("123456789012345"), None);
        assert_eq!(convert_timestamp("2013060100000x"), None);
        assert_eq!(convert_timestamp("20131301000000"), None);
        assert_eq!(convert_timestamp("20130631000000"), None);
        assert_eq!(convert_timestamp("20130601246000"), None);
    }

    #[test]
    fn iso_timestamps_become_utc_stamps() {
        assert_eq!(iso_to_stamp("2021-03-04T05:06:07.1234567Z"), "20210304050607");
        assert_eq!(iso_to_stamp("2021-03-04T05:06:07+02:00"), "20210304030607");
        assert_eq!(iso_to_stamp("not a time"), "");
    }
}
