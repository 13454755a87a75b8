use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};

/// Converts a PalmDB date field.
///
/// Values with the top bit set count unsigned seconds from 1904-01-01, the
/// original Palm OS epoch. Anything else was written by tools that used the
/// Unix epoch and is read as seconds from 1970-01-01.
pub fn from_palm_timestamp(timestamp: u32) -> Option<NaiveDateTime> {
    if timestamp & 0x8000_0000 != 0 {
        let epoch = NaiveDate::from_ymd_opt(1904, 1, 1)?.and_hms_opt(0, 0, 0)?;
        epoch.checked_add_signed(Duration::seconds(timestamp as i64))
    } else {
        DateTime::from_timestamp(timestamp as i64, 0).map(|t| t.naive_utc())
    }
}
