//! Times as strings, e.g. `19-Nov-2012 07:36:57`.

use hifitime::Epoch;

use super::PsError;

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

pub fn format_time(e: Epoch) -> String {
    let (year, month, day, hour, minute, second, _) = e.to_gregorian_utc();
    let month = MONTHS[usize::from(month.clamp(1, 12)) - 1];
    format!("{day:02}-{month}-{year:04} {hour:02}:{minute:02}:{second:02}")
}

/// The inverse of [`format_time`]. Month names are case insensitive.
pub fn parse_time(s: &str) -> Result<Epoch, PsError> {
    let bad = || PsError::BadTimeString(s.to_string());

    let (date, time) = s.trim().split_once(' ').ok_or_else(bad)?;
    let date: Vec<&str> = date.split('-').collect();
    let time: Vec<&str> = time.trim().split(':').collect();
    let (day, month, year) = match date.as_slice() {
        [d, m, y] => (*d, *m, *y),
        _ => return Err(bad()),
    };
    let (hour, minute, second) = match time.as_slice() {
        [h, m, s] => (*h, *m, *s),
        _ => return Err(bad()),
    };

    let month = MONTHS
        .iter()
        .position(|m| m.eq_ignore_ascii_case(month))
        .ok_or_else(bad)? as u8
        + 1;
    let parse_u8 = |v: &str| v.parse::<u8>().map_err(|_| bad());
    let year: i32 = year.parse().map_err(|_| bad())?;
    Epoch::maybe_from_gregorian_utc(
        year,
        month,
        parse_u8(day)?,
        parse_u8(hour)?,
        parse_u8(minute)?,
        parse_u8(second)?,
        0,
    )
    .map_err(|_| bad())
}
