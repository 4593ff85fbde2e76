// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Conversion between time values and text.
//!
//! [`BrokenDownTime`] is the calendar view of a time value. [`format`] turns it
//! into text with a strftime-style pattern and [`parse`] reads it back with the
//! same directive set:
//!
//! | Directive | Meaning |
//! |-----------|---------|
//! | `%a` `%A` | weekday name, abbreviated / full |
//! | `%b` `%h` `%B` | month name, abbreviated / full |
//! | `%d` `%e` | day of month, zero / space padded |
//! | `%H` `%k` | hour 00-23, zero / space padded |
//! | `%I` `%l` | hour 01-12, zero / space padded |
//! | `%j` | day of year 001-366 |
//! | `%m` | month 01-12 |
//! | `%M` `%S` | minute, second |
//! | `%p` | `AM` / `PM` |
//! | `%y` `%Y` | two-digit year (1969-2068) / full year |
//! | `%z` | numeric zone offset `+hhmm` |
//! | `%Z` | zone abbreviation from the locale table, else `+hhmm` |
//! | `%n` `%t` | newline, tab (whitespace when parsing) |
//! | `%c` `%C` `%D` `%r` `%R` `%T` `%x` `%X` | composite shorthands |
//! | `%%` | literal `%` |
//!
//! Anything else after a `%` is copied through literally by the formatter and
//! must appear literally in parsed text.

use chrono::{DateTime, Datelike, NaiveDate, Timelike};

mod format;
mod parse;

pub use self::format::{format, format_into, format_with};
pub use self::parse::{parse, parse_into, parse_with};

/// Weekday value marking "unknown": the fields did not form a calendar date.
pub const UNKNOWN_WEEKDAY: i32 = 7;

/// Composite directives may nest at most this deep.
pub(crate) const MAX_DEPTH: usize = 4;

/// A decomposed calendar time.
///
/// Field ranges follow C's `struct tm`; `year` counts from 1900 and `month` from 0.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct BrokenDownTime {
    /// Seconds, 0-59.
    pub second: i32,
    /// Minutes, 0-59.
    pub minute: i32,
    /// Hours, 0-23.
    pub hour: i32,
    /// Day of month, 1-31.
    pub day: i32,
    /// Month, 0-11.
    pub month: i32,
    /// Years since 1900.
    pub year: i32,
    /// Days since Sunday, 0-6, or [`UNKNOWN_WEEKDAY`].
    pub weekday: i32,
    /// Days since January 1st, 0-365.
    pub year_day: i32,
    /// Daylight saving time was applied.
    pub dst: bool,
    /// Zone offset east of UTC, in minutes.
    pub tz_offset_minutes: i32,
}

impl BrokenDownTime {
    /// Decompose UTC seconds since the Unix epoch (`gmtime`).
    ///
    /// Returns `None` outside the calendar range chrono supports.
    pub fn from_timestamp(seconds: i64) -> Option<Self> {
        let utc = DateTime::from_timestamp(seconds, 0)?;
        Some(BrokenDownTime {
            second: utc.second() as i32,
            minute: utc.minute() as i32,
            hour: utc.hour() as i32,
            day: utc.day() as i32,
            month: utc.month0() as i32,
            year: utc.year() - 1900,
            weekday: utc.weekday().num_days_from_sunday() as i32,
            year_day: utc.ordinal0() as i32,
            dst: false,
            tz_offset_minutes: 0,
        })
    }

    /// The calendar date, if year/month/day name a real one.
    pub fn date(&self) -> Option<NaiveDate> {
        let month = u32::try_from(self.month + 1).ok()?;
        let day = u32::try_from(self.day).ok()?;
        NaiveDate::from_ymd_opt(self.full_year(), month, day)
    }

    /// Recompose into seconds since the Unix epoch, reading the fields as UTC (`timegm`).
    ///
    /// Weekday, year day, DST flag and zone offset are ignored. Returns `None` unless every
    /// calendar and clock field is in range.
    pub fn to_timestamp(&self) -> Option<i64> {
        let hour = u32::try_from(self.hour).ok()?;
        let minute = u32::try_from(self.minute).ok()?;
        let second = u32::try_from(self.second).ok()?;
        let naive = self.date()?.and_hms_opt(hour, minute, second)?;
        Some(naive.and_utc().timestamp())
    }

    /// Derive weekday and year day from the date.
    ///
    /// When the fields do not form a calendar date the weekday becomes [`UNKNOWN_WEEKDAY`] and
    /// `false` is returned.
    pub fn normalize(&mut self) -> bool {
        match self.date() {
            Some(date) => {
                self.weekday = date.weekday().num_days_from_sunday() as i32;
                self.year_day = date.ordinal0() as i32;
                true
            }
            None => {
                self.weekday = UNKNOWN_WEEKDAY;
                false
            }
        }
    }

    /// The year as a calendar number (e.g. 2024).
    pub fn full_year(&self) -> i32 {
        self.year + 1900
    }

    /// Hour on a 12-hour dial, 1-12.
    pub fn hour12(&self) -> i32 {
        match self.hour % 12 {
            0 => 12,
            h => h,
        }
    }

    /// Whether the weekday field holds a real weekday.
    pub fn has_weekday(&self) -> bool {
        (0..UNKNOWN_WEEKDAY).contains(&self.weekday)
    }
}

/// Names, shorthands and zone table used by both directions of the codec.
#[derive(Clone, Copy, Debug)]
pub struct Locale {
    /// Abbreviated month names, January first.
    pub abbrev_month_names: [&'static str; 12],
    /// Full month names, January first.
    pub month_names: [&'static str; 12],
    /// Abbreviated weekday names, Sunday first.
    pub abbrev_weekday_names: [&'static str; 7],
    /// Full weekday names, Sunday first.
    pub weekday_names: [&'static str; 7],
    /// Expansion of `%X`.
    pub time_format: &'static str,
    /// Expansion of `%x`.
    pub date_format: &'static str,
    /// Expansion of `%c`.
    pub date_time_format: &'static str,
    /// Expansion of `%C`.
    pub long_date_format: &'static str,
    /// Morning marker for `%p`.
    pub am: &'static str,
    /// Afternoon marker for `%p`.
    pub pm: &'static str,
    /// Zone abbreviations and their offsets east of UTC in minutes.
    pub zones: &'static [(&'static str, i32)],
}

/// The US English locale.
pub const EN_US: Locale = Locale {
    abbrev_month_names: [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ],
    month_names: [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ],
    abbrev_weekday_names: ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"],
    weekday_names: [
        "Sunday",
        "Monday",
        "Tuesday",
        "Wednesday",
        "Thursday",
        "Friday",
        "Saturday",
    ],
    time_format: "%H:%M:%S",
    date_format: "%m/%d/%y",
    date_time_format: "%x %X",
    long_date_format: "%A, %B, %e, %Y",
    am: "AM",
    pm: "PM",
    zones: &[
        ("UTC", 0),
        ("EST", -5 * 60),
        ("CST", -6 * 60),
        ("MST", -7 * 60),
        ("PST", -8 * 60),
        ("YST", -9 * 60),
        ("CAT", -10 * 60),
        ("HST", -10 * 60),
        ("CET", 60),
        ("EET", 2 * 60),
    ],
};

impl Locale {
    /// Zone abbreviation for an offset, first match wins.
    pub fn zone_name(&self, offset_minutes: i32) -> Option<&'static str> {
        self.zones
            .iter()
            .find(|(_, offset)| *offset == offset_minutes)
            .map(|(name, _)| *name)
    }

    /// The pattern a composite directive stands for.
    pub fn expansion(&self, directive: char) -> Option<&'static str> {
        match directive {
            'c' => Some(self.date_time_format),
            'C' => Some(self.long_date_format),
            'x' => Some(self.date_format),
            'X' => Some(self.time_format),
            'D' => Some("%m/%d/%y"),
            'r' => Some("%I:%M:%S %p"),
            'R' => Some("%H:%M"),
            'T' => Some("%H:%M:%S"),
            _ => None,
        }
    }
}

/// `Www Mmm dd hh:mm:ss yyyy`, the fixed layout of C's `asctime` without the newline.
///
/// An unknown weekday prints as `???`.
pub fn asctime(tm: &BrokenDownTime) -> String {
    let weekday = if tm.has_weekday() {
        EN_US.abbrev_weekday_names[tm.weekday as usize]
    } else {
        "???"
    };
    let month = EN_US.abbrev_month_names[tm.month.rem_euclid(12) as usize];
    format!(
        "{} {}{:3} {:02}:{:02}:{:02} {}",
        weekday,
        month,
        tm.day,
        tm.hour,
        tm.minute,
        tm.second,
        tm.full_year()
    )
}

/// [`asctime`] of UTC seconds, or `None` outside the calendar range.
pub fn ctime(seconds: i64) -> Option<String> {
    BrokenDownTime::from_timestamp(seconds).map(|tm| asctime(&tm))
}

/// `end - beginning` in seconds.
pub fn difftime(end: i64, beginning: i64) -> f64 {
    (end - beginning) as f64
}
