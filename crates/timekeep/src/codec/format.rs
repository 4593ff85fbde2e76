// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

use log::debug;
use std::fmt::{self, Write};

use super::{BrokenDownTime, Locale, EN_US, MAX_DEPTH};
use crate::error::FormatError;

/// Render `tm` with a strftime-style pattern in the US English locale.
///
/// ```
/// use timekeep::codec::{format, BrokenDownTime};
///
/// let tm = BrokenDownTime::from_timestamp(1_704_422_730).unwrap();
/// assert_eq!(format("%Y-%m-%d %H:%M:%S", &tm), "2024-01-05 02:45:30");
/// assert_eq!(format("%I:%M %p", &tm), "02:45 AM");
/// ```
pub fn format(pattern: &str, tm: &BrokenDownTime) -> String {
    format_with(&EN_US, pattern, tm)
}

/// [`format`] with an explicit locale.
pub fn format_with(locale: &Locale, pattern: &str, tm: &BrokenDownTime) -> String {
    let mut out = String::with_capacity(pattern.len() * 2);
    Formatter { locale, tm }.write(&mut out, pattern, 0).ok();
    out
}

/// Render into a caller buffer, returning the number of bytes written.
///
/// Output that does not fit is an error and leaves `buf` untouched; text is never truncated.
pub fn format_into(
    pattern: &str,
    tm: &BrokenDownTime,
    buf: &mut [u8],
) -> Result<usize, FormatError> {
    let text = format(pattern, tm);
    let bytes = text.as_bytes();
    if bytes.len() > buf.len() {
        return Err(FormatError::BufferTooSmall {
            needed: bytes.len(),
            available: buf.len(),
        });
    }
    buf[..bytes.len()].copy_from_slice(bytes);
    Ok(bytes.len())
}

struct Formatter<'a> {
    locale: &'a Locale,
    tm: &'a BrokenDownTime,
}

impl Formatter<'_> {
    fn write<W: Write>(&self, out: &mut W, pattern: &str, depth: usize) -> fmt::Result {
        let tm = self.tm;
        let mut chars = pattern.chars();
        while let Some(c) = chars.next() {
            if c != '%' {
                out.write_char(c)?;
                continue;
            }
            let Some(directive) = chars.next() else {
                out.write_char('%')?;
                break;
            };
            match directive {
                'a' => out.write_str(self.weekday_name(&self.locale.abbrev_weekday_names))?,
                'A' => out.write_str(self.weekday_name(&self.locale.weekday_names))?,
                'b' | 'h' => out.write_str(self.month_name(&self.locale.abbrev_month_names))?,
                'B' => out.write_str(self.month_name(&self.locale.month_names))?,
                'd' => write!(out, "{:02}", tm.day)?,
                'e' => write!(out, "{:2}", tm.day)?,
                'H' => write!(out, "{:02}", tm.hour)?,
                'k' => write!(out, "{:2}", tm.hour)?,
                'I' => write!(out, "{:02}", tm.hour12())?,
                'l' => write!(out, "{:2}", tm.hour12())?,
                'j' => write!(out, "{:03}", tm.year_day + 1)?,
                'm' => write!(out, "{:02}", tm.month + 1)?,
                'M' => write!(out, "{:02}", tm.minute)?,
                'S' => write!(out, "{:02}", tm.second)?,
                'n' => out.write_char('\n')?,
                't' => out.write_char('\t')?,
                'p' => out.write_str(if tm.hour < 12 {
                    self.locale.am
                } else {
                    self.locale.pm
                })?,
                'y' => write!(out, "{:02}", tm.full_year().rem_euclid(100))?,
                'Y' => write!(out, "{}", tm.full_year())?,
                'z' => write_numeric_offset(out, tm.tz_offset_minutes)?,
                'Z' => match self.locale.zone_name(tm.tz_offset_minutes) {
                    Some(name) => out.write_str(name)?,
                    None => write_numeric_offset(out, tm.tz_offset_minutes)?,
                },
                '%' => out.write_char('%')?,
                other => match self.locale.expansion(other) {
                    Some(sub) if depth < MAX_DEPTH => self.write(out, sub, depth + 1)?,
                    Some(_) => {
                        debug!("format: %{} nested too deeply, copied through", other);
                        out.write_char('%')?;
                        out.write_char(other)?;
                    }
                    None => {
                        out.write_char('%')?;
                        out.write_char(other)?;
                    }
                },
            }
        }
        Ok(())
    }

    fn weekday_name(&self, names: &[&'static str; 7]) -> &'static str {
        if self.tm.has_weekday() {
            names[self.tm.weekday as usize]
        } else {
            "???"
        }
    }

    fn month_name(&self, names: &[&'static str; 12]) -> &'static str {
        usize::try_from(self.tm.month)
            .ok()
            .and_then(|m| names.get(m))
            .copied()
            .unwrap_or("???")
    }
}

fn write_numeric_offset<W: Write>(out: &mut W, minutes: i32) -> fmt::Result {
    let sign = if minutes < 0 { '-' } else { '+' };
    let minutes = minutes.unsigned_abs();
    write!(out, "{}{:02}{:02}", sign, minutes / 60, minutes % 60)
}
