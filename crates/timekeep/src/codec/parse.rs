// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

use std::ops::RangeInclusive;

use chrono::{Datelike, NaiveDate};

use super::{BrokenDownTime, Locale, EN_US, MAX_DEPTH};
use crate::error::{ParseError, ParseErrorKind};

/// Read text against a strftime-style pattern in the US English locale.
///
/// Matching starts from an all-zero [`BrokenDownTime`] and stops successfully as
/// soon as the text runs out, so a prefix of the pattern is enough. Returns the
/// filled fields and the unconsumed rest of `text`.
///
/// A `%j` day of year fills in month and day when the pattern names neither.
///
/// ```
/// use timekeep::codec::parse;
///
/// let (tm, rest) = parse("07/04/26 18:30:00 UTC", "%D %T").unwrap();
/// assert_eq!((tm.full_year(), tm.month, tm.day), (2026, 6, 4));
/// assert_eq!((tm.hour, tm.minute), (18, 30));
/// assert_eq!(tm.weekday, 6);
/// assert_eq!(rest, " UTC");
/// ```
pub fn parse<'t>(
    text: &'t str,
    pattern: &str,
) -> Result<(BrokenDownTime, &'t str), ParseError> {
    parse_with(&EN_US, text, pattern)
}

/// [`parse`] with an explicit locale.
pub fn parse_with<'t>(
    locale: &Locale,
    text: &'t str,
    pattern: &str,
) -> Result<(BrokenDownTime, &'t str), ParseError> {
    let mut tm = BrokenDownTime::default();
    let consumed = parse_into_with(locale, text, pattern, &mut tm)?;
    Ok((tm, text.get(consumed..).unwrap_or("")))
}

/// Parse into existing fields, leaving anything the pattern does not mention untouched.
///
/// Returns the number of bytes consumed. On error `tm` may be partially updated.
pub fn parse_into(
    text: &str,
    pattern: &str,
    tm: &mut BrokenDownTime,
) -> Result<usize, ParseError> {
    parse_into_with(&EN_US, text, pattern, tm)
}

fn parse_into_with(
    locale: &Locale,
    text: &str,
    pattern: &str,
    tm: &mut BrokenDownTime,
) -> Result<usize, ParseError> {
    let mut matcher = Matcher {
        text: text.as_bytes(),
        pos: 0,
        locale,
        saw_weekday: false,
        saw_year_day: false,
        saw_month: false,
        saw_day: false,
    };
    matcher.run(pattern, tm, 0)?;

    if matcher.saw_year_day && !matcher.saw_month && !matcher.saw_day {
        let ordinal = u32::try_from(tm.year_day + 1).ok();
        if let Some(date) = ordinal.and_then(|o| NaiveDate::from_yo_opt(tm.full_year(), o)) {
            tm.month = date.month0() as i32;
            tm.day = date.day() as i32;
        }
    }

    if !matcher.saw_weekday {
        let year_day = tm.year_day;
        tm.normalize();
        if matcher.saw_year_day {
            tm.year_day = year_day;
        }
    }
    Ok(matcher.pos)
}

struct Matcher<'a> {
    text: &'a [u8],
    pos: usize,
    locale: &'a Locale,
    saw_weekday: bool,
    saw_year_day: bool,
    saw_month: bool,
    saw_day: bool,
}

impl Matcher<'_> {
    fn run(
        &mut self,
        pattern: &str,
        tm: &mut BrokenDownTime,
        depth: usize,
    ) -> Result<(), ParseError> {
        let mut chars = pattern.chars();
        while let Some(c) = chars.next() {
            if self.at_end() {
                return Ok(());
            }
            if c.is_whitespace() {
                self.skip_whitespace();
                continue;
            }
            if c != '%' {
                self.literal(c)?;
                continue;
            }
            match chars.next() {
                None | Some('%') => self.literal('%')?,
                Some(directive) => self.directive(directive, tm, depth)?,
            }
        }
        Ok(())
    }

    fn directive(
        &mut self,
        d: char,
        tm: &mut BrokenDownTime,
        depth: usize,
    ) -> Result<(), ParseError> {
        match d {
            'n' | 't' => self.skip_whitespace(),
            'a' | 'A' => {
                let names = self.locale.weekday_names;
                let abbrev = self.locale.abbrev_weekday_names;
                tm.weekday = self.name(d, &names, &abbrev)? as i32;
                self.saw_weekday = true;
            }
            'b' | 'B' | 'h' => {
                let names = self.locale.month_names;
                let abbrev = self.locale.abbrev_month_names;
                tm.month = self.name(d, &names, &abbrev)? as i32;
                self.saw_month = true;
            }
            'd' => {
                tm.day = self.number(d, 2, 1..=31)?;
                self.saw_day = true;
            }
            'e' => {
                self.skip_spaces();
                tm.day = self.number(d, 2, 1..=31)?;
                self.saw_day = true;
            }
            'H' => tm.hour = self.number(d, 2, 0..=23)?,
            'k' => {
                self.skip_spaces();
                tm.hour = self.number(d, 2, 0..=23)?;
            }
            'I' => tm.hour = self.number(d, 2, 1..=12)?,
            'l' => {
                self.skip_spaces();
                tm.hour = self.number(d, 2, 1..=12)?;
            }
            'j' => {
                tm.year_day = self.number(d, 3, 1..=366)? - 1;
                self.saw_year_day = true;
            }
            'm' => {
                tm.month = self.number(d, 2, 1..=12)? - 1;
                self.saw_month = true;
            }
            'M' => {
                if !self.at_field_end() {
                    tm.minute = self.number(d, 2, 0..=59)?;
                }
            }
            'S' => {
                if !self.at_field_end() {
                    tm.second = self.number(d, 2, 0..=59)?;
                }
            }
            'p' => self.meridiem(tm)?,
            'y' => {
                if !self.at_field_end() {
                    let yy = self.number(d, 2, 0..=99)?;
                    tm.year = if yy < 69 { yy + 100 } else { yy };
                }
            }
            'Y' => {
                if !self.at_field_end() {
                    tm.year = self.number(d, 4, 1900..=9999)? - 1900;
                }
            }
            'z' => tm.tz_offset_minutes = self.numeric_offset(d)?,
            'Z' => tm.tz_offset_minutes = self.zone()?,
            other => match self.locale.expansion(other) {
                Some(_) if depth >= MAX_DEPTH => {
                    return Err(self.error(ParseErrorKind::RecursionLimit));
                }
                Some(sub) => self.run(sub, tm, depth + 1)?,
                None => {
                    self.literal('%')?;
                    self.literal(other)?;
                }
            },
        }
        Ok(())
    }

    fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn peek(&self) -> Option<u8> {
        self.text.get(self.pos).copied()
    }

    /// Minute, second and year fields may be left off at the end of a word.
    fn at_field_end(&self) -> bool {
        self.peek().map_or(true, |b| b.is_ascii_whitespace())
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn skip_spaces(&mut self) {
        while self.peek() == Some(b' ') {
            self.pos += 1;
        }
    }

    fn error(&self, reason: ParseErrorKind) -> ParseError {
        ParseError {
            position: self.pos,
            reason,
        }
    }

    fn literal(&mut self, expected: char) -> Result<(), ParseError> {
        let mut utf8 = [0u8; 4];
        let want = expected.encode_utf8(&mut utf8).as_bytes();
        if self.text[self.pos..].starts_with(want) {
            self.pos += want.len();
            Ok(())
        } else {
            Err(self.error(ParseErrorKind::LiteralMismatch { expected }))
        }
    }

    fn number(
        &mut self,
        directive: char,
        max_digits: usize,
        range: RangeInclusive<i32>,
    ) -> Result<i32, ParseError> {
        let start = self.pos;
        let mut value = 0i32;
        while self.pos - start < max_digits {
            match self.peek() {
                Some(b) if b.is_ascii_digit() => {
                    value = value * 10 + i32::from(b - b'0');
                    self.pos += 1;
                }
                _ => break,
            }
        }
        if self.pos == start {
            return Err(self.error(ParseErrorKind::ExpectedNumber { directive }));
        }
        if !range.contains(&value) {
            return Err(ParseError {
                position: start,
                reason: ParseErrorKind::OutOfRange { directive, value },
            });
        }
        Ok(value)
    }

    fn starts_with_ignore_case(&self, word: &str) -> bool {
        let rest = &self.text[self.pos..];
        rest.len() >= word.len() && rest[..word.len()].eq_ignore_ascii_case(word.as_bytes())
    }

    /// Index of the first entry whose full or abbreviated name prefixes the text.
    fn name(
        &mut self,
        directive: char,
        full: &[&'static str],
        abbrev: &[&'static str],
    ) -> Result<usize, ParseError> {
        for (index, (long, short)) in full.iter().zip(abbrev).enumerate() {
            for word in [long, short] {
                if self.starts_with_ignore_case(word) {
                    self.pos += word.len();
                    return Ok(index);
                }
            }
        }
        Err(self.error(ParseErrorKind::UnknownName { directive }))
    }

    fn meridiem(&mut self, tm: &mut BrokenDownTime) -> Result<(), ParseError> {
        let (am, pm) = (self.locale.am, self.locale.pm);
        let is_pm = if self.starts_with_ignore_case(am) {
            self.pos += am.len();
            false
        } else if self.starts_with_ignore_case(pm) {
            self.pos += pm.len();
            true
        } else {
            return Err(self.error(ParseErrorKind::UnknownName { directive: 'p' }));
        };
        if tm.hour > 12 {
            return Err(self.error(ParseErrorKind::OutOfRange {
                directive: 'p',
                value: tm.hour,
            }));
        }
        match (is_pm, tm.hour) {
            (false, 12) => tm.hour = 0,
            (true, h) if h != 12 => tm.hour = h + 12,
            _ => {}
        }
        Ok(())
    }

    /// `+hhmm` or `-hhmm`.
    fn numeric_offset(&mut self, directive: char) -> Result<i32, ParseError> {
        let sign = match self.peek() {
            Some(b'+') => 1,
            Some(b'-') => -1,
            _ => return Err(self.error(ParseErrorKind::ExpectedNumber { directive })),
        };
        self.pos += 1;
        let start = self.pos;
        let hhmm = self.number(directive, 4, 0..=9999)?;
        if self.pos - start != 4 || hhmm % 100 >= 60 {
            return Err(ParseError {
                position: start,
                reason: ParseErrorKind::OutOfRange {
                    directive,
                    value: hhmm,
                },
            });
        }
        Ok(sign * (hhmm / 100 * 60 + hhmm % 100))
    }

    fn zone(&mut self) -> Result<i32, ParseError> {
        for (name, offset) in self.locale.zones {
            if self.starts_with_ignore_case(name) {
                self.pos += name.len();
                return Ok(*offset);
            }
        }
        match self.peek() {
            Some(b'+' | b'-') => self.numeric_offset('Z'),
            _ => Err(self.error(ParseErrorKind::UnknownName { directive: 'Z' })),
        }
    }
}
