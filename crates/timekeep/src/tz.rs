// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Timezone offset and daylight saving state.
//!
//! The offset lives in one battery-backed register as a [`TimezoneRecord`]:
//! the offset in the low 16 bits and its negation in the high 16 bits, so a
//! register that lost its contents reads as invalid rather than as a bogus
//! offset. DST is either a manual flag or a [`DstRule`] evaluated against the
//! current date on every local-time request.

use log::{debug, info, warn};
use std::fmt;
use std::str::FromStr;

use crate::codec::BrokenDownTime;

/// Largest accepted offset magnitude in minutes (12 hours).
pub const MAX_OFFSET_MINUTES: i32 = 720;

/// Minutes in the 31-day month used by the DST ordering key.
const MINUTES_PER_MONTH: i64 = 31 * 24 * 60;

/// A timezone offset with its integrity complement.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct TimezoneRecord {
    /// Minutes east of UTC.
    pub offset: i16,
    /// Must equal `offset` negated, modulo 2^16.
    pub complement: u16,
}

impl TimezoneRecord {
    /// A valid record, or `None` when `minutes` is outside ±720.
    pub fn new(minutes: i32) -> Option<Self> {
        if !(-MAX_OFFSET_MINUTES..=MAX_OFFSET_MINUTES).contains(&minutes) {
            return None;
        }
        let offset = minutes as i16;
        Some(TimezoneRecord {
            offset,
            complement: (offset as u16).wrapping_neg(),
        })
    }

    /// Register layout: complement in bits 16..31, offset in bits 0..15.
    pub fn pack(&self) -> u32 {
        (u32::from(self.complement) << 16) | u32::from(self.offset as u16)
    }

    /// Split a register value. The result may be invalid.
    pub fn unpack(raw: u32) -> Self {
        TimezoneRecord {
            offset: raw as u16 as i16,
            complement: (raw >> 16) as u16,
        }
    }

    /// The complement matches and the offset is in range.
    pub fn is_valid(&self) -> bool {
        (self.offset as u16).wrapping_add(self.complement) == 0
            && i32::from(self.offset).abs() <= MAX_OFFSET_MINUTES
    }

    /// The offset in minutes, or 0 when the record is invalid.
    pub fn offset(&self) -> i32 {
        if self.is_valid() {
            i32::from(self.offset)
        } else {
            0
        }
    }
}

/// A DST boundary, "MM/DD,hh:mm".
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct DstEvent {
    /// 1-12.
    pub month: u8,
    /// 1-31.
    pub day: u8,
    /// 0-23.
    pub hour: u8,
    /// 0-59.
    pub minute: u8,
}

/// A DST boundary string did not match "MM/DD,hh:mm" with fields in range.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DstEventError {
    /// The rejected text.
    pub input: String,
}

impl fmt::Display for DstEventError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid DST event {:?}, expected MM/DD,hh:mm", self.input)
    }
}

impl std::error::Error for DstEventError {}

impl DstEvent {
    /// Ordering key assuming every month has 31 days.
    ///
    /// Only meaningful for comparing two instants in the same year.
    pub fn minutes_since_january(&self) -> i64 {
        minutes_since_january(
            i64::from(self.month),
            i64::from(self.day),
            i64::from(self.hour),
            i64::from(self.minute),
        )
    }
}

impl fmt::Display for DstEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}/{:02},{:02}:{:02}",
            self.month, self.day, self.hour, self.minute
        )
    }
}

impl FromStr for DstEvent {
    type Err = DstEventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || DstEventError {
            input: s.to_owned(),
        };
        let field = |text: &str, max: u8, min: u8| -> Result<u8, DstEventError> {
            let text = text.trim();
            if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
                return Err(err());
            }
            match text.parse::<u8>() {
                Ok(v) if (min..=max).contains(&v) => Ok(v),
                _ => Err(err()),
            }
        };
        let (month, rest) = s.split_once('/').ok_or_else(err)?;
        let (day, rest) = rest.split_once(',').ok_or_else(err)?;
        let (hour, minute) = rest.split_once(':').ok_or_else(err)?;
        Ok(DstEvent {
            month: field(month, 12, 1)?,
            day: field(day, 31, 1)?,
            hour: field(hour, 23, 0)?,
            minute: field(minute, 59, 0)?,
        })
    }
}

fn minutes_since_january(month: i64, day: i64, hour: i64, minute: i64) -> i64 {
    month * MINUTES_PER_MONTH + day * 1440 + hour * 60 + minute
}

/// When daylight saving starts and stops, in local standard time.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct DstRule {
    /// First minute of DST.
    pub start: DstEvent,
    /// First minute after DST.
    pub stop: DstEvent,
}

impl DstRule {
    /// Parse both boundaries; either failing rejects the pair.
    pub fn parse(start: &str, stop: &str) -> Result<Self, DstEventError> {
        Ok(DstRule {
            start: start.parse()?,
            stop: stop.parse()?,
        })
    }

    /// `start <= now < stop` on the 31-day-month key, with both boundaries shifted by the
    /// zone offset.
    pub fn contains(&self, now: &BrokenDownTime, tz_offset_minutes: i32) -> bool {
        let now = minutes_since_january(
            i64::from(now.month) + 1,
            i64::from(now.day),
            i64::from(now.hour),
            i64::from(now.minute),
        );
        let tzo = i64::from(tz_offset_minutes);
        let start = self.start.minutes_since_january() + tzo;
        let stop = self.stop.minutes_since_january() + tzo;
        start <= now && now < stop
    }
}

/// Timezone offset, manual DST flag and optional DST rule.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TimeZoneStore {
    record: TimezoneRecord,
    dst: bool,
    rule: Option<DstRule>,
}

impl TimeZoneStore {
    /// A store with zero offset, DST off and no rule.
    pub fn new() -> Self {
        TimeZoneStore::default()
    }

    /// Restore from the timezone register. A corrupt value reads as offset 0.
    pub fn from_register(raw: u32) -> Self {
        let record = TimezoneRecord::unpack(raw);
        if !record.is_valid() && raw != 0 {
            warn!("timezone register {:#010x} failed its integrity check", raw);
        }
        TimeZoneStore {
            record,
            ..TimeZoneStore::default()
        }
    }

    /// Accept `minutes` in -720..=720. Anything else is ignored and returns `false`.
    pub fn set_offset(&mut self, minutes: i32) -> bool {
        match TimezoneRecord::new(minutes) {
            Some(record) => {
                self.record = record;
                info!("set_tzo_min({})", minutes);
                true
            }
            None => {
                warn!("set_tzo_min({}) out of range, ignored", minutes);
                false
            }
        }
    }

    /// The current offset in minutes east of UTC; 0 if the record is corrupt.
    pub fn get_offset(&self) -> i32 {
        self.record.offset()
    }

    /// The stored record, as it belongs in the timezone register.
    pub fn record(&self) -> TimezoneRecord {
        self.record
    }

    /// Set the manual DST flag.
    pub fn set_dst(&mut self, dst: bool) {
        self.dst = dst;
    }

    /// The manual DST flag, as last set or last refreshed from the rule.
    pub fn get_dst(&self) -> bool {
        self.dst
    }

    /// Install a rule from two "MM/DD,hh:mm" strings.
    ///
    /// If either string is malformed the previous rule is kept and `false` is returned.
    pub fn set_dst_rule(&mut self, start: &str, stop: &str) -> bool {
        match DstRule::parse(start, stop) {
            Ok(rule) => {
                info!("set_dst from ({}, {})", rule.start, rule.stop);
                self.rule = Some(rule);
                true
            }
            Err(e) => {
                warn!("failed to set_dst from ({}, {}): {}", start, stop, e);
                false
            }
        }
    }

    /// Drop the rule; the manual flag stays as it is.
    pub fn clear_dst_rule(&mut self) {
        self.rule = None;
    }

    /// The configured rule.
    pub fn dst_rule(&self) -> Option<&DstRule> {
        self.rule.as_ref()
    }

    /// Whether DST applies at `now` (a UTC broken-down time).
    ///
    /// With a rule this evaluates the rule; without one it is the manual flag.
    pub fn is_dst_active(&self, now: &BrokenDownTime) -> bool {
        match &self.rule {
            Some(rule) => rule.contains(now, self.get_offset()),
            None => self.dst,
        }
    }

    /// Evaluate the rule at `now` and record the answer in the manual flag.
    pub fn refresh_dst(&mut self, now: &BrokenDownTime) -> bool {
        if self.rule.is_some() {
            let active = self.is_dst_active(now);
            if active != self.dst {
                debug!("DST now {}", if active { "active" } else { "inactive" });
            }
            self.dst = active;
        }
        self.dst
    }

    /// Local seconds for `utc`: offset plus one hour when `dst`.
    pub fn local_seconds(&self, utc: i64, dst: bool) -> i64 {
        utc + i64::from(self.get_offset()) * 60 + if dst { 3600 } else { 0 }
    }

    /// Inverse of [`local_seconds`](Self::local_seconds).
    pub fn utc_seconds(&self, local: i64, dst: bool) -> i64 {
        local - i64::from(self.get_offset()) * 60 - if dst { 3600 } else { 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(month: i32, day: i32, hour: i32, minute: i32) -> BrokenDownTime {
        BrokenDownTime {
            month: month - 1,
            day,
            hour,
            minute,
            year: 126,
            ..BrokenDownTime::default()
        }
    }

    #[test]
    fn record_packing() {
        let record = TimezoneRecord::new(-300).unwrap();
        assert_eq!(record.pack(), 0x012C_FED4);
        assert_eq!(TimezoneRecord::unpack(0x012C_FED4), record);
        assert!(record.is_valid());
        assert_eq!(record.offset(), -300);
    }

    #[test]
    fn corrupted_record_reads_zero() {
        let record = TimezoneRecord::unpack(0x012C_FED5);
        assert!(!record.is_valid());
        assert_eq!(record.offset(), 0);
        // Checksum holds but the value is out of range.
        let wide = TimezoneRecord::unpack((u32::from(1000u16.wrapping_neg()) << 16) | 1000);
        assert!(!wide.is_valid());
    }

    #[test]
    fn set_offset_range() {
        let mut tz = TimeZoneStore::new();
        assert!(tz.set_offset(720));
        assert!(tz.set_offset(-720));
        assert!(!tz.set_offset(721));
        assert_eq!(tz.get_offset(), -720);
        assert!(!tz.set_offset(-1000));
        assert_eq!(tz.get_offset(), -720);
    }

    #[test]
    fn from_register_round_trip() {
        let mut tz = TimeZoneStore::new();
        tz.set_offset(330);
        let restored = TimeZoneStore::from_register(tz.record().pack());
        assert_eq!(restored.get_offset(), 330);
        assert_eq!(TimeZoneStore::from_register(0xDEAD_BEEF).get_offset(), 0);
    }

    #[test]
    fn dst_event_parse() {
        let ev: DstEvent = "03/10,02:00".parse().unwrap();
        assert_eq!(
            ev,
            DstEvent {
                month: 3,
                day: 10,
                hour: 2,
                minute: 0
            }
        );
        assert_eq!(ev.to_string(), "03/10,02:00");
        assert_eq!(ev.minutes_since_january(), 3 * 44640 + 10 * 1440 + 120);
        assert!("3/1,0:0".parse::<DstEvent>().is_ok());
    }

    #[test]
    fn dst_event_rejects_malformed() {
        for bad in [
            "13/01,00:00",
            "00/01,00:00",
            "03-10,02:00",
            "03/32,02:00",
            "03/10 02:00",
            "03/10,24:00",
            "03/10,02:60",
            "03/10,02:",
            "aa/10,02:00",
            "",
        ] {
            assert!(bad.parse::<DstEvent>().is_err(), "{bad:?} accepted");
        }
    }

    #[test]
    fn malformed_rule_keeps_previous() {
        let mut tz = TimeZoneStore::new();
        assert!(tz.set_dst_rule("03/10,02:00", "11/03,02:00"));
        let before = *tz.dst_rule().unwrap();
        assert!(!tz.set_dst_rule("13/10,02:00", "11/03,02:00"));
        assert!(!tz.set_dst_rule("03/10,02:00", "1103,02:00"));
        assert_eq!(tz.dst_rule(), Some(&before));
    }

    #[test]
    fn rule_is_half_open() {
        let mut tz = TimeZoneStore::new();
        tz.set_dst_rule("03/10,02:00", "11/03,02:00");
        assert!(!tz.is_dst_active(&at(3, 10, 1, 59)));
        assert!(tz.is_dst_active(&at(3, 10, 2, 0)));
        assert!(tz.is_dst_active(&at(7, 4, 12, 0)));
        assert!(tz.is_dst_active(&at(11, 3, 1, 59)));
        assert!(!tz.is_dst_active(&at(11, 3, 2, 0)));
        assert!(!tz.is_dst_active(&at(12, 25, 0, 0)));
    }

    #[test]
    fn rule_boundaries_shift_by_offset() {
        let mut tz = TimeZoneStore::new();
        tz.set_offset(-300);
        tz.set_dst_rule("03/10,07:00", "11/03,07:00");
        // 07:00 shifted by -300 minutes puts both boundaries at 02:00.
        assert!(tz.is_dst_active(&at(3, 10, 2, 0)));
        assert!(!tz.is_dst_active(&at(3, 10, 1, 59)));
    }

    #[test]
    fn manual_flag_without_rule() {
        let mut tz = TimeZoneStore::new();
        assert!(!tz.is_dst_active(&at(7, 1, 0, 0)));
        tz.set_dst(true);
        assert!(tz.is_dst_active(&at(1, 1, 0, 0)));
        assert!(tz.get_dst());
    }

    #[test]
    fn refresh_records_rule_result() {
        let mut tz = TimeZoneStore::new();
        tz.set_dst(true);
        assert!(tz.refresh_dst(&at(1, 1, 0, 0)));
        tz.set_dst_rule("03/10,02:00", "11/03,02:00");
        assert!(!tz.refresh_dst(&at(1, 1, 0, 0)));
        assert!(!tz.get_dst());
        assert!(tz.refresh_dst(&at(6, 1, 0, 0)));
        tz.clear_dst_rule();
        assert!(tz.get_dst());
    }

    #[test]
    fn local_and_utc_are_inverse() {
        let mut tz = TimeZoneStore::new();
        tz.set_offset(-480);
        assert_eq!(tz.local_seconds(100_000, false), 100_000 - 480 * 60);
        assert_eq!(tz.local_seconds(100_000, true), 100_000 - 480 * 60 + 3600);
        assert_eq!(tz.utc_seconds(tz.local_seconds(100_000, true), true), 100_000);
    }
}
