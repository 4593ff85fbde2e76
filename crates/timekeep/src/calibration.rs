// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Oscillator drift calibration.
//!
//! The RTC corrects its counter by one second every `|factor|` seconds, in the
//! direction of the factor's sign. [`ClockCalibration::adjust`] derives that
//! factor from a single observed error: how far the clock has drifted since it
//! was last set.

use log::{debug, info, warn};

use crate::rtc::{Register, RtcClock, RtcDevice};

/// Factors must stay strictly below this magnitude (17-bit counter).
pub const CALIBRATION_LIMIT: i32 = 131_071;

const SECONDS_PER_DAY: f64 = 86_400.0;

const MAGNITUDE_MASK: u32 = 0x1_FFFF;
const DIRECTION_BIT: u32 = 0x2_0000;
const VALUE_MASK: u32 = MAGNITUDE_MASK | DIRECTION_BIT;

/// Control byte: calibration running.
pub const CONTROL_ENABLED: u8 = 0x01;
/// Control byte: calibration stopped.
pub const CONTROL_DISABLED: u8 = 0x11;

/// The calibration register: control byte and sign-magnitude factor.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct CalibrationRecord {
    /// [`CONTROL_ENABLED`] or [`CONTROL_DISABLED`].
    pub control: u8,
    /// Seconds between single-second corrections; negative slows the clock.
    pub factor: i32,
}

impl CalibrationRecord {
    /// Record for `factor`, disabled when it is 0.
    pub fn new(factor: i32) -> Self {
        CalibrationRecord {
            control: if factor == 0 {
                CONTROL_DISABLED
            } else {
                CONTROL_ENABLED
            },
            factor,
        }
    }

    /// Control byte in bits 24..31, direction in bit 17, magnitude in bits 0..16.
    pub fn pack(&self) -> u32 {
        let magnitude = self.factor.unsigned_abs() & MAGNITUDE_MASK;
        let value = if self.factor < 0 {
            magnitude | DIRECTION_BIT
        } else {
            magnitude
        };
        (u32::from(self.control) << 24) | value
    }

    /// Decode a register value.
    pub fn unpack(raw: u32) -> Self {
        let value = raw & VALUE_MASK;
        let factor = if value & DIRECTION_BIT != 0 {
            -((value & MAGNITUDE_MASK) as i32)
        } else {
            value as i32
        };
        CalibrationRecord {
            control: (raw >> 24) as u8,
            factor,
        }
    }

    /// Calibration is running with a non-zero factor.
    pub fn is_enabled(&self) -> bool {
        self.control & 0x10 == 0 && self.control & CONTROL_ENABLED != 0 && self.factor != 0
    }
}

/// `round(86400 / (delta / (elapsed / 86400)))`, or `None` when the inputs are degenerate or
/// the factor reaches [`CALIBRATION_LIMIT`].
///
/// A drift too large to spread over whole seconds rounds to 0, which stores as "no calibration".
///
/// ```
/// use timekeep::calibration::calibration_factor;
///
/// // Ten seconds slow after two days: one extra second every 17280 seconds.
/// assert_eq!(calibration_factor(10, 2 * 86_400), Some(17_280));
/// // One second over three days is too little drift to express.
/// assert_eq!(calibration_factor(1, 3 * 86_400), None);
/// ```
pub fn calibration_factor(delta_seconds: i32, elapsed_seconds: i64) -> Option<i32> {
    if delta_seconds == 0 || elapsed_seconds == 0 {
        return None;
    }
    let elapsed_days = elapsed_seconds as f64 / SECONDS_PER_DAY;
    let error_per_day = f64::from(delta_seconds) / elapsed_days;
    let factor = (SECONDS_PER_DAY / error_per_day).round();
    if !factor.is_finite() || factor.abs() >= f64::from(CALIBRATION_LIMIT) {
        return None;
    }
    Some(factor as i32)
}

/// Drift calibration over a borrowed clock.
pub struct ClockCalibration<'a, D> {
    rtc: &'a mut RtcClock<D>,
}

impl<'a, D: RtcDevice> ClockCalibration<'a, D> {
    /// Calibrate `rtc`.
    pub fn new(rtc: &'a mut RtcClock<D>) -> Self {
        ClockCalibration { rtc }
    }

    /// The stored record.
    pub fn record(&self) -> CalibrationRecord {
        CalibrationRecord::unpack(self.rtc.register(Register::Calibration))
    }

    /// The stored factor; 0 means no calibration.
    pub fn factor(&self) -> i32 {
        self.record().factor
    }

    /// Store `factor`, 0 disabling calibration. Out-of-range factors are refused.
    pub fn set_factor(&mut self, factor: i32) -> bool {
        if factor.abs() >= CALIBRATION_LIMIT {
            warn!("calibration factor {} out of range, ignored", factor);
            return false;
        }
        let record = CalibrationRecord::new(factor);
        self.rtc.store_register(Register::Calibration, record.pack());
        info!("set_cal({}) control={:#04x}", factor, record.control);
        true
    }

    /// UTC seconds of the last explicit set.
    pub fn last_set(&self) -> Option<i64> {
        self.rtc.get_last_set()
    }

    /// Correct the clock by `delta_seconds` and derive a drift factor from it.
    ///
    /// Fails without touching anything when the clock was never set, `delta_seconds` is 0 or no
    /// time has passed since the last set. Otherwise the clock is moved (which also restarts
    /// the last-set baseline) and the factor stored. A factor that rounds to 0 disables
    /// calibration. `false` then means the factor was out of range and only the time was
    /// corrected.
    pub fn adjust(&mut self, delta_seconds: i32) -> bool {
        let Some(last_set) = self.rtc.get_last_set() else {
            debug!("adjust_sec({}): clock never set", delta_seconds);
            return false;
        };
        let now = self.rtc.get();
        let elapsed = now - last_set;
        if delta_seconds == 0 || elapsed == 0 {
            debug!(
                "adjust_sec({}): nothing to calibrate over {} s",
                delta_seconds, elapsed
            );
            return false;
        }

        self.rtc.set(now + i64::from(delta_seconds), 0);
        match calibration_factor(delta_seconds, elapsed) {
            Some(factor) => self.set_factor(factor),
            None => {
                warn!(
                    "adjust_sec({}) over {} s exceeds the calibration range, factor unchanged",
                    delta_seconds, elapsed
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rtc::ManualRtc;

    #[test]
    fn record_packing() {
        let pos = CalibrationRecord::new(17_280);
        assert_eq!(pos.pack(), 0x0100_4380);
        assert!(pos.is_enabled());

        let neg = CalibrationRecord::new(-5);
        assert_eq!(neg.pack(), 0x0102_0005);
        assert_eq!(CalibrationRecord::unpack(neg.pack()), neg);

        let off = CalibrationRecord::new(0);
        assert_eq!(off.pack(), 0x1100_0000);
        assert!(!off.is_enabled());
    }

    #[test]
    fn unpack_ignores_unused_bits() {
        let rec = CalibrationRecord::unpack(0x01FC_0007);
        assert_eq!(rec.factor, 7);
        assert_eq!(rec.control, 0x01);
    }

    #[test]
    fn factor_formula() {
        assert_eq!(calibration_factor(10, 172_800), Some(17_280));
        assert_eq!(calibration_factor(-10, 172_800), Some(-17_280));
        assert_eq!(calibration_factor(1, 86_400), Some(86_400));
        assert_eq!(calibration_factor(0, 86_400), None);
        assert_eq!(calibration_factor(5, 0), None);
        // Far more drift than one second per tick can correct.
        assert_eq!(calibration_factor(-1_000, 60), Some(0));
        // One correction every 172800 s does not fit the 17-bit counter.
        assert_eq!(calibration_factor(1, 2 * 86_400), None);
    }

    #[test]
    fn adjust_without_last_set_fails() {
        let mut rtc = RtcClock::new(ManualRtc::new(1_000_000));
        assert!(!rtc.calibration().adjust(10));
        assert_eq!(rtc.get(), 1_000_000);
        assert_eq!(rtc.register(Register::Calibration), 0);
    }

    #[test]
    fn adjust_zero_delta_or_elapsed_fails() {
        let mut rtc = RtcClock::new(ManualRtc::new(0));
        rtc.set(1_700_000_000, 0);
        assert!(!rtc.calibration().adjust(5));
        rtc.device_mut().advance(3600);
        assert!(!rtc.calibration().adjust(0));
        assert_eq!(rtc.get(), 1_700_003_600);
    }

    #[test]
    fn adjust_sets_time_and_factor() {
        let mut rtc = RtcClock::new(ManualRtc::new(0));
        rtc.set(1_700_000_000, 0);
        rtc.device_mut().advance(2 * 86_400);
        assert!(rtc.calibration().adjust(10));
        assert_eq!(rtc.get(), 1_700_000_000 + 2 * 86_400 + 10);
        assert_eq!(rtc.get_last_set(), Some(rtc.get()));
        let cal = rtc.calibration();
        assert_eq!(cal.factor(), 17_280);
        assert!(cal.record().is_enabled());
    }

    #[test]
    fn adjust_vanishing_factor_disables_calibration() {
        let mut rtc = RtcClock::new(ManualRtc::new(0));
        rtc.set(1_700_000_000, 0);
        rtc.device_mut().advance(2 * 86_400);
        assert!(rtc.calibration().adjust(10));
        assert_eq!(rtc.register(Register::Calibration), 0x0100_4380);

        rtc.device_mut().advance(60);
        let before = rtc.get();
        assert!(rtc.calibration().adjust(-1_000));
        assert_eq!(rtc.get(), before - 1_000);
        assert_eq!(rtc.register(Register::Calibration), 0x1100_0000);
        let record = rtc.calibration().record();
        assert_eq!(record.factor, 0);
        assert_eq!(record.control, CONTROL_DISABLED);
        assert!(!record.is_enabled());
    }

    #[test]
    fn adjust_out_of_range_keeps_time_correction() {
        let mut rtc = RtcClock::new(ManualRtc::new(0));
        rtc.set(1_700_000_000, 0);
        rtc.device_mut().advance(2 * 86_400);
        assert!(rtc.calibration().adjust(10));

        // One second over two days needs a 172800 s interval.
        rtc.device_mut().advance(2 * 86_400);
        let before = rtc.get();
        assert!(!rtc.calibration().adjust(1));
        assert_eq!(rtc.get(), before + 1);
        assert_eq!(rtc.get_last_set(), Some(before + 1));
        assert_eq!(rtc.calibration().factor(), 17_280);
    }

    #[test]
    fn set_factor_limits() {
        let mut rtc = RtcClock::new(ManualRtc::new(0));
        let mut cal = rtc.calibration();
        assert!(cal.set_factor(-131_070));
        assert_eq!(cal.factor(), -131_070);
        assert!(!cal.set_factor(131_071));
        assert_eq!(cal.factor(), -131_070);
        assert!(cal.set_factor(0));
        assert!(!cal.record().is_enabled());
    }
}
