// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Conversions between Unix seconds and the 32-bit NTP timestamp, plus the
//! four-timestamp offset and delay formulas.
//!
//! The RTC keeps whole Unix seconds, so every conversion here works on `i64`
//! seconds. Wire timestamps only carry 32 bits of seconds and must be placed
//! in an era before they can be subtracted; [`resolve_ntp_seconds`] does that
//! relative to a pivot close to "now".

use crate::protocol::TimestampFormat;
use std::time;

/// Seconds between the NTP prime epoch (1900-01-01) and the Unix epoch.
pub const EPOCH_DELTA: i64 = 2_208_988_800;

/// Length of one wrap of the 32-bit seconds field. The first wrap lands on 2036-02-07.
pub const ERA_SECONDS: i64 = 4_294_967_296;

/// Current Unix time in whole seconds, from `std::time::SystemTime`.
///
/// Times before the Unix epoch come back negative.
pub fn now_unix() -> i64 {
    match time::SystemTime::now().duration_since(time::UNIX_EPOCH) {
        Ok(since) => since.as_secs() as i64,
        Err(before) => -(before.duration().as_secs() as i64),
    }
}

/// Unix seconds to the 32-bit NTP seconds field. Era information is dropped.
pub fn to_ntp_seconds(unix_secs: i64) -> u32 {
    (unix_secs + EPOCH_DELTA) as u32
}

/// Unix seconds to a wire timestamp with a zero fraction.
pub fn to_timestamp(unix_secs: i64) -> TimestampFormat {
    TimestampFormat {
        seconds: to_ntp_seconds(unix_secs),
        fraction: 0,
    }
}

/// Unwrap a 32-bit seconds field into absolute seconds since 1900, picking the wrap that lands
/// nearest `pivot_unix`.
///
/// Only correct while the true time is within 2^31 s (about 68 years) of the pivot.
pub fn resolve_ntp_seconds(raw_seconds: u32, pivot_unix: i64) -> i64 {
    let raw = i64::from(raw_seconds);
    let pivot_ntp = pivot_unix + EPOCH_DELTA;
    let era = (pivot_ntp - raw + ERA_SECONDS / 2).div_euclid(ERA_SECONDS);
    era * ERA_SECONDS + raw
}

/// Wire timestamp to Unix seconds, resolving the era against `pivot_unix`.
pub fn timestamp_to_unix(ts: TimestampFormat, pivot_unix: i64) -> i64 {
    resolve_ntp_seconds(ts.seconds, pivot_unix) - EPOCH_DELTA
}

/// Clock offset `((t2 - t1) + (t3 - t4)) / 2` in whole seconds.
///
/// - t1 = origin timestamp (client transmit time)
/// - t2 = receive timestamp (server receive time)
/// - t3 = transmit timestamp (server transmit time)
/// - t4 = destination timestamp (client receive time)
///
/// All four values must be in the same epoch. The arithmetic is signed 64-bit so
/// a local clock running ahead of the server yields a small negative offset. The
/// division truncates toward zero.
pub fn offset_seconds(t1: i64, t2: i64, t3: i64, t4: i64) -> i64 {
    ((t2 - t1) + (t3 - t4)) / 2
}

/// Round-trip delay `(t4 - t1) - (t3 - t2)` in whole seconds.
pub fn delay_seconds(t1: i64, t2: i64, t3: i64, t4: i64) -> i64 {
    (t4 - t1) - (t3 - t2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_wrap_timestamp_to_unix() {
        // 2024-01-01T00:00:00Z
        let ts = TimestampFormat {
            seconds: 3_913_056_000,
            fraction: 0,
        };
        assert_eq!(timestamp_to_unix(ts, 1_704_067_200), 1_704_067_200);
    }

    #[test]
    fn to_timestamp_adds_epoch_delta() {
        let ts = to_timestamp(1_704_067_200);
        assert_eq!(ts.seconds, 3_913_056_000);
        assert_eq!(ts.fraction, 0);
    }

    #[test]
    fn small_seconds_just_after_2036_wrap() {
        // Device clock reads 2036-01-01, server answers a few weeks past the wrap.
        let pivot = 2_082_758_400;
        let ts = TimestampFormat {
            seconds: 1000,
            fraction: 0,
        };
        assert_eq!(timestamp_to_unix(ts, pivot), ERA_SECONDS + 1000 - EPOCH_DELTA);
    }

    #[test]
    fn large_seconds_just_before_2036_wrap() {
        // Device clock already past the wrap, server still just before it.
        let pivot = 2_087_942_400;
        assert_eq!(resolve_ntp_seconds(u32::MAX, pivot), u32::MAX as i64);
    }

    #[test]
    fn offset_four_timestamps() {
        assert_eq!(offset_seconds(1000, 1005, 1006, 1002), 4);
        assert_eq!(delay_seconds(1000, 1005, 1006, 1002), 1);
    }

    #[test]
    fn offset_negative_when_local_clock_ahead() {
        // Local clock 100 s ahead of the server, zero network delay.
        let server = 3_913_056_000i64;
        let t1 = server + 100;
        let t2 = server;
        let t3 = server;
        let t4 = server + 100;
        assert_eq!(offset_seconds(t1, t2, t3, t4), -100);
    }

    #[test]
    fn offset_truncates_toward_zero() {
        assert_eq!(offset_seconds(0, 1, 1, 1), 0);
        assert_eq!(offset_seconds(0, 0, 0, 3), -1);
    }

    #[test]
    fn now_unix_is_after_2020() {
        assert!(now_unix() > 1_577_836_800);
    }
}
