// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

/*!
Device time-keeping: a battery-backed real-time clock with timezone and
daylight saving handling, drift calibration, one-shot SNTP synchronization and
strftime/strptime-style text conversion.

Everything hangs off [`TimeService`], which owns the clock and its settings.
Clock hardware is abstracted by [`rtc::RtcDevice`] and the network by
[`ntp::NetworkInterface`], so both can be replaced by test doubles.

# Example

```rust,no_run
use std::time::Duration;
use timekeep::ntp::StdNetwork;
use timekeep::rtc::SystemRtc;
use timekeep::TimeService;

fn main() -> std::io::Result<()> {
    let mut clock = TimeService::builder(SystemRtc::open("/var/lib/timekeep/rtc.bin")?)
        .network(StdNetwork)
        .server("pool.ntp.org")
        .timeout(Duration::from_secs(2))
        .timezone_offset(-300)
        .dst_rule("03/10,02:00", "11/03,02:00")
        .build();

    let result = clock.sync()?;
    println!("stepped by {} s (stratum {})", result.offset_seconds, result.stratum.0);
    println!("{}", clock.format_now("%a %b %e %H:%M:%S %Z %Y").unwrap_or_default());
    Ok(())
}
```
*/

#![warn(missing_docs)]

// Re-export wire types and epoch arithmetic from timekeep_proto for convenience.
pub use timekeep_proto::{protocol, unix_time};

/// Error types for synchronization, parsing and the facade.
pub mod error;

/// RTC device abstraction, backends and the UTC get/set contract.
pub mod rtc;

/// Timezone offset record and daylight saving rules.
pub mod tz;

/// Oscillator drift calibration.
pub mod calibration;

/// One-shot SNTP client and its network seam.
pub mod ntp;

/// Broken-down time, strftime-style formatting and parsing.
pub mod codec;

pub mod calendar;

/// The facade composing clock, zone, calibration and sync.
pub mod service;

/// Shared, lock-guarded access to a [`TimeService`].
pub mod handle;

pub use calendar::MonthGrid;
pub use codec::{asctime, ctime, difftime, format, parse, BrokenDownTime};
pub use error::{NtpError, ParseError, TimeError};
pub use handle::TimeHandle;
pub use ntp::{NtpClient, NtpResult};
pub use rtc::{RtcClock, RtcDevice};
pub use service::{SyncConfig, TimeService, TimeServiceBuilder};
pub use tz::TimeZoneStore;
