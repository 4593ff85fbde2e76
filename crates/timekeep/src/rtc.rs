// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! The authoritative time source.
//!
//! An [`RtcDevice`] is a seconds counter plus a small bank of battery-backed
//! registers. [`RtcClock`] wraps a device and gives it the UTC get/set
//! contract: setting the clock also records the new value in the
//! [`Register::LastSet`] register, which drift calibration later measures
//! elapsed time against.
//!
//! Two devices ship with the crate. [`ManualRtc`] only moves when told to,
//! which makes it the test double for everything above this layer.
//! [`SystemRtc`] follows the host clock with a stored correction and can keep
//! its state in a small big-endian register file across restarts.

use byteorder::{ReadBytesExt, WriteBytesExt, BE};
use log::{debug, info, warn};
use std::fs;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};

use crate::calibration::ClockCalibration;
use crate::unix_time;

/// Battery-backed registers that survive a power cycle.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Register {
    /// Packed timezone offset with its integrity complement.
    Timezone,
    /// UTC seconds at which the clock was last explicitly set.
    LastSet,
    /// Calibration control byte and packed drift factor.
    Calibration,
}

impl Register {
    /// Every register, in storage order.
    pub const ALL: [Register; 3] = [Register::Timezone, Register::LastSet, Register::Calibration];

    fn index(self) -> usize {
        match self {
            Register::Timezone => 0,
            Register::LastSet => 1,
            Register::Calibration => 2,
        }
    }
}

/// Hardware access for a real-time clock.
///
/// Access is assumed to always succeed. A backend that can fail must log and
/// carry on; nothing above this layer retries.
pub trait RtcDevice {
    /// The counter value in UTC seconds since the Unix epoch.
    fn read_counter(&self) -> i64;

    /// Load the counter.
    fn write_counter(&mut self, seconds: i64);

    /// Read a battery-backed register.
    fn read_register(&self, register: Register) -> u32;

    /// Write a battery-backed register.
    fn write_register(&mut self, register: Register, value: u32);
}

/// Anything that can report the current UTC time in seconds.
pub trait UtcSource {
    /// Current UTC seconds since the Unix epoch.
    fn now_utc(&self) -> i64;
}

impl<F> UtcSource for F
where
    F: Fn() -> i64,
{
    fn now_utc(&self) -> i64 {
        self()
    }
}

/// An RTC that only moves when told to.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ManualRtc {
    counter: i64,
    registers: [u32; 3],
}

impl ManualRtc {
    /// A device whose counter starts at `seconds` with cleared registers.
    pub fn new(seconds: i64) -> Self {
        ManualRtc {
            counter: seconds,
            registers: [0; 3],
        }
    }

    /// Let `seconds` pass.
    pub fn advance(&mut self, seconds: i64) {
        self.counter += seconds;
    }

    /// Preload a register, e.g. to simulate corrupted backup memory.
    pub fn with_register(mut self, register: Register, value: u32) -> Self {
        self.registers[register.index()] = value;
        self
    }
}

impl RtcDevice for ManualRtc {
    fn read_counter(&self) -> i64 {
        self.counter
    }

    fn write_counter(&mut self, seconds: i64) {
        self.counter = seconds;
    }

    fn read_register(&self, register: Register) -> u32 {
        self.registers[register.index()]
    }

    fn write_register(&mut self, register: Register, value: u32) {
        self.registers[register.index()] = value;
    }
}

/// Size of the register file: counter correction (i64) then three u32 registers.
const REGISTER_FILE_LEN: usize = 8 + 4 * 3;

/// An RTC backed by the host clock.
///
/// The counter reads as host UTC plus a correction that `write_counter` adjusts, so the host
/// clock itself is never touched. With a register file attached, the correction and registers
/// are rewritten on every change.
#[derive(Clone, Debug, Default)]
pub struct SystemRtc {
    correction: i64,
    registers: [u32; 3],
    path: Option<PathBuf>,
}

impl SystemRtc {
    /// A device that follows the host clock and keeps registers in memory only.
    pub fn new() -> Self {
        SystemRtc::default()
    }

    /// A device whose correction and registers persist in `path`.
    ///
    /// A missing file starts from zeroed state and is created on the first write.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut rtc = SystemRtc {
            path: Some(path.clone()),
            ..SystemRtc::default()
        };
        match fs::read(&path) {
            Ok(bytes) => {
                if bytes.len() < REGISTER_FILE_LEN {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!(
                            "register file {} too short: {} bytes",
                            path.display(),
                            bytes.len()
                        ),
                    ));
                }
                let mut reader = Cursor::new(bytes);
                rtc.correction = reader.read_i64::<BE>()?;
                for reg in rtc.registers.iter_mut() {
                    *reg = reader.read_u32::<BE>()?;
                }
                debug!("loaded RTC registers from {}", path.display());
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("no register file at {}, starting cleared", path.display());
            }
            Err(e) => return Err(e),
        }
        Ok(rtc)
    }

    fn persist(&self) {
        let Some(path) = &self.path else {
            return;
        };
        if let Err(e) = self.write_file(path) {
            warn!("failed to persist RTC registers to {}: {}", path.display(), e);
        }
    }

    fn write_file(&self, path: &Path) -> io::Result<()> {
        let mut buf = Vec::with_capacity(REGISTER_FILE_LEN);
        buf.write_i64::<BE>(self.correction)?;
        for reg in &self.registers {
            buf.write_u32::<BE>(*reg)?;
        }
        fs::write(path, &buf)
    }
}

impl RtcDevice for SystemRtc {
    fn read_counter(&self) -> i64 {
        unix_time::now_unix() + self.correction
    }

    fn write_counter(&mut self, seconds: i64) {
        self.correction = seconds - unix_time::now_unix();
        self.persist();
    }

    fn read_register(&self, register: Register) -> u32 {
        self.registers[register.index()]
    }

    fn write_register(&mut self, register: Register, value: u32) {
        self.registers[register.index()] = value;
        self.persist();
    }
}

/// UTC get/set over an [`RtcDevice`], with last-set tracking.
#[derive(Clone, Debug, Default)]
pub struct RtcClock<D> {
    device: D,
}

impl<D: RtcDevice> RtcClock<D> {
    /// Wrap a device.
    pub fn new(device: D) -> Self {
        RtcClock { device }
    }

    /// Current UTC seconds since the Unix epoch.
    pub fn get(&self) -> i64 {
        self.device.read_counter()
    }

    /// Set the clock from a value expressed in a zone `tz_offset_minutes` east of UTC.
    ///
    /// Stores `value - tz_offset_minutes * 60` and records it as the last-set time. Returns the
    /// stored UTC value.
    ///
    /// The last-set register holds unsigned 32-bit seconds. A time outside 1970..2106 clears it,
    /// so the clock reads as never set for calibration purposes.
    pub fn set(&mut self, value: i64, tz_offset_minutes: i32) -> i64 {
        let utc = value - i64::from(tz_offset_minutes) * 60;
        self.device.write_counter(utc);
        let last_set = u32::try_from(utc).unwrap_or_else(|_| {
            warn!("set_time({}) outside the last-set register range, cleared", utc);
            0
        });
        self.device.write_register(Register::LastSet, last_set);
        info!("set_time({}) tzo={} min", utc, tz_offset_minutes);
        utc
    }

    /// UTC seconds of the last explicit set, or `None` if the clock was never set.
    pub fn get_last_set(&self) -> Option<i64> {
        match self.device.read_register(Register::LastSet) {
            0 => None,
            raw => Some(i64::from(raw)),
        }
    }

    /// Raw register contents.
    pub fn register(&self, register: Register) -> u32 {
        self.device.read_register(register)
    }

    /// Overwrite a register.
    pub fn store_register(&mut self, register: Register, value: u32) {
        self.device.write_register(register, value);
    }

    /// Drift calibration over this clock.
    pub fn calibration(&mut self) -> ClockCalibration<'_, D> {
        ClockCalibration::new(self)
    }

    /// The wrapped device.
    pub fn device(&self) -> &D {
        &self.device
    }

    /// The wrapped device, mutably.
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Unwrap the device.
    pub fn into_device(self) -> D {
        self.device
    }
}

impl<D: RtcDevice> UtcSource for RtcClock<D> {
    fn now_utc(&self) -> i64 {
        self.get()
    }
}
