// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! The [`TimeService`] facade.
//!
//! A `TimeService` owns the RTC, the timezone store and (optionally) an NTP
//! client, and is the one place callers go for the current time, to set the
//! clock, to change zone or DST settings, to synchronize and to calibrate.
//! Timezone changes are written through to the RTC's timezone register so
//! they survive a restart; [`TimeService::new`] reads them back.
//!
//! ```
//! use timekeep::rtc::ManualRtc;
//! use timekeep::TimeService;
//!
//! let mut svc = TimeService::builder(ManualRtc::new(1_704_422_730))
//!     .timezone_offset(-300)
//!     .build();
//! assert_eq!(svc.format_now("%Y-%m-%d %H:%M %Z").unwrap(), "2024-01-04 21:45 EST");
//! ```

use log::{info, warn};
use std::time::Duration;

use crate::calendar::MonthGrid;
use crate::calibration::{CalibrationRecord, ClockCalibration};
use crate::codec::{self, BrokenDownTime};
use crate::error::{ConnectionError, DnsError, NtpError, TimeError};
use crate::ntp::{
    NetworkInterface, NtpClient, NtpResult, StdNetwork, DEFAULT_PORT, DEFAULT_TIMEOUT,
    MAX_RECEIVE_ATTEMPTS,
};
use crate::rtc::{Register, RtcClock, RtcDevice};
use crate::tz::TimeZoneStore;

/// Where and how [`TimeService::sync`] reaches its time server.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SyncConfig {
    /// Server name or address; `None` means only [`TimeService::sync_with`] can synchronize.
    pub host: Option<String>,
    /// Server port (default 123).
    pub port: u16,
    /// Per-receive timeout (default 4000 ms).
    pub timeout: Duration,
    /// Datagrams read per query before giving up (default 20).
    pub max_receive_attempts: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            host: None,
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT,
            max_receive_attempts: MAX_RECEIVE_ATTEMPTS,
        }
    }
}

/// Builder for [`TimeService`].
///
/// Created by [`TimeService::builder`]. Without [`network`](Self::network) the service has no
/// network interface and every sync fails with [`ConnectionError::NoInterface`].
pub struct TimeServiceBuilder<D, N = StdNetwork> {
    device: D,
    network: Option<N>,
    config: SyncConfig,
    offset: Option<i32>,
    dst: Option<bool>,
    dst_rule: Option<(String, String)>,
}

impl<D: RtcDevice, N: NetworkInterface> TimeServiceBuilder<D, N> {
    /// Attach a network interface.
    pub fn network<M: NetworkInterface>(self, network: M) -> TimeServiceBuilder<D, M> {
        TimeServiceBuilder {
            device: self.device,
            network: Some(network),
            config: self.config,
            offset: self.offset,
            dst: self.dst,
            dst_rule: self.dst_rule,
        }
    }

    /// Set the default time server for [`TimeService::sync`].
    pub fn server(mut self, host: impl Into<String>) -> Self {
        self.config.host = Some(host.into());
        self
    }

    /// Set the server port (default: 123).
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the per-receive timeout (default: 4 s).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set how many datagrams a query reads before giving up (default: 20).
    pub fn max_receive_attempts(mut self, attempts: usize) -> Self {
        self.config.max_receive_attempts = attempts;
        self
    }

    /// Set the timezone offset in minutes east of UTC, replacing what the RTC register holds.
    ///
    /// Out-of-range values are ignored at build time, like [`TimeService::set_offset`].
    pub fn timezone_offset(mut self, minutes: i32) -> Self {
        self.offset = Some(minutes);
        self
    }

    /// Set the manual DST flag.
    pub fn dst(mut self, dst: bool) -> Self {
        self.dst = Some(dst);
        self
    }

    /// Install a DST rule from two "MM/DD,hh:mm" strings.
    ///
    /// A malformed pair is logged and ignored at build time.
    pub fn dst_rule(mut self, start: impl Into<String>, stop: impl Into<String>) -> Self {
        self.dst_rule = Some((start.into(), stop.into()));
        self
    }

    /// Build the service.
    pub fn build(self) -> TimeService<D, N> {
        let ntp = self
            .network
            .map(|net| NtpClient::new(net).with_max_attempts(self.config.max_receive_attempts));
        let mut svc = TimeService::assemble(self.device, ntp, self.config);
        if let Some(minutes) = self.offset {
            svc.set_offset(minutes);
        }
        if let Some(dst) = self.dst {
            svc.set_dst(dst);
        }
        if let Some((start, stop)) = &self.dst_rule {
            svc.set_dst_rule(start, stop);
        }
        svc
    }
}

/// Device time-keeping: RTC, timezone and DST, calibration and network sync.
pub struct TimeService<D, N = StdNetwork> {
    rtc: RtcClock<D>,
    zone: TimeZoneStore,
    ntp: Option<NtpClient<N>>,
    config: SyncConfig,
}

impl<D: RtcDevice> TimeService<D, StdNetwork> {
    /// A service over `device` with no network interface.
    ///
    /// The timezone offset is restored from the device's timezone register.
    pub fn new(device: D) -> Self {
        TimeService::assemble(device, None, SyncConfig::default())
    }

    /// Start configuring a service over `device`.
    pub fn builder(device: D) -> TimeServiceBuilder<D, StdNetwork> {
        TimeServiceBuilder {
            device,
            network: None,
            config: SyncConfig::default(),
            offset: None,
            dst: None,
            dst_rule: None,
        }
    }
}

impl<D: RtcDevice, N: NetworkInterface> TimeService<D, N> {
    fn assemble(device: D, ntp: Option<NtpClient<N>>, config: SyncConfig) -> Self {
        let rtc = RtcClock::new(device);
        let zone = TimeZoneStore::from_register(rtc.register(Register::Timezone));
        TimeService {
            rtc,
            zone,
            ntp,
            config,
        }
    }

    // ── Reading the time ────────────────────────────────────────────

    /// Current UTC seconds since the Unix epoch.
    pub fn now_utc(&self) -> i64 {
        self.rtc.get()
    }

    /// Current local seconds: UTC plus the zone offset plus an hour when DST applies.
    ///
    /// A configured DST rule is evaluated here, against today's date, and its answer recorded
    /// in the DST flag.
    pub fn local_seconds(&mut self) -> i64 {
        let utc = self.rtc.get();
        let dst = self.current_dst(utc);
        self.zone.local_seconds(utc, dst)
    }

    /// The current local time, broken down, with its DST flag and zone offset filled in.
    pub fn now_local(&mut self) -> Result<BrokenDownTime, TimeError> {
        let utc = self.rtc.get();
        let dst = self.current_dst(utc);
        let local = self.zone.local_seconds(utc, dst);
        let mut tm =
            BrokenDownTime::from_timestamp(local).ok_or(TimeError::OutOfRange { seconds: local })?;
        tm.dst = dst;
        tm.tz_offset_minutes = self.zone.get_offset();
        Ok(tm)
    }

    /// Format the current local time.
    pub fn format_now(&mut self, pattern: &str) -> Result<String, TimeError> {
        Ok(codec::format(pattern, &self.now_local()?))
    }

    /// The current local month as a calendar grid.
    pub fn month_grid(&mut self) -> Result<MonthGrid, TimeError> {
        let tm = self.now_local()?;
        MonthGrid::containing(&tm).ok_or(TimeError::InvalidDate)
    }

    /// Whether DST applies right now.
    pub fn is_dst_active(&self) -> bool {
        match BrokenDownTime::from_timestamp(self.rtc.get()) {
            Some(now) => self.zone.is_dst_active(&now),
            None => self.zone.get_dst(),
        }
    }

    fn current_dst(&mut self, utc: i64) -> bool {
        match BrokenDownTime::from_timestamp(utc) {
            Some(now) => self.zone.refresh_dst(&now),
            None => self.zone.get_dst(),
        }
    }

    // ── Setting the time ────────────────────────────────────────────

    /// Set the clock from a value in a zone `tz_offset_minutes` east of UTC. Returns the stored
    /// UTC seconds.
    pub fn set_time(&mut self, value: i64, tz_offset_minutes: i32) -> i64 {
        self.rtc.set(value, tz_offset_minutes)
    }

    /// Set the clock from text.
    ///
    /// Fields the pattern leaves out keep their current local value. The text is read as local
    /// standard time in the configured zone unless it carries its own zone (`%Z`, `%z`). Returns
    /// the stored UTC seconds; on error the clock is untouched.
    pub fn set_from_text(&mut self, text: &str, pattern: &str) -> Result<i64, TimeError> {
        let offset = self.zone.get_offset();
        let local = self.zone.local_seconds(self.rtc.get(), false);
        let mut tm =
            BrokenDownTime::from_timestamp(local).ok_or(TimeError::OutOfRange { seconds: local })?;
        tm.tz_offset_minutes = offset;
        codec::parse_into(text, pattern, &mut tm)?;
        let value = tm.to_timestamp().ok_or(TimeError::InvalidDate)?;
        Ok(self.rtc.set(value, tm.tz_offset_minutes))
    }

    /// Move the clock by whole hours. Returns the stored UTC seconds.
    pub fn advance_hours(&mut self, hours: i32) -> i64 {
        self.advance_seconds(i64::from(hours) * 3600)
    }

    /// Move the clock by whole minutes. Returns the stored UTC seconds.
    pub fn advance_minutes(&mut self, minutes: i32) -> i64 {
        self.advance_seconds(i64::from(minutes) * 60)
    }

    fn advance_seconds(&mut self, seconds: i64) -> i64 {
        let now = self.rtc.get();
        self.rtc.set(now + seconds, 0)
    }

    // ── Timezone and DST ────────────────────────────────────────────

    /// Set and persist the zone offset. Values outside -720..=720 are ignored and return `false`.
    pub fn set_offset(&mut self, minutes: i32) -> bool {
        if !self.zone.set_offset(minutes) {
            return false;
        }
        self.rtc
            .store_register(Register::Timezone, self.zone.record().pack());
        true
    }

    /// The zone offset in minutes east of UTC.
    pub fn get_offset(&self) -> i32 {
        self.zone.get_offset()
    }

    /// Set the manual DST flag.
    pub fn set_dst(&mut self, dst: bool) {
        self.zone.set_dst(dst);
    }

    /// The DST flag.
    pub fn get_dst(&self) -> bool {
        self.zone.get_dst()
    }

    /// Install a DST rule. A malformed pair keeps the old rule and returns `false`.
    pub fn set_dst_rule(&mut self, start: &str, stop: &str) -> bool {
        self.zone.set_dst_rule(start, stop)
    }

    /// Return to the manual DST flag.
    pub fn clear_dst_rule(&mut self) {
        self.zone.clear_dst_rule();
    }

    // ── Network sync ────────────────────────────────────────────────

    /// Synchronize against the configured server.
    pub fn sync(&mut self) -> Result<NtpResult, NtpError> {
        if self.ntp.is_none() {
            warn!("sync: no network interface");
            return Err(ConnectionError::NoInterface.into());
        }
        let Some(host) = self.config.host.clone() else {
            warn!("sync: no time server configured");
            return Err(DnsError::NoServerConfigured.into());
        };
        self.sync_with(&host, self.config.port, self.config.timeout)
    }

    /// Synchronize against `host:port` and step the RTC by the measured offset.
    ///
    /// Any failure leaves the RTC unchanged.
    pub fn sync_with(
        &mut self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<NtpResult, NtpError> {
        let Some(client) = &self.ntp else {
            warn!("sync: no network interface");
            return Err(ConnectionError::NoInterface.into());
        };
        let result = match client.query(host, port, timeout, &self.rtc) {
            Ok(result) => result,
            Err(e) => {
                warn!("sync with {}:{} failed: {}", host, port, e);
                return Err(e);
            }
        };
        let now = self.rtc.get();
        self.rtc.set(now + result.offset_seconds, 0);
        info!(
            "synchronized with {}:{}, offset {} s, delay {} s",
            host, port, result.offset_seconds, result.delay_seconds
        );
        Ok(result)
    }

    // ── Calibration ─────────────────────────────────────────────────

    /// Correct the clock by `delta_seconds` and derive a drift factor.
    ///
    /// See [`ClockCalibration::adjust`].
    pub fn adjust(&mut self, delta_seconds: i32) -> bool {
        self.rtc.calibration().adjust(delta_seconds)
    }

    /// Drift calibration over this service's clock.
    pub fn calibration(&mut self) -> ClockCalibration<'_, D> {
        self.rtc.calibration()
    }

    /// The stored calibration factor; 0 when calibration is off.
    pub fn calibration_factor(&self) -> i32 {
        CalibrationRecord::unpack(self.rtc.register(Register::Calibration)).factor
    }

    /// Store a calibration factor directly; 0 disables calibration.
    pub fn set_calibration(&mut self, factor: i32) -> bool {
        self.rtc.calibration().set_factor(factor)
    }

    /// UTC seconds of the last explicit set.
    pub fn last_set(&self) -> Option<i64> {
        self.rtc.get_last_set()
    }

    // ── Accessors ───────────────────────────────────────────────────

    /// The RTC.
    pub fn rtc(&self) -> &RtcClock<D> {
        &self.rtc
    }

    /// The RTC, mutably.
    pub fn rtc_mut(&mut self) -> &mut RtcClock<D> {
        &mut self.rtc
    }

    /// The timezone store.
    pub fn zone(&self) -> &TimeZoneStore {
        &self.zone
    }

    /// The sync configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Whether a network interface is attached.
    pub fn has_network(&self) -> bool {
        self.ntp.is_some()
    }
}
