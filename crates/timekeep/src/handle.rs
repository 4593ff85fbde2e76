// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Sharing one [`TimeService`] between several callers.
//!
//! The RTC registers, the timezone store and the calibration state form one
//! unit of mutable state. [`TimeHandle`] keeps that unit behind a single
//! `Arc<Mutex<>>`, so every operation sees and leaves it consistent. Reading
//! the local time needs the lock too: it re-evaluates and records DST.
//!
//! # Examples
//!
//! ```
//! use std::thread;
//! use timekeep::rtc::ManualRtc;
//! use timekeep::{TimeHandle, TimeService};
//!
//! let handle = TimeHandle::new(TimeService::new(ManualRtc::new(1_700_000_000)));
//! let display = handle.clone();
//! thread::spawn(move || {
//!     display.with(|svc| svc.set_offset(60));
//! })
//! .join()
//! .unwrap();
//! assert_eq!(handle.with(|svc| svc.get_offset()), 60);
//! ```

use std::sync::{Arc, Mutex};

use crate::error::NtpError;
use crate::ntp::{NetworkInterface, NtpResult, StdNetwork};
use crate::rtc::RtcDevice;
use crate::service::TimeService;

/// A cloneable, lock-guarded handle to a [`TimeService`].
///
/// Cloning is cheap (it shares the inner `Arc`).
pub struct TimeHandle<D, N = StdNetwork> {
    inner: Arc<Mutex<TimeService<D, N>>>,
}

impl<D, N> Clone for TimeHandle<D, N> {
    fn clone(&self) -> Self {
        TimeHandle {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D: RtcDevice, N: NetworkInterface> TimeHandle<D, N> {
    /// Wrap `service`.
    pub fn new(service: TimeService<D, N>) -> Self {
        TimeHandle {
            inner: Arc::new(Mutex::new(service)),
        }
    }

    /// Run `f` with exclusive access to the service.
    ///
    /// The lock is held only for the duration of the closure; a sync inside it blocks every
    /// other caller until the query finishes.
    ///
    /// # Panics
    ///
    /// Panics if the internal `Mutex` is poisoned.
    pub fn with<R>(&self, f: impl FnOnce(&mut TimeService<D, N>) -> R) -> R {
        let mut service = self.inner.lock().expect("time service lock poisoned");
        f(&mut service)
    }

    /// Current UTC seconds.
    ///
    /// # Panics
    ///
    /// Panics if the internal `Mutex` is poisoned.
    pub fn now_utc(&self) -> i64 {
        self.with(|svc| svc.now_utc())
    }

    /// Format the current local time, or `None` if it is outside the calendar range.
    ///
    /// # Panics
    ///
    /// Panics if the internal `Mutex` is poisoned.
    pub fn format_now(&self, pattern: &str) -> Option<String> {
        self.with(|svc| svc.format_now(pattern).ok())
    }

    /// Synchronize against the configured server.
    ///
    /// # Panics
    ///
    /// Panics if the internal `Mutex` is poisoned.
    pub fn sync(&self) -> Result<NtpResult, NtpError> {
        self.with(|svc| svc.sync())
    }
}
