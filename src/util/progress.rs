/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! A simple utility to log progress of a long running stage.

use log::info;
use std::fmt::{Display, Formatter, Result};
use std::time::{Duration, Instant};

pub struct ProgressLogger {
    start: Instant,
    next_log_time: Instant,
    log_interval: Duration,
    count: usize,
    name: String,
}

impl ProgressLogger {
    const LIGHT_UPDATE_MASK: usize = (1 << 10) - 1;

    pub fn new<S: ToString>(name: S) -> Self {
        ProgressLogger {
            start: Instant::now(),
            next_log_time: Instant::now(),
            log_interval: Duration::from_secs(10),
            count: 0,
            name: name.to_string(),
        }
    }

    pub fn start<T: AsRef<str>>(&mut self, msg: T) {
        self.start = Instant::now();
        self.next_log_time = self.start + self.log_interval;
        info!("{}", msg.as_ref());
    }

    fn update_if(&mut self) {
        let now = Instant::now();
        if self.next_log_time <= now {
            info!("{}", self);
            self.next_log_time = now + self.log_interval;
        }
    }

    pub fn light_update(&mut self) {
        self.count += 1;
        if (self.count & Self::LIGHT_UPDATE_MASK) == 0 {
            self.update_if();
        }
    }

    pub fn update(&mut self) {
        self.count += 1;
        self.update_if();
    }

    pub fn done<T: AsRef<str>>(&mut self, opt_msg: Option<T>) {
        if let Some(msg) = opt_msg {
            info!("{}", msg.as_ref());
        }
        info!("{}", self);
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

impl Display for ProgressLogger {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let elapsed = self.start.elapsed();
        let rate = self.count as f64 / elapsed.as_secs_f64();
        write!(
            f,
            "{count} {name}, {elapsed:.1?} elapsed, {rate:.1} {name}/s",
            count = self.count,
            name = self.name,
            elapsed = elapsed,
            rate = rate,
        )
    }
}
