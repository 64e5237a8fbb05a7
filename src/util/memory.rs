/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Process memory sampling: a cross-platform equivalent of a raw
//! `/proc/self/status` `VmRSS` read.

use sysinfo::{Pid, System};

/// Current resident set size of this process, in kilobytes. `0` if the
/// running process cannot be found in the snapshot (should not happen in
/// practice, but sampling memory is diagnostic, never fatal).
pub fn current_memory_kb() -> u64 {
    let pid = Pid::from_u32(std::process::id());
    let mut system = System::new();
    system.refresh_processes(sysinfo::ProcessesToUpdate::Some(&[pid]), true);
    system
        .process(pid)
        .map(|p| p.memory() / 1024)
        .unwrap_or(0)
}

/// Tracks the maximum of every sample taken via [`Self::sample`].
#[derive(Debug, Default, Clone, Copy)]
pub struct PeakMemoryTracker {
    peak_kb: u64,
}

impl PeakMemoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample(&mut self) -> u64 {
        let now = current_memory_kb();
        if now > self.peak_kb {
            self.peak_kb = now;
        }
        self.peak_kb
    }

    pub fn peak_kb(&self) -> u64 {
        self.peak_kb
    }
}
