//! # Usage Metrics Module
//!
//! This module tracks the resources consumed by one execution context. It is the
//! source of the figures recorded by performance logs.
//!
//! ## Counters
//!
//! - **Queries**: Number of read queries issued and rows they returned
//! - **DML**: Number of write statements issued and rows they affected
//! - **CPU Time**: Process CPU time (user + system) consumed since the context began
//! - **Heap Size**: Peak resident set size of the process
//!
//! Query and DML counters are incremented by the code that talks to the database
//! on behalf of the context. CPU and memory figures come from `getrusage` on Unix
//! and read as zero elsewhere.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

///////////////////////////////////////////////////////////////////////////////
//****                         Public Structs                            ****//
///////////////////////////////////////////////////////////////////////////////

/// Resource counters of a single execution context
#[derive(Debug)]
pub struct UsageCounters {
    queries: AtomicU64,
    query_rows: AtomicU64,
    dml_statements: AtomicU64,
    dml_rows: AtomicU64,
    cpu_time_at_start_ms: u64,
}

/// Point-in-time copy of the counters, serialized into performance records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceSnapshot {
    pub queries: u64,
    pub query_rows: u64,
    pub dml_statements: u64,
    pub dml_rows: u64,
    pub cpu_time_ms: u64,
    pub heap_size_bytes: u64,
    pub raw_duration: Option<i64>,
}

impl UsageCounters {
    pub fn new() -> Self {
        Self {
            queries: AtomicU64::new(0),
            query_rows: AtomicU64::new(0),
            dml_statements: AtomicU64::new(0),
            dml_rows: AtomicU64::new(0),
            cpu_time_at_start_ms: process_cpu_time_ms(),
        }
    }

    /// Account for one read query that returned `rows` rows
    pub fn record_query(&self, rows: u64) {
        self.queries.fetch_add(1, Ordering::Relaxed);
        self.query_rows.fetch_add(rows, Ordering::Relaxed);
    }

    /// Account for one write statement that affected `rows` rows
    pub fn record_dml(&self, rows: u64) {
        self.dml_statements.fetch_add(1, Ordering::Relaxed);
        self.dml_rows.fetch_add(rows, Ordering::Relaxed);
    }

    pub fn snapshot(&self, raw_duration: Option<i64>) -> PerformanceSnapshot {
        PerformanceSnapshot {
            queries: self.queries.load(Ordering::Relaxed),
            query_rows: self.query_rows.load(Ordering::Relaxed),
            dml_statements: self.dml_statements.load(Ordering::Relaxed),
            dml_rows: self.dml_rows.load(Ordering::Relaxed),
            cpu_time_ms: process_cpu_time_ms().saturating_sub(self.cpu_time_at_start_ms),
            heap_size_bytes: peak_resident_bytes(),
            raw_duration,
        }
    }
}

impl Default for UsageCounters {
    fn default() -> Self {
        Self::new()
    }
}

///////////////////////////////////////////////////////////////////////////////
//****                       Private Functions                           ****//
///////////////////////////////////////////////////////////////////////////////

#[cfg(unix)]
fn resource_usage() -> Option<libc::rusage> {
    let mut usage = std::mem::MaybeUninit::<libc::rusage>::zeroed();
    // SAFETY: getrusage only writes into the provided struct
    let rc = unsafe { libc::getrusage(libc::RUSAGE_SELF, usage.as_mut_ptr()) };
    if rc == 0 {
        // SAFETY: initialised by the successful call above
        Some(unsafe { usage.assume_init() })
    } else {
        None
    }
}

#[cfg(unix)]
fn timeval_ms(value: libc::timeval) -> u64 {
    let millis = (value.tv_sec as i64) * 1000 + (value.tv_usec as i64) / 1000;
    millis.max(0) as u64
}

#[cfg(unix)]
fn process_cpu_time_ms() -> u64 {
    match resource_usage() {
        Some(usage) => timeval_ms(usage.ru_utime) + timeval_ms(usage.ru_stime),
        None => 0,
    }
}

#[cfg(unix)]
fn peak_resident_bytes() -> u64 {
    let max_rss = match resource_usage() {
        Some(usage) => (usage.ru_maxrss as i64).max(0) as u64,
        None => return 0,
    };
    // macOS reports bytes, the other Unixes kilobytes
    if cfg!(target_os = "macos") {
        max_rss
    } else {
        max_rss * 1024
    }
}

#[cfg(not(unix))]
fn process_cpu_time_ms() -> u64 {
    0
}

#[cfg(not(unix))]
fn peak_resident_bytes() -> u64 {
    0
}

///////////////////////////////////////////////////////////////////////////////
//****                              Tests                                ****//
///////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let usage = UsageCounters::new();
        usage.record_query(10);
        usage.record_query(0);
        usage.record_dml(4);

        let snapshot = usage.snapshot(Some(99));
        assert_eq!(snapshot.queries, 2);
        assert_eq!(snapshot.query_rows, 10);
        assert_eq!(snapshot.dml_statements, 1);
        assert_eq!(snapshot.dml_rows, 4);
        assert_eq!(snapshot.raw_duration, Some(99));
    }

    #[cfg(unix)]
    #[test]
    fn test_process_figures_are_reported() {
        let snapshot = UsageCounters::new().snapshot(None);
        assert!(snapshot.heap_size_bytes > 0);
    }
}
