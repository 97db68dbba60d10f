// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scoped timing of named operations.
//!
//! Purely advisory: a disabled profiler records nothing and no code path
//! depends on what it records.

use std::cell::RefCell;
use std::fmt::Write as _;
use std::time::{Duration, Instant};

/// A finished profiling scope
#[derive(Debug, Clone)]
pub struct ProfileRecord {
    /// Scope name
    pub name: String,
    /// Nesting depth (0 for outermost)
    pub depth: usize,
    /// Wall time spent inside the scope
    pub duration: Duration,
    /// Order in which the scope was opened
    sequence: usize,
}

#[derive(Debug, Default)]
struct ProfilerState {
    open: Vec<(String, Instant, usize)>,
    finished: Vec<ProfileRecord>,
    next_sequence: usize,
}

/// Records nested named scopes
#[derive(Debug, Default)]
pub struct Profiler {
    enabled: bool,
    state: RefCell<ProfilerState>,
}

impl Profiler {
    /// Create an enabled profiler
    pub fn new() -> Self {
        Self {
            enabled: true,
            state: RefCell::default(),
        }
    }

    /// Create a profiler that records nothing
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Whether scopes are being recorded
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Open a named scope
    pub fn push(&self, name: impl Into<String>) {
        if !self.enabled {
            return;
        }
        let mut state = self.state.borrow_mut();
        let sequence = state.next_sequence;
        state.next_sequence += 1;
        state.open.push((name.into(), Instant::now(), sequence));
    }

    /// Close the innermost open scope
    pub fn pop(&self) -> Option<ProfileRecord> {
        if !self.enabled {
            return None;
        }
        let mut state = self.state.borrow_mut();
        let (name, started, sequence) = state.open.pop()?;
        let record = ProfileRecord {
            name,
            depth: state.open.len(),
            duration: started.elapsed(),
            sequence,
        };
        tracing::trace!(
            scope = %record.name,
            elapsed_us = record.duration.as_micros() as u64,
            "profile scope closed"
        );
        state.finished.push(record.clone());
        Some(record)
    }

    /// Open a scope that closes when the guard is dropped
    pub fn scope(&self, name: impl Into<String>) -> ScopeGuard<'_> {
        self.push(name);
        ScopeGuard { profiler: self }
    }

    /// Finished scopes in the order they were opened
    pub fn records(&self) -> Vec<ProfileRecord> {
        let mut records = self.state.borrow().finished.clone();
        records.sort_by_key(|r| r.sequence);
        records
    }

    /// Indented text report of all finished scopes
    pub fn report(&self) -> String {
        let mut out = String::new();
        for record in self.records() {
            let _ = writeln!(
                out,
                "{:indent$}{}: {:.3} ms",
                "",
                record.name,
                record.duration.as_secs_f64() * 1000.0,
                indent = record.depth * 2
            );
        }
        out
    }
}

/// Closes its profiler scope on drop
#[must_use = "the scope closes as soon as the guard is dropped"]
pub struct ScopeGuard<'a> {
    profiler: &'a Profiler,
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.profiler.pop();
    }
}
