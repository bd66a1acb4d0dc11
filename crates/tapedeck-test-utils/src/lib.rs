//! Test utilities and mock collaborators for tapedeck development.
//!
//! Provides a [`RecordingSink`] that captures everything the engine
//! publishes, a [`MapResolver`] serving heavy payloads from memory with
//! load counters, and fixture builders in [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use tapedeck_core::{EmitSink, Payload, PayloadResolver, ResolveError, SensorKind, Stamp};

/// One captured [`EmitSink::emit`] call.
#[derive(Clone, Debug, PartialEq)]
pub struct Emitted {
    pub sensor: SensorKind,
    pub stamp: Stamp,
    pub payload: Payload,
}

/// [`EmitSink`] that records every call for later assertions.
#[derive(Debug, Default)]
pub struct RecordingSink {
    emitted: Mutex<Vec<Emitted>>,
    progress: Mutex<Vec<Stamp>>,
    clocks: Mutex<Vec<Stamp>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every emission so far, in arrival order.
    pub fn emitted(&self) -> Vec<Emitted> {
        self.emitted.lock().unwrap().clone()
    }

    /// Stamps emitted for `sensor`, in arrival order.
    pub fn stamps_for(&self, sensor: SensorKind) -> Vec<Stamp> {
        self.emitted
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.sensor == sensor)
            .map(|e| e.stamp)
            .collect()
    }

    pub fn emit_count(&self) -> usize {
        self.emitted.lock().unwrap().len()
    }

    pub fn progress(&self) -> Vec<Stamp> {
        self.progress.lock().unwrap().clone()
    }

    pub fn clocks(&self) -> Vec<Stamp> {
        self.clocks.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.emitted.lock().unwrap().clear();
        self.progress.lock().unwrap().clear();
        self.clocks.lock().unwrap().clear();
    }

    /// Poll until `cond` holds, panicking after `timeout`.
    pub fn wait_until(&self, timeout: Duration, mut cond: impl FnMut(&Self) -> bool) {
        let deadline = Instant::now() + timeout;
        while !cond(self) {
            if Instant::now() > deadline {
                panic!(
                    "condition not met within {timeout:?} ({} emissions so far)",
                    self.emit_count()
                );
            }
            thread::sleep(Duration::from_millis(1));
        }
    }

    /// Poll until at least `n` emissions have arrived.
    pub fn wait_for_count(&self, n: usize, timeout: Duration) {
        self.wait_until(timeout, |s| s.emit_count() >= n);
    }
}

impl EmitSink for RecordingSink {
    fn emit(&self, sensor: SensorKind, stamp: Stamp, payload: Payload) {
        self.emitted.lock().unwrap().push(Emitted {
            sensor,
            stamp,
            payload,
        });
    }

    fn progress(&self, stamp: Stamp) {
        self.progress.lock().unwrap().push(stamp);
    }

    fn clock(&self, stamp: Stamp) {
        self.clocks.lock().unwrap().push(stamp);
    }
}

/// In-memory [`PayloadResolver`] with a shared load counter.
///
/// Identifiers are `<stamp>.<extension>`. Identifiers registered with
/// [`fail_on`](MapResolver::fail_on) return a decode error.
#[derive(Debug, Clone)]
pub struct MapResolver {
    extension: String,
    payloads: HashMap<String, Payload>,
    failing: HashSet<String>,
    loads: Arc<AtomicUsize>,
}

impl MapResolver {
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
            payloads: HashMap::new(),
            failing: HashSet::new(),
            loads: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Register the payload for `stamp`.
    pub fn insert(&mut self, stamp: Stamp, payload: Payload) {
        self.payloads.insert(self.identifier(stamp), payload);
    }

    /// Make loads of `stamp` fail.
    pub fn fail_on(&mut self, stamp: Stamp) {
        self.failing.insert(self.identifier(stamp));
    }

    /// Identifiers of every registered payload, suitable for a file list.
    pub fn identifiers(&self) -> Vec<String> {
        self.payloads.keys().cloned().collect()
    }

    /// Counter of `load` calls, shared with every clone.
    pub fn load_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.loads)
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }
}

impl PayloadResolver for MapResolver {
    fn identifier(&self, stamp: Stamp) -> String {
        format!("{stamp}.{}", self.extension)
    }

    fn load(&self, identifier: &str) -> Result<Payload, ResolveError> {
        self.loads.fetch_add(1, Ordering::Relaxed);
        if self.failing.contains(identifier) {
            return Err(ResolveError::Decode {
                identifier: identifier.to_string(),
                reason: "injected failure".into(),
            });
        }
        self.payloads
            .get(identifier)
            .cloned()
            .ok_or_else(|| ResolveError::NotFound {
                identifier: identifier.to_string(),
            })
    }
}

pub use fixtures::*;
