// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! A fuzz target with a known crash.
//!
//! Inputs starting with [`MARKER`] are accepted; an accepted input whose next
//! byte is [`TRIGGER`] deliberately takes the process down, giving fuzzers and
//! crash-repro tooling something reachable to find.

#[macro_use]
extern crate log;

pub mod fault;
pub mod ffi;
pub mod process;
pub mod tester;

pub use fault::FaultMode;

/// Magic prefix of an accepted input.
pub const MARKER: [u8; 4] = *b"FUZZ";

/// Byte following [`MARKER`] that triggers the fault.
pub const TRIGGER: u8 = b'X';

/// Returned when the input does not start with [`MARKER`].
pub const NO_MATCH: i32 = 0;

/// Returned when the input starts with [`MARKER`] and does not trigger.
pub const MATCH: i32 = 1;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Classifier {
    pub fault: FaultMode,
}

impl Classifier {
    pub fn new(fault: FaultMode) -> Self {
        Self { fault }
    }

    /// Classify `data`, returning [`NO_MATCH`] or [`MATCH`].
    ///
    /// Does not return when `data` starts with `FUZZX`.
    pub fn classify(&self, data: &[u8]) -> i32 {
        if !data.starts_with(&MARKER) {
            return NO_MATCH;
        }

        if is_trigger(data) {
            error!("trigger byte follows marker, injecting {} fault", self.fault);
            self.fault.trigger();
        }

        MATCH
    }
}

/// Classify `data` with the default fault mode.
pub fn classify(data: &[u8]) -> i32 {
    Classifier::default().classify(data)
}

/// Whether `classify(data)` would fault.
pub fn is_trigger(data: &[u8]) -> bool {
    data.starts_with(&MARKER) && data.get(MARKER.len()) == Some(&TRIGGER)
}

/// Harness-facing entry point. Empty inputs never reach the classifier.
pub fn fuzz_entry(data: &[u8]) -> i32 {
    if data.is_empty() {
        return NO_MATCH;
    }

    classify(data)
}
