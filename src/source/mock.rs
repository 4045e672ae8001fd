//! Mock blob source for demos and testing
//!
//! Serves a handful of small programs assembled with [`BlobBuilder`].

use super::BlobSource;
use crate::describe::accel::accel_kind;
use crate::program::{BlobBuilder, Flags, Transition};
use crate::{Error, Result};
use async_trait::async_trait;

/// Mock source providing the built-in demo programs
pub struct MockSource {
    programs: Vec<(String, Vec<u8>)>,
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSource {
    pub fn new() -> Self {
        Self {
            programs: vec![
                ("minimal".to_string(), minimal()),
                ("accepting".to_string(), accepting()),
                ("accelerated".to_string(), accelerated()),
                ("multi-state".to_string(), multi_state()),
            ],
        }
    }
}

#[async_trait]
impl BlobSource for MockSource {
    async fn list(&self) -> Result<Vec<String>> {
        Ok(self.programs.iter().map(|(name, _)| name.clone()).collect())
    }

    async fn fetch(&self, name: &str) -> Result<Vec<u8>> {
        self.programs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, bytes)| bytes.clone())
            .ok_or_else(|| Error::custom(format!("No demo program named {}", name)))
    }
}

/// One state, no live transitions
fn minimal() -> Vec<u8> {
    BlobBuilder::new(1).build()
}

/// Accepts on every byte once started, reporting id 7
fn accepting() -> Vec<u8> {
    let mut builder = BlobBuilder::new(2);
    builder.transitions(1, 0..=u8::MAX, Transition::to(1));
    builder.top(1, Transition::to(1));
    let reports = builder.report_list([7]);
    builder.accept(1, reports);
    builder.build()
}

/// Skips ahead to 'x' before matching "xy"
fn accelerated() -> Vec<u8> {
    let mut builder = BlobBuilder::new(3);
    builder
        .transitions(1, 0..=u8::MAX, Transition::to(1))
        .transition(1, b'x', Transition::to(2))
        .transitions(2, 0..=u8::MAX, Transition::to(1))
        .transition(2, b'x', Transition::to(2))
        .transition(2, b'y', Transition::new(1, true))
        .accel(1, &[accel_kind::VERMICELLI, 0, b'x']);
    let reports = builder.report_list([1]);
    builder.accept(2, reports);
    builder.build()
}

/// Floating search for "ab" or "abc" at end of data
fn multi_state() -> Vec<u8> {
    let mut builder = BlobBuilder::new(5);
    for state in 1..=4 {
        builder
            .transitions(state, 0..=u8::MAX, Transition::to(1))
            .transition(state, b'a', Transition::to(2));
    }
    builder
        .transition(2, b'b', Transition::new(3, true))
        .transition(3, b'c', Transition::to(4))
        .anchored(Transition::to(1))
        .floating(Transition::to(1))
        .flags(Flags {
            can_die: false,
            single_report: true,
            ..Flags::default()
        });

    let ab = builder.report_list([10]);
    let abc = builder.report_list([11]);
    builder.accept(3, ab).accept_eod(4, abc).top(2, Transition::to(1));
    builder.build()
}
