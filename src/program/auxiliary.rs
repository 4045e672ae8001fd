//! Per-state auxiliary records, report lists and acceleration views

use crate::program::header::read_u32;
use crate::program::transition::{StateId, Transition};
use serde::Serialize;

/// Size of one auxiliary record.
pub const AUX_RECORD_SIZE: usize = 16;

/// Size of a report list header (the count).
pub const REPORT_LIST_HEADER_SIZE: usize = 4;

/// Size of one report identifier.
pub const REPORT_ID_SIZE: usize = 4;

pub type ReportId = u32;

/// Metadata attached to one state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AuxRecord {
    /// Offset of the normal-acceptance report list, 0 when none
    pub accept: u32,
    /// Offset of the report list raised only at end of data, 0 when none
    pub accept_eod: u32,
    /// Offset of the acceleration descriptor, 0 when none
    pub accel: u32,
    /// Target of the administrative top transition
    pub top: Transition,
}

impl AuxRecord {
    pub(crate) fn parse(bytes: &[u8]) -> Self {
        debug_assert!(bytes.len() >= AUX_RECORD_SIZE);
        Self {
            accept: read_u32(bytes, 0),
            accept_eod: read_u32(bytes, 4),
            accel: read_u32(bytes, 8),
            top: Transition::decode(bytes[12]),
        }
    }

    pub(crate) fn write(&self, out: &mut [u8]) {
        out[0..4].copy_from_slice(&self.accept.to_le_bytes());
        out[4..8].copy_from_slice(&self.accept_eod.to_le_bytes());
        out[8..12].copy_from_slice(&self.accel.to_le_bytes());
        out[12] = self.top.encode();
    }

    pub fn is_accepting(&self) -> bool {
        self.accept != 0
    }

    pub fn is_eod_accepting(&self) -> bool {
        self.accept_eod != 0
    }

    /// Top target worth drawing: not the sentinel and not `state` itself
    pub fn visible_top(&self, state: StateId) -> Option<StateId> {
        let target = self.top.state;
        (target != 0 && target != state).then_some(target)
    }
}

/// Borrowed view over a report list. Order and duplicates are preserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportList<'a> {
    offset: u32,
    ids: &'a [u8],
}

impl<'a> ReportList<'a> {
    /// `ids` holds exactly `count * REPORT_ID_SIZE` bytes.
    pub(crate) fn new(offset: u32, ids: &'a [u8]) -> Self {
        debug_assert_eq!(ids.len() % REPORT_ID_SIZE, 0);
        Self { offset, ids }
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.ids.len() / REPORT_ID_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ReportId> + 'a {
        self.ids
            .chunks_exact(REPORT_ID_SIZE)
            .map(|id| u32::from_le_bytes([id[0], id[1], id[2], id[3]]))
    }

    pub fn to_vec(&self) -> Vec<ReportId> {
        self.iter().collect()
    }
}

/// Resolved, unopened acceleration descriptor
///
/// The bytes run from the descriptor offset to the end of the blob; only an
/// acceleration describer knows how many of them belong to the descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccelView<'a> {
    pub state: StateId,
    pub offset: u32,
    pub bytes: &'a [u8],
}
