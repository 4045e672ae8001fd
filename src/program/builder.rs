//! Blob assembler for fixtures and demo programs
//!
//! Lays out a complete sheng blob from explicit transitions and metadata. It
//! does not compile patterns and performs no validation: anything it writes is
//! checked by [`crate::program::Program::open`] like any other blob.

use crate::program::auxiliary::{AUX_RECORD_SIZE, AuxRecord, REPORT_ID_SIZE, ReportId};
use crate::program::header::{EngineType, Flags, Header, TABLE_OFFSET};
use crate::program::transition::{LANES, StateId, Transition, TransitionTable};

/// Alignment of the acceleration section and of each descriptor in it.
const ACCEL_ALIGN: usize = 16;

/// Handle to a report list registered with [`BlobBuilder::report_list`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportListHandle(usize);

#[derive(Debug, Clone, Default)]
struct StateEntry {
    accept: Option<ReportListHandle>,
    accept_eod: Option<ReportListHandle>,
    accel: Option<Vec<u8>>,
    top: Transition,
}

#[derive(Debug, Clone)]
pub struct BlobBuilder {
    state_count: u8,
    type_tag: u8,
    table: Vec<[u8; LANES]>,
    states: Vec<StateEntry>,
    report_lists: Vec<Vec<ReportId>>,
    anchored: Transition,
    floating: Transition,
    flags: Flags,
}

impl BlobBuilder {
    /// Start a program with `state_count` states, every transition dead.
    /// Both start states default to state 1 when it exists.
    pub fn new(state_count: u8) -> Self {
        let start = Transition::to(if state_count > 1 { 1 } else { 0 });
        Self {
            state_count,
            type_tag: EngineType::Sheng.tag(),
            table: vec![[0; LANES]; 256],
            states: vec![StateEntry::default(); usize::from(state_count).min(LANES)],
            report_lists: Vec::new(),
            anchored: start,
            floating: start,
            flags: Flags::default(),
        }
    }

    /// Override the container type tag
    pub fn type_tag(&mut self, tag: u8) -> &mut Self {
        self.type_tag = tag;
        self
    }

    pub fn transition(&mut self, state: StateId, symbol: u8, to: Transition) -> &mut Self {
        self.table[usize::from(symbol)][usize::from(state) & (LANES - 1)] = to.encode();
        self
    }

    pub fn transitions(
        &mut self,
        state: StateId,
        symbols: impl IntoIterator<Item = u8>,
        to: Transition,
    ) -> &mut Self {
        for symbol in symbols {
            self.transition(state, symbol, to);
        }
        self
    }

    pub fn anchored(&mut self, start: Transition) -> &mut Self {
        self.anchored = start;
        self
    }

    pub fn floating(&mut self, start: Transition) -> &mut Self {
        self.floating = start;
        self
    }

    /// Set flags. `has_accel` is also raised automatically when any state
    /// carries an acceleration descriptor.
    pub fn flags(&mut self, flags: Flags) -> &mut Self {
        self.flags = flags;
        self
    }

    pub fn top(&mut self, state: StateId, to: Transition) -> &mut Self {
        if let Some(entry) = self.states.get_mut(usize::from(state)) {
            entry.top = to;
        }
        self
    }

    /// Register a report list; the handle may be shared by several states
    pub fn report_list(&mut self, ids: impl IntoIterator<Item = ReportId>) -> ReportListHandle {
        self.report_lists.push(ids.into_iter().collect());
        ReportListHandle(self.report_lists.len() - 1)
    }

    pub fn accept(&mut self, state: StateId, list: ReportListHandle) -> &mut Self {
        if let Some(entry) = self.states.get_mut(usize::from(state)) {
            entry.accept = Some(list);
        }
        self
    }

    pub fn accept_eod(&mut self, state: StateId, list: ReportListHandle) -> &mut Self {
        if let Some(entry) = self.states.get_mut(usize::from(state)) {
            entry.accept_eod = Some(list);
        }
        self
    }

    /// Attach an acceleration descriptor, stored as given and padded
    pub fn accel(&mut self, state: StateId, descriptor: &[u8]) -> &mut Self {
        if let Some(entry) = self.states.get_mut(usize::from(state)) {
            entry.accel = Some(descriptor.to_vec());
        }
        self
    }

    /// Lay out the blob: headers, table, aux records, report lists, accel
    pub fn build(&self) -> Vec<u8> {
        let aux_offset = TABLE_OFFSET + TransitionTable::SIZE;
        let report_offset = aux_offset + self.states.len() * AUX_RECORD_SIZE;

        let mut list_offsets = Vec::with_capacity(self.report_lists.len());
        let mut cursor = report_offset;
        for list in &self.report_lists {
            list_offsets.push(cursor);
            cursor += REPORT_ID_SIZE * (1 + list.len());
        }

        let accel_offset = cursor.next_multiple_of(ACCEL_ALIGN);
        let mut accel_offsets = vec![0usize; self.states.len()];
        cursor = accel_offset;
        for (state, entry) in self.states.iter().enumerate() {
            if let Some(descriptor) = &entry.accel {
                accel_offsets[state] = cursor;
                cursor += descriptor.len().max(1).next_multiple_of(ACCEL_ALIGN);
            }
        }
        // Closing pad block keeps both section offsets inside the blob even
        // when there are no report lists or descriptors.
        let length = cursor + ACCEL_ALIGN;

        let mut flags = self.flags;
        flags.has_accel |= self.states.iter().any(|entry| entry.accel.is_some());

        let header = Header {
            container_length: length as u32,
            type_tag: self.type_tag,
            length: length as u32,
            aux_offset: aux_offset as u32,
            report_offset: report_offset as u32,
            accel_offset: accel_offset as u32,
            state_count: self.state_count,
            anchored: self.anchored,
            floating: self.floating,
            flags,
        };

        let mut out = vec![0u8; length];
        header.write(&mut out);
        out[TABLE_OFFSET..aux_offset].copy_from_slice(self.table.as_flattened());

        let list_offset = |handle: Option<ReportListHandle>| {
            handle.map_or(0, |ReportListHandle(idx)| list_offsets[idx] as u32)
        };
        for (state, entry) in self.states.iter().enumerate() {
            let record = AuxRecord {
                accept: list_offset(entry.accept),
                accept_eod: list_offset(entry.accept_eod),
                accel: accel_offsets[state] as u32,
                top: entry.top,
            };
            let start = aux_offset + state * AUX_RECORD_SIZE;
            record.write(&mut out[start..start + AUX_RECORD_SIZE]);
        }

        for (list, &start) in self.report_lists.iter().zip(&list_offsets) {
            out[start..start + REPORT_ID_SIZE].copy_from_slice(&(list.len() as u32).to_le_bytes());
            for (idx, id) in list.iter().enumerate() {
                let at = start + REPORT_ID_SIZE * (1 + idx);
                out[at..at + REPORT_ID_SIZE].copy_from_slice(&id.to_le_bytes());
            }
        }

        for (entry, &start) in self.states.iter().zip(&accel_offsets) {
            if let Some(descriptor) = &entry.accel {
                out[start..start + descriptor.len()].copy_from_slice(descriptor);
            }
        }

        out
    }
}
