//! Program module - Validated, read-only view over a sheng DFA blob
//!
//! A blob is built once by an external compiler. [`Program::open`] checks every
//! header field, section offset, report list, acceleration offset and live
//! transition against the declared length before anything else reads it, so
//! the accessors below never fail on a program that opened successfully.

use crate::{Error, Result};

pub mod auxiliary;
pub mod builder;
pub mod header;
pub mod transition;

// Re-export key types
pub use auxiliary::{AUX_RECORD_SIZE, AccelView, AuxRecord, ReportId, ReportList};
pub use builder::BlobBuilder;
pub use header::{EngineType, Flags, Header};
pub use transition::{LANES, StateId, Transition, TransitionTable};

use auxiliary::{REPORT_ID_SIZE, REPORT_LIST_HEADER_SIZE};
use header::{MIN_BLOB_SIZE, TABLE_OFFSET, read_u32};

/// A sheng DFA program borrowed from a caller-owned buffer
#[derive(Debug, Clone, Copy)]
pub struct Program<'a> {
    bytes: &'a [u8],
    header: Header,
}

impl<'a> Program<'a> {
    /// Interpret the first `length` bytes of `buffer` as a sheng program
    pub fn open(buffer: &'a [u8], length: usize) -> Result<Self> {
        if buffer.len() < length {
            return Err(Error::malformed(format!(
                "declared length {} exceeds buffer of {} bytes",
                length,
                buffer.len()
            )));
        }
        if length < MIN_BLOB_SIZE {
            return Err(Error::malformed(format!(
                "blob length {} is below the minimum of {} bytes",
                length, MIN_BLOB_SIZE
            )));
        }

        let bytes = &buffer[..length];
        let header = Header::parse(bytes);

        if header.container_length as usize != length {
            return Err(Error::malformed(format!(
                "container length {} does not match declared length {}",
                header.container_length, length
            )));
        }
        if EngineType::from_tag(header.type_tag) != Some(EngineType::Sheng) {
            return Err(Error::unsupported(header.type_tag));
        }
        if header.length as usize != length {
            return Err(Error::malformed(format!(
                "engine length {} does not match declared length {}",
                header.length, length
            )));
        }

        let program = Self { bytes, header };
        program.validate_sections()?;
        program.validate_aux_records()?;
        program.validate_transitions()?;

        tracing::debug!(
            "Opened sheng program: {} states, {} bytes",
            header.state_count,
            length
        );
        Ok(program)
    }

    fn validate_sections(&self) -> Result<()> {
        let header = &self.header;
        let length = self.bytes.len();

        if header.state_count == 0 || usize::from(header.state_count) > LANES {
            return Err(Error::malformed(format!(
                "state count {} outside 1..={}",
                header.state_count, LANES
            )));
        }

        let aux_start = header.aux_offset as usize;
        let aux_end = usize::from(header.state_count)
            .checked_mul(AUX_RECORD_SIZE)
            .and_then(|size| aux_start.checked_add(size));
        let fits = aux_start >= TABLE_OFFSET + TransitionTable::SIZE
            && aux_end.is_some_and(|end| end <= length);
        if !fits {
            return Err(Error::malformed(format!(
                "aux section at {} for {} states does not fit in blob of {} bytes",
                aux_start, header.state_count, length
            )));
        }

        for (name, offset) in [
            ("report", header.report_offset),
            ("accel", header.accel_offset),
        ] {
            if offset as usize >= length {
                return Err(Error::malformed(format!(
                    "{} section offset {} past blob length {}",
                    name, offset, length
                )));
            }
        }
        Ok(())
    }

    fn validate_aux_records(&self) -> Result<()> {
        let state_count = self.header.state_count;
        let length = self.bytes.len();

        for state in 0..state_count {
            let aux = self.aux_unchecked(state);

            for (name, offset) in [("accept", aux.accept), ("EOD accept", aux.accept_eod)] {
                if offset != 0 {
                    self.report_list_at(offset).map_err(|reason| {
                        Error::malformed(format!("state {} {} list: {}", state, name, reason))
                    })?;
                }
            }

            if aux.accel != 0 && aux.accel as usize >= length {
                return Err(Error::malformed(format!(
                    "state {} accel offset {} past blob length {}",
                    state, aux.accel, length
                )));
            }

            if aux.top.state >= state_count {
                return Err(Error::out_of_range(
                    aux.top.state,
                    state_count,
                    format!("top transition of state {}", state),
                ));
            }
        }
        Ok(())
    }

    fn validate_transitions(&self) -> Result<()> {
        let state_count = self.header.state_count;

        for (name, start) in [
            ("anchored start", self.header.anchored),
            ("floating start", self.header.floating),
        ] {
            if start.state >= state_count {
                return Err(Error::out_of_range(start.state, state_count, name));
            }
        }

        for state in 0..state_count {
            for symbol in 0..=u8::MAX {
                self.decode(state, symbol)?;
            }
        }
        Ok(())
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn state_count(&self) -> u8 {
        self.header.state_count
    }

    /// Declared blob length
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The declared bytes of the blob
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn table(&self) -> TransitionTable<'a> {
        TransitionTable::new(&self.bytes[TABLE_OFFSET..TABLE_OFFSET + TransitionTable::SIZE])
    }

    /// Live states, sentinel included
    pub fn states(&self) -> std::ops::Range<StateId> {
        0..self.header.state_count
    }

    /// Next state and accepting marker for `state` on `symbol`
    pub fn decode(&self, state: StateId, symbol: u8) -> Result<Transition> {
        let state_count = self.header.state_count;
        if state >= state_count {
            return Err(Error::out_of_range(state, state_count, "decode source state"));
        }

        let next = self.table().lane(state, symbol);
        if next.state >= state_count {
            return Err(Error::out_of_range(
                next.state,
                state_count,
                format!("transition from state {} on symbol {:#04x}", state, symbol),
            ));
        }
        Ok(next)
    }

    /// Auxiliary record of `state`
    pub fn auxiliary(&self, state: StateId) -> Result<AuxRecord> {
        let state_count = self.header.state_count;
        if state >= state_count {
            return Err(Error::out_of_range(state, state_count, "auxiliary lookup"));
        }
        Ok(self.aux_unchecked(state))
    }

    /// Caller guarantees `state < state_count`; the aux section was bounds
    /// checked in [`Program::open`].
    fn aux_unchecked(&self, state: StateId) -> AuxRecord {
        let start = self.header.aux_offset as usize + usize::from(state) * AUX_RECORD_SIZE;
        AuxRecord::parse(&self.bytes[start..start + AUX_RECORD_SIZE])
    }

    /// Report list at `offset`, `None` for offset 0
    pub fn reports(&self, offset: u32) -> Result<Option<ReportList<'a>>> {
        if offset == 0 {
            return Ok(None);
        }
        self.report_list_at(offset)
            .map(Some)
            .map_err(Error::malformed)
    }

    /// Bounds-checked report list, or the reason it does not fit
    fn report_list_at(&self, offset: u32) -> std::result::Result<ReportList<'a>, String> {
        let length = self.bytes.len();
        let start = offset as usize;

        let ids_start = start
            .checked_add(REPORT_LIST_HEADER_SIZE)
            .filter(|&end| end <= length)
            .ok_or_else(|| format!("report list at {} past blob length {}", offset, length))?;

        let count = read_u32(self.bytes, start) as usize;
        let ids_end = count
            .checked_mul(REPORT_ID_SIZE)
            .and_then(|size| ids_start.checked_add(size))
            .filter(|&end| end <= length)
            .ok_or_else(|| {
                format!(
                    "report list at {} with {} entries overruns blob length {}",
                    offset, count, length
                )
            })?;

        Ok(ReportList::new(offset, &self.bytes[ids_start..ids_end]))
    }

    /// Acceleration descriptor of `state`, `None` when it has none
    pub fn accel(&self, state: StateId) -> Result<Option<AccelView<'a>>> {
        let aux = self.auxiliary(state)?;
        if aux.accel == 0 {
            return Ok(None);
        }

        let start = aux.accel as usize;
        if start >= self.bytes.len() {
            return Err(Error::malformed(format!(
                "state {} accel offset {} past blob length {}",
                state,
                aux.accel,
                self.bytes.len()
            )));
        }

        Ok(Some(AccelView {
            state,
            offset: aux.accel,
            bytes: &self.bytes[start..],
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::describe::accel::accel_kind;

    /// Two states, every symbol loops on state 1, state 1 accepts with [7].
    fn scenario_a() -> Vec<u8> {
        let mut builder = BlobBuilder::new(2);
        builder.transitions(1, 0..=u8::MAX, Transition::to(1));
        builder.anchored(Transition::to(1)).floating(Transition::to(1));
        builder.top(1, Transition::to(1));
        let reports = builder.report_list([7]);
        builder.accept(1, reports);
        builder.build()
    }

    fn patch_u32(bytes: &mut [u8], at: usize, value: u32) {
        bytes[at..at + 4].copy_from_slice(&value.to_le_bytes());
    }

    #[test]
    fn test_open_valid_program() {
        let blob = scenario_a();
        let program = Program::open(&blob, blob.len()).unwrap();

        assert_eq!(program.state_count(), 2);
        assert_eq!(program.len(), blob.len());
        assert_eq!(program.header().anchored, Transition::to(1));
        assert_eq!(program.states().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn test_decode_every_symbol_stays_in_range() {
        let blob = scenario_a();
        let program = Program::open(&blob, blob.len()).unwrap();

        for state in program.states() {
            for symbol in 0..=u8::MAX {
                let next = program.decode(state, symbol).unwrap();
                assert!(next.state < program.state_count());
            }
        }
        assert_eq!(program.decode(1, b'x').unwrap(), Transition::to(1));
        assert_eq!(program.decode(0, b'x').unwrap(), Transition::to(0));
    }

    #[test]
    fn test_decode_reports_marker_separately() {
        let mut builder = BlobBuilder::new(3);
        builder.transition(1, b'a', Transition::new(2, true));
        let blob = builder.build();
        let program = Program::open(&blob, blob.len()).unwrap();

        let next = program.decode(1, b'a').unwrap();
        assert_eq!(next.state, 2);
        assert!(next.accepting);
    }

    #[test]
    fn test_decode_rejects_source_state_out_of_range() {
        let blob = scenario_a();
        let program = Program::open(&blob, blob.len()).unwrap();

        let err = program.decode(5, 0).unwrap_err();
        assert!(matches!(err, Error::OutOfRangeState { state: 5, .. }));
    }

    #[test]
    fn test_reports_resolve_identically_twice() {
        let blob = scenario_a();
        let program = Program::open(&blob, blob.len()).unwrap();
        let aux = program.auxiliary(1).unwrap();

        let first = program.reports(aux.accept).unwrap().unwrap();
        let second = program.reports(aux.accept).unwrap().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.to_vec(), vec![7]);
        assert_eq!(program.reports(0).unwrap(), None);
    }

    #[test]
    fn test_shared_report_lists_are_kept() {
        let mut builder = BlobBuilder::new(3);
        let shared = builder.report_list([4, 4, 1]);
        builder.accept(1, shared).accept(2, shared).accept_eod(2, shared);
        let blob = builder.build();
        let program = Program::open(&blob, blob.len()).unwrap();

        let one = program.auxiliary(1).unwrap();
        let two = program.auxiliary(2).unwrap();
        assert_eq!(one.accept, two.accept);
        assert_eq!(two.accept, two.accept_eod);
        assert_eq!(
            program.reports(two.accept_eod).unwrap().unwrap().to_vec(),
            vec![4, 4, 1]
        );
    }

    #[test]
    fn test_accel_view_resolves() {
        let mut builder = BlobBuilder::new(2);
        builder.accel(1, &[accel_kind::VERMICELLI, 0, b'z']);
        let blob = builder.build();
        let program = Program::open(&blob, blob.len()).unwrap();

        assert!(program.accel(0).unwrap().is_none());
        let view = program.accel(1).unwrap().unwrap();
        assert_eq!(view.state, 1);
        assert_eq!(&view.bytes[..3], &[accel_kind::VERMICELLI, 0, b'z']);
    }

    #[test]
    fn test_open_rejects_aux_section_overrun() {
        let mut blob = scenario_a();
        let len = blob.len() as u32;
        // aux_offset + state_count * record_size > length
        patch_u32(&mut blob, 20, len - AUX_RECORD_SIZE as u32);

        let err = Program::open(&blob, blob.len()).unwrap_err();
        assert!(matches!(err, Error::MalformedHeader { .. }), "{err}");
    }

    #[test]
    fn test_open_rejects_aux_offset_near_u32_max() {
        let mut blob = scenario_a();
        patch_u32(&mut blob, 20, u32::MAX - 8);

        let err = Program::open(&blob, blob.len()).unwrap_err();
        assert!(matches!(err, Error::MalformedHeader { .. }), "{err}");
    }

    #[test]
    fn test_open_rejects_section_offset_at_length() {
        // report offset lives at 24, accel offset at 28
        for at in [24, 28] {
            let mut blob = scenario_a();
            let len = blob.len() as u32;
            patch_u32(&mut blob, at, len);

            let err = Program::open(&blob, blob.len()).unwrap_err();
            assert!(matches!(err, Error::MalformedHeader { .. }), "{at}: {err}");

            patch_u32(&mut blob, at, len - 1);
            assert!(Program::open(&blob, blob.len()).is_ok(), "{at}");
        }
    }

    #[test]
    fn test_open_rejects_short_buffer() {
        let blob = scenario_a();
        let err = Program::open(&blob[..100], 100).unwrap_err();
        assert!(matches!(err, Error::MalformedHeader { .. }));

        let err = Program::open(&blob[..100], blob.len()).unwrap_err();
        assert!(matches!(err, Error::MalformedHeader { .. }));
    }

    #[test]
    fn test_open_rejects_length_mismatch() {
        let mut blob = scenario_a();
        blob.extend_from_slice(&[0; 16]);

        let err = Program::open(&blob, blob.len()).unwrap_err();
        assert!(matches!(err, Error::MalformedHeader { .. }));
    }

    #[test]
    fn test_open_rejects_other_variants() {
        let mut builder = BlobBuilder::new(2);
        builder.type_tag(EngineType::McClellan8.tag());
        let blob = builder.build();

        let err = Program::open(&blob, blob.len()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedVariant { tag: 1, .. }));
    }

    #[test]
    fn test_open_rejects_bad_state_count() {
        for count in [0u8, 17] {
            let mut blob = scenario_a();
            blob[32] = count;
            let err = Program::open(&blob, blob.len()).unwrap_err();
            assert!(matches!(err, Error::MalformedHeader { .. }), "{count}");
        }
    }

    #[test]
    fn test_open_rejects_out_of_range_transition() {
        let mut builder = BlobBuilder::new(2);
        builder.transition(1, b'q', Transition::to(5));
        let blob = builder.build();

        let err = Program::open(&blob, blob.len()).unwrap_err();
        assert!(matches!(err, Error::OutOfRangeState { state: 5, .. }), "{err}");
    }

    #[test]
    fn test_open_rejects_out_of_range_top_and_start() {
        let mut builder = BlobBuilder::new(2);
        builder.top(1, Transition::to(3));
        let blob = builder.build();
        let err = Program::open(&blob, blob.len()).unwrap_err();
        assert!(matches!(err, Error::OutOfRangeState { state: 3, .. }));

        let mut builder = BlobBuilder::new(2);
        builder.floating(Transition::to(9));
        let blob = builder.build();
        let err = Program::open(&blob, blob.len()).unwrap_err();
        assert!(matches!(err, Error::OutOfRangeState { state: 9, .. }));
    }

    #[test]
    fn test_open_rejects_overrunning_report_list() {
        let mut blob = scenario_a();
        let program = Program::open(&blob, blob.len()).unwrap();
        let offset = program.auxiliary(1).unwrap().accept as usize;
        patch_u32(&mut blob, offset, 1_000_000);

        let err = Program::open(&blob, blob.len()).unwrap_err();
        assert!(matches!(err, Error::MalformedHeader { .. }), "{err}");
    }
}
