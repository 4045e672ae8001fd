//! Transition bytes and the per-symbol lookup table
//!
//! Every (state, symbol) pair is stored as one byte: the low nibble holds the
//! next-state id and the high bit marks a transition that coincides with
//! acceptance. The execution path loads one 16-lane vector per input symbol and
//! advances all in-flight states with a single byte shuffle, testing the marker
//! bit across every lane at once. Here lanes are read one at a time.

use serde::Serialize;
use std::fmt;

/// Number of lanes in a lookup vector, and the maximum number of states.
pub const LANES: usize = 16;

/// Number of input symbols (one lookup vector per byte value).
pub const SYMBOLS: usize = 256;

/// Bits of a transition byte holding the next-state id.
pub const STATE_MASK: u8 = 0x0f;

/// Bit of a transition byte marking an accepting transition.
pub const ACCEPT_FLAG: u8 = 0x80;

pub type StateId = u8;

/// A decoded transition byte: target state plus accepting marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Transition {
    pub state: StateId,
    pub accepting: bool,
}

impl Transition {
    pub fn new(state: StateId, accepting: bool) -> Self {
        Self { state, accepting }
    }

    /// Plain, non-accepting transition to `state`
    pub fn to(state: StateId) -> Self {
        Self::new(state, false)
    }

    /// Split a raw byte into id and marker. Bits 4..7 belong to the
    /// execution path and are ignored.
    pub fn decode(byte: u8) -> Self {
        Self {
            state: byte & STATE_MASK,
            accepting: byte & ACCEPT_FLAG != 0,
        }
    }

    pub fn encode(self) -> u8 {
        let marker = if self.accepting { ACCEPT_FLAG } else { 0 };
        (self.state & STATE_MASK) | marker
    }

    /// Whether this transition names the sentinel "no transition" state
    pub fn is_dead(self) -> bool {
        self.state == 0
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.accepting {
            write!(f, "{}*", self.state)
        } else {
            write!(f, "{}", self.state)
        }
    }
}

/// Borrowed view over the 256 lookup vectors
#[derive(Debug, Clone, Copy)]
pub struct TransitionTable<'a> {
    vectors: &'a [[u8; LANES]],
}

impl<'a> TransitionTable<'a> {
    /// Size in bytes of a full table.
    pub const SIZE: usize = SYMBOLS * LANES;

    /// Wrap a slice of exactly [`Self::SIZE`] bytes.
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        debug_assert_eq!(bytes.len(), Self::SIZE);
        let (vectors, _) = bytes.as_chunks::<LANES>();
        Self { vectors }
    }

    /// The lookup vector for one input symbol
    pub fn vector(&self, symbol: u8) -> &'a [u8; LANES] {
        &self.vectors[usize::from(symbol)]
    }

    /// Raw lane for `state` within the vector for `symbol`
    pub fn lane(&self, state: StateId, symbol: u8) -> Transition {
        Transition::decode(self.vector(symbol)[usize::from(state) & (LANES - 1)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_splits_marker() {
        assert_eq!(Transition::decode(0x83), Transition::new(3, true));
        assert_eq!(Transition::decode(0x03), Transition::new(3, false));
        assert_eq!(Transition::decode(0x00), Transition::new(0, false));
    }

    #[test]
    fn test_decode_ignores_reserved_bits() {
        assert_eq!(Transition::decode(0x72), Transition::new(2, false));
        assert_eq!(Transition::decode(0xf2), Transition::new(2, true));
    }

    #[test]
    fn test_encode_matches_decode() {
        for byte in [0x00, 0x01, 0x0f, 0x80, 0x8a] {
            assert_eq!(Transition::decode(byte).encode(), byte);
        }
    }

    #[test]
    fn test_display_marks_accepting() {
        assert_eq!(Transition::new(4, true).to_string(), "4*");
        assert_eq!(Transition::to(4).to_string(), "4");
    }

    #[test]
    fn test_table_lane_lookup() {
        let mut bytes = vec![0u8; TransitionTable::SIZE];
        // symbol 'a', lane 2 -> 3 accepting
        bytes[usize::from(b'a') * LANES + 2] = 0x83;
        let table = TransitionTable::new(&bytes);

        assert_eq!(table.lane(2, b'a'), Transition::new(3, true));
        assert_eq!(table.lane(2, b'b'), Transition::to(0));
        assert_eq!(table.vector(b'a')[2], 0x83);
    }
}
