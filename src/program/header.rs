//! Container and engine header layout
//!
//! The blob opens with a 16-byte container header shared by every engine
//! variant, followed by the sheng engine header and its transition table.
//! All integers are little-endian; offsets are relative to the blob base.

use crate::program::transition::{Transition, TransitionTable};
use serde::Serialize;

/// Size of the container header shared by all engine variants.
pub const CONTAINER_HEADER_SIZE: usize = 16;

/// Start of the sheng engine header.
pub const ENGINE_HEADER_OFFSET: usize = CONTAINER_HEADER_SIZE;

/// Size of the sheng engine header, padded to keep the table 16-byte aligned.
pub const ENGINE_HEADER_SIZE: usize = 32;

/// Start of the transition table.
pub const TABLE_OFFSET: usize = ENGINE_HEADER_OFFSET + ENGINE_HEADER_SIZE;

/// Smallest blob that can hold both headers and the table.
pub const MIN_BLOB_SIZE: usize = TABLE_OFFSET + TransitionTable::SIZE;

/// Engine variants sharing the outer container format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u8)]
pub enum EngineType {
    McClellan8 = 1,
    McClellan16 = 2,
    Gough8 = 3,
    Gough16 = 4,
    Castle = 5,
    Sheng = 6,
    Sheng32 = 7,
    Sheng64 = 8,
    Tamarama = 9,
}

impl EngineType {
    pub fn from_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            1 => EngineType::McClellan8,
            2 => EngineType::McClellan16,
            3 => EngineType::Gough8,
            4 => EngineType::Gough16,
            5 => EngineType::Castle,
            6 => EngineType::Sheng,
            7 => EngineType::Sheng32,
            8 => EngineType::Sheng64,
            9 => EngineType::Tamarama,
            _ => return None,
        })
    }

    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            EngineType::McClellan8 => "McClellan8",
            EngineType::McClellan16 => "McClellan16",
            EngineType::Gough8 => "Gough8",
            EngineType::Gough16 => "Gough16",
            EngineType::Castle => "Castle",
            EngineType::Sheng => "Sheng",
            EngineType::Sheng32 => "Sheng32",
            EngineType::Sheng64 => "Sheng64",
            EngineType::Tamarama => "Tamarama",
        }
    }

    /// Name for a raw tag, `"unknown"` when no variant uses it
    pub fn describe_tag(tag: u8) -> &'static str {
        Self::from_tag(tag).map(Self::name).unwrap_or("unknown")
    }
}

/// Engine-wide boolean flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Flags {
    pub has_accel: bool,
    pub can_die: bool,
    pub single_report: bool,
}

impl Flags {
    pub const HAS_ACCEL: u8 = 1;
    pub const CAN_DIE: u8 = 1 << 1;
    pub const SINGLE_REPORT: u8 = 1 << 2;

    pub fn from_bits(bits: u8) -> Self {
        Self {
            has_accel: bits & Self::HAS_ACCEL != 0,
            can_die: bits & Self::CAN_DIE != 0,
            single_report: bits & Self::SINGLE_REPORT != 0,
        }
    }

    pub fn bits(self) -> u8 {
        let mut bits = 0;
        if self.has_accel {
            bits |= Self::HAS_ACCEL;
        }
        if self.can_die {
            bits |= Self::CAN_DIE;
        }
        if self.single_report {
            bits |= Self::SINGLE_REPORT;
        }
        bits
    }
}

/// Decoded header fields. Values are raw: [`crate::program::Program::open`]
/// checks them against the declared length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Header {
    pub container_length: u32,
    pub type_tag: u8,
    pub length: u32,
    pub aux_offset: u32,
    pub report_offset: u32,
    pub accel_offset: u32,
    pub state_count: u8,
    pub anchored: Transition,
    pub floating: Transition,
    pub flags: Flags,
}

impl Header {
    /// Read both headers. `bytes` must hold at least [`TABLE_OFFSET`] bytes.
    pub(crate) fn parse(bytes: &[u8]) -> Self {
        debug_assert!(bytes.len() >= TABLE_OFFSET);
        let engine = &bytes[ENGINE_HEADER_OFFSET..];

        Self {
            container_length: read_u32(bytes, 0),
            type_tag: bytes[4],
            length: read_u32(engine, 0),
            aux_offset: read_u32(engine, 4),
            report_offset: read_u32(engine, 8),
            accel_offset: read_u32(engine, 12),
            state_count: engine[16],
            anchored: Transition::decode(engine[17]),
            floating: Transition::decode(engine[18]),
            flags: Flags::from_bits(engine[19]),
        }
    }

    /// Serialize both headers into the first [`TABLE_OFFSET`] bytes of `out`.
    pub(crate) fn write(&self, out: &mut [u8]) {
        out[0..4].copy_from_slice(&self.container_length.to_le_bytes());
        out[4] = self.type_tag;

        let engine = &mut out[ENGINE_HEADER_OFFSET..TABLE_OFFSET];
        engine[0..4].copy_from_slice(&self.length.to_le_bytes());
        engine[4..8].copy_from_slice(&self.aux_offset.to_le_bytes());
        engine[8..12].copy_from_slice(&self.report_offset.to_le_bytes());
        engine[12..16].copy_from_slice(&self.accel_offset.to_le_bytes());
        engine[16] = self.state_count;
        engine[17] = self.anchored.encode();
        engine[18] = self.floating.encode();
        engine[19] = self.flags.bits();
    }
}

/// Little-endian u32 at `at`. Callers guarantee `at + 4 <= bytes.len()`.
pub(crate) fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}
