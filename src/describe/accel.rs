//! Default acceleration describer
//!
//! Descriptor layout: kind tag, scan offset, then a kind-specific payload.

use super::charclass::ByteSet;
use super::{AccelDescriber, ClassDescriber, ClassMode, CharClassDescriber};
use crate::program::AccelView;
use crate::{Error, Result};

/// Acceleration descriptor kind tags
pub mod accel_kind {
    pub const NONE: u8 = 0;
    pub const VERMICELLI: u8 = 1;
    pub const VERMICELLI_NOCASE: u8 = 2;
    pub const DOUBLE_VERMICELLI: u8 = 3;
    pub const DOUBLE_VERMICELLI_NOCASE: u8 = 4;
    pub const SHUFTI: u8 = 5;
    pub const TRUFFLE: u8 = 6;
    pub const RED_TAPE: u8 = 7;
}

/// Bytes of mask payload shown for shufti and truffle.
const MASK_WINDOW: usize = 32;

const PAYLOAD_START: usize = 2;

#[derive(Debug, Clone, Copy, Default)]
pub struct AccelInfoDescriber {
    class: CharClassDescriber,
}

impl AccelInfoDescriber {
    pub fn new(class: CharClassDescriber) -> Self {
        Self { class }
    }

    fn chars(&self, payload: &[u8], count: usize, offset: u32) -> Result<String> {
        if payload.len() < count {
            return Err(Error::malformed(format!(
                "acceleration descriptor at {} truncated",
                offset
            )));
        }
        Ok(payload[..count]
            .iter()
            .map(|&c| {
                let set: ByteSet = [c].into_iter().collect();
                self.class.describe(&set, ClassMode::Text)
            })
            .collect())
    }
}

pub fn kind_name(kind: u8) -> &'static str {
    match kind {
        accel_kind::NONE => "none",
        accel_kind::VERMICELLI => "vermicelli",
        accel_kind::VERMICELLI_NOCASE => "vermicelli nocase",
        accel_kind::DOUBLE_VERMICELLI => "double vermicelli",
        accel_kind::DOUBLE_VERMICELLI_NOCASE => "double vermicelli nocase",
        accel_kind::SHUFTI => "shufti",
        accel_kind::TRUFFLE => "truffle",
        accel_kind::RED_TAPE => "red tape",
        _ => "unknown",
    }
}

impl AccelDescriber for AccelInfoDescriber {
    fn describe(&self, accel: AccelView<'_>) -> Result<String> {
        let Some(&kind) = accel.bytes.first() else {
            return Err(Error::malformed(format!(
                "acceleration descriptor at {} is empty",
                accel.offset
            )));
        };
        if kind == accel_kind::NONE {
            return Ok("  kind: none".to_string());
        }

        let scan_offset = accel.bytes.get(1).copied().ok_or_else(|| {
            Error::malformed(format!(
                "acceleration descriptor at {} truncated",
                accel.offset
            ))
        })?;
        let payload = &accel.bytes[PAYLOAD_START..];
        let head = format!("  kind: {}, offset: {}", kind_name(kind), scan_offset);

        let detail = match kind {
            accel_kind::VERMICELLI | accel_kind::VERMICELLI_NOCASE => {
                format!(", char: {}", self.chars(payload, 1, accel.offset)?)
            }
            accel_kind::DOUBLE_VERMICELLI | accel_kind::DOUBLE_VERMICELLI_NOCASE => {
                format!(", chars: {}", self.chars(payload, 2, accel.offset)?)
            }
            accel_kind::SHUFTI | accel_kind::TRUFFLE => {
                let window = &payload[..payload.len().min(MASK_WINDOW)];
                format!(", masks: {}", hex::encode(window))
            }
            accel_kind::RED_TAPE => String::new(),
            other => format!(" (tag {:#04x})", other),
        };

        Ok(format!("{}{}", head, detail))
    }
}
