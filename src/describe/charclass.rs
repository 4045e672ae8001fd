//! Byte sets and their compact character-class descriptions

use super::{ClassDescriber, ClassMode};

/// Default number of ranges printed before a class is cut short with `...`.
pub const DEFAULT_MAX_RANGES: usize = 5;

/// A set of byte values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ByteSet {
    words: [u64; 4],
}

impl ByteSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn full() -> Self {
        Self {
            words: [u64::MAX; 4],
        }
    }

    pub fn insert(&mut self, byte: u8) {
        self.words[usize::from(byte >> 6)] |= 1u64 << (byte & 63);
    }

    pub fn contains(&self, byte: u8) -> bool {
        self.words[usize::from(byte >> 6)] & (1u64 << (byte & 63)) != 0
    }

    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    pub fn is_full(&self) -> bool {
        self.words.iter().all(|&w| w == u64::MAX)
    }

    pub fn complement(&self) -> Self {
        Self {
            words: self.words.map(|w| !w),
        }
    }

    pub fn is_disjoint(&self, other: &Self) -> bool {
        self.words.iter().zip(&other.words).all(|(a, b)| a & b == 0)
    }

    pub fn union(&self, other: &Self) -> Self {
        let mut words = self.words;
        for (w, o) in words.iter_mut().zip(&other.words) {
            *w |= o;
        }
        Self { words }
    }

    /// Members in ascending order
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (0..=u8::MAX).filter(|&b| self.contains(b))
    }

    /// Maximal runs of consecutive members, ascending
    pub fn ranges(&self) -> Vec<(u8, u8)> {
        let mut ranges: Vec<(u8, u8)> = Vec::new();
        for byte in self.iter() {
            match ranges.last_mut() {
                Some((_, hi)) if u16::from(*hi) + 1 == u16::from(byte) => *hi = byte,
                _ => ranges.push((byte, byte)),
            }
        }
        ranges
    }
}

impl FromIterator<u8> for ByteSet {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        let mut set = Self::new();
        for byte in iter {
            set.insert(byte);
        }
        set
    }
}

/// Default class describer: ranges, negation when shorter, `\xHH` escapes
#[derive(Debug, Clone, Copy)]
pub struct CharClassDescriber {
    pub max_ranges: usize,
}

impl Default for CharClassDescriber {
    fn default() -> Self {
        Self {
            max_ranges: DEFAULT_MAX_RANGES,
        }
    }
}

impl CharClassDescriber {
    pub fn new(max_ranges: usize) -> Self {
        Self {
            max_ranges: max_ranges.max(1),
        }
    }

    fn describe_text(&self, set: &ByteSet) -> String {
        if set.is_full() {
            return "<any>".to_string();
        }
        if set.is_empty() {
            return "<empty>".to_string();
        }

        let negated = set.complement();
        if set.len() == 1 {
            return set.iter().map(describe_byte).collect();
        }
        if negated.len() == 1 {
            let byte: String = negated.iter().map(describe_byte).collect();
            return format!("[^{}]", byte);
        }

        let positive = format!("[{}]", self.bracket_body(set));
        let negative = format!("[^{}]", self.bracket_body(&negated));
        if negative.len() < positive.len() {
            negative
        } else {
            positive
        }
    }

    fn bracket_body(&self, set: &ByteSet) -> String {
        let ranges = set.ranges();
        let mut body = String::new();

        for &(lo, hi) in ranges.iter().take(self.max_ranges) {
            body.push_str(&describe_byte(lo));
            match hi - lo {
                0 => {}
                1 => body.push_str(&describe_byte(hi)),
                _ => {
                    body.push('-');
                    body.push_str(&describe_byte(hi));
                }
            }
        }
        if ranges.len() > self.max_ranges {
            body.push_str("...");
        }
        body
    }
}

impl ClassDescriber for CharClassDescriber {
    fn describe(&self, set: &ByteSet, mode: ClassMode) -> String {
        let text = self.describe_text(set);
        match mode {
            ClassMode::Text => text,
            ClassMode::DotLabel => escape_dot(&text),
        }
    }
}

/// One byte as it appears inside a class
fn describe_byte(byte: u8) -> String {
    match byte {
        b'\\' | b'[' | b']' | b'^' | b'-' => format!("\\{}", byte as char),
        0x21..=0x7e => (byte as char).to_string(),
        _ => format!("\\x{:02x}", byte),
    }
}

/// Escape text for a double-quoted DOT string
pub fn escape_dot(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            _ => out.push(c),
        }
    }
    out
}
