//! Core data types for WatchVis
//!
//! This module contains the fundamental data structures used throughout
//! the application for describing remote watchers and their buffer
//! element encodings.
//!
//! # Main Types
//!
//! - [`WatcherKind`] - Closed enum of supported buffer element encodings
//! - [`WatcherDescriptor`] - A remote variable as reported by the board's
//!   `list` response
//!
//! # Element Encodings
//!
//! The board tags every buffer with a one-character type code describing
//! how its elements (and the leading timestamp) are encoded:
//!
//! | code | kind | timestamp words |
//! |------|------|-----------------|
//! | `c`  | char/byte | 8 bytes packed into two 32-bit words |
//! | `j`  | unsigned 32-bit | 2 elements |
//! | `i`  | signed 32-bit | 2 elements |
//! | `f`  | 32-bit float | 2 elements |
//! | `d`  | 64-bit float | 1 element |

use serde::{Deserialize, Serialize};

/// Element encoding of a watcher's buffer, identified on the wire by a
/// one-character type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WatcherKind {
    /// `c` - char/byte elements, timestamp packed into the first 8 bytes
    Char,
    /// `j` - unsigned 32-bit integer elements
    U32,
    /// `i` - signed 32-bit integer elements
    I32,
    /// `f` - 32-bit float elements
    F32,
    /// `d` - 64-bit float elements
    F64,
}

impl WatcherKind {
    /// Parse a wire type code. Unknown codes yield `None`; callers skip
    /// the buffer rather than fail.
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'c' => Some(WatcherKind::Char),
            'j' => Some(WatcherKind::U32),
            'i' => Some(WatcherKind::I32),
            'f' => Some(WatcherKind::F32),
            'd' => Some(WatcherKind::F64),
            _ => None,
        }
    }

    /// The wire type code for this kind
    pub fn code(self) -> char {
        match self {
            WatcherKind::Char => 'c',
            WatcherKind::U32 => 'j',
            WatcherKind::I32 => 'i',
            WatcherKind::F32 => 'f',
            WatcherKind::F64 => 'd',
        }
    }

    /// Number of leading buffer elements that carry the 64-bit timestamp
    pub fn timestamp_len(self) -> usize {
        match self {
            WatcherKind::Char => 8,
            WatcherKind::U32 | WatcherKind::I32 | WatcherKind::F32 => 2,
            WatcherKind::F64 => 1,
        }
    }

    /// Whether values of this kind accept a bitmask on write.
    /// Floating-point kinds do not; the board has no masked write for them.
    pub fn has_mask(self) -> bool {
        !matches!(self, WatcherKind::F32 | WatcherKind::F64)
    }
}

impl std::fmt::Display for WatcherKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Whether a raw one-character type code denotes a maskable (integer) kind.
///
/// Mirrors [`WatcherKind::has_mask`] but operates on the raw code so that a
/// descriptor with an unknown code still gets the integer treatment.
pub fn code_has_mask(code: &str) -> bool {
    code != "d" && code != "f"
}

/// A remote variable as reported by the board in a `list` response.
///
/// Read-only to the UI except via explicit commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherDescriptor {
    /// Unique variable name
    pub name: String,
    /// One-character element type code (see [`WatcherKind`])
    #[serde(rename = "type", default)]
    pub type_code: String,
    /// Whether the board is currently streaming this variable
    #[serde(default, deserialize_with = "truthy")]
    pub watched: bool,
    /// Whether the board accepts remote value writes for this variable
    #[serde(default, deserialize_with = "truthy")]
    pub controlled: bool,
    /// Whether the board is logging this variable to storage
    #[serde(default, deserialize_with = "truthy")]
    pub logged: bool,
    /// Current scalar value
    #[serde(default)]
    pub value: f64,
    /// Monitoring period in ticks (0 = disabled)
    #[serde(default)]
    pub monitor: u32,
    /// Advisory log file name, shown as a tooltip
    #[serde(rename = "logFileName", default)]
    pub log_file_name: String,
}

impl WatcherDescriptor {
    /// Parse the descriptor's element kind from its type code
    pub fn kind(&self) -> Option<WatcherKind> {
        self.type_code.chars().next().and_then(WatcherKind::from_code)
    }
}

/// Deserialize a flag that the board may encode as a bool or as a number.
///
/// Older firmware serializes the logged state as a small integer enum.
fn truthy<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Truthy {
        Bool(bool),
        Num(f64),
    }

    Ok(match Truthy::deserialize(deserializer)? {
        Truthy::Bool(b) => b,
        Truthy::Num(n) => n != 0.0,
    })
}
