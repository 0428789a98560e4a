//! Identity types for rooms and players.
//!
//! Both are "newtype wrappers" around `String`: you can't pass a
//! `RoomCode` where a `PlayerId` is expected even though both are text on
//! the wire.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Characters used in generated room codes.
const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of a generated room code.
pub(crate) const ROOM_CODE_LEN: usize = 6;

/// The external-facing identifier of a room, e.g. `"K7QX2M"`.
///
/// Codes are case-normalized: surrounding whitespace is trimmed and ASCII
/// letters are uppercased, so `" k7qx2m"` and `"K7QX2M"` name the same
/// room. Normalization happens on construction AND on deserialization
/// (`#[serde(from = "String")]`), so every lookup sees the canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Normalizes `raw` into a room code.
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_ascii_uppercase())
    }

    /// Like [`new`](Self::new), but returns `None` for blank input so
    /// callers can fall back to a generated code.
    pub fn parse(raw: &str) -> Option<Self> {
        let code = Self::new(raw);
        (!code.0.is_empty()).then_some(code)
    }

    /// Generates a short random alphanumeric code.
    ///
    /// 36^6 ≈ 2.2 billion codes; collisions are only guarded against by
    /// the registry's existence check.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let code = (0..ROOM_CODE_LEN)
            .map(|_| {
                ROOM_CODE_ALPHABET[rng.random_range(0..ROOM_CODE_ALPHABET.len())]
                    as char
            })
            .collect();
        Self(code)
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RoomCode {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl From<&str> for RoomCode {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A player's identifier, unique within a room.
///
/// Clients usually supply their own; when they don't, the server generates
/// one with [`PlayerId::generate`]. `#[serde(transparent)]` makes it a
/// plain JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    /// Generates a random 16-character hex identifier (64 bits).
    pub fn generate() -> Self {
        let bytes: [u8; 8] = rand::rng().random();
        Self(bytes.iter().map(|b| format!("{b:02x}")).collect())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlayerId {
    fn from(raw: &str) -> Self {
        Self(raw.to_owned())
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
