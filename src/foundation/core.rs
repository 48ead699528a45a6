use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::foundation::error::{BackdropError, BackdropResult};

pub use kurbo::{Point, Rect, Size};

/// Opaque sRGB color, written as `#rrggbb` at every text boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb8 {
    pub const WHITE: Self = Self::new(255, 255, 255);
    pub const BLACK: Self = Self::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` or `#RGB` (case-insensitive, `#` optional).
    pub fn parse_hex(s: &str) -> BackdropResult<Self> {
        let t = s.trim();
        let t = t.strip_prefix('#').unwrap_or(t);
        if !t.is_ascii() {
            return Err(BackdropError::validation(format!(
                "color '{s}' must be #RRGGBB or #RGB"
            )));
        }

        fn nibble(c: u8) -> Option<u8> {
            match c {
                b'0'..=b'9' => Some(c - b'0'),
                b'a'..=b'f' => Some(c - b'a' + 10),
                b'A'..=b'F' => Some(c - b'A' + 10),
                _ => None,
            }
        }

        let bytes = t.as_bytes();
        let parsed = match bytes.len() {
            6 => bytes
                .chunks_exact(2)
                .map(|p| Some(nibble(p[0])? << 4 | nibble(p[1])?))
                .collect::<Option<Vec<u8>>>(),
            3 => bytes
                .iter()
                .map(|&c| nibble(c).map(|n| n << 4 | n))
                .collect::<Option<Vec<u8>>>(),
            _ => None,
        };

        match parsed.as_deref() {
            Some(&[r, g, b]) => Ok(Self { r, g, b }),
            _ => Err(BackdropError::validation(format!(
                "color '{s}' must be #RRGGBB or #RGB"
            ))),
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Rgb8 {
    type Err = BackdropError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_hex(s)
    }
}

impl Serialize for Rgb8 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgb8 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse_hex(&s).map_err(serde::de::Error::custom)
    }
}
