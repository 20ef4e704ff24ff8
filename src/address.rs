//! Dotted four-octet addresses with a configurable octet width.
//!
//! An [`Address`] is parsed once from text and never normalized: `Display`
//! echoes the exact input so results can be matched back to the source rows.
//! Octets are plain unsigned integers in `[0, 2^bits)`. In mask mode every
//! octet must additionally be a run of high-order one bits
//! (`2^bits - 2^i` for `i` in `0..=bits`).

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Octet width used when none is given.
pub const DEFAULT_OCTET_BITS: u32 = 8;

/// Widest supported octet. Keeps `2^bits` representable in a `u64`.
pub const MAX_OCTET_BITS: u32 = 32;

/// Number of octets in an address.
pub const OCTET_COUNT: usize = 4;

/// Which rule an address string broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationKind {
    MalformedFormat,
    NotNumeric,
    OutOfRange,
    InvalidMaskOctet,
    InvalidBitWidth,
}

/// Address parsing failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("'{text}' is not four dot-separated octets")]
    MalformedFormat { text: String },

    #[error("octet '{octet}' of '{text}' is not a plain decimal number")]
    NotNumeric { text: String, octet: String },

    #[error("octet '{octet}' of '{text}' does not fit in {bits} bits")]
    OutOfRange {
        text: String,
        octet: String,
        bits: u32,
    },

    #[error("octet {value} of '{text}' is not a valid {bits}-bit netmask value")]
    InvalidMaskOctet { text: String, value: u64, bits: u32 },

    #[error("octet width must be between 1 and 32 bits, got {bits}")]
    InvalidBitWidth { bits: u32 },
}

impl ValidationError {
    pub fn kind(&self) -> ValidationKind {
        match self {
            ValidationError::MalformedFormat { .. } => ValidationKind::MalformedFormat,
            ValidationError::NotNumeric { .. } => ValidationKind::NotNumeric,
            ValidationError::OutOfRange { .. } => ValidationKind::OutOfRange,
            ValidationError::InvalidMaskOctet { .. } => ValidationKind::InvalidMaskOctet,
            ValidationError::InvalidBitWidth { .. } => ValidationKind::InvalidBitWidth,
        }
    }
}

/// A validated address: four octets plus the text it was parsed from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    raw: String,
    octets: [u64; OCTET_COUNT],
    bits: u32,
    is_mask: bool,
}

impl Address {
    /// Parse a host/network address with 8-bit octets.
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        Self::parse_with(text, DEFAULT_OCTET_BITS, false)
    }

    /// Parse a netmask with the given octet width.
    pub fn parse_mask(text: &str, bits: u32) -> Result<Self, ValidationError> {
        Self::parse_with(text, bits, true)
    }

    /// Parse with an explicit octet width and mask mode.
    pub fn parse_with(text: &str, bits: u32, is_mask: bool) -> Result<Self, ValidationError> {
        if bits == 0 || bits > MAX_OCTET_BITS {
            return Err(ValidationError::InvalidBitWidth { bits });
        }

        let parts: Vec<&str> = text.split('.').collect();
        if parts.len() != OCTET_COUNT || parts.iter().any(|p| p.is_empty()) {
            return Err(ValidationError::MalformedFormat { text: text.into() });
        }

        let limit = 1u64 << bits;
        let mut octets = [0u64; OCTET_COUNT];
        for (slot, part) in octets.iter_mut().zip(&parts) {
            let value = parse_octet(text, part, bits)?;
            if is_mask {
                if !is_mask_value(value, bits) {
                    return Err(ValidationError::InvalidMaskOctet {
                        text: text.into(),
                        value,
                        bits,
                    });
                }
            } else if value >= limit {
                return Err(ValidationError::OutOfRange {
                    text: text.into(),
                    octet: (*part).into(),
                    bits,
                });
            }
            *slot = value;
        }

        Ok(Self {
            raw: text.into(),
            octets,
            bits,
            is_mask,
        })
    }

    /// The text this address was parsed from, verbatim.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn octets(&self) -> [u64; OCTET_COUNT] {
        self.octets
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn is_mask(&self) -> bool {
        self.is_mask
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for Address {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}

/// All canonical netmask octet values for a width, largest first.
///
/// For 8 bits: 255, 254, 252, 248, 240, 224, 192, 128, 0.
pub fn valid_mask_values(bits: u32) -> Vec<u64> {
    if bits == 0 || bits > MAX_OCTET_BITS {
        return Vec::new();
    }
    let full = 1u64 << bits;
    (0..=bits).map(|i| full - (1u64 << i)).collect()
}

/// True if `value` is a run of one bits followed by zero bits within `bits`.
pub fn is_mask_value(value: u64, bits: u32) -> bool {
    if bits == 0 || bits > MAX_OCTET_BITS {
        return false;
    }
    let full = 1u64 << bits;
    value < full && (full - value).is_power_of_two()
}

fn parse_octet(text: &str, part: &str, bits: u32) -> Result<u64, ValidationError> {
    let not_numeric = || ValidationError::NotNumeric {
        text: text.into(),
        octet: part.into(),
    };

    if !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(not_numeric());
    }
    // "01" would silently become 1 and break the verbatim echo.
    if part.len() > 1 && part.starts_with('0') {
        return Err(not_numeric());
    }
    // Only digits remain, so the only possible failure is overflow.
    part.parse::<u64>().map_err(|_| ValidationError::OutOfRange {
        text: text.into(),
        octet: part.into(),
        bits,
    })
}
