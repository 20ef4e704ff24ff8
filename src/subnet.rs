//! Subnet membership.
//!
//! Membership is decided by AND-ing each candidate octet with the mask and
//! comparing the dotted result, as text, with the network address exactly as
//! the user typed it. The network itself is never masked: a network given with
//! host bits set (`10.0.0.5` / `255.255.255.0`) matches nothing.

use crate::address::Address;
use crate::errors::{IspCheckError, Result};

/// A network address paired with its mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkSpec {
    network: Address,
    mask: Address,
}

impl NetworkSpec {
    /// Pair a network with a mask. Both must use the same octet width.
    pub fn new(network: Address, mask: Address) -> Result<Self> {
        ensure_same_width(&network, &mask)?;
        Ok(Self { network, mask })
    }

    pub fn network(&self) -> &Address {
        &self.network
    }

    pub fn mask(&self) -> &Address {
        &self.mask
    }

    pub fn bits(&self) -> u32 {
        self.network.bits()
    }

    /// Whether `candidate` lies inside this network.
    pub fn contains(&self, candidate: &Address) -> Result<bool> {
        matches(&self.network, &self.mask, candidate)
    }
}

/// Test `candidate` against `network`/`mask`.
///
/// Fails with [`IspCheckError::BitWidthMismatch`] when the three addresses do
/// not share one octet width.
pub fn matches(network: &Address, mask: &Address, candidate: &Address) -> Result<bool> {
    ensure_same_width(network, mask)?;
    ensure_same_width(network, candidate)?;
    Ok(masked_text(candidate, mask) == network.as_str())
}

/// Dotted text of `candidate & mask`, octet by octet.
pub fn masked_text(candidate: &Address, mask: &Address) -> String {
    let c = candidate.octets();
    let m = mask.octets();
    c.iter()
        .zip(m.iter())
        .map(|(c, m)| (c & m).to_string())
        .collect::<Vec<_>>()
        .join(".")
}

fn ensure_same_width(expected: &Address, other: &Address) -> Result<()> {
    if expected.bits() != other.bits() {
        return Err(IspCheckError::BitWidthMismatch {
            expected: expected.bits(),
            found: other.bits(),
        });
    }
    Ok(())
}
