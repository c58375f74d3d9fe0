use crate::error::TypesError;
use std::fmt;
use std::str::FromStr;

/// 20-byte account or resource address.
/// Display format: lowercase hex with a `0x` prefix.
///
/// The all-zero address doubles as the `ANYONE` sentinel: a role granted to
/// it is held by every account.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address([u8; 20]);

impl Address {
    pub const ZERO: Self = Self([0u8; 20]);
    pub const ANYONE: Self = Self::ZERO;
    pub const LEN: usize = 20;

    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Create from a byte slice
    pub fn from_slice(slice: &[u8]) -> Result<Self, TypesError> {
        if slice.len() != Self::LEN {
            return Err(TypesError::InvalidAddressLength(slice.len()));
        }
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(slice);
        Ok(Self(bytes))
    }

    /// Derive an address from an ed25519 public key: `blake3(pubkey)[0..20]`.
    pub fn from_public_key(pubkey: &[u8; 32]) -> Self {
        Self::derive(pubkey)
    }

    /// Derive a deterministic address from arbitrary seed bytes.
    ///
    /// Used for deployment addresses (`"agora/timelock"`, ...) and test
    /// accounts.
    pub fn derive(seed: &[u8]) -> Self {
        let hash = blake3::hash(seed);
        let mut addr = [0u8; 20];
        addr.copy_from_slice(&hash.as_bytes()[..20]);
        Self(addr)
    }

    /// Check if this is the zero address
    pub fn is_zero(&self) -> bool {
        self == &Self::ZERO
    }

    /// Convert to hex string without 0x prefix
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address(0x{})", self.to_hex())
    }
}

impl fmt::LowerHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex_part = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| TypesError::InvalidAddressFormat(s.to_string()))?;
        let bytes = hex::decode(hex_part)?;
        Self::from_slice(&bytes)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anyone_is_zero() {
        assert_eq!(Address::ANYONE, Address::ZERO);
        assert!(Address::ANYONE.is_zero());
    }

    #[test]
    fn test_derive_is_deterministic() {
        let a = Address::derive(b"agora/timelock");
        assert_eq!(a, Address::derive(b"agora/timelock"));
        assert_ne!(a, Address::derive(b"agora/governor"));
        assert!(!a.is_zero());
    }

    #[test]
    fn test_public_key_matches_derive() {
        let pubkey = [42u8; 32];
        assert_eq!(Address::from_public_key(&pubkey), Address::derive(&pubkey));
    }

    #[test]
    fn test_address_hex_roundtrip() {
        let addr = Address::from_bytes([0xabu8; 20]);
        let parsed: Address = addr.to_string().parse().unwrap();
        assert_eq!(addr, parsed);
    }

    #[test]
    fn test_address_from_str_invalid() {
        assert!(Address::from_str("abcd").is_err());
        assert!(Address::from_str("0x1234").is_err());
        assert!(Address::from_str("0xzz").is_err());
    }

    proptest::proptest! {
        #[test]
        fn prop_from_slice_requires_twenty_bytes(bytes in proptest::collection::vec(proptest::prelude::any::<u8>(), 0..48)) {
            let parsed = Address::from_slice(&bytes);
            proptest::prop_assert_eq!(parsed.is_ok(), bytes.len() == 20);
        }
    }
}
