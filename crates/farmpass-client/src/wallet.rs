use k256::ecdsa::SigningKey;
use rand::rngs::OsRng;
use sha3::{Digest, Keccak256};

use crate::error::CredentialError;

/// A farmer's secp256k1 wallet key. Held in memory only and never
/// serialized; the dashboard request is the one call that carries it.
#[derive(Clone)]
pub struct FarmerCredential {
    signing_key: SigningKey,
}

impl FarmerCredential {
    /// Generate a new random wallet
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::random(&mut OsRng),
        }
    }

    /// Restore from a hex private key, with or without a `0x` prefix
    pub fn from_hex(input: &str) -> Result<Self, CredentialError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(CredentialError::Missing);
        }
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        let bytes = hex::decode(digits).map_err(|_| CredentialError::InvalidHex)?;
        if bytes.len() != 32 {
            return Err(CredentialError::InvalidLength);
        }
        let signing_key = SigningKey::from_slice(&bytes).map_err(|_| CredentialError::InvalidKey)?;
        Ok(Self { signing_key })
    }

    /// EIP-55 checksummed address: last 20 bytes of Keccak-256 over the
    /// uncompressed public key without its `0x04` tag.
    pub fn address(&self) -> String {
        let point = self.signing_key.verifying_key().to_encoded_point(false);
        let hash = Keccak256::digest(&point.as_bytes()[1..]);
        checksum(&hex::encode(&hash[12..]))
    }

    /// `0x`-prefixed private key, shown once after generation so the farmer
    /// can store it.
    pub fn private_key_hex(&self) -> String {
        format!("0x{}", hex::encode(self.signing_key.to_bytes()))
    }
}

impl std::fmt::Debug for FarmerCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FarmerCredential")
            .field("address", &self.address())
            .field("key", &"<redacted>")
            .finish()
    }
}

fn checksum(lower_hex: &str) -> String {
    let hash = Keccak256::digest(lower_hex.as_bytes());
    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, c) in lower_hex.chars().enumerate() {
        let nibble = (hash[i / 2] >> if i % 2 == 0 { 4 } else { 0 }) & 0x0f;
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_ONE: &str = "0x0000000000000000000000000000000000000000000000000000000000000001";

    #[test]
    fn test_known_address() {
        let cred = FarmerCredential::from_hex(KEY_ONE).unwrap();
        assert_eq!(cred.address(), "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf");
    }

    #[test]
    fn test_prefix_optional() {
        let a = FarmerCredential::from_hex(KEY_ONE).unwrap();
        let b = FarmerCredential::from_hex(&KEY_ONE[2..]).unwrap();
        assert_eq!(a.address(), b.address());
    }

    #[test]
    fn test_generate_round_trip() {
        let cred = FarmerCredential::generate();
        let restored = FarmerCredential::from_hex(&cred.private_key_hex()).unwrap();
        assert_eq!(cred.address(), restored.address());
        assert_eq!(cred.address().len(), 42);
    }

    #[test]
    fn test_invalid_keys() {
        assert_eq!(FarmerCredential::from_hex("  ").unwrap_err(), CredentialError::Missing);
        assert_eq!(FarmerCredential::from_hex("0xzz").unwrap_err(), CredentialError::InvalidHex);
        assert_eq!(FarmerCredential::from_hex("0xabcd").unwrap_err(), CredentialError::InvalidLength);
        let zero = format!("0x{}", "00".repeat(32));
        assert_eq!(FarmerCredential::from_hex(&zero).unwrap_err(), CredentialError::InvalidKey);
    }

    #[test]
    fn test_debug_redacts_key() {
        let cred = FarmerCredential::from_hex(KEY_ONE).unwrap();
        let shown = format!("{cred:?}");
        assert!(shown.contains("<redacted>"));
        assert!(!shown.contains(&cred.private_key_hex()[2..]));
    }
}
