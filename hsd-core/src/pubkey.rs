use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Ed25519 public key identifying a host, per the GLOSSARY.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PublicKey(pub [u8; 32]);

impl PublicKey {
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s.trim_start_matches("ed25519:"))?;
        let mut arr = [0u8; 32];
        if bytes.len() != 32 {
            // hex::decode doesn't carry a length-mismatch variant; reuse
            // OddLength as the closest existing error rather than adding
            // a bespoke one for a single call site.
            return Err(hex::FromHexError::InvalidStringLength);
        }
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    pub fn to_hex(&self) -> String {
        format!("ed25519:{}", hex::encode(self.0))
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        PublicKey::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_hex() {
        let pk = PublicKey([7u8; 32]);
        let hex = pk.to_hex();
        let parsed = PublicKey::from_hex(&hex).unwrap();
        assert_eq!(pk, parsed);
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(PublicKey::from_hex("ed25519:aabb").is_err());
    }
}
