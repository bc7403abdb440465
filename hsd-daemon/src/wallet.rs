//! Renter identity derivation, §6 External Interfaces ("Wallet
//! (consumed)"). The wallet's `FundContract`/`SignRevision` calls are
//! folded into `hsd_rpc::transport::form_contract`'s caller-supplied
//! terms and are out of scope here; what the benchmark worker does need
//! from the wallet is a stable renter public key to present to hosts,
//! derived deterministically from the seed secret so restarts keep using
//! the same identity.

use ed25519_dalek::SigningKey;
use hsd_core::PublicKey;

/// Derives the renter's Ed25519 public key from a hex-encoded 32-byte
/// seed. Returns an all-zero key (a clearly invalid placeholder) if the
/// seed is empty, matching `--dry-run`'s "don't hard-fail on missing
/// wallet material" posture — a real scan/benchmark cycle would then
/// fail downstream at contract formation instead.
pub fn derive_renter_public_key(seed_hex: &str) -> anyhow::Result<PublicKey> {
    if seed_hex.is_empty() {
        return Ok(PublicKey([0u8; 32]));
    }
    let bytes = hex::decode(seed_hex)?;
    if bytes.len() != 32 {
        anyhow::bail!("wallet seed must be exactly 32 bytes (64 hex chars), got {}", bytes.len());
    }
    let mut seed = [0u8; 32];
    seed.copy_from_slice(&bytes);
    let signing_key = SigningKey::from_bytes(&seed);
    Ok(PublicKey(signing_key.verifying_key().to_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_seed_yields_placeholder_key() {
        let pk = derive_renter_public_key("").unwrap();
        assert_eq!(pk, PublicKey([0u8; 32]));
    }

    #[test]
    fn same_seed_is_deterministic() {
        let seed = hex::encode([7u8; 32]);
        let a = derive_renter_public_key(&seed).unwrap();
        let b = derive_renter_public_key(&seed).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn wrong_length_seed_is_rejected() {
        assert!(derive_renter_public_key("aabb").is_err());
    }
}
