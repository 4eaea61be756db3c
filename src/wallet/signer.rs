use secp256k1::{Message, Secp256k1, SecretKey};
use tiny_keccak::{Hasher, Keccak};

use crate::error::{BroadcastError, BroadcastResult};

pub fn keccak256(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut hash = [0u8; 32];
    hasher.update(bytes);
    hasher.finalize(&mut hash);
    hash
}

/// secp256k1 signing as Injective's ethsecp256k1 keys expect it
pub struct TransactionSigner {
    secp: Secp256k1<secp256k1::All>,
}

impl TransactionSigner {
    pub fn new() -> Self {
        Self {
            secp: Secp256k1::new(),
        }
    }

    /// Sign a 32 byte digest, returning `r || s || v` with `v` in {27, 28}
    /// (the form EIP-712 verifiers expect)
    pub fn sign_recoverable(&self, digest: &[u8; 32], private_key: &SecretKey) -> BroadcastResult<[u8; 65]> {
        let message = Message::from_digest_slice(digest)
            .map_err(|e| BroadcastError::Wallet(format!("Invalid digest: {}", e)))?;

        let (recovery_id, compact) = self
            .secp
            .sign_ecdsa_recoverable(&message, private_key)
            .serialize_compact();

        let mut sig = [0u8; 65];
        sig[..64].copy_from_slice(&compact);
        sig[64] = (recovery_id.to_i32() % 2) as u8 + 27;
        Ok(sig)
    }

    /// SIGN_MODE_DIRECT signature: keccak256 of the encoded SignDoc, returned as
    /// the 64 byte `r || s` form Cosmos transactions carry
    pub fn sign_direct(&self, sign_doc_bytes: &[u8], private_key: &SecretKey) -> BroadcastResult<[u8; 64]> {
        let digest = keccak256(sign_doc_bytes);
        let message = Message::from_digest_slice(&digest)
            .map_err(|e| BroadcastError::Wallet(format!("Invalid digest: {}", e)))?;

        Ok(self.secp.sign_ecdsa(&message, private_key).serialize_compact())
    }
}

impl Default for TransactionSigner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
    use secp256k1::PublicKey;

    fn key() -> SecretKey {
        SecretKey::from_slice(&[0x42; 32]).unwrap()
    }

    #[test]
    fn test_recoverable_signature_recovers_signer() {
        let signer = TransactionSigner::new();
        let digest = keccak256(b"typed data");
        let sig = signer.sign_recoverable(&digest, &key()).unwrap();
        assert!(sig[64] == 27 || sig[64] == 28);

        let secp = Secp256k1::new();
        let recovery_id = RecoveryId::from_i32((sig[64] - 27) as i32).unwrap();
        let recoverable = RecoverableSignature::from_compact(&sig[..64], recovery_id).unwrap();
        let message = Message::from_digest_slice(&digest).unwrap();
        let recovered = secp.recover_ecdsa(&message, &recoverable).unwrap();
        assert_eq!(recovered, PublicKey::from_secret_key(&secp, &key()));
    }

    #[test]
    fn test_direct_signature_is_deterministic() {
        let signer = TransactionSigner::new();
        let first = signer.sign_direct(b"sign doc", &key()).unwrap();
        let second = signer.sign_direct(b"sign doc", &key()).unwrap();
        assert_eq!(first, second);
        assert_ne!(first, signer.sign_direct(b"other doc", &key()).unwrap());
    }

    #[test]
    fn test_keccak_known_vector() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }
}
