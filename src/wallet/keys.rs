use bip32::{ChildNumber, XPrv};
use bip39::Mnemonic;
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use tiny_keccak::{Hasher, Keccak};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::chain::address::encode_injective;
use crate::error::{BroadcastError, BroadcastResult};

/// BIP44 path m/44'/60'/0'/0/0: Injective reuses the Ethereum coin type
const HD_PATH: [(u32, bool); 5] = [(44, true), (60, true), (0, true), (0, false), (0, false)];

/// secp256k1 key material for one Injective account.
/// The private key is wiped from memory when the wallet is dropped.
#[derive(Debug, Zeroize, ZeroizeOnDrop)]
pub struct InjectiveWallet {
    /// Bech32 `inj1…` address
    #[zeroize(skip)]
    pub address: String,
    /// Lowercase `0x…` address of the same key
    #[zeroize(skip)]
    pub ethereum_address: String,

    private_key_bytes: [u8; 32],
    public_key_compressed: [u8; 33],
}

impl InjectiveWallet {
    /// Derive the first account of a BIP39 mnemonic
    pub fn from_mnemonic(mnemonic_str: &str, passphrase: &str) -> BroadcastResult<Self> {
        let mnemonic = Mnemonic::parse(mnemonic_str)
            .map_err(|e| BroadcastError::Wallet(format!("Invalid mnemonic: {}", e)))?;
        let mut seed = mnemonic.to_seed(passphrase);
        let derived = derive_private_key(&seed);
        seed.zeroize();

        let mut private_key = derived?;
        let wallet = Self::from_private_key(&private_key);
        private_key.zeroize();
        wallet
    }

    pub fn from_mnemonic_no_passphrase(mnemonic_str: &str) -> BroadcastResult<Self> {
        Self::from_mnemonic(mnemonic_str, "")
    }

    pub fn from_private_key(private_key: &[u8; 32]) -> BroadcastResult<Self> {
        let secp = Secp256k1::new();
        let secret_key = SecretKey::from_slice(private_key)
            .map_err(|e| BroadcastError::Wallet(format!("Invalid private key: {}", e)))?;
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);

        let address_bytes = address_bytes(&public_key);

        Ok(Self {
            address: encode_injective(&address_bytes)?,
            ethereum_address: format!("0x{}", hex::encode(address_bytes)),
            private_key_bytes: *private_key,
            public_key_compressed: public_key.serialize(),
        })
    }

    pub fn private_key(&self) -> BroadcastResult<SecretKey> {
        SecretKey::from_slice(&self.private_key_bytes)
            .map_err(|e| BroadcastError::Wallet(format!("Invalid private key: {}", e)))
    }

    /// Compressed (33 byte) public key, as ethsecp256k1 PubKey expects
    pub fn public_key_compressed(&self) -> [u8; 33] {
        self.public_key_compressed
    }

    /// True when `address` is this wallet's account in either namespace
    pub fn owns(&self, address: &str) -> bool {
        address.eq_ignore_ascii_case(&self.ethereum_address) || address == self.address
    }
}

fn derive_private_key(seed: &[u8]) -> BroadcastResult<[u8; 32]> {
    let wallet_err = |e: bip32::Error| BroadcastError::Wallet(format!("Failed to derive key: {}", e));

    let mut key = XPrv::new(seed).map_err(wallet_err)?;
    for (index, hardened) in HD_PATH {
        let child = ChildNumber::new(index, hardened).map_err(wallet_err)?;
        key = key.derive_child(child).map_err(wallet_err)?;
    }
    Ok(key.to_bytes())
}

/// Ethereum-style address: last 20 bytes of keccak256 over the uncompressed
/// public key coordinates
fn address_bytes(public_key: &PublicKey) -> [u8; 20] {
    let uncompressed = public_key.serialize_uncompressed();

    let mut hasher = Keccak::v256();
    let mut hash = [0u8; 32];
    hasher.update(&uncompressed[1..]);
    hasher.finalize(&mut hash);

    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::address::resolve_addresses;

    const MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn test_wallet_from_mnemonic() {
        let wallet = InjectiveWallet::from_mnemonic_no_passphrase(MNEMONIC).unwrap();
        assert!(wallet.address.starts_with("inj1"));
        assert_eq!(wallet.address.len(), 42);
        // Well-known first Ethereum account of the "abandon … about" mnemonic
        assert_eq!(wallet.ethereum_address, "0x9858effd232b4033e47d90003d41ec34ecaeda94");
    }

    #[test]
    fn test_both_addresses_name_the_same_account() {
        let wallet = InjectiveWallet::from_mnemonic_no_passphrase(MNEMONIC).unwrap();
        let resolved = resolve_addresses(&wallet.address).unwrap();
        assert_eq!(resolved.ethereum_address, wallet.ethereum_address);
        assert!(wallet.owns(&resolved.ethereum_address));
        assert!(wallet.owns(&resolved.injective_address));
        assert!(!wallet.owns("inj1qqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqq"));
    }

    #[test]
    fn test_passphrase_changes_account() {
        let plain = InjectiveWallet::from_mnemonic(MNEMONIC, "").unwrap();
        let with_pass = InjectiveWallet::from_mnemonic(MNEMONIC, "test123").unwrap();
        assert_ne!(plain.address, with_pass.address);

        let again = InjectiveWallet::from_mnemonic(MNEMONIC, "test123").unwrap();
        assert_eq!(with_pass.address, again.address);
    }

    #[test]
    fn test_invalid_material_is_a_wallet_error() {
        assert!(matches!(
            InjectiveWallet::from_mnemonic_no_passphrase("not a mnemonic"),
            Err(BroadcastError::Wallet(_))
        ));
        assert!(matches!(
            InjectiveWallet::from_private_key(&[0u8; 32]),
            Err(BroadcastError::Wallet(_))
        ));
    }
}
