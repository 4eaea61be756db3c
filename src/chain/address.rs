//! Address resolution between the two Injective namespaces.
//!
//! Injective accounts are ethsecp256k1 keys: the same 20 address bytes are shown
//! either as an EVM-style `0x…` hex string or as a bech32 `inj1…` string.

use bech32::primitives::decode::CheckedHrpstring;
use bech32::{Bech32, Hrp};
use serde::{Deserialize, Serialize};

use crate::error::{BroadcastError, BroadcastResult};

pub const INJECTIVE_PREFIX: &str = "inj";
const ADDRESS_BYTES: usize = 20;

/// Both representations of one account, computed once per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAddresses {
    /// Lowercase `0x` hex address
    pub ethereum_address: String,
    /// Bech32 `inj1` address
    pub injective_address: String,
}

/// Resolve an address given in either namespace into both representations.
pub fn resolve_addresses(address: &str) -> BroadcastResult<ResolvedAddresses> {
    let bytes = address_bytes(address)?;
    Ok(ResolvedAddresses {
        ethereum_address: format!("0x{}", hex::encode(bytes)),
        injective_address: encode_injective(&bytes)?,
    })
}

/// The `0x` form of an address given in either namespace
pub fn ethereum_address(address: &str) -> BroadcastResult<String> {
    Ok(resolve_addresses(address)?.ethereum_address)
}

/// The `inj1` form of an address given in either namespace
pub fn injective_address(address: &str) -> BroadcastResult<String> {
    Ok(resolve_addresses(address)?.injective_address)
}

/// Encode raw address bytes with the `inj` human readable part
pub fn encode_injective(bytes: &[u8]) -> BroadcastResult<String> {
    let hrp = Hrp::parse(INJECTIVE_PREFIX)
        .map_err(|e| BroadcastError::Wallet(format!("Invalid bech32 prefix: {}", e)))?;
    bech32::encode::<Bech32>(hrp, bytes)
        .map_err(|e| BroadcastError::Wallet(format!("Failed to encode address: {}", e)))
}

fn address_bytes(address: &str) -> BroadcastResult<[u8; ADDRESS_BYTES]> {
    let unresolvable = || BroadcastError::AddressResolution {
        address: address.to_string(),
    };
    let trimmed = address.trim();

    let decoded = if let Some(hex_part) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        if hex_part.len() != ADDRESS_BYTES * 2 {
            return Err(unresolvable());
        }
        hex::decode(hex_part).map_err(|_| unresolvable())?
    } else {
        // Bech32 only; a Bech32m checksum is not an account address
        let checked = CheckedHrpstring::new::<Bech32>(trimmed).map_err(|_| unresolvable())?;
        if checked.hrp().to_lowercase() != INJECTIVE_PREFIX {
            return Err(unresolvable());
        }
        checked.byte_iter().collect()
    };

    decoded.try_into().map_err(|_| unresolvable())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ETH: &str = "0xaf79152ac5df276d9a8e1e2e22822f9713474902";

    #[test]
    fn test_resolve_from_hex_and_back() {
        let resolved = resolve_addresses(ETH).unwrap();
        assert_eq!(resolved.ethereum_address, ETH);
        assert!(resolved.injective_address.starts_with("inj1"));
        assert_eq!(resolved.injective_address.len(), 42);

        let again = resolve_addresses(&resolved.injective_address).unwrap();
        assert_eq!(again, resolved);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let first = resolve_addresses(ETH).unwrap();
        let second = resolve_addresses(ETH).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_hex_is_normalised_to_lowercase() {
        let upper = "0xAF79152AC5DF276D9A8E1E2E22822F9713474902";
        assert_eq!(ethereum_address(upper).unwrap(), ETH);
    }

    #[test]
    fn test_rejects_unknown_namespaces() {
        for bad in [
            "",
            "0x1234",
            "0xzz79152ac5df276d9a8e1e2e22822f9713474902",
            "cosmos1qypqxpq9qcrsszg2pvxq6rs0zqg3yyc5lzv7xu",
            "inj1notbech32",
        ] {
            let err = resolve_addresses(bad).unwrap_err();
            assert_eq!(
                err,
                BroadcastError::AddressResolution { address: bad.to_string() },
                "{bad} should not resolve"
            );
        }
    }

    #[test]
    fn test_rejects_bech32m_checksum() {
        let bytes = hex::decode(&ETH[2..]).unwrap();
        let hrp = Hrp::parse(INJECTIVE_PREFIX).unwrap();
        let bech32m = bech32::encode::<bech32::Bech32m>(hrp, &bytes).unwrap();
        assert!(bech32m.starts_with("inj1"));

        assert_eq!(
            resolve_addresses(&bech32m).unwrap_err(),
            BroadcastError::AddressResolution { address: bech32m.clone() }
        );
    }
}
