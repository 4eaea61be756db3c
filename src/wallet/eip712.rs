//! EIP-712 hashing of JSON typed data (`types`, `primaryType`, `domain`,
//! `message`), as returned by transaction preparation.

use serde_json::Value;
use sha3::{Digest, Keccak256};
use std::collections::BTreeSet;

use crate::error::{BroadcastError, BroadcastResult};

type Hash = [u8; 32];

fn keccak(bytes: &[u8]) -> Hash {
    Keccak256::digest(bytes).into()
}

fn malformed(reason: impl std::fmt::Display) -> BroadcastError {
    BroadcastError::Wallet(format!("Malformed EIP-712 payload: {}", reason))
}

/// The digest a wallet signs: `keccak256(0x1901 || domainSeparator || hashStruct(message))`
pub fn hash_typed_data(typed_data: &Value) -> BroadcastResult<Hash> {
    let types = typed_data.get("types").ok_or_else(|| malformed("missing types"))?;
    let primary_type = typed_data
        .get("primaryType")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("missing primaryType"))?;
    let domain = typed_data.get("domain").ok_or_else(|| malformed("missing domain"))?;
    let message = typed_data.get("message").ok_or_else(|| malformed("missing message"))?;

    let domain_separator = hash_struct("EIP712Domain", domain, types)?;
    let message_hash = hash_struct(primary_type, message, types)?;

    let mut preimage = Vec::with_capacity(66);
    preimage.extend_from_slice(b"\x19\x01");
    preimage.extend_from_slice(&domain_separator);
    preimage.extend_from_slice(&message_hash);
    Ok(keccak(&preimage))
}

fn fields<'a>(type_name: &str, types: &'a Value) -> BroadcastResult<Vec<(&'a str, &'a str)>> {
    types
        .get(type_name)
        .and_then(Value::as_array)
        .ok_or_else(|| malformed(format!("type {} not defined", type_name)))?
        .iter()
        .map(|field| {
            let name = field.get("name").and_then(Value::as_str);
            let ty = field.get("type").and_then(Value::as_str);
            name.zip(ty).ok_or_else(|| malformed(format!("bad field in {}", type_name)))
        })
        .collect()
}

/// Strip any array suffixes: `Coin[]` -> `Coin`, `uint8[2][]` -> `uint8`
fn base_type(ty: &str) -> &str {
    ty.find('[').map_or(ty, |idx| &ty[..idx])
}

fn collect_dependencies(type_name: &str, types: &Value, found: &mut BTreeSet<String>) -> BroadcastResult<()> {
    if found.contains(type_name) || types.get(type_name).is_none() {
        return Ok(());
    }
    found.insert(type_name.to_string());
    for (_, ty) in fields(type_name, types)? {
        collect_dependencies(base_type(ty), types, found)?;
    }
    Ok(())
}

/// `Primary(type name,…)Dep1(…)Dep2(…)` with dependencies sorted by name
pub fn encode_type(type_name: &str, types: &Value) -> BroadcastResult<String> {
    let mut deps = BTreeSet::new();
    collect_dependencies(type_name, types, &mut deps)?;
    deps.remove(type_name);

    let mut encoded = String::new();
    for ty in std::iter::once(type_name).chain(deps.iter().map(String::as_str)) {
        let members = fields(ty, types)?
            .iter()
            .map(|(name, field_type)| format!("{} {}", field_type, name))
            .collect::<Vec<_>>()
            .join(",");
        encoded.push_str(&format!("{}({})", ty, members));
    }
    Ok(encoded)
}

pub fn hash_struct(type_name: &str, data: &Value, types: &Value) -> BroadcastResult<Hash> {
    let mut encoded = Vec::with_capacity(32 * 8);
    encoded.extend_from_slice(&keccak(encode_type(type_name, types)?.as_bytes()));

    for (name, ty) in fields(type_name, types)? {
        match data.get(name) {
            Some(value) if !value.is_null() => encoded.extend_from_slice(&encode_value(ty, value, types)?),
            _ => encoded.extend_from_slice(&[0u8; 32]),
        }
    }
    Ok(keccak(&encoded))
}

fn encode_value(ty: &str, value: &Value, types: &Value) -> BroadcastResult<Hash> {
    if ty.ends_with(']') {
        let inner = &ty[..ty.rfind('[').unwrap_or(0)];
        let items = value
            .as_array()
            .ok_or_else(|| malformed(format!("expected array for {}", ty)))?;
        let mut concatenated = Vec::with_capacity(items.len() * 32);
        for item in items {
            concatenated.extend_from_slice(&encode_value(inner, item, types)?);
        }
        return Ok(keccak(&concatenated));
    }

    if types.get(ty).is_some() {
        return hash_struct(ty, value, types);
    }

    match ty {
        "string" => Ok(keccak(as_str(value, ty)?.as_bytes())),
        "bytes" => Ok(keccak(&decode_hex(as_str(value, ty)?)?)),
        "bool" => {
            let flag = match value {
                Value::Bool(b) => *b,
                Value::String(s) => s == "true",
                _ => return Err(malformed("expected bool")),
            };
            let mut word = [0u8; 32];
            word[31] = flag as u8;
            Ok(word)
        }
        "address" => {
            let bytes = decode_hex(as_str(value, ty)?)?;
            if bytes.len() != 20 {
                return Err(malformed("address must be 20 bytes"));
            }
            let mut word = [0u8; 32];
            word[12..].copy_from_slice(&bytes);
            Ok(word)
        }
        _ if ty.starts_with("uint") => parse_uint(value).ok_or_else(|| malformed(format!("bad {}", ty))),
        _ if ty.starts_with("int") => parse_int(value).ok_or_else(|| malformed(format!("bad {}", ty))),
        _ if ty.starts_with("bytes") => {
            let bytes = decode_hex(as_str(value, ty)?)?;
            if bytes.len() > 32 {
                return Err(malformed(format!("{} value too long", ty)));
            }
            let mut word = [0u8; 32];
            word[..bytes.len()].copy_from_slice(&bytes);
            Ok(word)
        }
        _ => Err(malformed(format!("unknown type {}", ty))),
    }
}

fn as_str<'a>(value: &'a Value, ty: &str) -> BroadcastResult<&'a str> {
    value.as_str().ok_or_else(|| malformed(format!("expected string for {}", ty)))
}

fn decode_hex(s: &str) -> BroadcastResult<Vec<u8>> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    let padded = if digits.len() % 2 == 1 {
        format!("0{}", digits)
    } else {
        digits.to_string()
    };
    hex::decode(padded).map_err(malformed)
}

/// Big-endian 256-bit word from a JSON number, decimal string or 0x string
fn parse_uint(value: &Value) -> Option<Hash> {
    match value {
        Value::Number(n) => n.as_u64().map(u64_word),
        Value::String(s) if s.starts_with("0x") => {
            let bytes = decode_hex(s).ok()?;
            if bytes.len() > 32 {
                return None;
            }
            let mut word = [0u8; 32];
            word[32 - bytes.len()..].copy_from_slice(&bytes);
            Some(word)
        }
        Value::String(s) => parse_decimal(s),
        _ => None,
    }
}

/// Two's complement 256-bit word for signed integers
fn parse_int(value: &Value) -> Option<Hash> {
    let (negative, magnitude) = match value {
        Value::Number(n) => {
            let v = n.as_i64()?;
            (v < 0, u64_word(v.unsigned_abs()))
        }
        Value::String(s) => match s.strip_prefix('-') {
            Some(digits) => (true, parse_decimal(digits)?),
            None => (false, parse_uint(value)?),
        },
        _ => return None,
    };
    if !negative {
        return Some(magnitude);
    }

    // invert and add one
    let mut word = magnitude.map(|b| !b);
    for byte in word.iter_mut().rev() {
        let (sum, overflow) = byte.overflowing_add(1);
        *byte = sum;
        if !overflow {
            break;
        }
    }
    Some(word)
}

fn u64_word(v: u64) -> Hash {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&v.to_be_bytes());
    word
}

fn parse_decimal(s: &str) -> Option<Hash> {
    if s.is_empty() {
        return None;
    }
    let mut word = [0u8; 32];
    for c in s.chars() {
        let mut carry = c.to_digit(10)?;
        for byte in word.iter_mut().rev() {
            let v = (*byte as u32) * 10 + carry;
            *byte = (v & 0xff) as u8;
            carry = v >> 8;
        }
        if carry != 0 {
            return None;
        }
    }
    Some(word)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// The "Mail" example from EIP-712
    fn mail() -> Value {
        json!({
            "types": {
                "EIP712Domain": [
                    {"name": "name", "type": "string"},
                    {"name": "version", "type": "string"},
                    {"name": "chainId", "type": "uint256"},
                    {"name": "verifyingContract", "type": "address"}
                ],
                "Person": [
                    {"name": "name", "type": "string"},
                    {"name": "wallet", "type": "address"}
                ],
                "Mail": [
                    {"name": "from", "type": "Person"},
                    {"name": "to", "type": "Person"},
                    {"name": "contents", "type": "string"}
                ]
            },
            "primaryType": "Mail",
            "domain": {
                "name": "Ether Mail",
                "version": "1",
                "chainId": 1,
                "verifyingContract": "0xCcCCccccCCCCcCCCCCCcCcCccCcCCCcCcccccccC"
            },
            "message": {
                "from": {"name": "Cow", "wallet": "0xCD2a3d9F938E13CD947Ec05AbC7FE734Df8DD826"},
                "to": {"name": "Bob", "wallet": "0xbBbBBBBbbBBBbbbBbbBbbbbBBbBbbbbBbBbbBBbB"},
                "contents": "Hello, Bob!"
            }
        })
    }

    #[test]
    fn test_encode_type_orders_dependencies() {
        let data = mail();
        assert_eq!(
            encode_type("Mail", &data["types"]).unwrap(),
            "Mail(Person from,Person to,string contents)Person(string name,address wallet)"
        );
    }

    #[test]
    fn test_mail_vector() {
        let data = mail();
        assert_eq!(
            hex::encode(hash_struct("EIP712Domain", &data["domain"], &data["types"]).unwrap()),
            "f2cee375fa42b42143804025fc449deafd50cc031ca257e0b194a650a912090f"
        );
        assert_eq!(
            hex::encode(hash_typed_data(&data).unwrap()),
            "be609aee343fb3c4b28e1df9e632fca64fcfaede20f02e86244efddf30957bd2"
        );
    }

    #[test]
    fn test_integer_words() {
        assert_eq!(parse_uint(&json!("1439")).unwrap(), u64_word(1439));
        assert_eq!(parse_uint(&json!("0x59f")).unwrap(), u64_word(1439));
        assert_eq!(parse_int(&json!(-1)).unwrap(), [0xff; 32]);
        assert!(parse_decimal("12a").is_none());
    }

    #[test]
    fn test_missing_sections_are_rejected() {
        let mut data = mail();
        data.as_object_mut().unwrap().remove("primaryType");
        assert!(matches!(hash_typed_data(&data), Err(BroadcastError::Wallet(_))));
    }
}
