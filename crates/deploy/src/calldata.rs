//! Minimal ABI encoding for the deployment transactions.
//!
//! The pipeline only ever encodes constructor arguments and one proxy
//! upgrade call, so a small hand-rolled encoder covers the needed subset
//! (static address/uint words plus dynamic strings).

use alloy_core::primitives::{Address, U256, keccak256};

/// A single ABI-encodable argument value.
#[derive(Debug, Clone)]
pub enum AbiValue {
    Address(Address),
    Uint(U256),
    Str(String),
}

impl AbiValue {
    fn is_dynamic(&self) -> bool {
        matches!(self, AbiValue::Str(_))
    }
}

/// Encode a 4-byte function selector from a canonical signature.
pub fn selector(signature: &str) -> String {
    hex::encode(&keccak256(signature.as_bytes())[..4])
}

/// ABI-encode an argument list (head words followed by dynamic tails).
///
/// Returns lowercase hex without a `0x` prefix.
pub fn encode_args(args: &[AbiValue]) -> String {
    let head_len = 32 * args.len();
    let mut head = String::new();
    let mut tail = String::new();

    for arg in args {
        if arg.is_dynamic() {
            // Head word is the byte offset of the tail, measured from the
            // start of the argument block.
            head.push_str(&uint_word(U256::from(head_len + tail.len() / 2)));
        }
        match arg {
            AbiValue::Address(addr) => head.push_str(&address_word(*addr)),
            AbiValue::Uint(value) => head.push_str(&uint_word(*value)),
            AbiValue::Str(s) => tail.push_str(&string_tail(s)),
        }
    }

    head + &tail
}

/// Build calldata for a function call: selector plus encoded arguments.
pub fn encode_call(signature: &str, args: &[AbiValue]) -> String {
    format!("0x{}{}", selector(signature), encode_args(args))
}

/// Build contract-creation data: deployment bytecode plus encoded
/// constructor arguments.
pub fn creation_data(bytecode: &str, args: &[AbiValue]) -> String {
    let bytecode = bytecode.strip_prefix("0x").unwrap_or(bytecode);
    format!("0x{}{}", bytecode, encode_args(args))
}

fn uint_word(value: U256) -> String {
    hex::encode(value.to_be_bytes::<32>())
}

fn address_word(addr: Address) -> String {
    format!("{:0>64}", hex::encode(addr))
}

/// Dynamic string tail: length word followed by the utf-8 bytes padded to
/// a 32-byte boundary. An empty string is just the zero length word.
fn string_tail(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = uint_word(U256::from(bytes.len()));
    if !bytes.is_empty() {
        let mut data = bytes.to_vec();
        data.resize(bytes.len().div_ceil(32) * 32, 0);
        out.push_str(&hex::encode(data));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_known_signature() {
        // keccak256("transfer(address,uint256)")[..4]
        assert_eq!(selector("transfer(address,uint256)"), "a9059cbb");
    }

    #[test]
    fn test_encode_static_args() {
        let owner: Address = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8"
            .parse()
            .unwrap();
        let encoded = encode_args(&[AbiValue::Address(owner), AbiValue::Uint(U256::from(2_000_000u64))]);

        // Two words of 32 bytes each.
        assert_eq!(encoded.len(), 128);
        assert_eq!(
            &encoded[..64],
            "00000000000000000000000070997970c51812dc3a010c7d01b50e0d17dc79c8"
        );
        assert_eq!(
            &encoded[64..],
            "00000000000000000000000000000000000000000000000000000000001e8480"
        );
    }

    #[test]
    fn test_encode_dynamic_string_offsets() {
        // Token image constructor shape: (name, symbol, decimals, chainId).
        let encoded = encode_args(&[
            AbiValue::Str(String::new()),
            AbiValue::Str(String::new()),
            AbiValue::Uint(U256::ZERO),
            AbiValue::Uint(U256::from(1u64)),
        ]);

        // 4 head words + 2 empty-string tails (length words only).
        assert_eq!(encoded.len(), 6 * 64);

        let word = |i: usize| &encoded[i * 64..(i + 1) * 64];
        let zeros = "0".repeat(64);
        // Offsets to the two tails: 0x80 and 0xa0.
        assert!(word(0).ends_with("80"));
        assert!(word(1).ends_with("a0"));
        assert_eq!(word(2), zeros);
        assert!(word(3).ends_with("01"));
        // Both tails are zero-length.
        assert_eq!(word(4), zeros);
        assert_eq!(word(5), zeros);
    }

    #[test]
    fn test_encode_nonempty_string_padding() {
        let encoded = encode_args(&[AbiValue::Str(" on xDai".to_string())]);

        // Offset word + length word + one padded data word.
        assert_eq!(encoded.len(), 3 * 64);
        assert!(encoded[..64].ends_with("20"));
        assert!(encoded[64..128].ends_with("08"));
        assert!(encoded[128..].starts_with(&hex::encode(" on xDai")));
        assert!(encoded[128..].ends_with("0000"));
    }

    #[test]
    fn test_encode_call_shape() {
        let implementation = Address::repeat_byte(0x42);
        let data = encode_call(
            "upgradeTo(uint256,address)",
            &[AbiValue::Uint(U256::from(1u64)), AbiValue::Address(implementation)],
        );

        // "0x" + 4-byte selector + two words.
        assert!(data.starts_with("0x"));
        assert_eq!(data.len(), 2 + 8 + 128);
        assert!(data.ends_with("4242424242424242424242424242424242424242"));
    }

    #[test]
    fn test_creation_data_prefix_handling() {
        let with_prefix = creation_data("0x6080", &[]);
        let without_prefix = creation_data("6080", &[]);
        assert_eq!(with_prefix, "0x6080");
        assert_eq!(with_prefix, without_prefix);
    }
}
