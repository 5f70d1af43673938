//! ERC-20 call encoding and decoding.

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol;
use alloy::sol_types::SolCall;

use crate::blockchain::types::{BlockchainError, BlockchainResult};

sol! {
    /// The subset of ERC-20 the relay speaks.
    #[derive(Debug)]
    interface IERC20 {
        function transfer(address to, uint256 amount) external returns (bool);
        function balanceOf(address owner) external view returns (uint256);

        event Transfer(address indexed from, address indexed to, uint256 value);
    }
}

/// Calldata for `transfer(to, amount)`.
pub fn encode_transfer(to: Address, amount: U256) -> Bytes {
    IERC20::transferCall { to, amount }.abi_encode().into()
}

/// Recipient and amount from `transfer` calldata, if `input` is one.
pub fn decode_transfer(input: &[u8]) -> Option<(Address, U256)> {
    IERC20::transferCall::abi_decode(input)
        .ok()
        .map(|call| (call.to, call.amount))
}

/// Calldata for `balanceOf(owner)`.
pub fn encode_balance_of(owner: Address) -> Bytes {
    IERC20::balanceOfCall { owner }.abi_encode().into()
}

/// Decode the return data of `balanceOf`.
pub fn decode_balance(output: &[u8]) -> BlockchainResult<U256> {
    IERC20::balanceOfCall::abi_decode_returns(output)
        .map_err(|e| BlockchainError::Decode(format!("balanceOf returned malformed data: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    #[test]
    fn test_transfer_selector() {
        let data = encode_transfer(Address::ZERO, U256::from(1u64));
        // transfer(address,uint256)
        assert_eq!(&data[..4], &[0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(data.len(), 4 + 32 + 32);
    }

    #[test]
    fn test_decode_transfer() {
        let to = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
        let data = encode_transfer(to, U256::from(1_000_000u64));
        assert_eq!(decode_transfer(&data), Some((to, U256::from(1_000_000u64))));
    }

    #[test]
    fn test_decode_transfer_rejects_other_calldata() {
        assert_eq!(decode_transfer(&[]), None);
        assert_eq!(decode_transfer(&encode_balance_of(Address::ZERO)), None);
    }

    #[test]
    fn test_decode_balance() {
        let mut word = [0u8; 32];
        word[31] = 42;
        assert_eq!(decode_balance(&word).unwrap(), U256::from(42u64));
        assert!(decode_balance(&[1, 2, 3]).is_err());
    }
}
