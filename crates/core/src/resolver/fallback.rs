use async_trait::async_trait;

use super::{AbiSource, FetchError};
use crate::abi::{Abi, AbiItem, AbiParam, StateMutability};
use crate::types::{Address, Origin};

/// Last resort: a fixed ERC-20 ABI that always succeeds
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFallbackSource;

impl DefaultFallbackSource {
    pub fn abi() -> Abi {
        let param = AbiParam::new;
        let uint = || vec![AbiParam::new("", "uint256")];
        let boolean = || vec![AbiParam::new("", "bool")];

        Abi::new(vec![
            AbiItem::function("totalSupply", vec![], uint(), StateMutability::View),
            AbiItem::function("balanceOf", vec![param("account", "address")], uint(), StateMutability::View),
            AbiItem::function(
                "transfer",
                vec![param("to", "address"), param("amount", "uint256")],
                boolean(),
                StateMutability::Nonpayable,
            ),
            AbiItem::function(
                "allowance",
                vec![param("owner", "address"), param("spender", "address")],
                uint(),
                StateMutability::View,
            ),
            AbiItem::function(
                "approve",
                vec![param("spender", "address"), param("amount", "uint256")],
                boolean(),
                StateMutability::Nonpayable,
            ),
            AbiItem::function(
                "transferFrom",
                vec![param("from", "address"), param("to", "address"), param("amount", "uint256")],
                boolean(),
                StateMutability::Nonpayable,
            ),
            AbiItem::event(
                "Transfer",
                vec![
                    param("from", "address").indexed(),
                    param("to", "address").indexed(),
                    param("value", "uint256"),
                ],
            ),
            AbiItem::event(
                "Approval",
                vec![
                    param("owner", "address").indexed(),
                    param("spender", "address").indexed(),
                    param("value", "uint256"),
                ],
            ),
        ])
    }
}

#[async_trait]
impl AbiSource for DefaultFallbackSource {
    fn name(&self) -> &str {
        "default"
    }

    fn origin(&self) -> Origin {
        Origin::DefaultFallback
    }

    async fn fetch(&self, _address: Address, _chain_id: u64) -> Result<Abi, FetchError> {
        Ok(Self::abi())
    }
}
