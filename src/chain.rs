use std::future::Future;

use serde::{Serialize, Serializer};

use crate::{common::address::Address, trace::CreationTrace};

/// Block selector for historical state reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockTag {
    Latest,
    Number(u64),
}

impl std::fmt::Display for BlockTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockTag::Latest => f.write_str("latest"),
            BlockTag::Number(number) => write!(f, "{number:#x}"),
        }
    }
}

impl Serialize for BlockTag {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl From<u64> for BlockTag {
    fn from(value: u64) -> Self {
        BlockTag::Number(value)
    }
}

/// The chain reads an analysis depends on.
pub trait Chain {
    /// Current chain height.
    fn head(&self) -> impl Future<Output = eyre::Result<u64>> + Send;

    /// Code resident at `address` as of `block`; empty when there is no contract.
    fn code(
        &self,
        address: &Address,
        block: BlockTag,
    ) -> impl Future<Output = eyre::Result<Vec<u8>>> + Send;

    /// Every successful contract creation within `block`.
    fn creation_traces(
        &self,
        block: u64,
    ) -> impl Future<Output = eyre::Result<Vec<CreationTrace>>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_tag() {
        assert_eq!(serde_json::to_value(BlockTag::Latest).unwrap(), "latest");
        assert_eq!(serde_json::to_value(BlockTag::Number(0)).unwrap(), "0x0");
        assert_eq!(
            serde_json::to_value(BlockTag::from(10639231)).unwrap(),
            "0xa2577f"
        );
    }
}
