use tracing::debug;

use crate::{
    chain::{BlockTag, Chain},
    common::{address::Address, hash::keccak256},
};

/// Whether two code snapshots differ by content hash.
pub fn differs(before: &[u8], after: &[u8]) -> bool {
    keccak256(before) != keccak256(after)
}

/// Compare the code at `address` between the deployment block and `head`.
pub async fn changed<C: Chain>(
    chain: &C,
    address: &Address,
    deployed_at: u64,
    head: u64,
) -> eyre::Result<bool> {
    let before = chain.code(address, BlockTag::Number(deployed_at)).await?;
    let after = chain.code(address, BlockTag::Number(head)).await?;
    let changed = differs(&before, &after);
    debug!(
        %address,
        deployed_at,
        head,
        before = %hex::encode(keccak256(&before)),
        after = %hex::encode(keccak256(&after)),
        changed,
        "Compared code hashes"
    );
    Ok(changed)
}
