use tracing::debug;

use crate::{
    chain::{BlockTag, Chain},
    common::address::Address,
};

/// Lowest block in `[0, upper]` at which `address` has non-empty code.
///
/// Binary search, so it assumes code presence is monotonic in block height.
/// A contract that was destroyed and later redeployed may therefore resolve
/// to a later deployment than the first one. The caller must make sure code
/// exists at `upper`; otherwise `upper` itself is returned.
pub async fn locate<C: Chain>(chain: &C, address: &Address, upper: u64) -> eyre::Result<u64> {
    let mut lo = 0;
    let mut hi = upper;
    let mut lookups = 0usize;

    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        let code = chain.code(address, BlockTag::Number(mid)).await?;
        lookups += 1;
        debug!(%address, block = mid, len = code.len(), "Probed code");
        if code.is_empty() {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }

    debug!(%address, block = lo, lookups, "Deployment block located");
    Ok(lo)
}
