use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    chain::Chain,
    common::{Hex, address::Address},
    error::Error,
};

/// Attempts made at fetching a block's traces before giving up.
pub const ATTEMPTS: usize = 3;
/// Fixed pause between attempts.
pub const RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreateKind {
    #[default]
    Create,
    Create2,
}

/// One contract creation extracted from a block trace.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CreationTrace {
    pub deployer: Address,
    pub init_code: Hex,
    pub deployed_code: Hex,
    pub created: Address,
    pub kind: CreateKind,
    pub tx_hash: Option<String>,
}

#[derive(Deserialize)]
struct RawTrace {
    #[serde(rename = "type")]
    kind: String,
    action: serde_json::Value,
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(rename = "transactionHash", default)]
    tx_hash: Option<String>,
}

#[derive(Deserialize)]
struct CreateAction {
    from: Address,
    init: Hex,
    #[serde(rename = "creationMethod", default)]
    method: Option<String>,
}

#[derive(Deserialize)]
struct CreateResult {
    address: Address,
    code: Hex,
}

/// Extract creations from a `trace_block` result.
///
/// Non-create entries are ignored, as are creations that failed and so have
/// no `result`.
pub fn parse_block_traces(value: serde_json::Value) -> eyre::Result<Vec<CreationTrace>> {
    let traces: Vec<RawTrace> = serde_json::from_value(value)?;
    let mut creations = Vec::new();
    for trace in traces {
        if trace.kind != "create" {
            continue;
        }
        let Some(result) = trace.result.filter(|result| !result.is_null()) else {
            continue;
        };
        let action: CreateAction = serde_json::from_value(trace.action)?;
        let result: CreateResult = serde_json::from_value(result)?;
        let kind = match action.method.as_deref() {
            Some("create2") => CreateKind::Create2,
            _ => CreateKind::Create,
        };
        creations.push(CreationTrace {
            deployer: action.from,
            init_code: action.init,
            deployed_code: result.code,
            created: result.address,
            kind,
            tx_hash: trace.tx_hash,
        });
    }
    Ok(creations)
}

/// Looks up the creation of an address within a block, retrying the trace
/// fetch a fixed number of times.
#[derive(Clone, Debug)]
pub struct Resolver {
    attempts: usize,
    delay: Duration,
}

impl Default for Resolver {
    fn default() -> Self {
        Self {
            attempts: ATTEMPTS,
            delay: RETRY_DELAY,
        }
    }
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub async fn resolve<C: Chain>(
        &self,
        chain: &C,
        block: u64,
        address: &Address,
    ) -> Result<Option<CreationTrace>, Error> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match chain.creation_traces(block).await {
                Ok(traces) => {
                    debug!(block, creations = traces.len(), "Block traces fetched");
                    return Ok(traces.into_iter().find(|trace| &trace.created == address));
                }
                Err(reason) if attempt < self.attempts => {
                    warn!(block, attempt, error = %reason, "Trace request failed, retrying");
                    tokio::time::sleep(self.delay).await;
                }
                Err(reason) => {
                    return Err(Error::TraceUnavailable {
                        block,
                        attempts: attempt,
                        reason,
                    });
                }
            }
        }
    }
}
