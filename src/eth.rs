use eyre::OptionExt;
use tracing::Level;

use crate::{
    chain::{BlockTag, Chain},
    common::address::Address,
    trace::{CreationTrace, parse_block_traces},
};

#[derive(Clone)]
pub struct EthClient {
    http: reqwest::Client,
    url: String,
}

impl EthClient {
    pub fn new(url: &str) -> eyre::Result<Self> {
        let http = reqwest::ClientBuilder::new().build()?;
        Ok(Self {
            http,
            url: url.to_string(),
        })
    }

    pub async fn block_number(&self) -> eyre::Result<u64> {
        let value = self
            .rpc(serde_json::json!({
                "jsonrpc": "2.0",
                "method": "eth_blockNumber",
                "params": [],
                "id": 0
            }))
            .await?;
        hex_to_u64(&value)
    }

    pub async fn get_code(&self, address: &Address, block: BlockTag) -> eyre::Result<Vec<u8>> {
        let address = format!("0x{}", hex::encode(address.0));
        self.rpc(serde_json::json!({
            "jsonrpc": "2.0",
            "method": "eth_getCode",
            "params": [
                address,
                block
            ],
            "id": 0
        }))
        .await
        .and_then(|value| hex_to_vec(&value))
    }

    /// Parity-style `trace_block`, reduced to successful contract creations.
    pub async fn trace_block(&self, number: u64) -> eyre::Result<Vec<CreationTrace>> {
        let value = self
            .rpc(serde_json::json!({
                "jsonrpc": "2.0",
                "method": "trace_block",
                "params": [
                    BlockTag::Number(number)
                ],
                "id": 0
            }))
            .await?;
        block_creations(number, value)
    }

    async fn rpc(&self, value: serde_json::Value) -> eyre::Result<serde_json::Value> {
        if tracing::enabled!(Level::TRACE) {
            tracing::trace!(json = %value, "HTTP request");
        }
        let res = self.http.post(&self.url).json(&value).send().await?;

        let status = res.status();
        if !status.is_success() {
            let (code, message) = (status.as_u16(), status.as_str());
            tracing::error!(code, message, "Ethereum call failed");
            eyre::bail!("HTTP {}", status.as_u16());
        }

        let response: serde_json::Value = res.json().await?;
        if tracing::enabled!(Level::TRACE) {
            tracing::trace!(json = %response, "HTTP response");
        }

        into_result(response)
    }
}

/// Unwrap a JSON-RPC response envelope; an `error` member wins over `result`.
fn into_result(mut response: serde_json::Value) -> eyre::Result<serde_json::Value> {
    if let Some(error) = response["error"].as_object() {
        let json = serde_json::to_string(&error)?;
        eyre::bail!("RPC error: '{json}'");
    }
    if let Some(error) = response["error"].as_str() {
        eyre::bail!("RPC error: '{error}'");
    }
    Ok(response
        .get_mut("result")
        .map(serde_json::Value::take)
        .unwrap_or_default())
}

/// A null `trace_block` result means the node has no traces for the block,
/// which is a failure rather than an empty block.
fn block_creations(number: u64, value: serde_json::Value) -> eyre::Result<Vec<CreationTrace>> {
    if value.is_null() {
        eyre::bail!("trace_block returned no result for block {number}");
    }
    parse_block_traces(value)
}

impl Chain for EthClient {
    async fn head(&self) -> eyre::Result<u64> {
        self.block_number().await
    }

    async fn code(&self, address: &Address, block: BlockTag) -> eyre::Result<Vec<u8>> {
        self.get_code(address, block).await
    }

    async fn creation_traces(&self, block: u64) -> eyre::Result<Vec<CreationTrace>> {
        self.trace_block(block).await
    }
}

fn hex_to_u64(val: &serde_json::Value) -> eyre::Result<u64> {
    let hex = val.as_str().ok_or_eyre("missing hex str")?;
    let hex = hex.strip_prefix("0x").unwrap_or(hex);
    let num = u64::from_str_radix(hex, 16)?;
    Ok(num)
}

fn hex_to_vec(val: &serde_json::Value) -> eyre::Result<Vec<u8>> {
    let hex = val.as_str().ok_or_eyre("missing hex str")?;
    let hex = hex.strip_prefix("0x").unwrap_or(hex);
    let vec = hex::decode(hex)?;
    Ok(vec)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_hex_to_u64() {
        assert_eq!(hex_to_u64(&json!("0xa2577f")).unwrap(), 10639231);
        assert_eq!(hex_to_u64(&json!("0x0")).unwrap(), 0);
        assert!(hex_to_u64(&json!(null)).is_err());
        assert!(hex_to_u64(&json!("0xzz")).is_err());
    }

    #[test]
    fn test_hex_to_vec() {
        assert_eq!(hex_to_vec(&json!("0x")).unwrap(), Vec::<u8>::new());
        assert_eq!(hex_to_vec(&json!("0x6080ff")).unwrap(), vec![0x60, 0x80, 0xff]);
        assert!(hex_to_vec(&json!(42)).is_err());
    }

    #[test]
    fn test_into_result() {
        let ok = json!({"jsonrpc": "2.0", "id": 0, "result": "0x6080"});
        assert_eq!(into_result(ok).unwrap(), json!("0x6080"));

        let missing = json!({"jsonrpc": "2.0", "id": 0});
        assert_eq!(into_result(missing).unwrap(), json!(null));

        let object = json!({
            "jsonrpc": "2.0",
            "id": 0,
            "error": {"code": -32601, "message": "the method trace_block does not exist"}
        });
        let err = into_result(object).unwrap_err().to_string();
        assert!(err.starts_with("RPC error: '"), "{err}");
        assert!(err.contains("-32601"), "{err}");
        assert!(err.contains("trace_block does not exist"), "{err}");

        let string = json!({"jsonrpc": "2.0", "id": 0, "error": "rate limited", "result": "0x1"});
        assert_eq!(
            into_result(string).unwrap_err().to_string(),
            "RPC error: 'rate limited'"
        );
    }

    #[test]
    fn test_block_creations() {
        let err = block_creations(300, json!(null)).unwrap_err().to_string();
        assert_eq!(err, "trace_block returned no result for block 300");

        assert!(block_creations(300, json!([])).unwrap().is_empty());

        let traces = json!([
            {
                "type": "call",
                "action": {"from": "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"},
                "result": {"gasUsed": "0x0", "output": "0x"}
            },
            {
                "type": "create",
                "action": {
                    "from": "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266",
                    "init": "0x6000",
                    "creationMethod": "create"
                },
                "result": {
                    "address": "0x000000009b988fbecfd83c55252f78592e609648",
                    "code": "0x33ff"
                },
                "transactionHash": "0x01"
            }
        ]);
        let creations = block_creations(300, traces).unwrap();
        assert_eq!(creations.len(), 1);
        assert_eq!(creations[0].deployed_code.as_ref(), &[0x33, 0xff]);
    }

    #[test]
    fn test_code_request_shape() {
        let address = crate::common::address::addr("0x000000009b988fbecfd83c55252f78592e609648");
        let params = json!([format!("0x{}", hex::encode(address.0)), BlockTag::Number(255)]);
        assert_eq!(
            params,
            json!(["0x000000009b988fbecfd83c55252f78592e609648", "0xff"])
        );
    }
}
