use std::net::SocketAddr;

use eyre::Context;

use crate::signature::Signatures;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

#[derive(Clone, Debug)]
pub struct Config {
    /// JSON-RPC endpoint; must serve `trace_block`.
    pub url: Option<String>,
    pub signatures: Signatures,
    pub bind_addr: SocketAddr,
}

impl Config {
    /// Read `URL`, `METAMORPHIC_INIT_CODES` and `BIND_ADDR` from the process
    /// environment. Call `dotenv::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> eyre::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> eyre::Result<Self> {
        let url = lookup("URL").filter(|url| !url.is_empty());

        let mut signatures = Signatures::default();
        if let Some(list) = lookup("METAMORPHIC_INIT_CODES") {
            signatures.extend(Signatures::parse_list(&list).context("METAMORPHIC_INIT_CODES")?);
        }

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .context("invalid BIND_ADDR")?;

        Ok(Self {
            url,
            signatures,
            bind_addr,
        })
    }

    pub fn url(&self) -> eyre::Result<&str> {
        self.url
            .as_deref()
            .ok_or_else(|| eyre::eyre!("RPC endpoint not configured: set URL or pass --url"))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> eyre::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() -> eyre::Result<()> {
        let config = config(&[])?;
        assert!(config.url.is_none());
        assert!(config.url().is_err());
        assert_eq!(config.signatures.len(), 1);
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR.parse::<SocketAddr>()?);
        Ok(())
    }

    #[test]
    fn test_overrides() -> eyre::Result<()> {
        let config = config(&[
            ("URL", "http://localhost:8545"),
            ("METAMORPHIC_INIT_CODES", "0xdeadbeef,0xcafe"),
            ("BIND_ADDR", "0.0.0.0:3000"),
        ])?;
        assert_eq!(config.url()?, "http://localhost:8545");
        assert_eq!(config.signatures.len(), 3);
        assert_eq!(config.bind_addr.port(), 3000);
        Ok(())
    }

    #[test]
    fn test_invalid() {
        assert!(config(&[("METAMORPHIC_INIT_CODES", "0xnothex")]).is_err());
        assert!(config(&[("BIND_ADDR", "nowhere")]).is_err());
    }
}
