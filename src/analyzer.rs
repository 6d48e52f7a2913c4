//! Composite metamorphism analysis.
//!
//! Sequences the deployment locator, creation trace resolver, opcode scanner
//! and code hash comparator into a single pass and reports six independent
//! indicators. No indicator implies another and none of them is folded into
//! a score.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

use crate::{
    chain::{BlockTag, Chain},
    codehash,
    common::address::Address,
    error::Error,
    locator,
    opcodes::Target,
    scanner::Scanner,
    signature::Signatures,
    trace::{CreateKind, Resolver},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    CodeHashChanged,
    MetamorphicInitCode,
    SelfDestruct,
    DelegateCall,
    DeployedByContract,
    DeployerCreate2,
}

impl Indicator {
    pub const ALL: [Indicator; 6] = [
        Indicator::CodeHashChanged,
        Indicator::MetamorphicInitCode,
        Indicator::SelfDestruct,
        Indicator::DelegateCall,
        Indicator::DeployedByContract,
        Indicator::DeployerCreate2,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Indicator::CodeHashChanged => "Code Changed",
            Indicator::MetamorphicInitCode => "Contains Metamorphic Init Code",
            Indicator::SelfDestruct => "Contains SELFDESTRUCT",
            Indicator::DelegateCall => "Contains DELEGATECALL",
            Indicator::DeployedByContract => "Deployed by Contract",
            Indicator::DeployerCreate2 => "Deployer Contains CREATE2",
        }
    }
}

/// Verdict of a single analysis pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Analysis {
    pub address: Address,
    pub head: u64,
    pub deployment_block: u64,
    pub deployer: Option<Address>,
    pub create_kind: Option<CreateKind>,
    pub code_hash_changed: bool,
    pub metamorphic_init_code: bool,
    pub self_destruct: bool,
    pub delegate_call: bool,
    pub deployed_by_contract: bool,
    pub deployer_create2: bool,
}

impl Analysis {
    fn negative(address: Address, head: u64, deployment_block: u64) -> Self {
        Self {
            address,
            head,
            deployment_block,
            deployer: None,
            create_kind: None,
            code_hash_changed: false,
            metamorphic_init_code: false,
            self_destruct: false,
            delegate_call: false,
            deployed_by_contract: false,
            deployer_create2: false,
        }
    }

    pub fn get(&self, indicator: Indicator) -> bool {
        match indicator {
            Indicator::CodeHashChanged => self.code_hash_changed,
            Indicator::MetamorphicInitCode => self.metamorphic_init_code,
            Indicator::SelfDestruct => self.self_destruct,
            Indicator::DelegateCall => self.delegate_call,
            Indicator::DeployedByContract => self.deployed_by_contract,
            Indicator::DeployerCreate2 => self.deployer_create2,
        }
    }

    pub fn indicators(&self) -> impl Iterator<Item = (Indicator, bool)> + '_ {
        Indicator::ALL
            .into_iter()
            .map(|indicator| (indicator, self.get(indicator)))
    }
}

pub struct Analyzer<C> {
    chain: C,
    signatures: Signatures,
    resolver: Resolver,
}

impl<C: Chain> Analyzer<C> {
    pub fn new(chain: C) -> Self {
        Self {
            chain,
            signatures: Signatures::default(),
            resolver: Resolver::default(),
        }
    }

    pub fn with_signatures(mut self, signatures: Signatures) -> Self {
        self.signatures = signatures;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.resolver = self.resolver.with_delay(delay);
        self
    }

    pub fn chain(&self) -> &C {
        &self.chain
    }

    /// Validate `address` and analyse it against the current head.
    pub async fn analyze(&self, address: &str) -> Result<Analysis, Error> {
        let address: Address = address.parse()?;
        self.analyze_address(address).await
    }

    pub async fn analyze_address(&self, address: Address) -> Result<Analysis, Error> {
        let head = self.chain.head().await?;
        let code = self.chain.code(&address, BlockTag::Number(head)).await?;
        if code.is_empty() {
            info!(%address, head, "No code at head");
            return Ok(Analysis::negative(address, head, head));
        }

        let deployment_block = locator::locate(&self.chain, &address, head).await?;
        info!(%address, deployment_block, "Deployment block located");

        let Some(trace) = self
            .resolver
            .resolve(&self.chain, deployment_block, &address)
            .await?
        else {
            info!(%address, deployment_block, "No creation trace found");
            let mut analysis = Analysis::negative(address, head, deployment_block);
            analysis.code_hash_changed =
                codehash::changed(&self.chain, &address, deployment_block, head).await?;
            return Ok(analysis);
        };
        debug!(%address, deployer = %trace.deployer, kind = ?trace.kind, "Creation trace resolved");

        let runtime = trace.deployed_code.as_ref();
        let self_destruct = Scanner::contains(runtime, Target::SelfDestruct);
        let delegate_call = Scanner::contains(runtime, Target::DelegateCall);
        let metamorphic_init_code = self.signatures.matches(trace.init_code.as_ref());

        let deployer_code = self
            .chain
            .code(&trace.deployer, BlockTag::Number(head))
            .await?;
        let deployed_by_contract = !deployer_code.is_empty();
        let deployer_create2 =
            deployed_by_contract && Scanner::contains(&deployer_code, Target::Create2);

        let code_hash_changed =
            codehash::changed(&self.chain, &address, deployment_block, head).await?;

        let analysis = Analysis {
            address,
            head,
            deployment_block,
            deployer: Some(trace.deployer),
            create_kind: Some(trace.kind),
            code_hash_changed,
            metamorphic_init_code,
            self_destruct,
            delegate_call,
            deployed_by_contract,
            deployer_create2,
        };
        info!(
            %address,
            code_hash_changed,
            metamorphic_init_code,
            self_destruct,
            delegate_call,
            deployed_by_contract,
            deployer_create2,
            "Analysis complete"
        );
        Ok(analysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{common::address::addr, testing::MockChain};

    const CONTRACT: Address = addr("0x00000000008c9782ff4eb38e9293ee3dfa75fa9e");

    #[tokio::test]
    async fn test_invalid_address_makes_no_calls() {
        let analyzer = Analyzer::new(MockChain::new(10));
        let error = analyzer.analyze("0x1234").await.unwrap_err();
        assert!(error.is_invalid_address());
        assert_eq!(analyzer.chain().code_calls(), 0);
    }

    #[test]
    fn test_indicator_order() {
        let mut analysis = Analysis::negative(CONTRACT, 5, 5);
        analysis.delegate_call = true;
        let flags = analysis.indicators().collect::<Vec<_>>();
        assert_eq!(flags.len(), 6);
        assert_eq!(flags[0], (Indicator::CodeHashChanged, false));
        assert_eq!(flags[3], (Indicator::DelegateCall, true));
        assert_eq!(flags.iter().filter(|(_, value)| *value).count(), 1);
    }

    #[test]
    fn test_serialize() {
        let analysis = Analysis::negative(CONTRACT, 7, 3);
        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["address"], CONTRACT.checksum());
        assert_eq!(
            json["address"].as_str().map(str::to_lowercase).as_deref(),
            Some("0x00000000008c9782ff4eb38e9293ee3dfa75fa9e")
        );
        assert_eq!(json["deployment_block"], 3);
        assert_eq!(json["head"], 7);
        assert_eq!(json["deployer"], serde_json::Value::Null);
        assert_eq!(json["self_destruct"], false);
    }
}
