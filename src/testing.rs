//! In-memory `Chain` for tests. Enabled by the `test-util` feature.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
};

use crate::{
    chain::{BlockTag, Chain},
    common::address::Address,
    trace::CreationTrace,
};

/// Code history per address and creation traces per block, with call
/// counters and injectable transport faults.
#[derive(Default)]
pub struct MockChain {
    pub head: u64,
    pub code: HashMap<Address, Vec<(u64, Vec<u8>)>>,
    pub traces: HashMap<u64, Vec<CreationTrace>>,
    /// The first `trace_failures` trace requests fail.
    pub trace_failures: usize,
    /// Zero-based index of the one code request that fails.
    pub code_failure: Option<usize>,
    pub trace_calls: AtomicUsize,
    pub code_calls: AtomicUsize,
}

impl MockChain {
    pub fn new(head: u64) -> Self {
        Self {
            head,
            ..Default::default()
        }
    }

    /// `code` is resident at `address` from block `from` onwards.
    pub fn deploy(mut self, address: Address, from: u64, code: &[u8]) -> Self {
        let history = self.code.entry(address).or_default();
        history.push((from, code.to_vec()));
        history.sort_by_key(|(from, _)| *from);
        self
    }

    pub fn trace(mut self, block: u64, trace: CreationTrace) -> Self {
        self.traces.entry(block).or_default().push(trace);
        self
    }

    /// Deploy `trace.deployed_code` at `trace.created` and record the trace.
    pub fn create(self, block: u64, trace: CreationTrace) -> Self {
        let created = trace.created;
        let code = trace.deployed_code.as_ref().to_vec();
        self.deploy(created, block, &code).trace(block, trace)
    }

    pub fn failing(mut self, failures: usize) -> Self {
        self.trace_failures = failures;
        self
    }

    pub fn failing_code_on(mut self, call: usize) -> Self {
        self.code_failure = Some(call);
        self
    }

    pub fn code_at(&self, address: &Address, block: u64) -> Vec<u8> {
        self.code
            .get(address)
            .and_then(|history| history.iter().rev().find(|(from, _)| *from <= block))
            .map(|(_, code)| code.clone())
            .unwrap_or_default()
    }

    pub fn code_calls(&self) -> usize {
        self.code_calls.load(Ordering::SeqCst)
    }

    pub fn trace_calls(&self) -> usize {
        self.trace_calls.load(Ordering::SeqCst)
    }
}

impl Chain for MockChain {
    async fn head(&self) -> eyre::Result<u64> {
        Ok(self.head)
    }

    async fn code(&self, address: &Address, block: BlockTag) -> eyre::Result<Vec<u8>> {
        let call = self.code_calls.fetch_add(1, Ordering::SeqCst);
        if self.code_failure == Some(call) {
            eyre::bail!("connection reset (eth_getCode call {})", call + 1);
        }
        let number = match block {
            BlockTag::Latest => self.head,
            BlockTag::Number(number) => number,
        };
        Ok(self.code_at(address, number))
    }

    async fn creation_traces(&self, block: u64) -> eyre::Result<Vec<CreationTrace>> {
        let call = self.trace_calls.fetch_add(1, Ordering::SeqCst);
        if call < self.trace_failures {
            eyre::bail!("connection reset (attempt {})", call + 1);
        }
        Ok(self.traces.get(&block).cloned().unwrap_or_default())
    }
}
