pub mod analyzer;
pub mod chain;
pub mod codehash;
pub mod common;
pub mod config;
pub mod error;
pub mod eth;
pub mod locator;
pub mod opcodes;
pub mod scanner;
pub mod signature;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;
pub mod trace;

pub use analyzer::{Analysis, Analyzer, Indicator};
pub use chain::{BlockTag, Chain};
pub use error::Error;
