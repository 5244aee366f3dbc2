//! SimGuard: simulate wallet signing requests before they reach the wallet.
//!
//! A dapp talks to the [`binding::ProviderBinding`] as if it were the wallet.
//! `eth_sendTransaction` and `eth_signTypedData_v3`/`_v4` calls are handed to
//! the [`dispatcher::Dispatcher`], which records them in the
//! [`lifecycle::RequestStore`] and asks the simulation service for a verdict.
//! Everything else, and every call whose simulation fails, goes straight
//! through.

pub mod backend;
pub mod binding;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod lifecycle;
pub mod provider;
pub mod proxy;
pub mod server;
pub mod settings;
pub mod storage;
pub mod types;

#[cfg(test)]
mod testing;
