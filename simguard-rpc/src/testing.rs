//! Test doubles for the provider, the simulation service and storage.

use crate::backend::SimulationBackend;
use crate::error::{BackendError, ProviderError, StorageError};
use crate::provider::{split_request, Provider};
use crate::storage::DocumentStore;
use crate::types::SimulationOutcome;
use alloy_primitives::ChainId;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Records every call and answers from a fixed script.
pub struct RecordingProvider {
    pub calls: Mutex<Vec<(String, Vec<Value>)>>,
    chain_id: Value,
    response: Value,
    properties: HashMap<String, Value>,
}

impl RecordingProvider {
    pub fn new() -> Self {
        Self::answering(json!("0xforwarded"))
    }

    /// Every non-chain-id call returns `response`.
    pub fn answering(response: Value) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            chain_id: json!("0x1"),
            response,
            properties: HashMap::from([("isMetaMask".to_string(), json!(true))]),
        }
    }

    pub fn with_chain_id(mut self, chain_id: Value) -> Self {
        self.chain_id = chain_id;
        self
    }

    /// JSON-RPC methods seen, in call order.
    pub fn methods(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(_, args)| split_request(args).ok().map(|(m, _)| m))
            .collect()
    }

    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for RecordingProvider {
    async fn call(&self, member: &str, args: Vec<Value>) -> Result<Value, ProviderError> {
        self.calls
            .lock()
            .unwrap()
            .push((member.to_string(), args.clone()));
        match split_request(&args) {
            Ok((method, _)) if method == "eth_chainId" => Ok(self.chain_id.clone()),
            _ => Ok(self.response.clone()),
        }
    }

    fn property(&self, name: &str) -> Option<Value> {
        self.properties.get(name).cloned()
    }
}

/// Answers every simulation with the same scripted result.
pub struct ScriptedBackend {
    script: Result<SimulationOutcome, (u16, String)>,
    pub calls: AtomicUsize,
}

impl ScriptedBackend {
    pub fn outcome(outcome: SimulationOutcome) -> Self {
        Self {
            script: Ok(outcome),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(status: u16, body: &str) -> Self {
        Self {
            script: Err((status, body.to_string())),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn answer(&self) -> Result<SimulationOutcome, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Ok(outcome) => Ok(outcome.clone()),
            Err((status, body)) => Err(BackendError::Status {
                status: *status,
                body: body.clone(),
            }),
        }
    }
}

#[async_trait]
impl SimulationBackend for ScriptedBackend {
    async fn simulate_transaction(
        &self,
        _chain_id: ChainId,
        _transaction: &Value,
    ) -> Result<SimulationOutcome, BackendError> {
        self.answer()
    }

    async fn simulate_signature(
        &self,
        _chain_id: ChainId,
        _domain: &Value,
        _message: &Value,
        _primary_type: &str,
    ) -> Result<SimulationOutcome, BackendError> {
        self.answer()
    }
}

/// Storage that is always down.
pub struct UnavailableStore;

#[async_trait]
impl DocumentStore for UnavailableStore {
    async fn get(&self, _key: &str) -> Result<Option<Value>, StorageError> {
        Err(std::io::Error::new(std::io::ErrorKind::Other, "storage offline").into())
    }

    async fn set(&self, _key: &str, _value: Value) -> Result<(), StorageError> {
        Err(std::io::Error::new(std::io::ErrorKind::Other, "storage offline").into())
    }
}
