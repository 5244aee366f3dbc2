//! The single provider slot exposed to page code.
//!
//! Reading the slot yields an [`InterceptingProvider`] around whatever provider
//! was last written. The wrapper is built lazily on the first read after a
//! write and then reused, so callers that cache it and compare identity keep
//! seeing the same object until the underlying provider changes.

use crate::dispatcher::Dispatcher;
use crate::provider::Provider;
use crate::proxy::InterceptingProvider;
use crate::settings::Settings;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tracing::{debug, info};

#[derive(Default)]
struct BindingState {
    current: Option<Arc<dyn Provider>>,
    cached: Option<Arc<InterceptingProvider>>,
    dirty: bool,
}

pub struct ProviderBinding {
    dispatcher: Arc<Dispatcher>,
    settings: watch::Receiver<Settings>,
    state: Mutex<BindingState>,
}

impl ProviderBinding {
    pub fn new(dispatcher: Arc<Dispatcher>, settings: watch::Receiver<Settings>) -> Self {
        Self {
            dispatcher,
            settings,
            state: Mutex::new(BindingState::default()),
        }
    }

    /// The proxied provider, or `None` if nothing has been bound yet.
    pub fn get(&self) -> Option<Arc<InterceptingProvider>> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.dirty || state.cached.is_none() {
            let current = state.current.clone()?;
            debug!("rebuilding provider proxy");
            state.cached = Some(Arc::new(InterceptingProvider::new(
                current,
                Arc::clone(&self.dispatcher),
                self.settings.clone(),
            )));
            state.dirty = false;
        }
        state.cached.clone()
    }

    /// Replace the underlying provider. The proxy is rebuilt on the next `get`.
    pub fn set(&self, provider: Arc<dyn Provider>) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        info!("underlying provider replaced");
        state.current = Some(provider);
        state.dirty = true;
    }
}

// ── Tests ────────────────────────────────────────────────────────
