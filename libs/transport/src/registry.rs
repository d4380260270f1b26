use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use transport_api::{Codec, ModelKey, TransportError};

/// Codec lookup by model key.
///
/// One codec per key, last registration wins. An optional fallback codec
/// answers for keys without a registration. The registry is an explicit
/// object shared by `Arc` — tests create their own and `reset()` it
/// between cases instead of relying on process-wide state.
#[derive(Default)]
pub struct CodecRegistry {
    codecs: RwLock<HashMap<ModelKey, Arc<dyn Codec>>>,
    fallback: RwLock<Option<Arc<dyn Codec>>>,
}

impl std::fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let guard = self.read();
        let mut keys: Vec<&str> = guard.keys().map(ModelKey::as_str).collect();
        keys.sort_unstable();
        let fallback = self.fallback().map(|c| c.id().to_string());
        f.debug_struct("CodecRegistry")
            .field("models", &keys)
            .field("fallback", &fallback)
            .finish()
    }
}

impl CodecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn register(&self, model: ModelKey, codec: Arc<dyn Codec>) {
        tracing::debug!(model = %model, codec = codec.id(), "registering codec");
        if let Some(previous) = self.write().insert(model.clone(), codec) {
            tracing::debug!(model = %model, previous = previous.id(), "codec registration replaced");
        }
    }

    /// Register `codec` for values of type `T`.
    pub fn register_for<T: ?Sized>(&self, codec: Arc<dyn Codec>) {
        self.register(ModelKey::of::<T>(), codec);
    }

    /// Codec used for models without their own registration.
    pub fn set_fallback(&self, codec: Arc<dyn Codec>) {
        tracing::debug!(codec = codec.id(), "setting fallback codec");
        *self.fallback_slot() = Some(codec);
    }

    pub fn fallback(&self) -> Option<Arc<dyn Codec>> {
        match self.fallback.read() {
            Ok(g) => g.clone(),
            Err(poisoned) => {
                tracing::warn!("codec registry fallback lock was poisoned, recovering");
                poisoned.into_inner().clone()
            }
        }
    }

    pub fn resolve(&self, model: &ModelKey) -> Result<Arc<dyn Codec>, TransportError> {
        if let Some(codec) = self.read().get(model) {
            return Ok(codec.clone());
        }
        self.fallback()
            .ok_or_else(|| TransportError::CodecNotFound(model.clone()))
    }

    pub fn contains(&self, model: &ModelKey) -> bool {
        self.read().contains_key(model)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Drop every registration and the fallback.
    pub fn reset(&self) {
        self.write().clear();
        *self.fallback_slot() = None;
    }

    fn fallback_slot(&self) -> RwLockWriteGuard<'_, Option<Arc<dyn Codec>>> {
        match self.fallback.write() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("codec registry fallback lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<ModelKey, Arc<dyn Codec>>> {
        match self.codecs.read() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("codec registry read lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<ModelKey, Arc<dyn Codec>>> {
        match self.codecs.write() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("codec registry write lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}
