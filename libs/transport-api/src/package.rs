use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::TransportError;
use crate::message::WireMessage;
use crate::model::ModelKey;

/// Serialization source of a package.
#[derive(Debug, Clone, PartialEq)]
pub enum PackageValue {
    /// Structured value, serialized by the codec registered for the model key.
    Typed(serde_json::Value),
    /// Pre-serialized bytes, published verbatim without codec lookup.
    Raw(Vec<u8>),
}

/// Logical package — the unit a producer is asked to publish.
///
/// Received or round-tripped packages also carry the wire message
/// they were decoded from.
#[derive(Debug, Clone)]
pub struct TransportPackage {
    model_key: ModelKey,
    key: Option<String>,
    value: PackageValue,
    wire: Option<WireMessage>,
}

impl TransportPackage {
    /// Package a typed value. The model key is derived from `T`.
    pub fn new<T: Serialize>(key: Option<&str>, value: &T) -> Result<Self, TransportError> {
        Ok(Self::from_value(
            ModelKey::of::<T>(),
            key,
            serde_json::to_value(value)?,
        ))
    }

    /// Package an already structured value under an explicit model key.
    pub fn from_value(model_key: ModelKey, key: Option<&str>, value: serde_json::Value) -> Self {
        Self {
            model_key,
            key: key.map(str::to_string),
            value: PackageValue::Typed(value),
            wire: None,
        }
    }

    /// Package pre-serialized bytes.
    pub fn raw(model_key: ModelKey, key: Option<&str>, bytes: Vec<u8>) -> Self {
        Self {
            model_key,
            key: key.map(str::to_string),
            value: PackageValue::Raw(bytes),
            wire: None,
        }
    }

    /// Attach the wire message this package was published as / decoded from.
    pub fn with_wire(mut self, wire: WireMessage) -> Self {
        self.wire = Some(wire);
        self
    }

    pub fn model_key(&self) -> &ModelKey {
        &self.model_key
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn value(&self) -> &PackageValue {
        &self.value
    }

    pub fn wire(&self) -> Option<&WireMessage> {
        self.wire.as_ref()
    }

    /// Convert the typed value back into `T`.
    /// Raw packages are parsed as JSON.
    pub fn value_as<T: DeserializeOwned>(&self) -> Result<T, TransportError> {
        match &self.value {
            PackageValue::Typed(v) => Ok(T::deserialize(v)?),
            PackageValue::Raw(bytes) => Ok(serde_json::from_slice(bytes)?),
        }
    }
}
