use base64::Engine;
use serde::Serialize;

/// Header naming the model key of the serialized value.
pub const MODEL_KEY_HEADER: &str = "x-model-key";
/// Header naming the codec that produced the value bytes.
/// Absent for raw pass-through packages.
pub const CODEC_ID_HEADER: &str = "x-codec-id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    pub name: String,
    pub value: Vec<u8>,
}

/// Wire-level message as a broker transports it: key + value bytes + headers.
///
/// Immutable once built; only the transport producer constructs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireMessage {
    key: Option<Vec<u8>>,
    value: Vec<u8>,
    headers: Vec<MessageHeader>,
    timestamp_ms: i64,
}

impl WireMessage {
    pub fn new(
        key: Option<Vec<u8>>,
        value: Vec<u8>,
        headers: Vec<MessageHeader>,
        timestamp_ms: i64,
    ) -> Self {
        Self { key, value, headers, timestamp_ms }
    }

    pub fn key(&self) -> Option<&[u8]> {
        self.key.as_deref()
    }

    /// Key as UTF-8, `None` if absent or not valid UTF-8.
    pub fn key_str(&self) -> Option<&str> {
        self.key.as_deref().and_then(|k| std::str::from_utf8(k).ok())
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    pub fn headers(&self) -> &[MessageHeader] {
        &self.headers
    }

    /// First header with the given name.
    pub fn header(&self, name: &str) -> Option<&[u8]> {
        self.headers
            .iter()
            .find(|h| h.name == name)
            .map(|h| h.value.as_slice())
    }

    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.header(name).and_then(|v| std::str::from_utf8(v).ok())
    }

    pub fn timestamp_ms(&self) -> i64 {
        self.timestamp_ms
    }
}

impl Serialize for WireMessage {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::{SerializeMap, SerializeStruct};

        struct Headers<'a>(&'a [MessageHeader]);

        impl Serialize for Headers<'_> {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut m = serializer.serialize_map(Some(self.0.len()))?;
                for h in self.0 {
                    m.serialize_entry(&h.name, &printable(&h.value))?;
                }
                m.end()
            }
        }

        let mut s = serializer.serialize_struct("WireMessage", 4)?;
        s.serialize_field("key", &self.key.as_deref().map(printable))?;
        // Inline JSON values for readability, base64 for anything else
        match serde_json::from_slice::<serde_json::Value>(&self.value) {
            Ok(value) => s.serialize_field("value", &value)?,
            Err(_) => s.serialize_field("value_base64", &b64(&self.value))?,
        }
        s.serialize_field("headers", &Headers(&self.headers))?;
        s.serialize_field("timestamp_ms", &self.timestamp_ms)?;
        s.end()
    }
}

fn printable(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => b64(bytes),
    }
}

fn b64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}
