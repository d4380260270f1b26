use std::fmt;

/// Declared type of a package value. Codecs are registered per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelKey(String);

impl ModelKey {
    /// Key with an explicit label (e.g. a type name used by another producer).
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// Key derived from a Rust type.
    pub fn of<T: ?Sized>() -> Self {
        Self(std::any::type_name::<T>().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModelKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
