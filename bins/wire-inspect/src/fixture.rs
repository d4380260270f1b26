use base64::Engine;
use serde::Deserialize;

use transport_api::{ModelKey, TransportPackage};

use crate::error::InspectError;

/// Fixture file — parsed from TOML.
#[derive(Debug, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub packages: Vec<PackageEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageEntry {
    pub key: Option<String>,
    /// Model key label. Derived from the value kind when omitted.
    pub model: Option<String>,
    /// Typed value, converted to JSON. Datetimes become RFC 3339 strings.
    pub value: Option<toml::Value>,
    /// Pre-serialized payload, published verbatim.
    pub raw_base64: Option<String>,
}

impl Fixture {
    pub fn load(path: &str) -> Result<Self, InspectError> {
        let content = std::fs::read_to_string(path).map_err(|e| InspectError::Fixture {
            context: "read",
            detail: format!("'{path}': {e}"),
        })?;
        Self::parse(&content).map_err(|e| match e {
            InspectError::Fixture { context, detail } => InspectError::Fixture {
                context,
                detail: format!("'{path}': {detail}"),
            },
            other => other,
        })
    }

    pub fn parse(toml_str: &str) -> Result<Self, InspectError> {
        toml::from_str(toml_str).map_err(|e| InspectError::Fixture {
            context: "parse",
            detail: e.to_string(),
        })
    }
}

impl PackageEntry {
    pub fn to_package(&self) -> Result<TransportPackage, InspectError> {
        let key = self.key.as_deref();
        match (&self.value, &self.raw_base64) {
            (Some(value), None) => {
                let model = match &self.model {
                    Some(label) => ModelKey::new(label.as_str()),
                    None => model_for(value),
                };
                let json = toml_to_json(value)?;
                Ok(TransportPackage::from_value(model, key, json))
            }
            (None, Some(encoded)) => {
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(encoded)
                    .map_err(|e| InspectError::Fixture {
                        context: "raw_base64",
                        detail: e.to_string(),
                    })?;
                let model = ModelKey::new(self.model.as_deref().unwrap_or("bytes"));
                Ok(TransportPackage::raw(model, key, bytes))
            }
            _ => Err(InspectError::Fixture {
                context: "package",
                detail: "exactly one of `value` or `raw_base64` is required".into(),
            }),
        }
    }
}

fn model_for(value: &toml::Value) -> ModelKey {
    match value {
        toml::Value::Integer(_) => ModelKey::of::<i64>(),
        toml::Value::Float(_) => ModelKey::of::<f64>(),
        toml::Value::Boolean(_) => ModelKey::of::<bool>(),
        toml::Value::String(_) | toml::Value::Datetime(_) => ModelKey::of::<String>(),
        toml::Value::Array(_) | toml::Value::Table(_) => ModelKey::new("json"),
    }
}

fn toml_to_json(value: &toml::Value) -> Result<serde_json::Value, InspectError> {
    use serde_json::Value as Json;

    Ok(match value {
        toml::Value::String(s) => Json::String(s.clone()),
        toml::Value::Integer(i) => Json::from(*i),
        toml::Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(Json::Number)
            .ok_or_else(|| InspectError::Fixture {
                context: "value",
                detail: format!("{f} has no JSON representation"),
            })?,
        toml::Value::Boolean(b) => Json::Bool(*b),
        toml::Value::Datetime(dt) => Json::String(dt.to_string()),
        toml::Value::Array(items) => {
            Json::Array(items.iter().map(toml_to_json).collect::<Result<_, _>>()?)
        }
        toml::Value::Table(table) => Json::Object(
            table
                .iter()
                .map(|(k, v)| Ok((k.clone(), toml_to_json(v)?)))
                .collect::<Result<_, InspectError>>()?,
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use transport_api::PackageValue;

    #[test]
    fn typed_and_raw_entries() {
        let fixture = Fixture::parse(
            r#"
            [[packages]]
            key = "key1"
            value = 42

            [[packages]]
            model = "frame"
            raw_base64 = "AQID"

            [[packages]]
            model = "quote"
            value = { symbol = "EURUSD", bid = 1.5 }
            "#,
        )
        .unwrap();

        let typed = fixture.packages[0].to_package().unwrap();
        assert_eq!(typed.key(), Some("key1"));
        assert_eq!(typed.model_key(), &ModelKey::of::<i64>());
        assert_eq!(typed.value(), &PackageValue::Typed(serde_json::json!(42)));

        let raw = fixture.packages[1].to_package().unwrap();
        assert_eq!(raw.model_key(), &ModelKey::new("frame"));
        assert_eq!(raw.value(), &PackageValue::Raw(vec![1, 2, 3]));

        let table = fixture.packages[2].to_package().unwrap();
        assert_eq!(table.model_key(), &ModelKey::new("quote"));
        assert_eq!(table.value_as::<serde_json::Value>().unwrap()["bid"], 1.5);
    }

    #[test]
    fn datetimes_become_strings() {
        let fixture = Fixture::parse(
            r#"
            [[packages]]
            value = 2024-05-01T12:30:00Z

            [[packages]]
            model = "tick"
            value = { at = 2024-05-01, prices = [1.5, 2.0] }
            "#,
        )
        .unwrap();

        let bare = fixture.packages[0].to_package().unwrap();
        assert_eq!(bare.model_key(), &ModelKey::of::<String>());
        assert_eq!(
            bare.value(),
            &PackageValue::Typed(serde_json::json!("2024-05-01T12:30:00Z"))
        );

        let nested = fixture.packages[1].to_package().unwrap();
        assert_eq!(
            nested.value(),
            &PackageValue::Typed(serde_json::json!({ "at": "2024-05-01", "prices": [1.5, 2.0] }))
        );
    }

    #[test]
    fn non_finite_float_is_rejected() {
        let fixture = Fixture::parse(
            r#"
            [[packages]]
            value = nan
            "#,
        )
        .unwrap();
        let err = fixture.packages[0].to_package().unwrap_err();
        assert!(matches!(err, InspectError::Fixture { context: "value", .. }));
    }

    #[test]
    fn entry_needs_exactly_one_source() {
        let fixture = Fixture::parse(
            r#"
            [[packages]]
            key = "empty"
            "#,
        )
        .unwrap();
        let err = fixture.packages[0].to_package().unwrap_err();
        assert!(matches!(err, InspectError::Fixture { context: "package", .. }));
    }

    #[test]
    fn invalid_base64_is_reported() {
        let fixture = Fixture::parse(
            r#"
            [[packages]]
            raw_base64 = "***"
            "#,
        )
        .unwrap();
        let err = fixture.packages[0].to_package().unwrap_err();
        assert!(matches!(err, InspectError::Fixture { context: "raw_base64", .. }));
    }
}
