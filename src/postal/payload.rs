//! Address payloads returned by the lookup service.

use serde::{Deserialize, Serialize};
use serde_json::Value;

const REQUIRED_FIELDS: [&str; 5] = ["cep", "logradouro", "bairro", "cidade", "estado"];
const OPTIONAL_FIELDS: [&str; 4] = ["altitude", "longitude", "latitude", "complemento"];

/// Typed view over the fields of an address payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default, rename = "cep")]
    pub code: Option<String>,
    #[serde(default, rename = "logradouro")]
    pub street: Option<String>,
    #[serde(default, rename = "bairro")]
    pub district: Option<String>,
    #[serde(default, rename = "complemento")]
    pub complement: Option<String>,
    #[serde(default, rename = "cidade")]
    pub city: Option<City>,
    #[serde(default, rename = "estado")]
    pub state: Option<State>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct City {
    #[serde(default, rename = "nome")]
    pub name: Option<String>,
    #[serde(default)]
    pub ddd: Option<u16>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    #[serde(default, rename = "sigla")]
    pub code: Option<String>,
}

impl Address {
    /// One-line summary: `street, district - City/UF`.
    pub fn summary(&self) -> String {
        let city = self.city.as_ref().and_then(|c| c.name.as_deref());
        let state = self.state.as_ref().and_then(|s| s.code.as_deref());
        format!(
            "{}, {} - {}/{}",
            self.street.as_deref().unwrap_or("N/A"),
            self.district.as_deref().unwrap_or("N/A"),
            city.unwrap_or("N/A"),
            state.unwrap_or("N/A"),
        )
    }
}

/// A successful lookup: the raw payload and its typed view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddressPayload {
    pub address: Address,
    pub raw: Value,
}

impl AddressPayload {
    /// Build from a raw payload. Fields with unexpected shapes are left unset
    /// in the typed view; `validate_payload` reports them.
    pub fn from_raw(raw: Value) -> Self {
        let address = serde_json::from_value(raw.clone()).unwrap_or_else(|err| {
            tracing::debug!("address payload has unexpected shape: {}", err);
            lenient_address(&raw)
        });
        Self { address, raw }
    }

    pub fn validate(&self) -> PayloadReport {
        validate_payload(&self.raw)
    }
}

fn lenient_address(raw: &Value) -> Address {
    let text = |key: &str| raw.get(key).and_then(Value::as_str).map(str::to_string);
    Address {
        code: text("cep"),
        street: text("logradouro"),
        district: text("bairro"),
        complement: text("complemento"),
        city: raw.get("cidade").and_then(|v| serde_json::from_value(v.clone()).ok()),
        state: raw.get("estado").and_then(|v| serde_json::from_value(v.clone()).ok()),
    }
}

/// Field-level validation result for a payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadReport {
    pub valid: bool,
    pub warnings: Vec<String>,
    pub present: Vec<String>,
    pub missing: Vec<String>,
}

/// Check a payload for the required fields and the expected nested shapes.
pub fn validate_payload(payload: &Value) -> PayloadReport {
    let mut report = PayloadReport {
        valid: true,
        warnings: Vec::new(),
        present: Vec::new(),
        missing: Vec::new(),
    };

    for field in REQUIRED_FIELDS {
        if payload.get(field).is_some_and(is_filled) {
            report.present.push(field.to_string());
        } else {
            report.missing.push(field.to_string());
            report.warnings.push(format!("missing required field: {}", field));
            report.valid = false;
        }
    }

    for field in OPTIONAL_FIELDS {
        if payload.get(field).is_some_and(is_filled) {
            report.present.push(field.to_string());
        }
    }

    check_nested(payload, "cidade", "nome", &mut report);
    check_nested(payload, "estado", "sigla", &mut report);

    report
}

fn check_nested(payload: &Value, field: &str, key: &str, report: &mut PayloadReport) {
    match payload.get(field) {
        None => {}
        Some(Value::Object(map)) if map.contains_key(key) => {}
        Some(Value::Object(_)) => {
            report.warnings.push(format!("{}.{} not found", field, key));
            report.valid = false;
        }
        Some(_) => {
            report.warnings.push(format!("field '{}' is not an object", field));
            report.valid = false;
        }
    }
}

fn is_filled(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "cep": "01001000",
            "logradouro": "Praça da Sé",
            "bairro": "Sé",
            "complemento": "lado ímpar",
            "altitude": 760.0,
            "latitude": "-23.55",
            "longitude": "-46.63",
            "cidade": { "nome": "São Paulo", "ddd": 11 },
            "estado": { "sigla": "SP" }
        })
    }

    #[test]
    fn test_complete_payload_is_valid() {
        let report = validate_payload(&sample());
        assert!(report.valid);
        assert!(report.warnings.is_empty());
        assert!(report.missing.is_empty());
        assert_eq!(report.present.len(), 9);
    }

    #[test]
    fn test_missing_and_malformed_fields() {
        let payload = json!({
            "cep": "01001000",
            "logradouro": "",
            "cidade": "São Paulo",
            "estado": { "nome": "São Paulo" }
        });
        let report = validate_payload(&payload);
        assert!(!report.valid);
        assert_eq!(report.missing, vec!["logradouro", "bairro"]);
        assert!(report.warnings.iter().any(|w| w.contains("'cidade' is not an object")));
        assert!(report.warnings.iter().any(|w| w.contains("estado.sigla")));
    }

    #[test]
    fn test_summary() {
        let payload = AddressPayload::from_raw(sample());
        assert_eq!(payload.address.summary(), "Praça da Sé, Sé - São Paulo/SP");
        assert_eq!(payload.address.city.as_ref().and_then(|c| c.ddd), Some(11));
    }

    #[test]
    fn test_lenient_view_on_bad_shape() {
        let payload = AddressPayload::from_raw(json!({
            "logradouro": "Rua A",
            "cidade": "Campinas"
        }));
        assert_eq!(payload.address.street.as_deref(), Some("Rua A"));
        assert!(payload.address.city.is_none());
        assert_eq!(payload.address.summary(), "Rua A, N/A - N/A/N/A");
    }
}
