//! Response schema for IoC extraction

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Types the LLM is allowed to emit. A narrower set than the full IoC
/// model: only observables an article reliably pins down.
pub const ALLOWED_TYPES: &[&str] = &[
    "ipv4", "ipv6", "domain", "url", "email", "md5", "sha1", "sha256",
];

/// One IoC as extracted by the LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedIoc {
    #[serde(rename = "type")]
    pub ioc_type: String,
    pub value: String,
    pub description: String,
}

/// Top-level response shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResponse {
    pub iocs: Vec<ExtractedIoc>,
}

/// JSON schema constraining the session's response.
pub fn response_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "iocs": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "type": { "type": "string", "enum": ALLOWED_TYPES },
                        "value": { "type": "string" },
                        "description": { "type": "string" }
                    },
                    "required": ["type", "value", "description"]
                }
            }
        },
        "required": ["iocs"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_constrains_types() {
        let schema = response_schema();
        let enum_values = &schema["properties"]["iocs"]["items"]["properties"]["type"]["enum"];
        assert_eq!(enum_values.as_array().unwrap().len(), ALLOWED_TYPES.len());
    }

    #[test]
    fn test_response_deserializes() {
        let body = r#"{"iocs":[{"type":"ipv4","value":"192.0.2.1","description":"C2 server"}]}"#;
        let response: ExtractionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.iocs.len(), 1);
        assert_eq!(response.iocs[0].ioc_type, "ipv4");
    }
}
