use super::{Format, FormatError};
use serde_json::{Map, Value};

/// JSON codec (`application/json`).
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonFormat;

impl Format for JsonFormat {
    fn name(&self) -> &'static str {
        "json"
    }

    fn extension(&self) -> &'static str {
        "json"
    }

    fn mime_type(&self) -> &'static str {
        "application/json"
    }

    fn encode(&self, data: &Value, root: Option<&str>) -> Result<String, FormatError> {
        if let Value::String(encoded) = data {
            return Ok(encoded.clone());
        }
        let text = match root {
            Some(root) => {
                let mut wrapped = Map::with_capacity(1);
                wrapped.insert(root.to_string(), data.clone());
                serde_json::to_string(&wrapped)?
            }
            None => serde_json::to_string(data)?,
        };
        Ok(text)
    }

    fn decode(&self, body: &str) -> Result<Value, FormatError> {
        Ok(serde_json::from_str(body)?)
    }
}
