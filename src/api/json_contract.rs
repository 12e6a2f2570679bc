use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::FittedModel;
use crate::error::{DashError, DashResult};

pub const MODEL_JSON_SCHEMA_V1: u32 = 1;

/// Versioned wrapper written by the statistics side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedModelJsonContractV1 {
    pub schema_version: u32,
    pub model: FittedModel,
}

impl FittedModel {
    pub fn to_json_contract_v1_pretty(&self) -> DashResult<String> {
        let payload = FittedModelJsonContractV1 {
            schema_version: MODEL_JSON_SCHEMA_V1,
            model: self.clone(),
        };
        serde_json::to_string_pretty(&payload)
            .map_err(|e| DashError::InvalidData(format!("failed to serialize model contract v1: {e}")))
    }

    /// Parses either a bare model or a versioned contract.
    pub fn from_json_compat_str(input: &str) -> DashResult<Self> {
        let value: Value = serde_json::from_str(input)
            .map_err(|e| DashError::InvalidData(format!("failed to parse model json payload: {e}")))?;
        Self::from_json_value(value)
    }

    /// Converts an arbitrary JSON value into a validated model.
    ///
    /// Anything that is not a fitted model, such as a plain mapping of
    /// numbers, is rejected with [`DashError::InvalidModel`].
    pub fn from_json_value(value: Value) -> DashResult<Self> {
        let found = describe(&value);
        let versioned = value
            .as_object()
            .is_some_and(|object| object.contains_key("schema_version"));

        let model = if versioned {
            let payload: FittedModelJsonContractV1 =
                serde_json::from_value(value).map_err(|e| not_a_model(&found, &e))?;
            if payload.schema_version != MODEL_JSON_SCHEMA_V1 {
                return Err(DashError::InvalidData(format!(
                    "unsupported model schema version: {}",
                    payload.schema_version
                )));
            }
            payload.model
        } else {
            serde_json::from_value::<Self>(value).map_err(|e| not_a_model(&found, &e))?
        };
        model.validate()?;
        Ok(model)
    }
}

fn not_a_model(found: &str, err: &serde_json::Error) -> DashError {
    DashError::InvalidModel {
        expected: "factorial analysis".to_owned(),
        found: format!("{found} ({err})"),
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_owned(),
        Value::Bool(_) => "a boolean".to_owned(),
        Value::Number(_) => "a number".to_owned(),
        Value::String(_) => "a string".to_owned(),
        Value::Array(items) => format!("an array of {} items", items.len()),
        Value::Object(object) => {
            let keys: Vec<&str> = object.keys().map(String::as_str).take(5).collect();
            format!("a plain mapping with keys [{}]", keys.join(", "))
        }
    }
}
