//! Tool call and tool result types

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Tool call (invocation request, usually issued by the model)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default)]
    pub call_type: ToolCallType,
    pub function: FunctionCall,
}

/// The only call kind there is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCallType {
    #[default]
    Function,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded argument object.
    #[serde(default)]
    pub arguments: String,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            call_type: ToolCallType::Function,
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }

    /// Decode `arguments`. Blank input decodes to an empty object.
    pub fn parsed_arguments(&self) -> Result<Value, serde_json::Error> {
        let raw = self.function.arguments.trim();
        if raw.is_empty() {
            return Ok(Value::Object(Default::default()));
        }
        serde_json::from_str(raw)
    }
}

/// What a tool execution produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    Success(Value),
    /// Structured error payload, always an object with an `error` field.
    Failure(Value),
}

/// Tool result (dispatcher output for one call)
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    pub tool_call_id: String,
    pub outcome: ToolOutcome,
}

impl ToolResult {
    pub fn success(tool_call_id: impl Into<String>, payload: Value) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            outcome: ToolOutcome::Success(payload),
        }
    }

    pub fn failure(tool_call_id: impl Into<String>, payload: Value) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            outcome: ToolOutcome::Failure(payload),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, ToolOutcome::Failure(_))
    }

    pub fn payload(&self) -> &Value {
        match &self.outcome {
            ToolOutcome::Success(v) | ToolOutcome::Failure(v) => v,
        }
    }

    /// JSON text handed back to the model as the tool message content.
    pub fn result_json(&self) -> String {
        self.payload().to_string()
    }
}

impl Serialize for ToolResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ToolResult", 2)?;
        s.serialize_field("toolCallId", &self.tool_call_id)?;
        s.serialize_field("result", &self.result_json())?;
        s.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blank_arguments_decode_to_empty_object() {
        let call = ToolCall::new("c1", "check_auth_status", "  ");
        assert_eq!(call.parsed_arguments().unwrap(), json!({}));
    }

    #[test]
    fn test_invalid_arguments_fail_to_decode() {
        let call = ToolCall::new("c1", "login", "{email:");
        assert!(call.parsed_arguments().is_err());
    }

    #[test]
    fn test_missing_type_defaults_to_function() {
        let call: ToolCall =
            serde_json::from_str(r#"{"id":"c1","function":{"name":"logout","arguments":"{}"}}"#)
                .unwrap();
        assert_eq!(call.call_type, ToolCallType::Function);
    }

    #[test]
    fn test_result_serializes_at_the_edge() {
        let result = ToolResult::failure("c9", json!({"error": "boom"}));
        assert!(result.is_error());
        let v = serde_json::to_value(&result).unwrap();
        assert_eq!(v["toolCallId"], "c9");
        let inner: Value = serde_json::from_str(v["result"].as_str().unwrap()).unwrap();
        assert_eq!(inner["error"], "boom");
    }
}
