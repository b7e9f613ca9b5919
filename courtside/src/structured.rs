//! Structured output: turn a free-form model reply into a typed value.
//!
//! The target shape is a Rust type deriving [`schemars::JsonSchema`] and
//! [`serde::Deserialize`]. [`OutputSchema::of`] derives the JSON Schema once;
//! [`entity`] sends the prompt with that schema attached and maps the reply
//! back into the type, failing with [`Error::SchemaParse`] when the reply does
//! not conform.
//!
//! # Example
//!
//! ```rust,ignore
//! use courtside::structured;
//!
//! let request = ChatRequest::new("").user("Please name all of the teams in the NBA.");
//! let teams: Vec<Team> = structured::entity(provider.as_ref(), request).await?;
//! ```
//!
//! OpenAI strict mode only accepts an object at the schema root, so
//! non-object schemas (a `Vec<T>` is an array) travel inside an
//! `{"items": ...}` envelope that is removed again before parsing.

use std::fmt;

use jsonschema::Validator;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use crate::chat::{ChatProvider, ChatRequest, ChatResponse, ResponseFormat};
use crate::error::{Error, Result};

/// Property name of the envelope around non-object schemas.
pub const ENVELOPE_KEY: &str = "items";

/// Keywords left out of the wire schema; strict mode rejects them.
/// Local validation still enforces them.
const STRICT_UNSUPPORTED: &[&str] = &["minLength", "maxLength"];

/// Generate a JSON Schema from a Rust type.
///
/// Returns `(name, schema)` where `name` is derived from the type name and
/// `schema` has the `$schema` meta field removed (LLM APIs don't need it).
#[must_use]
pub fn generate_json_schema<T: JsonSchema>() -> (String, Value) {
    let root = schemars::schema_for!(T);
    let mut schema_value = serde_json::to_value(&root).unwrap_or_default();

    if let Value::Object(ref mut map) = schema_value {
        map.remove("$schema");
    }

    let name = <T as JsonSchema>::schema_name();
    (name.into_owned(), schema_value)
}

/// A compiled schema descriptor for structured output.
pub struct OutputSchema {
    name: String,
    schema: Value,
    wire_schema: Value,
    wrapped: bool,
    validator: Validator,
}

impl OutputSchema {
    /// Build the descriptor for `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the generated schema cannot be compiled.
    pub fn of<T: JsonSchema>() -> Result<Self> {
        let (name, schema) = generate_json_schema::<T>();
        Self::from_parts(name, schema)
    }

    /// Build the descriptor from an explicit schema value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `schema` is not a valid JSON Schema.
    pub fn from_parts(name: impl Into<String>, schema: Value) -> Result<Self> {
        let name = name.into();
        let validator = jsonschema::validator_for(&schema)
            .map_err(|e| Error::config(format!("invalid JSON schema `{name}`: {e}")))?;

        let wrapped = schema.get("type").and_then(Value::as_str) != Some("object");
        let mut wire_schema = if wrapped {
            wrap_in_envelope(&schema)
        } else {
            schema.clone()
        };
        strip_strict_unsupported(&mut wire_schema);

        Ok(Self {
            name,
            schema,
            wire_schema,
            wrapped,
            validator,
        })
    }

    /// Schema name (used in the `response_format` API parameter).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The schema of the target type.
    #[must_use]
    pub const fn schema(&self) -> &Value {
        &self.schema
    }

    /// The schema sent to the provider (enveloped when the root is not an object).
    #[must_use]
    pub const fn wire_schema(&self) -> &Value {
        &self.wire_schema
    }

    /// Whether replies travel inside an `{"items": ...}` envelope.
    #[must_use]
    pub const fn is_wrapped(&self) -> bool {
        self.wrapped
    }

    /// Converts this into a strict [`ResponseFormat`].
    #[must_use]
    pub fn to_response_format(&self) -> ResponseFormat {
        ResponseFormat::json_schema(&self.name, self.wire_schema.clone())
    }

    /// Prompt text asking for schema-conforming JSON, for providers without
    /// native JSON-schema support.
    #[must_use]
    pub fn format_instructions(&self) -> String {
        let schema = serde_json::to_string_pretty(&self.schema).unwrap_or_default();
        format!(
            "Your response must be a single RFC 8259 compliant JSON document and nothing else. \
             Do not add explanations or Markdown code fences. \
             The JSON must validate against this JSON Schema:\n{schema}"
        )
    }

    /// Prepare `request` for structured output against this schema.
    #[must_use]
    pub fn apply(&self, request: ChatRequest, native: bool) -> ChatRequest {
        if native {
            request.response_format(self.to_response_format())
        } else {
            request.system(self.format_instructions())
        }
    }

    /// Extract the schema-conforming JSON value from reply text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemaParse`] if the text is not JSON or does not
    /// validate against the schema.
    pub fn extract(&self, text: &str) -> Result<Value> {
        let body = strip_code_fence(text);
        if body.is_empty() {
            return Err(Error::schema_parse(&self.name, "empty reply"));
        }

        let value: Value = serde_json::from_str(body)
            .map_err(|e| Error::schema_parse(&self.name, format!("reply is not valid JSON: {e}")))?;
        let value = if self.wrapped { unwrap_envelope(value) } else { value };

        let violations: Vec<String> = self
            .validator
            .iter_errors(&value)
            .map(|e| e.to_string())
            .collect();
        if !violations.is_empty() {
            return Err(Error::schema_parse(&self.name, violations.join("; ")));
        }

        Ok(value)
    }

    /// Extract and deserialize reply text into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemaParse`] on any mismatch; nothing is coerced
    /// or dropped.
    pub fn parse<T: DeserializeOwned>(&self, text: &str) -> Result<T> {
        let value = self.extract(text)?;
        serde_json::from_value(value).map_err(|e| Error::schema_parse(&self.name, e.to_string()))
    }

    /// Parse a whole chat response, handling refusals and truncation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemaParse`] when the response carries no usable
    /// text or the text does not conform.
    pub fn parse_response<T: DeserializeOwned>(&self, response: &ChatResponse) -> Result<T> {
        if let Some(refusal) = response.refusal() {
            return Err(Error::schema_parse(&self.name, format!("model refused: {refusal}")));
        }
        if response.is_truncated() {
            return Err(Error::schema_parse(&self.name, "reply truncated at the token limit"));
        }
        let text = response
            .text()
            .ok_or_else(|| Error::schema_parse(&self.name, "reply has no text content"))?;
        self.parse(text)
    }
}

impl fmt::Debug for OutputSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputSchema")
            .field("name", &self.name)
            .field("wrapped", &self.wrapped)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

/// Ask `provider` for a value of type `T`.
///
/// # Errors
///
/// Propagates provider failures unchanged and returns
/// [`Error::SchemaParse`] when the reply does not map into `T`.
pub async fn entity<T>(provider: &dyn ChatProvider, request: ChatRequest) -> Result<T>
where
    T: DeserializeOwned + JsonSchema,
{
    let schema = OutputSchema::of::<T>()?;
    entity_with(provider, &schema, request).await
}

/// Same as [`entity`] with a prebuilt [`OutputSchema`].
///
/// # Errors
///
/// See [`entity`].
pub async fn entity_with<T>(
    provider: &dyn ChatProvider,
    schema: &OutputSchema,
    request: ChatRequest,
) -> Result<T>
where
    T: DeserializeOwned,
{
    let request = schema.apply(request, provider.supports_json_mode());
    debug!(
        provider = provider.provider_name(),
        schema = schema.name(),
        "requesting structured output"
    );

    let response = provider.chat(&request).await?;
    schema.parse_response(&response).inspect_err(|err| {
        warn!(
            provider = provider.provider_name(),
            schema = schema.name(),
            error = %err,
            "reply did not match schema"
        );
    })
}

fn wrap_in_envelope(schema: &Value) -> Value {
    let mut inner = schema.clone();
    let mut root = Map::new();
    root.insert("type".to_owned(), json!("object"));

    if let Value::Object(ref mut map) = inner {
        map.remove("title");
        // $refs inside the inner schema point at the document root.
        for key in ["$defs", "definitions"] {
            if let Some(defs) = map.remove(key) {
                root.insert(key.to_owned(), defs);
            }
        }
    }

    root.insert(
        "properties".to_owned(),
        Value::Object(Map::from_iter([(ENVELOPE_KEY.to_owned(), inner)])),
    );
    root.insert("required".to_owned(), json!([ENVELOPE_KEY]));
    root.insert("additionalProperties".to_owned(), json!(false));
    Value::Object(root)
}

fn strip_strict_unsupported(schema: &mut Value) {
    match schema {
        Value::Object(map) => {
            for keyword in STRICT_UNSUPPORTED {
                map.remove(*keyword);
            }
            for (key, child) in map.iter_mut() {
                match (key.as_str(), child) {
                    // Keys of these maps are names, not keywords.
                    ("properties" | "$defs" | "definitions", Value::Object(named)) => {
                        named.values_mut().for_each(strip_strict_unsupported);
                    }
                    (_, child) => strip_strict_unsupported(child),
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(strip_strict_unsupported),
        _ => {}
    }
}

/// Enveloped replies carry the payload under [`ENVELOPE_KEY`]; bare replies
/// pass through unchanged.
fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.len() == 1 && map.contains_key(ENVELOPE_KEY) => {
            map.remove(ENVELOPE_KEY).unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Strip one surrounding Markdown code fence, including its info string.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    body.trim_start_matches([' ', '\t'])
        .trim_start_matches(|c: char| c.is_ascii_alphanumeric())
        .trim()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use crate::llms::{MockProvider, MockReply};

    #[derive(Debug, PartialEq, Eq, Deserialize, JsonSchema)]
    #[serde(deny_unknown_fields)]
    struct Arena {
        name: String,
        seats: u32,
    }

    mod schema {
        use super::*;

        #[test]
        fn object_roots_are_sent_as_is() {
            let schema = OutputSchema::of::<Arena>().unwrap();
            assert!(!schema.is_wrapped());
            assert_eq!(schema.name(), "Arena");
            assert_eq!(schema.wire_schema(), schema.schema());
            assert!(schema.schema().get("$schema").is_none());
        }

        #[test]
        fn array_roots_are_enveloped() {
            let schema = OutputSchema::of::<Vec<Arena>>().unwrap();
            assert!(schema.is_wrapped());

            let wire = schema.wire_schema();
            assert_eq!(wire["type"], "object");
            assert_eq!(wire["required"], json!([ENVELOPE_KEY]));
            assert_eq!(wire["additionalProperties"], false);
            assert_eq!(wire["properties"][ENVELOPE_KEY]["type"], "array");
            assert!(wire["$defs"]["Arena"].is_object());
            assert!(wire["properties"][ENVELOPE_KEY].get("$defs").is_none());
        }

        #[test]
        fn length_keywords_stay_local() {
            let schema = OutputSchema::from_parts(
                "Label",
                json!({
                    "type": "object",
                    "properties": {
                        "minLength": {"type": "string", "minLength": 1, "maxLength": 8}
                    },
                    "required": ["minLength"],
                    "additionalProperties": false
                }),
            )
            .unwrap();

            let property = &schema.wire_schema()["properties"]["minLength"];
            assert_eq!(property, &json!({"type": "string"}));
            assert_eq!(schema.schema()["properties"]["minLength"]["minLength"], 1);
            assert!(schema.parse::<Value>(r#"{"minLength": ""}"#).is_err());
        }

        #[test]
        fn response_format_uses_wire_schema() {
            let schema = OutputSchema::of::<Vec<Arena>>().unwrap();
            let format = schema.to_response_format();
            let spec = format.as_json_schema().unwrap();

            assert_eq!(spec.name, schema.name());
            assert_eq!(&spec.schema, schema.wire_schema());
            assert_eq!(spec.strict, Some(true));
        }

        #[test]
        fn apply_without_native_support_adds_instructions() {
            let schema = OutputSchema::of::<Arena>().unwrap();
            let request = schema.apply(ChatRequest::new("m").user("Where do the Knicks play?"), false);

            assert!(request.response_format.is_none());
            let system = request.messages.last().unwrap().text().unwrap();
            assert!(system.contains("JSON Schema"));
            assert!(system.contains("seats"));
        }
    }

    mod parse {
        use super::*;

        #[test]
        fn accepts_bare_and_enveloped_arrays() {
            let schema = OutputSchema::of::<Vec<Arena>>().unwrap();
            let expected = vec![Arena { name: "Madison Square Garden".into(), seats: 19_812 }];

            let bare: Vec<Arena> = schema
                .parse(r#"[{"name":"Madison Square Garden","seats":19812}]"#)
                .unwrap();
            let wrapped: Vec<Arena> = schema
                .parse(r#"{"items":[{"name":"Madison Square Garden","seats":19812}]}"#)
                .unwrap();

            assert_eq!(bare, expected);
            assert_eq!(wrapped, expected);
        }

        #[test]
        fn strips_markdown_fences() {
            let schema = OutputSchema::of::<Arena>().unwrap();
            let arena: Arena = schema
                .parse("```json\n{\"name\": \"TD Garden\", \"seats\": 19156}\n```")
                .unwrap();
            assert_eq!(arena.name, "TD Garden");
        }

        #[test]
        fn rejects_string_instead_of_list() {
            let schema = OutputSchema::of::<Vec<Arena>>().unwrap();
            let err = schema.parse::<Vec<Arena>>(r#""Lakers, Celtics""#).unwrap_err();
            assert!(matches!(err, Error::SchemaParse { .. }), "{err}");
        }

        #[test]
        fn rejects_prose() {
            let schema = OutputSchema::of::<Vec<Arena>>().unwrap();
            let err = schema
                .parse::<Vec<Arena>>("Sure! Here are some arenas: ...")
                .unwrap_err();
            assert!(err.to_string().contains("not valid JSON"));
        }

        #[test]
        fn rejects_missing_and_extra_fields() {
            let schema = OutputSchema::of::<Vec<Arena>>().unwrap();

            let missing = schema.parse::<Vec<Arena>>(r#"[{"name":"Chase Center"}]"#);
            assert!(matches!(missing, Err(Error::SchemaParse { .. })));

            let extra =
                schema.parse::<Vec<Arena>>(r#"[{"name":"Chase Center","seats":18064,"roof":true}]"#);
            assert!(matches!(extra, Err(Error::SchemaParse { .. })));
        }

        #[test]
        fn rejects_empty_reply() {
            let schema = OutputSchema::of::<Arena>().unwrap();
            let err = schema.parse::<Arena>("   ").unwrap_err();
            assert!(err.to_string().contains("empty reply"));
        }

        #[test]
        fn refusal_is_a_parse_failure() {
            let schema = OutputSchema::of::<Arena>().unwrap();
            let mut response = ChatResponse::default();
            response.message.refusal = Some("I can't help with that.".into());

            let err = schema.parse_response::<Arena>(&response).unwrap_err();
            assert!(err.to_string().contains("model refused"));
        }
    }

    mod fence {
        use super::*;

        #[test]
        fn leaves_plain_text_alone() {
            assert_eq!(strip_code_fence("  [1, 2] "), "[1, 2]");
        }

        #[test]
        fn strips_fence_without_info_string() {
            assert_eq!(strip_code_fence("```\n[1]\n```"), "[1]");
        }

        #[test]
        fn strips_fence_with_spaced_info_string() {
            assert_eq!(strip_code_fence("``` json\n[1]\n```"), "[1]");
            assert_eq!(strip_code_fence("```  JSON\n{\"a\": 1}\n```"), "{\"a\": 1}");
        }

        #[test]
        fn keeps_bare_word_body_after_newline() {
            assert_eq!(strip_code_fence("```\ntrue\n```"), "true");
        }

        #[test]
        fn keeps_unterminated_fence() {
            assert_eq!(strip_code_fence("```json\n[1]"), "```json\n[1]");
        }
    }

    #[tokio::test]
    async fn entity_sends_schema_and_parses_reply() {
        let provider = MockProvider::new(vec![MockReply::json(&json!({
            "items": [{"name": "Crypto.com Arena", "seats": 18997}]
        }))]);

        let arenas: Vec<Arena> = entity(&provider, ChatRequest::new("m").user("Name an arena."))
            .await
            .unwrap();
        assert_eq!(arenas.len(), 1);

        let sent = provider.requests();
        let spec = sent[0].response_format.as_ref().unwrap().as_json_schema().unwrap();
        assert_eq!(spec.schema["type"], "object");
    }
}
