use anyhow::{anyhow, Context, Result};
use jsonschema::error::ValidationErrorKind;
use jsonschema::{Draft, JSONSchema};
use once_cell::sync::Lazy;
use schemars::schema_for;
use serde_json::Value as JsonValue;

/// Schema generated directly from the Rust profile structs, so it cannot drift
/// from what `serde` will accept.
static PROFILE_SCHEMA_GENERATED: Lazy<JsonValue> = Lazy::new(|| {
    let schema = schema_for!(crate::profile::LaunchProfile);
    serde_json::to_value(&schema).expect("schemars schema must serialize to JSON")
});

/// Generated schema with the top level pinned: unknown keys rejected,
/// `version` and `command` required.
static PROFILE_SCHEMA_STRICT: Lazy<JSONSchema> = Lazy::new(|| {
    let mut schema_json = PROFILE_SCHEMA_GENERATED.clone();

    if let Some(obj) = schema_json.as_object_mut() {
        obj.insert("additionalProperties".to_string(), JsonValue::Bool(false));
        obj.insert(
            "required".to_string(),
            JsonValue::Array(vec![
                JsonValue::String("version".to_string()),
                JsonValue::String("command".to_string()),
            ]),
        );
    }

    JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(&schema_json)
        .expect("failed to compile launch profile JSON schema")
});

/// Validate profile YAML text against the launch profile schema.
///
/// Unknown top-level keys are named up front; the remaining schema errors
/// follow, capped so a badly broken file stays readable.
pub fn validate_profile_yaml(yaml_text: &str) -> Result<()> {
    let yaml_value: serde_yaml::Value =
        serde_yaml::from_str(yaml_text).context("parse yaml into Value")?;
    let json_value: JsonValue =
        serde_json::to_value(&yaml_value).context("convert yaml value to json value")?;

    let mut msgs: Vec<String> = unknown_top_level_keys(&json_value)
        .into_iter()
        .map(|key| format!("unknown top-level key '{key}'"))
        .collect();

    if let Err(errors) = PROFILE_SCHEMA_STRICT.validate(&json_value) {
        for e in errors {
            // Already named above.
            if matches!(e.kind, ValidationErrorKind::AdditionalProperties { .. })
                && e.instance_path.to_string().is_empty()
            {
                continue;
            }
            if msgs.len() >= MAX_REPORTED_ERRORS {
                msgs.push("... (more schema errors omitted)".to_string());
                break;
            }
            let path = e.instance_path.to_string();
            let at = if path.is_empty() { "/" } else { path.as_str() };
            msgs.push(format!("at {at}: {e}"));
        }
    }

    if msgs.is_empty() {
        return Ok(());
    }
    Err(anyhow!(
        "launch profile schema validation failed:\n{}",
        msgs.join("\n")
    ))
}

const MAX_REPORTED_ERRORS: usize = 10;

/// Top-level keys the profile structs do not declare, sorted.
fn unknown_top_level_keys(doc: &JsonValue) -> Vec<String> {
    let Some(obj) = doc.as_object() else {
        return Vec::new();
    };
    let known = PROFILE_SCHEMA_GENERATED
        .get("properties")
        .and_then(JsonValue::as_object);
    obj.keys()
        .filter(|k| !known.is_some_and(|props| props.contains_key(k.as_str())))
        .cloned()
        .collect()
}

/// The generated schema, for `--print-schema`.
pub fn profile_schema_json() -> &'static JsonValue {
    &PROFILE_SCHEMA_GENERATED
}
