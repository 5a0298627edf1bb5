//! Response-template rendering for templated endpoints.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Value, json};
use weave_core::types::RequestContext;
use weave_postgres::model::Endpoint;

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{\{(.+?)\}\}").expect("valid placeholder pattern"))
}

/// Renders a templated endpoint's response.
///
/// The stored template is parsed as JSON and interpolated recursively; a
/// template that fails to parse is returned wrapped as `{message: <text>}`.
/// An endpoint without a template answers with a fixed banner.
pub fn render_endpoint(endpoint: &Endpoint, context: &RequestContext) -> Value {
    let Some(template) = endpoint.response_template.as_deref() else {
        return json!({"message": format!("Endpoint {} executed", endpoint.name)});
    };

    match serde_json::from_str::<Value>(template) {
        Ok(parsed) => render_template(&parsed, context),
        Err(_) => json!({"message": template}),
    }
}

/// Recursively substitutes `{{dotted.path}}` placeholders.
///
/// Placeholders resolve against the request context by walking nested
/// mappings; an unresolved path becomes an empty string.
pub fn render_template(template: &Value, context: &RequestContext) -> Value {
    match template {
        Value::String(text) => Value::String(interpolate(text, context)),
        Value::Object(object) => Value::Object(
            object
                .iter()
                .map(|(key, value)| (key.clone(), render_template(value, context)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| render_template(item, context))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn interpolate(text: &str, context: &RequestContext) -> String {
    placeholder_pattern()
        .replace_all(text, |captures: &regex::Captures<'_>| {
            match context.lookup(captures[1].trim()) {
                Some(Value::String(s)) => s,
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn context() -> RequestContext {
        RequestContext::new()
            .with_query_param("name", "ada")
            .with_body(json!({"user": {"id": 7}}))
    }

    #[test]
    fn interpolates_dotted_paths() {
        let template = json!({
            "greeting": "hello {{query.name}}",
            "user": "{{ body.user.id }}",
            "nested": {"both": "{{query.name}}-{{body.user.id}}"},
            "list": ["{{query.name}}", 3, true],
        });

        let rendered = render_template(&template, &context());

        assert_eq!(rendered["greeting"], json!("hello ada"));
        assert_eq!(rendered["user"], json!("7"));
        assert_eq!(rendered["nested"]["both"], json!("ada-7"));
        assert_eq!(rendered["list"], json!(["ada", 3, true]));
    }

    #[test]
    fn unresolved_paths_become_empty_strings() {
        let template = json!({"missing": "[{{query.absent}}]"});
        let rendered = render_template(&template, &context());
        assert_eq!(rendered["missing"], json!("[]"));
    }

    #[test]
    fn non_string_leaves_pass_through() {
        let template = json!({"n": 4, "flag": false, "none": null});
        assert_eq!(render_template(&template, &context()), template);
    }
}
