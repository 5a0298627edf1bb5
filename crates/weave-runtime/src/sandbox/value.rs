//! JSON ↔ interpreter value conversion.

use boa_engine::{Context, JsResult, JsValue};
use serde_json::Value;

/// Converts an interpreter value into JSON.
///
/// `undefined` has no JSON form and yields `None`; values JSON cannot carry
/// (functions, symbols) also yield `None`.
pub(crate) fn js_to_json(value: &JsValue, context: &mut Context) -> Option<Value> {
    if value.is_undefined() {
        return None;
    }
    if value.is_null() {
        return Some(Value::Null);
    }

    value.to_json(context).ok()
}

/// Converts a JSON value into an interpreter value.
pub(crate) fn json_to_js(value: &Value, context: &mut Context) -> JsResult<JsValue> {
    JsValue::from_json(value, context)
}
