//! Host namespaces registered into script environments.
//!
//! The surface is a fixed allow-list: a handful of utility namespaces plus
//! one database handle object per enabled config. Everything crosses the
//! boundary as JSON.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use boa_engine::object::ObjectInitializer;
use boa_engine::property::Attribute;
use boa_engine::{Context, JsNativeError, JsResult, JsValue, NativeFunction, js_string};
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::{Digest, Sha256, Sha512};
use uuid::Uuid;

use super::host;
use super::value::{js_to_json, json_to_js};

/// Tracing target for script-issued output.
const TRACING_TARGET: &str = "weave_runtime::sandbox::script";

/// Registers the fixed utility namespaces.
pub(crate) fn register_builtins(context: &mut Context) -> JsResult<()> {
    register_datetime(context)?;
    register_crypto(context)?;
    register_base64(context)?;
    register_uuid(context)?;
    register_random(context)?;
    register_print(context)?;
    Ok(())
}

/// Registers the `http` client namespace.
pub(crate) fn register_http(context: &mut Context) -> JsResult<()> {
    let http = ObjectInitializer::new(context)
        .function(NativeFunction::from_fn_ptr(http_get), js_string!("get"), 1)
        .function(NativeFunction::from_fn_ptr(http_post), js_string!("post"), 2)
        .build();

    context.register_global_property(js_string!("http"), http, Attribute::all())
}

/// Registers one database handle object under the given global name.
///
/// The object carries the backing config name in `__handle`; its `execute`
/// method resolves the live pool through the host bridge at call time.
pub(crate) fn register_db_handle(
    context: &mut Context,
    global_name: &str,
    handle_name: &str,
) -> JsResult<()> {
    let object = ObjectInitializer::new(context)
        .property(
            js_string!("__handle"),
            boa_engine::JsString::from(handle_name),
            Attribute::READONLY,
        )
        .function(NativeFunction::from_fn_ptr(db_execute), js_string!("execute"), 2)
        .build();

    context.register_global_property(
        boa_engine::JsString::from(global_name),
        object,
        Attribute::all(),
    )
}

fn register_datetime(context: &mut Context) -> JsResult<()> {
    let datetime = ObjectInitializer::new(context)
        .function(NativeFunction::from_fn_ptr(datetime_now), js_string!("now"), 0)
        .function(
            NativeFunction::from_fn_ptr(datetime_timestamp),
            js_string!("timestamp"),
            0,
        )
        .function(
            NativeFunction::from_fn_ptr(datetime_iso_string),
            js_string!("isoString"),
            0,
        )
        .build();

    context.register_global_property(js_string!("datetime"), datetime, Attribute::all())
}

fn register_crypto(context: &mut Context) -> JsResult<()> {
    let crypto = ObjectInitializer::new(context)
        .function(NativeFunction::from_fn_ptr(crypto_sha256), js_string!("sha256"), 1)
        .function(NativeFunction::from_fn_ptr(crypto_sha512), js_string!("sha512"), 1)
        .function(
            NativeFunction::from_fn_ptr(crypto_hmac_sha256),
            js_string!("hmacSha256"),
            2,
        )
        .build();

    context.register_global_property(js_string!("crypto"), crypto, Attribute::all())
}

fn register_base64(context: &mut Context) -> JsResult<()> {
    context.register_global_callable(js_string!("btoa"), 1, NativeFunction::from_fn_ptr(base64_btoa))?;
    context.register_global_callable(js_string!("atob"), 1, NativeFunction::from_fn_ptr(base64_atob))?;
    Ok(())
}

fn register_uuid(context: &mut Context) -> JsResult<()> {
    context.register_global_callable(js_string!("uuidv4"), 0, NativeFunction::from_fn_ptr(uuid_v4))
}

fn register_random(context: &mut Context) -> JsResult<()> {
    context.register_global_callable(
        js_string!("randomInt"),
        2,
        NativeFunction::from_fn_ptr(random_int),
    )?;
    context.register_global_callable(
        js_string!("randomFloat"),
        0,
        NativeFunction::from_fn_ptr(random_float),
    )?;
    Ok(())
}

fn register_print(context: &mut Context) -> JsResult<()> {
    context.register_global_callable(js_string!("print"), 1, NativeFunction::from_fn_ptr(print))
}

// Native implementations.

fn string_arg(args: &[JsValue], index: usize, context: &mut Context) -> JsResult<String> {
    let value = args.get(index).cloned().unwrap_or_default();
    Ok(value.to_string(context)?.to_std_string_escaped())
}

fn db_execute(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let handle_name = this
        .as_object()
        .map(|object| object.get(js_string!("__handle"), context))
        .transpose()?
        .ok_or_else(|| JsNativeError::typ().with_message("execute must be called on a handle"))?
        .to_string(context)?
        .to_std_string_escaped();

    let sql = string_arg(args, 0, context)?;

    let params = match args.get(1) {
        None => Vec::new(),
        Some(value) if value.is_undefined() || value.is_null() => Vec::new(),
        Some(value) => match js_to_json(value, context) {
            Some(serde_json::Value::Array(items)) => items,
            _ => {
                return Err(JsNativeError::typ()
                    .with_message("execute parameters must be an array")
                    .into());
            }
        },
    };

    let rows = host::db_execute(&handle_name, &sql, &params)
        .map_err(|e| JsNativeError::error().with_message(e.to_string()))?;

    json_to_js(&rows, context)
}

fn http_get(_: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let url = string_arg(args, 0, context)?;

    let response = host::http_get(&url)
        .map_err(|e| JsNativeError::error().with_message(e.to_string()))?;

    json_to_js(&response, context)
}

fn http_post(_: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let url = string_arg(args, 0, context)?;

    let body = args
        .get(1)
        .and_then(|value| js_to_json(value, context))
        .unwrap_or(serde_json::Value::Null);

    let response = host::http_post(&url, body)
        .map_err(|e| JsNativeError::error().with_message(e.to_string()))?;

    json_to_js(&response, context)
}

fn datetime_now(_: &JsValue, _: &[JsValue], _: &mut Context) -> JsResult<JsValue> {
    let now = jiff::Zoned::now();
    Ok(boa_engine::JsString::from(now.strftime("%Y-%m-%d %H:%M:%S").to_string()).into())
}

fn datetime_timestamp(_: &JsValue, _: &[JsValue], _: &mut Context) -> JsResult<JsValue> {
    Ok(JsValue::from(jiff::Timestamp::now().as_second()))
}

fn datetime_iso_string(_: &JsValue, _: &[JsValue], _: &mut Context) -> JsResult<JsValue> {
    Ok(boa_engine::JsString::from(jiff::Timestamp::now().to_string()).into())
}

fn crypto_sha256(_: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let input = string_arg(args, 0, context)?;
    Ok(boa_engine::JsString::from(hex::encode(Sha256::digest(input.as_bytes()))).into())
}

fn crypto_sha512(_: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let input = string_arg(args, 0, context)?;
    Ok(boa_engine::JsString::from(hex::encode(Sha512::digest(input.as_bytes()))).into())
}

fn crypto_hmac_sha256(_: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let key = string_arg(args, 0, context)?;
    let message = string_arg(args, 1, context)?;

    let mut mac = Hmac::<Sha256>::new_from_slice(key.as_bytes())
        .map_err(|e| JsNativeError::error().with_message(e.to_string()))?;
    mac.update(message.as_bytes());

    Ok(boa_engine::JsString::from(hex::encode(mac.finalize().into_bytes())).into())
}

fn base64_btoa(_: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let input = string_arg(args, 0, context)?;
    Ok(boa_engine::JsString::from(BASE64_STANDARD.encode(input.as_bytes())).into())
}

fn base64_atob(_: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let input = string_arg(args, 0, context)?;

    let decoded = BASE64_STANDARD
        .decode(input.as_bytes())
        .map_err(|e| JsNativeError::typ().with_message(e.to_string()))?;
    let decoded = String::from_utf8(decoded)
        .map_err(|e| JsNativeError::typ().with_message(e.to_string()))?;

    Ok(boa_engine::JsString::from(decoded).into())
}

fn uuid_v4(_: &JsValue, _: &[JsValue], _: &mut Context) -> JsResult<JsValue> {
    Ok(boa_engine::JsString::from(Uuid::new_v4().to_string()).into())
}

fn random_int(_: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let min = args
        .get(0)
        .cloned()
        .unwrap_or_default()
        .to_number(context)? as i64;
    let max = args
        .get(1)
        .cloned()
        .unwrap_or(JsValue::from(i32::MAX))
        .to_number(context)? as i64;

    if min > max {
        return Err(JsNativeError::range()
            .with_message("randomInt: min must not exceed max")
            .into());
    }

    Ok(JsValue::from(rand::rng().random_range(min..=max)))
}

fn random_float(_: &JsValue, _: &[JsValue], _: &mut Context) -> JsResult<JsValue> {
    Ok(JsValue::from(rand::rng().random::<f64>()))
}

fn print(_: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let mut parts = Vec::with_capacity(args.len());
    for arg in args {
        parts.push(arg.to_string(context)?.to_std_string_escaped());
    }

    tracing::info!(target: TRACING_TARGET, "{}", parts.join(" "));
    Ok(JsValue::undefined())
}
