//! Per-node script execution environments.
//!
//! Each node executes in a fresh embedded-interpreter context carrying a
//! fixed allow-list of utility namespaces, the request context, the node's
//! input data and one database handle per enabled external config. The
//! environment restricts what a script can conveniently reach; it is NOT a
//! security boundary and must not be treated as isolation.
//!
//! Scripts communicate their outcome through an explicit structured return
//! value: the completion value of the script must be an object of the form
//! `{ next: <int>, data: <value> }`. A missing `next` means "stop"; a
//! missing `data` keeps the node's input.

mod builtins;
mod host;
mod value;

use boa_engine::property::Attribute;
use boa_engine::{Context, Source, js_string};
use serde_json::Value;
use tokio::runtime::Handle;
use weave_core::types::RequestContext;

use self::host::ScriptHost;
use self::value::{js_to_json, json_to_js};
use crate::error::{RuntimeError, RuntimeResult};
use crate::registry::DbHandle;

/// Tracing target for sandbox operations.
const TRACING_TARGET: &str = "weave_runtime::sandbox";

/// Alias under which the default config's handle is additionally injected.
const DEFAULT_HANDLE_ALIAS: &str = "db";

/// The declared result of one node execution.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeOutput {
    /// Number of the node to execute next; `<= 0` stops the run.
    pub next: i64,
    /// Data handed to the next node (or returned as the final payload).
    pub data: Value,
}

/// Builder/executor for per-node script environments.
///
/// Cheap to clone; clones share the HTTP client and database pools. One
/// sandbox executes one node per call, on the calling (blocking) thread.
#[derive(Clone)]
pub struct Sandbox {
    handles: Vec<DbHandle>,
    http: reqwest::Client,
    runtime: Handle,
}

impl Sandbox {
    /// Creates a sandbox over the given database handles.
    ///
    /// Must be called from within the async runtime whose handle will
    /// serve the bridged host calls.
    pub fn new(handles: Vec<DbHandle>, http: reqwest::Client) -> Self {
        Self {
            handles,
            http,
            runtime: Handle::current(),
        }
    }

    /// Executes one node script and extracts its structured result.
    ///
    /// Intended to run on a blocking worker thread; database and HTTP
    /// capabilities are bridged back into the async runtime.
    pub fn execute_node(
        &self,
        code: &str,
        node_number: i64,
        node_name: &str,
        data: &Value,
        context: &RequestContext,
    ) -> RuntimeResult<NodeOutput> {
        let mut ctx = Context::default();

        builtins::register_builtins(&mut ctx).map_err(script_error)?;
        builtins::register_http(&mut ctx).map_err(script_error)?;

        inject_globals(&mut ctx, node_number, node_name, data, context)?;
        self.inject_db_handles(&mut ctx);

        let host = ScriptHost::new(self.handles.clone(), self.http.clone(), self.runtime.clone());
        let completion = host::with_host(host, || ctx.eval(Source::from_bytes(code)))
            .map_err(|e| RuntimeError::Script(e.to_string()))?;

        extract_output(&completion, data, &mut ctx)
    }

    fn inject_db_handles(&self, ctx: &mut Context) {
        for handle in &self.handles {
            if let Err(error) = builtins::register_db_handle(ctx, handle.name(), handle.name()) {
                // A failed injection removes one handle, not the node run.
                tracing::warn!(
                    target: TRACING_TARGET,
                    handle = %handle.name(),
                    error = %error,
                    "failed to inject database handle"
                );
            }
        }

        if let Some(default) = self.handles.iter().find(|handle| handle.is_default())
            && let Err(error) =
                builtins::register_db_handle(ctx, DEFAULT_HANDLE_ALIAS, default.name())
        {
            tracing::warn!(
                target: TRACING_TARGET,
                handle = %default.name(),
                error = %error,
                "failed to inject default handle alias"
            );
        }
    }
}

/// Executes an inline endpoint script in a restricted environment.
///
/// The environment carries only the interpreter's own primitives and JSON
/// codec plus the injected `context`; no database handles, no host
/// namespaces, no node-graph semantics. The completion value is the
/// endpoint's result.
pub fn execute_inline(code: &str, context: &RequestContext) -> RuntimeResult<Value> {
    let mut ctx = Context::default();

    let context_js = json_to_js(&context.to_value(), &mut ctx).map_err(script_error)?;
    ctx.register_global_property(js_string!("context"), context_js, Attribute::all())
        .map_err(script_error)?;

    let completion = ctx
        .eval(Source::from_bytes(code))
        .map_err(|e| RuntimeError::Script(e.to_string()))?;

    match js_to_json(&completion, &mut ctx) {
        Some(result) => Ok(result),
        None => Ok(serde_json::json!({"message": "script executed successfully"})),
    }
}

fn inject_globals(
    ctx: &mut Context,
    node_number: i64,
    node_name: &str,
    data: &Value,
    context: &RequestContext,
) -> RuntimeResult<()> {
    let data_js = json_to_js(data, ctx).map_err(script_error)?;
    ctx.register_global_property(js_string!("data"), data_js, Attribute::all())
        .map_err(script_error)?;

    let context_js = json_to_js(&context.to_value(), ctx).map_err(script_error)?;
    ctx.register_global_property(js_string!("context"), context_js, Attribute::all())
        .map_err(script_error)?;

    ctx.register_global_property(js_string!("node"), node_number, Attribute::all())
        .map_err(script_error)?;

    ctx.register_global_property(
        js_string!("nodeName"),
        boa_engine::JsString::from(node_name),
        Attribute::all(),
    )
    .map_err(script_error)?;

    Ok(())
}

/// Reads the structured `{next, data}` result off a completion value.
///
/// Anything that is not an object means "stop with the input data": the
/// node declared no jump and produced nothing new.
fn extract_output(
    completion: &boa_engine::JsValue,
    input: &Value,
    ctx: &mut Context,
) -> RuntimeResult<NodeOutput> {
    let Some(object) = completion.as_object() else {
        return Ok(NodeOutput {
            next: 0,
            data: input.clone(),
        });
    };

    let next = object
        .get(js_string!("next"), ctx)
        .map_err(script_error)?
        .as_number()
        .map(|n| n as i64)
        .unwrap_or(0);

    let data_value = object.get(js_string!("data"), ctx).map_err(script_error)?;
    let data = if data_value.is_undefined() {
        input.clone()
    } else {
        js_to_json(&data_value, ctx).ok_or_else(|| {
            RuntimeError::Script("node result `data` is not JSON-serializable".into())
        })?
    };

    Ok(NodeOutput { next, data })
}

fn script_error(error: impl std::fmt::Display) -> RuntimeError {
    RuntimeError::Script(error.to_string())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sandbox() -> Sandbox {
        Sandbox::new(Vec::new(), reqwest::Client::new())
    }

    #[tokio::test]
    async fn structured_result_carries_next_and_data() {
        let output = tokio::task::spawn_blocking(|| {
            sandbox().execute_node(
                "let out = { a: 1 }; ({ next: 2, data: out })",
                1,
                "first",
                &json!({}),
                &RequestContext::new(),
            )
        })
        .await
        .unwrap()
        .unwrap();

        assert_eq!(output.next, 2);
        assert_eq!(output.data, json!({"a": 1}));
    }

    #[tokio::test]
    async fn missing_data_falls_back_to_input() {
        let output = tokio::task::spawn_blocking(|| {
            sandbox().execute_node(
                "({ next: 0 })",
                1,
                "first",
                &json!({"kept": true}),
                &RequestContext::new(),
            )
        })
        .await
        .unwrap()
        .unwrap();

        assert_eq!(output.next, 0);
        assert_eq!(output.data, json!({"kept": true}));
    }

    #[tokio::test]
    async fn non_object_completion_stops_with_input() {
        let output = tokio::task::spawn_blocking(|| {
            sandbox().execute_node(
                "let x = 41; x + 1;",
                1,
                "first",
                &json!({"seed": 1}),
                &RequestContext::new(),
            )
        })
        .await
        .unwrap()
        .unwrap();

        assert_eq!(output.next, 0);
        assert_eq!(output.data, json!({"seed": 1}));
    }

    #[tokio::test]
    async fn scripts_read_injected_globals() {
        let context = RequestContext::new().with_query_param("who", "ada");

        let output = tokio::task::spawn_blocking(move || {
            sandbox().execute_node(
                "({ next: 0, data: { node: node, name: nodeName, who: context.query.who } })",
                3,
                "greeter",
                &json!({}),
                &context,
            )
        })
        .await
        .unwrap()
        .unwrap();

        assert_eq!(
            output.data,
            json!({"node": 3, "name": "greeter", "who": "ada"})
        );
    }

    #[tokio::test]
    async fn utility_namespaces_are_available() {
        let output = tokio::task::spawn_blocking(|| {
            sandbox().execute_node(
                r#"({ next: 0, data: {
                    digest: crypto.sha256("abc"),
                    encoded: btoa("hi"),
                    id_len: uuidv4().length,
                } })"#,
                1,
                "tools",
                &json!({}),
                &RequestContext::new(),
            )
        })
        .await
        .unwrap()
        .unwrap();

        assert_eq!(
            output.data["digest"],
            json!("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
        );
        assert_eq!(output.data["encoded"], json!("aGk="));
        assert_eq!(output.data["id_len"], json!(36));
    }

    #[tokio::test]
    async fn syntax_errors_surface_as_script_errors() {
        let result = tokio::task::spawn_blocking(|| {
            sandbox().execute_node(
                "this is not a script",
                1,
                "broken",
                &json!({}),
                &RequestContext::new(),
            )
        })
        .await
        .unwrap();

        assert!(matches!(result, Err(RuntimeError::Script(_))));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn default_alias_follows_the_default_config() {
        use std::path::Path;

        use crate::registry::{ConnectionRegistry, test_support::sqlite_config};

        async fn seed(
            registry: &ConnectionRegistry,
            id: i32,
            name: &str,
            path: &Path,
            is_default: bool,
        ) -> DbHandle {
            let config = sqlite_config(id, name, path.to_str().unwrap(), is_default);
            let handle = registry.reload(&config).await.unwrap();
            handle
                .execute("CREATE TABLE IF NOT EXISTS marker (name TEXT)", &[])
                .await
                .unwrap();
            handle.execute("DELETE FROM marker", &[]).await.unwrap();
            handle
                .execute("INSERT INTO marker (name) VALUES (?)", &[json!(name)])
                .await
                .unwrap();
            handle
        }

        async fn read_default_marker(handles: Vec<DbHandle>) -> serde_json::Value {
            let output = tokio::task::spawn_blocking(move || {
                Sandbox::new(handles, reqwest::Client::new()).execute_node(
                    r#"let rows = db.execute("SELECT name FROM marker", []);
                       ({ next: 0, data: { origin: rows[0].name } })"#,
                    1,
                    "probe",
                    &json!({}),
                    &RequestContext::new(),
                )
            })
            .await
            .unwrap()
            .unwrap();
            output.data["origin"].clone()
        }

        let dir = tempfile::tempdir().unwrap();
        let alpha_path = dir.path().join("alpha.db");
        let beta_path = dir.path().join("beta.db");
        let registry = ConnectionRegistry::new();

        // Beta starts as the default; the `db` alias must target it.
        let alpha = seed(&registry, 1, "alpha", &alpha_path, false).await;
        let beta = seed(&registry, 2, "beta", &beta_path, true).await;
        assert_eq!(read_default_marker(vec![alpha, beta]).await, json!("beta"));

        // After the default flips to alpha, the alias must follow.
        let alpha = seed(&registry, 1, "alpha", &alpha_path, true).await;
        let beta = seed(&registry, 2, "beta", &beta_path, false).await;
        assert_eq!(read_default_marker(vec![alpha, beta]).await, json!("alpha"));
    }

    #[test]
    fn inline_scripts_return_completion_value() {
        let context = RequestContext::new().with_query_param("n", "2");
        let result = execute_inline(
            "let n = Number(context.query.n); ({ doubled: n * 2 })",
            &context,
        )
        .unwrap();

        assert_eq!(result, json!({"doubled": 4}));
    }

    #[test]
    fn inline_scripts_without_result_report_success() {
        let result = execute_inline("let unused = 1;", &RequestContext::new()).unwrap();
        assert_eq!(result, json!({"message": "script executed successfully"}));
    }
}
