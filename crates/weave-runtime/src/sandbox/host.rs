//! Host-call bridge between the script thread and the async runtime.
//!
//! Node scripts run on a dedicated blocking worker thread while their
//! database and HTTP capabilities are async. The bridge installs the host
//! state in a thread-local for the duration of one script evaluation; the
//! native functions registered in the interpreter reach it from there and
//! drive the async side to completion with [`Handle::block_on`].
//!
//! The thread-local is sound because a script thread executes exactly one
//! node at a time and the state is removed when evaluation finishes.

use std::cell::RefCell;
use std::collections::HashMap;

use serde_json::{Map, Value, json};
use tokio::runtime::Handle;
use weave_core::{Error, Result};

use crate::registry::DbHandle;

thread_local! {
    static ACTIVE_HOST: RefCell<Option<ScriptHost>> = const { RefCell::new(None) };
}

/// Capabilities reachable from native script functions.
#[derive(Clone)]
pub(crate) struct ScriptHost {
    handles: HashMap<String, DbHandle>,
    http: reqwest::Client,
    runtime: Handle,
}

impl ScriptHost {
    /// Bundles the injected handles and clients for one evaluation.
    pub(crate) fn new(handles: Vec<DbHandle>, http: reqwest::Client, runtime: Handle) -> Self {
        let handles = handles
            .into_iter()
            .map(|handle| (handle.name().to_owned(), handle))
            .collect();

        Self {
            handles,
            http,
            runtime,
        }
    }
}

/// Runs `f` with the host installed on the current thread.
pub(crate) fn with_host<T>(host: ScriptHost, f: impl FnOnce() -> T) -> T {
    struct Uninstall;

    impl Drop for Uninstall {
        fn drop(&mut self) {
            ACTIVE_HOST.with(|slot| slot.borrow_mut().take());
        }
    }

    ACTIVE_HOST.with(|slot| *slot.borrow_mut() = Some(host));
    let _uninstall = Uninstall;
    f()
}

fn with_active<T>(f: impl FnOnce(&ScriptHost) -> Result<T>) -> Result<T> {
    ACTIVE_HOST.with(|slot| {
        let host = slot.borrow();
        let host = host
            .as_ref()
            .ok_or_else(|| Error::internal_error().with_message("no script host installed"))?;
        f(host)
    })
}

/// Runs one statement through a named injected handle.
pub(crate) fn db_execute(name: &str, sql: &str, params: &[Value]) -> Result<Value> {
    with_active(|host| {
        let handle = host.handles.get(name).ok_or_else(|| {
            Error::not_found().with_message(format!("no active database handle '{name}'"))
        })?;

        host.runtime
            .block_on(handle.execute(sql, params))
            .map_err(|e| Error::external_error().with_message(e.to_string()))
    })
}

/// Issues a GET request on behalf of a script.
pub(crate) fn http_get(url: &str) -> Result<Value> {
    with_active(|host| {
        let request = host.http.get(url);
        host.runtime.block_on(send(request))
    })
}

/// Issues a POST request with a JSON body on behalf of a script.
pub(crate) fn http_post(url: &str, body: Value) -> Result<Value> {
    with_active(|host| {
        let request = host.http.post(url).json(&body);
        host.runtime.block_on(send(request))
    })
}

async fn send(request: reqwest::RequestBuilder) -> Result<Value> {
    let response = request
        .send()
        .await
        .map_err(|e| Error::external_error().with_message(e.to_string()))?;

    let status = response.status().as_u16();
    let headers: Map<String, Value> = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            let value = value.to_str().ok()?;
            Some((name.as_str().to_owned(), Value::from(value)))
        })
        .collect();

    let text = response
        .text()
        .await
        .map_err(|e| Error::external_error().with_message(e.to_string()))?;

    let body = serde_json::from_str(&text).unwrap_or(Value::String(text));

    Ok(json!({
        "status": status,
        "headers": headers,
        "body": body,
    }))
}
