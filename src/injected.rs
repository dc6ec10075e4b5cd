//! The provider injected by the browser extension as `window.ethereum`.

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
};

use async_trait::async_trait;
use futures::{
    future::LocalFutureObj,
    task::{LocalSpawn, SpawnError},
};
use js_sys::{Function, Promise, Reflect};
use log::{debug, warn};
use serde::Serialize;
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use wasm_bindgen_futures::{spawn_local, JsFuture};

use super::{
    provider::{EventHandler, ListenerId, Provider, ProviderError},
    Error,
};

#[derive(Serialize)]
struct RequestArguments<'a> {
    method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<&'a serde_json::Value>,
}

pub struct InjectedProvider {
    inner: JsValue,
    request: Function,
    on: Function,
    remove_listener: Function,
    // JS side handlers, kept so they can be passed back to `removeListener`
    listeners: RefCell<HashMap<ListenerId, JsValue>>,
    next_listener: Cell<u64>,
}

impl std::fmt::Debug for InjectedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InjectedProvider").finish_non_exhaustive()
    }
}

impl InjectedProvider {
    /// Picks up `window.ethereum`.
    pub fn from_window() -> Result<Self, Error> {
        let ethereum =
            Reflect::get(&gloo_utils::window(), &"ethereum".into()).map_err(|_| Error::NoProvider)?;
        Self::new(ethereum)
    }

    pub fn new(value: JsValue) -> Result<Self, Error> {
        if value.is_undefined() || value.is_null() {
            return Err(Error::NoProvider);
        }

        Ok(Self {
            request: method(&value, "request")?,
            on: method(&value, "on")?,
            remove_listener: method(&value, "removeListener")?,
            inner: value,
            listeners: RefCell::new(HashMap::new()),
            next_listener: Cell::new(0),
        })
    }

    pub fn inner(&self) -> &JsValue {
        &self.inner
    }
}

fn method(value: &JsValue, name: &str) -> Result<Function, Error> {
    Reflect::get(value, &name.into())
        .ok()
        .and_then(|f| f.dyn_into::<Function>().ok())
        .ok_or(Error::NoProvider)
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, ProviderError> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|err| ProviderError::internal(err.to_string()))
}

/// Reads a rejection as a `ProviderRpcError`. `Error` instances keep `message` off the
/// enumerable properties, hence the reflection.
fn provider_error(value: JsValue) -> ProviderError {
    let field = |name: &str| Reflect::get(&value, &name.into()).ok().filter(|v| !v.is_undefined());

    let code = field("code").and_then(|c| c.as_f64()).map(|c| c as i64);
    let message = field("message").and_then(|m| m.as_string());

    match (code, message) {
        (Some(code), Some(message)) => ProviderError {
            code,
            message,
            data: field("data").and_then(|d| serde_wasm_bindgen::from_value(d).ok()),
        },
        (None, Some(message)) => ProviderError::internal(message),
        _ => ProviderError::internal(value.as_string().unwrap_or_else(|| format!("{value:?}"))),
    }
}

#[async_trait(?Send)]
impl Provider for InjectedProvider {
    async fn request(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, ProviderError> {
        let args = to_js(&RequestArguments { method, params: params.as_ref() })?;

        let promise: Promise =
            self.request.call1(&self.inner, &args).map_err(provider_error)?.unchecked_into();
        let result = JsFuture::from(promise).await.map_err(provider_error)?;

        if result.is_undefined() {
            return Ok(serde_json::Value::Null);
        }
        serde_wasm_bindgen::from_value(result)
            .map_err(|err| ProviderError::internal(err.to_string()))
    }

    fn on(&self, event: &str, handler: EventHandler) -> Result<ListenerId, ProviderError> {
        let name = event.to_string();
        let closure = Closure::wrap(Box::new(move |payload: JsValue| {
            let payload = if payload.is_undefined() {
                serde_json::Value::Null
            } else {
                serde_wasm_bindgen::from_value(payload.clone()).unwrap_or_else(|err| {
                    warn!("{name} payload is not plain data ({err}), passing the error view");
                    serde_json::to_value(provider_error(payload)).unwrap_or_default()
                })
            };
            handler(payload);
        }) as Box<dyn Fn(JsValue)>);

        let closure = closure.into_js_value();
        self.on.call2(&self.inner, &event.into(), &closure).map_err(provider_error)?;

        let id = ListenerId(self.next_listener.get());
        self.next_listener.set(id.0 + 1);
        self.listeners.borrow_mut().insert(id, closure);
        debug!("registered {event} {id}");
        Ok(id)
    }

    fn remove_listener(&self, event: &str, id: ListenerId) -> Result<(), ProviderError> {
        let closure = match self.listeners.borrow_mut().remove(&id) {
            Some(closure) => closure,
            None => return Ok(()),
        };
        self.remove_listener.call2(&self.inner, &event.into(), &closure).map_err(provider_error)?;
        Ok(())
    }
}

/// Runs bridge tasks on the browser's microtask queue.
#[derive(Debug, Default, Clone, Copy)]
pub struct WasmSpawner;

impl LocalSpawn for WasmSpawner {
    fn spawn_local_obj(&self, future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
        spawn_local(future);
        Ok(())
    }
}
