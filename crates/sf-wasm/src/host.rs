//! Browser hosts
//!
//! `chrome.storage.local`, `chrome.declarativeNetRequest` and packaged seed
//! files behind the worker's host traits. Values cross the boundary as JSON.

use serde_json::Value;
use sf_core::config::FilterConfig;
use sf_core::types::{DynamicRule, RuleUpdate};
use sf_worker::{HostError, KeyValueStore, RuleApi, SeedKind, SeedSource};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "local"], js_name = get)]
    fn storage_local_get(keys: &str) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "local"], js_name = set)]
    fn storage_local_set(items: &JsValue) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "declarativeNetRequest"], js_name = getDynamicRules)]
    fn dnr_get_dynamic_rules() -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "declarativeNetRequest"], js_name = updateDynamicRules)]
    fn dnr_update_dynamic_rules(options: &JsValue) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(js_namespace = ["chrome", "runtime"], js_name = getURL)]
    fn runtime_get_url(path: &str) -> String;

    #[wasm_bindgen(catch, js_name = fetch)]
    fn fetch_url(url: &str) -> Result<js_sys::Promise, JsValue>;

    type FetchResponse;

    #[wasm_bindgen(method, getter)]
    fn ok(this: &FetchResponse) -> bool;

    #[wasm_bindgen(method, getter)]
    fn status(this: &FetchResponse) -> u16;

    #[wasm_bindgen(catch, method)]
    fn text(this: &FetchResponse) -> Result<js_sys::Promise, JsValue>;
}

// =============================================================================
// JSON bridging
// =============================================================================

pub fn js_error(error: JsValue) -> HostError {
    let message = error
        .dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .or_else(|| error.as_string())
        .unwrap_or_else(|| format!("{:?}", error));
    HostError::new(message)
}

pub fn to_json(value: &JsValue) -> Result<Value, HostError> {
    if value.is_undefined() {
        return Ok(Value::Null);
    }
    let text = js_sys::JSON::stringify(value).map_err(js_error)?;
    serde_json::from_str(&String::from(text)).map_err(|e| HostError::new(e.to_string()))
}

pub fn from_json(value: &Value) -> Result<JsValue, HostError> {
    js_sys::JSON::parse(&value.to_string()).map_err(js_error)
}

async fn settle(promise: Result<js_sys::Promise, JsValue>) -> Result<JsValue, HostError> {
    JsFuture::from(promise.map_err(js_error)?).await.map_err(js_error)
}

// =============================================================================
// Hosts
// =============================================================================

pub struct ChromeStorage;

impl KeyValueStore for ChromeStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>, HostError> {
        let items = settle(storage_local_get(key)).await?;
        let value = js_sys::Reflect::get(&items, &JsValue::from_str(key)).map_err(js_error)?;
        if value.is_undefined() {
            return Ok(None);
        }
        to_json(&value).map(Some)
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), HostError> {
        let items = js_sys::Object::new();
        js_sys::Reflect::set(&items, &JsValue::from_str(key), &from_json(&value)?).map_err(js_error)?;
        settle(storage_local_set(&items)).await?;
        Ok(())
    }
}

pub struct ChromeRules;

impl RuleApi for ChromeRules {
    async fn get_dynamic_rules(&self) -> Result<Vec<DynamicRule>, HostError> {
        let rules = to_json(&settle(dnr_get_dynamic_rules()).await?)?;
        serde_json::from_value(rules).map_err(|e| HostError::new(format!("Unexpected dynamic rule shape: {}", e)))
    }

    async fn update_dynamic_rules(&self, update: RuleUpdate) -> Result<(), HostError> {
        let options = serde_json::to_value(&update).map_err(|e| HostError::new(e.to_string()))?;
        settle(dnr_update_dynamic_rules(&from_json(&options)?)).await?;
        Ok(())
    }
}

/// Seed files fetched from the extension package.
pub struct PackagedSeeds {
    blocklist_path: String,
    keywords_path: String,
}

impl PackagedSeeds {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            blocklist_path: config.seed_blocklist_path.clone(),
            keywords_path: config.seed_keywords_path.clone(),
        }
    }
}

impl SeedSource for PackagedSeeds {
    async fn read_seed(&self, kind: SeedKind) -> Result<String, HostError> {
        let path = match kind {
            SeedKind::Blocklist => &self.blocklist_path,
            SeedKind::Keywords => &self.keywords_path,
        };

        let response: FetchResponse = settle(fetch_url(&runtime_get_url(path))).await?.unchecked_into();
        if !response.ok() {
            return Err(HostError::new(format!("Failed to load {}: {}", path, response.status())));
        }

        settle(response.text())
            .await?
            .as_string()
            .ok_or_else(|| HostError::new(format!("Failed to load {}: body is not text", path)))
    }
}
