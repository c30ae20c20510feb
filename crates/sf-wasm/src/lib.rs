//! WebAssembly bindings for the Steadfast background worker
//!
//! The service worker's JS glue forwards `runtime.onMessage`,
//! `runtime.onInstalled`, `runtime.onStartup` and rule-match events here.
//! Every call builds a router over the browser hosts; all state lives in
//! `chrome.storage.local`, so nothing is kept between calls.

mod host;

use serde_json::Value;
use sf_core::config::FilterConfig;
use sf_core::interstitial::InterstitialParams;
use sf_core::types::BlockReason;
use sf_worker::{KeywordCache, MessageRouter, Response};
use wasm_bindgen::prelude::*;

use crate::host::{from_json, to_json, ChromeRules, ChromeStorage, PackagedSeeds};

type BrowserRouter = MessageRouter<ChromeStorage, ChromeRules, PackagedSeeds>;

fn router() -> BrowserRouter {
    let config = FilterConfig::default();
    let seeds = PackagedSeeds::new(&config);
    MessageRouter::new(ChromeStorage, ChromeRules, seeds, config)
}

fn to_js<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn json_to_js(value: &Value) -> Result<JsValue, JsValue> {
    from_json(value).map_err(to_js)
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

/// Answer one runtime message with the `{ok, data?, error?}` envelope.
#[wasm_bindgen]
pub async fn handle_message(message: JsValue) -> JsValue {
    let response = match to_json(&message) {
        Ok(value) => router().handle(&value).await,
        Err(e) => {
            log::debug!("Unreadable message: {}", e);
            Response::failure(sf_worker::WorkerError::InvalidMessage.to_string())
        }
    };
    json_to_js(&response.to_value()).unwrap_or(JsValue::NULL)
}

/// Reconcile installed rules and the counter with storage.
#[wasm_bindgen]
pub async fn ensure_initialized() -> Result<(), JsValue> {
    let report = router().ensure_initialized().await.map_err(|e| {
        log::error!("Initialization failed: {}", e);
        to_js(e)
    })?;
    log::info!("Installed {} blocking rules", report.added);
    Ok(())
}

/// Count a matched rule. Returns the new total, or `null` for rules this
/// extension did not install.
#[wasm_bindgen]
pub async fn on_rule_matched(rule_id: i32) -> Result<JsValue, JsValue> {
    let total = router().on_rule_matched(i64::from(rule_id)).await.map_err(to_js)?;
    Ok(total.map(|t| JsValue::from_f64(t as f64)).unwrap_or(JsValue::NULL))
}

/// Check a page URL against current storage. Returns the interstitial URL
/// to redirect to, or `null`.
#[wasm_bindgen]
pub async fn check_navigation(url: String) -> Result<JsValue, JsValue> {
    let router = router();
    let mut cache = KeywordCache::new();
    let verdict = sf_worker::check_navigation(&router, &url, &mut cache)
        .await
        .map_err(to_js)?;

    Ok(match verdict {
        Some(verdict) => JsValue::from_str(&verdict.redirect_url(&router.config().interstitial_path, &url)),
        None => JsValue::NULL,
    })
}

/// Pure variant of [`check_navigation`] for content scripts that already
/// hold the lists.
#[wasm_bindgen]
pub fn evaluate_url(url: &str, blocklist: JsValue, keywords: JsValue) -> Result<JsValue, JsValue> {
    let (blocklist, keywords) = prepare_lists(string_list(&blocklist)?, string_list(&keywords)?);

    match sf_worker::evaluate_url(url, &blocklist, &keywords) {
        Some(verdict) => json_to_js(&serde_json::json!({
            "reason": verdict.reason.as_str(),
            "keyword": verdict.keyword,
            "redirect": verdict.redirect_url(&FilterConfig::default().interstitial_path, url),
        })),
        None => Ok(JsValue::NULL),
    }
}

/// Normalize caller-supplied lists the way stored and seed lists are, with
/// the blocklist sorted for lookup.
fn prepare_lists(blocklist: Vec<String>, keywords: Vec<String>) -> (Vec<String>, Vec<String>) {
    let mut blocklist: Vec<String> = blocklist.iter().filter_map(|d| sf_core::normalize_domain(d)).collect();
    blocklist.sort();
    blocklist.dedup();
    let keywords = keywords.iter().filter_map(|k| sf_core::normalize_keyword(k)).collect();
    (blocklist, keywords)
}

/// Interstitial URL for a block. An unknown `reason` is reported as content.
#[wasm_bindgen]
pub fn interstitial_url(reason: &str, keyword: Option<String>, url: Option<String>) -> String {
    let reason = BlockReason::from_name(reason).unwrap_or(BlockReason::Content);
    let mut params = InterstitialParams::new(reason);
    if let Some(keyword) = keyword {
        params = params.with_keyword(keyword);
    }
    if let Some(url) = url {
        params = params.with_url(url);
    }
    sf_core::interstitial_url(&FilterConfig::default().interstitial_path, &params)
}

/// Decode the interstitial page's query string into `{reason, keyword?, url?}`.
#[wasm_bindgen]
pub fn parse_interstitial(query: &str) -> Result<JsValue, JsValue> {
    let params = InterstitialParams::from_query(query);
    json_to_js(&serde_json::json!({
        "reason": params.reason.as_str(),
        "keyword": params.keyword,
        "url": params.url,
    }))
}

#[wasm_bindgen]
pub fn normalize_domain(input: &str) -> Option<String> {
    sf_core::normalize_domain(input)
}

#[wasm_bindgen]
pub fn normalize_keyword(input: &str) -> Option<String> {
    sf_core::normalize_keyword(input)
}

fn string_list(value: &JsValue) -> Result<Vec<String>, JsValue> {
    match to_json(value).map_err(to_js)? {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect()),
        _ => Err(JsValue::from_str("Expected an array of strings")),
    }
}

#[cfg(test)]
mod list_tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_prepare_lists_normalizes() {
        let (blocklist, keywords) = prepare_lists(
            strings(&["https://www.Zeta.com/", "alpha.com", "not a domain"]),
            strings(&["Casino", "  Poker   Room "]),
        );
        assert_eq!(blocklist, strings(&["alpha.com", "zeta.com"]));
        assert_eq!(keywords, strings(&["casino", "poker room"]));

        let verdict = sf_worker::evaluate_url("https://x.com/casino", &blocklist, &keywords).unwrap();
        assert_eq!(verdict.keyword.as_deref(), Some("casino"));
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    #[wasm_bindgen_test]
    fn test_json_bridge() {
        let value = serde_json::json!({"type": "addSite", "domain": "a.com"});
        let js = from_json(&value).unwrap();
        assert_eq!(to_json(&js).unwrap(), value);
        assert_eq!(to_json(&JsValue::UNDEFINED).unwrap(), Value::Null);
    }

    #[wasm_bindgen_test]
    fn test_evaluate_url_export() {
        let blocklist = from_json(&serde_json::json!(["evil.org", "bad.com"])).unwrap();
        let verdict = evaluate_url("https://www.bad.com/", blocklist, JsValue::NULL).unwrap();
        let verdict = to_json(&verdict).unwrap();
        assert_eq!(verdict["reason"], "domain");
        assert!(verdict["redirect"].as_str().unwrap().contains("reason=domain"));

        let keywords = from_json(&serde_json::json!(["poker"])).unwrap();
        assert!(evaluate_url("https://ok.com/", JsValue::NULL, keywords).unwrap().is_null());
    }

    #[wasm_bindgen_test]
    fn test_parse_interstitial_export() {
        let parsed = to_json(&parse_interstitial("?reason=keyword&keyword=poker").unwrap()).unwrap();
        assert_eq!(parsed["reason"], "keyword");
        assert_eq!(parsed["keyword"], "poker");
        assert_eq!(parsed["url"], Value::Null);
    }
}
