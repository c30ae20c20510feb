//! Steadfast Core Library
//!
//! Shared building blocks for the Steadfast content filter: input
//! normalization, the declarative rule shapes handed to the browser, and the
//! small amount of URL handling both the background worker and content side
//! need.
//!
//! # Modules
//!
//! - `normalize`: canonical domain and keyword strings from raw input
//! - `types`: rule shapes, resource-type sets, notes and block reasons
//! - `url`: allocation-free host extraction
//! - `interstitial`: building and parsing the interstitial page URL
//! - `config`: filter configuration and its defaults

pub mod config;
pub mod interstitial;
pub mod normalize;
pub mod types;
pub mod url;

// Re-export commonly used types
pub use config::{ConfigError, FilterConfig};
pub use interstitial::{interstitial_url, InterstitialParams};
pub use normalize::{normalize_domain, normalize_keyword};
pub use types::{BlockReason, DynamicRule, Note, ResourceTypes, RuleActionType, RuleUpdate};
