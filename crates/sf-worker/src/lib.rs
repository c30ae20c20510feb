//! Steadfast Background Worker
//!
//! Everything the extension's background worker does, independent of the
//! browser: reading and writing the persisted lists, regenerating dynamic
//! rules, and answering messages from the popup, interstitial page and
//! content scripts.
//!
//! The browser itself is reached through three host traits (`KeyValueStore`,
//! `RuleApi`, `SeedSource`). The worker keeps no state between calls: the
//! host may restart it at any time, so every handler re-reads storage.
//!
//! # Modules
//!
//! - `host`: host traits
//! - `memory`: in-memory host implementations
//! - `store`: typed access to persisted values
//! - `seed`: packaged seed lists with empty-list fallback
//! - `sync`: full replacement of the installed dynamic rules
//! - `messages`: request and response envelopes
//! - `router`: message dispatch
//! - `content`: navigation checks for the content side

pub mod content;
pub mod error;
pub mod host;
pub mod memory;
pub mod messages;
pub mod router;
pub mod seed;
pub mod store;
pub mod sync;

pub use content::{check_navigation, evaluate_url, BlockVerdict, KeywordCache};
pub use error::{HostError, WorkerError};
pub use host::{KeyValueStore, RuleApi, SeedKind, SeedSource};
pub use messages::{Request, Response};
pub use router::MessageRouter;
pub use store::Store;
pub use sync::{RuleSynchronizer, SyncReport};
