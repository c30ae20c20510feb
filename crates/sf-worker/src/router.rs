//! Message dispatch
//!
//! Each request is handled on its own against persistent storage. Handlers
//! that change what should be blocked re-synchronize the dynamic rules
//! before answering, so the browser's behavior matches the stored list by
//! the time the caller sees the response.

use serde::Serialize;
use serde_json::Value;
use sf_compiler::merge_blocklists;
use sf_core::config::FilterConfig;
use sf_core::interstitial::{interstitial_url, InterstitialParams};
use sf_core::normalize::normalize_domain;
use sf_core::types::BlockReason;

use crate::error::WorkerError;
use crate::host::{KeyValueStore, RuleApi, SeedSource};
use crate::messages::{
    BlockedData, KeywordsData, NotesData, Request, Response, SiteAdded, SiteRemoved, StateData, ToggleData,
};
use crate::seed::SeedLoader;
use crate::store::Store;
use crate::sync::{RuleSynchronizer, SyncReport};

pub struct MessageRouter<S, R, L> {
    store: Store<S>,
    rules: RuleSynchronizer<R>,
    seeds: SeedLoader<L>,
}

impl<S, R, L> MessageRouter<S, R, L>
where
    S: KeyValueStore,
    R: RuleApi,
    L: SeedSource,
{
    pub fn new(store: S, rules: R, seeds: L, config: FilterConfig) -> Self {
        Self {
            store: Store::new(store),
            rules: RuleSynchronizer::new(rules, config),
            seeds: SeedLoader::new(seeds),
        }
    }

    pub fn store(&self) -> &Store<S> {
        &self.store
    }

    pub fn synchronizer(&self) -> &RuleSynchronizer<R> {
        &self.rules
    }

    pub fn config(&self) -> &FilterConfig {
        self.rules.config()
    }

    /// Handle a raw message. Never fails: every error becomes an
    /// `{ok: false, error}` envelope.
    pub async fn handle(&self, message: &Value) -> Response {
        let request = match Request::from_value(message) {
            Ok(request) => request,
            Err(e) => {
                log::debug!("Rejected message: {}", e);
                return Response::failure(e.to_string());
            }
        };

        let kind = request.kind();
        let result = self.dispatch(request).await;
        if let Err(e) = &result {
            if e.is_validation() {
                log::debug!("{} rejected: {}", kind, e);
            } else {
                log::error!("{} failed: {}", kind, e);
            }
        }

        Response::from(result)
    }

    /// Handle a parsed request, returning the `data` payload.
    pub async fn dispatch(&self, request: Request) -> Result<Value, WorkerError> {
        match request {
            Request::GetState => to_data(&self.get_state().await?),
            Request::AddSite { domain } => to_data(&self.add_site(&domain).await?),
            Request::RemoveSite { domain } => to_data(&self.remove_site(&domain).await?),
            Request::GetUrlKeywordToggle => to_data(&ToggleData {
                enabled: self.store.url_keyword_blocking().await?,
                message: None,
            }),
            Request::SetUrlKeywordToggle { enabled } => to_data(&self.set_url_keyword_toggle(enabled).await?),
            Request::GetKeywords => to_data(&KeywordsData {
                keywords: self.seeds.keywords().await,
            }),
            Request::ContentBlocked { url, keyword } => {
                to_data(&self.content_blocked(url.as_deref(), keyword.as_deref()).await?)
            }
            Request::GetNotes => to_data(&NotesData {
                notes: self.store.notes().await?,
            }),
            Request::AddNote { text } => to_data(&NotesData {
                notes: self.store.add_note(&text).await?,
            }),
            Request::UpdateNote { index, text } => to_data(&NotesData {
                notes: self.store.update_note(index, &text).await?,
            }),
            Request::DeleteNote { index } => to_data(&NotesData {
                notes: self.store.delete_note(index).await?,
            }),
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Bring installed rules and the counter in line with storage. Run on
    /// install, on browser startup and whenever the popup asks for state.
    pub async fn ensure_initialized(&self) -> Result<SyncReport, WorkerError> {
        let user = self.store.user_blocklist().await?;
        let (_, report) = self.sync_with_user_list(&user).await?;
        self.store.total_blocked().await?;
        Ok(report)
    }

    /// Count a block reported by the browser's rule-match feedback. Rules
    /// below the id base belong to static rule sets and are ignored.
    pub async fn on_rule_matched(&self, rule_id: i64) -> Result<Option<u64>, WorkerError> {
        if rule_id < i64::from(self.config().rule_id_base) {
            return Ok(None);
        }
        let total = self.store.increment_total_blocked().await?;
        log::info!("Navigation blocked by rule {} (total {})", rule_id, total);
        Ok(Some(total))
    }

    /// Seed and user domains merged, deduplicated and sorted.
    pub async fn blocklist(&self) -> Result<Vec<String>, WorkerError> {
        let user = self.store.user_blocklist().await?;
        let seed = self.seeds.blocklist().await;
        Ok(merge_blocklists(&seed, &user).0)
    }

    /// Keywords that are currently in effect: the seed keywords when keyword
    /// blocking is on, nothing otherwise.
    pub async fn active_keywords(&self) -> Result<Vec<String>, WorkerError> {
        if self.store.url_keyword_blocking().await? {
            Ok(self.seeds.keywords().await)
        } else {
            Ok(Vec::new())
        }
    }

    /// Merge seeds with `user`, sync rules and return the merged list.
    async fn sync_with_user_list(&self, user: &[String]) -> Result<(Vec<String>, SyncReport), WorkerError> {
        let seed = self.seeds.blocklist().await;
        let (merged, stats) = merge_blocklists(&seed, user);
        if stats.duplicates > 0 {
            log::debug!("{} user domains already covered by seeds", stats.duplicates);
        }

        let keywords = self.active_keywords().await?;
        let report = self.rules.sync(&merged, &keywords).await?;
        Ok((merged, report))
    }

    // =========================================================================
    // Handlers
    // =========================================================================

    async fn get_state(&self) -> Result<StateData, WorkerError> {
        self.ensure_initialized().await?;

        let user_blocklist = self.store.user_blocklist().await?;
        let seed = self.seeds.blocklist().await;
        let (blocklist, _) = merge_blocklists(&seed, &user_blocklist);

        Ok(StateData {
            total_blocked: self.store.total_blocked().await?,
            blocklist,
            user_blocklist,
            url_keyword_blocking: self.store.url_keyword_blocking().await?,
        })
    }

    async fn add_site(&self, raw: &str) -> Result<SiteAdded, WorkerError> {
        let domain = normalize_domain(raw).ok_or_else(|| WorkerError::InvalidDomain(raw.to_string()))?;

        let mut user = self.store.user_blocklist().await?;
        if !user.contains(&domain) {
            user.push(domain.clone());
        }
        let user_blocklist = self.store.set_user_blocklist(user).await?;
        let (blocklist, _) = self.sync_with_user_list(&user_blocklist).await?;

        log::info!("Added {} to the user blocklist", domain);
        Ok(SiteAdded {
            added: domain,
            user_blocklist,
            blocklist,
        })
    }

    async fn remove_site(&self, raw: &str) -> Result<SiteRemoved, WorkerError> {
        let domain = normalize_domain(raw).ok_or_else(|| WorkerError::InvalidDomain(raw.to_string()))?;

        let user = self.store.user_blocklist().await?;
        let user_blocklist = self
            .store
            .set_user_blocklist(user.into_iter().filter(|d| *d != domain))
            .await?;
        let (blocklist, _) = self.sync_with_user_list(&user_blocklist).await?;

        log::info!("Removed {} from the user blocklist", domain);
        Ok(SiteRemoved {
            removed: domain,
            user_blocklist,
            blocklist,
        })
    }

    async fn set_url_keyword_toggle(&self, enabled: bool) -> Result<ToggleData, WorkerError> {
        self.store.set_url_keyword_blocking(enabled).await?;
        self.ensure_initialized().await?;

        let message = if enabled {
            "URL keyword blocking enabled"
        } else {
            "URL keyword blocking disabled"
        };
        Ok(ToggleData {
            enabled,
            message: Some(message.to_string()),
        })
    }

    async fn content_blocked(&self, url: Option<&str>, keyword: Option<&str>) -> Result<BlockedData, WorkerError> {
        let total_blocked = self.store.increment_total_blocked().await?;
        log::info!(
            "Content blocked on {} (keyword: {}, total {})",
            url.unwrap_or("-"),
            keyword.unwrap_or("-"),
            total_blocked
        );

        let mut params = InterstitialParams::new(BlockReason::Content);
        if let Some(keyword) = keyword {
            params = params.with_keyword(keyword);
        }
        if let Some(url) = url {
            params = params.with_url(url);
        }

        Ok(BlockedData {
            total_blocked,
            redirect: interstitial_url(&self.config().interstitial_path, &params),
        })
    }
}

fn to_data<T: Serialize>(data: &T) -> Result<Value, WorkerError> {
    Ok(serde_json::to_value(data)?)
}
