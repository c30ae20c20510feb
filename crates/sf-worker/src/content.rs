//! Navigation checks for the content side
//!
//! The network rules catch most blocked navigations; this check covers pages
//! reached without a top-level request (history navigation, prerendered
//! pages) and decides where to send them.

use std::future::Future;

use sf_core::interstitial::{interstitial_url, InterstitialParams};
use sf_core::types::BlockReason;
use sf_core::url::{extract_host, is_web_url, strip_www};

use crate::error::WorkerError;
use crate::host::{KeyValueStore, RuleApi, SeedSource};
use crate::router::MessageRouter;

/// Why a URL should be redirected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockVerdict {
    pub reason: BlockReason,
    pub keyword: Option<String>,
}

impl BlockVerdict {
    /// Interstitial URL for `page_url` under `interstitial_path`.
    pub fn redirect_url(&self, interstitial_path: &str, page_url: &str) -> String {
        let mut params = InterstitialParams::new(self.reason).with_url(page_url);
        if let Some(keyword) = &self.keyword {
            params = params.with_keyword(keyword.as_str());
        }
        interstitial_url(interstitial_path, &params)
    }
}

/// Keyword list held for the duration of one evaluation.
///
/// Created empty, filled by the first lookup, and emptied by
/// [`invalidate`](Self::invalidate) whenever the keyword toggle or seed
/// changes. Nothing outlives the owner.
#[derive(Debug, Default)]
pub struct KeywordCache {
    keywords: Option<Vec<String>>,
}

impl KeywordCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self) -> bool {
        self.keywords.is_some()
    }

    pub fn invalidate(&mut self) {
        self.keywords = None;
    }

    /// Cached keywords, running `load` only if nothing is cached.
    pub async fn get_or_load<F, Fut, E>(&mut self, load: F) -> Result<&[String], E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<String>, E>>,
    {
        if self.keywords.is_none() {
            self.keywords = Some(load().await?);
        }
        Ok(self.keywords.as_deref().unwrap_or(&[]))
    }
}

/// Decide whether `url` should be blocked.
///
/// `blocklist` must be sorted. The host (minus a leading `www.`) matches an
/// entry if it equals it or is a subdomain of it, the same reach as the
/// `||domain^` network rules. Keywords match as lowercase substrings of the
/// whole URL. Non-web URLs are never blocked.
pub fn evaluate_url(url: &str, blocklist: &[String], keywords: &[String]) -> Option<BlockVerdict> {
    if !is_web_url(url) {
        return None;
    }

    let host = extract_host(url).map(|h| strip_www(h.trim_end_matches('.')).to_ascii_lowercase())?;
    if host_is_listed(&host, blocklist) {
        return Some(BlockVerdict {
            reason: BlockReason::Domain,
            keyword: None,
        });
    }

    let lowered = url.to_lowercase();
    keywords
        .iter()
        .find(|keyword| !keyword.is_empty() && lowered.contains(keyword.as_str()))
        .map(|keyword| BlockVerdict {
            reason: BlockReason::Keyword,
            keyword: Some(keyword.clone()),
        })
}

fn host_is_listed(host: &str, blocklist: &[String]) -> bool {
    let mut candidate = host;
    loop {
        if blocklist.binary_search_by(|d| d.as_str().cmp(candidate)).is_ok() {
            return true;
        }
        match candidate.find('.') {
            Some(pos) => candidate = &candidate[pos + 1..],
            None => return false,
        }
    }
}

/// Evaluate a navigation against current storage.
///
/// Keywords are only consulted (and only loaded into `cache`) when keyword
/// blocking is on and the domain check did not already match.
pub async fn check_navigation<S, R, L>(
    router: &MessageRouter<S, R, L>,
    url: &str,
    cache: &mut KeywordCache,
) -> Result<Option<BlockVerdict>, WorkerError>
where
    S: KeyValueStore,
    R: RuleApi,
    L: SeedSource,
{
    let blocklist = router.blocklist().await?;
    if let Some(verdict) = evaluate_url(url, &blocklist, &[]) {
        return Ok(Some(verdict));
    }

    if !router.store().url_keyword_blocking().await? {
        cache.invalidate();
        return Ok(None);
    }

    let keywords = cache.get_or_load(|| router.active_keywords()).await?;
    Ok(evaluate_url(url, &[], keywords))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryRuleApi, MemoryStore, StaticSeeds};
    use sf_core::config::FilterConfig;
    use std::cell::Cell;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_evaluate_domain() {
        let blocklist = strings(&["bad.com", "evil.org"]);
        let verdict = evaluate_url("https://www.bad.com/page", &blocklist, &[]).unwrap();
        assert_eq!(verdict.reason, BlockReason::Domain);

        assert!(evaluate_url("https://cdn.evil.org/x.js", &blocklist, &[]).is_some());
        assert!(evaluate_url("https://notbad.com/", &blocklist, &[]).is_none());
        assert!(evaluate_url("https://good.com/?ref=bad.com", &blocklist, &[]).is_none());
    }

    #[test]
    fn test_evaluate_fully_qualified_host() {
        let blocklist = strings(&["bad.com"]);
        assert!(evaluate_url("https://bad.com./", &blocklist, &[]).is_some());
        assert!(evaluate_url("https://WWW.Bad.Com.:443/x", &blocklist, &[]).is_some());
    }

    #[test]
    fn test_evaluate_keyword() {
        let keywords = strings(&["casino"]);
        let verdict = evaluate_url("https://news.com/Online-CASINO-review", &[], &keywords).unwrap();
        assert_eq!(verdict.reason, BlockReason::Keyword);
        assert_eq!(verdict.keyword.as_deref(), Some("casino"));
    }

    #[test]
    fn test_evaluate_skips_extension_pages() {
        let blocklist = strings(&["bad.com"]);
        assert!(evaluate_url("chrome-extension://id/safe.html?url=https://bad.com", &blocklist, &[]).is_none());
        assert!(evaluate_url("about:blank", &blocklist, &strings(&["blank"])).is_none());
    }

    #[test]
    fn test_verdict_redirect_url() {
        let verdict = BlockVerdict {
            reason: BlockReason::Keyword,
            keyword: Some("poker".to_string()),
        };
        assert_eq!(
            verdict.redirect_url("/safe.html", "https://a.com/"),
            "/safe.html?reason=keyword&keyword=poker&url=https%3A%2F%2Fa.com%2F"
        );
    }

    #[tokio::test]
    async fn test_keyword_cache_loads_once() {
        let loads = Cell::new(0);
        let mut cache = KeywordCache::new();
        let counter = &loads;
        let load = move || async move {
            counter.set(counter.get() + 1);
            Ok::<_, ()>(strings(&["a"]))
        };

        assert_eq!(cache.get_or_load(load).await.unwrap(), &["a".to_string()]);
        assert_eq!(cache.get_or_load(load).await.unwrap(), &["a".to_string()]);
        assert_eq!(loads.get(), 1);

        cache.invalidate();
        assert!(!cache.is_loaded());
        cache.get_or_load(load).await.unwrap();
        assert_eq!(loads.get(), 2);
    }

    #[tokio::test]
    async fn test_check_navigation_follows_toggle() {
        let router = MessageRouter::new(
            MemoryStore::new(),
            MemoryRuleApi::new(),
            StaticSeeds::new(r#"["seed.com"]"#, r#"["casino"]"#),
            FilterConfig::default(),
        );
        let mut cache = KeywordCache::new();

        let verdict = check_navigation(&router, "https://seed.com/", &mut cache).await.unwrap();
        assert_eq!(verdict.map(|v| v.reason), Some(BlockReason::Domain));

        let url = "https://games.net/casino";
        assert_eq!(check_navigation(&router, url, &mut cache).await.unwrap(), None);
        assert!(!cache.is_loaded());

        router.store().set_url_keyword_blocking(true).await.unwrap();
        let verdict = check_navigation(&router, url, &mut cache).await.unwrap().unwrap();
        assert_eq!(verdict.reason, BlockReason::Keyword);
        assert!(cache.is_loaded());

        router.store().set_url_keyword_blocking(false).await.unwrap();
        assert_eq!(check_navigation(&router, url, &mut cache).await.unwrap(), None);
        assert!(!cache.is_loaded());
    }
}
