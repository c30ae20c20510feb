//! Packaged seed lists
//!
//! Seed files are re-read on every request. A missing or unparsable file
//! degrades to an empty list so the user's own list keeps working.

use sf_compiler::{dedupe_sorted, parse_seed_domains, parse_seed_keywords, ParsedList};

use crate::host::{SeedKind, SeedSource};

pub struct SeedLoader<L> {
    source: L,
}

impl<L: SeedSource> SeedLoader<L> {
    pub fn new(source: L) -> Self {
        Self { source }
    }

    /// Seed domains, normalized, deduplicated and sorted.
    pub async fn blocklist(&self) -> Vec<String> {
        self.load(SeedKind::Blocklist).await
    }

    /// Seed keywords, normalized, deduplicated and sorted.
    pub async fn keywords(&self) -> Vec<String> {
        self.load(SeedKind::Keywords).await
    }

    async fn load(&self, kind: SeedKind) -> Vec<String> {
        let text = match self.source.read_seed(kind).await {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Seed {:?} unavailable, using empty list: {}", kind, e);
                return Vec::new();
            }
        };

        let parsed = match kind {
            SeedKind::Blocklist => parse_seed_domains(&text),
            SeedKind::Keywords => parse_seed_keywords(&text),
        };

        match parsed {
            Ok(ParsedList { values, rejected, .. }) => {
                if rejected > 0 {
                    log::warn!("Seed {:?}: skipped {} invalid entries", kind, rejected);
                }
                dedupe_sorted(values)
            }
            Err(e) => {
                log::warn!("Seed {:?} unreadable, using empty list: {}", kind, e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::StaticSeeds;

    #[tokio::test]
    async fn test_seed_lists_are_normalized() {
        let loader = SeedLoader::new(StaticSeeds::new(
            r#"["b.com", "WWW.A.com", "b.com", "bogus"]"#,
            r#"["Casino", "casino", "Bet!"]"#,
        ));

        assert_eq!(loader.blocklist().await, vec!["a.com", "b.com"]);
        assert_eq!(loader.keywords().await, vec!["bet", "casino"]);
    }

    #[tokio::test]
    async fn test_missing_seed_is_empty() {
        let loader = SeedLoader::new(StaticSeeds::missing());
        assert!(loader.blocklist().await.is_empty());
        assert!(loader.keywords().await.is_empty());
    }

    #[tokio::test]
    async fn test_broken_seed_is_empty() {
        let loader = SeedLoader::new(StaticSeeds::new("not json", "{}"));
        assert!(loader.blocklist().await.is_empty());
        assert!(loader.keywords().await.is_empty());
    }
}
