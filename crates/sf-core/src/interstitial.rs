//! Interstitial page URL
//!
//! The interstitial page reads `reason`, `keyword` and `url` from its query
//! string to tell the user what was blocked.

use url::form_urlencoded;

use crate::types::BlockReason;

/// Parameters displayed by the interstitial page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterstitialParams {
    pub reason: BlockReason,
    pub keyword: Option<String>,
    pub url: Option<String>,
}

impl InterstitialParams {
    pub fn new(reason: BlockReason) -> Self {
        Self {
            reason,
            keyword: None,
            url: None,
        }
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into()).filter(|k: &String| !k.is_empty());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into()).filter(|u: &String| !u.is_empty());
        self
    }

    /// Encode as a query string without the leading `?`.
    pub fn to_query(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair("reason", self.reason.as_str());
        if let Some(keyword) = &self.keyword {
            query.append_pair("keyword", keyword);
        }
        if let Some(url) = &self.url {
            query.append_pair("url", url);
        }
        query.finish()
    }

    /// Decode from a query string, with or without the leading `?`.
    ///
    /// A missing or unrecognized `reason` reads as [`BlockReason::Content`];
    /// empty values read as absent.
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut params = Self::new(BlockReason::Content);

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "reason" => {
                    if let Some(reason) = BlockReason::from_name(&value) {
                        params.reason = reason;
                    }
                }
                "keyword" if !value.is_empty() => params.keyword = Some(value.into_owned()),
                "url" if !value.is_empty() => params.url = Some(value.into_owned()),
                _ => {}
            }
        }

        params
    }
}

/// Full interstitial target: `path?reason=..[&keyword=..][&url=..]`.
pub fn interstitial_url(path: &str, params: &InterstitialParams) -> String {
    format!("{}?{}", path, params.to_query())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interstitial_url_encodes_values() {
        let params = InterstitialParams::new(BlockReason::Keyword)
            .with_keyword("bad word")
            .with_url("https://example.com/a?b=c&d=e");
        let url = interstitial_url("/safe.html", &params);
        assert_eq!(
            url,
            "/safe.html?reason=keyword&keyword=bad+word&url=https%3A%2F%2Fexample.com%2Fa%3Fb%3Dc%26d%3De"
        );
    }

    #[test]
    fn test_from_query_reads_back() {
        let params = InterstitialParams::new(BlockReason::Domain).with_url("https://x.com/");
        let parsed = InterstitialParams::from_query(&format!("?{}", params.to_query()));
        assert_eq!(parsed, params);
    }

    #[test]
    fn test_from_query_defaults() {
        let parsed = InterstitialParams::from_query("");
        assert_eq!(parsed.reason, BlockReason::Content);
        assert_eq!(parsed.keyword, None);
        assert_eq!(parsed.url, None);

        let parsed = InterstitialParams::from_query("reason=bogus&keyword=");
        assert_eq!(parsed.reason, BlockReason::Content);
        assert_eq!(parsed.keyword, None);
    }

    #[test]
    fn test_empty_keyword_is_dropped() {
        let params = InterstitialParams::new(BlockReason::Content).with_keyword("");
        assert_eq!(params.to_query(), "reason=content");
    }
}
