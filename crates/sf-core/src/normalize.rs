//! Canonical domain and keyword strings
//!
//! Everything that enters the blocklist (popup input, seed files, stored
//! values) passes through these functions. Both are pure and idempotent:
//! feeding a normalized value back in returns it unchanged.

/// Normalize raw input into a bare hostname.
///
/// Strips a leading `*.` wildcard, an `http://`/`https://` scheme, any path
/// or port, a leading `www.` and trailing dots. Returns `None` if nothing is
/// left, the result contains characters outside `[a-z0-9.-]`, or it has no
/// dot.
pub fn normalize_domain(input: &str) -> Option<String> {
    let lowered = input.trim().to_lowercase();
    if lowered.is_empty() {
        return None;
    }

    // Strip until nothing changes so that stacked prefixes such as
    // "*.www.example.com" come out the same as a second pass would.
    let mut host = lowered.as_str();
    loop {
        let next = strip_host_decorations(host);
        if next.len() == host.len() {
            break;
        }
        host = next;
    }

    if host.is_empty() || !is_hostname_charset(host) || !host.contains('.') {
        return None;
    }

    Some(host.to_string())
}

/// One pass of prefix/suffix stripping.
fn strip_host_decorations(s: &str) -> &str {
    let s = s.strip_prefix("*.").unwrap_or(s);
    let s = s
        .strip_prefix("https://")
        .or_else(|| s.strip_prefix("http://"))
        .unwrap_or(s);
    let s = match s.find('/') {
        Some(pos) => &s[..pos],
        None => s,
    };
    let s = match s.find(':') {
        Some(pos) => &s[..pos],
        None => s,
    };
    let s = s.strip_prefix("www.").unwrap_or(s);
    s.trim_end_matches('.')
}

/// Check that every byte is in `[a-z0-9.-]`.
#[inline]
pub fn is_hostname_charset(s: &str) -> bool {
    s.bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'.' || b == b'-')
}

/// Check whether a string is already a canonical domain.
pub fn is_valid_domain(s: &str) -> bool {
    normalize_domain(s).as_deref() == Some(s)
}

/// Normalize arbitrary text into a keyword.
///
/// Lowercases, drops everything except `[a-z0-9-]` and whitespace, then
/// collapses whitespace runs into single spaces. Returns `None` if the
/// result is empty.
pub fn normalize_keyword(input: &str) -> Option<String> {
    let filtered: String = input
        .to_lowercase()
        .chars()
        .filter_map(|c| {
            if c.is_whitespace() {
                Some(' ')
            } else if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
                Some(c)
            } else {
                None
            }
        })
        .collect();

    let collapsed = filtered.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return None;
    }

    Some(collapsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_domain_strips_decorations() {
        assert_eq!(
            normalize_domain("https://WWW.Example.com/path:80"),
            Some("example.com".to_string())
        );
        assert_eq!(normalize_domain("*.example.com"), Some("example.com".to_string()));
        assert_eq!(normalize_domain("http://example.com:8080"), Some("example.com".to_string()));
        assert_eq!(normalize_domain("example.com..."), Some("example.com".to_string()));
        assert_eq!(normalize_domain("  sub.Example.org  "), Some("sub.example.org".to_string()));
    }

    #[test]
    fn test_normalize_domain_rejects() {
        assert_eq!(normalize_domain("not a domain"), None);
        assert_eq!(normalize_domain(""), None);
        assert_eq!(normalize_domain("   "), None);
        assert_eq!(normalize_domain("localhost"), None);
        assert_eq!(normalize_domain("https://"), None);
        assert_eq!(normalize_domain("user@example.com"), None);
        assert_eq!(normalize_domain("exa_mple.com"), None);
    }

    #[test]
    fn test_normalize_domain_stacked_prefixes() {
        assert_eq!(normalize_domain("www.www.example.com"), Some("example.com".to_string()));
        assert_eq!(normalize_domain("*.www.example.com"), Some("example.com".to_string()));
        assert_eq!(normalize_domain("https://*.example.com"), Some("example.com".to_string()));
    }

    #[test]
    fn test_normalize_domain_idempotent() {
        let inputs = [
            "https://WWW.Example.com/path:80",
            "*.www.example.com",
            "example.com.",
            "a-b.c-d.example.co.uk",
            ".example.com",
            "http://www.x.io:443/q?x=1",
            "www.www.www.nested.net",
        ];
        for input in inputs {
            let once = normalize_domain(input).expect("valid input");
            assert_eq!(normalize_domain(&once), Some(once.clone()), "input {input}");
            assert!(is_valid_domain(&once));
        }
    }

    #[test]
    fn test_normalize_keyword() {
        assert_eq!(normalize_keyword("  Bad!! Word  "), Some("bad word".to_string()));
        assert_eq!(normalize_keyword("multi\t\nline   text"), Some("multi line text".to_string()));
        assert_eq!(normalize_keyword("x-rated"), Some("x-rated".to_string()));
        assert_eq!(normalize_keyword("a ! b"), Some("a b".to_string()));
        assert_eq!(normalize_keyword("!!!"), None);
        assert_eq!(normalize_keyword(""), None);
    }

    #[test]
    fn test_normalize_keyword_idempotent() {
        for input in ["  Bad!! Word  ", "a ! b", "Ünïcode wörd", "tab\tsep"] {
            if let Some(once) = normalize_keyword(input) {
                assert_eq!(normalize_keyword(&once), Some(once.clone()));
            }
        }
    }
}
