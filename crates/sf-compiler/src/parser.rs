use std::net::IpAddr;

use sf_core::normalize::{normalize_domain, normalize_keyword};

/// Error type for seed parsing.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid JSON list: {0}")]
    Json(#[from] serde_json::Error),
}

/// Values accepted from a list, with line accounting for reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedList {
    pub values: Vec<String>,
    pub lines: usize,
    pub rejected: usize,
}

/// Parse a packaged seed domain list (JSON array of strings).
pub fn parse_seed_domains(text: &str) -> Result<ParsedList, ParseError> {
    parse_json_list(text, normalize_domain)
}

/// Parse a packaged seed keyword list (JSON array of strings).
pub fn parse_seed_keywords(text: &str) -> Result<ParsedList, ParseError> {
    parse_json_list(text, normalize_keyword)
}

/// A JSON value that is not an array yields an empty list. Non-string
/// elements and values the normalizer rejects are counted and skipped.
fn parse_json_list(text: &str, normalize: fn(&str) -> Option<String>) -> Result<ParsedList, ParseError> {
    let value: serde_json::Value = serde_json::from_str(text)?;

    let items = match value.as_array() {
        Some(items) => items,
        None => {
            log::warn!("Seed list is not a JSON array; treating it as empty");
            return Ok(ParsedList::default());
        }
    };

    let mut parsed = ParsedList {
        lines: items.len(),
        ..ParsedList::default()
    };

    for item in items {
        match item.as_str().and_then(normalize) {
            Some(value) => parsed.values.push(value),
            None => parsed.rejected += 1,
        }
    }

    Ok(parsed)
}

/// Parse a plain-text domain list.
///
/// Accepts one entry per line in any of these forms:
/// - bare domains or URLs (`example.com`, `https://www.example.com/x`)
/// - hosts file lines (`0.0.0.0 example.com`)
/// - hostname-anchored filters (`||example.com^`)
///
/// Comment lines (`!`, `#`, `[`) and blank lines are skipped.
pub fn parse_domain_list(text: &str) -> ParsedList {
    let mut parsed = ParsedList::default();

    for raw_line in text.lines() {
        parsed.lines += 1;
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() || is_comment_line(line) {
            continue;
        }

        let domain = if let Some(domain) = parse_host_anchor_rule(line) {
            Some(domain)
        } else if let Some(entry) = parse_hosts_file_entry(line) {
            entry
        } else {
            normalize_domain(line)
        };

        match domain {
            Some(domain) if domain.parse::<IpAddr>().is_err() => parsed.values.push(domain),
            _ => parsed.rejected += 1,
        }
    }

    parsed
}

/// Parse a plain-text keyword list, one keyword per line.
pub fn parse_keyword_list(text: &str) -> ParsedList {
    let mut parsed = ParsedList::default();

    for raw_line in text.lines() {
        parsed.lines += 1;
        let line = raw_line.trim();
        if line.is_empty() || is_comment_line(line) {
            continue;
        }

        match normalize_keyword(line) {
            Some(keyword) => parsed.values.push(keyword),
            None => parsed.rejected += 1,
        }
    }

    parsed
}

fn is_comment_line(line: &str) -> bool {
    line.starts_with('!') || line.starts_with('[') || line.starts_with('#')
}

fn strip_inline_comment(line: &str) -> &str {
    match line.find(" #") {
        Some(pos) => &line[..pos],
        None => line,
    }
}

fn parse_host_anchor_rule(line: &str) -> Option<String> {
    let rest = line.strip_prefix("||")?;
    let rest = rest.strip_prefix('.').unwrap_or(rest);

    let mut end = rest.len();
    for (i, ch) in rest.char_indices() {
        if ch == '^' || ch == '|' || ch == '$' {
            end = i;
            break;
        }
        if ch == '/' || ch == '?' || ch == '#' || ch == ':' || ch == '*' {
            return None;
        }
    }

    normalize_domain(&rest[..end])
}

/// `Some(_)` when the line starts with an IP address, whether or not the
/// host part is usable.
fn parse_hosts_file_entry(line: &str) -> Option<Option<String>> {
    let mut parts = line.split_whitespace();
    let first = parts.next()?;
    if first.parse::<IpAddr>().is_err() {
        return None;
    }

    Some(parts.next().and_then(normalize_domain))
}
