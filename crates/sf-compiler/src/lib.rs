//! Steadfast Rule Compiler
//!
//! This crate turns seed files and user lists into the declarative rule set
//! the browser evaluates for top-level navigations.

pub mod builder;
pub mod merge;
pub mod parser;

pub use builder::{build_rules, domain_url_filter, keyword_url_filter, BuildError, RuleSet};
pub use merge::{dedupe_sorted, merge_blocklists, MergeStats};
pub use parser::{parse_domain_list, parse_keyword_list, parse_seed_domains, parse_seed_keywords, ParseError, ParsedList};
