use std::fs;
use std::path::Path;
use std::time::Instant;

use sf_compiler::{build_rules, merge_blocklists, parse_domain_list, parse_keyword_list, parse_seed_domains, parse_seed_keywords, ParsedList, RuleSet};
use sf_core::config::FilterConfig;

#[derive(Debug, Clone, Default)]
pub struct CompileStats {
    pub lines: usize,
    pub rejected: usize,
    pub domains: usize,
    pub duplicates: usize,
    pub keywords: usize,
    pub total_ms: f64,
}

/// Inputs to a rule compilation.
#[derive(Debug, Clone, Default)]
pub struct CompileInputs {
    /// JSON seed domain arrays
    pub seeds: Vec<String>,
    /// Plain, hosts-file or `||domain^` lists
    pub lists: Vec<String>,
    /// Keyword files, JSON arrays or one keyword per line
    pub keywords: Vec<String>,
}

fn file_label(path: &str) -> String {
    Path::new(path).file_name().unwrap_or_default().to_string_lossy().into_owned()
}

fn read_list(path: &str, json: bool, keywords: bool) -> Result<ParsedList, String> {
    let content = fs::read_to_string(path).map_err(|e| format!("Failed to read '{}': {}", path, e))?;
    let parsed = match (json, keywords) {
        (true, false) => parse_seed_domains(&content),
        (true, true) => parse_seed_keywords(&content),
        (false, false) => Ok(parse_domain_list(&content)),
        (false, true) => Ok(parse_keyword_list(&content)),
    };
    parsed.map_err(|e| format!("Failed to parse '{}': {}", path, e))
}

fn looks_like_json(path: &str) -> bool {
    Path::new(path).extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

pub fn compile_rules(
    inputs: &CompileInputs,
    config: &FilterConfig,
    verbose: bool,
) -> Result<(RuleSet, CompileStats), String> {
    if inputs.seeds.is_empty() && inputs.lists.is_empty() && inputs.keywords.is_empty() {
        return Err("No input files specified".to_string());
    }

    let start = Instant::now();
    let mut stats = CompileStats::default();

    let mut collect = |path: &str, json: bool, keywords: bool, into: &mut Vec<String>| -> Result<(), String> {
        let parsed = read_list(path, json, keywords)?;
        if verbose {
            println!(
                "  {} - {} lines, {} entries, {} rejected",
                file_label(path),
                parsed.lines,
                parsed.values.len(),
                parsed.rejected
            );
        }
        stats.lines += parsed.lines;
        stats.rejected += parsed.rejected;
        into.extend(parsed.values);
        Ok(())
    };

    let mut seed = Vec::new();
    for path in &inputs.seeds {
        collect(path, true, false, &mut seed)?;
    }
    let mut listed = Vec::new();
    for path in &inputs.lists {
        collect(path, false, false, &mut listed)?;
    }
    let mut keywords = Vec::new();
    for path in &inputs.keywords {
        collect(path, looks_like_json(path), true, &mut keywords)?;
    }

    let (domains, merge) = merge_blocklists(&seed, &listed);
    let (keywords, _) = merge_blocklists(&keywords, &[]);
    stats.domains = domains.len();
    stats.duplicates = merge.duplicates;
    stats.keywords = keywords.len();

    let rule_set = build_rules(&domains, &keywords, config).map_err(|e| e.to_string())?;
    stats.total_ms = start.elapsed().as_secs_f64() * 1000.0;

    Ok((rule_set, stats))
}

pub fn write_rules(path: &Path, rule_set: &RuleSet) -> Result<(), String> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| format!("Failed to create '{}': {}", parent.display(), e))?;
    }
    let json = serde_json::to_string_pretty(&rule_set.rules).map_err(|e| e.to_string())?;
    fs::write(path, json).map_err(|e| format!("Failed to write '{}': {}", path.display(), e))
}
