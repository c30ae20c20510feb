use std::collections::BTreeSet;

pub struct MergeStats {
    pub seed: usize,
    pub user: usize,
    pub merged: usize,
    pub duplicates: usize,
}

/// Union of seed and user domains, deduplicated and sorted.
pub fn merge_blocklists(seed: &[String], user: &[String]) -> (Vec<String>, MergeStats) {
    let merged = dedupe_sorted(seed.iter().chain(user.iter()).cloned());

    let stats = MergeStats {
        seed: seed.len(),
        user: user.len(),
        merged: merged.len(),
        duplicates: seed.len() + user.len() - merged.len(),
    };

    (merged, stats)
}

pub fn dedupe_sorted<I>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    values.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}
