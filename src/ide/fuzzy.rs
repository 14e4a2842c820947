//! Fuzzy key matching and ranking for completion.

/// Maximum number of ranked keys returned.
pub const MAX_RESULTS: usize = 50;

/// Minimum partial length for subsequence matching.
const MIN_SUBSEQUENCE_LEN: usize = 2;

/// How a key matched the partial input. Earlier variants rank higher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatchKind {
    Exact,
    Prefix,
    Substring,
    /// A `.`-separated segment starts with the partial.
    Hierarchical,
    Subsequence,
}

impl MatchKind {
    /// Base sort weight (lower ranks higher).
    #[must_use]
    pub const fn base_weight(self) -> u32 {
        match self {
            Self::Exact => 10,
            Self::Prefix => 20,
            Self::Substring | Self::Hierarchical => 30,
            Self::Subsequence => 40,
        }
    }
}

/// A key accepted by [`rank_keys`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankedKey<'k> {
    pub key: &'k str,
    pub kind: MatchKind,
    /// Sort weight in tenths: `base * 10 + min(len, 100)`.
    pub weight: u32,
}

impl RankedKey<'_> {
    /// Text for the LSP `sortText` field; orders like `weight`.
    #[must_use]
    pub fn sort_text(&self) -> String {
        format!("{:04}_{}", self.weight, self.key)
    }
}

/// Classifies `key` against a lowercased partial. `None` if it does not match.
#[must_use]
pub fn match_key(key: &str, partial_lower: &str) -> Option<MatchKind> {
    let key_lower = key.to_lowercase();

    if key_lower == partial_lower {
        Some(MatchKind::Exact)
    } else if key_lower.starts_with(partial_lower) {
        Some(MatchKind::Prefix)
    } else if key_lower.contains(partial_lower) {
        Some(MatchKind::Substring)
    } else if !partial_lower.is_empty()
        && key_lower.split('.').any(|segment| segment.starts_with(partial_lower))
    {
        Some(MatchKind::Hierarchical)
    } else if partial_lower.chars().count() >= MIN_SUBSEQUENCE_LEN
        && is_subsequence(partial_lower, &key_lower)
    {
        Some(MatchKind::Subsequence)
    } else {
        None
    }
}

/// Filters and orders `keys` for the partial input.
///
/// Lower weight first; equal weights keep the order of `keys`. At most
/// [`MAX_RESULTS`] keys are returned.
#[must_use]
pub fn rank_keys<'k>(partial: &str, keys: &'k [String]) -> Vec<RankedKey<'k>> {
    let partial_lower = partial.to_lowercase();

    let mut ranked: Vec<RankedKey<'k>> = keys
        .iter()
        .filter_map(|key| {
            let kind = match_key(key, &partial_lower)?;
            Some(RankedKey { key: key.as_str(), kind, weight: weight(kind, key) })
        })
        .collect();

    ranked.sort_by_key(|ranked| ranked.weight);
    ranked.truncate(MAX_RESULTS);
    ranked
}

/// Base weight plus a nudge toward shorter keys, capped at 10.
#[allow(clippy::cast_possible_truncation)] // min(_, 100) に収まる
fn weight(kind: MatchKind, key: &str) -> u32 {
    kind.base_weight() * 10 + key.chars().count().min(100) as u32
}

/// Every char of `needle` appears in `haystack`, in order.
fn is_subsequence(needle: &str, haystack: &str) -> bool {
    let mut remaining = haystack.chars();
    needle.chars().all(|wanted| remaining.any(|ch| ch == wanted))
}
