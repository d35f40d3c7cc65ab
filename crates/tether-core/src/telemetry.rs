//! Token-usage extraction.
//!
//! Two independent sources that are never merged into one pass: the
//! structured usage object on terminal `result` envelopes, and heuristic
//! pattern matches over free text from the stderr channel.

use once_cell::sync::Lazy;
use regex::Regex;
use tether_types::{ResultUsage, TokenUsage};

#[derive(Debug, Clone, Copy)]
enum UsageField {
    Input,
    Output,
    CacheCreation,
    CacheRead,
}

/// Counter patterns searched independently over stderr text.
const USAGE_PATTERNS: &[(UsageField, &str)] = &[
    (UsageField::Input, r"(?i)Input tokens?:\s*(\d+)"),
    (UsageField::Output, r"(?i)Output tokens?:\s*(\d+)"),
    (UsageField::CacheCreation, r"(?i)Cache creation input tokens?:\s*(\d+)"),
    (UsageField::CacheRead, r"(?i)Cache read input tokens?:\s*(\d+)"),
];

static USAGE_REGEXES: Lazy<Vec<(UsageField, Regex)>> = Lazy::new(|| {
    USAGE_PATTERNS
        .iter()
        .map(|(field, pattern)| (*field, Regex::new(pattern).unwrap()))
        .collect()
});

/// Scan free text for token counters. Fields whose pattern did not match
/// stay absent; returns `None` when nothing matched at all.
pub fn scan_usage(text: &str) -> Option<TokenUsage> {
    let mut usage = TokenUsage::default();

    for (field, regex) in USAGE_REGEXES.iter() {
        if let Some(caps) = regex.captures(text) {
            if let Ok(count) = caps[1].parse::<u64>() {
                match field {
                    UsageField::Input => usage.input_tokens = Some(count),
                    UsageField::Output => usage.output_tokens = Some(count),
                    UsageField::CacheCreation => usage.cache_creation_input_tokens = Some(count),
                    UsageField::CacheRead => usage.cache_read_input_tokens = Some(count),
                }
            }
        }
    }

    if usage.is_empty() { None } else { Some(usage) }
}

/// Read the four counters off a result envelope's usage object. Missing
/// sub-keys were zero-filled at decode time, so every field comes back
/// present here — unlike the stderr path, where unmatched fields stay
/// absent.
pub fn usage_from_result(usage: &ResultUsage) -> TokenUsage {
    TokenUsage {
        input_tokens: Some(usage.input_tokens),
        output_tokens: Some(usage.output_tokens),
        cache_creation_input_tokens: Some(usage.cache_creation_input_tokens),
        cache_read_input_tokens: Some(usage.cache_read_input_tokens),
    }
}
