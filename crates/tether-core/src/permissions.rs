//! Heuristic detection of permission prompts on the stderr channel.
//!
//! Best-effort classifier: the pattern list is data, ordered roughly from
//! specific to generic, and the first match in a chunk wins.

use once_cell::sync::Lazy;
use regex::Regex;

/// Sentinel tool name when no known identifier appears in the prompt.
pub const UNKNOWN_TOOL: &str = "Unknown";

/// Ordered prompt patterns: tool approval, file-operation confirmation,
/// command-execution confirmation, generic confirmation.
const PROMPT_PATTERNS: &[&str] = &[
    r"(?i)do you want to use",
    r"(?i)allow .{1,80} to use",
    r"(?i)permission to (?:use|run|execute|edit|write|read)",
    r"(?i)permission (?:needed|required|requested)",
    r"(?i)requires? (?:your )?(?:approval|permission)",
    r"(?i)do you want to (?:edit|write|create|delete|overwrite|read)",
    r"(?i)(?:apply|save) (?:these|this) changes?\?",
    r"(?i)do you want to (?:run|execute)",
    r"(?i)execute this command\?",
    r"(?i)do you want to (?:proceed|continue|make this edit)",
    r"(?i)would you like to",
    r"(?i)\((?:y/n|yes/no)\)",
    r"(?i)\[(?:y/n|yes/no)\]",
    r"(?i)press (?:y|enter) to (?:continue|confirm|approve)",
];

static PROMPT_REGEXES: Lazy<Vec<Regex>> = Lazy::new(|| {
    PROMPT_PATTERNS
        .iter()
        .map(|pattern| Regex::new(pattern).unwrap())
        .collect()
});

/// Known tool identifiers, canonical spelling.
const KNOWN_TOOLS: &[&str] = &[
    "Write", "Edit", "Read", "Bash", "Glob", "Grep", "Task", "Delete", "Create",
];

static TOOL_NAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(Write|Edit|Read|Bash|Glob|Grep|Task|Delete|Create)\b").unwrap()
});

/// A recognized permission prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptMatch {
    /// Canonical tool name, or [`UNKNOWN_TOOL`].
    pub tool_name: String,
    /// The raw text the prompt was found in, trimmed.
    pub matched: String,
}

/// Scan one stderr chunk for an authorization prompt. Scanning stops at
/// the first matching pattern; at most one match is reported per chunk.
pub fn detect_prompt(text: &str) -> Option<PromptMatch> {
    for regex in PROMPT_REGEXES.iter() {
        if regex.is_match(text) {
            let tool_name = TOOL_NAME_REGEX
                .find(text)
                .map(|m| canonical_tool(m.as_str()))
                .unwrap_or_else(|| UNKNOWN_TOOL.to_string());

            return Some(PromptMatch {
                tool_name,
                matched: text.trim().to_string(),
            });
        }
    }
    None
}

fn canonical_tool(found: &str) -> String {
    KNOWN_TOOLS
        .iter()
        .find(|tool| tool.eq_ignore_ascii_case(found))
        .map(|tool| (*tool).to_string())
        .unwrap_or_else(|| UNKNOWN_TOOL.to_string())
}
