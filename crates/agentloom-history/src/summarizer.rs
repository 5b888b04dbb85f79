//! Rule-based summarizer (C4).

use std::collections::BTreeMap;

use agentloom_core::MessageRecord;
use regex::Regex;
use std::sync::OnceLock;

const BUCKETS: [&str; 6] = ["goals", "decisions", "constraints", "files", "apis", "todos"];

fn file_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\w+\.\w+").unwrap())
}

fn url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"https?://\S+").unwrap())
}

fn classify(line: &str) -> Vec<&'static str> {
    let lower = line.to_lowercase();
    let mut buckets = Vec::new();

    if ["goal", "objective", "want to", "need to"]
        .iter()
        .any(|kw| lower.contains(kw))
    {
        buckets.push("goals");
    }
    if ["decided", "chose", "will use", "going with"]
        .iter()
        .any(|kw| lower.contains(kw))
    {
        buckets.push("decisions");
    }
    if ["must", "cannot", "constraint", "limit"]
        .iter()
        .any(|kw| lower.contains(kw))
    {
        buckets.push("constraints");
    }
    if file_token_re().is_match(line) {
        buckets.push("files");
    }
    if url_re().is_match(line) || lower.contains("api") || lower.contains("endpoint") {
        buckets.push("apis");
    }
    if ["todo", "fixme", "follow up", "next step"]
        .iter()
        .any(|kw| lower.contains(kw))
    {
        buckets.push("todos");
    }
    buckets
}

/// Reduce a span of message records to a sectioned Markdown summary.
///
/// Lines with no bucket match are collected into a deduped free-form list,
/// emitted only when every bucket is empty.
pub fn summarize_conversation(records: &[&MessageRecord]) -> String {
    let mut bucketed: BTreeMap<&'static str, Vec<String>> =
        BUCKETS.iter().map(|b| (*b, Vec::new())).collect();
    let mut unbucketed: Vec<String> = Vec::new();

    for record in records {
        for fragment in record.text_fragments() {
            for line in fragment.lines() {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let buckets = classify(line);
                if buckets.is_empty() {
                    unbucketed.push(line.to_string());
                } else {
                    for bucket in buckets {
                        let entries = bucketed.get_mut(bucket).unwrap();
                        if !entries.iter().any(|e| e == line) {
                            entries.push(line.to_string());
                        }
                    }
                }
            }
        }
    }

    let has_any_bucketed = bucketed.values().any(|v| !v.is_empty());
    if !has_any_bucketed {
        let mut seen = Vec::new();
        for line in unbucketed {
            if !seen.contains(&line) {
                seen.push(line);
            }
        }
        if seen.is_empty() {
            return "No notable content.".to_string();
        }
        let mut out = String::from("## Summary\n");
        for line in seen {
            out.push_str("- ");
            out.push_str(&line);
            out.push('\n');
        }
        return out;
    }

    let mut out = String::new();
    for bucket in BUCKETS {
        let entries = &bucketed[bucket];
        if entries.is_empty() {
            continue;
        }
        out.push_str(&format!("## {}\n", title_case(bucket)));
        for entry in entries {
            out.push_str("- ");
            out.push_str(entry);
            out.push('\n');
        }
    }
    out
}

fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Truncate long tool output by keeping the first and last halves, joined by
/// a marker line, so oversized stdout doesn't blow the token budget.
pub fn truncate_tool_output(text: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() <= max_lines || max_lines == 0 {
        return text.to_string();
    }
    let half = max_lines / 2;
    let head = &lines[..half];
    let tail = &lines[lines.len() - half..];
    let mut out = head.join("\n");
    out.push_str("\n…/(truncated)\n");
    out.push_str(&tail.join("\n"));
    out
}
