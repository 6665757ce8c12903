//! Removal of SSH/login banner noise from captured command output

/// Lines containing any of these phrases are banner noise
const BANNER_PHRASES: &[&str] = &[
    "Warning: Permanently added",
    "Authorized users only. All activities may be monitored and recorded.",
    "Last login:",
    "Welcome to",
];

/// Extract the JSON document from `raw` command output
///
/// First tries the span from the first `{` to the last `}`; if that is not
/// valid JSON, drops every line containing a known banner phrase and tries
/// the remainder. When neither parses, `raw` is returned unchanged.
pub fn strip_banner(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    if let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) {
        if end > start {
            let candidate = &raw[start..=end];
            match serde_json::from_str::<serde_json::Value>(candidate) {
                Ok(_) => return candidate.to_string(),
                Err(e) => tracing::debug!("Brace-delimited span is not JSON: {}", e),
            }
        }
    }

    let cleaned = raw
        .lines()
        .filter(|line| !is_banner_line(line))
        .collect::<Vec<_>>()
        .join("\n");
    let cleaned = cleaned.trim();

    if !cleaned.is_empty() && serde_json::from_str::<serde_json::Value>(cleaned).is_ok() {
        return cleaned.to_string();
    }

    tracing::warn!("Could not isolate JSON in command output, returning it unchanged");
    raw.to_string()
}

fn is_banner_line(line: &str) -> bool {
    let line = line.trim();
    BANNER_PHRASES.iter().any(|phrase| line.contains(phrase))
}
