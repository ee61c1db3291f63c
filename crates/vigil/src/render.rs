//! Pure formatting and filtering helpers for the live views.

use std::time::Duration;

use serde_json::Value;

/// Case-insensitive substring match across a record's top-level fields.
///
/// Strings, numbers and booleans participate; nested objects do not. An
/// empty query matches everything.
pub fn matches_query(record: &Value, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let needle = query.to_lowercase();
    let Some(fields) = record.as_object() else {
        return record.to_string().to_lowercase().contains(&needle);
    };
    fields.values().any(|value| match value {
        Value::String(s) => s.to_lowercase().contains(&needle),
        Value::Number(n) => n.to_string().contains(&needle),
        Value::Bool(b) => b.to_string().contains(&needle),
        _ => false,
    })
}

pub fn filter_rows<'a>(rows: &'a [Value], query: &str) -> Vec<&'a Value> {
    rows.iter().filter(|row| matches_query(row, query)).collect()
}

/// One terminal line per record: id, then whichever descriptive fields
/// the deployment happens to carry.
pub fn summarize(record: &Value) -> String {
    let id = vigil_client::api::record_id(record).unwrap_or_else(|| "-".to_string());
    let mut parts = vec![format!("#{}", id)];
    for key in ["verdict", "threat_level", "status", "title", "url", "content"] {
        if let Some(text) = record.get(key).and_then(Value::as_str) {
            parts.push(truncate(text, 48));
        }
    }
    if let Some(created) = record.get("created_at").and_then(Value::as_str) {
        parts.push(created.to_string());
    }
    parts.join("  ")
}

/// Key/value lines for a stats payload, labels left-aligned to the
/// widest key. Non-object payloads fall back to their JSON form.
pub fn stats_lines(payload: &Value) -> Vec<String> {
    let Some(fields) = payload.as_object() else {
        return vec![payload.to_string()];
    };
    let label_width = fields.keys().map(|k| k.len()).max().unwrap_or(0);
    fields
        .iter()
        .map(|(key, value)| {
            let rendered = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            format!("{:<width$}  {}", key, rendered, width = label_width)
        })
        .collect()
}

/// Humanize a delay for the offline banner: "3s", "1m 30s".
pub fn humanize_delay(delay: Duration) -> String {
    let secs = delay.as_secs_f64().round() as u64;
    if secs < 60 {
        format!("{}s", secs)
    } else if secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let kept: String = s.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_query_matches_everything() {
        assert!(matches_query(&json!({"url": "https://a.example"}), ""));
        assert!(matches_query(&json!(null), ""));
    }

    #[test]
    fn test_query_is_case_insensitive() {
        let record = json!({"url": "https://Phish.example/login", "verdict": "scam"});
        assert!(matches_query(&record, "PHISH"));
        assert!(matches_query(&record, "scam"));
        assert!(!matches_query(&record, "benign"));
    }

    #[test]
    fn test_query_matches_numeric_fields() {
        let record = json!({"id": 421, "verdict": "safe"});
        assert!(matches_query(&record, "421"));
    }

    #[test]
    fn test_nested_objects_do_not_match() {
        let record = json!({"meta": {"note": "phish"}, "verdict": "safe"});
        assert!(!matches_query(&record, "phish"));
    }

    #[test]
    fn test_filter_rows_keeps_order() {
        let rows = vec![
            json!({"id": 3, "verdict": "scam"}),
            json!({"id": 2, "verdict": "safe"}),
            json!({"id": 1, "verdict": "scam"}),
        ];
        let kept = filter_rows(&rows, "scam");
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].get("id"), Some(&json!(3)));
        assert_eq!(kept[1].get("id"), Some(&json!(1)));
    }

    #[test]
    fn test_summarize_leads_with_id() {
        let line = summarize(&json!({"id": 7, "verdict": "suspicious"}));
        assert!(line.starts_with("#7"), "got: {}", line);
        assert!(line.contains("suspicious"));
    }

    #[test]
    fn test_summarize_without_id() {
        let line = summarize(&json!({"title": "weekly digest"}));
        assert!(line.starts_with("#-"), "got: {}", line);
    }

    #[test]
    fn test_stats_lines_align_labels() {
        let lines = stats_lines(&json!({"total_scans": 7, "scams_found": 2, "reports": 1}));
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().any(|l| l == "total_scans  7"), "got: {:?}", lines);
        assert!(lines.iter().any(|l| l == "scams_found  2"), "got: {:?}", lines);
        assert!(lines.iter().any(|l| l == "reports      1"), "got: {:?}", lines);
    }

    #[test]
    fn test_stats_lines_non_object_payload() {
        assert_eq!(stats_lines(&json!(3)), vec!["3".to_string()]);
    }

    #[test]
    fn test_humanize_delay() {
        assert_eq!(humanize_delay(Duration::from_secs(1)), "1s");
        assert_eq!(humanize_delay(Duration::from_secs(10)), "10s");
        assert_eq!(humanize_delay(Duration::from_secs(60)), "1m");
        assert_eq!(humanize_delay(Duration::from_secs(90)), "1m 30s");
        assert_eq!(humanize_delay(Duration::from_millis(1400)), "1s");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("0123456789", 10), "0123456789");
        assert_eq!(truncate("0123456789a", 10), "012345678…");
    }
}
