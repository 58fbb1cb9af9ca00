//! Server-rendered HTML for the two dashboards.

use hk_core::time::display;
use hk_core::{ShoppingEntry, StatusSnapshot};
use serde_json::Value;

const STYLE: &str = "body{font-family:sans-serif;margin:2em}\
table{border-collapse:collapse}\
th,td{border:1px solid #ccc;padding:.3em .6em;text-align:left}\
tr.flagged td{background:#fff4d6}";

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n<style>{STYLE}</style>\n</head>\n\
         <body>\n<h1>{title}</h1>\n{body}</body>\n</html>\n",
        title = escape_html(title),
    )
}

/// Shopping list, rows in the order given (callers pass newest first).
///
/// Flagged entries came from the whitespace split and are marked for review.
pub fn rebuy_dashboard(entries: &[ShoppingEntry]) -> String {
    let mut body = String::new();

    if entries.is_empty() {
        body.push_str("<p>Nothing to buy.</p>\n");
    } else {
        body.push_str(
            "<table>\n<tr><th>Time</th><th>Item</th><th>Source</th><th></th><th></th></tr>\n",
        );
        for entry in entries {
            let (class, marker) = if entry.flagged {
                (" class=\"flagged\"", "check split")
            } else {
                ("", "")
            };
            body.push_str(&format!(
                "<tr{class}><td>{time}</td><td>{item}</td><td>{source}</td><td>{marker}</td>\
                 <td><form method=\"post\" action=\"/rebuy-delete\">\
                 <input type=\"hidden\" name=\"id\" value=\"{id}\">\
                 <button type=\"submit\">Delete</button></form></td></tr>\n",
                time = escape_html(&display(&entry.created_at)),
                item = escape_html(&entry.text),
                source = escape_html(&entry.source),
                id = entry.id,
            ));
        }
        body.push_str("</table>\n");
    }

    body.push_str(
        "<form method=\"post\" action=\"/rebuy-clear-all\">\
         <button type=\"submit\">Clear all</button></form>\n",
    );
    page("Rebuy list", &body)
}

/// Pool readings, rows in the order given (callers pass newest first).
///
/// Columns are the union of payload keys in first-seen order, so readings
/// from firmware with different fields still line up.
pub fn pool_dashboard(snapshots: &[StatusSnapshot]) -> String {
    if snapshots.is_empty() {
        return page("Pool status", "<p>No readings logged yet.</p>\n");
    }

    let mut columns: Vec<&str> = Vec::new();
    for snapshot in snapshots {
        for key in snapshot.payload.keys() {
            if !columns.contains(&key.as_str()) {
                columns.push(key);
            }
        }
    }

    let mut body = String::from("<table>\n<tr><th>Logged at</th>");
    for column in &columns {
        body.push_str(&format!("<th>{}</th>", escape_html(column)));
    }
    body.push_str("</tr>\n");

    for snapshot in snapshots {
        body.push_str(&format!(
            "<tr><td>{}</td>",
            escape_html(&display(&snapshot.logged_at))
        ));
        for column in &columns {
            let cell = snapshot.payload.get(*column).map(cell_text).unwrap_or_default();
            body.push_str(&format!("<td>{}</td>", escape_html(&cell)));
        }
        body.push_str("</tr>\n");
    }
    body.push_str("</table>\n");

    page("Pool status", &body)
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use serde_json::json;

    fn ts(minute: u32) -> chrono::DateTime<FixedOffset> {
        FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2025, 3, 2, 18, minute, 5)
            .unwrap()
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
        assert_eq!(escape_html("Käse"), "Käse");
    }

    #[test]
    fn test_rebuy_dashboard_rows_and_forms() {
        let plain = ShoppingEntry::new("Milch", false, "kitchen", ts(1));
        let flagged = ShoppingEntry::new("Eier", true, "alexa", ts(2));
        let html = rebuy_dashboard(&[flagged.clone(), plain.clone()]);

        assert!(html.contains("2025-03-02 18:02:05"));
        assert!(html.contains(&format!("name=\"id\" value=\"{}\"", plain.id)));
        assert!(html.contains(&format!("name=\"id\" value=\"{}\"", flagged.id)));
        assert!(html.contains("<tr class=\"flagged\"><td>2025-03-02 18:02:05</td><td>Eier</td>"));
        assert!(html.contains("action=\"/rebuy-clear-all\""));
        assert!(html.find("Eier").unwrap() < html.find("Milch").unwrap());
    }

    #[test]
    fn test_rebuy_dashboard_escapes_user_text() {
        let entry = ShoppingEntry::new("<script>x</script>", false, "a&b", ts(1));
        let html = rebuy_dashboard(&[entry]);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;x&lt;/script&gt;"));
        assert!(html.contains("a&amp;b"));
    }

    #[test]
    fn test_rebuy_dashboard_empty() {
        let html = rebuy_dashboard(&[]);
        assert!(html.contains("Nothing to buy."));
        assert!(html.contains("/rebuy-clear-all"));
    }

    #[test]
    fn test_pool_dashboard_columns_are_key_union() {
        let a = StatusSnapshot::new(
            json!({"temp": 26.5, "pump": "on"}).as_object().cloned().unwrap(),
            ts(10),
        );
        let b = StatusSnapshot::new(
            json!({"temp": 27.0, "ph": 7.1}).as_object().cloned().unwrap(),
            ts(20),
        );
        let html = pool_dashboard(&[b, a]);

        assert!(html.contains("<th>Logged at</th>"));
        for column in ["<th>temp</th>", "<th>ph</th>", "<th>pump</th>"] {
            assert_eq!(html.matches(column).count(), 1, "{column}");
        }
        assert!(html.contains("<td>on</td>"));
        assert!(html.contains("<td>7.1</td>"));
        assert!(html.contains("<td></td>"));
        assert!(html.find("18:20:05").unwrap() < html.find("18:10:05").unwrap());
    }

    #[test]
    fn test_pool_dashboard_empty() {
        assert!(pool_dashboard(&[]).contains("No readings logged yet."));
    }
}
