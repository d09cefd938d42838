//! Synthetic page served when a document request fails offline.

use crate::http::{ResponseSnapshot, ResponseType};

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Self-contained offline notice with a retry button that reloads the same document.
pub fn offline_page(app_name: &str, heading: &str) -> ResponseSnapshot {
    let name = escape_html(app_name);
    let heading = escape_html(heading);
    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <title>{name} - Offline</title>
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <style>
    body {{
      font-family: Arial, sans-serif;
      text-align: center;
      padding: 50px;
      background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
      color: white;
      min-height: 100vh;
      display: flex;
      flex-direction: column;
      justify-content: center;
      align-items: center;
    }}
    h1 {{ margin-bottom: 20px; }}
    p {{ margin-bottom: 30px; opacity: 0.9; }}
    button {{
      padding: 12px 24px;
      background: #4CAF50;
      color: white;
      border: none;
      border-radius: 6px;
      font-size: 16px;
      cursor: pointer;
    }}
  </style>
</head>
<body>
  <h1>{heading}</h1>
  <p>You're currently offline. Please check your internet connection.</p>
  <button onclick="window.location.reload()">Try Again</button>
</body>
</html>
"#
    );

    ResponseSnapshot::new(200, html)
        .with_header("Content-Type", "text/html")
        .with_kind(ResponseType::Basic)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_page_contract() {
        let page = offline_page("TimeCraft", "🎵 TimeCraft Metronome");
        assert_eq!(page.status, 200);
        assert_eq!(page.content_type(), Some("text/html"));

        let body = std::str::from_utf8(&page.body).unwrap();
        assert!(body.contains("<title>TimeCraft - Offline</title>"));
        assert!(body.contains("<h1>🎵 TimeCraft Metronome</h1>"));
        assert!(body.contains("currently offline"));
        assert!(body.contains("window.location.reload()"));
    }

    #[test]
    fn test_offline_page_escapes_name() {
        let page = offline_page("<Tempo & Co>", "<b>Tempo</b>");
        let body = std::str::from_utf8(&page.body).unwrap();
        assert!(body.contains("<title>&lt;Tempo &amp; Co&gt; - Offline</title>"));
        assert!(body.contains("<h1>&lt;b&gt;Tempo&lt;/b&gt;</h1>"));
        assert!(!body.contains("<Tempo"));
        assert!(!body.contains("<b>"));
    }
}
