use std::fmt::Write as _;

use crate::api::Page;
use crate::error::{DashError, DashResult};

/// Escapes text for an HTML body or attribute.
pub(crate) fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for character in text.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Shell page; the script builds the sidebar and tabs from the embedded layout.
pub(crate) fn render_page(page: &Page, session_id: &str) -> DashResult<String> {
    let layout = serde_json::to_string(page)
        .map_err(|e| DashError::Server(format!("failed to serialize page layout: {e}")))?
        .replace("</", "<\\/");
    let title = escape(&page.title);

    let mut html = String::with_capacity(4096 + layout.len());
    write_page(&mut html, &title, &escape(session_id), &layout)
        .map_err(|e| DashError::Server(format!("failed to write page: {e}")))?;
    Ok(html)
}

fn write_page(html: &mut String, title: &str, session_id: &str, layout: &str) -> std::fmt::Result {
    writeln!(html, "<!DOCTYPE html>")?;
    writeln!(html, "<html lang=\"en\">")?;
    writeln!(html, "<head>")?;
    writeln!(html, "<meta charset=\"utf-8\"/>")?;
    writeln!(
        html,
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\"/>"
    )?;
    writeln!(html, "<title>{title}</title>")?;
    writeln!(html, "<link rel=\"stylesheet\" href=\"/assets/dashboard.css\"/>")?;
    writeln!(html, "</head>")?;
    writeln!(html, "<body data-session=\"{session_id}\">")?;
    writeln!(html, "<header class=\"navbar\"><h1>{title}</h1></header>")?;
    writeln!(html, "<div class=\"layout\">")?;
    writeln!(html, "<aside id=\"sidebar\"></aside>")?;
    writeln!(html, "<main>")?;
    writeln!(html, "<nav id=\"tabs\"></nav>")?;
    writeln!(html, "<section id=\"panels\"></section>")?;
    writeln!(html, "</main>")?;
    writeln!(html, "</div>")?;
    writeln!(
        html,
        "<script type=\"application/json\" id=\"page-layout\">{layout}</script>"
    )?;
    writeln!(html, "<script src=\"/assets/dashboard.js\"></script>")?;
    writeln!(html, "</body>")?;
    writeln!(html, "</html>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{LayoutNode, Tab};

    #[test]
    fn escapes_markup() {
        assert_eq!(escape("<b>\"x\" & 'y'</b>"), "&lt;b&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/b&gt;");
    }

    #[test]
    fn page_embeds_session_and_layout() {
        let page = Page {
            title: "Principal Component Analysis".to_owned(),
            sidebar: vec![LayoutNode::widget("exit")],
            tabs: vec![Tab::new("values", "Values", Vec::new())],
        };
        let html = render_page(&page, "pca-1").expect("page");
        assert!(html.contains("data-session=\"pca-1\""));
        assert!(html.contains("<title>Principal Component Analysis</title>"));
        assert!(html.contains("\"node\":\"widget\""));
    }
}
