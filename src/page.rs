//! HTML rendering of the diagnostics page

use std::fmt::Write;

use crate::config::PageConfig;
use crate::error::CommandError;

/// Terminator the modem appends to a successful response
const OK_TERMINATOR: &str = "\r\nOK\r\n";

/// Separator between command sections
const SECTION_SEPARATOR: &str = "\n<br />\n";

/// Render one command result as a `<pre>` block.
///
/// Output is shown verbatim apart from the `OK` terminator and surrounding
/// whitespace. Failures are shown in place of the output.
#[must_use]
pub fn section(result: &Result<String, CommandError>) -> String {
    match result {
        Ok(raw) => {
            let body = raw
                .replacen(OK_TERMINATOR, "", 1)
                .trim_matches(['\r', '\n', ' ', '\t'])
                .to_string();
            format!("<pre>{}</pre>", escape(&body))
        }
        Err(e) => format!("<pre>Error: {}</pre>", escape(&e.to_string())),
    }
}

/// Render the full document around the already-rendered sections
#[must_use]
pub fn render(config: &PageConfig, sections: &[String]) -> String {
    let mut html = String::with_capacity(256 + sections.iter().map(String::len).sum::<usize>());
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
    let _ = writeln!(
        html,
        r#"<meta http-equiv="refresh" content="{}" />"#,
        config.refresh
    );
    let _ = writeln!(html, "<title>{}</title>", escape(&config.title));
    html.push_str("</head>\n<body>\n");
    html.push_str(&sections.join(SECTION_SEPARATOR));
    html.push_str("\n</body>\n</html>\n");
    html
}

/// Escape text for inclusion in HTML element content
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
