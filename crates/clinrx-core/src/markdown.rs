//! Markdown-lite rendering for the report's `markdown_summary`.
//!
//! Supports exactly three constructs, one line at a time:
//! - `#` heading markers (stripped)
//! - `*` / `-` bullets (stripped, flagged)
//! - `**bold**` spans
//!
//! Links, tables, nested emphasis and multi-line constructs are passed through as text.

const BOLD: &str = "**";

/// A run of text with uniform emphasis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub emphasized: bool,
}

impl Span {
    fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            emphasized: false,
        }
    }

    fn bold(text: &str) -> Self {
        Self {
            text: text.to_string(),
            emphasized: true,
        }
    }
}

/// One rendered line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    pub bullet: bool,
    pub spans: Vec<Span>,
}

impl TextBlock {
    /// Text of the block without emphasis markers.
    pub fn plain_text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

/// Render markdown-lite text into display blocks. Blank lines are dropped.
pub fn render_markdown_lite(text: &str) -> Vec<TextBlock> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
        .map(render_line)
        .collect()
}

fn render_line(line: &str) -> TextBlock {
    let content = strip_heading(line);
    let (bullet, content) = strip_bullet(content);

    TextBlock {
        bullet,
        spans: split_bold(content),
    }
}

/// Remove a leading run of `#` and the whitespace after it.
fn strip_heading(line: &str) -> &str {
    if line.starts_with('#') {
        line.trim_start_matches('#').trim_start()
    } else {
        line
    }
}

/// Detect `* ` or `- ` after optional indentation.
fn strip_bullet(content: &str) -> (bool, &str) {
    let trimmed = content.trim_start();
    let mut chars = trimmed.chars();
    match (chars.next(), chars.next()) {
        (Some('*' | '-'), Some(c)) if c.is_whitespace() => (true, trimmed[1..].trim_start()),
        _ => (false, content),
    }
}

/// Split on `**...**` pairs. An unmatched `**` stays literal.
fn split_bold(content: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut rest = content;

    while let Some(open) = rest.find(BOLD) {
        let inner_start = open + BOLD.len();
        let Some(len) = rest[inner_start..].find(BOLD) else {
            break;
        };

        if open > 0 {
            spans.push(Span::plain(&rest[..open]));
        }
        let inner = &rest[inner_start..inner_start + len];
        if !inner.is_empty() {
            spans.push(Span::bold(inner));
        }
        rest = &rest[inner_start + len + BOLD.len()..];
    }

    if !rest.is_empty() {
        spans.push(Span::plain(rest));
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bold_and_bullets() {
        let blocks =
            render_markdown_lite("**Warning:** check interactions\n- item one\n- item two");
        assert_eq!(blocks.len(), 3);

        assert!(!blocks[0].bullet);
        assert_eq!(
            blocks[0].spans,
            vec![Span::bold("Warning:"), Span::plain(" check interactions")]
        );
        assert_eq!(blocks[0].spans.iter().filter(|s| s.emphasized).count(), 1);

        assert!(blocks[1].bullet);
        assert_eq!(blocks[1].plain_text(), "item one");
        assert!(blocks[2].bullet);
        assert_eq!(blocks[2].plain_text(), "item two");
    }

    #[test]
    fn test_headings_and_blank_lines() {
        let blocks = render_markdown_lite("## Summary\n\n   \r\n###No space\r\nBody");
        let texts: Vec<String> = blocks.iter().map(TextBlock::plain_text).collect();
        assert_eq!(texts, ["Summary", "No space", "Body"]);
        assert!(blocks.iter().all(|b| !b.bullet));
    }

    #[test]
    fn test_indented_star_bullet() {
        let blocks = render_markdown_lite("   *   **Sertraline** + sumatriptan");
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].bullet);
        assert_eq!(
            blocks[0].spans,
            vec![Span::bold("Sertraline"), Span::plain(" + sumatriptan")]
        );
    }

    #[test]
    fn test_marker_without_space_is_not_bullet() {
        let blocks = render_markdown_lite("-5 mg\n*emphasis*");
        assert!(!blocks[0].bullet);
        assert_eq!(blocks[0].plain_text(), "-5 mg");
        assert!(!blocks[1].bullet);
        assert_eq!(blocks[1].plain_text(), "*emphasis*");
    }

    #[test]
    fn test_unmatched_bold_is_literal() {
        let blocks = render_markdown_lite("a **b** c **d");
        assert_eq!(
            blocks[0].spans,
            vec![Span::plain("a "), Span::bold("b"), Span::plain(" c **d")]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(render_markdown_lite("").is_empty());
        assert!(render_markdown_lite("\n\n  \n").is_empty());
    }
}
