//! Log line classification and rendering.

use std::sync::OnceLock;

use regex::Regex;
use shared::domain::LogKind;

pub const QUEUED_MARKER: &str = "다운로드 대기열 추가";
pub const ERROR_MARKER: &str = "[오류]";
pub const SUCCESS_MARKER: &str = "[완료]";

fn url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"https?://[^\s)]+").expect("static url pattern"))
}

/// Content markers win over the source tag.
pub fn classify(source: LogKind, text: &str) -> LogKind {
    if text.contains(QUEUED_MARKER) {
        LogKind::Highlight
    } else if text.contains(ERROR_MARKER) {
        LogKind::Error
    } else if text.contains(SUCCESS_MARKER) {
        LogKind::Success
    } else {
        source
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Link(&'a str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    source: LogKind,
    kind: LogKind,
    text: String,
}

impl LogLine {
    pub fn new(source: LogKind, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            source,
            kind: classify(source, &text),
            text,
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(LogKind::System, text)
    }

    pub fn normal(text: impl Into<String>) -> Self {
        Self::new(LogKind::Normal, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(LogKind::Error, text)
    }

    pub fn source(&self) -> LogKind {
        self.source
    }

    pub fn kind(&self) -> LogKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn segments(&self) -> Vec<Segment<'_>> {
        split_links(&self.text)
    }

    pub fn to_html(&self) -> String {
        let mut body = String::with_capacity(self.text.len() + 32);
        for segment in self.segments() {
            match segment {
                Segment::Text(text) => body.push_str(&escape_html(text)),
                Segment::Link(url) => {
                    let url = escape_html(url);
                    body.push_str(&format!(
                        r#"<a href="{url}" target="_blank" rel="noopener">{url}</a>"#
                    ));
                }
            }
        }

        let class = if self.kind == self.source {
            format!("log-line {}", self.source.as_str())
        } else {
            format!("log-line {} {}", self.source.as_str(), self.kind.as_str())
        };
        format!(r#"<div class="{class}">{body}</div>"#)
    }
}

pub fn split_links(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut cursor = 0;
    for found in url_pattern().find_iter(text) {
        if found.start() > cursor {
            segments.push(Segment::Text(&text[cursor..found.start()]));
        }
        segments.push(Segment::Link(found.as_str()));
        cursor = found.end();
    }
    if cursor < text.len() {
        segments.push(Segment::Text(&text[cursor..]));
    }
    segments
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Append-only display log. Only a new session clears it.
#[derive(Debug, Clone, Default)]
pub struct SessionLog {
    lines: Vec<LogLine>,
}

impl SessionLog {
    pub fn lines(&self) -> &[LogLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub(crate) fn push(&mut self, line: LogLine) {
        self.lines.push(line);
    }

    pub(crate) fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn to_html(&self) -> String {
        let mut html = String::from("<div class=\"log-container\">\n");
        for line in &self.lines {
            html.push_str(&line.to_html());
            html.push('\n');
        }
        html.push_str("</div>\n");
        html
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_content_markers() {
        assert_eq!(LogLine::normal("다운로드 대기열 추가: foo").kind(), LogKind::Highlight);
        assert_eq!(LogLine::normal("[오류] x").kind(), LogKind::Error);
        assert_eq!(LogLine::normal("[완료] x").kind(), LogKind::Success);
        assert_eq!(LogLine::normal("Fetching playlist items...").kind(), LogKind::Normal);
    }

    #[test]
    fn falls_back_to_source_tag() {
        assert_eq!(LogLine::system("[시스템] 작업이 완료되었습니다.").kind(), LogKind::System);
        assert_eq!(LogLine::error("[시스템] stopped").kind(), LogKind::Error);
    }

    #[test]
    fn queue_marker_takes_precedence_over_error_marker() {
        let line = LogLine::normal("[오류] 다운로드 대기열 추가 실패");
        assert_eq!(line.kind(), LogKind::Highlight);
    }

    #[test]
    fn link_stops_before_closing_paren() {
        let line = LogLine::normal("see http://example.com/a)");
        assert_eq!(
            line.segments(),
            vec![
                Segment::Text("see "),
                Segment::Link("http://example.com/a"),
                Segment::Text(")"),
            ]
        );
        assert!(line
            .to_html()
            .contains(r#"<a href="http://example.com/a" target="_blank" rel="noopener">http://example.com/a</a>)"#));
    }

    #[test]
    fn escapes_markup_outside_links() {
        let html = LogLine::normal("<b>\"x\" & 'y'</b>").to_html();
        assert_eq!(
            html,
            r#"<div class="log-line normal">&lt;b&gt;&quot;x&quot; &amp; &#039;y&#039;&lt;/b&gt;</div>"#
        );
    }

    #[test]
    fn escapes_query_ampersands_inside_links() {
        let line = LogLine::normal("https://youtube.com/watch?v=a&list=b done");
        let html = line.to_html();
        assert!(html.contains(r#"href="https://youtube.com/watch?v=a&amp;list=b""#));
        assert!(html.ends_with(" done</div>"));
    }

    #[test]
    fn html_class_carries_source_and_classification() {
        let html = LogLine::normal("[완료] saved").to_html();
        assert!(html.starts_with(r#"<div class="log-line normal success">"#));
    }
}
