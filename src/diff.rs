use crate::matchers::{char_diff, StringValuePattern};
use crate::{LoggedRequest, RequestPattern};
use similar::ChangeTag;
use std::fmt::{self, Display, Formatter};

const COLUMN_WIDTH: usize = 48;

/// One constrained field of a pattern, next to what the request actually carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub field: String,
    pub expected: String,
    pub actual: String,
    pub matched: bool,
    /// Inline character diff between the expected literal and the actual value, for
    /// equality constraints that did not match.
    pub inline: Option<String>,
}

/// A field-by-field explanation of why a request did not satisfy a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diff {
    request_line: String,
    lines: Vec<DiffLine>,
}

impl Diff {
    pub fn new(pattern: &RequestPattern, request: &LoggedRequest) -> Self {
        let lines = match pattern {
            RequestPattern::Declarative(declarative) => {
                let mut lines = Vec::new();

                let (expected_method, method_matched) = match &declarative.method {
                    Some(method) => (method.to_string(), *method == request.method),
                    None => ("ANY".to_owned(), true),
                };
                lines.push(DiffLine {
                    field: "Method".into(),
                    expected: expected_method,
                    actual: request.method.to_string(),
                    matched: method_matched,
                    inline: None,
                });

                let actual_url = declarative.url.actual_value(request);
                let url_matched = declarative.url.matches(request);
                lines.push(DiffLine {
                    field: "URL".into(),
                    expected: declarative.url.to_string(),
                    inline: inline_unless(url_matched, declarative.url.expected_literal(), &actual_url),
                    actual: actual_url,
                    matched: url_matched,
                });

                for (name, value) in &declarative.headers {
                    let actual = request.header_value(name);
                    lines.push(value_line(format!("Header: {}", name), value, actual.as_deref()));
                }
                for (key, value) in &declarative.query_params {
                    let actual = request.query_param(key);
                    lines.push(value_line(format!("Query: {}", key), value, actual.as_deref()));
                }
                for value in &declarative.body_patterns {
                    lines.push(value_line("Body".into(), value, request.body_as_str()));
                }
                lines
            }
            RequestPattern::Custom(matcher) => vec![DiffLine {
                field: "Custom matcher".into(),
                expected: matcher.to_string(),
                actual: format!("{} {}", request.method, request.relative_url()),
                matched: matcher.matches(request),
                inline: None,
            }],
        };

        Self {
            request_line: format!("{} {}", request.method, request.relative_url()),
            lines,
        }
    }

    pub fn lines(&self) -> &[DiffLine] {
        &self.lines
    }

    /// Lines for the fields that did not match.
    pub fn mismatches(&self) -> impl Iterator<Item = &DiffLine> {
        self.lines.iter().filter(|line| !line.matched)
    }
}

fn value_line(field: String, pattern: &StringValuePattern, actual: Option<&str>) -> DiffLine {
    let matched = pattern.matches(actual);
    DiffLine {
        field,
        expected: pattern.to_string(),
        actual: actual.unwrap_or("<absent>").to_owned(),
        matched,
        inline: match actual {
            Some(actual) => inline_unless(matched, pattern.expected_literal(), actual),
            None => None,
        },
    }
}

fn inline_unless(matched: bool, expected: Option<String>, actual: &str) -> Option<String> {
    if matched {
        return None;
    }
    expected.map(|expected| inline_diff(&expected, actual))
}

/// Render the character-level difference between `expected` and `actual`:
/// `[-removed-]` for what `actual` is missing, `{+added+}` for what it has on top.
pub fn inline_diff(expected: &str, actual: &str) -> String {
    let diff = char_diff(expected, actual);
    let mut rendered = String::new();
    let mut run: Option<(ChangeTag, String)> = None;

    for change in diff.iter_all_changes() {
        let tag = change.tag();
        if let Some((current, text)) = run.as_mut() {
            if *current == tag {
                text.push_str(change.value());
                continue;
            }
        }
        if let Some((previous, text)) = run.replace((tag, change.value().to_owned())) {
            push_run(&mut rendered, previous, &text);
        }
    }
    if let Some((tag, text)) = run {
        push_run(&mut rendered, tag, &text);
    }
    rendered
}

fn push_run(rendered: &mut String, tag: ChangeTag, text: &str) {
    match tag {
        ChangeTag::Equal => rendered.push_str(text),
        ChangeTag::Delete => {
            rendered.push_str("[-");
            rendered.push_str(text);
            rendered.push_str("-]");
        }
        ChangeTag::Insert => {
            rendered.push_str("{+");
            rendered.push_str(text);
            rendered.push_str("+}");
        }
    }
}

impl Display for Diff {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "Closest request: {}", self.request_line)?;
        writeln!(f)?;
        writeln!(f, "{:<width$} | Actual", "Expected", width = COLUMN_WIDTH)?;
        writeln!(f, "{}", "-".repeat(COLUMN_WIDTH * 2))?;
        for line in &self.lines {
            let expected = format!("{}: {}", line.field, line.expected);
            if line.matched {
                writeln!(f, "{:<width$} | {}", expected, line.actual, width = COLUMN_WIDTH)?;
            } else {
                writeln!(
                    f,
                    "{:<width$} | {}    <<<<< {} does not match",
                    expected,
                    line.actual,
                    line.field,
                    width = COLUMN_WIDTH
                )?;
                if let Some(inline) = &line.inline {
                    writeln!(f, "{:<width$} | {}", "", inline, width = COLUMN_WIDTH)?;
                }
            }
        }
        Ok(())
    }
}
