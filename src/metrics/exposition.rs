// src/metrics/exposition.rs

//! Structured view of a Prometheus text exposition file.
//!
//! The file is parsed into an ordered list of [`Line`]s. Sample lines carry
//! their parsed identity ([`SeriesKey`]) so matching is done on exact
//! `(metric, labels)` tuples, never on substrings of the raw text. Lines we
//! do not touch are written back exactly as they were read.

use std::fmt;

/// One `name="value"` pair in a label set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Label {
    pub name: String,
    pub value: String,
}

impl Label {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Identity of a series: metric name plus its label set.
///
/// Labels are kept sorted by name so two label sets written in a different
/// order still compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeriesKey {
    metric: String,
    labels: Vec<Label>,
}

impl SeriesKey {
    pub fn new(metric: impl Into<String>, labels: &[Label]) -> Self {
        let mut labels = labels.to_vec();
        labels.sort();
        Self {
            metric: metric.into(),
            labels,
        }
    }

    pub fn metric(&self) -> &str {
        &self.metric
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }
}

/// A gauge sample we want to write.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub metric: String,
    /// Rendered in this order.
    pub labels: Vec<Label>,
    pub value: f64,
}

impl Sample {
    pub fn new(metric: impl Into<String>, labels: Vec<Label>, value: f64) -> Self {
        Self {
            metric: metric.into(),
            labels,
            value,
        }
    }

    pub fn key(&self) -> SeriesKey {
        SeriesKey::new(self.metric.clone(), &self.labels)
    }

    pub fn render(&self) -> String {
        let mut out = self.metric.clone();
        if !self.labels.is_empty() {
            out.push('{');
            for (i, label) in self.labels.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&label.name);
                out.push_str("=\"");
                out.push_str(&escape_label_value(&label.value));
                out.push('"');
            }
            out.push('}');
        }
        out.push(' ');
        out.push_str(&format_value(self.value));
        out
    }
}

/// A single line of the exposition file.
#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    /// `# TYPE <metric> <kind>`
    TypeHeader { metric: String, raw: String },
    /// A parsed sample. `value` is the raw token after the label set.
    Sample {
        key: SeriesKey,
        value: String,
        raw: String,
    },
    /// Comments, blank lines and anything we could not parse.
    Other(String),
}

impl Line {
    fn raw(&self) -> &str {
        match self {
            Line::TypeHeader { raw, .. } => raw,
            Line::Sample { raw, .. } => raw,
            Line::Other(raw) => raw,
        }
    }
}

/// What [`Exposition::upsert`] did to the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertAction {
    /// An existing line with the same identity was overwritten in place.
    Replaced,
    /// The family header existed; the new line was placed right after it.
    InsertedAfterHeader,
    /// The family had rows but no header; the header went above its first
    /// row, followed by the new line.
    InsertedWithHeader,
    /// Neither the series nor its header existed; both were appended.
    AppendedWithHeader,
}

impl fmt::Display for UpsertAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UpsertAction::Replaced => "replaced",
            UpsertAction::InsertedAfterHeader => "inserted after header",
            UpsertAction::InsertedWithHeader => "inserted with header",
            UpsertAction::AppendedWithHeader => "appended with header",
        };
        f.write_str(s)
    }
}

/// Parsed exposition document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Exposition {
    lines: Vec<Line>,
}

impl Exposition {
    pub fn parse(text: &str) -> Self {
        let lines = text.split_terminator('\n').map(parse_line).collect();
        Self { lines }
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Raw value token for the given series, if present.
    pub fn value_of(&self, key: &SeriesKey) -> Option<&str> {
        self.lines.iter().find_map(|line| match line {
            Line::Sample { key: k, value, .. } if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    pub fn has_type_header(&self, metric: &str) -> bool {
        self.header_index(metric).is_some()
    }

    /// Insert or replace the line for `sample`'s identity.
    ///
    /// Only the matching line changes; every other line keeps its position
    /// and bytes. Any further lines with the same identity are dropped. A
    /// family that has rows but no `# TYPE` line gets one above its first row.
    pub fn upsert(&mut self, sample: &Sample) -> UpsertAction {
        let key = sample.key();
        let new_line = Line::Sample {
            key: key.clone(),
            value: format_value(sample.value),
            raw: sample.render(),
        };

        let mut matches = self
            .lines
            .iter()
            .enumerate()
            .filter(|(_, line)| matches!(line, Line::Sample { key: k, .. } if *k == key))
            .map(|(i, _)| i);

        if let Some(first) = matches.next() {
            let duplicates: Vec<usize> = matches.collect();
            self.lines[first] = new_line;
            for idx in duplicates.into_iter().rev() {
                self.lines.remove(idx);
            }
            if self.header_index(&sample.metric).is_none() {
                if let Some(idx) = self.first_sample_index(&sample.metric) {
                    self.lines.insert(idx, Self::header_for(&sample.metric));
                }
            }
            return UpsertAction::Replaced;
        }

        match self.header_index(&sample.metric) {
            Some(idx) => {
                self.lines.insert(idx + 1, new_line);
                UpsertAction::InsertedAfterHeader
            }
            None => {
                let header = Self::header_for(&sample.metric);
                // A header may never follow a row of its own family.
                match self.first_sample_index(&sample.metric) {
                    Some(idx) => {
                        self.lines.insert(idx, header);
                        self.lines.insert(idx + 1, new_line);
                        UpsertAction::InsertedWithHeader
                    }
                    None => {
                        self.lines.push(header);
                        self.lines.push(new_line);
                        UpsertAction::AppendedWithHeader
                    }
                }
            }
        }
    }

    /// Serialize back to text, one line per entry, newline-terminated.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(line.raw());
            out.push('\n');
        }
        out
    }

    fn header_index(&self, metric: &str) -> Option<usize> {
        self.lines
            .iter()
            .position(|line| matches!(line, Line::TypeHeader { metric: m, .. } if m == metric))
    }

    fn header_for(metric: &str) -> Line {
        Line::TypeHeader {
            metric: metric.to_string(),
            raw: type_header(metric),
        }
    }

    fn first_sample_index(&self, metric: &str) -> Option<usize> {
        self.lines
            .iter()
            .position(|line| matches!(line, Line::Sample { key, .. } if key.metric() == metric))
    }
}

pub fn type_header(metric: &str) -> String {
    format!("# TYPE {metric} gauge")
}

/// Render a value the way the collector expects it (`3`, `0.5`, `+Inf`).
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "+Inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        format!("{value}")
    }
}

pub fn escape_label_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out
}

fn parse_line(raw: &str) -> Line {
    let trimmed = raw.trim();

    if let Some(rest) = trimmed.strip_prefix('#') {
        let mut parts = rest.split_whitespace();
        if parts.next() == Some("TYPE") {
            if let (Some(metric), Some(_kind)) = (parts.next(), parts.next()) {
                return Line::TypeHeader {
                    metric: metric.to_string(),
                    raw: raw.to_string(),
                };
            }
        }
        return Line::Other(raw.to_string());
    }

    match parse_sample(trimmed) {
        Some((key, value)) => Line::Sample {
            key,
            value,
            raw: raw.to_string(),
        },
        None => Line::Other(raw.to_string()),
    }
}

fn parse_sample(line: &str) -> Option<(SeriesKey, String)> {
    let name_end = line
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == ':'))
        .unwrap_or(line.len());
    let metric = &line[..name_end];
    if metric.is_empty() || metric.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }

    let mut rest = &line[name_end..];
    let mut labels = Vec::new();
    if let Some(after_brace) = rest.strip_prefix('{') {
        let (parsed, remaining) = parse_labels(after_brace)?;
        labels = parsed;
        rest = remaining;
    }

    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let value = rest.split_whitespace().next()?;

    Some((SeriesKey::new(metric, &labels), value.to_string()))
}

/// Parse `a="x",b="y"}` and return the labels plus the text after `}`.
fn parse_labels(mut s: &str) -> Option<(Vec<Label>, &str)> {
    let mut labels = Vec::new();

    loop {
        s = s.trim_start();
        if let Some(rest) = s.strip_prefix('}') {
            return Some((labels, rest));
        }

        let name_end = s.find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))?;
        let name = &s[..name_end];
        if name.is_empty() {
            return None;
        }
        s = s[name_end..].trim_start().strip_prefix('=')?;
        s = s.trim_start().strip_prefix('"')?;

        let mut value = String::new();
        let mut chars = s.char_indices();
        let close = loop {
            let (i, c) = chars.next()?;
            match c {
                '"' => break i,
                '\\' => match chars.next()?.1 {
                    'n' => value.push('\n'),
                    other => value.push(other),
                },
                other => value.push(other),
            }
        };
        labels.push(Label::new(name, value));

        s = s[close + 1..].trim_start();
        if let Some(rest) = s.strip_prefix(',') {
            s = rest;
        } else if !s.starts_with('}') {
            return None;
        }
    }
}
