use regex::Regex;

/// Logical build-configuration keys in a Static Web Apps workflow file.
///
/// Workflows generated before the `output_location` rename spell the same
/// setting `app_artifact_location`, so one logical key can have more than one
/// literal spelling in the wild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum BuildConfig {
    #[value(name = "app_location")]
    AppLocation,
    #[value(name = "api_location")]
    ApiLocation,
    #[value(name = "output_location")]
    OutputLocation,
    #[value(name = "app_artifact_location")]
    AppArtifactLocation,
}

impl BuildConfig {
    /// Literal spellings to scan for, newest first.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            BuildConfig::AppLocation => &["app_location"],
            BuildConfig::ApiLocation => &["api_location"],
            BuildConfig::OutputLocation => &["output_location", "app_artifact_location"],
            BuildConfig::AppArtifactLocation => &["app_artifact_location"],
        }
    }

    pub fn canonical_name(self) -> &'static str {
        self.aliases()[0]
    }
}

/// Span of a value token within a document. Lines and columns are zero-based,
/// columns are byte offsets within the line, `end_col` is exclusive. Quote
/// delimiters and trailing comments are never part of the range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceRange {
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
}

impl SourceRange {
    /// The exact text the range covers in `document`. Ranges produced by
    /// [`locate`] never span more than one line.
    pub fn slice<'a>(&self, document: &'a str) -> Option<&'a str> {
        let line = document.lines().nth(self.start_line)?;
        line.get(self.start_col..self.end_col)
    }
}

/// Find the source range of `key`'s value in a workflow document.
///
/// The document is scanned as plain text rather than parsed as YAML so that a
/// later edit of the range preserves every other formatting byte, comments
/// included. Returns `None` when no alias of `key` occurs, and also when the
/// key occurs in several job blocks with diverging values; picking one of
/// those would risk editing the wrong occurrence.
pub fn locate(document: &str, key: BuildConfig) -> Option<SourceRange> {
    let patterns: Vec<Regex> = key
        .aliases()
        .iter()
        .map(|alias| {
            Regex::new(&format!(r"^\s*(?:-\s+)?{}\s*:", regex::escape(alias))).unwrap()
        })
        .collect();

    let mut found: Vec<(SourceRange, String)> = Vec::new();
    for (line_no, line) in document.lines().enumerate() {
        for re in &patterns {
            if let Some(m) = re.find(line) {
                found.push(extract_value(line, line_no, m.end()));
                break;
            }
        }
    }

    let (first, rest) = found.split_first()?;
    if rest.iter().any(|(_, value)| value != &first.1) {
        tracing::debug!(
            "locate: {} occurs {} times with diverging values, refusing to pick one",
            key.canonical_name(),
            found.len()
        );
        return None;
    }
    Some(first.0)
}

/// Splice `new_value` into `range`, leaving every other byte of the document
/// untouched. The range must come from a [`locate`] call against this exact
/// document text.
pub fn replace_value(document: &str, range: SourceRange, new_value: &str) -> String {
    let mut lines: Vec<String> = document.split('\n').map(str::to_string).collect();
    if let Some(line) = lines.get_mut(range.start_line) {
        line.replace_range(range.start_col..range.end_col, new_value);
    }
    lines.join("\n")
}

fn extract_value(line: &str, line_no: usize, after_colon: usize) -> (SourceRange, String) {
    let rest = &line[after_colon..];
    let start = after_colon + (rest.len() - rest.trim_start().len());
    let body = line[start..].trim_end();

    if let Some(quote) = body.chars().next().filter(|c| *c == '"' || *c == '\'')
        && let Some(close) = body[1..].find(quote)
    {
        let value_start = start + 1;
        let value_end = value_start + close;
        return (
            range(line_no, value_start, value_end),
            line[value_start..value_end].to_string(),
        );
    }

    let cut = match comment_start(body) {
        Some(idx) => body[..idx].trim_end(),
        None => body,
    };
    (range(line_no, start, start + cut.len()), cut.to_string())
}

/// A `#` opens a comment only at the start of the value or after whitespace;
/// one glued inside a token is value text. Quoted values never reach here.
fn comment_start(body: &str) -> Option<usize> {
    let mut after_space = true;
    for (idx, ch) in body.char_indices() {
        if ch == '#' && after_space {
            return Some(idx);
        }
        after_space = ch.is_whitespace();
    }
    None
}

fn range(line: usize, start_col: usize, end_col: usize) -> SourceRange {
    SourceRange {
        start_line: line,
        start_col,
        end_line: line,
        end_col,
    }
}
