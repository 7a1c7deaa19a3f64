//! The tag mini-language embedded in diagram labels.
//!
//! Labels carry inline annotations of the form `[Key: Value]`:
//!
//! ```text
//! tag   := '[' word ':' space* word ']'
//! word  := (alphanumeric | '_')+
//! ```
//!
//! A `[` that is not followed by `word ':'` is ordinary label text, so
//! labels such as `Server [primary]` are left alone. Once `[word:` has been
//! read the tag is committed, and a missing value or closing bracket is
//! reported as a diagnostic whose span is relative to the label text.
//! Scanning then resumes where the malformed tag stopped.
//!
//! Keys are lower-cased; when a key repeats, the right-most value wins.
//!
//! # Example
//!
//! ```
//! # use bastion_parser::tags;
//! let tags = tags::extract("Database [Level: Classified][Zone: DMZ]");
//! assert_eq!(tags.get("level"), Some("Classified"));
//! assert_eq!(tags.get("zone"), Some("DMZ"));
//! assert_eq!(tags::display_name("Database [Level: Classified]"), "Database");
//! ```

use indexmap::IndexMap;
use winnow::{
    Parser as _,
    ascii::multispace0,
    combinator::{cut_err, preceded, terminated},
    error::{ContextError, ErrMode, ModalResult},
    stream::{LocatingSlice, Location, Stream},
    token::{take_till, take_while},
};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    span::Span,
};

/// Diagnostic information attached to committed tag failures.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TagDiagnostic {
    code: ErrorCode,
    message: &'static str,
    label: &'static str,
    help: &'static str,
    /// Offset of the opening `[`.
    start: usize,
}

type Input<'a> = LocatingSlice<&'a str>;
type IResult<O> = ModalResult<O, ContextError<TagDiagnostic>>;

/// A single tag as written in the label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RawTag<'a> {
    key: &'a str,
    value: &'a str,
    span: Span,
}

/// A tag value together with where it was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagValue {
    value: String,
    span: Span,
}

impl TagValue {
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Span of the whole `[Key: Value]` tag within the label.
    pub fn span(&self) -> Span {
        self.span
    }
}

/// Tags extracted from one label, keyed by lower-cased key.
///
/// Iteration follows the position where a key first appeared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags {
    entries: IndexMap<String, TagValue>,
}

impl Tags {
    /// Returns the value for `key`, matched case-insensitively.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entry(key).map(TagValue::value)
    }

    /// Returns the value and location for `key`.
    pub fn entry(&self, key: &str) -> Option<&TagValue> {
        self.entries.get(&key.to_lowercase())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entry(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(key, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, tag)| (key.as_str(), tag.value.as_str()))
    }

    fn insert(&mut self, tag: RawTag<'_>) {
        self.entries.insert(
            tag.key.to_lowercase(),
            TagValue {
                value: tag.value.to_string(),
                span: tag.span,
            },
        );
    }
}

fn word<'a>(input: &mut Input<'a>) -> IResult<&'a str> {
    take_while(1.., |c: char| c.is_alphanumeric() || c == '_').parse_next(input)
}

/// Consume label text up to the next `[`.
fn plain_text<'a>(input: &mut Input<'a>) -> IResult<&'a str> {
    take_till(0.., '[').parse_next(input)
}

/// Parse one `[Key: Value]` tag.
///
/// Backtracks until `[word:` has been read, then commits.
fn tag<'a>(input: &mut Input<'a>) -> IResult<RawTag<'a>> {
    let start = input.current_token_start();

    let key = terminated(preceded('[', word), ':').parse_next(input)?;

    let value = cut_err(preceded(multispace0, word))
        .context(TagDiagnostic {
            code: ErrorCode::E001,
            message: "missing tag value",
            label: "expected a word after `:`",
            help: "write tags as `[Key: Value]`",
            start,
        })
        .parse_next(input)?;

    cut_err(']')
        .context(TagDiagnostic {
            code: ErrorCode::E002,
            message: "unterminated tag",
            label: "tag is not closed",
            help: "tag values are a single word, close the tag with `]`",
            start,
        })
        .parse_next(input)?;

    let end = input.current_token_start();
    Ok(RawTag {
        key,
        value,
        span: Span::new(start..end),
    })
}

/// Tag scanner that accumulates tags and diagnostics in one pass.
struct Scanner {
    tags: Tags,
    diagnostics: DiagnosticCollector,
}

impl Scanner {
    fn new() -> Self {
        Self {
            tags: Tags::default(),
            diagnostics: DiagnosticCollector::new(),
        }
    }

    fn scan(&mut self, mut input: Input<'_>) {
        while !input.is_empty() {
            let _ = plain_text(&mut input);
            if input.is_empty() {
                break;
            }

            let checkpoint = input.checkpoint();
            let start = input.current_token_start();
            match tag(&mut input) {
                Ok(raw) => self.tags.insert(raw),
                Err(ErrMode::Backtrack(_)) => {
                    // Not a tag; the `[` is ordinary text
                    input.reset(&checkpoint);
                    input.next_token();
                }
                Err(err) => {
                    let error_pos = input.current_token_start();
                    self.diagnostics.emit(Self::convert_err_mode(err, error_pos));
                    if error_pos == start {
                        input.next_token();
                    }
                }
            }
        }
    }

    /// Convert a committed winnow failure into a [`Diagnostic`].
    fn convert_err_mode(err: ErrMode<ContextError<TagDiagnostic>>, error_pos: usize) -> Diagnostic {
        let context_error = match err {
            ErrMode::Backtrack(ctx) | ErrMode::Cut(ctx) => ctx,
            ErrMode::Incomplete(_) => ContextError::new(),
        };

        if let Some(TagDiagnostic {
            code,
            message,
            label,
            help,
            start,
        }) = context_error.context().next()
        {
            return Diagnostic::error(*message)
                .with_code(*code)
                .with_label(Span::new(*start..error_pos), *label)
                .with_help(*help);
        }

        let span = Span::new(error_pos..error_pos.saturating_add(1));
        Diagnostic::error("unterminated tag")
            .with_code(ErrorCode::E002)
            .with_label(span, ErrorCode::E002.description())
    }
}

/// Scan a label, returning the tags found and a diagnostic for every
/// malformed tag.
///
/// Diagnostics carry [`Severity::Error`](crate::error::Severity::Error);
/// callers that tolerate malformed annotations downgrade them.
pub fn scan(text: &str) -> (Tags, Vec<Diagnostic>) {
    let mut scanner = Scanner::new();
    scanner.scan(LocatingSlice::new(text));
    (scanner.tags, scanner.diagnostics.into_diagnostics())
}

/// Extract tags, ignoring malformed ones. Never fails.
pub fn extract(text: &str) -> Tags {
    scan(text).0
}

/// Extract tags, rejecting labels with malformed tags.
///
/// # Errors
///
/// Returns a [`ParseError`] with one diagnostic per malformed tag.
pub fn parse(text: &str) -> Result<Tags, ParseError> {
    let mut scanner = Scanner::new();
    scanner.scan(LocatingSlice::new(text));
    scanner.diagnostics.finish()?;
    Ok(scanner.tags)
}

/// Human-readable name of a label: the text before the first `[`, trimmed,
/// with whitespace replaced by `_`.
pub fn display_name(text: &str) -> String {
    let name = match text.find('[') {
        Some(pos) => &text[..pos],
        None => text,
    };
    name.trim()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_tag() {
        let tags = extract("[Level: Classified]");
        assert_eq!(tags.len(), 1);
        assert_eq!(tags.get("level"), Some("Classified"));
    }

    #[test]
    fn test_keys_are_case_insensitive() {
        let lower = extract("[Level: Classified]");
        let upper = extract("[LEVEL: Classified]");

        assert_eq!(lower.get("level"), upper.get("level"));
        assert_eq!(upper.iter().next(), Some(("level", "Classified")));
        assert_eq!(upper.get("LeVeL"), Some("Classified"));
    }

    #[test]
    fn test_adjacent_tags() {
        let tags = extract("Web Server\n[Level: Classified][Zone: DMZ]");
        let pairs: Vec<_> = tags.iter().collect();
        assert_eq!(pairs, vec![("level", "Classified"), ("zone", "DMZ")]);
    }

    #[test]
    fn test_last_duplicate_wins() {
        let tags = extract("[Zone: DMZ] [zone: External]");
        assert_eq!(tags.len(), 1);
        assert_eq!(tags.get("zone"), Some("External"));
    }

    #[test]
    fn test_no_space_after_colon() {
        let tags = extract("[Enc:true]");
        assert_eq!(tags.get("enc"), Some("true"));
    }

    #[test]
    fn test_plain_brackets_are_text() {
        let (tags, diagnostics) = scan("Server [primary] (v2) [a b]");
        assert!(tags.is_empty());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_empty_text() {
        let (tags, diagnostics) = scan("");
        assert!(tags.is_empty());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_nested_open_bracket() {
        let tags = extract("[[Level: Open]");
        assert_eq!(tags.get("level"), Some("Open"));
    }

    #[test]
    fn test_missing_value_reported() {
        let (tags, diagnostics) = scan("Db [Level: ] [Zone: DMZ]");

        assert_eq!(tags.get("zone"), Some("DMZ"));
        assert!(!tags.contains_key("level"));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code(), Some(ErrorCode::E001));
        assert_eq!(diagnostics[0].labels()[0].span().start(), 3);
    }

    #[test]
    fn test_multi_word_value_reported() {
        let text = "Db [Level: Top Secret]";
        let (tags, diagnostics) = scan(text);

        assert!(tags.is_empty());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code(), Some(ErrorCode::E002));

        let span = diagnostics[0].labels()[0].span();
        assert_eq!(&text[span.range()], "[Level: Top");
    }

    #[test]
    fn test_unterminated_at_end() {
        let (tags, diagnostics) = scan("[Level: Open");
        assert!(tags.is_empty());
        assert_eq!(diagnostics[0].code(), Some(ErrorCode::E002));
    }

    #[test]
    fn test_scan_resumes_after_failure() {
        let (tags, diagnostics) = scan("[Level: Top Secret] [Zone: DMZ] [Status: ]");
        assert_eq!(tags.get("zone"), Some("DMZ"));
        assert_eq!(diagnostics.len(), 2);
    }

    #[test]
    fn test_tag_value_span() {
        let text = "Db [Zone: DMZ]";
        let tags = extract(text);
        let entry = tags.entry("zone").unwrap();
        assert_eq!(&text[entry.span().range()], "[Zone: DMZ]");
    }

    #[test]
    fn test_extract_does_not_mutate_input() {
        let text = String::from("A [Level: Open]");
        let _ = extract(&text);
        assert_eq!(text, "A [Level: Open]");
    }

    #[test]
    fn test_parse_strict() {
        assert!(parse("[Level: Open]").is_ok());

        let err = parse("[Level: Open] [Zone: ]").unwrap_err();
        assert_eq!(err.diagnostics().len(), 1);
        assert!(err.diagnostics()[0].severity().is_error());
    }

    #[test]
    fn test_unicode_words() {
        let tags = extract("Serveur [Zone: Intérieur]");
        assert_eq!(tags.get("zone"), Some("Intérieur"));
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("Web Server [Level: Open]"), "Web_Server");
        assert_eq!(display_name("Web\nServer"), "Web_Server");
        assert_eq!(display_name("  Db  "), "Db");
        assert_eq!(display_name("[Level: Open]"), "");
    }
}
