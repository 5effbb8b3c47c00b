//! Tag extraction from template source
//!
//! Splits a template into literal text runs and `{{ ... }}` tags. Text is kept
//! byte-for-byte; comments (`{{! ... }}`, `{{!-- ... --}}`) are dropped here so
//! the parser never sees them.

use crate::parser::{ParseError, ParseErrorKind};

/// A lexical token of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'s> {
    /// Literal text outside any tag.
    Text { text: &'s str, offset: usize },
    /// Trimmed content between the delimiters, with the offset of the opening `{{`.
    Tag { content: &'s str, offset: usize },
}

/// Extracts text runs and tags from template source.
///
/// `{{{ ... }}}` is accepted and yields the same tag as `{{ ... }}`.
///
/// # Examples
///
/// ```
/// use cardsrc::tokenizer::{tokenize, Token};
///
/// let tokens = tokenize("Hi {{name}}!").unwrap();
/// assert_eq!(tokens[0], Token::Text { text: "Hi ", offset: 0 });
/// assert_eq!(tokens[1], Token::Tag { content: "name", offset: 3 });
/// assert_eq!(tokens[2], Token::Text { text: "!", offset: 11 });
/// ```
pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>, ParseError> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    while let Some(found) = source[pos..].find("{{") {
        let open = pos + found;
        if open > pos {
            tokens.push(Token::Text { text: &source[pos..open], offset: pos });
        }

        let rest = &source[open..];

        if rest.starts_with("{{!--") {
            let end = rest[5..]
                .find("--}}")
                .ok_or(ParseError::new(ParseErrorKind::UnterminatedComment, open))?;
            pos = open + 5 + end + 4;
            continue;
        }

        if rest.starts_with("{{!") {
            let end = rest
                .find("}}")
                .ok_or(ParseError::new(ParseErrorKind::UnterminatedComment, open))?;
            pos = open + end + 2;
            continue;
        }

        let (inner_start, closer) = if rest.starts_with("{{{") { (3, "}}}") } else { (2, "}}") };
        let inner_len = rest[inner_start..]
            .find(closer)
            .ok_or(ParseError::new(ParseErrorKind::UnterminatedTag, open))?;

        let content = rest[inner_start..inner_start + inner_len].trim();
        if content.is_empty() {
            return Err(ParseError::new(ParseErrorKind::EmptyTag, open));
        }

        tokens.push(Token::Tag { content, offset: open });
        pos = open + inner_start + inner_len + closer.len();
    }

    if pos < source.len() {
        tokens.push(Token::Text { text: &source[pos..], offset: pos });
    }

    Ok(tokens)
}
