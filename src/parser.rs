//! Template parsing into a node tree
//!
//! Builds a [`ParsedTemplate`] from template source. Block tags must nest
//! properly: every `{{#name}}` needs exactly one matching `{{/name}}`, and any
//! structural problem fails the parse with the byte offset of the offending tag.
//! A template that parses is safe to render against any data.
//!
//! Supported syntax:
//! - `{{path}}`, `{{{path}}}` - variable reference
//! - `{{#if x}}..{{else if y}}..{{else}}..{{/if}}`, `{{#unless x}}..{{/unless}}`
//! - `{{#each path}}..{{else}}..{{/each}}`, `{{#each (helper arg) as |alias|}}..{{/each}}`
//! - `{{#ifEquals a b}}..{{else}}..{{/ifEquals}}`
//! - `{{helper arg "literal" (sub expr)}}` - inline helper call
//! - `{{icon_grid}}` - insertion point for the resolved icon list
//! - `{{! comment }}`, `{{!-- comment --}}`

use serde_json::{Number, Value};
use thiserror::Error;

use crate::helpers::Helper;
use crate::scope::VarPath;
use crate::suggest::did_you_mean;
use crate::tokenizer::{tokenize, Token};

/// Name of the tag replaced by the icon grid markup.
pub const ICON_GRID_TAG: &str = "icon_grid";

const BLOCK_KEYWORDS: &[&str] = &["if", "unless", "each"];

/// Structural template error kinds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("unterminated tag, missing '}}}}'")]
    UnterminatedTag,
    #[error("unterminated comment")]
    UnterminatedComment,
    #[error("empty tag")]
    EmptyTag,
    #[error("block '{name}' is never closed")]
    UnterminatedBlock { name: String },
    #[error("closing tag '{{{{/{name}}}}}' has no matching open block")]
    UnexpectedClose { name: String },
    #[error("closing tag '{{{{/{found}}}}}' does not match open block '{expected}'")]
    MismatchedClose { expected: String, found: String },
    #[error("'{{{{else}}}}' outside of a block")]
    UnexpectedElse,
    #[error("unknown block '{name}'")]
    UnknownBlock { name: String, suggestion: Option<String> },
    #[error("unknown helper '{name}'")]
    UnknownHelper { name: String, suggestion: Option<String> },
    #[error("helper '{name}' cannot open a block")]
    NotABlockHelper { name: String },
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("invalid expression: {0}")]
    InvalidExpression(String),
}

/// A structural template error at a byte offset of the source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("offset {offset}: {kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub offset: usize,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, offset: usize) -> Self {
        Self { kind, offset }
    }

    /// 1-based line and column of the error within `source`.
    pub fn line_col(&self, source: &str) -> (usize, usize) {
        let offset = self.offset.min(source.len());
        let before = &source[..offset];
        let line = before.matches('\n').count() + 1;
        let col = before.rfind('\n').map_or(offset, |nl| offset - nl - 1) + 1;
        (line, col)
    }

    /// "Did you mean" hint for unknown names.
    pub fn suggestion(&self) -> Option<&str> {
        match &self.kind {
            ParseErrorKind::UnknownBlock { suggestion, .. }
            | ParseErrorKind::UnknownHelper { suggestion, .. } => suggestion.as_deref(),
            _ => None,
        }
    }
}

/// An argument or condition expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Path(VarPath),
    Literal(Value),
    /// A parenthesized helper invocation, e.g. `(parseBankAccounts bank_accounts)`.
    Call(HelperCall),
}

/// A helper with its unevaluated arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct HelperCall {
    pub helper: Helper,
    pub args: Vec<Expr>,
}

/// A node of the parsed template tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Literal(String),
    VarRef {
        path: VarPath,
        offset: usize,
    },
    If {
        condition: Expr,
        then_branch: Vec<Node>,
        else_branch: Option<Vec<Node>>,
        offset: usize,
    },
    Unless {
        condition: Expr,
        body: Vec<Node>,
        else_branch: Option<Vec<Node>>,
        offset: usize,
    },
    Each {
        collection: Expr,
        alias: Option<String>,
        body: Vec<Node>,
        else_branch: Option<Vec<Node>>,
        offset: usize,
    },
    /// Inline (`body` is `None`) or block helper invocation.
    HelperCall {
        call: HelperCall,
        body: Option<Vec<Node>>,
        else_branch: Option<Vec<Node>>,
        offset: usize,
    },
    IconGrid {
        offset: usize,
    },
}

/// A template parsed into its node tree. Immutable and shareable across threads.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedTemplate {
    nodes: Vec<Node>,
}

impl ParsedTemplate {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// True if the template contains an `{{icon_grid}}` insertion point.
    pub fn has_icon_grid(&self) -> bool {
        fn walk(nodes: &[Node]) -> bool {
            nodes.iter().any(|node| match node {
                Node::IconGrid { .. } => true,
                Node::If { then_branch, else_branch, .. } => {
                    walk(then_branch) || else_branch.as_deref().is_some_and(walk)
                }
                Node::Unless { body, else_branch, .. }
                | Node::Each { body, else_branch, .. } => {
                    walk(body) || else_branch.as_deref().is_some_and(walk)
                }
                Node::HelperCall { body, else_branch, .. } => {
                    body.as_deref().is_some_and(walk) || else_branch.as_deref().is_some_and(walk)
                }
                Node::Literal(_) | Node::VarRef { .. } => false,
            })
        }
        walk(&self.nodes)
    }
}

/// Parse template source.
///
/// # Example
///
/// ```
/// use cardsrc::parser::{parse, Node};
///
/// let template = parse("Hello {{name}}{{#if vip}}, VIP{{/if}}").unwrap();
/// assert_eq!(template.nodes().len(), 3);
/// assert!(matches!(template.nodes()[2], Node::If { .. }));
///
/// let err = parse("{{#if vip}}unclosed").unwrap_err();
/// assert_eq!(err.offset, 0);
/// ```
pub fn parse(source: &str) -> Result<ParsedTemplate, ParseError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser { tokens, pos: 0 };

    let (nodes, stop) = parser.parse_sequence()?;
    match stop {
        Stop::Eof => Ok(ParsedTemplate { nodes }),
        Stop::Close { name, offset } => Err(ParseError::new(
            ParseErrorKind::UnexpectedClose { name: name.to_string() },
            offset,
        )),
        Stop::Else { offset, .. } => Err(ParseError::new(ParseErrorKind::UnexpectedElse, offset)),
    }
}

/// What ended a node sequence.
enum Stop<'s> {
    Eof,
    Else { rest: &'s str, offset: usize },
    Close { name: &'s str, offset: usize },
}

struct Parser<'s> {
    tokens: Vec<Token<'s>>,
    pos: usize,
}

impl<'s> Parser<'s> {
    fn parse_sequence(&mut self) -> Result<(Vec<Node>, Stop<'s>), ParseError> {
        let mut nodes = Vec::new();

        while let Some(token) = self.tokens.get(self.pos).copied() {
            self.pos += 1;
            match token {
                Token::Text { text, .. } => nodes.push(Node::Literal(text.to_string())),
                Token::Tag { content, offset } => {
                    if let Some(open) = content.strip_prefix('#') {
                        let (keyword, rest) = split_keyword(open);
                        nodes.push(self.parse_block(keyword, rest, offset)?);
                    } else if let Some(name) = content.strip_prefix('/') {
                        return Ok((nodes, Stop::Close { name: name.trim(), offset }));
                    } else if content == "else" {
                        return Ok((nodes, Stop::Else { rest: "", offset }));
                    } else if let Some(rest) = content.strip_prefix("else ") {
                        return Ok((nodes, Stop::Else { rest: rest.trim(), offset }));
                    } else {
                        nodes.push(parse_inline(content, offset)?);
                    }
                }
            }
        }

        Ok((nodes, Stop::Eof))
    }

    fn parse_block(
        &mut self,
        keyword: &str,
        rest: &str,
        offset: usize,
    ) -> Result<Node, ParseError> {
        match keyword {
            "if" | "unless" => {
                let condition = parse_single_arg(keyword, rest, offset)?;
                let (body, else_branch) = self.parse_branches(keyword, offset, true)?;
                Ok(conditional(keyword, condition, body, else_branch, offset))
            }
            "each" => {
                let (collection, alias) = parse_each_header(rest, offset)?;
                let (body, else_branch) = self.parse_branches(keyword, offset, false)?;
                Ok(Node::Each { collection, alias, body, else_branch, offset })
            }
            name => match Helper::from_name(name) {
                Some(helper) if helper.supports_block() => {
                    let args = ExprParser::new(rest, offset).parse_all()?;
                    let (body, else_branch) = self.parse_branches(keyword, offset, false)?;
                    Ok(Node::HelperCall {
                        call: HelperCall { helper, args },
                        body: Some(body),
                        else_branch,
                        offset,
                    })
                }
                Some(_) => Err(ParseError::new(
                    ParseErrorKind::NotABlockHelper { name: name.to_string() },
                    offset,
                )),
                None => {
                    let mut candidates = BLOCK_KEYWORDS.to_vec();
                    candidates.extend(
                        Helper::ALL.iter().filter(|h| h.supports_block()).map(|h| h.name()),
                    );
                    let suggestion = did_you_mean(name, &candidates);
                    Err(ParseError::new(
                        ParseErrorKind::UnknownBlock { name: name.to_string(), suggestion },
                        offset,
                    ))
                }
            },
        }
    }

    /// Parse a block body up to its closing tag, with an optional else branch.
    ///
    /// `{{else if ..}}` / `{{else unless ..}}` (when `chain` is set) nest a new
    /// conditional inside the else branch that shares this block's closing tag.
    fn parse_branches(
        &mut self,
        keyword: &str,
        open_offset: usize,
        chain: bool,
    ) -> Result<(Vec<Node>, Option<Vec<Node>>), ParseError> {
        let (body, stop) = self.parse_sequence()?;

        match stop {
            Stop::Eof => Err(unterminated(keyword, open_offset)),
            Stop::Close { name, offset } => {
                check_close(keyword, name, offset)?;
                Ok((body, None))
            }
            Stop::Else { rest, offset } if rest.is_empty() => {
                let (else_body, stop) = self.parse_sequence()?;
                match stop {
                    Stop::Eof => Err(unterminated(keyword, open_offset)),
                    Stop::Close { name, offset } => {
                        check_close(keyword, name, offset)?;
                        Ok((body, Some(else_body)))
                    }
                    Stop::Else { offset, .. } => {
                        Err(ParseError::new(ParseErrorKind::UnexpectedElse, offset))
                    }
                }
            }
            Stop::Else { rest, offset } => {
                let (nested, cond_src) = split_keyword(rest);
                if !chain || !matches!(nested, "if" | "unless") {
                    return Err(ParseError::new(
                        ParseErrorKind::InvalidExpression(format!(
                            "'{{{{else {}}}}}' is not allowed in '{}'",
                            rest, keyword
                        )),
                        offset,
                    ));
                }
                let condition = parse_single_arg(nested, cond_src, offset)?;
                let (nested_body, nested_else) = self.parse_branches(keyword, open_offset, true)?;
                let node = conditional(nested, condition, nested_body, nested_else, offset);
                Ok((body, Some(vec![node])))
            }
        }
    }
}

fn conditional(
    keyword: &str,
    condition: Expr,
    body: Vec<Node>,
    else_branch: Option<Vec<Node>>,
    offset: usize,
) -> Node {
    if keyword == "unless" {
        Node::Unless { condition, body, else_branch, offset }
    } else {
        Node::If { condition, then_branch: body, else_branch, offset }
    }
}

fn unterminated(keyword: &str, offset: usize) -> ParseError {
    ParseError::new(ParseErrorKind::UnterminatedBlock { name: keyword.to_string() }, offset)
}

fn check_close(expected: &str, found: &str, offset: usize) -> Result<(), ParseError> {
    if expected == found {
        Ok(())
    } else {
        Err(ParseError::new(
            ParseErrorKind::MismatchedClose {
                expected: expected.to_string(),
                found: found.to_string(),
            },
            offset,
        ))
    }
}

/// Split `"keyword rest of tag"` at the first whitespace.
fn split_keyword(content: &str) -> (&str, &str) {
    let content = content.trim();
    match content.find(char::is_whitespace) {
        Some(idx) => (&content[..idx], content[idx..].trim()),
        None => (content, ""),
    }
}

fn parse_single_arg(keyword: &str, rest: &str, offset: usize) -> Result<Expr, ParseError> {
    let mut args = ExprParser::new(rest, offset).parse_all()?;
    if args.len() != 1 {
        return Err(ParseError::new(
            ParseErrorKind::InvalidExpression(format!(
                "'#{}' takes exactly one condition, got {}",
                keyword,
                args.len()
            )),
            offset,
        ));
    }
    Ok(args.remove(0))
}

/// `collection` or `collection as |alias|`.
fn parse_each_header(rest: &str, offset: usize) -> Result<(Expr, Option<String>), ParseError> {
    let mut parser = ExprParser::new(rest, offset);
    if parser.at_end() {
        return Err(parser.error("'#each' needs a collection".to_string()));
    }
    let collection = parser.parse_expr()?;

    parser.skip_ws();
    if parser.at_end() {
        return Ok((collection, None));
    }

    let remaining = parser.remaining();
    let alias = remaining
        .strip_prefix("as")
        .map(str::trim_start)
        .and_then(|s| s.strip_prefix('|'))
        .and_then(|s| s.strip_suffix('|'))
        .map(str::trim)
        .filter(|name| is_identifier(name))
        .ok_or_else(|| parser.error(format!("expected 'as |name|', found '{}'", remaining)))?;

    Ok((collection, Some(alias.to_string())))
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

/// A tag without `#`, `/` or `else`.
fn parse_inline(content: &str, offset: usize) -> Result<Node, ParseError> {
    let (first, rest) = split_keyword(content);

    if first == ICON_GRID_TAG && rest.is_empty() {
        return Ok(Node::IconGrid { offset });
    }

    if let Some(helper) = Helper::from_name(first) {
        let args = ExprParser::new(rest, offset).parse_all()?;
        return Ok(Node::HelperCall {
            call: HelperCall { helper, args },
            body: None,
            else_branch: None,
            offset,
        });
    }

    let mut parser = ExprParser::new(content, offset);
    let expr = parser.parse_expr()?;
    parser.skip_ws();
    if !parser.at_end() {
        let suggestion = did_you_mean(first, &Helper::names());
        return Err(ParseError::new(
            ParseErrorKind::UnknownHelper { name: first.to_string(), suggestion },
            offset,
        ));
    }

    Ok(match expr {
        Expr::Path(path) => Node::VarRef { path, offset },
        Expr::Literal(value) => Node::Literal(crate::scope::stringify(&value).into_owned()),
        Expr::Call(call) => Node::HelperCall { call, body: None, else_branch: None, offset },
    })
}

/// Parser for the argument list inside a tag.
struct ExprParser<'s> {
    src: &'s str,
    pos: usize,
    offset: usize,
}

impl<'s> ExprParser<'s> {
    fn new(src: &'s str, offset: usize) -> Self {
        Self { src, pos: 0, offset }
    }

    fn error(&self, message: String) -> ParseError {
        ParseError::new(ParseErrorKind::InvalidExpression(message), self.offset)
    }

    fn remaining(&self) -> &'s str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn skip_ws(&mut self) {
        let trimmed = self.remaining().trim_start();
        self.pos = self.src.len() - trimmed.len();
    }

    /// All expressions until the end of the tag.
    fn parse_all(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut exprs = Vec::new();
        loop {
            self.skip_ws();
            if self.at_end() {
                return Ok(exprs);
            }
            exprs.push(self.parse_expr()?);
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.skip_ws();
        match self.peek() {
            None => Err(self.error("missing expression".to_string())),
            Some('(') => self.parse_subexpr(),
            Some(')') => Err(self.error("unbalanced ')'".to_string())),
            Some(quote @ ('"' | '\'')) => {
                self.parse_string(quote).map(|s| Expr::Literal(Value::String(s)))
            }
            Some(_) => {
                let word = self.parse_word();
                word_to_expr(word).map_err(|reason| {
                    ParseError::new(ParseErrorKind::InvalidPath(reason), self.offset)
                })
            }
        }
    }

    fn parse_subexpr(&mut self) -> Result<Expr, ParseError> {
        self.pos += 1;
        self.skip_ws();
        let name = self.parse_word();
        let helper = Helper::from_name(name).ok_or_else(|| {
            let suggestion = did_you_mean(name, &Helper::names());
            ParseError::new(
                ParseErrorKind::UnknownHelper { name: name.to_string(), suggestion },
                self.offset,
            )
        })?;

        let mut args = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                None => return Err(self.error(format!("unclosed '(' in call to '{}'", name))),
                Some(')') => {
                    self.pos += 1;
                    return Ok(Expr::Call(HelperCall { helper, args }));
                }
                Some(_) => args.push(self.parse_expr()?),
            }
        }
    }

    fn parse_string(&mut self, quote: char) -> Result<String, ParseError> {
        self.pos += quote.len_utf8();
        let mut out = String::new();
        let mut chars = self.remaining().char_indices();

        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some((_, escaped)) => out.push(escaped),
                    None => break,
                },
                c if c == quote => {
                    self.pos += i + c.len_utf8();
                    return Ok(out);
                }
                c => out.push(c),
            }
        }

        Err(self.error("unterminated string literal".to_string()))
    }

    fn parse_word(&mut self) -> &'s str {
        let rest = self.remaining();
        let end = rest
            .find(|c: char| c.is_whitespace() || matches!(c, '(' | ')' | '|' | '"' | '\''))
            .unwrap_or(rest.len());
        self.pos += end;
        &rest[..end]
    }
}

fn word_to_expr(word: &str) -> Result<Expr, String> {
    match word {
        "" => return Err("empty path".to_string()),
        "true" => return Ok(Expr::Literal(Value::Bool(true))),
        "false" => return Ok(Expr::Literal(Value::Bool(false))),
        "null" | "undefined" => return Ok(Expr::Literal(Value::Null)),
        _ => {}
    }

    let numeric = word.starts_with(|c: char| c.is_ascii_digit())
        || (word.starts_with('-') && word[1..].starts_with(|c: char| c.is_ascii_digit()));
    if numeric {
        if let Ok(n) = word.parse::<i64>() {
            return Ok(Expr::Literal(Value::from(n)));
        }
        return word
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(|n| Expr::Literal(Value::Number(n)))
            .ok_or_else(|| format!("'{}' is not a number", word));
    }

    VarPath::parse(word).map(Expr::Path)
}
