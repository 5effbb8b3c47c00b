//! Variable path resolution against nested render scopes
//!
//! A template path such as `../company.name` is parsed once into a [`VarPath`]
//! and resolved at render time against a chain of [`Scope`] frames. Each
//! `#each` iteration pushes one frame; the outermost frame is the document root.
//!
//! Resolution rules:
//! - Without `..`, a name is looked up in the current frame, then in the
//!   aliases bound by enclosing `#each ... as |alias|` blocks, then in the root.
//! - Each leading `..` ascends exactly one frame, and the lookup is restricted
//!   to that frame.
//! - Dotted segments walk nested records; lists cannot be indexed, only
//!   iterated (`.length` is the one exception).
//!
//! # Example
//!
//! ```
//! use cardsrc::scope::{Scope, VarPath};
//! use serde_json::json;
//!
//! let root = json!({"company": {"name": "Acme"}});
//! let scope = Scope::root(&root);
//! let path = VarPath::parse("company.name").unwrap();
//! assert_eq!(scope.resolve(&path).unwrap().as_str(), Some("Acme"));
//! ```

use std::borrow::Cow;
use std::fmt;

use serde_json::{Number, Value};

/// One segment of a variable path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// `..` - ascend one frame.
    Parent,
    /// `this` or `.` - the current frame's value itself.
    This,
    /// A record field name.
    Field(String),
    /// Loop metadata such as `@index`.
    Meta(MetaVar),
}

/// Loop metadata variables available inside `#each`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaVar {
    Index,
    First,
    Last,
}

impl MetaVar {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "@index" => Some(MetaVar::Index),
            "@first" => Some(MetaVar::First),
            "@last" => Some(MetaVar::Last),
            _ => None,
        }
    }
}

/// A parsed variable path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarPath {
    segments: Vec<Segment>,
    raw: String,
}

impl VarPath {
    /// Parse a path expression.
    ///
    /// Accepted forms: `name`, `a.b.c`, `this`, `this.a`, `./a`, `.`, `../a`,
    /// `../../a`, `..`, `@index`, `@first`, `@last`.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let mut segments = Vec::new();
        let mut rest = raw;

        if rest.is_empty() {
            return Err("empty path".to_string());
        }

        loop {
            if let Some(after) = rest.strip_prefix("../") {
                segments.push(Segment::Parent);
                rest = after;
            } else if rest == ".." {
                segments.push(Segment::Parent);
                rest = "";
                break;
            } else {
                break;
            }
        }

        if let Some(after) = rest.strip_prefix("./") {
            segments.push(Segment::This);
            rest = after;
        } else if rest == "." {
            segments.push(Segment::This);
            rest = "";
        }

        if rest.is_empty() {
            if segments.is_empty() {
                return Err(format!("'{}' has no segments", raw));
            }
            return Ok(Self { segments, raw: raw.to_string() });
        }

        if rest.starts_with('@') {
            let meta = MetaVar::from_name(rest)
                .ok_or_else(|| format!("unknown loop variable '{}'", rest))?;
            segments.push(Segment::Meta(meta));
            return Ok(Self { segments, raw: raw.to_string() });
        }

        for (i, part) in rest.split('.').enumerate() {
            match part {
                "" => return Err(format!("'{}' has an empty segment", raw)),
                ".." => return Err(format!("'{}' uses '..' after a field name", raw)),
                "this" if i == 0 && !segments.contains(&Segment::This) => {
                    segments.push(Segment::This)
                }
                "this" => return Err(format!("'{}' uses 'this' after a field name", raw)),
                name if name.contains('/') => {
                    return Err(format!("'{}' mixes '/' into a field name", raw))
                }
                name => segments.push(Segment::Field(name.to_string())),
            }
        }

        Ok(Self { segments, raw: raw.to_string() })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The path as written in the template.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for VarPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Position of the current item within an `#each` iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopMeta {
    pub index: usize,
    pub len: usize,
}

/// One frame of the render scope chain.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    value: &'a Value,
    alias: Option<&'a str>,
    meta: Option<LoopMeta>,
    parent: Option<&'a Scope<'a>>,
}

impl<'a> Scope<'a> {
    /// The outermost frame, holding the document root.
    pub fn root(value: &'a Value) -> Self {
        Self { value, alias: None, meta: None, parent: None }
    }

    /// Push a frame for one iteration of an `#each` block.
    pub fn child<'b>(
        &'b self,
        value: &'b Value,
        alias: Option<&'b str>,
        meta: LoopMeta,
    ) -> Scope<'b> {
        Scope { value, alias, meta: Some(meta), parent: Some(self) }
    }

    /// The value bound to this frame.
    pub fn value(&self) -> &'a Value {
        self.value
    }

    /// The document root value.
    pub fn root_value(&self) -> &'a Value {
        let mut scope = self;
        while let Some(parent) = scope.parent {
            scope = parent;
        }
        scope.value
    }

    /// Resolve a path. `None` means undefined.
    pub fn resolve(&self, path: &VarPath) -> Option<Cow<'a, Value>> {
        let mut segments = path.segments().iter().peekable();
        let mut frame = *self;
        let mut ascended = false;

        while let Some(Segment::Parent) = segments.peek() {
            segments.next();
            frame = *frame.parent?;
            ascended = true;
        }

        let start: Cow<'a, Value> = match segments.next() {
            None => Cow::Borrowed(frame.value),
            Some(Segment::This) => Cow::Borrowed(frame.value),
            Some(Segment::Meta(meta)) => return frame.meta_value(*meta).map(Cow::Owned),
            Some(Segment::Field(name)) => {
                let found = if ascended { frame.lookup_local(name) } else { frame.lookup(name) };
                Cow::Borrowed(found?)
            }
            Some(Segment::Parent) => return None,
        };

        let mut current = start;
        for segment in segments {
            let Segment::Field(name) = segment else {
                return None;
            };
            current = match current {
                Cow::Borrowed(value) => field(value, name)?,
                Cow::Owned(value) => Cow::Owned(field(&value, name)?.into_owned()),
            };
        }

        Some(current)
    }

    /// Lookup restricted to this frame (its alias, then its fields).
    fn lookup_local(&self, name: &str) -> Option<&'a Value> {
        if self.alias == Some(name) {
            return Some(self.value);
        }
        self.value.as_object()?.get(name)
    }

    /// Current frame, then enclosing block aliases, then the root.
    fn lookup(&self, name: &str) -> Option<&'a Value> {
        if let Some(value) = self.lookup_local(name) {
            return Some(value);
        }

        let mut ancestor = self.parent;
        while let Some(scope) = ancestor {
            if scope.alias == Some(name) {
                return Some(scope.value);
            }
            ancestor = scope.parent;
        }

        if self.parent.is_some() {
            return self.root_value().as_object()?.get(name);
        }
        None
    }

    fn meta_value(&self, meta: MetaVar) -> Option<Value> {
        let loop_meta = self.meta?;
        Some(match meta {
            MetaVar::Index => Value::from(loop_meta.index),
            MetaVar::First => Value::Bool(loop_meta.index == 0),
            MetaVar::Last => Value::Bool(loop_meta.index + 1 == loop_meta.len),
        })
    }
}

fn field<'v>(value: &'v Value, name: &str) -> Option<Cow<'v, Value>> {
    match value {
        Value::Object(map) => map.get(name).map(Cow::Borrowed),
        Value::Array(items) if name == "length" => Some(Cow::Owned(Value::from(items.len()))),
        Value::String(s) if name == "length" => Some(Cow::Owned(Value::from(s.chars().count()))),
        _ => None,
    }
}

/// Truthiness used by `#if`, `#unless` and block helpers.
///
/// Undefined, `null`, `false`, `""` and `[]` are falsy. Everything else,
/// including `0` and `{}`, is truthy.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Number(_)) | Some(Value::Object(_)) => true,
    }
}

/// String form of a value as emitted into the output.
///
/// `null` becomes empty, lists join their items with `,`. Records have no
/// string form and render as empty; callers decide whether to warn.
pub fn stringify(value: &Value) -> Cow<'_, str> {
    match value {
        Value::Null => Cow::Borrowed(""),
        Value::String(s) => Cow::Borrowed(s.as_str()),
        Value::Bool(b) => Cow::Borrowed(if *b { "true" } else { "false" }),
        Value::Number(n) => Cow::Owned(format_number(n)),
        Value::Array(items) => Cow::Owned(
            items
                .iter()
                .map(|v| stringify(v).into_owned())
                .collect::<Vec<_>>()
                .join(","),
        ),
        Value::Object(_) => Cow::Borrowed(""),
    }
}

/// Whole-number floats print without a fractional part (`10.0` as `10`).
fn format_number(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => (f as i64).to_string(),
        _ => n.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(raw: &str) -> VarPath {
        VarPath::parse(raw).unwrap()
    }

    #[test]
    fn test_parse_simple_and_dotted() {
        assert_eq!(path("name").segments(), &[Segment::Field("name".to_string())]);
        assert_eq!(
            path("a.b").segments(),
            &[Segment::Field("a".to_string()), Segment::Field("b".to_string())]
        );
    }

    #[test]
    fn test_parse_parent_markers() {
        let p = path("../../name");
        assert_eq!(
            p.segments(),
            &[Segment::Parent, Segment::Parent, Segment::Field("name".to_string())]
        );
        assert_eq!(path("..").segments(), &[Segment::Parent]);
    }

    #[test]
    fn test_parse_this_forms() {
        assert_eq!(path("this").segments(), &[Segment::This]);
        assert_eq!(path(".").segments(), &[Segment::This]);
        assert_eq!(
            path("./iban").segments(),
            &[Segment::This, Segment::Field("iban".to_string())]
        );
        assert_eq!(
            path("this.iban").segments(),
            &[Segment::This, Segment::Field("iban".to_string())]
        );
    }

    #[test]
    fn test_parse_meta() {
        assert_eq!(path("@index").segments(), &[Segment::Meta(MetaVar::Index)]);
        assert!(VarPath::parse("@key").is_err());
    }

    #[test]
    fn test_parse_errors() {
        assert!(VarPath::parse("").is_err());
        assert!(VarPath::parse("a..b").is_err());
        assert!(VarPath::parse("a.").is_err());
        assert!(VarPath::parse("a/b").is_err());
        assert!(VarPath::parse("a.this").is_err());
    }

    #[test]
    fn test_resolve_root_fields() {
        let root = json!({"name": "Ada", "company": {"city": "Izmir"}});
        let scope = Scope::root(&root);
        assert_eq!(scope.resolve(&path("name")).unwrap().as_str(), Some("Ada"));
        assert_eq!(scope.resolve(&path("company.city")).unwrap().as_str(), Some("Izmir"));
        assert!(scope.resolve(&path("missing")).is_none());
        assert!(scope.resolve(&path("company.missing.deeper")).is_none());
    }

    #[test]
    fn test_resolve_child_then_root_fallback() {
        let root = json!({"company_name": "Acme", "value": "root"});
        let item = json!({"value": "item"});
        let scope = Scope::root(&root);
        let child = scope.child(&item, None, LoopMeta { index: 0, len: 1 });

        assert_eq!(child.resolve(&path("value")).unwrap().as_str(), Some("item"));
        assert_eq!(child.resolve(&path("company_name")).unwrap().as_str(), Some("Acme"));
    }

    #[test]
    fn test_resolve_parent_marker_targets_enclosing_frame() {
        let root = json!({"label": "outer"});
        let item = json!({"label": "inner"});
        let scope = Scope::root(&root);
        let child = scope.child(&item, None, LoopMeta { index: 0, len: 1 });

        assert_eq!(child.resolve(&path("label")).unwrap().as_str(), Some("inner"));
        assert_eq!(child.resolve(&path("../label")).unwrap().as_str(), Some("outer"));
    }

    #[test]
    fn test_resolve_parent_marker_does_not_fall_back() {
        let root = json!({"a": 1});
        let mid = json!({"b": 2});
        let leaf = json!({"c": 3});
        let scope = Scope::root(&root);
        let mid_scope = scope.child(&mid, None, LoopMeta { index: 0, len: 1 });
        let leaf_scope = mid_scope.child(&leaf, None, LoopMeta { index: 0, len: 1 });

        assert!(leaf_scope.resolve(&path("../a")).is_none());
        assert_eq!(leaf_scope.resolve(&path("../../a")), Some(Cow::Owned(json!(1))));
        assert!(leaf_scope.resolve(&path("../../../a")).is_none());
    }

    #[test]
    fn test_resolve_alias_and_enclosing_alias() {
        let root = json!({});
        let bank = json!({"bank_name": "Ziraat", "accounts": [{"iban": "TR1"}]});
        let account = json!({"iban": "TR1"});
        let scope = Scope::root(&root);
        let bank_scope = scope.child(&bank, Some("bank"), LoopMeta { index: 0, len: 1 });
        let account_scope = bank_scope.child(&account, None, LoopMeta { index: 0, len: 1 });

        assert_eq!(bank_scope.resolve(&path("bank.bank_name")).unwrap().as_str(), Some("Ziraat"));
        assert_eq!(
            account_scope.resolve(&path("bank.bank_name")).unwrap().as_str(),
            Some("Ziraat")
        );
        assert_eq!(account_scope.resolve(&path("iban")).unwrap().as_str(), Some("TR1"));
    }

    #[test]
    fn test_resolve_this_and_meta() {
        let root = json!({});
        let item = json!("plain string");
        let scope = Scope::root(&root);
        let child = scope.child(&item, None, LoopMeta { index: 2, len: 3 });

        assert_eq!(child.resolve(&path("this")).unwrap().as_str(), Some("plain string"));
        assert_eq!(child.resolve(&path("@index")).unwrap().into_owned(), json!(2));
        assert_eq!(child.resolve(&path("@first")).unwrap().into_owned(), json!(false));
        assert_eq!(child.resolve(&path("@last")).unwrap().into_owned(), json!(true));
        assert!(scope.resolve(&path("@index")).is_none());
    }

    #[test]
    fn test_resolve_no_list_indexing() {
        let root = json!({"items": [{"a": 1}, {"a": 2}]});
        let scope = Scope::root(&root);
        assert!(scope.resolve(&path("items.0")).is_none());
        assert_eq!(scope.resolve(&path("items.length")).unwrap().into_owned(), json!(2));
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(None));
        assert!(!is_truthy(Some(&json!(null))));
        assert!(!is_truthy(Some(&json!(false))));
        assert!(!is_truthy(Some(&json!(""))));
        assert!(!is_truthy(Some(&json!([]))));
        assert!(is_truthy(Some(&json!(0))));
        assert!(is_truthy(Some(&json!("0"))));
        assert!(is_truthy(Some(&json!({}))));
        assert!(is_truthy(Some(&json!([1]))));
        assert!(is_truthy(Some(&json!(true))));
    }

    #[test]
    fn test_stringify() {
        assert_eq!(stringify(&json!(null)), "");
        assert_eq!(stringify(&json!("x")), "x");
        assert_eq!(stringify(&json!(42)), "42");
        assert_eq!(stringify(&json!(1.5)), "1.5");
        assert_eq!(stringify(&json!(10.0)), "10");
        assert_eq!(stringify(&json!(-0.0)), "0");
        assert_eq!(stringify(&json!(-2.25)), "-2.25");
        assert_eq!(stringify(&json!(true)), "true");
        assert_eq!(stringify(&json!(["a", 1])), "a,1");
        assert_eq!(stringify(&json!({"a": 1})), "");
    }
}
