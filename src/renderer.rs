//! Template rendering against an entity record
//!
//! Rendering is a single depth-first pass over a [`ParsedTemplate`]. It never
//! fails: data-shape and helper-argument problems are collected as warnings
//! and the offending construct renders as empty (lenient mode). Callers that
//! want hard failures use [`RenderResult::into_strict`].

use std::borrow::Cow;

use serde_json::Value;

use crate::icons::ResolvedIcon;
use crate::models::Warning;
use crate::parser::{Expr, HelperCall, Node, ParsedTemplate};
use crate::scope::{is_truthy, stringify, LoopMeta, Scope};

/// Default CSS class of the `{{icon_grid}}` wrapper.
pub const DEFAULT_ICON_GRID_CLASS: &str = "card-icons";

/// Root key under which the resolved icons are exposed to templates.
pub const ICONS_KEY: &str = "icons";

/// Presentation options for a render call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub icon_grid_class: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { icon_grid_class: DEFAULT_ICON_GRID_CLASS.to_string() }
    }
}

/// Output of a render call plus any recovered problems.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderResult {
    pub output: String,
    pub warnings: Vec<Warning>,
}

impl RenderResult {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Treat any warning as a failure.
    pub fn into_strict(self) -> Result<String, Vec<Warning>> {
        if self.warnings.is_empty() {
            Ok(self.output)
        } else {
            Err(self.warnings)
        }
    }
}

/// Render a parsed template with default options.
///
/// # Examples
///
/// ```
/// use cardsrc::parser::parse;
/// use cardsrc::renderer::render;
/// use serde_json::json;
///
/// let template = parse("Hello {{name}}{{#if vip}}, VIP{{/if}}").unwrap();
///
/// let result = render(&template, &json!({"name": "Ada", "vip": true}), &[]);
/// assert_eq!(result.output, "Hello Ada, VIP");
///
/// let result = render(&template, &json!({"name": "Ada", "vip": false}), &[]);
/// assert_eq!(result.output, "Hello Ada");
/// ```
pub fn render(template: &ParsedTemplate, root: &Value, icons: &[ResolvedIcon]) -> RenderResult {
    render_with(template, root, icons, &RenderOptions::default())
}

/// Render a parsed template.
///
/// When `root` is a record without an `icons` key, the resolved icons are
/// exposed there so templates can iterate them directly.
pub fn render_with(
    template: &ParsedTemplate,
    root: &Value,
    icons: &[ResolvedIcon],
    options: &RenderOptions,
) -> RenderResult {
    let root: Cow<'_, Value> = match root {
        Value::Object(map) if !map.contains_key(ICONS_KEY) => {
            let mut map = map.clone();
            map.insert(
                ICONS_KEY.to_string(),
                Value::Array(icons.iter().map(ResolvedIcon::to_value).collect()),
            );
            Cow::Owned(Value::Object(map))
        }
        other => Cow::Borrowed(other),
    };

    let mut renderer = Renderer { icons, options, output: String::new(), warnings: Vec::new() };
    renderer.render_nodes(template.nodes(), &Scope::root(&root));

    RenderResult { output: renderer.output, warnings: renderer.warnings }
}

struct Renderer<'r> {
    icons: &'r [ResolvedIcon],
    options: &'r RenderOptions,
    output: String,
    warnings: Vec<Warning>,
}

impl Renderer<'_> {
    fn render_nodes(&mut self, nodes: &[Node], scope: &Scope<'_>) {
        for node in nodes {
            self.render_node(node, scope);
        }
    }

    fn render_branch(&mut self, branch: Option<&[Node]>, scope: &Scope<'_>) {
        if let Some(nodes) = branch {
            self.render_nodes(nodes, scope);
        }
    }

    fn render_node(&mut self, node: &Node, scope: &Scope<'_>) {
        match node {
            Node::Literal(text) => self.output.push_str(text),
            Node::VarRef { path, offset } => {
                if let Some(value) = scope.resolve(path) {
                    self.emit(&value, path.as_str(), *offset);
                }
            }
            Node::If { condition, then_branch, else_branch, offset } => {
                if self.truthy(condition, scope, *offset) {
                    self.render_nodes(then_branch, scope);
                } else {
                    self.render_branch(else_branch.as_deref(), scope);
                }
            }
            Node::Unless { condition, body, else_branch, offset } => {
                if self.truthy(condition, scope, *offset) {
                    self.render_branch(else_branch.as_deref(), scope);
                } else {
                    self.render_nodes(body, scope);
                }
            }
            Node::Each { collection, alias, body, else_branch, offset } => {
                let value = self.eval(collection, scope, *offset);
                match value.as_deref() {
                    Some(Value::Array(items)) if !items.is_empty() => {
                        let len = items.len();
                        for (index, item) in items.iter().enumerate() {
                            let meta = LoopMeta { index, len };
                            let frame = scope.child(item, alias.as_deref(), meta);
                            self.render_nodes(body, &frame);
                        }
                    }
                    Some(Value::Array(_)) | Some(Value::Null) | None => {
                        self.render_branch(else_branch.as_deref(), scope);
                    }
                    Some(_) => {
                        self.warnings.push(Warning::at(
                            format!("#each over '{}' which is not a list", describe(collection)),
                            *offset,
                        ));
                        self.render_branch(else_branch.as_deref(), scope);
                    }
                }
            }
            Node::HelperCall { call, body: None, offset, .. } => {
                if let Some(value) = self.call(call, scope, *offset) {
                    self.emit(&value, call.helper.name(), *offset);
                }
            }
            Node::HelperCall { call, body: Some(body), else_branch, offset } => {
                let value = self.call(call, scope, *offset);
                if is_truthy(value.as_ref()) {
                    self.render_nodes(body, scope);
                } else {
                    self.render_branch(else_branch.as_deref(), scope);
                }
            }
            Node::IconGrid { .. } => self.icon_grid(),
        }
    }

    fn truthy(&mut self, expr: &Expr, scope: &Scope<'_>, offset: usize) -> bool {
        let value = self.eval(expr, scope, offset);
        is_truthy(value.as_deref())
    }

    /// Evaluate an expression. `None` means undefined.
    fn eval<'v>(
        &mut self,
        expr: &Expr,
        scope: &Scope<'v>,
        offset: usize,
    ) -> Option<Cow<'v, Value>> {
        match expr {
            Expr::Path(path) => scope.resolve(path),
            Expr::Literal(value) => Some(Cow::Owned(value.clone())),
            Expr::Call(call) => self.call(call, scope, offset).map(Cow::Owned),
        }
    }

    /// Invoke a helper. Argument errors become warnings and an undefined result.
    fn call(&mut self, call: &HelperCall, scope: &Scope<'_>, offset: usize) -> Option<Value> {
        let args: Vec<Option<Cow<'_, Value>>> =
            call.args.iter().map(|arg| self.eval(arg, scope, offset)).collect();
        let refs: Vec<Option<&Value>> = args.iter().map(|a| a.as_deref()).collect();

        match call.helper.call(&refs) {
            Ok(value) => Some(value),
            Err(e) => {
                self.warnings.push(Warning::at(e.to_string(), offset));
                None
            }
        }
    }

    fn emit(&mut self, value: &Value, what: &str, offset: usize) {
        if value.is_object() {
            self.warnings
                .push(Warning::at(format!("'{}' is a record and has no text form", what), offset));
            return;
        }
        self.output.push_str(&stringify(value));
    }

    fn icon_grid(&mut self) {
        let out = &mut self.output;
        out.push_str("<div class=\"");
        out.push_str(&escape_attr(&self.options.icon_grid_class));
        out.push_str("\">");

        for icon in self.icons {
            out.push_str("<a class=\"card-icon card-icon-");
            out.push_str(icon.slot.category.as_str());
            out.push_str("\" href=\"");
            out.push_str(&escape_attr(&icon.href));
            out.push_str("\" data-icon=\"");
            out.push_str(&escape_attr(&icon.slot.id));
            out.push('"');
            if let Some(action) = &icon.action {
                out.push_str(" data-action=\"");
                out.push_str(&escape_attr(action));
                out.push('"');
            }
            out.push_str("><i class=\"");
            out.push_str(&escape_attr(&icon.slot.presentation_icon()));
            out.push_str("\"></i><span>");
            out.push_str(&escape_text(&icon.label));
            out.push_str("</span></a>");
        }

        out.push_str("</div>");
    }
}

fn describe(expr: &Expr) -> String {
    match expr {
        Expr::Path(path) => path.to_string(),
        Expr::Literal(value) => value.to_string(),
        Expr::Call(call) => format!("({} ...)", call.helper.name()),
    }
}

/// Escape a value for a double-quoted HTML attribute.
pub fn escape_attr(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(value);
    }
    let mut escaped = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

/// Escape a value for HTML text content.
pub fn escape_text(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '<', '>']) {
        return Cow::Borrowed(value);
    }
    Cow::Owned(value.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;"))
}
