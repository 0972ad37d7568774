use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Number, Value};

use crate::core::constants::{defaults, jsonnet};

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
});

/// A Jsonnet expression as the generator builds it.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Null,
    Bool(bool),
    Number(Number),
    Str(String),
    Array(Vec<Element>),
    Object(Vec<Field>),
    /// Reference to a local binding or parameter
    Ref(String),
    Call { function: String, args: Vec<Arg> },
    /// `left + right`
    Plus(Box<Expr>, Box<Expr>),
}

/// An array element with an optional leading comment.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub comment: Option<String>,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: String,
    pub value: Expr,
}

/// A call argument, positional when `name` is `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    pub name: Option<String>,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub default: Option<Expr>,
}

/// A top-level `local` statement, a function when `params` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct Local {
    pub name: String,
    pub params: Option<Vec<Param>>,
    pub body: Expr,
}

impl Expr {
    pub fn reference(name: impl Into<String>) -> Self {
        Self::Ref(name.into())
    }

    pub fn string(text: impl Into<String>) -> Self {
        Self::Str(text.into())
    }

    pub fn object<K: Into<String>>(fields: impl IntoIterator<Item = (K, Expr)>) -> Self {
        Self::Object(
            fields
                .into_iter()
                .map(|(key, value)| Field {
                    key: key.into(),
                    value,
                })
                .collect(),
        )
    }

    pub fn array(items: impl IntoIterator<Item = Expr>) -> Self {
        Self::Array(
            items
                .into_iter()
                .map(|value| Element {
                    comment: None,
                    value,
                })
                .collect(),
        )
    }
}

impl From<&Value> for Expr {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => Self::Number(n.clone()),
            Value::String(s) => Self::Str(s.clone()),
            Value::Array(items) => Self::array(items.iter().map(Expr::from)),
            Value::Object(map) => Self::object(map.iter().map(|(k, v)| (k.as_str(), Expr::from(v)))),
        }
    }
}

impl Arg {
    pub fn positional(value: Expr) -> Self {
        Self { name: None, value }
    }

    pub fn named(name: impl Into<String>, value: Expr) -> Self {
        Self {
            name: Some(name.into()),
            value,
        }
    }
}

/// Renders expressions as formatted Jsonnet text.
#[derive(Debug, Clone)]
pub struct Emitter {
    indent_size: usize,
    max_line_length: usize,
    comments: bool,
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new(defaults::INDENT_SIZE, defaults::MAX_LINE_LENGTH, true)
    }
}

impl Emitter {
    pub fn new(indent_size: usize, max_line_length: usize, comments: bool) -> Self {
        Self {
            indent_size,
            max_line_length,
            comments,
        }
    }

    pub fn indent(&self, level: usize) -> String {
        " ".repeat(self.indent_size * level)
    }

    /// A `//` comment line at `level`, or nothing when comments are off.
    pub fn comment(&self, text: &str, level: usize) -> Option<String> {
        if !self.comments {
            return None;
        }
        let flat = text.replace(['\r', '\n'], " ");
        Some(format!("{}{} {}", self.indent(level), jsonnet::COMMENT, flat))
    }

    /// Render `expr` as if it starts `column` characters into a line at
    /// nesting `level`. Continuation lines are indented from `level`.
    pub fn render(&self, expr: &Expr, level: usize, column: usize) -> String {
        match expr {
            Expr::Null => "null".to_string(),
            Expr::Bool(b) => b.to_string(),
            Expr::Number(n) => n.to_string(),
            Expr::Str(s) => quote(s),
            Expr::Ref(name) => name.clone(),
            Expr::Array(items) => self.render_array(items, level, column),
            Expr::Object(fields) => self.render_object(fields, level),
            Expr::Call { function, args } => self.render_call(function, args, level),
            Expr::Plus(left, right) => {
                let left = self.render(left, level, column);
                let right_column = last_line_width(&left) + 3;
                format!("{left} + {}", self.render(right, level, right_column))
            }
        }
    }

    fn render_array(&self, items: &[Element], level: usize, column: usize) -> String {
        if items.is_empty() {
            return "[]".to_string();
        }

        let commented = self.comments && items.iter().any(|item| item.comment.is_some());
        if !commented {
            let inline: Vec<String> = items
                .iter()
                .map(|item| self.render(&item.value, level + 1, 0))
                .collect();
            if inline.iter().all(|text| !text.contains('\n')) {
                let joined = format!("[{}]", inline.join(", "));
                if self.indent(level).len() + column + joined.len() <= self.max_line_length {
                    return joined;
                }
            }
        }

        let inner = self.indent(level + 1);
        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            let mut line = String::new();
            if let Some(comment) = item.comment.as_deref().and_then(|c| self.comment(c, level + 1)) {
                line.push_str(&comment);
                line.push('\n');
            }
            line.push_str(&inner);
            line.push_str(&self.render(&item.value, level + 1, 0));
            lines.push(line);
        }
        format!("[\n{}\n{}]", lines.join(",\n"), self.indent(level))
    }

    fn render_object(&self, fields: &[Field], level: usize) -> String {
        if fields.is_empty() {
            return "{}".to_string();
        }

        let inner = self.indent(level + 1);
        let lines: Vec<String> = fields
            .iter()
            .map(|field| {
                let key = render_key(&field.key);
                let column = key.len() + 2;
                format!("{inner}{key}: {}", self.render(&field.value, level + 1, column))
            })
            .collect();
        format!("{{\n{}\n{}}}", lines.join(",\n"), self.indent(level))
    }

    fn render_call(&self, function: &str, args: &[Arg], level: usize) -> String {
        if args.is_empty() {
            return format!("{function}()");
        }

        let inner = self.indent(level + 1);
        let lines: Vec<String> = args
            .iter()
            .map(|arg| match &arg.name {
                Some(name) => format!(
                    "{inner}{name}={}",
                    self.render(&arg.value, level + 1, name.len() + 1)
                ),
                None => format!("{inner}{}", self.render(&arg.value, level + 1, 0)),
            })
            .collect();
        format!("{function}(\n{}\n{})", lines.join(",\n"), self.indent(level))
    }

    /// Render a top-level `local` statement including the trailing `;`.
    pub fn render_local(&self, local: &Local) -> String {
        match &local.params {
            None => {
                let prefix = format!("local {} = ", local.name);
                let body = self.render(&local.body, 0, prefix.len());
                format!("{prefix}{body};")
            }
            Some(params) => {
                let inner = self.indent(1);
                let lines: Vec<String> = params
                    .iter()
                    .map(|param| match &param.default {
                        Some(default) => format!(
                            "{inner}{}={}",
                            param.name,
                            self.render(default, 1, param.name.len() + 1)
                        ),
                        None => format!("{inner}{}", param.name),
                    })
                    .collect();
                let signature = if lines.is_empty() {
                    format!("local {}()", local.name)
                } else {
                    format!("local {}(\n{}\n)", local.name, lines.join(",\n"))
                };
                format!("{signature} = {};", self.render(&local.body, 0, 4))
            }
        }
    }
}

fn last_line_width(text: &str) -> usize {
    text.rsplit('\n').next().map_or(0, str::len)
}

/// Whether `name` can appear bare as a field name or local.
pub fn is_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name) && !jsonnet::KEYWORDS.contains(&name)
}

pub fn render_key(key: &str) -> String {
    if is_identifier(key) {
        key.to_string()
    } else {
        quote(key)
    }
}

/// Double-quoted Jsonnet string literal.
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn emit(value: Value) -> String {
        Emitter::default().render(&Expr::from(&value), 0, 0)
    }

    #[test]
    fn test_scalars() {
        assert_eq!(emit(json!(null)), "null");
        assert_eq!(emit(json!(true)), "true");
        assert_eq!(emit(json!(false)), "false");
        assert_eq!(emit(json!(42)), "42");
        assert_eq!(emit(json!(-3)), "-3");
        assert_eq!(emit(json!(0.97)), "0.97");
        assert_eq!(emit(json!("text")), "\"text\"");
    }

    #[test]
    fn test_string_escaping() {
        assert_eq!(quote(r#"say "hi""#), r#""say \"hi\"""#);
        assert_eq!(quote(r"C:\path"), r#""C:\\path""#);
        assert_eq!(quote("a\nb\tc"), r#""a\nb\tc""#);
        assert_eq!(quote("\u{01}"), r#""\u0001""#);
        assert_eq!(quote("üñí"), "\"üñí\"");
    }

    #[test]
    fn test_empty_collections() {
        assert_eq!(emit(json!([])), "[]");
        assert_eq!(emit(json!({})), "{}");
    }

    #[test]
    fn test_inline_array() {
        assert_eq!(emit(json!(["#5794f2", "#b877d9"])), r##"["#5794f2", "#b877d9"]"##);
        assert_eq!(emit(json!([1, [2, 3]])), "[1, [2, 3]]");
    }

    #[test]
    fn test_array_with_objects_goes_multiline() {
        let text = emit(json!([{"a": 1}]));
        assert_eq!(text, "[\n    {\n        a: 1\n    }\n]");
    }

    #[test]
    fn test_array_wraps_past_max_line_length() {
        let emitter = Emitter::new(2, 20, true);
        let text = emitter.render(&Expr::from(&json!(["aaaaaa", "bbbbbb", "cccccc"])), 0, 0);
        assert_eq!(text, "[\n  \"aaaaaa\",\n  \"bbbbbb\",\n  \"cccccc\"\n]");
    }

    #[test]
    fn test_object_keys() {
        let text = emit(json!({"title": "T", "fill-opacity": 1, "local": true, "2x": 0}));
        assert_eq!(
            text,
            "{\n    title: \"T\",\n    \"fill-opacity\": 1,\n    \"local\": true,\n    \"2x\": 0\n}"
        );
    }

    #[test]
    fn test_object_preserves_insertion_order() {
        let text = emit(json!({"z": 1, "a": 2}));
        assert!(text.find("z:").unwrap() < text.find("a:").unwrap());
    }

    #[test]
    fn test_no_trailing_commas() {
        let text = emit(json!({"a": [{"b": 1}, {"c": 2}], "d": {"e": null}}));
        assert!(!text.contains(",\n}"));
        assert!(!text.contains(",\n]"));
        assert!(!text.contains(",}"));
        assert!(!text.contains(",]"));
    }

    #[test]
    fn test_indent_size() {
        let text = Emitter::new(2, 120, true).render(&Expr::from(&json!({"a": {"b": 1}})), 0, 0);
        assert_eq!(text, "{\n  a: {\n    b: 1\n  }\n}");
    }

    #[test]
    fn test_element_comments() {
        let items = vec![
            Element {
                comment: Some("first".to_string()),
                value: Expr::Number(1.into()),
            },
            Element {
                comment: None,
                value: Expr::Number(2.into()),
            },
        ];
        let with = Emitter::default().render(&Expr::Array(items.clone()), 0, 0);
        assert_eq!(with, "[\n    // first\n    1,\n    2\n]");

        let without = Emitter::new(4, 120, false).render(&Expr::Array(items), 0, 0);
        assert_eq!(without, "[1, 2]");
    }

    #[test]
    fn test_call_and_plus() {
        let call = Expr::Call {
            function: "graphPanel".to_string(),
            args: vec![
                Arg::positional(Expr::string("CPU")),
                Arg::named("fill", Expr::Number(2.into())),
            ],
        };
        assert_eq!(
            Emitter::default().render(&call, 0, 0),
            "graphPanel(\n    \"CPU\",\n    fill=2\n)"
        );

        let plus = Expr::Plus(
            Box::new(Expr::object([("a", Expr::Null)])),
            Box::new(Expr::reference("overrides")),
        );
        assert_eq!(
            Emitter::default().render(&plus, 0, 0),
            "{\n    a: null\n} + overrides"
        );
    }

    #[test]
    fn test_render_local() {
        let emitter = Emitter::default();
        let local = Local {
            name: "colors".to_string(),
            params: None,
            body: Expr::from(&json!(["#fff"])),
        };
        assert_eq!(emitter.render_local(&local), "local colors = [\"#fff\"];");

        let function = Local {
            name: "textPanel".to_string(),
            params: Some(vec![
                Param {
                    name: "title".to_string(),
                    default: None,
                },
                Param {
                    name: "overrides".to_string(),
                    default: Some(Expr::object::<&str>([])),
                },
            ]),
            body: Expr::Plus(
                Box::new(Expr::object([("title", Expr::reference("title"))])),
                Box::new(Expr::reference("overrides")),
            ),
        };
        assert_eq!(
            emitter.render_local(&function),
            "local textPanel(\n    title,\n    overrides={}\n) = {\n    title: title\n} + overrides;"
        );
    }

    #[test]
    fn test_comment_suppressed() {
        assert_eq!(Emitter::new(4, 120, false).comment("hidden", 0), None);
        assert_eq!(
            Emitter::default().comment("two\nlines", 1),
            Some("    // two lines".to_string())
        );
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("gridPos"));
        assert!(is_identifier("_private"));
        assert!(!is_identifier("9lives"));
        assert!(!is_identifier("with-dash"));
        assert!(!is_identifier("function"));
        assert!(!is_identifier(""));
    }
}
