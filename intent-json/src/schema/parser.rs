//! Recursive-descent parser for schema expressions such as
//!
//! ```text
//! z.object({
//!   sentiment: z.enum(['positive', 'negative', 'neutral']),
//!   topics: z.array(z.string()).max(5),
//!   refusalReason: z.string().nullable(),
//! })
//! ```
//!
//! The text is only ever read as data. Identifiers other than `z` and the
//! JSON keywords are rejected, and methods that would run user code
//! (`refine`, `transform`, ...) are refused outright.

use serde_json::{Map, Number, Value};

use super::SchemaError;
use super::lexer::{Lexer, Pos, Spanned, Token};
use super::node::{NumberChecks, SchemaKind, SchemaNode, StringChecks, UnknownKeys};

/// Nesting limit for schemas and literal arguments.
const MAX_DEPTH: usize = 64;

/// Methods that take callbacks in the expression language they mimic.
const CODE_METHODS: &[&str] = &[
    "refine",
    "superRefine",
    "transform",
    "preprocess",
    "pipe",
    "catch",
    "brand",
];

/// Parses a schema expression into a typed tree.
pub(crate) fn parse(source: &str) -> Result<SchemaNode, SchemaError> {
    let tokens = Lexer::new(source).tokenize()?;
    let mut parser = Parser {
        tokens,
        index: 0,
        depth: 0,
    };
    let node = parser.schema()?;
    let end = parser.advance();
    if end.token != Token::Eof {
        return Err(end
            .pos
            .error(format!("unexpected {} after the schema expression", end.token)));
    }
    Ok(node)
}

#[derive(Debug)]
enum ArgKind {
    Schema(SchemaNode),
    Value(Value),
    List(Vec<Arg>),
    Object(Vec<(String, Arg)>),
}

#[derive(Debug)]
struct Arg {
    kind: ArgKind,
    pos: Pos,
}

impl Arg {
    const fn describe(&self) -> &'static str {
        match &self.kind {
            ArgKind::Schema(_) => "a schema",
            ArgKind::Value(Value::String(_)) => "a string",
            ArgKind::Value(Value::Number(_)) => "a number",
            ArgKind::Value(_) => "a literal",
            ArgKind::List(_) => "a list",
            ArgKind::Object(_) => "an object",
        }
    }

    /// Whether this argument can be a trailing `{ message }` / message string.
    const fn is_options(&self) -> bool {
        matches!(
            self.kind,
            ArgKind::Object(_) | ArgKind::Value(Value::String(_))
        )
    }

    fn into_schema(self) -> Result<SchemaNode, SchemaError> {
        match self.kind {
            ArgKind::Schema(node) => Ok(node),
            _ => Err(self
                .pos
                .error(format!("expected a schema, found {}", self.describe()))),
        }
    }

    fn into_value(self) -> Result<Value, SchemaError> {
        match self.kind {
            ArgKind::Value(value) => Ok(value),
            ArgKind::List(items) => items
                .into_iter()
                .map(Self::into_value)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            ArgKind::Object(fields) => fields
                .into_iter()
                .map(|(key, arg)| arg.into_value().map(|v| (key, v)))
                .collect::<Result<Map<_, _>, _>>()
                .map(Value::Object),
            ArgKind::Schema(_) => Err(self.pos.error("expected a literal value, found a schema")),
        }
    }

    fn into_string(self) -> Result<String, SchemaError> {
        match self.kind {
            ArgKind::Value(Value::String(s)) => Ok(s),
            _ => Err(self
                .pos
                .error(format!("expected a string, found {}", self.describe()))),
        }
    }

    fn into_number(self) -> Result<Number, SchemaError> {
        match self.kind {
            ArgKind::Value(Value::Number(n)) => Ok(n),
            _ => Err(self
                .pos
                .error(format!("expected a number, found {}", self.describe()))),
        }
    }

    fn into_count(self) -> Result<u64, SchemaError> {
        let pos = self.pos;
        self.into_number()?
            .as_u64()
            .ok_or_else(|| pos.error("expected a non-negative integer"))
    }

    fn into_list(self) -> Result<Vec<Self>, SchemaError> {
        match self.kind {
            ArgKind::List(items) => Ok(items),
            _ => Err(self
                .pos
                .error(format!("expected a list, found {}", self.describe()))),
        }
    }

    fn into_fields(self) -> Result<Vec<(String, Self)>, SchemaError> {
        match self.kind {
            ArgKind::Object(fields) => Ok(fields),
            _ => Err(self
                .pos
                .error(format!("expected an object, found {}", self.describe()))),
        }
    }
}

struct Parser {
    tokens: Vec<Spanned>,
    index: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.index].token
    }

    fn peek_pos(&self) -> Pos {
        self.tokens[self.index].pos
    }

    fn peek_second(&self) -> Option<&Token> {
        self.tokens.get(self.index + 1).map(|s| &s.token)
    }

    /// Consumes one token. Stays on [`Token::Eof`] once reached.
    fn advance(&mut self) -> Spanned {
        let spanned = self.tokens[self.index].clone();
        if spanned.token != Token::Eof {
            self.index += 1;
        }
        spanned
    }

    fn expect(&mut self, expected: &Token) -> Result<Pos, SchemaError> {
        let spanned = self.advance();
        if &spanned.token == expected {
            Ok(spanned.pos)
        } else {
            Err(spanned
                .pos
                .error(format!("expected {expected}, found {}", spanned.token)))
        }
    }

    fn ident(&mut self) -> Result<(String, Pos), SchemaError> {
        let spanned = self.advance();
        match spanned.token {
            Token::Ident(name) => Ok((name, spanned.pos)),
            other => Err(spanned
                .pos
                .error(format!("expected an identifier, found {other}"))),
        }
    }

    fn enter(&mut self, pos: Pos) -> Result<(), SchemaError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(pos.error(format!("schema is nested deeper than {MAX_DEPTH} levels")));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn schema(&mut self) -> Result<SchemaNode, SchemaError> {
        let pos = self.peek_pos();
        self.enter(pos)?;

        let (root, root_pos) = self.ident()?;
        if root != "z" {
            return Err(root_pos.error(format!(
                "unknown identifier `{root}`: schema expressions start with `z.`"
            )));
        }
        self.expect(&Token::Dot)?;
        let (name, name_pos) = self.ident()?;
        let args = self.call_args()?;
        let mut node = construct(&name, args, name_pos)?;

        // `.array()` and `.or()` wrap the node, so each one is a level.
        let mut wraps = 0;
        while *self.peek() == Token::Dot {
            self.advance();
            let (method, method_pos) = self.ident()?;
            if matches!(method.as_str(), "array" | "or") {
                self.enter(method_pos)?;
                wraps += 1;
            }
            let args = self.call_args()?;
            node = apply_method(node, &method, args, method_pos)?;
        }

        for _ in 0..=wraps {
            self.leave();
        }
        Ok(node)
    }

    fn call_args(&mut self) -> Result<Vec<Arg>, SchemaError> {
        self.expect(&Token::LParen)?;
        let mut args = Vec::new();
        while *self.peek() != Token::RParen {
            args.push(self.arg()?);
            if *self.peek() == Token::Comma {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(&Token::RParen)?;
        Ok(args)
    }

    fn arg(&mut self) -> Result<Arg, SchemaError> {
        let pos = self.peek_pos();
        let kind = match self.peek().clone() {
            Token::Ident(name) if name == "z" && self.peek_second() == Some(&Token::Dot) => {
                ArgKind::Schema(self.schema()?)
            }
            Token::Ident(name) => {
                self.advance();
                match name.as_str() {
                    "true" => ArgKind::Value(Value::Bool(true)),
                    "false" => ArgKind::Value(Value::Bool(false)),
                    "null" => ArgKind::Value(Value::Null),
                    "undefined" => return Err(pos.error("`undefined` is not a JSON value")),
                    _ => {
                        return Err(pos.error(format!(
                            "unknown identifier `{name}`: only `z`, literals, lists and objects may appear here"
                        )));
                    }
                }
            }
            Token::Str(s) => {
                self.advance();
                ArgKind::Value(Value::String(s))
            }
            Token::Num(n) => {
                self.advance();
                ArgKind::Value(Value::Number(n))
            }
            Token::LBracket => {
                self.enter(pos)?;
                let items = self.list()?;
                self.leave();
                ArgKind::List(items)
            }
            Token::LBrace => {
                self.enter(pos)?;
                let fields = self.object()?;
                self.leave();
                ArgKind::Object(fields)
            }
            other => return Err(pos.error(format!("expected a value, found {other}"))),
        };
        Ok(Arg { kind, pos })
    }

    fn list(&mut self) -> Result<Vec<Arg>, SchemaError> {
        self.expect(&Token::LBracket)?;
        let mut items = Vec::new();
        while *self.peek() != Token::RBracket {
            items.push(self.arg()?);
            if *self.peek() == Token::Comma {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(&Token::RBracket)?;
        Ok(items)
    }

    fn object(&mut self) -> Result<Vec<(String, Arg)>, SchemaError> {
        self.expect(&Token::LBrace)?;
        let mut fields: Vec<(String, Arg)> = Vec::new();
        while *self.peek() != Token::RBrace {
            let key_token = self.advance();
            let key = match key_token.token {
                Token::Ident(name) | Token::Str(name) => name,
                other => {
                    return Err(key_token
                        .pos
                        .error(format!("expected a property name, found {other}")));
                }
            };
            if fields.iter().any(|(existing, _)| *existing == key) {
                return Err(key_token
                    .pos
                    .error(format!("duplicate property `{key}`")));
            }
            self.expect(&Token::Colon)?;
            fields.push((key, self.arg()?));
            if *self.peek() == Token::Comma {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(&Token::RBrace)?;
        Ok(fields)
    }
}

/// Checks the argument count. One extra trailing options argument
/// (`{ message: ... }` or a message string) is always tolerated.
fn take_args(
    label: &str,
    mut args: Vec<Arg>,
    required: usize,
    pos: Pos,
) -> Result<Vec<Arg>, SchemaError> {
    if args.len() == required + 1 && args.last().is_some_and(Arg::is_options) {
        args.pop();
    }
    if args.len() != required {
        let plural = if required == 1 { "" } else { "s" };
        return Err(pos.error(format!(
            "{label} expects {required} argument{plural}, found {}",
            args.len()
        )));
    }
    Ok(args)
}

fn single(label: &str, args: Vec<Arg>, pos: Pos) -> Result<Arg, SchemaError> {
    take_args(label, args, 1, pos)?
        .pop()
        .ok_or_else(|| pos.error(format!("{label} expects 1 argument")))
}

fn schema_list(args: Vec<Arg>) -> Result<Vec<SchemaNode>, SchemaError> {
    args.into_iter().map(Arg::into_schema).collect()
}

fn construct(name: &str, args: Vec<Arg>, pos: Pos) -> Result<SchemaNode, SchemaError> {
    let label = format!("`z.{name}()`");
    let kind = match name {
        "string" => {
            take_args(&label, args, 0, pos)?;
            SchemaKind::String(StringChecks::default())
        }
        "number" => {
            take_args(&label, args, 0, pos)?;
            SchemaKind::Number(NumberChecks::default())
        }
        "boolean" => {
            take_args(&label, args, 0, pos)?;
            SchemaKind::Boolean
        }
        "null" => {
            take_args(&label, args, 0, pos)?;
            SchemaKind::Null
        }
        "any" | "unknown" => {
            take_args(&label, args, 0, pos)?;
            SchemaKind::Any
        }
        "literal" => SchemaKind::Literal(single(&label, args, pos)?.into_value()?),
        "enum" => {
            let list = single(&label, args, pos)?.into_list()?;
            if list.is_empty() {
                return Err(pos.error("`z.enum()` needs at least one value"));
            }
            let mut variants: Vec<String> = Vec::with_capacity(list.len());
            for item in list {
                let item_pos = item.pos;
                let variant = item.into_string()?;
                if variants.contains(&variant) {
                    return Err(item_pos.error(format!("duplicate enum value {variant:?}")));
                }
                variants.push(variant);
            }
            SchemaKind::Enum(variants)
        }
        "array" => SchemaKind::Array {
            items: Box::new(single(&label, args, pos)?.into_schema()?),
            min_items: None,
            max_items: None,
        },
        "tuple" => SchemaKind::Tuple(schema_list(single(&label, args, pos)?.into_list()?)?),
        "object" => {
            let fields = single(&label, args, pos)?
                .into_fields()?
                .into_iter()
                .map(|(key, arg)| arg.into_schema().map(|node| (key, node)))
                .collect::<Result<Vec<_>, _>>()?;
            SchemaKind::Object {
                fields,
                unknown_keys: UnknownKeys::Allow,
            }
        }
        "union" => {
            let options = schema_list(single(&label, args, pos)?.into_list()?)?;
            if options.len() < 2 {
                return Err(pos.error("`z.union()` needs at least two options"));
            }
            SchemaKind::Union(options)
        }
        "record" => {
            let mut schemas = if args.len() >= 2 && !args[1].is_options() {
                schema_list(take_args(&label, args, 2, pos)?)?
            } else {
                schema_list(take_args(&label, args, 1, pos)?)?
            };
            let values = Box::new(schemas.pop().ok_or_else(|| pos.error("missing value schema"))?);
            let keys = schemas.pop().map(Box::new);
            if let Some(keys) = &keys {
                if !matches!(keys.kind, SchemaKind::String(_) | SchemaKind::Enum(_)) {
                    return Err(pos.error(format!(
                        "record keys must be a string or enum schema, found {}",
                        keys.kind.type_name()
                    )));
                }
            }
            SchemaKind::Record { keys, values }
        }
        other => {
            return Err(pos.error(format!("unknown schema constructor `z.{other}()`")));
        }
    };
    Ok(SchemaNode::new(kind))
}

fn not_available(method: &str, type_name: &str, pos: Pos) -> SchemaError {
    pos.error(format!("`.{method}()` is not available on {type_name}"))
}

fn apply_method(
    mut node: SchemaNode,
    method: &str,
    args: Vec<Arg>,
    pos: Pos,
) -> Result<SchemaNode, SchemaError> {
    if CODE_METHODS.contains(&method) {
        return Err(pos.error(format!(
            "`.{method}()` runs code and is not supported in schema expressions"
        )));
    }

    let label = format!("`.{method}()`");
    let type_name = node.kind.type_name();
    match method {
        "optional" => {
            take_args(&label, args, 0, pos)?;
            node.optional = true;
        }
        "nullable" => {
            take_args(&label, args, 0, pos)?;
            node.nullable = true;
        }
        "nullish" => {
            take_args(&label, args, 0, pos)?;
            node.optional = true;
            node.nullable = true;
        }
        "describe" => {
            node.description = Some(single(&label, args, pos)?.into_string()?);
        }
        "default" => {
            node.default = Some(single(&label, args, pos)?.into_value()?);
        }
        "array" => {
            take_args(&label, args, 0, pos)?;
            node = SchemaNode::new(SchemaKind::Array {
                items: Box::new(node),
                min_items: None,
                max_items: None,
            });
        }
        "or" => {
            let other = single(&label, args, pos)?.into_schema()?;
            node = SchemaNode::new(SchemaKind::Union(vec![node, other]));
        }
        "strict" | "passthrough" | "strip" => {
            take_args(&label, args, 0, pos)?;
            let SchemaKind::Object { unknown_keys, .. } = &mut node.kind else {
                return Err(not_available(method, type_name, pos));
            };
            *unknown_keys = if method == "strict" {
                UnknownKeys::Reject
            } else {
                UnknownKeys::Allow
            };
        }
        "min" | "max" | "length" | "nonempty" => apply_size(&mut node, method, args, pos)?,
        "email" | "url" | "uuid" | "datetime" => {
            take_args(&label, args, 0, pos)?;
            let SchemaKind::String(checks) = &mut node.kind else {
                return Err(not_available(method, type_name, pos));
            };
            checks.format = Some(match method {
                "email" => "email",
                "url" => "uri",
                "uuid" => "uuid",
                _ => "date-time",
            });
        }
        "int" | "positive" | "negative" | "nonnegative" | "nonpositive" | "finite" | "gt"
        | "gte" | "lt" | "lte" => apply_number(&mut node, method, args, pos)?,
        other => {
            return Err(pos.error(format!("unknown method `.{other}()` on {type_name}")));
        }
    }
    Ok(node)
}

/// `.min/.max/.length/.nonempty` on strings, arrays, and (min/max) numbers.
fn apply_size(
    node: &mut SchemaNode,
    method: &str,
    args: Vec<Arg>,
    pos: Pos,
) -> Result<(), SchemaError> {
    let label = format!("`.{method}()`");
    let type_name = node.kind.type_name();

    if let SchemaKind::Number(_) = node.kind {
        return match method {
            "min" => apply_number(node, "gte", args, pos),
            "max" => apply_number(node, "lte", args, pos),
            _ => Err(not_available(method, type_name, pos)),
        };
    }

    let bounds = match &mut node.kind {
        SchemaKind::String(checks) => (&mut checks.min_length, &mut checks.max_length),
        SchemaKind::Array {
            min_items,
            max_items,
            ..
        } => (min_items, max_items),
        _ => return Err(not_available(method, type_name, pos)),
    };
    let (min, max) = bounds;

    match method {
        "nonempty" => {
            take_args(&label, args, 0, pos)?;
            *min = Some(min.map_or(1, |m| m.max(1)));
        }
        "min" => *min = Some(single(&label, args, pos)?.into_count()?),
        "max" => *max = Some(single(&label, args, pos)?.into_count()?),
        _ => {
            let n = single(&label, args, pos)?.into_count()?;
            *min = Some(n);
            *max = Some(n);
        }
    }
    Ok(())
}

fn apply_number(
    node: &mut SchemaNode,
    method: &str,
    args: Vec<Arg>,
    pos: Pos,
) -> Result<(), SchemaError> {
    let label = format!("`.{method}()`");
    let type_name = node.kind.type_name();
    let SchemaKind::Number(checks) = &mut node.kind else {
        return Err(not_available(method, type_name, pos));
    };

    match method {
        "int" => {
            take_args(&label, args, 0, pos)?;
            checks.integer = true;
        }
        "finite" => {
            take_args(&label, args, 0, pos)?;
        }
        "positive" => {
            take_args(&label, args, 0, pos)?;
            checks.exclusive_minimum = Some(Number::from(0));
        }
        "negative" => {
            take_args(&label, args, 0, pos)?;
            checks.exclusive_maximum = Some(Number::from(0));
        }
        "nonnegative" => {
            take_args(&label, args, 0, pos)?;
            checks.minimum = Some(Number::from(0));
        }
        "nonpositive" => {
            take_args(&label, args, 0, pos)?;
            checks.maximum = Some(Number::from(0));
        }
        "gt" => checks.exclusive_minimum = Some(single(&label, args, pos)?.into_number()?),
        "gte" => checks.minimum = Some(single(&label, args, pos)?.into_number()?),
        "lt" => checks.exclusive_maximum = Some(single(&label, args, pos)?.into_number()?),
        _ => checks.maximum = Some(single(&label, args, pos)?.into_number()?),
    }
    Ok(())
}
