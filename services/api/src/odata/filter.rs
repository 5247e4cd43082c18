//! `$filter` expressions
//!
//! Text is tokenized, parsed into an untyped [`FilterExpr`] tree and then
//! bound against an [`EntitySchema`], which resolves property names to
//! columns and checks every literal against the property's type. The bound
//! [`Predicate`] is what the SQL compiler consumes.

use chrono::{DateTime, Utc};

use super::{EntitySchema, FieldKind, ODataError};
use crate::dates::parse_instant;

/// Deepest nesting of parentheses and `not` accepted in one expression
const MAX_DEPTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CompareOp {
    fn from_keyword(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "eq" => Some(CompareOp::Eq),
            "ne" => Some(CompareOp::Ne),
            "gt" => Some(CompareOp::Gt),
            "ge" => Some(CompareOp::Ge),
            "lt" => Some(CompareOp::Lt),
            "le" => Some(CompareOp::Le),
            _ => None,
        }
    }

    pub fn sql(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
        }
    }

    fn is_equality(self) -> bool {
        matches!(self, CompareOp::Eq | CompareOp::Ne)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFunction {
    Contains,
    StartsWith,
    EndsWith,
}

impl TextFunction {
    fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "contains" => Some(TextFunction::Contains),
            "startswith" => Some(TextFunction::StartsWith),
            "endswith" => Some(TextFunction::EndsWith),
            _ => None,
        }
    }
}

/// Literal as written in the filter text
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Int(i64),
    Bool(bool),
    DateTime(DateTime<Utc>),
    Null,
}

/// Parsed, not yet type-checked, filter
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    Compare {
        property: String,
        op: CompareOp,
        value: Literal,
    },
    Function {
        function: TextFunction,
        property: String,
        value: String,
    },
    And(Box<FilterExpr>, Box<FilterExpr>),
    Or(Box<FilterExpr>, Box<FilterExpr>),
    Not(Box<FilterExpr>),
}

/// Value bound for a typed column
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Int(i64),
    Text(String),
    Bool(bool),
    DateTime(DateTime<Utc>),
}

/// Filter resolved against a schema
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare {
        column: &'static str,
        op: CompareOp,
        value: FilterValue,
    },
    IsNull {
        column: &'static str,
        negated: bool,
    },
    Text {
        column: &'static str,
        function: TextFunction,
        value: String,
    },
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    LParen,
    RParen,
    Comma,
    Ident(String),
    Str(String),
    Int(i64),
    DateTime(DateTime<Utc>),
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
            Token::Comma => "','".to_string(),
            Token::Ident(word) => format!("'{}'", word),
            Token::Str(_) => "string literal".to_string(),
            Token::Int(n) => format!("'{}'", n),
            Token::DateTime(_) => "date-time literal".to_string(),
        }
    }
}

fn filter_error(message: impl Into<String>) -> ODataError {
    ODataError::Filter(message.into())
}

fn tokenize(input: &str) -> Result<Vec<Token>, ODataError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        match c {
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '\'' => {
                let mut value = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        None => return Err(filter_error("unterminated string literal")),
                        Some('\'') if chars.get(i + 1) == Some(&'\'') => {
                            value.push('\'');
                            i += 2;
                        }
                        Some('\'') => {
                            i += 1;
                            break;
                        }
                        Some(other) => {
                            value.push(*other);
                            i += 1;
                        }
                    }
                }
                tokens.push(Token::Str(value));
            }
            c if c.is_ascii_digit()
                || (c == '-' && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit())) =>
            {
                let start = i;
                i += 1;
                while i < chars.len()
                    && (chars[i].is_ascii_alphanumeric() || matches!(chars[i], ':' | '-' | '.' | '+'))
                {
                    i += 1;
                }
                let raw: String = chars[start..i].iter().collect();

                if let Ok(n) = raw.parse::<i64>() {
                    tokens.push(Token::Int(n));
                } else if let Some(instant) = parse_instant(&raw) {
                    tokens.push(Token::DateTime(instant));
                } else {
                    return Err(filter_error(format!("invalid literal '{}'", raw)));
                }
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            other => return Err(filter_error(format!("unexpected character '{}'", other))),
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        match self.peek() {
            Some(Token::Ident(word)) if word.eq_ignore_ascii_case(keyword) => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), ODataError> {
        match self.next() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(filter_error(format!(
                "expected {} but found {}",
                expected.describe(),
                token.describe()
            ))),
            None => Err(filter_error(format!(
                "expected {} but the expression ended",
                expected.describe()
            ))),
        }
    }

    fn enter(&mut self) -> Result<(), ODataError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(filter_error("expression is nested too deeply"));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn parse_or(&mut self) -> Result<FilterExpr, ODataError> {
        let mut left = self.parse_and()?;
        while self.eat_keyword("or") {
            let right = self.parse_and()?;
            left = FilterExpr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<FilterExpr, ODataError> {
        let mut left = self.parse_unary()?;
        while self.eat_keyword("and") {
            let right = self.parse_unary()?;
            left = FilterExpr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<FilterExpr, ODataError> {
        if self.eat_keyword("not") {
            self.enter()?;
            let inner = self.parse_unary()?;
            self.leave();
            return Ok(FilterExpr::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<FilterExpr, ODataError> {
        match self.next() {
            Some(Token::LParen) => {
                self.enter()?;
                let inner = self.parse_or()?;
                self.expect(Token::RParen)?;
                self.leave();
                Ok(inner)
            }
            Some(Token::Ident(name)) if self.peek() == Some(&Token::LParen) => {
                self.parse_function(&name)
            }
            Some(Token::Ident(property)) => {
                let op = match self.next() {
                    Some(Token::Ident(word)) => CompareOp::from_keyword(&word).ok_or_else(|| {
                        filter_error(format!("unknown operator '{}'", word))
                    })?,
                    Some(token) => {
                        return Err(filter_error(format!(
                            "expected an operator after '{}' but found {}",
                            property,
                            token.describe()
                        )));
                    }
                    None => {
                        return Err(filter_error(format!(
                            "expected an operator after '{}'",
                            property
                        )));
                    }
                };
                let value = self.parse_literal()?;
                Ok(FilterExpr::Compare {
                    property,
                    op,
                    value,
                })
            }
            Some(token) => Err(filter_error(format!("unexpected {}", token.describe()))),
            None => Err(filter_error("expression ended unexpectedly")),
        }
    }

    fn parse_function(&mut self, name: &str) -> Result<FilterExpr, ODataError> {
        let function = TextFunction::from_name(name)
            .ok_or_else(|| filter_error(format!("unknown function '{}'", name)))?;

        self.expect(Token::LParen)?;
        let property = match self.next() {
            Some(Token::Ident(property)) => property,
            _ => {
                return Err(filter_error(format!(
                    "{} expects a property as its first argument",
                    name
                )));
            }
        };
        self.expect(Token::Comma)?;
        let value = match self.next() {
            Some(Token::Str(value)) => value,
            _ => {
                return Err(filter_error(format!(
                    "{} expects a string as its second argument",
                    name
                )));
            }
        };
        self.expect(Token::RParen)?;

        Ok(FilterExpr::Function {
            function,
            property,
            value,
        })
    }

    fn parse_literal(&mut self) -> Result<Literal, ODataError> {
        match self.next() {
            Some(Token::Str(value)) => Ok(Literal::String(value)),
            Some(Token::Int(n)) => Ok(Literal::Int(n)),
            Some(Token::DateTime(instant)) => Ok(Literal::DateTime(instant)),
            Some(Token::Ident(word)) if word.eq_ignore_ascii_case("true") => Ok(Literal::Bool(true)),
            Some(Token::Ident(word)) if word.eq_ignore_ascii_case("false") => {
                Ok(Literal::Bool(false))
            }
            Some(Token::Ident(word)) if word.eq_ignore_ascii_case("null") => Ok(Literal::Null),
            Some(token) => Err(filter_error(format!(
                "expected a literal but found {}",
                token.describe()
            ))),
            None => Err(filter_error("expected a literal")),
        }
    }
}

/// Parse filter text into an expression tree
pub fn parse_filter(input: &str) -> Result<FilterExpr, ODataError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(filter_error("expression is empty"));
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.parse_or()?;

    if let Some(token) = parser.peek() {
        return Err(filter_error(format!(
            "unexpected {} after the expression",
            token.describe()
        )));
    }

    Ok(expr)
}

/// Resolve properties and type-check literals
pub fn bind(expr: &FilterExpr, schema: &EntitySchema) -> Result<Predicate, ODataError> {
    match expr {
        FilterExpr::Compare {
            property,
            op,
            value,
        } => {
            let field = schema
                .field(property)
                .ok_or_else(|| ODataError::UnknownProperty(property.clone()))?;

            if *value == Literal::Null {
                if !op.is_equality() {
                    return Err(filter_error("null can only be compared with eq or ne"));
                }
                return Ok(Predicate::IsNull {
                    column: field.column,
                    negated: *op == CompareOp::Ne,
                });
            }

            let bound = match (field.kind, value) {
                (FieldKind::Int, Literal::Int(n)) => FilterValue::Int(*n),
                (FieldKind::Text, Literal::String(s)) => FilterValue::Text(s.clone()),
                (FieldKind::Bool, Literal::Bool(b)) => {
                    if !op.is_equality() {
                        return Err(filter_error(format!(
                            "'{}' is a boolean and only supports eq and ne",
                            field.name
                        )));
                    }
                    FilterValue::Bool(*b)
                }
                (FieldKind::DateTime, Literal::DateTime(instant)) => FilterValue::DateTime(*instant),
                (FieldKind::DateTime, Literal::String(s)) => match parse_instant(s) {
                    Some(instant) => FilterValue::DateTime(instant),
                    None => {
                        return Err(filter_error(format!("'{}' is not a valid date-time", s)));
                    }
                },
                (kind, _) => {
                    return Err(filter_error(format!(
                        "'{}' expects {}",
                        field.name,
                        kind.describe()
                    )));
                }
            };

            Ok(Predicate::Compare {
                column: field.column,
                op: *op,
                value: bound,
            })
        }
        FilterExpr::Function {
            function,
            property,
            value,
        } => {
            let field = schema
                .field(property)
                .ok_or_else(|| ODataError::UnknownProperty(property.clone()))?;

            if field.kind != FieldKind::Text {
                return Err(filter_error(format!(
                    "text functions cannot be applied to '{}'",
                    field.name
                )));
            }

            Ok(Predicate::Text {
                column: field.column,
                function: *function,
                value: value.clone(),
            })
        }
        FilterExpr::And(left, right) => Ok(Predicate::And(
            Box::new(bind(left, schema)?),
            Box::new(bind(right, schema)?),
        )),
        FilterExpr::Or(left, right) => Ok(Predicate::Or(
            Box::new(bind(left, schema)?),
            Box::new(bind(right, schema)?),
        )),
        FilterExpr::Not(inner) => Ok(Predicate::Not(Box::new(bind(inner, schema)?))),
    }
}
