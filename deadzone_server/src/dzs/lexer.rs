// Allow-list validation and tokenization for DZS expressions.
//
// Everything outside string literals must come from a small character set; a few
// tokens that would let a script smuggle in statements or host-language features are
// refused outright.

use super::error::{ScriptError, ScriptResult};

pub const MAX_EXPR_LEN: usize = 512;

/// Identifiers that never name anything a script is allowed to touch.
const DENIED_IDENTS: &[&str] = &[
    "eval",
    "function",
    "new",
    "this",
    "import",
    "require",
    "constructor",
    "prototype",
    "__proto__",
    "globalThis",
    "window",
    "process",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Not,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Num(f64),
    Str(String),
    Ident(String),
    LParen,
    RParen,
    Comma,
    Op(Op),
}

fn unsafe_err(what: impl Into<String>) -> ScriptError {
    ScriptError::Unsafe(what.into())
}

fn allowed_outside_strings(c: char) -> bool {
    c.is_ascii_alphanumeric() || c.is_ascii_whitespace() || "_.,()+-*/%<>=!&|\"'".contains(c)
}

/// Character-level allow-list pass. String literal bodies may hold anything but a backtick.
pub fn validate(src: &str) -> ScriptResult<()> {
    if src.len() > MAX_EXPR_LEN {
        return Err(unsafe_err(format!("longer than {MAX_EXPR_LEN} bytes")));
    }
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for c in src.chars() {
        if c == '`' {
            return Err(unsafe_err("backtick"));
        }
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
            }
            None => {
                if c == '"' || c == '\'' {
                    quote = Some(c);
                } else if c == ';' {
                    return Err(unsafe_err("`;`"));
                } else if !allowed_outside_strings(c) {
                    return Err(unsafe_err(format!("character `{c}`")));
                }
            }
        }
    }
    if quote.is_some() {
        return Err(ScriptError::Parse("unterminated string".into()));
    }
    Ok(())
}

fn check_ident(ident: &str) -> ScriptResult<()> {
    for part in ident.split('.') {
        if part.is_empty() {
            return Err(ScriptError::Parse(format!("malformed name `{ident}`")));
        }
        if DENIED_IDENTS.contains(&part) {
            return Err(unsafe_err(format!("identifier `{part}`")));
        }
    }
    Ok(())
}

/// Validates then splits an expression into tokens.
pub fn tokenize(src: &str) -> ScriptResult<Vec<Token>> {
    validate(src)?;

    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            c if c.is_whitespace() => i += 1,
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
            '"' | '\'' => {
                let mut s = String::new();
                i += 1;
                while i < chars.len() && chars[i] != c {
                    if chars[i] == '\\' && i + 1 < chars.len() {
                        i += 1;
                        s.push(match chars[i] {
                            'n' => '\n',
                            't' => '\t',
                            other => other,
                        });
                    } else {
                        s.push(chars[i]);
                    }
                    i += 1;
                }
                // Closing quote; `validate` guarantees it exists.
                i += 1;
                tokens.push(Token::Str(s));
            }
            c if c.is_ascii_digit() || (c == '.' && next.is_some_and(|n| n.is_ascii_digit())) => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let n = text
                    .parse::<f64>()
                    .map_err(|_| ScriptError::Parse(format!("bad number `{text}`")))?;
                tokens.push(Token::Num(n));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_' || chars[i] == '.') {
                    i += 1;
                }
                let ident: String = chars[start..i].iter().collect();
                check_ident(&ident)?;
                tokens.push(Token::Ident(ident));
            }
            '=' | '!' => {
                let is_eq = c == '=';
                if next == Some('=') {
                    // `===` and `!==` read as their loose forms.
                    i += if chars.get(i + 2) == Some(&'=') { 3 } else { 2 };
                    tokens.push(Token::Op(if is_eq { Op::Eq } else { Op::Ne }));
                } else if is_eq {
                    return Err(unsafe_err("assignment inside expression"));
                } else {
                    tokens.push(Token::Op(Op::Not));
                    i += 1;
                }
            }
            '<' | '>' => {
                let with_eq = next == Some('=');
                let op = match (c, with_eq) {
                    ('<', false) => Op::Lt,
                    ('<', true) => Op::Le,
                    ('>', false) => Op::Gt,
                    _ => Op::Ge,
                };
                tokens.push(Token::Op(op));
                i += if with_eq { 2 } else { 1 };
            }
            '&' | '|' => {
                if next != Some(c) {
                    return Err(unsafe_err(format!("bitwise `{c}`")));
                }
                tokens.push(Token::Op(if c == '&' { Op::And } else { Op::Or }));
                i += 2;
            }
            '+' | '-' | '*' | '/' | '%' => {
                let op = match c {
                    '+' => Op::Plus,
                    '-' => Op::Minus,
                    '*' => Op::Star,
                    '/' => Op::Slash,
                    _ => Op::Percent,
                };
                tokens.push(Token::Op(op));
                i += 1;
            }
            other => return Err(unsafe_err(format!("character `{other}`"))),
        }
    }
    Ok(tokens)
}
