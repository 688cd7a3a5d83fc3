// Expression AST and a Pratt parser over lexer tokens.
//
// Expressions are parsed once at load time; the runtime only walks the tree.

use super::error::{ScriptError, ScriptResult};
use super::lexer::{self, Op, Token};
use super::value::Value;

const MAX_DEPTH: usize = 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    Text(String),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Lit(Value),
    Var(String),
    Template(Vec<TemplatePart>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
}

fn binding_power(op: Op) -> Option<(u8, BinOp)> {
    let bp = match op {
        Op::Or => (1, BinOp::Or),
        Op::And => (2, BinOp::And),
        Op::Eq => (3, BinOp::Eq),
        Op::Ne => (3, BinOp::Ne),
        Op::Lt => (4, BinOp::Lt),
        Op::Le => (4, BinOp::Le),
        Op::Gt => (4, BinOp::Gt),
        Op::Ge => (4, BinOp::Ge),
        Op::Plus => (5, BinOp::Add),
        Op::Minus => (5, BinOp::Sub),
        Op::Star => (6, BinOp::Mul),
        Op::Slash => (6, BinOp::Div),
        Op::Percent => (6, BinOp::Rem),
        Op::Not => return None,
    };
    Some(bp)
}

const PREFIX_BP: u8 = 7;

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
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn expect(&mut self, want: Token) -> ScriptResult<()> {
        match self.next() {
            Some(tok) if tok == want => Ok(()),
            Some(tok) => Err(ScriptError::Parse(format!("expected {want:?}, found {tok:?}"))),
            None => Err(ScriptError::Parse(format!("expected {want:?}, found end of input"))),
        }
    }

    fn expr(&mut self, min_bp: u8) -> ScriptResult<Expr> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ScriptError::Parse("expression nested too deeply".into()));
        }

        let mut lhs = match self.next() {
            Some(Token::Num(n)) => Expr::Lit(Value::Num(n)),
            Some(Token::Str(s)) => parse_template(&s, self.depth)?,
            Some(Token::Ident(name)) => match name.as_str() {
                "true" => Expr::Lit(Value::Bool(true)),
                "false" => Expr::Lit(Value::Bool(false)),
                "null" => Expr::Lit(Value::Null),
                _ if self.peek() == Some(&Token::LParen) => {
                    self.pos += 1;
                    Expr::Call(name, self.args()?)
                }
                _ => Expr::Var(name),
            },
            Some(Token::LParen) => {
                let inner = self.expr(0)?;
                self.expect(Token::RParen)?;
                inner
            }
            Some(Token::Op(Op::Minus)) => Expr::Unary(UnaryOp::Neg, Box::new(self.expr(PREFIX_BP)?)),
            Some(Token::Op(Op::Not)) => Expr::Unary(UnaryOp::Not, Box::new(self.expr(PREFIX_BP)?)),
            Some(tok) => return Err(ScriptError::Parse(format!("unexpected {tok:?}"))),
            None => return Err(ScriptError::Parse("unexpected end of expression".into())),
        };

        while let Some(Token::Op(op)) = self.peek() {
            let Some((bp, bin)) = binding_power(*op) else {
                return Err(ScriptError::Parse(format!("unexpected {op:?}")));
            };
            if bp <= min_bp {
                break;
            }
            self.pos += 1;
            let rhs = self.expr(bp)?;
            lhs = Expr::Binary(bin, Box::new(lhs), Box::new(rhs));
        }

        self.depth -= 1;
        Ok(lhs)
    }

    fn args(&mut self) -> ScriptResult<Vec<Expr>> {
        let mut args = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            args.push(self.expr(0)?);
            match self.next() {
                Some(Token::Comma) => continue,
                Some(Token::RParen) => return Ok(args),
                other => return Err(ScriptError::Parse(format!("expected `,` or `)`, found {other:?}"))),
            }
        }
    }
}

/// Splits a string literal on `${...}` and parses each hole as an expression.
fn parse_template(s: &str, depth: usize) -> ScriptResult<Expr> {
    if !s.contains("${") {
        return Ok(Expr::Lit(Value::Str(s.to_string())));
    }
    let mut parts = Vec::new();
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        if start > 0 {
            parts.push(TemplatePart::Text(rest[..start].to_string()));
        }
        let after = &rest[start + 2..];
        let end = after
            .find('}')
            .ok_or_else(|| ScriptError::Parse("unterminated `${` in string".into()))?;
        parts.push(TemplatePart::Expr(parse_nested(&after[..end], depth + 1)?));
        rest = &after[end + 1..];
    }
    if !rest.is_empty() {
        parts.push(TemplatePart::Text(rest.to_string()));
    }
    Ok(Expr::Template(parts))
}

fn parse_nested(src: &str, depth: usize) -> ScriptResult<Expr> {
    let tokens = lexer::tokenize(src)?;
    let mut parser = Parser { tokens, pos: 0, depth };
    let expr = parser.expr(0)?;
    if let Some(tok) = parser.peek() {
        return Err(ScriptError::Parse(format!("trailing {tok:?}")));
    }
    Ok(expr)
}

/// Validates and parses one expression.
pub fn parse(src: &str) -> ScriptResult<Expr> {
    if src.trim().is_empty() {
        return Err(ScriptError::Parse("empty expression".into()));
    }
    parse_nested(src, 0)
}
