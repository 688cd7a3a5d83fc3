// Line-oriented DZS script parser.
//
// Source is normalized first: comments are stripped outside string literals and every
// brace is split onto its own logical line. The block tree is then built with a cursor
// over those lines. A bad `on` header or a bad statement inside a handler drops that
// handler only; the rest of the file still loads.

use super::error::{ScriptError, ScriptResult};
use super::expr::{self, Expr};
use super::host::ObstacleShape;
use super::lexer::{self, Token};
use super::value::Value;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    Damage,
    Kill,
    Tick,
    GameStart,
    PlayerSpawn,
    PlayerDeath,
    WaveStart,
    WaveEnd,
}

impl EventKind {
    pub const ALL: [EventKind; 8] = [
        EventKind::Damage,
        EventKind::Kill,
        EventKind::Tick,
        EventKind::GameStart,
        EventKind::PlayerSpawn,
        EventKind::PlayerDeath,
        EventKind::WaveStart,
        EventKind::WaveEnd,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            EventKind::Damage => "damage",
            EventKind::Kill => "kill",
            EventKind::Tick => "tick",
            EventKind::GameStart => "gameStart",
            EventKind::PlayerSpawn => "playerSpawn",
            EventKind::PlayerDeath => "playerDeath",
            EventKind::WaveStart => "waveStart",
            EventKind::WaveEnd => "waveEnd",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Set,
    Add,
    Sub,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TargetSel {
    All,
    SelfPlayer,
    Player(Expr),
    Radius(Expr, Expr, Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HudOp {
    Text,
    Rect,
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnKind {
    Obstacle(ObstacleShape),
    Weapon,
    Zombie,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Let {
        name: String,
        expr: Expr,
    },
    Assign {
        name: String,
        op: AssignOp,
        expr: Expr,
    },
    If {
        cond: Expr,
        then: Vec<Stmt>,
        otherwise: Vec<Stmt>,
    },
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        step: Option<Box<Stmt>>,
        body: Vec<Stmt>,
    },
    Spawn {
        kind: SpawnKind,
        args: Vec<(String, Expr)>,
    },
    Hud {
        op: HudOp,
        target: TargetSel,
        args: Vec<(String, Expr)>,
    },
    Expr(Expr),
}

#[derive(Debug, Clone)]
pub struct Handler {
    pub event: EventKind,
    pub cond: Option<Expr>,
    pub body: Vec<Stmt>,
    pub file: Arc<str>,
    pub line: usize,
}

#[derive(Debug, Clone)]
pub struct TopLevel {
    pub stmt: Stmt,
    pub file: Arc<str>,
    pub line: usize,
}

#[derive(Debug, Clone)]
pub struct ParseIssue {
    pub file: Arc<str>,
    pub line: usize,
    pub error: ScriptError,
}

#[derive(Debug, Clone, Default)]
pub struct ParsedScript {
    pub handlers: Vec<Handler>,
    pub top_level: Vec<TopLevel>,
    pub issues: Vec<ParseIssue>,
}

#[derive(Debug, Clone, PartialEq)]
struct Line {
    no: usize,
    text: String,
}

/// Drops a `//` or `#` comment that starts outside a string literal.
fn strip_comment(line: &str) -> &str {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut prev_slash = false;
    for (i, c) in line.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '#' => return &line[..i],
            '/' if prev_slash => return &line[..i - 1],
            _ => {}
        }
        prev_slash = c == '/';
    }
    line
}

fn normalize(src: &str) -> Vec<Line> {
    let mut out = Vec::new();
    for (idx, raw) in src.lines().enumerate() {
        let no = idx + 1;
        let code = strip_comment(raw);
        let mut current = String::new();
        let mut quote: Option<char> = None;
        let mut escaped = false;
        for c in code.chars() {
            if let Some(q) = quote {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
                current.push(c);
                continue;
            }
            match c {
                '"' | '\'' => {
                    quote = Some(c);
                    current.push(c);
                }
                '{' | '}' => {
                    let piece = current.trim();
                    if !piece.is_empty() {
                        out.push(Line {
                            no,
                            text: piece.to_string(),
                        });
                    }
                    current.clear();
                    out.push(Line {
                        no,
                        text: c.to_string(),
                    });
                }
                _ => current.push(c),
            }
        }
        let piece = current.trim();
        if !piece.is_empty() {
            out.push(Line {
                no,
                text: piece.to_string(),
            });
        }
    }
    out
}

fn keyword<'a>(text: &'a str, word: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(word)?;
    match rest.chars().next() {
        None => Some(rest),
        Some(c) if c.is_whitespace() || c == '(' => Some(rest.trim_start()),
        _ => None,
    }
}

/// Inner text of `(...)` when the opening paren closes at the very end.
fn outer_parens(s: &str) -> Option<&str> {
    let s = s.trim();
    if !s.starts_with('(') || !s.ends_with(')') {
        return None;
    }
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return (i == s.len() - 1).then(|| &s[1..i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Splits on `sep` at paren depth zero outside string literals.
fn split_top_level(s: &str, sep: impl Fn(char) -> bool) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '(' => depth += 1,
            ')' => depth -= 1,
            c if depth == 0 && sep(c) => {
                parts.push(&s[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

fn parse_name(s: &str) -> ScriptResult<String> {
    match lexer::tokenize(s.trim())?.as_slice() {
        [Token::Ident(name)] => Ok(name.clone()),
        _ => Err(ScriptError::Parse(format!("expected a name, found `{}`", s.trim()))),
    }
}

fn leading_ident(s: &str) -> Option<(&str, &str)> {
    let end = s
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '.'))
        .map_or(s.len(), |(i, _)| i);
    let ident = &s[..end];
    ident
        .chars()
        .next()
        .filter(|c| c.is_ascii_alphabetic() || *c == '_')
        .map(|_| (ident, &s[end..]))
}

fn parse_args(s: &str) -> ScriptResult<Vec<(String, String)>> {
    split_top_level(s, char::is_whitespace)
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|piece| {
            let (key, value) = piece
                .split_once('=')
                .ok_or_else(|| ScriptError::Parse(format!("expected key=value, found `{piece}`")))?;
            Ok((parse_name(key)?, value.to_string()))
        })
        .collect()
}

fn parse_target(src: &str) -> ScriptResult<TargetSel> {
    match expr::parse(src)? {
        Expr::Var(name) if name == "all" => Ok(TargetSel::All),
        Expr::Var(name) if name == "self" => Ok(TargetSel::SelfPlayer),
        Expr::Call(name, mut args) if name == "player" && args.len() == 1 => Ok(TargetSel::Player(args.remove(0))),
        Expr::Call(name, args) if name == "radius" && args.len() == 3 => {
            let mut it = args.into_iter();
            match (it.next(), it.next(), it.next()) {
                (Some(x), Some(z), Some(r)) => Ok(TargetSel::Radius(x, z, r)),
                _ => Err(ScriptError::Parse("radius(x, z, r) needs three arguments".into())),
            }
        }
        _ => Err(ScriptError::Parse(format!("unknown target `{src}`"))),
    }
}

fn keyed_exprs(args: Vec<(String, String)>) -> ScriptResult<Vec<(String, Expr)>> {
    args.into_iter()
        .map(|(k, v)| Ok((k, expr::parse(&v)?)))
        .collect()
}

fn parse_spawn(rest: &str) -> ScriptResult<Stmt> {
    let rest = rest.trim();
    let (kind_name, args) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    let kind = match kind_name {
        "box" => SpawnKind::Obstacle(ObstacleShape::Box),
        "bush" => SpawnKind::Obstacle(ObstacleShape::Bush),
        "car" => SpawnKind::Obstacle(ObstacleShape::Car),
        "bus" => SpawnKind::Obstacle(ObstacleShape::Bus),
        "weapon" => SpawnKind::Weapon,
        "zombie" => SpawnKind::Zombie,
        other => return Err(ScriptError::Parse(format!("unknown spawn kind `{other}`"))),
    };
    Ok(Stmt::Spawn {
        kind,
        args: keyed_exprs(parse_args(args)?)?,
    })
}

fn parse_hud(op: HudOp, rest: &str) -> ScriptResult<Stmt> {
    let mut target = TargetSel::All;
    let mut args = Vec::new();
    for (key, value) in parse_args(rest)? {
        if key == "target" {
            target = parse_target(&value)?;
        } else {
            args.push((key, expr::parse(&value)?));
        }
    }
    Ok(Stmt::Hud { op, target, args })
}

/// Single-line statements: declarations, assignments, spawners, HUD ops, calls.
fn parse_simple(text: &str) -> ScriptResult<Stmt> {
    let text = text.trim();
    if let Some(rest) = keyword(text, "let").or_else(|| keyword(text, "set")) {
        let is_let = text.starts_with("let");
        let (name, value) = rest
            .split_once('=')
            .ok_or_else(|| ScriptError::Parse(format!("expected `name = value` in `{text}`")))?;
        let name = parse_name(name)?;
        let expr = expr::parse(value)?;
        return Ok(if is_let {
            Stmt::Let { name, expr }
        } else {
            Stmt::Assign {
                name,
                op: AssignOp::Set,
                expr,
            }
        });
    }
    if let Some(rest) = keyword(text, "spawn") {
        return parse_spawn(rest);
    }
    for (word, op) in [("hudText", HudOp::Text), ("hudRect", HudOp::Rect), ("hudClear", HudOp::Clear)] {
        if let Some(rest) = keyword(text, word) {
            return parse_hud(op, rest);
        }
    }

    if let Some((ident, tail)) = leading_ident(text) {
        let tail = tail.trim();
        let name = || parse_name(ident);
        let one = || Expr::Lit(Value::Num(1.0));
        if tail == "++" {
            return Ok(Stmt::Assign { name: name()?, op: AssignOp::Add, expr: one() });
        }
        if tail == "--" {
            return Ok(Stmt::Assign { name: name()?, op: AssignOp::Sub, expr: one() });
        }
        for (prefix, op) in [("+=", AssignOp::Add), ("-=", AssignOp::Sub)] {
            if let Some(value) = tail.strip_prefix(prefix) {
                return Ok(Stmt::Assign { name: name()?, op, expr: expr::parse(value)? });
            }
        }
        if let Some(value) = tail.strip_prefix('=').filter(|v| !v.starts_with('=')) {
            return Ok(Stmt::Assign { name: name()?, op: AssignOp::Set, expr: expr::parse(value)? });
        }
    }

    Ok(Stmt::Expr(expr::parse(text)?))
}

struct Cursor<'a> {
    lines: &'a [Line],
    pos: usize,
}

impl Cursor<'_> {
    fn peek(&self) -> Option<&Line> {
        self.lines.get(self.pos)
    }

    fn peek_text(&self) -> Option<&str> {
        self.peek().map(|l| l.text.as_str())
    }

    /// Consumes a brace block starting at the cursor, if there is one.
    fn skip_block(&mut self) {
        if self.peek_text() != Some("{") {
            return;
        }
        let mut depth = 0usize;
        while let Some(line) = self.lines.get(self.pos) {
            self.pos += 1;
            match line.text.as_str() {
                "{" => depth += 1,
                "}" => {
                    depth -= 1;
                    if depth == 0 {
                        return;
                    }
                }
                _ => {}
            }
        }
    }

    fn block(&mut self, errors: &mut Vec<(usize, ScriptError)>) -> Vec<Stmt> {
        let mut stmts = Vec::new();
        match self.peek() {
            Some(line) if line.text == "{" => self.pos += 1,
            Some(line) => {
                errors.push((line.no, ScriptError::Parse("expected `{`".into())));
                return stmts;
            }
            None => {
                let no = self.lines.last().map_or(0, |l| l.no);
                errors.push((no, ScriptError::Parse("expected `{` before end of file".into())));
                return stmts;
            }
        }
        loop {
            match self.peek() {
                None => {
                    let no = self.lines.last().map_or(0, |l| l.no);
                    errors.push((no, ScriptError::Parse("unterminated block".into())));
                    return stmts;
                }
                Some(line) if line.text == "}" => {
                    self.pos += 1;
                    return stmts;
                }
                Some(_) => {
                    if let Some(stmt) = self.statement(errors) {
                        stmts.push(stmt);
                    }
                }
            }
        }
    }

    fn if_chain(&mut self, no: usize, header: &str, errors: &mut Vec<(usize, ScriptError)>) -> Option<Stmt> {
        let cond = outer_parens(header)
            .ok_or_else(|| ScriptError::Parse("expected `if (condition)`".into()))
            .and_then(expr::parse);
        let then = self.block(errors);

        let mut otherwise = Vec::new();
        if let Some(line) = self.peek().cloned() {
            if let Some(rest) = keyword(&line.text, "else") {
                self.pos += 1;
                if let Some(nested) = keyword(rest, "if") {
                    otherwise.extend(self.if_chain(line.no, nested, errors));
                } else if rest.is_empty() {
                    otherwise = self.block(errors);
                } else {
                    errors.push((line.no, ScriptError::Parse(format!("unexpected `{rest}` after else"))));
                    self.skip_block();
                }
            }
        }

        match cond {
            Ok(cond) => Some(Stmt::If { cond, then, otherwise }),
            Err(e) => {
                errors.push((no, e));
                None
            }
        }
    }

    fn for_loop(&mut self, header: &str, errors: &mut Vec<(usize, ScriptError)>) -> ScriptResult<Stmt> {
        let parsed = outer_parens(header)
            .ok_or_else(|| ScriptError::Parse("expected `for (init; cond; step)`".into()))
            .and_then(|inner| {
                let parts = split_top_level(inner, |c| c == ';');
                let [init, cond, step] = parts.as_slice() else {
                    return Err(ScriptError::Parse("for header needs exactly three clauses".into()));
                };
                let opt_stmt = |s: &str| -> ScriptResult<Option<Box<Stmt>>> {
                    let s = s.trim();
                    if s.is_empty() {
                        Ok(None)
                    } else {
                        parse_simple(s).map(|st| Some(Box::new(st)))
                    }
                };
                let cond = match cond.trim() {
                    "" => None,
                    c => Some(expr::parse(c)?),
                };
                Ok((opt_stmt(*init)?, cond, opt_stmt(*step)?))
            });
        let body = self.block(errors);
        let (init, cond, step) = parsed?;
        Ok(Stmt::For { init, cond, step, body })
    }

    /// Parses one statement, consuming any block it owns even when it is malformed.
    fn statement(&mut self, errors: &mut Vec<(usize, ScriptError)>) -> Option<Stmt> {
        let line = self.peek()?.clone();
        self.pos += 1;
        let text = line.text.strip_suffix(';').unwrap_or(&line.text).trim();

        if text == "{" {
            self.pos -= 1;
            self.skip_block();
            errors.push((line.no, ScriptError::Parse("unexpected `{`".into())));
            return None;
        }
        if let Some(header) = keyword(text, "if") {
            return self.if_chain(line.no, header, errors);
        }
        if let Some(header) = keyword(text, "for") {
            return match self.for_loop(header, errors) {
                Ok(stmt) => Some(stmt),
                Err(e) => {
                    errors.push((line.no, e));
                    None
                }
            };
        }
        if keyword(text, "else").is_some() {
            errors.push((line.no, ScriptError::Parse("`else` without `if`".into())));
            self.skip_block();
            return None;
        }

        match parse_simple(text) {
            Ok(stmt) => Some(stmt),
            Err(e) => {
                errors.push((line.no, e));
                None
            }
        }
    }
}

fn on_header(text: &str) -> ScriptResult<(EventKind, Option<Expr>)> {
    let rest = keyword(text, "on").ok_or_else(|| ScriptError::Parse("expected `on <event>`".into()))?;
    let (name, tail) = leading_ident(rest).ok_or_else(|| ScriptError::Parse("missing event name".into()))?;
    let event = EventKind::from_name(name).ok_or_else(|| ScriptError::Parse(format!("unknown event `{name}`")))?;
    let tail = tail.trim();
    if tail.is_empty() {
        return Ok((event, None));
    }
    let inner = outer_parens(tail).ok_or_else(|| ScriptError::Parse(format!("malformed condition `{tail}`")))?;
    Ok((event, Some(expr::parse(inner)?)))
}

/// Parses one script file. Never fails as a whole; problems are reported as issues.
pub fn parse_script(src: &str, file: &str) -> ParsedScript {
    let file: Arc<str> = Arc::from(file);
    let lines = normalize(src);
    let mut cur = Cursor { lines: &lines, pos: 0 };
    let mut out = ParsedScript::default();
    let issue = |line: usize, error: ScriptError| ParseIssue {
        file: file.clone(),
        line,
        error,
    };

    while let Some(line) = cur.peek().cloned() {
        if line.text == "}" {
            cur.pos += 1;
            out.issues.push(issue(line.no, ScriptError::Parse("unmatched `}`".into())));
            continue;
        }

        let mut errors = Vec::new();
        if keyword(&line.text, "on").is_some() {
            cur.pos += 1;
            match on_header(&line.text) {
                Ok((event, cond)) => {
                    let body = cur.block(&mut errors);
                    if errors.is_empty() {
                        out.handlers.push(Handler {
                            event,
                            cond,
                            body,
                            file: file.clone(),
                            line: line.no,
                        });
                    }
                }
                Err(e) => {
                    errors.push((line.no, e));
                    cur.skip_block();
                }
            }
        } else if let Some(stmt) = cur.statement(&mut errors) {
            if errors.is_empty() {
                out.top_level.push(TopLevel {
                    stmt,
                    file: file.clone(),
                    line: line.no,
                });
            }
        }
        out.issues
            .extend(errors.into_iter().map(|(no, e)| issue(no, e)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dzs::expr::BinOp;

    #[test]
    fn comments_are_stripped_outside_strings() {
        assert_eq!(strip_comment("addCash(1) // bonus"), "addCash(1) ");
        assert_eq!(strip_comment("x = 1 # note"), "x = 1 ");
        assert_eq!(strip_comment("toast(\"#1 // top\")"), "toast(\"#1 // top\")");
        assert_eq!(strip_comment("a = 4 / 2"), "a = 4 / 2");
    }

    #[test]
    fn braces_get_their_own_lines() {
        let lines = normalize("on kill { addCash(2) }\n} else {");
        let texts: Vec<_> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, ["on kill", "{", "addCash(2)", "}", "}", "else", "{"]);
        assert_eq!(lines[4].no, 2);
        let templ = normalize("toast(\"${wave}\")");
        assert_eq!(templ.len(), 1);
    }

    #[test]
    fn handler_with_condition() {
        let parsed = parse_script("on damage (part == \"head\") {\n  addCash(1)\n}\n", "t.dzs");
        assert!(parsed.issues.is_empty(), "{:?}", parsed.issues);
        assert_eq!(parsed.handlers.len(), 1);
        let h = &parsed.handlers[0];
        assert_eq!(h.event, EventKind::Damage);
        assert!(matches!(h.cond, Some(Expr::Binary(BinOp::Eq, _, _))));
        assert_eq!(h.body.len(), 1);
        assert_eq!(h.line, 1);
    }

    #[test]
    fn bad_headers_skip_only_their_block() {
        let src = "on explode { addCash(1) }\non kill (a b) { addCash(1) }\non kill { addCash(3) }";
        let parsed = parse_script(src, "t.dzs");
        assert_eq!(parsed.handlers.len(), 1);
        assert_eq!(parsed.issues.len(), 2);
        assert_eq!(parsed.handlers[0].line, 3);
    }

    #[test]
    fn unsafe_statement_drops_its_handler() {
        let src = "on kill { addCash(1); addCash(2) }\non kill { addCash(5) }";
        let parsed = parse_script(src, "t.dzs");
        assert_eq!(parsed.handlers.len(), 1);
        assert!(matches!(parsed.issues[0].error, ScriptError::Unsafe(_)));
    }

    #[test]
    fn else_if_chains_nest() {
        let src = "on tick {\n if (wave == 1) {\n a = 1\n } else if (wave == 2) {\n a = 2\n } else {\n a = 3\n }\n}";
        let parsed = parse_script(src, "t.dzs");
        assert!(parsed.issues.is_empty(), "{:?}", parsed.issues);
        let Stmt::If { otherwise, .. } = &parsed.handlers[0].body[0] else {
            panic!("expected if");
        };
        let Stmt::If { otherwise: last, .. } = &otherwise[0] else {
            panic!("expected nested if");
        };
        assert_eq!(last.len(), 1);
    }

    #[test]
    fn for_header_and_updates() {
        let src = "let total = 0\nfor (let i = 0; i < 3; i++) {\n total += i\n}\n";
        let parsed = parse_script(src, "t.dzs");
        assert!(parsed.issues.is_empty(), "{:?}", parsed.issues);
        assert_eq!(parsed.top_level.len(), 2);
        let Stmt::For { init, cond, step, body } = &parsed.top_level[1].stmt else {
            panic!("expected for");
        };
        assert!(matches!(init.as_deref(), Some(Stmt::Let { .. })));
        assert!(cond.is_some());
        assert!(matches!(step.as_deref(), Some(Stmt::Assign { op: AssignOp::Add, .. })));
        assert!(matches!(body[0], Stmt::Assign { op: AssignOp::Add, .. }));
    }

    #[test]
    fn spawn_and_hud_arguments() {
        let src = "spawn car x=10 z=(2 + 3) rot=true\nhudText target=radius(0, 0, 5) id=\"w\" text=\"Wave ${wave}\" x=10 y=10";
        let parsed = parse_script(src, "t.dzs");
        assert!(parsed.issues.is_empty(), "{:?}", parsed.issues);
        let Stmt::Spawn { kind, args } = &parsed.top_level[0].stmt else {
            panic!("expected spawn");
        };
        assert_eq!(*kind, SpawnKind::Obstacle(ObstacleShape::Car));
        assert_eq!(args.len(), 3);
        let Stmt::Hud { op, target, args } = &parsed.top_level[1].stmt else {
            panic!("expected hud");
        };
        assert_eq!(*op, HudOp::Text);
        assert!(matches!(target, TargetSel::Radius(..)));
        assert_eq!(args.len(), 4);
    }

    #[test]
    fn unterminated_block_is_reported() {
        let parsed = parse_script("on kill {\n addCash(1)\n", "t.dzs");
        assert!(parsed.handlers.is_empty());
        assert_eq!(parsed.issues.len(), 1);
    }

    #[test]
    fn equality_is_not_assignment() {
        assert!(matches!(parse_simple("a == 1"), Ok(Stmt::Expr(_))));
        assert!(matches!(parse_simple("a = 1"), Ok(Stmt::Assign { op: AssignOp::Set, .. })));
        assert!(matches!(parse_simple("set a = b == 1"), Ok(Stmt::Assign { .. })));
    }
}
