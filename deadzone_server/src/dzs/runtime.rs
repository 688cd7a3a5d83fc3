// Tree-walking interpreter and the handler registry.
//
// Every handler invocation gets a fresh frame and a step budget. A `for` loop also has
// an iteration cap: reaching it ends the loop silently (with a warning) while exhausting
// the budget aborts the whole handler.

use super::error::{ScriptError, ScriptResult};
use super::expr::{BinOp, Expr, TemplatePart, UnaryOp};
use super::host::{HudRect, HudText, ScriptHost, SpawnRequest, Target};
use super::parser::{AssignOp, EventKind, Handler, HudOp, ParsedScript, SpawnKind, Stmt, TargetSel, TopLevel};
use super::value::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub const DEFAULT_LOOP_CAP: u32 = 10_000;
pub const DEFAULT_STEP_BUDGET: u64 = 250_000;
const LOG_THROTTLE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub loop_cap: u32,
    pub step_budget: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            loop_cap: DEFAULT_LOOP_CAP,
            step_budget: DEFAULT_STEP_BUDGET,
        }
    }
}

/// Immutable handler set; swapped as a whole on reload.
#[derive(Debug, Default)]
pub struct Registry {
    handlers: BTreeMap<EventKind, Vec<Handler>>,
    top_level: Vec<TopLevel>,
    pub files: usize,
    pub issues: usize,
}

impl Registry {
    pub fn add(&mut self, parsed: ParsedScript) {
        self.files += 1;
        self.issues += parsed.issues.len();
        for h in parsed.handlers {
            self.handlers.entry(h.event).or_default().push(h);
        }
        self.top_level.extend(parsed.top_level);
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.values().map(Vec::len).sum()
    }

    pub fn handlers_for(&self, event: EventKind) -> &[Handler] {
        self.handlers.get(&event).map_or(&[], Vec::as_slice)
    }
}

/// Per-occurrence variables plus the player the event is about, if any.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    pub actor: Option<u64>,
    pub vars: Vec<(String, Value)>,
}

impl Bindings {
    pub fn new(actor: Option<u64>) -> Self {
        Self {
            actor,
            vars: Vec::new(),
        }
    }

    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.vars.push((name.to_string(), value.into()));
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Handlers whose condition held and whose body ran to completion.
    pub ran: usize,
    pub failed: usize,
}

struct ErrorThrottle {
    last: Option<Instant>,
    suppressed: u64,
}

impl ErrorThrottle {
    fn should_log(&mut self) -> bool {
        if self.last.map_or(true, |t| t.elapsed() >= LOG_THROTTLE) {
            self.last = Some(Instant::now());
            true
        } else {
            self.suppressed += 1;
            false
        }
    }
}

pub struct ScriptEngine {
    registry: Arc<Registry>,
    globals: HashMap<String, Value>,
    limits: Limits,
    errors: ErrorThrottle,
}

impl ScriptEngine {
    pub fn new(limits: Limits) -> Self {
        Self {
            registry: Arc::new(Registry::default()),
            globals: HashMap::new(),
            limits,
            errors: ErrorThrottle {
                last: None,
                suppressed: 0,
            },
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn global(&self, name: &str) -> Option<&Value> {
        self.globals.get(name)
    }

    /// Replaces the whole handler set, resets globals and runs top-level statements once.
    pub fn install<H: ScriptHost + ?Sized>(&mut self, registry: Registry, host: &mut H) {
        let registry = Arc::new(registry);
        self.registry = Arc::clone(&registry);
        self.globals.clear();

        for item in &registry.top_level {
            let mut exec = Exec::new(&mut *host, &mut self.globals, &Bindings::default(), self.limits, &item.file);
            exec.top_level = true;
            if let Err(e) = exec.stmt(&item.stmt) {
                warn!(file = %item.file, line = item.line, error = %e, "top-level script statement failed");
            }
        }
        info!(
            files = registry.files,
            handlers = registry.handler_count(),
            issues = registry.issues,
            "scripts installed"
        );
    }

    /// Runs every handler for `event` whose condition holds. A failing handler is
    /// logged and the rest still run.
    pub fn dispatch<H: ScriptHost + ?Sized>(&mut self, event: EventKind, bindings: &Bindings, host: &mut H) -> DispatchReport {
        let registry = Arc::clone(&self.registry);
        let mut report = DispatchReport::default();
        for handler in registry.handlers_for(event) {
            let mut exec = Exec::new(&mut *host, &mut self.globals, bindings, self.limits, &handler.file);
            match exec.handler(handler) {
                Ok(true) => report.ran += 1,
                Ok(false) => {}
                Err(e) => {
                    report.failed += 1;
                    if self.errors.should_log() {
                        warn!(
                            event = event.name(),
                            file = %handler.file,
                            line = handler.line,
                            suppressed = self.errors.suppressed,
                            error = %e,
                            "script handler failed"
                        );
                        self.errors.suppressed = 0;
                    }
                }
            }
        }
        report
    }
}

struct Exec<'a, H: ScriptHost + ?Sized> {
    host: &'a mut H,
    globals: &'a mut HashMap<String, Value>,
    locals: HashMap<String, Value>,
    actor: Option<u64>,
    limits: Limits,
    steps: u64,
    file: &'a str,
    top_level: bool,
}

impl<'a, H: ScriptHost + ?Sized> Exec<'a, H> {
    fn new(
        host: &'a mut H,
        globals: &'a mut HashMap<String, Value>,
        bindings: &Bindings,
        limits: Limits,
        file: &'a str,
    ) -> Self {
        Self {
            host,
            globals,
            locals: bindings.vars.iter().cloned().collect(),
            actor: bindings.actor,
            limits,
            steps: 0,
            file,
            top_level: false,
        }
    }

    fn step(&mut self) -> ScriptResult<()> {
        self.steps += 1;
        if self.steps > self.limits.step_budget {
            return Err(ScriptError::Budget(self.limits.step_budget));
        }
        Ok(())
    }

    /// Returns whether the body ran.
    fn handler(&mut self, h: &Handler) -> ScriptResult<bool> {
        if let Some(cond) = &h.cond {
            if !self.eval(cond)?.truthy() {
                return Ok(false);
            }
        }
        self.block(&h.body)?;
        Ok(true)
    }

    fn lookup(&self, name: &str) -> ScriptResult<Value> {
        self.locals
            .get(name)
            .or_else(|| self.globals.get(name))
            .cloned()
            .ok_or_else(|| ScriptError::Runtime(format!("unknown identifier `{name}`")))
    }

    fn declare(&mut self, name: &str, value: Value) {
        if self.top_level {
            self.globals.insert(name.to_string(), value);
        } else {
            self.locals.insert(name.to_string(), value);
        }
    }

    fn assign(&mut self, name: &str, value: Value) {
        match self.locals.get_mut(name) {
            Some(slot) => *slot = value,
            None => {
                self.globals.insert(name.to_string(), value);
            }
        }
    }

    fn block(&mut self, stmts: &[Stmt]) -> ScriptResult<()> {
        for s in stmts {
            self.stmt(s)?;
        }
        Ok(())
    }

    fn stmt(&mut self, s: &Stmt) -> ScriptResult<()> {
        self.step()?;
        match s {
            Stmt::Let { name, expr } => {
                let v = self.eval(expr)?;
                self.declare(name, v);
            }
            Stmt::Assign { name, op, expr } => {
                let rhs = self.eval(expr)?;
                let v = match op {
                    AssignOp::Set => rhs,
                    AssignOp::Add => add(&self.lookup(name).unwrap_or_default(), &rhs)?,
                    AssignOp::Sub => Value::Num(self.lookup(name).unwrap_or_default().as_num()? - rhs.as_num()?),
                };
                self.assign(name, v);
            }
            Stmt::If { cond, then, otherwise } => {
                if self.eval(cond)?.truthy() {
                    self.block(then)?;
                } else {
                    self.block(otherwise)?;
                }
            }
            Stmt::For { init, cond, step, body } => {
                if let Some(init) = init {
                    self.stmt(init)?;
                }
                let mut iterations = 0u32;
                loop {
                    if let Some(cond) = cond {
                        if !self.eval(cond)?.truthy() {
                            break;
                        }
                    }
                    if iterations >= self.limits.loop_cap {
                        warn!(file = self.file, cap = self.limits.loop_cap, "loop iteration cap reached; loop stopped");
                        break;
                    }
                    iterations += 1;
                    self.block(body)?;
                    if let Some(step) = step {
                        self.stmt(step)?;
                    }
                }
            }
            Stmt::Spawn { kind, args } => {
                let args = self.eval_args(args)?;
                let req = spawn_request(*kind, &args)?;
                if self.host.spawn(req).is_none() {
                    debug!(file = self.file, "spawn request refused");
                }
            }
            Stmt::Hud { op, target, args } => {
                let target = self.target(target)?;
                let args = self.eval_args(args)?;
                self.hud(*op, target, &args)?;
            }
            Stmt::Expr(e) => {
                self.eval(e)?;
            }
        }
        Ok(())
    }

    fn eval_args(&mut self, args: &[(String, Expr)]) -> ScriptResult<HashMap<String, Value>> {
        args.iter()
            .map(|(k, e)| Ok((k.clone(), self.eval(e)?)))
            .collect()
    }

    fn target(&mut self, sel: &TargetSel) -> ScriptResult<Target> {
        Ok(match sel {
            TargetSel::All => Target::All,
            TargetSel::SelfPlayer => Target::Player(self.actor_or_err()?),
            TargetSel::Player(e) => Target::Player(self.eval(e)?.as_id()?),
            TargetSel::Radius(x, z, r) => Target::Radius {
                x: self.eval(x)?.as_num()? as f32,
                z: self.eval(z)?.as_num()? as f32,
                r: self.eval(r)?.as_num()? as f32,
            },
        })
    }

    fn actor_or_err(&self) -> ScriptResult<u64> {
        self.actor
            .ok_or_else(|| ScriptError::Runtime("no acting player for this event".into()))
    }

    fn hud(&mut self, op: HudOp, target: Target, args: &HashMap<String, Value>) -> ScriptResult<()> {
        let id = args.get("id").map(ToString::to_string);
        let num = |key: &str, default: f64| -> ScriptResult<f32> {
            Ok(args.get(key).map(Value::as_num).transpose()?.unwrap_or(default) as f32)
        };
        let color = args
            .get("color")
            .map_or_else(|| "#ffffff".to_string(), ToString::to_string);
        let ttl_ms = args
            .get("ttl")
            .map(Value::as_num)
            .transpose()?
            .filter(|ms| *ms > 0.0)
            .map(|ms| ms as u64);

        match op {
            HudOp::Text => {
                let item = HudText {
                    id: id.unwrap_or_else(|| "text".into()),
                    text: args.get("text").map(ToString::to_string).unwrap_or_default(),
                    x: num("x", 0.0)?,
                    y: num("y", 0.0)?,
                    size: num("size", 16.0)?,
                    color,
                    ttl_ms,
                };
                self.host.hud_text(target, item);
            }
            HudOp::Rect => {
                let item = HudRect {
                    id: id.unwrap_or_else(|| "rect".into()),
                    x: num("x", 0.0)?,
                    y: num("y", 0.0)?,
                    w: num("w", 10.0)?,
                    h: num("h", 10.0)?,
                    color,
                    ttl_ms,
                };
                self.host.hud_rect(target, item);
            }
            HudOp::Clear => {
                self.host.hud_clear(target, id.as_deref());
            }
        }
        Ok(())
    }

    fn eval(&mut self, e: &Expr) -> ScriptResult<Value> {
        self.step()?;
        match e {
            Expr::Lit(v) => Ok(v.clone()),
            Expr::Var(name) => self.lookup(name),
            Expr::Template(parts) => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        TemplatePart::Text(t) => out.push_str(t),
                        TemplatePart::Expr(e) => out.push_str(&self.eval(e)?.to_string()),
                    }
                }
                Ok(Value::Str(out))
            }
            Expr::Unary(UnaryOp::Neg, inner) => Ok(Value::Num(-self.eval(inner)?.as_num()?)),
            Expr::Unary(UnaryOp::Not, inner) => Ok(Value::Bool(!self.eval(inner)?.truthy())),
            Expr::Binary(BinOp::And, l, r) => {
                let truthy = self.eval(l)?.truthy() && self.eval(r)?.truthy();
                Ok(Value::Bool(truthy))
            }
            Expr::Binary(BinOp::Or, l, r) => {
                let truthy = self.eval(l)?.truthy() || self.eval(r)?.truthy();
                Ok(Value::Bool(truthy))
            }
            Expr::Binary(op, l, r) => {
                let a = self.eval(l)?;
                let b = self.eval(r)?;
                binary(*op, &a, &b)
            }
            Expr::Call(name, args) => {
                let mut values = Vec::with_capacity(args.len());
                for a in args {
                    values.push(self.eval(a)?);
                }
                self.call(name, &values)
            }
        }
    }

    /// Trailing optional player id, defaulting to the acting player.
    fn player_arg(&self, args: &[Value], idx: usize) -> ScriptResult<u64> {
        match args.get(idx) {
            Some(v) => v.as_id(),
            None => self.actor_or_err(),
        }
    }

    fn call(&mut self, name: &str, args: &[Value]) -> ScriptResult<Value> {
        let arg = |i: usize| -> ScriptResult<&Value> {
            args.get(i)
                .ok_or_else(|| ScriptError::Type(format!("{name}() expects at least {} argument(s)", i + 1)))
        };
        let num = |i: usize| -> ScriptResult<f64> { arg(i)?.as_num() };

        let v = match name {
            "min" | "max" => {
                let first = num(0)?;
                let mut acc = first;
                for v in &args[1..] {
                    let n = v.as_num()?;
                    acc = if name == "min" { acc.min(n) } else { acc.max(n) };
                }
                Value::Num(acc)
            }
            "abs" => Value::Num(num(0)?.abs()),
            "floor" => Value::Num(num(0)?.floor()),
            "ceil" => Value::Num(num(0)?.ceil()),
            "round" => Value::Num(num(0)?.round()),
            "sqrt" => Value::Num(num(0)?.sqrt()),
            "clamp" => {
                let (v, lo, hi) = (num(0)?, num(1)?, num(2)?);
                Value::Num(v.max(lo).min(hi))
            }
            "random" => {
                let r = self.host.random();
                match (args.first(), args.get(1)) {
                    (Some(lo), Some(hi)) => {
                        let (lo, hi) = (lo.as_num()?, hi.as_num()?);
                        Value::Num(lo + (hi - lo) * r)
                    }
                    _ => Value::Num(r),
                }
            }
            "str" => Value::Str(arg(0)?.to_string()),
            "log" => {
                let text: Vec<String> = args.iter().map(ToString::to_string).collect();
                info!(file = self.file, "{}", text.join(" "));
                Value::Null
            }
            "toast" => {
                let text = arg(0)?.to_string();
                let target = match args.get(1) {
                    Some(id) => Target::Player(id.as_id()?),
                    None => self.actor.map_or(Target::All, Target::Player),
                };
                Value::from(self.host.toast(target, &text) as f64)
            }
            "getCash" => {
                let p = self.player_arg(args, 0)?;
                Value::from(self.host.cash(p))
            }
            "getHp" => {
                let p = self.player_arg(args, 0)?;
                Value::from(self.host.hp(p))
            }
            "addCash" => {
                let p = self.player_arg(args, 1)?;
                Value::Bool(self.host.add_cash(p, num(0)?.round() as i64))
            }
            "takeCash" => {
                let p = self.player_arg(args, 1)?;
                Value::Bool(self.host.take_cash(p, num(0)?.round() as i64))
            }
            "setCash" => {
                let p = self.player_arg(args, 1)?;
                Value::Bool(self.host.set_cash(p, num(0)?.round() as i64))
            }
            "giveWeapon" => {
                let weapon = arg(0)?.to_string();
                let p = self.player_arg(args, 1)?;
                Value::Bool(self.host.give_weapon(p, &weapon))
            }
            "takeWeapon" => {
                let weapon = arg(0)?.to_string();
                let p = self.player_arg(args, 1)?;
                Value::Bool(self.host.take_weapon(p, &weapon))
            }
            "restock" => {
                let weapon = args.first().filter(|v| **v != Value::Null).map(ToString::to_string);
                let p = self.player_arg(args, 1)?;
                Value::Bool(self.host.restock(p, weapon.as_deref()))
            }
            "setAmmo" => {
                let weapon = arg(0)?.to_string();
                let clip = num(1)?.max(0.0) as u32;
                let reserve = num(2)?.max(0.0) as u32;
                let p = self.player_arg(args, 3)?;
                Value::Bool(self.host.set_ammo(p, &weapon, clip, reserve))
            }
            "teleport" => {
                let (x, z) = (num(0)? as f32, num(1)? as f32);
                let p = self.player_arg(args, 2)?;
                Value::Bool(self.host.teleport(p, x, z))
            }
            "teleportZombie" => {
                let id = arg(0)?.as_id()?;
                Value::Bool(self.host.teleport_zombie(id, num(1)? as f32, num(2)? as f32))
            }
            "setGodMode" => {
                let on = arg(0)?.truthy();
                let p = self.player_arg(args, 1)?;
                Value::Bool(self.host.set_god_mode(p, on))
            }
            other => return Err(ScriptError::UnknownFunction(other.to_string())),
        };
        Ok(v)
    }
}

fn add(a: &Value, b: &Value) -> ScriptResult<Value> {
    match (a, b) {
        (Value::Str(_), _) | (_, Value::Str(_)) => Ok(Value::Str(format!("{a}{b}"))),
        _ => Ok(Value::Num(a.as_num()? + b.as_num()?)),
    }
}

fn binary(op: BinOp, a: &Value, b: &Value) -> ScriptResult<Value> {
    let v = match op {
        BinOp::Add => return add(a, b),
        BinOp::Sub => Value::Num(a.as_num()? - b.as_num()?),
        BinOp::Mul => Value::Num(a.as_num()? * b.as_num()?),
        BinOp::Div | BinOp::Rem => {
            let d = b.as_num()?;
            if d == 0.0 {
                return Err(ScriptError::Runtime("division by zero".into()));
            }
            let n = a.as_num()?;
            Value::Num(if op == BinOp::Div { n / d } else { n % d })
        }
        BinOp::Eq => Value::Bool(a.loose_eq(b)),
        BinOp::Ne => Value::Bool(!a.loose_eq(b)),
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            let ord = match (a, b) {
                (Value::Str(x), Value::Str(y)) => x.partial_cmp(y),
                _ => a.as_num()?.partial_cmp(&b.as_num()?),
            };
            let Some(ord) = ord else {
                return Ok(Value::Bool(false));
            };
            Value::Bool(match op {
                BinOp::Lt => ord.is_lt(),
                BinOp::Le => ord.is_le(),
                BinOp::Gt => ord.is_gt(),
                _ => ord.is_ge(),
            })
        }
        BinOp::And | BinOp::Or => {
            return Err(ScriptError::Runtime(format!("{op:?} must short-circuit")));
        }
    };
    Ok(v)
}

fn spawn_request(kind: SpawnKind, args: &HashMap<String, Value>) -> ScriptResult<SpawnRequest> {
    let opt = |key: &str| -> ScriptResult<Option<f32>> {
        args.get(key)
            .map(|v| v.as_num().map(|n| n as f32))
            .transpose()
    };
    let req = |key: &str| -> ScriptResult<f32> {
        opt(key)?.ok_or_else(|| ScriptError::Runtime(format!("spawn needs `{key}`")))
    };
    let x = req("x")?;
    let z = req("z")?;
    Ok(match kind {
        SpawnKind::Obstacle(shape) => SpawnRequest::Obstacle {
            shape,
            x,
            z,
            w: opt("w")?,
            d: opt("d")?,
            h: opt("h")?,
            rotated: args.get("rot").is_some_and(Value::truthy),
        },
        SpawnKind::Weapon => SpawnRequest::Weapon {
            weapon: args
                .get("id")
                .or_else(|| args.get("weapon"))
                .map(ToString::to_string)
                .ok_or_else(|| ScriptError::Runtime("spawn weapon needs `id`".into()))?,
            x,
            z,
        },
        SpawnKind::Zombie => SpawnRequest::Zombie {
            x,
            z,
            hp: opt("hp")?.map(|hp| hp.round() as i32),
            speed: opt("speed")?,
        },
    })
}
