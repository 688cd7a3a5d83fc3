use super::parser::EventKind;

const STATEMENTS: &[&str] = &[
    "on <event> (<condition>) { ... }",
    "let name = expr / set name = expr",
    "name = expr, name += expr, name -= expr, name++, name--",
    "if (cond) { ... } else if (cond) { ... } else { ... }",
    "for (init; cond; step) { ... }",
    "spawn box|bush|car|bus x= z= [w= d= h= rot=]",
    "spawn weapon id= x= z=",
    "spawn zombie x= z= [hp= speed=]",
    "hudText target=<sel> id= text= x= y= [size= color= ttl=]",
    "hudRect target=<sel> id= x= y= w= h= [color= ttl=]",
    "hudClear target=<sel> [id=]",
    "targets: all, self, player(id), radius(x, z, r)",
];

const FUNCTIONS: &[&str] = &[
    "addCash(n [, p]), takeCash(n [, p]), setCash(n [, p]), getCash([p]), getHp([p])",
    "giveWeapon(id [, p]), takeWeapon(id [, p]), restock([id [, p]]), setAmmo(id, clip, reserve [, p])",
    "teleport(x, z [, p]), teleportZombie(id, x, z), setGodMode(on [, p])",
    "toast(text [, p]), log(...), str(v)",
    "min, max, abs, floor, ceil, round, sqrt, clamp(v, lo, hi), random() / random(lo, hi)",
];

/// Reference lines sent in reply to a help request.
pub fn help_lines() -> Vec<String> {
    let events = EventKind::ALL.map(EventKind::name).join(", ");
    let mut lines = vec![format!("events: {events}")];
    lines.extend(STATEMENTS.iter().map(|s| format!("stmt: {s}")));
    lines.extend(FUNCTIONS.iter().map(|s| format!("fn: {s}")));
    lines
}
