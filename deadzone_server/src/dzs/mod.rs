//! DZS: the designer scripting language. Scripts are parsed once into an AST, hooked to
//! gameplay events and interpreted against a narrow host capability trait.

pub mod error;
pub mod expr;
pub mod help;
pub mod host;
pub mod lexer;
pub mod loader;
pub mod parser;
pub mod runtime;
pub mod value;

pub use error::{ScriptError, ScriptResult};
pub use host::{ScriptHost, Target};
pub use parser::EventKind;
pub use runtime::{Bindings, DispatchReport, Limits, Registry, ScriptEngine};
pub use value::Value;
