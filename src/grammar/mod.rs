//! 厂商语法：片段组合 + 回溯匹配引擎 + 内置厂商语法表
pub mod atom;
pub mod builder;
pub mod compiled;
pub mod engine;
pub mod segment;
pub mod vendors;

pub use atom::{Atom, Terminal};
pub use builder::{GrammarBuilder, GrammarKit};
pub use compiled::{slot, CompiledGrammar, DerivationRules, GrammarSpec};
pub use engine::{full_match, Capture, MatchOutcome};
pub use segment::Segment;
pub use vendors::{compile_entry, GrammarEntry, GrammarFactory, BUILTIN_GRAMMARS, GENERIC_VENDOR};
