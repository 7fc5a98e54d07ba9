//! 沙箱类引擎（CAPESandbox / TriageSandbox）：直接输出家族名，可带 `family:` 前缀
//! 例：family:Emotet、Emotet
use crate::grammar::builder::GrammarBuilder;
use crate::grammar::compiled::{slot, GrammarSpec};
use crate::grammar::segment::{capture, opt, seq};

pub fn grammar(b: &GrammarBuilder<'_>) -> GrammarSpec {
    GrammarSpec::new(seq([
        opt(b.re("family[:./-]?")),
        capture(slot::VEID, b.family_id(vec![b.re("[[:alnum:]]+")])),
    ]))
}
