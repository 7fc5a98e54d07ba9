//! Tachyon：`标签-平台/平台.家族.编号`
//! 例：Trojan-Ransom/W32.DP-Conti.59392
use crate::grammar::builder::GrammarBuilder;
use crate::grammar::compiled::{slot, GrammarSpec};
use crate::grammar::segment::{alt, capture, plus, repeat, seq};

pub fn grammar(b: &GrammarBuilder<'_>) -> GrammarSpec {
    GrammarSpec::new(seq([
        plus(seq([b.lead("[-]"), alt([b.platform(), b.labels()])])),
        b.re("/"),
        b.platform(),
        capture(
            slot::VEID,
            seq([
                b.re("[.]"),
                b.family_id(vec![b.re("[A-Z]{2}[-][A-Z][[:alpha:]]+")]),
                repeat(b.variant_id(vec![b.re("[.][0-9]+")]), 0, Some(2)),
            ]),
        ),
    ]))
}
