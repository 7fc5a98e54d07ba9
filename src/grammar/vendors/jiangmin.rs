//! Jiangmin：`标签/家族.变种`，分隔符可为 `.` `/` `:`
//! 例：Backdoor/SubSeven.22.a、TrojanSpy.Zbot.ebjn
use crate::grammar::builder::GrammarBuilder;
use crate::grammar::compiled::{slot, GrammarSpec};
use crate::grammar::segment::{alt, capture, end, opt, repeat, seq, star};
use crate::vocab::Taxonomy;

pub fn grammar(b: &GrammarBuilder<'_>) -> GrammarSpec {
    let head = star(seq([
        b.sep("[./:]"),
        alt([
            b.vocab(Taxonomy::Heuristics),
            b.re("Intended|Garbage|Riot"),
            b.label_pair(Some("-")),
            b.vocab(Taxonomy::Obfuscations),
            b.platform(),
        ]),
    ]));

    let family = opt(seq([
        b.sep("[./]"),
        b.family_id(vec![b.re("[A-Z][a-z]+-[0-9]")]),
    ]));

    let variants = repeat(
        b.variant_id(vec![
            seq([b.re("[.][[:alnum:]]+"), end()]),
            seq([b.re("[.][A-Z][a-z]"), end()]),
        ]),
        0,
        Some(2),
    );

    GrammarSpec::new(seq([head, capture(slot::VEID, seq([family, variants]))]))
}
