//! NANO-Antivirus：`标签.平台.家族.变种`
//! 例：Trojan.Win32.SubSeven.dqcy
use crate::grammar::builder::GrammarBuilder;
use crate::grammar::compiled::{slot, GrammarSpec};
use crate::grammar::segment::{alt, capture, opt, repeat, seq, star, start};
use crate::vocab::Taxonomy;

pub fn grammar(b: &GrammarBuilder<'_>) -> GrammarSpec {
    let head = star(seq([
        alt([b.re("[.-]"), start()]),
        alt([
            b.platform(),
            b.re("Riff"),
            b.labels(),
            b.vocab(Taxonomy::Obfuscations),
        ]),
    ]));

    let family = opt(seq([
        b.sep("[./]"),
        b.family_id(vec![
            b.re("hidIFrame"),
            b.re("Iframe-scroll"),
            b.re("[A-Z][[:alnum:]]+"),
            b.re("[0-9]+[a-z]{2,}[0-9]*"),
        ]),
    ]));

    GrammarSpec::new(seq([
        head,
        capture(
            slot::VEID,
            seq([family, repeat(b.variant_id(vec![]), 0, Some(2))]),
        ),
    ]))
}
