//! K7：只有类型段与可选的九位十六进制编号，没有家族名
//! 例：Riskware ( 0040eff71 )、Trojan-Downloader ( 0054e0831 )、Spyware
use crate::grammar::builder::GrammarBuilder;
use crate::grammar::compiled::{slot, GrammarSpec};
use crate::grammar::segment::{alt, capture, opt, seq};

pub const KIND_SLOT: &str = "K7KIND";

pub fn grammar(b: &GrammarBuilder<'_>) -> GrammarSpec {
    let kind = capture(
        KIND_SLOT,
        alt([
            b.types(),
            seq([
                b.re("[A-Z][A-Za-z0-9]+"),
                opt(seq([b.re("-"), b.re("[A-Z][A-Za-z0-9]+")])),
            ]),
        ]),
    );

    let id = opt(seq([
        b.re(r" \( "),
        capture(slot::VEID, capture(slot::VARIANT, b.re("[a-f0-9]{9}"))),
        b.re(r" \)"),
    ]));

    GrammarSpec::new(seq([kind, id]))
        .withhold_family()
        .taxon_from(KIND_SLOT)
}
