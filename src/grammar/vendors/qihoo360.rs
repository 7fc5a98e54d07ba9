//! Qihoo 360：整条语法忽略大小写
//! 例：HEUR/QVM10.1.5A1F.Malware.Gen、Win32/Trojan.Generic.HwoCPXwA
use crate::grammar::builder::GrammarBuilder;
use crate::grammar::compiled::{slot, GrammarSpec};
use crate::grammar::segment::{alt, capture, opt, repeat, seq, star};
use crate::vocab::Taxonomy;

pub fn grammar(b: &GrammarBuilder<'_>) -> GrammarSpec {
    let head = star(seq([
        b.sep("[./-]"),
        alt([
            b.re("Application|Sorter|AVE"),
            capture(slot::HEURISTICS, b.re("AutoVirus")),
            b.platform(),
            b.labels(),
            b.re(r"QVM\d+(?:[.]\d+)?(?:[.][[:xdigit:]]+)?"),
        ]),
    ]));

    // 家族段的短写法仍区分大小写
    let family = opt(seq([
        b.sep("[./]"),
        opt(b.family_id(vec![b.re("(?-i:[A-Z][a-z]{1,2})")])),
    ]));

    GrammarSpec::new(seq([
        opt(b.vocab(Taxonomy::Heuristics)),
        head,
        capture(
            slot::VEID,
            seq([family, repeat(b.variant_id(vec![]), 0, Some(2))]),
        ),
    ]))
}
