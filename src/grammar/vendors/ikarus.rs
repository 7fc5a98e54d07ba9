//! Ikarus：`标签[-标签].平台.家族[.变种]`，常见 NewHeur_ 启发式写法
//! 例：Trojan-Spy.Win32.Zbot
use crate::grammar::builder::GrammarBuilder;
use crate::grammar::compiled::{slot, GrammarSpec};
use crate::grammar::segment::{alt, capture, end, opt, repeat, seq, star, start};

const VENDOR_WORDS: &str = "AIT|ALS|BDC|Conduit|Damaged|DongleHack|Fraud|Fake|FTP|MalwareScope|Optional|Patch|PCK|SPR|ToolKit|Troja|X2000M";

pub fn grammar(b: &GrammarBuilder<'_>) -> GrammarSpec {
    let head = star(seq([
        alt([b.re("[.:-]"), start()]),
        alt([
            b.label_pair(Some("-")),
            seq([opt(b.re("BehavesLike")), b.platform()]),
            b.re(VENDOR_WORDS),
            b.re("(?:Client|Server)-[[:alpha:]]+"),
        ]),
    ]));

    let family = opt(seq([
        alt([start(), b.re("[.:]")]),
        b.family_id(vec![
            b.re("(?P<HEURISTICS>NewHeur_[a-zA-Z0-9_-]+)"),
            seq([start(), b.re("[A-Z][a-zA-Z0-9_-]+"), end()]),
            b.re("PDF-[[:alnum:]]+"),
            b.re("Equation.Eternalblue"),
        ]),
    ]));

    let variants = repeat(
        b.variant_id(vec![
            b.re("[.]SuspectCRC"),
            b.re("20[0-9]{2}-[0-9]{1,6}"),
            b.re("[-][A-Z]"),
            seq([b.re("[-][0-9]+"), end()]),
            b.re("[.](?:Dm|Ra)"),
            b.re("[.]gen[0-9]x"),
            b.re("[.][A-Z]{2,3}"),
            b.re("[.][A-Z][a-z]{2}"),
            b.re("[.][A-Z]{1,2}[0-9]*"),
            seq([b.re("[.][A-Z][a-z0-9]"), end()]),
            b.re("[:][[:alpha:]]+"),
        ]),
        0,
        Some(3),
    );

    GrammarSpec::new(seq([
        head,
        opt(capture(
            slot::VEID,
            seq([family, variants, opt(seq([b.re("[.]"), b.platform()]))]),
        )),
    ]))
}
