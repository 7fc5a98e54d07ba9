//! Quick Heal：`平台.标签.家族.变种`
//! 例：Trojan.Mauvaise.SL1、Backdoor.Subseven.A4
use crate::grammar::builder::GrammarBuilder;
use crate::grammar::compiled::{slot, GrammarSpec};
use crate::grammar::segment::{alt, capture, end, opt, repeat, seq, star};

pub fn grammar(b: &GrammarBuilder<'_>) -> GrammarSpec {
    let head = star(seq([
        b.sep("[./]"),
        alt([b.platform(), b.label_pair(None), b.re("Cmd|PIF|alware")]),
    ]));

    let family = opt(seq([
        b.not_ahead(r"[.](?:[A-Z][[:xdigit:]]+(?-u:\b)|GEN[0-9]+)"),
        b.sep("[./]"),
        b.family_id(vec![b.re("[0-9]+[A-Z][a-z]+"), b.re("[A-Z][a-z]{2}")]),
    ]));

    let variants = repeat(
        b.variant_id(vec![
            b.re("PMF|B|AD|RI|FC|CS|VMF|MF"),
            seq([b.re("[.]A[a-f0-9]+"), end()]),
            seq([b.re("[.][0-9]+"), end()]),
            b.re("[.][A-Z][0-9A-F]{3,}"),
            b.re("[.]HTML[.][A-Z]"),
            b.re("[-][A-Z]"),
            b.re("[.][A-Z]{1,3}[0-9]{1,2}"),
        ]),
        0,
        Some(2),
    );

    GrammarSpec::new(seq([
        head,
        opt(capture(slot::VEID, seq([family, variants]))),
    ]))
}
