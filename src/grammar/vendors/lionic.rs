//! Lionic：`标签.平台.家族.变种!后缀`
//! 例：Trojan.Win32.SubSeven.m!c
use crate::grammar::builder::GrammarBuilder;
use crate::grammar::compiled::{slot, GrammarSpec};
use crate::grammar::segment::{alt, capture, end, opt, seq, star, start};

pub fn grammar(b: &GrammarBuilder<'_>) -> GrammarSpec {
    let head = star(seq([
        alt([start(), b.re("[.]")]),
        alt([
            b.platform(),
            b.re("Email|W|pcap|HTTP|Shell"),
            b.label_pair(Some("-")),
        ]),
    ]));

    let family = opt(seq([
        b.sep("[.]"),
        alt([
            b.family_id(vec![
                b.re("[0-9A-Z][a-zA-Z0-9]_[0-9]"),
                seq([start(), b.re("[a-zA-Z0-9_]+"), end()]),
                b.re("(?:[0-9]{0,3})[A-Z][A-Za-z][0-9]{4}"),
            ]),
            seq([b.re("[A-Z][a-z]{1,2}"), b.ahead("[.]")]),
        ]),
    ]));

    let variants = star(b.variant_id(vec![seq([
        b.re("[.][[:alnum:]][!][[:alnum:]]"),
        end(),
    ])]));

    GrammarSpec::new(seq([head, capture(slot::VEID, seq([family, variants]))]))
}
