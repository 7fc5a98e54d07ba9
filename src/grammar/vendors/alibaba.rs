//! Alibaba：`[前缀:]平台/家族.十六进制变种`
//! 例：Win32/SubSeven.6ca32fd3、Trojan:Win32/Agent.ali1000101
use crate::grammar::builder::GrammarBuilder;
use crate::grammar::compiled::{slot, GrammarSpec};
use crate::grammar::segment::{alt, capture, end, opt, repeat, seq};

pub fn grammar(b: &GrammarBuilder<'_>) -> GrammarSpec {
    let prefix = opt(seq([
        alt([b.platform(), b.label_pair(Some("[-]")), b.re("[^:]*")]),
        alt([b.re("[:]"), end()]),
    ]));

    let variant = b.variant_id(vec![
        b.re("[.][[:xdigit:]]{1,10}"),
        b.re("[.]None"),
        b.re("[.]ali[[:xdigit:]]+"),
    ]);

    GrammarSpec::new(seq([
        prefix,
        b.platform(),
        b.re("[/]"),
        capture(
            slot::VEID,
            seq([
                b.family_id(vec![b.labels(), b.re("[[:alnum:]]+")]),
                repeat(variant, 0, Some(3)),
            ]),
        ),
    ]))
}
