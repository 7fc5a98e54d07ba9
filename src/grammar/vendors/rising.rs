//! Rising：`标签.平台.家族[/角色]!变种`
//! 例：Trojan.Win32.Generic.1A2B3C4D、Worm.Nuj!8.2AD、Malware.Generic(Thunder)!1.A1C4
use crate::grammar::builder::GrammarBuilder;
use crate::grammar::compiled::{slot, GrammarSpec};
use crate::grammar::segment::{alt, capture, end, opt, seq, star};

pub fn grammar(b: &GrammarBuilder<'_>) -> GrammarSpec {
    let head = star(seq([
        b.sep("[./-]"),
        alt([
            b.labels(),
            b.platform(),
            b.re("BL|KL|Privacy|Andorid|Runonce|Runouce|Junk"),
        ]),
    ]));

    // Trojan.RA-based!8.80：连字符后缀不算家族的一部分
    let dashed = seq([
        b.re("[[:alpha:]]+"),
        b.not_ahead(&b.suffix_source(|alias| !alias.starts_with('-'))),
        b.re("-[[:alpha:]]+"),
    ]);

    let family = opt(seq([
        b.sep("[./-]"),
        b.family_id(vec![
            dashed,
            seq([b.re("[a-z][[:alpha:]]{4,}"), b.ahead("[.]")]),
            b.re("[0-9]+[A-Z][[:alpha:]]+"),
            b.re("[A-Z][[:alpha:]]+-(?:[A-Z][[:alpha:]]*|[0-9]+)"),
            b.re("[A-Z][[:alnum:]]+[(][[:alnum:]]+[)]"),
            seq([b.re("[A-Z][[:alpha:]]{1,2}"), b.ahead("[/!.-]")]),
            seq([b.behind("[.]"), b.re("[a-z]"), b.ahead("!")]),
        ]),
    ]));

    let role = opt(seq([
        b.re("/"),
        alt([b.labels(), b.platform(), b.re("Source|AllInOne|SLT|APT")]),
    ]));

    let variants = star(b.variant_id(vec![
        b.re("[!][[:alnum:]][.][[:xdigit:]]+"),
        b.re("[.][[:alnum:]][!][[:xdigit:]]+"),
        seq([b.re("[!][[:xdigit:]]{1,5}"), end()]),
        seq([b.re("[.][A-F0-9]{4,}"), end()]),
        b.lit("[HT]"),
        b.re("[#][0-9]{1,3}%"),
        b.re("[!]ET"),
        b.re("[#][A-Z][A-Z0-9]+"),
        b.re("/[A-Z][A-Z0-9]"),
        b.re("[!]tfe"),
        b.re("[@](?:CV|EP|URL|VE)"),
    ]));

    GrammarSpec::new(seq([
        head,
        capture(slot::VEID, seq([family, role, variants])),
    ]))
}
