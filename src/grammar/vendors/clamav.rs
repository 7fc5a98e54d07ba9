//! ClamAV：`平台.标签.家族-编号`
//! 例：Win.Trojan.SubSeven-38、Doc.Dropper.Agent-6354812-0、Urlhaus.Malware.Blacklist.CRT.1f2e
use crate::grammar::builder::GrammarBuilder;
use crate::grammar::compiled::{slot, GrammarSpec};
use crate::grammar::segment::{alt, capture, opt, seq, star};

pub fn grammar(b: &GrammarBuilder<'_>) -> GrammarSpec {
    let head = star(seq([
        b.sep("[.]"),
        alt([b.platform(), b.labels(), b.re("Legacy")]),
    ]));

    let family = opt(seq([
        b.sep("[.]"),
        b.family_id(vec![
            b.re("Blacklist[.]CRT[.][[:xdigit:]]+"),
            b.re("[A-Z][[:alpha:]]+"),
            seq([b.re("[A-Z0-9][[:alnum:]]+"), b.ahead("-")]),
        ]),
    ]));

    let variants = star(b.variant_id(vec![
        b.re("-[0-9]+"),
        b.re(":[0-9]"),
        seq([b.re("[.][0-9]+"), b.ahead("-[0-9]")]),
        b.re("/CRDF(?:-[[:alnum:]])?"),
        b.re("[.]Extra_Field"),
    ]));

    GrammarSpec::new(seq([
        opt(b.re("Clamav|Urlhaus")),
        head,
        capture(slot::VEID, seq([family, variants])),
    ]))
}
