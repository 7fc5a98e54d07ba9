//! Dr.Web：`标签[.标签].家族.编号`
//! 例：BackDoor.SubSeven.145、Trojan.PWS.Stealer.1932、Exploit.CVE-2012-0158.1
use crate::grammar::builder::GrammarBuilder;
use crate::grammar::compiled::{slot, GrammarSpec};
use crate::grammar::segment::{alt, capture, opt, repeat, seq, star, start};

pub fn grammar(b: &GrammarBuilder<'_>) -> GrammarSpec {
    let head = star(seq([
        alt([start(), b.re("[.-]"), b.re(r"\s")]),
        alt([
            // PWS.xxx 是家族写法，不作为标签吞掉
            seq([b.not_ahead("PWS[.]"), b.labels(), opt(b.labels())]),
            b.platform(),
            b.re("STPAGE"),
        ]),
    ]));

    let family = opt(seq([
        b.sep("[.]"),
        b.not_ahead("Based"),
        alt([
            capture(
                slot::FAMILY,
                capture("password_stealer", b.re("PWS[.][A-Z][[:alnum:]]+")),
            ),
            b.family_id(vec![
                b.re("[A-Z]{2,3}"),
                b.re("[A-Z][A-Z0-9]{2,}"),
                seq([
                    start(),
                    b.re("[A-Z][a-z]+[.][A-Z][a-z]+"),
                    b.ahead("[.][0-9]+"),
                ]),
            ]),
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
