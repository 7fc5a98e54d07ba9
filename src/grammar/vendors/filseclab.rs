//! FilSecLab：`[启发式:]平台.家族.变种`
//! 例：Win32.Zbot
use crate::grammar::builder::GrammarBuilder;
use crate::grammar::compiled::{slot, GrammarSpec};
use crate::grammar::segment::{alt, capture, end, opt, seq, star};
use crate::vocab::Taxonomy;

pub fn grammar(b: &GrammarBuilder<'_>) -> GrammarSpec {
    let family = opt(seq([
        b.sep("[.]"),
        capture(slot::FAMILY, b.re("[A-Z][[:alpha:]]+")),
    ]));

    let variants = star(b.variant_id(vec![
        seq([b.re("[.][A-Z]+"), end()]),
        b.re("[.]mg"),
        b.re("[.#/@][[:xdigit:]]*"),
    ]));

    GrammarSpec::new(seq([
        opt(seq([b.vocab(Taxonomy::Heuristics), b.re(":")])),
        opt(alt([b.platform(), b.labels()])),
        capture(slot::VEID, seq([family, variants])),
    ]))
}
