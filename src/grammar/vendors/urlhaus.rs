//! URLhaus：`[标签.]家族`，常见为裸家族名
//! 例：Emotet
use crate::grammar::builder::GrammarBuilder;
use crate::grammar::compiled::{slot, GrammarSpec};
use crate::grammar::segment::{capture, opt, seq, star};

pub fn grammar(b: &GrammarBuilder<'_>) -> GrammarSpec {
    GrammarSpec::new(seq([
        opt(b.labels()),
        capture(
            slot::VEID,
            seq([
                opt(seq([b.lead("[.]"), b.family_id(vec![])])),
                star(b.variant_id(vec![])),
            ]),
        ),
    ]))
}
