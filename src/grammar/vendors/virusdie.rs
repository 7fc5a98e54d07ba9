//! Virusdie：网页脚本类命名，家族段无法识别时整体兜底
use crate::grammar::builder::GrammarBuilder;
use crate::grammar::compiled::{slot, GrammarSpec};
use crate::grammar::segment::{alt, capture, opt, seq, star};

pub fn grammar(b: &GrammarBuilder<'_>) -> GrammarSpec {
    let head = star(alt([seq([b.lead("[.-]"), b.platform()]), b.labels()]));

    GrammarSpec::new(seq([
        head,
        capture(
            slot::VEID,
            seq([
                opt(seq([
                    b.lead("[.]"),
                    alt([b.family_id(vec![]), b.re(".+")]),
                ])),
                star(b.variant_id(vec![])),
            ]),
        ),
    ]))
}
