//! 通用语法：`[标签|平台|混淆 分隔]*家族[变种]*`
//! 不参与厂商名自动匹配，调用方需以 "Generic" 显式选择
//! 例：Trojan.Win32.SubSeven.a
use crate::grammar::builder::GrammarBuilder;
use crate::grammar::compiled::{slot, GrammarSpec};
use crate::grammar::segment::{alt, capture, opt, seq, star, start};
use crate::vocab::Taxonomy;

pub fn grammar(b: &GrammarBuilder<'_>) -> GrammarSpec {
    let head = star(seq([
        alt([start(), b.re("[^A-Za-z0-9]")]),
        alt([b.labels(), b.vocab(Taxonomy::Obfuscations), b.platform()]),
    ]));

    GrammarSpec::new(seq([
        head,
        capture(
            slot::VEID,
            seq([
                opt(b.re("[^A-Za-z0-9]")),
                b.family_id(vec![]),
                star(b.variant_id(vec![b.re("[-_!.][[:alnum:]]+")])),
            ]),
        ),
    ]))
}
