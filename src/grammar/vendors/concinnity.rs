//! Concinnity：点分的平台/标签序列，挖矿样本附带币种与钱包地址
//! 例：Miner.xmr.4AdUndXHHZ6cfufT
use crate::grammar::builder::GrammarBuilder;
use crate::grammar::compiled::GrammarSpec;
use crate::grammar::segment::{alt, capture, opt, seq, star};

pub fn grammar(b: &GrammarBuilder<'_>) -> GrammarSpec {
    let crypto = seq([
        capture("CRYPTOKIND", b.re("btc|eth|zec|xmr")),
        opt(seq([
            b.re("[.]"),
            capture("CRYPTO_ADDRESS", b.re("[A-Za-z0-9+/]+")),
        ])),
    ]);

    GrammarSpec::new(star(seq([
        b.sep("[.]"),
        alt([b.platform(), b.labels(), crypto]),
    ])))
}
