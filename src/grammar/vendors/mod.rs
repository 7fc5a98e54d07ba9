//! 内置厂商语法表
//! 显式静态表：(厂商标识, 是否忽略大小写, 构建函数)，上下文初始化时逐条编译注册
use crate::error::RspResult;

use super::builder::{GrammarBuilder, GrammarKit};
use super::compiled::{CompiledGrammar, GrammarSpec};

pub mod alibaba;
pub mod clamav;
pub mod concinnity;
pub mod drweb;
pub mod filseclab;
pub mod generic;
pub mod ikarus;
pub mod jiangmin;
pub mod k7;
pub mod lionic;
pub mod nanoav;
pub mod qihoo360;
pub mod quickheal;
pub mod rising;
pub mod sandbox;
pub mod tachyon;
pub mod urlhaus;
pub mod virusdie;

/// 语法构建函数
pub type GrammarFactory = fn(&GrammarBuilder<'_>) -> GrammarSpec;

/// 内置语法表条目
#[derive(Debug, Clone, Copy)]
pub struct GrammarEntry {
    pub vendor_id: &'static str,
    pub ignore_case: bool,
    pub build: GrammarFactory,
}

const fn entry(vendor_id: &'static str, build: GrammarFactory) -> GrammarEntry {
    GrammarEntry {
        vendor_id,
        ignore_case: false,
        build,
    }
}

/// 通用语法的注册名（只能显式选择）
pub const GENERIC_VENDOR: &str = "Generic";

pub static BUILTIN_GRAMMARS: &[GrammarEntry] = &[
    entry("Alibaba", alibaba::grammar),
    entry("CAPESandbox", sandbox::grammar),
    entry("ClamAV", clamav::grammar),
    entry("Concinnity", concinnity::grammar),
    entry("DrWeb", drweb::grammar),
    entry("FilSecLab", filseclab::grammar),
    entry("Ikarus", ikarus::grammar),
    entry("Jiangmin", jiangmin::grammar),
    entry("K7", k7::grammar),
    entry("Lionic", lionic::grammar),
    entry("NanoAV", nanoav::grammar),
    GrammarEntry {
        vendor_id: "Qihoo360",
        ignore_case: true,
        build: qihoo360::grammar,
    },
    entry("QuickHeal", quickheal::grammar),
    entry("Rising", rising::grammar),
    entry("Tachyon", tachyon::grammar),
    entry("TriageSandbox", sandbox::grammar),
    entry("URLHaus", urlhaus::grammar),
    entry("Virusdie", virusdie::grammar),
    entry(GENERIC_VENDOR, generic::grammar),
];

/// 编译单条语法
pub fn compile_entry(kit: &GrammarKit, entry: &GrammarEntry) -> RspResult<CompiledGrammar> {
    let builder = GrammarBuilder::new(kit, entry.ignore_case);
    let spec = (entry.build)(&builder);
    let spec = builder.finish(spec)?;
    Ok(CompiledGrammar::new(entry.vendor_id, spec))
}
