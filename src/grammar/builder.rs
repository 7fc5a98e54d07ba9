//! 语法构建工具
//! GrammarKit：各厂商共享的词表原子与终结符缓存（每个分支只编译一次）
//! GrammarBuilder：单个厂商语法的构建器，提供通用命名习惯（家族段、变种段、CVE、微软公告号）
use std::cell::RefCell;
use std::sync::{Arc, RwLock};

use rustc_hash::FxHashMap;

use crate::error::{RspResult, RspolyuniteError};
use crate::vocab::{Taxonomy, VocabMatcher, Vocabulary};

use super::atom::Terminal;
use super::compiled::{slot, GrammarSpec};
use super::segment::{alt, capture, never, opt, seq, start, Look, Segment};

/// CVE 编号：CVE-2012-0158 / CVE_2017_11882 / Cve2010
pub const CVE_SOURCE: &str = r"(?P<exploit>(?P<CVE>(?:CVE|Cve|cve)(?:[-_]?(?P<CVEYEAR>[0-9]{4})(?:[-_]?(?:(?P<CVENTH>[0-9]+)[[:alpha:]]*))?)?))";

/// 微软安全公告号：MS08-067
pub const MS_BULLETIN_SOURCE: &str =
    r"(?P<exploit>(?P<microsoft_security_bulletin>MS(?P<MSSEC_YEAR>[0-9]{2})-(?P<MSSECNTH>[0-9]{1,3})))";

/// 家族段的通用兜底写法
const STANDARD_FAMILY: [&str; 2] = ["[0-9a-z]{1,2}[A-Z][a-zA-Z]{2,}", "[A-Z][a-zA-Z0-9_]{3,}"];

/// 变种段的通用兜底写法
const STANDARD_VARIANT: [&str; 3] = ["[.][A-Z]{1,3}", "[.][a-z0-9]{1,8}", "[.][A-Z][a-z][a-z]"];

type TerminalKey = (String, bool);

/// 厂商语法共享组件
#[derive(Debug)]
pub struct GrammarKit {
    vocab: Arc<Vocabulary>,
    atoms: FxHashMap<Taxonomy, Arc<VocabMatcher>>,
    suffix_literals: Vec<String>,
    terminals: RwLock<FxHashMap<TerminalKey, Arc<Terminal>>>,
}

impl GrammarKit {
    pub fn new(vocab: Arc<Vocabulary>) -> RspResult<Self> {
        let mut atoms = FxHashMap::default();
        for taxonomy in Taxonomy::ALL {
            if taxonomy != Taxonomy::Suffixes {
                atoms.insert(taxonomy, vocab.default_matcher(taxonomy)?);
            }
        }

        // 后缀不分组，按字面量长者优先拼接
        let mut suffix_literals: Vec<String> = vocab
            .root(Taxonomy::Suffixes)?
            .literal_aliases()
            .map(str::to_string)
            .collect();
        suffix_literals.sort_by(|a, b| b.len().cmp(&a.len()));

        Ok(Self {
            vocab,
            atoms,
            suffix_literals,
            terminals: RwLock::new(FxHashMap::default()),
        })
    }

    pub fn vocab(&self) -> &Arc<Vocabulary> {
        &self.vocab
    }

    /// 获取（或编译并缓存）终结符
    pub fn terminal(&self, source: &str, ignore_case: bool) -> RspResult<Arc<Terminal>> {
        let key = (source.to_string(), ignore_case);
        {
            let cache = self.terminals.read().unwrap_or_else(|e| e.into_inner());
            if let Some(t) = cache.get(&key) {
                return Ok(t.clone());
            }
        }
        let terminal = Arc::new(Terminal::compile(source, ignore_case)?);
        let mut cache = self.terminals.write().unwrap_or_else(|e| e.into_inner());
        Ok(cache.entry(key).or_insert(terminal).clone())
    }

    pub fn terminal_count(&self) -> usize {
        self.terminals.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn atom(&self, taxonomy: Taxonomy) -> Option<Segment> {
        self.atoms
            .get(&taxonomy)
            .map(|m| Segment::Atom(m.clone()))
    }

    /// 后缀字面量组成的正则分支
    fn suffix_source(&self, keep: impl Fn(&str) -> bool) -> String {
        self.suffix_literals
            .iter()
            .filter(|s| keep(s.as_str()))
            .map(|s| regex::escape(s))
            .collect::<Vec<_>>()
            .join("|")
    }
}

/// 单个厂商语法构建器
/// 终结符编译失败时记录首个错误并以空分支占位，finish 时统一返回
pub struct GrammarBuilder<'k> {
    kit: &'k GrammarKit,
    ignore_case: bool,
    error: RefCell<Option<RspolyuniteError>>,
}

impl<'k> GrammarBuilder<'k> {
    pub fn new(kit: &'k GrammarKit, ignore_case: bool) -> Self {
        Self {
            kit,
            ignore_case,
            error: RefCell::new(None),
        }
    }

    pub fn kit(&self) -> &GrammarKit {
        self.kit
    }

    fn record(&self, err: RspolyuniteError) {
        let mut first = self.error.borrow_mut();
        if first.is_none() {
            *first = Some(err);
        }
    }

    fn terminal(&self, source: &str) -> Option<Arc<Terminal>> {
        match self.kit.terminal(source, self.ignore_case) {
            Ok(t) => Some(t),
            Err(e) => {
                self.record(e);
                None
            }
        }
    }

    /// 正则终结符
    pub fn re(&self, source: &str) -> Segment {
        self.terminal(source)
            .map_or_else(never, |t| Segment::Atom(t))
    }

    /// 字面量终结符
    pub fn lit(&self, text: &str) -> Segment {
        self.re(&regex::escape(text))
    }

    fn look(&self, source: &str, wrap: fn(Arc<Terminal>) -> Look) -> Segment {
        self.terminal(source)
            .map_or_else(never, |t| Segment::Look(wrap(t)))
    }

    /// `(?=..)`
    pub fn ahead(&self, source: &str) -> Segment {
        self.look(source, Look::Ahead)
    }

    /// `(?!..)`
    pub fn not_ahead(&self, source: &str) -> Segment {
        self.look(source, Look::NotAhead)
    }

    /// `(?<=..)`
    pub fn behind(&self, source: &str) -> Segment {
        self.look(source, Look::Behind)
    }

    /// 分隔符在前、行首在后：`([.]|^)`
    pub fn sep(&self, class: &str) -> Segment {
        alt([self.re(class), start()])
    }

    /// 行首在前、分隔符在后：`(^|[.])`
    pub fn lead(&self, class: &str) -> Segment {
        alt([start(), self.re(class)])
    }

    // ===================== 词表原子 =====================

    pub fn vocab(&self, taxonomy: Taxonomy) -> Segment {
        match self.kit.atom(taxonomy) {
            Some(atom) => atom,
            None => {
                self.record(RspolyuniteError::InvalidInput(format!(
                    "{} cannot be used as a grouped grammar atom",
                    taxonomy
                )));
                never()
            }
        }
    }

    pub fn labels(&self) -> Segment {
        self.vocab(Taxonomy::Labels)
    }

    /// 连续两个标签：`LABELS(sep LABELS)?`，joiner 为 None 时直接相连
    pub fn label_pair(&self, joiner: Option<&str>) -> Segment {
        let second = match joiner {
            Some(j) => seq([opt(self.re(j)), self.labels()]),
            None => self.labels(),
        };
        seq([self.labels(), opt(second)])
    }

    /// 平台：操作系统 | 压缩包 | 宏 | 脚本语言 | 启发式 | 混淆
    pub fn platform(&self) -> Segment {
        alt([
            Taxonomy::OperatingSystems,
            Taxonomy::Archives,
            Taxonomy::Macros,
            Taxonomy::Languages,
            Taxonomy::Heuristics,
            Taxonomy::Obfuscations,
        ]
        .map(|t| self.vocab(t)))
    }

    /// 类型段：标签对或平台
    pub fn types(&self) -> Segment {
        capture(
            slot::TYPES,
            alt([self.label_pair(Some("-")), self.platform()]),
        )
    }

    /// 厂商后缀（不分组，大小写敏感，除非整个语法忽略大小写）
    pub fn suffixes(&self) -> Segment {
        self.re(&self.kit.suffix_source(|_| true))
    }

    /// 后缀字面量分支（按条件过滤）
    pub fn suffix_source(&self, keep: impl Fn(&str) -> bool) -> String {
        self.kit.suffix_source(keep)
    }

    // ===================== 通用命名习惯 =====================

    pub fn cve(&self) -> Segment {
        self.re(CVE_SOURCE)
    }

    pub fn ms_bulletin(&self) -> Segment {
        self.re(MS_BULLETIN_SOURCE)
    }

    /// 家族段：CVE | 微软公告号 | FAMILY(启发式 | 混淆 | 厂商写法... | 通用写法)
    pub fn family_id(&self, extra: Vec<Segment>) -> Segment {
        let mut branches = vec![
            self.vocab(Taxonomy::Heuristics),
            self.vocab(Taxonomy::Obfuscations),
        ];
        branches.extend(extra);
        branches.extend(STANDARD_FAMILY.map(|s| self.re(s)));
        alt([
            self.cve(),
            self.ms_bulletin(),
            capture(slot::FAMILY, alt(branches)),
        ])
    }

    /// 变种段：VARIANT(后缀 | 厂商写法... | 通用写法)
    pub fn variant_id(&self, extra: Vec<Segment>) -> Segment {
        let mut branches = vec![self.suffixes()];
        branches.extend(extra);
        branches.extend(STANDARD_VARIANT.map(|s| self.re(s)));
        capture(slot::VARIANT, alt(branches))
    }

    /// 结束构建：存在编译错误则返回首个错误
    pub fn finish(self, spec: GrammarSpec) -> RspResult<GrammarSpec> {
        match self.error.into_inner() {
            Some(err) => Err(err),
            None => Ok(spec),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VocabOrigin;
    use crate::grammar::engine::{full_match, MatchOutcome};

    fn kit() -> GrammarKit {
        GrammarKit::new(Arc::new(Vocabulary::load(VocabOrigin::Embedded).unwrap())).unwrap()
    }

    #[test]
    fn test_terminal_cache_shared() {
        // 测试场景：相同源码 + 大小写标记复用同一终结符
        let kit = kit();
        let a = kit.terminal("[.][0-9]+", false).unwrap();
        let b = kit.terminal("[.][0-9]+", false).unwrap();
        let c = kit.terminal("[.][0-9]+", true).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn test_builder_reports_first_error() {
        // 测试场景：非法正则在 finish 时报告
        let kit = kit();
        let b = GrammarBuilder::new(&kit, false);
        let root = seq([b.re("(unclosed"), b.re("[ok]")]);
        assert!(matches!(
            b.finish(GrammarSpec::new(root)),
            Err(RspolyuniteError::RegexCompileError(_))
        ));

        let b = GrammarBuilder::new(&kit, false);
        let root = b.vocab(Taxonomy::Suffixes);
        assert!(b.finish(GrammarSpec::new(root)).is_err());
    }

    #[test]
    fn test_family_id_cve_subcaptures() {
        // 测试场景：CVE 分支产出年份与序号子捕获
        let kit = kit();
        let b = GrammarBuilder::new(&kit, false);
        let grammar = b.family_id(vec![]);
        let input = "CVE-2017-11882";
        match full_match(&grammar, input, 10_000) {
            MatchOutcome::Matched(caps) => {
                let get = |n: &str| {
                    caps.iter()
                        .find(|c| c.name.as_ref() == n)
                        .map(|c| &input[c.start..c.end])
                };
                assert_eq!(get("CVEYEAR"), Some("2017"));
                assert_eq!(get("CVENTH"), Some("11882"));
                assert_eq!(get("FAMILY"), None);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_variant_id_prefers_suffix() {
        // 测试场景：后缀字面量优先于通用变种写法
        let kit = kit();
        let b = GrammarBuilder::new(&kit, false);
        let grammar = seq([b.re("[A-Z][a-z]+"), b.variant_id(vec![])]);
        let input = "Wacatac!ml";
        match full_match(&grammar, input, 10_000) {
            MatchOutcome::Matched(caps) => {
                let variant = caps.iter().find(|c| c.name.as_ref() == "VARIANT").unwrap();
                assert_eq!(&input[variant.start..variant.end], "!ml");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
}
