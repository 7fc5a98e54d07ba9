//! 词表编译器：将词表节点编译为可复用的命名捕获匹配器
//! 仅深度落在 [min, max] 区间的节点拥有独立命名分组，更深节点折叠进祖先分组
use std::ops::Range;
use std::sync::{Arc, RwLock};

use regex::{Regex, RegexBuilder};
use rustc_hash::FxHashMap;

use crate::error::{RspResult, RspolyuniteError};
use crate::utils::length_bounds;

use super::node::VocabularyNode;

const VOCAB_REGEX_SIZE_LIMIT: usize = 32 * (1 << 20);

/// 一次命中的词表节点
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabHit {
    pub name: Arc<str>,
    pub span: Range<usize>,
}

/// 编译后的词表匹配器（构建后只读，可并发调用）
#[derive(Debug)]
pub struct VocabMatcher {
    node_path: String,
    depth_band: (usize, usize),
    source: String,
    /// (分组名 g{n}, 节点名)，先序即声明顺序
    slots: Vec<(String, Arc<str>)>,
    full: Regex,
    prefix: Regex,
    search: Regex,
    bounds: (usize, Option<usize>),
}

impl VocabMatcher {
    fn new(node: &VocabularyNode, min: usize, max: usize) -> RspResult<Self> {
        let mut slots = Vec::new();
        let source = build_source(node, min, max, &mut slots).ok_or_else(|| {
            RspolyuniteError::InvalidInput(format!(
                "Vocabulary node {} has nothing to match",
                node.path()
            ))
        })?;

        Ok(Self {
            node_path: node.path(),
            depth_band: (min, max),
            full: compile_vocab_regex(&format!("^(?:{})$", source))?,
            prefix: compile_vocab_regex(&format!("^(?:{})", source))?,
            search: compile_vocab_regex(&source)?,
            bounds: length_bounds(&source, true),
            source,
            slots,
        })
    }

    pub fn node_path(&self) -> &str {
        &self.node_path
    }

    pub fn depth_band(&self) -> (usize, usize) {
        self.depth_band
    }

    /// 未锚定的正则源码（不含大小写标记）
    pub fn source(&self) -> &str {
        &self.source
    }

    /// 可匹配的字节长度上下界
    pub fn length_bounds(&self) -> (usize, Option<usize>) {
        self.bounds
    }

    /// 全部可能产生的捕获名（声明顺序）
    pub fn slot_names(&self) -> impl Iterator<Item = &Arc<str>> + '_ {
        self.slots.iter().map(|(_, name)| name)
    }

    /// 整串匹配：返回所有参与匹配的命名节点及其区间
    pub fn full_match(&self, s: &str) -> Option<Vec<VocabHit>> {
        let caps = self.full.captures(s)?;
        Some(
            self.slots
                .iter()
                .filter_map(|(group, name)| {
                    caps.name(group).map(|m| VocabHit {
                        name: name.clone(),
                        span: m.range(),
                    })
                })
                .collect(),
        )
    }

    pub fn is_full_match(&self, s: &str) -> bool {
        self.full.is_match(s)
    }

    /// 是否存在以 s 开头的匹配
    pub fn matches_prefix(&self, s: &str) -> bool {
        self.prefix.is_match(s)
    }

    /// 非重叠扫描，每处命中取最深的命名节点
    pub fn find_iter(&self, s: &str) -> Vec<VocabHit> {
        self.search
            .captures_iter(s)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let name = self
                    .slots
                    .iter()
                    .filter(|(group, _)| caps.name(group).is_some())
                    .last()
                    .map(|(_, name)| name.clone())?;
                Some(VocabHit {
                    name,
                    span: whole.range(),
                })
            })
            .collect()
    }

    /// 首处命中的节点名
    pub fn first_name(&self, s: &str) -> Option<Arc<str>> {
        self.find_iter(s).into_iter().next().map(|hit| hit.name)
    }
}

fn compile_vocab_regex(pattern: &str) -> RspResult<Regex> {
    Ok(RegexBuilder::new(pattern)
        .case_insensitive(true)
        .size_limit(VOCAB_REGEX_SIZE_LIMIT)
        .build()?)
}

fn has_content(node: &VocabularyNode) -> bool {
    !node.aliases().is_empty()
        || !node.patterns().is_empty()
        || node.children().iter().any(|c| has_content(c))
}

/// 递归生成节点的正则源码
/// 子节点在前（声明顺序），其后是自身别名（长者优先）与正则片段
fn build_source(
    node: &VocabularyNode,
    min: usize,
    max: usize,
    slots: &mut Vec<(String, Arc<str>)>,
) -> Option<String> {
    if !has_content(node) {
        return None;
    }

    let named = min <= node.depth() && node.depth() <= max;
    // 先占位再递归，保证父分组序号先于子分组
    let group = named.then(|| {
        let group = format!("g{}", slots.len());
        slots.push((group.clone(), Arc::from(node.name())));
        group
    });

    let mut parts: Vec<String> = node
        .children()
        .iter()
        .filter_map(|child| build_source(child, min, max, slots))
        .collect();

    let mut aliases: Vec<&String> = node.aliases().iter().collect();
    aliases.sort_by(|a, b| b.len().cmp(&a.len()));
    parts.extend(aliases.into_iter().map(|a| regex::escape(a)));
    parts.extend(node.patterns().iter().map(|p| format!("(?:{})", p)));

    let body = parts.join("|");
    Some(match group {
        Some(group) => format!("(?P<{}>{})", group, body),
        None => format!("(?:{})", body),
    })
}

type CompileKey = (String, usize, usize);

/// 词表编译器（按 (节点路径, 深度区间) 缓存）
#[derive(Debug, Default)]
pub struct PatternCompiler {
    cache: RwLock<FxHashMap<CompileKey, Arc<VocabMatcher>>>,
}

impl PatternCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// 编译词表节点
    /// 参数：
    /// - node: 词表节点（可为任意子树）
    /// - min/max: 命名深度区间（绝对深度；min > max 表示不产生命名分组）
    /// 返回：缓存的匹配器
    pub fn compile(
        &self,
        node: &VocabularyNode,
        min: usize,
        max: usize,
    ) -> RspResult<Arc<VocabMatcher>> {
        let key = (node.path(), min, max);

        {
            let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
            if let Some(matcher) = cache.get(&key) {
                return Ok(matcher.clone());
            }
        }

        let matcher = Arc::new(VocabMatcher::new(node, min, max)?);
        log::debug!(
            "Vocabulary compiled | Node: {} | Band: {}..={} | Groups: {}",
            key.0,
            min,
            max,
            matcher.slots.len()
        );

        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        Ok(cache.entry(key).or_insert(matcher).clone())
    }

    /// 不产生命名分组的匹配器（仅做整串判定）
    pub fn compile_plain(&self, node: &VocabularyNode) -> RspResult<Arc<VocabMatcher>> {
        self.compile(node, 1, 0)
    }

    pub fn cached_count(&self) -> usize {
        self.cache.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}
