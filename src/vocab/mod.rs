//! 词表模块：层级词表加载 + 命名捕获匹配器编译
pub mod compiler;
pub mod loader;
pub mod node;

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::config::VocabOrigin;
use crate::error::{RspResult, RspolyuniteError};

pub use compiler::{PatternCompiler, VocabHit, VocabMatcher};
pub use loader::{Taxonomy, VocabLoader};
pub use node::VocabularyNode;

/// 默认命名区间：根节点 + 一级子节点
pub const DEFAULT_BAND: (usize, usize) = (0, 1);

/// 词表集合：持有全部内置词表根节点与编译器
/// 由上下文构建一次后只读共享
#[derive(Debug)]
pub struct Vocabulary {
    loader: VocabLoader,
    compiler: PatternCompiler,
    roots: FxHashMap<Taxonomy, Arc<VocabularyNode>>,
}

impl Vocabulary {
    /// 加载全部内置词表（任一失败即返回 ResourceLoadError）
    pub fn load(origin: VocabOrigin) -> RspResult<Self> {
        let loader = VocabLoader::new(origin);
        let mut roots = FxHashMap::default();
        for taxonomy in Taxonomy::ALL {
            roots.insert(taxonomy, loader.load_taxonomy(taxonomy)?);
        }
        Ok(Self {
            loader,
            compiler: PatternCompiler::new(),
            roots,
        })
    }

    pub fn loader(&self) -> &VocabLoader {
        &self.loader
    }

    pub fn compiler(&self) -> &PatternCompiler {
        &self.compiler
    }

    pub fn root(&self, taxonomy: Taxonomy) -> RspResult<&Arc<VocabularyNode>> {
        self.roots.get(&taxonomy).ok_or_else(|| {
            RspolyuniteError::ResourceLoadError(format!("Vocabulary not loaded: {}", taxonomy))
        })
    }

    /// 按区间编译某个词表
    pub fn matcher(&self, taxonomy: Taxonomy, min: usize, max: usize) -> RspResult<Arc<VocabMatcher>> {
        self.compiler.compile(self.root(taxonomy)?, min, max)
    }

    /// 默认区间 (0,1) 的匹配器
    pub fn default_matcher(&self, taxonomy: Taxonomy) -> RspResult<Arc<VocabMatcher>> {
        self.matcher(taxonomy, DEFAULT_BAND.0, DEFAULT_BAND.1)
    }

    /// 无命名分组的整串判定匹配器
    pub fn plain_matcher(&self, taxonomy: Taxonomy) -> RspResult<Arc<VocabMatcher>> {
        self.compiler.compile_plain(self.root(taxonomy)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_vocabulary_compiles() {
        // 测试场景：全部内置词表均可在默认区间编译
        let vocab = Vocabulary::load(VocabOrigin::Embedded).unwrap();
        for taxonomy in Taxonomy::ALL {
            let matcher = vocab.default_matcher(taxonomy).unwrap();
            assert_eq!(
                matcher.slot_names().next().map(|s| s.as_ref()),
                Some(taxonomy.resource_name())
            );
        }
    }

    #[test]
    fn test_embedded_vocabulary_samples() {
        // 测试场景：常见厂商写法归入正确节点
        let vocab = Vocabulary::load(VocabOrigin::Embedded).unwrap();
        let oses = vocab.default_matcher(Taxonomy::OperatingSystems).unwrap();
        for raw in ["Win32", "W32", "Win", "WIN64"] {
            let hits = oses.full_match(raw).unwrap();
            assert_eq!(hits.last().unwrap().name.as_ref(), "Windows", "{}", raw);
        }
        assert_eq!(oses.full_match("AndroidOS").unwrap()[1].name.as_ref(), "Android");

        let labels = vocab.default_matcher(Taxonomy::Labels).unwrap();
        assert_eq!(labels.full_match("BackDoor").unwrap()[1].name.as_ref(), "backdoor");
        assert_eq!(labels.full_match("PWS").unwrap()[1].name.as_ref(), "password_stealer");
        assert!(labels.full_match("SubSeven").is_none());

        let heuristics = vocab.matcher(Taxonomy::Heuristics, 1, 1).unwrap();
        assert!(heuristics.is_full_match("Agent"));
        assert!(heuristics.is_full_match("GenericKD"));
        assert!(!heuristics.is_full_match("SubSeven"));
    }
}
