//! 投票权重：引擎可信度 × 长度折扣 × 词表命中折扣
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::classification::Classification;
use crate::error::RspResult;
use crate::grammar::builder::{CVE_SOURCE, MS_BULLETIN_SOURCE};
use crate::grammar::{Atom, Terminal};
use crate::registry::normalize;
use crate::vocab::{Taxonomy, Vocabulary};

/// 未配置引擎的默认权重
pub const DEFAULT_ENGINE_WEIGHT: f64 = 1.0;

/// 词表折扣（按声明顺序，首个整串命中者生效）
const VOCAB_DISCOUNTS: [(Taxonomy, f64); 7] = [
    (Taxonomy::Labels, 1.0 / 8.0),
    (Taxonomy::Heuristics, 1.0 / 4.0),
    (Taxonomy::Obfuscations, 1.0 / 4.0),
    (Taxonomy::Languages, 1.0 / 8.0),
    (Taxonomy::Archives, 1.0 / 8.0),
    (Taxonomy::Macros, 1.0 / 8.0),
    (Taxonomy::OperatingSystems, 1.0 / 8.0),
];

const VULNERABILITY_DISCOUNT: f64 = 1.0 / 2.0;

/// 引擎可信度权重（键为归一化引擎名）
#[derive(Debug, Clone, Default)]
pub struct EngineWeights {
    weights: FxHashMap<String, f64>,
}

impl EngineWeights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, engine: &str, weight: f64) -> Self {
        self.weights.insert(normalize(engine), weight);
        self
    }

    pub fn get(&self, engine: &str) -> f64 {
        self.weights
            .get(&normalize(engine))
            .copied()
            .unwrap_or(DEFAULT_ENGINE_WEIGHT)
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

impl<K: AsRef<str>> FromIterator<(K, f64)> for EngineWeights {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self {
            weights: iter
                .into_iter()
                .map(|(engine, weight)| (normalize(engine.as_ref()), weight))
                .collect(),
        }
    }
}

/// 一张候选票
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsensusVote {
    pub engine: String,
    pub name: String,
    pub weight: f64,
}

/// 候选名称计权器
#[derive(Debug)]
pub struct NameWeigher {
    discounts: Vec<(Arc<dyn Atom>, f64)>,
    taxon_weight: f64,
}

impl NameWeigher {
    pub fn new(vocab: &Vocabulary, taxon_weight: f64) -> RspResult<Self> {
        let mut discounts: Vec<(Arc<dyn Atom>, f64)> = Vec::with_capacity(VOCAB_DISCOUNTS.len() + 2);
        for (taxonomy, factor) in VOCAB_DISCOUNTS {
            let matcher: Arc<dyn Atom> = vocab.plain_matcher(taxonomy)?;
            discounts.push((matcher, factor));
        }
        for source in [CVE_SOURCE, MS_BULLETIN_SOURCE] {
            let terminal: Arc<dyn Atom> = Arc::new(Terminal::compile(source, true)?);
            discounts.push((terminal, VULNERABILITY_DISCOUNT));
        }
        Ok(Self {
            discounts,
            taxon_weight,
        })
    }

    /// 名称自身的折扣（长度 + 词表），base 为折扣前权重
    pub fn weigh(&self, name: &str, base: f64) -> f64 {
        let len = name.chars().count();
        let mut weight = if len < 2 {
            0.0
        } else if len < 5 {
            base * len as f64 / 5.0
        } else if len > 10 {
            base / (len as f64).log10()
        } else {
            base
        };

        if weight > 0.0 {
            if let Some((_, factor)) = self
                .discounts
                .iter()
                .find(|(atom, _)| atom.full_captures(name).is_some())
            {
                weight *= factor;
            }
        }
        weight
    }

    /// 单条解码结果投出的票（权重为 0 时不投票）
    pub fn vote(
        &self,
        engine: &str,
        classification: &Classification,
        weights: &EngineWeights,
    ) -> Option<ConsensusVote> {
        let base = weights.get(engine);
        let (name, base) = match &classification.family {
            Some(family) => (family.as_str(), base),
            None => (classification.taxon.as_str(), base * self.taxon_weight),
        };
        let weight = self.weigh(name, base);
        (weight > 0.0).then(|| ConsensusVote {
            engine: engine.to_string(),
            name: name.to_string(),
            weight,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VocabOrigin;

    fn weigher() -> NameWeigher {
        let vocab = Vocabulary::load(VocabOrigin::Embedded).unwrap();
        NameWeigher::new(&vocab, 0.5).unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_engine_weights_normalized() {
        // 测试场景：引擎名任意写法共用权重，未配置者为默认值
        let weights: EngineWeights = [("Triage Sandbox", 30.0)].into_iter().collect();
        assert_eq!(weights.get("triagesandbox"), 30.0);
        assert_eq!(weights.get("TRIAGE-SANDBOX"), 30.0);
        assert_eq!(weights.get("ClamAV"), DEFAULT_ENGINE_WEIGHT);
        let weights = weights.with("Clam AV", 2.0);
        assert_eq!(weights.get("clamav"), 2.0);
        assert_eq!(weights.len(), 2);
    }

    #[test]
    fn test_length_discount() {
        // 测试场景：过短名称零权重/线性折扣，过长名称对数折扣
        let w = weigher();
        assert_eq!(w.weigh("X", 1.0), 0.0);
        assert!(close(w.weigh("Zbo", 1.0), 0.6));
        assert!(close(w.weigh("SubSeven", 1.0), 1.0));
        assert!(close(w.weigh("Kryptikbanker", 1.0), 1.0 / 13f64.log10()));
    }

    #[test]
    fn test_vocabulary_discount_order() {
        // 测试场景：命中词表的候选降权，首个命中规则生效
        let w = weigher();
        assert!(close(w.weigh("Trojan", 1.0), 1.0 / 8.0));
        assert!(close(w.weigh("Agent", 1.0), 1.0 / 4.0));
        assert!(close(w.weigh("Windows", 1.0), 1.0 / 8.0));
        let cve = w.weigh("CVE-2012-0158", 1.0);
        assert!(close(cve, 0.5 / 13f64.log10()));
        assert!(close(w.weigh("MS08-067", 1.0), 0.5));
    }
}
