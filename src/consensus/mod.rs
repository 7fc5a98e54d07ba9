//! 共识命名：多引擎解码结果加权模糊投票
//! 每个候选的得分 = 其余候选中相似度不低于下限者的 (相似度 × 对方权重) 之和
pub mod analyses;
pub mod fuzzy;
pub mod weights;

use rayon::prelude::*;

use crate::config::ConsensusOptions;
use crate::error::RspResult;
use crate::registry::Decoder;
use crate::utils::{preview, PREVIEW_LEN};
use crate::vocab::Vocabulary;

pub use analyses::{AnalysisEntry, AnalysisStats, Analyses};
pub use weights::{ConsensusVote, EngineWeights, NameWeigher, DEFAULT_ENGINE_WEIGHT};

/// 共识推断引擎
#[derive(Debug)]
pub struct ConsensusEngine {
    decoder: Decoder,
    weigher: NameWeigher,
    weights: EngineWeights,
    similarity_floor: f64,
    parallel_threshold: usize,
}

impl ConsensusEngine {
    pub fn new(decoder: Decoder, vocab: &Vocabulary, options: &ConsensusOptions) -> RspResult<Self> {
        Ok(Self {
            decoder,
            weigher: NameWeigher::new(vocab, options.taxon_weight)?,
            weights: options
                .engine_weights
                .iter()
                .map(|(engine, weight)| (engine.as_str(), *weight))
                .collect(),
            similarity_floor: options.similarity_floor,
            parallel_threshold: options.parallel_threshold,
        })
    }

    pub fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    pub fn weigher(&self) -> &NameWeigher {
        &self.weigher
    }

    /// 配置中的默认引擎权重
    pub fn default_weights(&self) -> &EngineWeights {
        &self.weights
    }

    /// 批量解码：未知引擎与无法匹配的条目静默跳过，其他错误记录 warn 后跳过，保持输入顺序
    pub fn analyze<I, K, V>(&self, results: I) -> Analyses<'_>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut entries = Vec::new();
        for (engine, raw) in results {
            let (engine, raw) = (engine.as_ref(), raw.as_ref());
            match self.decoder.decode(engine, raw) {
                Ok(classification) => entries.push(AnalysisEntry {
                    engine: engine.to_string(),
                    classification,
                }),
                Err(e) if e.is_per_entry() => log::debug!(
                    "Entry skipped | Engine: {} | Input: {} | Reason: {}",
                    engine,
                    preview(raw, PREVIEW_LEN),
                    e
                ),
                Err(e) => log::warn!(
                    "Entry dropped on unexpected error | Engine: {} | Input: {} | Reason: {}",
                    engine,
                    preview(raw, PREVIEW_LEN),
                    e
                ),
            }
        }
        Analyses::new(self, entries)
    }

    /// 推断共识名称（使用默认引擎权重）
    pub fn infer_name<I, K, V>(&self, results: I) -> Option<String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.analyze(results).infer_name()
    }

    /// 推断共识名称（调用方指定引擎权重，替换默认值）
    pub fn infer_name_with_weights<I, K, V>(&self, results: I, weights: &EngineWeights) -> Option<String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.analyze(results).infer_name_with_weights(weights)
    }

    /// 计算每张票的得分（与 votes 一一对应）
    /// 候选数达到阈值时在 rayon 线程池上并行，每个得分独立求和，结果与串行一致
    pub fn scores(&self, votes: &[ConsensusVote]) -> Vec<f64> {
        let prepared: Vec<String> = votes.iter().map(|v| fuzzy::preprocess(&v.name)).collect();
        let score = |i: usize| -> f64 {
            prepared
                .iter()
                .zip(votes)
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, (other, vote))| {
                    let similarity = fuzzy::prepared_similarity(&prepared[i], other);
                    if similarity >= self.similarity_floor {
                        similarity * vote.weight
                    } else {
                        0.0
                    }
                })
                .sum()
        };

        if votes.len() >= self.parallel_threshold {
            (0..votes.len()).into_par_iter().map(score).collect()
        } else {
            (0..votes.len()).map(score).collect()
        }
    }

    /// 选出得分最高的票（同分取先出现者）
    pub fn elect<'v>(&self, votes: &'v [ConsensusVote]) -> Option<&'v ConsensusVote> {
        let scores = self.scores(votes);
        let mut best: Option<(usize, f64)> = None;
        for (i, score) in scores.iter().copied().enumerate() {
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((i, score));
            }
        }
        let (index, score) = best?;
        log::debug!(
            "Consensus elected | Name: {} | Score: {:.3} | Votes: {}",
            votes[index].name,
            score,
            votes.len()
        );
        votes.get(index)
    }
}
