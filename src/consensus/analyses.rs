//! 多引擎解码结果集合：共识命名、汇总统计
use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::classification::Classification;

use super::fuzzy;
use super::weights::{ConsensusVote, EngineWeights};
use super::ConsensusEngine;

/// 单个引擎的解码结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisEntry {
    pub engine: String,
    pub classification: Classification,
}

/// 描述性统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisStats {
    pub total: usize,
    pub eicar: usize,
    pub heuristic: usize,
    pub paramalware: usize,
    pub nonmalware: usize,
}

/// 同一样本的多引擎解码结果（输入顺序）
#[derive(Debug, Clone)]
pub struct Analyses<'c> {
    consensus: &'c ConsensusEngine,
    entries: Vec<AnalysisEntry>,
}

impl<'c> Analyses<'c> {
    pub(crate) fn new(consensus: &'c ConsensusEngine, entries: Vec<AnalysisEntry>) -> Self {
        Self { consensus, entries }
    }

    pub fn entries(&self) -> &[AnalysisEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, engine: &str) -> Option<&Classification> {
        self.entries
            .iter()
            .find(|e| e.engine == engine)
            .map(|e| &e.classification)
    }

    pub fn classifications(&self) -> impl Iterator<Item = &Classification> + '_ {
        self.entries.iter().map(|e| &e.classification)
    }

    /// 全部有效票（权重为 0 的候选已剔除）
    pub fn votes(&self, weights: &EngineWeights) -> Vec<ConsensusVote> {
        let weigher = self.consensus.weigher();
        self.entries
            .iter()
            .filter_map(|e| weigher.vote(&e.engine, &e.classification, weights))
            .collect()
    }

    pub fn infer_name(&self) -> Option<String> {
        self.infer_name_with_weights(self.consensus.default_weights())
    }

    pub fn infer_name_with_weights(&self, weights: &EngineWeights) -> Option<String> {
        let votes = self.votes(weights);
        self.consensus.elect(&votes).map(|v| v.name.clone())
    }

    /// 候选名称 -> 最高得分（按首次出现顺序）
    pub fn likelihoods(&self) -> Vec<(String, f64)> {
        let votes = self.votes(self.consensus.default_weights());
        let scores = self.consensus.scores(&votes);
        let mut out: Vec<(String, f64)> = Vec::new();
        for (vote, score) in votes.into_iter().zip(scores) {
            match out.iter_mut().find(|(name, _)| *name == vote.name) {
                Some((_, best)) => *best = best.max(score),
                None => out.push((vote.name, score)),
            }
        }
        out
    }

    /// 给定名称与共识名称的相似度（0~100）
    pub fn name_similarity(&self, name: &str) -> Option<f64> {
        self.infer_name()
            .map(|inferred| fuzzy::similarity(&inferred, name))
    }

    /// 汇总：对每个结果应用 extractor，按出现次数降序（同次数按字母序），可取前 top_k
    pub fn summarize<F, I>(&self, extractor: F, top_k: Option<usize>) -> Vec<String>
    where
        F: Fn(&Classification) -> I,
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut values: Vec<String> = self
            .classifications()
            .flat_map(|c| extractor(c).into_iter().map(Into::into))
            .filter(|v: &String| !v.is_empty())
            .collect();
        values.sort();

        let mut counts: Vec<(String, usize)> = Vec::new();
        for value in values {
            match counts.last_mut() {
                Some((last, n)) if *last == value => *n += 1,
                _ => counts.push((value, 1)),
            }
        }
        counts.sort_by(|a, b| b.1.cmp(&a.1));

        let keep = top_k.unwrap_or(counts.len());
        counts.into_iter().take(keep).map(|(v, _)| v).collect()
    }

    pub fn labels_summary(&self, top_k: Option<usize>) -> Vec<String> {
        self.summarize(|c| c.labels.iter().cloned().collect::<Vec<_>>(), top_k)
    }

    pub fn operating_system_summary(&self, top_k: Option<usize>) -> Vec<String> {
        self.summarize(|c| c.operating_system.clone(), top_k)
    }

    pub fn language_summary(&self, top_k: Option<usize>) -> Vec<String> {
        self.summarize(|c| c.language.clone(), top_k)
    }

    /// 全部漏洞编号（CVE / 微软公告号）
    pub fn vulnerability_ids(&self) -> BTreeSet<String> {
        self.classifications()
            .filter_map(|c| c.vulnerability_id.clone())
            .collect()
    }

    pub fn describe(&self) -> AnalysisStats {
        let mut stats = AnalysisStats::default();
        for c in self.classifications() {
            stats.total += 1;
            stats.eicar += c.is_eicar as usize;
            stats.heuristic += c.is_heuristic as usize;
            stats.paramalware += c.is_paramalware as usize;
            stats.nonmalware += c.is_nonmalware as usize;
        }
        stats
    }

    /// 各引擎结果按引擎名索引
    pub fn by_engine(&self) -> BTreeMap<&str, &Classification> {
        self.entries
            .iter()
            .map(|e| (e.engine.as_str(), &e.classification))
            .collect()
    }
}
