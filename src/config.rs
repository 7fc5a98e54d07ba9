//! 全局配置管理,存储所有可配置项

use std::path::PathBuf;

use rustc_hash::FxHashMap;

use crate::registry::normalize;

/// 词表来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VocabOrigin {
    Embedded,           // 内置词表（编译期 embed）
    Directory(PathBuf), // 本地目录（运行时读取 <taxonomy>.json）
}

/// 语法匹配选项
#[derive(Debug, Clone)]
pub struct MatchOptions {
    /// 单次解码的回溯步数上限，超出视为无法匹配
    pub step_limit: usize,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self { step_limit: 200_000 }
    }
}

/// 共识推断选项
#[derive(Debug, Clone)]
pub struct ConsensusOptions {
    /// 引擎可信度权重（键为归一化后的引擎名，未列出的引擎权重为 1.0）
    pub engine_weights: FxHashMap<String, f64>,
    /// 无家族名时退化到 taxon 的权重系数
    pub taxon_weight: f64,
    /// 相似度下限（0~100），低于该值的候选对不计分
    pub similarity_floor: f64,
    /// 候选数达到该阈值时启用 rayon 并行计分
    pub parallel_threshold: usize,
}

impl Default for ConsensusOptions {
    fn default() -> Self {
        let mut engine_weights = FxHashMap::default();
        engine_weights.insert("triagesandbox".to_string(), 30.0);
        engine_weights.insert("capesandbox".to_string(), 20.0);
        Self {
            engine_weights,
            taxon_weight: 0.5,
            similarity_floor: 45.0,
            parallel_threshold: 32,
        }
    }
}

/// 完整配置
#[derive(Debug, Clone, Default)]
pub struct UniteConfig {
    pub vocab_origin: VocabOrigin,
    pub match_options: MatchOptions,
    pub consensus: ConsensusOptions,
}

impl Default for VocabOrigin {
    fn default() -> Self {
        VocabOrigin::Embedded
    }
}

impl UniteConfig {
    /// 内置词表
    pub fn embedded() -> Self {
        Self::default()
    }

    /// 本地词表目录
    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self {
            vocab_origin: VocabOrigin::Directory(path.into()),
            ..Self::default()
        }
    }

    /// 自定义配置
    pub fn custom() -> CustomConfigBuilder {
        CustomConfigBuilder::new()
    }
}

/// 配置构建器（便于自定义配置）
#[derive(Debug, Clone, Default)]
pub struct CustomConfigBuilder {
    config: UniteConfig,
}

impl CustomConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vocab_origin(mut self, origin: VocabOrigin) -> Self {
        self.config.vocab_origin = origin;
        self
    }

    pub fn step_limit(mut self, limit: usize) -> Self {
        self.config.match_options.step_limit = limit;
        self
    }

    /// 设置单个引擎的可信度权重（引擎名自动归一化）
    pub fn engine_weight(mut self, engine: &str, weight: f64) -> Self {
        self.config
            .consensus
            .engine_weights
            .insert(normalize(engine), weight);
        self
    }

    /// 清空默认的沙箱权重
    pub fn clear_engine_weights(mut self) -> Self {
        self.config.consensus.engine_weights.clear();
        self
    }

    pub fn taxon_weight(mut self, weight: f64) -> Self {
        self.config.consensus.taxon_weight = weight;
        self
    }

    pub fn similarity_floor(mut self, floor: f64) -> Self {
        self.config.consensus.similarity_floor = floor;
        self
    }

    pub fn parallel_threshold(mut self, threshold: usize) -> Self {
        self.config.consensus.parallel_threshold = threshold;
        self
    }

    pub fn build(self) -> UniteConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // 测试场景：默认内置词表 + 沙箱权重
        let config = UniteConfig::default();
        assert_eq!(config.vocab_origin, VocabOrigin::Embedded);
        assert_eq!(config.consensus.engine_weights.get("triagesandbox"), Some(&30.0));
        assert_eq!(config.consensus.engine_weights.get("capesandbox"), Some(&20.0));
        assert_eq!(config.consensus.taxon_weight, 0.5);
    }

    #[test]
    fn test_builder_normalizes_engine_names() {
        // 测试场景：构建器写入的引擎名按注册表规则归一化
        let config = UniteConfig::custom()
            .clear_engine_weights()
            .engine_weight("Quick Heal", 4.0)
            .step_limit(10)
            .build();
        assert_eq!(config.consensus.engine_weights.len(), 1);
        assert_eq!(config.consensus.engine_weights.get("quickheal"), Some(&4.0));
        assert_eq!(config.match_options.step_limit, 10);
    }
}
