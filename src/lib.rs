//! rspolyunite - 杀软厂商病毒命名解码与多引擎家族名共识推断

pub mod classification;
pub mod config;
pub mod consensus;
pub mod context;
pub mod error;
pub mod global;
pub mod grammar;
pub mod registry;
pub mod utils;
pub mod vocab;

// 导出全局错误类型
pub use self::error::{RspResult, RspolyuniteError};

// 导出配置模块核心结构体与构建器
pub use self::config::{ConsensusOptions, CustomConfigBuilder, MatchOptions, UniteConfig, VocabOrigin};

// 导出词表模块核心接口
pub use self::vocab::{PatternCompiler, Taxonomy, VocabMatcher, Vocabulary, VocabularyNode};

// 导出语法模块核心接口
pub use self::grammar::{
    CompiledGrammar, GrammarBuilder, GrammarEntry, GrammarFactory, GrammarKit, GrammarSpec,
    BUILTIN_GRAMMARS, GENERIC_VENDOR,
};

// 导出分类与注册表核心接口
pub use self::classification::{Classification, ClassificationParser, FieldSpan};
pub use self::registry::{Decoder, EngineRegistry};

// 导出共识模块核心接口
pub use self::consensus::{
    AnalysisEntry, AnalysisStats, Analyses, ConsensusEngine, ConsensusVote, EngineWeights,
};

// 导出上下文与全局单例
pub use self::context::UniteContext;
pub use self::global::{global_context, init_global_context};

/// 使用全局上下文解码单条结果
pub fn decode(engine: &str, raw: &str) -> RspResult<Classification> {
    global_context()?.decode(engine, raw)
}

/// 使用全局上下文判断是否为启发式检测（任何错误返回 false）
pub fn is_heuristic(engine: &str, raw: &str) -> bool {
    match global_context() {
        Ok(ctx) => ctx.is_heuristic(engine, raw),
        Err(e) => {
            log::warn!("Global context unavailable | Reason: {}", e);
            false
        }
    }
}

/// 使用全局上下文批量解码
pub fn analyze<I, K, V>(results: I) -> RspResult<Analyses<'static>>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    Ok(global_context()?.analyze(results))
}

/// 使用全局上下文推断共识家族名
pub fn infer_name<I, K, V>(results: I) -> RspResult<Option<String>>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    Ok(global_context()?.infer_name(results))
}

/// 使用全局上下文汇总字段（按出现次数降序，同次数按字母序）
pub fn summarize<I, K, V, F, T>(results: I, extractor: F, top_k: Option<usize>) -> RspResult<Vec<String>>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
    F: Fn(&Classification) -> T,
    T: IntoIterator,
    T::Item: Into<String>,
{
    Ok(analyze(results)?.summarize(extractor, top_k))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn test_global_api() {
        // 测试场景：全局便捷接口端到端
        init_logger();
        let results = [
            ("Alibaba", "Win32/SubSeven.6ca32fd3"),
            ("ClamAV", "Win.Trojan.SubSeven-38"),
            ("DrWeb", "BackDoor.SubSeven.145"),
            ("Jiangmin", "Backdoor/SubSeven.22.a"),
            ("Lionic", "Trojan.Win32.SubSeven.m!c"),
            ("NanoAV", "Trojan.Win32.SubSeven.dqcy"),
            ("NOT_A_REAL_ENGINE", "Trojan.Win32.SubSeven"),
        ];
        assert_eq!(infer_name(results).unwrap().as_deref(), Some("SubSeven"));
        assert_eq!(
            summarize(results, |c| c.labels.iter().cloned().collect::<Vec<_>>(), Some(1)).unwrap(),
            vec!["trojan"]
        );
        assert_eq!(analyze(results).unwrap().len(), 6);

        assert_eq!(decode("DrWeb", "BackDoor.SubSeven.145").unwrap().name, "SubSeven");
        assert!(is_heuristic("Alibaba", "Linux/Agent.981bab81"));
        assert!(!is_heuristic("Alibaba", "Win32/SubSeven.6ca32fd3"));
        assert!(!is_heuristic("NOT_A_REAL_ENGINE", "Linux/Agent.981bab81"));
    }
}
