//! 运行上下文：词表、语法注册表、解码器与共识引擎的一次性装配
//! 构建后只读（自定义语法注册除外），可在线程间共享
use std::sync::Arc;

use crate::classification::{Classification, ClassificationParser};
use crate::config::UniteConfig;
use crate::consensus::{Analyses, ConsensusEngine, EngineWeights};
use crate::error::RspResult;
use crate::grammar::{
    compile_entry, CompiledGrammar, GrammarBuilder, GrammarFactory, GrammarKit, BUILTIN_GRAMMARS,
};
use crate::registry::{Decoder, EngineRegistry};
use crate::vocab::Vocabulary;

#[derive(Debug)]
pub struct UniteContext {
    config: UniteConfig,
    vocab: Arc<Vocabulary>,
    kit: GrammarKit,
    registry: Arc<EngineRegistry>,
    decoder: Decoder,
    consensus: ConsensusEngine,
}

impl UniteContext {
    /// 创建上下文
    /// 1. 加载词表（失败即 ResourceLoadError）
    /// 2. 编译并注册全部内置语法
    /// 3. 装配解码器与共识引擎
    pub fn new(config: UniteConfig) -> RspResult<Self> {
        let vocab = Arc::new(Vocabulary::load(config.vocab_origin.clone())?);
        log::info!(
            "Context vocabulary ready | Origin: {:?} | Taxonomies: {}",
            config.vocab_origin,
            vocab.loader().loaded_count()
        );

        let kit = GrammarKit::new(vocab.clone())?;
        let registry = Arc::new(EngineRegistry::new());
        for entry in BUILTIN_GRAMMARS {
            registry.register(entry.vendor_id, compile_entry(&kit, entry)?);
        }
        log::info!(
            "Grammars registered | Engines: {} | Terminals: {}",
            registry.len(),
            kit.terminal_count()
        );

        let parser = Arc::new(ClassificationParser::new(&vocab, &config.match_options)?);
        let decoder = Decoder::new(registry.clone(), parser);
        let consensus = ConsensusEngine::new(decoder.clone(), &vocab, &config.consensus)?;

        Ok(Self {
            config,
            vocab,
            kit,
            registry,
            decoder,
            consensus,
        })
    }

    pub fn config(&self) -> &UniteConfig {
        &self.config
    }

    pub fn vocabulary(&self) -> &Arc<Vocabulary> {
        &self.vocab
    }

    pub fn registry(&self) -> &EngineRegistry {
        &self.registry
    }

    pub fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    pub fn consensus(&self) -> &ConsensusEngine {
        &self.consensus
    }

    /// 注册自定义语法（同名引擎覆盖已有语法，记录 warn）
    pub fn register_custom(
        &self,
        vendor_id: &str,
        ignore_case: bool,
        build: GrammarFactory,
    ) -> RspResult<()> {
        let builder = GrammarBuilder::new(&self.kit, ignore_case);
        let spec = build(&builder);
        let spec = builder.finish(spec)?;
        self.registry
            .register(vendor_id, CompiledGrammar::new(vendor_id, spec));
        Ok(())
    }

    pub fn decode(&self, engine: &str, raw: &str) -> RspResult<Classification> {
        self.decoder.decode(engine, raw)
    }

    pub fn is_heuristic(&self, engine: &str, raw: &str) -> bool {
        self.decoder.is_heuristic(engine, raw)
    }

    pub fn analyze<I, K, V>(&self, results: I) -> Analyses<'_>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.consensus.analyze(results)
    }

    pub fn infer_name<I, K, V>(&self, results: I) -> Option<String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.consensus.infer_name(results)
    }

    pub fn infer_name_with_weights<I, K, V>(&self, results: I, weights: &EngineWeights) -> Option<String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.consensus.infer_name_with_weights(results, weights)
    }
}
