//! 引擎注册表：厂商名归一化 + 语法查找
//! 内置语法启动时注册；运行时可追加自定义语法（同名后写覆盖）
use std::sync::{Arc, RwLock};

use rustc_hash::FxHashMap;

use crate::classification::{Classification, ClassificationParser};
use crate::error::{RspResult, RspolyuniteError};
use crate::grammar::CompiledGrammar;

/// 引擎名归一化：去除空白与 ASCII 标点后转小写
/// "Quick Heal" / "quickheal" / "QUICK-HEAL" -> "quickheal"
pub fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && !c.is_ascii_punctuation())
        .flat_map(char::to_lowercase)
        .collect()
}

/// 引擎注册表
#[derive(Debug, Default)]
pub struct EngineRegistry {
    grammars: RwLock<FxHashMap<String, Arc<CompiledGrammar>>>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册语法（键为归一化后的厂商名）
    pub fn register(&self, vendor_id: &str, grammar: CompiledGrammar) {
        let key = normalize(vendor_id);
        let mut grammars = self.grammars.write().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = grammars.insert(key.clone(), Arc::new(grammar)) {
            log::warn!(
                "Grammar overridden | Engine: {} | Key: {} | Previous: {}",
                vendor_id,
                key,
                previous.vendor_id()
            );
        }
    }

    /// 按任意写法的引擎名查找语法
    pub fn lookup(&self, name: &str) -> RspResult<Arc<CompiledGrammar>> {
        self.grammars
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&normalize(name))
            .cloned()
            .ok_or_else(|| RspolyuniteError::EngineNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.grammars
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(&normalize(name))
    }

    /// 已注册的厂商标识（排序后）
    pub fn engines(&self) -> Vec<String> {
        let grammars = self.grammars.read().unwrap_or_else(|e| e.into_inner());
        let mut engines: Vec<String> = grammars.values().map(|g| g.vendor_id().to_string()).collect();
        engines.sort();
        engines
    }

    pub fn len(&self) -> usize {
        self.grammars.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 解码器：注册表查找 + 分类解析
#[derive(Debug, Clone)]
pub struct Decoder {
    registry: Arc<EngineRegistry>,
    parser: Arc<ClassificationParser>,
}

impl Decoder {
    pub fn new(registry: Arc<EngineRegistry>, parser: Arc<ClassificationParser>) -> Self {
        Self { registry, parser }
    }

    pub fn registry(&self) -> &EngineRegistry {
        &self.registry
    }

    /// 解码单条结果
    /// 错误：EngineNotFound（未知引擎）/ NoMatch（无法匹配）
    pub fn decode(&self, engine: &str, raw: &str) -> RspResult<Classification> {
        let grammar = self.registry.lookup(engine)?;
        self.parser.decode(&grammar, raw)
    }

    /// 是否为启发式检测（任何错误都保守返回 false）
    pub fn is_heuristic(&self, engine: &str, raw: &str) -> bool {
        match self.decode(engine, raw) {
            Ok(c) => c.is_heuristic,
            Err(e) => {
                log::debug!("Heuristic check skipped | Engine: {} | Reason: {}", engine, e);
                false
            }
        }
    }
}
