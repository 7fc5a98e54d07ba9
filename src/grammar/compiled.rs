//! 编译后的厂商语法 + 派生规则
use std::sync::Arc;

use super::engine::{full_match, MatchOutcome};
use super::segment::Segment;

/// 通用槽位名
pub mod slot {
    pub const FAMILY: &str = "FAMILY";
    pub const VARIANT: &str = "VARIANT";
    pub const VEID: &str = "VEID";
    pub const TYPES: &str = "TYPES";
    pub const HEURISTICS: &str = "HEURISTICS";
    pub const LABELS: &str = "LABELS";
    pub const CVE: &str = "CVE";
    pub const CVE_YEAR: &str = "CVEYEAR";
    pub const CVE_NTH: &str = "CVENTH";
    pub const MS_BULLETIN: &str = "microsoft_security_bulletin";
    pub const MS_YEAR: &str = "MSSEC_YEAR";
    pub const MS_NTH: &str = "MSSECNTH";
}

/// 厂商特定的派生规则
#[derive(Debug, Clone, Default)]
pub struct DerivationRules {
    /// 不输出家族名（该厂商命名中没有独立家族段）
    pub withhold_family: bool,
    /// taxon 取自该槽位，而非首个 VARIANT 之前的前缀
    pub taxon_slot: Option<Arc<str>>,
}

/// 厂商语法声明（构建器产出）
#[derive(Debug, Clone)]
pub struct GrammarSpec {
    pub root: Segment,
    pub rules: DerivationRules,
}

impl GrammarSpec {
    pub fn new(root: Segment) -> Self {
        Self {
            root,
            rules: DerivationRules::default(),
        }
    }

    pub fn withhold_family(mut self) -> Self {
        self.rules.withhold_family = true;
        self
    }

    pub fn taxon_from(mut self, slot: &str) -> Self {
        self.rules.taxon_slot = Some(Arc::from(slot));
        self
    }
}

/// 编译后的语法（注册后只读，可并发使用）
#[derive(Debug)]
pub struct CompiledGrammar {
    vendor_id: String,
    slots: Vec<Arc<str>>,
    root: Segment,
    rules: DerivationRules,
}

impl CompiledGrammar {
    pub fn new(vendor_id: impl Into<String>, spec: GrammarSpec) -> Self {
        let mut slots = Vec::new();
        spec.root.collect_slots(&mut slots);
        Self {
            vendor_id: vendor_id.into(),
            slots,
            root: spec.root,
            rules: spec.rules,
        }
    }

    pub fn vendor_id(&self) -> &str {
        &self.vendor_id
    }

    /// 全部槽位（声明顺序）
    pub fn slots(&self) -> &[Arc<str>] {
        &self.slots
    }

    pub fn has_slot(&self, name: &str) -> bool {
        self.slots.iter().any(|s| s.as_ref() == name)
    }

    pub fn rules(&self) -> &DerivationRules {
        &self.rules
    }

    pub fn root(&self) -> &Segment {
        &self.root
    }

    /// 整串匹配原始命名
    pub fn match_str(&self, raw: &str, step_limit: usize) -> MatchOutcome {
        full_match(&self.root, raw, step_limit)
    }
}
