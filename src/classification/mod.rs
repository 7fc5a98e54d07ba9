//! 分类结果：单条厂商命名解码后的结构化视图
//! 捕获字段按名称聚合（同名可重复），派生字段在解码时一次算好
pub mod parser;

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

pub use parser::ClassificationParser;

/// 单个捕获片段（原始串中的字节区间 + 文本）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSpan {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// 解码结果（解码后不可变）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    /// 原始命名
    pub source: String,
    /// 厂商标识（注册名）
    pub engine: String,
    /// 捕获字段：名称 -> 按出现顺序的片段
    pub fields: BTreeMap<String, Vec<FieldSpan>>,

    pub name: String,
    pub family: Option<String>,
    pub taxon: String,
    pub labels: BTreeSet<String>,
    pub operating_system: Option<String>,
    pub language: Option<String>,
    #[serde(rename = "macro")]
    pub macro_kind: Option<String>,
    pub archive: Option<String>,
    pub obfuscations: BTreeSet<String>,
    pub vulnerability_id: Option<String>,

    pub is_heuristic: bool,
    pub is_eicar: bool,
    pub is_cve: bool,
    pub is_nonmalware: bool,
    pub is_paramalware: bool,
}

impl Classification {
    /// 某字段的最后一次捕获
    pub fn get(&self, name: &str) -> Option<&str> {
        self.spans(name).last().map(|s| s.text.as_str())
    }

    /// 某字段的全部捕获文本
    pub fn captures(&self, name: &str) -> Vec<&str> {
        self.spans(name).iter().map(|s| s.text.as_str()).collect()
    }

    pub fn spans(&self, name: &str) -> &[FieldSpan] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// 平台：操作系统 > 压缩包 > 宏 > 脚本语言
    pub fn platform(&self) -> Option<&str> {
        self.operating_system
            .as_deref()
            .or(self.archive.as_deref())
            .or(self.macro_kind.as_deref())
            .or(self.language.as_deref())
    }
}
