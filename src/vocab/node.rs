//! 词表树节点：层级标签（名称 + 别名 + 正则片段 + 标记），父节点弱引用回指
use std::sync::{Arc, Weak};

use regex::Regex;
use rustc_hash::FxHashSet;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{RspResult, RspolyuniteError};

/// JSON 中单个节点的原始结构
/// 格式：{aliases:[], patterns:[], tags:[], description:"", children:{Name:{...}}}
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawVocabNode {
    aliases: Vec<String>,
    patterns: Vec<String>,
    tags: Vec<String>,
    description: Option<String>,
    children: Map<String, Value>,
}

/// 校验通过、尚未装配父子关系的节点
struct NodeSpec {
    name: String,
    aliases: Vec<String>,
    patterns: Vec<String>,
    tags: FxHashSet<String>,
    description: Option<String>,
    children: Vec<NodeSpec>,
}

impl NodeSpec {
    /// 递归解析并校验节点
    /// 参数：name - 节点名，value - JSON值，path - 节点路径（仅用于错误信息）
    fn parse(name: &str, value: &Value, path: &str) -> RspResult<Self> {
        if name.trim().is_empty() {
            return Err(RspolyuniteError::ResourceLoadError(format!(
                "Empty node name under {}",
                path
            )));
        }

        let raw: RawVocabNode = serde_json::from_value(value.clone()).map_err(|e| {
            RspolyuniteError::ResourceLoadError(format!("Malformed node {}: {}", path, e))
        })?;

        if let Some(alias) = raw.aliases.iter().find(|a| a.is_empty()) {
            return Err(RspolyuniteError::ResourceLoadError(format!(
                "Empty alias {:?} in node {}",
                alias, path
            )));
        }
        for fragment in &raw.patterns {
            Regex::new(&format!("(?:{})", fragment)).map_err(|e| {
                RspolyuniteError::ResourceLoadError(format!(
                    "Invalid pattern {:?} in node {}: {}",
                    fragment, path, e
                ))
            })?;
        }

        // 兄弟节点名唯一（忽略大小写）
        let mut seen = FxHashSet::default();
        let mut children = Vec::with_capacity(raw.children.len());
        for (child_name, child_value) in &raw.children {
            if !seen.insert(child_name.to_lowercase()) {
                return Err(RspolyuniteError::ResourceLoadError(format!(
                    "Duplicate sibling {} under {}",
                    child_name, path
                )));
            }
            let child_path = format!("{}/{}", path, child_name);
            children.push(NodeSpec::parse(child_name, child_value, &child_path)?);
        }

        Ok(Self {
            name: name.to_string(),
            aliases: raw.aliases,
            patterns: raw.patterns,
            tags: raw.tags.into_iter().collect(),
            description: raw.description,
            children,
        })
    }
}

/// 词表树节点（加载后不可变）
#[derive(Debug)]
pub struct VocabularyNode {
    name: String,
    depth: usize,
    parent: Weak<VocabularyNode>,
    children: Vec<Arc<VocabularyNode>>,
    aliases: Vec<String>,
    patterns: Vec<String>,
    tags: FxHashSet<String>,
    description: Option<String>,
}

impl VocabularyNode {
    /// 从 JSON 文本构建整棵词表树
    /// 参数：name - 根节点名（即词表名），json - 根节点JSON
    /// 返回：根节点 | ResourceLoadError
    pub fn from_json(name: &str, json: &str) -> RspResult<Arc<Self>> {
        let value: Value = serde_json::from_str(json).map_err(|e| {
            RspolyuniteError::ResourceLoadError(format!("Malformed vocabulary {}: {}", name, e))
        })?;
        let spec = NodeSpec::parse(name, &value, name)?;
        Ok(Self::assemble(spec, Weak::new(), 0))
    }

    fn assemble(spec: NodeSpec, parent: Weak<Self>, depth: usize) -> Arc<Self> {
        Arc::new_cyclic(|me| {
            let children = spec
                .children
                .into_iter()
                .map(|child| Self::assemble(child, me.clone(), depth + 1))
                .collect();
            VocabularyNode {
                name: spec.name,
                depth,
                parent,
                children,
                aliases: spec.aliases,
                patterns: spec.patterns,
                tags: spec.tags,
                description: spec.description,
            }
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 到根节点的距离（根为0）
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn parent(&self) -> Option<Arc<VocabularyNode>> {
        self.parent.upgrade()
    }

    pub fn children(&self) -> &[Arc<VocabularyNode>] {
        &self.children
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// 节点路径，如 LABELS/ransomware/filecoder
    pub fn path(&self) -> String {
        match self.parent() {
            Some(parent) => format!("{}/{}", parent.path(), self.name),
            None => self.name.clone(),
        }
    }

    /// 标记查询：自身或任一祖先带有该标记即为真
    pub fn has_tag(&self, tag: &str) -> bool {
        if self.tags.contains(tag) {
            return true;
        }
        let mut current = self.parent();
        while let Some(node) = current {
            if node.tags.contains(tag) {
                return true;
            }
            current = node.parent();
        }
        false
    }

    pub fn child(&self, name: &str) -> Option<&Arc<VocabularyNode>> {
        self.children.iter().find(|c| c.name == name)
    }

    /// 按名称查找后代节点（先序，含自身）
    pub fn find(&self, name: &str) -> Option<&VocabularyNode> {
        std::iter::once(self)
            .chain(self.descendants())
            .find(|n| n.name == name)
    }

    /// 后代节点先序遍历（不含自身）
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.children.iter().rev().map(|c| c.as_ref()).collect(),
        }
    }

    /// 后代节点名称序列（惰性、可重复调用重新开始）
    pub fn sublabel_names(&self) -> impl Iterator<Item = &str> + Clone + '_ {
        self.descendants().map(|n| n.name.as_str())
    }

    /// 子树中全部字面别名（先序）
    pub fn literal_aliases(&self) -> impl Iterator<Item = &str> + '_ {
        std::iter::once(self)
            .chain(self.descendants())
            .flat_map(|n| n.aliases.iter().map(String::as_str))
    }

    /// 字面匹配（忽略大小写）：节点名或任一别名
    pub fn matches_literal(&self, s: &str) -> bool {
        let lowered = s.to_lowercase();
        self.name.to_lowercase() == lowered
            || self.aliases.iter().any(|a| a.to_lowercase() == lowered)
    }

    /// 子树中第一个字面匹配的节点（先序）
    pub fn find_literal(&self, s: &str) -> Option<&VocabularyNode> {
        std::iter::once(self)
            .chain(self.descendants())
            .find(|n| n.matches_literal(s))
    }
}

/// 先序遍历迭代器
#[derive(Debug, Clone)]
pub struct Descendants<'a> {
    stack: Vec<&'a VocabularyNode>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a VocabularyNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack
            .extend(node.children.iter().rev().map(|c| c.as_ref()));
        Some(node)
    }
}
