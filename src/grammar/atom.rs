//! 语法原子：正则终结符 / 词表匹配器
//! 原子只做“整段匹配 + 命名子捕获”，回溯与组合交给 engine
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use regex::{Regex, RegexBuilder};

use crate::error::RspResult;
use crate::utils::length_bounds;
use crate::vocab::VocabMatcher;

/// 原子匹配接口
pub trait Atom: Send + Sync + fmt::Debug {
    /// 日志用描述
    fn describe(&self) -> String;

    /// 快速预判：rest 开头是否可能匹配（不可能时直接跳过候选枚举）
    fn may_start(&self, rest: &str) -> bool;

    /// 整段匹配 candidate，返回命名子捕获（相对 candidate 的区间）
    fn full_captures(&self, candidate: &str) -> Option<Vec<(Arc<str>, Range<usize>)>>;

    /// 该原子可能产生的全部捕获名
    fn capture_names(&self) -> Vec<Arc<str>>;

    /// 可匹配的字节长度上下界，候选结束点只在此区间内枚举
    fn length_bounds(&self) -> (usize, Option<usize>) {
        (0, None)
    }
}

/// 正则终结符（同时服务于前瞻/后顾断言）
#[derive(Debug)]
pub struct Terminal {
    source: String,
    ignore_case: bool,
    full: Regex,
    prefix: Regex,
    suffix: Regex,
    names: Vec<Arc<str>>,
    bounds: (usize, Option<usize>),
}

impl Terminal {
    /// 编译终结符
    /// 参数：source - 未锚定的正则片段，ignore_case - 是否忽略大小写
    pub fn compile(source: &str, ignore_case: bool) -> RspResult<Self> {
        let build = |pattern: String| -> RspResult<Regex> {
            Ok(RegexBuilder::new(&pattern)
                .case_insensitive(ignore_case)
                .build()?)
        };
        let full = build(format!("^(?:{})$", source))?;
        let names = full
            .capture_names()
            .flatten()
            .map(Arc::from)
            .collect();
        Ok(Self {
            source: source.to_string(),
            ignore_case,
            prefix: build(format!("^(?:{})", source))?,
            suffix: build(format!("(?:{})$", source))?,
            full,
            names,
            bounds: length_bounds(source, ignore_case),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn ignore_case(&self) -> bool {
        self.ignore_case
    }

    /// 前瞻：从 pos 开始是否匹配
    pub fn matches_at(&self, input: &str, pos: usize) -> bool {
        self.prefix.is_match(&input[pos..])
    }

    /// 后顾：是否存在恰好结束于 pos 的匹配
    pub fn ends_at(&self, input: &str, pos: usize) -> bool {
        self.suffix.is_match(&input[..pos])
    }
}

impl Atom for Terminal {
    fn describe(&self) -> String {
        if self.ignore_case {
            format!("/{}/i", self.source)
        } else {
            format!("/{}/", self.source)
        }
    }

    fn may_start(&self, rest: &str) -> bool {
        self.prefix.is_match(rest)
    }

    fn full_captures(&self, candidate: &str) -> Option<Vec<(Arc<str>, Range<usize>)>> {
        if self.names.is_empty() {
            return self.full.is_match(candidate).then(Vec::new);
        }
        let caps = self.full.captures(candidate)?;
        Some(
            self.names
                .iter()
                .filter_map(|name| caps.name(name).map(|m| (name.clone(), m.range())))
                .collect(),
        )
    }

    fn capture_names(&self) -> Vec<Arc<str>> {
        self.names.clone()
    }

    fn length_bounds(&self) -> (usize, Option<usize>) {
        self.bounds
    }
}

impl Atom for VocabMatcher {
    fn describe(&self) -> String {
        format!("<{}>", self.node_path())
    }

    fn may_start(&self, rest: &str) -> bool {
        self.matches_prefix(rest)
    }

    fn full_captures(&self, candidate: &str) -> Option<Vec<(Arc<str>, Range<usize>)>> {
        self.full_match(candidate)
            .map(|hits| hits.into_iter().map(|h| (h.name, h.span)).collect())
    }

    fn capture_names(&self) -> Vec<Arc<str>> {
        self.slot_names().cloned().collect()
    }

    fn length_bounds(&self) -> (usize, Option<usize>) {
        VocabMatcher::length_bounds(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_named_groups() {
        // 测试场景：终结符自带命名分组
        let t = Terminal::compile(r"MS(?P<YEAR>[0-9]{2})-(?P<NTH>[0-9]{1,3})", false).unwrap();
        let caps = t.full_captures("MS08-067").unwrap();
        assert_eq!(caps.len(), 2);
        assert_eq!(caps[0], (Arc::from("YEAR"), 2..4));
        assert_eq!(caps[1], (Arc::from("NTH"), 5..8));
        assert!(t.full_captures("MS08-067x").is_none());
        assert_eq!(t.capture_names().len(), 2);
    }

    #[test]
    fn test_terminal_lookaround_helpers() {
        // 测试场景：前瞻/后顾基于切片判定
        let t = Terminal::compile("[.][0-9]+", false).unwrap();
        assert!(t.matches_at("Foo.12-3", 3));
        assert!(!t.matches_at("Foo.12-3", 2));
        assert!(t.ends_at("Foo.12-3", 6));
        assert!(!t.ends_at("Foo.12-3", 7));
        assert!(t.may_start(".1"));
    }

    #[test]
    fn test_terminal_case_flag() {
        // 测试场景：忽略大小写标记生效
        let t = Terminal::compile("Trojan", true).unwrap();
        assert!(t.full_captures("TROJAN").is_some());
        assert_eq!(t.describe(), "/Trojan/i");
        let t = Terminal::compile("Trojan", false).unwrap();
        assert!(t.full_captures("TROJAN").is_none());
    }

    #[test]
    fn test_terminal_length_bounds() {
        // 测试场景：终结符长度区间在编译时确定
        let t = Terminal::compile(r"MS(?P<YEAR>[0-9]{2})-(?P<NTH>[0-9]{1,3})", false).unwrap();
        assert_eq!(Atom::length_bounds(&t), (6, Some(8)));
        let t = Terminal::compile("[A-Z][a-z]+", false).unwrap();
        assert_eq!(Atom::length_bounds(&t), (2, None));
    }
}
