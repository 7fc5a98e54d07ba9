//! 语法片段：原子、顺序、有序分支、重复、命名捕获、断言
//! 厂商语法由这些片段声明式组合而成
use std::sync::Arc;

use super::atom::{Atom, Terminal};

/// 零宽断言
#[derive(Debug, Clone)]
pub enum Look {
    Start,
    End,
    WordBoundary,
    Ahead(Arc<Terminal>),
    NotAhead(Arc<Terminal>),
    Behind(Arc<Terminal>),
}

/// 语法片段
#[derive(Debug, Clone)]
pub enum Segment {
    Atom(Arc<dyn Atom>),
    Seq(Vec<Segment>),
    /// 有序分支：按声明顺序尝试，首个能导出整串匹配的分支胜出
    Alt(Vec<Segment>),
    /// 贪婪重复，每轮必须前进
    Repeat {
        inner: Box<Segment>,
        min: usize,
        max: Option<usize>,
    },
    Capture {
        name: Arc<str>,
        inner: Box<Segment>,
    },
    Look(Look),
}

impl Segment {
    /// 收集全部可能的捕获名（去重，保持首次出现顺序）
    pub fn collect_slots(&self, out: &mut Vec<Arc<str>>) {
        let push = |name: Arc<str>, out: &mut Vec<Arc<str>>| {
            if !out.contains(&name) {
                out.push(name);
            }
        };
        match self {
            Segment::Atom(atom) => {
                for name in atom.capture_names() {
                    push(name, out);
                }
            }
            Segment::Seq(parts) | Segment::Alt(parts) => {
                for part in parts {
                    part.collect_slots(out);
                }
            }
            Segment::Repeat { inner, .. } => inner.collect_slots(out),
            Segment::Capture { name, inner } => {
                push(name.clone(), out);
                inner.collect_slots(out);
            }
            Segment::Look(_) => {}
        }
    }
}

pub fn seq(parts: impl IntoIterator<Item = Segment>) -> Segment {
    Segment::Seq(parts.into_iter().collect())
}

pub fn alt(branches: impl IntoIterator<Item = Segment>) -> Segment {
    Segment::Alt(branches.into_iter().collect())
}

pub fn repeat(inner: Segment, min: usize, max: Option<usize>) -> Segment {
    Segment::Repeat {
        inner: Box::new(inner),
        min,
        max,
    }
}

/// `x?`
pub fn opt(inner: Segment) -> Segment {
    repeat(inner, 0, Some(1))
}

/// `x*`
pub fn star(inner: Segment) -> Segment {
    repeat(inner, 0, None)
}

/// `x+`
pub fn plus(inner: Segment) -> Segment {
    repeat(inner, 1, None)
}

pub fn capture(name: &str, inner: Segment) -> Segment {
    Segment::Capture {
        name: Arc::from(name),
        inner: Box::new(inner),
    }
}

/// `^`
pub fn start() -> Segment {
    Segment::Look(Look::Start)
}

/// `$`
pub fn end() -> Segment {
    Segment::Look(Look::End)
}

/// ASCII 词边界 `(?-u:\b)`
pub fn word_boundary() -> Segment {
    Segment::Look(Look::WordBoundary)
}

/// 永不匹配的片段（空分支）
pub fn never() -> Segment {
    Segment::Alt(Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_slots_dedup_in_order() {
        // 测试场景：嵌套捕获名按首次出现顺序去重
        let t = Arc::new(Terminal::compile("(?P<CVEYEAR>[0-9]{4})", false).unwrap());
        let grammar = seq([
            capture("VEID", seq([capture("FAMILY", never()), Segment::Atom(t.clone())])),
            star(capture("VARIANT", Segment::Atom(t))),
            capture("FAMILY", never()),
        ]);
        let mut slots = Vec::new();
        grammar.collect_slots(&mut slots);
        let names: Vec<&str> = slots.iter().map(|s| s.as_ref()).collect();
        assert_eq!(names, vec!["VEID", "FAMILY", "CVEYEAR", "VARIANT"]);
    }
}
