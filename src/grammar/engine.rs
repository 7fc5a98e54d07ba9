//! 回溯匹配引擎
//! 续延式（continuation-passing）回溯：每个片段在成功时调用续延，续延失败则尝试下一候选
//! 步数预算限制最坏情况耗时，原子候选按 (原子, 位置) 在单次匹配内缓存
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::atom::Atom;
use super::segment::{Look, Segment};

/// 单个命名捕获（绝对字节区间）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    pub name: Arc<str>,
    pub start: usize,
    pub end: usize,
}

/// 整串匹配结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    Matched(Vec<Capture>),
    NoMatch,
    /// 超出步数预算（按无法匹配处理）
    Exhausted,
}

/// 原子在某位置的一个候选结束点
#[derive(Debug)]
struct Candidate {
    end: usize,
    groups: Vec<Capture>,
}

/// 整段尝试时每多扫描这么多字节计 1 步
const SCAN_BYTES_PER_STEP: usize = 64;

type Continuation<'c> = dyn FnMut(usize, &mut Vec<Capture>) -> bool + 'c;

/// 整串匹配
/// 参数：root - 语法根片段，input - 原始字符串，step_limit - 步数预算
pub fn full_match(root: &Segment, input: &str, step_limit: usize) -> MatchOutcome {
    let run = MatchRun::new(input, step_limit);
    let len = input.len();
    let mut result = None;
    let mut caps = Vec::new();

    run.run(root, 0, &mut caps, &mut |end, caps: &mut Vec<Capture>| {
        if end == len {
            result = Some(caps.clone());
            true
        } else {
            false
        }
    });

    match result {
        Some(caps) => MatchOutcome::Matched(caps),
        None if run.exhausted.get() => MatchOutcome::Exhausted,
        None => MatchOutcome::NoMatch,
    }
}

struct MatchRun<'i> {
    input: &'i str,
    step_limit: usize,
    steps: Cell<usize>,
    exhausted: Cell<bool>,
    memo: RefCell<FxHashMap<(usize, usize), Rc<[Candidate]>>>,
}

impl<'i> MatchRun<'i> {
    fn new(input: &'i str, step_limit: usize) -> Self {
        Self {
            input,
            step_limit,
            steps: Cell::new(0),
            exhausted: Cell::new(false),
            memo: RefCell::new(FxHashMap::default()),
        }
    }

    /// 计步，超出预算后所有分支立即失败
    fn tick(&self, cost: usize) -> bool {
        if self.exhausted.get() {
            return false;
        }
        let steps = self.steps.get() + cost;
        self.steps.set(steps);
        if steps > self.step_limit {
            self.exhausted.set(true);
            return false;
        }
        true
    }

    fn run(
        &self,
        seg: &Segment,
        pos: usize,
        caps: &mut Vec<Capture>,
        k: &mut Continuation<'_>,
    ) -> bool {
        if !self.tick(1) {
            return false;
        }

        match seg {
            Segment::Atom(atom) => {
                let candidates = self.candidates(atom, pos);
                for cand in candidates.iter() {
                    let mark = caps.len();
                    caps.extend(cand.groups.iter().cloned());
                    if k(cand.end, caps) {
                        return true;
                    }
                    caps.truncate(mark);
                    if self.exhausted.get() {
                        return false;
                    }
                }
                false
            }
            Segment::Seq(parts) => self.run_seq(parts, pos, caps, k),
            Segment::Alt(branches) => {
                for branch in branches {
                    if self.run(branch, pos, caps, &mut *k) {
                        return true;
                    }
                    if self.exhausted.get() {
                        return false;
                    }
                }
                false
            }
            Segment::Repeat { inner, min, max } => {
                self.run_repeat(inner, *min, *max, 0, pos, caps, k)
            }
            Segment::Capture { name, inner } => {
                self.run(inner, pos, caps, &mut |end, caps: &mut Vec<Capture>| {
                    caps.push(Capture {
                        name: name.clone(),
                        start: pos,
                        end,
                    });
                    if k(end, caps) {
                        return true;
                    }
                    caps.pop();
                    false
                })
            }
            Segment::Look(look) => self.check(look, pos) && k(pos, caps),
        }
    }

    fn run_seq(
        &self,
        parts: &[Segment],
        pos: usize,
        caps: &mut Vec<Capture>,
        k: &mut Continuation<'_>,
    ) -> bool {
        match parts.split_first() {
            None => k(pos, caps),
            Some((head, rest)) => self.run(head, pos, caps, &mut |next, caps: &mut Vec<Capture>| {
                self.run_seq(rest, next, caps, &mut *k)
            }),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn run_repeat(
        &self,
        inner: &Segment,
        min: usize,
        max: Option<usize>,
        count: usize,
        pos: usize,
        caps: &mut Vec<Capture>,
        k: &mut Continuation<'_>,
    ) -> bool {
        if max.map_or(true, |m| count < m) {
            let matched = self.run(inner, pos, caps, &mut |next, caps: &mut Vec<Capture>| {
                // 满足下限后不接受零宽迭代，避免死循环
                if next == pos && count >= min {
                    return false;
                }
                self.run_repeat(inner, min, max, count + 1, next, caps, &mut *k)
            });
            if matched {
                return true;
            }
            if self.exhausted.get() {
                return false;
            }
        }
        count >= min && k(pos, caps)
    }

    fn check(&self, look: &Look, pos: usize) -> bool {
        match look {
            Look::Start => pos == 0,
            Look::End => pos == self.input.len(),
            // ASCII 词边界，与 (?-u:\b) 一致
            Look::WordBoundary => {
                let is_word = |c: char| c.is_ascii_alphanumeric() || c == '_';
                let before = self.input[..pos].chars().next_back().map_or(false, is_word);
                let after = self.input[pos..].chars().next().map_or(false, is_word);
                before != after
            }
            Look::Ahead(t) => t.matches_at(self.input, pos),
            Look::NotAhead(t) => !t.matches_at(self.input, pos),
            Look::Behind(t) => t.ends_at(self.input, pos),
        }
    }

    /// 原子在 pos 处的全部候选（长者优先），单次匹配内缓存
    /// 结束点只在原子的长度区间内枚举，每次整段尝试按扫描字节数计步
    fn candidates(&self, atom: &Arc<dyn Atom>, pos: usize) -> Rc<[Candidate]> {
        let key = (Arc::as_ptr(atom) as *const () as usize, pos);
        if let Some(found) = self.memo.borrow().get(&key) {
            return found.clone();
        }

        let rest = &self.input[pos..];
        let (min_len, max_len) = atom.length_bounds();
        let top = max_len.map_or(rest.len(), |m| m.min(rest.len()));
        let mut found = Vec::new();
        if min_len <= top && atom.may_start(rest) {
            for e in (min_len..=top).rev().filter(|&e| rest.is_char_boundary(e)) {
                if !self.tick(1 + e / SCAN_BYTES_PER_STEP) {
                    break;
                }
                if let Some(groups) = atom.full_captures(&rest[..e]) {
                    found.push(Candidate {
                        end: pos + e,
                        groups: groups
                            .into_iter()
                            .filter(|(_, span)| !span.is_empty())
                            .map(|(name, span)| Capture {
                                name,
                                start: pos + span.start,
                                end: pos + span.end,
                            })
                            .collect(),
                    });
                }
            }
        }

        let found: Rc<[Candidate]> = found.into();
        if !self.exhausted.get() {
            self.memo.borrow_mut().insert(key, found.clone());
        }
        found
    }
}
