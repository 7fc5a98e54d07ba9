//! 分类解析器：语法匹配 + 字段派生
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::config::MatchOptions;
use crate::error::{RspResult, RspolyuniteError};
use crate::grammar::{slot, CompiledGrammar, MatchOutcome};
use crate::utils::{preview, PREVIEW_LEN};
use crate::vocab::{Taxonomy, VocabMatcher, Vocabulary, VocabularyNode};

use super::{Classification, FieldSpan};

/// EICAR 测试文件的统一名称
pub const EICAR_NAME: &str = "EICAR";

const NONMALWARE: &str = "nonmalware";
const PARAMALWARE_TAG: &str = "paramalware";
const EXPLOIT: &str = "exploit";

/// 这些槽位的内容命中启发式词表即视为启发式检测
const HEURISTIC_SLOTS: [&str; 4] = [slot::HEURISTICS, slot::FAMILY, slot::LABELS, slot::VARIANT];

/// 分类解析器（构建后只读，可跨线程共享）
#[derive(Debug)]
pub struct ClassificationParser {
    labels: Arc<VocabularyNode>,
    oses: Arc<VocabularyNode>,
    langs: Arc<VocabularyNode>,
    macros: Arc<VocabularyNode>,
    archives: Arc<VocabularyNode>,
    obfuscations: Arc<VocabularyNode>,
    /// 启发式词表（只取一级节点，整串判定）
    heuristics: Arc<VocabMatcher>,
    step_limit: usize,
}

impl ClassificationParser {
    pub fn new(vocab: &Vocabulary, options: &MatchOptions) -> RspResult<Self> {
        Ok(Self {
            labels: vocab.root(Taxonomy::Labels)?.clone(),
            oses: vocab.root(Taxonomy::OperatingSystems)?.clone(),
            langs: vocab.root(Taxonomy::Languages)?.clone(),
            macros: vocab.root(Taxonomy::Macros)?.clone(),
            archives: vocab.root(Taxonomy::Archives)?.clone(),
            obfuscations: vocab.root(Taxonomy::Obfuscations)?.clone(),
            heuristics: vocab.matcher(Taxonomy::Heuristics, 1, 1)?,
            step_limit: options.step_limit,
        })
    }

    /// 内容是否为启发式/通用检测用词
    pub fn is_heuristic_text(&self, text: &str) -> bool {
        self.heuristics.is_full_match(text)
    }

    /// 解码单条厂商命名
    /// 参数：grammar - 厂商语法，raw - 原始命名
    /// 返回：分类结果 / NoMatch
    pub fn decode(&self, grammar: &CompiledGrammar, raw: &str) -> RspResult<Classification> {
        let engine = grammar.vendor_id();
        let no_match = || RspolyuniteError::NoMatch {
            engine: engine.to_string(),
            raw: raw.to_string(),
        };

        if raw.trim().is_empty() {
            return Err(no_match());
        }
        if raw.to_ascii_lowercase().contains("eicar") {
            return Ok(eicar(engine, raw));
        }

        let captures = match grammar.match_str(raw, self.step_limit) {
            MatchOutcome::Matched(captures) => captures,
            MatchOutcome::NoMatch => return Err(no_match()),
            MatchOutcome::Exhausted => {
                log::warn!(
                    "Grammar step budget exhausted | Engine: {} | Limit: {} | Input: {}",
                    engine,
                    self.step_limit,
                    preview(raw, PREVIEW_LEN)
                );
                return Err(no_match());
            }
        };

        let mut fields: BTreeMap<String, Vec<FieldSpan>> = BTreeMap::new();
        for cap in captures.into_iter().filter(|c| c.start < c.end) {
            fields
                .entry(cap.name.to_string())
                .or_default()
                .push(FieldSpan {
                    start: cap.start,
                    end: cap.end,
                    text: raw[cap.start..cap.end].to_string(),
                });
        }

        let classification = self.derive(grammar, raw, fields);
        log::debug!(
            "Grammar decoded | Engine: {} | Input: {} | Name: {}",
            engine,
            preview(raw, PREVIEW_LEN),
            classification.name
        );
        Ok(classification)
    }

    fn derive(
        &self,
        grammar: &CompiledGrammar,
        raw: &str,
        fields: BTreeMap<String, Vec<FieldSpan>>,
    ) -> Classification {
        let last = |name: &str| {
            fields
                .get(name)
                .and_then(|spans| spans.last())
                .map(|s| s.text.as_str())
        };
        let present = |name: &&str| fields.contains_key(*name);
        let first_present =
            |root: &VocabularyNode| root.sublabel_names().find(present).map(str::to_string);

        let is_cve = fields.contains_key(slot::CVE);
        let vulnerability_id = if is_cve {
            match (last(slot::CVE_YEAR), last(slot::CVE_NTH)) {
                (Some(year), Some(nth)) => Some(format!("CVE-{}-{}", year, nth)),
                (Some(year), None) => Some(format!("CVE-{}", year)),
                _ => None,
            }
        } else if fields.contains_key(slot::MS_BULLETIN) {
            match (last(slot::MS_YEAR), last(slot::MS_NTH)) {
                (Some(year), Some(nth)) => Some(format!("MS{}-{}", year, nth)),
                _ => None,
            }
        } else {
            None
        };

        let rules = grammar.rules();
        let family = if rules.withhold_family {
            None
        } else {
            vulnerability_id
                .clone()
                .or_else(|| last(slot::FAMILY).map(str::to_string))
        };

        let taxon = match &rules.taxon_slot {
            Some(name) => last(&**name).unwrap_or(raw).to_string(),
            None => {
                let cut = fields
                    .get(slot::VARIANT)
                    .and_then(|spans| spans.iter().map(|s| s.start).min())
                    .unwrap_or(raw.len());
                raw[..cut].to_string()
            }
        };

        let name = match &family {
            Some(f) if f.chars().count() > 3 => f.clone(),
            _ => taxon.clone(),
        };

        let mut labels: BTreeSet<String> = self
            .labels
            .sublabel_names()
            .filter(present)
            .map(str::to_string)
            .collect();
        if is_cve || fields.contains_key(slot::MS_BULLETIN) {
            labels.insert(EXPLOIT.to_string());
        }

        let is_nonmalware = labels.contains(NONMALWARE);
        let is_paramalware = is_nonmalware
            || labels.iter().any(|label| {
                self.labels
                    .find(label)
                    .map_or(false, |node| node.has_tag(PARAMALWARE_TAG))
            });

        // 同一槽位可多次捕获，任一片段命中即算
        let is_heuristic = HEURISTIC_SLOTS
            .iter()
            .filter_map(|&s| fields.get(s))
            .flatten()
            .any(|span| self.is_heuristic_text(&span.text));

        Classification {
            operating_system: first_present(&self.oses),
            language: first_present(&self.langs),
            macro_kind: first_present(&self.macros),
            archive: first_present(&self.archives),
            obfuscations: self
                .obfuscations
                .sublabel_names()
                .filter(present)
                .map(str::to_string)
                .collect(),
            source: raw.to_string(),
            engine: grammar.vendor_id().to_string(),
            name,
            family,
            taxon,
            labels,
            vulnerability_id,
            is_heuristic,
            is_eicar: false,
            is_cve,
            is_nonmalware,
            is_paramalware,
            fields,
        }
    }
}

/// EICAR 测试文件：与厂商语法无关的固定结果
fn eicar(engine: &str, raw: &str) -> Classification {
    Classification {
        source: raw.to_string(),
        engine: engine.to_string(),
        fields: BTreeMap::new(),
        name: EICAR_NAME.to_string(),
        family: Some(EICAR_NAME.to_string()),
        taxon: raw.to_string(),
        labels: BTreeSet::from([NONMALWARE.to_string()]),
        operating_system: None,
        language: None,
        macro_kind: None,
        archive: None,
        obfuscations: BTreeSet::new(),
        vulnerability_id: None,
        is_heuristic: false,
        is_eicar: true,
        is_cve: false,
        is_nonmalware: true,
        is_paramalware: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VocabOrigin;
    use crate::grammar::segment::{capture, seq};
    use crate::grammar::{compile_entry, GrammarBuilder, GrammarKit, GrammarSpec, BUILTIN_GRAMMARS};

    /// 每个内置厂商一条可解码的样例
    const VENDOR_SAMPLES: [(&str, &str); 19] = [
        ("Alibaba", "Win32/SubSeven.6ca32fd3"),
        ("CAPESandbox", "family:Emotet"),
        ("ClamAV", "Win.Trojan.SubSeven-38"),
        ("Concinnity", "Miner.xmr.4AdUndXHHZ6cfufT"),
        ("DrWeb", "Exploit.CVE-2012-0158.1"),
        ("FilSecLab", "Win32.Zbot"),
        ("Ikarus", "Trojan-Spy.Win32.Zbot"),
        ("Jiangmin", "Backdoor/SubSeven.22.a"),
        ("K7", "Trojan-Downloader ( 0054e0831 )"),
        ("Lionic", "Trojan.Win32.SubSeven.m!c"),
        ("NanoAV", "Trojan.Win32.SubSeven.dqcy"),
        ("Qihoo360", "Win32/Trojan.Generic.HwoCPXwA"),
        ("QuickHeal", "Backdoor.Subseven.A4"),
        ("Rising", "Trojan.Win32.Generic.1A2B3C4D"),
        ("Tachyon", "Trojan-Ransom/W32.DP-Conti.59392"),
        ("TriageSandbox", "Emotet"),
        ("URLHaus", "Emotet"),
        ("Virusdie", "Emotet"),
        ("Generic", "Trojan.Win32.SubSeven.a"),
    ];

    struct Fixture {
        kit: GrammarKit,
        parser: ClassificationParser,
    }

    impl Fixture {
        fn new() -> Self {
            let vocab = Arc::new(Vocabulary::load(VocabOrigin::Embedded).unwrap());
            let parser = ClassificationParser::new(&vocab, &MatchOptions::default()).unwrap();
            Self {
                kit: GrammarKit::new(vocab).unwrap(),
                parser,
            }
        }

        fn decode(&self, vendor: &str, raw: &str) -> RspResult<Classification> {
            let entry = BUILTIN_GRAMMARS
                .iter()
                .find(|e| e.vendor_id == vendor)
                .unwrap();
            let grammar = compile_entry(&self.kit, entry).unwrap();
            self.parser.decode(&grammar, raw)
        }
    }

    #[test]
    fn test_decode_named_family() {
        // 测试场景：常规命名派生家族、taxon、平台与标签
        let fx = Fixture::new();
        let c = fx.decode("Alibaba", "Win32/SubSeven.6ca32fd3").unwrap();
        assert_eq!(c.family.as_deref(), Some("SubSeven"));
        assert_eq!(c.name, "SubSeven");
        assert_eq!(c.taxon, "Win32/SubSeven");
        assert_eq!(c.operating_system.as_deref(), Some("Windows"));
        assert_eq!(c.platform(), Some("Windows"));
        assert!(!c.is_heuristic);
        assert!(!c.is_eicar);
        assert_eq!(c.get("VARIANT"), Some(".6ca32fd3"));

        let c = fx.decode("ClamAV", "Win.Trojan.SubSeven-38").unwrap();
        assert_eq!(c.name, "SubSeven");
        assert!(c.labels.contains("trojan"));
        assert_eq!(c.operating_system.as_deref(), Some("Windows"));

        let c = fx.decode("DrWeb", "BackDoor.SubSeven.145").unwrap();
        assert_eq!(c.taxon, "BackDoor.SubSeven");
        assert_eq!(c.labels, BTreeSet::from(["backdoor".to_string()]));
    }

    #[test]
    fn test_repeated_variants() {
        // 测试场景：重复捕获按出现顺序保留，taxon 截到首个变种
        let fx = Fixture::new();
        let c = fx.decode("Jiangmin", "Backdoor/SubSeven.22.a").unwrap();
        assert_eq!(c.captures("VARIANT"), vec![".22", ".a"]);
        assert_eq!(c.get("VARIANT"), Some(".a"));
        assert_eq!(c.taxon, "Backdoor/SubSeven");
        assert_eq!(c.spans("VARIANT")[0].start, 17);
    }

    #[test]
    fn test_taxon_is_prefix_before_first_variant() {
        // 测试场景：taxon 总是原始串前缀，且不越过首个变种
        let fx = Fixture::new();
        let samples = [
            ("Alibaba", "Win32/SubSeven.6ca32fd3"),
            ("Lionic", "Trojan.Win32.SubSeven.m!c"),
            ("NanoAV", "Trojan.Win32.SubSeven.dqcy"),
            ("Rising", "Trojan.Win32.Generic.1A2B3C4D"),
            ("Tachyon", "Trojan-Ransom/W32.DP-Conti.59392"),
            ("K7", "Riskware ( 0040eff71 )"),
            ("URLHaus", "Emotet"),
        ];
        for (vendor, raw) in samples {
            let c = fx.decode(vendor, raw).unwrap();
            assert!(raw.starts_with(&c.taxon), "{}: {}", vendor, c.taxon);
            if let Some(first) = c.spans("VARIANT").iter().map(|s| s.start).min() {
                assert!(c.taxon.len() <= first, "{}", vendor);
            }
        }
    }

    #[test]
    fn test_eicar_short_circuit() {
        // 测试场景：任何厂商、任何大小写的 eicar 都返回固定结果
        let fx = Fixture::new();
        for (vendor, raw) in [
            ("Alibaba", "EICAR-Test-File"),
            ("K7", "EICAR_Test_File"),
            ("Tachyon", "something.eicar.com"),
            ("ClamAV", "Win.Test.Eicar-1"),
        ] {
            let c = fx.decode(vendor, raw).unwrap();
            assert_eq!(c.name, EICAR_NAME);
            assert!(c.labels.contains("nonmalware"));
            assert!(c.is_eicar && c.is_nonmalware);
            assert!(!c.is_heuristic);
            assert_eq!(c.engine, vendor);
        }
    }

    #[test]
    fn test_heuristic_detection() {
        // 测试场景：不同槽位中的启发式用词统一判定
        let fx = Fixture::new();
        let c = fx.decode("Alibaba", "Linux/Agent.981bab81").unwrap();
        assert!(c.is_heuristic);
        assert_eq!(c.operating_system.as_deref(), Some("Linux"));
        assert_eq!(c.name, "Agent");

        let c = fx.decode("Rising", "Trojan.Win32.Generic.1A2B3C4D").unwrap();
        assert!(c.is_heuristic);
        assert_eq!(c.family, None);
        assert_eq!(c.name, "Trojan.Win32.Generic");
    }

    #[test]
    fn test_heuristic_in_any_repeated_capture() {
        // 测试场景：同一槽位多次捕获，只有较早的片段是启发式用词
        let fx = Fixture::new();
        let builder = GrammarBuilder::new(&fx.kit, false);
        let spec = GrammarSpec::new(seq([
            capture(slot::VARIANT, builder.re("[A-Za-z]+")),
            builder.lit("."),
            capture(slot::VARIANT, builder.re("[A-Za-z]+")),
        ]));
        let spec = builder.finish(spec).unwrap();
        let grammar = CompiledGrammar::new("Repeated", spec);

        let c = fx.parser.decode(&grammar, "Generic.Zbot").unwrap();
        assert_eq!(c.get(slot::VARIANT), Some("Zbot"));
        assert!(c.is_heuristic);

        let c = fx.parser.decode(&grammar, "Zbot.Zeus").unwrap();
        assert!(!c.is_heuristic);
    }

    #[test]
    fn test_vulnerability_ids() {
        // 测试场景：CVE 由年份与序号重组，并补充 exploit 标签
        let fx = Fixture::new();
        let c = fx.decode("DrWeb", "Exploit.CVE-2012-0158.1").unwrap();
        assert!(c.is_cve);
        assert_eq!(c.vulnerability_id.as_deref(), Some("CVE-2012-0158"));
        assert_eq!(c.family.as_deref(), Some("CVE-2012-0158"));
        assert_eq!(c.name, "CVE-2012-0158");
        assert!(c.labels.contains("exploit"));
    }

    #[test]
    fn test_k7_rules() {
        // 测试场景：K7 不输出家族名，taxon 取类型段
        let fx = Fixture::new();
        let c = fx.decode("K7", "Riskware ( 0040eff71 )").unwrap();
        assert_eq!(c.family, None);
        assert_eq!(c.taxon, "Riskware");
        assert_eq!(c.name, "Riskware");
        assert!(c.labels.contains("riskware"));
        assert!(c.is_paramalware);
        assert!(!c.is_nonmalware);
    }

    #[test]
    fn test_no_match_and_empty_input() {
        // 测试场景：无法匹配与空输入都返回 NoMatch
        let fx = Fixture::new();
        for raw in ["", "   ", "SubSeven"] {
            match fx.decode("Tachyon", raw) {
                Err(RspolyuniteError::NoMatch { engine, .. }) => assert_eq!(engine, "Tachyon"),
                other => panic!("unexpected: {:?}", other),
            }
        }
    }

    #[test]
    fn test_decode_is_idempotent() {
        // 测试场景：同一输入两次解码结果完全一致
        let fx = Fixture::new();
        let a = fx.decode("Lionic", "Trojan.Win32.SubSeven.m!c").unwrap();
        let b = fx.decode("Lionic", "Trojan.Win32.SubSeven.m!c").unwrap();
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_every_vendor_fields_are_declared_slots() {
        // 测试场景：每个内置厂商的解码字段都来自语法声明的槽位，EICAR 统一短路
        let fx = Fixture::new();
        assert_eq!(VENDOR_SAMPLES.len(), BUILTIN_GRAMMARS.len());
        for entry in BUILTIN_GRAMMARS {
            let grammar = compile_entry(&fx.kit, entry).unwrap();

            let c = fx.parser.decode(&grammar, "Win.Test.EICAR_HDB-1").unwrap();
            assert!(c.is_eicar, "{}", entry.vendor_id);
            assert_eq!(c.name, EICAR_NAME);

            let (_, raw) = VENDOR_SAMPLES
                .iter()
                .find(|(vendor, _)| *vendor == entry.vendor_id)
                .unwrap();
            let c = fx.parser.decode(&grammar, raw).unwrap();
            assert!(!c.fields.is_empty(), "{}", entry.vendor_id);
            for key in c.fields.keys() {
                assert!(grammar.has_slot(key), "{} produced undeclared {}", entry.vendor_id, key);
            }
        }
    }

    #[test]
    fn test_long_input_is_no_match() {
        // 测试场景：超长输入在预算内放弃，不会卡住
        let fx = Fixture::new();
        let raw = format!("Win32/{}", "A".repeat(20_000));
        assert!(matches!(
            fx.decode("Alibaba", &raw),
            Err(RspolyuniteError::NoMatch { .. })
        ));
    }

    #[test]
    fn test_step_budget_maps_to_no_match() {
        // 测试场景：步数预算过小时按无法匹配处理
        let vocab = Arc::new(Vocabulary::load(VocabOrigin::Embedded).unwrap());
        let parser = ClassificationParser::new(&vocab, &MatchOptions { step_limit: 3 }).unwrap();
        let kit = GrammarKit::new(vocab).unwrap();
        let grammar = compile_entry(&kit, &BUILTIN_GRAMMARS[0]).unwrap();
        assert!(matches!(
            parser.decode(&grammar, "Win32/SubSeven.6ca32fd3"),
            Err(RspolyuniteError::NoMatch { .. })
        ));
    }
}
