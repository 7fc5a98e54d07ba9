//! 词表加载器：内置（编译期 embed）/ 本地目录，按名称单次加载并缓存
use std::borrow::Cow;
use std::fmt;
use std::fs;
use std::sync::{Arc, RwLock};

use once_cell::sync::OnceCell;
use rustc_hash::FxHashMap;

use crate::config::VocabOrigin;
use crate::error::{RspResult, RspolyuniteError};

use super::node::VocabularyNode;

/// 内置词表类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Taxonomy {
    Labels,
    Languages,
    Archives,
    Macros,
    OperatingSystems,
    Heuristics,
    Obfuscations,
    Suffixes,
}

impl Taxonomy {
    pub const ALL: [Taxonomy; 8] = [
        Taxonomy::Labels,
        Taxonomy::Languages,
        Taxonomy::Archives,
        Taxonomy::Macros,
        Taxonomy::OperatingSystems,
        Taxonomy::Heuristics,
        Taxonomy::Obfuscations,
        Taxonomy::Suffixes,
    ];

    /// 词表名（即根节点名，也是语法中的捕获槽位名）
    pub fn resource_name(self) -> &'static str {
        match self {
            Taxonomy::Labels => "LABELS",
            Taxonomy::Languages => "LANGS",
            Taxonomy::Archives => "ARCHIVES",
            Taxonomy::Macros => "MACROS",
            Taxonomy::OperatingSystems => "OPERATING_SYSTEMS",
            Taxonomy::Heuristics => "HEURISTICS",
            Taxonomy::Obfuscations => "OBFUSCATIONS",
            Taxonomy::Suffixes => "SUFFIXES",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.resource_name() == name)
    }

    fn embedded_json(self) -> &'static str {
        match self {
            Taxonomy::Labels => include_str!("../../data/vocab/labels.json"),
            Taxonomy::Languages => include_str!("../../data/vocab/langs.json"),
            Taxonomy::Archives => include_str!("../../data/vocab/archives.json"),
            Taxonomy::Macros => include_str!("../../data/vocab/macros.json"),
            Taxonomy::OperatingSystems => include_str!("../../data/vocab/operating_systems.json"),
            Taxonomy::Heuristics => include_str!("../../data/vocab/heuristics.json"),
            Taxonomy::Obfuscations => include_str!("../../data/vocab/obfuscations.json"),
            Taxonomy::Suffixes => include_str!("../../data/vocab/suffixes.json"),
        }
    }
}

impl fmt::Display for Taxonomy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.resource_name())
    }
}

/// 目录模式下的文件名：词表名小写 + .json
pub fn resource_file_name(name: &str) -> String {
    format!("{}.json", name.to_lowercase())
}

type NodeCell = Arc<OnceCell<Arc<VocabularyNode>>>;

/// 词表加载器
/// 每个词表名对应一个 OnceCell，并发首次加载时只会真正读取/解析一次
#[derive(Debug)]
pub struct VocabLoader {
    origin: VocabOrigin,
    cells: RwLock<FxHashMap<String, NodeCell>>,
}

impl VocabLoader {
    pub fn new(origin: VocabOrigin) -> Self {
        Self {
            origin,
            cells: RwLock::new(FxHashMap::default()),
        }
    }

    pub fn origin(&self) -> &VocabOrigin {
        &self.origin
    }

    /// 按名称加载词表（同名重复加载返回同一实例）
    /// 返回：根节点 | ResourceLoadError
    pub fn load(&self, name: &str) -> RspResult<Arc<VocabularyNode>> {
        let cell = self.cell(name);
        cell.get_or_try_init(|| self.read(name)).map(Arc::clone)
    }

    pub fn load_taxonomy(&self, taxonomy: Taxonomy) -> RspResult<Arc<VocabularyNode>> {
        self.load(taxonomy.resource_name())
    }

    /// 已加载的词表数量
    pub fn loaded_count(&self) -> usize {
        let cells = self.cells.read().unwrap_or_else(|e| e.into_inner());
        cells.values().filter(|c| c.get().is_some()).count()
    }

    fn cell(&self, name: &str) -> NodeCell {
        {
            let cells = self.cells.read().unwrap_or_else(|e| e.into_inner());
            if let Some(cell) = cells.get(name) {
                return cell.clone();
            }
        }
        let mut cells = self.cells.write().unwrap_or_else(|e| e.into_inner());
        cells.entry(name.to_string()).or_default().clone()
    }

    fn read(&self, name: &str) -> RspResult<Arc<VocabularyNode>> {
        let json: Cow<'static, str> = match &self.origin {
            VocabOrigin::Embedded => Taxonomy::from_name(name)
                .map(|t| Cow::Borrowed(t.embedded_json()))
                .ok_or_else(|| {
                    RspolyuniteError::ResourceLoadError(format!(
                        "Unknown embedded vocabulary: {}",
                        name
                    ))
                })?,
            VocabOrigin::Directory(dir) => {
                let path = dir.join(resource_file_name(name));
                let text = fs::read_to_string(&path).map_err(|e| {
                    RspolyuniteError::ResourceLoadError(format!(
                        "Failed to read {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                Cow::Owned(text)
            }
        };

        let root = VocabularyNode::from_json(name, &json)?;
        log::info!(
            "Vocabulary loaded | Name: {} | Origin: {:?} | Nodes: {}",
            name,
            self.origin,
            root.descendants().count() + 1
        );
        Ok(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_embedded_taxonomies_load() {
        // 测试场景：全部内置词表可解析
        let loader = VocabLoader::new(VocabOrigin::Embedded);
        for taxonomy in Taxonomy::ALL {
            let root = loader.load_taxonomy(taxonomy).unwrap();
            assert_eq!(root.name(), taxonomy.resource_name());
            assert!(!root.children().is_empty(), "{} has no children", taxonomy);
        }
        assert_eq!(loader.loaded_count(), Taxonomy::ALL.len());
    }

    #[test]
    fn test_load_returns_cached_instance() {
        // 测试场景：同名两次加载返回同一实例
        let loader = VocabLoader::new(VocabOrigin::Embedded);
        let a = loader.load("LABELS").unwrap();
        let b = loader.load("LABELS").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_concurrent_first_load() {
        // 测试场景：并发首次加载观察到同一实例
        let loader = Arc::new(VocabLoader::new(VocabOrigin::Embedded));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let loader = loader.clone();
                std::thread::spawn(move || loader.load("HEURISTICS").unwrap())
            })
            .collect();
        let nodes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(nodes.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[test]
    fn test_missing_resources() {
        // 测试场景：未知内置词表 / 不存在的目录
        let loader = VocabLoader::new(VocabOrigin::Embedded);
        assert!(matches!(
            loader.load("NOPE"),
            Err(RspolyuniteError::ResourceLoadError(_))
        ));

        let loader = VocabLoader::new(VocabOrigin::Directory(PathBuf::from(
            "/definitely/not/a/vocab/dir",
        )));
        assert!(matches!(
            loader.load("LABELS"),
            Err(RspolyuniteError::ResourceLoadError(_))
        ));
    }

    #[test]
    fn test_directory_origin() {
        // 测试场景：从本地目录读取自定义词表
        let dir = std::env::temp_dir().join(format!("rspolyunite-vocab-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(resource_file_name("LABELS")),
            r#"{"children": {"trojan": {"aliases": ["Trojan"]}}}"#,
        )
        .unwrap();

        let loader = VocabLoader::new(VocabOrigin::Directory(dir.clone()));
        let root = loader.load("LABELS").unwrap();
        assert_eq!(root.sublabel_names().collect::<Vec<_>>(), vec!["trojan"]);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_malformed_directory_file() {
        // 测试场景：目录中的词表文件不是合法 JSON 时报告文件名
        let dir = std::env::temp_dir().join(format!("rspolyunite-bad-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(resource_file_name("MACROS")), "{ not json").unwrap();

        let loader = VocabLoader::new(VocabOrigin::Directory(dir.clone()));
        match loader.load("MACROS") {
            Err(RspolyuniteError::ResourceLoadError(message)) => assert!(message.contains("MACROS")),
            other => panic!("unexpected: {:?}", other),
        }

        fs::remove_dir_all(&dir).unwrap();
    }
}
