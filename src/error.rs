//! rspolyunite 错误定义
//! 统一封装词表加载、语法构建、分类解码与共识推断的错误，基于thiserror实现
use thiserror::Error;

use regex::Error as RegexError;

/// 全局错误枚举
#[derive(Error, Debug)]
pub enum RspolyuniteError {
    // ===================== 引擎相关错误 =====================
    /// 未注册的杀软引擎（绝不静默替换为其他语法）
    #[error("Engine not found: {0}")]
    EngineNotFound(String),

    /// 引擎语法存在，但输入无法匹配（命名格式异常/不符合厂商约定）
    #[error("No match for engine [{engine}]: {raw}")]
    NoMatch { engine: String, raw: String },

    // ===================== 资源相关错误 =====================
    /// 词表资源加载失败（文件缺失、读取失败或 JSON 格式错误），初始化阶段致命错误
    #[error("Resource load failed: {0}")]
    ResourceLoadError(String),

    /// 正则表达式编译失败（语法错误/超出大小限制）
    #[error("Regex compilation failed: {0}")]
    RegexCompileError(#[from] RegexError),

    // ===================== 基础错误 =====================
    /// 无效输入参数
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl RspolyuniteError {
    /// 是否为单条目可忽略错误（批量聚合场景下丢弃，不中断整体流程）
    pub fn is_per_entry(&self) -> bool {
        matches!(
            self,
            RspolyuniteError::EngineNotFound(_) | RspolyuniteError::NoMatch { .. }
        )
    }
}

/// 全局Result类型别名
pub type RspResult<T> = Result<T, RspolyuniteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        // 测试场景：错误信息包含引擎名与原始输入
        let err = RspolyuniteError::NoMatch {
            engine: "drweb".to_string(),
            raw: "???".to_string(),
        };
        assert_eq!(err.to_string(), "No match for engine [drweb]: ???");
        assert!(err.is_per_entry());

        let err = RspolyuniteError::ResourceLoadError("LABELS".to_string());
        assert!(!err.is_per_entry());
    }

    #[test]
    fn test_per_entry_classification() {
        // 测试场景：只有未知引擎与无法匹配属于可丢弃的单条错误
        assert!(RspolyuniteError::EngineNotFound("nope".to_string()).is_per_entry());
        assert!(!RspolyuniteError::InvalidInput("bad".to_string()).is_per_entry());
        assert!(!RspolyuniteError::from(regex::Regex::new("(").unwrap_err()).is_per_entry());
    }

    #[test]
    fn test_regex_error_conversion() {
        // 测试场景：regex错误通过 ? 自动转换
        fn compile() -> RspResult<regex::Regex> {
            Ok(regex::Regex::new("(unclosed")?)
        }
        assert!(matches!(compile(), Err(RspolyuniteError::RegexCompileError(_))));
    }
}
