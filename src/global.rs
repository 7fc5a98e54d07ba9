//! 全局默认上下文单例管理
use once_cell::sync::OnceCell;

use crate::config::UniteConfig;
use crate::context::UniteContext;
use crate::error::RspResult;

/// 全局上下文实例
static GLOBAL_CONTEXT: OnceCell<UniteContext> = OnceCell::new();

/// 带自定义配置初始化全局上下文（已初始化时直接返回，不覆盖）
pub fn init_global_context(config: UniteConfig) -> RspResult<()> {
    if GLOBAL_CONTEXT.get().is_some() {
        return Ok(());
    }

    GLOBAL_CONTEXT.get_or_try_init(|| -> RspResult<UniteContext> {
        let ctx = UniteContext::new(config)?;
        log::info!(
            "Global context initialized | Engines: {}",
            ctx.registry().len()
        );
        Ok(ctx)
    })?;
    Ok(())
}

/// 获取全局上下文（未初始化时按默认配置初始化）
pub fn global_context() -> RspResult<&'static UniteContext> {
    GLOBAL_CONTEXT.get_or_try_init(|| {
        let ctx = UniteContext::new(UniteConfig::default())?;
        log::info!(
            "Global context initialized with defaults | Engines: {}",
            ctx.registry().len()
        );
        Ok(ctx)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_context_is_single_instance() {
        // 测试场景：多次获取返回同一实例，重复初始化不报错
        let a = global_context().unwrap();
        init_global_context(UniteConfig::default()).unwrap();
        let b = global_context().unwrap();
        assert!(std::ptr::eq(a, b));
    }
}
