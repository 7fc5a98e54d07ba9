use regex_syntax::ParserBuilder;

/// 正则片段可匹配的字节长度上下界 (最短, 最长)
/// 无法解析或无上界时上界为 None；永不匹配的片段下界按 0 处理
pub fn length_bounds(source: &str, ignore_case: bool) -> (usize, Option<usize>) {
    match ParserBuilder::new()
        .case_insensitive(ignore_case)
        .build()
        .parse(source)
    {
        Ok(hir) => {
            let props = hir.properties();
            (props.minimum_len().unwrap_or(0), props.maximum_len())
        }
        Err(e) => {
            log::debug!("Length bounds unavailable | Pattern: {} | Reason: {}", source, e);
            (0, None)
        }
    }
}
