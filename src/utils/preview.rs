use std::fmt::{self, Write};

/// 日志预览默认截断长度（字符数）
pub const PREVIEW_LEN: usize = 96;

/// 日志预览：控制字符转义 + 超长截断（末尾追加 …）
/// 仅在格式化时遍历原串，不产生中间 String
pub fn preview(s: &str, max_chars: usize) -> impl fmt::Display + '_ {
    struct Preview<'a> {
        source: &'a str,
        max_chars: usize,
    }

    impl fmt::Display for Preview<'_> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            for (written, ch) in self.source.chars().enumerate() {
                if written >= self.max_chars {
                    return f.write_char('…');
                }
                if ch.is_control() {
                    for escaped in ch.escape_debug() {
                        f.write_char(escaped)?;
                    }
                } else {
                    f.write_char(ch)?;
                }
            }
            Ok(())
        }
    }

    Preview {
        source: s,
        max_chars,
    }
}
