//! 名称相似度：预处理后的 Indel 比率（0~100）
//! ratio = 2 × LCS / (len(a) + len(b)) × 100，LCS 为最长公共子序列长度（按字符计）

/// 参与比较的最大字符数
pub const MAX_COMPARE_CHARS: usize = 64;

/// 预处理：小写，非字母数字替换为空格，去首尾空白，截断
pub fn preprocess(name: &str) -> String {
    let mapped: String = name
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    mapped.trim().chars().take(MAX_COMPARE_CHARS).collect()
}

/// 最长公共子序列长度（滚动单行 DP）
fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut row = vec![0usize; b.len() + 1];
    for &ca in a {
        let mut diagonal = 0;
        for (j, &cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == cb {
                diagonal + 1
            } else {
                above.max(row[j])
            };
            diagonal = above;
        }
    }
    row[b.len()]
}

/// 已预处理字符串的相似度（任一为空时为 0）
pub fn prepared_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let common = lcs_len(&a, &b);
    200.0 * common as f64 / (a.len() + b.len()) as f64
}

/// 两个名称的相似度
pub fn similarity(a: &str, b: &str) -> f64 {
    prepared_similarity(&preprocess(a), &preprocess(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(actual: f64, expected: f64) -> bool {
        (actual - expected).abs() < 0.01
    }

    #[test]
    fn test_preprocess() {
        // 测试场景：大小写与分隔符不影响比较
        assert_eq!(preprocess("  Trojan.Win32/SubSeven!ml "), "trojan win32 subseven ml");
        assert_eq!(preprocess("..."), "");
        assert_eq!(preprocess(&"A".repeat(100)).len(), MAX_COMPARE_CHARS);
    }

    #[test]
    fn test_similarity_scores() {
        // 测试场景：相同、相近、无关、空串
        assert_eq!(similarity("SubSeven", "subseven"), 100.0);
        assert!(similarity("SubSeven", "Zbot") < 45.0);
        assert_eq!(similarity("", "SubSeven"), 0.0);
        assert_eq!(similarity("!!", "??"), 0.0);
    }

    #[test]
    fn test_similarity_is_indel_ratio() {
        // 测试场景：插入/删除计 1，替换计 2
        assert!(close(similarity("Emotet", "EmotetRI"), 85.71));
        assert!(close(similarity("Agen", "AgentTeslaX"), 53.33));
        // 单字符替换 = 一删一插：2 × 5 / 12
        assert!(close(similarity("Zbot.A", "Zbot.B"), 83.33));
        assert!(close(similarity("abc", "cab"), 66.67));
        assert_eq!(similarity("abc", "xyz"), 0.0);
    }

    #[test]
    fn test_similarity_is_symmetric() {
        // 测试场景：参数顺序不影响结果
        for (a, b) in [("SubSeven", "Subseven7"), ("Emotet", "Emote"), ("Zbot", "Zeus")] {
            assert_eq!(similarity(a, b), similarity(b, a));
        }
    }
}
