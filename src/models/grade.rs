use phf::phf_map;

/// 年级别名 → 标准名称
static GRADE_ALIASES: phf::Map<&'static str, &'static str> = phf_map! {
    "k" => "Kindergarten",
    "kindergarten" => "Kindergarten",
    "pk" => "Pre-K",
    "pre-k" => "Pre-K",
    "pre k" => "Pre-K",
};

/// 年级前缀，按长度从长到短匹配
const GRADE_TOKENS: [&str; 3] = ["grade", "gr", "g"];

/// 查找年级别名（输入需已转为小写）
pub fn find_alias(lowered: &str) -> Option<&'static str> {
    GRADE_ALIASES.get(lowered).copied()
}

/// 去掉开头的 grade / gr / g 标记
///
/// 标记后必须紧跟空白或数字，避免把 "gifted" 变成 "ifted"
pub fn strip_grade_token(lowered: &str) -> &str {
    for token in GRADE_TOKENS {
        if let Some(rest) = lowered.strip_prefix(token) {
            match rest.chars().next() {
                Some(c) if c.is_whitespace() || c.is_ascii_digit() => return rest.trim_start(),
                _ => {}
            }
        }
    }
    lowered
}
