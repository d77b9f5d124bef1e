//! 标准化服务 - 业务能力层
//!
//! 把上传中类型不可信的字段整理成规范的记录。所有函数都是纯函数，
//! 不会失败：无法识别的输入替换为文档中约定的默认值。

use crate::models::grade::{find_alias, strip_grade_token};
use crate::models::record::{
    AltTextRecord, Metadata, RawAltTextRecord, RawMetadata, RawUpload, UploadData, DEFAULT_CREDIT,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value as JsonValue;

/// 未填写年级时使用的默认年级
const DEFAULT_GRADE: &str = "6";

/// 日期无法解析时的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFallback {
    /// 回落到当前时间（生成时间戳）
    Now,
    /// 回落到空值（往返保存的日期）
    Empty,
}

/// 标准化整份上传
pub fn standardize_upload(raw: &RawUpload) -> UploadData {
    UploadData {
        metadata: standardize_metadata(&raw.metadata),
        alt_text_data: raw.alt_text_data.iter().map(standardize_record).collect(),
    }
}

/// 标准化元数据
pub fn standardize_metadata(raw: &RawMetadata) -> Metadata {
    let grade = standardize_string(raw.grade_level.as_ref());
    let grade = if grade.is_empty() {
        DEFAULT_GRADE.to_string()
    } else {
        grade
    };

    let lo_id = standardize_string(raw.lo_id.as_ref());

    Metadata {
        lo_id: (!lo_id.is_empty()).then_some(lo_id),
        grade_level: standardize_grade_level(&grade),
        relative_link: standardize_path(&standardize_string(raw.relative_link.as_ref())),
        generated_date: standardize_date(raw.generated_date.as_ref(), DateFallback::Now),
    }
}

/// 标准化单条图片记录
pub fn standardize_record(raw: &RawAltTextRecord) -> AltTextRecord {
    let credit = standardize_string(raw.credit.as_ref());

    AltTextRecord {
        lo_title: standardize_string(raw.lo_title.as_ref()),
        image_source: standardize_path(&standardize_string(raw.image_source.as_ref())),
        generated_alt_text: standardize_string(raw.generated_alt_text.as_ref()),
        edited_alt_text: standardize_string(raw.edited_alt_text.as_ref()),
        generated_visual_description: standardize_string(
            raw.generated_visual_description.as_ref(),
        ),
        edited_visual_description: standardize_string(raw.edited_visual_description.as_ref()),
        needs_visual_description: raw
            .needs_visual_description
            .as_ref()
            .is_some_and(standardize_boolean),
        is_decorative: raw.is_decorative.as_ref().is_some_and(standardize_boolean),
        credit: if credit.is_empty() {
            DEFAULT_CREDIT.to_string()
        } else {
            credit
        },
    }
}

/// 字符串：去掉首尾空白；null / 缺失为空串；数字和布尔按字面转换
pub fn standardize_string(value: Option<&JsonValue>) -> String {
    match value {
        None | Some(JsonValue::Null) => String::new(),
        Some(JsonValue::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string().trim().to_string(),
    }
}

/// 路径：统一为 `/`，保证唯一的前导斜杠，合并重复斜杠，去掉末尾斜杠
pub fn standardize_path(path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }

    let mut normalized = String::with_capacity(path.len() + 1);
    normalized.push('/');
    for c in path.chars() {
        let c = if c == '\\' { '/' } else { c };
        if c == '/' && normalized.ends_with('/') {
            continue;
        }
        normalized.push(c);
    }

    if normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }

    normalized
}

/// 布尔：true、"true"/"yes"/"1"（不区分大小写）、数字 1 为真，其余一律为假
pub fn standardize_boolean(value: &JsonValue) -> bool {
    match value {
        JsonValue::Bool(b) => *b,
        JsonValue::String(s) => matches!(s.trim().to_lowercase().as_str(), "true" | "yes" | "1"),
        JsonValue::Number(n) => n.as_f64() == Some(1.0),
        _ => false,
    }
}

/// 年级：去掉 grade/gr/g 标记后，数字 → "Grade {n}"，别名 → 标准名称，
/// 其余 → "Grade {剩余部分}"
pub fn standardize_grade_level(grade_level: &str) -> String {
    let trimmed = grade_level.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let lowered = trimmed.to_lowercase();
    let remainder = strip_grade_token(&lowered);

    if !remainder.is_empty() && remainder.parse::<f64>().is_ok() {
        return format!("Grade {}", remainder);
    }

    if let Some(alias) = find_alias(remainder) {
        return alias.to_string();
    }

    // 保留原始大小写，只去掉已识别的前缀（前缀都是 ASCII，字节长度一致）
    let consumed = lowered.len() - remainder.len();
    let original_remainder = trimmed.get(consumed..).unwrap_or(trimmed);
    format!("Grade {}", original_remainder)
}

/// 日期：支持 RFC 3339、常见的日期/日期时间格式和毫秒时间戳
pub fn standardize_date(value: Option<&JsonValue>, fallback: DateFallback) -> Option<DateTime<Utc>> {
    let parsed = match value {
        Some(JsonValue::String(s)) => parse_date_str(s.trim()),
        Some(JsonValue::Number(n)) => n.as_i64().and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    };

    match (parsed, fallback) {
        (Some(date), _) => Some(date),
        (None, DateFallback::Now) => Some(Utc::now()),
        (None, DateFallback::Empty) => None,
    }
}

fn parse_date_str(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    if let Ok(date) = DateTime::parse_from_rfc3339(s) {
        return Some(date.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y/%m/%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    for format in ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }
    None
}
