//! 校验服务 - 业务能力层
//!
//! 用声明式规则校验元数据和图片记录，输出扁平的可读错误列表。
//! 校验失败只收集、不中断：调用方拿到完整列表后再决定是否继续。

use crate::models::record::{AltTextRecord, Metadata, UploadData};
use crate::services::standardizer::{standardize_date, DateFallback};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

/// 字段的基本类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    String,
    Boolean,
    Number,
    Date,
}

impl ValueKind {
    fn name(self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Boolean => "boolean",
            ValueKind::Number => "number",
            ValueKind::Date => "date",
        }
    }

    fn matches(self, value: &JsonValue) -> bool {
        match self {
            ValueKind::String => value.is_string(),
            ValueKind::Boolean => value.is_boolean(),
            ValueKind::Number => value.is_number(),
            ValueKind::Date => standardize_date(Some(value), DateFallback::Empty).is_some(),
        }
    }
}

/// 自定义校验：(字段值, 整条记录) -> 是否通过
pub type FieldCheck = fn(&JsonValue, &Map<String, JsonValue>) -> bool;

/// 单个字段的校验规则
#[derive(Clone, Copy)]
pub struct FieldRule {
    pub field: &'static str,
    pub required: bool,
    pub kind: ValueKind,
    pub validate: Option<FieldCheck>,
    pub message: Option<&'static str>,
}

impl FieldRule {
    const fn optional(field: &'static str, kind: ValueKind) -> Self {
        Self {
            field,
            required: false,
            kind,
            validate: None,
            message: None,
        }
    }
}

/// 元数据规则
pub const METADATA_RULES: &[FieldRule] = &[
    FieldRule {
        field: "gradeLevel",
        required: false,
        kind: ValueKind::String,
        validate: Some(is_non_blank),
        message: Some("Invalid grade level format"),
    },
    FieldRule {
        field: "relativeLink",
        required: true,
        kind: ValueKind::String,
        validate: Some(is_non_blank),
        message: Some("Project directory link is required"),
    },
    FieldRule::optional("generatedDate", ValueKind::Date),
];

/// 图片记录规则
pub const RECORD_RULES: &[FieldRule] = &[
    FieldRule::optional("loTitle", ValueKind::String),
    FieldRule {
        field: "imageSource",
        required: true,
        kind: ValueKind::String,
        validate: Some(is_non_blank),
        message: Some("Image source is required"),
    },
    FieldRule::optional("generatedAltText", ValueKind::String),
    FieldRule {
        field: "editedAltText",
        required: false,
        kind: ValueKind::String,
        validate: Some(has_alt_text_or_decorative),
        message: Some("Either edited alt text or isDecorative must be provided"),
    },
    FieldRule::optional("isDecorative", ValueKind::Boolean),
    FieldRule::optional("needsVisualDescription", ValueKind::Boolean),
    FieldRule::optional("credit", ValueKind::String),
];

fn is_non_blank(value: &JsonValue, _record: &Map<String, JsonValue>) -> bool {
    value.as_str().is_some_and(|s| !s.trim().is_empty())
}

fn has_alt_text_or_decorative(value: &JsonValue, record: &Map<String, JsonValue>) -> bool {
    record.get("isDecorative") == Some(&JsonValue::Bool(true))
        || value.as_str().is_some_and(|s| !s.trim().is_empty())
}

/// 按规则校验一段数据
///
/// 缺失（或 null）的可选字段跳过；必填字段缺失时只报告缺失，不再做其他检查。
/// `prefix` 非空时每条错误都带上 "{prefix}: "。
pub fn validate_section(record: &JsonValue, rules: &[FieldRule], prefix: &str) -> Vec<String> {
    let empty = Map::new();
    let fields = record.as_object().unwrap_or(&empty);
    let label = |message: String| {
        if prefix.is_empty() {
            message
        } else {
            format!("{}: {}", prefix, message)
        }
    };

    let mut errors = Vec::new();
    for rule in rules {
        let value = match fields.get(rule.field) {
            None | Some(JsonValue::Null) => {
                if rule.required {
                    errors.push(label(format!("{} is required", rule.field)));
                }
                continue;
            }
            Some(value) => value,
        };

        if rule.kind == ValueKind::Date {
            if !rule.kind.matches(value) {
                errors.push(label(format!("{} must be a valid date", rule.field)));
            }
            continue;
        }

        if !rule.kind.matches(value) {
            errors.push(label(format!(
                "{} must be of type {}",
                rule.field,
                rule.kind.name()
            )));
        }

        if let Some(check) = rule.validate {
            if !check(value, fields) {
                let message = rule
                    .message
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Invalid {}", rule.field));
                errors.push(label(message));
            }
        }
    }

    errors
}

/// 校验单条图片记录
pub fn validate_record(record: &AltTextRecord, prefix: &str) -> Vec<String> {
    validate_section(&to_json(record), RECORD_RULES, prefix)
}

/// 校验元数据
pub fn validate_metadata(metadata: &Metadata) -> Vec<String> {
    validate_section(&to_json(metadata), METADATA_RULES, "")
}

/// 整份上传的校验结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// 校验整份上传：元数据 + 每一行，不提前退出
pub fn validate_upload(data: &UploadData) -> ValidationReport {
    let mut errors = validate_metadata(&data.metadata);

    if data.alt_text_data.is_empty() {
        errors.push("Alt text data array is empty".to_string());
    } else {
        for (index, record) in data.alt_text_data.iter().enumerate() {
            errors.extend(validate_record(record, &format!("Row {}", index + 1)));
        }
    }

    ValidationReport {
        valid: errors.is_empty(),
        errors,
    }
}

fn to_json<T: Serialize>(value: &T) -> JsonValue {
    serde_json::to_value(value).unwrap_or(JsonValue::Null)
}
