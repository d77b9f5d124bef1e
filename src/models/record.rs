use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// 图片来源未填写署名时使用的默认值
pub const DEFAULT_CREDIT: &str = "Unknown";

/// 单张图片的编辑状态（标准化之后）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AltTextRecord {
    /// 所属文档（学习对象）的键
    pub lo_title: String,
    /// 标记中出现的图片路径，前导斜杠可有可无
    pub image_source: String,
    pub generated_alt_text: String,
    pub edited_alt_text: String,
    pub generated_visual_description: String,
    pub edited_visual_description: String,
    pub needs_visual_description: bool,
    pub is_decorative: bool,
    pub credit: String,
}

impl Default for AltTextRecord {
    fn default() -> Self {
        Self {
            lo_title: String::new(),
            image_source: String::new(),
            generated_alt_text: String::new(),
            edited_alt_text: String::new(),
            generated_visual_description: String::new(),
            edited_visual_description: String::new(),
            needs_visual_description: false,
            is_decorative: false,
            credit: DEFAULT_CREDIT.to_string(),
        }
    }
}

impl AltTextRecord {
    /// 只有填写了替代文本或标记为装饰图片的记录才需要处理
    pub fn is_actionable(&self) -> bool {
        !self.edited_alt_text.is_empty() || self.is_decorative
    }

    /// 长描述内容：编辑值 → 生成值 → 生成的替代文本
    pub fn description_text(&self) -> &str {
        if !self.edited_visual_description.is_empty() {
            &self.edited_visual_description
        } else if !self.generated_visual_description.is_empty() {
            &self.generated_visual_description
        } else {
            &self.generated_alt_text
        }
    }

    /// 署名，空值时回落到默认值
    pub fn credit_text(&self) -> &str {
        if self.credit.is_empty() {
            DEFAULT_CREDIT
        } else {
            &self.credit
        }
    }
}

/// 上传文件中的原始行，字段类型不可信
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAltTextRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lo_title: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_source: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_alt_text: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_alt_text: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_visual_description: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_visual_description: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub needs_visual_description: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_decorative: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit: Option<JsonValue>,
}

impl From<&AltTextRecord> for RawAltTextRecord {
    fn from(record: &AltTextRecord) -> Self {
        let text = |s: &str| Some(JsonValue::String(s.to_string()));
        Self {
            lo_title: text(&record.lo_title),
            image_source: text(&record.image_source),
            generated_alt_text: text(&record.generated_alt_text),
            edited_alt_text: text(&record.edited_alt_text),
            generated_visual_description: text(&record.generated_visual_description),
            edited_visual_description: text(&record.edited_visual_description),
            needs_visual_description: Some(JsonValue::Bool(record.needs_visual_description)),
            is_decorative: Some(JsonValue::Bool(record.is_decorative)),
            credit: text(&record.credit),
        }
    }
}

/// 上传文件中的原始元数据
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lo_id: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade_level: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_link: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_date: Option<JsonValue>,
}

/// 标准化后的元数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lo_id: Option<String>,
    pub grade_level: String,
    /// 项目目录，文档键由它和 loTitle 拼出
    pub relative_link: String,
    pub generated_date: Option<DateTime<Utc>>,
}

/// 记录来源解析出的整份上传
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawUpload {
    pub metadata: RawMetadata,
    pub alt_text_data: Vec<RawAltTextRecord>,
}

/// 标准化后的整份上传
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadData {
    pub metadata: Metadata,
    pub alt_text_data: Vec<AltTextRecord>,
}
