use crate::error::SourceError;
use crate::models::record::{RawAltTextRecord, RawMetadata, RawUpload};
use crate::services::standardizer::standardize_boolean;
use anyhow::{Context, Result};
use serde_json::Value as JsonValue;
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// 从 JSON 编辑表解析原始上传
///
/// 既没有编辑后的替代文本、也不是装饰图片的行不可执行，会被丢弃（只有长描述也一样）
pub fn parse_upload(bytes: &[u8]) -> Result<RawUpload, SourceError> {
    let json: JsonValue = serde_json::from_slice(bytes)?;

    let (Some(metadata), Some(rows)) = (
        json.get("metadata").filter(|v| v.is_object()),
        json.get("altTextData").and_then(|v| v.as_array()),
    ) else {
        return Err(SourceError::MissingStructure);
    };

    let metadata: RawMetadata = serde_json::from_value(metadata.clone())?;

    let mut alt_text_data = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        let record: RawAltTextRecord = serde_json::from_value(row.clone())?;

        if !is_truthy(record.image_source.as_ref())
            || (!is_truthy(record.edited_alt_text.as_ref()) && record.is_decorative.is_none())
        {
            return Err(SourceError::InvalidRow { row: index + 1 });
        }

        if has_edit(&record) {
            alt_text_data.push(record);
        } else {
            debug!("跳过第 {} 行：没有编辑内容", index + 1);
        }
    }

    debug!(
        "解析完成: {} 行, 保留 {} 行",
        rows.len(),
        alt_text_data.len()
    );

    Ok(RawUpload {
        metadata,
        alt_text_data,
    })
}

/// 读取并解析上传文件
pub async fn load_upload_file(path: &Path) -> Result<RawUpload> {
    let content = fs::read(path)
        .await
        .with_context(|| format!("无法读取上传文件: {}", path.display()))?;

    let upload =
        parse_upload(&content).with_context(|| format!("无法解析上传文件: {}", path.display()))?;

    Ok(upload)
}

fn has_edit(record: &RawAltTextRecord) -> bool {
    is_truthy(record.edited_alt_text.as_ref())
        || record
            .is_decorative
            .as_ref()
            .is_some_and(standardize_boolean)
}

fn is_truthy(value: Option<&JsonValue>) -> bool {
    match value {
        None | Some(JsonValue::Null) => false,
        Some(JsonValue::String(s)) => !s.is_empty(),
        Some(JsonValue::Bool(b)) => *b,
        Some(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_parse_upload_keeps_actionable_rows() {
        let json = r#"{
            "metadata": {"relativeLink": "/project-a", "gradeLevel": "Grade 4"},
            "altTextData": [
                {"loTitle": "lo1", "imageSource": "img/a.png", "editedAltText": "A cat", "isDecorative": false},
                {"loTitle": "lo1", "imageSource": "img/b.png", "editedAltText": "", "isDecorative": "yes"},
                {"loTitle": "lo1", "imageSource": "img/c.png", "editedAltText": "", "isDecorative": false},
                {"loTitle": "lo1", "imageSource": "img/d.png", "editedAltText": "", "isDecorative": false,
                 "editedVisualDescription": "只有长描述"}
            ]
        }"#
        .as_bytes();

        let upload = assert_ok!(parse_upload(json));
        assert_eq!(upload.alt_text_data.len(), 2);
        assert_eq!(
            upload.metadata.relative_link,
            Some(JsonValue::String("/project-a".into()))
        );
    }

    #[test]
    fn test_parse_upload_missing_structure() {
        let err = assert_err!(parse_upload(br#"{"metadata": {}}"#));
        assert!(matches!(err, SourceError::MissingStructure));
    }

    #[test]
    fn test_parse_upload_row_without_image_source() {
        let json = br#"{"metadata": {}, "altTextData": [{"editedAltText": "x"}]}"#;
        let err = assert_err!(parse_upload(json));
        assert!(matches!(err, SourceError::InvalidRow { row: 1 }));
    }

    #[test]
    fn test_parse_upload_invalid_json() {
        let err = assert_err!(parse_upload(b"not json"));
        assert!(matches!(err, SourceError::Json(_)));
    }
}
