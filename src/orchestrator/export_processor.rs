//! 导出处理器 - 编排层
//!
//! 编辑周期的第一步：读取文档，列出其中的图片，生成一份与导入格式相同的编辑表。
//! 当前的 alt 作为 generatedAltText，编辑列留空。

use crate::infrastructure::MarkupLocator;
use crate::models::{AltTextRecord, DocumentError, Metadata, UploadData};
use crate::orchestrator::batch_processor::document_path;
use crate::orchestrator::App;
use crate::services::standardizer::{standardize_grade_level, standardize_path};
use anyhow::{Context, Result};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{error, info};

/// 一次导出的结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOutcome {
    pub template: UploadData,
    pub errors: Vec<DocumentError>,
}

impl App {
    /// 生成编辑表
    ///
    /// 读取失败的文档记入 `errors`，其余文档照常导出
    pub async fn export_template(&self, relative_link: &str, lo_titles: &[String]) -> ExportOutcome {
        let relative_link = standardize_path(relative_link.trim());
        let base_link = relative_link.trim_matches('/');

        let fetches = lo_titles.iter().map(|lo_title| {
            let path = document_path(&self.config.fixed_base, base_link, lo_title);
            async move { (lo_title, self.store.fetch_text(&path).await) }
        });
        let fetched: Vec<_> = stream::iter(fetches)
            .buffered(self.config.max_concurrent_documents.max(1))
            .collect()
            .await;

        let mut alt_text_data = Vec::new();
        let mut errors = Vec::new();
        let locator = self.engine.locator();

        for (lo_title, result) in fetched {
            match result {
                Ok(markup) => {
                    let rows = template_rows(locator, lo_title, &markup);
                    info!("[文档 {}] ✓ 找到 {} 张图片", lo_title, rows.len());
                    alt_text_data.extend(rows);
                }
                Err(e) => {
                    error!("[文档 {}] ❌ 读取失败: {}", lo_title, e);
                    errors.push(DocumentError {
                        lo_title: Some(lo_title.clone()),
                        error: e.to_string(),
                    });
                }
            }
        }

        ExportOutcome {
            template: UploadData {
                metadata: Metadata {
                    lo_id: None,
                    grade_level: standardize_grade_level("6"),
                    relative_link,
                    generated_date: Some(Utc::now()),
                },
                alt_text_data,
            },
            errors,
        }
    }

    /// 生成编辑表并写入 `export_file`
    pub async fn run_export(&self, relative_link: &str, lo_titles: &[String]) -> Result<ExportOutcome> {
        info!("\n📤 导出 {} 个文档的图片", lo_titles.len());

        let outcome = self.export_template(relative_link, lo_titles).await;

        let template_json = serde_json::to_string_pretty(&outcome.template)?;
        tokio::fs::write(&self.config.export_file, template_json)
            .await
            .with_context(|| format!("无法写入编辑表: {}", self.config.export_file))?;
        info!(
            "📝 编辑表已保存至: {} ({} 行)",
            self.config.export_file,
            outcome.template.alt_text_data.len()
        );

        Ok(outcome)
    }
}

/// 一个文档的编辑表行，同一路径只出现一次
fn template_rows(locator: &MarkupLocator, lo_title: &str, markup: &str) -> Vec<AltTextRecord> {
    let mut seen = HashSet::new();

    locator
        .extract_images(markup)
        .into_iter()
        .filter(|image| seen.insert(image.src.trim_start_matches('/').to_string()))
        .map(|image| AltTextRecord {
            lo_title: lo_title.to_string(),
            image_source: image.src,
            generated_alt_text: image.alt.unwrap_or_default(),
            ..Default::default()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::infrastructure::MemoryDocumentStore;
    use crate::models::parse_upload;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_export_lists_images_per_document() {
        let store = MemoryDocumentStore::with_documents([
            (
                "dev/proj/lo1/index.html",
                r#"<img src="a.png" alt="Old"><img src="/a.png"><figure><img src="b.png"></figure>"#,
            ),
            ("dev/proj/lo2/index.html", r#"<p>no images</p>"#),
        ]);
        let app = App::new(Config::default(), Arc::new(store)).unwrap();

        let outcome = app
            .export_template("proj/", &["lo1".to_string(), "lo2".to_string(), "lo3".to_string()])
            .await;

        let rows = &outcome.template.alt_text_data;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].image_source, "a.png");
        assert_eq!(rows[0].generated_alt_text, "Old");
        assert_eq!(rows[1].image_source, "b.png");
        assert!(rows.iter().all(|r| r.edited_alt_text.is_empty()));
        assert_eq!(outcome.template.metadata.relative_link, "/proj");
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].lo_title.as_deref(), Some("lo3"));
    }

    #[tokio::test]
    async fn test_untouched_template_imports_as_empty() {
        let store = MemoryDocumentStore::with_documents([("dev/proj/lo1/index.html", r#"<img src="a.png">"#)]);
        let app = App::new(Config::default(), Arc::new(store)).unwrap();

        let outcome = app.export_template("proj", &["lo1".to_string()]).await;
        let bytes = serde_json::to_vec(&outcome.template).unwrap();
        let raw = parse_upload(&bytes).unwrap();

        assert!(raw.alt_text_data.is_empty());
    }

    #[tokio::test]
    async fn test_exported_alt_reimports_without_double_escaping() {
        let original = r#"<img src="a.png" alt="Tom &amp; Jerry">"#;
        let store = MemoryDocumentStore::with_documents([("dev/proj/lo1/index.html", original)]);
        let app = App::new(Config::default(), Arc::new(store.clone())).unwrap();

        let export = app.export_template("proj", &["lo1".to_string()]).await;
        let mut records = export.template.alt_text_data;
        assert_eq!(records[0].generated_alt_text, "Tom & Jerry");
        records[0].edited_alt_text = records[0].generated_alt_text.clone();

        let report = app.run_patch_batch(&export.template.metadata, records).await;

        assert_eq!(report.image_results.successful, 1);
        assert_eq!(report.files_processed, 0);
        assert_eq!(store.get("dev/proj/lo1/index.html").await.as_deref(), Some(original));
    }
}
