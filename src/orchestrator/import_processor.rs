//! 导入处理器 - 编排层
//!
//! 编辑表 → 标准化 → 校验 → 修补批次 → 报告。
//! 校验有任何违规时不修补任何文档，直接返回全部违规。

use crate::models::{load_upload_file, AltTextRecord, Metadata, RawUpload, RunReport};
use crate::orchestrator::App;
use crate::services::{standardize_upload, validate_upload, ErrorCollector, ErrorKind, ErrorSummary};
use crate::utils::truncate_text;
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::json;
use std::path::Path;
use tracing::{error, info, warn};

/// 一次导入的结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    pub alt_text_data: Vec<AltTextRecord>,
    pub total_processed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_summary: Option<RunReport>,
    pub error_summary: ErrorSummary,
}

impl ImportOutcome {
    /// 上传本身无法读取时的结果
    pub fn rejected(message: impl Into<String>) -> Self {
        let mut collector = ErrorCollector::new();
        collector.start_processing();
        collector.add_error(ErrorKind::Critical, message, None);
        collector.end_processing();

        Self {
            success: false,
            metadata: None,
            alt_text_data: Vec::new(),
            total_processed: 0,
            update_summary: None,
            error_summary: collector.summary(),
        }
    }
}

impl App {
    /// 处理一份已解析的上传
    pub async fn process_upload(&self, raw: &RawUpload) -> ImportOutcome {
        let mut collector = ErrorCollector::new();
        collector.start_processing();

        let data = standardize_upload(raw);
        let validation = validate_upload(&data);

        if !validation.valid {
            warn!("⚠️ 上传校验失败: {} 条违规", validation.errors.len());
            for violation in validation.errors {
                collector.add_error(ErrorKind::Validation, violation, None);
            }
            collector.end_processing();

            return ImportOutcome {
                success: false,
                metadata: Some(data.metadata),
                alt_text_data: data.alt_text_data,
                total_processed: 0,
                update_summary: None,
                error_summary: collector.summary(),
            };
        }

        info!(
            "✓ 上传校验通过: {} 条记录, 项目 {}",
            data.alt_text_data.len(),
            data.metadata.relative_link
        );

        let report = self
            .run_patch_batch(&data.metadata, data.alt_text_data.clone())
            .await;

        fold_report(&mut collector, &report);
        collector.end_processing();

        if self.config.verbose_logging {
            log_unfinished_images(&report);
        }

        ImportOutcome {
            success: report.success && collector.count(ErrorKind::Critical) == 0,
            total_processed: report.image_results.total,
            metadata: Some(data.metadata),
            alt_text_data: data.alt_text_data,
            update_summary: Some(report),
            error_summary: collector.summary(),
        }
    }

    /// 读取编辑表、执行导入，并把报告写入 `report_file`
    pub async fn run_import(&self, input: &Path) -> Result<ImportOutcome> {
        info!("\n📁 正在读取编辑表: {}", input.display());

        let outcome = match load_upload_file(input).await {
            Ok(raw) => self.process_upload(&raw).await,
            Err(e) => {
                error!("❌ {:#}", e);
                ImportOutcome::rejected(format!("{:#}", e))
            }
        };

        let report_json = serde_json::to_string_pretty(&outcome)?;
        tokio::fs::write(&self.config.report_file, report_json)
            .await
            .with_context(|| format!("无法写入报告: {}", self.config.report_file))?;
        info!("📝 报告已保存至: {}", self.config.report_file);

        Ok(outcome)
    }
}

fn log_unfinished_images(report: &RunReport) {
    for failed in &report.image_results.failed_images {
        info!(
            "  ❌ [{}] {}: {}",
            failed.lo_title,
            truncate_text(&failed.image_source, 60),
            failed.reason
        );
    }
    for figure in &report.image_results.needs_figure {
        info!(
            "  ⚠️ [{}] {}: 需要 figure",
            figure.lo_title,
            truncate_text(&figure.image_source, 60)
        );
    }
}

/// 把修补报告折算进错误收集器
fn fold_report(collector: &mut ErrorCollector, report: &RunReport) {
    for document in &report.errors {
        let message = match &document.lo_title {
            Some(lo_title) => format!("[{}] {}", lo_title, document.error),
            None => document.error.clone(),
        };
        collector.add_error(
            ErrorKind::Critical,
            message,
            Some(json!({ "loTitle": document.lo_title })),
        );
    }

    for figure in &report.image_results.needs_figure {
        collector.add_error(
            ErrorKind::Warning,
            format!(
                "Image {} is not inside a figure; description was not attached",
                figure.image_source
            ),
            Some(json!({ "loTitle": figure.lo_title, "imageSource": figure.image_source })),
        );
    }

    for failed in &report.image_results.failed_images {
        collector.add_error(
            ErrorKind::Validation,
            failed.reason.clone(),
            Some(json!({ "loTitle": failed.lo_title, "imageSource": failed.image_source })),
        );
    }

    for _ in 0..report.image_results.successful {
        collector.increment_success();
    }
}
