//! 记录级批处理 - 编排层
//!
//! 标准化 → 校验 → 计数，按固定大小分块处理。每块结束后让出执行权，
//! 并把进度交给回调；回调返回 `ControlFlow::Break` 时在当前块结束后停止。

use crate::models::{load_upload_file, AltTextRecord, RawAltTextRecord};
use crate::orchestrator::App;
use crate::services::{standardize_record, validate_record, ErrorCollector, ErrorKind, ErrorSummary};
use anyhow::Result;
use serde::Serialize;
use serde_json::json;
use std::ops::ControlFlow;
use std::path::Path;
use tracing::{debug, info, warn};

/// 进度信息
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchProgress {
    pub processed: usize,
    pub total: usize,
    pub progress_percent: f64,
}

/// 批处理结果
#[derive(Debug, Clone, PartialEq)]
pub struct RecordBatchOutput {
    /// 通过校验的标准化记录，保持输入顺序
    pub processed: Vec<AltTextRecord>,
    pub error_summary: ErrorSummary,
    /// 是否被回调提前终止
    pub cancelled: bool,
}

/// 进度回调
pub type ProgressCallback<'a> = &'a mut dyn FnMut(BatchProgress) -> ControlFlow<()>;

/// 分块处理原始记录
///
/// # 参数
/// - `records`: 原始记录
/// - `chunk_size`: 每块的记录数（0 按 1 处理）
/// - `progress`: 可选的进度回调
pub async fn process_record_batch(
    records: &[RawAltTextRecord],
    chunk_size: usize,
    mut progress: Option<ProgressCallback<'_>>,
) -> RecordBatchOutput {
    let total = records.len();
    let chunk_size = chunk_size.max(1);

    let mut collector = ErrorCollector::new();
    collector.start_processing();

    let mut processed = Vec::with_capacity(total);
    let mut done = 0;
    let mut cancelled = false;

    for chunk in records.chunks(chunk_size) {
        for raw in chunk {
            done += 1;
            let record = standardize_record(raw);
            let violations = validate_record(&record, &format!("Row {}", done));

            if violations.is_empty() {
                collector.increment_success();
                processed.push(record);
                continue;
            }

            debug!("第 {} 行校验失败: {:?}", done, violations);
            for violation in violations {
                collector.add_error(
                    ErrorKind::Validation,
                    violation,
                    Some(json!({
                        "row": done,
                        "loTitle": record.lo_title,
                        "imageSource": record.image_source,
                    })),
                );
            }
        }

        tokio::task::yield_now().await;

        let update = BatchProgress {
            processed: done,
            total,
            progress_percent: done as f64 * 100.0 / total as f64,
        };
        if let Some(callback) = progress.as_deref_mut() {
            if callback(update).is_break() {
                info!("⏹️ 记录处理已取消: {}/{}", done, total);
                cancelled = true;
                break;
            }
        }
    }

    collector.end_processing();

    RecordBatchOutput {
        processed,
        error_summary: collector.summary(),
        cancelled,
    }
}

impl App {
    /// 只做记录级检查：按 `record_chunk_size` 分块标准化和校验，不读写任何文档
    pub async fn run_check(&self, input: &Path) -> Result<RecordBatchOutput> {
        let raw = load_upload_file(input).await?;
        info!("\n🔍 检查 {} 条记录: {}", raw.alt_text_data.len(), input.display());

        let mut log_progress = |progress: BatchProgress| {
            info!(
                "⏳ {}/{} ({:.0}%)",
                progress.processed, progress.total, progress.progress_percent
            );
            ControlFlow::Continue(())
        };
        let output = process_record_batch(
            &raw.alt_text_data,
            self.config.record_chunk_size,
            Some(&mut log_progress),
        )
        .await;

        let summary = &output.error_summary;
        if summary.failure_count > 0 {
            warn!("⚠️ {} 条违规", summary.failure_count);
        }
        info!("✓ 通过: {}/{}", summary.success_count, raw.alt_text_data.len());

        Ok(output)
    }
}
