//! 批量文档处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责一次修补运行的调度和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：创建日志文件、按配置选择存储后端、编译修补引擎
//! 2. **批次规划**：按 loTitle 分组，推导每个文档的存储路径
//! 3. **并发控制**：使用 Semaphore 限制同时处理的文档数量
//! 4. **故障隔离**：单个文档的读取/写回失败只记入报告，不中断运行
//! 5. **全局统计**：汇总所有图片的修补结果
//!
//! ## 设计特点
//!
//! - **资源所有者**：唯一持有存储和修补引擎的模块
//! - **并发安全**：通过 Semaphore 和 tokio::spawn 实现并发
//! - **向下委托**：委托 document_processor 处理单个文档

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::{store_from_config, DocumentStore};
use crate::models::{AltTextRecord, DocumentError, Metadata, RunReport};
use crate::orchestrator::document_processor::{self, DocumentOutcome};
use crate::services::group_by_document;
use crate::utils::logging::{log_batch_start, log_startup, print_final_stats};
use crate::workflow::{DocumentCtx, PatchEngine};
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

const EMPTY_KEY_ERROR: &str = "Document key (loTitle) is empty";

/// 应用主结构
pub struct App {
    pub(crate) config: Config,
    pub(crate) store: Arc<dyn DocumentStore>,
    pub(crate) engine: Arc<PatchEngine>,
}

impl App {
    /// 使用指定的存储创建应用
    pub fn new(config: Config, store: Arc<dyn DocumentStore>) -> AppResult<Self> {
        Ok(Self {
            config,
            store,
            engine: Arc::new(PatchEngine::new()?),
        })
    }

    /// 初始化应用：按配置创建存储
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup("替代文本修补", config.max_concurrent_documents);

        let store = store_from_config(&config)?;
        info!("🗄️ 存储后端: {}", config.store_backend);

        Ok(Self::new(config, store)?)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 把一批记录应用到各自的文档上
    ///
    /// 总会返回完整的报告：单个文档的失败只记入 `errors`，
    /// 只有批次规划失败时 `success` 才为 false。
    pub async fn run_patch_batch(
        &self,
        metadata: &Metadata,
        records: Vec<AltTextRecord>,
    ) -> RunReport {
        let mut report = RunReport::default();

        let base_link = metadata.relative_link.trim().trim_matches('/');
        if base_link.is_empty() {
            let planning = AppError::Planning("relativeLink is empty".to_string());
            error!("❌ {}", planning);
            report.success = false;
            for record in &records {
                report.image_results.record_unapplied(
                    &record.lo_title,
                    &record.image_source,
                    "Batch planning failed",
                );
            }
            report.errors.push(DocumentError {
                lo_title: None,
                error: planning.to_string(),
            });
            return report;
        }

        let total_images = records.len();
        let groups = group_by_document(records);
        log_batch_start(groups.len(), total_images);

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_documents.max(1)));
        let mut handles = Vec::with_capacity(groups.len());

        for (idx, group) in groups.into_iter().enumerate() {
            let document_index = idx + 1;

            if group.lo_title.is_empty() {
                warn!("[文档 #{}] ⚠️ {}", document_index, EMPTY_KEY_ERROR);
                report.errors.push(DocumentError {
                    lo_title: Some(String::new()),
                    error: EMPTY_KEY_ERROR.to_string(),
                });
                for record in &group.records {
                    report
                        .image_results
                        .record_unapplied("", &record.image_source, EMPTY_KEY_ERROR);
                }
                continue;
            }

            let image_sources: Vec<String> = group
                .records
                .iter()
                .map(|r| r.image_source.clone())
                .collect();

            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    error!("[文档 #{}] 无法获取并发许可: {}", document_index, e);
                    report.errors.push(DocumentError {
                        lo_title: Some(group.lo_title.clone()),
                        error: e.to_string(),
                    });
                    for source in &image_sources {
                        report
                            .image_results
                            .record_unapplied(&group.lo_title, source, "Document not processed");
                    }
                    continue;
                }
            };

            let ctx = DocumentCtx::new(group.lo_title.clone(), document_index, group.records.len());
            let path = document_path(&self.config.fixed_base, base_link, &group.lo_title);
            let store = Arc::clone(&self.store);
            let engine = Arc::clone(&self.engine);
            let content_type = self.config.content_type.clone();
            let lo_title = group.lo_title.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                document_processor::process_document(
                    store.as_ref(),
                    &engine,
                    &ctx,
                    &path,
                    &group.records,
                    &content_type,
                )
                .await
            });
            handles.push((lo_title, image_sources, handle));
        }

        // 等待所有文档完成
        for (lo_title, image_sources, handle) in handles {
            match handle.await {
                Ok(outcome) => merge_outcome(&mut report, outcome),
                Err(e) => {
                    error!("[文档 {}] 任务执行失败: {}", lo_title, e);
                    report.errors.push(DocumentError {
                        lo_title: Some(lo_title.clone()),
                        error: e.to_string(),
                    });
                    for source in &image_sources {
                        report
                            .image_results
                            .record_unapplied(&lo_title, source, "Document task failed");
                    }
                }
            }
        }

        let results = &report.image_results;
        print_final_stats(
            report.files_processed,
            results.successful,
            results.failed,
            results.needs_figure.len(),
            results.total,
        );

        report
    }
}

/// 合并单个文档的结果
fn merge_outcome(report: &mut RunReport, outcome: DocumentOutcome) {
    match outcome {
        DocumentOutcome::Patched {
            lo_title,
            outcomes,
            saved,
        } => {
            for outcome in &outcomes {
                report.image_results.record(outcome);
            }
            if saved {
                report.files_processed += 1;
                report.updated_files.push(lo_title);
            }
        }
        DocumentOutcome::Failed {
            lo_title,
            error,
            image_sources,
            reason,
        } => {
            for source in &image_sources {
                report
                    .image_results
                    .record_unapplied(&lo_title, source, &reason);
            }
            report.errors.push(DocumentError {
                lo_title: Some(lo_title),
                error,
            });
        }
    }
}

/// 文档在存储中的路径：`{fixed_base}/{base_link}/{lo_title}/index.html`
///
/// 合并重复的 `/`，去掉前导 `/`
pub fn document_path(fixed_base: &str, base_link: &str, lo_title: &str) -> String {
    let joined = format!("{}/{}/{}/index.html", fixed_base, base_link, lo_title);

    let mut path = String::with_capacity(joined.len());
    for c in joined.chars() {
        if c == '/' && (path.is_empty() || path.ends_with('/')) {
            continue;
        }
        path.push(c);
    }
    path
}
