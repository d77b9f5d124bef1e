//! 单个文档处理器 - 编排层
//!
//! ## 职责
//!
//! 读取一个文档 → 交给 PatchEngine 修补 → 有改动时写回。
//!
//! 读取或写回失败只影响这个文档：返回 `DocumentOutcome::Failed`，
//! 由批量处理器记入报告，其他文档照常处理。

use crate::infrastructure::DocumentStore;
use crate::models::{AltTextRecord, PatchOutcome, PatchStatus};
use crate::workflow::{DocumentCtx, PatchEngine};
use tracing::{error, info};

/// 单个文档的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentOutcome {
    /// 修补已完成；`saved` 表示是否写回了新内容
    Patched {
        lo_title: String,
        outcomes: Vec<PatchOutcome>,
        saved: bool,
    },
    /// 文档读取或写回失败，其中的图片一律记为失败
    Failed {
        lo_title: String,
        error: String,
        image_sources: Vec<String>,
        reason: String,
    },
}

impl DocumentOutcome {
    fn failed(ctx: &DocumentCtx, records: &[AltTextRecord], error: String, reason: String) -> Self {
        DocumentOutcome::Failed {
            lo_title: ctx.lo_title.clone(),
            error,
            image_sources: records.iter().map(|r| r.image_source.clone()).collect(),
            reason,
        }
    }
}

/// 处理单个文档
///
/// # 参数
/// - `store`: 文档存储
/// - `engine`: 修补引擎
/// - `ctx`: 文档上下文（用于日志）
/// - `path`: 文档在存储中的路径
/// - `records`: 该文档的全部图片记录（按顺序应用）
/// - `content_type`: 写回时使用的 Content-Type
pub async fn process_document(
    store: &dyn DocumentStore,
    engine: &PatchEngine,
    ctx: &DocumentCtx,
    path: &str,
    records: &[AltTextRecord],
    content_type: &str,
) -> DocumentOutcome {
    info!("{} 📄 开始修补 {} 条记录: {}", ctx, ctx.record_count, path);

    let markup = match store.fetch_text(path).await {
        Ok(markup) => markup,
        Err(e) => {
            error!("{} ❌ 读取失败: {}", ctx, e);
            let reason = format!("Document could not be fetched: {}", e);
            return DocumentOutcome::failed(ctx, records, e.to_string(), reason);
        }
    };

    let patch = engine.patch_document(&markup, records, &ctx.lo_title);

    if !patch.changed {
        info!("{} ✓ 内容无变化，跳过写回", ctx);
        log_document_complete(ctx, &patch.outcomes);
        return DocumentOutcome::Patched {
            lo_title: ctx.lo_title.clone(),
            outcomes: patch.outcomes,
            saved: false,
        };
    }

    if let Err(e) = store.save_text(path, &patch.markup, content_type).await {
        error!("{} ❌ 写回失败: {}", ctx, e);
        let reason = format!("Document not saved: {}", e);
        return DocumentOutcome::failed(ctx, records, e.to_string(), reason);
    }

    info!("{} 💾 已写回", ctx);
    log_document_complete(ctx, &patch.outcomes);

    DocumentOutcome::Patched {
        lo_title: ctx.lo_title.clone(),
        outcomes: patch.outcomes,
        saved: true,
    }
}

fn log_document_complete(ctx: &DocumentCtx, outcomes: &[PatchOutcome]) {
    let successful = outcomes
        .iter()
        .filter(|o| o.status == PatchStatus::Success)
        .count();
    let needs_figure = outcomes
        .iter()
        .filter(|o| o.status == PatchStatus::NeedsFigure)
        .count();

    info!(
        "{} ✓ 完成: 成功 {}/{}, 需要 figure {}",
        ctx,
        successful,
        outcomes.len(),
        needs_figure
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::infrastructure::MemoryDocumentStore;
    use async_trait::async_trait;

    struct ReadOnlyStore(MemoryDocumentStore);

    #[async_trait]
    impl DocumentStore for ReadOnlyStore {
        async fn fetch_text(&self, path: &str) -> Result<String, StoreError> {
            self.0.fetch_text(path).await
        }

        async fn save_text(&self, path: &str, _: &str, _: &str) -> Result<(), StoreError> {
            Err(StoreError::BadStatus {
                path: path.to_string(),
                status: 403,
            })
        }
    }

    fn record(image_source: &str) -> AltTextRecord {
        AltTextRecord {
            lo_title: "lo1".into(),
            image_source: image_source.into(),
            edited_alt_text: "A".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_changed_document_is_saved() {
        let store = MemoryDocumentStore::with_documents([("dev/p/lo1/index.html", r#"<img src="a.png">"#)]);
        let engine = PatchEngine::new().unwrap();
        let ctx = DocumentCtx::new("lo1", 1, 1);

        let outcome = process_document(&store, &engine, &ctx, "dev/p/lo1/index.html", &[record("a.png")], "text/html").await;

        assert!(matches!(outcome, DocumentOutcome::Patched { saved: true, .. }));
        assert_eq!(
            store.get("dev/p/lo1/index.html").await.as_deref(),
            Some(r#"<img src="a.png" alt="A">"#)
        );
    }

    #[tokio::test]
    async fn test_unchanged_document_is_not_saved() {
        let store = ReadOnlyStore(MemoryDocumentStore::with_documents([(
            "dev/p/lo1/index.html",
            r#"<img src="a.png" alt="A">"#,
        )]));
        let engine = PatchEngine::new().unwrap();
        let ctx = DocumentCtx::new("lo1", 1, 1);

        let outcome = process_document(&store, &engine, &ctx, "dev/p/lo1/index.html", &[record("a.png")], "text/html").await;

        match outcome {
            DocumentOutcome::Patched { saved, outcomes, .. } => {
                assert!(!saved);
                assert_eq!(outcomes[0].status, PatchStatus::Success);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_and_save_failures() {
        let engine = PatchEngine::new().unwrap();
        let ctx = DocumentCtx::new("lo1", 1, 2);
        let records = [record("a.png"), record("b.png")];

        let empty = MemoryDocumentStore::new();
        let outcome = process_document(&empty, &engine, &ctx, "dev/p/lo1/index.html", &records, "text/html").await;
        match outcome {
            DocumentOutcome::Failed { image_sources, reason, .. } => {
                assert_eq!(image_sources, vec!["a.png", "b.png"]);
                assert!(reason.starts_with("Document could not be fetched"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        let read_only = ReadOnlyStore(MemoryDocumentStore::with_documents([(
            "dev/p/lo1/index.html",
            r#"<img src="a.png">"#,
        )]));
        let outcome = process_document(&read_only, &engine, &ctx, "dev/p/lo1/index.html", &records, "text/html").await;
        assert!(matches!(
            outcome,
            DocumentOutcome::Failed { ref reason, .. } if reason.starts_with("Document not saved")
        ));
    }
}
