//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量文档处理器
//! - 管理应用生命周期（初始化、存储后端、修补引擎）
//! - 按 loTitle 分组，推导文档路径
//! - 控制并发数量（Semaphore）
//! - 汇总 RunReport
//!
//! ### `document_processor` - 单个文档处理器
//! - 读取 → 修补 → 有改动时写回
//! - 读取/写回失败转换为文档级错误
//!
//! ### `record_batch` - 记录级批处理
//! - 分块标准化和校验，块间让出执行权
//! - 进度回调，可提前终止
//!
//! ### `import_processor` / `export_processor` - 编辑周期的两端
//! - 导入：编辑表 → 校验 → 修补 → 报告
//! - 导出：文档 → 图片列表 → 编辑表
//!
//! ## 层次关系
//!
//! ```text
//! import_processor / export_processor
//!     ↓
//! batch_processor (处理 Vec<DocumentGroup>)
//!     ↓
//! document_processor (处理单个文档)
//!     ↓
//! workflow::PatchEngine (处理单个文档的全部记录)
//!     ↓
//! services (能力层：standardizer / validator / grouper / error_collector)
//!     ↓
//! infrastructure (基础设施：MarkupLocator / DocumentStore)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：batch_processor 管批量，document_processor 管单个
//! 2. **资源隔离**：只有编排层持有 DocumentStore
//! 3. **向下依赖**：编排层 → workflow → services → infrastructure
//! 4. **无业务逻辑**：只做调度和统计，不做具体修补判断

pub mod batch_processor;
pub mod document_processor;
pub mod export_processor;
pub mod import_processor;
pub mod record_batch;

// 重新导出主要类型
pub use batch_processor::{document_path, App};
pub use document_processor::{process_document, DocumentOutcome};
pub use export_processor::ExportOutcome;
pub use import_processor::ImportOutcome;
pub use record_batch::{process_record_batch, BatchProgress, RecordBatchOutput};
