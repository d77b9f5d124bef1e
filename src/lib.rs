//! # Alt Text Patch
//!
//! 把人工编辑过的图片替代文本、长描述、装饰标记和署名批量写回 HTML 学习对象
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有外部资源，只暴露能力
//! - `MarkupLocator` / `ImageLocator` - 基于正则的标记定位，不解析 DOM
//! - `DocumentStore` - 按路径读取/写回文档（本地目录、HTTP 对象存储、内存）
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，全部是纯函数或独立状态
//! - `standardizer` - 字段标准化（字符串、路径、布尔、年级、日期）
//! - `validator` - 声明式规则校验
//! - `grouper` - 按文档分组
//! - `error_collector` - 按类别收集错误并生成汇总
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个文档"的完整修补流程
//! - `DocumentCtx` / `IdGenerator` - 上下文与文档内 id 分配
//! - `PatchEngine` - 定位 → 重写 `<img>` → 写入 figcaption
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量文档处理器，管理资源和并发
//! - `orchestrator/document_processor` - 单个文档：读取 → 修补 → 写回
//! - `orchestrator/record_batch` - 记录级分块批处理
//! - `orchestrator/import_processor` / `export_processor` - 编辑周期的导入与导出
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{DocumentStore, FsDocumentStore, HttpDocumentStore, MemoryDocumentStore};
pub use models::{AltTextRecord, PatchOutcome, PatchStatus, RunReport};
pub use orchestrator::{App, ExportOutcome, ImportOutcome};
pub use workflow::{DocumentPatch, PatchEngine};
