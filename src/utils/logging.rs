/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// 初始化 tracing 订阅者：同时输出到终端和日志文件
///
/// 默认级别为 info，可通过 `RUST_LOG` 覆盖；重复调用不会报错
pub fn init(log_file_path: &str) -> Result<()> {
    init_log_file(log_file_path)?;
    let log_file = OpenOptions::new()
        .append(true)
        .open(log_file_path)
        .with_context(|| format!("无法打开日志文件: {}", log_file_path))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(log_file)),
        )
        .try_init();

    Ok(())
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n替代文本修补日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)
        .with_context(|| format!("无法写入日志文件: {}", log_file_path))?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(mode: &str, max_concurrent: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - {}", mode);
    info!("📊 文档最大并发数: {}", max_concurrent);
    info!("{}", "=".repeat(60));
}

/// 记录修补批次开始信息
///
/// # 参数
/// - `documents`: 文档数量
/// - `images`: 图片记录数量
pub fn log_batch_start(documents: usize, images: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始修补: {} 个文档, {} 条图片记录", documents, images);
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `files_processed`: 已保存的文档数
/// - `successful`: 成功的图片数
/// - `failed`: 失败的图片数
/// - `needs_figure`: 需要 figure 的图片数
/// - `total`: 图片总数
pub fn print_final_stats(
    files_processed: usize,
    successful: usize,
    failed: usize,
    needs_figure: usize,
    total: usize,
) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("📄 已保存文档: {}", files_processed);
    info!("✅ 成功: {}/{}", successful, total);
    info!("⚠️ 需要 figure: {}", needs_figure);
    info!("❌ 失败: {}", failed);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
