use alt_text_patch::utils::logging;
use alt_text_patch::{App, Config};
use anyhow::{bail, Result};
use std::path::PathBuf;

const USAGE: &str =
    "用法: alt-text-patch [import [编辑表.json]] | check [编辑表.json] | export <relativeLink> <loTitle>...";

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置：ALT_PATCH_CONFIG 指向 toml 文件时优先使用
    let config = match std::env::var("ALT_PATCH_CONFIG") {
        Ok(path) => Config::from_toml_file(path)?,
        Err(_) => Config::from_env(),
    };

    // 初始化日志（终端 + output_log_file）
    logging::init(&config.output_log_file)?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let app = App::initialize(config).await?;

    match args.first().map(String::as_str) {
        None | Some("import") => {
            let input = args
                .get(1)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(&app.config().input_file));
            let outcome = app.run_import(&input).await?;
            if !outcome.success {
                bail!("导入未完全成功，详情见 {}", app.config().report_file);
            }
        }
        Some("check") => {
            let input = args
                .get(1)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(&app.config().input_file));
            let output = app.run_check(&input).await?;
            let summary_json = serde_json::to_string_pretty(&output.error_summary)?;
            tokio::fs::write(&app.config().report_file, summary_json).await?;
            if output.error_summary.failure_count > 0 {
                bail!("编辑表存在违规，详情见 {}", app.config().report_file);
            }
        }
        Some("export") => {
            let (Some(relative_link), lo_titles) = (args.get(1), args.get(2..).unwrap_or_default())
            else {
                bail!(USAGE);
            };
            if lo_titles.is_empty() {
                bail!(USAGE);
            }
            app.run_export(relative_link, lo_titles).await?;
        }
        Some(other) => bail!("未知的命令: {}\n{}", other, USAGE),
    }

    Ok(())
}
