use crate::error::ConfigError;
use serde::Deserialize;
use std::path::Path;

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 同时修补的文档数量
    pub max_concurrent_documents: usize,
    /// 记录级批处理的分块大小
    pub record_chunk_size: usize,
    /// 文档键的固定前缀（如 "dev"）
    pub fixed_base: String,
    /// 存储后端: "fs" 或 "http"
    pub store_backend: String,
    /// 本地镜像目录（fs 后端）
    pub store_root: String,
    /// 对象存储地址（http 后端）
    pub store_base_url: String,
    /// 对象存储访问令牌（可选）
    pub store_token: Option<String>,
    /// 保存文档时使用的 Content-Type
    pub content_type: String,
    /// 导入的编辑表（JSON）
    pub input_file: String,
    /// 导入报告输出
    pub report_file: String,
    /// 导出模板输出
    pub export_file: String,
    /// 输出日志文件
    pub output_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_concurrent_documents: 8,
            record_chunk_size: 50,
            fixed_base: "dev".to_string(),
            store_backend: "fs".to_string(),
            store_root: "content".to_string(),
            store_base_url: "http://localhost:9000/edwincontent".to_string(),
            store_token: None,
            content_type: "text/html".to_string(),
            input_file: "alt-text.json".to_string(),
            report_file: "alt-text-report.json".to_string(),
            export_file: "alt-text-export.json".to_string(),
            output_log_file: "output.txt".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件加载配置，未出现的字段使用默认值，环境变量仍然优先
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|source| ConfigError::FileReadFailed {
                path: path.display().to_string(),
                source,
            })?;
        let config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::TomlParseFailed {
                path: path.display().to_string(),
                source,
            })?;
        Ok(config.with_env_overrides())
    }

    fn with_env_overrides(self) -> Self {
        Self {
            max_concurrent_documents: std::env::var("MAX_CONCURRENT_DOCUMENTS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.max_concurrent_documents),
            record_chunk_size: std::env::var("RECORD_CHUNK_SIZE").ok().and_then(|v| v.parse().ok()).unwrap_or(self.record_chunk_size),
            fixed_base: std::env::var("FIXED_BASE").unwrap_or(self.fixed_base),
            store_backend: std::env::var("STORE_BACKEND").unwrap_or(self.store_backend),
            store_root: std::env::var("STORE_ROOT").unwrap_or(self.store_root),
            store_base_url: std::env::var("STORE_BASE_URL").unwrap_or(self.store_base_url),
            store_token: std::env::var("STORE_TOKEN").ok().or(self.store_token),
            content_type: std::env::var("CONTENT_TYPE").unwrap_or(self.content_type),
            input_file: std::env::var("INPUT_FILE").unwrap_or(self.input_file),
            report_file: std::env::var("REPORT_FILE").unwrap_or(self.report_file),
            export_file: std::env::var("EXPORT_FILE").unwrap_or(self.export_file),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(self.output_log_file),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(self.verbose_logging),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_partial_config_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            max_concurrent_documents = 2
            fixed_base = "prod"
            "#,
        )
        .unwrap();

        assert_eq!(config.max_concurrent_documents, 2);
        assert_eq!(config.fixed_base, "prod");
        assert_eq!(config.record_chunk_size, 50);
        assert_eq!(config.content_type, "text/html");
    }
}
