use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 文档存储错误
    #[error("存储错误: {0}")]
    Store(#[from] StoreError),
    /// 上传数据错误
    #[error("数据源错误: {0}")]
    Source(#[from] SourceError),
    /// 标记修补错误
    #[error("修补错误: {0}")]
    Patch(#[from] PatchError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 批次规划错误（整个运行失败）
    #[error("批次规划失败: {0}")]
    Planning(String),
}

/// 文档存储错误
#[derive(Debug, Error)]
pub enum StoreError {
    /// 文档不存在
    #[error("文档不存在: {path}")]
    NotFound { path: String },
    /// 读取失败
    #[error("读取文档失败 ({path}): {source}")]
    FetchFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 写入失败
    #[error("保存文档失败 ({path}): {source}")]
    SaveFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 远端返回错误状态
    #[error("存储返回错误状态 ({path}): HTTP {status}")]
    BadStatus { path: String, status: u16 },
}

/// 上传数据（JSON 编辑表）错误
#[derive(Debug, Error)]
pub enum SourceError {
    /// JSON 解析失败
    #[error("无法解析上传文件: {0}")]
    Json(#[from] serde_json::Error),
    /// 缺少必须的顶层结构
    #[error("Invalid JSON structure. Missing required fields.")]
    MissingStructure,
    /// 某一行缺少必须字段
    #[error("Invalid row data. Missing required fields. (row {row})")]
    InvalidRow { row: usize },
}

/// 单张图片的修补错误
#[derive(Debug, Error)]
pub enum PatchError {
    /// 图片所在的 figure 没有闭合
    #[error("figure 未闭合 (起始位置 {figure_start})")]
    UnclosedFigure { figure_start: usize },
    /// 图片之后、闭合标签之前又出现了 figure
    #[error("figure 嵌套异常 (起始位置 {figure_start})")]
    NestedFigure { figure_start: usize },
    /// 图片位于 figcaption 内部，无法同时改写两者
    #[error("图片位于 figcaption 内部")]
    ImageInsideCaption,
    /// 结构正则编译失败
    #[error("内置正则编译失败: {0}")]
    Pattern(#[from] regex::Error),
    /// 定位正则构建失败
    #[error("无法构建图片定位器 ({image_source}): {source}")]
    Locator {
        image_source: String,
        #[source]
        source: regex::Error,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置文件读取失败
    #[error("配置文件读取失败 ({path}): {source}")]
    FileReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 配置文件解析失败
    #[error("配置文件解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 未知的存储后端
    #[error("未知的存储后端: {0}")]
    UnknownBackend(String),
}

// ========== 便捷构造函数 ==========

impl StoreError {
    /// 创建读取失败错误
    pub fn fetch_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        StoreError::FetchFailed {
            path: path.into(),
            source: Box::new(source),
        }
    }

    /// 创建写入失败错误
    pub fn save_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        StoreError::SaveFailed {
            path: path.into(),
            source: Box::new(source),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
