//! 文档存储 - 基础设施层
//!
//! 只暴露"按路径读取文本"和"按路径写回文本"两个能力，
//! 不认识图片记录，也不关心修补流程。

use crate::config::Config;
use crate::error::{ConfigError, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// 文档存储
///
/// 路径形如 `dev/<项目>/<文档>/index.html`，不带前导斜杠
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// 读取文档全文
    async fn fetch_text(&self, path: &str) -> Result<String, StoreError>;

    /// 写回文档全文
    async fn save_text(&self, path: &str, content: &str, content_type: &str)
        -> Result<(), StoreError>;
}

/// 按配置创建存储后端
pub fn store_from_config(config: &Config) -> Result<Arc<dyn DocumentStore>, ConfigError> {
    match config.store_backend.as_str() {
        "fs" => Ok(Arc::new(FsDocumentStore::new(&config.store_root))),
        "http" => Ok(Arc::new(HttpDocumentStore::new(
            &config.store_base_url,
            config.store_token.clone(),
        ))),
        "memory" => Ok(Arc::new(MemoryDocumentStore::new())),
        other => Err(ConfigError::UnknownBackend(other.to_string())),
    }
}

// ========== 本地目录 ==========

/// 本地目录镜像
#[derive(Debug, Clone)]
pub struct FsDocumentStore {
    root: PathBuf,
}

impl FsDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

#[async_trait]
impl DocumentStore for FsDocumentStore {
    async fn fetch_text(&self, path: &str) -> Result<String, StoreError> {
        let full_path = self.resolve(path);
        debug!("读取文档: {}", full_path.display());

        match tokio::fs::read_to_string(&full_path).await {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StoreError::NotFound {
                path: path.to_string(),
            }),
            Err(e) => Err(StoreError::fetch_failed(path, e)),
        }
    }

    async fn save_text(
        &self,
        path: &str,
        content: &str,
        _content_type: &str,
    ) -> Result<(), StoreError> {
        let full_path = self.resolve(path);
        debug!("写回文档: {}", full_path.display());

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::save_failed(path, e))?;
        }
        tokio::fs::write(&full_path, content)
            .await
            .map_err(|e| StoreError::save_failed(path, e))
    }
}

// ========== 对象存储（HTTP） ==========

/// 通过 HTTP GET/PUT 访问的对象存储
#[derive(Debug, Clone)]
pub struct HttpDocumentStore {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpDocumentStore {
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn fetch_text(&self, path: &str) -> Result<String, StoreError> {
        let url = self.url(path);
        debug!("GET {}", url);

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|e| StoreError::fetch_failed(path, e))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound {
                path: path.to_string(),
            });
        }
        if !status.is_success() {
            return Err(StoreError::BadStatus {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| StoreError::fetch_failed(path, e))
    }

    async fn save_text(
        &self,
        path: &str,
        content: &str,
        content_type: &str,
    ) -> Result<(), StoreError> {
        let url = self.url(path);
        debug!("PUT {} ({})", url, content_type);

        let response = self
            .authorize(self.client.put(&url))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(content.to_string())
            .send()
            .await
            .map_err(|e| StoreError::save_failed(path, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::BadStatus {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(())
    }
}

// ========== 内存 ==========

/// 内存存储，主要用于测试和演练
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentStore {
    documents: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置一批文档
    pub fn with_documents<I, K, V>(documents: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = documents
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            documents: Arc::new(RwLock::new(map)),
        }
    }

    /// 读取当前内容（不经过 trait）
    pub async fn get(&self, path: &str) -> Option<String> {
        self.documents.read().await.get(path).cloned()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn fetch_text(&self, path: &str) -> Result<String, StoreError> {
        self.documents
            .read()
            .await
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                path: path.to_string(),
            })
    }

    async fn save_text(
        &self,
        path: &str,
        content: &str,
        _content_type: &str,
    ) -> Result<(), StoreError> {
        self.documents
            .write()
            .await
            .insert(path.to_string(), content.to_string());
        Ok(())
    }
}
