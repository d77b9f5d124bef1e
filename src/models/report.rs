use serde::{Deserialize, Serialize};

/// 单张图片的修补结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "camelCase")]
pub enum PatchStatus {
    /// 已应用（包括本来就正确、无需改动的情况）
    Success,
    /// 文档中找不到这张图片
    NotFound,
    /// 替代文本已应用，但图片不在 figure 中，长描述无法挂载
    NeedsFigure,
    /// 处理过程中出错，文档未因这条记录改变
    Error(String),
}

/// 某条记录的修补结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchOutcome {
    pub lo_title: String,
    pub image_source: String,
    #[serde(flatten)]
    pub status: PatchStatus,
}

impl PatchOutcome {
    pub fn new(lo_title: impl Into<String>, image_source: impl Into<String>, status: PatchStatus) -> Self {
        Self {
            lo_title: lo_title.into(),
            image_source: image_source.into(),
            status,
        }
    }
}

/// 失败图片条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedImage {
    pub lo_title: String,
    pub image_source: String,
    pub reason: String,
}

/// 需要 figure 的图片条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FigureNeeded {
    pub lo_title: String,
    pub image_source: String,
}

/// 图片级统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResults {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub failed_images: Vec<FailedImage>,
    pub needs_figure: Vec<FigureNeeded>,
}

impl ImageResults {
    /// 合并一条修补结果
    pub fn record(&mut self, outcome: &PatchOutcome) {
        self.total += 1;
        match &outcome.status {
            PatchStatus::Success => self.successful += 1,
            PatchStatus::NeedsFigure => self.needs_figure.push(FigureNeeded {
                lo_title: outcome.lo_title.clone(),
                image_source: outcome.image_source.clone(),
            }),
            PatchStatus::NotFound => self.fail(outcome, "Image not found in document"),
            PatchStatus::Error(reason) => self.fail(outcome, reason),
        }
    }

    /// 记录一张未能尝试或未能保存的图片
    pub fn record_unapplied(&mut self, lo_title: &str, image_source: &str, reason: &str) {
        self.total += 1;
        self.failed += 1;
        self.failed_images.push(FailedImage {
            lo_title: lo_title.to_string(),
            image_source: image_source.to_string(),
            reason: reason.to_string(),
        });
    }

    fn fail(&mut self, outcome: &PatchOutcome, reason: &str) {
        self.failed += 1;
        self.failed_images.push(FailedImage {
            lo_title: outcome.lo_title.clone(),
            image_source: outcome.image_source.clone(),
            reason: reason.to_string(),
        });
    }
}

/// 文档级错误
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lo_title: Option<String>,
    pub error: String,
}

/// 一次修补运行的完整报告
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub success: bool,
    pub files_processed: usize,
    pub updated_files: Vec<String>,
    pub errors: Vec<DocumentError>,
    pub image_results: ImageResults,
}

impl Default for RunReport {
    fn default() -> Self {
        Self {
            success: true,
            files_processed: 0,
            updated_files: Vec::new(),
            errors: Vec::new(),
            image_results: ImageResults::default(),
        }
    }
}
