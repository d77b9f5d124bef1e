//! 错误收集服务 - 业务能力层
//!
//! 每次运行持有一个独立的收集器，运行结束后通过 `summary()` 读出。
//! 状态不会自动重置，复用同一个收集器开始新的运行前必须调用 `clear()`。

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// 使整个运行失败
    Critical,
    /// 某个字段或记录不符合规则
    Validation,
    /// 可以处理但有保留
    Warning,
    /// 提示信息
    Info,
}

impl ErrorKind {
    /// 只有 critical 和 validation 计入失败
    pub fn is_failure(self) -> bool {
        matches!(self, ErrorKind::Critical | ErrorKind::Validation)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Critical => "critical",
            ErrorKind::Validation => "validation",
            ErrorKind::Warning => "warning",
            ErrorKind::Info => "info",
        };
        f.write_str(name)
    }
}

/// 一条错误记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub kind: ErrorKind,
    pub message: String,
    pub details: Option<JsonValue>,
    pub timestamp: DateTime<Utc>,
}

/// 汇总中的错误条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedError {
    pub message: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<JsonValue>,
}

/// 各类别的错误数量
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCounts {
    pub critical: usize,
    pub validation: usize,
    pub warning: usize,
    pub info: usize,
}

/// 运行结束后的错误汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorSummary {
    /// 处理耗时（秒），运行未结束时为 None
    pub processing_time: Option<f64>,
    pub total_processed: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub error_counts: ErrorCounts,
    /// 只包含非空的类别
    pub errors: BTreeMap<ErrorKind, Vec<FormattedError>>,
}

/// 错误收集器
#[derive(Debug, Clone, Default)]
pub struct ErrorCollector {
    buckets: BTreeMap<ErrorKind, Vec<ErrorRecord>>,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    total_processed: usize,
    success_count: usize,
    failure_count: usize,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_processing(&mut self) {
        self.start_time = Some(Utc::now());
    }

    pub fn end_processing(&mut self) {
        self.end_time = Some(Utc::now());
    }

    /// 添加一条错误并返回它的副本
    pub fn add_error(
        &mut self,
        kind: ErrorKind,
        message: impl Into<String>,
        details: Option<JsonValue>,
    ) -> ErrorRecord {
        let record = ErrorRecord {
            kind,
            message: message.into(),
            details,
            timestamp: Utc::now(),
        };

        if kind.is_failure() {
            self.failure_count += 1;
        }
        self.buckets.entry(kind).or_default().push(record.clone());

        record
    }

    pub fn increment_success(&mut self) {
        self.success_count += 1;
        self.total_processed += 1;
    }

    /// critical 或 validation 非空时为真
    pub fn has_errors(&self) -> bool {
        self.count(ErrorKind::Critical) > 0 || self.count(ErrorKind::Validation) > 0
    }

    pub fn count(&self, kind: ErrorKind) -> usize {
        self.buckets.get(&kind).map_or(0, Vec::len)
    }

    pub fn errors(&self, kind: ErrorKind) -> &[ErrorRecord] {
        self.buckets.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn processing_time(&self) -> Option<f64> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some((end - start).num_milliseconds() as f64 / 1000.0),
            _ => None,
        }
    }

    pub fn summary(&self) -> ErrorSummary {
        let errors = self
            .buckets
            .iter()
            .filter(|(_, records)| !records.is_empty())
            .map(|(kind, records)| {
                let formatted = records
                    .iter()
                    .map(|record| FormattedError {
                        message: record.message.clone(),
                        timestamp: record.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
                        details: record.details.clone(),
                    })
                    .collect();
                (*kind, formatted)
            })
            .collect();

        ErrorSummary {
            processing_time: self.processing_time(),
            total_processed: self.total_processed,
            success_count: self.success_count,
            failure_count: self.failure_count,
            error_counts: ErrorCounts {
                critical: self.count(ErrorKind::Critical),
                validation: self.count(ErrorKind::Validation),
                warning: self.count(ErrorKind::Warning),
                info: self.count(ErrorKind::Info),
            },
            errors,
        }
    }

    /// 清空所有状态
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
