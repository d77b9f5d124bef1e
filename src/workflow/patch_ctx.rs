//! 修补上下文
//!
//! 封装"我正在修补哪个文档"以及文档内的 id 分配

use std::collections::HashSet;
use std::fmt::Display;

/// 文档修补上下文（仅用于日志）
#[derive(Debug, Clone)]
pub struct DocumentCtx {
    /// 文档键
    pub lo_title: String,

    /// 文档序号（从1开始）
    pub document_index: usize,

    /// 文档中的记录数
    pub record_count: usize,
}

impl DocumentCtx {
    pub fn new(lo_title: impl Into<String>, document_index: usize, record_count: usize) -> Self {
        Self {
            lo_title: lo_title.into(),
            document_index,
            record_count,
        }
    }
}

impl Display for DocumentCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[文档 #{} {}]", self.document_index, self.lo_title)
    }
}

/// 元素 id 分配器
///
/// 分配出的 id 不能与 `taken` 中的任何 id 重复
pub trait IdGenerator {
    fn next_id(&mut self, prefix: &str, taken: &HashSet<String>) -> String;
}

/// 顺序 id：`desc-1`、`credit-2`……
///
/// 跳过文档中已经存在的 id
#[derive(Debug, Clone, Default)]
pub struct SequentialIds {
    counter: usize,
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self, prefix: &str, taken: &HashSet<String>) -> String {
        loop {
            self.counter += 1;
            let candidate = format!("{}-{}", prefix, self.counter);
            if !taken.contains(&candidate) {
                return candidate;
            }
        }
    }
}
