//! 文档分组服务 - 业务能力层
//!
//! 按 loTitle 把图片记录分到各自的文档。组内顺序保持输入顺序（决定修补顺序），
//! 组与组按首次出现的顺序排列。键按字符串精确比较，不做裁剪。

use crate::models::record::{AltTextRecord, DEFAULT_CREDIT};
use std::collections::HashMap;

/// 同一文档下的全部图片记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentGroup {
    pub lo_title: String,
    pub records: Vec<AltTextRecord>,
}

/// 按文档分组
pub fn group_by_document(records: impl IntoIterator<Item = AltTextRecord>) -> Vec<DocumentGroup> {
    let mut groups: Vec<DocumentGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for mut record in records {
        if record.credit.is_empty() {
            record.credit = DEFAULT_CREDIT.to_string();
        }

        match index.get(&record.lo_title) {
            Some(&position) => groups[position].records.push(record),
            None => {
                index.insert(record.lo_title.clone(), groups.len());
                groups.push(DocumentGroup {
                    lo_title: record.lo_title.clone(),
                    records: vec![record],
                });
            }
        }
    }

    groups
}
