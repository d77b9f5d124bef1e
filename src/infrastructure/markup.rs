//! 标记定位器 - 基础设施层
//!
//! 基于正则的文本定位与替换，不解析 DOM。对修补流程只暴露几个窄接口：
//! 定位 `<img>`、判断所在 figure、定位 figure 范围、定位 figcaption，
//! 以后换成真正的解析器时修补流程不需要改动。

use crate::error::PatchError;
use regex::Regex;
use std::collections::HashSet;
use std::ops::Range;

/// 描述区域的 class
pub const DESCRIPTION_CLASS: &str = "a11y-description";
/// 署名区域的 class
pub const CREDIT_CLASS: &str = "a11y-credit";

/// 按路径定位 `<img>` 元素
///
/// 标签名和属性名不区分大小写，路径精确匹配（前导斜杠可有可无），
/// 路径中的正则元字符全部转义。
#[derive(Debug, Clone)]
pub struct ImageLocator {
    pattern: Regex,
}

impl ImageLocator {
    pub fn new(image_source: &str) -> Result<Self, PatchError> {
        let normalized = image_source.strip_prefix('/').unwrap_or(image_source);
        let pattern = format!(
            r#"<(?i:img)\s(?:[^>]*?\s)?(?i:src)\s*=\s*["']/?{}["'][^>]*>"#,
            regex::escape(normalized)
        );

        let pattern = Regex::new(&pattern).map_err(|source| PatchError::Locator {
            image_source: image_source.to_string(),
            source,
        })?;

        Ok(Self { pattern })
    }

    /// 从 `from` 开始查找下一个匹配的元素
    pub fn find_from(&self, markup: &str, from: usize) -> Option<Range<usize>> {
        if from > markup.len() {
            return None;
        }
        self.pattern.find_at(markup, from).map(|m| m.range())
    }
}

/// figure 的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FigureSpan {
    /// `<figure` 的起始位置
    pub start: usize,
    /// `</figure>` 的起始位置
    pub close_start: usize,
    /// `</figure>` 之后的位置
    pub end: usize,
}

/// 已存在的 figcaption
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Figcaption {
    /// 标签之间的内容范围
    pub content: Range<usize>,
    /// 内容中已有的描述区域 id
    pub description_id: Option<String>,
    /// 内容中已有的署名区域 id
    pub credit_id: Option<String>,
}

/// 标签中的一个属性，`raw` 保留原始写法
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: Option<String>,
    pub raw: String,
}

/// 拆开的 `<img>` 标签
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageTag {
    pub attributes: Vec<Attribute>,
    pub self_closing: bool,
}

impl ImageTag {
    /// 按名称（不区分大小写）取属性值
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .and_then(|a| a.value.as_deref())
    }
}

/// 文档中的一张图片（用于导出）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    /// 原样的属性文本，定位器按原文匹配
    pub src: String,
    /// 已解码的纯文本
    pub alt: Option<String>,
}

/// 固定的结构性正则
#[derive(Debug, Clone)]
pub struct MarkupLocator {
    figure_open: Regex,
    figure_close: Regex,
    figcaption: Regex,
    region: Regex,
    attribute: Regex,
    any_image: Regex,
    element_id: Regex,
}

impl MarkupLocator {
    pub fn new() -> Result<Self, PatchError> {
        Ok(Self {
            figure_open: Regex::new(r"(?i)<figure(?:\s[^>]*)?>")?,
            figure_close: Regex::new(r"(?i)</figure\s*>")?,
            figcaption: Regex::new(r"(?is)<figcaption(?:\s[^>]*)?>(.*?)</figcaption\s*>")?,
            region: Regex::new(r#"<div id="([^"]+)" class="a11y-(description|credit)""#)?,
            attribute: Regex::new(
                r#"([^\s"'>/=]+)(?:\s*=\s*("[^"]*"|'[^']*'|[^\s"'=<>`]+))?"#,
            )?,
            any_image: Regex::new(r"(?i)<img\s[^>]*>")?,
            element_id: Regex::new(
                r#"\s(?i:id)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+))"#,
            )?,
        })
    }

    /// 若 `pos` 处于一个尚未闭合的 figure 内，返回该 figure 的起始位置
    ///
    /// 向前找最近的 `<figure` 和 `</figure`，前者更靠后时即在 figure 内
    pub fn figure_start_before(&self, markup: &str, pos: usize) -> Option<usize> {
        let prefix = markup.get(..pos)?;
        let open = self.figure_open.find_iter(prefix).last()?.start();
        match self.figure_close.find_iter(prefix).last() {
            Some(close) if close.start() > open => None,
            _ => Some(open),
        }
    }

    /// 定位包含图片的 figure：从 `figure_start` 到图片之后的第一个 `</figure>`
    pub fn locate_enclosing_figure(
        &self,
        markup: &str,
        figure_start: usize,
        image_end: usize,
    ) -> Result<FigureSpan, PatchError> {
        let close = self
            .figure_close
            .find_at(markup, image_end)
            .ok_or(PatchError::UnclosedFigure { figure_start })?;

        if let Some(nested) = self.figure_open.find_at(markup, image_end) {
            if nested.start() < close.start() {
                return Err(PatchError::NestedFigure { figure_start });
            }
        }

        Ok(FigureSpan {
            start: figure_start,
            close_start: close.start(),
            end: close.end(),
        })
    }

    /// 在 figure 范围内查找 figcaption
    pub fn find_figcaption(&self, markup: &str, span: &FigureSpan) -> Option<Figcaption> {
        let inner = markup.get(span.start..span.close_start)?;
        let captures = self.figcaption.captures(inner)?;
        let content = captures.get(1)?;
        let text = content.as_str();

        let mut description_id = None;
        let mut credit_id = None;
        for region in self.region.captures_iter(text) {
            let id = region[1].to_string();
            match &region[2] {
                "description" if description_id.is_none() => description_id = Some(id),
                "credit" if credit_id.is_none() => credit_id = Some(id),
                _ => {}
            }
        }

        Some(Figcaption {
            content: span.start + content.start()..span.start + content.end(),
            description_id,
            credit_id,
        })
    }

    /// 拆开 `<img ...>` 标签
    pub fn parse_image_tag(&self, tag: &str) -> ImageTag {
        let inner = tag
            .get(4..tag.len().saturating_sub(1))
            .unwrap_or_default()
            .trim_end();
        let (inner, self_closing) = match inner.strip_suffix('/') {
            Some(rest) => (rest, true),
            None => (inner, false),
        };

        let attributes = self
            .attribute
            .captures_iter(inner)
            .map(|captures| Attribute {
                name: captures[1].to_string(),
                value: captures.get(2).map(|v| unquote(v.as_str()).to_string()),
                raw: captures[0].to_string(),
            })
            .collect();

        ImageTag {
            attributes,
            self_closing,
        }
    }

    /// 文档中已经使用的元素 id，三种引号写法都算
    pub fn element_ids(&self, markup: &str) -> HashSet<String> {
        self.element_id
            .captures_iter(markup)
            .filter_map(|captures| {
                captures
                    .get(1)
                    .or_else(|| captures.get(2))
                    .or_else(|| captures.get(3))
            })
            .map(|id| id.as_str().to_string())
            .collect()
    }

    /// 列出文档中所有带 src 的图片
    pub fn extract_images(&self, markup: &str) -> Vec<ImageRef> {
        self.any_image
            .find_iter(markup)
            .filter_map(|m| {
                let tag = self.parse_image_tag(m.as_str());
                let src = tag.attribute("src")?.to_string();
                Some(ImageRef {
                    src,
                    alt: tag.attribute("alt").map(decode_entities),
                })
            })
            .collect()
    }
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value)
}

/// 用新文本替换一段范围
pub fn replace_range(markup: &str, range: Range<usize>, replacement: &str) -> String {
    let mut updated = String::with_capacity(markup.len() + replacement.len());
    updated.push_str(&markup[..range.start]);
    updated.push_str(replacement);
    updated.push_str(&markup[range.end..]);
    updated
}

/// 属性值转义
pub fn escape_attribute(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

/// 还原 `escape_attribute` 产生的实体
///
/// `&amp;` 最后处理，避免 `&amp;lt;` 被解成 `<`
pub fn decode_entities(value: &str) -> String {
    value
        .replace("&quot;", "\"")
        .replace("&#34;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// 文本内容转义
pub fn escape_text(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
