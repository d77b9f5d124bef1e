//! 文档修补流程 - 流程层
//!
//! 核心职责：把一个文档的全部图片记录依次应用到它的标记上
//!
//! 每条记录的顺序：
//! 1. 按路径定位 `<img>`（可能出现多次，逐个处理）
//! 2. 判断是否在 figure 内
//! 3. 重写 `<img>`：替代文本 / 装饰标记 / 描述引用
//! 4. 需要长描述且在 figure 内：写入或替换 figcaption
//!
//! 记录之间串行，后面的记录看到前面记录修改后的标记。
//! 单条记录出错只影响它自己，标记保持该记录之前的状态。

use std::ops::Range;
use tracing::{debug, warn};

use crate::error::PatchError;
use crate::infrastructure::markup::{
    escape_attribute, escape_text, replace_range, Attribute, ImageLocator, MarkupLocator,
    CREDIT_CLASS, DESCRIPTION_CLASS,
};
use crate::models::{AltTextRecord, PatchOutcome, PatchStatus};
use crate::workflow::patch_ctx::{IdGenerator, SequentialIds};

/// 一个文档的修补结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPatch {
    pub markup: String,
    pub outcomes: Vec<PatchOutcome>,
    /// 标记是否与输入不同（只有不同时才需要写回）
    pub changed: bool,
}

/// 单条记录的应用结果
enum RecordEdit {
    NotFound,
    Applied { markup: String, status: PatchStatus },
}

/// 修补引擎
///
/// 只持有编译好的结构正则，不持有任何文档状态，可以在多个任务间共享
#[derive(Debug, Clone)]
pub struct PatchEngine {
    locator: MarkupLocator,
}

impl PatchEngine {
    pub fn new() -> Result<Self, PatchError> {
        Ok(Self {
            locator: MarkupLocator::new()?,
        })
    }

    /// 结构定位器（导出时复用）
    pub fn locator(&self) -> &MarkupLocator {
        &self.locator
    }

    /// 修补一个文档，id 从 `desc-1` / `credit-2` 开始顺序分配
    pub fn patch_document(
        &self,
        markup: &str,
        records: &[AltTextRecord],
        lo_title: &str,
    ) -> DocumentPatch {
        let mut ids = SequentialIds::default();
        self.patch_document_with(markup, records, lo_title, &mut ids)
    }

    /// 使用指定的 id 分配器修补一个文档
    pub fn patch_document_with(
        &self,
        markup: &str,
        records: &[AltTextRecord],
        lo_title: &str,
        ids: &mut impl IdGenerator,
    ) -> DocumentPatch {
        let mut current = markup.to_string();
        let mut outcomes = Vec::with_capacity(records.len());

        for record in records {
            let status = match self.apply_record(&current, record, ids) {
                Ok(RecordEdit::NotFound) => {
                    debug!("[{}] 未找到图片: {}", lo_title, record.image_source);
                    PatchStatus::NotFound
                }
                Ok(RecordEdit::Applied { markup, status }) => {
                    current = markup;
                    status
                }
                Err(e) => {
                    warn!("[{}] ⚠️ 图片 {} 修补失败: {}", lo_title, record.image_source, e);
                    PatchStatus::Error(e.to_string())
                }
            };
            outcomes.push(PatchOutcome::new(lo_title, &record.image_source, status));
        }

        let changed = current != markup;
        DocumentPatch {
            markup: current,
            outcomes,
            changed,
        }
    }

    /// 应用一条记录；出错时返回 Err，调用方丢弃本条记录的全部修改
    fn apply_record(
        &self,
        markup: &str,
        record: &AltTextRecord,
        ids: &mut impl IdGenerator,
    ) -> Result<RecordEdit, PatchError> {
        let image = ImageLocator::new(&record.image_source)?;
        let wants_description = !record.is_decorative && record.needs_visual_description;

        let mut working = markup.to_string();
        let mut from = 0;
        let mut occurrences = 0;
        let mut outside_figure = false;

        while let Some(range) = image.find_from(&working, from) {
            occurrences += 1;
            let figure_start = self.locator.figure_start_before(&working, range.start);

            let (updated, resume) = match figure_start {
                Some(start) if wants_description => {
                    self.describe_in_figure(&working, range, start, record, ids)?
                }
                _ => {
                    outside_figure |= figure_start.is_none();
                    let tag = self.rebuild_image_tag(&working[range.clone()], record, None);
                    let resume = range.start + tag.len();
                    (replace_range(&working, range, &tag), resume)
                }
            };

            working = updated;
            from = resume;
        }

        if occurrences == 0 {
            return Ok(RecordEdit::NotFound);
        }

        let status = if wants_description && outside_figure {
            PatchStatus::NeedsFigure
        } else {
            PatchStatus::Success
        };

        Ok(RecordEdit::Applied {
            markup: working,
            status,
        })
    }

    /// 在 figure 内重写图片并写入 figcaption，返回新标记和继续查找的位置
    fn describe_in_figure(
        &self,
        markup: &str,
        image: Range<usize>,
        figure_start: usize,
        record: &AltTextRecord,
        ids: &mut impl IdGenerator,
    ) -> Result<(String, usize), PatchError> {
        let span = self
            .locator
            .locate_enclosing_figure(markup, figure_start, image.end)?;
        let caption = self.locator.find_figcaption(markup, &span);

        if let Some(existing) = &caption {
            if existing.content.start <= image.start && image.end <= existing.content.end {
                return Err(PatchError::ImageInsideCaption);
            }
        }

        // 已有区域的 id 直接复用，重复应用时标记保持不变
        let (description_id, credit_id) = match &caption {
            Some(existing) => (existing.description_id.clone(), existing.credit_id.clone()),
            None => (None, None),
        };
        let taken = self.locator.element_ids(markup);
        let description_id = description_id.unwrap_or_else(|| ids.next_id("desc", &taken));
        let credit_id = credit_id.unwrap_or_else(|| ids.next_id("credit", &taken));

        let tag = self.rebuild_image_tag(&markup[image.clone()], record, Some(&description_id));
        let content = caption_content(&description_id, &credit_id, record);

        let (caption_range, caption_text) = match caption {
            Some(existing) => (existing.content, content),
            None => (
                span.close_start..span.close_start,
                format!("<figcaption>{}</figcaption>", content),
            ),
        };

        // 从后往前替换，前面的偏移量保持有效
        if caption_range.end <= image.start {
            let resume = image.start + caption_text.len() + tag.len() - caption_range.len();
            let with_image = replace_range(markup, image, &tag);
            Ok((replace_range(&with_image, caption_range, &caption_text), resume))
        } else {
            let resume = image.start + tag.len();
            let with_caption = replace_range(markup, caption_range, &caption_text);
            Ok((replace_range(&with_caption, image, &tag), resume))
        }
    }

    /// 重写 `<img>`：保留其他属性的原始写法和顺序，替换可访问性相关属性
    fn rebuild_image_tag(
        &self,
        original: &str,
        record: &AltTextRecord,
        description_id: Option<&str>,
    ) -> String {
        let parsed = self.locator.parse_image_tag(original);

        let mut parts: Vec<String> = parsed
            .attributes
            .iter()
            .filter(|attribute| !is_managed(attribute))
            .map(|attribute| attribute.raw.clone())
            .collect();

        if record.is_decorative {
            parts.push(r#"alt="""#.to_string());
            parts.push(r#"role="presentation""#.to_string());
        } else {
            parts.push(format!(r#"alt="{}""#, escape_attribute(&record.edited_alt_text)));
            if let Some(id) = description_id {
                parts.push(format!(r#"aria-describedby="{}""#, id));
            }
        }

        let closing = if parsed.self_closing { " />" } else { ">" };
        format!("<img {}{}", parts.join(" "), closing)
    }
}

/// 由修补流程负责写入的属性
fn is_managed(attribute: &Attribute) -> bool {
    let name = attribute.name.to_ascii_lowercase();
    match name.as_str() {
        "alt" | "aria-describedby" => true,
        "role" => attribute
            .value
            .as_deref()
            .is_some_and(|v| v.eq_ignore_ascii_case("presentation") || v.eq_ignore_ascii_case("none")),
        _ => false,
    }
}

/// figcaption 内容：两个展开按钮 + 描述区域 + 署名区域
fn caption_content(description_id: &str, credit_id: &str, record: &AltTextRecord) -> String {
    format!(
        concat!(
            r#"<button type="button" class="a11y-toggle" aria-expanded="false" aria-controls="{desc}">Image description</button>"#,
            r#"<button type="button" class="a11y-toggle" aria-expanded="false" aria-controls="{credit}">Image credit</button>"#,
            r#"<div id="{desc}" class="{desc_class}" hidden>{desc_text}</div>"#,
            r#"<div id="{credit}" class="{credit_class}" hidden>{credit_text}</div>"#,
        ),
        desc = description_id,
        credit = credit_id,
        desc_class = DESCRIPTION_CLASS,
        credit_class = CREDIT_CLASS,
        desc_text = escape_text(record.description_text()),
        credit_text = escape_text(record.credit_text()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn engine() -> PatchEngine {
        PatchEngine::new().unwrap()
    }

    fn described(image_source: &str) -> AltTextRecord {
        AltTextRecord {
            lo_title: "lo1".into(),
            image_source: image_source.into(),
            edited_alt_text: "A cat".into(),
            needs_visual_description: true,
            edited_visual_description: "A sleeping cat".into(),
            credit: "J. Doe".into(),
            ..Default::default()
        }
    }

    fn plain(image_source: &str, alt: &str) -> AltTextRecord {
        AltTextRecord {
            lo_title: "lo1".into(),
            image_source: image_source.into(),
            edited_alt_text: alt.into(),
            ..Default::default()
        }
    }

    fn decorative(image_source: &str) -> AltTextRecord {
        AltTextRecord {
            lo_title: "lo1".into(),
            image_source: image_source.into(),
            is_decorative: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_figure_gets_alt_reference_and_caption() {
        let patch = engine().patch_document(
            r#"<figure><img src="a.png"></figure>"#,
            &[described("a.png")],
            "lo1",
        );

        let expected = concat!(
            r#"<figure><img src="a.png" alt="A cat" aria-describedby="desc-1"><figcaption>"#,
            r#"<button type="button" class="a11y-toggle" aria-expanded="false" aria-controls="desc-1">Image description</button>"#,
            r#"<button type="button" class="a11y-toggle" aria-expanded="false" aria-controls="credit-2">Image credit</button>"#,
            r#"<div id="desc-1" class="a11y-description" hidden>A sleeping cat</div>"#,
            r#"<div id="credit-2" class="a11y-credit" hidden>J. Doe</div>"#,
            r#"</figcaption></figure>"#
        );
        assert_eq!(patch.markup, expected);
        assert!(patch.changed);
        assert_eq!(patch.outcomes[0].status, PatchStatus::Success);
        assert_eq!(patch.outcomes[0].lo_title, "lo1");
    }

    #[test]
    fn test_decorative_image() {
        let patch = engine().patch_document(
            r#"<figure><img src="a.png"></figure>"#,
            &[decorative("/a.png")],
            "lo1",
        );
        assert_eq!(
            patch.markup,
            r#"<figure><img src="a.png" alt="" role="presentation"></figure>"#
        );
        assert_eq!(patch.outcomes[0].status, PatchStatus::Success);
    }

    #[test]
    fn test_decorative_ignores_description_request() {
        let mut record = decorative("a.png");
        record.needs_visual_description = true;

        let patch = engine().patch_document(r#"<p><img src="a.png"></p>"#, &[record], "lo1");
        assert_eq!(patch.markup, r#"<p><img src="a.png" alt="" role="presentation"></p>"#);
        assert_eq!(patch.outcomes[0].status, PatchStatus::Success);
    }

    #[test]
    fn test_missing_image_is_not_found() {
        let markup = r#"<p><img src="b.png"></p>"#;
        let patch = engine().patch_document(markup, &[plain("a.png", "A")], "lo1");

        assert_eq!(patch.markup, markup);
        assert!(!patch.changed);
        assert_eq!(patch.outcomes[0].status, PatchStatus::NotFound);
    }

    #[test]
    fn test_bare_image_needs_figure() {
        let patch = engine().patch_document(r#"<p><img src="a.png"></p>"#, &[described("a.png")], "lo1");

        assert_eq!(patch.markup, r#"<p><img src="a.png" alt="A cat"></p>"#);
        assert_eq!(patch.outcomes[0].status, PatchStatus::NeedsFigure);
    }

    #[test]
    fn test_repeated_application_is_stable() {
        let engine = engine();
        let records = vec![described("a.png"), plain("b.png", "A dog"), decorative("c.png")];
        let markup = concat!(
            r#"<figure class="f"><img src="a.png"></figure>"#,
            r#"<img src="/b.png"><img src="c.png" />"#
        );

        let first = engine.patch_document(markup, &records, "lo1");
        let second = engine.patch_document(&first.markup, &records, "lo1");

        assert_eq!(second.markup, first.markup);
        assert!(!second.changed);
        assert!(second
            .outcomes
            .iter()
            .all(|o| o.status == PatchStatus::Success));
        assert_eq!(second.markup.matches("<figcaption").count(), 1);
    }

    #[test]
    fn test_existing_caption_is_replaced() {
        let markup = r#"<figure><figcaption class="cap">Old caption</figcaption><img src="a.png"></figure>"#;
        let patch = engine().patch_document(markup, &[described("a.png")], "lo1");

        assert!(!patch.markup.contains("Old caption"));
        assert!(patch.markup.contains(r#"<figcaption class="cap"><button"#));
        assert_eq!(patch.markup.matches("<figcaption").count(), 1);
        assert!(patch.markup.ends_with(r#"<img src="a.png" alt="A cat" aria-describedby="desc-1"></figure>"#));
        assert_eq!(patch.outcomes[0].status, PatchStatus::Success);
    }

    #[test]
    fn test_unclosed_figure_is_isolated_error() {
        let markup = r#"<img src="b.png"><figure><img src="a.png">"#;
        let patch = engine().patch_document(
            markup,
            &[described("a.png"), plain("b.png", "B")],
            "lo1",
        );

        assert!(matches!(patch.outcomes[0].status, PatchStatus::Error(_)));
        assert_eq!(patch.outcomes[1].status, PatchStatus::Success);
        assert_eq!(
            patch.markup,
            r#"<img src="b.png" alt="B"><figure><img src="a.png">"#
        );
    }

    #[test]
    fn test_image_inside_caption_is_error() {
        let markup = r#"<figure><figcaption><img src="a.png"></figcaption></figure>"#;
        let patch = engine().patch_document(markup, &[described("a.png")], "lo1");

        assert!(matches!(patch.outcomes[0].status, PatchStatus::Error(_)));
        assert_eq!(patch.markup, markup);
    }

    #[test]
    fn test_metacharacters_in_path() {
        let markup = r#"<img src="/img/cat (1)+[v2].png"><img src="/img/cat (1)+[v2]Xpng">"#;
        let patch = engine().patch_document(markup, &[plain("img/cat (1)+[v2].png", "Cat")], "lo1");

        assert_eq!(
            patch.markup,
            r#"<img src="/img/cat (1)+[v2].png" alt="Cat"><img src="/img/cat (1)+[v2]Xpng">"#
        );
    }

    #[test]
    fn test_other_attributes_are_preserved() {
        let markup = r#"<IMG class="hero" SRC="/img/a.png" width=20 alt="old" role="presentation" role2="x"/>"#;
        let patch = engine().patch_document(markup, &[plain("/img/a.png", r#"Say "hi" & <wave>"#)], "lo1");

        assert_eq!(
            patch.markup,
            r#"<img class="hero" SRC="/img/a.png" width=20 role2="x" alt="Say &quot;hi&quot; &amp; &lt;wave&gt;" />"#
        );
    }

    #[test]
    fn test_every_occurrence_is_patched() {
        let markup = r#"<img src="a.png"><p>x</p><img src="/a.png">"#;
        let patch = engine().patch_document(markup, &[plain("a.png", "A")], "lo1");

        assert_eq!(patch.markup, r#"<img src="a.png" alt="A"><p>x</p><img src="/a.png" alt="A">"#);
        assert_eq!(patch.outcomes.len(), 1);
    }

    #[test]
    fn test_ids_are_unique_across_figures() {
        let markup = concat!(
            r#"<div id="desc-1"></div>"#,
            r#"<figure><img src="a.png"></figure><figure><img src="b.png"></figure>"#
        );
        let patch = engine().patch_document(markup, &[described("a.png"), described("b.png")], "lo1");

        assert!(patch.markup.contains(r#"src="a.png" alt="A cat" aria-describedby="desc-2""#));
        assert!(patch.markup.contains(r#"src="b.png" alt="A cat" aria-describedby="desc-4""#));
        assert_eq!(patch.markup.matches(r#"id="credit-3""#).count(), 1);
        assert_eq!(patch.markup.matches(r#"id="credit-5""#).count(), 1);
    }

    #[test]
    fn test_ids_skip_single_quoted_and_unquoted_existing_ids() {
        let markup = concat!(
            r#"<p id='desc-1'>x</p><span id=credit-2>y</span>"#,
            r#"<figure><img src="a.png"></figure>"#
        );
        let patch = engine().patch_document(markup, &[described("a.png")], "lo1");

        assert!(patch.markup.contains(r#"aria-describedby="desc-3""#));
        assert!(patch.markup.contains(r#"<div id="credit-4" class="a11y-credit""#));
        assert_eq!(patch.outcomes[0].status, PatchStatus::Success);
    }

    #[test]
    fn test_description_fallback_chain() {
        let mut record = described("a.png");
        record.edited_visual_description = String::new();
        record.generated_alt_text = "Generated alt".into();
        record.credit = String::new();

        let patch = engine().patch_document(r#"<figure><img src="a.png"></figure>"#, &[record], "lo1");
        assert!(patch.markup.contains(r#"class="a11y-description" hidden>Generated alt</div>"#));
        assert!(patch.markup.contains(r#"class="a11y-credit" hidden>Unknown</div>"#));
    }

    #[test]
    fn test_custom_id_generator() {
        struct Fixed;
        impl IdGenerator for Fixed {
            fn next_id(&mut self, prefix: &str, _taken: &HashSet<String>) -> String {
                format!("{}-x", prefix)
            }
        }

        let patch = engine().patch_document_with(
            r#"<figure><img src="a.png"></figure>"#,
            &[described("a.png")],
            "lo1",
            &mut Fixed,
        );
        assert!(patch.markup.contains(r#"aria-describedby="desc-x""#));
        assert!(patch.markup.contains(r#"<div id="credit-x" class="a11y-credit""#));
    }
}
