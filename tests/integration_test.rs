use alt_text_patch::models::parse_upload;
use alt_text_patch::utils::logging;
use alt_text_patch::{App, Config, DocumentStore, HttpDocumentStore, MemoryDocumentStore, PatchStatus};
use std::sync::Arc;

const UPLOAD: &[u8] = br#"{
    "metadata": {"relativeLink": "course-1", "gradeLevel": "gr 8", "generatedDate": "2025-03-01"},
    "altTextData": [
        {"loTitle": "lo1", "imageSource": "/img/cat.png", "editedAltText": "A cat",
         "needsVisualDescription": true, "editedVisualDescription": "A cat asleep on a mat",
         "credit": "J. Doe"},
        {"loTitle": "lo1", "imageSource": "img/border.png", "editedAltText": "", "isDecorative": "yes"},
        {"loTitle": "lo2", "imageSource": "img/map (v2).png", "editedAltText": "Map",
         "needsVisualDescription": "true"},
        {"loTitle": "lo2", "imageSource": "img/gone.png", "editedAltText": "Gone"}
    ]
}"#;

fn store() -> MemoryDocumentStore {
    MemoryDocumentStore::with_documents([
        (
            "dev/course-1/lo1/index.html",
            r#"<h1>Cats</h1><figure class="wide"><img src="img/cat.png" width="300"></figure><img src="img/border.png">"#,
        ),
        (
            "dev/course-1/lo2/index.html",
            r#"<p><IMG SRC="/img/map (v2).png"></p>"#,
        ),
    ])
}

fn init_logging(name: &str) {
    let path = std::env::temp_dir().join(format!("alt_text_patch_{}.log", name));
    logging::init(&path.to_string_lossy()).expect("初始化日志失败");
}

#[tokio::test]
async fn test_full_import_pipeline() {
    init_logging("full_import");

    let store = store();
    let app = App::new(Config::default(), Arc::new(store.clone())).expect("创建应用失败");
    let raw = parse_upload(UPLOAD).expect("解析上传失败");

    let outcome = app.process_upload(&raw).await;

    assert!(outcome.success);
    assert_eq!(outcome.total_processed, 4);
    let metadata = outcome.metadata.as_ref().expect("缺少元数据");
    assert_eq!(metadata.grade_level, "Grade 8");
    assert_eq!(metadata.relative_link, "/course-1");

    let report = outcome.update_summary.as_ref().expect("缺少修补报告");
    assert_eq!(report.files_processed, 2);
    assert_eq!(report.updated_files, vec!["lo1", "lo2"]);
    assert!(report.errors.is_empty());

    let results = &report.image_results;
    assert_eq!(results.total, 4);
    assert_eq!(results.successful, 2);
    assert_eq!(results.failed, 1);
    assert_eq!(results.failed_images[0].image_source, "/img/gone.png");
    assert_eq!(results.needs_figure.len(), 1);
    assert_eq!(results.needs_figure[0].image_source, "/img/map (v2).png");

    let lo1 = store.get("dev/course-1/lo1/index.html").await.expect("lo1 丢失");
    assert!(lo1.contains(r#"<img src="img/cat.png" width="300" alt="A cat" aria-describedby="desc-1">"#));
    assert!(lo1.contains(r#"<div id="desc-1" class="a11y-description" hidden>A cat asleep on a mat</div>"#));
    assert!(lo1.contains(r#"<div id="credit-2" class="a11y-credit" hidden>J. Doe</div>"#));
    assert!(lo1.ends_with(r#"<img src="img/border.png" alt="" role="presentation">"#));

    let lo2 = store.get("dev/course-1/lo2/index.html").await.expect("lo2 丢失");
    assert_eq!(lo2, r#"<p><img SRC="/img/map (v2).png" alt="Map"></p>"#);
}

#[tokio::test]
async fn test_second_import_changes_nothing() {
    let store = store();
    let app = App::new(Config::default(), Arc::new(store.clone())).expect("创建应用失败");
    let raw = parse_upload(UPLOAD).expect("解析上传失败");

    app.process_upload(&raw).await;
    let first = store.get("dev/course-1/lo1/index.html").await;

    let outcome = app.process_upload(&raw).await;
    let report = outcome.update_summary.expect("缺少修补报告");

    assert_eq!(store.get("dev/course-1/lo1/index.html").await, first);
    assert_eq!(report.files_processed, 0);
    assert_eq!(report.image_results.successful, 2);
}

#[tokio::test]
async fn test_export_then_patch_engine_round() {
    let store = store();
    let app = App::new(Config::default(), Arc::new(store.clone())).expect("创建应用失败");

    let export = app
        .export_template("course-1", &["lo1".to_string(), "lo2".to_string()])
        .await;
    assert!(export.errors.is_empty());
    assert_eq!(export.template.alt_text_data.len(), 3);

    let mut records = export.template.alt_text_data;
    for record in &mut records {
        record.edited_alt_text = format!("Edited {}", record.image_source);
    }
    let report = app
        .run_patch_batch(&export.template.metadata, records)
        .await;

    assert_eq!(report.image_results.successful, 3);
    assert_eq!(report.files_processed, 2);
    let lo1 = store.get("dev/course-1/lo1/index.html").await.expect("lo1 丢失");
    assert!(lo1.contains(r#"alt="Edited img/border.png""#));
}

#[test]
fn test_patch_status_serialization() {
    let json = serde_json::to_value(PatchStatus::Error("figure 未闭合".into())).expect("序列化失败");
    assert_eq!(json["status"], "error");
    assert_eq!(json["reason"], "figure 未闭合");
}

#[tokio::test]
#[ignore] // 默认忽略，需要手动运行：cargo test -- --ignored
async fn test_http_store_against_live_endpoint() {
    init_logging("http_store");

    let config = Config::from_env();
    let store = HttpDocumentStore::new(&config.store_base_url, config.store_token.clone());

    let path = format!("{}/integration-test/lo1/index.html", config.fixed_base);
    store
        .save_text(&path, r#"<img src="a.png">"#, &config.content_type)
        .await
        .expect("写入失败");
    let text = store.fetch_text(&path).await.expect("读取失败");

    assert_eq!(text, r#"<img src="a.png">"#);
}
