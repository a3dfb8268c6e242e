//! Integration tests for the full pipeline with a stub backend.
//!
//! No network: every test injects a `StubBackend` through
//! `GenerationConfigBuilder::provider`, so the extraction, planning,
//! rendering, export and batch paths run for real against temp files.

use async_trait::async_trait;
use edgequake_doc2pptx::providers::{ChatMessage, CompletionOptions, LLMProvider, LLMResponse};
use edgequake_doc2pptx::{
    generate, generate_to_file, run_batch, DeckError, ErrorKind, ExportError,
    ExportFormat, GenerationConfig, GenerationProgressCallback, SlideKind, Stage,
};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

const OUTLINE: &str = r#"```json
{
  "title": "Quarterly Review",
  "slides": [
    {"title": "Section: Overview", "content": ["Where we stand"]},
    {"title": "Highlights", "content": ["Revenue up 12%", "  - EU strongest", "Churn down"],
     "notes": "Mention the EU launch."},
    {"title": "Section: Details", "content": []},
    {"title": "Rust vs Python", "left": ["Fast", "Safe"], "right": ["Flexible", "Ubiquitous"]},
    {"title": "Setup", "content": ["```bash", "cargo install doc2pptx", "```"]},
    {"title": "Sales by quarter", "content": ["Quarter,EU,US", "Q1,10,12", "Q2,14,13", "Q3,18,15"]}
  ]
}
```"#;

// ── Stub backend ─────────────────────────────────────────────────────────────

struct StubBackend {
    reply: String,
    calls: AtomicU32,
    prompts: Mutex<Vec<String>>,
}

impl StubBackend {
    fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            calls: AtomicU32::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl LLMProvider for StubBackend {
    fn name(&self) -> &str {
        "stub"
    }

    fn model(&self) -> &str {
        "stub-1"
    }

    fn max_context_length(&self) -> usize {
        128_000
    }

    async fn complete(&self, prompt: &str) -> edgequake_llm::Result<LLMResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(LLMResponse::new(self.reply.clone(), "stub-1"))
    }

    async fn complete_with_options(
        &self,
        prompt: &str,
        _options: &CompletionOptions,
    ) -> edgequake_llm::Result<LLMResponse> {
        self.complete(prompt).await
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        _options: Option<&CompletionOptions>,
    ) -> edgequake_llm::Result<LLMResponse> {
        let user = messages.last().map(|m| m.content.as_str()).unwrap_or_default();
        self.complete(user).await
    }
}

fn config_with(backend: Arc<StubBackend>) -> edgequake_doc2pptx::GenerationConfigBuilder {
    GenerationConfig::builder()
        .provider(backend as Arc<dyn LLMProvider>)
        .retry_backoff_ms(1)
}

fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
    let p = dir.join(name);
    std::fs::write(&p, body).unwrap();
    p
}

fn zip_entry(path: &Path, name: &str) -> String {
    let bytes = std::fs::read(path).unwrap();
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut out = String::new();
    archive.by_name(name).unwrap().read_to_string(&mut out).unwrap();
    out
}

// ── Single file ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn markdown_to_pptx_with_every_variant() {
    let dir = tempfile::tempdir().unwrap();
    let input = write(dir.path(), "review.md", "# Q3\n\nRevenue grew in every region.\n");
    let backend = StubBackend::new(OUTLINE);
    let config = config_with(Arc::clone(&backend)).theme("modern").build().unwrap();

    let out = generate_to_file(&input, None, &config).await.unwrap();

    assert_eq!(out.output_path, dir.path().join("review.pptx"));
    assert!(out.output_path.exists());
    assert_eq!(out.title, "Quarterly Review");
    assert_eq!(
        out.slide_kinds,
        vec![
            SlideKind::Title,
            SlideKind::Agenda,
            SlideKind::Section,
            SlideKind::Content,
            SlideKind::Section,
            SlideKind::Comparison,
            SlideKind::Code,
            SlideKind::Chart,
            SlideKind::ThankYou,
        ]
    );
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    assert!(backend.prompts.lock().unwrap()[0].contains("Revenue grew"));

    let presentation = zip_entry(&out.output_path, "ppt/presentation.xml");
    assert_eq!(presentation.matches("<p:sldId ").count(), 9);
    let chart = zip_entry(&out.output_path, "ppt/charts/chart1.xml");
    assert!(chart.contains("<c:v>Q3</c:v>"));
    let notes = zip_entry(&out.output_path, "ppt/notesSlides/notesSlide4.xml");
    assert!(notes.contains("Mention the EU launch."));
    assert!(!dir.path().join("review.pptx.tmp").exists());
}

#[tokio::test]
async fn csv_source_adds_a_data_slide() {
    let dir = tempfile::tempdir().unwrap();
    let input = write(dir.path(), "sales.csv", "Month,Revenue,Cost\nJan,100,80\nFeb,120,90\nMar,90,70\n");
    let reply = r#"{"title": "Sales", "slides": [{"title": "Summary", "content": ["Stable quarter"]}]}"#;
    let config = config_with(StubBackend::new(reply))
        .include_agenda(false)
        .include_thank_you(false)
        .build()
        .unwrap();

    let deck = generate(&input, &config).await.unwrap();
    let kinds = deck.presentation.slide_kinds();
    assert_eq!(kinds[0], SlideKind::Title);
    assert_eq!(kinds[1], SlideKind::Content);
    assert!(
        kinds[2..].iter().any(|k| matches!(k, SlideKind::Chart | SlideKind::Table)),
        "{kinds:?}"
    );
    assert_eq!(deck.stats.tables_used, 1);
}

#[tokio::test]
async fn malformed_outline_is_a_parse_error_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input = write(dir.path(), "notes.txt", "Some notes");

    for reply in ["I cannot help with that.", r#"{"title": "x", "slides": []}"#, r#"{"slides": "nope"}"#] {
        let config = config_with(StubBackend::new(reply)).max_retries(0).build().unwrap();
        let err = generate_to_file(&input, None, &config).await.unwrap_err();
        assert!(matches!(err, DeckError::OutlineParseError { .. }), "{reply}: {err:?}");
        assert_eq!(err.kind(), ErrorKind::OutlineParseError);
    }
    assert!(!dir.path().join("notes.pptx").exists());
}

#[tokio::test]
async fn progress_callback_sees_stages_in_order() {
    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl GenerationProgressCallback for Recorder {
        fn on_generation_start(&self, _input: &Path) {
            self.0.lock().unwrap().push("start".into());
        }
        fn on_stage(&self, _input: &Path, stage: Stage) {
            self.0.lock().unwrap().push(format!("{stage:?}"));
        }
        fn on_generation_complete(&self, _input: &Path, slide_count: usize) {
            self.0.lock().unwrap().push(format!("done {slide_count}"));
        }
    }

    let dir = tempfile::tempdir().unwrap();
    let input = write(dir.path(), "a.md", "hello");
    let recorder = Arc::new(Recorder::default());
    let config = config_with(StubBackend::new(OUTLINE))
        .export(ExportFormat::Html)
        .progress_callback(Arc::clone(&recorder) as Arc<dyn GenerationProgressCallback>)
        .build()
        .unwrap();

    generate_to_file(&input, None, &config).await.unwrap();
    let events = recorder.0.lock().unwrap().clone();
    assert_eq!(
        events,
        vec!["start", "Extracting", "Prompting", "Rendering", "Exporting", "done 9"]
    );
}

/// Single-page PDF with one line of Courier text.
fn one_page_pdf(text: &str) -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 24.into()]),
            Operation::new("Td", vec![72.into(), 700.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

#[tokio::test]
async fn pdf_text_reaches_the_prompt() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("brief.pdf");
    std::fs::write(&input, one_page_pdf("Hello quarterly world")).unwrap();
    let backend = StubBackend::new(OUTLINE);
    let config = config_with(Arc::clone(&backend)).build().unwrap();

    let deck = generate(&input, &config).await.unwrap();

    assert!(deck.source.text.contains("--- Page 1 ---"), "{:?}", deck.source.text);
    assert!(deck.source.text.contains("Hello quarterly world"));
    assert!(backend.prompts.lock().unwrap()[0].contains("Hello quarterly world"));
    assert_eq!(deck.presentation.len(), 9);
}

// ── Exports ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_pdf_converter_keeps_pptx_and_records_failure() {
    let dir = tempfile::tempdir().unwrap();
    let input = write(dir.path(), "brief.md", "A short brief.");
    let config = config_with(StubBackend::new(OUTLINE))
        .exports(vec![ExportFormat::Pdf, ExportFormat::Html])
        .pdf_converter("definitely-missing-binary")
        .build()
        .unwrap();

    let out = generate_to_file(&input, None, &config).await.unwrap();

    assert!(out.output_path.exists());
    assert_eq!(out.exports.len(), 2);
    let pdf = &out.exports[0];
    assert_eq!(pdf.format, ExportFormat::Pdf);
    assert!(matches!(pdf.error, Some(ExportError::Unavailable { .. })), "{pdf:?}");
    let html = &out.exports[1];
    assert!(html.succeeded());
    let html_path = html.path.as_ref().unwrap();
    assert_eq!(html_path, &dir.path().join("brief.html"));
    let body = std::fs::read_to_string(html_path).unwrap();
    assert!(body.contains("Rust vs Python"));
}

// ── Batch ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn batch_isolates_unsupported_file() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = vec![
        write(dir.path(), "one.md", "first"),
        write(dir.path(), "two.txt", "second"),
        write(dir.path(), "three.xyz", "third"),
        write(dir.path(), "four.json", r#"{"k": [1, 2]}"#),
        write(dir.path(), "five.html", "<h1>Five</h1><p>body</p>"),
    ];
    let out_dir = dir.path().join("decks");
    let backend = StubBackend::new(OUTLINE);
    let config = config_with(Arc::clone(&backend)).build().unwrap();

    let summary = run_batch(&inputs, Some(out_dir.as_path()), &config).await.unwrap();

    assert_eq!(summary.total(), 5);
    assert_eq!(summary.succeeded(), 4);
    assert_eq!(summary.failed(), 1);
    let failures: Vec<_> = summary.failures().collect();
    assert_eq!(failures[0].0, inputs[2].as_path());
    assert_eq!(failures[0].1.kind, ErrorKind::UnsupportedFormat);
    assert!(summary.results[3].succeeded());
    assert!(summary.results[4].succeeded());
    assert!(out_dir.join("five.pptx").exists());
    assert_eq!(backend.calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn batch_same_stem_inputs_do_not_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("a")).unwrap();
    std::fs::create_dir_all(dir.path().join("b")).unwrap();
    let inputs = vec![
        write(&dir.path().join("a"), "report.md", "first report"),
        write(&dir.path().join("b"), "report.txt", "second report"),
    ];
    let out_dir = dir.path().join("decks");
    let config = config_with(StubBackend::new(OUTLINE)).build().unwrap();

    let summary = run_batch(&inputs, Some(out_dir.as_path()), &config).await.unwrap();

    assert_eq!(summary.succeeded(), 2);
    assert_eq!(summary.results[0].output_path, Some(out_dir.join("report.pptx")));
    assert_eq!(summary.results[1].output_path, Some(out_dir.join("report-2.pptx")));
    assert!(out_dir.join("report.pptx").exists());
    assert!(out_dir.join("report-2.pptx").exists());
}

#[tokio::test]
async fn batch_classification_is_stable_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = vec![
        write(dir.path(), "a.md", "alpha"),
        write(dir.path(), "b.exe", "beta"),
        dir.path().join("missing.txt"),
    ];
    let config = config_with(StubBackend::new(OUTLINE)).build().unwrap();

    let first = run_batch(&inputs, None, &config).await.unwrap();
    let second = run_batch(&inputs, None, &config).await.unwrap();

    let shape = |s: &edgequake_doc2pptx::BatchSummary| {
        s.results
            .iter()
            .map(|r| r.failure.as_ref().map(|f| f.kind))
            .collect::<Vec<_>>()
    };
    assert_eq!(shape(&first), shape(&second));
    assert_eq!(
        shape(&first),
        vec![None, Some(ErrorKind::UnsupportedFormat), Some(ErrorKind::ReadError)]
    );
}

#[tokio::test]
async fn missing_credentials_stop_batch_before_any_file() {
    let dir = tempfile::tempdir().unwrap();
    if std::env::var("ANTHROPIC_API_KEY").is_ok() {
        return;
    }
    let inputs = vec![write(dir.path(), "a.md", "alpha")];
    let config = GenerationConfig::builder().provider_name("anthropic").build().unwrap();
    let err = run_batch(&inputs, None, &config).await.unwrap_err();
    assert!(matches!(err, DeckError::ConfigurationError { .. }), "{err:?}");
    assert!(!dir.path().join("a.pptx").exists());
}

#[tokio::test]
async fn in_memory_bytes_pick_reader_from_extension() {
    let config = config_with(StubBackend::new(OUTLINE)).build().unwrap();
    let deck = edgequake_doc2pptx::generate_from_bytes(b"# Notes\n\nKickoff summary.", ".md", &config)
        .await
        .unwrap();
    assert_eq!(deck.presentation.len(), 9);
    assert!(deck.source.text.contains("Kickoff summary."));

    let err = edgequake_doc2pptx::generate_from_bytes(b"\x00\x01", "bin", &config)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
}
