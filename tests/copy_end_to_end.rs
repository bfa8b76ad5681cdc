use std::{
    io::Cursor,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba};
use serial_test::serial;
use tokio::sync::mpsc;
use vault_copy::{
    application::{
        assets::{AssetInliner, RasterConverter},
        copy::{CopyGate, CopyHandler, Notifier},
        pipeline::DocumentRenderer,
        preview::{PreviewError, PreviewLoop, PreviewOutcome, PreviewSink},
        render::{
            MarkdownRenderer, RenderContainer, RenderError, RenderScope, SettleDetector,
            VaultRenderer,
        },
    },
    domain::{
        event::VaultEvent,
        file::VaultFile,
        options::{FootnoteHandling, RenderOptions},
    },
    infra::vault::FsVault,
};

const NOTE: &str = "---\ntags: [daily]\n---\n# Today\n\nSee [[Other Note]] and the plan[^1].\n\n![dot](dot.png)\n\n- [ ] call back\n\n[^1]: Drafted on Monday.\n";

#[derive(Default)]
struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    fn messages(&self) -> Vec<String> {
        self.messages.lock().expect("notifier lock").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        self.messages
            .lock()
            .expect("notifier lock")
            .push(message.to_string());
    }
}

#[derive(Default)]
struct RecordingSink {
    published: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl PreviewSink for RecordingSink {
    async fn publish(&self, file: &VaultFile, html: &str) -> Result<(), PreviewError> {
        self.published
            .lock()
            .expect("sink lock")
            .push((file.path.clone(), html.to_string()));
        Ok(())
    }
}

struct FailingRenderer;

#[async_trait]
impl MarkdownRenderer for FailingRenderer {
    async fn render(
        &self,
        _markdown: &str,
        _container: &RenderContainer,
        _source_path: &str,
        _scope: &RenderScope,
    ) -> Result<(), RenderError> {
        Err(RenderError::markdown("renderer exploded"))
    }
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let image = ImageBuffer::from_pixel(width, height, Rgba([200u8, 30, 30, 255]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(image)
        .write_to(&mut out, ImageFormat::Png)
        .expect("encode png");
    out.into_inner()
}

fn vault() -> (tempfile::TempDir, Arc<FsVault>) {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("today.md"), NOTE).expect("write note");
    std::fs::write(dir.path().join("dot.png"), png(2, 2)).expect("write image");
    let vault = Arc::new(FsVault::new(dir.path()).expect("open vault"));
    (dir, vault)
}

fn settle() -> SettleDetector {
    SettleDetector::new(Duration::from_millis(20), Duration::from_millis(2_000))
}

fn handler(
    vault: Arc<FsVault>,
    renderer: Arc<dyn MarkdownRenderer>,
    notifier: Arc<RecordingNotifier>,
    options: RenderOptions,
) -> CopyHandler {
    let assets = AssetInliner::new(vault, RasterConverter::new().expect("http client"));
    CopyHandler::new(DocumentRenderer::new(renderer, settle(), assets), notifier, options)
}

fn vault_handler(
    vault: Arc<FsVault>,
    notifier: Arc<RecordingNotifier>,
    options: RenderOptions,
) -> CopyHandler {
    let renderer = Arc::new(VaultRenderer::new(vault.root()));
    handler(vault, renderer, notifier, options)
}

#[tokio::test]
#[serial]
async fn copies_a_note_into_a_portable_document() {
    let (_dir, vault) = vault();
    let notifier = Arc::new(RecordingNotifier::default());
    let handler = vault_handler(
        Arc::clone(&vault),
        Arc::clone(&notifier),
        RenderOptions::default(),
    );

    let file = VaultFile::from_path("today.md");
    let html = handler
        .copy(NOTE, &file, true)
        .await
        .expect("copy succeeds");

    assert!(html.starts_with("<html>\n<head>\n  <title>today</title>"));
    assert!(html.contains("<h1>Today</h1>"));
    assert!(html.contains("<span class=\"internal-link\">Other Note</span>"));
    assert!(html.contains("src=\"data:image/png;base64,"));
    assert!(!html.contains("app://local"));
    assert!(html.contains("<span class=\"footnote-link\">1</span>"));
    assert!(html.contains("Drafted on Monday."));
    assert!(!html.contains("\u{21a9}"));
    assert!(!html.contains("tags: [daily]"));
    assert!(html.contains("disabled=\"disabled\""));
    assert!(notifier.messages().is_empty());
    assert!(!handler.gate().is_running());
}

#[tokio::test]
#[serial]
async fn local_images_are_inlined_byte_for_byte() {
    let (dir, vault) = vault();
    let original = png(3, 2);
    std::fs::write(dir.path().join("local.png"), &original).expect("write image");
    let notifier = Arc::new(RecordingNotifier::default());
    let handler = vault_handler(vault, notifier, RenderOptions::default());

    let markdown = "# Title\n\nSome ![img](local.png) text.\n\n[^1]: note\n\nRef[^1]";
    let html = handler
        .copy(markdown, &VaultFile::from_path("Report.md"), true)
        .await
        .expect("copy succeeds");

    assert!(html.contains("<title>Report</title>"));
    assert!(html.contains("<span class=\"footnote-link\">1</span>"));
    assert!(!html.contains("href=\"#fn"));

    let prefix = "src=\"data:image/png;base64,";
    let start = html.find(prefix).expect("inlined image") + prefix.len();
    let end = start + html[start..].find('"').expect("closing quote");
    let decoded = STANDARD.decode(&html[start..end]).expect("valid base64");
    assert_eq!(decoded, original);
}

#[tokio::test]
#[serial]
async fn selections_and_bare_output_follow_the_options() {
    let (_dir, vault) = vault();
    let notifier = Arc::new(RecordingNotifier::default());
    let options = RenderOptions {
        bare_html_only: true,
        remove_front_matter: false,
        footnote_handling: FootnoteHandling::RemoveAll,
        ..RenderOptions::default()
    };
    let handler = vault_handler(vault, notifier, options);

    let html = handler
        .copy(NOTE, &VaultFile::from_path("today.md"), false)
        .await
        .expect("copy succeeds");

    assert!(!html.contains("<html>"));
    assert!(!html.contains("<title>"));
    assert!(html.contains("tags: [daily]"));
    assert!(!html.contains("Drafted on Monday."));
    assert!(!html.contains("footnote-link"));
}

#[tokio::test]
#[serial]
async fn a_running_copy_rejects_the_next_one() {
    let (_dir, vault) = vault();
    let notifier = Arc::new(RecordingNotifier::default());
    let handler = vault_handler(vault, Arc::clone(&notifier), RenderOptions::default());

    let held = CopyGate::process().acquire().expect("gate is free");
    let result = handler.copy(NOTE, &VaultFile::from_path("today.md"), true).await;
    assert!(result.is_none());
    assert_eq!(
        notifier.messages(),
        vec!["copy failed: another copy is already running".to_string()]
    );

    drop(held);
    assert!(
        handler
            .copy(NOTE, &VaultFile::from_path("today.md"), true)
            .await
            .is_some()
    );
}

#[tokio::test]
#[serial]
async fn render_failures_are_notified_and_release_the_gate() {
    let (_dir, vault) = vault();
    let notifier = Arc::new(RecordingNotifier::default());
    let handler = handler(
        vault,
        Arc::new(FailingRenderer),
        Arc::clone(&notifier),
        RenderOptions::default(),
    );

    let result = handler.copy(NOTE, &VaultFile::from_path("today.md"), true).await;
    assert!(result.is_none());
    let messages = notifier.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with("copy failed: "));
    assert!(messages[0].contains("renderer exploded"));
    assert!(!handler.gate().is_running());
}

#[tokio::test]
#[serial]
async fn independent_gates_allow_concurrent_copies() {
    let (_dir, vault) = vault();
    let notifier = Arc::new(RecordingNotifier::default());
    let handler =
        vault_handler(vault, notifier, RenderOptions::default()).with_gate(CopyGate::new());

    let _held = CopyGate::process().acquire().expect("gate is free");
    assert!(
        handler
            .copy("plain text", &VaultFile::from_path("today.md"), true)
            .await
            .is_some()
    );
}

#[tokio::test]
#[serial]
async fn preview_loop_publishes_markdown_changes_only() {
    let (dir, vault) = vault();
    let notifier = Arc::new(RecordingNotifier::default());
    let handler = Arc::new(vault_handler(
        Arc::clone(&vault),
        notifier,
        RenderOptions::default(),
    ));
    let sink = Arc::new(RecordingSink::default());
    let preview = PreviewLoop::new(vault, handler, Arc::clone(&sink) as Arc<dyn PreviewSink>);

    assert_eq!(
        preview
            .handle(VaultEvent::Modified("dot.png".to_string()))
            .await
            .expect("handled"),
        PreviewOutcome::Ignored
    );
    assert_eq!(
        preview
            .handle(VaultEvent::Deleted("gone.md".to_string()))
            .await
            .expect("handled"),
        PreviewOutcome::Ignored
    );
    assert!(
        preview
            .handle(VaultEvent::Opened("missing.md".to_string()))
            .await
            .is_err()
    );

    let (tx, rx) = mpsc::channel(4);
    tx.send(VaultEvent::Modified("today.md".to_string()))
        .await
        .expect("send");
    tx.send(VaultEvent::Renamed {
        from: "today.md".to_string(),
        to: "tomorrow.md".to_string(),
    })
    .await
    .expect("send");
    drop(tx);
    preview.run(rx).await;

    let published = sink.published.lock().expect("sink lock").clone();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].0, "today.md");
    assert!(published[0].1.contains("<title>today</title>"));
    assert!(dir.path().join("today.md").exists());
}
