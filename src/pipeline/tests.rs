use super::*;
use crate::config::{ChunkingConfig, Config};
use std::cell::RefCell;
use tempfile::TempDir;

use lopdf::content::{Content, Operation};
use lopdf::{Document as PdfDocument, Object, Stream, dictionary};

/// Build a one-page PDF containing the given text.
fn sample_pdf(text: &str) -> Vec<u8> {
    let mut doc = PdfDocument::with_version("1.5");
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
            Operation::new("Tf", vec!["F1".into(), 48.into()]),
            Operation::new("Td", vec![100.into(), 600.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        content.encode().expect("Failed to encode content"),
    ));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("Failed to save PDF");
    bytes
}

/// Deterministic embedder: character-code histogram, identical text maps to
/// the identical vector.
struct HistogramEmbedder;

impl Embedder for HistogramEmbedder {
    fn embed(&self, text: &str) -> crate::Result<Vec<f32>> {
        let mut vector = vec![0.0f32; 16];
        for (i, c) in text.chars().enumerate() {
            let code = c as usize;
            vector[(code * 31 + i * 7) % 16] += (code % 13) as f32 + 1.0;
        }
        vector[0] += 1.0;
        Ok(vector)
    }
}

/// Model double that records every prompt it receives.
struct RecordingModel {
    prompts: RefCell<Vec<String>>,
}

impl RecordingModel {
    fn new() -> Self {
        Self {
            prompts: RefCell::new(Vec::new()),
        }
    }

    fn call_count(&self) -> usize {
        self.prompts.borrow().len()
    }

    fn last_prompt(&self) -> String {
        self.prompts.borrow().last().cloned().unwrap_or_default()
    }
}

impl GenerativeModel for &RecordingModel {
    fn generate(&self, prompt: &str, _max_output_tokens: u32) -> crate::Result<String> {
        self.prompts.borrow_mut().push(prompt.to_string());
        Ok(format!("generated output {}", self.prompts.borrow().len()))
    }
}

fn test_config(base_dir: std::path::PathBuf) -> Config {
    let mut config = Config::load(&base_dir).expect("Defaults should load");
    config.chunking = ChunkingConfig {
        max_chunk_size: 200,
        overlap: 20,
    };
    config
}

fn pipeline_with<'a>(
    dir: &TempDir,
    model: &'a RecordingModel,
) -> QaPipeline<HistogramEmbedder, &'a RecordingModel> {
    QaPipeline::new(
        test_config(dir.path().to_path_buf()),
        HistogramEmbedder,
        model,
    )
}

#[test]
fn summarize_short_document_issues_map_and_reduce_calls() {
    let dir = TempDir::new().unwrap();
    let model = RecordingModel::new();
    let pipeline = pipeline_with(&dir, &model);

    let summary = pipeline.summarize(&sample_pdf("A short report")).unwrap();

    assert!(!summary.is_empty());
    // One chunk to map plus the reduce pass
    assert_eq!(model.call_count(), 2);
}

#[test]
fn answer_prompt_carries_question_and_retrieved_context() {
    let dir = TempDir::new().unwrap();
    let model = RecordingModel::new();
    let pipeline = pipeline_with(&dir, &model);

    let answer = pipeline
        .answer(&sample_pdf("The warehouse holds nine thousand crates"), "How many crates?")
        .unwrap();

    assert!(!answer.is_empty());
    let prompt = model.last_prompt();
    assert!(prompt.contains("Question:How many crates?"));
    assert!(prompt.contains("crates"));
}

#[test]
fn keywords_runs_a_single_generation_call() {
    let dir = TempDir::new().unwrap();
    let model = RecordingModel::new();
    let pipeline = pipeline_with(&dir, &model);

    pipeline.keywords(&sample_pdf("Quarterly revenue grew")).unwrap();

    assert_eq!(model.call_count(), 1);
    assert!(model.last_prompt().contains("keywords"));
}

#[test]
fn corrupt_document_aborts_before_any_generation() {
    let dir = TempDir::new().unwrap();
    let model = RecordingModel::new();
    let pipeline = pipeline_with(&dir, &model);

    let result = pipeline.summarize(b"not a pdf at all");

    assert!(matches!(result, Err(DocqaError::Extraction(_))));
    assert_eq!(model.call_count(), 0);
}

#[test]
fn persistent_index_round_trip() {
    let dir = TempDir::new().unwrap();
    let model = RecordingModel::new();
    let pipeline = pipeline_with(&dir, &model);

    let chunk_count = pipeline
        .build_persistent_index(&sample_pdf("The onboarding guide lives in the wiki"))
        .unwrap();

    assert!(chunk_count >= 1);
    assert!(dir.path().join("index.json").exists());

    let answer = pipeline
        .query_persistent_index("Where does the onboarding guide live?")
        .unwrap();
    assert!(!answer.is_empty());
    assert!(model.last_prompt().contains("onboarding"));
}

#[test]
fn querying_without_a_snapshot_fails() {
    let dir = TempDir::new().unwrap();
    let model = RecordingModel::new();
    let pipeline = pipeline_with(&dir, &model);

    let result = pipeline.query_persistent_index("anything");

    assert!(result.is_err());
    assert_eq!(model.call_count(), 0);
}

#[test]
fn rebuild_replaces_snapshot_wholesale() {
    let dir = TempDir::new().unwrap();
    let model = RecordingModel::new();
    let pipeline = pipeline_with(&dir, &model);

    pipeline
        .build_persistent_index(&sample_pdf("First document about llamas"))
        .unwrap();
    pipeline
        .build_persistent_index(&sample_pdf("Second document about alpacas"))
        .unwrap();

    pipeline.query_persistent_index("alpacas").unwrap();
    let prompt = model.last_prompt();
    assert!(prompt.contains("alpacas"));
    assert!(!prompt.contains("llamas"));
}
