use std::path::Path;

use super::*;
use crate::error::GenerationError;
use crate::generation::{BlogRequest, ContentPipeline};
use crate::metrics::keywords::DEFAULT_KEYWORD_TOP_N;
use crate::semantic::LOCAL_HASH_MODEL;

const REFERENCE: &str = "# Pop-up cards\n\nFold the card in half and cut two slits to make a pop-up step.";
const CANDIDATE: &str =
    "## Making a pop-up card\n\nFold the card and cut two slits. Share your card with us!";

struct Fixture {
    dir: tempfile::TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("tempdir"),
        }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn write(&self, relative: &str, body: &str) {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("fixture dir");
        }
        fs::write(path, body).expect("fixture write");
    }

    fn sample(&self, id: &str) -> EvaluationSample {
        self.write(&format!("transcripts/{id}.txt"), "fold the card and cut");
        self.write(&format!("references/{id}.md"), REFERENCE);
        EvaluationSample {
            id: id.to_string(),
            title: format!("{id} tutorial"),
            video_url: format!("https://youtu.be/{id}"),
            transcript_path: format!("transcripts/{id}.txt"),
            reference_path: format!("references/{id}.md"),
            tone: "casual".to_string(),
            notes: None,
        }
    }

    fn dataset(&self, samples: &[EvaluationSample]) {
        let rows: Vec<String> = samples
            .iter()
            .map(|sample| serde_json::to_string(sample).expect("json"))
            .collect();
        self.write("evals/dataset.jsonl", &format!("{}\n", rows.join("\n")));
    }

    fn args(&self, mode: EvalMode) -> RunEvalsArgs {
        RunEvalsArgs {
            mode,
            dataset: self.root().join("evals/dataset.jsonl"),
            root: self.root().to_path_buf(),
            generated_dir: self.root().join("evals/mock_outputs"),
            output_dir: self.root().join("evals/results"),
            skip_bert_score: true,
            bert_model: LOCAL_HASH_MODEL.to_string(),
            keyword_top_n: DEFAULT_KEYWORD_TOP_N,
            min_words: 5,
            max_words: 200,
        }
    }
}

struct CannedPipeline;

impl ContentPipeline for CannedPipeline {
    fn generate(&self, request: &BlogRequest<'_>) -> Result<String, GenerationError> {
        if request.sample_id.starts_with("rejected") {
            return Err(GenerationError::Status {
                endpoint: "chat/completions".to_string(),
                status: 400,
                body: "context length exceeded".to_string(),
            });
        }
        match request.transcript {
            Some(transcript) => Ok(format!("# {}\n\n{transcript}. Share your card!", request.sample_id)),
            None => Err(GenerationError::TranscriptUnavailable(request.video_url.to_string())),
        }
    }
}

#[test]
fn mock_run_scores_cached_sample_and_isolates_missing_cache() {
    let fixture = Fixture::new();
    let cached = fixture.sample("cached");
    let uncached = fixture.sample("uncached");
    fixture.dataset(&[cached, uncached]);
    fixture.write("evals/mock_outputs/cached.md", CANDIDATE);

    let args = fixture.args(EvalMode::Mock);
    let (report, path) = execute(&args, &Settings::default()).expect("run succeeds");

    assert!(path.is_file());
    assert_eq!(report.mode, "mock");
    assert_eq!(report.samples.len(), 2);

    let first = &report.samples[0];
    assert_eq!(first.status, SampleStatus::Scored);
    assert_eq!(first.source, Some(GenerationSource::Mock));
    assert!(first.score("rougeL_f").is_some());
    assert_eq!(first.score("has_heading"), Some(1.0));
    assert_eq!(first.score("call_to_action"), Some(1.0));

    let second = &report.samples[1];
    assert_eq!(second.status, SampleStatus::Failed);
    let error = second.error.as_ref().expect("failure details");
    assert_eq!(error.kind, "missing_cache");
    assert!(second.scores.is_empty());

    assert_eq!(report.summary.scored, 1);
    assert_eq!(report.summary.failed_sample_ids, vec!["uncached".to_string()]);
    assert!(!report.aggregates.is_empty());
    assert!(report.aggregates.values().all(|aggregate| aggregate.count == 1));

    assert!(!report.capabilities.bert_score.enabled);
    assert!(report.aggregates.keys().all(|name| !name.starts_with("bert")));
    assert!(
        report
            .samples
            .iter()
            .flat_map(|sample| sample.scores.iter())
            .all(|score| !score.name.starts_with("bert"))
    );
}

#[test]
fn local_embedding_backend_adds_semantic_scores() {
    let fixture = Fixture::new();
    let sample = fixture.sample("pop_up");
    fixture.dataset(&[sample]);
    fixture.write("evals/mock_outputs/pop_up.txt", CANDIDATE);

    let mut args = fixture.args(EvalMode::Mock);
    args.skip_bert_score = false;
    let (report, _) = execute(&args, &Settings::default()).expect("run succeeds");

    assert!(report.capabilities.bert_score.enabled);
    assert_eq!(
        report.capabilities.bert_score.model.as_deref(),
        Some(LOCAL_HASH_MODEL)
    );
    for name in ["bert_precision", "bert_recall", "bert_f1"] {
        let aggregate = &report.aggregates[name];
        assert_eq!(aggregate.count, 1);
        assert!((0.0..=1.0).contains(&aggregate.mean), "{name} = {}", aggregate.mean);
    }
}

#[test]
fn empty_reference_fails_only_that_sample() {
    let fixture = Fixture::new();
    let good = fixture.sample("good");
    let blank = fixture.sample("blank");
    fixture.write("references/blank.md", "  \n");
    fixture.dataset(&[good, blank]);
    fixture.write("evals/mock_outputs/good.md", CANDIDATE);
    fixture.write("evals/mock_outputs/blank.md", CANDIDATE);

    let (report, _) =
        execute(&fixture.args(EvalMode::Mock), &Settings::default()).expect("run succeeds");
    assert_eq!(report.samples[0].status, SampleStatus::Scored);
    let error = report.samples[1].error.as_ref().expect("failure details");
    assert_eq!(error.kind, "validation_error");
    assert!(error.message.contains("reference is empty"));
}

#[test]
fn live_run_generates_from_transcript_and_fills_cache() {
    let fixture = Fixture::new();
    let sample = fixture.sample("live_one");
    fixture.dataset(&[sample]);

    let args = fixture.args(EvalMode::Live);
    let adapter = GenerationAdapter::live(
        OutputCache::new(&args.generated_dir),
        Box::new(CannedPipeline),
    );
    let (report, _) = evaluate(&args, &Settings::default(), &adapter).expect("run succeeds");

    let scored = &report.samples[0];
    assert_eq!(scored.status, SampleStatus::Scored);
    assert_eq!(scored.source, Some(GenerationSource::Live));
    assert_eq!(report.mode, "live");

    let cached = fs::read_to_string(args.generated_dir.join("live_one.md")).expect("cache file");
    assert!(cached.contains("fold the card and cut"));
}

#[test]
fn live_mode_without_api_key_is_fatal() {
    let fixture = Fixture::new();
    let sample = fixture.sample("needs_key");
    fixture.dataset(&[sample]);

    let args = fixture.args(EvalMode::Live);
    let error = execute(&args, &Settings::default()).expect_err("no api key");
    assert!(format!("{error:#}").contains("OPENAI_API_KEY"));
    assert!(!args.output_dir.exists());
}

#[test]
fn duplicate_ids_abort_before_any_report() {
    let fixture = Fixture::new();
    let sample = fixture.sample("twice");
    fixture.dataset(&[sample.clone(), sample]);

    let args = fixture.args(EvalMode::Mock);
    let error = execute(&args, &Settings::default()).expect_err("duplicate ids");
    assert!(error.to_string().contains("duplicate id 'twice'"));
    assert!(!args.output_dir.exists());
}

#[test]
fn inverted_word_band_is_rejected() {
    let fixture = Fixture::new();
    let sample = fixture.sample("band");
    fixture.dataset(&[sample]);

    let mut args = fixture.args(EvalMode::Mock);
    args.min_words = 500;
    args.max_words = 100;
    let error = execute(&args, &Settings::default()).expect_err("bad band");
    assert!(error.to_string().contains("--min-words"));
}

#[test]
fn live_generation_failure_is_isolated_to_its_sample() {
    let fixture = Fixture::new();
    let rejected = fixture.sample("rejected_first");
    let accepted = fixture.sample("accepted_second");
    fixture.dataset(&[rejected, accepted]);

    let args = fixture.args(EvalMode::Live);
    let adapter = GenerationAdapter::live(
        OutputCache::new(&args.generated_dir),
        Box::new(CannedPipeline),
    );
    let (report, _) = evaluate(&args, &Settings::default(), &adapter).expect("run succeeds");

    let first = &report.samples[0];
    assert_eq!(first.status, SampleStatus::Failed);
    let error = first.error.as_ref().expect("failure details");
    assert_eq!(error.kind, "generation_error");
    assert!(error.message.contains("400"), "unexpected message: {}", error.message);
    assert!(!args.generated_dir.join("rejected_first.md").exists());

    assert_eq!(report.samples[1].status, SampleStatus::Scored);
    assert!(args.generated_dir.join("accepted_second.md").is_file());
    assert_eq!(report.summary.failed_sample_ids, vec!["rejected_first".to_string()]);
}

#[test]
fn unreadable_transcript_is_an_io_failure_not_a_fallback() {
    let fixture = Fixture::new();
    let garbled = fixture.sample("garbled");
    fs::write(fixture.root().join("transcripts/garbled.txt"), [0xff_u8, 0xfe, 0x00])
        .expect("fixture write");
    let missing = fixture.sample("missing");
    fs::remove_file(fixture.root().join("transcripts/missing.txt")).expect("remove transcript");
    fixture.dataset(&[garbled, missing]);

    let args = fixture.args(EvalMode::Live);
    let adapter = GenerationAdapter::live(
        OutputCache::new(&args.generated_dir),
        Box::new(CannedPipeline),
    );
    let (report, _) = evaluate(&args, &Settings::default(), &adapter).expect("run succeeds");

    let error = report.samples[0].error.as_ref().expect("failure details");
    assert_eq!(error.kind, "io_error");
    assert!(error.message.contains("garbled.txt"), "unexpected message: {}", error.message);
    assert!(!args.generated_dir.join("garbled.md").exists());

    // Absent transcripts reach the pipeline as `None`.
    let error = report.samples[1].error.as_ref().expect("failure details");
    assert_eq!(error.kind, "generation_error");
}
