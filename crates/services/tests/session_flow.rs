use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use learn_core::model::{
    Phase, QuizKey, QuizQuestion, RelevanceScore, Session, SessionEvent,
};
use learn_core::scoring::SubmissionError;
use learn_core::time::fixed_now;
use services::{
    Clock, ContentGenerator, Explanation, GenerationError, RemediationMismatch, SessionError,
    SessionSettings, SessionStore, StudyMaterial,
};
use tokio::sync::Notify;

const CORRECT: [usize; 4] = [2, 0, 3, 1];

fn quiz() -> QuizKey {
    let questions = CORRECT
        .iter()
        .enumerate()
        .map(|(i, &correct)| {
            let options = (0..4).map(|o| format!("Q{i} option {o}")).collect();
            QuizQuestion::new(format!("Question {i}?"), options, correct).unwrap()
        })
        .collect();
    QuizKey::new(questions).unwrap()
}

fn all_correct() -> Vec<Option<usize>> {
    CORRECT.iter().copied().map(Some).collect()
}

/// Wrong at indices 1 and 3.
fn two_wrong() -> Vec<Option<usize>> {
    vec![Some(2), Some(1), Some(3), Some(0)]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExplainMode {
    Aligned,
    DropLast,
    Fail,
}

/// Scripted collaborator with switchable failure modes and call counting.
struct ScriptedContent {
    fail_material: AtomicBool,
    explain_mode: std::sync::Mutex<ExplainMode>,
    material_calls: AtomicUsize,
    explain_calls: AtomicUsize,
}

impl ScriptedContent {
    fn new() -> Self {
        Self {
            fail_material: AtomicBool::new(false),
            explain_mode: std::sync::Mutex::new(ExplainMode::Aligned),
            material_calls: AtomicUsize::new(0),
            explain_calls: AtomicUsize::new(0),
        }
    }

    fn set_explain_mode(&self, mode: ExplainMode) {
        *self.explain_mode.lock().unwrap() = mode;
    }
}

#[async_trait]
impl ContentGenerator for ScriptedContent {
    async fn generate_study_material(
        &self,
        topic: &str,
        _objectives: &[String],
    ) -> Result<StudyMaterial, GenerationError> {
        self.material_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_material.load(Ordering::SeqCst) {
            return Err(GenerationError::Unavailable("upstream down".into()));
        }
        Ok(StudyMaterial {
            summary: format!("All about {topic}"),
            relevance_score: RelevanceScore::new(88.0).unwrap(),
            quiz: quiz(),
        })
    }

    async fn explain_missed(
        &self,
        _quiz: &QuizKey,
        missed_indices: &[usize],
    ) -> Result<Vec<Explanation>, GenerationError> {
        self.explain_calls.fetch_add(1, Ordering::SeqCst);
        let mode = *self.explain_mode.lock().unwrap();
        if mode == ExplainMode::Fail {
            return Err(GenerationError::Unavailable("explainer down".into()));
        }
        let mut out: Vec<Explanation> = missed_indices
            .iter()
            .map(|&i| Explanation {
                question_index: i,
                text: format!("Think of question {i} like a backpack."),
            })
            .collect();
        if mode == ExplainMode::DropLast {
            out.pop();
        }
        Ok(out)
    }
}

fn store_with(content: Arc<ScriptedContent>) -> SessionStore {
    SessionStore::new(content, Clock::fixed(fixed_now()), SessionSettings::default())
}

async fn drive_to(store: &SessionStore, phase: Phase) {
    if phase == Phase::Input {
        return;
    }
    store.start("Ownership", &["moves".to_string()]).await.unwrap();
    if phase == Phase::Learning {
        return;
    }
    store.begin_quiz().await.unwrap();
    if phase == Phase::Quiz {
        return;
    }
    store.submit_answers(&two_wrong()).await.unwrap();
    if phase == Phase::Complete {
        return;
    }
    store.request_review().await.unwrap();
    assert_eq!(store.phase().await, Phase::Remediation);
}

async fn fire(store: &SessionStore, event: SessionEvent) -> Result<(), SessionError> {
    match event {
        SessionEvent::Start => store.start("Another topic", &[]).await.map(|_| ()),
        SessionEvent::BeginQuiz => store.begin_quiz().await.map(|_| ()),
        SessionEvent::SubmitAnswers => store.submit_answers(&all_correct()).await.map(|_| ()),
        SessionEvent::RequestReview => store.request_review().await.map(|_| ()),
        SessionEvent::FinishReview => store.finish_review().await.map(|_| ()),
        SessionEvent::Reset => store.reset().await.map(|_| ()),
    }
}

//
// ─── SCENARIOS ─────────────────────────────────────────────────────────────────
//

#[tokio::test]
async fn perfect_quiz_has_nothing_to_review() {
    let store = store_with(Arc::new(ScriptedContent::new()));
    drive_to(&store, Phase::Quiz).await;

    let view = store.submit_answers(&all_correct()).await.unwrap();
    let result = view.result.expect("result present");
    assert_eq!(view.phase, Phase::Complete);
    assert_eq!(result.score, 100);
    assert!(result.missed_indices.is_empty());
    assert!(result.mastered);

    let before = store.snapshot().await;
    let err = store.request_review().await.unwrap_err();
    assert!(matches!(err, SessionError::InvalidTransition(t) if t.event == SessionEvent::RequestReview));
    assert_eq!(store.snapshot().await, before);
}

#[tokio::test]
async fn two_misses_produce_ordered_remediation() {
    let content = Arc::new(ScriptedContent::new());
    let store = store_with(Arc::clone(&content));
    drive_to(&store, Phase::Quiz).await;

    let view = store.submit_answers(&two_wrong()).await.unwrap();
    let result = view.result.unwrap();
    assert_eq!(result.score, 50);
    assert_eq!(result.missed_indices, vec![1, 3]);
    assert!(!result.mastered);

    let view = store.request_review().await.unwrap();
    assert_eq!(view.phase, Phase::Remediation);
    let indices: Vec<usize> = view.remediation.iter().map(|e| e.question_index).collect();
    assert_eq!(indices, vec![1, 3]);
    assert_eq!(view.remediation[0].correct_answer, "Q1 option 0");
    assert_eq!(view.remediation[1].correct_answer, "Q3 option 1");
    assert_eq!(view.remediation[1].question, "Question 3?");
    assert_eq!(content.explain_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn short_submission_is_malformed_and_stays_in_quiz() {
    let store = store_with(Arc::new(ScriptedContent::new()));
    drive_to(&store, Phase::Quiz).await;
    let before = store.snapshot().await;

    let err = store
        .submit_answers(&[Some(0), Some(0), Some(0)])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::MalformedSubmission(SubmissionError::LengthMismatch {
            expected: 4,
            actual: 3
        })
    ));
    assert_eq!(store.phase().await, Phase::Quiz);
    assert_eq!(store.snapshot().await, before);
}

#[tokio::test]
async fn unanswered_or_out_of_range_is_malformed() {
    let store = store_with(Arc::new(ScriptedContent::new()));
    drive_to(&store, Phase::Quiz).await;

    let err = store
        .submit_answers(&[Some(2), None, Some(3), Some(1)])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::MalformedSubmission(SubmissionError::Unanswered { index: 1 })
    ));

    let err = store
        .submit_answers(&[Some(2), Some(0), Some(9), Some(1)])
        .await
        .unwrap_err();
    assert_eq!(err.code(), "malformed_submission");
    assert_eq!(store.phase().await, Phase::Quiz);
}

#[tokio::test]
async fn reset_mid_remediation_clears_everything() {
    let store = store_with(Arc::new(ScriptedContent::new()));
    drive_to(&store, Phase::Remediation).await;

    let view = store.reset().await.unwrap();
    assert_eq!(view.phase, Phase::Input);
    assert!(view.topic.is_empty());
    assert!(view.summary.is_empty());
    assert!(view.result.is_none());
    assert!(view.remediation.is_empty());
    assert_eq!(view.question_count, 0);
    assert_eq!(store.snapshot().await, Session::default());
}

//
// ─── PROPERTIES ────────────────────────────────────────────────────────────────
//

#[tokio::test]
async fn every_illegal_event_is_rejected_without_mutation() {
    for phase in Phase::ALL {
        for event in SessionEvent::ALL {
            if phase.next(event).is_some() {
                continue;
            }
            let store = store_with(Arc::new(ScriptedContent::new()));
            drive_to(&store, phase).await;
            let before = store.snapshot().await;

            let err = fire(&store, event).await.unwrap_err();
            match err {
                SessionError::InvalidTransition(t) => {
                    assert_eq!(t.phase, phase, "{phase} x {event}");
                    assert_eq!(t.event, event, "{phase} x {event}");
                }
                other => panic!("{phase} x {event}: unexpected {other:?}"),
            }
            assert_eq!(store.snapshot().await, before, "{phase} x {event}");
        }
    }
}

#[tokio::test]
async fn retake_reuses_quiz_and_replaces_result() {
    let content = Arc::new(ScriptedContent::new());
    let store = store_with(Arc::clone(&content));
    drive_to(&store, Phase::Remediation).await;
    let key_before = store.snapshot().await.quiz_key().cloned();

    let view = store.finish_review().await.unwrap();
    assert_eq!(view.phase, Phase::Learning);
    assert_eq!(view.result.as_ref().map(|r| r.score), Some(50));

    store.begin_quiz().await.unwrap();
    let view = store.submit_answers(&all_correct()).await.unwrap();
    assert_eq!(view.result.unwrap().score, 100);
    assert_eq!(view.attempts, 2);
    let result = store.result().await.unwrap();
    assert!(result.missed_indices().is_empty());
    assert!(result.is_mastered(store.settings().mastery_threshold));

    let snapshot = store.snapshot().await;
    assert_eq!(snapshot.quiz_key().cloned(), key_before);
    assert_eq!(content.material_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn views_never_leak_correct_indices() {
    let store = store_with(Arc::new(ScriptedContent::new()));
    drive_to(&store, Phase::Quiz).await;

    let view = store.view().await;
    let json = serde_json::to_value(&view).unwrap();
    let text = json.to_string();
    assert!(!text.contains("correct"));
    assert_eq!(json["questions"].as_array().map(Vec::len), Some(4));
    assert_eq!(json["phase"], "quiz");
}

//
// ─── FAILURES ──────────────────────────────────────────────────────────────────
//

#[tokio::test]
async fn failed_generation_keeps_input_and_allows_retry() {
    let content = Arc::new(ScriptedContent::new());
    content.fail_material.store(true, Ordering::SeqCst);
    let store = store_with(Arc::clone(&content));

    let err = store.start("Ownership", &[]).await.unwrap_err();
    assert!(matches!(err, SessionError::Generation(GenerationError::Unavailable(_))));
    assert_eq!(store.snapshot().await, Session::default());

    content.fail_material.store(false, Ordering::SeqCst);
    let view = store.start("Ownership", &[]).await.unwrap();
    assert_eq!(view.phase, Phase::Learning);
    assert_eq!(view.summary, "All about Ownership");
    assert_eq!(content.material_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn empty_topic_is_rejected_before_generation() {
    let content = Arc::new(ScriptedContent::new());
    let store = store_with(Arc::clone(&content));
    let err = store.start("  ", &[]).await.unwrap_err();
    assert!(matches!(err, SessionError::EmptyTopic));
    assert_eq!(content.material_calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.phase().await, Phase::Input);
}

#[tokio::test]
async fn misaligned_explanations_are_surfaced() {
    let content = Arc::new(ScriptedContent::new());
    let store = store_with(Arc::clone(&content));
    drive_to(&store, Phase::Complete).await;
    let before = store.snapshot().await;

    content.set_explain_mode(ExplainMode::DropLast);
    let err = store.request_review().await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::RemediationMismatch(RemediationMismatch::Count {
            expected: 2,
            actual: 1
        })
    ));
    assert_eq!(store.snapshot().await, before);

    content.set_explain_mode(ExplainMode::Fail);
    let err = store.request_review().await.unwrap_err();
    assert!(matches!(err, SessionError::Generation(_)));
    assert_eq!(store.snapshot().await, before);

    content.set_explain_mode(ExplainMode::Aligned);
    let view = store.request_review().await.unwrap();
    assert_eq!(view.remediation.len(), 2);
}

//
// ─── CONCURRENCY ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gate {
    Material,
    Explanations,
}

/// Blocks inside the gated collaborator call until released.
struct GatedContent {
    gate: Gate,
    entered: Notify,
    release: Notify,
    material_calls: AtomicUsize,
    explain_calls: AtomicUsize,
}

impl GatedContent {
    fn new(gate: Gate) -> Arc<Self> {
        Arc::new(Self {
            gate,
            entered: Notify::new(),
            release: Notify::new(),
            material_calls: AtomicUsize::new(0),
            explain_calls: AtomicUsize::new(0),
        })
    }

    async fn hold(&self, stage: Gate) {
        if self.gate == stage {
            self.entered.notify_one();
            self.release.notified().await;
        }
    }
}

#[async_trait]
impl ContentGenerator for GatedContent {
    async fn generate_study_material(
        &self,
        topic: &str,
        _objectives: &[String],
    ) -> Result<StudyMaterial, GenerationError> {
        self.material_calls.fetch_add(1, Ordering::SeqCst);
        self.hold(Gate::Material).await;
        Ok(StudyMaterial {
            summary: format!("All about {topic}"),
            relevance_score: RelevanceScore::new(75.0).unwrap(),
            quiz: quiz(),
        })
    }

    async fn explain_missed(
        &self,
        _quiz: &QuizKey,
        missed_indices: &[usize],
    ) -> Result<Vec<Explanation>, GenerationError> {
        self.explain_calls.fetch_add(1, Ordering::SeqCst);
        self.hold(Gate::Explanations).await;
        Ok(missed_indices
            .iter()
            .map(|&i| Explanation {
                question_index: i,
                text: format!("Picture question {i} as a lease."),
            })
            .collect())
    }
}

fn shared_store(content: Arc<dyn ContentGenerator>) -> Arc<SessionStore> {
    Arc::new(SessionStore::new(
        content,
        Clock::fixed(fixed_now()),
        SessionSettings::default(),
    ))
}

#[tokio::test]
async fn duplicate_pending_start_is_busy() {
    let content = GatedContent::new(Gate::Material);
    let store = shared_store(Arc::clone(&content) as Arc<dyn ContentGenerator>);

    let first = {
        let store = Arc::clone(&store);
        tokio::spawn(async move { store.start("Ownership", &[]).await })
    };
    content.entered.notified().await;
    assert!(store.is_busy());

    let err = store.start("Ownership", &[]).await.unwrap_err();
    assert!(matches!(err, SessionError::SessionBusy { event: SessionEvent::Start }));

    content.release.notify_one();
    let view = first.await.unwrap().unwrap();
    assert_eq!(view.phase, Phase::Learning);
    assert_eq!(content.material_calls.load(Ordering::SeqCst), 1);
    assert!(!store.is_busy());
}

#[tokio::test]
async fn duplicate_pending_review_is_busy_and_reset_queues_behind_it() {
    let content = GatedContent::new(Gate::Explanations);
    let store = shared_store(Arc::clone(&content) as Arc<dyn ContentGenerator>);
    drive_to(&store, Phase::Complete).await;

    let first = {
        let store = Arc::clone(&store);
        tokio::spawn(async move { store.request_review().await })
    };
    content.entered.notified().await;

    let err = store.request_review().await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::SessionBusy {
            event: SessionEvent::RequestReview
        }
    ));
    assert_eq!(err.code(), "session_busy");

    let reset = {
        let store = Arc::clone(&store);
        tokio::spawn(async move { store.reset().await })
    };

    content.release.notify_one();
    let view = first.await.unwrap().unwrap();
    assert_eq!(view.phase, Phase::Remediation);
    assert_eq!(view.remediation.len(), 2);

    let view = reset.await.unwrap().unwrap();
    assert_eq!(view.phase, Phase::Input);
    assert_eq!(content.explain_calls.load(Ordering::SeqCst), 1);
    assert_eq!(store.snapshot().await, Session::default());
}

#[tokio::test]
async fn reset_waits_for_pending_start() {
    let content = GatedContent::new(Gate::Material);
    let store = shared_store(Arc::clone(&content) as Arc<dyn ContentGenerator>);

    let start = {
        let store = Arc::clone(&store);
        tokio::spawn(async move { store.start("Ownership", &[]).await })
    };
    content.entered.notified().await;

    let reset = {
        let store = Arc::clone(&store);
        tokio::spawn(async move { store.reset().await })
    };

    content.release.notify_one();
    start.await.unwrap().unwrap();
    let view = reset.await.unwrap().unwrap();
    assert_eq!(view.phase, Phase::Input);
    assert_eq!(store.snapshot().await, Session::default());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn submission_and_reset_never_interleave() {
    for _ in 0..25 {
        let store = Arc::new(store_with(Arc::new(ScriptedContent::new())));
        drive_to(&store, Phase::Quiz).await;

        let submit = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.submit_answers(&all_correct()).await })
        };
        let reset = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.reset().await })
        };

        match submit.await.unwrap() {
            Ok(view) => {
                assert_eq!(view.phase, Phase::Complete);
                assert_eq!(view.attempts, 1);
                assert_eq!(view.result.map(|r| r.score), Some(100));
            }
            Err(SessionError::InvalidTransition(t)) => {
                assert_eq!(t.phase, Phase::Input);
                assert_eq!(t.event, SessionEvent::SubmitAnswers);
            }
            Err(other) => panic!("unexpected {other:?}"),
        }
        let view = reset.await.unwrap().unwrap();
        assert_eq!(view.phase, Phase::Input);
        assert_eq!(store.snapshot().await, Session::default());
    }
}
