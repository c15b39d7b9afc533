use std::env;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use learn_core::model::{QuizError, QuizKey, QuizQuestion, RelevanceScore};

use super::{ContentGenerator, Explanation, StudyMaterial};
use crate::error::GenerationError;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_MIN_RELEVANCE: f32 = 50.0;

//
// ─── CONFIG ────────────────────────────────────────────────────────────────────
//

#[derive(Clone, Debug)]
pub struct ContentConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    /// Relevance (percent) below which a topic is refused.
    pub min_relevance: f32,
}

impl ContentConfig {
    /// Reads `LEARN_AI_API_KEY`, `LEARN_AI_BASE_URL`, `LEARN_AI_MODEL` and
    /// `LEARN_MIN_RELEVANCE`. Returns `None` without an API key.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("LEARN_AI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url = env::var("LEARN_AI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let model = env::var("LEARN_AI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());
        let min_relevance = env::var("LEARN_MIN_RELEVANCE")
            .ok()
            .and_then(|raw| raw.trim().parse::<f32>().ok())
            .filter(|v| (0.0..=RelevanceScore::MAX).contains(v))
            .unwrap_or(DEFAULT_MIN_RELEVANCE);
        Some(Self {
            base_url,
            api_key,
            model,
            min_relevance,
        })
    }
}

//
// ─── GENERATOR ─────────────────────────────────────────────────────────────────
//

/// Content generator backed by an OpenAI-compatible chat-completions endpoint.
#[derive(Clone)]
pub struct ChatContentGenerator {
    client: Client,
    config: Option<ContentConfig>,
}

impl ChatContentGenerator {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(ContentConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<ContentConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    async fn complete(&self, system: &str, user: String) -> Result<String, GenerationError> {
        let config = self.config.as_ref().ok_or(GenerationError::Disabled)?;

        let url = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
        let payload = ChatRequest {
            model: config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.2,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        debug!(model = %config.model, "requesting chat completion");
        let response = self
            .client
            .post(url)
            .bearer_auth(&config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GenerationError::HttpStatus(response.status()));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(GenerationError::EmptyResponse)?;

        Ok(content)
    }

    fn min_relevance(&self) -> f32 {
        self.config
            .as_ref()
            .map_or(DEFAULT_MIN_RELEVANCE, |c| c.min_relevance)
    }
}

#[async_trait]
impl ContentGenerator for ChatContentGenerator {
    async fn generate_study_material(
        &self,
        topic: &str,
        objectives: &[String],
    ) -> Result<StudyMaterial, GenerationError> {
        let objectives = if objectives.is_empty() {
            "(none given)".to_string()
        } else {
            objectives.join(", ")
        };
        let raw = self
            .complete(
                MATERIAL_PROMPT,
                format!("Topic: {topic}\nObjectives: {objectives}"),
            )
            .await?;
        parse_material(&raw, self.min_relevance())
    }

    async fn explain_missed(
        &self,
        quiz: &QuizKey,
        missed_indices: &[usize],
    ) -> Result<Vec<Explanation>, GenerationError> {
        let mut user = String::from("Missed questions:\n");
        for &index in missed_indices {
            if let Some(question) = quiz.get(index) {
                user.push_str(&format!(
                    "- question_index {index}: {} (correct answer: {})\n",
                    question.question(),
                    question.correct_answer()
                ));
            }
        }
        let raw = self.complete(EXPLAIN_PROMPT, user).await?;
        parse_explanations(&raw)
    }
}

//
// ─── PROMPTS & PAYLOADS ────────────────────────────────────────────────────────
//

const MATERIAL_PROMPT: &str = "You are an educator. For the given topic and objectives, write a \
concise, structured study summary (bullet points, bold key terms) and 3 to 5 multiple choice \
questions answerable from that summary, each with exactly 4 options and one correct option. \
Also rate from 0 to 100 how well the material covers the objectives. Respond with JSON only: \
{\"relevance_score\": number, \"is_relevant\": bool, \"summary\": string, \"quiz\": \
[{\"question\": string, \"options\": [string], \"correct_index\": number}]}";

const EXPLAIN_PROMPT: &str = "You are a teacher using the Feynman technique. For each missed \
question, explain the idea so a ten year old could retell it: one plain sentence with the core \
idea, an everyday analogy, how it works, and a one-line recap. No jargon, at most 250 words \
each. Respond with JSON only: {\"explanations\": [{\"question_index\": number, \
\"explanation\": string}]} keeping the order of the questions given.";

#[derive(Debug, Deserialize)]
struct MaterialPayload {
    relevance_score: f32,
    #[serde(default = "default_true")]
    is_relevant: bool,
    summary: String,
    quiz: Vec<QuestionPayload>,
}

#[derive(Debug, Deserialize)]
struct QuestionPayload {
    question: String,
    options: Vec<String>,
    correct_index: usize,
}

#[derive(Debug, Deserialize)]
struct ExplanationsPayload {
    explanations: Vec<ExplanationPayload>,
}

#[derive(Debug, Deserialize)]
struct ExplanationPayload {
    question_index: usize,
    explanation: String,
}

fn default_true() -> bool {
    true
}

/// Models sometimes wrap JSON in a fenced code block.
fn strip_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

fn parse_material(raw: &str, min_relevance: f32) -> Result<StudyMaterial, GenerationError> {
    let payload: MaterialPayload = serde_json::from_str(strip_fences(raw))?;

    let relevance_score = RelevanceScore::new(payload.relevance_score)?;
    if !payload.is_relevant || relevance_score.value() < min_relevance {
        return Err(GenerationError::Irrelevant {
            score: relevance_score.value(),
            min: min_relevance,
        });
    }

    let summary = payload.summary.trim().to_string();
    if summary.is_empty() {
        return Err(GenerationError::EmptyResponse);
    }

    let questions = payload
        .quiz
        .into_iter()
        .enumerate()
        .map(|(index, q)| {
            QuizQuestion::new(q.question, q.options, q.correct_index).map_err(|source| {
                QuizError::InvalidQuestion {
                    index,
                    source: Box::new(source),
                }
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(StudyMaterial {
        summary,
        relevance_score,
        quiz: QuizKey::new(questions)?,
    })
}

fn parse_explanations(raw: &str) -> Result<Vec<Explanation>, GenerationError> {
    let payload: ExplanationsPayload = serde_json::from_str(strip_fences(raw))?;
    Ok(payload
        .explanations
        .into_iter()
        .map(|e| Explanation {
            question_index: e.question_index,
            text: e.explanation.trim().to_string(),
        })
        .collect())
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const MATERIAL: &str = r#"{
        "relevance_score": 82.5,
        "is_relevant": true,
        "summary": "  **Ownership** moves values.  ",
        "quiz": [
            {"question": "Who owns a moved value?", "options": ["old", "new", "both", "none"], "correct_index": 1},
            {"question": "When is a value dropped?", "options": ["never", "scope end", "on move", "on copy"], "correct_index": 1}
        ]
    }"#;

    #[test]
    fn parses_material_into_domain_types() {
        let material = parse_material(MATERIAL, 50.0).unwrap();
        assert_eq!(material.summary, "**Ownership** moves values.");
        assert_eq!(material.relevance_score.value(), 82.5);
        assert_eq!(material.quiz.len(), 2);
        assert_eq!(material.quiz.get(1).unwrap().correct_answer(), "scope end");
    }

    #[test]
    fn accepts_fenced_json() {
        let fenced = format!("```json\n{MATERIAL}\n```");
        assert!(parse_material(&fenced, 50.0).is_ok());
    }

    #[test]
    fn refuses_low_relevance() {
        let err = parse_material(MATERIAL, 90.0).unwrap_err();
        assert!(matches!(err, GenerationError::Irrelevant { min, .. } if min == 90.0));
    }

    #[test]
    fn reports_which_question_is_broken() {
        let raw = r#"{"relevance_score": 80, "summary": "s", "quiz": [
            {"question": "ok", "options": ["a", "b"], "correct_index": 0},
            {"question": "bad", "options": ["a", "b"], "correct_index": 7}
        ]}"#;
        let err = parse_material(raw, 0.0).unwrap_err();
        match err {
            GenerationError::InvalidQuiz(QuizError::InvalidQuestion { index, .. }) => {
                assert_eq!(index, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_quiz_is_invalid() {
        let raw = r#"{"relevance_score": 80, "summary": "s", "quiz": []}"#;
        assert!(matches!(
            parse_material(raw, 0.0).unwrap_err(),
            GenerationError::InvalidQuiz(QuizError::EmptyQuiz)
        ));
    }

    #[test]
    fn parses_explanations_in_order() {
        let raw = r#"{"explanations": [
            {"question_index": 3, "explanation": " like a library card "},
            {"question_index": 1, "explanation": "like a backpack"}
        ]}"#;
        let parsed = parse_explanations(raw).unwrap();
        assert_eq!(parsed[0].question_index, 3);
        assert_eq!(parsed[0].text, "like a library card");
        assert_eq!(parsed[1].question_index, 1);
    }

    #[tokio::test]
    async fn disabled_without_config() {
        let generator = ChatContentGenerator::new(None);
        assert!(!generator.enabled());
        let err = generator
            .generate_study_material("Rust", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Disabled));
    }
}
