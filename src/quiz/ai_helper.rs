use crate::quiz::error::QuizError;
use crate::quiz::{QuizQuestion, OPTIONS_PER_QUESTION};
use async_trait::async_trait;
use chatgpt::prelude::*;
use chatgpt::types::CompletionResponse;
use log::{debug, info};
use rand::seq::SliceRandom;

/// Produces a validated set of questions for a topic, or fails.
///
/// Implementations never return partially valid lists. They do not enforce the
/// minimum question count, the session controller does.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    async fn generate(&self, topic: &str) -> std::result::Result<Vec<QuizQuestion>, QuizError>;
}

pub struct QuizHelper {
    chat_gpt: ChatGPT,
    question_count: usize,
    shuffle_options: bool,
}

impl QuizHelper {
    pub fn new(chat_gpt: ChatGPT, question_count: usize, shuffle_options: bool) -> Self {
        Self {
            chat_gpt,
            question_count,
            shuffle_options,
        }
    }

    fn build_prompt(&self, topic: &str) -> String {
        format!(
            "You are a quiz generator. Create exactly {count} multiple-choice questions about \"{topic}\".
        Each question has exactly {options} distinct answer options and exactly one of them is correct.
        When a question refers to code, put the code inside the question text as a fenced block (```language).
        Reply with a single JSON object and nothing else, in this shape:
        {{\"questions\": [{{\"question\": \"...\", \"options\": [\"...\", \"...\", \"...\", \"...\"], \"correctAnswer\": \"...\", \"explanation\": \"...\"}}]}}
        The value of \"correctAnswer\" must be copied exactly from \"options\". The explanation says briefly why the answer is correct.",
            count = self.question_count,
            topic = topic,
            options = OPTIONS_PER_QUESTION,
        )
    }
}

#[async_trait]
impl QuestionSource for QuizHelper {
    async fn generate(&self, topic: &str) -> std::result::Result<Vec<QuizQuestion>, QuizError> {
        info!(
            "Generating {} questions for topic: {:?}",
            self.question_count, topic
        );
        let prompt = self.build_prompt(topic);

        let response: CompletionResponse = self.chat_gpt.send_message(&prompt).await?;
        let content = response.message().clone().content;

        debug!("Completion: {:?}", content);

        let mut questions = parse_questions(&content)?;
        if self.shuffle_options {
            shuffle_options(&mut questions);
        }

        info!("Received {} valid questions", questions.len());
        Ok(questions)
    }
}

/// Stands in for the ChatGPT source when no credentials are available, so the
/// program still starts and reports the problem on every attempt.
pub struct UnconfiguredSource {
    reason: String,
}

impl UnconfiguredSource {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl QuestionSource for UnconfiguredSource {
    async fn generate(&self, _topic: &str) -> std::result::Result<Vec<QuizQuestion>, QuizError> {
        Err(QuizError::Configuration(self.reason.clone()))
    }
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum QuizResponse {
    Wrapped { questions: Vec<QuizQuestion> },
    Bare(Vec<QuizQuestion>),
}

/// Parses and validates a completion into questions.
///
/// The JSON may be wrapped in prose or a ```json fence. The outermost object
/// is tried first, then the outermost array.
pub fn parse_questions(content: &str) -> std::result::Result<Vec<QuizQuestion>, QuizError> {
    let questions = parse_response(content)?;

    for (i, question) in questions.iter().enumerate() {
        validate(question).map_err(|problem| {
            QuizError::MalformedResponse(format!("question {}: {}", i + 1, problem))
        })?;
    }
    Ok(questions)
}

fn parse_response(content: &str) -> std::result::Result<Vec<QuizQuestion>, QuizError> {
    let mut last_error = None;
    for json in [span(content, '{', '}'), span(content, '[', ']')]
        .into_iter()
        .flatten()
    {
        match serde_json::from_str::<QuizResponse>(json) {
            Ok(QuizResponse::Wrapped { questions } | QuizResponse::Bare(questions)) => {
                return Ok(questions)
            }
            Err(err) => last_error = Some(QuizError::from(err)),
        }
    }
    Err(last_error.unwrap_or_else(|| {
        QuizError::MalformedResponse("no JSON found in the completion".to_string())
    }))
}

fn span(content: &str, open: char, close: char) -> Option<&str> {
    let start = content.find(open)?;
    let end = content.rfind(close)?;
    (start < end).then(|| &content[start..=end])
}

fn validate(question: &QuizQuestion) -> std::result::Result<(), String> {
    if question.question.trim().is_empty() {
        return Err("question text is empty".to_string());
    }
    if question.options.len() != OPTIONS_PER_QUESTION {
        return Err(format!(
            "expected {} options, got {}",
            OPTIONS_PER_QUESTION,
            question.options.len()
        ));
    }
    if question.options.iter().any(|o| o.trim().is_empty()) {
        return Err("an option is empty".to_string());
    }
    for (i, option) in question.options.iter().enumerate() {
        if question.options[i + 1..].contains(option) {
            return Err(format!("option {:?} appears twice", option));
        }
    }
    if !question.options.contains(&question.correct_answer) {
        return Err(format!(
            "correct answer {:?} is not one of the options",
            question.correct_answer
        ));
    }
    Ok(())
}

fn shuffle_options(questions: &mut [QuizQuestion]) {
    let mut rng = rand::thread_rng();
    for question in questions {
        question.options.shuffle(&mut rng);
    }
}
