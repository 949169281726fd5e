use std::sync::Arc;

use log::{info, warn};
use tokio::task::JoinHandle;

use crate::quiz::ai_helper::QuestionSource;
use crate::quiz::error::QuizError;
use crate::quiz::timer::{format_elapsed, SessionTimer};
use crate::quiz::{QuizQuestion, MIN_QUESTIONS};

type Generation = JoinHandle<Result<Vec<QuizQuestion>, QuizError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizStatus {
    NotStarted,
    Loading,
    InProgress,
    Finished,
}

enum QuizState {
    NotStarted {
        topic: String,
        last_error: Option<String>,
    },
    Loading {
        topic: String,
        request: Generation,
    },
    InProgress(ActiveSession),
    Finished(FinishedSession),
}

impl QuizState {
    fn status(&self) -> QuizStatus {
        match self {
            QuizState::NotStarted { .. } => QuizStatus::NotStarted,
            QuizState::Loading { .. } => QuizStatus::Loading,
            QuizState::InProgress(_) => QuizStatus::InProgress,
            QuizState::Finished(_) => QuizStatus::Finished,
        }
    }

    fn topic(&self) -> &str {
        match self {
            QuizState::NotStarted { topic, .. } | QuizState::Loading { topic, .. } => topic,
            QuizState::InProgress(session) => &session.topic,
            QuizState::Finished(session) => &session.topic,
        }
    }
}

/// A quiz being answered. Owns the timer, which stops when this is finished
/// or dropped.
struct ActiveSession {
    topic: String,
    questions: Arc<[QuizQuestion]>,
    current: usize,
    answers: Vec<Option<String>>,
    score: usize,
    timer: SessionTimer,
}

impl ActiveSession {
    fn new(topic: String, questions: Vec<QuizQuestion>) -> Self {
        let answers = vec![None; questions.len()];
        Self {
            topic,
            questions: questions.into(),
            current: 0,
            answers,
            score: 0,
            timer: SessionTimer::start(),
        }
    }

    fn last_index(&self) -> usize {
        self.questions.len() - 1
    }

    fn current_is_answered(&self) -> bool {
        self.answers[self.current].is_some()
    }

    fn can_finish(&self) -> bool {
        self.current == self.last_index() && self.current_is_answered()
    }

    fn finish(self) -> FinishedSession {
        FinishedSession {
            topic: self.topic,
            questions: self.questions,
            answers: self.answers,
            score: self.score,
            elapsed_seconds: self.timer.stop(),
        }
    }
}

struct FinishedSession {
    topic: String,
    questions: Arc<[QuizQuestion]>,
    answers: Vec<Option<String>>,
    score: usize,
    elapsed_seconds: u64,
}

/// One line of the summary shown once a quiz is finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewItem<'a> {
    pub question: &'a QuizQuestion,
    pub answer: Option<&'a str>,
    pub correct: bool,
}

/// Everything the presentation layer needs to render the quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizView<'a> {
    pub status: QuizStatus,
    pub topic: &'a str,
    pub question: Option<&'a QuizQuestion>,
    pub position: Option<(usize, usize)>,
    pub answer: Option<&'a str>,
    pub score: usize,
    pub elapsed: String,
    pub last_error: Option<&'a str>,
}

/// Drives one quiz attempt at a time through
/// `NotStarted -> Loading -> InProgress -> Finished`.
///
/// Every operation returns whether it was accepted. A rejected operation leaves
/// the state untouched. Generation requests only exist inside the `Loading`
/// state, so a second request can never be issued while one is in flight.
pub struct QuizController {
    source: Arc<dyn QuestionSource>,
    state: QuizState,
}

impl QuizController {
    pub fn new(source: Arc<dyn QuestionSource>) -> Self {
        Self {
            source,
            state: QuizState::NotStarted {
                topic: String::new(),
                last_error: None,
            },
        }
    }

    fn take_state(&mut self) -> QuizState {
        std::mem::replace(
            &mut self.state,
            QuizState::NotStarted {
                topic: String::new(),
                last_error: None,
            },
        )
    }

    pub fn set_topic(&mut self, new_topic: impl Into<String>) -> bool {
        match &mut self.state {
            QuizState::NotStarted { topic, .. } => {
                *topic = new_topic.into();
                true
            }
            _ => false,
        }
    }

    /// Requests questions for the current topic. Must be called from within a
    /// tokio runtime; the request runs until [`settle`](Self::settle) collects it.
    pub fn start(&mut self) -> bool {
        match self.take_state() {
            QuizState::NotStarted { topic, .. } if !topic.trim().is_empty() => {
                self.begin_loading(topic);
                true
            }
            other => {
                warn!("Start rejected in state {:?}", other.status());
                self.state = other;
                false
            }
        }
    }

    /// Requests a new question set for the topic of the finished quiz.
    pub fn restart(&mut self) -> bool {
        match self.take_state() {
            QuizState::Finished(session) => {
                self.begin_loading(session.topic);
                true
            }
            other => {
                warn!("Restart rejected in state {:?}", other.status());
                self.state = other;
                false
            }
        }
    }

    /// Leaves a finished quiz for the topic screen, where the topic can be
    /// edited again.
    pub fn reset(&mut self) -> bool {
        match self.take_state() {
            QuizState::Finished(session) => {
                self.state = QuizState::NotStarted {
                    topic: session.topic,
                    last_error: None,
                };
                true
            }
            other => {
                self.state = other;
                false
            }
        }
    }

    fn begin_loading(&mut self, topic: String) {
        info!("Requesting questions for topic {:?}", topic);
        let source = self.source.clone();
        let request_topic = topic.trim().to_string();
        let request = tokio::spawn(async move { source.generate(&request_topic).await });
        self.state = QuizState::Loading { topic, request };
    }

    /// Waits for the in-flight generation request and applies its outcome.
    /// Does nothing outside the `Loading` state.
    ///
    /// Dropping the returned future before it completes leaves the request in
    /// flight, so `settle` can simply be called again.
    pub async fn settle(&mut self) {
        let outcome = match &mut self.state {
            QuizState::Loading { request, .. } => match request.await {
                Ok(outcome) => outcome,
                Err(err) => Err(QuizError::Generation(err.to_string())),
            },
            _ => return,
        };

        let topic = self.take_state().topic().to_string();
        self.state = match outcome.and_then(check_question_count) {
            Ok(questions) => {
                info!(
                    "Quiz on {:?} started with {} questions",
                    topic,
                    questions.len()
                );
                QuizState::InProgress(ActiveSession::new(topic, questions))
            }
            Err(err) => {
                warn!("Question generation failed: {}", err);
                QuizState::NotStarted {
                    topic,
                    last_error: Some(err.user_message().to_string()),
                }
            }
        };
    }

    /// Records the answer to the current question. An already answered
    /// question keeps its first answer.
    pub fn answer(&mut self, selection: &str) -> bool {
        let QuizState::InProgress(session) = &mut self.state else {
            return false;
        };
        let question = &session.questions[session.current];
        if session.current_is_answered() || !question.options.iter().any(|o| o == selection) {
            return false;
        }

        if question.is_correct(selection) {
            session.score += 1;
        }
        session.answers[session.current] = Some(selection.to_string());
        true
    }

    pub fn next(&mut self) -> bool {
        let QuizState::InProgress(session) = &mut self.state else {
            return false;
        };
        if !session.current_is_answered() || session.current >= session.last_index() {
            return false;
        }
        session.current += 1;
        true
    }

    pub fn back(&mut self) -> bool {
        let QuizState::InProgress(session) = &mut self.state else {
            return false;
        };
        if session.current == 0 {
            return false;
        }
        session.current -= 1;
        true
    }

    pub fn finish(&mut self) -> bool {
        match self.take_state() {
            QuizState::InProgress(session) if session.can_finish() => {
                let finished = session.finish();
                info!(
                    "Quiz finished: {}/{} in {}",
                    finished.score,
                    finished.questions.len(),
                    format_elapsed(finished.elapsed_seconds)
                );
                self.state = QuizState::Finished(finished);
                true
            }
            other => {
                self.state = other;
                false
            }
        }
    }

    pub fn status(&self) -> QuizStatus {
        self.state.status()
    }

    pub fn topic(&self) -> &str {
        self.state.topic()
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        match &self.state {
            QuizState::InProgress(session) => &session.questions[..],
            QuizState::Finished(session) => &session.questions[..],
            _ => &[],
        }
    }

    pub fn answers(&self) -> &[Option<String>] {
        match &self.state {
            QuizState::InProgress(session) => &session.answers[..],
            QuizState::Finished(session) => &session.answers[..],
            _ => &[],
        }
    }

    pub fn current_question(&self) -> Option<&QuizQuestion> {
        match &self.state {
            QuizState::InProgress(session) => Some(&session.questions[session.current]),
            _ => None,
        }
    }

    /// Zero-based index of the current question and the question count.
    pub fn question_position(&self) -> Option<(usize, usize)> {
        match &self.state {
            QuizState::InProgress(session) => Some((session.current, session.questions.len())),
            _ => None,
        }
    }

    pub fn current_answer(&self) -> Option<&str> {
        match &self.state {
            QuizState::InProgress(session) => session.answers[session.current].as_deref(),
            _ => None,
        }
    }

    pub fn score(&self) -> usize {
        match &self.state {
            QuizState::InProgress(session) => session.score,
            QuizState::Finished(session) => session.score,
            _ => 0,
        }
    }

    pub fn elapsed_seconds(&self) -> u64 {
        match &self.state {
            QuizState::InProgress(session) => session.timer.elapsed_seconds(),
            QuizState::Finished(session) => session.elapsed_seconds,
            _ => 0,
        }
    }

    pub fn elapsed_display(&self) -> String {
        format_elapsed(self.elapsed_seconds())
    }

    pub fn last_error(&self) -> Option<&str> {
        match &self.state {
            QuizState::NotStarted { last_error, .. } => last_error.as_deref(),
            _ => None,
        }
    }

    pub fn review(&self) -> Vec<ReviewItem<'_>> {
        let QuizState::Finished(session) = &self.state else {
            return Vec::new();
        };
        session
            .questions
            .iter()
            .zip(&session.answers)
            .map(|(question, answer)| ReviewItem {
                question,
                answer: answer.as_deref(),
                correct: answer.as_deref().is_some_and(|a| question.is_correct(a)),
            })
            .collect()
    }

    pub fn view(&self) -> QuizView<'_> {
        QuizView {
            status: self.status(),
            topic: self.topic(),
            question: self.current_question(),
            position: self.question_position(),
            answer: self.current_answer(),
            score: self.score(),
            elapsed: self.elapsed_display(),
            last_error: self.last_error(),
        }
    }
}

fn check_question_count(questions: Vec<QuizQuestion>) -> Result<Vec<QuizQuestion>, QuizError> {
    if questions.len() < MIN_QUESTIONS {
        return Err(QuizError::InsufficientContent {
            returned: questions.len(),
            required: MIN_QUESTIONS,
        });
    }
    Ok(questions)
}
