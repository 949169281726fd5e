pub mod ai_helper;
pub mod error;
pub mod session;
pub mod timer;

/// Number of answer options every generated question carries.
pub const OPTIONS_PER_QUESTION: usize = 4;

/// A session is only started with at least this many questions.
pub const MIN_QUESTIONS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    #[serde(rename = "correctAnswer")]
    pub correct_answer: String,
    pub explanation: String,
}

impl QuizQuestion {
    pub fn new(
        question: String,
        options: Vec<String>,
        correct_answer: String,
        explanation: String,
    ) -> Self {
        Self {
            question,
            options,
            correct_answer,
            explanation,
        }
    }

    pub fn is_correct(&self, answer: &str) -> bool {
        self.correct_answer == answer
    }

    /// Splits the question text on triple-backtick fences.
    ///
    /// The word right after an opening fence is taken as the language tag.
    /// A fence that is never closed runs to the end of the text.
    pub fn segments(&self) -> Vec<Segment> {
        let mut segments = Vec::new();
        let mut rest = self.question.as_str();

        while let Some(start) = rest.find("```") {
            let before = rest[..start].trim();
            if !before.is_empty() {
                segments.push(Segment::Text(before.to_string()));
            }

            let after_fence = &rest[start + 3..];
            let (header, body) = match after_fence.find('\n') {
                Some(newline) => (&after_fence[..newline], &after_fence[newline + 1..]),
                None => (after_fence, ""),
            };
            let language = Some(header.trim())
                .filter(|l| !l.is_empty() && !l.contains(char::is_whitespace))
                .map(str::to_string);
            // No language tag means the header line already belongs to the code
            let body = if language.is_none() && !header.trim().is_empty() {
                after_fence
            } else {
                body
            };

            match body.find("```") {
                Some(end) => {
                    segments.push(Segment::Code {
                        language,
                        code: body[..end].trim_end().to_string(),
                    });
                    rest = &body[end + 3..];
                }
                None => {
                    segments.push(Segment::Code {
                        language,
                        code: body.trim_end().to_string(),
                    });
                    rest = "";
                }
            }
        }

        let tail = rest.trim();
        if !tail.is_empty() {
            segments.push(Segment::Text(tail.to_string()));
        }
        segments
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Code {
        language: Option<String>,
        code: String,
    },
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub fn question(n: usize) -> QuizQuestion {
        QuizQuestion::new(
            format!("Question {}?", n + 1),
            vec![
                format!("right {}", n),
                format!("wrong a{}", n),
                format!("wrong b{}", n),
                format!("wrong c{}", n),
            ],
            format!("right {}", n),
            format!("Because {} is right", n),
        )
    }

    pub fn questions(amount: usize) -> Vec<QuizQuestion> {
        (0..amount).map(question).collect()
    }

    #[test]
    fn plain_text_is_a_single_segment() {
        let q = question(0);
        assert_eq!(q.segments(), vec![Segment::Text("Question 1?".into())]);
    }

    #[test]
    fn fenced_code_with_language_tag() {
        let mut q = question(0);
        q.question = "What does this print?\n```rust\nfn main() {\n    println!(\"hi\");\n}\n```\nPick one.".into();

        assert_eq!(
            q.segments(),
            vec![
                Segment::Text("What does this print?".into()),
                Segment::Code {
                    language: Some("rust".into()),
                    code: "fn main() {\n    println!(\"hi\");\n}".into(),
                },
                Segment::Text("Pick one.".into()),
            ]
        );
    }

    #[test]
    fn fenced_code_without_language_tag() {
        let mut q = question(0);
        q.question = "Output?\n```\nx = 1\n```".into();

        assert_eq!(
            q.segments(),
            vec![
                Segment::Text("Output?".into()),
                Segment::Code {
                    language: None,
                    code: "x = 1".into(),
                },
            ]
        );
    }

    #[test]
    fn unterminated_fence_runs_to_end() {
        let mut q = question(0);
        q.question = "Look:\n```python\nprint(1)".into();

        assert_eq!(
            q.segments(),
            vec![
                Segment::Text("Look:".into()),
                Segment::Code {
                    language: Some("python".into()),
                    code: "print(1)".into(),
                },
            ]
        );
    }

    #[test]
    fn correctness_is_exact_match() {
        let q = question(3);
        assert!(q.is_correct("right 3"));
        assert!(!q.is_correct("right 3 "));
        assert!(!q.is_correct("Right 3"));
    }
}
