use log::debug;
use tokio::io::{stdin, AsyncBufReadExt, BufReader};

use crate::quiz::session::{QuizController, QuizStatus, QuizView};
use crate::quiz::{QuizQuestion, Segment};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Topic(String),
    Start,
    Answer(usize),
    Next,
    Back,
    Finish,
    Restart,
    NewTopic,
    Quit,
    Unknown(String),
}

/// Interprets one input line for the screen the quiz is currently on.
pub fn parse_command(status: QuizStatus, line: &str) -> Command {
    let line = line.trim();
    match status {
        QuizStatus::NotStarted => match line {
            ":q" => Command::Quit,
            "" => Command::Start,
            topic => Command::Topic(topic.to_string()),
        },
        QuizStatus::InProgress => match line.to_ascii_lowercase().as_str() {
            "n" => Command::Next,
            "b" => Command::Back,
            "f" => Command::Finish,
            "q" => Command::Quit,
            other => match other.parse::<usize>() {
                Ok(choice) if choice > 0 => Command::Answer(choice - 1),
                _ => Command::Unknown(line.to_string()),
            },
        },
        QuizStatus::Finished => match line.to_ascii_lowercase().as_str() {
            "r" => Command::Restart,
            "t" => Command::NewTopic,
            "q" => Command::Quit,
            _ => Command::Unknown(line.to_string()),
        },
        QuizStatus::Loading => Command::Unknown(line.to_string()),
    }
}

/// Runs the quiz on stdin/stdout until the user quits or input ends.
pub async fn run(quiz: &mut QuizController) -> std::io::Result<()> {
    let mut lines = BufReader::new(stdin()).lines();

    loop {
        if quiz.status() == QuizStatus::Loading {
            println!("Generating questions about \"{}\"...", quiz.topic().trim());
            quiz.settle().await;
            continue;
        }

        println!("{}", render(quiz));

        let Some(line) = lines.next_line().await? else {
            return Ok(());
        };
        let command = parse_command(quiz.status(), &line);
        debug!("Command: {:?}", command);

        if command == Command::Quit {
            return Ok(());
        }
        if let Some(problem) = apply(quiz, command) {
            println!("{}", problem);
        }
    }
}

/// Applies a command, returning a message when it was not accepted.
pub fn apply(quiz: &mut QuizController, command: Command) -> Option<String> {
    let accepted = match command {
        Command::Topic(topic) => quiz.set_topic(topic) && quiz.start(),
        Command::Start => {
            if quiz.topic().trim().is_empty() {
                return Some("Please enter a topic first.".to_string());
            }
            quiz.start()
        }
        Command::Answer(index) => {
            let Some(option) = quiz
                .current_question()
                .and_then(|q| q.options.get(index))
                .cloned()
            else {
                return Some("There is no such option.".to_string());
            };
            if quiz.current_answer().is_some() {
                return Some("This question is already answered.".to_string());
            }
            quiz.answer(&option)
        }
        Command::Next => {
            let accepted = quiz.next();
            if !accepted && quiz.current_answer().is_none() {
                return Some("Answer the question before moving on.".to_string());
            }
            accepted
        }
        Command::Back => quiz.back(),
        Command::Finish => quiz.finish(),
        Command::Restart => quiz.restart(),
        Command::NewTopic => quiz.reset(),
        Command::Quit => true,
        Command::Unknown(input) => return Some(format!("Unknown command: {:?}", input)),
    };
    (!accepted).then(|| "That is not possible right now.".to_string())
}

/// Renders the current screen.
pub fn render(quiz: &QuizController) -> String {
    let view = quiz.view();
    match view.status {
        QuizStatus::NotStarted => render_topic_screen(&view),
        QuizStatus::Loading => format!("Generating questions about \"{}\"...", view.topic),
        QuizStatus::InProgress => render_question_screen(&view),
        QuizStatus::Finished => render_summary(quiz),
    }
}

fn render_topic_screen(view: &QuizView<'_>) -> String {
    let mut out = String::new();
    if let Some(error) = view.last_error {
        out.push_str(&format!("⚠ {}\n", error));
    }
    if view.topic.trim().is_empty() {
        out.push_str("Enter a quiz topic (:q to quit):");
    } else {
        out.push_str(&format!(
            "Topic: {}\nPress Enter to start, type a new topic, or :q to quit:",
            view.topic
        ));
    }
    out
}

fn render_question_screen(view: &QuizView<'_>) -> String {
    let (Some(question), Some((index, total))) = (view.question, view.position) else {
        return String::new();
    };

    let mut out = format!(
        "\nQuestion {}/{}    Score: {}    Time: {}\n\n",
        index + 1,
        total,
        view.score,
        view.elapsed
    );
    out.push_str(&render_question_text(question));
    out.push('\n');

    for (i, option) in question.options.iter().enumerate() {
        let marker = match view.answer {
            Some(answer) if answer == option && question.is_correct(answer) => "✔",
            Some(answer) if answer == option => "✘",
            Some(_) if question.is_correct(option) => "✔",
            _ => " ",
        };
        out.push_str(&format!("{} {}. {}\n", marker, i + 1, option));
    }

    match view.answer {
        None => out.push_str("\nChoose 1-4"),
        Some(answer) => {
            if question.is_correct(answer) {
                out.push_str("\nCorrect!\n");
            } else {
                out.push_str(&format!(
                    "\nIncorrect. The answer is: {}\n",
                    question.correct_answer
                ));
            }
            if !question.explanation.is_empty() {
                out.push_str(&format!("{}\n", question.explanation));
            }
            if index + 1 < total {
                out.push_str("\nn: next");
            } else {
                out.push_str("\nf: finish");
            }
        }
    }
    if index > 0 {
        out.push_str(", b: back");
    }
    out.push_str(", q: quit");
    out
}

fn render_question_text(question: &QuizQuestion) -> String {
    let mut out = String::new();
    for segment in question.segments() {
        match segment {
            Segment::Text(text) => {
                out.push_str(&text);
                out.push('\n');
            }
            Segment::Code { language, code } => {
                if let Some(language) = language {
                    out.push_str(&format!("  [{}]\n", language));
                }
                for line in code.lines() {
                    out.push_str("    ");
                    out.push_str(line);
                    out.push('\n');
                }
            }
        }
    }
    out
}

fn render_summary(quiz: &QuizController) -> String {
    let review = quiz.review();
    let mut out = format!(
        "\nQuiz finished! Score: {}/{}    Time: {}\n\n",
        quiz.score(),
        quiz.questions().len(),
        quiz.elapsed_display()
    );
    for (i, item) in review.iter().enumerate() {
        let mark = if item.correct { "✔" } else { "✘" };
        out.push_str(&format!(
            "{} {}. {}\n",
            mark,
            i + 1,
            first_line(&item.question.question)
        ));
        if !item.correct {
            out.push_str(&format!(
                "     your answer: {}, correct: {}\n",
                item.answer.unwrap_or("-"),
                item.question.correct_answer
            ));
        }
    }
    out.push_str("\nr: restart with new questions, t: new topic, q: quit");
    out
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or(text)
}
