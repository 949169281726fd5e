mod config;
mod quiz;
mod terminal;

use std::sync::Arc;

use chatgpt::{client::ChatGPT, config::ModelConfigurationBuilder};
use config::Config;
use dotenv::dotenv;
use log::warn;
use quiz::{
    ai_helper::{QuestionSource, QuizHelper, UnconfiguredSource},
    session::QuizController,
};

type MainResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[tokio::main]
async fn main() -> MainResult {
    // A missing .env file is fine, the environment may already be set
    let _ = dotenv();

    pretty_env_logger::init();
    log::info!("Starting topic quiz...");

    let config = Config::from_env()?;
    let source = build_source(&config);

    let mut quiz = QuizController::new(source);
    if let Some(topic) = std::env::args().nth(1) {
        quiz.set_topic(topic);
    }

    terminal::run(&mut quiz).await?;
    log::info!("Bye!");
    Ok(())
}

fn build_source(config: &Config) -> Arc<dyn QuestionSource> {
    let api_key = match config.api_key() {
        Ok(api_key) => api_key,
        Err(err) => {
            warn!("Questions cannot be generated: {}", err);
            return Arc::new(UnconfiguredSource::new(err.to_string()));
        }
    };

    let gpt = ModelConfigurationBuilder::default()
        .engine(config.model.engine())
        .timeout(config.request_timeout)
        .build()
        .map_err(|err| err.to_string())
        .and_then(|model_config| {
            ChatGPT::new_with_config(api_key, model_config).map_err(|err| err.to_string())
        });

    match gpt {
        Ok(gpt) => Arc::new(QuizHelper::new(
            gpt,
            config.question_count,
            config.shuffle_options,
        )),
        Err(reason) => {
            warn!("Unable to set up ChatGPT: {}", reason);
            Arc::new(UnconfiguredSource::new(reason))
        }
    }
}
