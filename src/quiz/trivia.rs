use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use rand::Rng;

use super::difficulty::DifficultyLevel;
use super::error::TriviaError;
use super::{Category, Question};

pub const DEFAULT_API_URL: &str = "https://opentdb.com/api.php";

/// Anything that can hand out a multiple-choice question for a difficulty and genre.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    async fn fetch_question(
        &self,
        difficulty: DifficultyLevel,
        category: Category,
    ) -> Result<Question, TriviaError>;
}

/// Client for the Open Trivia DB question API.
pub struct OpenTriviaDb {
    client: reqwest::Client,
    base_url: String,
}

impl OpenTriviaDb {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TriviaError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl QuestionSource for OpenTriviaDb {
    async fn fetch_question(
        &self,
        difficulty: DifficultyLevel,
        category: Category,
    ) -> Result<Question, TriviaError> {
        let category_id = category.id().to_string();
        debug!(
            "Fetching a {} question in {} from {}",
            difficulty.as_query(),
            category,
            self.base_url
        );

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("amount", "1"),
                ("difficulty", difficulty.as_query()),
                ("category", category_id.as_str()),
                ("type", "multiple"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TriviaError::HttpStatus(response.status()));
        }

        let payload: TriviaResponse = response.json().await?;
        question_from_response(payload, &mut rand::thread_rng())
    }
}

#[derive(Debug, serde::Deserialize)]
struct TriviaResponse {
    response_code: u8,
    #[serde(default)]
    results: Vec<TriviaResult>,
}

#[derive(Debug, serde::Deserialize)]
struct TriviaResult {
    question: String,
    correct_answer: String,
    incorrect_answers: Vec<String>,
}

fn question_from_response<R: Rng>(
    payload: TriviaResponse,
    rng: &mut R,
) -> Result<Question, TriviaError> {
    if payload.response_code != 0 {
        return Err(TriviaError::ResponseCode(payload.response_code));
    }
    let result = payload.results.into_iter().next().ok_or(TriviaError::Empty)?;

    // The provider HTML-encodes every text field
    Ok(Question::shuffled(
        unescape(&result.question),
        unescape(&result.correct_answer),
        result.incorrect_answers.iter().map(|a| unescape(a)).collect(),
        rng,
    ))
}

fn unescape(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}
