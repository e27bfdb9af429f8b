use std::sync::Arc;

use log::{debug, warn};

use super::difficulty::DifficultyLevel;
use super::error::QuizError;
use super::policy::QTable;
use super::trivia::QuestionSource;
use super::{Category, Question};

/// Progress of one player through a quiz.
///
/// Fields are private: the [`Controller`] is the only way to change them.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SessionState {
    difficulty: DifficultyLevel,
    score: u32,
    questions: u32,
    category: Category,
    current_question: Option<Question>,
}

impl SessionState {
    pub fn difficulty(&self) -> DifficultyLevel {
        self.difficulty
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn questions(&self) -> u32 {
        self.questions
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.current_question.as_ref()
    }
}

/// What happened when an answer was recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub was_correct: bool,
    pub correct_answer: String,
    pub next_difficulty: DifficultyLevel,
}

/// What the player should see after a turn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Prompt<'a> {
    Question(&'a Question),
    /// The provider had nothing to hand out; the next message tries again.
    Unavailable,
    Complete { score: u32, max_questions: u32 },
}

/// Picks the next difficulty after every answer using a pre-trained [`QTable`].
///
/// The table is never updated here, so one controller can serve any number of
/// sessions at once.
#[derive(Debug, Clone)]
pub struct Controller {
    table: Arc<QTable>,
    max_questions: u32,
}

impl Controller {
    pub fn new(table: Arc<QTable>, max_questions: u32) -> Self {
        Self {
            table,
            max_questions,
        }
    }

    pub fn initialize_session(&self, category: Category) -> SessionState {
        SessionState {
            difficulty: DifficultyLevel::lowest(),
            score: 0,
            questions: 0,
            category,
            current_question: None,
        }
    }

    /// Switches genre. Progress is kept, only the pending question is dropped.
    ///
    /// Returns `false` when `category` is the one already in use.
    pub fn on_category_change(&self, session: &mut SessionState, category: Category) -> bool {
        if session.category == category {
            return false;
        }
        session.category = category;
        session.current_question = None;
        true
    }

    /// Scores `choice` against the pending question and moves to the next difficulty.
    ///
    /// The next difficulty comes from the policy alone, whatever the answer was.
    /// On error the session is left exactly as it was.
    pub fn record_answer(
        &self,
        session: &mut SessionState,
        choice: Option<&str>,
    ) -> Result<AnswerOutcome, QuizError> {
        if self.is_complete(session) {
            return Err(QuizError::SessionComplete);
        }
        let question = session
            .current_question
            .as_ref()
            .ok_or(QuizError::NoActiveQuestion)?;
        let choice = match choice {
            Some(choice) if !choice.is_empty() && question.has_option(choice) => choice,
            _ => return Err(QuizError::InvalidSelection),
        };

        let correct_answer = question
            .correct_answer()
            .map(|a| a.text.clone())
            .unwrap_or_default();
        let was_correct = choice == correct_answer;

        session.questions += 1;
        if was_correct {
            session.score += 1;
        }

        let next_difficulty = self.table.best_action(session.difficulty);
        debug!(
            "Answer {} at {}; moving to {}",
            if was_correct { "correct" } else { "wrong" },
            session.difficulty,
            next_difficulty
        );
        session.difficulty = next_difficulty;
        session.current_question = None;

        Ok(AnswerOutcome {
            was_correct,
            correct_answer,
            next_difficulty,
        })
    }

    pub fn is_complete(&self, session: &SessionState) -> bool {
        session.questions >= self.max_questions
    }

    /// A complete session always shows its final score, whatever else is pending.
    pub fn next_prompt<'a>(&self, session: &'a SessionState) -> Prompt<'a> {
        if self.is_complete(session) {
            return Prompt::Complete {
                score: session.score,
                max_questions: self.max_questions,
            };
        }
        match session.current_question.as_ref() {
            Some(question) => Prompt::Question(question),
            None => Prompt::Unavailable,
        }
    }

    pub fn reset(&self, session: &mut SessionState) {
        *session = self.initialize_session(session.category);
    }

    /// Fetches a question for the session's difficulty and genre if none is pending.
    ///
    /// A provider failure leaves the session without a question; the next call
    /// tries again.
    pub async fn refresh_question(&self, session: &mut SessionState, source: &dyn QuestionSource) {
        if session.current_question.is_some() || self.is_complete(session) {
            return;
        }
        match source
            .fetch_question(session.difficulty, session.category)
            .await
        {
            Ok(question) => session.current_question = Some(question),
            Err(err) => {
                warn!(
                    "No {} question available in {}: {}",
                    session.difficulty, session.category, err
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::error::TriviaError;
    use crate::quiz::Answer;
    use async_trait::async_trait;
    use std::sync::Mutex;

    const MAX_QUESTIONS: u32 = 20;

    // Easy -> Medium, Medium -> Hard, Hard -> Easy (tied with Hard)
    fn table() -> Arc<QTable> {
        Arc::new(QTable::from_rows([
            [0.1, 0.5, 0.2],
            [0.0, 0.1, 0.4],
            [0.3, 0.1, 0.3],
        ]))
    }

    fn controller() -> Controller {
        Controller::new(table(), MAX_QUESTIONS)
    }

    fn question() -> Question {
        Question::new(
            "2 + 2?".to_string(),
            vec![
                Answer::new("3".to_string(), false),
                Answer::new("4".to_string(), true),
                Answer::new("5".to_string(), false),
            ],
        )
    }

    fn with_question(mut session: SessionState) -> SessionState {
        session.current_question = Some(question());
        session
    }

    #[test]
    fn new_session_starts_at_lowest_difficulty() {
        let session = controller().initialize_session(Category::ScienceAndNature);

        assert_eq!(session.difficulty(), DifficultyLevel::Easy);
        assert_eq!(session.score(), 0);
        assert_eq!(session.questions(), 0);
        assert_eq!(session.category(), Category::ScienceAndNature);
        assert!(session.current_question().is_none());
    }

    #[test]
    fn answer_follows_policy_and_clears_question() {
        let controller = controller();
        let mut session = with_question(controller.initialize_session(Category::Sports));

        let outcome = controller.record_answer(&mut session, Some("4")).unwrap();

        assert!(outcome.was_correct);
        assert_eq!(outcome.correct_answer, "4");
        assert_eq!(outcome.next_difficulty, DifficultyLevel::Medium);
        assert_eq!(session.difficulty(), DifficultyLevel::Medium);
        assert_eq!((session.score(), session.questions()), (1, 1));
        assert!(session.current_question().is_none());
    }

    #[test]
    fn next_difficulty_ignores_correctness() {
        let controller = controller();
        for prior in DifficultyLevel::ALL {
            let mut right = with_question(controller.initialize_session(Category::History));
            right.difficulty = prior;
            let mut wrong = right.clone();

            let right_outcome = controller.record_answer(&mut right, Some("4")).unwrap();
            let wrong_outcome = controller.record_answer(&mut wrong, Some("5")).unwrap();

            assert!(right_outcome.was_correct);
            assert!(!wrong_outcome.was_correct);
            assert_eq!(right.difficulty(), wrong.difficulty());
            assert_eq!(right.difficulty(), table().best_action(prior));
        }
    }

    #[test]
    fn tie_in_policy_row_moves_to_lower_level() {
        let controller = controller();
        let mut session = with_question(controller.initialize_session(Category::History));
        session.difficulty = DifficultyLevel::Hard;

        controller.record_answer(&mut session, Some("3")).unwrap();
        assert_eq!(session.difficulty(), DifficultyLevel::Easy);
    }

    #[test]
    fn missing_selection_leaves_session_untouched() {
        let controller = controller();
        let session = with_question(controller.initialize_session(Category::Geography));

        for choice in [None, Some(""), Some("not an option")] {
            let mut attempt = session.clone();
            let err = controller.record_answer(&mut attempt, choice).unwrap_err();
            assert_eq!(err, QuizError::InvalidSelection);
            assert_eq!(attempt, session);
        }
    }

    #[test]
    fn answer_without_question_is_rejected() {
        let controller = controller();
        let mut session = controller.initialize_session(Category::Film);
        let before = session.clone();

        let err = controller.record_answer(&mut session, Some("4")).unwrap_err();
        assert_eq!(err, QuizError::NoActiveQuestion);
        assert_eq!(session, before);
    }

    #[test]
    fn session_completes_after_max_questions() {
        let controller = controller();
        let mut session = controller.initialize_session(Category::GeneralKnowledge);

        for i in 0..MAX_QUESTIONS {
            assert!(!controller.is_complete(&session));
            session.current_question = Some(question());
            let choice = if i % 3 == 0 { "4" } else { "3" };
            controller.record_answer(&mut session, Some(choice)).unwrap();

            assert!(session.score() <= session.questions());
            assert!(session.questions() <= MAX_QUESTIONS);
        }

        assert!(controller.is_complete(&session));
        assert_eq!(session.questions(), MAX_QUESTIONS);
        assert_eq!(session.score(), 7);

        session.current_question = Some(question());
        let before = session.clone();
        let err = controller.record_answer(&mut session, Some("4")).unwrap_err();
        assert_eq!(err, QuizError::SessionComplete);
        assert_eq!(session, before);
    }

    #[test]
    fn reset_returns_to_initial_values() {
        let controller = controller();
        let mut session = with_question(controller.initialize_session(Category::Sports));
        controller.record_answer(&mut session, Some("4")).unwrap();
        session.current_question = Some(question());

        controller.reset(&mut session);

        assert_eq!(session, controller.initialize_session(Category::Sports));
    }

    #[test]
    fn category_change_keeps_progress() {
        let controller = controller();
        let mut session = with_question(controller.initialize_session(Category::Sports));
        controller.record_answer(&mut session, Some("4")).unwrap();
        session.current_question = Some(question());

        let unchanged = session.clone();
        assert!(!controller.on_category_change(&mut session, Category::Sports));
        assert_eq!(session, unchanged);

        assert!(controller.on_category_change(&mut session, Category::History));
        assert_eq!(session.category(), Category::History);
        assert!(session.current_question().is_none());
        assert_eq!(session.score(), unchanged.score());
        assert_eq!(session.questions(), unchanged.questions());
        assert_eq!(session.difficulty(), unchanged.difficulty());
    }

    #[test]
    fn prompt_reflects_question_availability() {
        let controller = controller();
        let mut session = controller.initialize_session(Category::Sports);
        assert_eq!(controller.next_prompt(&session), Prompt::Unavailable);

        session.current_question = Some(question());
        assert_eq!(controller.next_prompt(&session), Prompt::Question(&question()));
    }

    #[tokio::test]
    async fn finished_session_keeps_showing_score_after_genre_change() {
        let controller = Controller::new(table(), 1);
        let source = StubSource::new(true);
        let mut session = with_question(controller.initialize_session(Category::Sports));
        controller.record_answer(&mut session, Some("4")).unwrap();

        assert!(controller.on_category_change(&mut session, Category::Film));
        controller.refresh_question(&mut session, &source).await;

        assert!(source.requests.lock().unwrap().is_empty());
        assert!(session.current_question().is_none());
        assert_eq!(
            controller.next_prompt(&session),
            Prompt::Complete {
                score: 1,
                max_questions: 1
            }
        );
    }

    struct StubSource {
        available: bool,
        requests: Mutex<Vec<(DifficultyLevel, Category)>>,
    }

    impl StubSource {
        fn new(available: bool) -> Self {
            Self {
                available,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl QuestionSource for StubSource {
        async fn fetch_question(
            &self,
            difficulty: DifficultyLevel,
            category: Category,
        ) -> Result<Question, TriviaError> {
            self.requests.lock().unwrap().push((difficulty, category));
            if self.available {
                Ok(question())
            } else {
                Err(TriviaError::Empty)
            }
        }
    }

    #[tokio::test]
    async fn refresh_fetches_for_current_difficulty_and_category() {
        let controller = controller();
        let source = StubSource::new(true);
        let mut session = controller.initialize_session(Category::Geography);

        controller.refresh_question(&mut session, &source).await;
        assert_eq!(session.current_question(), Some(&question()));

        // A pending question is not replaced
        controller.refresh_question(&mut session, &source).await;
        assert_eq!(
            *source.requests.lock().unwrap(),
            vec![(DifficultyLevel::Easy, Category::Geography)]
        );
    }

    #[tokio::test]
    async fn unavailable_content_leaves_no_question() {
        let controller = controller();
        let source = StubSource::new(false);
        let mut session = controller.initialize_session(Category::Film);

        controller.refresh_question(&mut session, &source).await;
        assert!(session.current_question().is_none());
        assert_eq!(session.questions(), 0);
    }
}
