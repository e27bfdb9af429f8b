pub mod difficulty;
pub mod error;
pub mod policy;
pub mod session;
pub mod trivia;

use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Question {
    pub text: String,
    pub answers: Vec<Answer>,
}
impl Question {
    pub fn new(text: String, answers: Vec<Answer>) -> Self {
        Self { text, answers }
    }

    /// Builds a multiple-choice question with the correct answer at a random position.
    pub fn shuffled<R: Rng>(
        text: String,
        correct_answer: String,
        incorrect_answers: Vec<String>,
        rng: &mut R,
    ) -> Self {
        let mut answers = incorrect_answers
            .into_iter()
            .map(|a| Answer::new(a, false))
            .collect::<Vec<_>>();
        answers.push(Answer::new(correct_answer, true));
        // We shuffle the answers so the correct one isn't always the last one
        answers.shuffle(rng);

        Self::new(text, answers)
    }

    pub fn correct_answer(&self) -> Option<&Answer> {
        self.answers.iter().find(|a| a.is_correct)
    }

    pub fn options(&self) -> impl Iterator<Item = &str> {
        self.answers.iter().map(|a| a.text.as_str())
    }

    pub fn has_option(&self, choice: &str) -> bool {
        self.options().any(|option| option == choice)
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Answer {
    pub text: String,
    pub is_correct: bool,
}
impl Answer {
    pub fn new(text: String, is_correct: bool) -> Self {
        Self { text, is_correct }
    }
}

/// Trivia genres offered to the player, with their Open Trivia DB ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Category {
    #[default]
    GeneralKnowledge,
    ScienceAndNature,
    Sports,
    History,
    Geography,
    Film,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Self::GeneralKnowledge,
        Self::ScienceAndNature,
        Self::Sports,
        Self::History,
        Self::Geography,
        Self::Film,
    ];

    pub fn id(self) -> u32 {
        match self {
            Self::GeneralKnowledge => 9,
            Self::ScienceAndNature => 17,
            Self::Sports => 21,
            Self::History => 23,
            Self::Geography => 22,
            Self::Film => 11,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::GeneralKnowledge => "General Knowledge",
            Self::ScienceAndNature => "Science & Nature",
            Self::Sports => "Sports",
            Self::History => "History",
            Self::Geography => "Geography",
            Self::Film => "Entertainment: Film",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
