use std::fmt;

/// Number of difficulty levels. The policy's state and action spaces both have this size.
pub const LEVEL_COUNT: usize = DifficultyLevel::ALL.len();

/// Ordered difficulty of a quiz question.
///
/// A level is both a state of the adaptation policy and an action of it:
/// choosing action `Hard` means "ask a hard question next".
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
pub enum DifficultyLevel {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl DifficultyLevel {
    pub const ALL: [DifficultyLevel; 3] = [Self::Easy, Self::Medium, Self::Hard];

    pub fn lowest() -> Self {
        Self::ALL[0]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Value of the `difficulty` query parameter understood by the trivia API.
    pub fn as_query(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        };
        f.write_str(label)
    }
}
