//! Command action names
//!
//! The full command surface as a closed sum type. Wire names are the
//! SCREAMING_SNAKE strings UI surfaces put in the `action` field; an
//! unknown name fails to parse and the request is dropped by the bus.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    SaveWord,
    Translate,
    GetWordByOriginal,
    GetWordById,
    GetAllWords,
    IncreaseCount,
    ApplyReviewAction,
    GetWordsDueForReview,
    ImportWord,
    ClearAllWords,
}

impl Action {
    pub const ALL: [Action; 10] = [
        Action::SaveWord,
        Action::Translate,
        Action::GetWordByOriginal,
        Action::GetWordById,
        Action::GetAllWords,
        Action::IncreaseCount,
        Action::ApplyReviewAction,
        Action::GetWordsDueForReview,
        Action::ImportWord,
        Action::ClearAllWords,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::SaveWord => "SAVE_WORD",
            Action::Translate => "TRANSLATE",
            Action::GetWordByOriginal => "GET_WORD_BY_ORIGINAL",
            Action::GetWordById => "GET_WORD_BY_ID",
            Action::GetAllWords => "GET_ALL_WORDS",
            Action::IncreaseCount => "INCREASE_COUNT",
            Action::ApplyReviewAction => "APPLY_REVIEW_ACTION",
            Action::GetWordsDueForReview => "GET_WORDS_DUE_FOR_REVIEW",
            Action::ImportWord => "IMPORT_WORD",
            Action::ClearAllWords => "CLEAR_ALL_WORDS",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SAVE_WORD" => Ok(Action::SaveWord),
            "TRANSLATE" => Ok(Action::Translate),
            "GET_WORD_BY_ORIGINAL" => Ok(Action::GetWordByOriginal),
            "GET_WORD_BY_ID" => Ok(Action::GetWordById),
            "GET_ALL_WORDS" => Ok(Action::GetAllWords),
            "INCREASE_COUNT" => Ok(Action::IncreaseCount),
            "APPLY_REVIEW_ACTION" => Ok(Action::ApplyReviewAction),
            "GET_WORDS_DUE_FOR_REVIEW" => Ok(Action::GetWordsDueForReview),
            "IMPORT_WORD" => Ok(Action::ImportWord),
            "CLEAR_ALL_WORDS" => Ok(Action::ClearAllWords),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_roundtrip() {
        for action in Action::ALL {
            assert_eq!(action.as_str().parse::<Action>(), Ok(action));
        }
    }

    #[test]
    fn test_unknown_name_fails_to_parse() {
        assert!("OPEN_OPTIONS_PAGE".parse::<Action>().is_err());
        assert!("save_word".parse::<Action>().is_err());
        assert!("".parse::<Action>().is_err());
    }
}
