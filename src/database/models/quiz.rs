//! Quiz question model.

use serde::{Deserialize, Serialize};

/// Allowed number of answer options.
pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 6;

/// A multiple-choice question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub quiz_id: i64,
    pub question: String,
    pub options: Vec<String>,
    /// Index of the correct option.
    pub answer: i32,
    pub reward: i64,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Quiz {
    /// Build a quiz, rejecting malformed option lists.
    pub fn new(quiz_id: i64, question: String, options: Vec<String>, answer: i32, reward: i64) -> Option<Self> {
        let options: Vec<String> = options
            .into_iter()
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        let valid = !question.trim().is_empty()
            && (MIN_OPTIONS..=MAX_OPTIONS).contains(&options.len())
            && answer >= 0
            && (answer as usize) < options.len()
            && reward >= 0;

        valid.then(|| Self {
            quiz_id,
            question: question.trim().to_string(),
            options,
            answer,
            reward,
            active: true,
        })
    }

    pub fn is_correct(&self, option: usize) -> bool {
        self.answer >= 0 && option == self.answer as usize
    }

    pub fn correct_option(&self) -> Option<&str> {
        usize::try_from(self.answer)
            .ok()
            .and_then(|i| self.options.get(i))
            .map(String::as_str)
    }
}

/// Built-in questions seeded into an empty collection.
pub fn default_quizzes() -> Vec<(&'static str, Vec<&'static str>, i32)> {
    vec![
        ("Ibukota Indonesia adalah...", vec!["Bandung", "Jakarta", "Surabaya", "Medan"], 1),
        ("Berapa hasil 7 × 8?", vec!["54", "56", "58", "64"], 1),
        ("Planet terbesar di tata surya adalah...", vec!["Mars", "Saturnus", "Jupiter", "Bumi"], 2),
        ("Hari Kemerdekaan Indonesia diperingati setiap tanggal...", vec!["17 Agustus", "1 Juni", "28 Oktober", "10 November"], 0),
        ("Hewan yang dikenal sebagai kapal padang pasir adalah...", vec!["Kuda", "Gajah", "Unta", "Sapi"], 2),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_new_validates() {
        assert!(Quiz::new(1, "Q?".into(), opts(&["a", "b"]), 1, 10).is_some());
        assert!(Quiz::new(1, "Q?".into(), opts(&["a"]), 0, 10).is_none());
        assert!(Quiz::new(1, "Q?".into(), opts(&["a", "b"]), 2, 10).is_none());
        assert!(Quiz::new(1, " ".into(), opts(&["a", "b"]), 0, 10).is_none());
        assert!(Quiz::new(1, "Q?".into(), opts(&["a", " ", "b"]), 1, 10).is_some());
    }

    #[test]
    fn test_answer_checks() {
        let quiz = Quiz::new(1, "Q?".into(), opts(&["a", "b", "c"]), 2, 10).unwrap();
        assert!(quiz.is_correct(2));
        assert!(!quiz.is_correct(0));
        assert_eq!(quiz.correct_option(), Some("c"));
    }

    #[test]
    fn test_defaults_are_valid() {
        for (question, options, answer) in default_quizzes() {
            let options = options.into_iter().map(String::from).collect();
            assert!(Quiz::new(0, question.to_string(), options, answer, 15).is_some());
        }
    }
}
