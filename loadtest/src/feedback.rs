//! Random feedback submissions for `POST /api/feedback`.

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::Serialize;

/// Feedback categories accepted by the API.
pub const FEEDBACK_TYPES: [&str; 4] = ["suggestion", "feature_request", "bug_report", "other"];

const WORDS: &[&str] = &[
    "split", "expense", "group", "balance", "payment", "friend", "dinner", "trip", "receipt",
    "currency", "settle", "share", "reminder", "total", "budget", "invite", "export", "history",
    "monthly", "quickly", "screen", "button", "summary", "notification",
];

const FIRST_NAMES: &[&str] = &[
    "Alex", "Sam", "Jordan", "Taylor", "Morgan", "Riley", "Casey", "Jamie", "Avery", "Quinn",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Garcia", "Chen", "Patel", "Müller", "Okafor", "Kowalski", "Silva", "Nguyen", "Kim",
];

/// Body of a feedback submission.
#[derive(Clone, Debug, Serialize)]
pub struct Feedback {
    /// One of [`FEEDBACK_TYPES`].
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Short summary.
    pub title: String,
    /// A few sentences of text.
    pub description: String,
    /// Contact address of the submitter.
    pub email: String,
    /// Name of the submitter.
    pub name: String,
}

impl Feedback {
    /// Generates a plausible submission from `rng`.
    pub fn random(rng: &mut impl Rng) -> Self {
        let kind = FEEDBACK_TYPES.choose(rng).copied().unwrap_or("other");
        let first = FIRST_NAMES.choose(rng).copied().unwrap_or("Alex");
        let last = LAST_NAMES.choose(rng).copied().unwrap_or("Smith");

        let title = sentence(rng, 6);
        let description = (0..3)
            .map(|_| {
                let words = rng.random_range(6..=12);
                sentence(rng, words)
            })
            .collect::<Vec<_>>()
            .join(" ");
        let email = format!(
            "{}.{}{}@example.com",
            first.to_lowercase(),
            ascii_lowercase(last),
            rng.random_range(1..1000)
        );

        Self {
            kind,
            title,
            description,
            email,
            name: format!("{first} {last}"),
        }
    }
}

/// A capitalized sentence of `words` words ending with a period.
fn sentence(rng: &mut impl Rng, words: usize) -> String {
    let mut sentence = (0..words)
        .filter_map(|_| WORDS.choose(rng).copied())
        .collect::<Vec<_>>()
        .join(" ");
    if let Some(first) = sentence.get_mut(..1) {
        first.make_ascii_uppercase();
    }
    sentence.push('.');
    sentence
}

fn ascii_lowercase(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
