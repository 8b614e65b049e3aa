//! Built-in question bank used by the `seed` binary and the app's `seed` command.

use quiz_core::model::{Question, Subject};

use crate::repository::{QuestionRepository, StorageError};

type Raw = (&'static str, &'static [&'static str], usize);

const GENERAL: &[Raw] = &[
    ("Which planet is known as the Red Planet?", &["Venus", "Mars", "Jupiter", "Mercury"], 1),
    ("How many continents are there?", &["5", "6", "7", "8"], 2),
    ("What is the largest ocean on Earth?", &["Atlantic", "Indian", "Arctic", "Pacific"], 3),
    ("Which gas do plants absorb from the air?", &["Carbon dioxide", "Oxygen", "Nitrogen", "Helium"], 0),
    ("What is the capital of Japan?", &["Osaka", "Kyoto", "Tokyo", "Nagoya"], 2),
];

const MATH: &[Raw] = &[
    ("What is 7 x 8?", &["54", "56", "58", "64"], 1),
    ("What is the square root of 81?", &["7", "8", "9", "10"], 2),
    ("What is 15% of 200?", &["30", "15", "20", "35"], 0),
    ("Which of these is a prime number?", &["21", "27", "29", "33"], 2),
    ("What is 2 to the power of 5?", &["16", "25", "32", "64"], 2),
];

const SCIENCE: &[Raw] = &[
    ("What is the chemical symbol for gold?", &["Ag", "Au", "Gd", "Go"], 1),
    ("What part of the cell holds its genetic material?", &["Nucleus", "Ribosome", "Membrane", "Vacuole"], 0),
    ("At what temperature does water boil at sea level?", &["90 C", "100 C", "110 C", "120 C"], 1),
    ("Which particle carries a negative charge?", &["Proton", "Neutron", "Electron", "Photon"], 2),
    ("What force keeps planets in orbit?", &["Magnetism", "Friction", "Gravity", "Tension"], 2),
];

fn build(raw: &[Raw]) -> Result<Vec<Question>, quiz_core::Error> {
    raw.iter()
        .map(|(prompt, options, correct)| {
            let options = options.iter().map(|o| (*o).to_owned()).collect();
            Question::new(*prompt, options, *correct).map_err(Into::into)
        })
        .collect()
}

/// Every built-in subject with its questions.
///
/// # Errors
///
/// Returns `quiz_core::Error` if a built-in entry fails validation.
pub fn sample_bank() -> Result<Vec<(Subject, Vec<Question>)>, quiz_core::Error> {
    [("General", GENERAL), ("Math", MATH), ("Science", SCIENCE)]
        .into_iter()
        .map(|(name, raw)| Ok::<_, quiz_core::Error>((Subject::new(name)?, build(raw)?)))
        .collect()
}

/// Write the sample bank, optionally restricted to one subject. Returns the number of
/// questions written.
///
/// # Errors
///
/// Returns `StorageError` if a write fails or the bank does not validate.
pub async fn seed_questions(
    repo: &dyn QuestionRepository,
    only: Option<&Subject>,
) -> Result<usize, StorageError> {
    let bank = sample_bank().map_err(|e| StorageError::Serialization(e.to_string()))?;
    let mut written = 0;
    for (subject, questions) in bank {
        if only.is_some_and(|s| *s != subject) {
            continue;
        }
        repo.replace_questions(&subject, &questions).await?;
        written += questions.len();
    }
    Ok(written)
}
