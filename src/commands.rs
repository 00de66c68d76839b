//! Chat command interpreter.
//!
//! Utterances are matched against a fixed, ordered table of command rules
//! (water, then steps, then sleep). The first rule whose pattern matches decides
//! the intent; a matched intent is written to the store exactly once and
//! answered with a canned confirmation. Anything else is left for the assistant.

use crate::errors::AppError;
use crate::models::{NewEntry, SleepQuality, GOOD_SLEEP_HOURS};
use crate::storage::HealthStore;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::{info, instrument};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intent {
    AddWater { amount_ml: u32 },
    AddSteps { count: u32 },
    LogSleep { hours: f64 },
    Unrecognized,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Handled { response: String, action: String },
    NotHandled,
}

struct CommandRule {
    name: &'static str,
    pattern: Regex,
    extract: fn(&Captures<'_>) -> Result<Intent, AppError>,
}

fn rule(
    name: &'static str,
    pattern: &str,
    extract: fn(&Captures<'_>) -> Result<Intent, AppError>,
) -> Option<CommandRule> {
    match Regex::new(pattern) {
        Ok(pattern) => Some(CommandRule {
            name,
            pattern,
            extract,
        }),
        Err(err) => {
            tracing::error!("invalid command pattern {name}: {err}");
            None
        }
    }
}

// Order matters: the first matching rule wins. Digits are ASCII only.
static RULES: Lazy<Vec<CommandRule>> = Lazy::new(|| {
    [
        rule("add_water", r"tambah(?:kan)?\s+([0-9]+)\s*(?:ml)?\s+air", extract_water),
        rule("add_steps", r"tambah(?:kan)?\s+([0-9]+)\s+langkah", extract_steps),
        rule(
            "log_sleep",
            r"(?:catat|tambah).*tidur\s+([0-9]+(?:\.[0-9]+)?)\s+jam",
            extract_sleep,
        ),
    ]
    .into_iter()
    .flatten()
    .collect()
});

fn positive_count(caps: &Captures<'_>, what: &str) -> Result<u32, AppError> {
    let literal = &caps[1];
    match literal.parse::<u32>() {
        Ok(0) => Err(AppError::bad_request(format!("{what} must be greater than zero"))),
        Ok(value) => Ok(value),
        Err(_) => Err(AppError::bad_request(format!("{what} {literal} is too large"))),
    }
}

fn extract_water(caps: &Captures<'_>) -> Result<Intent, AppError> {
    positive_count(caps, "water amount").map(|amount_ml| Intent::AddWater { amount_ml })
}

fn extract_steps(caps: &Captures<'_>) -> Result<Intent, AppError> {
    positive_count(caps, "step count").map(|count| Intent::AddSteps { count })
}

fn extract_sleep(caps: &Captures<'_>) -> Result<Intent, AppError> {
    let literal = &caps[1];
    match literal.parse::<f64>() {
        Ok(hours) if hours.is_finite() && hours > 0.0 => Ok(Intent::LogSleep { hours }),
        _ => Err(AppError::bad_request(format!(
            "sleep duration {literal} must be greater than zero"
        ))),
    }
}

/// Derives exactly one intent for an utterance. Matching is case-insensitive.
pub fn classify(utterance: &str) -> Result<Intent, AppError> {
    let lowered = utterance.to_lowercase();
    for rule in RULES.iter() {
        if let Some(caps) = rule.pattern.captures(&lowered) {
            tracing::debug!(rule = rule.name, "command matched");
            return (rule.extract)(&caps);
        }
    }
    Ok(Intent::Unrecognized)
}

impl Intent {
    /// The log row this intent writes, if any.
    pub fn entry(&self) -> Option<NewEntry> {
        match *self {
            Self::AddWater { amount_ml } => Some(NewEntry::Water { amount_ml }),
            Self::AddSteps { count } => Some(NewEntry::Steps { steps: count }),
            Self::LogSleep { hours } => Some(NewEntry::Sleep {
                hours,
                quality: SleepQuality::from_hours(hours),
            }),
            Self::Unrecognized => None,
        }
    }

    /// Confirmation sentence and toast summary for a recognized intent.
    pub fn confirmation(&self) -> Option<(String, String)> {
        match *self {
            Self::AddWater { amount_ml } => Some((
                format!(
                    "Oke! Saya sudah mencatat {amount_ml}ml air minum untuk Anda. Jangan lupa terus minum air ya! 💧"
                ),
                format!("{amount_ml}ml air berhasil ditambahkan"),
            )),
            Self::AddSteps { count } => Some((
                format!("Mantap! {count} langkah sudah tercatat. Terus semangat bergerak! 🚶‍♂️"),
                format!("{count} langkah berhasil ditambahkan"),
            )),
            Self::LogSleep { hours } => {
                let tip = if hours >= GOOD_SLEEP_HOURS {
                    "Istirahat yang cukup! 😴"
                } else {
                    "Coba tidur lebih awal besok ya! 😊"
                };
                Some((
                    format!("Tidur {hours} jam sudah dicatat. {tip}"),
                    "Data tidur berhasil ditambahkan".to_string(),
                ))
            }
            Self::Unrecognized => None,
        }
    }
}

/// Classifies `utterance` and, for a recognized command, performs its single
/// write for `user_id` before answering. Unrecognized input writes nothing.
#[instrument(skip(store, utterance))]
pub async fn interpret(
    store: &dyn HealthStore,
    utterance: &str,
    user_id: &str,
) -> Result<Outcome, AppError> {
    let intent = classify(utterance)?;
    let (Some(entry), Some((response, action))) = (intent.entry(), intent.confirmation()) else {
        return Ok(Outcome::NotHandled);
    };

    store.insert(user_id, entry).await?;
    info!(?intent, "chat command recorded");

    Ok(Outcome::Handled { response, action })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AppData, LogRecord};
    use crate::storage::JsonFileStore;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn store() -> (JsonFileStore, std::path::PathBuf) {
        let path = std::env::temp_dir().join(format!("health_tracker_commands_{}.json", Uuid::new_v4()));
        (JsonFileStore::new(path.clone(), AppData::default()), path)
    }

    #[test]
    fn water_phrases() {
        for input in [
            "tambahkan 250ml air",
            "tambah 250 ml air",
            "tambah 250 air",
            "TAMBAH 250ML AIR",
            "tolong tambah 250ml air minum",
        ] {
            assert_eq!(classify(input).unwrap(), Intent::AddWater { amount_ml: 250 }, "{input}");
        }
    }

    #[test]
    fn steps_and_sleep_phrases() {
        assert_eq!(classify("tambah 5000 langkah").unwrap(), Intent::AddSteps { count: 5000 });
        assert_eq!(classify("Tambahkan 12 Langkah").unwrap(), Intent::AddSteps { count: 12 });
        assert_eq!(classify("catat tidur 6.5 jam").unwrap(), Intent::LogSleep { hours: 6.5 });
        assert_eq!(
            classify("tolong catat waktu tidur 8 jam").unwrap(),
            Intent::LogSleep { hours: 8.0 }
        );
    }

    #[test]
    fn water_wins_over_steps() {
        let intent = classify("tambah 5000 langkah lalu tambah 300ml air").unwrap();
        assert_eq!(intent, Intent::AddWater { amount_ml: 300 });
    }

    #[test]
    fn water_wins_over_sleep() {
        let intent = classify("tambah 300ml air lalu catat tidur 7 jam").unwrap();
        assert_eq!(intent, Intent::AddWater { amount_ml: 300 });
        let intent = classify("catat tidur 7 jam lalu tambah 300ml air").unwrap();
        assert_eq!(intent, Intent::AddWater { amount_ml: 300 });
    }

    #[test]
    fn steps_win_over_sleep() {
        let intent = classify("catat tidur 7 jam lalu tambah 4000 langkah").unwrap();
        assert_eq!(intent, Intent::AddSteps { count: 4000 });
        let intent = classify("tambah 4000 langkah dan tidur 7 jam").unwrap();
        assert_eq!(intent, Intent::AddSteps { count: 4000 });
    }

    #[test]
    fn unmatched_input_is_unrecognized() {
        for input in [
            "bagaimana kondisi saya hari ini?",
            "tambah -5 air",
            "tambah air",
            "catat tidur jam",
            "tambah ２５０ air",
            "tambah ٢٥٠ langkah",
            "catat tidur ７ jam",
            "",
        ] {
            assert_eq!(classify(input).unwrap(), Intent::Unrecognized, "{input:?}");
        }
    }

    #[test]
    fn zero_and_overflowing_values_fail_validation() {
        assert!(matches!(classify("tambah 0 air"), Err(AppError::Validation(_))));
        assert!(matches!(classify("tambah 0 langkah"), Err(AppError::Validation(_))));
        assert!(matches!(classify("catat tidur 0 jam"), Err(AppError::Validation(_))));
        assert!(matches!(
            classify("tambah 99999999999 air"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn large_values_stay_permitted() {
        assert_eq!(
            classify("tambah 999999 air").unwrap(),
            Intent::AddWater { amount_ml: 999_999 }
        );
        assert_eq!(classify("catat tidur 50 jam").unwrap(), Intent::LogSleep { hours: 50.0 });
    }

    #[test]
    fn sleep_intent_derives_quality() {
        let quality = |hours| match (Intent::LogSleep { hours }).entry() {
            Some(NewEntry::Sleep { quality, .. }) => quality,
            other => panic!("unexpected entry {other:?}"),
        };
        assert_eq!(quality(7.0), SleepQuality::Good);
        assert_eq!(quality(6.5), SleepQuality::Fair);
        assert_eq!(quality(5.0), SleepQuality::Fair);
        assert_eq!(quality(4.9), SleepQuality::Poor);
    }

    #[test]
    fn sleep_tip_depends_on_duration() {
        let (rested, _) = Intent::LogSleep { hours: 8.0 }.confirmation().unwrap();
        assert!(rested.contains("Istirahat yang cukup"));
        let (short, action) = Intent::LogSleep { hours: 4.5 }.confirmation().unwrap();
        assert!(short.starts_with("Tidur 4.5 jam sudah dicatat."));
        assert!(short.contains("tidur lebih awal"));
        assert_eq!(action, "Data tidur berhasil ditambahkan");
    }

    #[tokio::test]
    async fn water_command_writes_once() {
        let (store, path) = store();
        let outcome = interpret(&store, "tambahkan 250ml air", "alice").await.unwrap();
        match outcome {
            Outcome::Handled { response, action } => {
                assert!(response.contains("250ml"));
                assert_eq!(action, "250ml air berhasil ditambahkan");
            }
            Outcome::NotHandled => panic!("water command was not handled"),
        }

        let history = store.history("alice").await.unwrap();
        assert_eq!(history.len(), 1);
        assert!(matches!(&history[0], LogRecord::Water(row) if row.amount_ml == 250));
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn steps_command_writes_once() {
        let (store, path) = store();
        let outcome = interpret(&store, "tambah 5000 langkah", "alice").await.unwrap();
        assert!(matches!(outcome, Outcome::Handled { ref response, .. } if response.contains("5000")));

        let steps = store
            .steps_since("alice", Utc::now() - Duration::minutes(1))
            .await
            .unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].steps, 5000);
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn sleep_command_stores_derived_quality() {
        let (store, path) = store();
        interpret(&store, "catat tidur 6.5 jam", "alice").await.unwrap();

        let sleep = store
            .sleep_since("alice", Utc::now() - Duration::minutes(1))
            .await
            .unwrap();
        assert_eq!(sleep.len(), 1);
        assert_eq!(sleep[0].hours, 6.5);
        assert_eq!(sleep[0].quality, SleepQuality::Fair);
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn questions_write_nothing() {
        let (store, path) = store();
        let outcome = interpret(&store, "bagaimana kondisi saya hari ini?", "alice")
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::NotHandled);
        assert!(store.history("alice").await.unwrap().is_empty());
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn rejected_write_aborts_the_command() {
        let path = std::env::temp_dir()
            .join(format!("health_tracker_absent_{}", Uuid::new_v4()))
            .join("data.json");
        let store = JsonFileStore::new(path, AppData::default());

        let err = interpret(&store, "tambah 250ml air", "alice").await.unwrap_err();
        assert!(matches!(err, AppError::Store(_)));
        assert!(store.history("alice").await.unwrap().is_empty());
    }
}
