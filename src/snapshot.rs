use crate::errors::StoreError;
use crate::models::{DailySummary, MoodEntry, SleepEntry, StepEntry};
use crate::storage::HealthStore;
use chrono::{DateTime, Local, NaiveTime, TimeZone, Utc};
use std::fmt::Write;
use tracing::debug;

/// Read-only aggregate of one user's logs since a day boundary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HealthSnapshot {
    pub water_ml: u64,
    pub latest_sleep: Option<SleepEntry>,
    pub latest_steps: Option<StepEntry>,
    pub latest_mood: Option<MoodEntry>,
}

impl HealthSnapshot {
    /// Runs the four reads concurrently; any failure fails the whole snapshot.
    pub async fn collect(
        store: &dyn HealthStore,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Self, StoreError> {
        let (water, sleep, steps, moods) = tokio::try_join!(
            store.water_since(user_id, since),
            store.sleep_since(user_id, since),
            store.steps_since(user_id, since),
            store.moods_since(user_id, since),
        )?;

        let snapshot = Self {
            water_ml: water.iter().map(|row| u64::from(row.amount_ml)).sum(),
            latest_sleep: sleep.into_iter().last(),
            latest_steps: steps.into_iter().last(),
            latest_mood: moods.into_iter().last(),
        };
        debug!(user_id, water_ml = snapshot.water_ml, "snapshot collected");
        Ok(snapshot)
    }

    pub async fn today(store: &dyn HealthStore, user_id: &str) -> Result<Self, StoreError> {
        Self::collect(store, user_id, start_of_day(Local::now())).await
    }

    /// Context block embedded in the assistant's system prompt.
    pub fn context(&self) -> String {
        let sleep = match &self.latest_sleep {
            Some(entry) => format!("{} jam ({})", entry.hours, entry.quality),
            None => "belum dicatat".to_string(),
        };
        let steps = self.latest_steps.as_ref().map_or(0, |entry| entry.steps);
        let mood = match &self.latest_mood {
            Some(entry) => match &entry.notes {
                Some(notes) => format!("{} ({notes})", entry.mood),
                None => entry.mood.to_string(),
            },
            None => "belum dicatat".to_string(),
        };

        let mut out = String::from("Data kesehatan hari ini:\n");
        let _ = writeln!(out, "- Air minum: {} ml", self.water_ml);
        let _ = writeln!(out, "- Tidur: {sleep}");
        let _ = writeln!(out, "- Langkah: {steps} langkah");
        let _ = writeln!(out, "- Mood: {mood}");
        out
    }

    pub fn summary(&self, date: String) -> DailySummary {
        DailySummary {
            date,
            water_ml: self.water_ml,
            sleep_hours: self.latest_sleep.as_ref().map_or(0.0, |entry| entry.hours),
            steps: self.latest_steps.as_ref().map_or(0, |entry| entry.steps),
            mood: self
                .latest_mood
                .as_ref()
                .map_or_else(|| "-".to_string(), |entry| entry.mood.to_string()),
        }
    }
}

/// Local midnight of `now`'s calendar day, as a UTC instant.
pub fn start_of_day<Tz: TimeZone>(now: DateTime<Tz>) -> DateTime<Utc> {
    let midnight = now.date_naive().and_time(NaiveTime::MIN);
    now.timezone()
        .from_local_datetime(&midnight)
        .earliest()
        .map(|start| start.with_timezone(&Utc))
        .unwrap_or_else(|| midnight.and_utc())
}
