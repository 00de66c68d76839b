use crate::errors::StoreError;
use crate::models::{
    AppData, ChatRole, ChatTurn, LogKind, LogRecord, MedicineEntry, MoodEntry, NewEntry,
    Profile, SleepEntry, StepEntry, WaterEntry,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::{fs, sync::Mutex};
use tracing::{debug, error};
use uuid::Uuid;

/// User-scoped persistence for health logs, chat turns and profiles.
///
/// Every method takes the authenticated user id; rows belonging to other users
/// are invisible to reads and behave as missing for updates and deletes.
#[async_trait]
pub trait HealthStore: Send + Sync {
    async fn insert(&self, user_id: &str, entry: NewEntry) -> Result<LogRecord, StoreError>;

    /// Water rows recorded at or after `since`, oldest first.
    async fn water_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<WaterEntry>, StoreError>;

    async fn sleep_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<SleepEntry>, StoreError>;

    async fn steps_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<StepEntry>, StoreError>;

    async fn moods_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<MoodEntry>, StoreError>;

    /// All rows of every kind, newest first.
    async fn history(&self, user_id: &str) -> Result<Vec<LogRecord>, StoreError>;

    /// Replaces the value fields of an owned row. `None` when no row of that
    /// kind and id belongs to the user.
    async fn update(
        &self,
        user_id: &str,
        id: Uuid,
        entry: NewEntry,
    ) -> Result<Option<LogRecord>, StoreError>;

    async fn delete(&self, user_id: &str, kind: LogKind, id: Uuid) -> Result<bool, StoreError>;

    async fn append_turn(
        &self,
        user_id: &str,
        role: ChatRole,
        content: &str,
    ) -> Result<ChatTurn, StoreError>;

    /// The last `limit` turns, oldest first.
    async fn recent_turns(&self, user_id: &str, limit: usize) -> Result<Vec<ChatTurn>, StoreError>;

    async fn profile(&self, user_id: &str) -> Result<Profile, StoreError>;

    async fn update_profile(&self, user_id: &str, full_name: &str) -> Result<Profile, StoreError>;
}

/// A [`HealthStore`] kept in memory and written through to one JSON file.
pub struct JsonFileStore {
    path: PathBuf,
    data: Mutex<AppData>,
}

impl JsonFileStore {
    pub fn new(path: PathBuf, data: AppData) -> Self {
        Self {
            path,
            data: Mutex::new(data),
        }
    }

    pub async fn open(path: PathBuf) -> Self {
        let data = load_data(&path).await;
        Self::new(path, data)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn mutate<R>(&self, change: impl FnOnce(&mut AppData) -> R) -> Result<R, StoreError> {
        let mut data = self.data.lock().await;
        self.apply(&mut data, change).await
    }

    /// Changes one owned row. The ownership check and the write happen under
    /// the same guard; nothing is written when the row is missing.
    async fn mutate_owned<R>(
        &self,
        user_id: &str,
        kind: LogKind,
        id: Uuid,
        change: impl FnOnce(&mut AppData) -> R,
    ) -> Result<Option<R>, StoreError> {
        let mut data = self.data.lock().await;
        if !owns(&data, user_id, kind, id) {
            return Ok(None);
        }
        self.apply(&mut data, change).await.map(Some)
    }

    /// Applies `change` to a copy and only keeps it once the file is written.
    async fn apply<R>(
        &self,
        data: &mut AppData,
        change: impl FnOnce(&mut AppData) -> R,
    ) -> Result<R, StoreError> {
        let mut next = data.clone();
        let result = change(&mut next);
        persist_data(&self.path, &next).await?;
        *data = next;
        debug!(path = %self.path.display(), "data file saved");
        Ok(result)
    }
}

fn sorted_by_time<T>(mut rows: Vec<T>, at: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    rows.sort_by_key(|row| at(row));
    rows
}

#[async_trait]
impl HealthStore for JsonFileStore {
    async fn insert(&self, user_id: &str, entry: NewEntry) -> Result<LogRecord, StoreError> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let user_id = user_id.to_string();
        let record = match entry {
            NewEntry::Water { amount_ml } => LogRecord::Water(WaterEntry {
                id,
                user_id,
                amount_ml,
                recorded_at: now,
            }),
            NewEntry::Sleep { hours, quality } => LogRecord::Sleep(SleepEntry {
                id,
                user_id,
                hours,
                quality,
                recorded_at: now,
            }),
            NewEntry::Steps { steps } => LogRecord::Steps(StepEntry {
                id,
                user_id,
                steps,
                recorded_at: now,
            }),
            NewEntry::Mood { mood, notes } => LogRecord::Mood(MoodEntry {
                id,
                user_id,
                mood,
                notes,
                recorded_at: now,
            }),
            NewEntry::Medicine {
                medicine_name,
                dosage,
            } => LogRecord::Medicine(MedicineEntry {
                id,
                user_id,
                medicine_name,
                dosage,
                taken_at: now,
            }),
        };

        let stored = record.clone();
        self.mutate(move |data| match stored {
            LogRecord::Water(row) => data.water.push(row),
            LogRecord::Sleep(row) => data.sleep.push(row),
            LogRecord::Steps(row) => data.steps.push(row),
            LogRecord::Mood(row) => data.moods.push(row),
            LogRecord::Medicine(row) => data.medicine.push(row),
        })
        .await?;
        Ok(record)
    }

    async fn water_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<WaterEntry>, StoreError> {
        let data = self.data.lock().await;
        let rows = data
            .water
            .iter()
            .filter(|r| r.user_id == user_id && r.recorded_at >= since)
            .cloned()
            .collect();
        Ok(sorted_by_time(rows, |r: &WaterEntry| r.recorded_at))
    }

    async fn sleep_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<SleepEntry>, StoreError> {
        let data = self.data.lock().await;
        let rows = data
            .sleep
            .iter()
            .filter(|r| r.user_id == user_id && r.recorded_at >= since)
            .cloned()
            .collect();
        Ok(sorted_by_time(rows, |r: &SleepEntry| r.recorded_at))
    }

    async fn steps_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<StepEntry>, StoreError> {
        let data = self.data.lock().await;
        let rows = data
            .steps
            .iter()
            .filter(|r| r.user_id == user_id && r.recorded_at >= since)
            .cloned()
            .collect();
        Ok(sorted_by_time(rows, |r: &StepEntry| r.recorded_at))
    }

    async fn moods_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<MoodEntry>, StoreError> {
        let data = self.data.lock().await;
        let rows = data
            .moods
            .iter()
            .filter(|r| r.user_id == user_id && r.recorded_at >= since)
            .cloned()
            .collect();
        Ok(sorted_by_time(rows, |r: &MoodEntry| r.recorded_at))
    }

    async fn history(&self, user_id: &str) -> Result<Vec<LogRecord>, StoreError> {
        let data = self.data.lock().await;
        let mut records = Vec::new();
        records.extend(data.water.iter().filter(|r| r.user_id == user_id).cloned().map(LogRecord::Water));
        records.extend(data.sleep.iter().filter(|r| r.user_id == user_id).cloned().map(LogRecord::Sleep));
        records.extend(data.steps.iter().filter(|r| r.user_id == user_id).cloned().map(LogRecord::Steps));
        records.extend(data.moods.iter().filter(|r| r.user_id == user_id).cloned().map(LogRecord::Mood));
        records.extend(
            data.medicine
                .iter()
                .filter(|r| r.user_id == user_id)
                .cloned()
                .map(LogRecord::Medicine),
        );

        records.sort_by(|a, b| b.recorded_at().cmp(&a.recorded_at()));
        Ok(records)
    }

    async fn update(
        &self,
        user_id: &str,
        id: Uuid,
        entry: NewEntry,
    ) -> Result<Option<LogRecord>, StoreError> {
        let kind = entry.kind();
        let updated = self
            .mutate_owned(user_id, kind, id, |data| match entry {
                NewEntry::Water { amount_ml } => data
                    .water
                    .iter_mut()
                    .find(|r| r.id == id && r.user_id == user_id)
                    .map(|row| {
                        row.amount_ml = amount_ml;
                        LogRecord::Water(row.clone())
                    }),
                NewEntry::Sleep { hours, quality } => data
                    .sleep
                    .iter_mut()
                    .find(|r| r.id == id && r.user_id == user_id)
                    .map(|row| {
                        row.hours = hours;
                        row.quality = quality;
                        LogRecord::Sleep(row.clone())
                    }),
                NewEntry::Steps { steps } => data
                    .steps
                    .iter_mut()
                    .find(|r| r.id == id && r.user_id == user_id)
                    .map(|row| {
                        row.steps = steps;
                        LogRecord::Steps(row.clone())
                    }),
                NewEntry::Mood { mood, notes } => data
                    .moods
                    .iter_mut()
                    .find(|r| r.id == id && r.user_id == user_id)
                    .map(|row| {
                        row.mood = mood;
                        row.notes = notes;
                        LogRecord::Mood(row.clone())
                    }),
                NewEntry::Medicine {
                    medicine_name,
                    dosage,
                } => data
                    .medicine
                    .iter_mut()
                    .find(|r| r.id == id && r.user_id == user_id)
                    .map(|row| {
                        row.medicine_name = medicine_name;
                        row.dosage = dosage;
                        LogRecord::Medicine(row.clone())
                    }),
            })
            .await?;
        Ok(updated.flatten())
    }

    async fn delete(&self, user_id: &str, kind: LogKind, id: Uuid) -> Result<bool, StoreError> {
        fn remove<T>(rows: &mut Vec<T>, matches: impl Fn(&T) -> bool) -> bool {
            let before = rows.len();
            rows.retain(|row| !matches(row));
            rows.len() != before
        }

        let removed = self
            .mutate_owned(user_id, kind, id, |data| match kind {
                LogKind::Water => remove(&mut data.water, |r| r.id == id && r.user_id == user_id),
                LogKind::Sleep => remove(&mut data.sleep, |r| r.id == id && r.user_id == user_id),
                LogKind::Steps => remove(&mut data.steps, |r| r.id == id && r.user_id == user_id),
                LogKind::Mood => remove(&mut data.moods, |r| r.id == id && r.user_id == user_id),
                LogKind::Medicine => {
                    remove(&mut data.medicine, |r| r.id == id && r.user_id == user_id)
                }
            })
            .await?;
        Ok(removed.unwrap_or(false))
    }

    async fn append_turn(
        &self,
        user_id: &str,
        role: ChatRole,
        content: &str,
    ) -> Result<ChatTurn, StoreError> {
        let turn = ChatTurn {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            role,
            content: content.to_string(),
            created_at: Utc::now(),
        };
        let stored = turn.clone();
        self.mutate(move |data| data.chat.push(stored)).await?;
        Ok(turn)
    }

    async fn recent_turns(&self, user_id: &str, limit: usize) -> Result<Vec<ChatTurn>, StoreError> {
        let data = self.data.lock().await;
        let mine: Vec<&ChatTurn> = data.chat.iter().filter(|t| t.user_id == user_id).collect();
        let skip = mine.len().saturating_sub(limit);
        Ok(mine.into_iter().skip(skip).cloned().collect())
    }

    async fn profile(&self, user_id: &str) -> Result<Profile, StoreError> {
        let data = self.data.lock().await;
        Ok(data.profiles.get(user_id).cloned().unwrap_or_else(|| Profile {
            user_id: user_id.to_string(),
            ..Profile::default()
        }))
    }

    async fn update_profile(&self, user_id: &str, full_name: &str) -> Result<Profile, StoreError> {
        let full_name = full_name.trim().to_string();
        self.mutate(|data| {
            let profile = data
                .profiles
                .entry(user_id.to_string())
                .or_insert_with(|| Profile {
                    user_id: user_id.to_string(),
                    ..Profile::default()
                });
            profile.full_name = (!full_name.is_empty()).then_some(full_name);
            profile.updated_at = Some(Utc::now());
            profile.clone()
        })
        .await
    }
}

fn owns(data: &AppData, user_id: &str, kind: LogKind, id: Uuid) -> bool {
    match kind {
        LogKind::Water => data.water.iter().any(|r| r.id == id && r.user_id == user_id),
        LogKind::Sleep => data.sleep.iter().any(|r| r.id == id && r.user_id == user_id),
        LogKind::Steps => data.steps.iter().any(|r| r.id == id && r.user_id == user_id),
        LogKind::Mood => data.moods.iter().any(|r| r.id == id && r.user_id == user_id),
        LogKind::Medicine => data.medicine.iter().any(|r| r.id == id && r.user_id == user_id),
    }
}

pub async fn load_data(path: &Path) -> AppData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(err) => {
                error!("failed to parse data file: {err}");
                AppData::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => AppData::default(),
        Err(err) => {
            error!("failed to read data file: {err}");
            AppData::default()
        }
    }
}

pub async fn persist_data(path: &Path, data: &AppData) -> Result<(), StoreError> {
    let payload = serde_json::to_vec_pretty(data)?;
    fs::write(path, payload).await?;
    Ok(())
}
