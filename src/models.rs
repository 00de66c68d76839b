use crate::errors::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Sleep at or above this many hours is rated good.
pub const GOOD_SLEEP_HOURS: f64 = 7.0;
/// Sleep at or above this many hours (and below good) is rated fair.
pub const FAIR_SLEEP_HOURS: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Water,
    Sleep,
    Steps,
    Mood,
    Medicine,
}

impl LogKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Water => "water",
            Self::Sleep => "sleep",
            Self::Steps => "steps",
            Self::Mood => "mood",
            Self::Medicine => "medicine",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "water" => Some(Self::Water),
            "sleep" => Some(Self::Sleep),
            "steps" => Some(Self::Steps),
            "mood" => Some(Self::Mood),
            "medicine" => Some(Self::Medicine),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SleepQuality {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl SleepQuality {
    /// Fixed rating used when the quality is derived rather than chosen.
    /// Never yields `Excellent`; that tier is only set explicitly.
    pub fn from_hours(hours: f64) -> Self {
        if hours >= GOOD_SLEEP_HOURS {
            Self::Good
        } else if hours >= FAIR_SLEEP_HOURS {
            Self::Fair
        } else {
            Self::Poor
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Poor => "poor",
            Self::Fair => "fair",
            Self::Good => "good",
            Self::Excellent => "excellent",
        }
    }
}

impl fmt::Display for SleepQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Terrible,
    Bad,
    Okay,
    Good,
    Great,
}

impl Mood {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Terrible => "terrible",
            Self::Bad => "bad",
            Self::Okay => "okay",
            Self::Good => "good",
            Self::Great => "great",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterEntry {
    pub id: Uuid,
    pub user_id: String,
    pub amount_ml: u32,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepEntry {
    pub id: Uuid,
    pub user_id: String,
    pub hours: f64,
    pub quality: SleepQuality,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepEntry {
    pub id: Uuid,
    pub user_id: String,
    pub steps: u32,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodEntry {
    pub id: Uuid,
    pub user_id: String,
    pub mood: Mood,
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicineEntry {
    pub id: Uuid,
    pub user_id: String,
    pub medicine_name: String,
    pub dosage: Option<String>,
    pub taken_at: DateTime<Utc>,
}

/// Value fields of a log row, as submitted by a form or produced by a chat command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NewEntry {
    Water {
        amount_ml: u32,
    },
    Sleep {
        hours: f64,
        quality: SleepQuality,
    },
    Steps {
        steps: u32,
    },
    Mood {
        mood: Mood,
        #[serde(default)]
        notes: Option<String>,
    },
    Medicine {
        medicine_name: String,
        #[serde(default)]
        dosage: Option<String>,
    },
}

impl NewEntry {
    pub fn kind(&self) -> LogKind {
        match self {
            Self::Water { .. } => LogKind::Water,
            Self::Sleep { .. } => LogKind::Sleep,
            Self::Steps { .. } => LogKind::Steps,
            Self::Mood { .. } => LogKind::Mood,
            Self::Medicine { .. } => LogKind::Medicine,
        }
    }

    /// Rejects non-positive quantities and blank names, and normalizes optional text.
    pub fn validated(self) -> Result<Self, AppError> {
        match self {
            Self::Water { amount_ml: 0 } => Err(AppError::bad_request("amount_ml must be positive")),
            Self::Steps { steps: 0 } => Err(AppError::bad_request("steps must be positive")),
            Self::Sleep { hours, .. } if !hours.is_finite() || hours <= 0.0 => {
                Err(AppError::bad_request("hours must be a positive number"))
            }
            Self::Mood { mood, notes } => Ok(Self::Mood {
                mood,
                notes: non_blank(notes),
            }),
            Self::Medicine {
                medicine_name,
                dosage,
            } => {
                let medicine_name = medicine_name.trim().to_string();
                if medicine_name.is_empty() {
                    return Err(AppError::bad_request("medicine_name must not be empty"));
                }
                Ok(Self::Medicine {
                    medicine_name,
                    dosage: non_blank(dosage),
                })
            }
            other => Ok(other),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// A stored row of any log, tagged with its kind on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LogRecord {
    Water(WaterEntry),
    Sleep(SleepEntry),
    Steps(StepEntry),
    Mood(MoodEntry),
    Medicine(MedicineEntry),
}

impl LogRecord {
    pub fn id(&self) -> Uuid {
        match self {
            Self::Water(entry) => entry.id,
            Self::Sleep(entry) => entry.id,
            Self::Steps(entry) => entry.id,
            Self::Mood(entry) => entry.id,
            Self::Medicine(entry) => entry.id,
        }
    }

    pub fn kind(&self) -> LogKind {
        match self {
            Self::Water(_) => LogKind::Water,
            Self::Sleep(_) => LogKind::Sleep,
            Self::Steps(_) => LogKind::Steps,
            Self::Mood(_) => LogKind::Mood,
            Self::Medicine(_) => LogKind::Medicine,
        }
    }

    pub fn recorded_at(&self) -> DateTime<Utc> {
        match self {
            Self::Water(entry) => entry.recorded_at,
            Self::Sleep(entry) => entry.recorded_at,
            Self::Steps(entry) => entry.recorded_at,
            Self::Mood(entry) => entry.recorded_at,
            Self::Medicine(entry) => entry.taken_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub id: Uuid,
    pub user_id: String,
    pub role: ChatRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Profile {
    pub user_id: String,
    pub full_name: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Everything the JSON file store persists.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppData {
    pub water: Vec<WaterEntry>,
    pub sleep: Vec<SleepEntry>,
    pub steps: Vec<StepEntry>,
    pub moods: Vec<MoodEntry>,
    pub medicine: Vec<MedicineEntry>,
    pub chat: Vec<ChatTurn>,
    pub profiles: BTreeMap<String, Profile>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub action: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewTurnRequest {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ProfileUpdate {
    pub full_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: String,
    pub water_ml: u64,
    pub sleep_hours: f64,
    pub steps: u32,
    pub mood: String,
}

#[derive(Debug, Serialize)]
pub struct HistoryDay {
    pub date: String,
    pub entries: Vec<LogRecord>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct DailyPoint {
    pub date: String,
    pub water_ml: u64,
    pub sleep_hours: f64,
    pub steps: u32,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct TrendAverages {
    pub days_logged: u8,
    pub avg_water_ml: f64,
    pub avg_sleep_hours: f64,
    pub avg_steps: f64,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub last_7_days: Vec<DailyPoint>,
    pub averages: TrendAverages,
}
