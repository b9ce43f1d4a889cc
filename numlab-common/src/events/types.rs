//! Domain types shared between the trainer engine and presentation layers

use serde::{Deserialize, Serialize};

/// Kind of listening challenge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// 11-digit mobile number
    PhoneNumber,
    /// 4-6 digit parcel pickup code
    DeliveryCode,
    /// Checkout total with two decimal places
    TotalPrice,
}

impl TaskKind {
    /// All kinds, in selection order
    pub const ALL: [TaskKind; 3] = [
        TaskKind::PhoneNumber,
        TaskKind::DeliveryCode,
        TaskKind::TotalPrice,
    ];

    /// Whether the decimal separator is part of this kind's answers
    pub fn accepts_decimal(&self) -> bool {
        matches!(self, TaskKind::TotalPrice)
    }

    /// Parse kind from a config/CLI string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "phone" | "phone_number" => Some(TaskKind::PhoneNumber),
            "code" | "delivery" | "delivery_code" | "pickup_code" => Some(TaskKind::DeliveryCode),
            "price" | "total" | "total_price" => Some(TaskKind::TotalPrice),
            _ => None,
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TaskKind::PhoneNumber => "phone_number",
            TaskKind::DeliveryCode => "delivery_code",
            TaskKind::TotalPrice => "total_price",
        };
        write!(f, "{}", name)
    }
}

/// Difficulty tag shown next to the scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "Easy"),
            Difficulty::Medium => write!(f, "Medium"),
            Difficulty::Hard => write!(f, "Hard"),
        }
    }
}

/// Requested playback speed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackSpeed {
    /// Native-speaker tempo (faster than conversational)
    #[default]
    Native,
    /// Learner tempo
    Slow,
}

/// Session phase
///
/// Derived from session state rather than stored:
/// - Idle: no task
/// - Playing: a rendition is in flight
/// - Checked: the current answer has been submitted
/// - Loaded: task ready, input empty
/// - Answering: task ready, input partially or fully typed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Loaded,
    Playing,
    Answering,
    Checked,
}

/// Per-position comparison result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DigitStatus {
    Correct,
    Incorrect,
    Missing,
}

/// Running correct/total record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub correct: u32,
    pub total: u32,
}

impl ScoreRecord {
    /// Record one submission
    pub fn record(&mut self, correct: bool) {
        self.total = self.total.saturating_add(1);
        if correct {
            self.correct = self.correct.saturating_add(1);
        }
    }

    /// Fraction of correct submissions (0.0 when nothing recorded)
    pub fn accuracy(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f32 / self.total as f32
        }
    }
}

/// Display fields of the current task
///
/// The answer is only included once the task has been checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskView {
    pub kind: TaskKind,
    pub label: String,
    pub icon: String,
    pub scenario: String,
    pub difficulty: Difficulty,
    pub expected_length: usize,
    pub common_traps: Vec<String>,
    pub revealed_answer: Option<String>,
}

/// Everything a presentation layer needs to render the trainer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub generation: u64,
    pub phase: Phase,
    pub task: Option<TaskView>,
    pub user_input: String,
    /// Per-position diff, present only in the Checked phase
    pub diff: Option<Vec<DigitStatus>>,
    pub last_correct: Option<bool>,
    pub can_submit: bool,
    pub streak: u32,
    pub high_score: u32,
    pub score: ScoreRecord,
    pub stress_mode: bool,
    pub playback_speed: PlaybackSpeed,
    pub auto_advance_pending: bool,
}
