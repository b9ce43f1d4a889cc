//! Session state
//!
//! Owned by the controller; every mutation goes through a method that
//! enforces the input bounds. The phase is derived, never stored.

use crate::evaluator::{diff, is_correct, DigitDiff};
use crate::task::Task;
use numlab_common::events::{Phase, PlaybackSpeed, ScoreRecord, SessionSnapshot};

/// Result of a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub correct: bool,
    pub diff: DigitDiff,
    pub streak: u32,
    /// The high score was raised by this submission
    pub new_high_score: bool,
}

#[derive(Debug, Clone)]
pub struct SessionState {
    task: Option<Task>,
    /// Incremented on every task load
    generation: u64,
    user_input: String,
    /// Outcome of the check for the current task
    checked: Option<bool>,
    /// Id of the in-flight rendition
    playing: Option<u64>,
    streak: u32,
    high_score: u32,
    score: ScoreRecord,
    stress_mode: bool,
    playback_speed: PlaybackSpeed,
    auto_advance_pending: bool,
}

impl SessionState {
    pub fn new(high_score: u32, score: ScoreRecord) -> Self {
        Self {
            task: None,
            generation: 0,
            user_input: String::new(),
            checked: None,
            playing: None,
            streak: 0,
            high_score,
            score,
            stress_mode: false,
            playback_speed: PlaybackSpeed::default(),
            auto_advance_pending: false,
        }
    }

    pub fn phase(&self) -> Phase {
        if self.task.is_none() {
            Phase::Idle
        } else if self.playing.is_some() {
            Phase::Playing
        } else if self.checked.is_some() {
            Phase::Checked
        } else if self.user_input.is_empty() {
            Phase::Loaded
        } else {
            Phase::Answering
        }
    }

    pub fn task(&self) -> Option<&Task> {
        self.task.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn user_input(&self) -> &str {
        &self.user_input
    }

    pub fn is_checked(&self) -> bool {
        self.checked.is_some()
    }

    pub fn last_correct(&self) -> Option<bool> {
        self.checked
    }

    pub fn playing(&self) -> Option<u64> {
        self.playing
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    pub fn score(&self) -> ScoreRecord {
        self.score
    }

    pub fn stress_mode(&self) -> bool {
        self.stress_mode
    }

    pub fn playback_speed(&self) -> PlaybackSpeed {
        self.playback_speed
    }

    pub fn auto_advance_pending(&self) -> bool {
        self.auto_advance_pending
    }

    /// Replace the task and reset everything tied to it
    ///
    /// Returns the new generation.
    pub fn load_task(&mut self, task: Task) -> u64 {
        self.generation += 1;
        self.task = Some(task);
        self.user_input.clear();
        self.checked = None;
        self.playing = None;
        self.auto_advance_pending = false;
        self.generation
    }

    fn editable(&self) -> Option<&Task> {
        if self.checked.is_some() {
            return None;
        }
        self.task.as_ref()
    }

    /// Append a typed character
    ///
    /// Rejected when no task is editable, the character is not valid for the
    /// task kind, or the input is already full.
    pub fn press_char(&mut self, c: char) -> bool {
        let Some(task) = self.editable() else {
            return false;
        };
        if !task.accepts_char(c) || self.user_input.chars().count() >= task.expected_length() {
            return false;
        }
        self.user_input.push(c);
        true
    }

    pub fn backspace(&mut self) -> bool {
        if self.editable().is_none() {
            return false;
        }
        self.user_input.pop().is_some()
    }

    pub fn clear_input(&mut self) -> bool {
        if self.editable().is_none() || self.user_input.is_empty() {
            return false;
        }
        self.user_input.clear();
        true
    }

    pub fn can_submit(&self) -> bool {
        match self.editable() {
            Some(task) => self.user_input.chars().count() == task.expected_length(),
            None => false,
        }
    }

    /// Check the answer and update streak, high score and score record
    ///
    /// None when submission is not allowed.
    pub fn submit(&mut self) -> Option<Submission> {
        if !self.can_submit() {
            return None;
        }
        let task = self.task.as_ref()?;
        let correct = is_correct(task.answer(), &self.user_input);
        let digit_diff = diff(task.answer(), &self.user_input);

        self.checked = Some(correct);
        self.score.record(correct);

        let mut new_high_score = false;
        if correct {
            self.streak += 1;
            if self.streak > self.high_score {
                self.high_score = self.streak;
                new_high_score = true;
            }
        } else {
            self.streak = 0;
        }

        Some(Submission {
            correct,
            diff: digit_diff,
            streak: self.streak,
            new_high_score,
        })
    }

    /// Per-position diff of the checked answer
    pub fn diff(&self) -> Option<DigitDiff> {
        self.checked?;
        let task = self.task.as_ref()?;
        Some(diff(task.answer(), &self.user_input))
    }

    pub fn start_playing(&mut self, id: u64, speed: PlaybackSpeed) {
        self.playing = Some(id);
        self.playback_speed = speed;
    }

    /// Returns false if `id` is not the in-flight rendition
    pub fn finish_playing(&mut self, id: u64) -> bool {
        if self.playing == Some(id) {
            self.playing = None;
            true
        } else {
            false
        }
    }

    pub fn stop_playing(&mut self) {
        self.playing = None;
    }

    pub fn set_stress_mode(&mut self, enabled: bool) {
        self.stress_mode = enabled;
    }

    pub fn set_auto_advance_pending(&mut self, pending: bool) {
        self.auto_advance_pending = pending;
    }

    /// Zero the high score and the live streak with it
    ///
    /// The high score may never sit below the current streak.
    pub fn reset_high_score(&mut self) {
        self.high_score = 0;
        self.streak = 0;
    }

    pub fn reset_score(&mut self) {
        self.score = ScoreRecord::default();
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let checked = self.checked.is_some();
        SessionSnapshot {
            generation: self.generation,
            phase: self.phase(),
            task: self.task.as_ref().map(|t| t.view(checked)),
            user_input: self.user_input.clone(),
            diff: self.diff().map(DigitDiff::into_vec),
            last_correct: self.checked,
            can_submit: self.can_submit(),
            streak: self.streak,
            high_score: self.high_score,
            score: self.score,
            stress_mode: self.stress_mode,
            playback_speed: self.playback_speed,
            auto_advance_pending: self.auto_advance_pending,
        }
    }
}
