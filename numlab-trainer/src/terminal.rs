//! Line-oriented terminal front end
//!
//! Input is read a line at a time. Every character of a line is one command;
//! an empty line submits.
//!
//! | Key        | Command                  |
//! |------------|--------------------------|
//! | `0`-`9` `.`| type into the answer     |
//! | `p` / `s`  | play at native / slow    |
//! | `b`        | backspace                |
//! | `c`        | clear                    |
//! | `!` / Enter| submit                   |
//! | `n`        | next challenge           |
//! | `x`        | toggle stress mode       |
//! | `r` / `R`  | reset high score / score |
//! | `q`        | quit                     |

use crate::session::Command;
use crate::speech::tokens::reference_table;
use numlab_common::events::{DigitStatus, Phase, PlaybackSpeed, SessionSnapshot};
use std::fmt::Write;

pub const HELP: &str =
    "digits/. type | p play | s slow | b back | c clear | Enter submit | n next | x stress | r/R reset | q quit";

/// Parse one input line into commands
pub fn parse_line(line: &str) -> Vec<Command> {
    let line = line.trim();
    if line.is_empty() {
        return vec![Command::Submit];
    }

    line.chars()
        .filter_map(|c| match c {
            '0'..='9' | '.' => Some(Command::PressDigit(c)),
            'p' => Some(Command::RequestPlay(PlaybackSpeed::Native)),
            's' => Some(Command::RequestPlay(PlaybackSpeed::Slow)),
            'b' => Some(Command::Backspace),
            'c' => Some(Command::Clear),
            '!' => Some(Command::Submit),
            'n' => Some(Command::NextChallenge),
            'x' => Some(Command::ToggleStressMode),
            'r' => Some(Command::ResetHighScore),
            'R' => Some(Command::ResetScore),
            'q' => Some(Command::Shutdown),
            _ => None,
        })
        .collect()
}

fn status_mark(status: DigitStatus) -> char {
    match status {
        DigitStatus::Correct => '✓',
        DigitStatus::Incorrect => '✗',
        DigitStatus::Missing => '·',
    }
}

/// Render a snapshot as text
pub fn render(snapshot: &SessionSnapshot) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "streak {}  best {}  score {}/{} ({:.0}%){}",
        snapshot.streak,
        snapshot.high_score,
        snapshot.score.correct,
        snapshot.score.total,
        snapshot.score.accuracy() * 100.0,
        if snapshot.stress_mode { "  [STRESS]" } else { "" }
    );

    let Some(task) = &snapshot.task else {
        let _ = writeln!(out, "(no task)");
        return out;
    };

    let _ = writeln!(out, "{} {} ({})", task.icon, task.label, task.difficulty);
    let _ = writeln!(out, "  {}", task.scenario);

    let typed = snapshot.user_input.chars().count();
    let blanks = task.expected_length.saturating_sub(typed);
    let _ = writeln!(out, "  > {}{}", snapshot.user_input, "_".repeat(blanks));

    match snapshot.phase {
        Phase::Playing => {
            let speed = match snapshot.playback_speed {
                PlaybackSpeed::Native => "native",
                PlaybackSpeed::Slow => "slow",
            };
            let _ = writeln!(out, "  ♪ playing ({})", speed);
        }
        Phase::Loaded => {
            let _ = writeln!(out, "  press p to listen");
        }
        _ => {}
    }

    if let Some(diff) = &snapshot.diff {
        let marks: String = diff.iter().map(|s| status_mark(*s)).collect();
        let _ = writeln!(out, "    {}", marks);
    }

    if let Some(correct) = snapshot.last_correct {
        if correct {
            let _ = writeln!(out, "  correct!");
        } else {
            let _ = writeln!(out, "  wrong, press n for a new challenge");
        }
        if let Some(answer) = &task.revealed_answer {
            let _ = writeln!(out, "  answer: {}", answer);
        }
        for trap in &task.common_traps {
            let _ = writeln!(out, "  - {}", trap);
        }
        let table: Vec<String> = reference_table()
            .iter()
            .map(|t| format!("{} {} {}", t.symbol, t.hanzi, t.pinyin))
            .collect();
        let _ = writeln!(out, "  {}", table.join(" | "));
        if snapshot.auto_advance_pending {
            let _ = writeln!(out, "  next challenge coming up...");
        }
    } else if snapshot.can_submit {
        let _ = writeln!(out, "  press Enter to check");
    }

    out
}
