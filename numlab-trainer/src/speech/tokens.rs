//! Digit-to-token table
//!
//! Every answer character maps to exactly one spoken token. Tokens are joined
//! with a full-width comma so the engine leaves an audible gap between digits.

use crate::task::Task;
use numlab_common::events::TaskKind;

/// Pause inserted between spoken tokens
pub const PAUSE_MARKER: &str = "，";

/// A spoken token with its pinyin reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpokenToken {
    pub symbol: char,
    pub hanzi: &'static str,
    pub pinyin: &'static str,
}

const TABLE: [SpokenToken; 11] = [
    SpokenToken { symbol: '0', hanzi: "零", pinyin: "líng" },
    SpokenToken { symbol: '1', hanzi: "一", pinyin: "yī" },
    SpokenToken { symbol: '2', hanzi: "二", pinyin: "èr" },
    SpokenToken { symbol: '3', hanzi: "三", pinyin: "sān" },
    SpokenToken { symbol: '4', hanzi: "四", pinyin: "sì" },
    SpokenToken { symbol: '5', hanzi: "五", pinyin: "wǔ" },
    SpokenToken { symbol: '6', hanzi: "六", pinyin: "liù" },
    SpokenToken { symbol: '7', hanzi: "七", pinyin: "qī" },
    SpokenToken { symbol: '8', hanzi: "八", pinyin: "bā" },
    SpokenToken { symbol: '9', hanzi: "九", pinyin: "jiǔ" },
    SpokenToken { symbol: '.', hanzi: "点", pinyin: "diǎn" },
];

/// Phone-style reading of 1
const YAO: SpokenToken = SpokenToken { symbol: '1', hanzi: "幺", pinyin: "yāo" };

/// Token for one answer character
pub fn token_for(symbol: char) -> Option<SpokenToken> {
    TABLE.iter().copied().find(|t| t.symbol == symbol)
}

/// The full reference table, in display order
pub fn reference_table() -> &'static [SpokenToken] {
    &TABLE
}

/// Text to hand to the speech engine for a task
///
/// Characters outside the table are skipped; generated answers never
/// contain any.
pub fn utterance(task: &Task, phone_one_as_yao: bool) -> String {
    let yao = phone_one_as_yao && task.kind() == TaskKind::PhoneNumber;

    task.answer()
        .chars()
        .filter_map(|c| if yao && c == '1' { Some(YAO) } else { token_for(c) })
        .map(|t| t.hanzi)
        .collect::<Vec<_>>()
        .join(PAUSE_MARKER)
}
