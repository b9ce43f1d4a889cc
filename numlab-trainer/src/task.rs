//! Task generation
//!
//! Each task is one spoken number the learner has to transcribe. Generation
//! grammar per kind:
//! - **PhoneNumber**: 11 digits, carrier prefix from {13,15,17,18,19}, then 9 random digits
//! - **DeliveryCode**: 4, 5 or 6 random digits
//! - **TotalPrice**: whole part in [10,509], two-digit zero-padded fraction, `"{whole}.{frac}"`
//!
//! Kind selection is a uniform independent draw per task; consecutive tasks
//! may repeat a kind.

use crate::error::{Error, Result};
use numlab_common::events::{Difficulty, TaskKind, TaskView};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Mobile carrier prefixes
pub const CARRIER_PREFIXES: [&str; 5] = ["13", "15", "17", "18", "19"];

/// Total phone number length
pub const PHONE_LENGTH: usize = 11;

/// Allowed pickup code lengths
pub const DELIVERY_CODE_LENGTHS: [usize; 3] = [4, 5, 6];

/// Inclusive range of the price's whole part
pub const PRICE_WHOLE_RANGE: std::ops::RangeInclusive<u32> = 10..=509;

/// Decimal separator in price answers
pub const DECIMAL_SEPARATOR: char = '.';

/// Static presentation data for a task kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayMeta {
    pub label: &'static str,
    pub icon: &'static str,
    pub scenario: &'static str,
    pub difficulty: Difficulty,
    /// Listening pitfalls shown after the answer is checked
    pub common_traps: &'static [&'static str],
}

impl DisplayMeta {
    /// Presentation data for a kind
    pub fn for_kind(kind: TaskKind) -> Self {
        match kind {
            TaskKind::PhoneNumber => DisplayMeta {
                label: "Phone Number",
                icon: "📱",
                scenario: "A shop assistant reads back your mobile number",
                difficulty: Difficulty::Hard,
                common_traps: &[
                    "1 is often read as yāo (幺) in phone numbers",
                    "Numbers are chunked 3-4-4 with short pauses",
                    "qī (七) and yī (一) sound alike at speed",
                ],
            },
            TaskKind::DeliveryCode => DisplayMeta {
                label: "Pickup Code",
                icon: "📦",
                scenario: "The parcel station calls out your pickup code",
                difficulty: Difficulty::Easy,
                common_traps: &[
                    "sì (四) and shí (十) differ only in the initial",
                    "Codes can start with líng (零)",
                ],
            },
            TaskKind::TotalPrice => DisplayMeta {
                label: "Total Price",
                icon: "💴",
                scenario: "The cashier tells you the total at checkout",
                difficulty: Difficulty::Medium,
                common_traps: &[
                    "diǎn (点) marks the decimal point",
                    "Cashiers may say kuài/máo/fēn instead of digits",
                    "A trailing líng (零) in the cents is easy to miss",
                ],
            },
        }
    }
}

/// One generated listening challenge
///
/// Immutable once created; the answer always matches its kind's grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    kind: TaskKind,
    answer: String,
    display: DisplayMeta,
}

impl Task {
    /// Build a task from a known answer, validating it against the kind's grammar
    pub fn new(kind: TaskKind, answer: impl Into<String>) -> Result<Self> {
        let answer = answer.into();
        if !matches_grammar(kind, &answer) {
            return Err(Error::InvalidTask(format!(
                "'{}' is not a valid {} answer",
                answer, kind
            )));
        }
        Ok(Self::from_generated(kind, answer))
    }

    fn from_generated(kind: TaskKind, answer: String) -> Self {
        Self {
            kind,
            answer,
            display: DisplayMeta::for_kind(kind),
        }
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    /// Number of characters the learner must enter (separator included)
    pub fn expected_length(&self) -> usize {
        self.answer.chars().count()
    }

    pub fn display(&self) -> &DisplayMeta {
        &self.display
    }

    /// Whether a typed character is acceptable for this task
    ///
    /// Digits always are; the decimal separator only for prices.
    pub fn accepts_char(&self, c: char) -> bool {
        c.is_ascii_digit() || (c == DECIMAL_SEPARATOR && self.kind.accepts_decimal())
    }

    /// Presentation view; the answer is revealed only when requested
    pub fn view(&self, reveal_answer: bool) -> TaskView {
        TaskView {
            kind: self.kind,
            label: self.display.label.to_string(),
            icon: self.display.icon.to_string(),
            scenario: self.display.scenario.to_string(),
            difficulty: self.display.difficulty,
            expected_length: self.expected_length(),
            common_traps: self
                .display
                .common_traps
                .iter()
                .map(|t| t.to_string())
                .collect(),
            revealed_answer: reveal_answer.then(|| self.answer.clone()),
        }
    }
}

/// Check an answer string against a kind's generation grammar
pub fn matches_grammar(kind: TaskKind, answer: &str) -> bool {
    let all_digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());

    match kind {
        TaskKind::PhoneNumber => {
            answer.len() == PHONE_LENGTH
                && all_digits(answer)
                && CARRIER_PREFIXES.iter().any(|p| answer.starts_with(p))
        }
        TaskKind::DeliveryCode => {
            DELIVERY_CODE_LENGTHS.contains(&answer.len()) && all_digits(answer)
        }
        TaskKind::TotalPrice => {
            let Some((whole, frac)) = answer.split_once(DECIMAL_SEPARATOR) else {
                return false;
            };
            if !all_digits(whole) || !all_digits(frac) || frac.len() != 2 {
                return false;
            }
            // Whole part is printed without leading zeros
            if whole.len() > 1 && whole.starts_with('0') {
                return false;
            }
            whole
                .parse::<u32>()
                .map(|w| PRICE_WHOLE_RANGE.contains(&w))
                .unwrap_or(false)
        }
    }
}

/// Produces tasks from an injectable random source
///
/// # Examples
///
/// ```
/// use numlab_trainer::task::{matches_grammar, TaskGenerator};
///
/// let mut generator = TaskGenerator::seeded(7);
/// let task = generator.generate();
/// assert!(matches_grammar(task.kind(), task.answer()));
/// assert_eq!(task.expected_length(), task.answer().len());
/// ```
pub struct TaskGenerator<R = StdRng> {
    rng: R,
    kind_filter: Option<TaskKind>,
}

impl TaskGenerator<StdRng> {
    /// Generator seeded from OS entropy
    pub fn from_entropy() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic generator
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> TaskGenerator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng,
            kind_filter: None,
        }
    }

    /// Pin generation to one kind (None restores the uniform draw)
    pub fn with_kind_filter(mut self, kind: Option<TaskKind>) -> Self {
        self.kind_filter = kind;
        self
    }

    /// Generate the next task
    pub fn generate(&mut self) -> Task {
        let kind = match self.kind_filter {
            Some(kind) => kind,
            None => TaskKind::ALL[self.rng.gen_range(0..TaskKind::ALL.len())],
        };
        self.generate_kind(kind)
    }

    /// Generate a task of a specific kind
    pub fn generate_kind(&mut self, kind: TaskKind) -> Task {
        let answer = match kind {
            TaskKind::PhoneNumber => self.phone_number(),
            TaskKind::DeliveryCode => self.delivery_code(),
            TaskKind::TotalPrice => self.total_price(),
        };
        Task::from_generated(kind, answer)
    }

    fn phone_number(&mut self) -> String {
        let prefix = CARRIER_PREFIXES[self.rng.gen_range(0..CARRIER_PREFIXES.len())];
        let mut answer = String::with_capacity(PHONE_LENGTH);
        answer.push_str(prefix);
        self.push_digits(&mut answer, PHONE_LENGTH - prefix.len());
        answer
    }

    fn delivery_code(&mut self) -> String {
        let len = DELIVERY_CODE_LENGTHS[self.rng.gen_range(0..DELIVERY_CODE_LENGTHS.len())];
        let mut answer = String::with_capacity(len);
        self.push_digits(&mut answer, len);
        answer
    }

    fn total_price(&mut self) -> String {
        let whole = self.rng.gen_range(PRICE_WHOLE_RANGE);
        let frac = self.rng.gen_range(0..=99u32);
        format!("{}{}{:02}", whole, DECIMAL_SEPARATOR, frac)
    }

    fn push_digits(&mut self, out: &mut String, count: usize) {
        for _ in 0..count {
            let digit = self.rng.gen_range(0..10u32);
            // gen_range(0..10) is always a valid radix-10 digit
            out.push(char::from_digit(digit, 10).unwrap_or('0'));
        }
    }
}
