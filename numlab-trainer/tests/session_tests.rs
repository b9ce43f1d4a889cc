//! Session lifecycle tests: answering, streaks, auto-advance, persistence

mod helpers;

use helpers::SessionBuilder;
use numlab_common::config::SessionConfig;
use numlab_common::events::{DigitStatus, LabEvent, Phase, ScoreRecord, TaskKind};
use numlab_trainer::storage::{ScoreStore, BEST_STREAK_KEY, SCORE_KEY};
use numlab_trainer::{Command, SessionEvent, Task};
use std::time::Duration;
use tokio::time::Instant;

fn code(answer: &str) -> Task {
    Task::new(TaskKind::DeliveryCode, answer).unwrap()
}

fn phone(answer: &str) -> Task {
    Task::new(TaskKind::PhoneNumber, answer).unwrap()
}

fn no_auto_advance() -> SessionConfig {
    SessionConfig {
        auto_advance: false,
        ..SessionConfig::default()
    }
}

#[tokio::test]
async fn test_start_loads_first_task() {
    let mut s = SessionBuilder::new().build();
    assert_eq!(s.controller.snapshot().phase, Phase::Idle);

    s.controller.start().await;
    let snapshot = s.controller.snapshot();
    assert_eq!(snapshot.phase, Phase::Loaded);
    assert_eq!(snapshot.generation, 1);
    assert!(snapshot.task.is_some());
    assert_eq!(snapshot.user_input, "");

    let events = s.lab_events();
    assert!(matches!(events[0], LabEvent::SessionStarted { high_score: 0, .. }));
    assert!(matches!(events[1], LabEvent::TaskLoaded { generation: 1, .. }));
}

#[tokio::test(start_paused = true)]
async fn test_correct_pickup_code_schedules_auto_advance() {
    let mut s = SessionBuilder::new().build().with_task(code("4821")).await;
    let generation = s.controller.snapshot().generation;

    s.type_text("4821").await;
    assert!(s.controller.snapshot().can_submit);
    s.send(Command::Submit).await;

    let snapshot = s.controller.snapshot();
    assert_eq!(snapshot.phase, Phase::Checked);
    assert_eq!(snapshot.last_correct, Some(true));
    assert_eq!(snapshot.streak, 1);
    assert_eq!(snapshot.high_score, 1);
    assert!(snapshot.auto_advance_pending);
    assert_eq!(snapshot.diff, Some(vec![DigitStatus::Correct; 4]));

    // Success cue: 0.3 s at the test sample rate
    assert_eq!(s.sink.cue_lengths(), vec![2_400]);
    assert_eq!(s.store.peek(BEST_STREAK_KEY).as_deref(), Some("1"));
    assert_eq!(s.store.peek(SCORE_KEY).as_deref(), Some(r#"{"correct":1,"total":1}"#));

    let before = Instant::now();
    assert!(s.controller.step().await);
    assert!(before.elapsed() >= Duration::from_millis(1500));

    let next = s.controller.snapshot();
    assert_eq!(next.generation, generation + 1);
    assert_eq!(next.phase, Phase::Loaded);
    assert_eq!(next.streak, 1);
    assert!(!next.auto_advance_pending);
}

#[tokio::test(start_paused = true)]
async fn test_wrong_last_digit_resets_streak() {
    let mut s = SessionBuilder::new().build().with_task(code("4821")).await;
    s.type_text("4821").await;
    s.send(Command::Submit).await;
    assert_eq!(s.controller.snapshot().streak, 1);

    s.controller.load_task(phone("13812345678"));
    s.type_text("13812345670").await;
    s.send(Command::Submit).await;

    let snapshot = s.controller.snapshot();
    assert_eq!(snapshot.last_correct, Some(false));
    let diff = snapshot.diff.unwrap();
    assert_eq!(diff.len(), 11);
    assert!(diff[..10].iter().all(|d| *d == DigitStatus::Correct));
    assert_eq!(diff[10], DigitStatus::Incorrect);

    assert_eq!(snapshot.streak, 0);
    assert_eq!(snapshot.high_score, 1);
    assert_eq!(snapshot.score, ScoreRecord { correct: 1, total: 2 });
    assert!(!snapshot.auto_advance_pending);
    // Error cue: 0.2 s after the success cue
    assert_eq!(s.sink.cue_lengths(), vec![2_400, 1_600]);

    // Wrong answers wait for an explicit next challenge
    let generation = snapshot.generation;
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(s.controller.drain().await, 0);
    assert_eq!(s.controller.snapshot().generation, generation);
    assert_eq!(s.controller.snapshot().phase, Phase::Checked);

    s.send(Command::NextChallenge).await;
    let next = s.controller.snapshot();
    assert_eq!(next.generation, generation + 1);
    assert_eq!(next.phase, Phase::Loaded);
}

#[tokio::test]
async fn test_short_input_cannot_be_submitted() {
    let mut s = SessionBuilder::new().build().with_task(phone("13812345678")).await;
    s.type_text("138").await;

    let snapshot = s.controller.snapshot();
    assert!(!snapshot.can_submit);
    assert_eq!(snapshot.phase, Phase::Answering);

    s.send(Command::Submit).await;
    let snapshot = s.controller.snapshot();
    assert_eq!(snapshot.phase, Phase::Answering);
    assert_eq!(snapshot.last_correct, None);
    assert_eq!(snapshot.score.total, 0);
    assert_eq!(s.sink.cue_count(), 0);
}

#[tokio::test]
async fn test_input_edge_policy() {
    let mut s = SessionBuilder::new().build().with_task(code("4821")).await;

    s.type_text("48.a21999").await;
    assert_eq!(s.controller.snapshot().user_input, "4821");

    s.send(Command::Backspace).await;
    assert_eq!(s.controller.snapshot().user_input, "482");
    s.send(Command::Clear).await;
    assert_eq!(s.controller.snapshot().phase, Phase::Loaded);

    s.controller
        .load_task(Task::new(TaskKind::TotalPrice, "23.40").unwrap());
    s.type_text("23.40").await;
    assert_eq!(s.controller.snapshot().user_input, "23.40");
    assert!(s.controller.snapshot().can_submit);
}

#[tokio::test]
async fn test_next_challenge_ignored_until_checked() {
    let mut s = SessionBuilder::new().build().with_task(code("4821")).await;
    let generation = s.controller.snapshot().generation;

    s.type_text("48").await;
    s.send(Command::NextChallenge).await;
    assert_eq!(s.controller.snapshot().generation, generation);
    assert_eq!(s.controller.snapshot().user_input, "48");
}

#[tokio::test]
async fn test_input_rejected_after_check() {
    let mut s = SessionBuilder::new()
        .session_config(no_auto_advance())
        .build()
        .with_task(code("4821"))
        .await;
    s.type_text("4820").await;
    s.send(Command::Submit).await;

    s.send(Command::Backspace).await;
    s.send(Command::PressDigit('1')).await;
    s.send(Command::Submit).await;

    let snapshot = s.controller.snapshot();
    assert_eq!(snapshot.user_input, "4820");
    assert_eq!(snapshot.score.total, 1);
    assert_eq!(s.sink.cue_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stale_auto_advance_is_discarded() {
    let mut s = SessionBuilder::new().build().with_task(code("4821")).await;
    s.type_text("4821").await;
    s.send(Command::Submit).await;
    let checked_generation = s.controller.snapshot().generation;

    // Move on manually before the timer fires
    s.send(Command::NextChallenge).await;
    let generation = s.controller.snapshot().generation;
    assert_eq!(generation, checked_generation + 1);
    s.type_text("1").await;

    // A late event for the old generation changes nothing
    s.controller
        .handle_event(SessionEvent::AutoAdvance {
            generation: checked_generation,
        })
        .await;
    let snapshot = s.controller.snapshot();
    assert_eq!(snapshot.generation, generation);
    assert_eq!(snapshot.user_input, "1");

    // And the real timer was cancelled
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(s.controller.drain().await, 0);
    assert_eq!(s.controller.snapshot().generation, generation);
}

#[tokio::test(start_paused = true)]
async fn test_auto_advance_disabled() {
    let mut s = SessionBuilder::new()
        .session_config(no_auto_advance())
        .build()
        .with_task(code("4821"))
        .await;
    s.type_text("4821").await;
    s.send(Command::Submit).await;
    assert!(!s.controller.snapshot().auto_advance_pending);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(s.controller.drain().await, 0);
    assert_eq!(s.controller.snapshot().phase, Phase::Checked);
}

#[tokio::test]
async fn test_high_score_only_written_when_raised() {
    let mut s = SessionBuilder::new()
        .session_config(no_auto_advance())
        .build()
        .with_task(code("1111"))
        .await;

    for _ in 0..2 {
        s.type_text("1111").await;
        s.send(Command::Submit).await;
        s.controller.load_task(code("1111"));
    }
    assert_eq!(s.store.peek(BEST_STREAK_KEY).as_deref(), Some("2"));

    // Break the streak, then one more correct answer: 1 < 2, no write
    s.type_text("0000").await;
    s.send(Command::Submit).await;
    s.controller.load_task(code("1111"));
    s.store.set(BEST_STREAK_KEY, "sentinel").await.unwrap();
    s.type_text("1111").await;
    s.send(Command::Submit).await;

    assert_eq!(s.controller.snapshot().high_score, 2);
    assert_eq!(s.store.peek(BEST_STREAK_KEY).as_deref(), Some("sentinel"));
}

#[tokio::test]
async fn test_resets_clear_state_and_storage() {
    let mut s = SessionBuilder::new()
        .session_config(no_auto_advance())
        .build()
        .with_task(code("4821"))
        .await;
    s.type_text("4821").await;
    s.send(Command::Submit).await;
    s.lab_events();

    s.send(Command::ResetHighScore).await;
    s.send(Command::ResetScore).await;

    let snapshot = s.controller.snapshot();
    assert_eq!(snapshot.high_score, 0);
    assert_eq!(snapshot.streak, 0);
    assert_eq!(snapshot.score, ScoreRecord::default());
    assert_eq!(s.store.peek(BEST_STREAK_KEY), None);
    assert_eq!(s.store.peek(SCORE_KEY), None);

    let events = s.lab_events();
    assert!(matches!(events[0], LabEvent::HighScoreReset { .. }));
    assert!(matches!(events[1], LabEvent::ScoreReset { .. }));
}

#[tokio::test]
async fn test_high_score_reset_mid_streak_keeps_best_above_streak() {
    let mut s = SessionBuilder::new()
        .session_config(no_auto_advance())
        .build()
        .with_task(code("4821"))
        .await;
    s.type_text("4821").await;
    s.send(Command::Submit).await;
    assert_eq!(s.controller.snapshot().streak, 1);

    s.send(Command::ResetHighScore).await;
    let snapshot = s.controller.snapshot();
    assert!(snapshot.high_score >= snapshot.streak);
    assert_eq!((snapshot.streak, snapshot.high_score), (0, 0));

    // A fresh streak is recorded again
    s.send(Command::NextChallenge).await;
    s.controller.load_task(code("1111"));
    s.type_text("1111").await;
    s.send(Command::Submit).await;
    let snapshot = s.controller.snapshot();
    assert_eq!((snapshot.streak, snapshot.high_score), (1, 1));
    assert_eq!(s.store.peek(BEST_STREAK_KEY).as_deref(), Some("1"));
}

#[tokio::test]
async fn test_scores_survive_restart() {
    let store = numlab_trainer::MemoryScoreStore::new();
    {
        let mut s = SessionBuilder::new()
            .session_config(no_auto_advance())
            .store(store.clone())
            .build()
            .with_task(code("4821"))
            .await;
        s.type_text("4821").await;
        s.send(Command::Submit).await;
        s.controller.load_task(code("5555"));
        s.type_text("5555").await;
        s.send(Command::Submit).await;
        s.controller.load_task(code("9999"));
        s.type_text("9990").await;
        s.send(Command::Submit).await;
    }

    let mut s = SessionBuilder::new().store(store).build();
    s.controller.start().await;
    let snapshot = s.controller.snapshot();
    assert_eq!(snapshot.high_score, 2);
    assert_eq!(snapshot.score, ScoreRecord { correct: 2, total: 3 });
    assert_eq!(snapshot.streak, 0);
}

#[tokio::test]
async fn test_corrupt_scores_fall_back_to_defaults() {
    let store = numlab_trainer::MemoryScoreStore::new();
    store.set(BEST_STREAK_KEY, "-3").await.unwrap();
    store.set(SCORE_KEY, "[1,2]").await.unwrap();

    let mut s = SessionBuilder::new().store(store).build();
    s.controller.start().await;
    let snapshot = s.controller.snapshot();
    assert_eq!(snapshot.high_score, 0);
    assert_eq!(snapshot.streak, 0);
    assert_eq!(snapshot.score, ScoreRecord::default());
}

#[tokio::test]
async fn test_failing_store_keeps_session_usable() {
    let store = numlab_trainer::MemoryScoreStore::new();
    store.set_failing(true);

    let mut s = SessionBuilder::new()
        .store(store)
        .build()
        .with_task(code("4821"))
        .await;
    s.type_text("4821").await;
    s.send(Command::Submit).await;

    let snapshot = s.controller.snapshot();
    assert_eq!(snapshot.last_correct, Some(true));
    assert_eq!(snapshot.high_score, 1);
    assert_eq!(snapshot.score.total, 1);
}

#[tokio::test]
async fn test_run_processes_queue_until_shutdown() {
    let mut s = SessionBuilder::new().build().with_task(code("4821")).await;
    let handle = s.controller.handle();
    assert!(handle.send_all([
        Command::PressDigit('4'),
        Command::PressDigit('8'),
        Command::Shutdown,
        Command::PressDigit('2'),
    ]));

    s.controller.run().await;
    assert!(!s.controller.is_running());
    assert_eq!(s.controller.snapshot().user_input, "48");
    assert!(s
        .lab_events()
        .iter()
        .any(|e| matches!(e, LabEvent::SessionEnded { .. })));
}

#[tokio::test]
async fn test_kind_filter_from_config() {
    let config = SessionConfig {
        kind: Some(TaskKind::TotalPrice),
        ..SessionConfig::default()
    };
    let mut s = SessionBuilder::new().session_config(config).build();
    s.controller.start().await;

    for _ in 0..5 {
        let task = s.controller.snapshot().task.unwrap();
        assert_eq!(task.kind, TaskKind::TotalPrice);

        // Answer with a known price, then let the filter pick the next one
        s.controller
            .load_task(Task::new(TaskKind::TotalPrice, "10.00").unwrap());
        s.type_text("10.00").await;
        s.send(Command::Submit).await;
        s.send(Command::NextChallenge).await;
    }
}
