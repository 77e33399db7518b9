use std::{cell::RefCell, io, rc::Rc};

use chrono::NaiveDate;
use uuid::Uuid;

use engine::{
    Amount, Badge, BadgeUnlocked, Engine, EngineError, FixedClock, GapPolicy, JsonFileStorage,
    Ledger, MemoryStorage, Notifier, Reconciliation, Snapshot, SpendForm, StreakState, Storage,
};

/// Memory storage that tests can inspect and make fail.
#[derive(Clone, Default)]
struct SharedStorage {
    inner: Rc<RefCell<MemoryStorage>>,
    fail_saves: Rc<RefCell<bool>>,
    saves: Rc<RefCell<usize>>,
}

impl SharedStorage {
    fn fail_saves(&self, fail: bool) {
        *self.fail_saves.borrow_mut() = fail;
    }

    fn saves(&self) -> usize {
        *self.saves.borrow()
    }

    fn snapshot(&self) -> Snapshot {
        self.inner.borrow().load().unwrap()
    }
}

impl Storage for SharedStorage {
    fn load(&self) -> Result<Snapshot, EngineError> {
        self.inner.borrow().load()
    }

    fn save(&mut self, ledger: &Ledger, streak: &StreakState) -> Result<(), EngineError> {
        if *self.fail_saves.borrow() {
            return Err(io::Error::other("disk full").into());
        }
        *self.saves.borrow_mut() += 1;
        self.inner.borrow_mut().save(ledger, streak)
    }
}

#[derive(Clone, Default)]
struct RecordingNotifier(Rc<RefCell<Vec<BadgeUnlocked>>>);

impl RecordingNotifier {
    fn taken(&self) -> Vec<BadgeUnlocked> {
        std::mem::take(&mut self.0.borrow_mut())
    }
}

impl Notifier for RecordingNotifier {
    fn badge_unlocked(&mut self, event: BadgeUnlocked) {
        self.0.borrow_mut().push(event);
    }
}

fn day(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, m, d).unwrap()
}

fn bakery() -> SpendForm {
    SpendForm::new()
        .category("padaria")
        .amount("6,50")
        .description("pão francês")
        .payment_method("dinheiro")
}

fn engine_with(
    storage: &SharedStorage,
    clock: &FixedClock,
    notifier: &RecordingNotifier,
    policy: GapPolicy,
) -> Engine {
    Engine::builder()
        .storage(storage.clone())
        .clock(clock.clone())
        .notifier(notifier.clone())
        .gap_policy(policy)
        .build()
        .unwrap()
}

#[test]
fn first_start_tracks_today_and_persists() {
    let storage = SharedStorage::default();
    let clock = FixedClock::new(day(1, 1));
    let notifier = RecordingNotifier::default();
    let mut engine = engine_with(&storage, &clock, &notifier, GapPolicy::PerDay);

    assert_eq!(engine.reconcile_on_startup().unwrap(), Reconciliation::FirstRun);
    assert_eq!(storage.saves(), 1);
    assert_eq!(
        storage.snapshot().streak.last_reconciled_date,
        Some(day(1, 1))
    );

    // Same day again: nothing to do, nothing saved.
    assert_eq!(
        engine.reconcile_on_startup().unwrap(),
        Reconciliation::AlreadyReconciled
    );
    assert_eq!(storage.saves(), 1);
}

#[test]
fn quiet_days_unlock_badges_across_restarts() {
    let storage = SharedStorage::default();
    let clock = FixedClock::new(day(1, 1));
    let notifier = RecordingNotifier::default();

    engine_with(&storage, &clock, &notifier, GapPolicy::PerDay)
        .reconcile_on_startup()
        .unwrap();

    for _ in 0..3 {
        clock.advance(1);
        engine_with(&storage, &clock, &notifier, GapPolicy::PerDay)
            .reconcile_on_startup()
            .unwrap();
    }

    let snapshot = storage.snapshot();
    assert_eq!(snapshot.streak.consecutive_days, 3);
    assert_eq!(snapshot.streak.last_reconciled_date, Some(day(1, 4)));
    assert_eq!(
        notifier.taken(),
        vec![BadgeUnlocked(Badge::OneDay), BadgeUnlocked(Badge::ThreeDays)]
    );
}

#[test]
fn spend_resets_streak_and_persists_with_event() {
    let storage = SharedStorage::default();
    let clock = FixedClock::new(day(1, 1));
    let notifier = RecordingNotifier::default();
    let mut engine = engine_with(&storage, &clock, &notifier, GapPolicy::PerDay);
    engine.reconcile_on_startup().unwrap();
    clock.advance(7);
    engine.reconcile_on_startup().unwrap();
    assert_eq!(engine.streak().consecutive_days, 7);

    let event = engine.register_spend(&bakery()).unwrap();

    assert_eq!(event.date, day(1, 8));
    assert_eq!(event.amount_minor, Amount::new(650));
    assert_eq!(engine.streak().consecutive_days, 0);
    assert_eq!(engine.streak().last_reconciled_date, Some(day(1, 8)));
    assert!(engine.streak().has_badge(Badge::SevenDays));

    let snapshot = storage.snapshot();
    assert_eq!(snapshot.ledger.events(), &[event]);
    assert_eq!(snapshot.streak.consecutive_days, 0);

    // The day with the spend breaks the streak at the next rollover.
    clock.advance(1);
    engine.reconcile_on_startup().unwrap();
    assert_eq!(engine.streak().consecutive_days, 0);
    clock.advance(1);
    engine.reconcile_on_startup().unwrap();
    assert_eq!(engine.streak().consecutive_days, 1);
}

#[test]
fn spend_after_midnight_reconciles_the_previous_day_first() {
    let storage = SharedStorage::default();
    let clock = FixedClock::new(day(3, 1));
    let notifier = RecordingNotifier::default();
    let mut engine = engine_with(&storage, &clock, &notifier, GapPolicy::PerDay);
    engine.reconcile_on_startup().unwrap();

    // The process stays up past midnight.
    clock.advance(1);
    engine.register_spend(&bakery()).unwrap();

    assert_eq!(engine.streak().last_reconciled_date, Some(day(3, 2)));
    assert_eq!(engine.streak().consecutive_days, 0);
    // 1st of March had no spend, so its badge is earned.
    assert_eq!(notifier.taken(), vec![BadgeUnlocked(Badge::OneDay)]);
    assert!(storage.snapshot().streak.has_badge(Badge::OneDay));
}

#[test]
fn failed_save_is_not_committed() {
    let storage = SharedStorage::default();
    let clock = FixedClock::new(day(1, 1));
    let notifier = RecordingNotifier::default();
    let mut engine = engine_with(&storage, &clock, &notifier, GapPolicy::PerDay);
    engine.reconcile_on_startup().unwrap();

    clock.advance(3);
    storage.fail_saves(true);
    let err = engine.reconcile_on_startup().unwrap_err();
    assert!(matches!(err, EngineError::Io(_)));
    assert_eq!(engine.streak().consecutive_days, 0);
    assert_eq!(engine.streak().last_reconciled_date, Some(day(1, 1)));
    assert!(notifier.taken().is_empty());

    assert!(engine.register_spend(&bakery()).is_err());
    assert!(engine.ledger().events().is_empty());

    // Retry once the disk is back.
    storage.fail_saves(false);
    engine.reconcile_on_startup().unwrap();
    assert_eq!(engine.streak().consecutive_days, 3);
    assert_eq!(
        notifier.taken(),
        vec![BadgeUnlocked(Badge::OneDay), BadgeUnlocked(Badge::ThreeDays)]
    );
}

#[test]
fn invalid_form_leaves_everything_untouched() {
    let storage = SharedStorage::default();
    let clock = FixedClock::new(day(1, 1));
    let notifier = RecordingNotifier::default();
    let mut engine = engine_with(&storage, &clock, &notifier, GapPolicy::PerDay);
    engine.reconcile_on_startup().unwrap();
    let saves = storage.saves();

    let err = engine.register_spend(&bakery().amount("abc")).unwrap_err();

    assert_eq!(err, EngineError::InvalidAmount("invalid amount".to_string()));
    assert!(engine.ledger().events().is_empty());
    assert_eq!(storage.saves(), saves);
}

#[test]
fn collapse_policy_counts_a_gap_as_one_day() {
    let storage = SharedStorage::default();
    let clock = FixedClock::new(day(1, 1));
    let notifier = RecordingNotifier::default();
    let mut engine = engine_with(&storage, &clock, &notifier, GapPolicy::Collapse);
    engine.reconcile_on_startup().unwrap();

    clock.advance(10);
    let outcome = engine.reconcile_on_startup().unwrap();

    assert_eq!(
        outcome,
        Reconciliation::Advanced {
            days_closed: 1,
            consecutive_days: 1,
            unlocked: vec![BadgeUnlocked(Badge::OneDay)],
        }
    );
}

#[test]
fn views_follow_engine_state() {
    let storage = SharedStorage::default();
    let clock = FixedClock::new(day(2, 10));
    let notifier = RecordingNotifier::default();
    let mut engine = engine_with(&storage, &clock, &notifier, GapPolicy::PerDay);
    engine.reconcile_on_startup().unwrap();
    engine.register_spend(&bakery()).unwrap();

    let dashboard = engine.dashboard();
    assert_eq!(dashboard.total_today, Amount::new(650));
    assert_eq!(dashboard.events.len(), 1);

    let report = engine.daily_report(day(2, 10));
    assert_eq!(report.top_category.as_deref(), Some("Padaria"));
    assert_eq!(report.top_payment_method.as_deref(), Some("Dinheiro"));

    assert_eq!(engine.month_calendar().days.len(), 29);
}

fn test_store_path() -> std::path::PathBuf {
    let root =
        std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_stores");
    std::fs::create_dir_all(&root).unwrap();
    root.join(format!("store_{}.json", Uuid::now_v7()))
}

#[test]
fn file_storage_round_trip() {
    let path = test_store_path();
    let clock = FixedClock::new(day(4, 1));

    let mut engine = Engine::builder()
        .storage(JsonFileStorage::new(&path))
        .clock(clock.clone())
        .build()
        .unwrap();
    engine.reconcile_on_startup().unwrap();
    engine.register_spend(&bakery()).unwrap();
    let ledger = engine.ledger().clone();
    let streak = engine.streak().clone();

    let snapshot = JsonFileStorage::new(&path).load().unwrap();
    assert_eq!(snapshot.ledger, ledger);
    assert_eq!(snapshot.streak, streak);

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn file_storage_missing_file_is_default() {
    let path = test_store_path();
    assert_eq!(
        JsonFileStorage::new(&path).load().unwrap(),
        Snapshot::default()
    );
}

#[test]
fn file_storage_backs_up_corrupted_store() {
    let path = test_store_path();
    std::fs::write(&path, "{\"ledger\": [").unwrap();
    let storage = JsonFileStorage::new(&path);

    assert_eq!(storage.load().unwrap(), Snapshot::default());
    assert_eq!(
        std::fs::read_to_string(storage.backup_path()).unwrap(),
        "{\"ledger\": ["
    );

    std::fs::remove_file(storage.backup_path()).unwrap();
    std::fs::remove_file(&path).unwrap();
}
