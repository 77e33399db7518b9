use chrono::NaiveDate;

pub use categories::{Category, CategoryCatalog};
pub use clock::{Clock, FixedClock, SystemClock};
pub use commands::SpendForm;
pub use error::EngineError;
pub use ledger::{Ledger, SpendEvent};
pub use money::Amount;
pub use notify::{LogNotifier, Notifier};
pub use storage::{JsonFileStorage, MemoryStorage, SCHEMA_VERSION, Snapshot, Storage};
pub use streak::{
    Badge, BadgeUnlocked, GapPolicy, Reconciliation, StreakEngine, StreakState,
};
pub use views::{
    BadgeStatus, CalendarDay, DailyReport, Dashboard, DateLabel, DayStatus, EventRow,
    MonthCalendar,
};

mod categories;
mod clock;
mod commands;
mod error;
mod ledger;
mod money;
mod notify;
mod storage;
mod streak;
mod views;

type ResultEngine<T> = Result<T, EngineError>;

/// The application core: one ledger, one streak record and the
/// collaborators they are persisted and announced through.
///
/// Every mutation is staged on copies, saved, and only then committed to
/// memory and announced. When the save fails the engine keeps its previous
/// state and the operation can simply be retried.
pub struct Engine {
    ledger: Ledger,
    streak: StreakEngine,
    storage: Box<dyn Storage>,
    clock: Box<dyn Clock>,
    notifier: Box<dyn Notifier>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn streak(&self) -> &StreakState {
        self.streak.state()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Advances the streak to the clock's current day and persists the
    /// result when anything changed.
    pub fn reconcile_on_startup(&mut self) -> ResultEngine<Reconciliation> {
        let today = self.clock.today();
        let mut staged = self.streak.clone();
        let outcome = staged.reconcile_on_startup(today, &self.ledger);

        if outcome.needs_persist() {
            self.storage.save(&self.ledger, staged.state())?;
        }
        self.streak = staged;
        self.announce(outcome.unlocked());
        Ok(outcome)
    }

    /// Validates `form`, appends the event dated today and resets the
    /// streak, persisting both together.
    ///
    /// A day rollover that happened while the process was running is
    /// reconciled first, so the new event cannot be mistaken for a spend on
    /// the previously tracked day.
    pub fn register_spend(&mut self, form: &SpendForm) -> ResultEngine<SpendEvent> {
        let today = self.clock.today();
        let event = form.validate(self.ledger.categories(), today, self.clock.now())?;

        let mut streak = self.streak.clone();
        let outcome = streak.reconcile_on_startup(today, &self.ledger);

        let mut ledger = self.ledger.clone();
        ledger.append(event.clone())?;
        streak.on_spend_registered();

        self.storage.save(&ledger, streak.state())?;
        tracing::info!(id = %event.id, amount = %event.amount_minor, category = %event.category, "spend registered");

        self.ledger = ledger;
        self.streak = streak;
        self.announce(outcome.unlocked());
        Ok(event)
    }

    pub fn dashboard(&self) -> Dashboard {
        Dashboard::build(&self.ledger, self.streak.state(), self.clock.today())
    }

    pub fn daily_report(&self, date: NaiveDate) -> DailyReport {
        DailyReport::build(&self.ledger, date, self.clock.today())
    }

    pub fn month_calendar(&self) -> MonthCalendar {
        MonthCalendar::build(&self.ledger, self.clock.today())
    }

    fn announce(&mut self, unlocked: &[BadgeUnlocked]) {
        for event in unlocked {
            self.notifier.badge_unlocked(*event);
        }
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    storage: Option<Box<dyn Storage>>,
    clock: Option<Box<dyn Clock>>,
    notifier: Option<Box<dyn Notifier>>,
    gap_policy: GapPolicy,
}

impl EngineBuilder {
    /// Pass the storage. Defaults to an empty [`MemoryStorage`].
    pub fn storage(mut self, storage: impl Storage + 'static) -> EngineBuilder {
        self.storage = Some(Box::new(storage));
        self
    }

    /// Pass the clock. Defaults to [`SystemClock`] in the local zone.
    pub fn clock(mut self, clock: impl Clock + 'static) -> EngineBuilder {
        self.clock = Some(Box::new(clock));
        self
    }

    /// Pass the notifier. Defaults to [`LogNotifier`].
    pub fn notifier(mut self, notifier: impl Notifier + 'static) -> EngineBuilder {
        self.notifier = Some(Box::new(notifier));
        self
    }

    pub fn gap_policy(mut self, gap_policy: GapPolicy) -> EngineBuilder {
        self.gap_policy = gap_policy;
        self
    }

    /// Construct `Engine` from the stored state.
    ///
    /// Nothing is reconciled yet: call [`Engine::reconcile_on_startup`].
    pub fn build(self) -> ResultEngine<Engine> {
        let storage = self
            .storage
            .unwrap_or_else(|| Box::new(MemoryStorage::new()));
        let Snapshot { ledger, streak } = storage.load()?;
        tracing::debug!(
            events = ledger.events().len(),
            consecutive_days = streak.consecutive_days,
            "engine state loaded"
        );

        Ok(Engine {
            ledger,
            streak: StreakEngine::new(streak, self.gap_policy),
            storage,
            clock: self
                .clock
                .unwrap_or_else(|| Box::new(SystemClock::default())),
            notifier: self.notifier.unwrap_or_else(|| Box::new(LogNotifier)),
        })
    }
}
