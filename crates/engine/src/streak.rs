//! The streak/badge state machine.
//!
//! [`StreakEngine`] owns the single [`StreakState`] record. It is pure: it
//! reads the [`Ledger`] but performs no I/O, so every operation here is
//! infallible. Persisting the result is the caller's job (see
//! [`Engine`](crate::Engine)).

use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::Ledger;

/// An unlockable achievement tied to a streak threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum Badge {
    OneDay,
    ThreeDays,
    SevenDays,
    ThirtyDays,
}

impl Badge {
    /// Every badge, in ascending threshold order.
    pub const ALL: [Badge; 4] = [
        Badge::OneDay,
        Badge::ThreeDays,
        Badge::SevenDays,
        Badge::ThirtyDays,
    ];

    /// Number of consecutive no-spend days needed to unlock the badge.
    #[must_use]
    pub const fn threshold(self) -> u32 {
        match self {
            Badge::OneDay => 1,
            Badge::ThreeDays => 3,
            Badge::SevenDays => 7,
            Badge::ThirtyDays => 30,
        }
    }
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.threshold() {
            1 => f.write_str("1 day"),
            n => write!(f, "{n} days"),
        }
    }
}

impl From<Badge> for u32 {
    fn from(badge: Badge) -> Self {
        badge.threshold()
    }
}

impl TryFrom<u32> for Badge {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Badge::ALL
            .into_iter()
            .find(|badge| badge.threshold() == value)
            .ok_or_else(|| format!("no badge for threshold {value}"))
    }
}

/// Emitted once per badge, the first time it unlocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BadgeUnlocked(pub Badge);

impl BadgeUnlocked {
    pub fn threshold(self) -> u32 {
        self.0.threshold()
    }
}

/// The persisted streak record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreakState {
    pub consecutive_days: u32,
    /// `None` until the first reconciliation ever.
    pub last_reconciled_date: Option<NaiveDate>,
    /// Unlocked badges. Only ever grows.
    pub badges: BTreeSet<Badge>,
}

impl StreakState {
    pub fn has_badge(&self, badge: Badge) -> bool {
        self.badges.contains(&badge)
    }
}

/// How a rollover spanning several days is reconciled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapPolicy {
    /// Close every elapsed day, from the last tracked day up to yesterday.
    #[default]
    PerDay,
    /// Close only the last tracked day, whatever the size of the gap.
    Collapse,
}

/// What a call to [`StreakEngine::reconcile_on_startup`] did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reconciliation {
    /// No day was tracked yet; today became the tracked day.
    FirstRun,
    /// Today was already reconciled.
    AlreadyReconciled,
    /// One or more days were closed.
    Advanced {
        days_closed: u32,
        consecutive_days: u32,
        unlocked: Vec<BadgeUnlocked>,
    },
    /// `today` is before the tracked day; nothing changed.
    ClockSkew { last_reconciled: NaiveDate },
}

impl Reconciliation {
    /// Whether the state changed and has to be saved.
    pub fn needs_persist(&self) -> bool {
        matches!(self, Self::FirstRun | Self::Advanced { .. })
    }

    pub fn unlocked(&self) -> &[BadgeUnlocked] {
        match self {
            Self::Advanced { unlocked, .. } => unlocked,
            _ => &[],
        }
    }
}

/// Owner of [`StreakState`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StreakEngine {
    state: StreakState,
    policy: GapPolicy,
}

impl StreakEngine {
    pub fn new(state: StreakState, policy: GapPolicy) -> Self {
        Self { state, policy }
    }

    pub fn state(&self) -> &StreakState {
        &self.state
    }

    /// Advances the streak to `today`.
    ///
    /// Each closed day increments the counter when the ledger holds no event
    /// for it (and then evaluates badges) or resets it to 0 otherwise.
    pub fn reconcile_on_startup(&mut self, today: NaiveDate, ledger: &Ledger) -> Reconciliation {
        let Some(last) = self.state.last_reconciled_date else {
            self.state.last_reconciled_date = Some(today);
            tracing::info!(%today, "first run, tracking starts today");
            return Reconciliation::FirstRun;
        };

        if last == today {
            return Reconciliation::AlreadyReconciled;
        }
        if today < last {
            tracing::warn!(%today, %last, "clock is behind the last reconciled day, skipping");
            return Reconciliation::ClockSkew {
                last_reconciled: last,
            };
        }

        let mut unlocked = Vec::new();
        let mut days_closed = 0;
        match self.policy {
            GapPolicy::Collapse => {
                self.close_day(last, ledger.has_spend_on(last), &mut unlocked);
                days_closed = 1;
            }
            GapPolicy::PerDay => {
                let spend_days: BTreeSet<NaiveDate> = ledger
                    .events()
                    .iter()
                    .map(|event| event.date)
                    .filter(|date| (last..today).contains(date))
                    .collect();
                for day in last.iter_days().take_while(|day| *day < today) {
                    self.close_day(day, spend_days.contains(&day), &mut unlocked);
                    days_closed += 1;
                }
            }
        }
        self.state.last_reconciled_date = Some(today);

        tracing::info!(
            %today,
            days_closed,
            consecutive_days = self.state.consecutive_days,
            "streak reconciled"
        );
        Reconciliation::Advanced {
            days_closed,
            consecutive_days: self.state.consecutive_days,
            unlocked,
        }
    }

    /// Resets the counter after a spend was recorded today.
    ///
    /// The tracked day and the badges are left alone.
    pub fn on_spend_registered(&mut self) {
        if self.state.consecutive_days > 0 {
            tracing::info!(
                previous = self.state.consecutive_days,
                "spend registered, streak reset"
            );
        }
        self.state.consecutive_days = 0;
    }

    /// Unlocks every badge whose threshold the counter has reached, in
    /// ascending threshold order, and returns the newly unlocked ones.
    pub fn evaluate_badges(&mut self) -> Vec<BadgeUnlocked> {
        let mut unlocked = Vec::new();
        for badge in Badge::ALL {
            if self.state.consecutive_days >= badge.threshold() && self.state.badges.insert(badge)
            {
                unlocked.push(BadgeUnlocked(badge));
            }
        }
        unlocked
    }

    fn close_day(&mut self, day: NaiveDate, spent: bool, unlocked: &mut Vec<BadgeUnlocked>) {
        if spent {
            tracing::debug!(%day, "day closed with spend");
            self.state.consecutive_days = 0;
        } else {
            tracing::debug!(%day, "day closed without spend");
            self.state.consecutive_days = self.state.consecutive_days.saturating_add(1);
            unlocked.extend(self.evaluate_badges());
        }
    }
}
