//! The module contains the `Ledger`, the append-only store of spend events,
//! and the `SpendEvent` type itself.

use core::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Amount, CategoryCatalog, EngineError, ResultEngine};

/// A single spend, dated to a calendar day.
///
/// Events are never mutated after they are appended to a [`Ledger`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendEvent {
    /// Time-ordered identifier (UUID v7, derived from the creation instant).
    pub id: Uuid,
    pub date: NaiveDate,
    pub category: String,
    pub amount_minor: Amount,
    pub description: String,
    pub payment_method: String,
    pub created_at: DateTime<Utc>,
}

impl SpendEvent {
    pub fn new(
        date: NaiveDate,
        category: impl Into<String>,
        amount_minor: Amount,
        description: impl Into<String>,
        payment_method: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            date,
            category: category.into(),
            amount_minor,
            description: description.into(),
            payment_method: payment_method.into(),
            created_at,
        }
    }
}

impl fmt::Display for SpendEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} ({})",
            self.amount_minor, self.category, self.description, self.payment_method
        )
    }
}

/// Append-only collection of spend events plus the category catalog.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ledger {
    events: Vec<SpendEvent>,
    categories: CategoryCatalog,
}

impl Ledger {
    /// Appends an event.
    ///
    /// The event must reference a catalog category and carry a positive
    /// amount; nothing else is checked here (user input is validated by
    /// [`SpendForm`](crate::SpendForm)).
    pub fn append(&mut self, event: SpendEvent) -> ResultEngine<()> {
        if !self.categories.contains(&event.category) {
            return Err(EngineError::KeyNotFound(event.category));
        }
        if !event.amount_minor.is_positive() {
            return Err(EngineError::InvalidAmount(
                "amount must be > 0".to_string(),
            ));
        }
        tracing::debug!(id = %event.id, date = %event.date, "appending spend event");
        self.events.push(event);
        Ok(())
    }

    /// Events recorded on `date`, in append order.
    pub fn events_on(&self, date: NaiveDate) -> impl Iterator<Item = &SpendEvent> {
        self.events.iter().filter(move |event| event.date == date)
    }

    /// Sum of the amounts recorded on `date`.
    pub fn total_on(&self, date: NaiveDate) -> Amount {
        self.events_on(date).map(|event| event.amount_minor).sum()
    }

    /// Returns `true` if at least one event was recorded on `date`.
    pub fn has_spend_on(&self, date: NaiveDate) -> bool {
        self.events_on(date).next().is_some()
    }

    pub fn categories(&self) -> &CategoryCatalog {
        &self.categories
    }

    /// Every event, in append order.
    pub fn events(&self) -> &[SpendEvent] {
        &self.events
    }
}
