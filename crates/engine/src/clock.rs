//! Clock collaborator: the current calendar day in the user's time zone.

use std::{cell::Cell, rc::Rc};

use chrono::{DateTime, Days, Local, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;

pub trait Clock {
    /// The current calendar day, without time of day.
    fn today(&self) -> NaiveDate;

    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock. Days are computed in `timezone`, or in the machine's local
/// zone when none is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock {
    timezone: Option<Tz>,
}

impl SystemClock {
    pub fn new(timezone: Option<Tz>) -> Self {
        Self { timezone }
    }
}

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        match self.timezone {
            Some(tz) => Utc::now().with_timezone(&tz).date_naive(),
            None => Local::now().date_naive(),
        }
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock stuck on a given day. Clones share the day, so a test can keep
/// a handle and move time forward after handing the clock to the engine.
#[derive(Clone, Debug)]
pub struct FixedClock {
    day: Rc<Cell<NaiveDate>>,
}

impl FixedClock {
    pub fn new(day: NaiveDate) -> Self {
        Self {
            day: Rc::new(Cell::new(day)),
        }
    }

    /// Moves the clock `days` days forward.
    pub fn advance(&self, days: u64) {
        let current = self.day.get();
        self.day
            .set(current.checked_add_days(Days::new(days)).unwrap_or(current));
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.day.get()
    }

    fn now(&self) -> DateTime<Utc> {
        self.day.get().and_time(NaiveTime::default()).and_utc()
    }
}
