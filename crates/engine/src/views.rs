//! View-models for the presentation layer.
//!
//! Everything here is a pure function of the ledger, the streak record and a
//! date. Front ends only format the result.

use core::fmt;
use std::fmt::Write as _;

use chrono::{Datelike, NaiveDate};

use crate::{Amount, Badge, Ledger, SpendEvent, StreakState};

/// How a date is shown to the user, relative to today.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DateLabel {
    Today,
    Yesterday,
    Other(NaiveDate),
}

impl DateLabel {
    pub fn new(date: NaiveDate, today: NaiveDate) -> Self {
        if date == today {
            Self::Today
        } else if today.pred_opt() == Some(date) {
            Self::Yesterday
        } else {
            Self::Other(date)
        }
    }
}

impl fmt::Display for DateLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Today => f.write_str("Today"),
            Self::Yesterday => f.write_str("Yesterday"),
            Self::Other(date) => write!(f, "{}", date.format("%d/%m/%Y")),
        }
    }
}

/// One spend event, resolved against the catalog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventRow {
    pub category: String,
    pub category_name: String,
    pub icon: String,
    pub color: String,
    pub description: String,
    pub payment_method: String,
    pub amount: Amount,
}

impl EventRow {
    fn new(ledger: &Ledger, event: &SpendEvent) -> Self {
        let category = ledger.categories().get(&event.category);
        Self {
            category: event.category.clone(),
            category_name: category
                .map_or_else(|| event.category.clone(), |c| c.display_name.clone()),
            icon: category.map(|c| c.icon.clone()).unwrap_or_default(),
            color: category.map(|c| c.color.clone()).unwrap_or_default(),
            description: event.description.clone(),
            payment_method: event.payment_method.clone(),
            amount: event.amount_minor,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BadgeStatus {
    pub badge: Badge,
    pub unlocked: bool,
}

/// The main screen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dashboard {
    pub today: NaiveDate,
    pub consecutive_days: u32,
    pub badges: Vec<BadgeStatus>,
    pub total_today: Amount,
    /// The daily goal is spending nothing.
    pub goal_met: bool,
    pub events: Vec<EventRow>,
}

impl Dashboard {
    pub fn build(ledger: &Ledger, streak: &StreakState, today: NaiveDate) -> Self {
        let total_today = ledger.total_on(today);
        Self {
            today,
            consecutive_days: streak.consecutive_days,
            badges: Badge::ALL
                .into_iter()
                .map(|badge| BadgeStatus {
                    badge,
                    unlocked: streak.has_badge(badge),
                })
                .collect(),
            total_today,
            goal_met: total_today.is_zero(),
            events: ledger
                .events_on(today)
                .map(|event| EventRow::new(ledger, event))
                .collect(),
        }
    }
}

/// Per-day summary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub label: DateLabel,
    pub total: Amount,
    /// Display name of the category with the highest summed amount.
    pub top_category: Option<String>,
    /// Payment method used by the most events.
    pub top_payment_method: Option<String>,
    pub events: Vec<EventRow>,
}

impl DailyReport {
    pub fn build(ledger: &Ledger, date: NaiveDate, today: NaiveDate) -> Self {
        let events: Vec<&SpendEvent> = ledger.events_on(date).collect();

        let mut by_category: Vec<(&str, i64)> = Vec::new();
        let mut by_payment: Vec<(&str, i64)> = Vec::new();
        for event in &events {
            tally(&mut by_category, &event.category, event.amount_minor.cents());
            tally(&mut by_payment, &event.payment_method, 1);
        }

        Self {
            date,
            label: DateLabel::new(date, today),
            total: ledger.total_on(date),
            top_category: top_key(&by_category)
                .map(|key| ledger.categories().display_name(key).to_string()),
            top_payment_method: top_key(&by_payment).map(capitalize),
            events: events
                .into_iter()
                .map(|event| EventRow::new(ledger, event))
                .collect(),
        }
    }

    /// Plain-text summary meant to be shared.
    pub fn share_text(&self, currency_symbol: &str) -> String {
        let mut text = format!("📊 Spending report - {}\n\n", self.label);
        let _ = write!(text, "Total: {}\n\n", self.total.format(currency_symbol));

        if self.events.is_empty() {
            text.push_str("✅ No spending recorded!\n");
        } else {
            text.push_str("Spending of the day:\n");
            for row in &self.events {
                let _ = writeln!(
                    text,
                    "• {}: {} ({})",
                    row.category_name,
                    row.amount.format(currency_symbol),
                    row.payment_method
                );
            }
        }

        text.push_str("\n#ZeroGastos #ControleFinanceiro");
        text
    }
}

/// Keeps first-seen order, so ties are resolved deterministically.
fn tally<'a>(counts: &mut Vec<(&'a str, i64)>, key: &'a str, value: i64) {
    match counts.iter_mut().find(|(k, _)| *k == key) {
        Some((_, total)) => *total += value,
        None => counts.push((key, value)),
    }
}

/// Highest count wins; on a tie the later key wins.
fn top_key<'a>(counts: &[(&'a str, i64)]) -> Option<&'a str> {
    counts
        .iter()
        .copied()
        .reduce(|best, next| if best.1 > next.1 { best } else { next })
        .map(|(key, _)| key)
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DayStatus {
    Today,
    Spent,
    NoSpend,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub status: DayStatus,
}

/// Every day of the month containing `today`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonthCalendar {
    pub year: i32,
    pub month: u32,
    pub days: Vec<CalendarDay>,
}

impl MonthCalendar {
    pub fn build(ledger: &Ledger, today: NaiveDate) -> Self {
        let first = today.with_day(1).unwrap_or(today);
        let days = first
            .iter_days()
            .take_while(|date| date.month() == today.month())
            .map(|date| CalendarDay {
                date,
                status: if date == today {
                    DayStatus::Today
                } else if ledger.has_spend_on(date) {
                    DayStatus::Spent
                } else {
                    DayStatus::NoSpend
                },
            })
            .collect();

        Self {
            year: today.year(),
            month: today.month(),
            days,
        }
    }

    /// Offset of the first day in a Monday-first week (0 = Monday).
    pub fn leading_blanks(&self) -> u32 {
        self.days
            .first()
            .map_or(0, |day| day.date.weekday().num_days_from_monday())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::Utc;

    use super::*;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn add(ledger: &mut Ledger, date: NaiveDate, category: &str, cents: i64, payment: &str) {
        ledger
            .append(SpendEvent::new(
                date,
                category,
                Amount::new(cents),
                "item",
                payment,
                Utc::now(),
            ))
            .unwrap();
    }

    #[test]
    fn date_labels() {
        let today = day(3, 1);
        assert_eq!(DateLabel::new(today, today).to_string(), "Today");
        assert_eq!(DateLabel::new(day(2, 29), today).to_string(), "Yesterday");
        assert_eq!(DateLabel::new(day(2, 3), today).to_string(), "03/02/2024");
    }

    #[test]
    fn dashboard_reflects_today_and_badges() {
        let mut ledger = Ledger::default();
        add(&mut ledger, day(1, 9), "uber", 2000, "pix");
        add(&mut ledger, day(1, 10), "padaria", 650, "dinheiro");
        let streak = StreakState {
            consecutive_days: 0,
            last_reconciled_date: Some(day(1, 10)),
            badges: BTreeSet::from([Badge::OneDay, Badge::ThreeDays]),
        };

        let dashboard = Dashboard::build(&ledger, &streak, day(1, 10));

        assert_eq!(dashboard.total_today, Amount::new(650));
        assert!(!dashboard.goal_met);
        assert_eq!(dashboard.events.len(), 1);
        assert_eq!(dashboard.events[0].category_name, "Padaria");
        let unlocked: Vec<_> = dashboard
            .badges
            .iter()
            .filter(|status| status.unlocked)
            .map(|status| status.badge)
            .collect();
        assert_eq!(unlocked, vec![Badge::OneDay, Badge::ThreeDays]);

        let quiet = Dashboard::build(&ledger, &streak, day(1, 11));
        assert!(quiet.goal_met);
        assert!(quiet.events.is_empty());
    }

    #[test]
    fn report_picks_top_category_and_payment() {
        let mut ledger = Ledger::default();
        add(&mut ledger, day(1, 10), "padaria", 500, "pix");
        add(&mut ledger, day(1, 10), "bares", 4000, "cartao");
        add(&mut ledger, day(1, 10), "padaria", 700, "pix");

        let report = DailyReport::build(&ledger, day(1, 10), day(1, 11));

        assert_eq!(report.label, DateLabel::Yesterday);
        assert_eq!(report.total, Amount::new(5200));
        assert_eq!(report.top_category.as_deref(), Some("Bares"));
        assert_eq!(report.top_payment_method.as_deref(), Some("Pix"));
        assert_eq!(report.events.len(), 3);
    }

    #[test]
    fn report_ties_go_to_the_later_key() {
        let mut ledger = Ledger::default();
        add(&mut ledger, day(1, 10), "padaria", 500, "pix");
        add(&mut ledger, day(1, 10), "uber", 500, "cartao");

        let report = DailyReport::build(&ledger, day(1, 10), day(1, 10));

        assert_eq!(report.top_category.as_deref(), Some("Uber"));
        assert_eq!(report.top_payment_method.as_deref(), Some("Cartao"));
    }

    #[test]
    fn empty_report() {
        let report = DailyReport::build(&Ledger::default(), day(1, 10), day(1, 10));
        assert_eq!(report.total, Amount::ZERO);
        assert_eq!(report.top_category, None);
        assert_eq!(report.top_payment_method, None);
        assert_eq!(
            report.share_text("R$"),
            "📊 Spending report - Today\n\nTotal: R$ 0.00\n\n✅ No spending recorded!\n\n#ZeroGastos #ControleFinanceiro"
        );
    }

    #[test]
    fn share_text_lists_events() {
        let mut ledger = Ledger::default();
        add(&mut ledger, day(1, 10), "ifood", 3590, "cartao");

        let text = DailyReport::build(&ledger, day(1, 10), day(1, 10)).share_text("R$");

        assert!(text.contains("Total: R$ 35.90"));
        assert!(text.contains("• iFood: R$ 35.90 (cartao)\n"));
        assert!(text.ends_with("#ZeroGastos #ControleFinanceiro"));
    }

    #[test]
    fn calendar_covers_the_month() {
        let mut ledger = Ledger::default();
        add(&mut ledger, day(2, 3), "outros", 100, "pix");
        add(&mut ledger, day(2, 14), "outros", 100, "pix");

        let calendar = MonthCalendar::build(&ledger, day(2, 14));

        assert_eq!(calendar.days.len(), 29);
        assert_eq!(calendar.days[2].status, DayStatus::Spent);
        assert_eq!(calendar.days[3].status, DayStatus::NoSpend);
        // Today wins over spent.
        assert_eq!(calendar.days[13].status, DayStatus::Today);
        // 2024-02-01 was a Thursday.
        assert_eq!(calendar.leading_blanks(), 3);
    }
}
