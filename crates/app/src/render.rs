//! Plain-text rendering of the engine's view-models.

use std::fmt::Write as _;

use chrono::Datelike;
use engine::{
    Badge, BadgeUnlocked, CategoryCatalog, DailyReport, Dashboard, DayStatus, EventRow,
    MonthCalendar,
};

pub fn dashboard(view: &Dashboard, symbol: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Days without spending: {}", view.consecutive_days);

    let medals: Vec<String> = view
        .badges
        .iter()
        .map(|status| {
            let mark = if status.unlocked { "★" } else { "☆" };
            format!("{mark} {}", status.badge)
        })
        .collect();
    let _ = writeln!(out, "Badges: {}", medals.join("  "));

    if view.goal_met {
        out.push_str("Goal: 100% - no spending today! 🎉\n");
    } else {
        let _ = writeln!(
            out,
            "Goal: missed, {} spent today",
            view.total_today.format(symbol)
        );
    }

    out.push('\n');
    if view.events.is_empty() {
        out.push_str("No spending today! Keep it up!\n");
    } else {
        for row in &view.events {
            out.push_str(&event_line(row, symbol));
        }
    }
    out
}

pub fn report(view: &DailyReport, symbol: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Report: {}", view.label);
    let _ = writeln!(out, "Total: {}", view.total.format(symbol));
    let _ = writeln!(
        out,
        "Top category: {}",
        view.top_category.as_deref().unwrap_or("-")
    );
    let _ = writeln!(
        out,
        "Top payment method: {}",
        view.top_payment_method.as_deref().unwrap_or("-")
    );

    out.push('\n');
    if view.events.is_empty() {
        out.push_str("No spending recorded on this date\n");
    } else {
        for row in &view.events {
            out.push_str(&event_line(row, symbol));
        }
    }
    out
}

/// Monday-first month grid. `[]` marks today, `x` a day with spending and
/// `·` a day without.
pub fn calendar(view: &MonthCalendar) -> String {
    let mut out = format!("{:04}-{:02}\n", view.year, view.month);
    out.push_str(" Mo  Tu  We  Th  Fr  Sa  Su\n");

    let blanks = view.leading_blanks() as usize;
    let mut column = 0;
    for _ in 0..blanks {
        out.push_str("    ");
        column += 1;
    }
    for day in &view.days {
        let number = day.date.day();
        let cell = match day.status {
            DayStatus::Today => format!("[{number:>2}]"),
            DayStatus::Spent => format!(" {number:>2}x"),
            DayStatus::NoSpend => format!(" {number:>2}·"),
        };
        out.push_str(&cell);
        column += 1;
        if column % 7 == 0 {
            out.push('\n');
        }
    }
    if column % 7 != 0 {
        out.push('\n');
    }
    out
}

pub fn categories(catalog: &CategoryCatalog) -> String {
    let mut out = String::new();
    for (key, category) in catalog.iter() {
        let _ = writeln!(
            out,
            "{key:<10} {:<16} {} {}",
            category.display_name, category.color, category.icon
        );
    }
    out
}

/// User-facing celebration for a freshly unlocked badge.
pub fn celebration(event: BadgeUnlocked) -> &'static str {
    match event.0 {
        Badge::OneDay => "🎉 Parabéns! Você ganhou a medalha de 1 dia sem gastar!",
        Badge::ThreeDays => "🏆 Incrível! Medalha de 3 dias consecutivos sem gastar!",
        Badge::SevenDays => "🌟 Fantástico! 7 dias sem gastar! Você é um mestre da economia!",
        Badge::ThirtyDays => "👑 LENDÁRIO! 30 DIAS SEM GASTAR! Você é uma lenda da economia!",
    }
}

fn event_line(row: &EventRow, symbol: &str) -> String {
    format!(
        "{:<16} {:>12}  {} • {}\n",
        row.category_name,
        row.amount.format(symbol),
        row.description,
        row.payment_method
    )
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::{NaiveDate, Utc};
    use engine::{Amount, Ledger, SpendEvent, StreakState};

    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, d).unwrap()
    }

    #[test]
    fn dashboard_without_spending() {
        let streak = StreakState {
            consecutive_days: 3,
            last_reconciled_date: Some(day(5)),
            badges: BTreeSet::from([Badge::OneDay, Badge::ThreeDays]),
        };
        let view = Dashboard::build(&Ledger::default(), &streak, day(5));

        let text = dashboard(&view, "R$");

        assert!(text.starts_with("Days without spending: 3\n"));
        assert!(text.contains("★ 1 day  ★ 3 days  ☆ 7 days  ☆ 30 days"));
        assert!(text.contains("no spending today"));
        assert!(text.ends_with("No spending today! Keep it up!\n"));
    }

    #[test]
    fn report_lists_rows() {
        let mut ledger = Ledger::default();
        ledger
            .append(SpendEvent::new(
                day(5),
                "uber",
                Amount::new(2250),
                "volta do trabalho",
                "cartao",
                Utc::now(),
            ))
            .unwrap();
        let view = DailyReport::build(&ledger, day(5), day(7));

        let text = report(&view, "R$");

        assert!(text.starts_with("Report: 05/02/2024\nTotal: R$ 22.50\n"));
        assert!(text.contains("Top category: Uber\n"));
        assert!(text.contains("Top payment method: Cartao\n"));
        assert!(text.contains("volta do trabalho • cartao"));
    }

    #[test]
    fn calendar_grid_starts_on_the_right_weekday() {
        let view = MonthCalendar::build(&Ledger::default(), day(1));
        let text = calendar(&view);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "2024-02");
        // Thursday: three blank cells, then today.
        assert!(lines[2].starts_with("            [ 1]  2·"));
        assert_eq!(lines.len(), 2 + 5);
    }

    #[test]
    fn every_badge_has_its_own_message() {
        let messages: BTreeSet<&str> = Badge::ALL
            .into_iter()
            .map(|badge| celebration(BadgeUnlocked(badge)))
            .collect();
        assert_eq!(messages.len(), Badge::ALL.len());
        assert_eq!(
            celebration(BadgeUnlocked(Badge::OneDay)),
            "🎉 Parabéns! Você ganhou a medalha de 1 dia sem gastar!"
        );
        assert!(celebration(BadgeUnlocked(Badge::ThirtyDays)).starts_with("👑 LENDÁRIO!"));
    }
}
