use std::{fs::File, io};

use engine::{BadgeUnlocked, Engine, JsonFileStorage, Notifier, SpendForm, SystemClock};
use settings::Command;

mod error;
mod export;
mod render;
mod settings;

use crate::error::Result;

/// Prints badge unlocks as they happen.
struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn badge_unlocked(&mut self, event: BadgeUnlocked) {
        tracing::info!(threshold = event.threshold(), "badge unlocked");
        println!("{}", render::celebration(event));
    }
}

fn main() -> Result<()> {
    let (settings, command) = settings::load()?;

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(format!(
            "zerogastos={level},engine={level}",
            level = settings.level
        ))
        .init();

    let mut engine = Engine::builder()
        .storage(JsonFileStorage::new(&settings.data_file))
        .clock(SystemClock::new(settings.timezone()?))
        .notifier(TerminalNotifier)
        .gap_policy(settings.gap_policy)
        .build()?;
    engine.reconcile_on_startup()?;

    let symbol = settings.currency_symbol.as_str();
    match command {
        Command::Status => print!("{}", render::dashboard(&engine.dashboard(), symbol)),
        Command::Add(args) => {
            let form = SpendForm::new()
                .category(args.category)
                .amount(args.amount)
                .description(args.description)
                .payment_method(args.payment);
            let event = engine.register_spend(&form)?;
            println!(
                "Spend registered: {} {} 💸",
                engine.ledger().categories().display_name(&event.category),
                event.amount_minor.format(symbol)
            );
        }
        Command::Report(args) => {
            let date = args.resolve(engine.today())?;
            print!("{}", render::report(&engine.daily_report(date), symbol));
        }
        Command::Calendar => print!("{}", render::calendar(&engine.month_calendar())),
        Command::Share(args) => {
            let date = args.resolve(engine.today())?;
            println!("{}", engine.daily_report(date).share_text(symbol));
        }
        Command::Categories => print!("{}", render::categories(engine.ledger().categories())),
        Command::Export(args) => {
            let events = engine.ledger().events();
            let written = if args.output == "-" {
                export::write_csv(events, io::stdout().lock())?
            } else {
                export::write_csv(events, File::create(&args.output)?)?
            };
            tracing::info!(rows = written, output = %args.output, "ledger exported");
        }
    }

    Ok(())
}
