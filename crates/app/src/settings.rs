use chrono::NaiveDate;
use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand};
use engine::GapPolicy;
use serde::Deserialize;

use crate::error::{AppError, Result};

const DEFAULT_CONFIG_PATH: &str = "config/zerogastos.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// JSON store holding the ledger and the streak.
    pub data_file: String,
    /// IANA time zone used to decide what "today" is. Empty = machine local.
    pub timezone: String,
    pub currency_symbol: String,
    pub gap_policy: GapPolicy,
    pub level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_file: "zerogastos.json".to_string(),
            timezone: String::new(),
            currency_symbol: "R$".to_string(),
            gap_policy: GapPolicy::PerDay,
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn timezone(&self) -> Result<Option<Tz>> {
        let name = self.timezone.trim();
        if name.is_empty() {
            return Ok(None);
        }
        name.parse::<Tz>()
            .map(Some)
            .map_err(|_| AppError::InvalidTimezone(name.to_string()))
    }
}

#[derive(Debug, Parser)]
#[command(name = "zerogastos")]
#[command(about = "Log daily spending and keep a streak of no-spend days")]
pub struct Cli {
    /// Optional config file path (TOML).
    #[arg(long)]
    config: Option<String>,
    /// Override the data file.
    #[arg(long)]
    data_file: Option<String>,
    /// Override timezone (IANA name).
    #[arg(long)]
    timezone: Option<String>,
    /// Override the currency symbol shown next to amounts.
    #[arg(long)]
    currency_symbol: Option<String>,
    /// How several elapsed days are reconciled: `per_day` or `collapse`.
    #[arg(long, value_parser = parse_gap_policy)]
    gap_policy: Option<GapPolicy>,
    /// Override log level.
    #[arg(long)]
    level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the streak, the badges and today's spending.
    Status,
    /// Register a spend for today.
    Add(AddArgs),
    /// Show the report of a day.
    Report(DateArgs),
    /// Show the current month.
    Calendar,
    /// Print the shareable text of a day's report.
    Share(DateArgs),
    /// List the spend categories.
    Categories,
    /// Export every spend as CSV.
    Export(ExportArgs),
}

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Category key or name (e.g. `padaria`, `Farmácia`).
    #[arg(long)]
    pub category: String,
    /// Amount, `.` or `,` as decimal separator.
    #[arg(long)]
    pub amount: String,
    #[arg(long)]
    pub description: String,
    /// Payment method (e.g. `dinheiro`, `cartao`, `pix`).
    #[arg(long)]
    pub payment: String,
}

#[derive(Debug, Args)]
pub struct DateArgs {
    /// Day to show (YYYY-MM-DD).
    #[arg(long, conflicts_with = "offset")]
    pub date: Option<NaiveDate>,
    /// Days relative to today (`-1` is yesterday).
    #[arg(long, allow_negative_numbers = true)]
    pub offset: Option<i64>,
}

impl DateArgs {
    /// The selected day; today when neither flag is given.
    pub fn resolve(&self, today: NaiveDate) -> Result<NaiveDate> {
        if let Some(date) = self.date {
            return Ok(date);
        }
        let offset = self.offset.unwrap_or(0);
        chrono::TimeDelta::try_days(offset)
            .and_then(|delta| today.checked_add_signed(delta))
            .ok_or_else(|| AppError::InvalidDate(format!("{today} {offset:+} days")))
    }
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Output file, `-` for stdout.
    #[arg(long, default_value = "-")]
    pub output: String,
}

fn parse_gap_policy(raw: &str) -> std::result::Result<GapPolicy, String> {
    match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
        "per_day" => Ok(GapPolicy::PerDay),
        "collapse" => Ok(GapPolicy::Collapse),
        other => Err(format!("unknown gap policy: {other}")),
    }
}

pub fn load() -> Result<(AppConfig, Command)> {
    resolve(Cli::parse())
}

fn resolve(args: Cli) -> Result<(AppConfig, Command)> {
    let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(config::Environment::with_prefix("ZEROGASTOS"));
    let mut settings: AppConfig = builder.build()?.try_deserialize()?;

    if let Some(data_file) = args.data_file {
        settings.data_file = data_file;
    }
    if let Some(timezone) = args.timezone {
        settings.timezone = timezone;
    }
    if let Some(currency_symbol) = args.currency_symbol {
        settings.currency_symbol = currency_symbol;
    }
    if let Some(gap_policy) = args.gap_policy {
        settings.gap_policy = gap_policy;
    }
    if let Some(level) = args.level {
        settings.level = level;
    }

    Ok((settings, args.command))
}
