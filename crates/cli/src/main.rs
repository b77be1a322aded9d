use case_core::{
    config::CoreConfig, form::parse_extra_fields, parse_iso_date, render_month, CaseForm,
    CaseService, DateParseError, HtmlRenderer, LocalDirBackend, TextRenderer,
};
use chrono::{Datelike, Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cases")]
#[command(about = "Case tracker CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List cases touching a month (defaults to the current month)
    List {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        month: Option<u32>,
    },
    /// List every stored case with its position
    All,
    /// Add a case, or replace the case with the same key
    Submit {
        /// Case key (identifier field)
        key: String,
        /// Case date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
        /// Case name
        #[arg(long, default_value = "")]
        name: String,
        /// Extra field as key=value (repeatable)
        #[arg(long = "field")]
        fields: Vec<String>,
        /// Test dates (comma-separated YYYY-MM-DD)
        #[arg(long, default_value = "")]
        test_dates: String,
    },
    /// Delete the case at a position (as shown by `all`)
    Delete { index: usize },
    /// Delete the case with the given key
    DeleteKey { key: String },
    /// Show the month calendar with test dates marked
    Calendar {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        month: Option<u32>,
        /// Print an HTML table instead of text
        #[arg(long)]
        html: bool,
    },
}

fn resolve_month(year: Option<i32>, month: Option<u32>, today: NaiveDate) -> (i32, u32) {
    (
        year.unwrap_or_else(|| today.year()),
        month.unwrap_or_else(|| today.month()),
    )
}

fn resolve_date(date: Option<&str>, today: NaiveDate) -> Result<NaiveDate, DateParseError> {
    match date {
        Some(raw) => parse_iso_date(raw),
        None => Ok(today),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("case_core=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("Use 'cases --help' for commands");
        return Ok(());
    };

    let cfg = Arc::new(CoreConfig::from_lookup(|key| std::env::var(key).ok())?);
    std::fs::create_dir_all(cfg.data_dir())?;
    let backend = Arc::new(LocalDirBackend::new(cfg.data_dir())?);
    let service = CaseService::new(cfg.clone(), backend)?;
    let today = Local::now().date_naive();

    match command {
        Commands::List { year, month } => {
            let (year, month) = resolve_month(year, month, today);
            match service.month_view(year, month) {
                Ok(view) if view.records.is_empty() => println!("No cases found."),
                Ok(view) => {
                    for record in &view.records {
                        let fields: Vec<String> = record
                            .iter()
                            .map(|(name, value)| format!("{}: {}", name, value))
                            .collect();
                        println!("{}", fields.join(", "));
                    }
                }
                Err(e) => eprintln!("Error listing cases: {}", e),
            }
        }
        Commands::All => match service.cases() {
            Ok(cases) if cases.is_empty() => println!("No cases found."),
            Ok(cases) => {
                let key_field = cfg.schema().key_field();
                for (index, record) in cases.iter().enumerate() {
                    println!(
                        "{}: {} ({} fields)",
                        index,
                        record.text(key_field).unwrap_or("-"),
                        record.len()
                    );
                }
            }
            Err(e) => eprintln!("Error loading cases: {}", e),
        },
        Commands::Submit {
            key,
            date,
            name,
            fields,
            test_dates,
        } => {
            let date = match resolve_date(date.as_deref(), today) {
                Ok(date) => date,
                Err(e) => {
                    eprintln!("Error reading --date: {}", e);
                    return Ok(());
                }
            };
            let extra_fields = fields.join("\n");
            if parse_extra_fields(&extra_fields).len() != fields.len() {
                eprintln!("Ignoring --field values that are not key=value");
            }
            let form = CaseForm {
                key,
                date,
                name,
                extra_fields,
                test_dates,
            };
            match service.submit_form(form) {
                Ok(cases) => println!("Case saved ({} cases stored)", cases.len()),
                Err(e) => eprintln!("Error saving case: {}", e),
            }
        }
        Commands::Delete { index } => match service.remove_at(index) {
            Ok(_) => println!("Deleted case at position {}", index),
            Err(e) => eprintln!("Error deleting case: {}", e),
        },
        Commands::DeleteKey { key } => match service.remove_by_key(&key) {
            Ok(_) => println!("Deleted case {}", key),
            Err(e) => eprintln!("Error deleting case: {}", e),
        },
        Commands::Calendar { year, month, html } => {
            let (year, month) = resolve_month(year, month, today);
            match service.month_view(year, month) {
                Ok(view) if html => {
                    println!("{}", render_month(&view, HtmlRenderer::new()).into_string())
                }
                Ok(view) => print!("{}", render_month(&view, TextRenderer::new())),
                Err(e) => eprintln!("Error building calendar: {}", e),
            }
        }
    }

    Ok(())
}
