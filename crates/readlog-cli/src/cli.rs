use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand};
use readlog_core::datetime::parse_form_date;
use readlog_core::form::FormField;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

fn parse_date(raw: &str) -> anyhow::Result<NaiveDate> {
    parse_form_date(raw).ok_or_else(|| anyhow!("expected a YYYY-MM-DD date, got: {raw}"))
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "readlog",
    version,
    about = "Daily reading log client",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Config file; defaults to $READLOG_CONFIG, then the user config dir.
    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Override a config key, e.g. `--set base_url=http://localhost:8080`.
    #[arg(
        long = "set",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append,
        global = true
    )]
    pub overrides: Vec<KeyVal>,

    /// Server address; same as `--set base_url=<url>`.
    #[arg(long = "base-url", global = true)]
    pub base_url: Option<String>,

    /// Anti-forgery header name; same as `--set csrf.header=<name>`.
    #[arg(long = "csrf-header", global = true)]
    pub csrf_header: Option<String>,

    /// Anti-forgery token; same as `--set csrf.token=<token>`.
    #[arg(long = "csrf-token", env = "READLOG_CSRF_TOKEN", global = true)]
    pub csrf_token: Option<String>,

    /// Session cookie sent with every request.
    #[arg(long = "cookie", env = "READLOG_COOKIE", global = true)]
    pub cookie: Option<String>,

    /// Answer yes to every confirmation.
    #[arg(short = 'y', long = "yes", global = true)]
    pub yes: bool,

    /// List page to work on.
    #[arg(short = 'p', long = "page", default_value = "reading", global = true)]
    pub page: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show the records of a page.
    List {
        /// Quick search over title, author and notes.
        #[arg(long = "query", alias = "search")]
        search: Option<String>,
        /// Sort order such as `date-desc` or `title-asc`.
        #[arg(long)]
        sort: Option<String>,
    },
    /// Ask the server to filter, falling back to local filtering.
    Filter(FilterArgs),
    /// Show one record.
    Show {
        id: i64,
        /// Include the reading history of the book.
        #[arg(long)]
        history: bool,
    },
    /// Reading history of the book a record belongs to.
    History { id: i64 },
    /// Create a record.
    Add(FieldArgs),
    /// Change a record; only the given fields are touched.
    Edit {
        id: i64,
        #[command(flatten)]
        fields: FieldArgs,
    },
    /// Delete (or restore, on the violations page) a record.
    Delete { id: i64 },
    /// Reading statistics and per-book progress.
    Stats(StatsArgs),
    /// Print the effective configuration.
    Config,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    #[arg(long)]
    pub query: Option<String>,
    #[arg(long = "start", alias = "from", value_parser = parse_date)]
    pub from: Option<NaiveDate>,
    #[arg(long = "end", alias = "to", value_parser = parse_date)]
    pub to: Option<NaiveDate>,
    #[arg(long = "min-time")]
    pub min_time: Option<u32>,
    #[arg(long = "max-time")]
    pub max_time: Option<u32>,
    #[arg(long)]
    pub sort: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FieldArgs {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub author: Option<String>,
    /// Reading day, YYYY-MM-DD.
    #[arg(long)]
    pub date: Option<String>,
    /// Minutes spent reading.
    #[arg(long = "time")]
    pub time_spent: Option<String>,
    #[arg(long = "current", alias = "current-page")]
    pub current_page: Option<String>,
    #[arg(long = "total", alias = "total-pages")]
    pub total_pages: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
}

impl GlobalCli {
    /// `--set` pairs followed by the dedicated flags, so the flags win.
    pub fn config_overrides(&self) -> Vec<(String, String)> {
        let mut overrides: Vec<(String, String)> = self
            .overrides
            .iter()
            .map(|kv| (kv.key.clone(), kv.value.clone()))
            .collect();
        for (key, value) in [
            ("base_url", &self.base_url),
            ("csrf.header", &self.csrf_header),
            ("csrf.token", &self.csrf_token),
        ] {
            if let Some(value) = value {
                overrides.push((key.to_string(), value.clone()));
            }
        }
        overrides
    }
}

impl FieldArgs {
    /// Raw form values in field order; absent flags are skipped.
    pub fn values(&self) -> Vec<(FormField, String)> {
        [
            (FormField::Title, &self.title),
            (FormField::Author, &self.author),
            (FormField::Date, &self.date),
            (FormField::TimeSpent, &self.time_spent),
            (FormField::CurrentPage, &self.current_page),
            (FormField::TotalPages, &self.total_pages),
            (FormField::Notes, &self.notes),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.clone().map(|value| (field, value)))
        .collect()
    }
}

#[derive(Args, Debug, Clone)]
pub struct StatsArgs {
    /// total, last_week, last_month, last_three_months, last_year or custom.
    #[arg(long, default_value = "total")]
    pub period: String,
    #[arg(long = "start", alias = "from", value_parser = parse_date)]
    pub from: Option<NaiveDate>,
    #[arg(long = "end", alias = "to", value_parser = parse_date)]
    pub to: Option<NaiveDate>,
    /// Also show per-book progress.
    #[arg(long)]
    pub progress: bool,
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}
