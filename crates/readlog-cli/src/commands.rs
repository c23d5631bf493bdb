use std::io::Write;

use anyhow::{Context, anyhow, bail};
use readlog_core::config::AppConfig;
use readlog_core::controller::{FilterOutcome, SubmitOutcome};
use readlog_core::datetime::format_display_date;
use readlog_core::http::Transport;
use readlog_core::stats::{
    StatCards, StatsPeriod, StatsQuery, book_progress_request, daily_series, progress_bars,
};
use readlog_core::{ApiClient, FilterCriteria, ListSession, Phase, SortOrder};
use readlog_shared::{BookProgressDto, StatisticsDto};
use tracing::{debug, info};

use crate::cli::{Command, FieldArgs, FilterArgs, GlobalCli, StatsArgs};
use crate::config;
use crate::feedback::TerminalFeedback;
use crate::render::Renderer;
use crate::transport::ReqwestTransport;

pub type Session<T> = ListSession<T, TerminalFeedback>;

#[tracing::instrument(skip_all, fields(page = %cli.page))]
pub async fn dispatch(cfg: &AppConfig, cli: &GlobalCli) -> anyhow::Result<()> {
    let mut renderer = Renderer::stdout();

    if matches!(cli.command, Command::Config) {
        let text = toml::to_string_pretty(cfg).context("failed to render config")?;
        return renderer.print_text(&text);
    }

    let base_url = config::require_base_url(cfg)?;
    let transport = ReqwestTransport::new(base_url, cli.cookie.clone())?;
    let client = ApiClient::new(transport, base_url, cfg.login_path.clone())
        .with_csrf(cfg.csrf.clone());

    if let Command::Stats(args) = &cli.command {
        return stats(&client, args, &mut renderer).await;
    }

    let page = cfg.page(&cli.page).cloned().ok_or_else(|| {
        anyhow!(
            "unknown page {:?}; expected one of: {}",
            cli.page,
            cfg.page_keys().collect::<Vec<_>>().join(", ")
        )
    })?;
    let session = ListSession::new(client, TerminalFeedback::new(cli.yes), page);
    run_list_command(&session, &cli.command, &mut renderer).await
}

/// Runs one list-page command against an already configured session.
pub async fn run_list_command<T: Transport, W: Write>(
    session: &Session<T>,
    command: &Command,
    renderer: &mut Renderer<W>,
) -> anyhow::Result<()> {
    match command {
        Command::List { search, sort } => {
            load(session).await?;
            if search.is_some() || sort.is_some() {
                session.search_locally(FilterCriteria {
                    query: search.clone().unwrap_or_default(),
                    sort: parse_sort(sort.as_deref())?,
                    ..FilterCriteria::default()
                });
            }
            print_visible(session, renderer)
        }
        Command::Filter(args) => {
            load(session).await?;
            let outcome = session.filter(filter_criteria(args)?).await;
            if outcome == FilterOutcome::Local {
                info!("server-side filtering failed; filtered the loaded records");
            }
            print_visible(session, renderer)
        }
        Command::Show { id, history } => {
            session.show_details(*id).await;
            let (record, show_owner, has_history) = session.read(|controller| {
                (
                    controller.details().cloned(),
                    controller.page().show_owner,
                    controller.page().history,
                )
            });
            let record = record.ok_or_else(|| failure(session, "record could not be loaded"))?;
            renderer.print_record(&record, show_owner)?;

            if *history {
                if !has_history {
                    bail!("this page has no reading history");
                }
                session.toggle_history().await;
                let entries = session
                    .read(|controller| controller.history().map(<[_]>::to_vec))
                    .unwrap_or_default();
                renderer.print_history(&entries)?;
            }
            Ok(())
        }
        Command::History { id } => {
            let has_history = session.read(|controller| controller.page().history);
            if !has_history {
                bail!("this page has no reading history");
            }
            session.show_details(*id).await;
            if session.read(|controller| controller.details().is_none()) {
                return Err(failure(session, "record could not be loaded"));
            }
            session.toggle_history().await;
            let entries = session
                .read(|controller| controller.history().map(<[_]>::to_vec))
                .unwrap_or_default();
            renderer.print_history(&entries)
        }
        Command::Add(fields) => {
            load(session).await?;
            session.open_create();
            fill_form(session, fields);
            submit(session).await
        }
        Command::Edit { id, fields } => {
            load(session).await?;
            session.open_edit(*id).await;
            if session.read(|controller| controller.form().is_none()) {
                return Err(failure(session, "record could not be opened for editing"));
            }
            fill_form(session, fields);
            submit(session).await
        }
        Command::Delete { id } => {
            if session.delete(*id).await {
                return Ok(());
            }
            if session.feedback().saw_error() {
                return Err(failure(session, "delete failed"));
            }
            eprintln!("Nothing changed.");
            Ok(())
        }
        Command::Stats(_) | Command::Config => {
            bail!("not a list page command")
        }
    }
}

async fn load<T: Transport>(session: &Session<T>) -> anyhow::Result<()> {
    session.load().await;
    match session.read(|controller| controller.phase().clone()) {
        Phase::Error(message) => Err(anyhow!(message)),
        _ => Ok(()),
    }
}

fn failure<T: Transport>(session: &Session<T>, fallback: &str) -> anyhow::Error {
    anyhow!(
        session
            .feedback()
            .last_message()
            .unwrap_or_else(|| fallback.to_string())
    )
}

fn parse_sort(raw: Option<&str>) -> anyhow::Result<Option<SortOrder>> {
    raw.map(|raw| {
        SortOrder::parse(raw)
            .ok_or_else(|| anyhow!("unknown sort order {raw:?}; expected e.g. date-desc"))
    })
    .transpose()
}

fn filter_criteria(args: &FilterArgs) -> anyhow::Result<FilterCriteria> {
    Ok(FilterCriteria {
        query: args.query.clone().unwrap_or_default(),
        start_date: args.from,
        end_date: args.to,
        min_time: args.min_time,
        max_time: args.max_time,
        sort: parse_sort(args.sort.as_deref())?,
    })
}

fn print_visible<T: Transport, W: Write>(
    session: &Session<T>,
    renderer: &mut Renderer<W>,
) -> anyhow::Result<()> {
    let (records, page) =
        session.read(|controller| (controller.visible().to_vec(), controller.page().clone()));
    renderer.print_records(
        &records,
        page.show_owner,
        page.badge.as_deref(),
        &page.empty_message,
    )
}

fn fill_form<T: Transport>(session: &Session<T>, fields: &FieldArgs) {
    for (field, value) in fields.values() {
        debug!(field = field.key(), "setting form field");
        session.set_field(field, value);
    }
}

async fn submit<T: Transport>(session: &Session<T>) -> anyhow::Result<()> {
    match session.submit().await {
        Some(SubmitOutcome::Saved(_)) => Ok(()),
        Some(SubmitOutcome::Failed(notice)) => Err(anyhow!(notice.message)),
        Some(SubmitOutcome::FieldError(_)) | Some(SubmitOutcome::Abandoned) | None => {
            let errors = session.read(|controller| {
                controller
                    .form()
                    .map(|form| {
                        form.errors
                            .iter()
                            .map(|(field, message)| format!("{}: {message}", field.label()))
                            .collect::<Vec<_>>()
                    })
                    .unwrap_or_default()
            });
            if !errors.is_empty() {
                bail!("record not saved\n{}", errors.join("\n"));
            }
            if session.feedback().saw_error() {
                return Err(failure(session, "record not saved"));
            }
            if session.read(|controller| controller.form().is_none()) {
                eprintln!("No changes to save.");
            } else {
                eprintln!("Nothing saved.");
            }
            Ok(())
        }
    }
}

async fn stats<T: Transport, W: Write>(
    client: &ApiClient<T>,
    args: &StatsArgs,
    renderer: &mut Renderer<W>,
) -> anyhow::Result<()> {
    let mut period = StatsPeriod::parse(&args.period).ok_or_else(|| {
        anyhow!(
            "unknown period {:?}; expected one of: {}",
            args.period,
            StatsPeriod::ALL.map(StatsPeriod::as_key).join(", ")
        )
    })?;
    if (args.from.is_some() || args.to.is_some()) && period != StatsPeriod::Custom {
        debug!(?period, "dates given; using a custom range");
        period = StatsPeriod::Custom;
    }

    let query = StatsQuery::from_selection(period, args.from, args.to)?;
    let label = match query {
        StatsQuery::Period(period) => period.label().to_string(),
        StatsQuery::Range(range) => format!(
            "{} to {}",
            format_display_date(range.start),
            format_display_date(range.end)
        ),
    };

    let loaded: StatisticsDto = client
        .fetch_json(&query.request())
        .await
        .context("failed to load statistics")?;
    renderer.print_stats(&label, &StatCards::from(&loaded), &daily_series(&loaded))?;

    if args.progress {
        let progress: BookProgressDto = client
            .fetch_json(&book_progress_request())
            .await
            .context("failed to load book progress")?;
        renderer.print_progress(&progress_bars(&progress))?;
    }
    Ok(())
}
