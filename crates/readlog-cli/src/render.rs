use std::io::{self, IsTerminal, Write};

use readlog_core::Record;
use readlog_core::datetime::format_display_date;
use readlog_core::form::FormField;
use readlog_core::record::RecordExt;
use readlog_core::stats::{ProgressBar, StatCards};
use readlog_shared::HistoryEntryDto;
use unicode_width::UnicodeWidthStr;

const NOTES_COLUMN_CHARS: usize = 40;
const BAR_CELLS: usize = 30;

#[derive(Debug, Clone)]
pub struct Renderer<W> {
    out: W,
    color: bool,
}

impl Renderer<io::Stdout> {
    pub fn stdout() -> Self {
        let color = io::stdout().is_terminal();
        Self {
            out: io::stdout(),
            color,
        }
    }
}

impl<W: Write> Renderer<W> {
    pub fn plain(out: W) -> Self {
        Self { out, color: false }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn print_text(&mut self, text: &str) -> anyhow::Result<()> {
        write!(self.out, "{text}")?;
        if !text.ends_with('\n') {
            writeln!(self.out)?;
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, records, empty_message))]
    pub fn print_records(
        &mut self,
        records: &[Record],
        show_owner: bool,
        badge: Option<&str>,
        empty_message: &str,
    ) -> anyhow::Result<()> {
        if records.is_empty() {
            writeln!(self.out, "{empty_message}")?;
            return Ok(());
        }

        let mut headers = vec!["ID", "Date", "Title", "Author", "Time", "Progress"];
        if show_owner {
            headers.push("User");
        }
        headers.push("Notes");

        let rows = records
            .iter()
            .map(|record| {
                let mut title = record.title.clone();
                if let Some(badge) = badge {
                    title = format!("{title} {}", self.paint(&format!("[{badge}]"), "31"));
                }
                let mut row = vec![
                    self.paint(&record.id.to_string(), "33"),
                    record.day().map(format_display_date).unwrap_or_default(),
                    title,
                    record.author.clone(),
                    format!("{} mins", record.time_spent),
                    record
                        .progress_percent()
                        .map(|percent| format!("{percent}%"))
                        .unwrap_or_default(),
                ];
                if show_owner {
                    row.push(record.owner_label().to_string());
                }
                row.push(record.notes_preview(NOTES_COLUMN_CHARS).unwrap_or_default());
                row
            })
            .collect();

        write_table(
            &mut self.out,
            headers.into_iter().map(str::to_string).collect(),
            rows,
        )
    }

    #[tracing::instrument(skip(self, record))]
    pub fn print_record(&mut self, record: &Record, show_owner: bool) -> anyhow::Result<()> {
        let pages = |value: Option<u32>| value.map(|v| v.to_string()).unwrap_or_default();
        let mut lines = vec![
            ("id", record.id.to_string()),
            (FormField::Title.key(), record.title.clone()),
            (FormField::Author.key(), record.author.clone()),
            (
                FormField::Date.key(),
                record.day().map(format_display_date).unwrap_or_default(),
            ),
            ("time", format!("{} mins", record.time_spent)),
            ("current page", pages(record.current_page)),
            ("total pages", pages(record.total_pages)),
        ];
        if let Some(percent) = record.progress_percent() {
            lines.push(("progress", format!("{percent}%")));
        }
        if show_owner {
            lines.push(("user", record.owner_label().to_string()));
        }
        if let Some(reason) = record.reason.as_deref().filter(|r| !r.is_empty()) {
            lines.push(("reason", reason.to_string()));
        }
        lines.push((
            FormField::Notes.key(),
            record.notes.clone().unwrap_or_default(),
        ));

        let width = lines
            .iter()
            .map(|(label, _)| UnicodeWidthStr::width(*label))
            .max()
            .unwrap_or(0);
        for (label, value) in lines {
            writeln!(self.out, "{label:width$}  {value}")?;
        }
        Ok(())
    }

    pub fn print_history(&mut self, entries: &[HistoryEntryDto]) -> anyhow::Result<()> {
        writeln!(self.out)?;
        if entries.is_empty() {
            writeln!(self.out, "No reading history for this book yet.")?;
            return Ok(());
        }

        let rows = entries
            .iter()
            .map(|entry| {
                let marker = if entry.is_current {
                    self.paint("*", "32")
                } else {
                    String::new()
                };
                vec![
                    marker,
                    entry.date.map(format_display_date).unwrap_or_default(),
                    entry
                        .time_spent
                        .map(|minutes| format!("{minutes} mins"))
                        .unwrap_or_default(),
                    match (entry.current_page, entry.total_pages) {
                        (Some(current), Some(total)) => format!("{current}/{total}"),
                        (Some(current), None) => current.to_string(),
                        _ => String::new(),
                    },
                    entry.notes.clone().unwrap_or_default(),
                ]
            })
            .collect();

        write_table(
            &mut self.out,
            ["", "Date", "Time", "Pages", "Notes"]
                .map(str::to_string)
                .to_vec(),
            rows,
        )
    }

    pub fn print_stats(
        &mut self,
        label: &str,
        cards: &StatCards,
        series: &[(String, u64)],
    ) -> anyhow::Result<()> {
        writeln!(self.out, "{}", self.paint(label, "1"))?;
        writeln!(self.out, "Books:         {}", cards.book_count)?;
        writeln!(self.out, "Total time:    {}", cards.total_minutes)?;
        writeln!(self.out, "Daily average: {}", cards.daily_average)?;

        if series.is_empty() {
            return Ok(());
        }
        writeln!(self.out)?;
        let peak = series.iter().map(|(_, minutes)| *minutes).max().unwrap_or(0).max(1);
        let label_width = series
            .iter()
            .map(|(day, _)| UnicodeWidthStr::width(day.as_str()))
            .max()
            .unwrap_or(0);
        for (day, minutes) in series {
            let cells = (*minutes as f64 / peak as f64 * BAR_CELLS as f64).round() as usize;
            writeln!(
                self.out,
                "{day:label_width$}  {} {minutes}",
                self.paint(&"#".repeat(cells), "36")
            )?;
        }
        Ok(())
    }

    pub fn print_progress(&mut self, bars: &[ProgressBar]) -> anyhow::Result<()> {
        writeln!(self.out)?;
        if bars.is_empty() {
            writeln!(self.out, "No books in progress.")?;
            return Ok(());
        }
        let title_width = bars
            .iter()
            .map(|bar| UnicodeWidthStr::width(bar.title.as_str()))
            .max()
            .unwrap_or(0);
        for bar in bars {
            let filled = (bar.width / 100.0 * BAR_CELLS as f64).round() as usize;
            let padding = title_width.saturating_sub(UnicodeWidthStr::width(bar.title.as_str()));
            writeln!(
                self.out,
                "{}{}  [{}{}] {}",
                bar.title,
                " ".repeat(padding),
                self.paint(&"=".repeat(filled), "32"),
                " ".repeat(BAR_CELLS.saturating_sub(filled)),
                bar.label
            )?;
        }
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || text.is_empty() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for (header, width) in headers.iter().zip(widths.iter().copied()) {
        write!(writer, "{header:width$} ")?;
    }
    writeln!(writer)?;

    for width in widths.iter().copied() {
        write!(writer, "{:-<width$} ", "")?;
    }
    writeln!(writer)?;

    for row in rows {
        for (cell, width) in row.iter().zip(widths.iter().copied()) {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = width.saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use readlog_shared::RecordDto;

    use super::*;

    fn record(id: i64, title: &str) -> RecordDto {
        RecordDto {
            id,
            title: title.to_string(),
            author: "Frank Herbert".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 6, 1),
            created_at: None,
            time_spent: 45,
            current_page: Some(50),
            total_pages: Some(200),
            notes: Some("Spice".to_string()),
            username: Some("paul".to_string()),
            reason: None,
        }
    }

    fn rendered(render: impl FnOnce(&mut Renderer<Vec<u8>>) -> anyhow::Result<()>) -> String {
        let mut renderer = Renderer::plain(Vec::new());
        render(&mut renderer).expect("render");
        String::from_utf8(renderer.into_inner()).expect("utf8")
    }

    #[test]
    fn record_table_aligns_columns_and_shows_owner() {
        let text = rendered(|r| {
            r.print_records(&[record(1, "Dune"), record(22, "Dune Messiah")], true, None, "")
        });
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("ID Date"));
        assert!(lines[0].contains("User"));
        assert!(lines[2].contains("25%"));
        assert!(lines[2].contains("paul"));
        assert_eq!(lines[2].find("Frank"), lines[3].find("Frank"));
    }

    #[test]
    fn empty_list_prints_message() {
        let text = rendered(|r| r.print_records(&[], false, None, "No reading logs found."));
        assert_eq!(text, "No reading logs found.\n");
    }

    #[test]
    fn strip_ansi_removes_color_codes() {
        assert_eq!(strip_ansi("\x1b[33m12\x1b[0m"), "12");
    }

    #[test]
    fn progress_bars_are_scaled_to_width() {
        let bars = vec![ProgressBar {
            title: "Dune".to_string(),
            width: 50.0,
            label: "50%".to_string(),
        }];
        let text = rendered(|r| r.print_progress(&bars));
        let filled = "=".repeat(BAR_CELLS / 2);
        assert!(text.contains(&format!("[{filled} ")));
        assert!(text.trim_end().ends_with("50%"));
    }
}
