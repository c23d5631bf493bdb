use chrono::NaiveDate;
pub use readlog_shared::{RecordDraft, RecordDto as Record, RecordId};

/// Behaviour shared by every page that lists records.
pub trait RecordExt {
    /// The canonical timestamp: `date`, or the day part of `createdAt`
    /// when the server did not send a date.
    fn day(&self) -> Option<NaiveDate>;

    fn progress_percent(&self) -> Option<u32>;

    fn matches_query(&self, lowered_query: &str) -> bool;

    fn is_same_book(&self, title: &str, author: &str) -> bool;

    fn notes_preview(&self, max_chars: usize) -> Option<String>;

    fn owner_label(&self) -> &str;
}

impl RecordExt for Record {
    fn day(&self) -> Option<NaiveDate> {
        self.date
            .or_else(|| self.created_at.map(|ts| ts.date()))
    }

    fn progress_percent(&self) -> Option<u32> {
        let total = self.total_pages.filter(|total| *total > 0)?;
        let current = f64::from(self.current_page.unwrap_or(0));
        let percent = (current / f64::from(total) * 100.0).round();
        Some(percent as u32)
    }

    fn matches_query(&self, lowered_query: &str) -> bool {
        if lowered_query.is_empty() {
            return true;
        }

        self.title.to_lowercase().contains(lowered_query)
            || self.author.to_lowercase().contains(lowered_query)
            || self
                .notes
                .as_deref()
                .is_some_and(|notes| notes.to_lowercase().contains(lowered_query))
    }

    fn is_same_book(&self, title: &str, author: &str) -> bool {
        self.title.trim().to_lowercase() == title.trim().to_lowercase()
            && self.author.trim().to_lowercase() == author.trim().to_lowercase()
    }

    fn notes_preview(&self, max_chars: usize) -> Option<String> {
        let notes = self.notes.as_deref().filter(|notes| !notes.is_empty())?;
        if notes.chars().count() <= max_chars {
            return Some(notes.to_string());
        }
        let cut: String = notes.chars().take(max_chars).collect();
        Some(format!("{cut}..."))
    }

    fn owner_label(&self) -> &str {
        self.username
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or("Unknown User")
    }
}

#[cfg(test)]
pub(crate) fn sample(id: RecordId, title: &str, author: &str) -> Record {
    Record {
        id,
        title: title.to_string(),
        author: author.to_string(),
        date: NaiveDate::from_ymd_opt(2024, 1, 1),
        created_at: None,
        time_spent: 30,
        current_page: None,
        total_pages: None,
        notes: None,
        username: None,
        reason: None,
    }
}
