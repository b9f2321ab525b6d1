//! Front matter written at the top of every exported note.

use chrono::{DateTime, Local};
use std::time::SystemTime;

pub const DELIMITER: &str = "---";

/// Calendar date of a modification time, in the local time zone.
///
/// ```
/// use quartify_core::frontmatter::format_date;
/// use std::time::SystemTime;
///
/// let date = format_date(SystemTime::now());
/// assert_eq!(date.len(), "2025-01-01".len());
/// ```
pub fn format_date(modified: SystemTime) -> String {
    DateTime::<Local>::from(modified)
        .format("%Y-%m-%d")
        .to_string()
}

pub fn date_line(date: &str) -> String {
    format!("date: {date}")
}

/// Where a note is relative to its front matter block
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum FrontmatterState {
    /// Opening lines written; waiting for the first non-blank line
    #[default]
    Open,
    /// Copying a tags block verbatim into the front matter
    Tags,
    /// Closing delimiter written
    Closed,
}

impl FrontmatterState {
    pub fn is_closed(self) -> bool {
        self == FrontmatterState::Closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    #[test]
    fn test_format_date_uses_local_calendar_day() {
        let noon = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let local = Local.from_local_datetime(&noon).unwrap();

        assert_eq!(format_date(SystemTime::from(local)), "2024-03-09");
    }

    #[test]
    fn test_date_line() {
        assert_eq!(date_line("2024-03-09"), "date: 2024-03-09");
    }

    #[test]
    fn test_initial_state_is_open() {
        assert_eq!(FrontmatterState::default(), FrontmatterState::Open);
        assert!(!FrontmatterState::Tags.is_closed());
        assert!(FrontmatterState::Closed.is_closed());
    }
}
