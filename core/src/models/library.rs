use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Target;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReadingStatus {
    #[default]
    PlanToRead,
    Reading,
    Completed,
    OnHold,
    Dropped,
}

impl ReadingStatus {
    pub const ALL: [ReadingStatus; 5] = [
        ReadingStatus::PlanToRead,
        ReadingStatus::Reading,
        ReadingStatus::Completed,
        ReadingStatus::OnHold,
        ReadingStatus::Dropped,
    ];

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "plan_to_read" => Some(ReadingStatus::PlanToRead),
            "reading" => Some(ReadingStatus::Reading),
            "completed" => Some(ReadingStatus::Completed),
            "on_hold" => Some(ReadingStatus::OnHold),
            "dropped" => Some(ReadingStatus::Dropped),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingStatus::PlanToRead => "plan_to_read",
            ReadingStatus::Reading => "reading",
            ReadingStatus::Completed => "completed",
            ReadingStatus::OnHold => "on_hold",
            ReadingStatus::Dropped => "dropped",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ReadingStatus::PlanToRead => "Plan to Read",
            ReadingStatus::Reading => "Reading",
            ReadingStatus::Completed => "Completed",
            ReadingStatus::OnHold => "On Hold",
            ReadingStatus::Dropped => "Dropped",
        }
    }
}

/// Reading progress of one user on one comic or novel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LibraryEntry {
    pub id: i64,
    pub user_id: i64,
    pub target: Target,
    pub status: ReadingStatus,
    pub progress: i64,
    /// Chapter count of the target at read time; 0 when unknown.
    pub total_chapters: i64,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LibraryEntry {
    pub fn new(user_id: i64, target: Target, total_chapters: i64) -> Self {
        let now = super::now();
        Self {
            id: 0,
            user_id,
            target,
            status: ReadingStatus::PlanToRead,
            progress: 0,
            total_chapters,
            started_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to `status`, maintaining the started/completed timestamps.
    pub fn apply_status(&mut self, status: ReadingStatus, now: DateTime<Utc>) {
        let previous = self.status;
        self.status = status;

        if matches!(status, ReadingStatus::Reading | ReadingStatus::OnHold) && self.started_at.is_none() {
            self.started_at = Some(now);
        }

        if status == ReadingStatus::Completed {
            if previous != ReadingStatus::Completed && self.completed_at.is_none() {
                self.completed_at = Some(now);
            }
        } else if previous == ReadingStatus::Completed {
            self.completed_at = None;
        }
    }

    /// Set progress, rejecting values past the known chapter count.
    pub fn set_progress(&mut self, progress: i64) -> Result<()> {
        if progress < 0 {
            return Err(Error::Validation("progress cannot be negative".to_string()));
        }
        if self.total_chapters > 0 && progress > self.total_chapters {
            return Err(Error::Validation(format!(
                "progress ({}) cannot exceed total chapters ({})",
                progress, self.total_chapters
            )));
        }
        self.progress = progress;
        Ok(())
    }

    /// Clamp progress to the chapter count, which may have shrunk since it was recorded.
    pub fn cap_progress(&mut self) {
        if self.total_chapters > 0 && self.progress > self.total_chapters {
            self.progress = self.total_chapters;
        }
    }

    pub fn completion_percentage(&self) -> f64 {
        if self.total_chapters == 0 {
            return 0.0;
        }
        let pct = self.progress as f64 / self.total_chapters as f64 * 100.0;
        (pct * 100.0).round() / 100.0
    }

    pub fn is_caught_up(&self) -> bool {
        self.total_chapters > 0 && self.progress >= self.total_chapters
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LibraryFilter {
    pub status: Option<String>,
    /// `comic`, `novel`, or anything else for both.
    pub media_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LibraryStats {
    pub total: i64,
    pub by_status: BTreeMap<String, i64>,
    pub by_type: BTreeMap<String, i64>,
    pub avg_completion: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry(total: i64) -> LibraryEntry {
        LibraryEntry::new(1, Target::Comic(1), total)
    }

    #[test]
    fn test_started_at_set_once() {
        let mut e = entry(10);
        let t0 = super::super::now();
        e.apply_status(ReadingStatus::Reading, t0);
        assert_eq!(e.started_at, Some(t0));

        e.apply_status(ReadingStatus::OnHold, t0 + Duration::days(1));
        assert_eq!(e.started_at, Some(t0));
    }

    #[test]
    fn test_completed_at_lifecycle() {
        let mut e = entry(10);
        let t0 = super::super::now();
        e.apply_status(ReadingStatus::Completed, t0);
        assert_eq!(e.completed_at, Some(t0));
        // plan_to_read -> completed does not touch started_at
        assert_eq!(e.started_at, None);

        e.apply_status(ReadingStatus::Completed, t0 + Duration::days(2));
        assert_eq!(e.completed_at, Some(t0));

        e.apply_status(ReadingStatus::Reading, t0 + Duration::days(3));
        assert_eq!(e.completed_at, None);
    }

    #[test]
    fn test_progress_validation_and_cap() {
        let mut e = entry(10);
        assert!(e.set_progress(11).is_err());
        assert!(e.set_progress(-1).is_err());
        e.set_progress(10).unwrap();
        assert!(e.is_caught_up());

        e.total_chapters = 8;
        e.cap_progress();
        assert_eq!(e.progress, 8);
    }

    #[test]
    fn test_unknown_total_allows_any_progress() {
        let mut e = entry(0);
        e.set_progress(500).unwrap();
        assert_eq!(e.completion_percentage(), 0.0);
        assert!(!e.is_caught_up());
    }

    #[test]
    fn test_completion_percentage_rounding() {
        let mut e = entry(3);
        e.set_progress(1).unwrap();
        assert_eq!(e.completion_percentage(), 33.33);
    }
}
