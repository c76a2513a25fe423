mod content;
mod favorite;
mod interaction;
mod library;
mod like;
mod review;
mod target;
mod user;

pub use content::{Content, ContentFilter, ContentStatus, Genre, NewContent};
pub use favorite::{Favorite, FavoriteDetail, NewFavorite, Partition, RankAssignment, TargetDetail};
pub use interaction::Interaction;
pub use library::{LibraryEntry, LibraryFilter, LibraryStats, ReadingStatus};
pub use like::Like;
pub use review::{Review, ReviewFilter};
pub use target::{Target, TargetKind, TargetRef};
pub use user::User;

use chrono::{DateTime, Utc};

/// Convert Unix timestamp (seconds) to DateTime<Utc>
pub fn timestamp_to_datetime(timestamp: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(timestamp, 0).unwrap_or_default()
}

/// Convert DateTime<Utc> to Unix timestamp (seconds)
pub fn datetime_to_timestamp(datetime: &DateTime<Utc>) -> i64 {
    datetime.timestamp()
}

/// Current time truncated to whole seconds, matching what the database stores.
pub fn now() -> DateTime<Utc> {
    timestamp_to_datetime(Utc::now().timestamp())
}
