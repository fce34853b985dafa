/// Job identifiers are UUIDv7: unique, time-ordered, generated at submission.
pub type JobId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Version id assigned by the table store on commit.
///
/// Per-table and monotonically increasing; the first commit to a table is
/// version 0.
pub type TableVersion = u64;
