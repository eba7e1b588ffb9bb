use crate::error::{Error, ErrorKind};
use exn::ResultExt;
use time::UtcDateTime;

/// One synchronization run as recorded in the ledger.
///
/// A run is "in progress" while `finished_at` is `None`. The cursor holds
/// the modification timestamp of the last durably written record; the next
/// run's feed window starts there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: UtcDateTime,
    pub finished_at: Option<UtcDateTime>,
    pub cursor: Option<UtcDateTime>,
    pub total_count: u64,
    pub processed_count: u64,
    pub error: Option<String>,
}

impl RunRecord {
    /// Whether the run never recorded an end time.
    ///
    /// Either it is genuinely still running, or the process died mid-run.
    /// The ledger cannot tell the two apart; a permanently open row needs
    /// an operator to resolve it.
    pub fn is_open(&self) -> bool {
        self.finished_at.is_none()
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct RunRow {
    pub(crate) id: i64,
    pub(crate) started_at: i64,
    pub(crate) finished_at: Option<i64>,
    pub(crate) cursor: Option<i64>,
    pub(crate) total_count: i64,
    pub(crate) processed_count: i64,
    pub(crate) error: Option<String>,
}

impl TryFrom<RunRow> for RunRecord {
    type Error = Error;
    fn try_from(row: RunRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            started_at: UtcDateTime::from_unix_timestamp(row.started_at)
                .or_raise(|| ErrorKind::InvalidData("run start timestamp"))?,
            finished_at: row
                .finished_at
                .map(|ts| UtcDateTime::from_unix_timestamp(ts).or_raise(|| ErrorKind::InvalidData("run end timestamp")))
                .transpose()?,
            cursor: row
                .cursor
                .map(|ts| UtcDateTime::from_unix_timestamp(ts).or_raise(|| ErrorKind::InvalidData("run cursor")))
                .transpose()?,
            total_count: u64::try_from(row.total_count).or_raise(|| ErrorKind::InvalidData("run total count"))?,
            processed_count: u64::try_from(row.processed_count)
                .or_raise(|| ErrorKind::InvalidData("run processed count"))?,
            error: row.error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_run() {
        let record = RunRecord::try_from(RunRow {
            id: 1,
            started_at: 1_700_000_000,
            finished_at: None,
            cursor: Some(1_699_999_000),
            total_count: 137,
            processed_count: 100,
            error: None,
        })
        .unwrap();
        assert!(record.is_open());
        assert_eq!(record.cursor.unwrap().unix_timestamp(), 1_699_999_000);
    }

    #[test]
    fn test_negative_count_is_invalid() {
        let result = RunRecord::try_from(RunRow {
            id: 1,
            started_at: 1_700_000_000,
            finished_at: Some(1_700_000_100),
            cursor: None,
            total_count: -1,
            processed_count: 0,
            error: None,
        });
        assert!(result.is_err());
    }
}
