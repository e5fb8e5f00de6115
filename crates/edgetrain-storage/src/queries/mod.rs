//! SQL for each table. Every function takes a `&Connection` so callers can
//! pass either a plain connection or an open transaction.

pub mod device_ops;
pub mod job_ops;
pub mod sample_ops;
pub mod transition_ops;

use chrono::{DateTime, Utc};

use edgetrain_core::errors::{EdgeTrainResult, StorageError};

pub(crate) fn parse_ts(table: &str, value: &str) -> EdgeTrainResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| {
            StorageError::CorruptRow {
                table: table.to_string(),
                details: format!("bad timestamp {value:?}: {e}"),
            }
            .into()
        })
}

pub(crate) fn parse_opt_ts(
    table: &str,
    value: Option<String>,
) -> EdgeTrainResult<Option<DateTime<Utc>>> {
    value.map(|v| parse_ts(table, &v)).transpose()
}

pub(crate) fn parse_enum<T>(table: &str, value: &str) -> EdgeTrainResult<T>
where
    T: std::str::FromStr,
{
    value.parse::<T>().map_err(|_| {
        StorageError::CorruptRow {
            table: table.to_string(),
            details: format!("unexpected value {value:?}"),
        }
        .into()
    })
}
