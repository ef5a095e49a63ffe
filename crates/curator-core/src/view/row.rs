use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

use crate::record::ContentRecord;
use crate::types::RecordKey;

use super::RowDetail;

/// A timestamp split into the date and time columns of a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateTimePair {
    /// `dd/mm/yyyy`
    pub date: String,
    /// `HH:MM`, 24-hour.
    pub time: String,
}

impl DateTimePair {
    pub fn format(at: Option<DateTime<Utc>>, offset: FixedOffset) -> Self {
        match at {
            Some(at) => {
                let local = at.with_timezone(&offset);
                Self {
                    date: local.format("%d/%m/%Y").to_string(),
                    time: local.format("%H:%M").to_string(),
                }
            }
            None => Self::missing(),
        }
    }

    pub fn missing() -> Self {
        Self {
            date: "--/--/----".to_string(),
            time: "--:--".to_string(),
        }
    }
}

/// One displayed row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Row<D> {
    pub key: RecordKey,
    /// 1-based index in the filtered view.
    pub display_position: usize,
    pub status: bool,
    pub created: DateTimePair,
    pub updated: DateTimePair,
    pub created_by: String,
    pub edited_by: String,
    /// The asset as a data URL.
    pub asset_url: Option<String>,
    pub detail: D,
}

impl<D: RowDetail> Row<D> {
    pub(crate) fn from_record(
        record: &ContentRecord,
        display_position: usize,
        offset: FixedOffset,
    ) -> Self {
        Self {
            key: record.key.clone(),
            display_position,
            status: record.status,
            created: DateTimePair::format(Some(record.created_at), offset),
            updated: DateTimePair::format(Some(record.updated_at), offset),
            created_by: record.created_by.clone(),
            edited_by: record.edited_by.clone(),
            asset_url: record.asset.as_ref().map(|a| a.as_str().to_string()),
            detail: D::from_record(record),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formats_in_offset() {
        let at = Utc.with_ymd_and_hms(2023, 12, 31, 23, 30, 0).unwrap();
        let pair = DateTimePair::format(Some(at), FixedOffset::east_opt(3600).unwrap());
        assert_eq!(pair.date, "01/01/2024");
        assert_eq!(pair.time, "00:30");
    }

    #[test]
    fn missing_timestamp_placeholder() {
        let pair = DateTimePair::format(None, FixedOffset::east_opt(0).unwrap());
        assert_eq!(pair.date, "--/--/----");
        assert_eq!(pair.time, "--:--");
    }
}
