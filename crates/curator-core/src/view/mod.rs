//! Ordered view projection.
//!
//! Turns repository reads into the flat, filtered, ordered rows a
//! presentation layer shows. Display positions are always re-derived from
//! the row index, so gaps or duplicates in stored positions never reach
//! the screen.

mod detail;
mod row;

pub use detail::{
    BannerDetail, GenericDetail, MagazineDetail, MultimediaDetail, NewsDetail, RowDetail,
};
pub use row::{DateTimePair, Row};

use chrono::FixedOffset;

use crate::record::{ContentRecord, StatusFilter};
use crate::types::RecordKey;

/// Projection options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewOptions {
    pub filter: StatusFilter,
    /// Offset used to render timestamps.
    pub offset: FixedOffset,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            filter: StatusFilter::All,
            offset: utc(),
        }
    }
}

impl ViewOptions {
    pub fn new(filter: StatusFilter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    /// Use an offset given in minutes east of UTC. Out-of-range values
    /// fall back to UTC.
    pub fn with_offset_minutes(self, minutes: i32) -> Self {
        let offset = minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(utc);
        self.with_offset(offset)
    }
}

fn utc() -> FixedOffset {
    FixedOffset::east_opt(0).unwrap_or_else(|| unreachable!("zero offset is valid"))
}

/// Filter `records` and put them in display order.
///
/// Records with a stored position come first, by position. Records without
/// one follow in iteration order. The sort is stable.
pub fn ordered(records: &[ContentRecord], filter: StatusFilter) -> Vec<&ContentRecord> {
    let mut visible: Vec<&ContentRecord> = records
        .iter()
        .filter(|r| filter.matches(r.status))
        .collect();
    visible.sort_by_key(|r| match r.position {
        Some(p) => (0, p),
        None => (1, 0),
    });
    visible
}

/// The key sequence of the ordered view.
pub fn ordered_keys(records: &[ContentRecord], filter: StatusFilter) -> Vec<RecordKey> {
    ordered(records, filter).into_iter().map(|r| r.key.clone()).collect()
}

/// Project `records` into rows.
pub fn project<D: RowDetail>(records: &[ContentRecord], options: &ViewOptions) -> Vec<Row<D>> {
    ordered(records, options.filter)
        .into_iter()
        .enumerate()
        .map(|(idx, record)| Row::from_record(record, idx + 1, options.offset))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use crate::record::Payload;

    fn record(key: u64, position: Option<u32>, status: bool) -> ContentRecord {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 22, 5, 0).unwrap();
        ContentRecord {
            key: RecordKey::Auto(key),
            position,
            status,
            fields: Payload::new(json!({"title": format!("item {key}")})).unwrap(),
            asset: None,
            created_at: at,
            updated_at: at,
            created_by: String::new(),
            edited_by: String::new(),
        }
    }

    #[test]
    fn orders_by_position_then_iteration() {
        let records = vec![
            record(1, Some(3), true),
            record(2, None, true),
            record(3, Some(1), true),
            record(4, None, true),
            record(5, Some(2), true),
        ];
        let keys: Vec<RecordKey> = ordered_keys(&records, StatusFilter::All);
        assert_eq!(
            keys,
            vec![3u64, 5, 1, 2, 4].into_iter().map(RecordKey::Auto).collect::<Vec<_>>()
        );
    }

    #[test]
    fn display_positions_have_no_gaps() {
        let records = vec![
            record(1, Some(2), true),
            record(2, Some(5), false),
            record(3, Some(9), true),
        ];
        let rows: Vec<Row<GenericDetail>> =
            project(&records, &ViewOptions::new(StatusFilter::Active));
        let positions: Vec<usize> = rows.iter().map(|r| r.display_position).collect();
        assert_eq!(positions, vec![1, 2]);
        assert_eq!(rows[1].key, RecordKey::Auto(3));
        assert_eq!(rows[1].detail.title.as_deref(), Some("item 3"));
    }

    #[test]
    fn equal_positions_keep_iteration_order() {
        let records = vec![
            record(7, Some(1), true),
            record(8, Some(1), true),
        ];
        let keys = ordered_keys(&records, StatusFilter::All);
        assert_eq!(keys, vec![RecordKey::Auto(7), RecordKey::Auto(8)]);
    }

    #[test]
    fn inactive_filter_hides_active() {
        let records = vec![record(1, Some(1), true), record(2, Some(2), false)];
        let keys = ordered_keys(&records, StatusFilter::Inactive);
        assert_eq!(keys, vec![RecordKey::Auto(2)]);
    }

    #[test]
    fn projection_is_deterministic() {
        let records = vec![record(1, Some(2), true), record(2, Some(1), false)];
        let options = ViewOptions::default().with_offset_minutes(330);
        let a: Vec<Row<GenericDetail>> = project(&records, &options);
        let b: Vec<Row<GenericDetail>> = project(&records, &options);
        assert_eq!(a, b);
        assert_eq!(a[0].created.date, "10/03/2024");
        assert_eq!(a[0].created.time, "03:35");
    }

    #[test]
    fn out_of_range_offset_falls_back_to_utc() {
        let options = ViewOptions::default().with_offset_minutes(100_000);
        assert_eq!(options.offset.local_minus_utc(), 0);
    }
}
