//! Collection-specific row columns.

use serde::Serialize;
use serde_json::Value;

use crate::record::ContentRecord;

/// The collection-specific part of a row.
pub trait RowDetail: Serialize + Sized {
    fn from_record(record: &ContentRecord) -> Self;

    /// The headline column.
    fn title(&self) -> Option<&str>;
}

/// Title only. Used for collections without a dedicated layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenericDetail {
    pub title: Option<String>,
}

impl RowDetail for GenericDetail {
    fn from_record(record: &ContentRecord) -> Self {
        Self {
            title: record.title().map(str::to_string),
        }
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerDetail {
    pub title: Option<String>,
    pub link_url: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl RowDetail for BannerDetail {
    fn from_record(record: &ContentRecord) -> Self {
        let f = &record.fields;
        Self {
            title: record.title().map(str::to_string),
            link_url: f.get_text("url"),
            start_date: f.get_text("startDate"),
            end_date: f.get_text("endDate"),
        }
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsDetail {
    pub headline: Option<String>,
    pub news_type: Option<String>,
    pub category: Option<String>,
    pub agency: Option<String>,
    pub publish_date: Option<String>,
    pub read_volume: u64,
    pub likes: u64,
    pub shares: u64,
    pub comments: u64,
}

impl RowDetail for NewsDetail {
    fn from_record(record: &ContentRecord) -> Self {
        let f = &record.fields;
        Self {
            headline: record.title().map(str::to_string),
            news_type: f.get_text("type").or_else(|| f.get_text("newsType")),
            category: f.get_text("category"),
            agency: f.get_text("agency"),
            publish_date: f.get_text("publishDate"),
            read_volume: counter(f.get("readVolume")),
            likes: counter(f.get("likes")),
            shares: counter(f.get("shares")),
            comments: counter(f.get("comments")),
        }
    }

    fn title(&self) -> Option<&str> {
        self.headline.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MagazineDetail {
    pub title: Option<String>,
    pub issue_number: Option<String>,
    pub publish_date: Option<String>,
    pub read_volume: u64,
    /// True when the attached asset is the issue PDF rather than a cover.
    pub has_pdf: bool,
}

impl RowDetail for MagazineDetail {
    fn from_record(record: &ContentRecord) -> Self {
        let f = &record.fields;
        Self {
            title: record.title().map(str::to_string),
            issue_number: f.get_text("issueNumber"),
            publish_date: f.get_text("publishDate"),
            read_volume: counter(f.get("readVolume")),
            has_pdf: record
                .asset
                .as_ref()
                .is_some_and(|a| a.mime() == "application/pdf"),
        }
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultimediaDetail {
    pub title: Option<String>,
    pub video_url: Option<String>,
    pub duration: Option<String>,
}

impl RowDetail for MultimediaDetail {
    fn from_record(record: &ContentRecord) -> Self {
        let f = &record.fields;
        Self {
            title: record.title().map(str::to_string),
            video_url: f.get_text("videoUrl"),
            duration: f.get_text("duration"),
        }
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }
}

// Counters may arrive as numbers or numeric strings from the remote API.
fn counter(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    use crate::asset::EncodedAsset;
    use crate::record::Payload;
    use crate::types::RecordKey;

    fn record(fields: Value) -> ContentRecord {
        let now = Utc::now();
        ContentRecord {
            key: RecordKey::external("n1").unwrap(),
            position: Some(1),
            status: true,
            fields: Payload::new(fields).unwrap(),
            asset: None,
            created_at: now,
            updated_at: now,
            created_by: String::new(),
            edited_by: String::new(),
        }
    }

    #[test]
    fn news_counters_accept_strings() {
        let detail = NewsDetail::from_record(&record(json!({
            "headline": "Budget",
            "newsType": "Hotnews",
            "readVolume": "120",
            "likes": 4,
            "shares": null
        })));
        assert_eq!(detail.headline.as_deref(), Some("Budget"));
        assert_eq!(detail.news_type.as_deref(), Some("Hotnews"));
        assert_eq!(detail.read_volume, 120);
        assert_eq!(detail.likes, 4);
        assert_eq!(detail.shares, 0);
    }

    #[test]
    fn magazine_detects_pdf() {
        let mut rec = record(json!({"title": "Issue", "issueNumber": 7}));
        rec.asset = Some(EncodedAsset::new("data:application/pdf;base64,JVBE").unwrap());
        let detail = MagazineDetail::from_record(&rec);
        assert!(detail.has_pdf);
        assert_eq!(detail.issue_number.as_deref(), Some("7"));
    }
}
