// Share analytics domain models.
//
// Share events are an append-only log: once recorded they are never
// mutated, and the read side is purely aggregate queries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where a share was sent. Mirrors the share targets the clients report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SharePlatform {
    Whatsapp,
    Facebook,
    Twitter,
    Instagram,
    Linkedin,
    Telegram,
    Email,
    Sms,
    Bluetooth,
    Chrome,
    Files,
    Gmail,
    Quickshare,
    Copy,
    NativeShare,
    Other,
}

impl SharePlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            SharePlatform::Whatsapp => "whatsapp",
            SharePlatform::Facebook => "facebook",
            SharePlatform::Twitter => "twitter",
            SharePlatform::Instagram => "instagram",
            SharePlatform::Linkedin => "linkedin",
            SharePlatform::Telegram => "telegram",
            SharePlatform::Email => "email",
            SharePlatform::Sms => "sms",
            SharePlatform::Bluetooth => "bluetooth",
            SharePlatform::Chrome => "chrome",
            SharePlatform::Files => "files",
            SharePlatform::Gmail => "gmail",
            SharePlatform::Quickshare => "quickshare",
            SharePlatform::Copy => "copy",
            SharePlatform::NativeShare => "native-share",
            SharePlatform::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "whatsapp" => Some(SharePlatform::Whatsapp),
            "facebook" => Some(SharePlatform::Facebook),
            "twitter" => Some(SharePlatform::Twitter),
            "instagram" => Some(SharePlatform::Instagram),
            "linkedin" => Some(SharePlatform::Linkedin),
            "telegram" => Some(SharePlatform::Telegram),
            "email" => Some(SharePlatform::Email),
            "sms" => Some(SharePlatform::Sms),
            "bluetooth" => Some(SharePlatform::Bluetooth),
            "chrome" => Some(SharePlatform::Chrome),
            "files" => Some(SharePlatform::Files),
            "gmail" => Some(SharePlatform::Gmail),
            "quickshare" => Some(SharePlatform::Quickshare),
            "copy" => Some(SharePlatform::Copy),
            "native-share" => Some(SharePlatform::NativeShare),
            "other" => Some(SharePlatform::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for SharePlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ShareMethod {
    #[default]
    JustOnce,
    Always,
}

impl ShareMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShareMethod::JustOnce => "just-once",
            ShareMethod::Always => "always",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "just-once" => Some(ShareMethod::JustOnce),
            "always" => Some(ShareMethod::Always),
            _ => None,
        }
    }
}

/// Device details reported alongside a share.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareDeviceInfo {
    pub device_type: Option<String>,
    pub os: Option<String>,
    pub browser: Option<String>,
    pub screen_size: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareLocation {
    pub ip_address: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
}

/// One recorded share. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareEvent {
    pub id: Uuid,
    /// Anonymous shares are allowed, so the submitter is optional.
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub platform: SharePlatform,
    pub share_method: ShareMethod,
    pub shared_url: String,
    pub device_info: ShareDeviceInfo,
    pub location: ShareLocation,
    pub session_id: Option<String>,
    pub referrer: Option<String>,
    pub campaign: Option<String>,
    pub tags: Vec<String>,
    pub success: bool,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Time bucket for grouped share counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShareGroupBy {
    #[default]
    Day,
    Month,
    Year,
}

impl ShareGroupBy {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "day" => Some(ShareGroupBy::Day),
            "month" => Some(ShareGroupBy::Month),
            "year" => Some(ShareGroupBy::Year),
            _ => None,
        }
    }

    /// strftime format that renders the bucket key.
    pub fn time_format(&self) -> &'static str {
        match self {
            ShareGroupBy::Day => "%Y-%m-%d",
            ShareGroupBy::Month => "%Y-%m",
            ShareGroupBy::Year => "%Y",
        }
    }
}

/// Filters for the grouped analytics query.
#[derive(Debug, Clone, Default)]
pub struct ShareAnalyticsQuery {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub platform: Option<SharePlatform>,
    pub group_by: ShareGroupBy,
}

/// One (time bucket, platform) aggregate row.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareAnalyticsRow {
    pub period: String,
    pub platform: SharePlatform,
    pub count: i64,
    pub unique_users: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareAnalyticsSummary {
    pub total_shares: i64,
    pub unique_users: i64,
    pub start_date: String,
    pub end_date: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_platform_round_trips_through_its_wire_name() {
        let all = [
            SharePlatform::Whatsapp,
            SharePlatform::Facebook,
            SharePlatform::Twitter,
            SharePlatform::Instagram,
            SharePlatform::Linkedin,
            SharePlatform::Telegram,
            SharePlatform::Email,
            SharePlatform::Sms,
            SharePlatform::Bluetooth,
            SharePlatform::Chrome,
            SharePlatform::Files,
            SharePlatform::Gmail,
            SharePlatform::Quickshare,
            SharePlatform::Copy,
            SharePlatform::NativeShare,
            SharePlatform::Other,
        ];
        for platform in all {
            assert_eq!(SharePlatform::parse(platform.as_str()), Some(platform));
            // serde and the manual mapping must agree.
            let json = serde_json::to_value(platform).unwrap();
            assert_eq!(json, platform.as_str());
        }
        assert_eq!(SharePlatform::parse("myspace"), None);
    }

    #[test]
    fn group_by_formats() {
        assert_eq!(ShareGroupBy::Day.time_format(), "%Y-%m-%d");
        assert_eq!(ShareGroupBy::Month.time_format(), "%Y-%m");
        assert_eq!(ShareGroupBy::Year.time_format(), "%Y");
        assert_eq!(ShareGroupBy::parse("week"), None);
    }
}
