use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use shared_models::error::ApiError;

pub const DEFAULT_PAGE_SIZE: usize = 10;

fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("invalid id: {}", other))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    Sent,
    Pending,
    Failed,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Pending => "pending",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationStatus {
    type Err = ApiError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sent" => Ok(Self::Sent),
            "pending" => Ok(Self::Pending),
            "failed" => Ok(Self::Failed),
            other => Err(ApiError::Validation(format!("Status de notificação desconhecido: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub recipient_email: String,
    #[serde(default)]
    pub pet_id: Option<String>,
    #[serde(default)]
    pub pet_name: Option<String>,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub sent_at: String,
    pub status: NotificationStatus,
    #[serde(default)]
    pub appointment_id: Option<String>,
    #[serde(default)]
    pub appointment_type: Option<String>,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl Notification {
    /// `sentAt` as `dd/MM/yyyy HH:mm` local time. Unparseable values are
    /// shown as sent.
    pub fn formatted_date(&self) -> String {
        let raw = self.sent_at.trim();

        if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
            return instant.with_timezone(&Local).format("%d/%m/%Y %H:%M").to_string();
        }

        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(instant) = NaiveDateTime::parse_from_str(raw, format) {
                return instant.format("%d/%m/%Y %H:%M").to_string();
            }
        }

        raw.to_string()
    }

    pub fn can_resend(&self) -> bool {
        self.status == NotificationStatus::Failed
    }
}

/// A notification as the views render it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationItem {
    #[serde(flatten)]
    pub notification: Notification,
    pub formatted_date: String,
}

impl From<Notification> for NotificationItem {
    fn from(notification: Notification) -> Self {
        Self {
            formatted_date: notification.formatted_date(),
            notification,
        }
    }
}

/// Filters forwarded to the notification service as query parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationFilter {
    pub pet_id: Option<String>,
    /// `None` means every status.
    pub status: Option<NotificationStatus>,
    pub notification_type: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Accepts RFC 3339 or a plain `yyyy-mm-dd`, read as local midnight.
pub fn parse_boundary(value: &str) -> Result<DateTime<Utc>, ApiError> {
    let trimmed = value.trim();

    if let Ok(instant) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(instant.with_timezone(&Utc));
    }

    let day = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map_err(|_| ApiError::InvalidDate(value.to_string()))?;

    Local
        .from_local_datetime(&day.and_time(NaiveTime::MIN))
        .earliest()
        .map(|instant| instant.with_timezone(&Utc))
        .ok_or_else(|| ApiError::InvalidDate(value.to_string()))
}

impl NotificationFilter {
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();

        if let Some(pet_id) = &self.pet_id {
            params.push(("petId", pet_id.clone()));
        }
        if let Some(status) = self.status {
            params.push(("status", status.as_str().to_string()));
        }
        if let Some(kind) = &self.notification_type {
            params.push(("type", kind.clone()));
        }
        if let Some(start) = self.start_date {
            params.push(("startDate", start.to_rfc3339_opts(SecondsFormat::Millis, true)));
        }
        if let Some(end) = self.end_date {
            params.push(("endDate", end.to_rfc3339_opts(SecondsFormat::Millis, true)));
        }

        params
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationListQuery {
    #[serde(alias = "pet_id")]
    pub pet_id: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub notification_type: Option<String>,
    #[serde(alias = "start_date")]
    pub start_date: Option<String>,
    #[serde(alias = "end_date")]
    pub end_date: Option<String>,
    pub page: Option<usize>,
    #[serde(alias = "page_size")]
    pub page_size: Option<usize>,
}

impl NotificationListQuery {
    pub fn filter(&self) -> Result<NotificationFilter, ApiError> {
        let status = match non_blank(&self.status) {
            None => None,
            Some(s) if s.eq_ignore_ascii_case("all") => None,
            Some(s) => Some(s.parse()?),
        };

        Ok(NotificationFilter {
            pet_id: non_blank(&self.pet_id),
            status,
            notification_type: non_blank(&self.notification_type),
            start_date: non_blank(&self.start_date).map(|d| parse_boundary(&d)).transpose()?,
            end_date: non_blank(&self.end_date).map(|d| parse_boundary(&d)).transpose()?,
        })
    }
}
