use reqwest::Method;
use serde_json::json;
use tracing::{debug, info, warn};

use shared_backend::{AuthPolicy, BackendClient};
use shared_config::AppConfig;
use shared_models::auth::Session;
use shared_models::error::ApiError;

use crate::models::{Notification, NotificationFilter};

const BASE_PATH: &str = "/api/notifications";

pub struct NotificationService {
    backend: BackendClient,
}

fn list_path(filter: &NotificationFilter) -> String {
    let params = filter.to_query();
    if params.is_empty() {
        return BASE_PATH.to_string();
    }

    let query: Vec<String> = params
        .into_iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(&value)))
        .collect();
    format!("{}?{}", BASE_PATH, query.join("&"))
}

fn item_path(id: &str, action: &str) -> String {
    format!("{}/{}/{}", BASE_PATH, urlencoding::encode(id), action)
}

impl NotificationService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            backend: BackendClient::notifications(config),
        }
    }

    pub async fn list(
        &self,
        filter: &NotificationFilter,
        session: Option<&Session>,
    ) -> Result<Vec<Notification>, ApiError> {
        let path = list_path(filter);
        debug!("Fetching notifications from {}", path);

        self.backend
            .request(Method::GET, &path, session, AuthPolicy::Optional, None)
            .await
    }

    /// Returns `false` without calling the service when the notification was
    /// already read.
    pub async fn mark_read(
        &self,
        notification: &Notification,
        session: Option<&Session>,
    ) -> Result<bool, ApiError> {
        if notification.is_read {
            debug!("Notification {} already read", notification.id);
            return Ok(false);
        }

        self.backend
            .request_value(
                Method::PATCH,
                &item_path(&notification.id, "read"),
                session,
                AuthPolicy::Optional,
                Some(json!({})),
            )
            .await?;
        Ok(true)
    }

    /// Only failed notifications can be sent again.
    pub async fn resend(
        &self,
        notification: &Notification,
        session: Option<&Session>,
    ) -> Result<(), ApiError> {
        if !notification.can_resend() {
            warn!(
                "Refusing to resend notification {} with status {}",
                notification.id, notification.status
            );
            return Err(ApiError::Validation(
                "Apenas notificações com falha podem ser reenviadas".to_string(),
            ));
        }

        self.backend
            .request_value(
                Method::POST,
                &item_path(&notification.id, "resend"),
                session,
                AuthPolicy::Optional,
                Some(json!({})),
            )
            .await?;
        info!("Notification {} queued for resend", notification.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NotificationStatus;

    #[test]
    fn list_path_encodes_filters() {
        assert_eq!(list_path(&NotificationFilter::default()), "/api/notifications");

        let filter = NotificationFilter {
            status: Some(NotificationStatus::Pending),
            notification_type: Some("Vacinação".into()),
            ..Default::default()
        };
        assert_eq!(
            list_path(&filter),
            "/api/notifications?status=pending&type=Vacina%C3%A7%C3%A3o"
        );
    }
}
