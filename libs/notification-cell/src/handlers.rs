use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::Session;
use shared_models::error::AppError;

use crate::models::{NotificationFilter, NotificationItem, NotificationListQuery, DEFAULT_PAGE_SIZE};
use crate::services::{NotificationInbox, NotificationService};

async fn load_inbox(
    service: &NotificationService,
    session: &Session,
) -> Result<NotificationInbox, AppError> {
    let notifications = service
        .list(&NotificationFilter::default(), Some(session))
        .await?;
    Ok(NotificationInbox::new(notifications))
}

#[axum::debug_handler]
pub async fn list_notifications(
    State(config): State<Arc<AppConfig>>,
    Extension(session): Extension<Session>,
    Query(query): Query<NotificationListQuery>,
) -> Result<Json<Value>, AppError> {
    let filter = query.filter()?;
    let notifications = NotificationService::new(&config)
        .list(&filter, Some(&session))
        .await?;

    let inbox = NotificationInbox::new(notifications);
    let page = inbox.page(
        query.page.unwrap_or(0),
        query.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
    );

    Ok(Json(json!(page)))
}

#[axum::debug_handler]
pub async fn mark_notification_read(
    State(config): State<Arc<AppConfig>>,
    Extension(session): Extension<Session>,
    Path(notification_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = NotificationService::new(&config);
    let mut inbox = load_inbox(&service, &session).await?;

    let changed = service
        .mark_read(inbox.find(&notification_id)?, Some(&session))
        .await?;
    if changed {
        inbox.confirm_read(&notification_id)?;
    }

    let notification = NotificationItem::from(inbox.find(&notification_id)?.clone());
    Ok(Json(json!({
        "success": true,
        "changed": changed,
        "notification": notification,
        "unread": inbox.unread_count()
    })))
}

#[axum::debug_handler]
pub async fn resend_notification(
    State(config): State<Arc<AppConfig>>,
    Extension(session): Extension<Session>,
    Path(notification_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = NotificationService::new(&config);
    let mut inbox = load_inbox(&service, &session).await?;

    service
        .resend(inbox.find(&notification_id)?, Some(&session))
        .await?;
    inbox.confirm_resend(&notification_id)?;

    let notification = NotificationItem::from(inbox.find(&notification_id)?.clone());
    Ok(Json(json!({
        "success": true,
        "notification": notification,
        "message": "Notificação reenviada com sucesso"
    })))
}
