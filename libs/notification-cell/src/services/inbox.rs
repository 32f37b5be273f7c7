use serde::Serialize;

use shared_models::error::ApiError;

use crate::models::{Notification, NotificationItem, NotificationStatus, DEFAULT_PAGE_SIZE};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPage {
    pub items: Vec<NotificationItem>,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub total_pages: usize,
    pub unread: usize,
}

/// The loaded notification list. Local records change only after the
/// service accepted the matching call.
#[derive(Debug, Clone, Default)]
pub struct NotificationInbox {
    notifications: Vec<Notification>,
}

impl NotificationInbox {
    pub fn new(notifications: Vec<Notification>) -> Self {
        Self { notifications }
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn find(&self, id: &str) -> Result<&Notification, ApiError> {
        self.notifications
            .iter()
            .find(|n| n.id == id)
            .ok_or_else(|| ApiError::NotFound(format!("Notification {}", id)))
    }

    fn find_mut(&mut self, id: &str) -> Result<&mut Notification, ApiError> {
        self.notifications
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| ApiError::NotFound(format!("Notification {}", id)))
    }

    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.is_read).count()
    }

    /// Zero-based page. A page past the end comes back empty.
    pub fn page(&self, page: usize, page_size: usize) -> NotificationPage {
        let page_size = if page_size == 0 { DEFAULT_PAGE_SIZE } else { page_size };
        let total = self.notifications.len();

        let items = self
            .notifications
            .iter()
            .skip(page.saturating_mul(page_size))
            .take(page_size)
            .cloned()
            .map(NotificationItem::from)
            .collect();

        NotificationPage {
            items,
            page,
            page_size,
            total,
            total_pages: total.div_ceil(page_size),
            unread: self.unread_count(),
        }
    }

    pub fn confirm_read(&mut self, id: &str) -> Result<(), ApiError> {
        self.find_mut(id)?.is_read = true;
        Ok(())
    }

    pub fn confirm_resend(&mut self, id: &str) -> Result<(), ApiError> {
        let notification = self.find_mut(id)?;
        notification.status = NotificationStatus::Pending;
        notification.error_message = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn inbox(count: usize) -> NotificationInbox {
        let notifications = (0..count)
            .map(|i| {
                serde_json::from_value(json!({
                    "id": i.to_string(),
                    "sentAt": "2024-05-15T10:30:00",
                    "status": if i % 2 == 0 { "sent" } else { "failed" },
                    "isRead": i < 3
                }))
                .unwrap()
            })
            .collect();
        NotificationInbox::new(notifications)
    }

    #[test]
    fn pages_slice_the_list() {
        let inbox = inbox(23);

        let first = inbox.page(0, 10);
        assert_eq!(first.items.len(), 10);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.unread, 20);

        let last = inbox.page(2, 10);
        assert_eq!(last.items.len(), 3);
        assert_eq!(last.items[0].notification.id, "20");

        assert!(inbox.page(9, 10).items.is_empty());
        assert_eq!(inbox.page(0, 0).page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn confirmed_changes_patch_the_record() {
        let mut inbox = inbox(4);
        inbox.confirm_read("3").unwrap();
        assert_eq!(inbox.unread_count(), 0);

        inbox.confirm_resend("1").unwrap();
        assert_eq!(inbox.find("1").unwrap().status, NotificationStatus::Pending);
        assert!(inbox.confirm_read("99").is_err());
    }
}
