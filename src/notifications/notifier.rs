use async_trait::async_trait;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

/// Kinds of notifications this service emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationType {
    SwapAccepted,
    SwapDeclined,
    SwapCancelled,
    SessionCancelled,
    ReviewRequest,
    BadgeUnlocked,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::SwapAccepted => "SWAP_ACCEPTED",
            NotificationType::SwapDeclined => "SWAP_DECLINED",
            NotificationType::SwapCancelled => "SWAP_CANCELLED",
            NotificationType::SessionCancelled => "SESSION_CANCELLED",
            NotificationType::ReviewRequest => "REVIEW_REQUEST",
            NotificationType::BadgeUnlocked => "BADGE_UNLOCKED",
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

/// Sink for outbound notifications. Delivery is best-effort: callers log
/// failures and never roll back the operation that triggered them.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, n: NewNotification) -> anyhow::Result<()>;
}

/// Stores notifications in the `notifications` table for in-app delivery.
#[derive(Clone)]
pub struct PgNotifier {
    db: PgPool,
}

impl PgNotifier {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Notifier for PgNotifier {
    async fn notify(&self, n: NewNotification) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (id, user_id, kind, title, message, data)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(n.user_id)
        .bind(n.kind.as_str())
        .bind(&n.title)
        .bind(&n.message)
        .bind(&n.data)
        .execute(&self.db)
        .await?;
        Ok(())
    }
}

/// Fire-and-forget delivery: log and swallow any error.
pub async fn notify_best_effort(notifier: &dyn Notifier, n: NewNotification) {
    let user_id = n.user_id;
    let kind = n.kind;
    if let Err(e) = notifier.notify(n).await {
        warn!(error = %e, %user_id, kind = kind.as_str(), "notification delivery failed");
    }
}
