use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::{Badge, Point, PointType, UserBadge};

#[derive(Debug, Serialize)]
pub struct BadgeCheckResult {
    pub newly_unlocked: Vec<UserBadge>,
    pub next_badge: Option<Badge>,
    pub completed_sessions: i64,
}

/// Catalog entry annotated with the requesting user's unlock state.
#[derive(Debug, Serialize)]
pub struct BadgeStatus {
    #[serde(flatten)]
    pub badge: Badge,
    pub unlocked: bool,
    pub unlocked_at: Option<OffsetDateTime>,
    pub is_pinned: bool,
}

#[derive(Debug, Serialize)]
pub struct BadgeCatalog {
    pub badges: Vec<BadgeStatus>,
    pub next_badge: Option<Badge>,
    pub completed_sessions: i64,
}

#[derive(Debug, Serialize)]
pub struct PointsSummary {
    pub total: i64,
    pub history: Vec<Point>,
}

#[derive(Debug, Deserialize)]
pub struct PinBadgeRequest {
    pub pinned: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRequirementRequest {
    pub requirement: String,
}

#[derive(Debug, Deserialize)]
pub struct AdjustPointsRequest {
    pub user_id: Uuid,
    pub amount: i64,
    pub reason: String,
    pub kind: PointType,
}
