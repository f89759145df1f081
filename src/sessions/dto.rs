use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct ScheduleSessionRequest {
    pub swap_request_id: Uuid,
    pub skill_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub scheduled_at: OffsetDateTime,
    pub duration_minutes: i32,
}

#[derive(Debug, Deserialize, Default)]
pub struct CompleteSessionRequest {
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct CancelSessionRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    /// Formatted as "{h}h {m}m".
    pub duration: String,
    /// Completed sessions between the same two users, in either role.
    pub sessions_with_partner: i64,
    /// The actor's lifetime point total.
    pub total_points: i64,
    /// The award from this specific session.
    pub gained_points: i64,
}
