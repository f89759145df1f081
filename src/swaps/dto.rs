use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateSwapRequest {
    pub offered_user_skill_id: Uuid,
    pub requested_user_skill_id: Uuid,
}

#[derive(Debug, Deserialize, Default)]
pub struct DeclineSwapRequest {
    pub reason: Option<String>,
}
