use serde::Deserialize;

use crate::skills::repo::SkillKind;

#[derive(Debug, Deserialize)]
pub struct CreateSkillRequest {
    pub name: String,
    pub kind: SkillKind,
    pub description: Option<String>,
}
