use serde::{Deserialize, Serialize};

use super::repo::Review;

#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub rating: i16,
    pub knowledge: i16,
    pub communication: i16,
    pub punctuality: i16,
    pub strengths: Option<String>,
    pub improvements: Option<String>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ReviewFeed {
    pub reviews: Vec<Review>,
    /// Rolling average of the overall rating, one decimal. None when empty.
    pub average: Option<f64>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct FlagResponse {
    pub message: String,
}
