use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::sessions::repo::{Session, SessionStatus};
use crate::state::AppState;

use super::dto::{CreateReviewRequest, ReviewFeed};
use super::repo::{NewReview, Review};

/// Average of the overall rating, rounded to one decimal. An empty set is a
/// defined edge case: no average, count zero.
pub(crate) fn avg_rating(ratings: &[i16]) -> (Option<f64>, usize) {
    if ratings.is_empty() {
        return (None, 0);
    }
    let sum: i64 = ratings.iter().map(|r| *r as i64).sum();
    let avg = sum as f64 / ratings.len() as f64;
    (Some((avg * 10.0).round() / 10.0), ratings.len())
}

pub(crate) fn validate_ratings(body: &CreateReviewRequest) -> ApiResult<()> {
    for (label, value) in [
        ("rating", body.rating),
        ("knowledge", body.knowledge),
        ("communication", body.communication),
        ("punctuality", body.punctuality),
    ] {
        if !(1..=5).contains(&value) {
            return Err(ApiError::BadRequest(format!(
                "{label} must be between 1 and 5"
            )));
        }
    }
    Ok(())
}

pub async fn create_review(
    state: &AppState,
    session_id: Uuid,
    giver_id: Uuid,
    body: &CreateReviewRequest,
) -> ApiResult<Review> {
    validate_ratings(body)?;

    let session = Session::find_by_id(&state.db, session_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Session not found".into()))?;
    if session.status != SessionStatus::Completed {
        return Err(ApiError::BadRequest(
            "Reviews can only be left for completed sessions".into(),
        ));
    }
    if session.host_id != giver_id && session.attendee_id != giver_id {
        return Err(ApiError::Forbidden(
            "You are not a participant of this session".into(),
        ));
    }
    if Review::exists_for(&state.db, session_id, giver_id).await? {
        return Err(ApiError::BadRequest(
            "You have already reviewed this session".into(),
        ));
    }

    let receiver_id = if session.host_id == giver_id {
        session.attendee_id
    } else {
        session.host_id
    };

    let review = Review::insert(
        &state.db,
        NewReview {
            session_id,
            giver_id,
            receiver_id,
            rating: body.rating,
            knowledge: body.knowledge,
            communication: body.communication,
            punctuality: body.punctuality,
            strengths: body.strengths.as_deref(),
            improvements: body.improvements.as_deref(),
            is_public: body.is_public.unwrap_or(true),
        },
    )
    .await?;

    info!(review_id = %review.id, %session_id, %giver_id, "review created");
    Ok(review)
}

/// Only the review's receiver may flag it. Flagging twice is a no-op success.
pub async fn flag_review(state: &AppState, user_id: Uuid, review_id: Uuid) -> ApiResult<&'static str> {
    let review = Review::find_by_id(&state.db, review_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Review not found".into()))?;
    if review.receiver_id != user_id {
        return Err(ApiError::Forbidden(
            "Only the reviewed user may flag a review".into(),
        ));
    }
    if review.is_flagged {
        return Ok("Review is already flagged");
    }
    Review::mark_flagged(&state.db, review_id).await?;
    info!(%review_id, %user_id, "review flagged");
    Ok("Review flagged for moderation")
}

/// Public reviews received by a user, with the rolling average.
pub async fn reviews_received(state: &AppState, user_id: Uuid) -> ApiResult<ReviewFeed> {
    let reviews = Review::list_received(&state.db, user_id).await?;
    let ratings: Vec<i16> = reviews.iter().map(|r| r.rating).collect();
    let (average, count) = avg_rating(&ratings);
    Ok(ReviewFeed {
        reviews,
        average,
        count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_has_no_average() {
        assert_eq!(avg_rating(&[]), (None, 0));
    }

    #[test]
    fn average_is_sum_over_count() {
        assert_eq!(avg_rating(&[4, 2]), (Some(3.0), 2));
        assert_eq!(avg_rating(&[5]), (Some(5.0), 1));
    }

    #[test]
    fn average_rounds_to_one_decimal() {
        // (5 + 4 + 4) / 3 = 4.333... -> 4.3
        assert_eq!(avg_rating(&[5, 4, 4]), (Some(4.3), 3));
        // (5 + 4) / 2 = 4.5
        assert_eq!(avg_rating(&[5, 4]), (Some(4.5), 2));
        // (3 + 3 + 5) / 3 = 3.666... -> 3.7
        assert_eq!(avg_rating(&[3, 3, 5]), (Some(3.7), 3));
    }

    fn body(rating: i16) -> CreateReviewRequest {
        CreateReviewRequest {
            rating,
            knowledge: 3,
            communication: 3,
            punctuality: 3,
            strengths: None,
            improvements: None,
            is_public: None,
        }
    }

    #[test]
    fn ratings_must_be_one_to_five() {
        assert!(validate_ratings(&body(1)).is_ok());
        assert!(validate_ratings(&body(5)).is_ok());
        assert!(validate_ratings(&body(0)).is_err());
        assert!(validate_ratings(&body(6)).is_err());
    }
}
