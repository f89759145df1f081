use time::{Duration, OffsetDateTime};
use tracing::info;
use uuid::Uuid;

use crate::error::{is_unique_violation, ApiError, ApiResult};
use crate::notifications::notifier::{notify_best_effort, NewNotification, NotificationType};
use crate::skills::repo::UserSkill;
use crate::state::AppState;

use super::repo::{SwapRequest, SwapStatus};

/// PENDING past its expiry reads as gone everywhere until the sweep marks it
/// EXPIRED; the list queries apply the same rule in SQL.
pub(crate) fn is_lapsed(swap: &SwapRequest, now: OffsetDateTime) -> bool {
    swap.status == SwapStatus::Pending && swap.expires_at < now
}

/// Viewing a request is restricted to its two parties.
pub(crate) fn ensure_participant(swap: &SwapRequest, actor_id: Uuid) -> ApiResult<()> {
    if swap.requester_id != actor_id && swap.receiver_id != actor_id {
        return Err(ApiError::Forbidden(
            "You are not a participant of this swap request".into(),
        ));
    }
    Ok(())
}

pub async fn create_swap(
    state: &AppState,
    requester_id: Uuid,
    offered_user_skill_id: Uuid,
    requested_user_skill_id: Uuid,
) -> ApiResult<SwapRequest> {
    let offered = UserSkill::find_by_id(&state.db, offered_user_skill_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Offered skill listing not found".into()))?;
    let requested = UserSkill::find_by_id(&state.db, requested_user_skill_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Requested skill listing not found".into()))?;

    if offered.user_id != requester_id {
        return Err(ApiError::BadRequest(
            "Offered skill does not belong to you".into(),
        ));
    }
    let receiver_id = requested.user_id;
    if receiver_id == requester_id {
        return Err(ApiError::BadRequest(
            "Cannot open a swap request with yourself".into(),
        ));
    }

    if SwapRequest::pending_duplicate_exists(
        &state.db,
        requester_id,
        offered_user_skill_id,
        requested_user_skill_id,
    )
    .await?
    {
        return Err(ApiError::BadRequest(
            "A pending swap request for these skills already exists".into(),
        ));
    }

    let expires_at = OffsetDateTime::now_utc() + Duration::days(state.config.swap.expiry_days);
    // A concurrent duplicate can slip past the check above and land on the
    // partial unique index; the loser gets Conflict, not a 500.
    let swap = match SwapRequest::insert(
        &state.db,
        requester_id,
        receiver_id,
        offered_user_skill_id,
        requested_user_skill_id,
        expires_at,
    )
    .await
    {
        Ok(swap) => swap,
        Err(e) if is_unique_violation(&e) => {
            return Err(ApiError::Conflict(
                "A pending swap request for these skills already exists".into(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    info!(swap_id = %swap.id, %requester_id, %receiver_id, "swap request created");
    Ok(swap)
}

/// PENDING -> ACCEPTED, receiver only. The status guard is a conditional
/// update in the store, so a concurrent accept/decline/cancel loses cleanly.
pub async fn accept_swap(state: &AppState, id: Uuid, actor_id: Uuid) -> ApiResult<SwapRequest> {
    let swap = SwapRequest::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Swap request not found".into()))?;
    if swap.receiver_id != actor_id {
        return Err(ApiError::Forbidden(
            "Only the receiver may accept a swap request".into(),
        ));
    }

    let updated = SwapRequest::update_status_if(
        &state.db,
        id,
        SwapStatus::Pending,
        SwapStatus::Accepted,
        None,
    )
    .await?
    .ok_or_else(|| ApiError::Conflict("Swap request is no longer pending".into()))?;

    info!(swap_id = %id, %actor_id, "swap request accepted");
    notify_best_effort(
        state.notifier.as_ref(),
        NewNotification {
            user_id: updated.requester_id,
            kind: NotificationType::SwapAccepted,
            title: "Swap request accepted".into(),
            message: "Your swap request was accepted. Time to schedule a session!".into(),
            data: Some(serde_json::json!({ "swapRequestId": updated.id })),
        },
    )
    .await;

    Ok(updated)
}

/// PENDING -> REJECTED with optional reason, receiver only.
pub async fn decline_swap(
    state: &AppState,
    id: Uuid,
    actor_id: Uuid,
    reason: Option<&str>,
) -> ApiResult<SwapRequest> {
    let swap = SwapRequest::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Swap request not found".into()))?;
    if swap.receiver_id != actor_id {
        return Err(ApiError::Forbidden(
            "Only the receiver may decline a swap request".into(),
        ));
    }

    let updated = SwapRequest::update_status_if(
        &state.db,
        id,
        SwapStatus::Pending,
        SwapStatus::Rejected,
        reason,
    )
    .await?
    .ok_or_else(|| ApiError::Conflict("Swap request is no longer pending".into()))?;

    info!(swap_id = %id, %actor_id, "swap request declined");
    notify_best_effort(
        state.notifier.as_ref(),
        NewNotification {
            user_id: updated.requester_id,
            kind: NotificationType::SwapDeclined,
            title: "Swap request declined".into(),
            message: match &updated.rejection_reason {
                Some(r) => format!("Your swap request was declined: {r}"),
                None => "Your swap request was declined.".into(),
            },
            data: Some(serde_json::json!({ "swapRequestId": updated.id })),
        },
    )
    .await;

    Ok(updated)
}

/// PENDING -> CANCELLED, requester only.
pub async fn cancel_swap(state: &AppState, id: Uuid, actor_id: Uuid) -> ApiResult<SwapRequest> {
    let swap = SwapRequest::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Swap request not found".into()))?;
    if swap.requester_id != actor_id {
        return Err(ApiError::Forbidden(
            "Only the requester may cancel a swap request".into(),
        ));
    }

    let updated = SwapRequest::update_status_if(
        &state.db,
        id,
        SwapStatus::Pending,
        SwapStatus::Cancelled,
        None,
    )
    .await?
    .ok_or_else(|| ApiError::Conflict("Swap request is no longer pending".into()))?;

    info!(swap_id = %id, %actor_id, "swap request cancelled");
    notify_best_effort(
        state.notifier.as_ref(),
        NewNotification {
            user_id: updated.receiver_id,
            kind: NotificationType::SwapCancelled,
            title: "Swap request cancelled".into(),
            message: "A swap request sent to you was cancelled by the requester.".into(),
            data: Some(serde_json::json!({ "swapRequestId": updated.id })),
        },
    )
    .await;

    Ok(updated)
}

pub async fn get_swap(state: &AppState, id: Uuid, actor_id: Uuid) -> ApiResult<SwapRequest> {
    let swap = SwapRequest::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Swap request not found".into()))?;
    ensure_participant(&swap, actor_id)?;
    if is_lapsed(&swap, OffsetDateTime::now_utc()) {
        return Err(ApiError::NotFound("Swap request not found".into()));
    }
    Ok(swap)
}

/// Marks all lapsed PENDING requests EXPIRED. Invoked by the background
/// sweep loop and by the admin endpoint.
pub async fn expire_lapsed(state: &AppState) -> ApiResult<u64> {
    let expired = SwapRequest::expire_pending(&state.db).await?;
    if expired > 0 {
        info!(count = expired, "expired lapsed swap requests");
    }
    Ok(expired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn swap(requester: Uuid, receiver: Uuid) -> SwapRequest {
        let now = OffsetDateTime::now_utc();
        SwapRequest {
            id: Uuid::new_v4(),
            requester_id: requester,
            receiver_id: receiver,
            offered_user_skill_id: Uuid::new_v4(),
            requested_user_skill_id: Uuid::new_v4(),
            status: SwapStatus::Pending,
            rejection_reason: None,
            expires_at: now + Duration::days(7),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn participants_may_view() {
        let (requester, receiver) = (Uuid::new_v4(), Uuid::new_v4());
        let s = swap(requester, receiver);
        assert!(ensure_participant(&s, requester).is_ok());
        assert!(ensure_participant(&s, receiver).is_ok());
    }

    #[test]
    fn strangers_may_not_view() {
        let s = swap(Uuid::new_v4(), Uuid::new_v4());
        let err = ensure_participant(&s, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[test]
    fn pending_past_expiry_is_lapsed() {
        let now = OffsetDateTime::now_utc();
        let mut s = swap(Uuid::new_v4(), Uuid::new_v4());
        assert!(!is_lapsed(&s, now));

        s.expires_at = now - Duration::hours(1);
        assert!(is_lapsed(&s, now));

        // Terminal and accepted rows keep their status regardless of expiry.
        s.status = SwapStatus::Accepted;
        assert!(!is_lapsed(&s, now));
        s.status = SwapStatus::Expired;
        assert!(!is_lapsed(&s, now));
    }
}
