use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::gamification::repo::{insert_point_tx, points_total, PointType};
use crate::gamification::services::check_badges;
use crate::notifications::notifier::{notify_best_effort, NewNotification, NotificationType};
use crate::skills::repo::UserSkill;
use crate::state::AppState;
use crate::swaps::repo::{SwapRequest, SwapStatus};

use super::dto::SessionSummary;
use super::repo::{Session, SessionStatus};

/// Points each participant earns for a completed session.
pub const SESSION_AWARD_POINTS: i64 = 50;

pub(crate) fn format_duration(minutes: i32) -> String {
    let h = minutes / 60;
    let m = minutes % 60;
    format!("{h}h {m}m")
}

pub(crate) fn ensure_participant(session: &Session, actor_id: Uuid) -> ApiResult<()> {
    if session.host_id != actor_id && session.attendee_id != actor_id {
        return Err(ApiError::Forbidden(
            "You are not a participant of this session".into(),
        ));
    }
    Ok(())
}

fn counterpart(session: &Session, actor_id: Uuid) -> Uuid {
    if session.host_id == actor_id {
        session.attendee_id
    } else {
        session.host_id
    }
}

pub(crate) fn completion_guard(
    session: &Session,
    actor_id: Uuid,
    now: OffsetDateTime,
) -> ApiResult<()> {
    ensure_participant(session, actor_id)?;
    if !session.status.is_open() {
        return Err(ApiError::Conflict(
            "Session is not scheduled or rescheduled".into(),
        ));
    }
    if session.scheduled_at > now {
        return Err(ApiError::BadRequest("Session has not started yet".into()));
    }
    Ok(())
}

/// Creates a session off an ACCEPTED swap request. The host is whichever
/// participant owns the skill being taught; the other becomes attendee.
pub async fn schedule(
    state: &AppState,
    actor_id: Uuid,
    swap_request_id: Uuid,
    skill_id: Uuid,
    scheduled_at: OffsetDateTime,
    duration_minutes: i32,
) -> ApiResult<Session> {
    if duration_minutes <= 0 {
        return Err(ApiError::BadRequest("Duration must be positive".into()));
    }

    let swap = SwapRequest::find_by_id(&state.db, swap_request_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Swap request not found".into()))?;
    if swap.requester_id != actor_id && swap.receiver_id != actor_id {
        return Err(ApiError::Forbidden(
            "You are not a participant of this swap request".into(),
        ));
    }
    if swap.status != SwapStatus::Accepted {
        let msg = if swap.status.is_terminal() {
            "Swap request is already settled"
        } else {
            "Swap request has not been accepted yet"
        };
        return Err(ApiError::Conflict(msg.into()));
    }
    if skill_id != swap.offered_user_skill_id && skill_id != swap.requested_user_skill_id {
        return Err(ApiError::BadRequest(
            "Skill is not part of this swap request".into(),
        ));
    }

    let skill = UserSkill::find_by_id(&state.db, skill_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Skill listing not found".into()))?;
    let host_id = skill.user_id;
    let attendee_id = if host_id == swap.requester_id {
        swap.receiver_id
    } else {
        swap.requester_id
    };

    let session = Session::insert(
        &state.db,
        host_id,
        attendee_id,
        skill_id,
        swap_request_id,
        scheduled_at,
        duration_minutes,
    )
    .await?;
    info!(session_id = %session.id, %host_id, %attendee_id, "session scheduled");
    Ok(session)
}

/// Marks a session complete. The session update, the swap-request cascade and
/// both 50-point awards commit as one transaction; the review-request
/// notification and badge re-checks run after commit and are best-effort.
pub async fn complete(
    state: &AppState,
    session_id: Uuid,
    actor_id: Uuid,
    notes: Option<&str>,
) -> ApiResult<Session> {
    let session = Session::find_by_id(&state.db, session_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Session not found".into()))?;
    completion_guard(&session, actor_id, OffsetDateTime::now_utc())?;

    let mut tx = state.db.begin().await?;
    let completed = Session::complete_tx(&mut tx, session_id, notes)
        .await?
        .ok_or_else(|| ApiError::Conflict("Session is no longer open".into()))?;
    SwapRequest::complete_tx(&mut tx, completed.swap_request_id).await?;
    insert_point_tx(
        &mut tx,
        completed.host_id,
        SESSION_AWARD_POINTS,
        "Completed session as host",
        PointType::Earned,
    )
    .await?;
    insert_point_tx(
        &mut tx,
        completed.attendee_id,
        SESSION_AWARD_POINTS,
        "Completed session as attendee",
        PointType::Earned,
    )
    .await?;
    tx.commit().await?;

    info!(session_id = %session_id, %actor_id, "session completed");

    let other = counterpart(&completed, actor_id);
    notify_best_effort(
        state.notifier.as_ref(),
        NewNotification {
            user_id: other,
            kind: NotificationType::ReviewRequest,
            title: "How was your session?".into(),
            message: "Your session was marked complete. Leave a review for your partner!".into(),
            data: Some(serde_json::json!({ "sessionId": completed.id })),
        },
    )
    .await;

    for user_id in [completed.host_id, completed.attendee_id] {
        if let Err(e) = check_badges(state, user_id).await {
            warn!(error = %e, %user_id, "badge check after completion failed");
        }
    }

    Ok(completed)
}

/// Cancels an open session; the reason ends up in the notes field.
pub async fn cancel(
    state: &AppState,
    session_id: Uuid,
    actor_id: Uuid,
    reason: Option<&str>,
) -> ApiResult<Session> {
    let session = Session::find_by_id(&state.db, session_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Session not found".into()))?;
    ensure_participant(&session, actor_id)?;
    if !session.status.is_open() {
        return Err(ApiError::Conflict(
            "Session is not scheduled or rescheduled".into(),
        ));
    }

    let cancelled = Session::cancel_if_open(&state.db, session_id, reason)
        .await?
        .ok_or_else(|| ApiError::Conflict("Session is no longer open".into()))?;

    info!(session_id = %session_id, %actor_id, "session cancelled");
    notify_best_effort(
        state.notifier.as_ref(),
        NewNotification {
            user_id: counterpart(&cancelled, actor_id),
            kind: NotificationType::SessionCancelled,
            title: "Session cancelled".into(),
            message: match reason {
                Some(r) => format!("Your session was cancelled: {r}"),
                None => "Your session was cancelled.".into(),
            },
            data: Some(serde_json::json!({ "sessionId": cancelled.id })),
        },
    )
    .await;

    Ok(cancelled)
}

/// Post-completion recap for one participant.
pub async fn summary(state: &AppState, session_id: Uuid, actor_id: Uuid) -> ApiResult<SessionSummary> {
    let session = Session::find_by_id(&state.db, session_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Session not found".into()))?;
    ensure_participant(&session, actor_id)?;
    if session.status != SessionStatus::Completed {
        return Err(ApiError::BadRequest("Session is not completed".into()));
    }

    let sessions_with_partner =
        Session::completed_between(&state.db, session.host_id, session.attendee_id).await?;
    let total_points = points_total(&state.db, actor_id).await?;

    Ok(SessionSummary {
        session_id: session.id,
        duration: format_duration(session.duration_minutes),
        sessions_with_partner,
        total_points,
        gained_points: SESSION_AWARD_POINTS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn session(status: SessionStatus, scheduled_at: OffsetDateTime) -> Session {
        let now = OffsetDateTime::now_utc();
        Session {
            id: Uuid::new_v4(),
            host_id: Uuid::new_v4(),
            attendee_id: Uuid::new_v4(),
            skill_id: Uuid::new_v4(),
            swap_request_id: Uuid::new_v4(),
            scheduled_at,
            ends_at: scheduled_at + Duration::minutes(60),
            duration_minutes: 60,
            status,
            notes: None,
            created_at: now,
        }
    }

    #[test]
    fn duration_formatting() {
        assert_eq!(format_duration(90), "1h 30m");
        assert_eq!(format_duration(60), "1h 0m");
        assert_eq!(format_duration(45), "0h 45m");
        assert_eq!(format_duration(0), "0h 0m");
        assert_eq!(format_duration(125), "2h 5m");
    }

    #[test]
    fn completion_requires_participant() {
        let now = OffsetDateTime::now_utc();
        let s = session(SessionStatus::Scheduled, now - Duration::hours(1));
        let err = completion_guard(&s, Uuid::new_v4(), now).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
        assert!(completion_guard(&s, s.host_id, now).is_ok());
        assert!(completion_guard(&s, s.attendee_id, now).is_ok());
    }

    #[test]
    fn completion_requires_open_status() {
        let now = OffsetDateTime::now_utc();
        let s = session(SessionStatus::Completed, now - Duration::hours(1));
        let err = completion_guard(&s, s.host_id, now).unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));

        let s = session(SessionStatus::Rescheduled, now - Duration::hours(1));
        assert!(completion_guard(&s, s.host_id, now).is_ok());
    }

    #[test]
    fn completion_rejects_future_session() {
        let now = OffsetDateTime::now_utc();
        let s = session(SessionStatus::Scheduled, now + Duration::hours(1));
        let err = completion_guard(&s, s.host_id, now).unwrap_err();
        match err {
            ApiError::BadRequest(msg) => assert!(msg.contains("has not started yet")),
            other => panic!("expected BadRequest, got {other:?}"),
        }
    }
}
