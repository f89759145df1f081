use std::collections::{HashMap, HashSet};

use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::notifications::notifier::{notify_best_effort, NewNotification, NotificationType};
use crate::state::AppState;

use super::dto::{BadgeCatalog, BadgeCheckResult, BadgeStatus};
use super::repo::{self, Badge, Point, PointType, UserBadge};

pub(crate) fn parse_requirement(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

/// Active badges in threshold order. Badges whose requirement does not parse
/// are dropped from the walk (and logged by the caller).
pub(crate) fn ordered_by_requirement(mut badges: Vec<Badge>) -> Vec<Badge> {
    badges.retain(|b| parse_requirement(&b.requirement).is_some());
    badges.sort_by_key(|b| parse_requirement(&b.requirement).unwrap_or(i64::MAX));
    badges
}

pub(crate) struct UnlockPlan<'a> {
    pub to_unlock: Vec<&'a Badge>,
    pub next_badge: Option<&'a Badge>,
}

/// Walk the ordered catalog. Badges are awarded strictly in threshold order:
/// the first unowned badge whose requirement is not yet met stops the walk,
/// even if a later badge's threshold is already satisfied. When the walk
/// exhausts the catalog, the highest-requirement badge is reported as next.
pub(crate) fn plan_unlocks<'a>(
    ordered: &'a [Badge],
    owned: &HashSet<Uuid>,
    completed_sessions: i64,
) -> UnlockPlan<'a> {
    let mut to_unlock = Vec::new();
    let mut next_badge = None;

    for badge in ordered {
        if owned.contains(&badge.id) {
            continue;
        }
        let requirement = match parse_requirement(&badge.requirement) {
            Some(r) => r,
            None => continue,
        };
        if requirement > completed_sessions {
            next_badge = Some(badge);
            break;
        }
        to_unlock.push(badge);
    }

    if next_badge.is_none() {
        next_badge = ordered.last();
    }

    UnlockPlan {
        to_unlock,
        next_badge,
    }
}

/// First unowned badge in catalog order, regardless of whether its threshold
/// is met. This deliberately differs from [`plan_unlocks`]'s next-badge rule
/// and mirrors the catalog view's observed behavior.
pub(crate) fn first_unowned<'a>(ordered: &'a [Badge], owned: &HashSet<Uuid>) -> Option<&'a Badge> {
    ordered.iter().find(|b| !owned.contains(&b.id))
}

async fn load_ordered_catalog(state: &AppState) -> ApiResult<Vec<Badge>> {
    let badges = repo::list_active_badges(&state.db).await?;
    for b in &badges {
        if parse_requirement(&b.requirement).is_none() {
            warn!(badge_id = %b.id, requirement = %b.requirement, "badge requirement is not an integer, skipping");
        }
    }
    Ok(ordered_by_requirement(badges))
}

/// Recomputes badge eligibility for a user and unlocks everything earned.
/// Idempotent: already-owned badges are skipped, and a concurrent unlock of
/// the same badge resolves through the unique constraint.
pub async fn check_badges(state: &AppState, user_id: Uuid) -> ApiResult<BadgeCheckResult> {
    let completed_sessions = repo::completed_sessions_count(&state.db, user_id).await?;
    let ordered = load_ordered_catalog(state).await?;
    let owned: HashSet<Uuid> = repo::list_user_badges(&state.db, user_id)
        .await?
        .into_iter()
        .map(|ub| ub.badge_id)
        .collect();

    let plan = plan_unlocks(&ordered, &owned, completed_sessions);
    let next_badge = plan.next_badge.cloned();

    let mut newly_unlocked: Vec<UserBadge> = Vec::new();
    for badge in plan.to_unlock {
        // Each unlock commits its ownership row and point award together.
        let Some(user_badge) = repo::unlock_badge(&state.db, user_id, badge).await? else {
            continue;
        };
        info!(user_id = %user_id, badge = %badge.name, "badge unlocked");
        notify_best_effort(
            state.notifier.as_ref(),
            NewNotification {
                user_id,
                kind: NotificationType::BadgeUnlocked,
                title: "Badge unlocked".into(),
                message: format!("You unlocked the \"{}\" badge!", badge.name),
                data: Some(serde_json::json!({ "badgeId": badge.id })),
            },
        )
        .await;
        newly_unlocked.push(user_badge);
    }

    Ok(BadgeCheckResult {
        newly_unlocked,
        next_badge,
        completed_sessions,
    })
}

/// Catalog view: every active badge annotated with the user's unlock state.
pub async fn get_all_badges(state: &AppState, user_id: Uuid) -> ApiResult<BadgeCatalog> {
    let completed_sessions = repo::completed_sessions_count(&state.db, user_id).await?;
    let ordered = load_ordered_catalog(state).await?;
    let owned_rows = repo::list_user_badges(&state.db, user_id).await?;
    let owned_by_id: HashMap<Uuid, UserBadge> = owned_rows
        .into_iter()
        .map(|ub| (ub.badge_id, ub))
        .collect();
    let owned: HashSet<Uuid> = owned_by_id.keys().copied().collect();

    let next_badge = first_unowned(&ordered, &owned).cloned();
    let badges = ordered
        .into_iter()
        .map(|badge| {
            let unlock = owned_by_id.get(&badge.id);
            BadgeStatus {
                unlocked: unlock.is_some(),
                unlocked_at: unlock.map(|ub| ub.unlocked_at),
                is_pinned: unlock.map(|ub| ub.is_pinned).unwrap_or(false),
                badge,
            }
        })
        .collect();

    Ok(BadgeCatalog {
        badges,
        next_badge,
        completed_sessions,
    })
}

/// Single write path for point grants and admin adjustments. Deductions are
/// stored as negative amounts so totals stay a plain sum.
pub async fn award_points(
    state: &AppState,
    user_id: Uuid,
    amount: i64,
    reason: &str,
    kind: PointType,
) -> ApiResult<Point> {
    if amount <= 0 {
        return Err(ApiError::BadRequest("Amount must be positive".into()));
    }
    if reason.trim().is_empty() {
        return Err(ApiError::BadRequest("Reason is required".into()));
    }
    let signed = match kind {
        PointType::AdjustedDeduct => -amount,
        _ => amount,
    };
    let point = repo::insert_point(&state.db, user_id, signed, reason.trim(), kind).await?;
    info!(%user_id, amount = signed, kind = ?kind, "points recorded");
    Ok(point)
}

pub async fn pin_badge(
    state: &AppState,
    user_id: Uuid,
    badge_id: Uuid,
    pinned: bool,
) -> ApiResult<()> {
    repo::find_badge(&state.db, badge_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Badge not found".into()))?;
    let matched = repo::set_badge_pinned(&state.db, user_id, badge_id, pinned).await?;
    if !matched {
        return Err(ApiError::BadRequest("Badge not unlocked".into()));
    }
    Ok(())
}

/// Admin: mutate a badge threshold. Already-granted unlocks are permanent and
/// are not revisited.
pub async fn update_badge_requirement(
    state: &AppState,
    badge_id: Uuid,
    requirement: &str,
) -> ApiResult<Badge> {
    let parsed = parse_requirement(requirement)
        .ok_or_else(|| ApiError::BadRequest("Requirement must be an integer".into()))?;
    if parsed < 0 {
        return Err(ApiError::BadRequest("Requirement must not be negative".into()));
    }
    let badge = repo::update_badge_requirement(&state.db, badge_id, requirement.trim())
        .await?
        .ok_or_else(|| ApiError::NotFound("Badge not found".into()))?;
    info!(%badge_id, requirement = %badge.requirement, "badge requirement updated");
    Ok(badge)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn badge(name: &str, requirement: &str, points: i64) -> Badge {
        Badge {
            id: Uuid::new_v4(),
            name: name.into(),
            icon: None,
            requirement: requirement.into(),
            points,
            is_active: true,
        }
    }

    #[test]
    fn requirement_parsing() {
        assert_eq!(parse_requirement("5"), Some(5));
        assert_eq!(parse_requirement(" 10 "), Some(10));
        assert_eq!(parse_requirement("five"), None);
        assert_eq!(parse_requirement(""), None);
    }

    #[test]
    fn catalog_orders_by_threshold_and_drops_unparsable() {
        let ordered = ordered_by_requirement(vec![
            badge("Mentor", "25", 100),
            badge("Broken", "n/a", 0),
            badge("First Swap", "1", 10),
            badge("Regular", "10", 50),
        ]);
        let names: Vec<&str> = ordered.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["First Swap", "Regular", "Mentor"]);
    }

    #[test]
    fn unlocks_in_threshold_order_and_stops_at_first_unmet() {
        // Badge A requires 1, badge B requires 5; user has 3 completed
        // sessions and owns neither: A unlocks, B becomes next.
        let ordered = vec![badge("A", "1", 10), badge("B", "5", 20)];
        let plan = plan_unlocks(&ordered, &HashSet::new(), 3);
        assert_eq!(plan.to_unlock.len(), 1);
        assert_eq!(plan.to_unlock[0].name, "A");
        assert_eq!(plan.next_badge.unwrap().name, "B");
    }

    #[test]
    fn consecutive_met_thresholds_unlock_together() {
        let ordered = vec![badge("A", "4", 10), badge("B", "5", 20), badge("C", "9", 30)];
        let plan = plan_unlocks(&ordered, &HashSet::new(), 5);
        let names: Vec<&str> = plan.to_unlock.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["A", "B"]);
        assert_eq!(plan.next_badge.unwrap().name, "C");
    }

    #[test]
    fn owned_badges_are_skipped() {
        let ordered = vec![badge("A", "1", 10), badge("B", "5", 20)];
        let owned: HashSet<Uuid> = [ordered[0].id].into_iter().collect();
        let plan = plan_unlocks(&ordered, &owned, 3);
        assert!(plan.to_unlock.is_empty());
        assert_eq!(plan.next_badge.unwrap().name, "B");
    }

    #[test]
    fn exhausted_walk_reports_highest_badge_as_next() {
        let ordered = vec![badge("A", "1", 10), badge("B", "5", 20)];
        let owned: HashSet<Uuid> = ordered.iter().map(|b| b.id).collect();
        let plan = plan_unlocks(&ordered, &owned, 7);
        assert!(plan.to_unlock.is_empty());
        assert_eq!(plan.next_badge.unwrap().name, "B");
    }

    #[test]
    fn catalog_next_rule_differs_from_unlock_next_rule() {
        // With 3 completed sessions and nothing owned, the unlock walk's next
        // badge is B (first unmet), while the catalog view's is A (first
        // unowned, threshold ignored).
        let ordered = vec![badge("A", "1", 10), badge("B", "5", 20)];
        let owned = HashSet::new();
        let plan = plan_unlocks(&ordered, &owned, 3);
        assert_eq!(plan.next_badge.unwrap().name, "B");
        assert_eq!(first_unowned(&ordered, &owned).unwrap().name, "A");
    }

    #[test]
    fn all_owned_catalog_has_no_next() {
        let ordered = vec![badge("A", "1", 10)];
        let owned: HashSet<Uuid> = ordered.iter().map(|b| b.id).collect();
        assert!(first_unowned(&ordered, &owned).is_none());
    }
}
