//! Eligibility rules shared by payment submission and attendance.

use lodge_common::db::models::{Event, Member};
use lodge_common::types::{EventStatus, MemberStatus};

use super::CoreError;

/// True when the member may participate in the event: active status, zone
/// covered by the event, tier admitted by the event.
pub fn is_eligible(member: &Member, event: &Event) -> bool {
    check_eligibility(member, event).is_ok()
}

/// Eligibility with the failing rule spelled out.
pub fn check_eligibility(member: &Member, event: &Event) -> Result<(), CoreError> {
    if member.status != MemberStatus::Active {
        return Err(CoreError::NotEligible("member is not active"));
    }
    if !event.zones.contains(&member.zone) {
        return Err(CoreError::NotEligible("zone is not covered by this event"));
    }
    if !event.tiers_allowed.contains(&member.tier) {
        return Err(CoreError::NotEligible("tier is not admitted to this event"));
    }
    Ok(())
}

/// Payments and attendance are only accepted against upcoming events.
pub fn ensure_upcoming(event: &Event) -> Result<(), CoreError> {
    if event.status != EventStatus::Upcoming {
        return Err(CoreError::EventNotOpen);
    }
    Ok(())
}
