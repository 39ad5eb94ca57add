//! State changes shared by staff operations and payment settlement
//!
//! Each helper mutates local copies only; nothing is persisted until the
//! caller commits the resulting plan. Callers hold the room lock.

use crate::domain::reservation::StayWindow;
use crate::domain::{
    DomainError, DomainResult, RepositoryProvider, Reservation, ReservationStatus, Room, RoomState,
    TransitionSource,
};

/// First reservation on `room_code` in one of `statuses` overlapping `window`.
pub(crate) async fn first_overlap(
    repos: &dyn RepositoryProvider,
    room_code: &str,
    window: &StayWindow,
    statuses: &[ReservationStatus],
    exclude_id: Option<i32>,
) -> DomainResult<Option<Reservation>> {
    Ok(repos
        .reservations()
        .find_overlapping(room_code, window, statuses, exclude_id)
        .await?
        .into_iter()
        .next())
}

/// Pending -> Confirmed with room Available -> Reserved.
///
/// Overlap is re-checked against reservations that already hold the room.
pub(crate) async fn stage_confirm(
    repos: &dyn RepositoryProvider,
    reservation: &mut Reservation,
    room: &mut Room,
) -> DomainResult<RoomState> {
    if reservation.status != ReservationStatus::Pending {
        return Err(DomainError::NotPending {
            id: reservation.id,
            status: reservation.status.to_string(),
        });
    }

    if let Some(conflict) = first_overlap(
        repos,
        &reservation.room_code,
        &reservation.window,
        &ReservationStatus::COMMITTED,
        Some(reservation.id),
    )
    .await?
    {
        return Err(DomainError::OverlapConflict {
            room_code: reservation.room_code.clone(),
            conflicting_id: conflict.id,
        });
    }

    let previous = room.transition(RoomState::Reserved, TransitionSource::Lifecycle)?;
    reservation.confirm()?;
    Ok(previous)
}

/// Reserved -> Occupied once the stay is paid for. The reservation keeps
/// its status; check-in still records the guest's arrival.
pub(crate) fn stage_occupy(room: &mut Room) -> DomainResult<RoomState> {
    room.transition(RoomState::Occupied, TransitionSource::Lifecycle)
}

/// Pending -> Cancelled (room untouched) or Confirmed -> Cancelled while the
/// room is still Reserved (room released). Returns the room's previous state
/// when it changed.
pub(crate) fn stage_cancel(
    reservation: &mut Reservation,
    room: &mut Room,
    reason: Option<String>,
) -> DomainResult<Option<RoomState>> {
    match reservation.status {
        ReservationStatus::Confirmed => {
            if room.state != RoomState::Reserved {
                return Err(DomainError::InvalidTransition {
                    entity: "Reservation",
                    id: reservation.id.to_string(),
                    from: format!("{} (room {})", reservation.status, room.state),
                    to: ReservationStatus::Cancelled.to_string(),
                });
            }
            let previous = room.transition(RoomState::Available, TransitionSource::Lifecycle)?;
            reservation.cancel(reason)?;
            Ok(Some(previous))
        }
        _ => {
            reservation.cancel(reason)?;
            Ok(None)
        }
    }
}

/// Compact JSON view of a reservation for audit entries.
pub(crate) fn snapshot(reservation: &Reservation) -> serde_json::Value {
    serde_json::json!({
        "status": reservation.status,
        "room_code": reservation.room_code,
        "checkin": reservation.window.checkin,
        "checkout": reservation.window.checkout,
        "actual_checkin": reservation.actual_checkin,
        "actual_checkout": reservation.actual_checkout,
        "total": reservation.total().to_string(),
    })
}
