use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::crud::{BookingCrud, BookingError};
use super::model::BookingWithCar;
use super::schema::{
    ActorRole, BookingListResponse, BookingResponse, BookingStatus, CreateBookingRequest,
    ErrorResponse, UpdateStatusRequest,
};
use crate::services::notify::{self, NotificationEvent, NotificationKind, Recipient};
use crate::services::pricing;
use crate::AppState;

type ErrorReply = (StatusCode, Json<ErrorResponse>);

fn reply(e: BookingError) -> ErrorReply {
    (e.status_code(), Json(ErrorResponse::new(e.to_string())))
}

fn to_response(b: BookingWithCar) -> BookingResponse {
    let total_price = pricing::quote(b.daily_price, b.booking.start_date, b.booking.end_date);
    BookingResponse {
        id: b.booking.id,
        car_id: b.booking.car_id,
        car_model: b.car_model,
        renter_id: b.booking.renter_id,
        start_date: b.booking.start_date,
        end_date: b.booking.end_date,
        status: b.booking.status,
        total_price,
        created_at: b.booking.created_at,
        updated_at: b.booking.updated_at,
    }
}

async fn recipient(state: &AppState, user_id: &str) -> Option<Recipient> {
    match notify::recipient_for(&state.db, user_id).await {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!("Failed to load notification recipient {}: {}", user_id, e);
            None
        }
    }
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    user: crate::modules::auth::AuthUser,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), ErrorReply> {
    let crud = BookingCrud::new(state.db.clone());

    let (booking, car) = crud
        .create(&req.car_id, &user.id, req.start_date, req.end_date)
        .await
        .map_err(reply)?;

    let total_price = pricing::quote(car.daily_price, booking.start_date, booking.end_date);

    // The renter learns the request went in; the owner is asked to act.
    let base = NotificationEvent::new(NotificationKind::BookingCreated)
        .booking_id(booking.id.clone())
        .car_model(car.model.clone())
        .dates(booking.start_date, booking.end_date)
        .amount(total_price);

    if let Some(renter) = recipient(&state, &booking.renter_id).await {
        state.notifier.notify(&base, &[renter]).await;
    }
    if let Some(owner) = recipient(&state, &car.owner_id).await {
        let mut request_event = base.clone();
        request_event.kind = NotificationKind::BookingRequest;
        state.notifier.notify(&request_event, &[owner]).await;
    }

    Ok((
        StatusCode::CREATED,
        Json(BookingResponse {
            id: booking.id,
            car_id: booking.car_id,
            car_model: car.model,
            renter_id: booking.renter_id,
            start_date: booking.start_date,
            end_date: booking.end_date,
            status: booking.status,
            total_price,
            created_at: booking.created_at,
            updated_at: booking.updated_at,
        }),
    ))
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    user: crate::modules::auth::AuthUser,
) -> Result<Json<BookingListResponse>, ErrorReply> {
    let crud = BookingCrud::new(state.db.clone());

    let my_bookings = crud.list_as_renter(&user.id).await.map_err(reply)?;
    let received_bookings = crud.list_received(&user.id).await.map_err(reply)?;

    Ok(Json(BookingListResponse {
        my_bookings: my_bookings.into_iter().map(to_response).collect(),
        received_bookings: received_bookings.into_iter().map(to_response).collect(),
    }))
}

pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    user: crate::modules::auth::AuthUser,
    Path(booking_id): Path<String>,
) -> Result<Json<BookingResponse>, ErrorReply> {
    let crud = BookingCrud::new(state.db.clone());

    let booking = crud
        .find_with_car(&booking_id)
        .await
        .map_err(reply)?
        .ok_or_else(|| reply(BookingError::BookingNotFound))?;

    if booking.booking.renter_id != user.id && booking.owner_id != user.id {
        return Err(reply(BookingError::Unauthorized));
    }

    Ok(Json(to_response(booking)))
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    user: crate::modules::auth::AuthUser,
    Path(booking_id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<BookingResponse>, ErrorReply> {
    let crud = BookingCrud::new(state.db.clone());

    let result = crud
        .update_status(&booking_id, &user.id, req.status)
        .await
        .map_err(reply)?;

    notify_transition(&state, &result.booking, result.role, result.from).await;

    Ok(Json(to_response(result.booking)))
}

/// Fan out the transition to the counterparty; cancelling a confirmed
/// booking tells both sides. An owner turning down a pending request
/// reads as a rejection to the renter.
async fn notify_transition(
    state: &AppState,
    booking: &BookingWithCar,
    role: ActorRole,
    from: BookingStatus,
) {
    let to = booking.booking.status;

    let kind = match to {
        BookingStatus::Confirmed => NotificationKind::BookingConfirmed,
        BookingStatus::Cancelled if role == ActorRole::Owner && from == BookingStatus::Pending => {
            NotificationKind::BookingRejected
        }
        BookingStatus::Cancelled => NotificationKind::BookingCancelled,
        BookingStatus::Completed | BookingStatus::Pending => NotificationKind::Message,
    };

    let mut event = NotificationEvent::new(kind)
        .booking_id(booking.booking.id.clone())
        .car_model(booking.car_model.clone())
        .dates(booking.booking.start_date, booking.booking.end_date);

    if kind == NotificationKind::Message {
        event = event.message(format!(
            "Your booking for {} has been marked {}.",
            booking.car_model, to
        ));
    }

    let mut recipients = Vec::new();
    let both_parties = to == BookingStatus::Cancelled && from == BookingStatus::Confirmed;

    let counterparty = match role {
        ActorRole::Owner => &booking.booking.renter_id,
        ActorRole::Renter => &booking.owner_id,
    };

    if let Some(r) = recipient(state, counterparty).await {
        recipients.push(r);
    }

    if both_parties {
        let actor = match role {
            ActorRole::Owner => &booking.owner_id,
            ActorRole::Renter => &booking.booking.renter_id,
        };
        if let Some(r) = recipient(state, actor).await {
            recipients.push(r);
        }
    }

    state.notifier.notify(&event, &recipients).await;
}
