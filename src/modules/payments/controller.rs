use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{Datelike, Utc};
use std::sync::Arc;

use super::crud::{PaymentCrud, PaymentError, SettlementOutcome};
use super::model::{card_type_for_number, parse_expiry};
use super::schema::{
    BookingPaymentResponse, CreatePaymentMethodRequest, ErrorResponse, NewCardInput,
    PaymentHistoryResponse, PaymentMethodResponse, PaymentResponse, ProcessPaymentRequest,
};
use crate::modules::auth::AuthUser;
use crate::services::notify::{self, NotificationEvent, NotificationKind};
use crate::AppState;

type ErrorReply = (StatusCode, Json<ErrorResponse>);

fn reply(e: PaymentError) -> ErrorReply {
    (e.status_code(), Json(ErrorResponse::new(e.to_string())))
}

struct ValidCard {
    card_type: &'static str,
    last_four: String,
    holder: String,
    expiry_month: i32,
    expiry_year: i32,
}

fn validate_card(card: &NewCardInput) -> Result<ValidCard, PaymentError> {
    if card.card_holder_name.trim().is_empty() || card.cvv.trim().is_empty() {
        return Err(PaymentError::InvalidCard(
            "Please fill in all card details".to_string(),
        ));
    }

    let number: String = card.card_number.chars().filter(|c| !c.is_whitespace()).collect();

    if number.len() < 13 || number.len() > 19 || !number.chars().all(|c| c.is_ascii_digit()) {
        return Err(PaymentError::InvalidCard("Invalid card number".to_string()));
    }

    let (expiry_month, expiry_year) = parse_expiry(&card.expiry_date)
        .ok_or_else(|| PaymentError::InvalidCard("Invalid expiry date, use MM/YY".to_string()))?;

    let now = Utc::now();
    if expiry_year < now.year() || (expiry_year == now.year() && expiry_month < now.month() as i32)
    {
        return Err(PaymentError::CardExpired);
    }

    Ok(ValidCard {
        card_type: card_type_for_number(&number),
        last_four: number[number.len() - 4..].to_string(),
        holder: card.card_holder_name.trim().to_string(),
        expiry_month,
        expiry_year,
    })
}

pub async fn process_payment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<ProcessPaymentRequest>,
) -> Result<Json<PaymentResponse>, ErrorReply> {
    let crud = PaymentCrud::new(state.db.clone());

    // A saved method wins over new card details; a new card is only
    // persisted when the renter asks for it.
    let method_id = match (&req.payment_method_id, &req.card) {
        (Some(id), _) => Some(id.clone()),
        (None, Some(card)) => {
            let valid = validate_card(card).map_err(reply)?;

            if card.save_card {
                let method = crud
                    .create_method(
                        &user.id,
                        valid.card_type,
                        &valid.last_four,
                        &valid.holder,
                        valid.expiry_month,
                        valid.expiry_year,
                        card.make_default,
                    )
                    .await
                    .map_err(reply)?;
                Some(method.id)
            } else {
                None
            }
        }
        (None, None) => None,
    };

    let result = crud
        .process_payment(
            &req.booking_id,
            &user.id,
            method_id.as_deref(),
            state.gateway.as_ref(),
        )
        .await
        .map_err(reply)?;

    if let SettlementOutcome::Settled { amount } = result.outcome {
        let booking = &result.booking;
        let event = NotificationEvent::new(NotificationKind::PaymentConfirmation)
            .booking_id(booking.booking.id.clone())
            .car_model(booking.car_model.clone())
            .dates(booking.booking.start_date, booking.booking.end_date)
            .amount(amount);

        let mut recipients = Vec::new();
        for user_id in [&booking.booking.renter_id, &booking.owner_id] {
            match notify::recipient_for(&state.db, user_id).await {
                Ok(Some(r)) => recipients.push(r),
                Ok(None) => {}
                Err(e) => tracing::warn!("Failed to load notification recipient {}: {}", user_id, e),
            }
        }

        state.notifier.notify(&event, &recipients).await;
    }

    Ok(Json(result.payment.into()))
}

pub async fn refund_payment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(payment_id): Path<String>,
) -> Result<Json<PaymentResponse>, ErrorReply> {
    let crud = PaymentCrud::new(state.db.clone());

    let result = crud
        .refund_payment(&payment_id, &user.id)
        .await
        .map_err(reply)?;

    let booking = &result.booking;
    let event = NotificationEvent::new(NotificationKind::Message)
        .booking_id(booking.booking.id.clone())
        .car_model(booking.car_model.clone())
        .dates(booking.booking.start_date, booking.booking.end_date)
        .amount(result.payment.amount)
        .message(format!(
            "A refund of ${} has been processed for the booking of {}.",
            result.payment.amount, booking.car_model
        ));

    let mut recipients = Vec::new();
    for user_id in [&booking.booking.renter_id, &booking.owner_id] {
        match notify::recipient_for(&state.db, user_id).await {
            Ok(Some(r)) => recipients.push(r),
            Ok(None) => {}
            Err(e) => tracing::warn!("Failed to load notification recipient {}: {}", user_id, e),
        }
    }

    state.notifier.notify(&event, &recipients).await;

    Ok(Json(result.payment.into()))
}

pub async fn booking_payment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(booking_id): Path<String>,
) -> Result<Json<BookingPaymentResponse>, ErrorReply> {
    let crud = PaymentCrud::new(state.db.clone());

    let booking = crud
        .booking_parties(&booking_id)
        .await
        .map_err(reply)?
        .ok_or_else(|| reply(PaymentError::BookingNotFound))?;

    if booking.booking.renter_id != user.id && booking.owner_id != user.id {
        return Err(reply(PaymentError::Unauthorized));
    }

    let payment = crud.find_by_booking(&booking_id).await.map_err(reply)?;

    let response = match payment {
        Some(p) => BookingPaymentResponse {
            booking_id,
            status: p.status.to_string(),
            payment_id: Some(p.id),
            amount: Some(p.amount),
        },
        None => BookingPaymentResponse {
            booking_id,
            status: "unpaid".to_string(),
            payment_id: None,
            amount: None,
        },
    };

    Ok(Json(response))
}

pub async fn payment_history(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<PaymentHistoryResponse>, ErrorReply> {
    let crud = PaymentCrud::new(state.db.clone());

    let (made, received) = crud.history(&user.id).await.map_err(reply)?;

    Ok(Json(PaymentHistoryResponse {
        payments_made: made.into_iter().map(|p| p.into()).collect(),
        payments_received: received.into_iter().map(|p| p.into()).collect(),
    }))
}

// =============================================================================
// PAYMENT METHODS
// =============================================================================

pub async fn create_method(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<CreatePaymentMethodRequest>,
) -> Result<(StatusCode, Json<PaymentMethodResponse>), ErrorReply> {
    let card = NewCardInput {
        card_holder_name: req.card_holder_name,
        card_number: req.card_number,
        expiry_date: req.expiry_date,
        cvv: req.cvv,
        save_card: true,
        make_default: req.make_default,
    };

    let valid = validate_card(&card).map_err(reply)?;

    let crud = PaymentCrud::new(state.db.clone());
    let method = crud
        .create_method(
            &user.id,
            valid.card_type,
            &valid.last_four,
            &valid.holder,
            valid.expiry_month,
            valid.expiry_year,
            card.make_default,
        )
        .await
        .map_err(reply)?;

    Ok((StatusCode::CREATED, Json(method.into())))
}

pub async fn list_methods(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Vec<PaymentMethodResponse>>, ErrorReply> {
    let crud = PaymentCrud::new(state.db.clone());
    let methods = crud.list_methods(&user.id).await.map_err(reply)?;

    Ok(Json(methods.into_iter().map(|m| m.into()).collect()))
}

pub async fn delete_method(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(method_id): Path<String>,
) -> Result<StatusCode, ErrorReply> {
    let crud = PaymentCrud::new(state.db.clone());
    crud.delete_method(&method_id, &user.id)
        .await
        .map_err(reply)?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_default_method(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(method_id): Path<String>,
) -> Result<StatusCode, ErrorReply> {
    let crud = PaymentCrud::new(state.db.clone());
    crud.set_default_method(&method_id, &user.id)
        .await
        .map_err(reply)?;

    Ok(StatusCode::NO_CONTENT)
}
