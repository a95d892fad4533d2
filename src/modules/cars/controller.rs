use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::crud::{CarCrud, CarError};
use super::model::CarSpec;
use super::schema::{
    AvailabilityQuery, AvailabilityResponse, CarPreset, CarResponse, CreateCarRequest,
    ErrorResponse, SearchQuery, UpdateCarRequest,
};
use crate::modules::auth::AuthUser;
use crate::modules::bookings::crud::BookingCrud;
use crate::AppState;

type ErrorReply = (StatusCode, Json<ErrorResponse>);

fn reply(e: CarError) -> ErrorReply {
    (e.status_code(), Json(ErrorResponse::new(e.to_string())))
}

pub async fn create_car(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<CreateCarRequest>,
) -> Result<(StatusCode, Json<CarResponse>), ErrorReply> {
    let spec = match req.preset {
        Some(CarPreset::Economy) => CarSpec::economy(
            req.location,
            req.availability_start,
            req.availability_end,
        ),
        Some(CarPreset::Luxury) => CarSpec::luxury(
            req.location,
            req.availability_start,
            req.availability_end,
        ),
        None => {
            let missing = || {
                (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse::new(
                        "model, year, mileage and daily_price are required without a preset",
                    )),
                )
            };
            CarSpec::custom(
                req.model.ok_or_else(missing)?,
                req.year.ok_or_else(missing)?,
                req.mileage.ok_or_else(missing)?,
                req.daily_price.ok_or_else(missing)?,
                req.location,
                req.availability_start,
                req.availability_end,
            )
        }
    };

    let crud = CarCrud::new(state.db.clone());
    let car = crud.create(&user.id, spec).await.map_err(reply)?;

    Ok((StatusCode::CREATED, Json(car.into())))
}

pub async fn get_car(
    State(state): State<Arc<AppState>>,
    Path(car_id): Path<String>,
) -> Result<Json<CarResponse>, ErrorReply> {
    let crud = CarCrud::new(state.db.clone());

    let car = crud
        .find_by_id(&car_id)
        .await
        .map_err(reply)?
        .ok_or_else(|| reply(CarError::CarNotFound))?;

    Ok(Json(car.into()))
}

pub async fn update_car(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(car_id): Path<String>,
    Json(req): Json<UpdateCarRequest>,
) -> Result<Json<CarResponse>, ErrorReply> {
    let crud = CarCrud::new(state.db.clone());
    let car = crud.update(&car_id, &user.id, &req).await.map_err(reply)?;

    Ok(Json(car.into()))
}

pub async fn delete_car(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(car_id): Path<String>,
) -> Result<StatusCode, ErrorReply> {
    let crud = CarCrud::new(state.db.clone());
    crud.delete(&car_id, &user.id).await.map_err(reply)?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn search_cars(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<CarResponse>>, ErrorReply> {
    let crud = CarCrud::new(state.db.clone());
    let cars = crud.search(&query).await.map_err(reply)?;

    Ok(Json(cars.into_iter().map(|c| c.into()).collect()))
}

pub async fn my_cars(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Vec<CarResponse>>, ErrorReply> {
    let crud = CarCrud::new(state.db.clone());
    let cars = crud.list_by_owner(&user.id).await.map_err(reply)?;

    Ok(Json(cars.into_iter().map(|c| c.into()).collect()))
}

/// Public read-only availability query, shared with booking creation.
pub async fn check_availability(
    State(state): State<Arc<AppState>>,
    Path(car_id): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, ErrorReply> {
    let crud = CarCrud::new(state.db.clone());

    let car = crud
        .find_by_id(&car_id)
        .await
        .map_err(reply)?
        .ok_or_else(|| reply(CarError::CarNotFound))?;

    let available = BookingCrud::new(state.db.clone())
        .is_available(&car, query.start_date, query.end_date)
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(e.to_string())),
            )
        })?;

    Ok(Json(AvailabilityResponse { available }))
}
