//! Router configuration.

use crate::handlers::{activities, bookings, health, locations, slots, vehicles};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Build the complete Axum router.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        // Slots
        .route("/slots", post(slots::create_slot).get(slots::list_slots))
        .route("/slots/bulk", post(slots::create_bulk))
        .route("/slots/available", get(slots::list_available))
        // Bookings
        .route(
            "/bookings",
            post(bookings::create_booking).get(bookings::list_my_bookings),
        )
        .route("/bookings/all", get(bookings::list_all_bookings))
        .route("/bookings/:id", get(bookings::get_booking))
        .route("/bookings/:id/cancel", post(bookings::cancel_booking))
        .route("/bookings/:id/extend", post(bookings::extend_booking))
        .route("/bookings/:id/release", post(bookings::release_booking))
        // Locations
        .route(
            "/locations",
            post(locations::create_location).get(locations::list_locations),
        )
        .route(
            "/locations/:id",
            get(locations::get_location)
                .put(locations::update_location)
                .delete(locations::delete_location),
        )
        .route("/locations/code/:code", get(locations::get_location_by_code))
        // Activities
        .route("/activities/entry", post(activities::record_entry))
        .route("/activities/active", get(activities::list_active))
        .route(
            "/activities/reports/entries",
            get(activities::entries_report),
        )
        .route("/activities/reports/exits", get(activities::exits_report))
        .route("/activities/:id", get(activities::get_activity))
        .route("/activities/:id/exit", post(activities::record_exit))
        .route("/activities/:id/ticket", get(activities::entry_ticket))
        .route("/activities/:id/summary", get(activities::parking_summary))
        // Vehicles
        .route(
            "/vehicles",
            post(vehicles::register_vehicle).get(vehicles::list_my_vehicles),
        )
        .route("/vehicles/:id", get(vehicles::get_vehicle));

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
