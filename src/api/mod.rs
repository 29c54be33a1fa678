use rocket::{http::Status, serde::json::Json, Catcher, Request, Route};

use crate::error::ErrorBody;

mod admin;
mod associates;
mod auth;
mod candidacy;
mod plancha;
mod verification;
mod voting;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(admin::routes());
    routes.extend(associates::routes());
    routes.extend(auth::routes());
    routes.extend(candidacy::routes());
    routes.extend(plancha::routes());
    routes.extend(verification::routes());
    routes.extend(voting::routes());
    routes
}

pub fn catchers() -> Vec<Catcher> {
    catchers![unauthorized, unprocessable, default_catcher]
}

#[catch(401)]
fn unauthorized() -> Json<ErrorBody> {
    Json(ErrorBody::new("Not signed in, or signed in with the wrong rights"))
}

/// Bodies or parameters that fail to parse are plain validation errors.
#[catch(422)]
fn unprocessable(_req: &Request) -> (Status, Json<ErrorBody>) {
    (
        Status::BadRequest,
        Json(ErrorBody::new("Missing or malformed fields in request")),
    )
}

/// Requests that never reach a handler (unknown routes, malformed bodies,
/// failed guards) still get a JSON error body.
#[catch(default)]
fn default_catcher(status: Status, _req: &Request) -> (Status, Json<ErrorBody>) {
    (status, Json(ErrorBody::new(status.reason_lossy())))
}
