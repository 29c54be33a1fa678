use chrono::{DateTime, Utc};
use mongodb::bson::doc;
use rocket::{http::CookieJar, serde::json::Json, Route, State};

use crate::{
    error::{Error, Result},
    model::{
        api::{
            associate::AssociateStatus,
            auth::AuthToken,
            data,
            verification::{CodeIssued, CodeRequest, VerifyRequest},
            Data,
        },
        common::code::Code,
        db::{
            associate::{Associate, CodeRejection, PendingCode},
            candidate::Candidate,
            vote::Vote,
        },
        mongodb::Coll,
    },
    notify::{Message, Notifier},
    Config,
};

use super::associates::{find_associate, status_of};

pub fn routes() -> Vec<Route> {
    routes![issue_code, verify_code]
}

/// Generate a fresh code for an active associate, replacing any earlier
/// one, and send it over the requested channels.
#[post("/verification/code", data = "<request>", format = "json")]
async fn issue_code(
    request: Json<CodeRequest>,
    associates: Coll<Associate>,
    config: &State<Config>,
    notifier: &State<Notifier>,
) -> Result<Json<Data<CodeIssued>>> {
    let channels = request.channels();
    if channels.is_empty() {
        return Err(Error::bad_request("At least one channel must be requested"));
    }

    let associate = find_associate(&associates, &request.national_id).await?;
    if !associate.active {
        return Err(Error::forbidden(format!(
            "Associate {} is not active",
            associate.national_id
        )));
    }

    let code = Code::random();
    let expires_at = Utc::now() + config.otp_ttl();
    let pending = PendingCode::new(&code, config.hmac_secret(), expires_at);
    associates
        .update_one(
            associate.id.as_doc(),
            doc! { "$set": { "pending_code": &pending } },
            None,
        )
        .await?;

    let message = Message::VerificationCode {
        code,
        valid_minutes: valid_minutes(config),
    };
    let report = notifier.dispatch(&associate, &message, &channels).await;
    if !report.any_delivered() {
        // Nobody received this code; a newer one may already have replaced it.
        associates
            .update_one(
                doc! { "_id": associate.id, "pending_code": &pending },
                doc! { "$unset": { "pending_code": "" } },
                None,
            )
            .await?;
        return Err(Error::internal(format!(
            "Verification code for {} could not be delivered on any channel",
            associate.national_id
        )));
    }
    info!("Issued verification code to {}", associate.national_id);

    Ok(data(CodeIssued { expires_at, report }))
}

/// Code lifetime as shown to the associate, rounded up.
fn valid_minutes(config: &Config) -> i64 {
    (config.otp_ttl().num_seconds() + 59) / 60
}

/// Consume a code and sign the associate in.
///
/// The match-and-clear is a single atomic update, so a code is accepted at
/// most once even under concurrent submissions.
#[post("/verification/verify", data = "<request>", format = "json")]
async fn verify_code(
    request: Json<VerifyRequest>,
    cookies: &CookieJar<'_>,
    associates: Coll<Associate>,
    votes: Coll<Vote>,
    candidates: Coll<Candidate>,
    config: &State<Config>,
) -> Result<Json<Data<AssociateStatus>>> {
    let code: Code = request
        .code
        .parse()
        .map_err(|e| Error::bad_request(format!("Invalid verification code: {e}")))?;
    let now = Utc::now();

    let mut filter = PendingCode::filter(&code, config.hmac_secret(), now);
    filter.insert("national_id", &request.national_id);
    filter.insert("active", true);
    let consumed = associates
        .find_one_and_update(filter, doc! { "$unset": { "pending_code": "" } }, None)
        .await?;

    let associate = match consumed {
        Some(associate) => associate,
        None => {
            return Err(diagnose(
                find_associate(&associates, &request.national_id).await?,
                &code,
                config,
                now,
            ))
        }
    };

    cookies.add(AuthToken::new(&associate).into_cookie(config)?);
    info!("Associate {} verified", associate.national_id);

    Ok(data(status_of(associate, &votes, &candidates).await?))
}

/// Explain why the atomic update matched nothing.
fn diagnose(associate: Associate, code: &Code, config: &Config, now: DateTime<Utc>) -> Error {
    if !associate.active {
        return Error::forbidden(format!(
            "Associate {} is not active",
            associate.national_id
        ));
    }
    match associate.check_code(code, config.hmac_secret(), now) {
        Err(CodeRejection::NotFound) | Ok(()) => Error::not_found(format!(
            "Verification code for associate {}",
            associate.national_id
        )),
        Err(rejection @ (CodeRejection::Expired | CodeRejection::Mismatch)) => {
            Error::unauthorized(rejection.to_string())
        }
    }
}
