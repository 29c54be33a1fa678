use mongodb::{bson::doc, options::FindOptions};
use rocket::{futures::TryStreamExt, serde::json::Json, Route};

use crate::{
    error::{Error, Result},
    model::{
        api::{
            auth::AuthToken,
            candidate::{CandidacyRequest, CandidateDescription},
            data, Data,
        },
        common::zone::Zone,
        db::{
            associate::Associate,
            candidate::{Candidate, NewCandidate},
        },
        mongodb::{Coll, Id},
    },
};

pub fn routes() -> Vec<Route> {
    routes![nominate, list_candidates, get_candidate]
}

/// Put the signed-in associate forward as a candidate in their own zone.
#[post("/candidates", data = "<request>", format = "json")]
async fn nominate(
    token: AuthToken<Associate>,
    request: Json<CandidacyRequest>,
    associates: Coll<Associate>,
    new_candidates: Coll<NewCandidate>,
    candidates: Coll<Candidate>,
) -> Result<Json<Data<CandidateDescription>>> {
    let associate = token.user(&associates).await?;
    if !associate.active {
        return Err(Error::forbidden(format!(
            "Associate {} is not active and cannot stand as a candidate",
            associate.national_id
        )));
    }
    let (profile, image) = request.0.into_parts()?;

    let already_standing = || {
        Error::conflict(format!(
            "Associate {} is already a candidate",
            associate.national_id
        ))
    };
    let with_associate = doc! { "associate_id": associate.id };
    if candidates
        .find_one(with_associate.clone(), None)
        .await?
        .is_some()
    {
        return Err(already_standing());
    }

    let candidate = NewCandidate::nominate(&associate, profile, image);
    new_candidates
        .insert_one(&candidate, None)
        .await
        .map_err(|e| Error::or_conflict(e, already_standing))?;
    info!(
        "Associate {} is now a candidate in {}",
        associate.national_id, associate.zone
    );

    let created = candidates
        .find_one(with_associate, None)
        .await?
        .ok_or_else(|| Error::internal("Candidate vanished after insertion"))?;
    Ok(data(created.into()))
}

/// Active candidates by name, optionally restricted to one zone.
#[get("/candidates?<zone>")]
async fn list_candidates(
    zone: Option<&str>,
    candidates: Coll<Candidate>,
) -> Result<Json<Data<Vec<CandidateDescription>>>> {
    let mut filter = doc! { "active": true };
    if let Some(zone) = zone {
        let zone: Zone = zone.parse().map_err(|e| Error::bad_request(format!("{e}")))?;
        filter.insert("zone", zone);
    }
    let options = FindOptions::builder().sort(doc! { "name": 1 }).build();
    let found: Vec<Candidate> = candidates.find(filter, options).await?.try_collect().await?;
    Ok(data(found.into_iter().map(Into::into).collect()))
}

#[get("/candidates/<candidate_id>")]
async fn get_candidate(
    candidate_id: &str,
    candidates: Coll<Candidate>,
) -> Result<Json<Data<CandidateDescription>>> {
    let not_found = || Error::not_found(format!("Candidate '{candidate_id}'"));
    let id: Id = candidate_id.parse().map_err(|_| not_found())?;
    let candidate = candidates
        .find_one(id.as_doc(), None)
        .await?
        .ok_or_else(not_found)?;
    Ok(data(candidate.into()))
}
