use mongodb::bson::{doc, Document};
use rocket::{futures::TryStreamExt, serde::json::Json, Route, State};

use crate::{
    error::{Error, Result},
    model::{
        api::{
            auth::AuthToken,
            data,
            vote::{Tally, VoteReceipt, VoteRequest},
            Data,
        },
        common::zone::Zone,
        db::{
            associate::Associate,
            candidate::Candidate,
            vote::{CandidateVotes, NewVote, Vote},
        },
        mongodb::{Coll, Id},
    },
    notify::{ChannelKind, Message, Notifier},
};

pub fn routes() -> Vec<Route> {
    routes![cast_vote, tally]
}

/// Record the signed-in associate's vote for a candidate in their zone.
#[post("/votes", data = "<request>", format = "json")]
async fn cast_vote(
    token: AuthToken<Associate>,
    request: Json<VoteRequest>,
    associates: Coll<Associate>,
    candidates: Coll<Candidate>,
    new_votes: Coll<NewVote>,
    votes: Coll<Vote>,
    notifier: &State<Notifier>,
) -> Result<Json<Data<VoteReceipt>>> {
    let voter = token.user(&associates).await?;
    if !voter.active {
        return Err(Error::forbidden(format!(
            "Associate {} is not active and cannot vote",
            voter.national_id
        )));
    }

    let candidate_not_found = || Error::not_found(format!("Candidate '{}'", request.candidate_id));
    let candidate_id: Id = request
        .candidate_id
        .parse()
        .map_err(|_| candidate_not_found())?;
    let candidate = candidates
        .find_one(doc! { "_id": candidate_id, "active": true }, None)
        .await?
        .ok_or_else(candidate_not_found)?;

    let vote = NewVote::cast(&voter, &candidate).map_err(|e| Error::bad_request(e.to_string()))?;

    let already_voted = || {
        Error::conflict(format!(
            "Associate {} has already voted",
            voter.national_id
        ))
    };
    if votes
        .find_one(doc! { "voter_id": &voter.national_id }, None)
        .await?
        .is_some()
    {
        return Err(already_voted());
    }
    // The unique index settles a race between two first votes.
    let inserted = new_votes
        .insert_one(&vote, None)
        .await
        .map_err(|e| Error::or_conflict(e, already_voted))?;
    let id: Id = inserted
        .inserted_id
        .as_object_id()
        .ok_or_else(|| Error::internal("Vote was stored without an object ID"))?
        .into();
    info!("Recorded vote {id} in {}", vote.voter_zone);

    // Best effort: the vote stands whether or not the confirmation arrives.
    let confirmation = Message::VoteConfirmation {
        candidate_name: vote.candidate_name.clone(),
        zone: vote.candidate_zone,
    };
    let report = notifier
        .dispatch(&voter, &confirmation, &[ChannelKind::Email])
        .await;
    if !report.any_delivered() {
        warn!("Vote confirmation for {} was not delivered", voter.national_id);
    }

    Ok(data(Vote { id, vote }.into()))
}

/// Vote counts, optionally restricted to one zone.
#[get("/votes/tally?<zone>")]
async fn tally(zone: Option<&str>, votes: Coll<Vote>) -> Result<Json<Data<Tally>>> {
    let zone = zone
        .map(str::parse::<Zone>)
        .transpose()
        .map_err(|e| Error::bad_request(e.to_string()))?;
    let filter = zone.map_or_else(Document::new, |zone| doc! { "candidate_zone": zone });
    let counts: Vec<CandidateVotes> = votes
        .aggregate(CandidateVotes::pipeline(filter), None)
        .await?
        .with_type::<CandidateVotes>()
        .try_collect()
        .await?;
    Ok(data(Tally::from_counts(counts)))
}
