use std::collections::HashSet;

use chrono::Utc;
use mongodb::{
    bson::{doc, DateTime as BsonDateTime},
    options::FindOptions,
};
use rocket::{futures::TryStreamExt, serde::json::Json, Route};

use crate::{
    error::{Error, Result},
    model::{
        api::{auth::AuthToken, data, plancha::PlanchaDescription, Data},
        common::{
            national_id::NationalId,
            plancha::{Committee, PlanchaStatus, Slate, Violation, Violations},
        },
        db::{
            admin::Admin,
            associate::Associate,
            plancha::{NewPlancha, Plancha},
        },
        mongodb::Coll,
    },
};

pub fn routes() -> Vec<Route> {
    routes![
        create_draft,
        replace_draft,
        submit,
        get_own,
        list_planchas
    ]
}

/// The signed-in associate, who must be active to lead a plancha.
async fn active_leader(token: &AuthToken<Associate>, associates: &Coll<Associate>) -> Result<Associate> {
    let leader = token.user(associates).await?;
    if !leader.active {
        return Err(Error::forbidden(format!(
            "Associate {} is not active and cannot lead a plancha",
            leader.national_id
        )));
    }
    Ok(leader)
}

/// Drafts may be incomplete but never oversized, and are always led by
/// their owner.
fn check_draft(leader: &Associate, committee: Committee, slate: &Slate) -> Result<()> {
    if slate.leader.national_id != leader.national_id {
        return Err(Error::bad_request(format!(
            "The plancha leader must be the signed-in associate ({})",
            leader.national_id
        )));
    }
    slate
        .check_draft(committee)
        .map_err(|violation| Error::Plancha(Violations(vec![violation])))
}

async fn find_own(
    planchas: &Coll<Plancha>,
    committee: Committee,
    leader: &Associate,
) -> Result<Plancha> {
    planchas
        .find_one(doc! { "committee": committee, "leader_id": leader.id }, None)
        .await?
        .ok_or_else(|| {
            Error::not_found(format!(
                "{committee} plancha led by {}",
                leader.national_id
            ))
        })
}

fn already_submitted(committee: Committee) -> Error {
    Error::conflict(format!(
        "The {committee} plancha has already been submitted and can no longer change"
    ))
}

#[post("/planchas/<committee>", data = "<slate>", format = "json")]
async fn create_draft(
    token: AuthToken<Associate>,
    committee: Committee,
    slate: Json<Slate>,
    associates: Coll<Associate>,
    new_planchas: Coll<NewPlancha>,
    planchas: Coll<Plancha>,
) -> Result<Json<Data<PlanchaDescription>>> {
    let leader = active_leader(&token, &associates).await?;
    check_draft(&leader, committee, &slate)?;

    let exists = || {
        Error::conflict(format!(
            "{} already leads a {committee} plancha",
            leader.national_id
        ))
    };
    let owned = doc! { "committee": committee, "leader_id": leader.id };
    if planchas.find_one(owned, None).await?.is_some() {
        return Err(exists());
    }
    let draft = NewPlancha::draft(committee, leader.id, slate.0);
    new_planchas
        .insert_one(&draft, None)
        .await
        .map_err(|e| Error::or_conflict(e, exists))?;
    info!(
        "{} started a {committee} plancha with {} people",
        leader.national_id,
        draft.slate.len()
    );

    Ok(data(find_own(&planchas, committee, &leader).await?.into()))
}

#[put("/planchas/<committee>", data = "<slate>", format = "json")]
async fn replace_draft(
    token: AuthToken<Associate>,
    committee: Committee,
    slate: Json<Slate>,
    associates: Coll<Associate>,
    new_planchas: Coll<NewPlancha>,
    planchas: Coll<Plancha>,
) -> Result<Json<Data<PlanchaDescription>>> {
    let leader = active_leader(&token, &associates).await?;
    let existing = find_own(&planchas, committee, &leader).await?;
    if existing.status == PlanchaStatus::Submitted {
        return Err(already_submitted(committee));
    }
    check_draft(&leader, committee, &slate)?;

    let mut updated = existing.plancha;
    updated.slate = slate.0;
    updated.updated_at = Utc::now();
    let still_draft = doc! { "_id": existing.id, "status": PlanchaStatus::Draft };
    let result = new_planchas.replace_one(still_draft, &updated, None).await?;
    if result.matched_count == 0 {
        return Err(already_submitted(committee));
    }

    Ok(data(find_own(&planchas, committee, &leader).await?.into()))
}

/// Validate the whole application and, if it passes, freeze it.
#[post("/planchas/<committee>/submit")]
async fn submit(
    token: AuthToken<Associate>,
    committee: Committee,
    associates: Coll<Associate>,
    planchas: Coll<Plancha>,
) -> Result<Json<Data<PlanchaDescription>>> {
    let leader = active_leader(&token, &associates).await?;
    let plancha = find_own(&planchas, committee, &leader).await?;
    if plancha.status == PlanchaStatus::Submitted {
        return Err(already_submitted(committee));
    }

    let mut violations = match plancha.slate.check_submission(committee) {
        Ok(()) => Violations::default(),
        Err(violations) => violations,
    };
    violations
        .0
        .extend(inactive_members(&plancha.slate, &associates).await?);
    if !violations.is_empty() {
        return Err(Error::Plancha(violations));
    }

    let still_draft = doc! { "_id": plancha.id, "status": PlanchaStatus::Draft };
    let submitted = doc! {
        "$set": {
            "status": PlanchaStatus::Submitted,
            "updated_at": BsonDateTime::from_chrono(Utc::now()),
        }
    };
    let result = planchas.update_one(still_draft, submitted, None).await?;
    if result.matched_count == 0 {
        return Err(already_submitted(committee));
    }
    info!("{} submitted the {committee} plancha", leader.national_id);

    Ok(data(find_own(&planchas, committee, &leader).await?.into()))
}

/// People on the slate who are not active associates, each reported once.
async fn inactive_members(slate: &Slate, associates: &Coll<Associate>) -> Result<Vec<Violation>> {
    let mut seen = HashSet::new();
    let roster: Vec<&NationalId> = slate
        .roster()
        .map(|member| &member.national_id)
        .filter(|national_id| seen.insert(*national_id))
        .collect();

    let filter = doc! {
        "national_id": { "$in": roster.iter().map(|id| id.to_string()).collect::<Vec<_>>() },
        "active": true,
    };
    let active: Vec<Associate> = associates.find(filter, None).await?.try_collect().await?;
    let active: HashSet<&NationalId> = active.iter().map(|a| &a.national_id).collect();

    Ok(roster
        .into_iter()
        .filter(|national_id| !active.contains(national_id))
        .map(|national_id| Violation::NotAnActiveAssociate(national_id.clone()))
        .collect())
}

#[get("/planchas/<committee>")]
async fn get_own(
    token: AuthToken<Associate>,
    committee: Committee,
    associates: Coll<Associate>,
    planchas: Coll<Plancha>,
) -> Result<Json<Data<PlanchaDescription>>> {
    let leader = token.user(&associates).await?;
    Ok(data(find_own(&planchas, committee, &leader).await?.into()))
}

/// All applications, oldest first, optionally for one committee.
#[get("/admin/planchas?<committee>")]
async fn list_planchas(
    _token: AuthToken<Admin>,
    committee: Option<&str>,
    planchas: Coll<Plancha>,
) -> Result<Json<Data<Vec<PlanchaDescription>>>> {
    let filter = committee
        .map(str::parse::<Committee>)
        .transpose()
        .map_err(|e| Error::bad_request(e.to_string()))?
        .map(|committee| doc! { "committee": committee });
    let options = FindOptions::builder().sort(doc! { "created_at": 1 }).build();
    let found: Vec<Plancha> = planchas.find(filter, options).await?.try_collect().await?;
    Ok(data(found.into_iter().map(Into::into).collect()))
}

#[cfg(test)]
mod tests {
    use mongodb::Database;
    use rocket::{
        http::{ContentType, Status},
        local::asynchronous::Client,
        serde::json::serde_json::json,
    };

    use crate::error::ErrorBody;
    use crate::model::{
        common::{plancha::MemberRole, zone::Zone},
        db::associate::NewAssociate,
    };
    use crate::testing::login_admin;

    use super::*;

    /// The example associate leads; everyone else on the slate is registered.
    async fn register_members(slate: &Slate, new_associates: &Coll<NewAssociate>) {
        let others: Vec<NewAssociate> = slate
            .members
            .iter()
            .map(|member| NewAssociate::example_in(&member.national_id, Zone::Two))
            .collect();
        new_associates.insert_many(others, None).await.unwrap();
    }

    async fn send(client: &Client, method: &str, committee: Committee, slate: &Slate) -> Status {
        let uri = format!("/planchas/{committee}");
        let request = match method {
            "POST" => client.post(uri),
            _ => client.put(uri),
        };
        request
            .header(ContentType::JSON)
            .body(json!(slate).to_string())
            .dispatch()
            .await
            .status()
    }

    #[backend_test(associate)]
    async fn draft_then_submit(client: Client, new_associates: Coll<NewAssociate>) {
        let slate = Slate::example(Committee::Board, 123456);
        register_members(&slate, &new_associates).await;

        // Start with the leader alone.
        let mut partial = slate.clone();
        partial.members.clear();
        assert_eq!(send(&client, "POST", Committee::Board, &partial).await, Status::Ok);
        assert_eq!(send(&client, "POST", Committee::Board, &partial).await, Status::Conflict);

        // An incomplete slate cannot be submitted.
        let response = client.post("/planchas/board/submit").dispatch().await;
        assert_eq!(Status::BadRequest, response.status());

        // Fill it in and submit.
        assert_eq!(send(&client, "PUT", Committee::Board, &slate).await, Status::Ok);
        let response = client.post("/planchas/board/submit").dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let submitted: Data<PlanchaDescription> = response.into_json().await.unwrap();
        assert_eq!(submitted.data.status, PlanchaStatus::Submitted);
        assert_eq!(submitted.data.slate.len(), 10);

        // Frozen from now on.
        assert_eq!(send(&client, "PUT", Committee::Board, &slate).await, Status::Conflict);
        let response = client.post("/planchas/board/submit").dispatch().await;
        assert_eq!(Status::Conflict, response.status());

        let response = client.get("/planchas/board").dispatch().await;
        let own: Data<PlanchaDescription> = response.into_json().await.unwrap();
        assert_eq!(own.data.status, PlanchaStatus::Submitted);
    }

    #[backend_test(associate)]
    async fn oversized_draft_is_refused(client: Client) {
        let mut slate = Slate::example(Committee::Appeals, 123456);
        slate.members.push(slate.members[0].clone());
        assert_eq!(send(&client, "POST", Committee::Appeals, &slate).await, Status::BadRequest);
    }

    #[backend_test(associate)]
    async fn leader_must_be_signed_in_associate(client: Client) {
        let slate = Slate::example(Committee::Oversight, 700000);
        assert_eq!(
            send(&client, "POST", Committee::Oversight, &slate).await,
            Status::BadRequest
        );
    }

    #[backend_test(associate)]
    async fn submission_reports_every_violation(client: Client, new_associates: Coll<NewAssociate>) {
        let mut slate = Slate::example(Committee::Oversight, 123456);
        // Only the first member is registered.
        new_associates
            .insert_one(
                NewAssociate::example_in(&slate.members[0].national_id, Zone::One),
                None,
            )
            .await
            .unwrap();
        slate.members[1].role = MemberRole::Alternate;
        slate.consents.declares_truthful = false;
        assert_eq!(send(&client, "POST", Committee::Oversight, &slate).await, Status::Ok);

        let response = client.post("/planchas/oversight/submit").dispatch().await;
        assert_eq!(Status::BadRequest, response.status());
        let body: ErrorBody = response.into_json().await.unwrap();
        // Split, sequence, consent, and four unregistered members.
        assert!(body.violations.len() >= 7, "{:?}", body.violations);
        assert!(body
            .violations
            .iter()
            .any(|v| v.contains("declaration of truthfulness")));
        assert!(body
            .violations
            .iter()
            .any(|v| v.contains(&format!("{} is not an active associate", slate.members[4].national_id))));
    }

    #[backend_test(associate)]
    async fn missing_plancha(client: Client) {
        let response = client.get("/planchas/appeals").dispatch().await;
        assert_eq!(Status::NotFound, response.status());
        let response = client.post("/planchas/appeals/submit").dispatch().await;
        assert_eq!(Status::NotFound, response.status());
        assert_eq!(
            send(&client, "PUT", Committee::Appeals, &Slate::example(Committee::Appeals, 123456)).await,
            Status::NotFound
        );
    }

    #[backend_test(associate)]
    async fn admin_listing(client: Client, db: Database) {
        let slate = Slate::example(Committee::Appeals, 123456);
        assert_eq!(send(&client, "POST", Committee::Appeals, &slate).await, Status::Ok);

        login_admin(&client, &db).await;
        let response = client.get("/admin/planchas").dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let all: Data<Vec<PlanchaDescription>> = response.into_json().await.unwrap();
        assert_eq!(all.data.len(), 1);
        assert_eq!(all.data[0].committee, Committee::Appeals);

        let response = client.get("/admin/planchas?committee=board").dispatch().await;
        let boards: Data<Vec<PlanchaDescription>> = response.into_json().await.unwrap();
        assert!(boards.data.is_empty());

        let response = client.get("/admin/planchas?committee=senate").dispatch().await;
        assert_eq!(Status::BadRequest, response.status());
    }
}
