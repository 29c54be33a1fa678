use mongodb::{
    bson::doc,
    options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument},
};
use rocket::{futures::TryStreamExt, serde::json::Json, Route};

use crate::{
    error::{Error, Result},
    model::{
        api::{
            associate::{ActiveUpdate, AssociateDescription, AssociateSpec, AssociateStatus},
            auth::AuthToken,
            data, Data,
        },
        common::national_id::NationalId,
        db::{
            admin::Admin,
            associate::{Associate, NewAssociate},
            candidate::Candidate,
            vote::Vote,
        },
        mongodb::Coll,
        pagination::{Paginated, Pagination},
    },
};

pub fn routes() -> Vec<Route> {
    routes![
        associate_status,
        create_associate,
        set_active,
        list_associates
    ]
}

/// Public view of an associate, including whether they have voted or stand
/// as a candidate.
pub async fn status_of(
    associate: Associate,
    votes: &Coll<Vote>,
    candidates: &Coll<Candidate>,
) -> Result<AssociateStatus> {
    let has_voted = votes
        .find_one(doc! { "voter_id": &associate.national_id }, None)
        .await?
        .is_some();
    let is_candidate = candidates
        .find_one(doc! { "associate_id": associate.id }, None)
        .await?
        .is_some();
    let associate = associate.associate;
    Ok(AssociateStatus {
        national_id: associate.national_id,
        name: associate.name,
        zone: associate.zone,
        active: associate.active,
        has_voted,
        is_candidate,
    })
}

pub async fn find_associate(
    associates: &Coll<Associate>,
    national_id: &NationalId,
) -> Result<Associate> {
    associates
        .find_one(doc! { "national_id": national_id }, None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Associate with national ID '{national_id}'")))
}

#[get("/associates/<national_id>")]
async fn associate_status(
    national_id: NationalId,
    associates: Coll<Associate>,
    votes: Coll<Vote>,
    candidates: Coll<Candidate>,
) -> Result<Json<Data<AssociateStatus>>> {
    let associate = find_associate(&associates, &national_id).await?;
    Ok(data(status_of(associate, &votes, &candidates).await?))
}

#[post("/associates", data = "<spec>", format = "json")]
async fn create_associate(
    _token: AuthToken<Admin>,
    spec: Json<AssociateSpec>,
    new_associates: Coll<NewAssociate>,
    associates: Coll<Associate>,
) -> Result<Json<Data<AssociateDescription>>> {
    let associate = NewAssociate::try_from(spec.0)?;
    let duplicate = || {
        Error::conflict(format!(
            "An associate with national ID '{}' already exists",
            associate.national_id
        ))
    };

    let with_national_id = doc! { "national_id": &associate.national_id };
    if associates
        .find_one(with_national_id, None)
        .await?
        .is_some()
    {
        return Err(duplicate());
    }
    new_associates
        .insert_one(&associate, None)
        .await
        .map_err(|e| Error::or_conflict(e, duplicate))?;
    info!(
        "Registered associate {} in {}",
        associate.national_id, associate.zone
    );

    let created = find_associate(&associates, &associate.national_id).await?;
    Ok(data(created.into()))
}

#[put("/associates/<national_id>/active", data = "<update>", format = "json")]
async fn set_active(
    _token: AuthToken<Admin>,
    national_id: NationalId,
    update: Json<ActiveUpdate>,
    associates: Coll<Associate>,
) -> Result<Json<Data<AssociateDescription>>> {
    // A deactivated associate also loses any outstanding code.
    let change = if update.active {
        doc! { "$set": { "active": true } }
    } else {
        doc! { "$set": { "active": false }, "$unset": { "pending_code": "" } }
    };
    let options = FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build();

    let associate = associates
        .find_one_and_update(doc! { "national_id": &national_id }, change, options)
        .await?
        .ok_or_else(|| Error::not_found(format!("Associate with national ID '{national_id}'")))?;
    info!(
        "Associate {national_id} is now {}",
        if associate.active { "active" } else { "inactive" }
    );

    Ok(data(associate.into()))
}

#[get("/associates")]
async fn list_associates(
    _token: AuthToken<Admin>,
    pagination: Pagination,
    associates: Coll<Associate>,
) -> Result<Json<Data<Paginated<AssociateDescription>>>> {
    let total = associates.count_documents(None, None).await?;
    let options = FindOptions::builder()
        .sort(doc! { "national_id": 1 })
        .skip(pagination.skip())
        .limit(pagination.limit())
        .build();
    let page: Vec<Associate> = associates.find(None, options).await?.try_collect().await?;

    Ok(data(pagination.result(
        page.into_iter().map(AssociateDescription::from).collect(),
        total,
    )))
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::{ContentType, Status},
        local::asynchronous::Client,
        serde::json::serde_json::json,
    };

    use crate::model::{
        common::zone::Zone,
        db::{
            candidate::{CandidateProfile, NewCandidate},
            vote::NewVote,
        },
    };

    use super::*;

    #[backend_test]
    async fn public_status(client: Client, new_associates: Coll<NewAssociate>) {
        new_associates
            .insert_one(NewAssociate::example(), None)
            .await
            .unwrap();

        let response = client.get("/associates/123456").dispatch().await;
        assert_eq!(Status::Ok, response.status());

        let status: Data<AssociateStatus> = response.into_json().await.unwrap();
        assert_eq!(&*status.data.national_id, "123456");
        assert_eq!(status.data.zone, Zone::One);
        assert!(status.data.active);
        assert!(!status.data.has_voted);
        assert!(!status.data.is_candidate);
    }

    #[backend_test]
    async fn status_reflects_votes_and_candidacy(
        client: Client,
        new_associates: Coll<NewAssociate>,
        associates: Coll<Associate>,
        new_candidates: Coll<NewCandidate>,
        candidates: Coll<Candidate>,
        new_votes: Coll<NewVote>,
    ) {
        new_associates
            .insert_one(NewAssociate::example(), None)
            .await
            .unwrap();
        let associate = associates.find_one(None, None).await.unwrap().unwrap();
        new_candidates
            .insert_one(
                NewCandidate::nominate(&associate, CandidateProfile::example(), None),
                None,
            )
            .await
            .unwrap();
        let candidate = candidates.find_one(None, None).await.unwrap().unwrap();
        new_votes
            .insert_one(NewVote::cast(&associate, &candidate).unwrap(), None)
            .await
            .unwrap();

        let response = client.get("/associates/123456").dispatch().await;
        let status: Data<AssociateStatus> = response.into_json().await.unwrap();
        assert!(status.data.has_voted);
        assert!(status.data.is_candidate);
    }

    #[backend_test]
    async fn unknown_associate(client: Client) {
        let response = client.get("/associates/999999").dispatch().await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[backend_test(admin)]
    async fn create_then_duplicate(client: Client, associates: Coll<Associate>) {
        let response = client
            .post(uri!(create_associate))
            .header(ContentType::JSON)
            .body(json!(AssociateSpec::example()).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let created: Data<AssociateDescription> = response.into_json().await.unwrap();
        assert_eq!(created.data.name, "Ana Torres");

        let stored = associates
            .find_one(doc! { "national_id": "123456" }, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.id.to_string(), created.data.id);

        let response = client
            .post(uri!(create_associate))
            .header(ContentType::JSON)
            .body(json!(AssociateSpec::example()).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Conflict, response.status());
    }

    #[backend_test(admin)]
    async fn create_rejects_bad_national_id(client: Client) {
        let mut spec = json!(AssociateSpec::example());
        spec["national_id"] = json!("12a456");
        let response = client
            .post(uri!(create_associate))
            .header(ContentType::JSON)
            .body(spec.to_string())
            .dispatch()
            .await;
        assert_eq!(Status::BadRequest, response.status());
    }

    #[backend_test(admin)]
    async fn deactivate_and_reactivate(client: Client, new_associates: Coll<NewAssociate>) {
        new_associates
            .insert_one(NewAssociate::example(), None)
            .await
            .unwrap();

        let response = client
            .put("/associates/123456/active")
            .header(ContentType::JSON)
            .body(json!(ActiveUpdate { active: false }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let description: Data<AssociateDescription> = response.into_json().await.unwrap();
        assert!(!description.data.active);

        let response = client
            .put("/associates/123456/active")
            .header(ContentType::JSON)
            .body(json!(ActiveUpdate { active: true }).to_string())
            .dispatch()
            .await;
        let description: Data<AssociateDescription> = response.into_json().await.unwrap();
        assert!(description.data.active);

        let response = client
            .put("/associates/654321/active")
            .header(ContentType::JSON)
            .body(json!(ActiveUpdate { active: true }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[backend_test(admin)]
    async fn paginated_listing(client: Client, new_associates: Coll<NewAssociate>) {
        let batch: Vec<NewAssociate> = (0..5)
            .map(|i| NewAssociate::example_in(&format!("10000{i}"), Zone::Two))
            .collect();
        new_associates.insert_many(batch, None).await.unwrap();

        let response = client
            .get("/associates?page_num=2&page_size=2")
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let page: Data<Paginated<AssociateDescription>> = response.into_json().await.unwrap();
        assert_eq!(page.data.pagination.total, 5);
        let ids: Vec<&str> = page.data.items.iter().map(|a| &*a.national_id).collect();
        assert_eq!(ids, ["100002", "100003"]);

        let response = client.get("/associates?page_num=0").dispatch().await;
        assert_eq!(Status::BadRequest, response.status());
    }

    #[backend_test]
    async fn listing_needs_admin(client: Client) {
        let response = client.get("/associates").dispatch().await;
        assert_eq!(Status::Unauthorized, response.status());
    }
}
