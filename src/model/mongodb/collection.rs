use std::ops::Deref;

use mongodb::{
    bson::doc, error::Error as DbError, options::IndexOptions, Collection, Database, IndexModel,
};
use rocket::{
    http::Status,
    request::{self, FromRequest, Request},
};

use crate::model::db::{
    admin::{Admin, NewAdmin},
    associate::{Associate, NewAssociate},
    candidate::{Candidate, NewCandidate},
    plancha::{NewPlancha, Plancha},
    vote::{NewVote, Vote},
};

/// A type that can be directly inserted/read to/from the database.
pub trait MongoCollection {
    /// The name of the collection.
    const NAME: &'static str;
}

/// A database collection of the given type.
pub struct Coll<T>(Collection<T>);

impl<T> Coll<T>
where
    T: MongoCollection,
{
    /// Get a handle on this collection in the given database.
    pub fn from_db(db: &Database) -> Self {
        Self(db.collection(T::NAME))
    }
}

// `Derive(Clone)` would only derive if `T: Clone`, but we don't need that bound.
impl<T> Clone for Coll<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Deref for Coll<T> {
    type Target = Collection<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[rocket::async_trait]
impl<'r, T> FromRequest<'r> for Coll<T>
where
    T: MongoCollection,
{
    type Error = ();

    /// Get the database connection from the managed state and wrap it in a collection.
    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        match req.rocket().state::<Database>() {
            Some(db) => request::Outcome::Success(Coll::from_db(db)),
            None => {
                error!("Database requested but not managed");
                request::Outcome::Error((Status::InternalServerError, ()))
            }
        }
    }
}

// Admin collections
const ADMINS: &str = "admins";
impl MongoCollection for Admin {
    const NAME: &'static str = ADMINS;
}
impl MongoCollection for NewAdmin {
    const NAME: &'static str = ADMINS;
}

// Associate collections
const ASSOCIATES: &str = "associates";
impl MongoCollection for Associate {
    const NAME: &'static str = ASSOCIATES;
}
impl MongoCollection for NewAssociate {
    const NAME: &'static str = ASSOCIATES;
}

// Candidate collections
const CANDIDATES: &str = "candidates";
impl MongoCollection for Candidate {
    const NAME: &'static str = CANDIDATES;
}
impl MongoCollection for NewCandidate {
    const NAME: &'static str = CANDIDATES;
}

// Vote collections
const VOTES: &str = "votes";
impl MongoCollection for Vote {
    const NAME: &'static str = VOTES;
}
impl MongoCollection for NewVote {
    const NAME: &'static str = VOTES;
}

// Plancha collections
const PLANCHAS: &str = "planchas";
impl MongoCollection for Plancha {
    const NAME: &'static str = PLANCHAS;
}
impl MongoCollection for NewPlancha {
    const NAME: &'static str = PLANCHAS;
}

/// Ensure that all the required indexes exist on the given database.
///
/// These unique indexes are what settles racing requests: the losing write
/// fails with a duplicate key error.
///
/// This operation is idempotent.
pub async fn ensure_indexes_exist(db: &Database) -> Result<(), DbError> {
    debug!("Ensuring collection indexes exist");

    let unique = IndexOptions::builder().unique(true).build();

    // One associate per national ID.
    let associate_index = IndexModel::builder()
        .keys(doc! {"national_id": 1})
        .options(unique.clone())
        .build();
    Coll::<Associate>::from_db(db)
        .create_index(associate_index, None)
        .await?;

    // One candidacy per associate.
    let candidate_index = IndexModel::builder()
        .keys(doc! {"associate_id": 1})
        .options(unique.clone())
        .build();
    Coll::<Candidate>::from_db(db)
        .create_index(candidate_index, None)
        .await?;

    // One vote per voter.
    let vote_index = IndexModel::builder()
        .keys(doc! {"voter_id": 1})
        .options(unique.clone())
        .build();
    Coll::<Vote>::from_db(db).create_index(vote_index, None).await?;

    // One application per leader and committee.
    let plancha_index = IndexModel::builder()
        .keys(doc! {"committee": 1, "leader_id": 1})
        .options(unique.clone())
        .build();
    Coll::<Plancha>::from_db(db)
        .create_index(plancha_index, None)
        .await?;

    // Admin collection.
    let admin_index = IndexModel::builder()
        .keys(doc! {"username": 1})
        .options(unique)
        .build();
    Coll::<Admin>::from_db(db)
        .create_index(admin_index, None)
        .await?;

    Ok(())
}
