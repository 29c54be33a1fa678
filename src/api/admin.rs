use mongodb::bson::doc;
use rocket::{futures::TryStreamExt, serde::json::Json, Route};

use crate::{
    error::{Error, Result},
    model::{
        api::{admin::AdminCredentials, auth::AuthToken, data, Data},
        db::admin::{Admin, NewAdmin, MIN_PASSWORD_LENGTH},
        mongodb::Coll,
    },
};

pub fn routes() -> Vec<Route> {
    routes![get_admins, create_admin]
}

#[get("/admins")]
async fn get_admins(
    _token: AuthToken<Admin>,
    admins: Coll<Admin>,
) -> Result<Json<Data<Vec<String>>>> {
    let admin_list: Vec<Admin> = admins.find(None, None).await?.try_collect().await?;
    let admin_names = admin_list
        .into_iter()
        .map(|admin| admin.admin.username)
        .collect();
    Ok(data(admin_names))
}

#[post("/admins", data = "<new_admin>", format = "json")]
async fn create_admin(
    _token: AuthToken<Admin>,
    new_admin: Json<AdminCredentials>,
    admins: Coll<NewAdmin>,
) -> Result<Json<Data<String>>> {
    // Check username uniqueness.
    let filter = doc! {
        "username": &new_admin.username,
    };
    if admins.find_one(filter, None).await?.is_some() {
        return Err(Error::conflict(format!(
            "Admin username already in use: {}",
            new_admin.username
        )));
    }

    // Create and insert the admin.
    let admin: NewAdmin = new_admin.0.try_into().map_err(|_| {
        Error::bad_request(format!(
            "Admin needs a username and a password of at least {MIN_PASSWORD_LENGTH} characters"
        ))
    })?;
    admins.insert_one(&admin, None).await.map_err(|e| {
        Error::or_conflict(e, || {
            Error::conflict(format!(
                "Admin username already in use: {}",
                admin.username
            ))
        })
    })?;
    info!("Created admin '{}'", admin.username);

    Ok(data(admin.username))
}
