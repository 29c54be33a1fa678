//! Fixtures used by `#[backend_test]`.

use std::time::Duration;

use mongodb::{bson::doc, options::ClientOptions, Client, Database};
use rand::{distributions::Alphanumeric, Rng};
use rocket::{
    http::{ContentType, Status},
    local::asynchronous::Client as RocketClient,
    serde::json::serde_json::json,
};

use crate::model::{
    api::{admin::AdminCredentials, verification::VerifyRequest},
    common::national_id::NationalId,
    db::{admin::NewAdmin, associate::NewAssociate},
    mongodb::Coll,
};
use crate::notify::{
    recording::{Outbox, RecordingChannel},
    ChannelKind, Notifier,
};

const DEFAULT_TEST_DB_URI: &str = "mongodb://localhost:27017";

/// Connect to the test MongoDB server named by `TEST_DB_URI`.
///
/// Panics if the server cannot be reached, so database tests never pass
/// without running.
pub async fn db_client() -> Client {
    let uri = std::env::var("TEST_DB_URI").unwrap_or_else(|_| DEFAULT_TEST_DB_URI.to_string());
    let mut options = ClientOptions::parse(&uri)
        .await
        .unwrap_or_else(|e| panic!("invalid TEST_DB_URI '{uri}': {e}"));
    options.server_selection_timeout = Some(Duration::from_secs(5));
    let client = Client::with_options(options).unwrap();
    client
        .database("admin")
        .run_command(doc! { "ping": 1 }, None)
        .await
        .unwrap_or_else(|e| panic!("no MongoDB server reachable at {uri}: {e}"));
    client
}

/// A fresh database name per test, so tests can run in parallel.
pub fn database_name() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect();
    format!("test_{suffix}")
}

/// A tracked local client whose notifier records messages instead of
/// sending them.
pub async fn rocket_client(db_client: Client, db_name: &str) -> RocketClient {
    let outbox = Outbox::default();
    let notifier = Notifier::new(vec![
        Box::new(RecordingChannel::new(ChannelKind::Email, outbox.clone())),
        Box::new(RecordingChannel::new(ChannelKind::Sms, outbox.clone())),
    ]);
    let rocket = crate::rocket_for_db_and_notifier(db_client, db_name, notifier)
        .await
        .unwrap()
        .manage(outbox);
    RocketClient::tracked(rocket).await.unwrap()
}

/// Messages sent so far by the client's rocket.
pub fn outbox(client: &RocketClient) -> &Outbox {
    client.rocket().state::<Outbox>().unwrap()
}

pub async fn login_admin(client: &RocketClient, db: &Database) {
    Coll::<NewAdmin>::from_db(db)
        .insert_one(NewAdmin::example(), None)
        .await
        .unwrap();

    let response = client
        .post("/auth/admin")
        .header(ContentType::JSON)
        .body(json!(AdminCredentials::example()).to_string())
        .dispatch()
        .await;
    assert_eq!(Status::Ok, response.status());
}

/// Register [`NewAssociate::example`] and sign them in with a verification code.
pub async fn login_associate(client: &RocketClient, db: &Database) {
    let associate = NewAssociate::example();
    Coll::<NewAssociate>::from_db(db)
        .insert_one(&associate, None)
        .await
        .unwrap();
    verify_associate(client, &associate.national_id).await;
}

/// Request a code for an existing associate and submit it.
pub async fn verify_associate(client: &RocketClient, national_id: &NationalId) {
    let response = client
        .post("/verification/code")
        .header(ContentType::JSON)
        .body(json!({ "national_id": national_id }).to_string())
        .dispatch()
        .await;
    assert_eq!(Status::Ok, response.status());

    let code = outbox(client).last_code_for(national_id).unwrap();
    let request = VerifyRequest {
        national_id: national_id.clone(),
        code: code.to_string(),
    };
    let response = client
        .post("/verification/verify")
        .header(ContentType::JSON)
        .body(json!(request).to_string())
        .dispatch()
        .await;
    assert_eq!(Status::Ok, response.status());
}
