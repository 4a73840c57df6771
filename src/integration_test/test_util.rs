use crate::app_env::test::TEST_DB_URL;
use crate::domain::session::SessionScheme;
use crate::{SharedData, db, persistence, routes};
use axum::Router;
use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use dotenv::dotenv;
use lazy_static::lazy_static;
use rand::{Rng, thread_rng};
use serde::de::DeserializeOwned;
use sqlx::{Connection, PgConnection, PgPool, Row};
use std::env;
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tower::ServiceExt;

lazy_static! {
    static ref TOKIO_RT: Runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Tokio runtime failed to initialize");
}

/// A throwaway database which only lives for the duration of one test
struct TestDatabase {
    db_name: String,
}

impl TestDatabase {
    async fn create(conn: &mut PgConnection) -> Result<Self, sqlx::Error> {
        let db_id: u32 = thread_rng().gen_range(10_000..99_999);
        let db_name = format!("test_db_{db_id}");

        sqlx::query(&format!("CREATE DATABASE {db_name}"))
            .execute(&mut *conn)
            .await?;

        Ok(TestDatabase { db_name })
    }

    async fn drop_db(&self, conn: &mut PgConnection) {
        let result = sqlx::query(&format!("DROP DATABASE IF EXISTS {} WITH (FORCE)", self.db_name))
            .execute(&mut *conn)
            .await;
        if let Err(error) = result {
            println!(
                "Warning: failed to drop test database {}, you may need to do it manually. Error: {error}",
                self.db_name
            );
        }
    }
}

/// Creates an empty, migrated database for a test and drops it once the test finishes.
///
/// Expects that the TEST_DB_URL environment variable holds a postgres connection string
/// without a database name in the path.
pub fn prepare_db_and_test<F, R>(test_fn: F)
where
    R: Future<Output = ()>,
    F: FnOnce(PgPool) -> R,
{
    if dotenv().is_err() {
        println!("Test is running without .env file.");
    }

    TOKIO_RT.block_on(async move {
        let base_url = env::var(TEST_DB_URL).unwrap_or_else(|_| {
            panic!("You must provide the {TEST_DB_URL} environment variable as the base postgres connection string")
        });
        let mut admin_conn = PgConnection::connect(&base_url)
            .await
            .expect("Test failure - could not create initial connection to provision database.");
        let test_db = TestDatabase::create(&mut admin_conn)
            .await
            .expect("Failed to create test database");

        let pool = db::connect_sqlx(&format!("{base_url}/{}", test_db.db_name))
            .expect("Failed to build pool for test database");
        db::migrate(&pool)
            .await
            .expect("Failed to migrate test database");

        test_fn(pool.clone()).await;

        pool.close().await;
        test_db.drop_db(&mut admin_conn).await;
        let _ = admin_conn.close().await;
    });
}

/// Builds the full application router against [db]
pub fn app(db: PgPool, sessions: SessionScheme) -> Router {
    routes::build_router(Arc::new(SharedData {
        ext_cxn: persistence::ExternalConnectivity::new(db),
        sessions,
    }))
}

/// Sends a single request through [app], optionally with a session cookie and a JSON body
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(COOKIE, format!("token={token}"));
    }
    let request = match body {
        Some(json) => request
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => request.body(Body::empty()),
    }
    .expect("test request should build");

    app.clone()
        .oneshot(request)
        .await
        .expect("the router never fails to produce a response")
}

/// Asserts on the status of [response] and parses its JSON body
pub async fn expect_json<T: DeserializeOwned>(response: Response, status: StatusCode) -> T {
    assert_eq!(status, response.status());

    crate::api::test_util::deserialize_body(response.into_body()).await
}

/// Pulls the session token out of a login response's Set-Cookie header
pub fn session_token(response: &Response) -> String {
    let header = response
        .headers()
        .get(SET_COOKIE)
        .expect("login should set a cookie")
        .to_str()
        .expect("cookie header should be text");
    let cookie = cookie::Cookie::parse(header).expect("cookie header should parse");

    cookie.value().to_owned()
}

/// Counts the rows of a table in the test database
pub async fn count_rows(db: &PgPool, table: &str) -> i64 {
    sqlx::query(&format!("SELECT count(*) FROM {table}"))
        .fetch_one(db)
        .await
        .expect("count query should succeed")
        .get::<i64, _>(0)
}
