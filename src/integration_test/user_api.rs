use super::test_util::{self, count_rows, expect_json, send, session_token};
use crate::domain::session::{SessionScheme, test_util::signed_scheme};
use crate::dto::MessageResponse;
use axum::http::{Method, StatusCode};
use serde_json::json;

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn registering_twice_keeps_one_user() {
    test_util::prepare_db_and_test(|db| async move {
        let app = test_util::app(db.clone(), SessionScheme::Legacy);
        let alice = json!({"username": "alice", "password": "pw1"});

        let first = send(&app, Method::POST, "/register", None, Some(alice.clone())).await;
        let first: MessageResponse = expect_json(first, StatusCode::OK).await;
        assert_eq!(MessageResponse::new("USER ADDED"), first);

        let second = send(&app, Method::POST, "/register", None, Some(alice)).await;
        let second: MessageResponse = expect_json(second, StatusCode::OK).await;
        assert_eq!(MessageResponse::new("USER ALREADY EXISTS"), second);

        assert_eq!(1, count_rows(&db, "\"user\"").await);
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn stores_password_hashes_only() {
    test_util::prepare_db_and_test(|db| async move {
        let app = test_util::app(db.clone(), SessionScheme::Legacy);
        let body = json!({"username": "alice", "password": "pw1"});
        send(&app, Method::POST, "/register", None, Some(body)).await;

        let stored: String = sqlx::query_scalar(r#"SELECT password FROM "user" WHERE username = 'alice'"#)
            .fetch_one(&db)
            .await
            .expect("alice should be stored");
        assert_ne!("pw1", stored);
        assert!(stored.starts_with("$argon2"));
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn bad_registration_bodies_are_rejected() {
    test_util::prepare_db_and_test(|db| async move {
        let app = test_util::app(db.clone(), SessionScheme::Legacy);

        let empty = send(&app, Method::POST, "/register", None, Some(json!({}))).await;
        assert_eq!(StatusCode::BAD_REQUEST, empty.status());

        let missing_password =
            send(&app, Method::POST, "/register", None, Some(json!({"username": "alice"}))).await;
        assert_eq!(StatusCode::UNPROCESSABLE_ENTITY, missing_password.status());

        let not_cookie_safe = json!({"username": "a;b", "password": "pw1"});
        let not_cookie_safe =
            send(&app, Method::POST, "/register", None, Some(not_cookie_safe)).await;
        assert_eq!(StatusCode::UNPROCESSABLE_ENTITY, not_cookie_safe.status());

        assert_eq!(0, count_rows(&db, "\"user\"").await);
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn legacy_login_accepts_any_password() {
    test_util::prepare_db_and_test(|db| async move {
        let app = test_util::app(db, SessionScheme::Legacy);
        let register = json!({"username": "alice", "password": "pw1"});
        send(&app, Method::POST, "/register", None, Some(register)).await;

        let login = json!({"username": "alice", "password": "anything"});
        let response = send(&app, Method::POST, "/login", None, Some(login)).await;
        assert_eq!("alice", session_token(&response));

        let body: MessageResponse = expect_json(response, StatusCode::OK).await;
        assert_eq!(MessageResponse::new("You are LOGGED IN as alice"), body);

        let long_password: String = (0..200).map(|_| 'p').collect();
        for password in [String::new(), long_password] {
            let login = json!({"username": "alice", "password": password});
            let response = send(&app, Method::POST, "/login", None, Some(login)).await;
            assert_eq!(StatusCode::OK, response.status());
            assert_eq!("alice", session_token(&response));
        }
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn signed_login_checks_the_password() {
    test_util::prepare_db_and_test(|db| async move {
        let app = test_util::app(db, signed_scheme());
        let register = json!({"username": "alice", "password": "pw1"});
        send(&app, Method::POST, "/register", None, Some(register)).await;

        let wrong = json!({"username": "alice", "password": "pw2"});
        let rejected = send(&app, Method::POST, "/login", None, Some(wrong)).await;
        assert_eq!(StatusCode::UNAUTHORIZED, rejected.status());

        let right = json!({"username": "alice", "password": "pw1"});
        let accepted = send(&app, Method::POST, "/login", None, Some(right)).await;
        assert_eq!(StatusCode::OK, accepted.status());
        let token = session_token(&accepted);
        assert_ne!("alice", token);

        let users = send(&app, Method::GET, "/users", Some(&token), None).await;
        let users: serde_json::Value = expect_json(users, StatusCode::OK).await;
        assert_eq!(json!({"users": [{"username": "alice"}]}), users);

        let forged = send(&app, Method::GET, "/users", Some("alice"), None).await;
        assert_eq!(StatusCode::FORBIDDEN, forged.status());
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn unknown_user_cannot_log_in() {
    test_util::prepare_db_and_test(|db| async move {
        for sessions in [SessionScheme::Legacy, signed_scheme()] {
            let app = test_util::app(db.clone(), sessions);
            let login = json!({"username": "nobody", "password": "pw1"});

            let response = send(&app, Method::POST, "/login", None, Some(login)).await;
            assert_eq!(StatusCode::UNAUTHORIZED, response.status());
        }
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn user_list_requires_login() {
    test_util::prepare_db_and_test(|db| async move {
        let app = test_util::app(db, SessionScheme::Legacy);
        let register = json!({"username": "alice", "password": "pw1"});
        send(&app, Method::POST, "/register", None, Some(register)).await;

        let anonymous = send(&app, Method::GET, "/users", None, None).await;
        assert_eq!(StatusCode::FORBIDDEN, anonymous.status());

        let ghost = send(&app, Method::GET, "/users", Some("ghost"), None).await;
        assert_eq!(StatusCode::FORBIDDEN, ghost.status());

        let alice = send(&app, Method::GET, "/users", Some("alice"), None).await;
        assert_eq!(StatusCode::OK, alice.status());

        let logged_out = send(&app, Method::GET, "/logout", None, None).await;
        assert_eq!("None", session_token(&logged_out));
        let after_logout = send(&app, Method::GET, "/users", Some("None"), None).await;
        assert_eq!(StatusCode::FORBIDDEN, after_logout.status());
    });
}
