//! HTTP-level tests for dashboard management and public access.

mod common;

use axum::http::StatusCode;
use common::{build_test_app, get_auth, ok_json, post_json, post_json_auth, sign_up, Account};
use dashhub_db::repositories::DashboardRepo;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn create_dashboard(app: &axum::Router, account: &Account, name: &str) -> i64 {
    let json = ok_json(
        post_json_auth(
            app,
            "/dashboards/create-dashboard",
            &account.token,
            serde_json::json!({ "name": name }),
        )
        .await,
    )
    .await;
    assert_eq!(json, serde_json::json!({ "success": true }));
    dashboard_id_by_name(app, account, name).await
}

async fn dashboard_id_by_name(app: &axum::Router, account: &Account, name: &str) -> i64 {
    let list = ok_json(get_auth(app, "/dashboards/dashboards", &account.token).await).await;
    list["dashboards"]
        .as_array()
        .unwrap()
        .iter()
        .find(|d| d["name"] == name)
        .and_then(|d| d["id"].as_i64())
        .unwrap()
}

async fn views(pool: &PgPool, id: i64) -> i64 {
    DashboardRepo::find_by_id(pool, id).await.unwrap().unwrap().views
}

// ---------------------------------------------------------------------------
// Owner CRUD
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn register_login_create_and_list(pool: PgPool) {
    let app = build_test_app(pool);
    let maria = sign_up(&app.router, "maria").await;

    let id = create_dashboard(&app.router, &maria, "Plant floor").await;

    let list = ok_json(get_auth(&app.router, "/dashboards/dashboards", &maria.token).await).await;
    assert_eq!(list["success"], true);
    assert_eq!(
        list["dashboards"],
        serde_json::json!([{ "id": id, "name": "Plant floor", "views": 0 }])
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn new_dashboard_is_empty(pool: PgPool) {
    let app = build_test_app(pool);
    let maria = sign_up(&app.router, "maria").await;
    let id = create_dashboard(&app.router, &maria, "Empty").await;

    let json = ok_json(
        get_auth(&app.router, &format!("/dashboards/dashboard?id={id}"), &maria.token).await,
    )
    .await;

    assert_eq!(
        json["dashboard"],
        serde_json::json!({ "id": id, "name": "Empty", "layout": [], "items": {}, "nextId": 1 })
    );
    assert_eq!(json["sources"], serde_json::json!([]));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn duplicate_names_conflict_per_owner_only(pool: PgPool) {
    let app = build_test_app(pool);
    let maria = sign_up(&app.router, "maria").await;
    let jonas = sign_up(&app.router, "jonas").await;
    create_dashboard(&app.router, &maria, "Ops").await;

    let json = ok_json(
        post_json_auth(
            &app.router,
            "/dashboards/create-dashboard",
            &maria.token,
            serde_json::json!({ "name": "Ops" }),
        )
        .await,
    )
    .await;
    assert_eq!(json["status"], 409);
    assert_eq!(json["message"], "A dashboard with that name already exists.");

    // Same name under another owner is fine.
    create_dashboard(&app.router, &jonas, "Ops").await;
}

#[sqlx::test(migrations = "../db/migrations")]
async fn save_then_fetch_round_trip(pool: PgPool) {
    let app = build_test_app(pool);
    let maria = sign_up(&app.router, "maria").await;
    let id = create_dashboard(&app.router, &maria, "Line 3").await;

    let layout = serde_json::json!([{ "i": "1", "x": 0, "y": 0, "w": 4, "h": 3 }]);
    let items = serde_json::json!({ "1": { "type": "gauge", "source": "broker" } });
    let json = ok_json(
        post_json_auth(
            &app.router,
            "/dashboards/save-dashboard",
            &maria.token,
            serde_json::json!({ "id": id, "layout": layout, "items": items, "nextId": 2 }),
        )
        .await,
    )
    .await;
    assert_eq!(json, serde_json::json!({ "success": true }));

    let json = ok_json(
        get_auth(&app.router, &format!("/dashboards/dashboard?id={id}"), &maria.token).await,
    )
    .await;
    assert_eq!(json["dashboard"]["layout"], layout);
    assert_eq!(json["dashboard"]["items"], items);
    assert_eq!(json["dashboard"]["nextId"], 2);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn other_users_dashboards_are_not_found(pool: PgPool) {
    let app = build_test_app(pool);
    let maria = sign_up(&app.router, "maria").await;
    let jonas = sign_up(&app.router, "jonas").await;
    let id = create_dashboard(&app.router, &maria, "Private").await;

    let json = ok_json(
        get_auth(&app.router, &format!("/dashboards/dashboard?id={id}"), &jonas.token).await,
    )
    .await;
    assert_eq!(json["status"], 409);
    assert_eq!(json["message"], "The selected dashboard has not been found.");

    let json = ok_json(
        post_json_auth(
            &app.router,
            "/dashboards/delete-dashboard",
            &jonas.token,
            serde_json::json!({ "id": id }),
        )
        .await,
    )
    .await;
    assert_eq!(json["status"], 409);

    let json = ok_json(
        post_json_auth(
            &app.router,
            "/dashboards/delete-dashboard",
            &maria.token,
            serde_json::json!({ "id": id }),
        )
        .await,
    )
    .await;
    assert_eq!(json["success"], true);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn clone_copies_content_under_new_name(pool: PgPool) {
    let app = build_test_app(pool);
    let maria = sign_up(&app.router, "maria").await;
    let id = create_dashboard(&app.router, &maria, "Original").await;
    post_json_auth(
        &app.router,
        "/dashboards/save-dashboard",
        &maria.token,
        serde_json::json!({ "id": id, "layout": [{ "i": "7" }], "items": { "7": {} }, "nextId": 8 }),
    )
    .await;

    let json = ok_json(
        post_json_auth(
            &app.router,
            "/dashboards/clone-dashboard",
            &maria.token,
            serde_json::json!({ "dashboardId": id, "name": "Original" }),
        )
        .await,
    )
    .await;
    assert_eq!(json["status"], 409);

    let json = ok_json(
        post_json_auth(
            &app.router,
            "/dashboards/clone-dashboard",
            &maria.token,
            serde_json::json!({ "dashboardId": id, "name": "Copy" }),
        )
        .await,
    )
    .await;
    assert_eq!(json["success"], true);

    let copy_id = dashboard_id_by_name(&app.router, &maria, "Copy").await;
    let json = ok_json(
        get_auth(&app.router, &format!("/dashboards/dashboard?id={copy_id}"), &maria.token).await,
    )
    .await;
    assert_eq!(json["dashboard"]["layout"], serde_json::json!([{ "i": "7" }]));
    assert_eq!(json["dashboard"]["nextId"], 8);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn rename_excludes_self_from_uniqueness(pool: PgPool) {
    let app = build_test_app(pool);
    let maria = sign_up(&app.router, "maria").await;
    let a = create_dashboard(&app.router, &maria, "A").await;
    create_dashboard(&app.router, &maria, "B").await;

    let rename = |name: &'static str| {
        post_json_auth(
            &app.router,
            "/dashboards/rename-dashboard",
            &maria.token,
            serde_json::json!({ "id": a, "name": name }),
        )
    };

    assert_eq!(ok_json(rename("B").await).await["status"], 409);
    assert_eq!(ok_json(rename("A").await).await["success"], true);
    assert_eq!(ok_json(rename("C").await).await["success"], true);
}

// ---------------------------------------------------------------------------
// Sharing and public access
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn unshared_dashboard_is_hidden_from_visitors(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let maria = sign_up(&app.router, "maria").await;
    let jonas = sign_up(&app.router, "jonas").await;
    let id = create_dashboard(&app.router, &maria, "Private").await;

    let anonymous = ok_json(
        post_json(
            &app.router,
            "/dashboards/check-password-needed",
            serde_json::json!({ "dashboardId": id }),
        )
        .await,
    )
    .await;
    let other_user = ok_json(
        post_json_auth(
            &app.router,
            "/dashboards/check-password-needed",
            &jonas.token,
            serde_json::json!({ "dashboardId": id }),
        )
        .await,
    )
    .await;

    let expected = serde_json::json!({ "success": true, "owner": "", "shared": false });
    assert_eq!(anonymous, expected);
    assert_eq!(other_user, expected);
    assert_eq!(views(&pool, id).await, 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn owner_always_sees_content(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let maria = sign_up(&app.router, "maria").await;
    let id = create_dashboard(&app.router, &maria, "Mine").await;

    let json = ok_json(
        post_json_auth(
            &app.router,
            "/dashboards/check-password-needed",
            &maria.token,
            serde_json::json!({ "dashboardId": id }),
        )
        .await,
    )
    .await;

    assert_eq!(json["owner"], "self");
    assert_eq!(json["shared"], false);
    assert_eq!(json["hasPassword"], false);
    assert_eq!(
        json["dashboard"],
        serde_json::json!({ "name": "Mine", "layout": [], "items": {} })
    );
    assert_eq!(views(&pool, id).await, 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn shared_dashboard_without_password_is_public(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let maria = sign_up(&app.router, "maria").await;
    let id = create_dashboard(&app.router, &maria, "Lobby").await;

    let json = ok_json(
        post_json_auth(
            &app.router,
            "/dashboards/share-dashboard",
            &maria.token,
            serde_json::json!({ "dashboardId": id }),
        )
        .await,
    )
    .await;
    assert_eq!(json, serde_json::json!({ "success": true, "shared": true }));

    let json = ok_json(
        post_json(
            &app.router,
            "/dashboards/check-password-needed",
            serde_json::json!({ "dashboardId": id }),
        )
        .await,
    )
    .await;
    assert_eq!(json["owner"], maria.id);
    assert_eq!(json["shared"], true);
    assert_eq!(json["passwordNeeded"], false);
    assert_eq!(json["dashboard"]["name"], "Lobby");
    assert_eq!(views(&pool, id).await, 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn password_protected_dashboard_counts_only_correct_attempts(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let maria = sign_up(&app.router, "maria").await;
    let id = create_dashboard(&app.router, &maria, "Board room").await;

    post_json_auth(
        &app.router,
        "/dashboards/share-dashboard",
        &maria.token,
        serde_json::json!({ "dashboardId": id }),
    )
    .await;
    let json = ok_json(
        post_json_auth(
            &app.router,
            "/dashboards/change-password",
            &maria.token,
            serde_json::json!({ "dashboardId": id, "password": "open-sesame" }),
        )
        .await,
    )
    .await;
    assert_eq!(json, serde_json::json!({ "success": true }));

    let json = ok_json(
        post_json(
            &app.router,
            "/dashboards/check-password-needed",
            serde_json::json!({ "dashboardId": id }),
        )
        .await,
    )
    .await;
    assert_eq!(
        json,
        serde_json::json!({ "success": true, "owner": "", "shared": true, "passwordNeeded": true })
    );

    for wrong in [serde_json::json!("nope"), serde_json::json!(null)] {
        let json = ok_json(
            post_json(
                &app.router,
                "/dashboards/check-password",
                serde_json::json!({ "dashboardId": id, "password": wrong }),
            )
            .await,
        )
        .await;
        assert_eq!(json, serde_json::json!({ "success": true, "correctPassword": false }));
    }
    assert_eq!(views(&pool, id).await, 0);

    for expected_views in [1, 2] {
        let json = ok_json(
            post_json(
                &app.router,
                "/dashboards/check-password",
                serde_json::json!({ "dashboardId": id, "password": "open-sesame" }),
            )
            .await,
        )
        .await;
        assert_eq!(json["correctPassword"], true);
        assert_eq!(json["owner"], maria.id);
        assert_eq!(json["dashboard"]["name"], "Board room");
        assert_eq!(views(&pool, id).await, expected_views);
    }
}

#[sqlx::test(migrations = "../db/migrations")]
async fn dashboard_password_is_matched_exactly_as_set(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let maria = sign_up(&app.router, "maria").await;
    let id = create_dashboard(&app.router, &maria, "Vault").await;

    post_json_auth(
        &app.router,
        "/dashboards/share-dashboard",
        &maria.token,
        serde_json::json!({ "dashboardId": id }),
    )
    .await;
    post_json_auth(
        &app.router,
        "/dashboards/change-password",
        &maria.token,
        serde_json::json!({ "dashboardId": id, "password": " open sesame " }),
    )
    .await;

    let json = ok_json(
        post_json(
            &app.router,
            "/dashboards/check-password",
            serde_json::json!({ "dashboardId": id, "password": " open sesame " }),
        )
        .await,
    )
    .await;
    assert_eq!(json["correctPassword"], true);
    assert_eq!(views(&pool, id).await, 1);

    let json = ok_json(
        post_json(
            &app.router,
            "/dashboards/check-password",
            serde_json::json!({ "dashboardId": id, "password": "open sesame" }),
        )
        .await,
    )
    .await;
    assert_eq!(json, serde_json::json!({ "success": true, "correctPassword": false }));
    assert_eq!(views(&pool, id).await, 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn check_password_on_unshared_dashboard_reveals_nothing(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let maria = sign_up(&app.router, "maria").await;
    let id = create_dashboard(&app.router, &maria, "Private").await;
    post_json_auth(
        &app.router,
        "/dashboards/change-password",
        &maria.token,
        serde_json::json!({ "dashboardId": id, "password": "open-sesame" }),
    )
    .await;

    let json = ok_json(
        post_json(
            &app.router,
            "/dashboards/check-password",
            serde_json::json!({ "dashboardId": id, "password": "open-sesame" }),
        )
        .await,
    )
    .await;
    assert_eq!(json, serde_json::json!({ "success": true, "owner": "", "shared": false }));
    assert_eq!(views(&pool, id).await, 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn blank_password_removes_protection(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let maria = sign_up(&app.router, "maria").await;
    let id = create_dashboard(&app.router, &maria, "Lobby").await;

    post_json_auth(
        &app.router,
        "/dashboards/change-password",
        &maria.token,
        serde_json::json!({ "dashboardId": id, "password": "open-sesame" }),
    )
    .await;
    assert!(DashboardRepo::find_by_id(&pool, id).await.unwrap().unwrap().has_password());

    post_json_auth(
        &app.router,
        "/dashboards/change-password",
        &maria.token,
        serde_json::json!({ "dashboardId": id, "password": "  " }),
    )
    .await;
    assert!(!DashboardRepo::find_by_id(&pool, id).await.unwrap().unwrap().has_password());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unknown_dashboard_is_domain_error(pool: PgPool) {
    let app = build_test_app(pool);

    let json = ok_json(
        post_json(
            &app.router,
            "/dashboards/check-password-needed",
            serde_json::json!({ "dashboardId": 999_999 }),
        )
        .await,
    )
    .await;
    assert_eq!(json["status"], 409);
    assert_eq!(json["message"], "The specified dashboard has not been found.");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn owner_routes_require_token(pool: PgPool) {
    let app = build_test_app(pool);

    let response = common::get(&app.router, "/dashboards/dashboards").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_json(
        &app.router,
        "/dashboards/create-dashboard",
        serde_json::json!({ "name": "x" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
