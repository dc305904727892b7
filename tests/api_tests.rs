mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::json;

use cattlefund::entities::cattle::CattleStatus;
use cattlefund::entities::investment::InvestmentStatus;
use cattlefund::entities::project::{self, ProjectStatus};
use cattlefund::entities::{blog_post, contact, investment, order};
use cattlefund::funding;
use cattlefund::services::INVESTOR_ROLE;
use common::{seed_cattle, seed_investment, seed_post, seed_project, spawn_app, NOTIFY_INBOX};

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn openapi_document_lists_the_status_route() {
    let app = spawn_app().await;
    let (status, doc) = app.call(Method::GET, "/api-doc/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/admin/investments/{id}/status"].is_object());
    assert!(doc["components"]["securitySchemes"]["bearer"].is_object());
    // Documented under the same segment name the router uses
    assert!(doc["paths"]["/blog/{slug}/views"]["post"].is_object());
    assert!(doc["paths"]["/blog/{id}/views"].is_null());
}

#[tokio::test]
async fn project_views_increment_once_per_call() {
    let app = spawn_app().await;
    let p = seed_project(app.db(), "Viewed", ProjectStatus::Active).await;

    for _ in 0..2 {
        let (status, body) = app
            .call(Method::POST, &format!("/projects/{}/views", p.id), None, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }

    let stored = project::Entity::find_by_id(p.id).one(app.db()).await.unwrap().unwrap();
    assert_eq!(stored.view_count, 2);
}

#[tokio::test]
async fn blog_views_increment_and_unknown_ids_are_404() {
    let app = spawn_app().await;
    let post = seed_post(app.db(), "Feeding guide", "feeding-guide", true).await;

    app.call(Method::POST, &format!("/blog/{}/views", post.id), None, None).await;
    app.call(Method::POST, &format!("/blog/{}/views", post.id), None, None).await;
    let stored = blog_post::Entity::find_by_id(post.id).one(app.db()).await.unwrap().unwrap();
    assert_eq!(stored.view_count, 2);

    let (status, body) = app.call(Method::POST, "/blog/4242/views", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn contact_is_kept_when_notification_fails() {
    let app = spawn_app().await;
    app.mailer.fail();

    let (status, body) = app
        .call(
            Method::POST,
            "/contact",
            None,
            Some(json!({
                "name": "Rahim",
                "email": " Rahim@Example.com ",
                "subject": "Bull #4",
                "message": "Is it still available?"
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "new");
    assert_eq!(body["email"], "rahim@example.com");
    assert_eq!(contact::Entity::find().count(app.db()).await.unwrap(), 1);
}

#[tokio::test]
async fn contact_notifies_the_admin_inbox() {
    let app = spawn_app().await;
    app.call(
        Method::POST,
        "/contact",
        None,
        Some(json!({
            "name": "Rahim",
            "email": "rahim@example.com",
            "phone": "01700000000",
            "subject": "Visit",
            "message": "Can I visit the farm?"
        })),
    )
    .await;

    let sent = app.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, NOTIFY_INBOX);
    assert_eq!(sent[0].reply_to.as_deref(), Some("rahim@example.com"));
}

#[tokio::test]
async fn contact_requires_a_message() {
    let app = spawn_app().await;
    let (status, _) = app
        .call(
            Method::POST,
            "/contact",
            None,
            Some(json!({ "name": "Rahim", "email": "r@example.com", "subject": "Hi", "message": "  " })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(contact::Entity::find().count(app.db()).await.unwrap(), 0);
}

#[tokio::test]
async fn cattle_listing_filters_by_status_and_price() {
    let app = spawn_app().await;
    seed_cattle(app.db(), "Lal Bahadur", 150_000, CattleStatus::Available).await;
    seed_cattle(app.db(), "Kalo Manik", 90_000, CattleStatus::Available).await;
    seed_cattle(app.db(), "Sold One", 120_000, CattleStatus::Sold).await;

    let (_, all) = app.call(Method::GET, "/cattle", None, None).await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    let (_, cheap) = app.call(Method::GET, "/cattle?max_price=100000", None, None).await;
    let cheap = cheap.as_array().unwrap();
    assert_eq!(cheap.len(), 1);
    assert_eq!(cheap[0]["name"], "Kalo Manik");

    let (_, sold) = app.call(Method::GET, "/cattle?status=sold", None, None).await;
    assert_eq!(sold.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn related_cattle_excludes_the_current_listing() {
    let app = spawn_app().await;
    let first = seed_cattle(app.db(), "A", 100, CattleStatus::Available).await;
    for name in ["B", "C", "D", "E"] {
        seed_cattle(app.db(), name, 100, CattleStatus::Available).await;
    }

    let (status, related) = app
        .call(Method::GET, &format!("/cattle/{}/related", first.id), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let related = related.as_array().unwrap();
    assert_eq!(related.len(), 3);
    assert!(related.iter().all(|c| c["id"] != first.id));
}

#[tokio::test]
async fn placing_an_order_records_a_pending_order() {
    let app = spawn_app().await;
    let cow = seed_cattle(app.db(), "Shahi", 200_000, CattleStatus::Available).await;

    let (status, body) = app
        .call(
            Method::POST,
            &format!("/cattle/{}/orders", cow.id),
            None,
            Some(json!({
                "customer_name": "Jamal",
                "phone": "01900000000",
                "address": "Mirpur, Dhaka",
                "delivery_date": "2026-06-01"
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["payment_method"], "cash");
    assert_eq!(order::Entity::find().count(app.db()).await.unwrap(), 1);

    let (status, _) = app
        .call(
            Method::POST,
            "/cattle/999/orders",
            None,
            Some(json!({ "customer_name": "Jamal", "phone": "1", "address": "x" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn investments_need_an_active_project() {
    let app = spawn_app().await;
    let closed = seed_project(app.db(), "Closed", ProjectStatus::Completed).await;

    let (status, _) = app
        .call(
            Method::POST,
            "/investments",
            None,
            Some(json!({
                "project_id": closed.id,
                "investor_name": "Karim",
                "email": "karim@example.com",
                "phone": "01700000000",
                "amount": 10000,
                "investment_type": "6-months"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(investment::Entity::find().count(app.db()).await.unwrap(), 0);
}

#[tokio::test]
async fn submitted_investment_is_pending_and_not_counted() {
    let app = spawn_app().await;
    app.mailer.fail();
    let p = seed_project(app.db(), "Open", ProjectStatus::Active).await;

    let (status, body) = app
        .call(
            Method::POST,
            "/investments",
            None,
            Some(json!({
                "project_id": p.id,
                "investor_name": "Karim",
                "email": "karim@example.com",
                "phone": "01700000000",
                "amount": 10000,
                "investment_type": "one-time",
                "message": "Looking forward"
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "pending");
    assert!(body["investor_id"].is_null());
    let stored = project::Entity::find_by_id(p.id).one(app.db()).await.unwrap().unwrap();
    assert_eq!(stored.raised_amount, 0);
}

#[tokio::test]
async fn investor_token_links_the_submission() {
    let app = spawn_app().await;
    let p = seed_project(app.db(), "Linked", ProjectStatus::Active).await;

    let (status, profile) = app
        .call(
            Method::POST,
            "/auth/signup",
            None,
            Some(json!({
                "email": "Investor@Example.com",
                "password": "secret123",
                "investor_name": "Salma"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(profile["email"], "investor@example.com");

    let (status, login) = app
        .call(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "investor@example.com", "password": "secret123" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["role"], INVESTOR_ROLE);
    let token = login["access_token"].as_str().unwrap().to_string();

    let (status, body) = app
        .call(
            Method::POST,
            "/investments",
            Some(&token),
            Some(json!({
                "project_id": p.id,
                "investor_name": "Salma",
                "email": "investor@example.com",
                "phone": "01600000000",
                "amount": 2000,
                "investment_type": "monthly"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["investor_id"], profile["id"]);

    let (status, me) = app.call(Method::GET, "/investor/profile", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["investments"].as_array().unwrap().len(), 1);
    assert_eq!(me["investments"][0]["project_title"], "Linked");
    assert_eq!(me["total_invested"], 0);
}

#[tokio::test]
async fn invalid_bearer_token_is_rejected() {
    let app = spawn_app().await;
    let p = seed_project(app.db(), "Open", ProjectStatus::Active).await;
    let (status, _) = app
        .call(
            Method::POST,
            "/investments",
            Some("not-a-token"),
            Some(json!({
                "project_id": p.id,
                "investor_name": "Karim",
                "email": "karim@example.com",
                "phone": "01700000000",
                "amount": 10,
                "investment_type": "quarterly"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn signup_rejects_short_passwords_and_wrong_logins() {
    let app = spawn_app().await;
    let (status, _) = app
        .call(
            Method::POST,
            "/auth/signup",
            None,
            Some(json!({ "email": "a@example.com", "password": "12345", "investor_name": "A" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "nobody@example.com", "password": "whatever" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn password_change_checks_the_current_password() {
    let app = spawn_app().await;
    let (_, token) = app.auth.add_user("salma@example.com", "old-pass", Some(INVESTOR_ROLE));

    let (status, _) = app
        .call(
            Method::POST,
            "/auth/password",
            Some(&token),
            Some(json!({ "current_password": "wrong", "new_password": "new-pass" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.auth.password_of("salma@example.com").as_deref(), Some("old-pass"));

    let (status, _) = app
        .call(
            Method::POST,
            "/auth/password",
            Some(&token),
            Some(json!({ "current_password": "old-pass", "new_password": "new-pass" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.auth.password_of("salma@example.com").as_deref(), Some("new-pass"));
}

#[tokio::test]
async fn project_detail_lists_only_counted_investments() {
    let app = spawn_app().await;
    let p = seed_project(app.db(), "Detail", ProjectStatus::Active).await;
    seed_investment(app.db(), p.id, 100, InvestmentStatus::Approved).await;
    seed_investment(app.db(), p.id, 200, InvestmentStatus::Paid).await;
    seed_investment(app.db(), p.id, 300, InvestmentStatus::Pending).await;
    seed_investment(app.db(), p.id, 400, InvestmentStatus::Rejected).await;
    funding::recompute_raised_amount(app.db(), p.id).await.unwrap();

    let (status, body) = app.call(Method::GET, &format!("/projects/{}", p.id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["project"]["raised_amount"], 300);
    assert_eq!(body["investments"].as_array().unwrap().len(), 2);

    let (_, list) = app.call(Method::GET, "/projects", None, None).await;
    assert_eq!(list["total_raised"], 300);
}

#[tokio::test]
async fn blog_serves_published_posts_by_slug() {
    let app = spawn_app().await;
    seed_post(app.db(), "Published", "published", true).await;
    seed_post(app.db(), "Draft", "draft", false).await;

    let (_, list) = app.call(Method::GET, "/blog", None, None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, post) = app.call(Method::GET, "/blog/published", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(post["title"], "Published");

    let (status, _) = app.call(Method::GET, "/blog/draft", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stats_summarise_the_site() {
    let app = spawn_app().await;
    let p = seed_project(app.db(), "Stats", ProjectStatus::Active).await;
    seed_project(app.db(), "Done", ProjectStatus::Completed).await;
    seed_investment(app.db(), p.id, 700, InvestmentStatus::Approved).await;
    funding::recompute_raised_amount(app.db(), p.id).await.unwrap();
    seed_cattle(app.db(), "Featured", 1000, CattleStatus::Available).await;

    let (status, stats) = app.call(Method::GET, "/stats", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["active_projects"], 1);
    assert_eq!(stats["total_raised"], 700);
    assert_eq!(stats["featured_cattle"].as_array().unwrap().len(), 1);
    assert_eq!(stats["recent_investments"][0]["project_title"], "Stats");
}
