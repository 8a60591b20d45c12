use actix_web::{http::StatusCode, test::TestRequest, web};
use marketplace_engine::{
    db_types::{AnalyticsEvent, Post},
    mkt_api::analytics_objects::{EventCount, NewAnalyticsEvent},
    AnalyticsApi,
    BlogApi,
};
use serde_json::json;

use super::{
    helpers::{active_accounts, admin_token, api_request, json_body, post_fixture, public_request, user_token},
    mocks::{MockAnalyticsManager, MockBlogManager},
};
use crate::routes::{
    AnalyticsSummaryRoute,
    CreatePostRoute,
    PublishedPostRoute,
    PublishedPostsRoute,
    RecordEventRoute,
};

fn stored_event(event: NewAnalyticsEvent) -> AnalyticsEvent {
    serde_json::from_value(json!({
        "id": 100,
        "name": event.name,
        "path": event.path,
        "user_id": event.user_id,
        "session_id": event.session_id,
        "ip_address": event.ip_address,
        "properties": event.properties,
        "created_at": "2024-04-02T10:00:00Z",
    }))
    .expect("Invalid event")
}

fn blog(db: MockBlogManager) -> web::Data<BlogApi<MockBlogManager>> {
    web::Data::new(BlogApi::new(db))
}

#[actix_web::test]
async fn published_post_by_slug() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBlogManager::new();
    db.expect_fetch_post_by_slug().returning(|slug, locale| {
        assert_eq!(locale, "zh-CN");
        Ok(Some(Post { locale: locale.to_string(), ..post_fixture(1, slug, true) }))
    });
    let req = TestRequest::get().uri("/posts/welcome?locale=zh-CN");
    let (status, body) = public_request(req, |cfg| {
        cfg.app_data(blog(db)).service(PublishedPostRoute::<MockBlogManager>::new());
    })
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let body = json_body(&body);
    assert_eq!(body["slug"], "welcome");
    assert_eq!(body["locale"], "zh-CN");
}

#[actix_web::test]
async fn draft_post_is_not_found() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBlogManager::new();
    db.expect_fetch_post_by_slug().returning(|slug, _| Ok(Some(post_fixture(1, slug, false))));
    let req = TestRequest::get().uri("/posts/welcome");
    let (status, _) = public_request(req, |cfg| {
        cfg.app_data(blog(db)).service(PublishedPostRoute::<MockBlogManager>::new());
    })
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn post_list_only_asks_for_published_posts() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBlogManager::new();
    db.expect_search_posts().returning(|filter, _| {
        assert!(filter.published_only);
        assert_eq!(filter.locale.as_deref(), Some("en"));
        Ok(vec![post_fixture(1, "welcome", true)])
    });
    let req = TestRequest::get().uri("/posts?locale=en");
    let (status, body) = public_request(req, |cfg| {
        cfg.app_data(blog(db)).service(PublishedPostsRoute::<MockBlogManager>::new());
    })
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json_body(&body).as_array().map(|a| a.len()), Some(1));
}

#[actix_web::test]
async fn admin_creates_post() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBlogManager::new();
    db.expect_insert_post().returning(|author_id, post| {
        assert_eq!(author_id, 1);
        assert_eq!(post.locale, "en");
        Ok(Post { slug: post.slug, title: post.title, ..post_fixture(3, "", post.published) })
    });
    let req = TestRequest::post()
        .uri("/api/admin/posts")
        .set_json(json!({"slug": "launch-day", "title": "We are live", "body": "Hello world", "published": true}));
    let (status, body) = api_request(req, Some(&admin_token(1)), active_accounts(), |cfg| {
        cfg.service(web::scope("/admin").app_data(blog(db)).service(CreatePostRoute::<MockBlogManager>::new()));
    })
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let body = json_body(&body);
    assert_eq!(body["slug"], "launch-day");
    assert_eq!(body["published"], true);
}

#[actix_web::test]
async fn bad_slug_is_rejected() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBlogManager::new();
    db.expect_insert_post().never();
    let req = TestRequest::post()
        .uri("/api/admin/posts")
        .set_json(json!({"slug": "Launch Day!", "title": "We are live", "body": "Hello world"}));
    let (status, _) = api_request(req, Some(&admin_token(1)), active_accounts(), |cfg| {
        cfg.service(web::scope("/admin").app_data(blog(db)).service(CreatePostRoute::<MockBlogManager>::new()));
    })
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn anonymous_event() {
    let _ = env_logger::try_init().ok();
    let mut db = MockAnalyticsManager::new();
    db.expect_insert_event().returning(|event| {
        assert_eq!(event.user_id, None);
        assert_eq!(event.properties, json!({}));
        assert_eq!(event.ip_address.as_deref(), Some("10.0.0.9"));
        Ok(stored_event(event))
    });
    let req = TestRequest::post()
        .uri("/events")
        .peer_addr("10.0.0.9:51234".parse().expect("bad address"))
        .set_json(json!({"name": "page_view", "path": "/products"}));
    let (status, body) = public_request(req, |cfg| {
        cfg.app_data(web::Data::new(AnalyticsApi::new(db))).service(RecordEventRoute::<MockAnalyticsManager>::new());
    })
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(json_body(&body)["name"], "page_view");
}

#[actix_web::test]
async fn event_is_attributed_to_token_holder() {
    let _ = env_logger::try_init().ok();
    let mut db = MockAnalyticsManager::new();
    db.expect_insert_event().returning(|event| {
        assert_eq!(event.user_id, Some(5));
        Ok(stored_event(event))
    });
    let req = TestRequest::post()
        .uri("/events")
        .insert_header(("Authorization", format!("Bearer {}", user_token(5))))
        .set_json(json!({"name": "product_view", "properties": {"product_id": 3}}));
    let (status, body) = public_request(req, |cfg| {
        cfg.app_data(web::Data::new(AnalyticsApi::new(db))).service(RecordEventRoute::<MockAnalyticsManager>::new());
    })
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(json_body(&body)["user_id"], 5);
}

#[actix_web::test]
async fn event_with_bad_token_is_anonymous() {
    let _ = env_logger::try_init().ok();
    let mut db = MockAnalyticsManager::new();
    db.expect_insert_event().returning(|event| {
        assert_eq!(event.user_id, None);
        Ok(stored_event(event))
    });
    let req = TestRequest::post()
        .uri("/events")
        .insert_header(("Authorization", "Bearer not.a.token"))
        .set_json(json!({"name": "page_view"}));
    let (status, _) = public_request(req, |cfg| {
        cfg.app_data(web::Data::new(AnalyticsApi::new(db))).service(RecordEventRoute::<MockAnalyticsManager>::new());
    })
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[actix_web::test]
async fn event_cannot_claim_a_user() {
    let _ = env_logger::try_init().ok();
    let mut db = MockAnalyticsManager::new();
    db.expect_insert_event().never();
    let req = TestRequest::post().uri("/events").set_json(json!({"name": "page_view", "user_id": 1}));
    let (status, _) = public_request(req, |cfg| {
        cfg.app_data(web::Data::new(AnalyticsApi::new(db))).service(RecordEventRoute::<MockAnalyticsManager>::new());
    })
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn event_properties_must_be_an_object() {
    let _ = env_logger::try_init().ok();
    let mut db = MockAnalyticsManager::new();
    db.expect_insert_event().never();
    let req = TestRequest::post().uri("/events").set_json(json!({"name": "page_view", "properties": [1, 2]}));
    let (status, _) = public_request(req, |cfg| {
        cfg.app_data(web::Data::new(AnalyticsApi::new(db))).service(RecordEventRoute::<MockAnalyticsManager>::new());
    })
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn analytics_summary_for_admins() {
    let _ = env_logger::try_init().ok();
    let mut db = MockAnalyticsManager::new();
    db.expect_event_counts().returning(|since, until| {
        assert!(since.is_some());
        assert!(until.is_none());
        Ok(vec![EventCount { name: "page_view".into(), count: 12 }])
    });
    let req = TestRequest::get().uri("/api/admin/analytics?since=2024-04-01T00:00:00Z");
    let (status, body) = api_request(req, Some(&admin_token(1)), active_accounts(), |cfg| {
        cfg.service(
            web::scope("/admin")
                .app_data(web::Data::new(AnalyticsApi::new(db)))
                .service(AnalyticsSummaryRoute::<MockAnalyticsManager>::new()),
        );
    })
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json_body(&body), json!([{"name": "page_view", "count": 12}]));
}

#[actix_web::test]
async fn analytics_summary_checks_the_range() {
    let _ = env_logger::try_init().ok();
    let mut db = MockAnalyticsManager::new();
    db.expect_event_counts().never();
    let req = TestRequest::get().uri("/api/admin/analytics?since=2024-05-01T00:00:00Z&until=2024-04-01T00:00:00Z");
    let (status, _) = api_request(req, Some(&admin_token(1)), active_accounts(), |cfg| {
        cfg.service(
            web::scope("/admin")
                .app_data(web::Data::new(AnalyticsApi::new(db)))
                .service(AnalyticsSummaryRoute::<MockAnalyticsManager>::new()),
        );
    })
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
