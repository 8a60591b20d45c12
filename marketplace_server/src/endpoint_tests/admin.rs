use actix_web::{http::StatusCode, test::TestRequest, web};
use marketplace_engine::{
    db_types::{OrderStatus, Product, ProductStatus, Role, UserWithRoles},
    events::EventProducers,
    mkt_api::stats_objects::{DashboardStats, StatusCount},
    AccountApi,
    AdminApi,
    CatalogApi,
    OrderFlowApi,
};
use serde_json::json;

use super::{
    helpers::{
        active_accounts,
        admin_token,
        api_request,
        json_body,
        order_fixture,
        product_fixture,
        user_fixture,
        user_token,
    },
    mocks::{MockAccountManager, MockAuthManager, MockCatalogManager, MockOrderManager, MockStatsManager},
};
use crate::routes::{
    AdminCancelOrderRoute,
    AdminCompleteOrderRoute,
    AdminStatsRoute,
    DisableUserRoute,
    ReviewProductRoute,
    ReviewQueueRoute,
    TakedownProductRoute,
    UpdateRolesRoute,
};

fn stats_backend() -> MockStatsManager {
    let mut db = MockStatsManager::new();
    db.expect_dashboard_stats().returning(|| {
        Ok(DashboardStats {
            total_users: 42,
            orders: vec![StatusCount { status: "completed".into(), count: 7 }],
            ..Default::default()
        })
    });
    db
}

#[actix_web::test]
async fn admin_sees_stats() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get().uri("/api/admin/stats");
    let (status, body) = api_request(req, Some(&admin_token(1)), active_accounts(), |cfg| {
        cfg.service(
            web::scope("/admin")
                .app_data(web::Data::new(AdminApi::new(stats_backend())))
                .service(AdminStatsRoute::<MockStatsManager>::new()),
        );
    })
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let body = json_body(&body);
    assert_eq!(body["total_users"], 42);
    assert_eq!(body["orders"][0]["count"], 7);
}

#[actix_web::test]
async fn users_cannot_reach_admin_routes() {
    let _ = env_logger::try_init().ok();
    let mut db = MockStatsManager::new();
    db.expect_dashboard_stats().never();
    let req = TestRequest::get().uri("/api/admin/stats");
    let (status, body) = api_request(req, Some(&user_token(5)), active_accounts(), |cfg| {
        cfg.service(
            web::scope("/admin")
                .app_data(web::Data::new(AdminApi::new(db)))
                .service(AdminStatsRoute::<MockStatsManager>::new()),
        );
    })
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(json_body(&body)["error"].is_string());
}

#[actix_web::test]
async fn anonymous_requests_to_admin_routes_are_unauthorized() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get().uri("/api/admin/stats");
    let (status, _) = api_request(req, None, active_accounts(), |cfg| {
        cfg.service(
            web::scope("/admin")
                .app_data(web::Data::new(AdminApi::new(stats_backend())))
                .service(AdminStatsRoute::<MockStatsManager>::new()),
        );
    })
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn user_role_cannot_be_revoked() {
    let _ = env_logger::try_init().ok();
    let mut auth = active_accounts();
    auth.expect_remove_roles().never();
    let req = TestRequest::post().uri("/api/admin/users/5/roles").set_json(json!({"revoke": ["user"]}));
    let (status, _) = api_request(req, Some(&admin_token(1)), auth, |cfg| {
        cfg.service(web::scope("/admin").service(UpdateRolesRoute::<MockAuthManager>::new()));
    })
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn admin_grants_roles() {
    let _ = env_logger::try_init().ok();
    let mut auth = active_accounts();
    auth.expect_assign_roles().returning(|user_id, roles| {
        assert_eq!(user_id, 5);
        assert_eq!(roles, &[Role::Admin]);
        Ok(())
    });
    auth.expect_remove_roles().never();
    auth.expect_fetch_roles_for_user().returning(|_| Ok(vec![Role::User, Role::Admin]));
    let req = TestRequest::post().uri("/api/admin/users/5/roles").set_json(json!({"apply": ["admin"]}));
    let (status, body) = api_request(req, Some(&admin_token(1)), auth, |cfg| {
        cfg.service(web::scope("/admin").service(UpdateRolesRoute::<MockAuthManager>::new()));
    })
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json_body(&body), json!({"user_id": 5, "roles": ["user", "admin"]}));
}

#[actix_web::test]
async fn admin_cannot_disable_themselves() {
    let _ = env_logger::try_init().ok();
    let mut db = MockAccountManager::new();
    db.expect_set_user_disabled().never();
    let req = TestRequest::post().uri("/api/admin/users/1/disable");
    let (status, _) = api_request(req, Some(&admin_token(1)), active_accounts(), |cfg| {
        cfg.service(
            web::scope("/admin")
                .app_data(web::Data::new(AccountApi::new(db)))
                .service(DisableUserRoute::<MockAccountManager>::new()),
        );
    })
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn admin_disables_a_user() {
    let _ = env_logger::try_init().ok();
    let mut db = MockAccountManager::new();
    db.expect_set_user_disabled().returning(|id, disabled| {
        let user = marketplace_engine::db_types::User { disabled, ..user_fixture(id) };
        Ok(Some(UserWithRoles::new(user, vec![Role::User])))
    });
    let req = TestRequest::post().uri("/api/admin/users/5/disable");
    let (status, body) = api_request(req, Some(&admin_token(1)), active_accounts(), |cfg| {
        cfg.service(
            web::scope("/admin")
                .app_data(web::Data::new(AccountApi::new(db)))
                .service(DisableUserRoute::<MockAccountManager>::new()),
        );
    })
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json_body(&body)["disabled"], true);
}

#[actix_web::test]
async fn review_queue_defaults_to_pending() {
    let _ = env_logger::try_init().ok();
    let mut db = MockCatalogManager::new();
    db.expect_fetch_products_by_status().returning(|statuses, _| {
        assert_eq!(statuses, &[ProductStatus::PendingReview]);
        Ok(vec![product_fixture(3, 5, ProductStatus::PendingReview)])
    });
    let req = TestRequest::get().uri("/api/admin/products");
    let (status, body) = api_request(req, Some(&admin_token(1)), active_accounts(), |cfg| {
        cfg.service(
            web::scope("/admin")
                .app_data(web::Data::new(CatalogApi::new(db, EventProducers::default())))
                .service(ReviewQueueRoute::<MockCatalogManager>::new()),
        );
    })
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json_body(&body)[0]["status"], "pending_review");
}

fn pending_listing() -> MockCatalogManager {
    let mut db = MockCatalogManager::new();
    db.expect_fetch_product().returning(|id| Ok(Some(product_fixture(id, 5, ProductStatus::PendingReview))));
    db.expect_transition_product().returning(|id, transition| {
        Ok(Some(Product {
            status: transition.to,
            review_note: transition.review_note,
            reviewed_by: transition.reviewer_id,
            ..product_fixture(id, 5, ProductStatus::PendingReview)
        }))
    });
    db
}

#[actix_web::test]
async fn rejection_requires_a_note() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/api/admin/products/3/review").set_json(json!({"approve": false}));
    let (status, body) = api_request(req, Some(&admin_token(1)), active_accounts(), |cfg| {
        cfg.service(
            web::scope("/admin")
                .app_data(web::Data::new(CatalogApi::new(pending_listing(), EventProducers::default())))
                .service(ReviewProductRoute::<MockCatalogManager>::new()),
        );
    })
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("note"), "{body}");
}

#[actix_web::test]
async fn rejection_with_note() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post()
        .uri("/api/admin/products/3/review")
        .set_json(json!({"approve": false, "note": "Preview is missing"}));
    let (status, body) = api_request(req, Some(&admin_token(1)), active_accounts(), |cfg| {
        cfg.service(
            web::scope("/admin")
                .app_data(web::Data::new(CatalogApi::new(pending_listing(), EventProducers::default())))
                .service(ReviewProductRoute::<MockCatalogManager>::new()),
        );
    })
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let body = json_body(&body);
    assert_eq!(body["status"], "rejected");
    assert_eq!(body["review_note"], "Preview is missing");
    assert_eq!(body["reviewed_by"], 1);
}

#[actix_web::test]
async fn takedown_without_body() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/api/admin/products/3/takedown");
    let (status, body) = api_request(req, Some(&admin_token(1)), active_accounts(), |cfg| {
        cfg.service(
            web::scope("/admin")
                .app_data(web::Data::new(CatalogApi::new(pending_listing(), EventProducers::default())))
                .service(TakedownProductRoute::<MockCatalogManager>::new()),
        );
    })
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json_body(&body)["status"], "off_shelf");
}

#[actix_web::test]
async fn admin_cancels_confirmed_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_fetch_order().returning(|id| Ok(Some(order_fixture(id, 5, 6, OrderStatus::Confirmed))));
    db.expect_transition_order().returning(|id, transition| {
        assert!(transition.from.contains(&OrderStatus::Confirmed));
        assert_eq!(transition.actor_id, Some(1));
        let mut order = order_fixture(id, 5, 6, OrderStatus::Cancelled);
        order.cancel_reason = transition.cancel_reason;
        Ok(Some(order))
    });
    let req = TestRequest::post().uri("/api/admin/orders/12/cancel").set_json(json!({"reason": "fraud"}));
    let (status, body) = api_request(req, Some(&admin_token(1)), active_accounts(), |cfg| {
        cfg.service(
            web::scope("/admin")
                .app_data(web::Data::new(OrderFlowApi::new(db, EventProducers::default())))
                .service(AdminCancelOrderRoute::<MockOrderManager>::new()),
        );
    })
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json_body(&body)["cancel_reason"], "fraud");
}

#[actix_web::test]
async fn admin_completes_stuck_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_fetch_order().returning(|id| Ok(Some(order_fixture(id, 5, 6, OrderStatus::Confirmed))));
    db.expect_transition_order().times(1).returning(|id, transition| {
        assert_eq!(transition.to, OrderStatus::Completed);
        Ok(Some(order_fixture(id, 5, 6, OrderStatus::Completed)))
    });
    let req = TestRequest::post().uri("/api/admin/orders/12/complete");
    let (status, body) = api_request(req, Some(&admin_token(1)), active_accounts(), |cfg| {
        cfg.service(
            web::scope("/admin")
                .app_data(web::Data::new(OrderFlowApi::new(db, EventProducers::default())))
                .service(AdminCompleteOrderRoute::<MockOrderManager>::new()),
        );
    })
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json_body(&body)["status"], "completed");
}
