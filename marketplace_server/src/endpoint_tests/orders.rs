use actix_web::{http::StatusCode, test::TestRequest, web};
use marketplace_engine::{
    db_types::{DeliveryRecord, DeliveryType, Order, OrderStatus},
    events::EventProducers,
    mkt_api::order_objects::NewOrderResult,
    traits::OrderFlowError,
    OrderFlowApi,
};
use serde_json::json;

use super::{
    helpers::{active_accounts, admin_token, api_request, json_body, order_fixture, user_token},
    mocks::MockOrderManager,
};
use crate::routes::{
    CancelOrderRoute,
    ConfirmPaymentRoute,
    CreateOrderRoute,
    MyPurchasesRoute,
    OrderByIdRoute,
    OrderDeliveryRoute,
    ReportPaymentRoute,
};

const BUYER: i64 = 5;
const SELLER: i64 = 6;

fn orders(db: MockOrderManager) -> web::Data<OrderFlowApi<MockOrderManager>> {
    web::Data::new(OrderFlowApi::new(db, EventProducers::default()))
}

/// A backend holding a single order, #12, in the given state. Transitions are applied if the order is in one of the
/// allowed states.
fn single_order(status: OrderStatus) -> MockOrderManager {
    let mut db = MockOrderManager::new();
    db.expect_fetch_order().returning(move |id| Ok((id == 12).then(|| order_fixture(12, BUYER, SELLER, status))));
    db.expect_transition_order().returning(move |id, transition| {
        let order = order_fixture(id, BUYER, SELLER, status);
        if !transition.from.contains(&order.status) {
            return Ok(None);
        }
        Ok(Some(Order {
            status: transition.to,
            cancel_reason: transition.cancel_reason,
            payment_tx_hash: transition.payment.map(|p| p.tx_hash).or(order.payment_tx_hash.clone()),
            ..order
        }))
    });
    db
}

#[actix_web::test]
async fn new_order_is_created() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_insert_order_for_product().returning(|buyer, product| {
        assert_eq!(product, 1);
        Ok(NewOrderResult::new(order_fixture(12, buyer, SELLER, OrderStatus::Created), true))
    });
    let req = TestRequest::post().uri("/api/orders").set_json(json!({"product_id": 1}));
    let (status, body) = api_request(req, Some(&user_token(BUYER)), active_accounts(), |cfg| {
        cfg.app_data(orders(db)).service(CreateOrderRoute::<MockOrderManager>::new());
    })
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let body = json_body(&body);
    assert_eq!(body["created"], true);
    assert_eq!(body["order"]["status"], "created");
    assert_eq!(body["order"]["buyer_id"], BUYER);
    assert_eq!(body["order"]["pay_to_address"], format!("0x{SELLER:040x}"));
}

#[actix_web::test]
async fn repeated_order_returns_the_open_one() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_insert_order_for_product()
        .returning(|buyer, _| Ok(NewOrderResult::new(order_fixture(12, buyer, SELLER, OrderStatus::Created), false)));
    let req = TestRequest::post().uri("/api/orders").set_json(json!({"product_id": 1}));
    let (status, body) = api_request(req, Some(&user_token(BUYER)), active_accounts(), |cfg| {
        cfg.app_data(orders(db)).service(CreateOrderRoute::<MockOrderManager>::new());
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["order"]["id"], 12);
}

#[actix_web::test]
async fn buying_own_product_is_refused() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_insert_order_for_product().returning(|_, _| Err(OrderFlowError::CannotBuyOwnProduct));
    let req = TestRequest::post().uri("/api/orders").set_json(json!({"product_id": 1}));
    let (status, _) = api_request(req, Some(&user_token(SELLER)), active_accounts(), |cfg| {
        cfg.app_data(orders(db)).service(CreateOrderRoute::<MockOrderManager>::new());
    })
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn order_body_rejects_extra_fields() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_insert_order_for_product().never();
    let req = TestRequest::post().uri("/api/orders").set_json(json!({"product_id": 1, "amount": 1}));
    let (status, _) = api_request(req, Some(&user_token(BUYER)), active_accounts(), |cfg| {
        cfg.app_data(orders(db)).service(CreateOrderRoute::<MockOrderManager>::new());
    })
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn purchases_are_scoped_to_the_buyer() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_search_orders().returning(|filter, _| {
        assert_eq!(filter.buyer_id, Some(BUYER));
        assert_eq!(filter.status, Some(vec![OrderStatus::Completed]));
        Ok(vec![order_fixture(12, BUYER, SELLER, OrderStatus::Completed)])
    });
    let req = TestRequest::get().uri("/api/orders/purchases?status=completed");
    let (status, body) = api_request(req, Some(&user_token(BUYER)), active_accounts(), |cfg| {
        cfg.app_data(orders(db)).service(MyPurchasesRoute::<MockOrderManager>::new());
    })
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json_body(&body).as_array().map(|a| a.len()), Some(1));
}

#[actix_web::test]
async fn outsiders_cannot_see_orders() {
    let _ = env_logger::try_init().ok();
    for (token, expected) in [
        (user_token(BUYER), StatusCode::OK),
        (user_token(SELLER), StatusCode::OK),
        (admin_token(1), StatusCode::OK),
        (user_token(99), StatusCode::NOT_FOUND),
    ] {
        let db = single_order(OrderStatus::Created);
        let req = TestRequest::get().uri("/api/orders/12");
        let (status, body) = api_request(req, Some(&token), active_accounts(), |cfg| {
            cfg.app_data(orders(db)).service(OrderByIdRoute::<MockOrderManager>::new());
        })
        .await;
        assert_eq!(status, expected, "{body}");
    }
}

#[actix_web::test]
async fn missing_order_looks_like_hidden_order() {
    let _ = env_logger::try_init().ok();
    let db = single_order(OrderStatus::Created);
    let req = TestRequest::get().uri("/api/orders/13");
    let (status, _) = api_request(req, Some(&user_token(BUYER)), active_accounts(), |cfg| {
        cfg.app_data(orders(db)).service(OrderByIdRoute::<MockOrderManager>::new());
    })
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn buyer_reports_payment() {
    let _ = env_logger::try_init().ok();
    let db = single_order(OrderStatus::Created);
    let req = TestRequest::post().uri("/api/orders/12/report_payment").set_json(json!({"tx_hash": " 0xabc123def456 "}));
    let (status, body) = api_request(req, Some(&user_token(BUYER)), active_accounts(), |cfg| {
        cfg.app_data(orders(db)).service(ReportPaymentRoute::<MockOrderManager>::new());
    })
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let body = json_body(&body);
    assert_eq!(body["status"], "paid_reported");
    assert_eq!(body["payment_tx_hash"], "0xabc123def456");
}

#[actix_web::test]
async fn seller_cannot_report_payment() {
    let _ = env_logger::try_init().ok();
    let db = single_order(OrderStatus::Created);
    let req = TestRequest::post().uri("/api/orders/12/report_payment").set_json(json!({"tx_hash": "0xabc123def456"}));
    let (status, _) = api_request(req, Some(&user_token(SELLER)), active_accounts(), |cfg| {
        cfg.app_data(orders(db)).service(ReportPaymentRoute::<MockOrderManager>::new());
    })
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn seller_confirmation_completes_the_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_fetch_order().returning(|id| Ok(Some(order_fixture(id, BUYER, SELLER, OrderStatus::PaidReported))));
    db.expect_transition_order().times(2).returning(|id, transition| {
        let from = match transition.to {
            OrderStatus::Confirmed => OrderStatus::PaidReported,
            _ => OrderStatus::Confirmed,
        };
        assert!(transition.from.contains(&from));
        if transition.to == OrderStatus::Confirmed {
            assert_eq!(transition.actor_id, Some(SELLER));
        } else {
            // completion is recorded against the system
            assert_eq!(transition.actor_id, None);
        }
        Ok(Some(Order { status: transition.to, ..order_fixture(id, BUYER, SELLER, from) }))
    });
    let req = TestRequest::post().uri("/api/orders/12/confirm");
    let (status, body) = api_request(req, Some(&user_token(SELLER)), active_accounts(), |cfg| {
        cfg.app_data(orders(db)).service(ConfirmPaymentRoute::<MockOrderManager>::new());
    })
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json_body(&body)["status"], "completed");
}

#[actix_web::test]
async fn buyer_cannot_confirm_payment() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_fetch_order().returning(|id| Ok(Some(order_fixture(id, BUYER, SELLER, OrderStatus::PaidReported))));
    db.expect_transition_order().never();
    let req = TestRequest::post().uri("/api/orders/12/confirm");
    let (status, _) = api_request(req, Some(&user_token(BUYER)), active_accounts(), |cfg| {
        cfg.app_data(orders(db)).service(ConfirmPaymentRoute::<MockOrderManager>::new());
    })
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn unpaid_order_cannot_be_confirmed() {
    let _ = env_logger::try_init().ok();
    let db = single_order(OrderStatus::Created);
    let req = TestRequest::post().uri("/api/orders/12/confirm");
    let (status, _) = api_request(req, Some(&user_token(SELLER)), active_accounts(), |cfg| {
        cfg.app_data(orders(db)).service(ConfirmPaymentRoute::<MockOrderManager>::new());
    })
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn buyer_cancels_with_reason() {
    let _ = env_logger::try_init().ok();
    let db = single_order(OrderStatus::Created);
    let req = TestRequest::post().uri("/api/orders/12/cancel").set_json(json!({"reason": "changed my mind"}));
    let (status, body) = api_request(req, Some(&user_token(BUYER)), active_accounts(), |cfg| {
        cfg.app_data(orders(db)).service(CancelOrderRoute::<MockOrderManager>::new());
    })
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let body = json_body(&body);
    assert_eq!(body["status"], "cancelled");
    assert_eq!(body["cancel_reason"], "changed my mind");
}

#[actix_web::test]
async fn cancel_without_body_uses_default_reason() {
    let _ = env_logger::try_init().ok();
    let db = single_order(OrderStatus::PaidReported);
    let req = TestRequest::post().uri("/api/orders/12/cancel");
    let (status, body) = api_request(req, Some(&user_token(SELLER)), active_accounts(), |cfg| {
        cfg.app_data(orders(db)).service(CancelOrderRoute::<MockOrderManager>::new());
    })
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json_body(&body)["cancel_reason"], "cancelled by seller");
}

#[actix_web::test]
async fn buyer_cannot_cancel_after_paying() {
    let _ = env_logger::try_init().ok();
    let db = single_order(OrderStatus::PaidReported);
    let req = TestRequest::post().uri("/api/orders/12/cancel");
    let (status, _) = api_request(req, Some(&user_token(BUYER)), active_accounts(), |cfg| {
        cfg.app_data(orders(db)).service(CancelOrderRoute::<MockOrderManager>::new());
    })
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn completed_order_cannot_be_cancelled() {
    let _ = env_logger::try_init().ok();
    let db = single_order(OrderStatus::Completed);
    let req = TestRequest::post().uri("/api/orders/12/cancel");
    let (status, _) = api_request(req, Some(&admin_token(1)), active_accounts(), |cfg| {
        cfg.app_data(orders(db)).service(CancelOrderRoute::<MockOrderManager>::new());
    })
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn delivery_waits_for_completion() {
    let _ = env_logger::try_init().ok();
    let mut db = single_order(OrderStatus::PaidReported);
    db.expect_fetch_delivery().never();
    let req = TestRequest::get().uri("/api/orders/12/delivery");
    let (status, _) = api_request(req, Some(&user_token(BUYER)), active_accounts(), |cfg| {
        cfg.app_data(orders(db)).service(OrderDeliveryRoute::<MockOrderManager>::new());
    })
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn delivery_goes_to_the_buyer() {
    let _ = env_logger::try_init().ok();
    let setup = || {
        let mut db = single_order(OrderStatus::Completed);
        db.expect_fetch_delivery().returning(|order_id| {
            Ok(Some(DeliveryRecord {
                order_id,
                delivery_type: DeliveryType::AutoHosted,
                delivery_content: "https://cdn.example.com/pack.zip".into(),
                seller_email: "user6@example.com".into(),
            }))
        });
        db
    };
    let db = setup();
    let req = TestRequest::get().uri("/api/orders/12/delivery");
    let (status, body) = api_request(req, Some(&user_token(BUYER)), active_accounts(), |cfg| {
        cfg.app_data(orders(db)).service(OrderDeliveryRoute::<MockOrderManager>::new());
    })
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let body = json_body(&body);
    assert_eq!(body["content"], "https://cdn.example.com/pack.zip");
    assert!(body["seller_contact"].is_null());

    let db = setup();
    let req = TestRequest::get().uri("/api/orders/12/delivery");
    let (status, _) = api_request(req, Some(&user_token(SELLER)), active_accounts(), |cfg| {
        cfg.app_data(orders(db)).service(OrderDeliveryRoute::<MockOrderManager>::new());
    })
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
