use std::time::Duration;

use actix_web::{
    dev::Server,
    error::{JsonPayloadError, PathError, QueryPayloadError},
    http::KeepAlive,
    middleware::Logger,
    web,
    App,
    Error,
    HttpRequest,
    HttpServer,
};
use log::*;
use marketplace_engine::{
    events::EventProducers,
    AccountApi,
    AdminApi,
    AnalyticsApi,
    AuthApi,
    BlogApi,
    CatalogApi,
    OrderFlowApi,
    SqliteDatabase,
};

use crate::{
    auth::TokenIssuer,
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    expiry_worker::start_expiry_worker,
    integrations::analytics::create_analytics_event_handlers,
    middleware::JwtMiddlewareFactory,
    routes::{
        health,
        AdminCancelOrderRoute,
        AdminCompleteOrderRoute,
        AdminOrdersRoute,
        AdminPostsRoute,
        AdminStatsRoute,
        AdminUsersRoute,
        AnalyticsSummaryRoute,
        BrowseProductsRoute,
        CancelOrderRoute,
        ChangePasswordRoute,
        CheckTokenRoute,
        ConfirmPaymentRoute,
        CreateOrderRoute,
        CreatePostRoute,
        CreateProductRoute,
        DeletePostRoute,
        DeleteProductRoute,
        DisableUserRoute,
        EnableUserRoute,
        LoginRoute,
        MyProductsRoute,
        MyProfileRoute,
        MyPurchasesRoute,
        MySalesRoute,
        OrderByIdRoute,
        OrderDeliveryRoute,
        OrderHistoryRoute,
        ProductForOwnerRoute,
        PublicProductRoute,
        PublishedPostRoute,
        PublishedPostsRoute,
        RecentEventsRoute,
        RecordEventRoute,
        RegisterRoute,
        ReportPaymentRoute,
        ReviewProductRoute,
        ReviewQueueRoute,
        SubmitProductRoute,
        TakedownProductRoute,
        UnlistProductRoute,
        UpdateMyProfileRoute,
        UpdatePostRoute,
        UpdateProductRoute,
        UpdateRolesRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.auto_migrate {
        db.migrate().await.map_err(|e| ServerError::InitializeError(format!("Could not run migrations. {e}")))?;
        info!("🗃️ Database migrations are up to date");
    }
    if let Some(admin) = &config.admin {
        AuthApi::new(db.clone())
            .ensure_admin(admin.registration())
            .await
            .map_err(|e| ServerError::InitializeError(format!("Could not create the admin account. {e}")))?;
    }
    let handlers = create_analytics_event_handlers(db.clone());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let _expiry_worker = start_expiry_worker(
        db.clone(),
        producers.clone(),
        config.unpaid_order_timeout,
        config.expiry_check_interval,
    );
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let bind_addr = (config.host.clone(), config.port);
    let srv = HttpServer::new(move || {
        let auth_api = AuthApi::new(db.clone());
        let accounts_api = AccountApi::new(db.clone());
        let catalog_api = CatalogApi::new(db.clone(), producers.clone());
        let orders_api = OrderFlowApi::new(db.clone(), producers.clone());
        let blog_api = BlogApi::new(db.clone());
        let analytics_api = AnalyticsApi::new(db.clone());
        let admin_api = AdminApi::new(db.clone());
        let jwt_signer = TokenIssuer::new(&config.auth);
        let options = ServerOptions::from_config(&config);
        let admin_scope = web::scope("/admin")
            .service(AdminStatsRoute::<SqliteDatabase>::new())
            .service(AdminUsersRoute::<SqliteDatabase>::new())
            .service(UpdateRolesRoute::<SqliteDatabase>::new())
            .service(DisableUserRoute::<SqliteDatabase>::new())
            .service(EnableUserRoute::<SqliteDatabase>::new())
            .service(ReviewQueueRoute::<SqliteDatabase>::new())
            .service(ReviewProductRoute::<SqliteDatabase>::new())
            .service(TakedownProductRoute::<SqliteDatabase>::new())
            .service(AdminOrdersRoute::<SqliteDatabase>::new())
            .service(AdminCompleteOrderRoute::<SqliteDatabase>::new())
            .service(AdminCancelOrderRoute::<SqliteDatabase>::new())
            .service(AdminPostsRoute::<SqliteDatabase>::new())
            .service(CreatePostRoute::<SqliteDatabase>::new())
            .service(UpdatePostRoute::<SqliteDatabase>::new())
            .service(DeletePostRoute::<SqliteDatabase>::new())
            .service(AnalyticsSummaryRoute::<SqliteDatabase>::new())
            .service(RecentEventsRoute::<SqliteDatabase>::new());
        // Routes that require authentication
        let auth_scope = web::scope("/api")
            .wrap(JwtMiddlewareFactory::<SqliteDatabase>::new(jwt_signer.clone()))
            .service(CheckTokenRoute::new())
            .service(MyProfileRoute::<SqliteDatabase>::new())
            .service(UpdateMyProfileRoute::<SqliteDatabase>::new())
            .service(ChangePasswordRoute::<SqliteDatabase>::new())
            .service(CreateProductRoute::<SqliteDatabase>::new())
            .service(MyProductsRoute::<SqliteDatabase>::new())
            .service(ProductForOwnerRoute::<SqliteDatabase>::new())
            .service(UpdateProductRoute::<SqliteDatabase>::new())
            .service(DeleteProductRoute::<SqliteDatabase>::new())
            .service(SubmitProductRoute::<SqliteDatabase>::new())
            .service(UnlistProductRoute::<SqliteDatabase>::new())
            .service(CreateOrderRoute::<SqliteDatabase>::new())
            .service(MyPurchasesRoute::<SqliteDatabase>::new())
            .service(MySalesRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(OrderHistoryRoute::<SqliteDatabase>::new())
            .service(ReportPaymentRoute::<SqliteDatabase>::new())
            .service(ConfirmPaymentRoute::<SqliteDatabase>::new())
            .service(CancelOrderRoute::<SqliteDatabase>::new())
            .service(OrderDeliveryRoute::<SqliteDatabase>::new())
            .service(admin_scope);
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("mkt::access_log"))
            .app_data(web::JsonConfig::default().error_handler(json_error))
            .app_data(web::QueryConfig::default().error_handler(query_error))
            .app_data(web::PathConfig::default().error_handler(path_error))
            .app_data(web::Data::new(auth_api))
            .app_data(web::Data::new(accounts_api))
            .app_data(web::Data::new(catalog_api))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(blog_api))
            .app_data(web::Data::new(analytics_api))
            .app_data(web::Data::new(admin_api))
            .app_data(web::Data::new(jwt_signer))
            .app_data(web::Data::new(options))
            .service(health)
            .service(RegisterRoute::<SqliteDatabase>::new())
            .service(LoginRoute::<SqliteDatabase>::new())
            .service(BrowseProductsRoute::<SqliteDatabase>::new())
            .service(PublicProductRoute::<SqliteDatabase>::new())
            .service(PublishedPostsRoute::<SqliteDatabase>::new())
            .service(PublishedPostRoute::<SqliteDatabase>::new())
            .service(RecordEventRoute::<SqliteDatabase>::new())
            .service(auth_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((bind_addr.0.as_str(), bind_addr.1))?
    .run();
    Ok(srv)
}

/// Malformed request bodies are reported in the same JSON error format as every other error.
pub fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> Error {
    debug!("💻️ Rejected request body. {err}");
    ServerError::InvalidRequestBody(err.to_string()).into()
}

pub fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> Error {
    debug!("💻️ Rejected query string. {err}");
    ServerError::InvalidQuery(err.to_string()).into()
}

pub fn path_error(err: PathError, _req: &HttpRequest) -> Error {
    debug!("💻️ Rejected request path. {err}");
    ServerError::InvalidRequestPath(err.to_string()).into()
}
