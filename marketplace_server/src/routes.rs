//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! The routes fall into three groups:
//! * Public routes: health, registration and login, the catalog, published posts and event tracking.
//! * `/api` routes. These require a valid access token (see [`crate::middleware::JwtMiddlewareFactory`]).
//! * `/api/admin` routes. These additionally require the `admin` role.
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Any long, non-cpu-bound operation (e.g. I/O, database operations,
//! etc.) should be expressed as futures or asynchronous functions. Password hashing is pushed onto a blocking thread
//! by the engine for the same reason.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use log::*;
use marketplace_engine::{
    db_types::Role,
    mkt_api::{
        account_objects::{Pagination, ProfileUpdate, Registration},
        analytics_objects::NewAnalyticsEvent,
        blog_objects::{NewPost, PostUpdate},
        catalog_objects::{NewProduct, ProductUpdate, ReviewDecision},
        order_objects::PaymentReport,
    },
    AccountApi,
    AccountManagement,
    AdminApi,
    AnalyticsApi,
    AnalyticsManagement,
    AuthApi,
    AuthManagement,
    BlogApi,
    BlogManagement,
    CatalogApi,
    CatalogManagement,
    MarketplaceStats,
    OrderFlowApi,
    OrderManagement,
};
use serde_json::json;

use crate::{
    auth::{JwtClaims, OptionalClaims, TokenIssuer},
    config::ServerOptions,
    data_objects::{
        AdminOrderQuery,
        AnalyticsSummaryQuery,
        CancelOrderRequest,
        CatalogQuery,
        EventRequest,
        JsonResponse,
        LocaleQuery,
        LoginRequest,
        LoginResponse,
        NewOrderRequest,
        OrderListQuery,
        PasswordChangeRequest,
        PostListQuery,
        ReviewQueueQuery,
        RoleUpdateRequest,
        TakedownRequest,
        UserListQuery,
    },
    errors::ServerError,
    helpers::get_remote_ip,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal requires [$($roles:expr),*]) => {
        paste::paste! { pub struct [<$name:camel Route>];}
        paste::paste! {
                impl [<$name:camel Route>] {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self { Self }
            }
        }
        paste::paste! {
            impl actix_web::dev::HttpServiceFactory for [<$name:camel Route>] {
                fn register(self, config: &mut actix_web::dev::AppService) {
                    let res = actix_web::Resource::new($path)
                        .name(stringify!($name))
                        .guard(actix_web::guard::$method())
                        .to($name)
                        .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where requires [$($roles:expr),*])  => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds)++ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Auth  ----------------------------------------------------
route!(register => Post "/auth/register" impl AuthManagement);
/// Creates a new account with the `user` role.
pub async fn register<B: AuthManagement>(
    body: web::Json<Registration>,
    api: web::Data<AuthApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let registration = body.into_inner();
    debug!("💻️ POST register for '{}'", registration.username);
    let user = api.register(registration).await?;
    Ok(HttpResponse::Created().json(user))
}

route!(login => Post "/auth/login" impl AuthManagement);
/// Route handler for the login endpoint
///
/// Users supply a username (or email address) and password. If the credentials are valid and the account is enabled,
/// the server issues an access token that must be supplied in the `Authorization: Bearer` header (or the
/// `mkt_access_token` header) on every `/api` request.
///
/// The token carries the user's roles at the time of login. Role changes take effect at the next login.
pub async fn login<B: AuthManagement>(
    body: web::Json<LoginRequest>,
    api: web::Data<AuthApi<B>>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    let LoginRequest { login, password } = body.into_inner();
    debug!("💻️ POST login for '{login}'");
    let user = api.login(&login, password.reveal()).await?;
    let (token, claims) = signer.issue_token(&user).map_err(|e| {
        error!("💻️ Could not issue an access token for user #{}. {e}", user.user.id);
        ServerError::CouldNotSerializeAccessToken(e.to_string())
    })?;
    trace!("💻️ Issued access token for user #{}", user.user.id);
    Ok(HttpResponse::Ok().json(LoginResponse::new(token, claims.exp, user)))
}

route!(check_token => Get "/check_token" requires [Role::User]);
pub async fn check_token(claims: JwtClaims) -> impl Responder {
    debug!("💻️ GET check_token for user #{}", claims.sub);
    HttpResponse::Ok().json(claims)
}

//----------------------------------------------   Profile  ----------------------------------------------------
route!(my_profile => Get "/me" impl AccountManagement);
pub async fn my_profile<B: AccountManagement>(
    claims: JwtClaims,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET me for user #{}", claims.sub);
    let user = api
        .user_by_id(claims.sub)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("User #{} does not exist", claims.sub)))?;
    Ok(HttpResponse::Ok().json(user))
}

route!(update_my_profile => Patch "/me" impl AccountManagement);
pub async fn update_my_profile<B: AccountManagement>(
    claims: JwtClaims,
    body: web::Json<ProfileUpdate>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ PATCH me for user #{}", claims.sub);
    let user = api.update_profile(claims.sub, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(user))
}

route!(change_password => Post "/me/password" impl AuthManagement);
pub async fn change_password<B: AuthManagement>(
    claims: JwtClaims,
    body: web::Json<PasswordChangeRequest>,
    api: web::Data<AuthApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST change password for user #{}", claims.sub);
    let PasswordChangeRequest { current_password, new_password } = body.into_inner();
    api.change_password(claims.sub, current_password.reveal(), new_password.reveal()).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Password changed.")))
}

//----------------------------------------------   Catalog (public)  --------------------------------------------
route!(browse_products => Get "/products" impl CatalogManagement);
/// The public catalog. Only approved listings are returned, and never their delivery content.
pub async fn browse_products<B: CatalogManagement>(
    query: web::Query<CatalogQuery>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (filter, pagination) = query.into_inner().into_parts();
    debug!("💻️ GET products with {filter:?}");
    let products = api.browse(filter, pagination).await?;
    Ok(HttpResponse::Ok().json(products))
}

route!(public_product => Get "/products/{id:\\d+}" impl CatalogManagement);
pub async fn public_product<B: CatalogManagement>(
    path: web::Path<i64>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product_id = path.into_inner();
    debug!("💻️ GET public product #{product_id}");
    let product = api.public_product(product_id).await?;
    Ok(HttpResponse::Ok().json(product))
}

//----------------------------------------------   Catalog (sellers)  -------------------------------------------
route!(create_product => Post "/products" impl CatalogManagement);
/// Creates a new listing in the `draft` state. Submit it for review to make it visible in the catalog.
pub async fn create_product<B: CatalogManagement>(
    claims: JwtClaims,
    body: web::Json<NewProduct>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST product for seller #{}", claims.sub);
    let product = api.create_product(claims.sub, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(product))
}

route!(my_products => Get "/my/products" impl CatalogManagement);
pub async fn my_products<B: CatalogManagement>(
    claims: JwtClaims,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET my products for seller #{}", claims.sub);
    let products = api.products_for_seller(claims.sub).await?;
    Ok(HttpResponse::Ok().json(products))
}

route!(product_for_owner => Get "/products/{id:\\d+}" impl CatalogManagement);
/// The full listing, including delivery content and review notes. Only the seller and admins may see it.
pub async fn product_for_owner<B: CatalogManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product_id = path.into_inner();
    debug!("💻️ GET product #{product_id} for user #{}", claims.sub);
    let product = api.product_for_actor(&claims.actor(), product_id).await?;
    Ok(HttpResponse::Ok().json(product))
}

route!(update_product => Patch "/products/{id:\\d+}" impl CatalogManagement);
pub async fn update_product<B: CatalogManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<ProductUpdate>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product_id = path.into_inner();
    debug!("💻️ PATCH product #{product_id} for seller #{}", claims.sub);
    let product = api.update_product(claims.sub, product_id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(product))
}

route!(delete_product => Delete "/products/{id:\\d+}" impl CatalogManagement);
pub async fn delete_product<B: CatalogManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product_id = path.into_inner();
    debug!("💻️ DELETE product #{product_id} for seller #{}", claims.sub);
    api.delete_product(claims.sub, product_id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Listing #{product_id} deleted."))))
}

route!(submit_product => Post "/products/{id:\\d+}/submit" impl CatalogManagement);
pub async fn submit_product<B: CatalogManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product_id = path.into_inner();
    debug!("💻️ POST submit product #{product_id} for seller #{}", claims.sub);
    let product = api.submit_for_review(claims.sub, product_id).await?;
    Ok(HttpResponse::Ok().json(product))
}

route!(unlist_product => Post "/products/{id:\\d+}/unlist" impl CatalogManagement);
pub async fn unlist_product<B: CatalogManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product_id = path.into_inner();
    debug!("💻️ POST unlist product #{product_id} for seller #{}", claims.sub);
    let product = api.unlist(claims.sub, product_id).await?;
    Ok(HttpResponse::Ok().json(product))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(create_order => Post "/orders" impl OrderManagement);
/// Route handler for placing an order
///
/// Returns `201 Created` with the new order. If the buyer already has an open order for the product, that order is
/// returned with `200 OK` instead, so clients can safely retry.
pub async fn create_order<B: OrderManagement>(
    claims: JwtClaims,
    body: web::Json<NewOrderRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product_id = body.product_id;
    debug!("💻️ POST order for product #{product_id} by buyer #{}", claims.sub);
    let result = api.create_order(claims.sub, product_id).await?;
    if result.created {
        Ok(HttpResponse::Created().json(result))
    } else {
        Ok(HttpResponse::Ok().json(result))
    }
}

route!(my_purchases => Get "/orders/purchases" impl OrderManagement);
pub async fn my_purchases<B: OrderManagement>(
    claims: JwtClaims,
    query: web::Query<OrderListQuery>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET purchases for buyer #{}", claims.sub);
    let (statuses, pagination) = query.into_inner().into_parts()?;
    let orders = api.purchases(claims.sub, statuses, pagination).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(my_sales => Get "/orders/sales" impl OrderManagement);
pub async fn my_sales<B: OrderManagement>(
    claims: JwtClaims,
    query: web::Query<OrderListQuery>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET sales for seller #{}", claims.sub);
    let (statuses, pagination) = query.into_inner().into_parts()?;
    let orders = api.sales(claims.sub, statuses, pagination).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id => Get "/orders/{id:\\d+}" impl OrderManagement);
/// Fetches an order. The buyer, the seller and admins can see it. Everyone else gets a 404, whether the order exists
/// or not.
pub async fn order_by_id<B: OrderManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET order #{order_id} for user #{}", claims.sub);
    let order = api.order_for_actor(&claims.actor(), order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(order_history => Get "/orders/{id:\\d+}/history" impl OrderManagement);
pub async fn order_history<B: OrderManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET history of order #{order_id} for user #{}", claims.sub);
    let history = api.order_history(&claims.actor(), order_id).await?;
    Ok(HttpResponse::Ok().json(history))
}

route!(report_payment => Post "/orders/{id:\\d+}/report_payment" impl OrderManagement);
/// The buyer reports that the funds were sent to the seller's wallet. Repeating the call with the same transaction
/// hash is harmless.
pub async fn report_payment<B: OrderManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<PaymentReport>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ POST payment report for order #{order_id} by user #{}", claims.sub);
    let order = api.report_payment(claims.sub, order_id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(confirm_payment => Post "/orders/{id:\\d+}/confirm" impl OrderManagement);
/// The seller (or an admin) confirms that the payment arrived. The order is completed in the same call, which
/// releases the delivery to the buyer.
pub async fn confirm_payment<B: OrderManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ POST confirm order #{order_id} by user #{}", claims.sub);
    let order = api.confirm_payment(claims.actor(), order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(cancel_order => Post "/orders/{id:\\d+}/cancel" impl OrderManagement);
pub async fn cancel_order<B: OrderManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: Option<web::Json<CancelOrderRequest>>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ POST cancel order #{order_id} by user #{}", claims.sub);
    let reason = body.and_then(|b| b.into_inner().reason);
    let order = api.cancel_order(claims.actor(), order_id, reason).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(order_delivery => Get "/orders/{id:\\d+}/delivery" impl OrderManagement);
/// The purchased goods. Only available to the buyer (and admins) once the order is completed.
pub async fn order_delivery<B: OrderManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET delivery for order #{order_id} by user #{}", claims.sub);
    let delivery = api.delivery(&claims.actor(), order_id).await?;
    Ok(HttpResponse::Ok().json(delivery))
}

//----------------------------------------------   Content (public)  ------------------------------------------
route!(published_posts => Get "/posts" impl BlogManagement);
pub async fn published_posts<B: BlogManagement>(
    query: web::Query<PostListQuery>,
    api: web::Data<BlogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (locale, pagination) = query.into_inner().into_parts();
    debug!("💻️ GET published posts for locale {locale:?}");
    let posts = api.published_posts(locale, pagination).await?;
    Ok(HttpResponse::Ok().json(posts))
}

route!(published_post => Get "/posts/{slug}" impl BlogManagement);
/// A published post by slug. The locale defaults to `en`.
pub async fn published_post<B: BlogManagement>(
    path: web::Path<String>,
    query: web::Query<LocaleQuery>,
    api: web::Data<BlogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let slug = path.into_inner();
    debug!("💻️ GET post '{slug}' ({:?})", query.locale);
    let post = api.published_post(&slug, query.locale.as_deref()).await?;
    Ok(HttpResponse::Ok().json(post))
}

//----------------------------------------------   Analytics (public)  ----------------------------------------
route!(record_event => Post "/events" impl AnalyticsManagement);
/// Records a tracking event from a client.
///
/// Authentication is optional. If a valid access token accompanies the request, the event is attributed to its user;
/// a user id in the body is rejected. The client IP is taken from the forwarding headers when the server is configured
/// to trust them.
pub async fn record_event<B: AnalyticsManagement>(
    req: HttpRequest,
    claims: OptionalClaims,
    options: web::Data<ServerOptions>,
    body: web::Json<EventRequest>,
    api: web::Data<AnalyticsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let EventRequest { name, path, session_id, properties } = body.into_inner();
    trace!("💻️ POST event '{name}'");
    let ip_address = get_remote_ip(&req, options.use_x_forwarded_for, options.use_forwarded).map(|ip| ip.to_string());
    let event = NewAnalyticsEvent {
        name,
        path,
        user_id: claims.user_id(),
        session_id,
        ip_address,
        properties: properties.unwrap_or_else(|| json!({})),
    };
    let event = api.record_event(event).await?;
    Ok(HttpResponse::Created().json(event))
}

//----------------------------------------------   Admin: users  ----------------------------------------------
route!(admin_stats => Get "/stats" impl MarketplaceStats where requires [Role::Admin]);
pub async fn admin_stats<B: MarketplaceStats>(api: web::Data<AdminApi<B>>) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET admin stats");
    let stats = api.dashboard_stats().await?;
    Ok(HttpResponse::Ok().json(stats))
}

route!(admin_users => Get "/users" impl AccountManagement where requires [Role::Admin]);
pub async fn admin_users<B: AccountManagement>(
    query: web::Query<UserListQuery>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (filter, pagination) = query.into_inner().into_parts();
    debug!("💻️ GET users with {filter:?}");
    let users = api.search_users(filter, pagination).await?;
    Ok(HttpResponse::Ok().json(users))
}

route!(update_roles => Post "/users/{id:\\d+}/roles" impl AuthManagement where requires [Role::Admin]);
/// Grants the roles in `apply`, then removes those in `revoke`. Every account keeps the `user` role.
///
/// The user's tokens keep their old roles until they log in again.
pub async fn update_roles<B: AuthManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<RoleUpdateRequest>,
    api: web::Data<AuthApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = path.into_inner();
    let RoleUpdateRequest { apply, revoke } = body.into_inner();
    info!("💻️ Admin #{} updating roles for user #{user_id}: +{apply:?} -{revoke:?}", claims.sub);
    if revoke.contains(&Role::User) {
        return Err(ServerError::ValidationError("The user role cannot be revoked.".into()));
    }
    api.db()
        .fetch_login_record(user_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("User #{user_id} does not exist")))?;
    if !apply.is_empty() {
        api.assign_roles(user_id, &apply).await?;
    }
    if !revoke.is_empty() {
        let removed = api.remove_roles(user_id, &revoke).await?;
        debug!("💻️ Removed {removed} roles from user #{user_id}");
    }
    let roles = api.roles_for_user(user_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "user_id": user_id, "roles": roles })))
}

route!(disable_user => Post "/users/{id:\\d+}/disable" impl AccountManagement where requires [Role::Admin]);
/// Disabled users cannot log in, and their existing tokens are refused.
pub async fn disable_user<B: AccountManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = path.into_inner();
    let user = api.set_user_disabled(claims.sub, user_id, true).await?;
    Ok(HttpResponse::Ok().json(user))
}

route!(enable_user => Post "/users/{id:\\d+}/enable" impl AccountManagement where requires [Role::Admin]);
pub async fn enable_user<B: AccountManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = path.into_inner();
    let user = api.set_user_disabled(claims.sub, user_id, false).await?;
    Ok(HttpResponse::Ok().json(user))
}

//----------------------------------------------   Admin: moderation  -----------------------------------------
route!(review_queue => Get "/products" impl CatalogManagement where requires [Role::Admin]);
/// Listings awaiting review, oldest first. Use `?status=` to look at other states.
pub async fn review_queue<B: CatalogManagement>(
    query: web::Query<ReviewQueueQuery>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (statuses, pagination) = query.into_inner().into_parts()?;
    debug!("💻️ GET review queue for {statuses:?}");
    let products = api.review_queue(statuses, pagination).await?;
    Ok(HttpResponse::Ok().json(products))
}

route!(review_product => Post "/products/{id:\\d+}/review" impl CatalogManagement where requires [Role::Admin]);
/// Approve (`{"approve": true}`) or reject (`{"approve": false, "note": "..."}`) a listing that is pending review.
pub async fn review_product<B: CatalogManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<ReviewDecision>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product_id = path.into_inner();
    debug!("💻️ POST review of product #{product_id} by admin #{}", claims.sub);
    let product = api.review_product(claims.sub, product_id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(product))
}

route!(takedown_product => Post "/products/{id:\\d+}/takedown" impl CatalogManagement where requires [Role::Admin]);
pub async fn takedown_product<B: CatalogManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: Option<web::Json<TakedownRequest>>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product_id = path.into_inner();
    debug!("💻️ POST takedown of product #{product_id} by admin #{}", claims.sub);
    let note = body.and_then(|b| b.into_inner().note);
    let product = api.takedown(claims.sub, product_id, note).await?;
    Ok(HttpResponse::Ok().json(product))
}

//----------------------------------------------   Admin: orders  ---------------------------------------------
route!(admin_orders => Get "/orders" impl OrderManagement where requires [Role::Admin]);
pub async fn admin_orders<B: OrderManagement>(
    query: web::Query<AdminOrderQuery>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (filter, pagination) = query.into_inner().into_parts()?;
    debug!("💻️ GET orders search for [{filter}]");
    let orders = api.search_orders(filter, pagination).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(admin_complete_order => Post "/orders/{id:\\d+}/complete" impl OrderManagement where requires [Role::Admin]);
/// Completes a confirmed order. Normally confirmation completes the order straight away, so this is only needed to
/// recover an order that got stuck in `confirmed`.
pub async fn admin_complete_order<B: OrderManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    info!("💻️ Admin #{} completing order #{order_id}", claims.sub);
    let order = api.complete_order(claims.actor(), order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(admin_cancel_order => Post "/orders/{id:\\d+}/cancel" impl OrderManagement where requires [Role::Admin]);
pub async fn admin_cancel_order<B: OrderManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: Option<web::Json<CancelOrderRequest>>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    info!("💻️ Admin #{} cancelling order #{order_id}", claims.sub);
    let reason = body.and_then(|b| b.into_inner().reason);
    let order = api.cancel_order(claims.actor(), order_id, reason).await?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Admin: content  --------------------------------------------
route!(admin_posts => Get "/posts" impl BlogManagement where requires [Role::Admin]);
pub async fn admin_posts<B: BlogManagement>(
    query: web::Query<PostListQuery>,
    api: web::Data<BlogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (locale, pagination) = query.into_inner().into_parts();
    let posts = api.all_posts(locale, pagination).await?;
    Ok(HttpResponse::Ok().json(posts))
}

route!(create_post => Post "/posts" impl BlogManagement where requires [Role::Admin]);
pub async fn create_post<B: BlogManagement>(
    claims: JwtClaims,
    body: web::Json<NewPost>,
    api: web::Data<BlogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let post = api.create_post(claims.sub, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(post))
}

route!(update_post => Patch "/posts/{id:\\d+}" impl BlogManagement where requires [Role::Admin]);
pub async fn update_post<B: BlogManagement>(
    path: web::Path<i64>,
    body: web::Json<PostUpdate>,
    api: web::Data<BlogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let post = api.update_post(path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(post))
}

route!(delete_post => Delete "/posts/{id:\\d+}" impl BlogManagement where requires [Role::Admin]);
pub async fn delete_post<B: BlogManagement>(
    path: web::Path<i64>,
    api: web::Data<BlogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let post_id = path.into_inner();
    api.delete_post(post_id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Post #{post_id} deleted."))))
}

//----------------------------------------------   Admin: analytics  ------------------------------------------
route!(analytics_summary => Get "/analytics" impl AnalyticsManagement where requires [Role::Admin]);
/// Event counts by name, most frequent first, optionally limited to `?since=` and `?until=` (RFC 3339).
pub async fn analytics_summary<B: AnalyticsManagement>(
    query: web::Query<AnalyticsSummaryQuery>,
    api: web::Data<AnalyticsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let counts = api.summary(query.into_inner().into()).await?;
    Ok(HttpResponse::Ok().json(counts))
}

route!(recent_events => Get "/analytics/recent" impl AnalyticsManagement where requires [Role::Admin]);
pub async fn recent_events<B: AnalyticsManagement>(
    query: web::Query<Pagination>,
    api: web::Data<AnalyticsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let events = api.recent(query.into_inner()).await?;
    Ok(HttpResponse::Ok().json(events))
}
