//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Invoice rendering shells out to an external program; it is awaited
//! through `tokio::process`, so it does not block the worker.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use settlement_engine::{
    db_types::OrderId,
    documents::DocumentGenerator,
    notifications::Notifier,
    order_objects::NewOrderRequest,
    traits::{CheckoutSessions, CheckoutUrls, OrderStore, ProductCatalog},
    OrderApi,
    SettlementApi,
};

use crate::{
    config::CheckoutConfig,
    data_objects::{CheckoutStarted, ConfirmCheckoutParams},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    // One type parameter carrying all the listed bounds
    ($name:ident => $method:ident $path:literal single impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    // One type parameter per bound
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
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(place_order => Post "/orders" single impl OrderStore, ProductCatalog);
/// Places a new, unpaid order. Items are priced from the catalog; the client only supplies product ids and
/// quantities.
pub async fn place_order<B>(
    body: web::Json<NewOrderRequest>,
    api: web::Data<OrderApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderStore + ProductCatalog,
{
    let request = body.into_inner();
    debug!("💻️ POST new order for {} with {} item(s)", request.customer.email, request.items.len());
    let order = api.place_order(request).await.map_err(|e| {
        debug!("💻️ Order was not placed. {e}");
        e
    })?;
    info!("💻️ Order #{} {} placed", order.order_number, order.order_id);
    Ok(HttpResponse::Created().json(order))
}

route!(order_by_id => Get "/orders/{order_id}" single impl OrderStore, ProductCatalog);
/// Fetches an order with its items and a snapshot of each product.
pub async fn order_by_id<B>(path: web::Path<OrderId>, api: web::Data<OrderApi<B>>) -> Result<HttpResponse, ServerError>
where B: OrderStore + ProductCatalog {
    let order_id = path.into_inner();
    debug!("💻️ GET order_by_id({order_id})");
    let details = api.fetch_order_details(&order_id).await?;
    Ok(HttpResponse::Ok().json(details))
}

//----------------------------------------------   Checkout  ----------------------------------------------------
route!(begin_checkout => Post "/checkout/stripe/{order_id}" impl OrderStore, CheckoutSessions, DocumentGenerator, Notifier);
/// Opens a Stripe checkout session for an unpaid order, and returns the hosted payment page URL.
pub async fn begin_checkout<B, S, D, N>(
    path: web::Path<OrderId>,
    api: web::Data<SettlementApi<B, S, D, N>>,
    checkout: web::Data<CheckoutConfig>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderStore,
    S: CheckoutSessions,
    D: DocumentGenerator,
    N: Notifier,
{
    let order_id = path.into_inner();
    debug!("💻️ POST begin checkout for {order_id}");
    let urls = CheckoutUrls {
        success_url: checkout.success_url(order_id.as_str()),
        cancel_url: checkout.cancel_url(order_id.as_str()),
    };
    let session = api.begin_checkout(&order_id, &urls).await.map_err(|e| {
        warn!("💻️ Could not start checkout for {order_id}. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(CheckoutStarted::from(session)))
}

route!(confirm_checkout => Get "/checkout/confirm" impl OrderStore, CheckoutSessions, DocumentGenerator, Notifier);
/// The page Stripe sends the customer back to. The session is re-fetched from Stripe before anything is changed, so
/// a forged or replayed query string cannot mark an order as paid. Reloading the page is safe.
pub async fn confirm_checkout<B, S, D, N>(
    query: web::Query<ConfirmCheckoutParams>,
    api: web::Data<SettlementApi<B, S, D, N>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderStore,
    S: CheckoutSessions,
    D: DocumentGenerator,
    N: Notifier,
{
    let ConfirmCheckoutParams { session_id, order_id } = query.into_inner();
    debug!("💻️ GET confirm checkout session {session_id} for {order_id}");
    let outcome = api.confirm_checkout_session(&session_id, &order_id).await.map_err(|e| {
        info!("💻️ Checkout {session_id} for {order_id} was not confirmed. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(outcome))
}
