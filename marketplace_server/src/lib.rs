//! Marketplace Server
//!
//! The marketplace server is the HTTP front end of the digital goods marketplace. It exposes the
//! [`marketplace_engine`] APIs as a JSON REST API, and takes care of
//! * authentication: password logins issue short-lived HS256 JWTs, which are checked on every `/api` request,
//! * authorisation: routes can demand roles via the [`route!`] macro and the ACL middleware,
//! * the background expiry worker that cancels orders whose payment was never reported,
//! * recording marketplace events in the analytics log.
//!
//! Configuration is read from `MKT_*` environment variables. See [`config::ServerConfig`].
pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod expiry_worker;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;
