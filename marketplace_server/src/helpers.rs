use std::{net::IpAddr, str::FromStr};

use actix_web::HttpRequest;
use log::{debug, trace};
use regex::Regex;

use crate::errors::ServerError;

/// Get the remote IP address from the request. It uses 3 sources to determine the IP address, in decreasing order
/// of preference:
/// 1. The `X-Forwarded-For` header, iif `use_x_forwarded_for` is set to true in the configuration. The first
///    (client-most) address in the list is used.
/// 2. The `Forwarded` header, iif `use_forwarded` is set to true in the configuration.
/// 3. The peer address from the connection info.
pub fn get_remote_ip(req: &HttpRequest, use_x_forwarded_for: bool, use_forwarded: bool) -> Option<IpAddr> {
    let mut result = None;
    if use_x_forwarded_for {
        trace!("Checking X-Forwarded-For header");
        result = req
            .headers()
            .get("X-Forwarded-For")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| IpAddr::from_str(s.trim()).ok());
        if let Some(ip) = result {
            debug!("Using X-Forwarded-For header for remote address: {ip}");
        }
    }
    if use_forwarded && result.is_none() {
        trace!("Checking Forwarded header");
        let re = Regex::new(r#"for=(?P<ip>[^;,]+)"#).ok();
        result = req
            .headers()
            .get("Forwarded")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| re.as_ref().and_then(|re| re.captures(v)))
            .and_then(|caps| caps.name("ip"))
            .map(|m| m.as_str().trim_matches(|c| c == '"' || c == '[' || c == ']'))
            .and_then(|s| IpAddr::from_str(s).ok());
        if let Some(ip) = result {
            debug!("Using Forwarded header for remote address: {ip}");
        }
    }
    result.or_else(|| {
        let peer_addr = req.peer_addr().map(|a| a.ip());
        trace!("Using Peer address for remote address: {:?}", peer_addr);
        peer_addr
    })
}

/// Parses a comma-separated list of statuses from a query parameter, e.g. `?status=created,paid_reported`.
/// An absent or blank parameter means "no filter".
pub fn parse_statuses<T>(param: Option<&str>) -> Result<Option<Vec<T>>, ServerError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(param) = param.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let statuses = param
        .split(',')
        .map(|s| s.trim().parse::<T>().map_err(|e| ServerError::InvalidQuery(e.to_string())))
        .collect::<Result<Vec<T>, _>>()?;
    Ok(Some(statuses))
}
