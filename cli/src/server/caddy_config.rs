//! # Caddy Configuration Documents (`server::caddy_config`)
//!
//! File: cli/src/server/caddy_config.rs
//!
//! ## Overview
//!
//! Typed subset of the proxy's JSON configuration, covering only what is
//! needed to serve a directory over WebDAV. Everything here is pure data
//! construction; pushing is done by `common::network::admin`.
//!
//! A full document looks like:
//!
//! ```json
//! {
//!   "apps": {
//!     "http": {
//!       "servers": {
//!         "srv0": {
//!           "listen": [":54321"],
//!           "routes": [{
//!             "handle": [
//!               { "handler": "headers",
//!                 "response": { "deferred": true,
//!                               "set": { "Access-Control-Allow-Origin": ["*"] } } },
//!               { "handler": "webdav", "root": "/srv/files" }
//!             ],
//!             "match": [{ "path": ["/*"] }]
//!           }]
//!         }
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! A document with an empty `servers` map unbinds every server.
//!
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Path pattern matching every request.
const MATCH_ALL: &str = "/*";

const CORS_ALLOW_ORIGIN: &str = "Access-Control-Allow-Origin";

/// Root of a configuration document.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct CaddyConfig {
    pub apps: Apps,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Apps {
    pub http: HttpApp,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct HttpApp {
    pub servers: BTreeMap<String, HttpServer>,
}

/// One HTTP server entry under `apps.http.servers`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HttpServer {
    pub listen: Vec<String>,
    pub routes: Vec<Route>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub handle: Vec<Handler>,
    #[serde(rename = "match")]
    pub matchers: Vec<Matcher>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Matcher {
    pub path: Vec<String>,
}

/// Route handlers, tagged by the `handler` field.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "handler", rename_all = "lowercase")]
pub enum Handler {
    Headers { response: ResponseHeaders },
    Webdav { root: PathBuf },
}

/// Header manipulation applied to responses.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ResponseHeaders {
    /// Apply the operations only once the response is about to be written.
    pub deferred: bool,
    pub set: BTreeMap<String, Vec<String>>,
}

impl CaddyConfig {
    /// Document with no servers; loading it unbinds everything.
    pub fn empty() -> Self {
        build_server_config(BTreeMap::new())
    }
}

/// # Build WebDAV Route (`build_webdav_route`)
///
/// A route matching `/*` whose handler chain is, in order:
/// 1. `headers`: sets `Access-Control-Allow-Origin: *`, deferred to response time
/// 2. `webdav`: serves `root`
pub fn build_webdav_route(root: &Path) -> Route {
    let cors = ResponseHeaders {
        deferred: true,
        set: BTreeMap::from([(CORS_ALLOW_ORIGIN.to_string(), vec!["*".to_string()])]),
    };
    Route {
        handle: vec![
            Handler::Headers { response: cors },
            Handler::Webdav {
                root: root.to_path_buf(),
            },
        ],
        matchers: vec![Matcher {
            path: vec![MATCH_ALL.to_string()],
        }],
    }
}

/// Server listening on `:<port>` on all interfaces, serving `root`.
pub fn build_server(root: &Path, port: u16) -> HttpServer {
    HttpServer {
        listen: vec![format!(":{}", port)],
        routes: vec![build_webdav_route(root)],
    }
}

/// Wraps `servers` (name → server) into a full admin-API document.
pub fn build_server_config(servers: BTreeMap<String, HttpServer>) -> CaddyConfig {
    CaddyConfig {
        apps: Apps {
            http: HttpApp { servers },
        },
    }
}
