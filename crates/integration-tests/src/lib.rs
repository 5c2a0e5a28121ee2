//! Integration tests for the ProShop storefront gateway.
//!
//! Each test binds the real router on an ephemeral port and talks to it over
//! HTTP with `reqwest`, so the whole pipeline (including hyper's own header
//! handling) is exercised.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p proshop-integration-tests
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use axum::Router;
use proshop_storefront::{AppState, HandlerGroups, StorefrontConfig, app};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Origin granted credentialed CORS in test servers.
pub const TEST_ORIGIN: &str = "http://localhost:3000";

/// PayPal client ID every test server discloses.
pub const TEST_PAYPAL_CLIENT_ID: &str = "sb-integration";

/// Contents of the client build's entry document.
pub const ENTRY_DOCUMENT: &str = "<!doctype html><div id=\"root\"></div>";

/// A gateway listening on localhost with its own upload and build roots.
pub struct TestServer {
    addr: SocketAddr,
    dirs: TempDir,
    client: reqwest::Client,
}

impl TestServer {
    /// Start a server in `NODE_ENV=node_env` with the given handler groups.
    ///
    /// # Panics
    ///
    /// Panics if the fixture directories or the listener cannot be created.
    pub async fn start(node_env: &str, groups: HandlerGroups) -> Self {
        let dirs = TempDir::new().expect("Failed to create fixture directory");
        let uploads = dirs.path().join("uploads");
        let build = dirs.path().join("build");
        std::fs::create_dir_all(&uploads).expect("Failed to create uploads root");
        std::fs::create_dir_all(build.join("static/js")).expect("Failed to create build root");
        std::fs::write(build.join("index.html"), ENTRY_DOCUMENT)
            .expect("Failed to write entry document");
        std::fs::write(build.join("static/js/main.js"), "console.log('proshop')")
            .expect("Failed to write client bundle");

        let vars = [
            ("NODE_ENV", node_env.to_string()),
            ("CORS_ORIGIN", TEST_ORIGIN.to_string()),
            ("PAYPAL_CLIENT_ID", TEST_PAYPAL_CLIENT_ID.to_string()),
            ("UPLOADS_DIR", path_var(&uploads)),
            ("CLIENT_BUILD_DIR", path_var(&build)),
        ];
        let config = StorefrontConfig::from_vars(|key| {
            vars.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| value.clone())
        })
        .expect("Invalid test configuration");
        let state = AppState::new(config).expect("Failed to build application state");

        let addr = spawn(app(state, groups)).await;
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client");

        Self { addr, dirs, client }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    #[must_use]
    pub const fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// The uploads root this server streams from.
    #[must_use]
    pub fn uploads_dir(&self) -> PathBuf {
        self.dirs.path().join("uploads")
    }

    /// `GET path` with the shared client.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Request failed")
    }
}

fn path_var(path: &Path) -> String {
    path.display().to_string()
}

async fn spawn(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind ephemeral port");
    let addr = listener.local_addr().expect("Listener has no address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server error");
    });
    addr
}
