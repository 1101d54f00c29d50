//!
//! mealgate server binary
//! ----------------------
//! Command-line entry point for the gateway. Configuration comes from the environment
//! (a `.env` file is honoured) and CLI flags, flags taking precedence.

use anyhow::Result;
use std::env;

use mealgate::config::{has_flag, Config};

const HELP: &str = "mealgate Server

USAGE:
  mealgate_server [--http-port N] [--backend-url URL] [--frontend-url URL] [--api-url URL]
                  [--auth-url URL] [--session-source remote|jwt] [--body-limit BYTES]

OPTIONS:
  --http-port N          Listen port (env: MEALGATE_HTTP_PORT, default 3000)
  --backend-url URL      REST backend; receives /api/* (env: BACKEND_URL, default http://localhost:5000)
  --frontend-url URL     Page renderer; receives gated pages (env: FRONTEND_URL, default http://localhost:3001)
  --api-url URL          API base for orders and assets (env: API_URL, default <backend>/api)
  --auth-url URL         Identity provider base (env: AUTH_URL, default <api>/auth)
  --session-source SRC   remote (ask the identity provider) or jwt (verify the token cookie; needs JWT_SECRET)
                         (env: MEALGATE_SESSION_SOURCE, default remote)
  --body-limit BYTES     Largest request body relayed upstream (env: MEALGATE_BODY_LIMIT, default 10485760)
";

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    // Initialize tracing subscriber with env filter if provided
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let args: Vec<String> = env::args().collect();
    if has_flag(&args, "--help") || has_flag(&args, "-h") {
        println!("{}", HELP);
        return Ok(());
    }

    let config = Config::from_env_and_args(&args)?;
    tracing::info!("mealgate starting with {:?}", config);
    mealgate::server::run_with_config(config).await
}
