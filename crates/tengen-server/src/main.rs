//! Runnable Tengen server.
//!
//! Uses [`DevIdentity`], which trusts a `user=<id>; name=<name>` cookie —
//! fine for local play behind the real auth proxy, nothing more.

use tengen_server::{DevIdentity, TengenServerBuilder};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let addr = std::env::var("TENGEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let server = TengenServerBuilder::new().bind(&addr).build(DevIdentity).await?;
    server.run().await?;
    Ok(())
}
