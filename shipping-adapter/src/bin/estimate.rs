//! Delivery estimate binary
//!
//! Usage: `shipping-estimate '<order json>'`

use shipping_adapter::{AdapterConfig, CallContext, Order, ShippingEstimateAdapter};
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    // Load configuration
    let config = if let Ok(config_path) = std::env::var("SHIPPING_ADAPTER_CONFIG") {
        info!("Loading config from: {}", config_path);
        AdapterConfig::from_file(&config_path)?
    } else {
        info!("Loading config from environment variables");
        AdapterConfig::from_env()?
    };

    let order_json = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("usage: shipping-estimate '<order json>'"))?;
    let order: Order = serde_json::from_str(&order_json)?;

    let ctx = match std::env::var("SHIPPING_TIMEOUT_SECS") {
        Ok(secs) => CallContext::background().with_timeout(Duration::from_secs(secs.parse()?)),
        Err(_) => CallContext::background(),
    };

    let adapter = ShippingEstimateAdapter::from_config(&config).await?;

    let result = tokio::select! {
        result = adapter.create(&ctx, &order) => result,
        _ = tokio::signal::ctrl_c() => {
            ctx.cancel();
            Err(shipping_adapter::Error::Cancelled)
        }
    };
    adapter.shutdown();

    match result {
        Ok(days) => {
            info!("Order {} delivers in {} days", order.id, days);
            println!("{}", days);
            Ok(())
        }
        Err(e) => {
            error!("Delivery estimate failed for order {}: {} ({:?})", order.id, e, e.code());
            Err(e.into())
        }
    }
}
