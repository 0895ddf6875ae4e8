use anyhow::Result;
use labelscan_api::{serve, ApiConfig};
use labelscan_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("labelscan_api");
    serve(ApiConfig::from_env()).await
}
