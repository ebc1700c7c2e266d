use ev_dashboard::server;
use ev_dashboard::settings::DashboardConfig;
use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = DashboardConfig::default();
    println!(
        "Serving '{}' at http://{}/",
        config.data_path.display(),
        config.bind_addr
    );
    server::serve(config).await?;
    Ok(())
}
