#[tokio::main]
async fn main() -> std::io::Result<()> {
    deadzone_server::frameworks::server::run_with_config().await
}
