use crate::api::serve;
use crate::core::AppConfig;

pub async fn run(host: String, port: String) {
    let config = AppConfig::default();
    serve(host, port, config).await;
}
