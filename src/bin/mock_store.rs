use patchsentryx::{
    config::MockStoreConfig,
    mock::{self, MockState},
    telemetry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing("patchsentryx=debug,tower_http=info", std::io::stdout);

    let config = MockStoreConfig::from_env()?;
    let state = match &config.db_path {
        Some(path) => {
            tracing::info!(db = %path.display(), "loading store file");
            MockState::with_file(path.clone())?
        }
        None => MockState::in_memory(),
    };

    mock::serve(mock::build_app(state), &config.addr()).await
}
