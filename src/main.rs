use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use patchsentryx::{
    app::App,
    cli::{self, Command},
    config::AppConfig,
    render,
    session::LocalStorage,
    store::{RemoteStore, RestStore},
    telemetry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    // stdout belongs to the screen.
    telemetry::init_tracing("patchsentryx=warn", std::io::stderr);

    let config = AppConfig::from_env()?;
    let store = Arc::new(RestStore::new(&config.store_url)?) as Arc<dyn RemoteStore>;
    let storage = LocalStorage::new(config.session_file.clone());
    let mut app = App::new(store, storage, config.refresh_placeholder());
    tracing::info!(store_url = %config.store_url, "front end started");

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    stdout
        .write_all(render::screen(app.screen()).as_bytes())
        .await?;
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let event = match cli::parse(&line, app.screen()) {
            Ok(Command::Event(event)) => event,
            Ok(Command::Help) => {
                stdout.write_all(format!("{}\n", cli::HELP).as_bytes()).await?;
                continue;
            }
            Ok(Command::Quit) => break,
            Err(msg) => {
                stdout.write_all(format!("! {msg}\n").as_bytes()).await?;
                continue;
            }
        };

        if app.begin(&event) {
            stdout
                .write_all(render::screen(app.screen()).as_bytes())
                .await?;
            stdout.flush().await?;
        }
        let screen = app.dispatch(event).await;
        stdout.write_all(render::screen(screen).as_bytes()).await?;
    }
    Ok(())
}
