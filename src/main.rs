mod app;
mod auth;
mod config;
mod db;
mod error;
mod extract;
mod state;
mod users;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "appusers=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.first().map(String::as_str) == Some("issue-token") {
        return issue_token(&args[1..]);
    }

    let app_state = state::AppState::init().await?;
    app::serve(app::build_app(app_state)).await
}

/// `issue-token <app-id> <permission>...` prints a bearer token for a partner App.
fn issue_token(args: &[String]) -> anyhow::Result<()> {
    let (app_id, perms) = args
        .split_first()
        .ok_or_else(|| anyhow::anyhow!("usage: issue-token <app-id> <permission>..."))?;
    let app_id: uuid::Uuid = app_id.parse()?;
    let permissions = perms
        .iter()
        .map(|p| p.parse::<auth::Permission>())
        .collect::<anyhow::Result<Vec<_>>>()?;

    let keys = auth::jwt::JwtKeys::from_config(&config::JwtConfig::from_env()?);
    tracing::info!(%app_id, ?permissions, "issuing token");
    println!("{}", keys.sign(app_id, &permissions)?);
    Ok(())
}
