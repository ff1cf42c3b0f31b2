//src/main.rs

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use masjid_backend::{
    build_app,
    config::{AppConfig, AppState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;

    // RUST_LOG controla o nível; padrão `info`
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let addr = config.bind_addr();
    let app_state = AppState::new(config).await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await?;

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let app = build_app(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
