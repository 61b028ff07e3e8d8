use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tracing::{info, warn};

use inkbook_api::{build_router, Adapters, AppState};
use inkbook_core::ports::Mailer;
use inkbook_infrastructure::{
    create_pool, run_migrations, ExpirySweeper, LogMailer, MemoryStore, PgAppointmentRepository,
    PgAppointmentRequestRepository, PgAuditRepository, PgCalendarRepository, PgTenantRepository, PgUserRepository,
    SmtpMailer, TemplateRenderer,
};
use inkbook_security::JwtService;
use inkbook_shared::config::{AppConfig, DatabaseDriver, MailSettings, MailTransport};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env
    dotenvy::dotenv().ok();

    // Load configuration
    let config = match AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize telemetry; the guard flushes buffered logs on exit
    let _log_guard = inkbook_shared::telemetry::init_telemetry(&config.log)?;
    info!("{} starting ({})", config.app.name, config.app.env);

    // Storage and mail adapters
    let mailer = build_mailer(&config.mail)?;
    let adapters = match config.database.driver {
        DatabaseDriver::Postgres => {
            info!("Connecting to database...");
            let pool = create_pool(
                &config.database.url,
                config.database.max_connections,
                config.database.min_connections,
            )
            .await?;
            info!("Database connection established.");
            if config.database.run_migrations {
                run_migrations(&pool).await?;
            }
            Adapters {
                users: Arc::new(PgUserRepository::new(pool.clone())),
                tenants: Arc::new(PgTenantRepository::new(pool.clone())),
                calendars: Arc::new(PgCalendarRepository::new(pool.clone())),
                appointments: Arc::new(PgAppointmentRepository::new(pool.clone())),
                requests: Arc::new(PgAppointmentRequestRepository::new(pool.clone())),
                audit: Arc::new(PgAuditRepository::new(pool)),
                mailer,
            }
        }
        DatabaseDriver::Memory => {
            warn!("Using the in-memory store; data is lost on shutdown");
            let store = Arc::new(MemoryStore::new());
            Adapters {
                users: store.clone(),
                tenants: store.clone(),
                calendars: store.clone(),
                appointments: store.clone(),
                requests: store.clone(),
                audit: store,
                mailer,
            }
        }
    };

    // Services
    let jwt = Arc::new(JwtService::new(
        config.jwt.secret.clone(),
        config.jwt.access_token_expiry,
        config.jwt.refresh_token_expiry,
    ));
    let state = AppState::build(adapters, jwt, &config.booking, &config.realtime);

    // Background expiry sweep
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = ExpirySweeper::new(
        state.requests.clone(),
        Duration::from_secs(config.booking.expiry_sweep_interval_secs),
    )
    .spawn(shutdown_rx);

    // Router
    let app = build_router(state)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(cors_layer(&config.app.cors_origins));

    // Bind address
    let host: std::net::IpAddr = config.app.host.parse()?;
    let addr = SocketAddr::from((host, config.app.port));
    info!("Listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    let _ = sweeper.await;
    info!("Server stopped");

    Ok(())
}

fn build_mailer(settings: &MailSettings) -> anyhow::Result<Arc<dyn Mailer>> {
    let renderer = TemplateRenderer::new()?;
    let mailer: Arc<dyn Mailer> = match settings.transport {
        MailTransport::Smtp => {
            info!("Mail transport: SMTP via {}:{}", settings.smtp_host, settings.smtp_port);
            Arc::new(SmtpMailer::new(settings, renderer)?)
        }
        MailTransport::Log => {
            info!("Mail transport: log only");
            Arc::new(LogMailer::new(renderer))
        }
    };
    Ok(mailer)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(allowed)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
