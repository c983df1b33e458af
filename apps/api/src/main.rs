use std::net::SocketAddr;
use std::sync::Arc;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{CorsLayer, Any};
use tower_http::trace::{self, TraceLayer};
use tracing::{Level, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use calendar_cell::store::{CalendarStore, SupabaseCalendarStore};
use messaging_cell::handlers::MessagingState;
use messaging_cell::services::interpreter::SmsCommandService;
use messaging_cell::store::{InteractionStore, SupabaseInteractionStore};
use telephony_cell::services::client::{TelephonyProvider, VoipMsClient};
use telephony_cell::services::scheduler::JobScheduler;
use telephony_cell::services::sync::TelephonySyncService;
use telephony_cell::store::{CallLogStore, SupabaseCallLogStore};

#[tokio::main]
async fn main() {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting practice API server");

    // Load configuration
    let config = AppConfig::from_env();

    let supabase = Arc::new(SupabaseClient::new(&config));
    let calendar: Arc<dyn CalendarStore> =
        Arc::new(SupabaseCalendarStore::new(Arc::clone(&supabase)));
    let call_log: Arc<dyn CallLogStore> =
        Arc::new(SupabaseCallLogStore::new(Arc::clone(&supabase)));
    let interactions: Arc<dyn InteractionStore> =
        Arc::new(SupabaseInteractionStore::new(Arc::clone(&supabase)));
    let telephony: Arc<dyn TelephonyProvider> = Arc::new(VoipMsClient::new(&config));

    // Recurring provider sync jobs, owned by this process
    let scheduler = Arc::new(JobScheduler::new());
    let sync_service = Arc::new(TelephonySyncService::new(
        Arc::clone(&telephony),
        Arc::clone(&call_log),
        Arc::clone(&calendar),
        config.voipms_did.clone(),
    ));
    if config.is_telephony_configured() {
        sync_service.start_jobs(&scheduler);
    } else {
        info!("Telephony not configured, sync jobs are not scheduled");
    }

    let messaging_state = Arc::new(MessagingState {
        commands: SmsCommandService::new(
            Arc::clone(&calendar),
            Arc::clone(&interactions),
            Arc::clone(&telephony),
            config.practice_phone_display.clone(),
            config.practice_booking_url.clone(),
        ),
    });

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the application router
    let app = router::create_router(messaging_state, Arc::clone(&scheduler))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new()
                    .level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new()
                    .level(Level::INFO)),
        )
        .layer(cors);

    // Run the server
    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    scheduler.stop_all();
    info!("Shutdown complete");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
