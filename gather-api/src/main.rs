use std::net::SocketAddr;
use std::sync::Arc;

use gather_api::{
    app,
    state::{AppState, AuthConfig},
};
use gather_core::capacity::CapacityGuard;
use gather_core::eligibility::EligibilityEvaluator;
use gather_core::hotels::HotelsDirectory;
use gather_core::repository::{
    BookingRepository, EnrollmentRepository, HotelRepository, TicketRepository,
};
use gather_core::reservation::ReservationManager;
use gather_core::tickets::TicketLifecycle;
use gather_store::{
    PostgresBookingRepository, PostgresEnrollmentRepository, PostgresHotelRepository,
    PostgresTicketRepository,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gather_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = gather_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Gather API on port {}", config.server.port);

    let db = gather_store::DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    let enrollments: Arc<dyn EnrollmentRepository> =
        Arc::new(PostgresEnrollmentRepository::new(db.pool.clone()));
    let tickets: Arc<dyn TicketRepository> =
        Arc::new(PostgresTicketRepository::new(db.pool.clone()));
    let hotels: Arc<dyn HotelRepository> = Arc::new(PostgresHotelRepository::new(db.pool.clone()));
    let bookings: Arc<dyn BookingRepository> =
        Arc::new(PostgresBookingRepository::new(db.pool.clone()));

    let eligibility = Arc::new(EligibilityEvaluator::new(
        enrollments.clone(),
        tickets.clone(),
    ));
    let guard = CapacityGuard::new(
        bookings.clone(),
        config.business_rules.slot_retry_limit,
    );

    let app_state = AppState {
        reservations: Arc::new(ReservationManager::new(
            eligibility.clone(),
            guard,
            hotels.clone(),
            bookings.clone(),
        )),
        hotels: Arc::new(HotelsDirectory::new(eligibility.clone(), hotels)),
        tickets: Arc::new(TicketLifecycle::new(enrollments, tickets)),
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
