use axum::{middleware::from_fn, routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use lingkungan_api::database::manager::DatabaseManager;
use lingkungan_api::handlers;
use lingkungan_api::middleware::{jwt_auth_middleware, route_access_middleware};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = lingkungan_api::config::config();
    tracing::info!(
        "Starting lingkungan API in {:?} mode ({})",
        config.environment,
        config.org.timezone
    );

    DatabaseManager::run_migrations()
        .await
        .expect("database migrations");

    let app = app();

    let port = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app() -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .merge(doling_routes())
        .merge(kaleidoskop_routes())
        .merge(umat_routes())
        .merge(profil_routes())
        // Page-level access decisions apply to every request
        .layer(from_fn(route_access_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn doling_routes() -> Router {
    use axum::routing::{delete, put};
    use handlers::doling;

    Router::new()
        .route("/api/doling", get(doling::list).post(doling::create))
        // Static segments before the :id capture
        .route("/api/doling/keluarga", get(doling::households_for_selection))
        .route("/api/doling/riwayat", get(doling::attendance_history))
        .route("/api/doling/rekap", get(doling::monthly_recap))
        .route("/api/doling/absensi/:id", delete(doling::delete_attendance))
        .route(
            "/api/doling/:id",
            get(doling::get).patch(doling::update).delete(doling::delete),
        )
        .route(
            "/api/doling/:id/absensi",
            get(doling::absensi_list).put(doling::record_attendance),
        )
        .route("/api/doling/:id/approval", put(doling::set_approval))
}

fn kaleidoskop_routes() -> Router {
    use handlers::kaleidoskop;

    Router::new()
        .route("/api/kaleidoskop/kegiatan", get(kaleidoskop::activities))
        .route("/api/kaleidoskop/statistik", get(kaleidoskop::statistik))
        .route("/api/kaleidoskop/ringkasan", get(kaleidoskop::ringkasan))
        .route(
            "/api/kaleidoskop/kehadiran",
            get(kaleidoskop::kehadiran_per_bulan),
        )
}

fn umat_routes() -> Router {
    use handlers::umat;

    Router::new()
        .route("/api/umat", get(umat::list))
        .route("/api/umat/ulang-tahun", get(umat::birthdays))
        .route("/api/umat/:id", get(umat::get))
}

fn profil_routes() -> Router {
    use axum::routing::{post, put};
    use handlers::profil;

    // Profile self-service needs an identity, not just a page decision
    Router::new()
        .route("/api/profil", get(profil::get))
        .route("/api/profil/kepala", put(profil::update_head))
        .route("/api/profil/pasangan", put(profil::upsert_spouse))
        .route("/api/profil/tanggungan", post(profil::add_dependent))
        .route(
            "/api/profil/tanggungan/:id",
            put(profil::update_dependent).delete(profil::delete_dependent),
        )
        .route_layer(from_fn(jwt_auth_middleware))
}
