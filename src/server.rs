//! Reusable service runtime.
//!
//! Provides [`ServerHandle`] that encapsulates the full process lifecycle:
//! database init, migrations, default inventory, lifecycle services, the
//! overdue sweep, the availability projection, metrics and graceful shutdown.

use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{error, info, warn};

use crate::application::{
    start_overdue_sweep_task, AvailabilityProjection, GuestDirectory, ReceivableLedger,
    ReservationLifecycle, ReservationQueries, RoomLocks, RoomRegistry,
};
use crate::config::AppConfig;
use crate::domain::{Principal, RepositoryProvider, RoomType};
use crate::infrastructure::database::migrator::Migrator;
use crate::shared::retry::RetryConfig;
use crate::shared::shutdown::{ShutdownCoordinator, ShutdownSignal};
use crate::{create_event_bus, init_database, SeaOrmRepositoryProvider, SharedEventBus};

// ── Options ────────────────────────────────────────────────────────

pub struct ServerOptions {
    pub config: AppConfig,
    /// Run database migrations on startup (default: true).
    pub auto_migrate: bool,
    /// Register the standard room types when none exist (default: true).
    pub seed_room_types: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            auto_migrate: true,
            seed_room_types: true,
        }
    }
}

// ── ServerHandle ───────────────────────────────────────────────────

/// Handle to a running hotel service.
///
/// Exposes the application services so an embedding API layer can route
/// requests to them.
///
/// ```rust,no_run
/// use hotel_core::server::{ServerHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = ServerHandle::start(ServerOptions::default()).await?;
///     handle.shutdown().await;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    pub event_bus: SharedEventBus,
    pub repos: Arc<dyn RepositoryProvider>,
    pub lifecycle: Arc<ReservationLifecycle>,
    pub ledger: Arc<ReceivableLedger>,
    pub registry: Arc<RoomRegistry>,
    pub guests: Arc<GuestDirectory>,
    pub queries: Arc<ReservationQueries>,
    pub projection: Arc<AvailabilityProjection>,
    /// The configuration the service was started with.
    pub config: AppConfig,

    db: DatabaseConnection,
    shutdown: ShutdownCoordinator,
    tasks: Vec<tokio::task::JoinHandle<()>>,
}

impl ServerHandle {
    /// Start the service with the given options.
    ///
    /// This will:
    /// 1. Install the Prometheus exporter (when enabled)
    /// 2. Connect to the database and run migrations
    /// 3. Register the standard room types (if enabled)
    /// 4. Build the lifecycle, ledger and registry services
    /// 5. Start the overdue sweep and the availability projection
    pub async fn start(opts: ServerOptions) -> Result<Self, Box<dyn std::error::Error>> {
        let app_cfg = opts.config;
        app_cfg.validate()?;

        info!("Starting hotel service...");

        if app_cfg.metrics.enabled {
            install_metrics_exporter(&app_cfg.metrics.listen);
        }

        // ── Database ───────────────────────────────────────────
        let db = init_database(&app_cfg.database).await?;

        if opts.auto_migrate {
            info!("Running database migrations...");
            Migrator::up(&db, None).await?;
            info!("Migrations completed");
        }

        // ── Event Bus ──────────────────────────────────────────
        let event_bus = create_event_bus();
        info!("🔔 Event bus initialized");

        // ── Repositories & Services ────────────────────────────
        let repos: Arc<dyn RepositoryProvider> =
            Arc::new(SeaOrmRepositoryProvider::new(db.clone()));
        let policy = app_cfg.booking_policy();
        let locks = RoomLocks::new();

        let lifecycle = Arc::new(
            ReservationLifecycle::new(repos.clone(), event_bus.clone(), policy.clone())
                .with_locks(locks.clone()),
        );
        let ledger = Arc::new(ReceivableLedger::new(
            repos.clone(),
            event_bus.clone(),
            locks.clone(),
            policy.payment_grace_days,
        ));
        let registry = Arc::new(RoomRegistry::new(repos.clone(), event_bus.clone(), locks));
        let guests = Arc::new(GuestDirectory::new(repos.clone()));
        let queries = Arc::new(ReservationQueries::new(repos.clone()));

        if opts.seed_room_types {
            seed_room_types(&registry, repos.as_ref()).await;
        }

        // ── Shutdown coordinator ───────────────────────────────
        let shutdown = ShutdownCoordinator::new(app_cfg.server.shutdown_timeout);
        let shutdown_signal = shutdown.signal();

        // ── Background tasks ───────────────────────────────────
        let projection = Arc::new(AvailabilityProjection::new());
        let tasks = vec![
            start_overdue_sweep_task(
                ledger.clone(),
                shutdown_signal.clone(),
                app_cfg.ledger.overdue_sweep_interval_secs,
                RetryConfig::default(),
            ),
            projection.clone().spawn(
                repos.clone(),
                event_bus.clone(),
                shutdown_signal,
                app_cfg.projection.refresh_interval_secs,
            ),
        ];

        info!(
            tentative_overlap = policy.tentative_overlap,
            "🚀 Hotel service started"
        );

        Ok(Self {
            event_bus,
            repos,
            lifecycle,
            ledger,
            registry,
            guests,
            queries,
            projection,
            config: app_cfg,
            db,
            shutdown,
            tasks,
        })
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Install OS signal listeners (SIGTERM, SIGINT) that trigger shutdown.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Wait for the background tasks to stop after shutdown has been
    /// triggered, bounded by `server.shutdown_timeout`.
    pub async fn wait(self) {
        info!("⏳ Waiting for background tasks to complete...");

        let tasks = self.tasks;
        let finished = self
            .shutdown
            .shutdown_with_cleanup(|| async move {
                for task in tasks {
                    if let Err(e) = task.await {
                        error!("Background task panicked: {}", e);
                    }
                }
            })
            .await;
        if !finished {
            warn!("Some background tasks did not stop in time");
        }

        if let Err(e) = self.db.close().await {
            warn!("Error closing database connection: {}", e);
        } else {
            info!("✅ Database connection closed");
        }

        info!("👋 Hotel service shutdown complete");
    }

    pub async fn shutdown(self) {
        info!("🛑 Shutting down hotel service...");
        self.trigger_shutdown();
        self.wait().await;
    }

    pub fn is_running(&self) -> bool {
        self.tasks.iter().any(|t| !t.is_finished())
    }
}

// ── Helpers ────────────────────────────────────────────────────────

/// The global recorder can only be installed once per process; later calls
/// are no-ops.
fn install_metrics_exporter(listen: &str) {
    use std::net::SocketAddr;
    use std::sync::OnceLock;

    static INSTALLED: OnceLock<()> = OnceLock::new();
    if INSTALLED.get().is_some() {
        return;
    }

    let addr: SocketAddr = match listen.parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Invalid metrics listen address '{}': {}", listen, e);
            return;
        }
    };

    match metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
    {
        Ok(()) => {
            let _ = INSTALLED.set(());
            info!("📊 Prometheus metrics exporter listening on http://{}/metrics", addr);
        }
        Err(e) => error!("Failed to install Prometheus metrics exporter: {}", e),
    }
}

/// Standard room categories with their capacity and base nightly rate.
pub fn default_room_types() -> Vec<RoomType> {
    [
        ("Single", 1, 60),
        ("Double", 2, 90),
        ("Matrimonial", 2, 110),
        ("Suite", 4, 180),
    ]
    .into_iter()
    .map(|(name, max_capacity, price)| RoomType {
        id: 0,
        name: name.to_string(),
        description: None,
        max_capacity,
        base_price: Decimal::from(price),
    })
    .collect()
}

/// Register the standard room types if the catalogue is empty.
async fn seed_room_types(registry: &RoomRegistry, repos: &dyn RepositoryProvider) {
    match repos.rooms().list_types().await {
        Ok(types) if !types.is_empty() => return,
        Ok(_) => {}
        Err(e) => {
            error!("Failed to read room types: {}", e);
            return;
        }
    }

    info!("Registering default room types...");
    let system = Principal::system();
    for room_type in default_room_types() {
        if let Err(e) = registry.register_type(&system, room_type).await {
            error!("Failed to register room type: {}", e);
        }
    }
}

/// Initialize tracing (logging) from the application config.
///
/// Call this once at process startup (before [`ServerHandle::start`]).
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    if config.logging.is_json() {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
