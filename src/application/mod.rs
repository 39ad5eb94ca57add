pub mod events;
pub mod ledger;
pub mod lifecycle;
pub mod projection;
pub mod queries;
pub mod registry;
pub mod services;

// Re-export key types for convenience
pub use events::{create_event_bus, Event, EventBus, EventSubscriber, SharedEventBus};
pub use ledger::ReceivableLedger;
pub use lifecycle::{BookingPolicy, NewReservation, ReservationLifecycle, RoomLocks};
pub use projection::{AvailabilityProjection, DashboardSnapshot};
pub use queries::{GuestDiscount, ReservationQueries};
pub use registry::{GuestDirectory, RoomRegistry};
pub use services::{run_sweep, start_overdue_sweep_task};
