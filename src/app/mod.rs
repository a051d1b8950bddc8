pub mod availability_use_case;
pub mod ports;
pub mod sync_use_case;

pub use availability_use_case::AvailabilityUseCase;
pub use ports::{BookingStore, HtmlSource};
pub use sync_use_case::SyncUseCase;
