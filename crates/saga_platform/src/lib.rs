pub mod events;
pub mod window;

pub use events::Platform;
pub use window::{PlatformConfig, PlatformError};
