//! Signal generation module
//!
//! Rolling price window and the swing detector that turns it into
//! directional signals

mod detector;
mod types;
mod window;

pub use detector::{DetectorConfig, SignalDetector};
pub use types::{Direction, Signal};
pub use window::{PriceWindow, MAX_WINDOW_SECONDS};
