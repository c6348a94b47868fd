//! Native allocation primitives the pool is built on

pub mod system;
pub mod tracking;
pub mod traits;

pub use system::SystemAllocator;
pub use tracking::{TrackingAllocator, TrackingStats};
pub use traits::{BufferHandle, NativeAllocator};
