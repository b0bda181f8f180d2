//! Windowed batching and fan-out analysis engine.
//!
//! Messages flow `EventQueue → WindowBuffer` continuously; on every tick the
//! `WindowCoordinator` swaps the buffer out, runs a `BatchProcessor` per
//! group concurrently and hands the surviving reports to the
//! `GlobalAggregator`.

pub mod aggregator;
pub mod buffer;
pub mod coordinator;
pub mod processor;
pub mod queue;

pub use aggregator::GlobalAggregator;
pub use buffer::WindowBuffer;
pub use coordinator::WindowCoordinator;
pub use processor::BatchProcessor;
pub use queue::EventQueue;
