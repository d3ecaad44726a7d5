//! Off-screen point cloud viewer core with click-to-measure distance picking.
//!
//! All scene state (the loaded point cloud, the selection, the camera) is
//! exclusively owned by a render worker thread. A controller talks to the
//! worker through two unbounded channels: [commands](worker::command::Command)
//! in, [results](worker::command::WorkerResult) out. The worker renders into a
//! fixed-size offscreen target and ships frames back as PNG bytes.
//!
//! Use [worker::handle::WorkerHandle::spawn] to start a worker and
//! poll its results.

pub mod geometry;
pub mod io;
pub mod navigation;
pub mod render;
pub mod scene;
pub mod worker;

pub use crossbeam_channel;
