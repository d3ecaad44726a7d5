//! Controller-side handle to a render worker thread.

use crate::worker::command::{Command, WorkerResult};
use crate::worker::WorkerConfig;
use crossbeam_channel::{Receiver, Sender};
use std::thread::JoinHandle;

/// Spawns and talks to the worker thread.
///
/// All interaction goes through the two channels: [WorkerHandle::send] never
/// blocks, results arrive asynchronously on the result channel. Dropping the
/// handle shuts the worker down.
pub struct WorkerHandle {
    commands: Sender<Command>,
    results: Receiver<WorkerResult>,
    thread: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    /// Spawns the render worker on its own thread.
    pub fn spawn(config: WorkerConfig) -> Self {
        let (command_sender, command_receiver) = crossbeam_channel::unbounded();
        let (result_sender, result_receiver) = crossbeam_channel::unbounded();
        let thread = std::thread::spawn(move || super::run(config, command_receiver, result_sender));
        WorkerHandle {
            commands: command_sender,
            results: result_receiver,
            thread: Some(thread),
        }
    }

    /// Enqueues a command. Never blocks; commands sent after the worker
    /// terminated are silently dropped.
    pub fn send(&self, command: Command) {
        self.commands.send(command).ok();
    }

    /// Non-blocking poll of the result channel.
    pub fn try_receive(&self) -> Option<WorkerResult> {
        self.results.try_recv().ok()
    }

    /// The raw result channel, e.g. to receive with a timeout or to select
    /// over multiple workers.
    pub fn results(&self) -> &Receiver<WorkerResult> {
        &self.results
    }

    /// Whether the worker thread is still running.
    pub fn is_alive(&self) -> bool {
        self.thread
            .as_ref()
            .map(|thread| !thread.is_finished())
            .unwrap_or(false)
    }

    /// Requests shutdown and waits for the worker thread to terminate.
    pub fn join(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.commands.send(Command::Quit).ok();
        if let Some(thread) = self.thread.take() {
            thread.join().ok();
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
