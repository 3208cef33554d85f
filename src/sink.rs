use crate::Coordinates;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::{thread::JoinHandle, time::Duration};

/// A block the planner wants placed in the world.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PlacedBlock {
    pub coordinates: Coordinates,
    /// Full block state, e.g. `minecraft:stone_brick_slab[type=bottom]`.
    pub block: String,
}

/// Where generated placements go. The planner only enqueues and occasionally asks for a flush.
pub trait BlockSink {
    fn place(&mut self, coordinates: Coordinates, block: &str);

    /// Blocks until everything placed so far has been handed to the world.
    fn flush(&mut self);
}

impl BlockSink for Vec<PlacedBlock> {
    fn place(&mut self, coordinates: Coordinates, block: &str) {
        self.push(PlacedBlock {
            coordinates,
            block: block.to_string(),
        });
    }

    fn flush(&mut self) {}
}

/// The transport that actually applies batches to the running world.
pub trait BlockWriter: Send + 'static {
    fn write_batch(&mut self, batch: &[PlacedBlock]);
}

enum SinkEvent {
    Place(PlacedBlock),
    Flush(Sender<()>),
}

/// Queues placements on a bounded channel and writes them from a background thread, whenever
/// `batch_size` blocks are pending or `interval` passes without new events.
pub struct BatchedSink {
    event_tx: Option<Sender<SinkEvent>>,
    handle: Option<JoinHandle<()>>,
}

impl BatchedSink {
    pub fn new<W: BlockWriter>(
        writer: W,
        capacity: usize,
        batch_size: usize,
        interval: Duration,
    ) -> std::io::Result<Self> {
        let (event_tx, event_rx) = crossbeam_channel::bounded(capacity.max(1));
        let handle = std::thread::Builder::new()
            .name("block_sink".into())
            .spawn(move || run_writer(writer, event_rx, batch_size.max(1), interval))?;

        Ok(BatchedSink {
            event_tx: Some(event_tx),
            handle: Some(handle),
        })
    }

    fn send(&self, event: SinkEvent) -> bool {
        match &self.event_tx {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }
}

fn write_pending(writer: &mut impl BlockWriter, pending: &mut Vec<PlacedBlock>) {
    if pending.is_empty() {
        return;
    }
    log::trace!("Writing batch of {} blocks", pending.len());
    writer.write_batch(pending);
    pending.clear();
}

fn run_writer<W: BlockWriter>(
    mut writer: W,
    event_rx: Receiver<SinkEvent>,
    batch_size: usize,
    interval: Duration,
) {
    let mut pending = Vec::with_capacity(batch_size);
    loop {
        match event_rx.recv_timeout(interval) {
            Ok(SinkEvent::Place(block)) => {
                pending.push(block);
                if pending.len() >= batch_size {
                    write_pending(&mut writer, &mut pending);
                }
            }
            Ok(SinkEvent::Flush(done_tx)) => {
                write_pending(&mut writer, &mut pending);
                // The flusher may have given up waiting.
                let _ = done_tx.send(());
            }
            Err(RecvTimeoutError::Timeout) => write_pending(&mut writer, &mut pending),
            Err(RecvTimeoutError::Disconnected) => {
                write_pending(&mut writer, &mut pending);
                break;
            }
        }
    }
}

impl BlockSink for BatchedSink {
    fn place(&mut self, coordinates: Coordinates, block: &str) {
        let sent = self.send(SinkEvent::Place(PlacedBlock {
            coordinates,
            block: block.to_string(),
        }));
        if !sent {
            log::warn!(
                "Block sink writer is gone, dropping {} at {:?}",
                block,
                coordinates
            );
        }
    }

    fn flush(&mut self) {
        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        if !self.send(SinkEvent::Flush(done_tx)) || done_rx.recv().is_err() {
            log::warn!("Block sink writer is gone, flush skipped");
        }
    }
}

impl Drop for BatchedSink {
    fn drop(&mut self) {
        // Disconnecting makes the writer drain and exit.
        self.event_tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Block sink writer panicked");
            }
        }
    }
}

// ████████╗███████╗███████╗████████╗███████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝
//    ██║   █████╗  ███████╗   ██║   ███████╗
//    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║
//    ██║   ███████╗███████║   ██║   ███████║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝
