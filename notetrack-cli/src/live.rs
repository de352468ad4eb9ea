//! Live tracking: audio device in, MIDI out.
//!
//! The detector runs inside the audio callback. Events leave the callback
//! through a bounded channel and are encoded and sent on the main thread, so
//! the callback never blocks on MIDI output.

use std::io::{BufRead, IsTerminal};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use cpal::traits::StreamTrait;
use crossbeam_channel::{bounded, select, Sender};
use notetrack_core::{audio, DetectorConfig, NoteDetector, NoteEvent};
use tracing::{error, info, warn};

use crate::midi_out::{MidiSink, OutputTarget};

/// Capacity of the callback-to-output event queue.
const EVENT_QUEUE_SIZE: usize = 256;

#[derive(Debug, Clone)]
pub struct LiveSettings {
    pub detector: DetectorConfig,
    pub device: Option<String>,
    pub output: OutputTarget,
    pub duration: Option<Duration>,
}

/// Audio-thread side of live mode: runs each block through the detector and
/// forwards the events without blocking.
///
/// After a detector error the processor reports it once on the fatal channel
/// and ignores every later block.
pub struct BlockProcessor {
    detector: NoteDetector,
    events: Sender<NoteEvent>,
    fatal: Sender<notetrack_core::Error>,
    dropped: Arc<AtomicUsize>,
    failed: bool,
}

impl BlockProcessor {
    pub fn new(
        detector: NoteDetector,
        events: Sender<NoteEvent>,
        fatal: Sender<notetrack_core::Error>,
    ) -> Self {
        Self {
            detector,
            events,
            fatal,
            dropped: Arc::new(AtomicUsize::new(0)),
            failed: false,
        }
    }

    /// Counter of events dropped because the event queue was full.
    pub fn dropped_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.dropped)
    }

    /// Processes one block.
    ///
    /// # Arguments
    /// * `block` - One block of mono samples from the audio callback
    pub fn process_block(&mut self, block: &[f32]) {
        if self.failed {
            return;
        }
        match self.detector.process(block) {
            Ok(events) => {
                for event in events {
                    // Never block the audio thread; the output side reports the count.
                    if self.events.try_send(event).is_err() {
                        self.dropped.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
            Err(e) => {
                self.failed = true;
                let _ = self.fatal.try_send(e);
            }
        }
    }
}

pub fn run(settings: &LiveSettings) -> Result<()> {
    let (device, input) =
        audio::select_input(settings.device.as_deref(), settings.detector.sample_rate)?;

    let mut detector = NoteDetector::new(settings.detector)?;
    if input.sample_rate != detector.config().sample_rate {
        detector.set_sample_rate(input.sample_rate)?;
    }
    let block_size = detector.config().block_size;

    let mut sink = MidiSink::open(&settings.output)?;

    let (event_tx, event_rx) = bounded::<NoteEvent>(EVENT_QUEUE_SIZE);
    let (fatal_tx, fatal_rx) = bounded::<notetrack_core::Error>(1);
    let mut processor = BlockProcessor::new(detector, event_tx, fatal_tx);
    let dropped = processor.dropped_counter();

    let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
    let signal_tx = shutdown_tx.clone();
    ctrlc::set_handler(move || {
        let _ = signal_tx.try_send(());
    })
    .context("Failed to install signal handler")?;

    let stream = audio::start_block_capture(&device, &input, block_size, move |block| {
        processor.process_block(block)
    })?;

    if std::io::stdin().is_terminal() {
        info!(
            "Tracking notes: {} samples per block at {} Hz. Press Enter or Ctrl-C to stop.",
            block_size, input.sample_rate
        );
        thread::spawn(move || {
            let mut line = String::new();
            // End of input is not a stop request; only a typed line is.
            if let Ok(n) = std::io::stdin().lock().read_line(&mut line) {
                if n > 0 {
                    let _ = shutdown_tx.try_send(());
                }
            }
        });
    } else {
        info!(
            "Tracking notes: {} samples per block at {} Hz. Send SIGINT or SIGTERM to stop.",
            block_size, input.sample_rate
        );
    }

    let deadline = match settings.duration {
        Some(duration) => crossbeam_channel::after(duration),
        None => crossbeam_channel::never(),
    };

    let outcome = loop {
        select! {
            recv(event_rx) -> msg => match msg {
                Ok(event) => sink.send(event),
                Err(_) => {
                    warn!("Event channel closed");
                    break Ok(());
                }
            },
            recv(fatal_rx) -> msg => {
                if let Ok(e) = msg {
                    error!("Fatal detector error: {}", e);
                    break Err(e.into());
                }
            },
            recv(shutdown_rx) -> _ => {
                info!("Received shutdown signal");
                break Ok(());
            },
            recv(deadline) -> _ => {
                info!("Duration elapsed");
                break Ok(());
            },
        }
    };

    info!("Stopping stream...");
    if let Err(e) = stream.pause() {
        warn!("Error pausing stream: {}", e);
    }
    drop(stream);

    // Events produced before the stream stopped still go out, then any
    // sounding note is released.
    for event in event_rx.try_iter() {
        sink.send(event);
    }
    sink.finish();

    let dropped = dropped.load(Ordering::Relaxed);
    if dropped > 0 {
        warn!("{} note event(s) dropped because the output queue was full", dropped);
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn tone(frequency: f32) -> Vec<f32> {
        (0..128)
            .map(|i| 0.5 * (2.0 * PI * frequency * i as f32 / 48_000.0).sin())
            .collect()
    }

    fn processor(
        queue: usize,
    ) -> (
        BlockProcessor,
        crossbeam_channel::Receiver<NoteEvent>,
        crossbeam_channel::Receiver<notetrack_core::Error>,
    ) {
        let detector = NoteDetector::new(DetectorConfig::new(128, 48_000)).unwrap();
        let (event_tx, event_rx) = bounded(queue);
        let (fatal_tx, fatal_rx) = bounded(1);
        (BlockProcessor::new(detector, event_tx, fatal_tx), event_rx, fatal_rx)
    }

    #[test]
    fn forwards_events() {
        let (mut processor, events, fatal) = processor(4);
        processor.process_block(&tone(6000.0));
        processor.process_block(&tone(3000.0));

        let received: Vec<NoteEvent> = events.try_iter().collect();
        assert_eq!(
            received,
            vec![NoteEvent::on(78), NoteEvent::off(78), NoteEvent::on(66)]
        );
        assert!(fatal.try_recv().is_err());
        assert_eq!(processor.dropped_counter().load(Ordering::Relaxed), 0);
    }

    #[test]
    fn counts_events_dropped_on_full_queue() {
        let (mut processor, events, _fatal) = processor(1);
        processor.process_block(&tone(6000.0));
        // off(78) fits nowhere, nor does on(66).
        processor.process_block(&tone(3000.0));

        assert_eq!(events.try_iter().collect::<Vec<_>>(), vec![NoteEvent::on(78)]);
        assert_eq!(processor.dropped_counter().load(Ordering::Relaxed), 2);
    }

    #[test]
    fn mismatch_is_reported_once_and_latches() {
        let (mut processor, events, fatal) = processor(4);
        processor.process_block(&[0.0; 64]);
        assert_eq!(
            fatal.try_recv(),
            Ok(notetrack_core::Error::BlockSizeMismatch {
                expected: 128,
                actual: 64
            })
        );

        // Later blocks, even valid ones, are ignored.
        processor.process_block(&[0.0; 64]);
        processor.process_block(&tone(6000.0));
        assert!(fatal.try_recv().is_err());
        assert!(events.try_recv().is_err());
    }
}
