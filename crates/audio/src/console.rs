use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::engine::{AudioEngine, Marker, NoteCommand, TransportEvent, TransportHandle, Voice};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Simulated sample loading time before the engine reports ready.
    pub warmup_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { warmup_ms: 250 }
    }
}

/// Tokio-driven engine that "sounds" notes by posting [`TransportEvent::NoteOn`]
/// at their onset. Must be created inside a tokio runtime.
pub struct ConsoleEngine {
    events: UnboundedSender<TransportEvent>,
    ready: Arc<AtomicBool>,
    running: bool,
    next_handle: u64,
    markers: HashMap<TransportHandle, JoinHandle<()>>,
}

impl ConsoleEngine {
    pub fn new(config: EngineConfig, events: UnboundedSender<TransportEvent>) -> Self {
        let ready = Arc::new(AtomicBool::new(false));
        let loader_ready = Arc::clone(&ready);
        let loader_events = events.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(config.warmup_ms)).await;
            loader_ready.store(true, Ordering::SeqCst);
            info!("console engine ready");
            let _ = loader_events.send(TransportEvent::Ready);
        });
        Self {
            events,
            ready,
            running: false,
            next_handle: 0,
            markers: HashMap::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl Drop for ConsoleEngine {
    fn drop(&mut self) {
        for (_, task) in self.markers.drain() {
            task.abort();
        }
    }
}

struct ConsoleVoice {
    events: UnboundedSender<TransportEvent>,
    notes: Vec<JoinHandle<()>>,
}

impl Voice for ConsoleVoice {
    fn schedule_note(&mut self, note: &NoteCommand) -> Result<()> {
        if self.events.is_closed() {
            bail!("console voice has no listener");
        }
        let events = self.events.clone();
        let note = note.clone();
        self.notes.push(tokio::spawn(async move {
            tokio::time::sleep(note.at).await;
            let _ = events.send(TransportEvent::NoteOn(note));
        }));
        Ok(())
    }
}

impl Drop for ConsoleVoice {
    fn drop(&mut self) {
        for task in self.notes.drain(..) {
            task.abort();
        }
    }
}

impl AudioEngine for ConsoleEngine {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn voice(&mut self) -> Result<Box<dyn Voice>> {
        if !self.is_ready() {
            bail!("console engine is still loading");
        }
        Ok(Box::new(ConsoleVoice {
            events: self.events.clone(),
            notes: Vec::new(),
        }))
    }

    fn schedule_marker(&mut self, at: Duration, marker: Marker) -> Result<TransportHandle> {
        self.markers.retain(|_, task| !task.is_finished());
        let handle = TransportHandle(self.next_handle);
        self.next_handle += 1;
        let events = self.events.clone();
        self.markers.insert(
            handle,
            tokio::spawn(async move {
                tokio::time::sleep(at).await;
                let _ = events.send(TransportEvent::Marker(marker));
            }),
        );
        debug!(?handle, ?marker, "armed transport marker");
        Ok(handle)
    }

    fn clear_scheduled(&mut self, handle: TransportHandle) {
        if let Some(task) = self.markers.remove(&handle) {
            task.abort();
        }
    }

    fn start(&mut self) -> Result<()> {
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.running = false;
        for (_, task) in self.markers.drain() {
            task.abort();
        }
    }
}
