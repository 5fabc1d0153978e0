//! Application orchestration for the DrishtiLink server
//!
//! Owns the two shared monitors (frame buffer, command queue) and spawns
//! one dedicated thread per long-lived component: discovery beacon, video
//! channel, control channel. The monitors are constructed here and handed
//! to components by `Arc`, so exactly one instance of each is shared by
//! all producers and consumers without any global state.
//!
//! The beacon broadcasts until both channels report a connection, then is
//! asked to finish. Channel connection events are forwarded to an optional
//! collaborator-supplied [`ConnectionListener`] (the game's toast sink).

use crate::command_queue::CommandQueue;
use crate::config::AppConfig;
use crate::error::Result;
use crate::frame_buffer::FrameBuffer;
use crate::streaming::{
    ChannelEvent, ConnectionListener, ControlChannel, DiscoveryBeacon, VideoChannel,
    CONTROL_CHANNEL, VIDEO_CHANNEL,
};
use crate::types::MotorCommandAck;
use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, error, info};
use parking_lot::Mutex;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use std::net::TcpListener;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Capacity of the ack channel back to the enqueuing side
const ACK_CHANNEL_CAPACITY: usize = 64;

/// Main application structure that manages all components
pub struct LinkApp {
    config: AppConfig,
    frame_buffer: Arc<FrameBuffer>,
    command_queue: Arc<CommandQueue>,
    beacon: Arc<DiscoveryBeacon>,
    shutdown: Arc<AtomicBool>,
    events_tx: Sender<ChannelEvent>,
    events_rx: Receiver<ChannelEvent>,
    acks_tx: Sender<MotorCommandAck>,
    acks_rx: Receiver<MotorCommandAck>,
    connection_listener: Mutex<Option<Box<dyn ConnectionListener>>>,
    threads: Vec<JoinHandle<()>>,
}

impl LinkApp {
    /// Create a new LinkApp instance
    pub fn new(config: AppConfig) -> Result<Self> {
        let beacon = Arc::new(DiscoveryBeacon::new(
            config.network.discovery_target()?,
            config.network.beacon_interval(),
        ));

        let (events_tx, events_rx) = unbounded();
        let (acks_tx, acks_rx) = bounded(ACK_CHANNEL_CAPACITY);

        Ok(Self {
            config,
            frame_buffer: Arc::new(FrameBuffer::new()),
            command_queue: Arc::new(CommandQueue::new()),
            beacon,
            shutdown: Arc::new(AtomicBool::new(false)),
            events_tx,
            events_rx,
            acks_tx,
            acks_rx,
            connection_listener: Mutex::new(None),
            threads: Vec::new(),
        })
    }

    /// Shared frame buffer for the render/vision consumer
    pub fn frame_buffer(&self) -> Arc<FrameBuffer> {
        Arc::clone(&self.frame_buffer)
    }

    /// Shared command queue for the game/UI producer
    pub fn command_queue(&self) -> Arc<CommandQueue> {
        Arc::clone(&self.command_queue)
    }

    /// Per-command acknowledgements carrying the saturation flag
    pub fn acks(&self) -> Receiver<MotorCommandAck> {
        self.acks_rx.clone()
    }

    /// Register the collaborator callback fired once per channel connect
    pub fn set_connection_listener(&self, listener: Box<dyn ConnectionListener>) {
        *self.connection_listener.lock() = Some(listener);
    }

    /// Request shutdown of all component threads
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
        self.beacon.finish();
    }

    /// Bind listeners and spawn the component threads.
    ///
    /// A bind failure is fatal: the affected service never starts and the
    /// error is surfaced to the caller instead of being retried.
    pub fn start(&mut self) -> Result<()> {
        info!("Initializing DrishtiLink server");

        let video_listener = TcpListener::bind(self.config.network.video_addr())?;
        let control_listener = TcpListener::bind(self.config.network.control_addr())?;
        info!(
            "Video channel on {}, control channel on {}",
            self.config.network.video_addr(),
            self.config.network.control_addr()
        );

        let beacon = Arc::clone(&self.beacon);
        self.threads.push(
            thread::Builder::new()
                .name("discovery-beacon".to_string())
                .spawn(move || {
                    if let Err(e) = beacon.run() {
                        error!("Discovery beacon error: {}", e);
                    }
                })?,
        );

        let video = VideoChannel::new(
            Arc::clone(&self.frame_buffer),
            Arc::clone(&self.shutdown),
            self.events_tx.clone(),
        );
        self.threads.push(
            thread::Builder::new()
                .name("video-channel".to_string())
                .spawn(move || {
                    if let Err(e) = video.run(video_listener) {
                        error!("Video channel error: {}", e);
                    }
                })?,
        );

        let control = ControlChannel::new(
            Arc::clone(&self.command_queue),
            Arc::clone(&self.shutdown),
            self.events_tx.clone(),
            self.acks_tx.clone(),
        );
        self.threads.push(
            thread::Builder::new()
                .name("control-channel".to_string())
                .spawn(move || {
                    if let Err(e) = control.run(control_listener) {
                        error!("Control channel error: {}", e);
                    }
                })?,
        );

        info!("All component threads started");
        Ok(())
    }

    /// Start all components and run until shutdown
    pub fn run(&mut self) -> Result<()> {
        self.start()?;
        self.setup_signal_handler()?;

        let mut video_connected = false;
        let mut control_connected = false;
        let mut last_stats = Instant::now();

        while !self.shutdown.load(Ordering::Relaxed) {
            match self.events_rx.recv_timeout(Duration::from_millis(100)) {
                Ok(ChannelEvent::Connected { channel }) => {
                    self.notify_connected(channel);
                    match channel {
                        VIDEO_CHANNEL => video_connected = true,
                        CONTROL_CHANNEL => control_connected = true,
                        _ => {}
                    }
                    if video_connected && control_connected {
                        info!("Both channels connected, stopping discovery beacon");
                        self.beacon.finish();
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            if last_stats.elapsed().as_secs() >= 10 {
                self.log_statistics();
                last_stats = Instant::now();
            }
        }

        info!("Shutdown requested, stopping threads...");
        self.stop_all_threads();
        Ok(())
    }

    fn notify_connected(&self, channel: &str) {
        info!("{} channel connected", channel);
        if let Some(listener) = self.connection_listener.lock().as_ref() {
            listener.on_channel_connected(channel);
        }
    }

    fn log_statistics(&self) {
        let dims = self.frame_buffer.dimensions();
        info!(
            "Status: beacon={:?}, frame={}x{}, queue_len={}",
            self.beacon.state(),
            dims.width,
            dims.height,
            self.command_queue.len()
        );
    }

    fn setup_signal_handler(&self) -> Result<()> {
        let shutdown = Arc::clone(&self.shutdown);
        let beacon = Arc::clone(&self.beacon);

        thread::Builder::new()
            .name("signal-handler".to_string())
            .spawn(move || {
                let mut signals = match Signals::new([SIGINT, SIGTERM]) {
                    Ok(signals) => signals,
                    Err(e) => {
                        error!("Failed to register signal handlers: {}", e);
                        return;
                    }
                };
                if let Some(sig) = signals.forever().next() {
                    info!("Received signal {:?}, initiating shutdown...", sig);
                    shutdown.store(true, Ordering::Relaxed);
                    beacon.finish();
                }
            })
            .map_err(|e| crate::error::Error::Other(format!("Error setting signal handler: {}", e)))?;
        Ok(())
    }

    fn stop_all_threads(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        self.beacon.finish();

        for handle in self.threads.drain(..) {
            let name = handle.thread().name().unwrap_or("worker").to_string();
            if handle.join().is_err() {
                error!("Thread {} panicked", name);
            } else {
                debug!("Thread {} stopped", name);
            }
        }

        info!("All threads stopped");
    }
}

impl Drop for LinkApp {
    fn drop(&mut self) {
        debug!("LinkApp cleaning up...");
        self.stop_all_threads();
    }
}
