use crate::bridge::{ChannelInput, FlipAck, FrameRequest, WindowScreen};
use crate::keymap::map_key;
use anyhow::{Context, Result, anyhow};
use crossbeam_channel::{Receiver, Sender, unbounded};
use flanker_core::ParticipantId;
use flanker_experiment::{
    CsvSink, DisplayError, ExperimentConfig, Frames, KeyPress, Messages, SessionError,
    SessionManager, SessionReport,
};
use flanker_render::{Scene, SkiaRenderer};
use flanker_timing::{FramePacer, HighPrecisionTimer, Timer};
use pixels::{Pixels, PixelsBuilder, SurfaceTexture};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, error, info, warn};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoopProxy},
    window::{Fullscreen, Window, WindowId},
};

/// What the session thread needs, handed over once the window exists.
pub struct SessionSeed {
    pub config: ExperimentConfig,
    pub messages: Messages,
    pub participant: ParticipantId,
}

struct SessionChannels {
    acks: Receiver<FlipAck>,
    keys: Receiver<KeyPress>,
}

pub type Worker = JoinHandle<Result<SessionReport>>;

/// Event-loop side: owns the window and the pixel surface, presents the
/// scenes the session thread sends and stamps keyboard input.
pub struct App {
    proxy: EventLoopProxy<FrameRequest>,
    timer: HighPrecisionTimer,
    seed: Option<SessionSeed>,
    channels: Option<SessionChannels>,
    ack_tx: Sender<FlipAck>,
    key_tx: Sender<KeyPress>,

    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    renderer: Option<SkiaRenderer>,
    pacer: FramePacer,
    last_flip: Option<u64>,
    frames_presented: u64,

    worker: Option<Worker>,
    startup_error: Option<anyhow::Error>,
}

impl App {
    pub fn new(seed: SessionSeed, proxy: EventLoopProxy<FrameRequest>) -> Self {
        let (ack_tx, acks) = unbounded();
        let (key_tx, keys) = unbounded();
        Self {
            proxy,
            timer: HighPrecisionTimer::new(),
            pacer: FramePacer::new(seed.config.frame_rate),
            seed: Some(seed),
            channels: Some(SessionChannels { acks, keys }),
            ack_tx,
            key_tx,
            window: None,
            pixels: None,
            renderer: None,
            last_flip: None,
            frames_presented: 0,
            worker: None,
            startup_error: None,
        }
    }

    /// Takes the session thread out. Join it only after the app is dropped:
    /// that closes the channels the thread may still block on.
    pub fn take_worker(&mut self) -> Option<Worker> {
        self.worker.take()
    }

    pub fn take_startup_error(&mut self) -> Option<anyhow::Error> {
        self.startup_error.take()
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<(u32, u32)> {
        let monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next())
            .ok_or_else(|| anyhow!("No monitor available"))?;
        let refresh = monitor
            .refresh_rate_millihertz()
            .map(|mhz| mhz as f64 / 1000.0);

        let attributes = Window::default_attributes()
            .with_title("Flanker")
            .with_fullscreen(Some(Fullscreen::Borderless(Some(monitor))))
            .with_resizable(false);
        let window = Arc::new(event_loop.create_window(attributes)?);
        let size = window.inner_size();
        info!(
            width = size.width,
            height = size.height,
            scale = window.scale_factor(),
            refresh_hz = refresh,
            "display configured"
        );

        let surface = SurfaceTexture::new(size.width, size.height, window.clone());
        let pixels = PixelsBuilder::new(size.width, size.height, surface)
            .enable_vsync(true)
            .build()
            .context("creating the pixel surface")?;

        let seed = self.seed.as_ref().ok_or_else(|| anyhow!("session already started"))?;
        let mut renderer = SkiaRenderer::new(size.width, size.height, seed.config.style.clone())?;
        let labels = &seed.config.feedback_labels;
        renderer.prewarm(
            seed.config.stimuli.iter().map(String::as_str),
            &[
                labels.correct.as_str(),
                labels.incorrect.as_str(),
                labels.no_response.as_str(),
            ],
        );
        debug!(texts = renderer.cached_texts(), "text cache warmed");

        window.set_cursor_visible(false);
        self.window = Some(window);
        self.pixels = Some(pixels);
        self.renderer = Some(renderer);
        Ok((size.width, size.height))
    }

    fn spawn_session(&mut self, resolution: (u32, u32)) -> Result<()> {
        let seed = self.seed.take().ok_or_else(|| anyhow!("session already started"))?;
        let channels = self
            .channels
            .take()
            .ok_or_else(|| anyhow!("session already started"))?;
        let proxy = self.proxy.clone();
        let timer = self.timer.clone();

        let handle = std::thread::Builder::new()
            .name("session".into())
            .spawn(move || {
                let screen = WindowScreen::new(proxy.clone(), channels.acks, resolution);
                let input = ChannelInput::new(channels.keys);
                let result = run_session(seed, screen, input, timer);
                if proxy.send_event(FrameRequest::Finished).is_err() {
                    debug!("event loop gone before the session finished");
                }
                result
            })?;
        self.worker = Some(handle);
        Ok(())
    }

    /// Renders and shows one scene; the returned time stamps the flip.
    fn present(&mut self, scene: &Scene) -> Result<u64, DisplayError> {
        let (Some(pixels), Some(renderer)) = (self.pixels.as_mut(), self.renderer.as_mut()) else {
            return Err(DisplayError::Closed);
        };
        let stats = renderer
            .render(scene, pixels.frame_mut())
            .map_err(|e| DisplayError::Present(e.to_string()))?;
        pixels
            .render()
            .map_err(|e| DisplayError::Present(e.to_string()))?;
        if let Some(last) = self.last_flip {
            self.pacer.pace(&self.timer, last);
        }

        let ts = self.timer.now();
        if let Some(last) = self.last_flip {
            let interval = ts.saturating_sub(last);
            // more than one and a half periods: a refresh was missed
            if interval * 2 > self.pacer.period().as_nanos() as u64 * 3 {
                warn!(
                    interval_ms = interval as f64 / 1e6,
                    frame = self.frames_presented,
                    "frame presented late"
                );
            }
        }
        self.last_flip = Some(ts);
        self.frames_presented += 1;
        tracing::trace!(
            draw_us = stats.draw.as_micros() as u64,
            copy_us = stats.copy.as_micros() as u64,
            items = stats.items,
            "frame"
        );
        Ok(ts)
    }
}

fn run_session(
    seed: SessionSeed,
    screen: WindowScreen,
    input: ChannelInput,
    timer: HighPrecisionTimer,
) -> Result<SessionReport> {
    let sink = CsvSink::new(&seed.config.results_dir);
    let frames = Frames::new(screen, input, timer);
    let mut manager = SessionManager::new(
        seed.config,
        seed.messages,
        seed.participant,
        frames,
        rand::rng(),
    )?;

    match manager.run(sink) {
        Ok(report) => Ok(report),
        Err(err @ SessionError::FrameRateMismatch { .. }) => {
            error!(%err, "critical error");
            let text = format!("Critical error\n\n{err}\n\nPress space to close.");
            if let Err(shown) = manager.frames_mut().show_info(&text) {
                debug!(%shown, "critical error screen closed");
            }
            Err(err.into())
        }
        Err(err) => Err(err.into()),
    }
}

impl ApplicationHandler<FrameRequest> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let started = self
            .create_window_and_surface(event_loop)
            .and_then(|resolution| self.spawn_session(resolution));
        if let Err(err) = started {
            error!("failed to start: {err:#}");
            self.startup_error = Some(err);
            event_loop.exit();
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: FrameRequest) {
        match event {
            FrameRequest::Present(scene) => {
                let ack = self.present(&scene);
                if let Err(err) = &ack {
                    error!(%err, "presentation failed");
                }
                if self.ack_tx.send(ack).is_err() {
                    debug!("session thread stopped listening");
                }
            }
            FrameRequest::Finished => {
                info!(frames = self.frames_presented, "session thread finished");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                warn!("window closed during the session");
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. }
                if event.state.is_pressed() && !event.repeat =>
            {
                let timestamp = self.timer.now();
                if let Some(key) = map_key(&event.logical_key) {
                    debug!(%key, timestamp, "key pressed");
                    if self.key_tx.send(KeyPress { key, timestamp }).is_err() {
                        debug!("session thread stopped listening");
                    }
                }
            }
            WindowEvent::Resized(size) => {
                if let (Some(pixels), Some(renderer)) = (self.pixels.as_mut(), self.renderer.as_mut())
                {
                    let resized = pixels
                        .resize_surface(size.width, size.height)
                        .and_then(|()| pixels.resize_buffer(size.width, size.height))
                        .map_err(anyhow::Error::from)
                        .and_then(|()| renderer.resize(size.width, size.height));
                    if let Err(err) = resized {
                        error!("failed to resize to {}x{}: {err:#}", size.width, size.height);
                    }
                }
            }
            _ => {}
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        if let Some(window) = &self.window {
            window.set_cursor_visible(true);
        }
    }
}
