//! Session-thread side of the window: a [`Screen`] that hands scenes to the
//! event loop and an [`InputPoller`] fed by its keyboard events.

use crossbeam_channel::Receiver;
use flanker_core::Key;
use flanker_experiment::{DisplayError, InputPoller, KeyPress, KeyQueue, Screen};
use flanker_render::{Scene, SceneItem};
use winit::event_loop::EventLoopProxy;

/// Messages from the session thread to the event loop.
#[derive(Debug)]
pub enum FrameRequest {
    Present(Scene),
    Finished,
}

pub type FlipAck = Result<u64, DisplayError>;

pub struct WindowScreen {
    proxy: EventLoopProxy<FrameRequest>,
    acks: Receiver<FlipAck>,
    scene: Scene,
    resolution: (u32, u32),
}

impl WindowScreen {
    pub fn new(
        proxy: EventLoopProxy<FrameRequest>,
        acks: Receiver<FlipAck>,
        resolution: (u32, u32),
    ) -> Self {
        Self {
            proxy,
            acks,
            scene: Scene::new(),
            resolution,
        }
    }
}

impl Screen for WindowScreen {
    fn draw_fixation(&mut self) {
        self.scene.push(SceneItem::Fixation);
    }

    fn draw_stimulus(&mut self, text: &str) {
        self.scene.push(SceneItem::Stimulus(text.to_string()));
    }

    fn draw_reminder(&mut self) {
        self.scene.push(SceneItem::Reminder);
    }

    fn draw_feedback(&mut self, text: &str) {
        self.scene.push(SceneItem::Feedback(text.to_string()));
    }

    fn draw_text(&mut self, text: &str) {
        self.scene.push(SceneItem::Text(text.to_string()));
    }

    fn present_frame(&mut self) -> Result<u64, DisplayError> {
        self.proxy
            .send_event(FrameRequest::Present(self.scene.take()))
            .map_err(|_| DisplayError::Closed)?;
        self.acks.recv().map_err(|_| DisplayError::Closed)?
    }

    fn resolution(&self) -> (u32, u32) {
        self.resolution
    }
}

/// Key presses stamped by the event loop, queued until the session polls.
pub struct ChannelInput {
    keys: Receiver<KeyPress>,
    queue: KeyQueue,
}

impl ChannelInput {
    pub fn new(keys: Receiver<KeyPress>) -> Self {
        Self {
            keys,
            queue: KeyQueue::new(),
        }
    }

    fn drain(&mut self) {
        while let Ok(press) = self.keys.try_recv() {
            self.queue.push(press);
        }
    }
}

impl InputPoller for ChannelInput {
    fn poll_keys(&mut self, accepted: &[Key]) -> Option<KeyPress> {
        self.drain();
        self.queue.poll_keys(accepted)
    }

    fn check_exit(&mut self, key: &Key) -> bool {
        self.drain();
        self.queue.check_exit(key)
    }

    fn clear_events(&mut self) {
        self.drain();
        self.queue.clear_events();
    }
}
