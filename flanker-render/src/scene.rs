/// One element of a frame, drawn in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneItem {
    Fixation,
    Stimulus(String),
    Reminder,
    Feedback(String),
    /// Full-screen instruction text, wrapped to the screen width.
    Text(String),
}

/// Everything drawn for a single flip. An empty scene shows the background.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scene {
    items: Vec<SceneItem>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: SceneItem) {
        self.items.push(item);
    }

    pub fn items(&self) -> &[SceneItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Hands the composed scene over and leaves this one empty.
    pub fn take(&mut self) -> Scene {
        std::mem::take(self)
    }
}

impl FromIterator<SceneItem> for Scene {
    fn from_iter<I: IntoIterator<Item = SceneItem>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}
