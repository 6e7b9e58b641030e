use parking_lot::Mutex;

pub type SurfaceId = u64;

/// An editable text field observed by the assistant.
///
/// `id` must stay stable for the life of the field; it keys the one-call-
/// in-flight guard and identifies the undo target.
pub trait TextSurface: Send + Sync {
    fn id(&self) -> SurfaceId;

    fn text(&self) -> String;

    fn replace(&self, text: &str) -> anyhow::Result<()>;
}

/// A surface backed by a string, used by the console runner and tests.
#[derive(Debug)]
pub struct MemorySurface {
    id: SurfaceId,
    text: Mutex<String>,
}

impl MemorySurface {
    pub fn new(id: SurfaceId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: Mutex::new(text.into()),
        }
    }

    /// Simulates the user typing: overwrites the content.
    pub fn set_text(&self, text: impl Into<String>) {
        *self.text.lock() = text.into();
    }
}

impl TextSurface for MemorySurface {
    fn id(&self) -> SurfaceId {
        self.id
    }

    fn text(&self) -> String {
        self.text.lock().clone()
    }

    fn replace(&self, text: &str) -> anyhow::Result<()> {
        *self.text.lock() = text.to_string();
        Ok(())
    }
}
