use std::{path::Path, sync::Arc};

use anyhow::Context as _;

use crate::{BackdropResult, assets::SourceImage, assets::decode::decode_image};

/// The single "current upload" slot.
///
/// Passed by reference into the preview and export adapters; nothing reads it through ambient
/// state. A successful load replaces both the decoded image and the raw bytes wholesale; a failed
/// load leaves the slot empty.
#[derive(Clone, Debug, Default)]
pub struct SourceSlot {
    current: Option<Loaded>,
}

#[derive(Clone, Debug)]
struct Loaded {
    image: SourceImage,
    data: Arc<Vec<u8>>,
}

impl SourceSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot pre-filled with an already decoded image (no raw upload bytes).
    pub fn with_image(image: SourceImage) -> Self {
        Self {
            current: Some(Loaded {
                image,
                data: Arc::new(Vec::new()),
            }),
        }
    }

    pub fn current_image(&self) -> Option<&SourceImage> {
        self.current.as_ref().map(|l| &l.image)
    }

    /// Raw bytes of the current upload; used only as an "is anything loaded" gate.
    pub fn current_image_data(&self) -> Option<&[u8]> {
        self.current.as_ref().map(|l| l.data.as_slice())
    }

    pub fn is_loaded(&self) -> bool {
        self.current.is_some()
    }

    /// Decode `bytes` and, only once decoding has completed, make them current.
    pub fn load_bytes(&mut self, bytes: Vec<u8>) -> BackdropResult<&SourceImage> {
        match decode_image(&bytes) {
            Ok(image) => {
                tracing::debug!(
                    width = image.width(),
                    height = image.height(),
                    bytes = bytes.len(),
                    "source replaced"
                );
                let loaded = self.current.insert(Loaded {
                    image,
                    data: Arc::new(bytes),
                });
                Ok(&loaded.image)
            }
            Err(e) => {
                self.current = None;
                Err(e)
            }
        }
    }

    pub fn load_file(&mut self, path: &Path) -> BackdropResult<&SourceImage> {
        let read = std::fs::read(path).with_context(|| format!("read image '{}'", path.display()));
        match read {
            Ok(bytes) => self.load_bytes(bytes),
            Err(e) => {
                self.current = None;
                Err(e.into())
            }
        }
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}
