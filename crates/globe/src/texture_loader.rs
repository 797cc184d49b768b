//! Best-effort imagery loading.
//!
//! A [`TextureSource`] fetches bytes and reports back through a one-shot
//! callback, possibly long after the request and possibly after the engine
//! is gone. Completions land in an inbox that the engine drains on its next
//! tick; the callback only holds a weak reference, and a disposed inbox
//! swallows late results.

use std::cell::RefCell;
use std::io::Cursor;
use std::path::PathBuf;
use std::rc::{Rc, Weak};

use gpu::textures::Texture;
use image::ImageReader;
use tracing::debug;

use crate::error::TextureLoadError;

pub type LoadCallback = Box<dyn FnOnce(Result<Vec<u8>, TextureLoadError>)>;

/// Where imagery bytes come from (network, filesystem, test double).
pub trait TextureSource {
    /// Starts a load. `done` is invoked exactly once, now or later.
    fn load(&mut self, url: &str, done: LoadCallback);
}

/// Decodes PNG/JPEG bytes into an equirectangular surface texture.
pub fn decode_texture(bytes: &[u8]) -> Result<Texture, TextureLoadError> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    if reader.format().is_none() {
        return Err(TextureLoadError::Unsupported("unrecognized image format".to_string()));
    }
    let image = reader.decode()?;
    if image.width() == 0 || image.height() == 0 {
        return Err(TextureLoadError::Unsupported("empty image".to_string()));
    }
    Ok(Texture::equirectangular(image.to_rgba8()))
}

#[derive(Debug)]
pub struct CompletedLoad {
    pub generation: u64,
    pub url: String,
    pub result: Result<Texture, TextureLoadError>,
}

#[derive(Debug, Default)]
struct Inbox {
    disposed: bool,
    generation: u64,
    completed: Vec<CompletedLoad>,
}

pub struct TextureLoader {
    source: Box<dyn TextureSource>,
    inbox: Rc<RefCell<Inbox>>,
    external_allowed: bool,
}

impl TextureLoader {
    pub fn new(source: Box<dyn TextureSource>, external_allowed: bool) -> Self {
        Self {
            source,
            inbox: Rc::new(RefCell::new(Inbox::default())),
            external_allowed,
        }
    }

    /// Issues a load for `url`, superseding any load still in flight.
    /// Returns the request generation.
    pub fn request(&mut self, url: &str) -> Result<u64, TextureLoadError> {
        if !self.external_allowed {
            return Err(TextureLoadError::Consent);
        }
        let generation = {
            let mut inbox = self.inbox.borrow_mut();
            if inbox.disposed {
                return Ok(inbox.generation);
            }
            inbox.generation += 1;
            inbox.generation
        };

        let weak: Weak<RefCell<Inbox>> = Rc::downgrade(&self.inbox);
        let owned_url = url.to_string();
        self.source.load(
            url,
            Box::new(move |result| {
                let Some(inbox) = weak.upgrade() else {
                    debug!(url = %owned_url, "imagery resolved after its engine was dropped");
                    return;
                };
                let mut inbox = inbox.borrow_mut();
                if inbox.disposed {
                    debug!(url = %owned_url, "imagery resolved after teardown");
                    return;
                }
                inbox.completed.push(CompletedLoad {
                    generation,
                    url: owned_url,
                    result: result.and_then(|bytes| decode_texture(&bytes)),
                });
            }),
        );
        Ok(generation)
    }

    /// Completions of the latest request. Superseded results are dropped.
    pub fn take_completed(&mut self) -> Vec<CompletedLoad> {
        let mut inbox = self.inbox.borrow_mut();
        let current = inbox.generation;
        let mut out = Vec::new();
        for load in inbox.completed.drain(..) {
            if load.generation == current {
                out.push(load);
            } else {
                debug!(url = %load.url, generation = load.generation, "dropping superseded imagery");
            }
        }
        out
    }

    /// Turns every outstanding and future completion into a no-op.
    pub fn dispose(&mut self) {
        let mut inbox = self.inbox.borrow_mut();
        inbox.disposed = true;
        inbox.completed.clear();
    }

    pub fn is_disposed(&self) -> bool {
        self.inbox.borrow().disposed
    }
}

/// Reads imagery from local paths, completing synchronously.
#[derive(Debug, Default)]
pub struct FileTextureSource {
    base: Option<PathBuf>,
}

impl FileTextureSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves relative urls against `base`.
    pub fn with_base(base: impl Into<PathBuf>) -> Self {
        Self {
            base: Some(base.into()),
        }
    }
}

impl TextureSource for FileTextureSource {
    fn load(&mut self, url: &str, done: LoadCallback) {
        let path = match &self.base {
            Some(base) => base.join(url),
            None => PathBuf::from(url),
        };
        done(std::fs::read(path).map_err(TextureLoadError::from));
    }
}

struct PendingLoad {
    url: String,
    done: LoadCallback,
}

/// Holds loads until the test resolves them. Clones share the queue.
#[derive(Clone, Default)]
pub struct ManualTextureSource {
    pending: Rc<RefCell<Vec<PendingLoad>>>,
}

impl ManualTextureSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_urls(&self) -> Vec<String> {
        self.pending.borrow().iter().map(|p| p.url.clone()).collect()
    }

    /// Completes the oldest load of `url`. Returns `false` if none is pending.
    pub fn resolve(&self, url: &str, bytes: Vec<u8>) -> bool {
        self.complete(url, Ok(bytes))
    }

    pub fn fail(&self, url: &str, err: TextureLoadError) -> bool {
        self.complete(url, Err(err))
    }

    fn complete(&self, url: &str, result: Result<Vec<u8>, TextureLoadError>) -> bool {
        let load = {
            let mut pending = self.pending.borrow_mut();
            match pending.iter().position(|p| p.url == url) {
                Some(i) => pending.remove(i),
                None => return false,
            }
        };
        (load.done)(result);
        true
    }
}

impl TextureSource for ManualTextureSource {
    fn load(&mut self, url: &str, done: LoadCallback) {
        self.pending.borrow_mut().push(PendingLoad {
            url: url.to_string(),
            done,
        });
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::io::Cursor;

    use image::{ImageFormat, Rgba, RgbaImage};

    /// A small PNG for imagery tests.
    pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, Rgba([40, 90, 160, 255]));
        let mut out = Cursor::new(Vec::new());
        image
            .write_to(&mut out, ImageFormat::Png)
            .expect("png encode");
        out.into_inner()
    }
}
