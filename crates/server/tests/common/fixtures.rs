//! Test fixtures: texture builders and a storage backend with injectable faults.

use async_trait::async_trait;
use bytes::Bytes;
use image::{Rgba, RgbaImage};
use skinvault_storage::{MemoryBackend, ObjectStore, StorageError, StorageResult};
use std::sync::atomic::{AtomicBool, Ordering};

/// Encode an image as PNG bytes.
#[allow(dead_code)]
pub fn png(image: &RgbaImage) -> Bytes {
    Bytes::from(skinvault_core::codec::encode(image).expect("encode fixture"))
}

/// Decode PNG bytes produced by the server.
#[allow(dead_code)]
pub fn decode(bytes: &[u8]) -> RgbaImage {
    image::load_from_memory_with_format(bytes, image::ImageFormat::Png)
        .expect("decode response")
        .to_rgba8()
}

/// A fully opaque skin whose every pixel is distinct per `seed`.
///
/// Pixel (x, y) is `[x * 3, y * 3, seed, 255]`.
#[allow(dead_code)]
pub fn skin_image(width: u32, height: u32, seed: u8) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 3) as u8, (y * 3) as u8, seed, 255])
    })
}

/// A 64x64 skin with a fully transparent hat region.
#[allow(dead_code)]
pub fn modern_skin(seed: u8) -> RgbaImage {
    let mut image = skin_image(64, 64, seed);
    for y in 8..16 {
        for x in 40..48 {
            image.put_pixel(x, y, Rgba([0, 0, 0, 0]));
        }
    }
    image
}

#[allow(dead_code)]
pub fn modern_skin_png(seed: u8) -> Bytes {
    png(&modern_skin(seed))
}

#[allow(dead_code)]
pub fn legacy_skin_png(seed: u8) -> Bytes {
    png(&skin_image(64, 32, seed))
}

#[allow(dead_code)]
pub fn cape_png(seed: u8) -> Bytes {
    png(&skin_image(64, 32, seed))
}

/// Object store that can be told to fail every operation on derived artifacts.
///
/// Source blobs keep working so the registry stays usable.
#[allow(dead_code)]
#[derive(Default)]
pub struct FlakyArtifactBackend {
    inner: MemoryBackend,
    failing: AtomicBool,
}

#[allow(dead_code)]
impl FlakyArtifactBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self, key: &str) -> StorageResult<()> {
        if self.failing.load(Ordering::SeqCst) && key.starts_with("derived/") {
            return Err(StorageError::Io(std::io::Error::other(
                "injected artifact store failure",
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for FlakyArtifactBackend {
    async fn exists(&self, key: &str) -> StorageResult<bool> {
        self.check(key)?;
        self.inner.exists(key).await
    }

    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        self.check(key)?;
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, data: Bytes) -> StorageResult<()> {
        self.check(key)?;
        self.inner.put(key, data).await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.check(key)?;
        self.inner.delete(key).await
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        self.check(prefix)?;
        self.inner.list(prefix).await
    }

    fn backend_name(&self) -> &'static str {
        "flaky"
    }
}
