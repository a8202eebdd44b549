//! Bridges incoming video frames to GPU textures.

use super::FrameError;
use crate::frame::{PixelFormat, VideoFrame};

/// Upper bound on live texture slots. Capture sources rarely switch between
/// more than two resolutions, a third slot absorbs transient mode changes.
const CACHE_CAPACITY: usize = 3;

/// A bounded cache of per-resolution resources with least-recently-used
/// eviction. Entry creation is fallible; a failed creation leaves the cache
/// untouched so callers can fall back to whatever they held before.
pub struct FrameCache<T> {
    capacity: usize,
    slots: Vec<CacheSlot<T>>,
    tick: u64,
}

struct CacheSlot<T> {
    width: u32,
    height: u32,
    last_used: u64,
    resource: T,
}

impl<T> FrameCache<T> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0);
        Self {
            capacity,
            slots: Vec::new(),
            tick: 0,
        }
    }

    /// Returns the resource for (width, height), creating it if no slot
    /// matches. Evicts the least recently used slot once over capacity.
    pub fn acquire_with<E>(
        &mut self,
        width: u32,
        height: u32,
        create: impl FnOnce() -> Result<T, E>,
    ) -> Result<&T, E> {
        self.tick += 1;

        if let Some(idx) = self
            .slots
            .iter()
            .position(|s| s.width == width && s.height == height)
        {
            self.slots[idx].last_used = self.tick;
            return Ok(&self.slots[idx].resource);
        }

        let resource = create()?;
        self.slots.push(CacheSlot {
            width,
            height,
            last_used: self.tick,
            resource,
        });

        if self.slots.len() > self.capacity {
            let oldest = self
                .slots
                .iter()
                .enumerate()
                .min_by_key(|(_, s)| s.last_used)
                .map(|(i, _)| i)
                .unwrap_or(0);
            self.slots.remove(oldest);
        }

        Ok(&self.slots.last().unwrap().resource)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Converts incoming BGRA video frames into GPU textures.
///
/// The texture returned by [`acquire`](Self::acquire) is valid for the
/// current tick's command submission; the bridge reuses its backing slots
/// across frames, so a caller must not hold a texture past the tick expecting
/// stable contents.
pub struct TextureBridge {
    cache: FrameCache<wgpu::Texture>,
}

impl TextureBridge {
    pub fn new() -> Self {
        Self {
            cache: FrameCache::new(CACHE_CAPACITY),
        }
    }

    /// Produces a texture holding the given frame's pixels.
    ///
    /// On failure the cache is left untouched and no texture is returned;
    /// the caller keeps its previously bound texture and rendering continues
    /// with stale content.
    pub fn acquire(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        frame: &VideoFrame,
    ) -> Result<wgpu::Texture, FrameError> {
        if frame.format != PixelFormat::Bgra {
            return Err(FrameError::UnsupportedFormat(frame.format));
        }
        if frame.data.len() != frame.expected_len() {
            return Err(FrameError::FrameSizeMismatch {
                actual: frame.data.len(),
                expected: frame.expected_len(),
                width: frame.width,
                height: frame.height,
            });
        }

        let texture = self
            .cache
            .acquire_with(frame.width, frame.height, || -> Result<_, FrameError> {
                tracing::info!("Creating {}x{} video texture", frame.width, frame.height);
                Ok(device.create_texture(&wgpu::TextureDescriptor {
                    label: Some("Video Frame Texture"),
                    size: wgpu::Extent3d {
                        width: frame.width,
                        height: frame.height,
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: wgpu::TextureFormat::Bgra8Unorm,
                    usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                    view_formats: &[],
                }))
            })?;

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &frame.data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(frame.width * 4),
                rows_per_image: Some(frame.height),
            },
            wgpu::Extent3d {
                width: frame.width,
                height: frame.height,
                depth_or_array_layers: 1,
            },
        );

        Ok(texture.clone())
    }
}

impl Default for TextureBridge {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_reuses_matching_slot() {
        let mut cache: FrameCache<u32> = FrameCache::new(3);
        let mut created = 0;

        for _ in 0..5 {
            cache
                .acquire_with(1280, 720, || -> Result<_, ()> {
                    created += 1;
                    Ok(created)
                })
                .unwrap();
        }

        assert_eq!(created, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_never_grows_past_capacity() {
        let mut cache: FrameCache<u32> = FrameCache::new(3);

        for size in 0..10u32 {
            cache
                .acquire_with(640 + size, 480, || Ok::<_, ()>(size))
                .unwrap();
            assert!(cache.len() <= 3);
        }

        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_cache_evicts_least_recently_used() {
        let mut cache: FrameCache<&str> = FrameCache::new(2);

        cache.acquire_with(100, 100, || Ok::<_, ()>("a")).unwrap();
        cache.acquire_with(200, 200, || Ok::<_, ()>("b")).unwrap();
        // Touch "a" so "b" becomes the eviction candidate
        cache.acquire_with(100, 100, || Ok::<_, ()>("a2")).unwrap();
        cache.acquire_with(300, 300, || Ok::<_, ()>("c")).unwrap();

        let mut created_b_again = false;
        cache
            .acquire_with(100, 100, || -> Result<_, ()> {
                created_b_again = true;
                Ok("a3")
            })
            .unwrap();
        assert!(!created_b_again, "slot for 100x100 should have survived");
    }

    #[test]
    fn test_failed_creation_leaves_cache_untouched() {
        let mut cache: FrameCache<u32> = FrameCache::new(3);
        cache.acquire_with(1280, 720, || Ok::<_, &str>(7)).unwrap();

        let result = cache.acquire_with(1920, 1080, || Err::<u32, &str>("boom"));
        assert_eq!(result.unwrap_err(), "boom");
        assert_eq!(cache.len(), 1);

        // Prior slot still resolves without re-creating
        let mut recreated = false;
        let prior = cache
            .acquire_with(1280, 720, || -> Result<_, &str> {
                recreated = true;
                Ok(0)
            })
            .unwrap();
        assert_eq!(*prior, 7);
        assert!(!recreated);
    }
}
