//! Decoded Picture Cache
//!
//! Pictures live in an arena of slots. A [`PictureHandle`] names a slot and
//! the generation it was issued for; evicting a picture bumps the slot's
//! generation so every outstanding handle to it goes stale and
//! [`PictureCache::get`] returns `None` for it. Readers get an
//! `Arc<CachedPicture>`, which stays valid after eviction.

use std::ops::Range;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{debug, trace};

use crate::image::{DecodedImage, PixelData, PixelFormat};

/// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheOptions {
    /// Longest side of generated thumbnails; 0 disables thumbnails
    pub thumbnail_size: usize,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self { thumbnail_size: 128 }
    }
}

impl CacheOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thumbnail_size(mut self, size: usize) -> Self {
        self.thumbnail_size = size;
        self
    }

    pub fn without_thumbnails(mut self) -> Self {
        self.thumbnail_size = 0;
        self
    }
}

/// Names one cached picture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PictureHandle {
    index: u32,
    generation: u32,
}

/// A decoded picture with the page and scale it was rendered for
#[derive(Debug)]
pub struct CachedPicture {
    pub picture: DecodedImage,
    pub thumbnail: Option<DecodedImage>,
    pub page: usize,
    pub scale: f32,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    entry: Option<Arc<CachedPicture>>,
}

#[derive(Debug, Default)]
struct Arena {
    slots: Vec<Slot>,
    free: Vec<usize>,
    live: usize,
}

impl Arena {
    fn evict(&mut self, index: usize) -> Option<Arc<CachedPicture>> {
        let slot = &mut self.slots[index];
        let entry = slot.entry.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(index);
        self.live -= 1;
        Some(entry)
    }

    fn evict_where(&mut self, mut pred: impl FnMut(&CachedPicture) -> bool) -> usize {
        let doomed: Vec<usize> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.entry.as_deref().is_some_and(&mut pred))
            .map(|(i, _)| i)
            .collect();
        for &i in &doomed {
            self.evict(i);
        }
        doomed.len()
    }
}

/// Thread-safe cache of decoded pictures
#[derive(Debug, Default)]
pub struct PictureCache {
    options: CacheOptions,
    arena: RwLock<Arena>,
}

impl PictureCache {
    pub fn new(options: CacheOptions) -> Self {
        Self {
            options,
            arena: RwLock::default(),
        }
    }

    // a panicked writer leaves the arena consistent, so poisoning is ignored
    fn read(&self) -> RwLockReadGuard<'_, Arena> {
        self.arena.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Arena> {
        self.arena.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a picture, generating its thumbnail
    pub fn insert(&self, picture: DecodedImage, page: usize, scale: f32) -> PictureHandle {
        let thumbnail = (self.options.thumbnail_size > 0)
            .then(|| thumbnail(&picture, self.options.thumbnail_size));
        let entry = Arc::new(CachedPicture {
            picture,
            thumbnail,
            page,
            scale,
        });

        let mut arena = self.write();
        let index = match arena.free.pop() {
            Some(i) => i,
            None => {
                arena.slots.push(Slot::default());
                arena.slots.len() - 1
            }
        };
        let slot = &mut arena.slots[index];
        slot.entry = Some(entry);
        let handle = PictureHandle {
            index: index as u32,
            generation: slot.generation,
        };
        arena.live += 1;
        trace!("cached page {page} at scale {scale} in slot {index}");
        handle
    }

    /// The picture for `handle`, or `None` once it has been evicted
    pub fn get(&self, handle: PictureHandle) -> Option<Arc<CachedPicture>> {
        let arena = self.read();
        let slot = arena.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.entry.clone()
    }

    pub fn remove(&self, handle: PictureHandle) -> Option<Arc<CachedPicture>> {
        let mut arena = self.write();
        let index = handle.index as usize;
        if arena.slots.get(index)?.generation != handle.generation {
            return None;
        }
        arena.evict(index)
    }

    /// Evict pictures whose scale differs from `scale` by more than
    /// `tolerance`; returns how many were evicted
    pub fn invalidate_scale(&self, scale: f32, tolerance: f32) -> usize {
        let evicted = self.write().evict_where(|p| (p.scale - scale).abs() > tolerance);
        debug!("scale {scale}: evicted {evicted} cached pictures");
        evicted
    }

    /// Evict pictures of pages outside `pages`
    pub fn retain_window(&self, pages: Range<usize>) -> usize {
        let evicted = self.write().evict_where(|p| !pages.contains(&p.page));
        debug!("page window {pages:?}: evicted {evicted} cached pictures");
        evicted
    }

    pub fn clear(&self) {
        let mut arena = self.write();
        for i in 0..arena.slots.len() {
            arena.evict(i);
        }
    }

    pub fn len(&self) -> usize {
        self.read().live
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Box-filtered downscale so the longest side is at most `max_side`.
///
/// Gray and alpha images keep their format; RGBA images become RGBA8888.
pub fn thumbnail(image: &DecodedImage, max_side: usize) -> DecodedImage {
    let (w, h) = (image.width(), image.height());
    let longest = w.max(h).max(1);
    let (tw, th) = if longest <= max_side {
        (w, h)
    } else {
        (
            (w * max_side / longest).max(1),
            (h * max_side / longest).max(1),
        )
    };

    let format = match image.format() {
        PixelFormat::Rgba16161616 => PixelFormat::Rgba8888,
        f => f,
    };
    let channels = format.channels();
    let mut out = Vec::with_capacity(tw * th * channels);
    for ty in 0..th {
        let (y0, y1) = (ty * h / th, ((ty + 1) * h / th).max(ty * h / th + 1));
        for tx in 0..tw {
            let (x0, x1) = (tx * w / tw, ((tx + 1) * w / tw).max(tx * w / tw + 1));
            let mut sum = [0u32; 4];
            for y in y0..y1 {
                for x in x0..x1 {
                    let px = image.rgba8_at(x, y).unwrap_or_default();
                    for (s, v) in sum.iter_mut().zip(px) {
                        *s += u32::from(v);
                    }
                }
            }
            let n = ((x1 - x0) * (y1 - y0)) as u32;
            let avg = sum.map(|s| ((s + n / 2) / n) as u8);
            match format {
                PixelFormat::Gray8 => out.push(avg[0]),
                PixelFormat::Alpha8 => out.push(avg[3]),
                _ => out.extend_from_slice(&avg),
            }
        }
    }
    let mut thumb = DecodedImage::new(tw, th, format);
    if let PixelData::U8(buf) = thumb.data_mut() {
        *buf = out;
    }
    thumb
}
