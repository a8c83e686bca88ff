//! Texture codec.
//!
//! PNG decode/encode, region crops, overlay compositing and nearest-neighbor
//! scaling over RGBA8 bitmaps. Every operation here is pure and
//! deterministic: the same input always produces byte-identical output, which
//! is what lets derived renders be cached and reproduced.

use crate::error::{Error, Result};
use crate::texture::{RenderKind, RenderSize, TextureSlot};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageFormat, Rgba, RgbaImage};

/// Decoded texture in straight-alpha RGBA8.
pub type Bitmap = RgbaImage;

/// A pixel rectangle inside a texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the rectangle lies fully inside a `width` x `height` bitmap.
    pub fn fits(&self, width: u32, height: u32) -> bool {
        self.x.checked_add(self.width).is_some_and(|r| r <= width)
            && self.y.checked_add(self.height).is_some_and(|b| b <= height)
    }
}

/// Front face of the head.
pub const FACE: Rect = Rect::new(8, 8, 8, 8);

/// Front face of the hat layer (64x64 layout only).
pub const FACE_OVERLAY: Rect = Rect::new(40, 8, 8, 8);

/// Placeholder color for avatars.
pub const AVATAR_PLACEHOLDER: Rgba<u8> = Rgba([128, 128, 128, 255]);

/// Placeholder color for heads.
pub const HEAD_PLACEHOLDER: Rgba<u8> = Rgba([139, 69, 19, 255]);

/// Skin texture geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkinLayout {
    /// 64x32, no overlay layer for the head.
    Legacy,
    /// 64x64 with a second layer.
    Modern,
}

impl SkinLayout {
    /// Detect the layout of a skin bitmap, if it has a valid one.
    pub fn of(bitmap: &Bitmap) -> Option<Self> {
        match bitmap.dimensions() {
            (64, 64) => Some(Self::Modern),
            (64, 32) => Some(Self::Legacy),
            _ => None,
        }
    }
}

/// Decode PNG bytes. Any other format is rejected.
pub fn decode(bytes: &[u8]) -> Result<Bitmap> {
    let image = image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .map_err(|e| Error::Decode(e.to_string()))?;
    Ok(image.to_rgba8())
}

/// Check a bitmap against the accepted shapes for `slot`.
///
/// Skins are 64x64 or 64x32; capes are exactly 64x32.
pub fn validate_dimensions(bitmap: &Bitmap, slot: TextureSlot) -> bool {
    match slot {
        TextureSlot::Skin => SkinLayout::of(bitmap).is_some(),
        TextureSlot::Cape => bitmap.dimensions() == (64, 32),
    }
}

/// Like [`validate_dimensions`], as a `Result`.
pub fn ensure_dimensions(bitmap: &Bitmap, slot: TextureSlot) -> Result<()> {
    if validate_dimensions(bitmap, slot) {
        Ok(())
    } else {
        let (width, height) = bitmap.dimensions();
        Err(Error::DimensionMismatch {
            slot,
            width,
            height,
        })
    }
}

/// Decode an uploaded texture and check its shape.
pub fn decode_texture(bytes: &[u8], slot: TextureSlot) -> Result<Bitmap> {
    let bitmap = decode(bytes)?;
    ensure_dimensions(&bitmap, slot)?;
    Ok(bitmap)
}

/// Copy a region out of `bitmap`.
///
/// The caller validates `rect` against the known layout first.
pub fn crop_region(bitmap: &Bitmap, rect: Rect) -> Bitmap {
    debug_assert!(
        rect.fits(bitmap.width(), bitmap.height()),
        "crop region {rect:?} out of bounds"
    );
    image::imageops::crop_imm(bitmap, rect.x, rect.y, rect.width, rect.height).to_image()
}

/// Lay `overlay` on top of `base`.
///
/// With `alpha_blend` the overlay is source-over composited; without it the
/// overlay pixels replace the base.
pub fn composite_overlay(base: &Bitmap, overlay: &Bitmap, alpha_blend: bool) -> Bitmap {
    debug_assert_eq!(base.dimensions(), overlay.dimensions());
    let mut out = base.clone();
    for (dst, src) in out.pixels_mut().zip(overlay.pixels()) {
        *dst = if alpha_blend { over(*dst, *src) } else { *src };
    }
    out
}

/// Scale to a `size` x `size` square by integer nearest-neighbor mapping.
pub fn scale_nearest(bitmap: &Bitmap, size: RenderSize) -> Bitmap {
    let (width, height) = bitmap.dimensions();
    let target = u64::from(size.get());
    RgbaImage::from_fn(size.get(), size.get(), |x, y| {
        let sx = (u64::from(x) * u64::from(width) / target) as u32;
        let sy = (u64::from(y) * u64::from(height) / target) as u32;
        *bitmap.get_pixel(sx, sy)
    })
}

/// Encode as PNG.
pub fn encode(bitmap: &Bitmap) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf)
        .write_image(
            bitmap.as_raw(),
            bitmap.width(),
            bitmap.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| Error::Encode(e.to_string()))?;
    Ok(buf)
}

/// Flat-color fallback served when no usable source exists.
pub fn placeholder(kind: RenderKind, size: RenderSize) -> Bitmap {
    let color = match kind {
        RenderKind::Avatar => AVATAR_PLACEHOLDER,
        RenderKind::Head => HEAD_PLACEHOLDER,
    };
    RgbaImage::from_pixel(size.get(), size.get(), color)
}

/// Run the fixed recipe for `kind` on a skin, before scaling.
pub fn derive_face(kind: RenderKind, skin: &Bitmap) -> Result<Bitmap> {
    let layout = SkinLayout::of(skin).ok_or_else(|| Error::DimensionMismatch {
        slot: TextureSlot::Skin,
        width: skin.width(),
        height: skin.height(),
    })?;

    let face = crop_region(skin, FACE);
    match (kind, layout) {
        (RenderKind::Head, SkinLayout::Modern) => {
            let hat = crop_region(skin, FACE_OVERLAY);
            Ok(composite_overlay(&face, &hat, true))
        }
        _ => Ok(face),
    }
}

/// Full derivation: decode, validate, recipe, scale, encode.
pub fn render(kind: RenderKind, size: RenderSize, raw: &[u8]) -> Result<Vec<u8>> {
    let skin = decode_texture(raw, TextureSlot::Skin)?;
    let face = derive_face(kind, &skin)?;
    encode(&scale_nearest(&face, size))
}

/// Encode the placeholder for `kind` at `size`.
pub fn render_placeholder(kind: RenderKind, size: RenderSize) -> Result<Vec<u8>> {
    encode(&placeholder(kind, size))
}

fn over(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    match src[3] {
        0 => return dst,
        255 => return src,
        _ => {}
    }

    let s = premultiply(src);
    let d = premultiply(dst);
    let inv = 255u16 - u16::from(s[3]);

    let mut out = [0u8; 4];
    out[3] = s[3].saturating_add(mul_div255(d[3], inv));
    for i in 0..3 {
        out[i] = s[i].saturating_add(mul_div255(d[i], inv));
    }
    unpremultiply(out)
}

fn premultiply(px: Rgba<u8>) -> [u8; 4] {
    let a = u16::from(px[3]);
    [
        mul_div255(px[0], a),
        mul_div255(px[1], a),
        mul_div255(px[2], a),
        px[3],
    ]
}

fn unpremultiply(px: [u8; 4]) -> Rgba<u8> {
    let a = u32::from(px[3]);
    if a == 0 {
        return Rgba([0, 0, 0, 0]);
    }
    let channel = |c: u8| ((u32::from(c) * 255 + a / 2) / a).min(255) as u8;
    Rgba([channel(px[0]), channel(px[1]), channel(px[2]), px[3]])
}

fn mul_div255(x: u8, y: u16) -> u8 {
    ((u32::from(x) * u32::from(y) + 127) / 255) as u8
}
