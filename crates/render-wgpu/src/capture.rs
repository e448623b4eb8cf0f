use lumen_render::{CaptureError, CapturedFrame};

const BYTES_PER_PIXEL: u32 = 4;

/// Channel order of a presentable 8-bit surface format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChannelOrder {
    Rgba,
    Bgra,
}

fn channel_order(format: wgpu::TextureFormat) -> Option<ChannelOrder> {
    match format {
        wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb => {
            Some(ChannelOrder::Rgba)
        }
        wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb => {
            Some(ChannelOrder::Bgra)
        }
        _ => None,
    }
}

/// Check that a texture with this format and usage can be read back.
pub(crate) fn readable(
    format: wgpu::TextureFormat,
    usage: wgpu::TextureUsages,
) -> Result<ChannelOrder, CaptureError> {
    let order = channel_order(format)
        .ok_or_else(|| CaptureError::Unsupported(format!("surface format {format:?}")))?;
    if !usage.contains(wgpu::TextureUsages::COPY_SRC) {
        return Err(CaptureError::Unsupported(
            "surface cannot be used as a copy source".into(),
        ));
    }
    Ok(order)
}

/// Row pitch of a texture-to-buffer copy, rounded up to the copy alignment.
pub(crate) fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * BYTES_PER_PIXEL;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Strip row padding and reorder channels into tightly packed RGBA8.
fn unpack_rows(
    padded: &[u8],
    width: u32,
    height: u32,
    order: ChannelOrder,
) -> Result<Vec<u8>, CaptureError> {
    let pitch = padded_bytes_per_row(width) as usize;
    let row_bytes = (width * BYTES_PER_PIXEL) as usize;
    let expected = pitch * height as usize;
    if padded.len() < expected {
        return Err(CaptureError::SizeMismatch {
            expected,
            actual: padded.len(),
        });
    }

    let mut rgba = Vec::with_capacity(row_bytes * height as usize);
    for row in padded.chunks_exact(pitch).take(height as usize) {
        rgba.extend_from_slice(&row[..row_bytes]);
    }
    if order == ChannelOrder::Bgra {
        for pixel in rgba.chunks_exact_mut(BYTES_PER_PIXEL as usize) {
            pixel.swap(0, 2);
        }
    }
    Ok(rgba)
}

/// Copy `texture` into a mappable buffer and read it back synchronously.
///
/// Work already recorded in `encoder` is submitted together with the copy, so
/// the readback reflects everything drawn into the texture so far. `order`
/// comes from [`readable`], checked before the encoder was handed over.
pub(crate) fn read_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    mut encoder: wgpu::CommandEncoder,
    texture: &wgpu::Texture,
    order: ChannelOrder,
) -> Result<CapturedFrame, CaptureError> {
    let format = texture.format();

    let width = texture.width();
    let height = texture.height();
    let pitch = padded_bytes_per_row(width);
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("capture_readback"),
        size: u64::from(pitch) * u64::from(height),
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(pitch),
                rows_per_image: Some(height),
            },
        },
        texture.size(),
    );
    queue.submit(std::iter::once(encoder.finish()));

    let slice = buffer.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    let _ = device.poll(wgpu::Maintain::Wait);
    rx.recv()
        .map_err(|err| CaptureError::Readback(err.to_string()))?
        .map_err(|err| CaptureError::Readback(err.to_string()))?;

    let rgba = {
        let mapped = slice.get_mapped_range();
        unpack_rows(&mapped, width, height, order)?
    };
    buffer.unmap();

    tracing::debug!(width, height, ?format, "surface read back");
    Ok(CapturedFrame {
        width,
        height,
        rgba,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_pad_to_copy_alignment() {
        assert_eq!(padded_bytes_per_row(64), 256);
        assert_eq!(padded_bytes_per_row(65), 512);
        assert_eq!(padded_bytes_per_row(1024), 4096);
    }

    #[test]
    fn unpack_drops_padding_and_swizzles_bgra() {
        let width = 2;
        let height = 2;
        let pitch = padded_bytes_per_row(width) as usize;
        let mut padded = vec![0xEE; pitch * 2];
        padded[..8].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        padded[pitch..pitch + 8].copy_from_slice(&[9, 10, 11, 12, 13, 14, 15, 16]);

        let rgba = unpack_rows(&padded, width, height, ChannelOrder::Bgra).unwrap();
        assert_eq!(
            rgba,
            vec![3, 2, 1, 4, 7, 6, 5, 8, 11, 10, 9, 12, 15, 14, 13, 16]
        );

        let straight = unpack_rows(&padded, width, height, ChannelOrder::Rgba).unwrap();
        assert_eq!(&straight[..4], &[1, 2, 3, 4]);
        assert_eq!(straight.len(), 16);
    }

    #[test]
    fn short_buffer_is_rejected() {
        let err = unpack_rows(&[0; 16], 2, 2, ChannelOrder::Rgba).unwrap_err();
        assert!(matches!(
            err,
            CaptureError::SizeMismatch {
                expected: 512,
                actual: 16
            }
        ));
    }

    #[test]
    fn only_eight_bit_surfaces_are_readable() {
        assert_eq!(
            channel_order(wgpu::TextureFormat::Bgra8UnormSrgb),
            Some(ChannelOrder::Bgra)
        );
        assert_eq!(channel_order(wgpu::TextureFormat::Rgba16Float), None);
    }

    #[test]
    fn readability_is_decided_from_format_and_usage() {
        let usage = wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC;
        assert_eq!(
            readable(wgpu::TextureFormat::Rgba8UnormSrgb, usage).unwrap(),
            ChannelOrder::Rgba
        );

        let err = readable(wgpu::TextureFormat::Rgba16Float, usage).unwrap_err();
        assert!(matches!(err, CaptureError::Unsupported(msg) if msg.contains("Rgba16Float")));

        let err = readable(
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        )
        .unwrap_err();
        assert!(matches!(err, CaptureError::Unsupported(msg) if msg.contains("copy source")));
    }
}
