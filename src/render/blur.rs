use crate::foundation::error::{StoryError, StoryResult};

/// Kernel radius covering three standard deviations.
pub fn radius_for_sigma(sigma: f32) -> u32 {
    if !sigma.is_finite() || sigma <= 0.0 {
        return 0;
    }
    (sigma * 3.0).ceil() as u32
}

/// Separable Gaussian blur of a premultiplied RGBA8 buffer, edge-clamped, q16 fixed point.
pub fn blur_rgba8_premul(
    src: &[u8],
    width: u32,
    height: u32,
    radius: u32,
    sigma: f32,
) -> StoryResult<Vec<u8>> {
    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| StoryError::render("blur buffer size overflow"))?;
    if src.len() != expected_len {
        return Err(StoryError::render(
            "blur_rgba8_premul expects src matching width*height*4",
        ));
    }
    if radius == 0 || expected_len == 0 {
        return Ok(src.to_vec());
    }

    let kernel = gaussian_kernel_q16(radius, sigma)?;
    let mut tmp = vec![0u8; expected_len];
    let mut out = vec![0u8; expected_len];

    horizontal_pass(src, &mut tmp, width, height, &kernel);
    vertical_pass(&tmp, &mut out, width, height, &kernel);
    Ok(out)
}

/// Gaussian blur with standard deviation `sigma`, run on a downsampled copy when `sigma` is
/// large. Output has the input's dimensions.
pub fn blur_sigma(src: &[u8], width: u32, height: u32, sigma: f32) -> StoryResult<Vec<u8>> {
    let factor = downsample_factor(sigma, width, height);
    if factor == 1 {
        return blur_rgba8_premul(src, width, height, radius_for_sigma(sigma), sigma);
    }

    let small_w = width.div_ceil(factor);
    let small_h = height.div_ceil(factor);
    let small_sigma = sigma / factor as f32;

    let full = premul_buffer(src, width, height)?;
    let small = image::imageops::resize(
        &full,
        small_w,
        small_h,
        image::imageops::FilterType::Triangle,
    );
    let blurred = blur_rgba8_premul(
        small.as_raw(),
        small_w,
        small_h,
        radius_for_sigma(small_sigma),
        small_sigma,
    )?;
    let blurred = premul_buffer(&blurred, small_w, small_h)?;
    let back = image::imageops::resize(
        &blurred,
        width,
        height,
        image::imageops::FilterType::Triangle,
    );
    Ok(back.into_raw())
}

/// Blurs above sigma 8 run at 1/2 or 1/4 resolution.
fn downsample_factor(sigma: f32, width: u32, height: u32) -> u32 {
    let factor = if sigma >= 16.0 {
        4
    } else if sigma >= 8.0 {
        2
    } else {
        1
    };
    if width < factor * 4 || height < factor * 4 {
        1
    } else {
        factor
    }
}

// Premultiplied bytes travel through `image` as opaque channel data; resizing is linear
// per channel so premultiplication is preserved.
fn premul_buffer(bytes: &[u8], width: u32, height: u32) -> StoryResult<image::RgbaImage> {
    image::RgbaImage::from_raw(width, height, bytes.to_vec())
        .ok_or_else(|| StoryError::render("blur buffer length does not match its dimensions"))
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> StoryResult<Vec<u32>> {
    if radius == 0 {
        return Ok(vec![1 << 16]);
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(StoryError::render("blur sigma must be > 0"));
    }

    let r = radius as i32;
    let mut weights_f = Vec::<f64>::with_capacity((2 * r + 1) as usize);
    let mut sum = 0.0f64;
    let sigma = sigma as f64;
    let denom = 2.0 * sigma * sigma;
    for i in -r..=r {
        let x = i as f64;
        let w = (-x * x / denom).exp();
        weights_f.push(w);
        sum += w;
    }
    if sum <= 0.0 {
        return Err(StoryError::render("gaussian kernel sum is zero"));
    }

    let mut weights = Vec::<u32>::with_capacity(weights_f.len());
    let mut acc: i64 = 0;
    for &wf in &weights_f {
        let q = ((wf / sum) * 65536.0).round() as i64;
        let q = q.clamp(0, 65536);
        weights.push(q as u32);
        acc += q;
    }
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        let new_mid = (i64::from(weights[mid]) + delta).clamp(0, 65536);
        weights[mid] = new_mid as u32;
    }

    Ok(weights)
}

fn horizontal_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    for y in 0..height as i32 {
        let row = (y * w) as usize;
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sx = (x + ki as i32 - radius).clamp(0, w - 1);
                let idx = (row + sx as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = (row + x as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn vertical_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let h = height as i32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sy = (y + ki as i32 - radius).clamp(0, h - 1);
                let idx = ((sy * w + x) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    let v = (acc + 32768) >> 16;
    (v.min(255)) as u8
}
