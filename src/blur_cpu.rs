use crate::{BackdropError, BackdropResult};

/// Separable Gaussian blur over premultiplied RGBA8 with Q16 fixed-point weights.
///
/// Edges clamp, so a constant image stays constant.
#[derive(Clone, Debug)]
pub struct GaussianBlur {
    kernel: Vec<u32>,
}

impl GaussianBlur {
    pub fn new(radius: u32, sigma: f32) -> BackdropResult<Self> {
        Ok(Self {
            kernel: gaussian_kernel_q16(radius, sigma)?,
        })
    }

    pub fn radius(&self) -> u32 {
        (self.kernel.len() / 2) as u32
    }

    pub fn apply(&self, src: &[u8], width: u32, height: u32) -> BackdropResult<Vec<u8>> {
        let expected_len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| BackdropError::render("blur buffer size overflow"))?;
        if src.len() != expected_len {
            return Err(BackdropError::render(
                "blur expects a buffer matching width*height*4",
            ));
        }
        if self.kernel.len() == 1 {
            return Ok(src.to_vec());
        }

        let (w, h) = (width as usize, height as usize);
        let mut tmp = vec![0u8; expected_len];
        let mut out = vec![0u8; expected_len];
        // Rows, then columns: the same 1D pass with swapped strides.
        convolve(src, &mut tmp, w, h, 1, w, &self.kernel);
        convolve(&tmp, &mut out, h, w, w, 1, &self.kernel);
        Ok(out)
    }
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> BackdropResult<Vec<u32>> {
    if radius == 0 {
        return Ok(vec![1 << 16]);
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(BackdropError::validation("blur sigma must be > 0"));
    }

    let r = radius as i32;
    let denom = 2.0 * f64::from(sigma) * f64::from(sigma);
    let weights_f: Vec<f64> = (-r..=r)
        .map(|i| (-(f64::from(i) * f64::from(i)) / denom).exp())
        .collect();
    let sum: f64 = weights_f.iter().sum();
    if sum <= 0.0 {
        return Err(BackdropError::render("gaussian kernel sum is zero"));
    }

    let mut weights: Vec<u32> = weights_f
        .iter()
        .map(|wf| ((wf / sum) * 65536.0).round().clamp(0.0, 65536.0) as u32)
        .collect();

    // Fold the rounding residue into the center tap so the kernel sums to exactly 1.0.
    let acc: i64 = weights.iter().map(|&q| i64::from(q)).sum();
    let mid = weights.len() / 2;
    weights[mid] = (i64::from(weights[mid]) + 65536 - acc).clamp(0, 65536) as u32;

    Ok(weights)
}

/// Convolve `lines` runs of `len` pixels each.
///
/// `step` is the pixel distance between neighbours along a run, `line_step` the distance between
/// the first pixels of consecutive runs.
fn convolve(
    src: &[u8],
    dst: &mut [u8],
    len: usize,
    lines: usize,
    step: usize,
    line_step: usize,
    k: &[u32],
) {
    let radius = (k.len() / 2) as isize;
    let last = len as isize - 1;
    for line in 0..lines {
        let base = line * line_step;
        for i in 0..len {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let j = (i as isize + ki as isize - radius).clamp(0, last) as usize;
                let idx = (base + j * step) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out = (base + i * step) * 4;
            for c in 0..4 {
                dst[out + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    ((acc + 32768) >> 16).min(255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radius_0_is_identity() {
        let src = vec![1u8, 2, 3, 4, 5, 6, 7, 8];
        let out = GaussianBlur::new(0, 1.0).unwrap().apply(&src, 1, 2).unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn constant_image_is_unchanged() {
        let (w, h) = (4u32, 3u32);
        let src = [10u8, 20, 30, 40].repeat((w * h) as usize);
        let out = GaussianBlur::new(3, 2.0).unwrap().apply(&src, w, h).unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn single_pixel_spreads_and_conserves_energy() {
        let (w, h) = (5u32, 5u32);
        let mut src = vec![0u8; (w * h * 4) as usize];
        let center = ((2 * w + 2) * 4) as usize;
        src[center..center + 4].copy_from_slice(&[255, 255, 255, 255]);

        let out = GaussianBlur::new(2, 1.2).unwrap().apply(&src, w, h).unwrap();

        assert!(out.chunks_exact(4).filter(|px| px[3] != 0).count() > 1);
        let sum_a: u32 = out.chunks_exact(4).map(|px| u32::from(px[3])).sum();
        assert!((sum_a as i32 - 255).abs() <= 4);
    }

    #[test]
    fn blur_is_symmetric_on_non_square_buffers() {
        let (w, h) = (7u32, 3u32);
        let mut src = vec![0u8; (w * h * 4) as usize];
        let center = ((w + 3) * 4) as usize;
        src[center + 3] = 255;
        let out = GaussianBlur::new(2, 1.0).unwrap().apply(&src, w, h).unwrap();
        let a = |x: u32, y: u32| out[((y * w + x) * 4 + 3) as usize];
        assert_eq!(a(2, 1), a(4, 1));
        assert_eq!(a(3, 0), a(3, 2));
    }

    #[test]
    fn kernel_sums_to_one_and_rejects_bad_sigma() {
        let k = gaussian_kernel_q16(10, 5.0).unwrap();
        assert_eq!(k.len(), 21);
        assert_eq!(k.iter().map(|&q| u64::from(q)).sum::<u64>(), 65536);
        assert!(GaussianBlur::new(3, 0.0).is_err());
        assert!(GaussianBlur::new(3, f32::NAN).is_err());
    }

    #[test]
    fn mismatched_buffer_is_an_error() {
        let blur = GaussianBlur::new(1, 1.0).unwrap();
        assert!(blur.apply(&[0u8; 12], 2, 2).is_err());
    }
}
