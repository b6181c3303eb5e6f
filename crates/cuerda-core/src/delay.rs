//! Circular-buffer delay line with Lagrange-3 fractional reads.
//!
//! The reverberator's FDN modulates its delay lengths per sample, so the
//! fractional read path uses 4-point Lagrange interpolation (3rd order),
//! which stays flat well past the audio band for small modulation depths.
//! Fixed taps (diffuser stages, velvet-noise convolvers) use the integer
//! fast path instead.
//!
//! # Memory
//!
//! The buffer is heap-allocated once in [`DelayLine::new`] and never
//! reallocates. All processing methods are allocation-free.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;

/// Margin past the requested capacity for the 4-point interpolation window.
const INTERP_MARGIN: usize = 4;

/// Delay line with a stored fractional delay and an integer fast path.
///
/// # Example
///
/// ```rust
/// use cuerda_core::DelayLine;
///
/// let mut delay = DelayLine::new(1024);
/// delay.set_delay(10.5);
/// delay.write(1.0);
/// let out = delay.read(); // Lagrange-3 interpolated, 10.5 samples back
/// ```
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
    /// Current fractional delay in samples, saturated to the buffer bound.
    delay: f32,
}

impl DelayLine {
    /// Create a delay line able to hold at least `max_delay_samples`.
    ///
    /// # Panics
    ///
    /// Panics if `max_delay_samples` is 0.
    pub fn new(max_delay_samples: usize) -> Self {
        assert!(max_delay_samples > 0, "delay capacity must be > 0");
        Self {
            buffer: vec![0.0; max_delay_samples + INTERP_MARGIN],
            write_pos: 0,
            delay: 0.0,
        }
    }

    /// Set the current fractional delay in samples.
    ///
    /// Out-of-range requests saturate: negative delays clamp to 0, delays
    /// past the capacity clamp to the buffer bound.
    #[inline]
    pub fn set_delay(&mut self, delay_samples: f32) {
        let max = (self.buffer.len() - INTERP_MARGIN) as f32;
        self.delay = delay_samples.clamp(0.0, max);
    }

    /// Current fractional delay in samples.
    #[inline]
    pub fn delay(&self) -> f32 {
        self.delay
    }

    /// Maximum usable delay in samples.
    pub fn capacity(&self) -> usize {
        self.buffer.len() - INTERP_MARGIN
    }

    /// Write a sample and advance the write index.
    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    /// Read at the current fractional delay with Lagrange-3 interpolation.
    ///
    /// The 4-tap window is centred around `floor(read_pos)`: taps at offsets
    /// −1, 0, +1, +2 relative to the integer part, weighted by the cubic
    /// Lagrange basis evaluated at the fractional part.
    #[inline]
    pub fn read(&self) -> f32 {
        let len = self.buffer.len();
        let mut read_pos = self.write_pos as f32 - self.delay - 1.0;
        while read_pos < 0.0 {
            read_pos += len as f32;
        }

        let int_part = read_pos as usize;
        let frac = read_pos - int_part as f32;

        let y0 = self.buffer[(int_part + len - 1) % len];
        let y1 = self.buffer[int_part % len];
        let y2 = self.buffer[(int_part + 1) % len];
        let y3 = self.buffer[(int_part + 2) % len];

        // Lagrange basis at nodes {-1, 0, 1, 2} evaluated at `frac`
        let d0 = frac + 1.0;
        let d1 = frac;
        let d2 = frac - 1.0;
        let d3 = frac - 2.0;

        let c0 = y0 * (d1 * d2 * d3) / -6.0;
        let c1 = y1 * (d0 * d2 * d3) / 2.0;
        let c2 = y2 * (d0 * d1 * d3) / -2.0;
        let c3 = y3 * (d0 * d1 * d2) / 6.0;

        c0 + c1 + c2 + c3
    }

    /// Integer-delay read fast path for fixed taps.
    ///
    /// Returns the sample written `delay_samples` writes ago (0 = the most
    /// recent write). Requests past the capacity saturate to the bound.
    #[inline]
    pub fn read_integer(&self, delay_samples: usize) -> f32 {
        let len = self.buffer.len();
        let clamped = delay_samples.min(len - 1);
        let read_idx = (self.write_pos + 2 * len - clamped - 1) % len;
        self.buffer[read_idx]
    }

    /// Zero the buffer and reset the write index. The configured delay is kept.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}
