//! Orthonormal 8×8 feedback matrix.
//!
//! The FDN channels are coupled through an energy-preserving mix: either the
//! normalised Hadamard matrix `H₈/√8` (recursively built from `H₁ = (1)`) or
//! the Householder reflector `I − (2/N)·J`. Per-row input and output sign
//! masks, drawn from a fixed-seed LCG, randomise phase relationships between
//! channels without affecting orthonormality:
//!
//! ```text
//! out = S_out · M · (S_in ⊙ in)
//! ```
//!
//! Reference: Schlecht & Habets, "Scattering in Feedback Delay Networks"
//! (2020).

use crate::fdn::NUM_CHANNELS;
use cuerda_core::Lcg;
use libm::sqrtf;

/// Seed for the input/output sign masks.
const SIGN_MASK_SEED: u32 = 0x1234_5678;

/// Which orthonormal construction the matrix uses.
///
/// Both are interchangeable inside the FDN; Hadamard mixes every channel
/// into every other with equal weight, Householder is the cheaper
/// rank-one-update reflection. Selection is a tuning decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatrixKind {
    /// `H₈ / √8`, dense equal-magnitude mixing.
    #[default]
    Hadamard,
    /// `I − (2/N)·J`, reflection about the all-ones direction.
    Householder,
}

/// The normalised Hadamard matrix `H₈/√8`, built by recursive doubling
/// from `H₁ = (1)`. Shared by the feedback matrix and the input diffuser.
pub(crate) fn normalized_hadamard() -> [[f32; NUM_CHANNELS]; NUM_CHANNELS] {
    let mut matrix = [[0.0f32; NUM_CHANNELS]; NUM_CHANNELS];
    matrix[0][0] = 1.0;
    let mut size = 1;
    while size < NUM_CHANNELS {
        for i in 0..size {
            for j in 0..size {
                let val = matrix[i][j];
                matrix[i][j + size] = val;
                matrix[i + size][j] = val;
                matrix[i + size][j + size] = -val;
            }
        }
        size *= 2;
    }
    let norm = 1.0 / sqrtf(NUM_CHANNELS as f32);
    for row in &mut matrix {
        for v in row.iter_mut() {
            *v *= norm;
        }
    }
    matrix
}

/// Immutable orthonormal mixing matrix with fixed random sign masks.
#[derive(Debug, Clone)]
pub struct FeedbackMatrix {
    kind: MatrixKind,
    /// Dense coefficients (Hadamard path).
    matrix: [[f32; NUM_CHANNELS]; NUM_CHANNELS],
    input_signs: [f32; NUM_CHANNELS],
    output_signs: [f32; NUM_CHANNELS],
}

impl FeedbackMatrix {
    /// Build the matrix and draw the sign masks from the fixed seed.
    pub fn new(kind: MatrixKind) -> Self {
        let matrix = normalized_hadamard();

        let mut rng = Lcg::new(SIGN_MASK_SEED);
        let mut input_signs = [0.0f32; NUM_CHANNELS];
        let mut output_signs = [0.0f32; NUM_CHANNELS];
        for i in 0..NUM_CHANNELS {
            input_signs[i] = rng.next_sign();
            output_signs[i] = rng.next_sign();
        }

        Self {
            kind,
            matrix,
            input_signs,
            output_signs,
        }
    }

    /// Construction in use.
    pub fn kind(&self) -> MatrixKind {
        self.kind
    }

    /// Mix the 8 channels: `output = S_out · M · (S_in ⊙ input)`.
    #[inline]
    pub fn process(&self, input: &[f32; NUM_CHANNELS], output: &mut [f32; NUM_CHANNELS]) {
        match self.kind {
            MatrixKind::Hadamard => {
                for i in 0..NUM_CHANNELS {
                    let mut sum = 0.0;
                    for j in 0..NUM_CHANNELS {
                        sum += self.matrix[i][j] * self.input_signs[j] * input[j];
                    }
                    output[i] = self.output_signs[i] * sum;
                }
            }
            MatrixKind::Householder => {
                // (I − 2/N·J)·v as a rank-one update on the signed input
                let mut mean2 = 0.0;
                for j in 0..NUM_CHANNELS {
                    mean2 += self.input_signs[j] * input[j];
                }
                mean2 *= 2.0 / NUM_CHANNELS as f32;
                for i in 0..NUM_CHANNELS {
                    output[i] =
                        self.output_signs[i] * (self.input_signs[i] * input[i] - mean2);
                }
            }
        }
    }
}
