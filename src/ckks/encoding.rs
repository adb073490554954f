//! CKKS encode/decode via the canonical embedding.
//!
//! Encode: z ∈ R^{N/2} → m(X) = round(Δ · σ^{-1}(z))
//! Decode: m(X) → z = σ(m) / Δ
//!
//! σ evaluates m at the odd powers ζ^{2k+1} of ζ = e^{πi/N}. Evaluations at
//! ζ^{2k+1} and ζ^{2(N-1-k)+1} are complex conjugates, so a real slot vector
//! is mirrored into a conjugate-symmetric one and yields a real polynomial.
//! Because σ is a ring homomorphism, polynomial products are slot-wise
//! products, which is what the opt-out protocol relies on.

use std::f64::consts::PI;

use crate::error::{OptOutError, Result};

/// Largest magnitude of a scaled coefficient accepted by the encoder
const MAX_SCALED_COEFF: f64 = (1u64 << 62) as f64;

/// Pre-computed tables for the O(N log N) twisted FFT.
#[derive(Debug, Clone)]
struct FftTables {
    n: usize,
    /// twist_re[j] = cos(πj/N), twist_im[j] = sin(πj/N)
    twist_re: Vec<f64>,
    twist_im: Vec<f64>,
    bit_rev: Vec<usize>,
    /// Per stage: cos/sin(-2πk / 2^{s+1})
    twiddle_re: Vec<Vec<f64>>,
    twiddle_im: Vec<Vec<f64>>,
}

impl FftTables {
    fn new(n: usize) -> Self {
        let log_n = n.trailing_zeros();

        let (twist_re, twist_im) = (0..n)
            .map(|j| {
                let angle = PI * j as f64 / n as f64;
                (angle.cos(), angle.sin())
            })
            .unzip();

        let bit_rev = (0..n)
            .map(|i| super::arith::bit_reverse(i, log_n))
            .collect();

        let mut twiddle_re = Vec::with_capacity(log_n as usize);
        let mut twiddle_im = Vec::with_capacity(log_n as usize);
        for s in 0..log_n {
            let half_len = 1usize << s;
            let (tre, tim): (Vec<f64>, Vec<f64>) = (0..half_len)
                .map(|k| {
                    let angle = -2.0 * PI * k as f64 / (2 * half_len) as f64;
                    (angle.cos(), angle.sin())
                })
                .unzip();
            twiddle_re.push(tre);
            twiddle_im.push(tim);
        }

        Self {
            n,
            twist_re,
            twist_im,
            bit_rev,
            twiddle_re,
            twiddle_im,
        }
    }

    /// In-place complex FFT (radix-2 DIT), kernel e^{-2πi kj/N}
    fn fft(&self, re: &mut [f64], im: &mut [f64]) {
        let n = self.n;
        for i in 0..n {
            let j = self.bit_rev[i];
            if i < j {
                re.swap(i, j);
                im.swap(i, j);
            }
        }

        for (tre, tim) in self.twiddle_re.iter().zip(&self.twiddle_im) {
            let half_len = tre.len();
            let full_len = half_len << 1;
            for group_start in (0..n).step_by(full_len) {
                for k in 0..half_len {
                    let (w_re, w_im) = (tre[k], tim[k]);
                    let i0 = group_start + k;
                    let i1 = i0 + half_len;

                    let v_re = w_re * re[i1] - w_im * im[i1];
                    let v_im = w_re * im[i1] + w_im * re[i1];
                    let (u_re, u_im) = (re[i0], im[i0]);
                    re[i0] = u_re + v_re;
                    im[i0] = u_im + v_im;
                    re[i1] = u_re - v_re;
                    im[i1] = u_im - v_im;
                }
            }
        }
    }
}

/// CKKS encoder/decoder for one ring dimension
#[derive(Debug, Clone)]
pub struct CkksEncoder {
    n: usize,
    num_slots: usize,
    fft: FftTables,
}

impl CkksEncoder {
    /// Create an encoder for ring degree `n`
    pub fn new(n: usize) -> Self {
        Self {
            n,
            num_slots: n / 2,
            fft: FftTables::new(n),
        }
    }

    /// Number of real slots
    pub fn num_slots(&self) -> usize {
        self.num_slots
    }

    /// Encode real values into scaled integer coefficients
    ///
    /// Shorter inputs are zero-padded to the full slot count.
    ///
    /// # Arguments
    /// * `z` - Slot values (at most N/2)
    /// * `scale` - Encoding scale Δ
    ///
    /// # Returns
    /// N signed coefficients of round(Δ · σ^{-1}(z))
    pub fn encode(&self, z: &[f64], scale: f64) -> Result<Vec<i64>> {
        if z.len() > self.num_slots {
            return Err(OptOutError::TooManyRows {
                n_rows: z.len(),
                slots: self.num_slots,
            });
        }
        if let Some(bad) = z.iter().find(|v| !v.is_finite()) {
            return Err(OptOutError::Crypto(format!("cannot encode non-finite value {bad}")));
        }

        let coeffs = self.inverse_canonical_embedding(z);
        coeffs
            .into_iter()
            .map(|c| {
                let scaled = (c * scale).round();
                if scaled.abs() >= MAX_SCALED_COEFF {
                    Err(OptOutError::Crypto(format!(
                        "value too large to encode at scale 2^{:.0}",
                        scale.log2()
                    )))
                } else {
                    Ok(scaled as i64)
                }
            })
            .collect()
    }

    /// Decode centered integer coefficients back to slot values
    ///
    /// # Arguments
    /// * `coeffs` - N centered coefficients
    /// * `scale` - Scale the coefficients carry
    pub fn decode(&self, coeffs: &[i64], scale: f64) -> Vec<f64> {
        debug_assert_eq!(coeffs.len(), self.n);
        let as_f64: Vec<f64> = coeffs.iter().map(|&c| c as f64 / scale).collect();
        self.canonical_embedding(&as_f64)
    }

    /// σ^{-1}: z[k] = Σ_j a[j]·e^{2πikj/N} with a[j] = m[j]·ζ^j, hence
    /// a = FFT(z̃)/N and m[j] = Re(a[j]·ζ^{-j}).
    fn inverse_canonical_embedding(&self, z: &[f64]) -> Vec<f64> {
        let n = self.n;
        let mut re = vec![0.0f64; n];
        let mut im = vec![0.0f64; n];
        for (k, &v) in z.iter().enumerate() {
            re[k] = v;
            re[n - 1 - k] = v;
        }

        self.fft.fft(&mut re, &mut im);

        let inv_n = 1.0 / n as f64;
        (0..n)
            .map(|j| (re[j] * self.fft.twist_re[j] + im[j] * self.fft.twist_im[j]) * inv_n)
            .collect()
    }

    /// σ: z[k] = Re(FFT(conj(a))[k]) with a[j] = m[j]·ζ^j
    fn canonical_embedding(&self, coeffs: &[f64]) -> Vec<f64> {
        let n = self.n;
        let mut re: Vec<f64> = (0..n).map(|j| coeffs[j] * self.fft.twist_re[j]).collect();
        let mut im: Vec<f64> = (0..n).map(|j| -coeffs[j] * self.fft.twist_im[j]).collect();

        self.fft.fft(&mut re, &mut im);

        re.truncate(self.num_slots);
        re
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCALE: f64 = (1u64 << 40) as f64;

    #[test]
    fn test_encode_decode_roundtrip() {
        let encoder = CkksEncoder::new(1024);
        let z: Vec<f64> = (0..10).map(|i| i as f64 * 0.1).collect();
        let coeffs = encoder.encode(&z, SCALE).unwrap();
        let decoded = encoder.decode(&coeffs, SCALE);

        assert_eq!(decoded.len(), 512);
        for i in 0..z.len() {
            assert!(
                (decoded[i] - z[i]).abs() < 1e-7,
                "slot {i}: decoded={}, expected={}",
                decoded[i],
                z[i]
            );
        }
        for v in &decoded[z.len()..] {
            assert!(v.abs() < 1e-7);
        }
    }

    #[test]
    fn test_product_is_slotwise() {
        let n = 64;
        let encoder = CkksEncoder::new(n);
        let a: Vec<f64> = (0..n / 2).map(|i| i as f64 + 1.0).collect();
        let b: Vec<f64> = (0..n / 2).map(|i| if i == 3 { 0.0 } else { 1.0 }).collect();
        let scale = (1u64 << 20) as f64;
        let ca = encoder.encode(&a, scale).unwrap();
        let cb = encoder.encode(&b, scale).unwrap();

        // Negacyclic schoolbook product over the integers
        let mut prod = vec![0i128; n];
        for i in 0..n {
            for j in 0..n {
                let p = ca[i] as i128 * cb[j] as i128;
                if i + j < n {
                    prod[i + j] += p;
                } else {
                    prod[i + j - n] -= p;
                }
            }
        }
        let prod: Vec<i64> = prod.iter().map(|&c| (c >> 20) as i64).collect();
        let decoded = encoder.decode(&prod, scale);

        for i in 0..n / 2 {
            let expected = a[i] * b[i];
            assert!(
                (decoded[i] - expected).abs() < 1e-3,
                "slot {i}: decoded={}, expected={expected}",
                decoded[i]
            );
        }
    }

    #[test]
    fn test_encode_rejects_oversized_input() {
        let encoder = CkksEncoder::new(16);
        assert!(matches!(
            encoder.encode(&[0.0; 9], SCALE),
            Err(OptOutError::TooManyRows { n_rows: 9, slots: 8 })
        ));
    }

    #[test]
    fn test_encode_rejects_non_finite_and_huge_values() {
        let encoder = CkksEncoder::new(16);
        assert!(encoder.encode(&[f64::NAN], SCALE).is_err());
        assert!(encoder.encode(&[1e12], SCALE).is_err());
    }
}
