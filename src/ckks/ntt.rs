//! Negacyclic Number Theoretic Transform over Z_q[X]/(X^N+1).
//!
//! Polynomial products are computed as `iNTT(NTT(a) ⊙ NTT(b))`. The twiddle
//! tables hold powers of a primitive 2N-th root ψ in bit-reversed order, which
//! folds the negacyclic twist into the butterflies.

use super::arith::{bit_reverse, find_primitive_root, mod_add, mod_inv, mod_mul, mod_pow, mod_sub};
use crate::error::{OptOutError, Result};

/// Pre-computed NTT tables for one (N, q) pair
#[derive(Debug, Clone)]
pub struct NttTables {
    /// ψ^{bitrev(i)} mod q
    forward_twiddles: Vec<u64>,
    /// ψ^{-bitrev(i)} mod q
    inverse_twiddles: Vec<u64>,
    /// N^{-1} mod q
    n_inv: u64,
    /// The modulus q
    q: u64,
    /// Polynomial degree N
    n: usize,
}

impl NttTables {
    /// Build the tables for degree `n` (power of two) and prime `q ≡ 1 mod 2n`
    pub fn new(n: usize, q: u64) -> Result<Self> {
        if !n.is_power_of_two() || n < 2 {
            return Err(OptOutError::InvalidParameters(format!(
                "ring dimension {n} is not a power of two"
            )));
        }
        let psi = find_primitive_root(n, q).ok_or_else(|| {
            OptOutError::InvalidParameters(format!("modulus {q} is not NTT-friendly for N={n}"))
        })?;
        let psi_inv = mod_inv(psi, q)
            .ok_or_else(|| OptOutError::InvalidParameters(format!("no inverse of ψ mod {q}")))?;
        let n_inv = mod_inv(n as u64, q)
            .ok_or_else(|| OptOutError::InvalidParameters(format!("no inverse of N mod {q}")))?;

        let log_n = n.trailing_zeros();
        let mut forward_twiddles = vec![0u64; n];
        let mut inverse_twiddles = vec![0u64; n];
        let mut power = 1u64;
        let mut power_inv = 1u64;
        for i in 0..n {
            let rev = bit_reverse(i, log_n);
            forward_twiddles[rev] = power;
            inverse_twiddles[rev] = power_inv;
            power = mod_mul(power, psi, q);
            power_inv = mod_mul(power_inv, psi_inv, q);
        }
        debug_assert_eq!(mod_pow(psi, n as u64, q), q - 1);

        Ok(Self {
            forward_twiddles,
            inverse_twiddles,
            n_inv,
            q,
            n,
        })
    }

    /// The modulus these tables were built for
    pub fn modulus(&self) -> u64 {
        self.q
    }

    /// In-place forward transform (Cooley-Tukey, natural → bit-reversed order)
    pub fn forward(&self, a: &mut [u64]) {
        debug_assert_eq!(a.len(), self.n);
        let q = self.q;
        let mut t = self.n;
        let mut m = 1;
        while m < self.n {
            t >>= 1;
            for i in 0..m {
                let j1 = 2 * i * t;
                let s = self.forward_twiddles[m + i];
                for j in j1..j1 + t {
                    let u = a[j];
                    let v = mod_mul(a[j + t], s, q);
                    a[j] = mod_add(u, v, q);
                    a[j + t] = mod_sub(u, v, q);
                }
            }
            m <<= 1;
        }
    }

    /// In-place inverse transform (Gentleman-Sande, bit-reversed → natural order)
    pub fn inverse(&self, a: &mut [u64]) {
        debug_assert_eq!(a.len(), self.n);
        let q = self.q;
        let mut t = 1;
        let mut m = self.n;
        while m > 1 {
            let h = m >> 1;
            let mut j1 = 0;
            for i in 0..h {
                let s = self.inverse_twiddles[h + i];
                for j in j1..j1 + t {
                    let u = a[j];
                    let v = a[j + t];
                    a[j] = mod_add(u, v, q);
                    a[j + t] = mod_mul(mod_sub(u, v, q), s, q);
                }
                j1 += 2 * t;
            }
            t <<= 1;
            m = h;
        }
        for x in a.iter_mut() {
            *x = mod_mul(*x, self.n_inv, q);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Schoolbook negacyclic product, used as reference
    fn negacyclic_mul(a: &[u64], b: &[u64], q: u64) -> Vec<u64> {
        let n = a.len();
        let mut c = vec![0u64; n];
        for i in 0..n {
            for j in 0..n {
                let p = mod_mul(a[i], b[j], q);
                let k = i + j;
                if k < n {
                    c[k] = mod_add(c[k], p, q);
                } else {
                    c[k - n] = mod_sub(c[k - n], p, q);
                }
            }
        }
        c
    }

    #[test]
    fn test_ntt_roundtrip_small() {
        let tables = NttTables::new(4, 17).unwrap();
        let original = vec![1u64, 2, 3, 4];
        let mut a = original.clone();
        tables.forward(&mut a);
        assert_ne!(a, original);
        tables.inverse(&mut a);
        assert_eq!(a, original);
    }

    #[test]
    fn test_ntt_polynomial_multiply() {
        let n = 8;
        let q = 97u64;
        let tables = NttTables::new(n, q).unwrap();

        // (1 + 2X + 3X^2)(4 + 5X) = 4 + 13X + 22X^2 + 15X^3
        let a = vec![1u64, 2, 3, 0, 0, 0, 0, 0];
        let b = vec![4u64, 5, 0, 0, 0, 0, 0, 0];
        let mut a_ntt = a.clone();
        let mut b_ntt = b.clone();
        tables.forward(&mut a_ntt);
        tables.forward(&mut b_ntt);
        let mut c: Vec<u64> = a_ntt
            .iter()
            .zip(&b_ntt)
            .map(|(&x, &y)| mod_mul(x, y, q))
            .collect();
        tables.inverse(&mut c);
        assert_eq!(c, vec![4u64, 13, 22, 15, 0, 0, 0, 0]);
    }

    #[test]
    fn test_ntt_wraps_negacyclically() {
        let n = 8;
        let q = 97u64;
        let tables = NttTables::new(n, q).unwrap();

        let a: Vec<u64> = vec![3, 0, 0, 0, 0, 0, 7, 1];
        let b: Vec<u64> = vec![0, 0, 5, 2, 0, 0, 0, 9];
        let expected = negacyclic_mul(&a, &b, q);

        let mut a_ntt = a.clone();
        let mut b_ntt = b.clone();
        tables.forward(&mut a_ntt);
        tables.forward(&mut b_ntt);
        let mut c: Vec<u64> = a_ntt
            .iter()
            .zip(&b_ntt)
            .map(|(&x, &y)| mod_mul(x, y, q))
            .collect();
        tables.inverse(&mut c);
        assert_eq!(c, expected);
    }

    #[test]
    fn test_ntt_roundtrip_60bit_prime() {
        let n = 256;
        let two_n = 2 * n as u64;
        let mut q = ((1u64 << 60) / two_n) * two_n + 1;
        while !crate::ckks::arith::is_prime(q) {
            q -= two_n;
        }
        let tables = NttTables::new(n, q).unwrap();
        let original: Vec<u64> = (0..n as u64).map(|i| (i * 7_919) % q).collect();
        let mut a = original.clone();
        tables.forward(&mut a);
        tables.inverse(&mut a);
        assert_eq!(a, original);
    }

    #[test]
    fn test_ntt_rejects_unfriendly_modulus() {
        assert!(NttTables::new(8, 19).is_err());
        assert!(NttTables::new(6, 97).is_err());
    }
}
