//! RNS (Residue Number System) modular arithmetic.
//!
//! Every CKKS operation decomposes into independent sub-operations on 64-bit
//! residues, one per modulus of the chain. This module provides the scalar
//! primitives and the [`RnsPoly`] container.

use bincode::{Decode, Encode};

/// Modular addition: (a + b) mod q, for a, b < q < 2^63.
#[inline(always)]
pub fn mod_add(a: u64, b: u64, q: u64) -> u64 {
    let sum = a + b;
    if sum >= q {
        sum - q
    } else {
        sum
    }
}

/// Modular subtraction: (a - b) mod q, for a, b < q.
#[inline(always)]
pub fn mod_sub(a: u64, b: u64, q: u64) -> u64 {
    if a >= b {
        a - b
    } else {
        q - b + a
    }
}

/// Modular multiplication through a 128-bit intermediate.
#[inline(always)]
pub fn mod_mul(a: u64, b: u64, q: u64) -> u64 {
    ((a as u128 * b as u128) % q as u128) as u64
}

/// Modular exponentiation: base^exp mod q.
pub fn mod_pow(mut base: u64, mut exp: u64, q: u64) -> u64 {
    let mut result: u64 = 1 % q;
    base %= q;
    while exp > 0 {
        if exp & 1 == 1 {
            result = mod_mul(result, base, q);
        }
        exp >>= 1;
        base = mod_mul(base, base, q);
    }
    result
}

/// Modular inverse for prime q (Fermat): a^(q-2) mod q.
///
/// Returns `None` when `a ≡ 0 (mod q)`.
pub fn mod_inv(a: u64, q: u64) -> Option<u64> {
    if a % q == 0 {
        return None;
    }
    Some(mod_pow(a, q - 2, q))
}

/// Reduce a signed integer into [0, q).
#[inline(always)]
pub fn reduce_i64(value: i64, q: u64) -> u64 {
    if value >= 0 {
        value as u64 % q
    } else {
        let r = value.unsigned_abs() % q;
        if r == 0 {
            0
        } else {
            q - r
        }
    }
}

/// Centered representative of x mod q, in (-q/2, q/2].
#[inline(always)]
pub fn center(x: u64, q: u64) -> i64 {
    if x > q / 2 {
        -((q - x) as i64)
    } else {
        x as i64
    }
}

/// Deterministic Miller-Rabin primality test for 64-bit integers.
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    const SMALL: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];
    for p in SMALL {
        if n % p == 0 {
            return n == p;
        }
    }

    let mut d = n - 1;
    let mut r = 0;
    while d % 2 == 0 {
        d /= 2;
        r += 1;
    }

    'witness: for a in SMALL {
        let mut x = mod_pow(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..r {
            x = mod_mul(x, x, n);
            if x == n - 1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

/// Find a primitive 2N-th root of unity ψ modulo q (ψ^N ≡ -1).
///
/// Requires q ≡ 1 (mod 2N).
pub fn find_primitive_root(n: usize, q: u64) -> Option<u64> {
    let two_n = (2 * n) as u64;
    if q % two_n != 1 {
        return None;
    }
    let exponent = (q - 1) / two_n;
    (2..q).find_map(|g| {
        let psi = mod_pow(g, exponent, q);
        (mod_pow(psi, n as u64, q) == q - 1).then_some(psi)
    })
}

/// Bit-reverse the low `bits` bits of x.
#[inline]
pub fn bit_reverse(x: usize, bits: u32) -> usize {
    if bits == 0 {
        return 0;
    }
    x.reverse_bits() >> (usize::BITS - bits)
}

/// An RNS polynomial: one residue vector per modulus.
///
/// Polynomials carried by keys and ciphertexts live in the NTT (evaluation)
/// domain, so products are Hadamard products limb by limb.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct RnsPoly {
    /// limbs[l][i] = coefficient (or evaluation) i mod q_l
    pub limbs: Vec<Vec<u64>>,
}

impl RnsPoly {
    /// Zero polynomial with `num_limbs` limbs of `n` residues each
    pub fn zero(n: usize, num_limbs: usize) -> Self {
        Self {
            limbs: vec![vec![0u64; n]; num_limbs],
        }
    }

    /// Lift signed integer coefficients into every modulus of `moduli`
    pub fn from_signed(coeffs: &[i64], moduli: &[u64]) -> Self {
        let limbs = moduli
            .iter()
            .map(|&q| coeffs.iter().map(|&c| reduce_i64(c, q)).collect())
            .collect();
        Self { limbs }
    }

    /// Ring degree N
    pub fn degree(&self) -> usize {
        self.limbs.first().map_or(0, Vec::len)
    }

    /// Number of RNS limbs
    pub fn num_limbs(&self) -> usize {
        self.limbs.len()
    }

    /// Limb-wise addition
    pub fn add(&self, other: &Self, moduli: &[u64]) -> Self {
        self.zip_with(other, moduli, mod_add)
    }

    /// Limb-wise subtraction
    pub fn sub(&self, other: &Self, moduli: &[u64]) -> Self {
        self.zip_with(other, moduli, mod_sub)
    }

    /// Hadamard product (polynomial product in the NTT domain)
    pub fn mul(&self, other: &Self, moduli: &[u64]) -> Self {
        self.zip_with(other, moduli, mod_mul)
    }

    /// In-place `self += a ⊙ b`
    pub fn add_mul_assign(&mut self, a: &Self, b: &Self, moduli: &[u64]) {
        for (l, &q) in moduli.iter().enumerate() {
            for ((acc, &x), &y) in self.limbs[l].iter_mut().zip(&a.limbs[l]).zip(&b.limbs[l]) {
                *acc = mod_add(*acc, mod_mul(x, y, q), q);
            }
        }
    }

    /// Keep only the limbs at the given indices, in order
    pub fn select_limbs(&self, indices: &[usize]) -> Self {
        Self {
            limbs: indices.iter().map(|&i| self.limbs[i].clone()).collect(),
        }
    }

    fn zip_with(&self, other: &Self, moduli: &[u64], op: fn(u64, u64, u64) -> u64) -> Self {
        debug_assert_eq!(self.num_limbs(), other.num_limbs());
        debug_assert_eq!(self.num_limbs(), moduli.len());
        let limbs = moduli
            .iter()
            .zip(self.limbs.iter().zip(&other.limbs))
            .map(|(&q, (a, b))| a.iter().zip(b).map(|(&x, &y)| op(x, y, q)).collect())
            .collect();
        Self { limbs }
    }
}
