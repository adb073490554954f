//! CKKS crypto context: key generation, encryption, decryption and
//! ciphertext multiplication with relinearization and rescaling.
//!
//! # Multiplication
//!
//! For ciphertexts (a0, a1) and (b0, b1) at a common level ℓ:
//!
//! 1. Tensor: d0 = a0·b0, d1 = a0·b1 + a1·b0, d2 = a1·b1 (decrypts with s²)
//! 2. Relinearize d2: split it into its RNS residues, lift each residue to
//!    the basis q_0..q_ℓ, P, take the inner product with the relinearization
//!    key and divide by P with rounding
//! 3. Rescale: divide by q_ℓ with rounding, dropping one level
//!
//! The result has scale scale_a·scale_b / q_ℓ.

use rand_core::{CryptoRng, RngCore};

use super::arith::{center, mod_add, mod_inv, mod_mul, mod_sub, reduce_i64, RnsPoly};
use super::ciphertext::Ciphertext;
use super::encoding::CkksEncoder;
use super::keys::{KeyPair, PublicKey, RelinearizationKey, SecretKey};
use super::ntt::NttTables;
use super::params::{CkksParameters, CkksParams};
use super::sampling::{sample_gaussian, sample_ternary, sample_uniform, ERROR_STD_DEV};
use crate::error::{OptOutError, Result};

/// CKKS context with pre-computed NTT tables for q_0..q_L and P
#[derive(Debug, Clone)]
pub struct CkksContext {
    params: CkksParams,
    /// Tables for the extended basis; index L+1 is P
    tables: Vec<NttTables>,
    encoder: CkksEncoder,
}

impl CkksContext {
    /// Resolve parameters and build the context
    ///
    /// # Arguments
    /// * `request` - Requested CKKS parameters
    ///
    /// # Returns
    /// `Ok(CkksContext)` if the parameters resolve, `Err` otherwise
    pub fn new(request: &CkksParameters) -> Result<Self> {
        let params = CkksParams::resolve(request)?;
        let tables = params
            .extended_moduli()
            .into_iter()
            .map(|q| NttTables::new(params.poly_degree, q))
            .collect::<Result<Vec<_>>>()?;
        let encoder = CkksEncoder::new(params.poly_degree);

        log::debug!(
            "CKKS context: N={}, moduli={:?}, P={}",
            params.poly_degree,
            params.moduli,
            params.special_modulus
        );

        Ok(Self {
            params,
            tables,
            encoder,
        })
    }

    /// Resolved parameters
    pub fn params(&self) -> &CkksParams {
        &self.params
    }

    /// Number of real slots per ciphertext
    pub fn slot_count(&self) -> usize {
        self.encoder.num_slots()
    }

    fn special_index(&self) -> usize {
        self.params.moduli.len()
    }

    /// Basis indices q_0..q_level
    fn level_basis(level: usize) -> Vec<usize> {
        (0..=level).collect()
    }

    /// Basis indices q_0..q_level, P
    fn extended_basis(&self, level: usize) -> Vec<usize> {
        let mut basis = Self::level_basis(level);
        basis.push(self.special_index());
        basis
    }

    fn basis_moduli(&self, basis: &[usize]) -> Vec<u64> {
        basis.iter().map(|&i| self.tables[i].modulus()).collect()
    }

    fn to_ntt(&self, poly: &mut RnsPoly, basis: &[usize]) {
        for (limb, &i) in poly.limbs.iter_mut().zip(basis) {
            self.tables[i].forward(limb);
        }
    }

    fn from_ntt(&self, poly: &mut RnsPoly, basis: &[usize]) {
        for (limb, &i) in poly.limbs.iter_mut().zip(basis) {
            self.tables[i].inverse(limb);
        }
    }

    /// Signed coefficients lifted to `basis` and moved to the NTT domain
    fn lift_signed(&self, coeffs: &[i64], basis: &[usize]) -> RnsPoly {
        let mut poly = RnsPoly::from_signed(coeffs, &self.basis_moduli(basis));
        self.to_ntt(&mut poly, basis);
        poly
    }

    /// Uniform polynomial over `basis`; uniform residues are uniform in
    /// either domain, so they are sampled directly as evaluations
    fn sample_uniform_poly<R: RngCore + CryptoRng>(&self, rng: &mut R, basis: &[usize]) -> RnsPoly {
        let n = self.params.poly_degree;
        RnsPoly {
            limbs: basis
                .iter()
                .map(|&i| sample_uniform(&mut *rng, n, self.tables[i].modulus()))
                .collect(),
        }
    }

    fn sample_error_poly<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        basis: &[usize],
    ) -> Result<RnsPoly> {
        let e = sample_gaussian(rng, self.params.poly_degree, ERROR_STD_DEV)?;
        Ok(self.lift_signed(&e, basis))
    }

    /// Generate a public/secret key pair
    pub fn keygen<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Result<KeyPair> {
        let n = self.params.poly_degree;
        let top = self.params.max_level();
        let full = self.extended_basis(top);
        let basis = Self::level_basis(top);
        let moduli = self.basis_moduli(&basis);

        let s_coeffs = sample_ternary(rng, n);
        let s = self.lift_signed(&s_coeffs, &full);
        let s_q = s.select_limbs(&basis);

        let a = self.sample_uniform_poly(rng, &basis);
        let e = self.sample_error_poly(rng, &basis)?;
        let b = e.sub(&a.mul(&s_q, &moduli), &moduli);

        Ok(KeyPair {
            public_key: PublicKey { b, a },
            secret_key: SecretKey { s },
        })
    }

    /// Generate the relinearization key used by [`CkksContext::multiply`]
    pub fn relin_keygen<R: RngCore + CryptoRng>(
        &self,
        sk: &SecretKey,
        rng: &mut R,
    ) -> Result<RelinearizationKey> {
        let top = self.params.max_level();
        let full = self.extended_basis(top);
        let full_moduli = self.basis_moduli(&full);
        let p = self.params.special_modulus;

        if sk.s.num_limbs() != full.len() || sk.s.degree() != self.params.poly_degree {
            return Err(OptOutError::Crypto(
                "secret key does not belong to this context".to_string(),
            ));
        }
        let s2 = sk.s.mul(&sk.s, &full_moduli);

        let components = (0..=top)
            .map(|j| {
                let a = self.sample_uniform_poly(&mut *rng, &full);
                let e = self.sample_error_poly(&mut *rng, &full)?;
                let mut b = e.sub(&a.mul(&sk.s, &full_moduli), &full_moduli);

                let qj = full_moduli[j];
                let p_mod_qj = p % qj;
                for (bj, &s2j) in b.limbs[j].iter_mut().zip(&s2.limbs[j]) {
                    *bj = mod_add(*bj, mod_mul(p_mod_qj, s2j, qj), qj);
                }
                Ok((b, a))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(RelinearizationKey { components })
    }

    /// Encrypt real values under the public key at the top level
    ///
    /// # Arguments
    /// * `pk` - Public key
    /// * `values` - Slot values (at most `slot_count()`, zero-padded)
    /// * `rng` - Randomness source
    pub fn encrypt<R: RngCore + CryptoRng>(
        &self,
        pk: &PublicKey,
        values: &[f64],
        rng: &mut R,
    ) -> Result<Ciphertext> {
        let n = self.params.poly_degree;
        let basis = Self::level_basis(self.params.max_level());
        let moduli = self.basis_moduli(&basis);
        if pk.b.num_limbs() != basis.len() || pk.b.degree() != n {
            return Err(OptOutError::Crypto(
                "public key does not belong to this context".to_string(),
            ));
        }

        let coeffs = self.encoder.encode(values, self.params.scale)?;
        let m = self.lift_signed(&coeffs, &basis);

        let v = self.lift_signed(&sample_ternary(rng, n), &basis);
        let e0 = self.sample_error_poly(rng, &basis)?;
        let e1 = self.sample_error_poly(rng, &basis)?;

        let c0 = pk.b.mul(&v, &moduli).add(&e0, &moduli).add(&m, &moduli);
        let c1 = pk.a.mul(&v, &moduli).add(&e1, &moduli);

        Ok(Ciphertext {
            c0,
            c1,
            scale: self.params.scale,
        })
    }

    /// Decrypt a ciphertext into its full slot vector
    ///
    /// Decoding reads limb q_0 only, which is exact while every coefficient of
    /// Δ·m stays below q_0/2.
    pub fn decrypt(&self, sk: &SecretKey, ct: &Ciphertext) -> Result<Vec<f64>> {
        self.validate(ct)?;
        let basis = Self::level_basis(ct.level());
        let moduli = self.basis_moduli(&basis);
        let s = sk.s.select_limbs(&basis);

        let m = ct.c0.add(&ct.c1.mul(&s, &moduli), &moduli);
        let mut limb0 = m.limbs[0].clone();
        self.tables[0].inverse(&mut limb0);
        let q0 = moduli[0];
        let coeffs: Vec<i64> = limb0.iter().map(|&x| center(x, q0)).collect();

        Ok(self.encoder.decode(&coeffs, ct.scale))
    }

    /// Drop limbs so the ciphertext sits at `level`
    pub fn drop_to_level(&self, ct: &Ciphertext, level: usize) -> Result<Ciphertext> {
        if level > ct.level() {
            return Err(OptOutError::Crypto(format!(
                "cannot raise a ciphertext from level {} to {level}",
                ct.level()
            )));
        }
        Ok(ct.truncated(level))
    }

    /// Slot-wise product of two ciphertexts
    ///
    /// # Arguments
    /// * `rk` - Relinearization key
    /// * `a` - Left operand
    /// * `b` - Right operand
    ///
    /// # Returns
    /// Product ciphertext one level below the lower operand, or
    /// `DepthExhausted` if an operand is at level 0
    pub fn multiply(
        &self,
        rk: &RelinearizationKey,
        a: &Ciphertext,
        b: &Ciphertext,
    ) -> Result<Ciphertext> {
        self.validate(a)?;
        self.validate(b)?;
        let level = a.level().min(b.level());
        if level == 0 {
            return Err(OptOutError::DepthExhausted { level });
        }
        if rk.num_components() != self.params.moduli.len() {
            return Err(OptOutError::Crypto(
                "relinearization key does not belong to this context".to_string(),
            ));
        }

        let a = a.truncated(level);
        let b = b.truncated(level);
        let basis = Self::level_basis(level);
        let moduli = self.basis_moduli(&basis);

        let d0 = a.c0.mul(&b.c0, &moduli);
        let mut d1 = a.c0.mul(&b.c1, &moduli);
        d1.add_mul_assign(&a.c1, &b.c0, &moduli);
        let d2 = a.c1.mul(&b.c1, &moduli);

        let (r0, r1) = self.key_switch(&d2, rk, level);
        let product = Ciphertext {
            c0: d0.add(&r0, &moduli),
            c1: d1.add(&r1, &moduli),
            scale: a.scale * b.scale,
        };
        Ok(self.rescale(&product))
    }

    /// Switch d2 (decrypting under s²) to a pair decrypting under s
    fn key_switch(&self, d2: &RnsPoly, rk: &RelinearizationKey, level: usize) -> (RnsPoly, RnsPoly) {
        let n = self.params.poly_degree;
        let basis = Self::level_basis(level);
        let ext = self.extended_basis(level);
        let ext_moduli = self.basis_moduli(&ext);

        let mut digits = d2.clone();
        self.from_ntt(&mut digits, &basis);

        let mut acc0 = RnsPoly::zero(n, ext.len());
        let mut acc1 = RnsPoly::zero(n, ext.len());
        for (j, digit) in digits.limbs.iter().enumerate() {
            let qj = self.tables[j].modulus();
            let centered: Vec<i64> = digit.iter().map(|&x| center(x, qj)).collect();
            let lifted = self.lift_signed(&centered, &ext);

            let (kb, ka) = &rk.components[j];
            acc0.add_mul_assign(&lifted, &kb.select_limbs(&ext), &ext_moduli);
            acc1.add_mul_assign(&lifted, &ka.select_limbs(&ext), &ext_moduli);
        }

        (
            self.divide_by_last(&acc0, &ext),
            self.divide_by_last(&acc1, &ext),
        )
    }

    /// Rescale by the last prime of the ciphertext's level
    fn rescale(&self, ct: &Ciphertext) -> Ciphertext {
        let level = ct.level();
        let basis = Self::level_basis(level);
        let q_last = self.tables[level].modulus();
        Ciphertext {
            c0: self.divide_by_last(&ct.c0, &basis),
            c1: self.divide_by_last(&ct.c1, &basis),
            scale: ct.scale / q_last as f64,
        }
    }

    /// Round(x / q_last) over `basis` without its last modulus
    ///
    /// Computes (x - [x]_{q_last}) · q_last^{-1} limb by limb, with the
    /// centered representative of [x]_{q_last} giving rounding.
    fn divide_by_last(&self, poly: &RnsPoly, basis: &[usize]) -> RnsPoly {
        let (&last_idx, kept) = match basis.split_last() {
            Some(split) => split,
            None => return poly.clone(),
        };
        let last_pos = basis.len() - 1;
        let q_last = self.tables[last_idx].modulus();

        let mut last = poly.limbs[last_pos].clone();
        self.tables[last_idx].inverse(&mut last);
        let centered: Vec<i64> = last.iter().map(|&x| center(x, q_last)).collect();

        let limbs = kept
            .iter()
            .enumerate()
            .map(|(pos, &i)| {
                let qi = self.tables[i].modulus();
                let mut correction: Vec<u64> = centered.iter().map(|&c| reduce_i64(c, qi)).collect();
                self.tables[i].forward(&mut correction);
                // q_last and q_i are distinct primes, so the inverse exists
                let inv = mod_inv(q_last % qi, qi).unwrap_or(0);
                poly.limbs[pos]
                    .iter()
                    .zip(&correction)
                    .map(|(&x, &t)| mod_mul(mod_sub(x, t, qi), inv, qi))
                    .collect()
            })
            .collect();

        RnsPoly { limbs }
    }

    /// Check that a ciphertext is well formed for this context
    pub fn validate(&self, ct: &Ciphertext) -> Result<()> {
        let n = self.params.poly_degree;
        if ct.degree() != n {
            return Err(OptOutError::Crypto(format!(
                "ciphertext has ring degree {}, context uses {n}",
                ct.degree()
            )));
        }
        let limbs = ct.c0.num_limbs();
        if limbs == 0 || limbs > self.params.moduli.len() || ct.c1.num_limbs() != limbs {
            return Err(OptOutError::Crypto(format!(
                "ciphertext has {limbs}/{} limbs, context supports 1..={}",
                ct.c1.num_limbs(),
                self.params.moduli.len()
            )));
        }
        if !(ct.scale.is_finite() && ct.scale > 0.0) {
            return Err(OptOutError::Crypto(format!("invalid scale {}", ct.scale)));
        }
        for (l, q) in self.params.moduli[..limbs].iter().enumerate() {
            for poly in [&ct.c0, &ct.c1] {
                let limb = &poly.limbs[l];
                if limb.len() != n {
                    return Err(OptOutError::Crypto(format!(
                        "limb {l} has {} coefficients, expected {n}",
                        limb.len()
                    )));
                }
                if let Some(bad) = limb.iter().find(|&&x| x >= *q) {
                    return Err(OptOutError::Crypto(format!(
                        "coefficient {bad} out of range for limb {l} (q={q})"
                    )));
                }
            }
        }
        Ok(())
    }
}
