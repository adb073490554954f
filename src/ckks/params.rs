//! CKKS parameter selection.
//!
//! [`CkksParameters`] is the user-facing request (depth, modulus sizes,
//! security level); [`CkksParams::resolve`] turns it into a concrete ring
//! dimension and modulus chain:
//!
//! - `q_0`: `first_mod_size` bits, keeps the integer part of decrypted values
//! - `q_1..q_L`: one `scaling_mod_size`-bit prime per multiplicative level,
//!   alternating around `2^scaling_mod_size` so rescaling keeps the scale close
//!   to Δ
//! - `P`: special prime used only during key switching
//!
//! Every prime satisfies q ≡ 1 (mod 2N).

use serde::{Deserialize, Serialize};

use super::arith::is_prime;
use crate::error::{OptOutError, Result};

/// Largest supported modulus size; sums of two residues must fit in a u64
const MAX_MODULUS_BITS: u32 = 61;

/// Security level of the parameter set (HE standard, ternary secrets)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecurityLevel {
    /// 128-bit classical security
    Classic128,
    /// 192-bit classical security
    Classic192,
    /// 256-bit classical security
    Classic256,
    /// No security bound; any ring dimension is accepted
    NotSet,
}

impl SecurityLevel {
    /// Maximum log2(QP) admitted for ring dimension 2^log_n
    ///
    /// Returns `None` when the ring dimension is outside the standard table.
    pub fn max_modulus_bits(self, log_n: u32) -> Option<u32> {
        let table: [u32; 7] = match self {
            SecurityLevel::Classic128 => [27, 54, 109, 218, 438, 881, 1761],
            SecurityLevel::Classic192 => [19, 37, 75, 152, 305, 611, 1220],
            SecurityLevel::Classic256 => [14, 29, 58, 118, 237, 476, 953],
            SecurityLevel::NotSet => return Some(u32::MAX),
        };
        log_n
            .checked_sub(10)
            .and_then(|i| table.get(i as usize).copied())
    }
}

/// Requested CKKS parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CkksParameters {
    /// Number of sequential ciphertext multiplications supported
    pub multiplicative_depth: u32,
    /// Bit size of the scaling primes; Δ = 2^scaling_mod_size
    pub scaling_mod_size: u32,
    /// Bit size of the first prime q_0
    pub first_mod_size: u32,
    /// Required security level
    pub security_level: SecurityLevel,
    /// Force a ring dimension instead of the smallest secure one
    pub ring_dimension: Option<usize>,
    /// Minimum number of slots the ring must provide
    pub batch_size: Option<usize>,
}

impl Default for CkksParameters {
    fn default() -> Self {
        Self {
            multiplicative_depth: 2,
            scaling_mod_size: 40,
            first_mod_size: 60,
            security_level: SecurityLevel::Classic128,
            ring_dimension: None,
            batch_size: None,
        }
    }
}

impl CkksParameters {
    /// Insecure, small parameters for tests and quick experiments
    ///
    /// # Arguments
    /// * `ring_dimension` - Ring degree N (power of two)
    pub fn insecure(ring_dimension: usize) -> Self {
        Self {
            security_level: SecurityLevel::NotSet,
            ring_dimension: Some(ring_dimension),
            ..Self::default()
        }
    }

    /// Total bit size of the modulus chain including the special prime
    pub fn total_modulus_bits(&self) -> u32 {
        self.first_mod_size
            + self.multiplicative_depth * self.scaling_mod_size
            + self.special_mod_size()
    }

    /// Bit size of the key-switching prime
    fn special_mod_size(&self) -> u32 {
        self.first_mod_size.max(self.scaling_mod_size)
    }

    fn validate(&self) -> Result<()> {
        if self.multiplicative_depth == 0 {
            return Err(OptOutError::InvalidParameters(
                "multiplicative depth must be at least 1".to_string(),
            ));
        }
        if !(20..=MAX_MODULUS_BITS - 1).contains(&self.scaling_mod_size) {
            return Err(OptOutError::InvalidParameters(format!(
                "scaling modulus size {} is outside [20, {}]",
                self.scaling_mod_size,
                MAX_MODULUS_BITS - 1
            )));
        }
        if self.first_mod_size < self.scaling_mod_size || self.first_mod_size > MAX_MODULUS_BITS {
            return Err(OptOutError::InvalidParameters(format!(
                "first modulus size {} must lie in [{}, {}]",
                self.first_mod_size, self.scaling_mod_size, MAX_MODULUS_BITS
            )));
        }
        Ok(())
    }
}

/// Resolved parameter set: ring dimension and modulus chain
#[derive(Debug, Clone, PartialEq)]
pub struct CkksParams {
    /// Ring degree N
    pub poly_degree: usize,
    /// Number of slots, N/2
    pub num_slots: usize,
    /// q_0, q_1, ..., q_L
    pub moduli: Vec<u64>,
    /// Key-switching prime P
    pub special_modulus: u64,
    /// Encoding scale Δ
    pub scale: f64,
    /// Security level the chain was checked against
    pub security_level: SecurityLevel,
}

impl CkksParams {
    /// Resolve requested parameters into a concrete chain
    ///
    /// # Arguments
    /// * `request` - Requested depth, modulus sizes and security level
    ///
    /// # Returns
    /// `Ok(CkksParams)` if a ring dimension satisfies the request, `Err` otherwise
    pub fn resolve(request: &CkksParameters) -> Result<Self> {
        request.validate()?;
        let poly_degree = select_ring_dimension(request)?;
        let two_n = 2 * poly_degree as u64;

        let mut first = NttPrimeGenerator::new(request.first_mod_size, two_n);
        let q0 = first.next_downstream()?;

        let mut scaling = NttPrimeGenerator::new(request.scaling_mod_size, two_n);
        let mut moduli = vec![q0];
        while moduli.len() <= request.multiplicative_depth as usize {
            let q = scaling.next_alternating()?;
            if !moduli.contains(&q) {
                moduli.push(q);
            }
        }

        let mut special = NttPrimeGenerator::new(request.special_mod_size(), two_n);
        let special_modulus = loop {
            let p = special.next_downstream()?;
            if !moduli.contains(&p) {
                break p;
            }
        };

        Ok(Self {
            poly_degree,
            num_slots: poly_degree / 2,
            moduli,
            special_modulus,
            scale: 2f64.powi(request.scaling_mod_size as i32),
            security_level: request.security_level,
        })
    }

    /// Highest level (number of rescales available to a fresh ciphertext)
    pub fn max_level(&self) -> usize {
        self.moduli.len() - 1
    }

    /// q_0..q_L followed by P
    pub fn extended_moduli(&self) -> Vec<u64> {
        let mut all = self.moduli.clone();
        all.push(self.special_modulus);
        all
    }
}

/// Pick the ring dimension for a request
fn select_ring_dimension(request: &CkksParameters) -> Result<usize> {
    let total_bits = request.total_modulus_bits();
    let min_slots = request.batch_size.unwrap_or(1);

    let admits = |log_n: u32| -> bool {
        let n = 1usize << log_n;
        n / 2 >= min_slots
            && request
                .security_level
                .max_modulus_bits(log_n)
                .is_some_and(|max| total_bits <= max)
    };

    match request.ring_dimension {
        Some(n) => {
            if !n.is_power_of_two() || n < 4 {
                return Err(OptOutError::InvalidParameters(format!(
                    "ring dimension {n} is not a power of two >= 4"
                )));
            }
            if !admits(n.trailing_zeros()) {
                return Err(OptOutError::InvalidParameters(format!(
                    "ring dimension {n} does not meet {:?} for a {total_bits}-bit modulus with {min_slots} slots",
                    request.security_level
                )));
            }
            Ok(n)
        }
        None => {
            let first_log_n = if request.security_level == SecurityLevel::NotSet {
                2
            } else {
                10
            };
            (first_log_n..=16)
                .find(|&log_n| admits(log_n))
                .map(|log_n| 1usize << log_n)
                .ok_or_else(|| {
                    OptOutError::InvalidParameters(format!(
                        "no ring dimension up to 2^16 admits a {total_bits}-bit modulus at {:?}",
                        request.security_level
                    ))
                })
        }
    }
}

/// Generator of primes q ≡ 1 (mod 2N) around 2^bits
#[derive(Debug, Clone)]
struct NttPrimeGenerator {
    bits: u32,
    step: u64,
    next_up: u64,
    next_down: u64,
    up_turn: bool,
}

impl NttPrimeGenerator {
    fn new(bits: u32, two_n: u64) -> Self {
        let center = (1u64 << bits) + 1;
        Self {
            bits,
            step: two_n,
            next_up: center,
            next_down: center - two_n,
            up_turn: false,
        }
    }

    fn upper_bound(&self) -> u64 {
        (1u64 << self.bits).saturating_mul(3) / 2
    }

    fn lower_bound(&self) -> u64 {
        (1u64 << self.bits) / 2 + 1
    }

    fn next_downstream(&mut self) -> Result<u64> {
        while self.next_down >= self.lower_bound() {
            let candidate = self.next_down;
            self.next_down -= self.step;
            if is_prime(candidate) {
                return Ok(candidate);
            }
        }
        Err(self.exhausted())
    }

    fn next_upstream(&mut self) -> Result<u64> {
        while self.next_up <= self.upper_bound() {
            let candidate = self.next_up;
            self.next_up += self.step;
            if is_prime(candidate) {
                return Ok(candidate);
            }
        }
        Err(self.exhausted())
    }

    fn next_alternating(&mut self) -> Result<u64> {
        self.up_turn = !self.up_turn;
        if self.up_turn {
            self.next_upstream().or_else(|_| self.next_downstream())
        } else {
            self.next_downstream().or_else(|_| self.next_upstream())
        }
    }

    fn exhausted(&self) -> OptOutError {
        OptOutError::InvalidParameters(format!(
            "ran out of {}-bit primes congruent to 1 mod {}",
            self.bits, self.step
        ))
    }
}
