//! Backend selection: which implementation serves each primitive.
//!
//! A [`CapabilityProbe`] reports, per primitive, whether the native (`ring`)
//! implementation, the portable RustCrypto implementation, or neither is
//! usable. [`BackendSelector`] runs the probe once and caches the answer for
//! its lifetime; concurrent first callers wait on the single in-flight probe.
//!
//! The platform probe only reports `Native` when the CPU has the relevant
//! instructions and a self-test shows the native output is byte-identical to
//! the portable output, so envelopes never depend on which backend built them.

use std::num::NonZeroU32;
use std::sync::OnceLock;

use pwseal_core::{Algorithm, Backend, SealError, SealResult, Support};
use serde::Serialize;
use tracing::{debug, warn};

use crate::{aead, kdf, rng, KEY_SIZE, NONCE_SIZE};

/// Per-primitive support, as reported by a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub aes_256_gcm: Support,
    pub chacha20_poly1305: Support,
    pub pbkdf2: Support,
    pub random: Support,
}

impl Capabilities {
    /// Every primitive reports the same support level.
    pub fn uniform(support: Support) -> Self {
        Self {
            aes_256_gcm: support,
            chacha20_poly1305: support,
            pbkdf2: support,
            random: support,
        }
    }

    pub fn for_algorithm(&self, algorithm: Algorithm) -> Support {
        match algorithm {
            Algorithm::Aes256Gcm => self.aes_256_gcm,
            Algorithm::ChaCha20Poly1305 => self.chacha20_poly1305,
        }
    }
}

/// Source of capability information.
pub trait CapabilityProbe: Send + Sync {
    fn probe(&self) -> Capabilities;
}

/// Detects CPU features and self-tests each implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlatformProbe;

impl CapabilityProbe for PlatformProbe {
    fn probe(&self) -> Capabilities {
        Capabilities {
            aes_256_gcm: probe_algorithm(Algorithm::Aes256Gcm, hw::aes_gcm()),
            chacha20_poly1305: probe_algorithm(Algorithm::ChaCha20Poly1305, hw::chacha()),
            pbkdf2: probe_kdf(),
            random: probe_random(),
        }
    }
}

/// Reports one fixed support level for everything. Used to pin a backend.
#[derive(Debug, Clone, Copy)]
pub struct FixedProbe(pub Support);

impl CapabilityProbe for FixedProbe {
    fn probe(&self) -> Capabilities {
        Capabilities::uniform(self.0)
    }
}

/// Memoizing front for a [`CapabilityProbe`].
pub struct BackendSelector {
    probe: Box<dyn CapabilityProbe>,
    cache: OnceLock<Capabilities>,
}

impl BackendSelector {
    pub fn new(probe: impl CapabilityProbe + 'static) -> Self {
        Self {
            probe: Box::new(probe),
            cache: OnceLock::new(),
        }
    }

    /// Selector backed by [`PlatformProbe`].
    pub fn platform() -> Self {
        Self::new(PlatformProbe)
    }

    /// Selector that always answers with `backend`.
    pub fn fixed(backend: Backend) -> Self {
        Self::new(FixedProbe(backend.into()))
    }

    /// Cached probe result. The first call runs the probe.
    pub fn capabilities(&self) -> Capabilities {
        *self.cache.get_or_init(|| {
            let caps = self.probe.probe();
            debug!(
                aes_256_gcm = %caps.aes_256_gcm,
                chacha20_poly1305 = %caps.chacha20_poly1305,
                pbkdf2 = %caps.pbkdf2,
                random = %caps.random,
                "backend capabilities resolved"
            );
            caps
        })
    }

    pub fn supports(&self, algorithm: Algorithm) -> Support {
        self.capabilities().for_algorithm(algorithm)
    }

    pub fn backend_for(&self, algorithm: Algorithm) -> SealResult<Backend> {
        require(self.supports(algorithm), algorithm.name())
    }

    pub fn kdf_backend(&self) -> SealResult<Backend> {
        require(self.capabilities().pbkdf2, "PBKDF2-HMAC-SHA256")
    }

    pub fn rng_backend(&self) -> SealResult<Backend> {
        require(self.capabilities().random, "secure random source")
    }
}

impl std::fmt::Debug for BackendSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendSelector")
            .field("capabilities", &self.cache.get())
            .finish_non_exhaustive()
    }
}

fn require(support: Support, what: &str) -> SealResult<Backend> {
    support
        .backend()
        .ok_or_else(|| SealError::Environment(format!("no backend provides {what}")))
}

#[cfg(not(feature = "native"))]
pub(crate) fn native_unavailable() -> SealError {
    SealError::Environment("native backend not compiled in (enable the `native` feature)".into())
}

const SELF_TEST_KEY: [u8; KEY_SIZE] = [0x5c; KEY_SIZE];
const SELF_TEST_NONCE: [u8; NONCE_SIZE] = [0xa3; NONCE_SIZE];
const SELF_TEST_MESSAGE: &[u8] = b"pwseal backend self-test vector";

/// Seal and re-open the self-test vector; returns the sealed bytes on success.
fn aead_self_test(backend: Backend, algorithm: Algorithm) -> Option<Vec<u8>> {
    let sealed =
        aead::seal(backend, algorithm, &SELF_TEST_KEY, &SELF_TEST_NONCE, SELF_TEST_MESSAGE).ok()?;
    let opened = aead::open(backend, algorithm, &SELF_TEST_KEY, &SELF_TEST_NONCE, &sealed).ok()?;
    (opened == SELF_TEST_MESSAGE).then_some(sealed)
}

fn probe_algorithm(algorithm: Algorithm, hardware: bool) -> Support {
    let Some(reference) = aead_self_test(Backend::Fallback, algorithm) else {
        warn!(%algorithm, "portable self-test failed");
        return Support::None;
    };

    if hardware && cfg!(feature = "native") {
        match aead_self_test(Backend::Native, algorithm) {
            Some(native) if native == reference => return Support::Native,
            _ => warn!(%algorithm, "native self-test disagrees with portable output, using fallback"),
        }
    }
    Support::Fallback
}

/// PBKDF2-HMAC-SHA256("passwd", "salt", 1 round), RFC 7914 section 11.
const KDF_KNOWN_ANSWER: [u8; KEY_SIZE] = [
    0x55, 0xac, 0x04, 0x6e, 0x56, 0xe3, 0x08, 0x9f, 0xec, 0x16, 0x91, 0xc2, 0x25, 0x44, 0xb6, 0x05,
    0xf9, 0x41, 0x85, 0x21, 0x6d, 0xde, 0x04, 0x65, 0xe6, 0x8b, 0x9d, 0x57, 0xc2, 0x0d, 0xac, 0xbc,
];

fn kdf_self_test(backend: Backend) -> bool {
    let mut out = [0u8; KEY_SIZE];
    kdf::pbkdf2_sha256(backend, b"passwd", b"salt", NonZeroU32::MIN, &mut out).is_ok()
        && out == KDF_KNOWN_ANSWER
}

fn probe_kdf() -> Support {
    if !kdf_self_test(Backend::Fallback) {
        warn!("portable PBKDF2 self-test failed");
        return Support::None;
    }
    if cfg!(feature = "native") {
        if kdf_self_test(Backend::Native) {
            return Support::Native;
        }
        warn!("native PBKDF2 self-test failed, using fallback");
    }
    Support::Fallback
}

fn probe_random() -> Support {
    let mut buf = [0u8; 16];
    if cfg!(feature = "native") && rng::fill_random(Backend::Native, &mut buf).is_ok() {
        return Support::Native;
    }
    match rng::fill_random(Backend::Fallback, &mut buf) {
        Ok(()) => Support::Fallback,
        Err(e) => {
            warn!(error = %e, "no secure random source");
            Support::None
        }
    }
}

/// CPU feature detection for the instructions the native backend accelerates.
mod hw {
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    pub(super) fn aes_gcm() -> bool {
        std::arch::is_x86_feature_detected!("aes") && std::arch::is_x86_feature_detected!("pclmulqdq")
    }

    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    pub(super) fn chacha() -> bool {
        std::arch::is_x86_feature_detected!("ssse3")
    }

    #[cfg(target_arch = "aarch64")]
    pub(super) fn aes_gcm() -> bool {
        std::arch::is_aarch64_feature_detected!("aes") && std::arch::is_aarch64_feature_detected!("pmull")
    }

    #[cfg(target_arch = "aarch64")]
    pub(super) fn chacha() -> bool {
        std::arch::is_aarch64_feature_detected!("neon")
    }

    #[cfg(not(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")))]
    pub(super) fn aes_gcm() -> bool {
        false
    }

    #[cfg(not(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")))]
    pub(super) fn chacha() -> bool {
        false
    }
}
