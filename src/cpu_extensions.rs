/// SIMD extension of CPU.
/// Specific variants depend on target architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuExtensions {
    None,
    #[cfg(target_arch = "x86_64")]
    /// AVX2 together with F16C (used by kernels for half-precision pixels).
    Avx2,
}

impl CpuExtensions {
    /// Returns `true` if your CPU support the extension.
    pub fn is_supported(&self) -> bool {
        match self {
            #[cfg(target_arch = "x86_64")]
            Self::Avx2 => has_avx2(),
            Self::None => true,
        }
    }

    /// Returns all extensions supported by the current CPU,
    /// starting with the portable one.
    pub fn supported() -> Vec<Self> {
        let all = [
            Self::None,
            #[cfg(target_arch = "x86_64")]
            Self::Avx2,
        ];
        all.into_iter().filter(|e| e.is_supported()).collect()
    }
}

impl Default for CpuExtensions {
    #[cfg(target_arch = "x86_64")]
    fn default() -> Self {
        if has_avx2() {
            Self::Avx2
        } else {
            Self::None
        }
    }

    #[cfg(not(target_arch = "x86_64"))]
    fn default() -> Self {
        Self::None
    }
}

#[cfg(target_arch = "x86_64")]
fn has_avx2() -> bool {
    std::is_x86_feature_detected!("avx2") && std::is_x86_feature_detected!("f16c")
}
