//! Platform keys and the canonical platform matrix
//!
//! A build produces artifacts for `(os, arch, variant)` combinations. This
//! module normalizes those into comparable [`PlatformKey`]s and maps them to
//! Nix system doubles such as `x86_64-linux`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Architecture value used by universal (multi-arch) binaries
pub const UNIVERSAL_ARCH: &str = "all";

/// Default amd64 micro-architecture level
pub const DEFAULT_AMD64_VARIANT: &str = "v1";

/// Supported operating systems
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    Darwin,
    Linux,
    Windows,
}

impl Os {
    pub const ALL: [Os; 3] = [Os::Darwin, Os::Linux, Os::Windows];

    pub fn as_str(&self) -> &'static str {
        match self {
            Os::Darwin => "darwin",
            Os::Linux => "linux",
            Os::Windows => "windows",
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Os {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "darwin" => Ok(Os::Darwin),
            "linux" => Ok(Os::Linux),
            "windows" => Ok(Os::Windows),
            other => Err(CoreError::UnknownPlatform {
                value: other.to_string(),
            }),
        }
    }
}

/// Supported CPU architectures
///
/// The declaration order is the canonical order used when listing the matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Arch {
    #[serde(rename = "amd64")]
    Amd64,
    #[serde(rename = "arm")]
    Arm,
    #[serde(rename = "arm64")]
    Arm64,
    #[serde(rename = "386")]
    I386,
}

impl Arch {
    pub const ALL: [Arch; 4] = [Arch::Amd64, Arch::Arm, Arch::Arm64, Arch::I386];

    /// Architectures a universal binary stands in for
    pub const UNIVERSAL: [Arch; 2] = [Arch::Amd64, Arch::Arm64];

    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::Amd64 => "amd64",
            Arch::Arm => "arm",
            Arch::Arm64 => "arm64",
            Arch::I386 => "386",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Arch {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "amd64" => Ok(Arch::Amd64),
            "arm" => Ok(Arch::Arm),
            "arm64" => Ok(Arch::Arm64),
            "386" => Ok(Arch::I386),
            other => Err(CoreError::UnknownPlatform {
                value: other.to_string(),
            }),
        }
    }
}

/// 32-bit ARM variants that Nix distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ArmVariant {
    #[serde(rename = "6")]
    V6,
    #[serde(rename = "7")]
    V7,
}

impl ArmVariant {
    pub const ALL: [ArmVariant; 2] = [ArmVariant::V6, ArmVariant::V7];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArmVariant::V6 => "6",
            ArmVariant::V7 => "7",
        }
    }
}

impl fmt::Display for ArmVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArmVariant {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "6" => Ok(ArmVariant::V6),
            "7" => Ok(ArmVariant::V7),
            other => Err(CoreError::UnknownPlatform {
                value: other.to_string(),
            }),
        }
    }
}

/// A normalized, comparable platform
///
/// `arm` is only set when `arch` is [`Arch::Arm`], `amd64` only when `arch`
/// is [`Arch::Amd64`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlatformKey {
    pub os: Os,
    pub arch: Arch,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arm: Option<ArmVariant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amd64: Option<String>,
}

impl PlatformKey {
    /// Key for an architecture without variants (arm64, 386)
    pub fn new(os: Os, arch: Arch) -> Self {
        Self {
            os,
            arch,
            arm: None,
            amd64: None,
        }
    }

    pub fn amd64(os: Os, variant: impl Into<String>) -> Self {
        Self {
            os,
            arch: Arch::Amd64,
            arm: None,
            amd64: Some(variant.into()),
        }
    }

    pub fn arm(os: Os, variant: ArmVariant) -> Self {
        Self {
            os,
            arch: Arch::Arm,
            arm: Some(variant),
            amd64: None,
        }
    }

    /// Key for `arch` on `os`, using `amd64_variant` when `arch` is amd64
    ///
    /// Returns `None` for arm, which needs an explicit variant.
    pub fn for_arch(os: Os, arch: Arch, amd64_variant: &str) -> Option<Self> {
        match arch {
            Arch::Amd64 => Some(Self::amd64(os, amd64_variant)),
            Arch::Arm => None,
            other => Some(Self::new(os, other)),
        }
    }

    /// Whether the pairing belongs to the supported matrix
    pub fn is_supported(&self) -> bool {
        !(self.os == Os::Darwin && self.arch == Arch::I386)
    }

    /// The Nix system double, e.g. `armv7l-linux`
    pub fn nix_system(&self) -> String {
        let cpu = match (self.arch, self.arm) {
            (Arch::Amd64, _) => "x86_64",
            (Arch::Arm64, _) => "aarch64",
            (Arch::I386, _) => "i686",
            (Arch::Arm, Some(ArmVariant::V6)) => "armv6l",
            (Arch::Arm, Some(ArmVariant::V7)) | (Arch::Arm, None) => "armv7l",
        };
        format!("{}-{}", cpu, self.os)
    }
}

impl fmt::Display for PlatformKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)?;
        if let Some(arm) = self.arm {
            write!(f, "/v{}", arm)?;
        }
        if let Some(amd64) = &self.amd64 {
            write!(f, "/{}", amd64)?;
        }
        Ok(())
    }
}

/// What an artifact's platform fields describe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A universal binary covering every architecture of one OS
    Universal(Os),
    /// A single supported platform
    Platform(PlatformKey),
}

impl Target {
    /// Interpret raw platform fields
    ///
    /// Returns `None` for anything outside the supported matrix: unknown OS or
    /// arch, `darwin/386`, arm variants other than 6 and 7, or a universal
    /// arch carrying variants. An empty amd64 variant counts as
    /// [`DEFAULT_AMD64_VARIANT`].
    pub fn parse(os: &str, arch: &str, arm: &str, amd64: &str) -> Option<Target> {
        let os = os.parse::<Os>().ok()?;

        if arch == UNIVERSAL_ARCH {
            return (arm.is_empty() && amd64.is_empty()).then_some(Target::Universal(os));
        }

        let key = match arch.parse::<Arch>().ok()? {
            Arch::Amd64 => {
                let variant = if amd64.is_empty() {
                    DEFAULT_AMD64_VARIANT
                } else {
                    amd64
                };
                PlatformKey::amd64(os, variant)
            }
            Arch::Arm => PlatformKey::arm(os, arm.parse().ok()?),
            other => PlatformKey::new(os, other),
        };

        key.is_supported().then_some(Target::Platform(key))
    }

    pub fn os(&self) -> Os {
        match self {
            Target::Universal(os) => *os,
            Target::Platform(key) => key.os,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nix_systems() {
        assert_eq!(PlatformKey::amd64(Os::Linux, "v1").nix_system(), "x86_64-linux");
        assert_eq!(PlatformKey::new(Os::Darwin, Arch::Arm64).nix_system(), "aarch64-darwin");
        assert_eq!(PlatformKey::new(Os::Linux, Arch::I386).nix_system(), "i686-linux");
        assert_eq!(PlatformKey::arm(Os::Linux, ArmVariant::V6).nix_system(), "armv6l-linux");
        assert_eq!(PlatformKey::arm(Os::Linux, ArmVariant::V7).nix_system(), "armv7l-linux");
        assert_eq!(PlatformKey::new(Os::Windows, Arch::Arm64).nix_system(), "aarch64-windows");
    }

    #[test]
    fn test_parse_universal() {
        assert_eq!(
            Target::parse("darwin", "all", "", ""),
            Some(Target::Universal(Os::Darwin))
        );
        assert_eq!(Target::parse("darwin", "all", "7", ""), None);
    }

    #[test]
    fn test_parse_rejects_outside_matrix() {
        assert_eq!(Target::parse("darwin", "386", "", ""), None);
        assert_eq!(Target::parse("freebsd", "amd64", "", "v1"), None);
        assert_eq!(Target::parse("linux", "riscv64", "", ""), None);
        assert_eq!(Target::parse("linux", "arm", "5", ""), None);
        assert_eq!(Target::parse("linux", "arm", "", ""), None);
    }

    #[test]
    fn test_parse_variants() {
        assert_eq!(
            Target::parse("linux", "arm", "6", ""),
            Some(Target::Platform(PlatformKey::arm(Os::Linux, ArmVariant::V6)))
        );
        assert_eq!(
            Target::parse("linux", "amd64", "", "v3"),
            Some(Target::Platform(PlatformKey::amd64(Os::Linux, "v3")))
        );
        assert_eq!(
            Target::parse("windows", "amd64", "", ""),
            Some(Target::Platform(PlatformKey::amd64(Os::Windows, "v1")))
        );
    }

    #[test]
    fn test_canonical_arch_order() {
        let listed: Vec<&str> = Arch::ALL.iter().map(Arch::as_str).collect();
        assert_eq!(listed, vec!["amd64", "arm", "arm64", "386"]);

        let mut sorted = vec![Arch::I386, Arch::Arm64, Arch::Amd64, Arch::Arm];
        sorted.sort();
        assert_eq!(sorted, Arch::ALL.to_vec());
    }

    #[test]
    fn test_key_display() {
        assert_eq!(PlatformKey::arm(Os::Linux, ArmVariant::V7).to_string(), "linux/arm/v7");
        assert_eq!(PlatformKey::amd64(Os::Darwin, "v1").to_string(), "darwin/amd64/v1");
        assert_eq!(PlatformKey::new(Os::Linux, Arch::I386).to_string(), "linux/386");
    }
}
