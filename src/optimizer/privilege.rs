//! Platform and privilege detection
//!
//! Detection runs at startup, outside the orchestrator core; the core only
//! ever receives the detected values and never branches on the OS itself.

use serde::{Deserialize, Serialize};

/// Privilege level the process runs with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrivilegeLevel {
    /// Regular user; only user-level remediation is available
    Standard,
    /// Root/administrator; system-level remediation is available
    Elevated,
}

impl PrivilegeLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrivilegeLevel::Standard => "standard",
            PrivilegeLevel::Elevated => "elevated",
        }
    }
}

/// Logical host capability set for strategy selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
    /// Unknown OS: strategies degrade to an empty step list
    Unsupported,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Linux => "linux",
            Platform::MacOs => "macos",
            Platform::Windows => "windows",
            Platform::Unsupported => "unsupported",
        }
    }
}

/// Detect the running platform from the compile-target OS
pub fn detect_platform() -> Platform {
    match std::env::consts::OS {
        "linux" => Platform::Linux,
        "macos" => Platform::MacOs,
        "windows" => Platform::Windows,
        _ => Platform::Unsupported,
    }
}

/// Detect whether the process runs elevated
///
/// Unix: effective uid 0. Elsewhere detection is unavailable and the safe
/// default is `Standard`, which selects only user-level strategies.
pub fn detect_privilege() -> PrivilegeLevel {
    #[cfg(unix)]
    {
        if unsafe { libc::geteuid() } == 0 {
            return PrivilegeLevel::Elevated;
        }
        PrivilegeLevel::Standard
    }
    #[cfg(not(unix))]
    {
        PrivilegeLevel::Standard
    }
}
