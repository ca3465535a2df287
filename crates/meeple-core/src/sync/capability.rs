//! Platform capability probe for the streaming link
//!
//! Purely advisory: hosts use it to decide whether to offer a live link at
//! all, and what to tell the user when they can't. The only behavioral
//! gate is inside `connect`, which refuses to attempt a handshake on an
//! unsupported platform.

use serde::Serialize;

/// Whether this platform can run the streaming link, and what to tell the
/// user about it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Capability {
    pub is_supported: bool,
    pub platform_label: String,
    pub advisory_message: String,
}

/// Probe the current platform
#[must_use]
pub fn probe() -> Capability {
    #[cfg(any(target_os = "linux", target_os = "macos", target_os = "windows"))]
    {
        Capability {
            is_supported: true,
            platform_label: std::env::consts::OS.to_string(),
            advisory_message: "Live device-to-device sync is available on this platform"
                .to_string(),
        }
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        Capability {
            is_supported: false,
            platform_label: std::env::consts::OS.to_string(),
            advisory_message:
                "Live device-to-device sync is not available here; exchange a snapshot instead"
                    .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_labels_current_platform() {
        let capability = probe();
        assert_eq!(capability.platform_label, std::env::consts::OS);
        assert!(!capability.advisory_message.is_empty());
    }
}
