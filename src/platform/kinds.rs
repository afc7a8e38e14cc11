/*!
 * Platform Resource Kinds
 * Closed set of platform-owned resource categories with declared priorities
 */

use crate::core::types::Priority;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a platform-owned resource
///
/// The declared priority fixes the notification order inside the platform
/// context; lower priorities are notified first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformResourceKind {
    /// General platform services
    Normal,
    /// Event-poll selectors
    Selectors,
    /// Secure random generators
    SecureRandom,
    /// Native pseudo-random devices
    NativePrng,
    /// Entropy seeder threads
    SeederHolder,
    /// Reference processing
    ReferenceHandler,
    /// Cleaner threads
    Cleaners,
    /// Open file descriptor bookkeeping, runs last among platform resources
    FileDescriptors,
}

impl PlatformResourceKind {
    pub const ALL: [PlatformResourceKind; 8] = [
        PlatformResourceKind::Normal,
        PlatformResourceKind::Selectors,
        PlatformResourceKind::SecureRandom,
        PlatformResourceKind::NativePrng,
        PlatformResourceKind::SeederHolder,
        PlatformResourceKind::ReferenceHandler,
        PlatformResourceKind::Cleaners,
        PlatformResourceKind::FileDescriptors,
    ];

    /// Declared priority
    #[inline]
    pub const fn priority(&self) -> Priority {
        match self {
            PlatformResourceKind::Normal => 100,
            PlatformResourceKind::Selectors => 200,
            PlatformResourceKind::SecureRandom => 300,
            PlatformResourceKind::NativePrng => 400,
            PlatformResourceKind::SeederHolder => 500,
            PlatformResourceKind::ReferenceHandler => 600,
            PlatformResourceKind::Cleaners => 700,
            PlatformResourceKind::FileDescriptors => 800,
        }
    }
}

impl fmt::Display for PlatformResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlatformResourceKind::Normal => "normal",
            PlatformResourceKind::Selectors => "selectors",
            PlatformResourceKind::SecureRandom => "secure-random",
            PlatformResourceKind::NativePrng => "native-prng",
            PlatformResourceKind::SeederHolder => "seeder-holder",
            PlatformResourceKind::ReferenceHandler => "reference-handler",
            PlatformResourceKind::Cleaners => "cleaners",
            PlatformResourceKind::FileDescriptors => "file-descriptors",
        };
        f.write_str(name)
    }
}
