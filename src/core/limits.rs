/*!
 * Protocol Constants
 *
 * Centralized location for host status codes, configuration keys and
 * default capacities. Organized by domain.
 */

// =============================================================================
// HOST SUSPEND/RESUME STATUS CODES
// =============================================================================

/// Suspend/resume completed and execution continues in the restored instance
pub const ENGINE_STATUS_OK: i32 = 0;

/// Suspend/resume failed; categorized causes follow
pub const ENGINE_STATUS_ERROR: i32 = 1;

/// No checkpoint capability is configured on the host
pub const ENGINE_STATUS_UNSUPPORTED: i32 = 2;

// =============================================================================
// CONFIGURATION KEYS
// =============================================================================

/// Restore order for ordered contexts ("reverse" or "forward")
pub const ENV_RESTORE_ORDER: &str = "CRAC_RESTORE_ORDER";

/// Emit startup-time trace lines around restore
pub const ENV_TRACE_STARTUP_TIME: &str = "CRAC_TRACE_STARTUP_TIME";

/// Path of the resource-policy file
pub const ENV_RESOURCE_POLICIES: &str = "CRAC_RESOURCE_POLICIES";

/// JSON log output for the tracing subscriber
pub const ENV_TRACE_JSON: &str = "CRAC_TRACE_JSON";

// =============================================================================
// RESOURCE POLICIES
// =============================================================================

/// Prefix of numbered policy entries (`policy.<n>`)
pub const POLICY_PREFIX: &str = "policy.";

/// Policy numbering starts here and stops at the first gap
pub const POLICY_FIRST_INDEX: usize = 1;

// =============================================================================
// REGISTRIES
// =============================================================================

/// Initial capacity of context registries
pub const DEFAULT_REGISTRY_CAPACITY: usize = 16;

/// Dead weak entries tolerated before a registry compacts on insert
pub const REGISTRY_COMPACT_THRESHOLD: usize = 64;

// =============================================================================
// TRACING
// =============================================================================

/// Sessions slower than this are logged as warnings
pub const SLOW_SESSION_MS: u64 = 1_000;
