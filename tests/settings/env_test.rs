/*!
 * Environment Configuration Tests
 */

use crac_coordinator::{ConfigError, CoordinatorConfig, RestoreOrder};
use serial_test::serial;
use std::env;
use std::path::PathBuf;

const VARS: [&str; 3] = [
    "CRAC_RESTORE_ORDER",
    "CRAC_TRACE_STARTUP_TIME",
    "CRAC_RESOURCE_POLICIES",
];

fn clear() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_defaults_without_environment() {
    clear();
    assert_eq!(CoordinatorConfig::from_env().unwrap(), CoordinatorConfig::default());
}

#[test]
#[serial]
fn test_reads_all_variables() {
    clear();
    env::set_var("CRAC_RESTORE_ORDER", "forward");
    env::set_var("CRAC_TRACE_STARTUP_TIME", "true");
    env::set_var("CRAC_RESOURCE_POLICIES", "/etc/crac/policies");

    let config = CoordinatorConfig::from_env().unwrap();
    clear();

    assert_eq!(config.restore_order, RestoreOrder::Forward);
    assert!(config.trace_startup_time);
    assert_eq!(config.policy_file, Some(PathBuf::from("/etc/crac/policies")));
}

#[test]
#[serial]
fn test_rejects_invalid_values() {
    clear();
    env::set_var("CRAC_RESTORE_ORDER", "sideways");
    let order = CoordinatorConfig::from_env();
    clear();

    env::set_var("CRAC_TRACE_STARTUP_TIME", "sometimes");
    let trace = CoordinatorConfig::from_env();
    clear();

    assert!(matches!(
        order,
        Err(ConfigError::InvalidValue { var: "CRAC_RESTORE_ORDER", .. })
    ));
    assert!(matches!(
        trace,
        Err(ConfigError::InvalidValue { var: "CRAC_TRACE_STARTUP_TIME", .. })
    ));
}
