#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::collections::HashSet;

use kdiag_core::config::{AdminSettings, DEFAULT_ALLOW_LIST};
use kdiag_core::errors::DiagError;
use kdiag_core::{CommandCode, CommandRegistry, MemoryKeeper};

const STANDARD: [&str; 25] = [
    "apiv", "clrs", "conf", "cons", "crst", "csnp", "dirs", "dump", "envi", "ftfl", "isro",
    "lgif", "mntr", "pfev", "rclc", "rcvr", "rqld", "ruok", "srst", "srvr", "stat", "wchc",
    "wchp", "wchs", "ydld",
];

fn code(name: &str) -> CommandCode {
    CommandCode::from_name(name).unwrap()
}

fn standard(allow_list: &str) -> CommandRegistry {
    CommandRegistry::standard(&MemoryKeeper::new(), &AdminSettings::with_allow_list(allow_list))
        .unwrap()
}

#[test]
fn test_standard_set_is_registered() {
    let registry = standard("*");
    assert_eq!(registry.names(), STANDARD.to_vec());
    assert!(!registry.is_known(code("nopc")));
}

#[test]
fn test_registered_codes_are_unique() {
    let codes: HashSet<_> = STANDARD.iter().map(|n| code(n)).collect();
    assert_eq!(codes.len(), STANDARD.len());
}

#[test]
fn test_wildcard_enables_known_and_unknown_codes() {
    let registry = standard("*");
    for name in STANDARD {
        assert!(registry.is_enabled(code(name)));
    }
    assert!(registry.is_enabled(code("xxxx")));
    assert!(registry.is_enabled(CommandCode::from_raw(0)));
}

#[test]
fn test_explicit_set_enables_only_named_codes() {
    let registry = standard("mntr,ruok");
    for name in STANDARD {
        assert_eq!(
            registry.is_enabled(code(name)),
            name == "mntr" || name == "ruok",
            "{}",
            name
        );
    }
}

#[test]
fn test_default_allow_list_leaves_watch_listings_and_dump_disabled() {
    let registry = standard(DEFAULT_ALLOW_LIST);
    for name in ["wchc", "wchp", "dump"] {
        assert!(!registry.is_enabled(code(name)), "{}", name);
    }
    for name in ["ruok", "mntr", "stat", "pfev"] {
        assert!(registry.is_enabled(code(name)), "{}", name);
    }
}

#[test]
fn test_unregistered_allow_list_entry_is_dropped() {
    let registry = standard("ruok,zzzz");
    assert_eq!(registry.allow_list().names(), vec!["ruok"]);
}

#[test]
fn test_standard_registration_twice_is_rejected() {
    let keeper = MemoryKeeper::new();
    let mut registry = CommandRegistry::new();
    kdiag_core::commands::register_standard_commands(&mut registry, &keeper).unwrap();
    let err = kdiag_core::commands::register_standard_commands(&mut registry, &keeper).unwrap_err();
    assert_eq!(
        err,
        DiagError::DuplicateCommand {
            name: "ruok".to_string()
        }
    );
    assert_eq!(registry.len(), STANDARD.len());
}

#[test]
fn test_get_returns_command_with_matching_name() {
    let registry = standard("*");
    for name in STANDARD {
        let command = registry.get(code(name)).ok().unwrap();
        assert_eq!(command.name(), name);
    }
}
