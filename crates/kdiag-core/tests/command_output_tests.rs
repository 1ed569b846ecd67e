#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::collections::BTreeMap;

use common::{keeper_dispatcher, run_text, stat_value, standard_dispatcher};
use kdiag_core::commands::NOT_SERVING_MESSAGE;
use kdiag_core::service::LogInfo;
use kdiag_core::types::sensitive::REDACTED;
use kdiag_core::{KeeperService, KeeperSettings, MemoryKeeper, ServerRole};

#[test]
fn test_mntr_reports_counts_and_leader_fields() {
    let keeper = MemoryKeeper::new().with_version("v24.3.1");
    keeper.set_role(ServerRole::Leader, 5);
    keeper.set_followers(2, 1);
    keeper.create_node("/app", 10);
    keeper.open_session(1, "10.0.0.1:5000");
    keeper.add_watch(1, "/app");
    keeper.record_request(1, "GETD", 4);
    let (dispatcher, _keeper) = keeper_dispatcher(keeper, "*");

    let text = run_text(&dispatcher, "mntr");
    assert_eq!(stat_value(&text, "zk_version"), Some("v24.3.1"));
    assert_eq!(stat_value(&text, "zk_server_state"), Some("leader"));
    assert_eq!(stat_value(&text, "zk_znode_count"), Some("2"));
    assert_eq!(stat_value(&text, "zk_watch_count"), Some("1"));
    assert_eq!(stat_value(&text, "zk_num_alive_connections"), Some("1"));
    assert_eq!(stat_value(&text, "zk_packets_received"), Some("1"));
    assert_eq!(stat_value(&text, "zk_max_latency"), Some("4"));
    assert_eq!(stat_value(&text, "zk_followers"), Some("2"));
    assert_eq!(stat_value(&text, "zk_synced_followers"), Some("1"));
}

#[test]
fn test_mntr_omits_follower_fields_elsewhere() {
    let (dispatcher, keeper) = standard_dispatcher("*");
    keeper.set_role(ServerRole::Follower, 2);
    let text = run_text(&dispatcher, "mntr");
    assert_eq!(stat_value(&text, "zk_server_state"), Some("follower"));
    assert_eq!(stat_value(&text, "zk_followers"), None);
}

#[test]
fn test_stat_commands_when_not_serving() {
    let (dispatcher, keeper) = standard_dispatcher("*");
    keeper.set_active(false);
    for name in ["mntr", "srvr", "stat"] {
        assert_eq!(run_text(&dispatcher, name), NOT_SERVING_MESSAGE, "{}", name);
    }
}

#[test]
fn test_srvr_and_stat_layout() {
    let (dispatcher, keeper) = standard_dispatcher("*");
    keeper.open_session(0x10, "10.0.0.2:6000");
    keeper.record_request(0x10, "LIST", 1);

    let srvr = run_text(&dispatcher, "srvr");
    assert!(srvr.starts_with("Keeper version: "));
    assert!(srvr.contains("Received: 1\n"));
    assert!(srvr.contains("Zxid: 0x0000000000000001\n"));
    assert!(srvr.contains("Mode: standalone\n"));
    assert!(srvr.ends_with("Node count: 1\n"));

    let stat = run_text(&dispatcher, "stat");
    assert!(stat.contains("Clients:\n 10.0.0.2:6000(recved=1,sent=1)\n\n"));
    assert!(stat.ends_with(srvr.split_once('\n').unwrap().1));
}

#[test]
fn test_cons_and_crst() {
    let (dispatcher, keeper) = standard_dispatcher("*");
    keeper.open_session(3, "10.0.0.3:7000");
    keeper.record_request(3, "CREATE", 6);

    let cons = run_text(&dispatcher, "cons");
    assert!(cons.starts_with(" 10.0.0.3:7000(recved=1,sent=1,sid=0x0000000000000003,lop=CREATE,"));
    assert!(cons.contains("to=30000"));
    assert!(cons.ends_with(")\n\n"));

    assert_eq!(run_text(&dispatcher, "crst"), "Connection stats reset.\n");
    let cons = run_text(&dispatcher, "cons");
    assert!(cons.contains("recved=0,sent=0"));
    assert!(cons.contains("lop=NA"));
    assert!(cons.contains("lresp=0"));
}

#[test]
fn test_watch_listings() {
    let (dispatcher, keeper) = standard_dispatcher("*");
    keeper.open_session(1, "a:1");
    keeper.open_session(2, "b:2");
    keeper.add_watch(1, "/a");
    keeper.add_watch(1, "/b");
    keeper.add_watch(2, "/b");

    assert_eq!(
        run_text(&dispatcher, "wchs"),
        "2 connections watching 2 paths\nTotal watches:3\n"
    );
    assert_eq!(
        run_text(&dispatcher, "wchc"),
        "0x0000000000000001\n\t/a\n\t/b\n0x0000000000000002\n\t/b\n"
    );
    assert_eq!(
        run_text(&dispatcher, "wchp"),
        "/a\n\t0x0000000000000001\n/b\n\t0x0000000000000001\n\t0x0000000000000002\n"
    );
}

#[test]
fn test_dump_lists_sessions_and_ephemerals() {
    let (dispatcher, keeper) = standard_dispatcher("*");
    keeper.open_session(1, "a:1");
    keeper.open_session(2, "b:2");
    keeper.create_ephemeral(2, "/locks/x", 0);

    assert_eq!(
        run_text(&dispatcher, "dump"),
        "Sessions dump (2):\n0x0000000000000001\n0x0000000000000002\n\
         Sessions with Ephemerals (1):\n0x0000000000000002\n\t/locks/x\n"
    );
}

#[test]
fn test_lgif_and_csnp() {
    let (dispatcher, keeper) = standard_dispatcher("*");
    keeper.set_log_info(LogInfo {
        first_log_idx: 1,
        first_log_term: 1,
        last_log_idx: 40,
        last_log_term: 2,
        last_committed_log_idx: 38,
        leader_committed_log_idx: 40,
        target_committed_log_idx: 40,
        last_snapshot_idx: 0,
    });

    let lgif = run_text(&dispatcher, "lgif");
    assert_eq!(lgif.lines().count(), 8);
    assert_eq!(stat_value(&lgif, "last_committed_log_idx"), Some("38"));
    assert_eq!(stat_value(&lgif, "last_snapshot_idx"), Some("0"));

    assert_eq!(run_text(&dispatcher, "csnp"), "38\n");
    let lgif = run_text(&dispatcher, "lgif");
    assert_eq!(stat_value(&lgif, "last_snapshot_idx"), Some("38"));
}

#[test]
fn test_csnp_failure_text() {
    let (dispatcher, keeper) = standard_dispatcher("*");
    keeper.set_active(false);
    assert_eq!(
        run_text(&dispatcher, "csnp"),
        "Failed to schedule snapshot creation task.\n"
    );
}

#[test]
fn test_leadership_commands() {
    let (dispatcher, keeper) = standard_dispatcher("*");
    keeper.set_role(ServerRole::Follower, 3);
    assert_eq!(
        run_text(&dispatcher, "rqld"),
        "Sent leadership request to leader.\n"
    );

    keeper.set_role(ServerRole::Leader, 4);
    assert_eq!(
        run_text(&dispatcher, "rqld"),
        "Failed to send leadership request to leader.\n"
    );
    assert_eq!(
        run_text(&dispatcher, "ydld"),
        "Sent yield leadership request to leader.\n"
    );
    assert_eq!(keeper.leadership().role, ServerRole::Follower);
}

#[test]
fn test_maintenance_acknowledgements() {
    let (dispatcher, keeper) = standard_dispatcher("*");
    assert_eq!(run_text(&dispatcher, "rclc"), "ok");
    assert_eq!(run_text(&dispatcher, "clrs"), "ok");
    assert_eq!(run_text(&dispatcher, "rcvr"), "ok");
    assert!(!keeper.is_recovering());
    assert!(keeper.is_server_active());
}

#[test]
fn test_server_keeps_serving_after_recovery() {
    let (dispatcher, _keeper) = standard_dispatcher("*");
    assert_eq!(run_text(&dispatcher, "ruok"), "imok");
    assert_eq!(run_text(&dispatcher, "rcvr"), "ok");

    assert_eq!(run_text(&dispatcher, "ruok"), "imok");
    assert!(run_text(&dispatcher, "mntr").starts_with("zk_version\t"));
    assert_eq!(run_text(&dispatcher, "csnp"), "0\n");

    let pfev = run_text(&dispatcher, "pfev");
    assert!(pfev.contains("KeeperRecoveries\t1\t"));
}

#[test]
fn test_isro_and_apiv() {
    let (dispatcher, keeper) = standard_dispatcher("*");
    assert_eq!(run_text(&dispatcher, "isro"), "rw");
    keeper.set_read_only(true);
    assert_eq!(run_text(&dispatcher, "isro"), "ro");
    assert_eq!(
        run_text(&dispatcher, "apiv"),
        kdiag_core::memory::API_VERSION.to_string()
    );
}

#[test]
fn test_dirs_reports_directory_sizes() {
    let snapshots = tempfile::tempdir().unwrap();
    let logs = tempfile::tempdir().unwrap();
    std::fs::write(snapshots.path().join("snapshot_1.bin"), [1u8; 64]).unwrap();
    std::fs::write(logs.path().join("changelog_1.bin"), [1u8; 16]).unwrap();

    let settings = KeeperSettings {
        snapshot_storage_path: Some(snapshots.path().to_path_buf()),
        log_storage_path: Some(logs.path().to_path_buf()),
        ..KeeperSettings::default()
    };
    let (dispatcher, _keeper) = keeper_dispatcher(MemoryKeeper::from_config(&settings), "*");
    assert_eq!(
        run_text(&dispatcher, "dirs"),
        "snapshot_dir_size: 64\nlog_dir_size: 16\n"
    );
}

#[test]
fn test_conf_redacts_sensitive_values() {
    let mut coordination_settings = BTreeMap::new();
    coordination_settings.insert(
        "auth_password".to_string(),
        toml::Value::String("hunter2".to_string()),
    );
    coordination_settings.insert("snapshot_distance".to_string(), toml::Value::Integer(1000));
    let settings = KeeperSettings {
        server_id: 7,
        coordination_settings,
        ..KeeperSettings::default()
    };
    let (dispatcher, _keeper) = keeper_dispatcher(MemoryKeeper::from_config(&settings), "*");

    let conf = run_text(&dispatcher, "conf");
    assert!(conf.starts_with("server_id=7\n"));
    assert!(conf.contains("coordination_settings.snapshot_distance=1000\n"));
    assert!(conf.contains(&format!("coordination_settings.auth_password={}\n", REDACTED)));
    assert!(!conf.contains("hunter2"));
}

#[test]
fn test_ftfl_lists_flags() {
    let mut feature_flags = BTreeMap::new();
    feature_flags.insert("filtered_list".to_string(), false);
    feature_flags.insert("multi_read".to_string(), true);
    let settings = KeeperSettings {
        feature_flags,
        ..KeeperSettings::default()
    };
    let (dispatcher, _keeper) = keeper_dispatcher(MemoryKeeper::from_config(&settings), "*");
    assert_eq!(
        run_text(&dispatcher, "ftfl"),
        "filtered_list\t0\nmulti_read\t1\n"
    );
}

#[test]
fn test_envi_layout() {
    let (dispatcher, _keeper) = standard_dispatcher("*");
    let envi = run_text(&dispatcher, "envi");
    let mut lines = envi.lines();
    assert_eq!(lines.next(), Some("Environment:"));
    let keys: Vec<&str> = lines.map(|l| l.split_once('=').unwrap().0).collect();
    assert_eq!(
        keys,
        vec![
            "keeper.version",
            "host.name",
            "os.name",
            "os.arch",
            "cpu.count",
            "user.name",
            "user.home",
            "user.dir",
            "user.tmp"
        ]
    );
}

#[test]
fn test_pfev_counts_actions() {
    let (dispatcher, _keeper) = standard_dispatcher("*");
    run_text(&dispatcher, "srst");
    run_text(&dispatcher, "srst");

    let pfev = run_text(&dispatcher, "pfev");
    let row = pfev
        .lines()
        .find(|l| l.starts_with("KeeperStatResets\t"))
        .unwrap();
    let columns: Vec<&str> = row.split('\t').collect();
    assert_eq!(columns.len(), 3);
    assert_eq!(columns[1], "2");
}
