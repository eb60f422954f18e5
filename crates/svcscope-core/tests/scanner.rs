mod common;

use std::collections::HashMap;

use common::{
    full_fields, string_file_info, string_table, var_file_info, version_block, FakeEnvironment, FakeLoader,
    FakeManager, FakeService, ERROR_ACCESS_DENIED,
};
use svcscope_core::platform::{FailureActionConfig, FailureActionsConfig, TriggerConfig};
use svcscope_core::record::NO_DESCRIPTION;
use svcscope_core::{CancelToken, ScanError, ScanOptions, Scanner};

fn sequential() -> ScanOptions {
    ScanOptions {
        workers: 1,
        ..Default::default()
    }
}

fn services(n: usize) -> Vec<FakeService> {
    (0..n)
        .map(|i| FakeService::new(&format!("Svc{i:02}"), &format!("C:\\Svc\\svc{i:02}.exe -run")))
        .collect()
}

#[test]
fn every_service_is_returned_in_enumeration_order_across_pages() {
    let mut manager = FakeManager::new(services(7));
    manager.page_limit = 3;
    let env = FakeEnvironment::default();
    let loader = FakeLoader::default();
    let scanner = Scanner::new(&manager, &env, &loader, sequential());

    let inventory = scanner.collect(&CancelToken::new()).expect("scan");
    let names: Vec<&str> = inventory.records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["Svc00", "Svc01", "Svc02", "Svc03", "Svc04", "Svc05", "Svc06"]);
    assert!(inventory.skipped.is_empty());
    assert!(manager.pages_served.load(std::sync::atomic::Ordering::SeqCst) >= 3);
}

#[test]
fn record_fields_are_decoded() {
    let mut svc = FakeService::new("Spooler", "C:\\Windows\\System32\\spoolsv.exe");
    svc.config.start_type = 2;
    svc.delayed_auto_start = true;
    svc.config.dependencies = vec!["RPCSS".into(), "http".into()];
    svc.required_privileges = vec!["SeImpersonatePrivilege".into()];
    svc.sid_type = 1;
    svc.launch_protected = 3;
    svc.preshutdown_timeout_ms = 180_000;
    svc.failure_actions = FailureActionsConfig {
        reset_period_secs: 86_400,
        reboot_message: String::new(),
        command: String::new(),
        actions: vec![
            FailureActionConfig { kind: 1, delay_ms: 60_000 },
            FailureActionConfig { kind: 0, delay_ms: 0 },
        ],
    };
    svc.triggers = vec![TriggerConfig {
        trigger_type: 3,
        action: 1,
        subtype: "1ce20aba-9851-4421-9430-1ddeb766e809".into(),
    }];
    let manager = FakeManager::new(vec![svc]);
    let env = FakeEnvironment::default();
    let loader = FakeLoader::default();
    let scanner = Scanner::new(&manager, &env, &loader, sequential());

    let inventory = scanner.collect(&CancelToken::new()).expect("scan");
    let record = &inventory.records[0];
    assert_eq!(record.display_name, "Spooler Display");
    assert_eq!(record.description, "Spooler description");
    assert_eq!(record.state, "Running");
    assert_eq!(record.controls_accepted, "Stop, Shutdown");
    assert_eq!(record.service_type, "Own Process");
    assert_eq!(record.start_type, "Auto Start [Delayed]");
    assert!(record.delayed_auto_start);
    assert_eq!(record.error_control, "Normal");
    assert_eq!(record.start_name, "LocalSystem");
    assert_eq!(record.dependencies, ["RPCSS", "http"]);
    assert_eq!(record.required_privileges, ["SeImpersonatePrivilege"]);
    assert_eq!(record.sid_type, "Unrestricted");
    assert_eq!(record.launch_protected, "Antimalware Light");
    assert_eq!(record.preshutdown_timeout_ms, 180_000);
    assert_eq!(record.failure_actions.reset_period_secs, 86_400);
    assert_eq!(record.failure_actions.actions[0].action, "Restart");
    assert_eq!(record.failure_actions.actions[0].delay_ms, 60_000);
    assert_eq!(record.failure_actions.actions[1].action, "None");
    assert_eq!(record.triggers[0].trigger_type, "Domain Join");
    assert_eq!(record.triggers[0].action, "Start Service");
    assert_eq!(record.normalized_path, "C:\\Windows\\System32\\spoolsv.exe");
}

#[test]
fn inaccessible_service_is_skipped_without_failing_the_pass() {
    let mut all = services(3);
    all[1].deny_open = true;
    let manager = FakeManager::new(all);
    let env = FakeEnvironment::default();
    let loader = FakeLoader::default();
    let scanner = Scanner::new(&manager, &env, &loader, sequential());

    let inventory = scanner.collect(&CancelToken::new()).expect("scan");
    let names: Vec<&str> = inventory.records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["Svc00", "Svc02"]);
    assert_eq!(inventory.skipped.len(), 1);
    assert_eq!(inventory.skipped[0].name, "Svc01");
}

#[test]
fn unsupported_auxiliary_queries_degrade_to_defaults() {
    let mut svc = FakeService::new("Legacy", "C:\\Legacy\\legacy.exe");
    svc.config.start_type = 2;
    svc.delayed_auto_start = true;
    svc.aux_unsupported = true;
    let manager = FakeManager::new(vec![svc]);
    let env = FakeEnvironment::default();
    let loader = FakeLoader::default();
    let scanner = Scanner::new(&manager, &env, &loader, sequential());

    let inventory = scanner.collect(&CancelToken::new()).expect("scan");
    let record = &inventory.records[0];
    assert_eq!(record.description, NO_DESCRIPTION);
    assert!(!record.delayed_auto_start);
    assert_eq!(record.start_type, "Auto Start");
    assert!(record.required_privileges.is_empty());
    assert_eq!(record.sid_type, "None");
    assert_eq!(record.launch_protected, "None");
    assert_eq!(record.preshutdown_timeout_ms, 0);
    assert!(record.failure_actions.actions.is_empty());
    assert!(record.triggers.is_empty());
}

#[test]
fn enumeration_failure_mid_loop_fails_the_whole_pass() {
    let mut manager = FakeManager::new(services(6));
    manager.page_limit = 2;
    manager.fail_at_page = Some(2);
    let env = FakeEnvironment::default();
    let loader = FakeLoader::default();
    let scanner = Scanner::new(&manager, &env, &loader, sequential());

    let err = scanner.collect(&CancelToken::new()).expect_err("must fail");
    assert!(matches!(err, ScanError::Native { .. }));
    assert_eq!(err.native_code(), Some(ERROR_ACCESS_DENIED));
    assert_eq!(manager.opened(), 0, "no partial resolution after a fatal enumeration error");
}

#[test]
fn every_opened_handle_is_closed() {
    let mut all = services(5);
    all[2].deny_open = true;
    all[3].aux_unsupported = true;
    let manager = FakeManager::new(all);
    let env = FakeEnvironment::default();
    let loader = FakeLoader::default();
    let scanner = Scanner::new(
        &manager,
        &env,
        &loader,
        ScanOptions {
            workers: 3,
            ..Default::default()
        },
    );

    scanner.collect(&CancelToken::new()).expect("scan");
    assert_eq!(manager.opened(), 4);
    assert_eq!(manager.closed(), manager.opened());
}

#[test]
fn version_info_is_read_from_normalized_path() {
    let svc = FakeService::new("Contoso", "\"%ProgramFiles%\\Contoso\\contosoupd.exe\" /svc");
    let manager = FakeManager::new(vec![svc]);
    let env = FakeEnvironment::default();
    let block = version_block(
        Some((0x0001_0002, 0x0003_0004, 0x0001_0002, 0)),
        &[
            string_file_info(&[string_table("040904B0", &full_fields())]),
            var_file_info(&[(0x0409, 0x04B0)]),
        ],
    );
    let loader = FakeLoader::with_block("C:\\Program Files\\Contoso\\contosoupd.exe", block);
    let scanner = Scanner::new(&manager, &env, &loader, sequential());

    let record = scanner.collect(&CancelToken::new()).expect("scan").records.remove(0);
    assert_eq!(record.image_path, "\"%ProgramFiles%\\Contoso\\contosoupd.exe\" /svc");
    assert_eq!(record.normalized_path, "C:\\Program Files\\Contoso\\contosoupd.exe");
    assert!(record.version.has_resource_info);
    assert_eq!(record.version.product_name, "Contoso Updater");
    assert_eq!(record.version.fixed_file_version.as_deref(), Some("1.2.3.4"));
}

#[test]
fn version_lookup_can_be_disabled() {
    let svc = FakeService::new("Contoso", "C:\\Contoso\\svc.exe");
    let manager = FakeManager::new(vec![svc]);
    let env = FakeEnvironment::default();
    let block = version_block(None, &[string_file_info(&[string_table("040904B0", &full_fields())])]);
    let loader = FakeLoader::with_block("C:\\Contoso\\svc.exe", block);
    let options = ScanOptions {
        workers: 1,
        resolve_version_info: false,
        ..Default::default()
    };
    let scanner = Scanner::new(&manager, &env, &loader, options);

    let record = scanner.collect(&CancelToken::new()).expect("scan").records.remove(0);
    assert!(!record.version.has_resource_info);
}

#[test]
fn repeated_passes_agree_but_carry_distinct_ids() {
    let manager = FakeManager::new(services(4));
    let env = FakeEnvironment::default();
    let loader = FakeLoader::default();
    let scanner = Scanner::new(&manager, &env, &loader, sequential());

    let first = scanner.collect(&CancelToken::new()).expect("first");
    let second = scanner.collect(&CancelToken::new()).expect("second");
    assert_eq!(first.records, second.records);
    assert_ne!(first.pass_id, second.pass_id);
}

#[test]
fn parallel_pass_matches_sequential_pass() {
    let mut all = services(20);
    all[7].deny_open = true;
    let manager = FakeManager::new(all);
    let env = FakeEnvironment::default();
    let loader = FakeLoader::default();

    let sequential_pass = Scanner::new(&manager, &env, &loader, sequential())
        .collect(&CancelToken::new())
        .expect("sequential");
    let parallel_pass = Scanner::new(
        &manager,
        &env,
        &loader,
        ScanOptions {
            workers: 4,
            ..Default::default()
        },
    )
    .collect(&CancelToken::new())
    .expect("parallel");

    assert_eq!(sequential_pass.records, parallel_pass.records);
    assert_eq!(sequential_pass.skipped, parallel_pass.skipped);
}

#[test]
fn cancelled_pass_reports_cancellation() {
    let manager = FakeManager::new(services(3));
    let env = FakeEnvironment::default();
    let loader = FakeLoader::default();
    let scanner = Scanner::new(&manager, &env, &loader, sequential());

    let cancel = CancelToken::new();
    cancel.cancel();
    let err = scanner.collect(&cancel).expect_err("cancelled");
    assert!(matches!(err, ScanError::Cancelled));
    assert_eq!(manager.opened(), 0);
}

#[test]
fn empty_and_duplicate_names_are_dropped() {
    let mut all = services(2);
    all.push(FakeService::new("", "C:\\x.exe"));
    all.push(FakeService::new("svc00", "C:\\dup.exe"));
    let manager = FakeManager::new(all);
    let env = FakeEnvironment::default();
    let loader = FakeLoader::default();
    let scanner = Scanner::new(&manager, &env, &loader, sequential());

    let entries = scanner.enumerate().expect("enumerate");
    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["Svc00", "Svc01"]);
}

#[test]
fn first_page_probe_starts_from_empty_buffer() {
    let manager = FakeManager::new(services(3));
    let env = FakeEnvironment::default();
    let loader = FakeLoader::default();
    let scanner = Scanner::new(&manager, &env, &loader, sequential());

    let entries = scanner.enumerate().expect("enumerate");
    assert_eq!(entries.len(), 3);
    // 第一页只探测大小，第二页一次装下全部条目
    assert_eq!(manager.pages_served.load(std::sync::atomic::Ordering::SeqCst), 2);
}

#[test]
fn service_dll_and_process_name_are_resolved() {
    let mut svc = FakeService::new("Dnscache", "%SystemRoot%\\system32\\svchost.exe -k NetworkService -p");
    svc.service_dll = Some("%SystemRoot%\\System32\\dnsrslvr.dll".into());
    svc.entry.status.process_id = 4242;
    let manager = FakeManager::new(vec![svc]);
    let env = FakeEnvironment {
        process_names: HashMap::from([(4242, "svchost.exe".to_string())]),
    };
    let loader = FakeLoader::default();
    let scanner = Scanner::new(&manager, &env, &loader, sequential());

    let record = scanner.collect(&CancelToken::new()).expect("scan").records.remove(0);
    assert_eq!(record.normalized_path, "C:\\Windows\\system32\\svchost.exe");
    assert_eq!(record.service_dll.as_deref(), Some("C:\\Windows\\System32\\dnsrslvr.dll"));
    assert_eq!(record.process_name.as_deref(), Some("svchost.exe"));
}

#[test]
fn stopped_service_has_no_process_name() {
    let mut svc = FakeService::new("Stopped", "C:\\s.exe");
    svc.entry.status.current_state = 1;
    svc.entry.status.process_id = 0;
    let manager = FakeManager::new(vec![svc]);
    let env = FakeEnvironment {
        process_names: HashMap::from([(0, "System Idle Process".to_string())]),
    };
    let loader = FakeLoader::default();
    let scanner = Scanner::new(&manager, &env, &loader, sequential());

    let record = scanner.collect(&CancelToken::new()).expect("scan").records.remove(0);
    assert_eq!(record.state, "Stopped");
    assert_eq!(record.process_name, None);
}

#[test]
fn display_name_falls_back_to_configuration_then_name() {
    let mut from_config = FakeService::new("A", "C:\\a.exe");
    from_config.entry.display_name.clear();
    from_config.config.display_name = "Configured A".into();
    let mut bare = FakeService::new("B", "C:\\b.exe");
    bare.entry.display_name.clear();
    let manager = FakeManager::new(vec![from_config, bare]);
    let env = FakeEnvironment::default();
    let loader = FakeLoader::default();
    let scanner = Scanner::new(&manager, &env, &loader, sequential());

    let inventory = scanner.collect(&CancelToken::new()).expect("scan");
    assert_eq!(inventory.records[0].display_name, "Configured A");
    assert_eq!(inventory.records[1].display_name, "B");
}

#[test]
fn larger_size_reported_mid_pass_is_retried() {
    let mut manager = FakeManager::new(services(5));
    manager.page_limit = 2;
    manager.grow_once_at_page = Some(3);
    let env = FakeEnvironment::default();
    let loader = FakeLoader::default();
    let scanner = Scanner::new(&manager, &env, &loader, sequential());

    let entries = scanner.enumerate().expect("growth must be retried, not fail");
    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["Svc00", "Svc01", "Svc02", "Svc03", "Svc04"]);
}

#[test]
fn page_that_never_fits_reports_buffer_did_not_grow() {
    let mut manager = FakeManager::new(services(4));
    manager.stall_from_page = Some(2);
    let env = FakeEnvironment::default();
    let loader = FakeLoader::default();
    let scanner = Scanner::new(&manager, &env, &loader, sequential());

    let err = scanner.enumerate().expect_err("must not loop forever");
    match err {
        ScanError::BufferDidNotGrow { allocated, reported, .. } => {
            assert_eq!(allocated, 4 * common::ENTRY_BYTES);
            assert_eq!(reported, allocated);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(manager.pages_served.load(std::sync::atomic::Ordering::SeqCst), 2);
}
