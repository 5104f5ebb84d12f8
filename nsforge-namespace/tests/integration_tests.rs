use nsforge_core::Error;
use nsforge_namespace::*;

#[test]
fn test_empty_selection_is_accepted_everywhere() {
    assert_eq!(unshare("", &UnshareOptions::default()).unwrap(), Unshared::Done);
    assert_eq!(setns("", None, &SetnsOptions::default()).unwrap(), 0);
}

#[test]
fn test_unknown_flag_character_is_rejected() {
    let err = unshare("q", &UnshareOptions::default()).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { .. }));

    let err = setns("q", None, &SetnsOptions::default()).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { .. }));
}

#[test]
fn test_registry_exposes_the_baseline_kinds() {
    let registry = Registry::global();
    for key in ["mount", "uts", "ipc", "network", "pid"] {
        let spec = registry.by_option_key(key).unwrap();
        assert_eq!(registry.by_code(spec.code).unwrap().option_key, key);
    }
}

#[test]
fn test_setns_requires_a_target_per_kind() {
    // A pid covers every kind; a single explicit file covers only its own.
    let options = SetnsOptions::new().with_file(NamespaceKind::Net, "/run/netns/x");
    let err = setns("nu", None, &options).unwrap_err();
    match err {
        Error::InvalidArgument { message } => assert!(message.contains("uts"), "{message}"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_id_map_shapes_agree() {
    let reference = IdMapSpec::from("0 1000 1").render(IdMapKind::Uid).unwrap();
    assert_eq!(reference, "0 1000 1\n");
    assert_eq!(
        IdMapSpec::Triple([0, 1000, 1]).render(IdMapKind::Uid).unwrap(),
        reference
    );
}

#[test]
fn test_time_offsets_parse_exactly() {
    let offset: TimeOffset = "123.456".parse().unwrap();
    assert_eq!(offset.to_string(), "123 456000000");
}

#[test]
fn test_namespace_files_of_the_current_process() {
    let files = NsFiles::current();
    assert!(files.mnt.ino().is_some());
    assert!(files.user.ino().is_some());
}

#[test]
#[ignore = "requires privileges to create namespaces"]
fn test_persisted_namespace_round_trips_through_setns() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("ipc");

    let options = UnshareOptions::new().with_persist(NamespaceKind::Ipc, &target);
    unshare("i", &options).unwrap();
    let created = NsFiles::current().ipc;

    let setns_options = SetnsOptions::new().with_file(NamespaceKind::Ipc, &target);
    setns("i", None, &setns_options).unwrap();

    assert_eq!(NsFiles::current().ipc.ino(), created.ino());
}

#[test]
#[ignore = "requires privileges to create namespaces"]
fn test_user_namespace_with_identity_map() {
    let uid = nix::unistd::getuid().as_raw();
    let options = UnshareOptions::new().with_map_uid([0, uid, 1]).with_map_gid([
        0,
        nix::unistd::getgid().as_raw(),
        1,
    ]);
    unshare("U", &options).unwrap();

    let map = std::fs::read_to_string("/proc/self/uid_map").unwrap();
    assert_eq!(map.trim(), format!("0 {uid} 1"));
}
