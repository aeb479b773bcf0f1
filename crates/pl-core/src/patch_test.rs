use super::*;

#[test]
fn test_parse_patch_file_name() {
    let parsed = parse_patch_file_name("patch12_add_orders.sql")
        .unwrap()
        .unwrap();
    assert_eq!(parsed.version, 12);
    assert_eq!(parsed.description, "add_orders");
    assert_eq!(parsed.extension, "sql");
}

#[test]
fn test_leading_zeros_compare_numerically() {
    let parsed = parse_patch_file_name("patch007_seed.csv").unwrap().unwrap();
    assert_eq!(parsed.version, 7);
}

#[test]
fn test_dotted_description_keeps_last_extension() {
    let parsed = parse_patch_file_name("patch3_v1.2_fix.sql").unwrap().unwrap();
    assert_eq!(parsed.description, "v1.2_fix");
    assert_eq!(parsed.extension, "sql");
}

#[test]
fn test_non_patch_names_are_skipped() {
    for name in [
        "README.md",
        "patch_no_digits.sql",
        "patch12.sql",
        "patch12_.sql",
        "patch12_noext",
        "Patch12_upper.sql",
        "xpatch12_prefixed.sql",
    ] {
        assert!(
            parse_patch_file_name(name).unwrap().is_none(),
            "{} should not be a patch",
            name
        );
    }
}

#[test]
fn test_version_zero_rejected() {
    let err = parse_patch_file_name("patch0_init.sql").unwrap_err();
    assert!(matches!(err, CoreError::InvalidPatchVersion { .. }));
}

#[test]
fn test_version_overflow_rejected() {
    let err = parse_patch_file_name("patch99999999999999999999999_big.sql").unwrap_err();
    assert!(err.to_string().contains("[P002]"));
}

#[test]
fn test_payload_kind() {
    assert_eq!(
        PatchPayload::SqlScript("SELECT 1".to_string()).kind(),
        PatchKind::SqlScript
    );
    assert_eq!(
        PatchPayload::Task(TaskRef::new("noop")).kind(),
        PatchKind::ProgrammaticTask
    );
    assert_eq!(
        PatchPayload::DataLoad(DataLoadSpec::csv("a.csv", "a")).kind(),
        PatchKind::DataLoad
    );
}

#[test]
fn test_resolve_resource() {
    let patch = Patch {
        version: 1,
        name: PatchName::new("patch1_rows.yml"),
        description: "rows".to_string(),
        base_dir: PathBuf::from("/srv/patches"),
        payload: PatchPayload::DataLoad(DataLoadSpec::csv("data/rows.csv", "rows")),
    };
    assert_eq!(
        patch.resolve_resource("data/rows.csv"),
        PathBuf::from("/srv/patches/data/rows.csv")
    );
    assert_eq!(
        patch.resolve_resource("/abs/rows.csv"),
        PathBuf::from("/abs/rows.csv")
    );
    assert_eq!(patch.to_string(), "patch1_rows.yml (v1, data-load)");
}

#[test]
fn test_has_patch_extension() {
    assert!(has_patch_extension("patch1_a.sql"));
    assert!(has_patch_extension("patch2_rows.CSV"));
    assert!(has_patch_extension("patch3_load.yaml"));
    assert!(!has_patch_extension("patch0_notes.txt"));
    assert!(!has_patch_extension("Makefile"));
}
