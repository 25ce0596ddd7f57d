use super::*;
use tempfile::tempdir;

#[test]
fn test_new_stamps_both_timestamps() {
    let link = ProjectLink::new("proj1", "Work", Path::new("/tmp/work"));
    assert_eq!(link.version, "1.0");
    assert_eq!(link.project_id, "proj1");
    assert_eq!(link.project_name, "Work");
    assert_eq!(link.folder_path, "/tmp/work");
    assert_eq!(link.created_at, link.synced_at);
    assert!(!link.created_at.is_empty());
}

#[test]
fn test_save_then_load_round_trips() {
    let dir = tempdir().unwrap();
    let link = ProjectLink::new("proj1", "Work", dir.path());

    let path = link.save(dir.path()).unwrap();
    assert_eq!(path.file_name().unwrap(), LINK_FILE_NAME);

    let loaded = ProjectLink::load(&path).unwrap();
    assert_eq!(loaded, link);
}

#[test]
fn test_link_file_uses_camel_case_keys() {
    let dir = tempdir().unwrap();
    let link = ProjectLink::new("proj1", "Work", dir.path());
    let path = link.save(dir.path()).unwrap();

    let raw = std::fs::read_to_string(path).unwrap();
    assert!(raw.contains("\"projectId\""));
    assert!(raw.contains("\"projectName\""));
    assert!(raw.contains("\"folderPath\""));
    assert!(raw.contains("\"createdAt\""));
    assert!(raw.contains("\"syncedAt\""));
}

#[cfg(unix)]
#[test]
fn test_link_file_is_world_readable() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let path = ProjectLink::new("proj1", "Work", dir.path())
        .save(dir.path())
        .unwrap();
    let mode = std::fs::metadata(path).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o644);
}

#[test]
fn test_load_rejects_missing_required_fields() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(LINK_FILE_NAME);

    let cases = [
        (r#"{"version":"","projectId":"p","projectName":"n","folderPath":"f","createdAt":"t","syncedAt":"t"}"#, "version"),
        (r#"{"version":"1.0","projectId":"","projectName":"n","folderPath":"f","createdAt":"t","syncedAt":"t"}"#, "projectId"),
        (r#"{"version":"1.0","projectId":"p","projectName":"","folderPath":"f","createdAt":"t","syncedAt":"t"}"#, "projectName"),
        (r#"{"version":"1.0","projectId":"p","projectName":"n","folderPath":"","createdAt":"t","syncedAt":"t"}"#, "folderPath"),
    ];

    for (json, field) in cases {
        std::fs::write(&path, json).unwrap();
        let err = ProjectLink::load(&path).unwrap_err();
        match err {
            LinkError::MissingField { field: f } => assert_eq!(f, field),
            other => panic!("expected MissingField for {}, got {:?}", field, other),
        }
    }
}

#[test]
fn test_load_rejects_invalid_json() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(LINK_FILE_NAME);
    std::fs::write(&path, "{oops").unwrap();
    assert!(matches!(
        ProjectLink::load(&path).unwrap_err(),
        LinkError::Parse { .. }
    ));
}

#[test]
fn test_touch_synced_updates_only_synced_at() {
    let dir = tempdir().unwrap();
    let mut link = ProjectLink::new("proj1", "Work", dir.path());
    // Backdate so the refresh is observable
    link.synced_at = "2020-01-01T00:00:00+00:00".to_string();
    link.created_at = "2020-01-01T00:00:00+00:00".to_string();
    let path = link.save(dir.path()).unwrap();

    touch_synced(&path).unwrap();

    let reloaded = ProjectLink::load(&path).unwrap();
    assert_eq!(reloaded.created_at, link.created_at);
    assert_eq!(reloaded.project_id, link.project_id);
    assert_ne!(reloaded.synced_at, link.synced_at);
}

#[test]
fn test_find_link_file_prefers_nearest_ancestor() {
    let root = tempdir().unwrap();
    let nested = root.path().join("a/b/c");
    std::fs::create_dir_all(&nested).unwrap();

    ProjectLink::new("outer", "Outer", root.path())
        .save(root.path())
        .unwrap();
    let mid = root.path().join("a/b");
    ProjectLink::new("inner", "Inner", &mid).save(&mid).unwrap();

    let found = find_link_file(&nested).expect("link should be found");
    assert_eq!(found, mid.join(LINK_FILE_NAME));

    let link = ProjectLink::load(&found).unwrap();
    assert_eq!(link.project_id, "inner");
}

#[test]
fn test_find_link_file_returns_none_without_marker() {
    let dir = tempdir().unwrap();
    let nested = dir.path().join("x/y");
    std::fs::create_dir_all(&nested).unwrap();
    assert!(find_link_file(&nested).is_none());
}

#[test]
fn test_context_from_loads_nearest_link() {
    let root = tempdir().unwrap();
    let nested = root.path().join("sub");
    std::fs::create_dir_all(&nested).unwrap();
    ProjectLink::new("proj1", "Work", root.path())
        .save(root.path())
        .unwrap();

    let ctx = context_from(&nested).unwrap().expect("context expected");
    assert_eq!(ctx.link.project_id, "proj1");
    assert_eq!(ctx.path, root.path().join(LINK_FILE_NAME));

    let empty = tempdir().unwrap();
    assert!(context_from(empty.path()).unwrap().is_none());
}

#[test]
fn test_has_link_file() {
    let dir = tempdir().unwrap();
    assert!(!has_link_file(dir.path()));
    ProjectLink::new("p", "n", dir.path())
        .save(dir.path())
        .unwrap();
    assert!(has_link_file(dir.path()));
}
