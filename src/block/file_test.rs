use super::*;

fn tmp_paths(tag: &str) -> (ffi::OsString, ffi::OsString) {
    let dir = std::env::temp_dir();
    let data = dir.join(format!("mvbt-test-{}-{}.data", tag, std::process::id()));
    let sidecar = dir.join(format!("mvbt-test-{}-{}.sidecar", tag, std::process::id()));
    (data.into_os_string(), sidecar.into_os_string())
}

fn cleanup(data: &ffi::OsStr, sidecar: &ffi::OsStr) {
    std::fs::remove_file(data).ok();
    std::fs::remove_file(sidecar).ok();
}

#[test]
fn test_file_container_roundtrip() {
    let (data, sidecar) = tmp_paths("roundtrip");
    cleanup(&data, &sidecar);

    {
        let mut c = FileContainer::create(&data, &sidecar, 128).unwrap();
        let id = c.allocate().unwrap();
        let payload = vec![9u8; 128];
        c.update(id, &payload).unwrap();
        c.flush().unwrap();
        assert_eq!(c.get(id).unwrap(), payload);
    }

    {
        let mut c = FileContainer::open(&data, &sidecar).unwrap();
        let payload = vec![9u8; 128];
        assert_eq!(c.get(0).unwrap(), payload);
    }

    cleanup(&data, &sidecar);
}

#[test]
fn test_file_container_free_list_reuse() {
    let (data, sidecar) = tmp_paths("freelist");
    cleanup(&data, &sidecar);

    let mut c = FileContainer::create(&data, &sidecar, 64).unwrap();
    let a = c.allocate().unwrap();
    let b = c.allocate().unwrap();
    c.remove(a).unwrap();
    let reused = c.allocate().unwrap();
    assert_eq!(reused, a);
    assert!(c.get(b).is_ok());

    cleanup(&data, &sidecar);
}

#[test]
fn test_file_container_close_idempotent() {
    let (data, sidecar) = tmp_paths("close");
    cleanup(&data, &sidecar);

    let mut c = FileContainer::create(&data, &sidecar, 32).unwrap();
    c.close().unwrap();
    c.close().unwrap();

    cleanup(&data, &sidecar);
}
