mod common;

use std::path::Path;
use std::sync::Arc;

use common::{init_logger, layout, primary, write_image, FakeOpener};
use stow_loader::{IsolationManager, LoadError, PlatformFamily};
use tempfile::tempdir;

/// File name the current platform's variants put first after the bare name
fn platform_file(name: &str) -> String {
    match PlatformFamily::current() {
        PlatformFamily::Windows => format!("{}.dll", name),
        PlatformFamily::MacOS => format!("lib{}.dylib", name),
        PlatformFamily::Unix => format!("lib{}.so", name),
    }
}

fn install(base: &Path, pairs: &[(&str, &str)]) -> (stow_loader::IsolatedContext, Arc<FakeOpener>, IsolationManager) {
    let opener = Arc::new(FakeOpener::default());
    let app = primary(opener.clone());
    let manager =
        IsolationManager::install(layout(base, pairs), &app, opener.clone(), None).expect("installed");
    (app, opener, manager)
}

#[test]
fn test_native_default_mode() {
    init_logger();
    let tmp = tempdir().expect("tempdir");
    let file = tmp.path().join("libs").join(platform_file("sum"));
    write_image(&file);

    let (app, opener, _manager) = install(tmp.path(), &[("library-directories", "libs")]);

    let handle = app.load_native("sum").expect("resolved");
    assert!(!handle.as_ptr().is_null());
    assert_eq!(*opener.opened.lock().unwrap(), vec![file]);

    // second request is answered by the context without probing again
    let again = app.load_native("sum").expect("cached");
    assert_eq!(handle, again);
    assert_eq!(opener.opened.lock().unwrap().len(), 1);
}

#[test]
fn test_native_dedup_mode_uses_app_namespace() {
    init_logger();
    let tmp = tempdir().expect("tempdir");
    let flat = tmp.path().join("libs").join(platform_file("sum"));
    let namespaced = tmp
        .path()
        .join("libs/srm_native/app1")
        .join(platform_file("sum"));
    write_image(&flat);
    write_image(&namespaced);

    let (app, opener, _manager) = install(
        tmp.path(),
        &[
            ("library-directories", "libs"),
            ("shared-runtime-mode", "default"),
            ("shared-runtime-app-id", "app1"),
        ],
    );

    app.load_native("sum").expect("resolved");
    assert_eq!(*opener.opened.lock().unwrap(), vec![namespaced]);
}

#[test]
fn test_native_total_miss() {
    init_logger();
    let tmp = tempdir().expect("tempdir");
    let (app, opener, manager) = install(tmp.path(), &[("library-directories", "libs;other")]);

    assert!(manager.loader().native().resolve("sum").is_none());
    let err = app.load_native("sum").unwrap_err();
    assert!(matches!(err, LoadError::NativeNotFound(name) if name == "sum"));
    assert!(opener.opened.lock().unwrap().is_empty());
}
