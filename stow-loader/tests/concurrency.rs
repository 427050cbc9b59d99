mod common;

use std::sync::{Arc, Barrier};
use std::thread;

use common::{init_logger, layout, primary, write_image, FakeOpener};
use stow_loader::{IsolationManager, ModuleRequest};
use tempfile::tempdir;

#[test]
fn test_concurrent_first_resolution() {
    init_logger();
    let tmp = tempdir().expect("tempdir");
    let names: Vec<String> = (0..6).map(|i| format!("Mod{}", i)).collect();
    let mapping = names
        .iter()
        .map(|name| format!("{}.dll:h{}", name, name.len()))
        .collect::<Vec<_>>()
        .join("|");
    for name in &names {
        write_image(
            &tmp.path()
                .join("libs")
                .join(format!("{}.dll", name))
                .join(format!("h{}", name.len()))
                .join(format!("{}.dll", name)),
        );
    }

    let opener = Arc::new(FakeOpener::default());
    let app = Arc::new(primary(opener.clone()));
    let manager = IsolationManager::install(
        layout(
            tmp.path(),
            &[
                ("library-directories", "libs"),
                ("shared-runtime-mode", "default"),
                ("shared-runtime-mapping", &mapping),
            ],
        ),
        app.as_ref(),
        opener,
        None,
    )
    .expect("installed");

    let threads = 12;
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let app = Arc::clone(&app);
            let barrier = Arc::clone(&barrier);
            let name = names[t % names.len()].clone();
            thread::spawn(move || {
                barrier.wait();
                app.load(&ModuleRequest::new(name))
            })
        })
        .collect();

    for handle in handles {
        let module = handle.join().expect("thread finished").expect("resolved");
        assert!(module.path.ends_with(format!("{}.dll", module.name)));
        assert_eq!(module.context, "default");
    }
    assert!(manager.shared_context().modules().is_empty());
}

#[test]
fn test_same_name_race_loads_once() {
    init_logger();
    let tmp = tempdir().expect("tempdir");
    write_image(&tmp.path().join("libs/Foo.dll"));

    for _ in 0..50 {
        let opener = Arc::new(FakeOpener::default());
        let app = Arc::new(primary(opener.clone()));
        let manager = IsolationManager::install(
            layout(tmp.path(), &[("library-directories", "libs")]),
            app.as_ref(),
            opener,
            None,
        )
        .expect("installed");

        let threads = 8;
        let barrier = Arc::new(Barrier::new(threads));
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let app = Arc::clone(&app);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    app.load(&ModuleRequest::new("Foo"))
                })
            })
            .collect();

        let modules: Vec<_> = handles
            .into_iter()
            .map(|handle| handle.join().expect("thread finished").expect("resolved"))
            .collect();

        for module in &modules[1..] {
            assert!(Arc::ptr_eq(&modules[0], module));
        }
        assert_eq!(modules[0].context, "default");
        assert!(manager.shared_context().modules().is_empty());
    }
}
