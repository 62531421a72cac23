use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use spindle_task::{pause, Task};

use crate::{Driver, PanicPolicy};


/// Increments a shared counter when dropped.
struct DropCounter(Rc<Cell<usize>>);

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.0.set(self.0.get() + 1);
    }
}

/// A task which counts its resumptions and pauses `pauses` times.
fn counted(resumes: &Rc<Cell<usize>>, pauses: usize) -> Task<()> {
    let resumes = resumes.clone();
    Task::new(async move {
        resumes.set(resumes.get() + 1);
        for _ in 0..pauses {
            pause().await;
            resumes.set(resumes.get() + 1);
        }
    })
}

#[test]
fn tick_empty() {
    let mut driver = Driver::new();
    assert!(driver.is_idle());
    assert!(driver.tick());
    assert_eq!(driver.ticks(), 1);
}

#[test]
fn submit_does_not_run() {
    let mut driver = Driver::new();
    let resumes = Rc::new(Cell::new(0));
    driver.submit(counted(&resumes, 0));
    assert_eq!(driver.live(), 1);
    assert_eq!(resumes.get(), 0);

    assert!(driver.tick());
    assert_eq!(resumes.get(), 1);
}

#[test]
fn retired_slot_visits_swapped_tree() {
    let mut driver = Driver::new();
    let (a, b, c) = (
        Rc::new(Cell::new(0)),
        Rc::new(Cell::new(0)),
        Rc::new(Cell::new(0)),
    );
    driver.submit(counted(&a, 0));
    driver.submit(counted(&b, 1));
    driver.submit(counted(&c, 1));

    // `a` retires first and `c` is swapped into its slot, it must still be
    // resumed exactly once this tick.
    assert!(!driver.tick());
    assert_eq!((a.get(), b.get(), c.get()), (1, 1, 1));
    assert_eq!(driver.live(), 2);

    assert!(driver.tick());
    assert_eq!((a.get(), b.get(), c.get()), (1, 2, 2));
}

#[test]
fn run_counts_ticks() {
    let mut driver = Driver::new();
    let resumes = Rc::new(Cell::new(0));
    driver.submit(counted(&resumes, 4));
    driver.submit(counted(&resumes, 1));
    assert_eq!(driver.run(), 5);
    assert_eq!(resumes.get(), 5 + 2);
    assert_eq!(driver.run(), 0);
}

#[test]
fn spawn_from_handle_joins_next_tick() {
    let mut driver = Driver::new();
    let handle = driver.handle();
    let inner = Rc::new(Cell::new(0));

    let i2 = inner.clone();
    driver.spawn(async move {
        let i3 = i2.clone();
        handle
            .spawn(async move { i3.set(i3.get() + 1) })
            .unwrap();
    });

    assert!(!driver.tick());
    assert_eq!(inner.get(), 0);
    assert_eq!(driver.live(), 1);

    assert!(driver.tick());
    assert_eq!(inner.get(), 1);
}

#[test]
fn submit_after_shutdown() {
    let driver = Driver::new();
    let handle = driver.handle();
    drop(driver);

    let dropped = Rc::new(Cell::new(0));
    let guard = DropCounter(dropped.clone());
    let err = handle
        .spawn(async move {
            let _guard = guard;
        })
        .unwrap_err();
    assert!(err.is_shutdown());
    assert_eq!(err.to_string(), "the driver has shut down");
    // The task is released without running.
    assert_eq!(dropped.get(), 1);
}

#[test]
fn drop_tears_down_suspended_trees() {
    let dropped = Rc::new(Cell::new(0));
    let mut driver = Driver::new();

    let (parent_guard, child_guard) = (DropCounter(dropped.clone()), DropCounter(dropped.clone()));
    driver.spawn(async move {
        let _guard = parent_guard;
        Task::new(async move {
            let _guard = child_guard;
            futures::future::pending::<()>().await;
        })
        .await;
    });
    let idle_guard = DropCounter(dropped.clone());
    driver.spawn(async move {
        let _guard = idle_guard;
        pause().await;
    });
    let pending_guard = DropCounter(dropped.clone());
    driver
        .handle()
        .spawn(async move {
            let _guard = pending_guard;
        })
        .unwrap();

    driver.tick();
    driver.tick();
    assert_eq!(driver.live(), 1);
    assert_eq!(dropped.get(), 2);

    drop(driver);
    assert_eq!(dropped.get(), 4);
}

#[test]
fn unwind_removes_panicking_tree() {
    let mut driver = Driver::builder()
        .panic_policy(PanicPolicy::Unwind)
        .build();
    let dropped = Rc::new(Cell::new(0));
    let resumes = Rc::new(Cell::new(0));

    let guard = DropCounter(dropped.clone());
    driver.spawn(async move {
        let _guard = guard;
        Task::new(async {
            pause().await;
            panic!("boom");
        })
        .await;
    });
    driver.submit(counted(&resumes, 3));

    assert!(!driver.tick());
    assert!(!driver.tick());
    let res = panic::catch_unwind(AssertUnwindSafe(|| driver.tick()));
    let payload = res.unwrap_err();
    assert_eq!(payload.downcast_ref::<&str>(), Some(&"boom"));
    assert_eq!(driver.ticks(), 3);

    // The parent was torn down with its child, the other tree is untouched.
    assert_eq!(dropped.get(), 1);
    assert_eq!(driver.live(), 1);
    assert_eq!(driver.run(), 2);
    assert_eq!(resumes.get(), 4);
}

#[test]
fn panic_cuts_tick_short() {
    let mut driver = Driver::builder()
        .panic_policy(PanicPolicy::Unwind)
        .build();
    let resumes = Rc::new(Cell::new(0));
    driver.spawn(async {
        panic!("boom");
    });
    driver.submit(counted(&resumes, 0));

    assert!(panic::catch_unwind(AssertUnwindSafe(|| driver.tick())).is_err());
    // The tick counts, but the tree after the panicking one was not resumed.
    assert_eq!(driver.ticks(), 1);
    assert_eq!(resumes.get(), 0);
    assert_eq!(driver.live(), 1);

    assert!(driver.tick());
    assert_eq!(resumes.get(), 1);
}

#[test]
fn debug_output() {
    let mut driver = Driver::builder().capacity(4).build();
    driver.spawn(async {});
    assert_eq!(
        format!("{driver:?}"),
        "Driver { live: 1, ticks: 0, panic_policy: Abort }"
    );
}
