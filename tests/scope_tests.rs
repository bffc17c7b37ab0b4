//! Integration tests for the delimited-scope primitive.

use std::panic::{catch_unwind, AssertUnwindSafe};

use delimit::{reset, reset_multi, reset_with, MultiScope, Scope, ScopeConfig};

#[test]
fn pure_block_is_identity() {
    assert_eq!(reset(|_: &Scope<i32>| 42), 42);
    assert_eq!(
        reset(|_: &Scope<String>| "plain".to_string()),
        "plain".to_string()
    );
}

#[test]
fn config_controls_strand_naming() {
    let name = reset_with(ScopeConfig::named("walker"), |_: &Scope<String>| {
        std::thread::current()
            .name()
            .unwrap_or_default()
            .to_string()
    });
    assert!(name.starts_with("walker-"));
}

#[test]
fn handler_decides_scope_result() {
    let result = reset(|scope: &Scope<&'static str>| {
        let _: () = scope.control(|_k| "decided by handler");
        unreachable!("abandoned continuation must not run");
    });
    assert_eq!(result, "decided by handler");
}

#[test]
fn resumed_value_arrives_at_suspension_point() {
    let result = reset(|scope: &Scope<i32>| {
        let doubled: i32 = scope.control(|k| k.resume(21));
        doubled * 2
    });
    assert_eq!(result, 42);
}

#[test]
fn effects_run_left_to_right() {
    let result = reset(|scope: &Scope<Vec<&'static str>>| {
        let mut order = Vec::new();
        for label in ["first", "second", "third"] {
            let seen: &'static str = scope.control(move |k| k.resume(label));
            order.push(seen);
        }
        order
    });
    assert_eq!(result, vec!["first", "second", "third"]);
}

#[test]
fn second_resume_panics_with_usage_error() {
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        reset(|scope: &Scope<i32>| {
            let x: i32 = scope.control(|k| {
                let first = k.resume(1);
                let _ = k.resume(2);
                first
            });
            x
        })
    }));
    let payload = outcome.expect_err("double resume must panic");
    let message = *payload.downcast::<String>().expect("panic message");
    assert!(message.contains("single-shot violation"), "{message}");
}

#[test]
fn try_resume_reports_usage_error_without_panicking() {
    let result = reset(|scope: &Scope<i32>| {
        scope.control(|k| {
            let first = k.resume(7);
            assert!(k.try_resume(8).is_err());
            first
        })
    });
    assert_eq!(result, 7);
}

#[test]
fn block_panic_propagates_out_of_reset() {
    let outcome = catch_unwind(|| reset(|_: &Scope<i32>| panic!("kaboom")));
    let payload = outcome.expect_err("panic must propagate");
    assert_eq!(*payload.downcast::<&str>().unwrap(), "kaboom");
}

#[test]
fn block_panic_after_resume_propagates() {
    let outcome = catch_unwind(|| {
        reset(|scope: &Scope<i32>| {
            let _: i32 = scope.control(|k| k.resume(1));
            panic!("late failure");
        })
    });
    let payload = outcome.expect_err("panic must propagate");
    assert_eq!(*payload.downcast::<&str>().unwrap(), "late failure");
}

#[test]
fn multi_shot_continuation_resumes_many_times() {
    let sums = reset_multi(|scope: &MultiScope<Vec<i32>>| {
        let n: i32 = scope.control(|k| {
            let mut out = Vec::new();
            for v in [1, 2, 3, 4] {
                out.extend(k.resume(v));
            }
            out
        });
        vec![n * n]
    });
    assert_eq!(sums, vec![1, 4, 9, 16]);
}

#[test]
fn abandoned_continuation_leaves_no_result_behind() {
    // A scope whose handler drops the continuation still produces exactly
    // the handler's value, every time.
    for _ in 0..16 {
        let result = reset(|scope: &Scope<u8>| {
            let _: u8 = scope.control(|_k| 9);
            7
        });
        assert_eq!(result, 9);
    }
}
