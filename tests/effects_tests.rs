//! Integration tests for the effect handler façades.

use std::sync::atomic::{AtomicU32, Ordering};

use delimit::{either, list, nondet, option, recover, Choice, ListScope, Raise};

#[test]
fn either_round_trip_raises_on_guard() {
    let result: Result<i32, String> = either(|r| {
        let a = r.bind(Ok::<i32, String>(11));
        if a > 10 {
            r.raise("too big".to_string())
        } else {
            a
        }
    });
    assert_eq!(result, Err("too big".to_string()));
}

#[test]
fn either_round_trip_relaxed_guard_succeeds() {
    let result: Result<i32, String> = either(|r| {
        let a = r.bind(Ok::<i32, String>(5));
        a
    });
    assert_eq!(result, Ok(5));
}

#[test]
fn raise_runs_no_block_code_after_the_raise_point() {
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    let result: Result<i32, &'static str> = either(|r| {
        COUNTER.fetch_add(1, Ordering::SeqCst);
        r.ensure(false, || "stop");
        COUNTER.fetch_add(1, Ordering::SeqCst);
        0
    });
    assert_eq!(result, Err("stop"));
    assert_eq!(COUNTER.load(Ordering::SeqCst), 1);
}

#[test]
fn option_builder_short_circuits() {
    let missing: Option<i32> = option(|f| {
        let x = f.bind(Some(1));
        let y: i32 = f.bind(None);
        x + y
    });
    assert_eq!(missing, None);

    let present: Option<i32> = option(|f| f.bind(Some(20)) + f.bind(Some(2)));
    assert_eq!(present, Some(22));
}

#[test]
fn recover_reaches_the_fallback() {
    let value = recover(
        |r: &Raise<i32, String>| {
            let n = r.bind(Ok::<i32, String>(3));
            r.ensure(n > 5, || format!("{n} too small"));
            n
        },
        |error| error.len() as i32,
    );
    assert_eq!(value, 11);
}

#[test]
fn three_choices_enumerate_eight_outcomes_in_order() {
    let outcomes: Vec<(bool, bool, bool)> = nondet(|ch: &Choice<Vec<(bool, bool, bool)>>| {
        let a = ch.choose();
        let b = ch.choose();
        let c = ch.choose();
        vec![(a, b, c)]
    });
    assert_eq!(outcomes.len(), 8);
    let expected: Vec<(bool, bool, bool)> = (0..8)
        .map(|i| (i & 4 != 0, i & 2 != 0, i & 1 != 0))
        .collect();
    assert_eq!(outcomes, expected);
}

#[test]
fn list_cross_product_matches_flat_map() {
    let xs = vec![1, 2, 3];
    let ys = vec!["a", "b", "c"];
    let expected: Vec<String> = xs
        .iter()
        .flat_map(|a| ys.iter().map(move |b| format!("{a}{b} ")))
        .collect();

    let (xs2, ys2) = (xs, ys);
    let produced = list(move |l: &ListScope<String>| {
        let a = l.bind(xs2.clone());
        let b = l.bind(ys2.clone());
        format!("{a}{b} ")
    });
    assert_eq!(produced.len(), 9);
    assert_eq!(produced, expected);
}

#[test]
fn error_effect_reachable_from_inside_a_list_block() {
    // Both effects sourced through the same block: the choice effect from
    // the inner scope, the error effect from the outer one.
    let result: Result<Vec<i32>, String> = either(|r| {
        let r = r.clone();
        list(move |l| {
            let n = l.bind(vec![1, 2, 3]);
            if n == 2 {
                r.raise("found 2".to_string())
            }
            n
        })
    });
    assert_eq!(result, Err("found 2".to_string()));
}

#[test]
fn list_inside_either_completes_when_nothing_raises() {
    let result: Result<Vec<i32>, String> = either(|r| {
        let r = r.clone();
        list(move |l| {
            let n = l.bind(vec![1, 2, 3]);
            r.ensure(n < 10, || "out of range".to_string());
            n * 2
        })
    });
    assert_eq!(result, Ok(vec![2, 4, 6]));
}
