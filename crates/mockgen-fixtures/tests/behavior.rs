//! Runtime behavior of generated mocks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use proptest::prelude::*;

use mockgen_fixtures::mocks::{MockClock, MockNotifier, MockStore};
use mockgen_fixtures::{Clock, MemoryStore, Named, Notifier, Store};

#[test]
fn unconfigured_methods_return_zero_values() {
    let mut store = MockStore::new();
    assert_eq!(store.get("k"), None);
    assert_eq!(store.put("k".into(), vec![1]), Ok(()));
    assert_eq!(store.scan("", &[]), (0, false));
    assert_eq!(store.name(), "");
    assert_eq!(MockClock::default().now(), 0);
}

#[test]
fn hooks_take_priority_over_returns() {
    let clock = MockClock::new();
    clock.now_func.set_default_return(1);
    clock.now_func.push_return(2);
    clock.now_func.set_default_hook(|| 3);
    clock.now_func.push_hook(|| 4);
    clock.now_func.push_hook(|| 5);
    assert_eq!([clock.now(), clock.now(), clock.now(), clock.now()], [4, 5, 3, 3]);
}

#[test]
fn one_shot_returns_precede_the_default_return() {
    let clock = MockClock::new();
    clock.now_func.set_default_return(1);
    clock.now_func.push_return(2);
    clock.now_func.push_return(3);
    assert_eq!([clock.now(), clock.now(), clock.now(), clock.now()], [2, 3, 1, 1]);
}

#[test]
fn hooks_receive_the_arguments() {
    let store = MockStore::new();
    store.get_func.set_default_hook(|key| Some(key.to_uppercase()));
    store.scan_func.push_hook(|prefix, tags| (prefix.len(), tags.contains(&"hot")));
    assert_eq!(store.get("abc").as_deref(), Some("ABC"));
    assert_eq!(store.scan("ab", &["cold", "hot"]), (2, true));
}

#[test]
#[should_panic(expected = "unexpected call to MockClock.now")]
fn strict_mocks_panic_when_unconfigured() {
    MockClock::strict().now();
}

#[test]
fn strict_mocks_accept_configured_calls() {
    let clock = MockClock::strict();
    clock.now_func.push_return(9);
    assert_eq!(clock.now(), 9);
}

#[test]
fn unconfigured_methods_delegate_to_the_wrapped_impl() {
    let mut store = MockStore::from_impl(MemoryStore::default());
    assert_eq!(store.name(), "memory");
    assert_eq!(store.put("alpha".into(), b"one".to_vec()), Ok(()));
    assert_eq!(store.put(String::new(), Vec::new()), Err("empty key".to_string()));
    assert_eq!(store.get("alpha").as_deref(), Some("one"));
    assert_eq!(store.scan("al", &["pha"]), (1, true));

    // Configured behavior wins over the wrapped implementation.
    store.get_func.push_return(Some("override".into()));
    assert_eq!(store.get("alpha").as_deref(), Some("override"));
    assert_eq!(store.get("alpha").as_deref(), Some("one"));
}

#[test]
fn history_records_arguments_and_results() {
    let mut store = MockStore::new();
    store.get_func.push_return(Some("v".into()));
    store.get("a");
    store.get("b");
    store.put("c".into(), vec![7, 8]).unwrap();
    store.scan("p", &["x", "y"]);

    let gets = store.get_func.history();
    assert_eq!(gets.len(), 2);
    assert_eq!(gets[0].arg0, "a");
    assert_eq!(gets[0].result0.as_deref(), Some("v"));
    assert_eq!(gets[1].arg0, "b");
    assert_eq!(gets[1].result0, None);

    let puts = store.put_func.history();
    assert_eq!(puts[0].args(), (&"c".to_string(), &vec![7, 8]));
    assert_eq!(puts[0].results(), (&Ok(()),));

    let scans = store.scan_func.history();
    let (prefix, tags) = scans[0].args();
    assert_eq!(prefix, "p");
    assert_eq!(tags, ["x".to_string(), "y".to_string()]);
    assert_eq!(scans[0].results(), (&0, &false));
}

#[test]
fn methods_without_results_are_recorded() {
    let notifier = MockNotifier::new();
    let seen = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&seen);
    notifier.notify_func.set_default_hook(move |_, payload| {
        counter.fetch_add(payload.len() as u64, Ordering::SeqCst);
    });
    notifier.notify("jobs", b"abc");
    notifier.notify("jobs", b"de");

    assert_eq!(seen.load(Ordering::SeqCst), 5);
    let calls = notifier.notify_func.history();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].arg0, "jobs");
    assert_eq!(calls[1].arg1, b"de".to_vec());
}

#[test]
fn clones_share_recorders() {
    let clock = MockClock::new();
    let copy = clock.clone();
    copy.now_func.set_default_return(42);
    assert_eq!(clock.now(), 42);
    assert_eq!(copy.now_func.history().len(), 1);
}

#[test]
fn concurrent_calls_are_all_recorded() {
    let clock = MockClock::new();
    let ticks = Arc::new(AtomicU64::new(0));
    let source = Arc::clone(&ticks);
    clock.now_func.set_default_hook(move || source.fetch_add(1, Ordering::SeqCst));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let clock = clock.clone();
            thread::spawn(move || {
                for _ in 0..100 {
                    clock.now();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let history = clock.now_func.history();
    assert_eq!(history.len(), 800);
    assert_eq!(ticks.load(Ordering::SeqCst), 800);
    let mut results: Vec<u64> = history.iter().map(|c| c.result0).collect();
    results.sort_unstable();
    assert_eq!(results, (0..800).collect::<Vec<_>>());
}

proptest! {
    #[test]
    fn sequential_calls_are_recorded_in_order(keys in proptest::collection::vec("[a-z]{0,6}", 0..20)) {
        let store = MockStore::new();
        for key in &keys {
            store.get(key);
        }
        let recorded: Vec<String> = store.get_func.history().into_iter().map(|c| c.arg0).collect();
        prop_assert_eq!(recorded, keys);
    }
}
