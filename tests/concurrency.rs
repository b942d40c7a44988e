//! Concurrent transition tests: racing admins and subscribers.

use std::sync::{Arc, Barrier};
use std::thread;

use subhub::{
    Group, GroupCatalog, GroupStatus, RequestKey, SubscriptionError, SubscriptionHub,
};

fn test_hub(groups: &[&str]) -> Arc<SubscriptionHub> {
    let catalog = Arc::new(GroupCatalog::new(
        groups.iter().map(|g| Group::new(*g, "")).collect(),
    ));
    Arc::new(SubscriptionHub::in_memory(catalog))
}

#[test]
fn test_racing_approvals_have_one_winner() {
    for _ in 0..20 {
        let hub = test_hub(&["Finance_Reports"]);
        hub.request_subscription("alice", "Finance_Reports").unwrap();

        let key = RequestKey::new("alice", "Finance_Reports");
        let barrier = Arc::new(Barrier::new(4));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let hub = Arc::clone(&hub);
                let key = key.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    hub.approve(&key)
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let wins = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(wins, 1);
        for result in &results {
            if let Err(e) = result {
                assert!(
                    matches!(
                        e,
                        SubscriptionError::RequestNotFound(_) | SubscriptionError::Conflict(_)
                    ),
                    "unexpected loser error: {e}"
                );
            }
        }

        // Exactly one subscription row, and the request is consumed
        assert_eq!(hub.list_active_subscriptions().len(), 1);
        assert!(hub.list_pending_requests().is_empty());
    }
}

#[test]
fn test_racing_requests_have_one_winner() {
    for _ in 0..20 {
        let hub = test_hub(&["Finance_Reports"]);
        let barrier = Arc::new(Barrier::new(4));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let hub = Arc::clone(&hub);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    hub.request_subscription("alice", "Finance_Reports")
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let wins = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(wins, 1);

        assert_eq!(hub.list_pending_requests().len(), 1);
    }
}

#[test]
fn test_approve_and_reject_race_consumes_request_once() {
    for _ in 0..20 {
        let hub = test_hub(&["Finance_Reports"]);
        hub.request_subscription("alice", "Finance_Reports").unwrap();

        let key = RequestKey::new("alice", "Finance_Reports");
        let barrier = Arc::new(Barrier::new(2));

        let approver = {
            let hub = Arc::clone(&hub);
            let key = key.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                hub.approve(&key).map(|_| ())
            })
        };
        let rejecter = {
            let hub = Arc::clone(&hub);
            let key = key.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                hub.reject(&key)
            })
        };

        let approved = approver.join().unwrap().is_ok();
        let rejected = rejecter.join().unwrap().is_ok();

        // Exactly one terminal transition consumed the request
        assert!(approved ^ rejected);
        assert!(hub.list_pending_requests().is_empty());
        assert_eq!(
            hub.list_active_subscriptions().len(),
            if approved { 1 } else { 0 }
        );
    }
}

#[test]
fn test_reader_never_sees_unsubscribed_flicker_during_approve() {
    // During approve's delete-then-insert, a reader with a torn view would
    // briefly see neither record (Unsubscribed). The snapshot read must
    // only ever show Pending or Subscribed.
    for _ in 0..10 {
        let hub = test_hub(&["Finance_Reports"]);
        hub.request_subscription("alice", "Finance_Reports").unwrap();

        let key = RequestKey::new("alice", "Finance_Reports");
        let barrier = Arc::new(Barrier::new(2));

        let approver = {
            let hub = Arc::clone(&hub);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                hub.approve(&key).unwrap();
            })
        };

        let reader = {
            let hub = Arc::clone(&hub);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                loop {
                    let status = hub.status_for_subscriber("alice")[0].status;
                    assert_ne!(status, GroupStatus::Unsubscribed);
                    if status == GroupStatus::Subscribed {
                        break;
                    }
                }
            })
        };

        approver.join().unwrap();
        reader.join().unwrap();
    }
}

#[test]
fn test_disjoint_pairs_proceed_independently() {
    let groups: Vec<String> = (0..8).map(|i| format!("Group_{i}")).collect();
    let group_refs: Vec<&str> = groups.iter().map(String::as_str).collect();
    let hub = test_hub(&group_refs);

    let handles: Vec<_> = groups
        .iter()
        .cloned()
        .map(|group| {
            let hub = Arc::clone(&hub);
            thread::spawn(move || {
                let subscriber = format!("user_{group}");
                hub.request_subscription(&subscriber, &group).unwrap();
                let id = hub.approve(&RequestKey::new(subscriber, group)).unwrap();
                hub.revoke(id).unwrap();
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert!(hub.list_pending_requests().is_empty());
    assert!(hub.list_active_subscriptions().is_empty());
}
