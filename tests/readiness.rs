//! Integration tests for readiness futures.

mod common;

use common::{
    collect_errors, friend_list_with_detail, friend_list_with_friend_list, social_data,
    user_detail, ScriptedBackend,
};
use futures::FutureExt;
use nested_subscriber::{ChildRule, ErrorKind, SubscriberError, SubscriptionDescriptor};
use serde_json::json;

fn node(key: &str) -> SubscriptionDescriptor {
    SubscriptionDescriptor::value(key, format!("nodes/{key}"))
        .on_each_child(ChildRule::new(|child_key, _, _| vec![node(child_key)]))
}

#[test]
fn test_two_level_readiness_waits_for_details() {
    let backend = ScriptedBackend::new(social_data());
    let registry = backend.registry();

    let list = registry.loaded_promise("friendListWithUserDetail_user1");
    let detail2 = registry.loaded_promise("userDetail_user2");
    let detail3 = registry.loaded_promise("userDetail_user3");

    let subscribed = registry.subscribe_many_with_readiness(vec![friend_list_with_detail("user1")]);
    let mut readiness = subscribed.readiness;
    assert!((&mut readiness).now_or_never().is_none());

    let mut steps = 0;
    while backend.flush_one() {
        steps += 1;
        if list.clone().now_or_never().is_some() {
            assert!(detail2.clone().now_or_never().is_some());
            assert!(detail3.clone().now_or_never().is_some());
        } else {
            assert!((&mut readiness).now_or_never().is_none());
        }
    }
    assert!(steps > 1);

    assert_eq!(
        readiness.now_or_never(),
        Some(Ok(vec!["friendListWithUserDetail_user1".to_string()]))
    );
    assert_eq!(detail2.now_or_never(), Some(Ok("userDetail_user2".to_string())));
    subscribed.teardown.run();
}

#[test]
fn test_block_on_after_flush() {
    let backend = ScriptedBackend::new(social_data());
    let registry = backend.registry();

    let subscribed = registry.subscribe_many_with_readiness(vec![
        friend_list_with_detail("user1"),
        user_detail("user1"),
    ]);
    backend.flush();

    let keys = futures::executor::block_on(subscribed.readiness).unwrap();
    assert_eq!(keys, vec!["friendListWithUserDetail_user1", "userDetail_user1"]);
    subscribed.teardown.run();
    assert!(registry.is_empty());
}

#[test]
fn test_cycle_rejects_and_reports_once() {
    let backend = ScriptedBackend::new(json!({
        "nodes": {"A": {"B": true}, "B": {"A": true}}
    }));
    let (hooks, errors) = collect_errors();
    let registry = backend.registry_with(hooks);

    let subscribed = registry.subscribe_many_with_readiness(vec![node("A"), node("B")]);
    backend.flush();

    let err = subscribed.readiness.now_or_never().unwrap().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cycle);
    assert_eq!(err.to_string(), "Cycle detected: A<-B<-A");

    let errors = errors.lock();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].cycle_trail(), Some(&["A".to_string(), "B".to_string(), "A".to_string()][..]));

    // Reported, not rolled back
    assert!(registry.contains("A"));
    assert!(registry.contains("B"));
}

#[test]
fn test_friends_of_friends_cycle_rejects_root() {
    let backend = ScriptedBackend::new(social_data());
    let (hooks, errors) = collect_errors();
    let registry = backend.registry_with(hooks);

    let subscribed =
        registry.subscribe_many_with_readiness(vec![friend_list_with_friend_list("user1")]);
    backend.flush();

    let err = subscribed.readiness.now_or_never().unwrap().unwrap_err();
    assert_eq!(
        err.to_string(),
        "Cycle detected: friendListWithFriendList_user1<-friendListWithFriendList_user2<-friendListWithFriendList_user1"
    );
    assert!(!errors.lock().is_empty());
    assert!(errors.lock().iter().all(|e| e.kind() == ErrorKind::Cycle));
}

#[test]
fn test_friends_of_friends_cycle_below_root() {
    let backend = ScriptedBackend::new(social_data());
    let (hooks, errors) = collect_errors();
    let registry = backend.registry_with(hooks);

    let subscribed =
        registry.subscribe_many_with_readiness(vec![friend_list_with_friend_list("user5")]);
    backend.flush();

    // user5 is not on the cycle; it fails through its nested user4
    let expected = "Cycle detected: friendListWithFriendList_user4<-friendListWithFriendList_user3<-friendListWithFriendList_user4";
    let err = subscribed.readiness.now_or_never().unwrap().unwrap_err();
    assert_eq!(err.to_string(), expected);
    let nested = registry
        .loaded_promise("friendListWithFriendList_user4")
        .now_or_never()
        .unwrap()
        .unwrap_err();
    assert_eq!(nested.to_string(), expected);
    assert_eq!(errors.lock()[0].to_string(), expected);
}

#[test]
fn test_cycle_detection_can_be_disabled() {
    let backend = ScriptedBackend::new(json!({
        "nodes": {"A": {"B": true}, "B": {"A": true}}
    }));
    let (hooks, errors) = collect_errors();
    let registry = nested_subscriber::Registry::with_config(
        std::sync::Arc::new(backend.clone()),
        nested_subscriber::SubscriberConfig {
            detect_cycles: false,
            log_errors: false,
        },
        hooks,
    );

    let subscribed = registry.subscribe_many_with_readiness(vec![node("A")]);
    backend.flush();

    assert!(errors.lock().is_empty());
    // A waits on B, which waits on A: neither ever settles
    assert!(subscribed.readiness.now_or_never().is_none());
}

#[test]
fn test_backend_error_rejects_pending_readiness() {
    let backend = ScriptedBackend::new(social_data());
    backend.fail("users/user2", "PERMISSION_DENIED");
    let (hooks, errors) = collect_errors();
    let registry = backend.registry_with(hooks);

    let subscribed = registry.subscribe_many_with_readiness(vec![friend_list_with_detail("user1")]);
    backend.flush();

    let expected = SubscriberError::Backend {
        key: "userDetail_user2".to_string(),
        locator: Some("users/user2".to_string()),
        code: "PERMISSION_DENIED".to_string(),
    };
    assert_eq!(subscribed.readiness.now_or_never(), Some(Err(expected.clone())));
    assert_eq!(*errors.lock(), vec![expected]);

    // The failing subscription stays until torn down
    assert!(registry.contains("userDetail_user2"));
    subscribed.teardown.run();
    assert!(registry.is_empty());
}

#[test]
fn test_error_after_load_does_not_touch_readiness() {
    let backend = ScriptedBackend::new(social_data());
    let (hooks, errors) = collect_errors();
    let registry = backend.registry_with(hooks);

    let subscribed = registry.subscribe_many_with_readiness(vec![user_detail("user1")]);
    backend.flush();
    let loaded = registry.loaded_promise("userDetail_user1");
    assert_eq!(loaded.clone().now_or_never(), Some(Ok("userDetail_user1".to_string())));

    backend.fail("users/user1", "NETWORK");
    backend.flush();

    assert_eq!(errors.lock().len(), 1);
    assert_eq!(loaded.now_or_never(), Some(Ok("userDetail_user1".to_string())));
    assert!(registry.contains("userDetail_user1"));
    subscribed.teardown.run();
}

#[test]
fn test_teardown_before_load_cancels() {
    let backend = ScriptedBackend::new(social_data());
    let registry = backend.registry();

    let subscribed = registry.subscribe_many_with_readiness(vec![user_detail("user1")]);
    let loaded = registry.loaded_promise("userDetail_user1");
    subscribed.teardown.run();
    backend.flush();

    assert_eq!(
        loaded.now_or_never(),
        Some(Err(SubscriberError::Cancelled("userDetail_user1".to_string())))
    );
}

#[test]
fn test_resubscribe_gets_fresh_promise() {
    let backend = ScriptedBackend::new(social_data());
    let registry = backend.registry();

    let first = registry.subscribe(user_detail("user1"));
    backend.flush();
    assert!(registry.loaded_promise("userDetail_user1").now_or_never().is_some());
    first.run();

    let _second = registry.subscribe(user_detail("user1"));
    let fresh = registry.loaded_promise("userDetail_user1");
    assert!(fresh.clone().now_or_never().is_none());

    backend.flush();
    assert_eq!(fresh.now_or_never(), Some(Ok("userDetail_user1".to_string())));
}

#[test]
fn test_destroyed_child_counts_as_loaded() {
    let backend = ScriptedBackend::new(json!({
        "items": {"a": true, "b": true},
        "details": {"b": {}}
    }));
    backend.stall("details/a");
    let (hooks, errors) = collect_errors();
    let registry = backend.registry_with(hooks);
    let list = SubscriptionDescriptor::list("items", "items").on_each_child(ChildRule::new(
        |key, _, _| vec![SubscriptionDescriptor::value(format!("detail_{key}"), format!("details/{key}"))],
    ));

    let subscribed = registry.subscribe_many_with_readiness(vec![list]);
    backend.flush();
    assert!(registry.contains("detail_a"));
    let mut readiness = subscribed.readiness;
    assert!((&mut readiness).now_or_never().is_none());

    // Child goes away before its detail loaded
    backend.remove("items/a");
    backend.flush();

    assert!(!registry.contains("detail_a"));
    assert_eq!(readiness.now_or_never(), Some(Ok(vec!["items".to_string()])));

    subscribed.teardown.run();
    assert!(registry.is_empty());
    assert!(errors.lock().is_empty());
}

#[test]
fn test_invalid_descriptor_fails_readiness() {
    let backend = ScriptedBackend::new(social_data());
    let (hooks, errors) = collect_errors();
    let registry = backend.registry_with(hooks);

    let subscribed = registry.subscribe_many_with_readiness(vec![
        user_detail("user1"),
        SubscriptionDescriptor::value("", "users/user2"),
    ]);

    let outcome = subscribed.readiness.now_or_never();
    assert!(matches!(outcome, Some(Err(SubscriberError::Validation(_)))));
    assert_eq!(errors.lock().len(), 1);
    assert_eq!(registry.len(), 1);
    subscribed.teardown.run();
    assert!(registry.is_empty());
}
