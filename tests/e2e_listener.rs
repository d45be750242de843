//! End-to-end notification listener tests.
//!
//! Each test starts a listener on an ephemeral port and delivers
//! notifications to it over HTTP, either through the `notify` primitive or
//! as raw requests.

use std::io::ErrorKind;
use std::net::TcpStream;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use onem2m::{
    Callback, HttpTransport, ListenerConfig, ListenerState, ListenerSupervisor, Notification,
    NotificationEventType, NotificationListener, NotificationReply, OneM2MError, OneM2MRequest,
    ParameterSet, ResponseStatusCode,
};
use serde_json::{json, Value};

/// Start a listener on 127.0.0.1 with an ephemeral port
fn start_listener() -> (NotificationListener, String) {
    let listener = NotificationListener::new(ListenerConfig::localhost(0));
    let addr = listener.start_and_wait().expect("listener failed to start");
    (listener, format!("http://{addr}"))
}

fn notifier() -> OneM2MRequest<HttpTransport> {
    let transport = HttpTransport::new(Duration::from_secs(5)).unwrap();
    OneM2MRequest::new(None, ParameterSet::new().with("fr", "/PN_CSE"), transport)
}

fn notification(sur: &str) -> Value {
    Notification::new(
        sur,
        json!({"m2m:cin": {"con": "21.5"}}),
        NotificationEventType::CreateOfDirectChildResource,
    )
    .to_body()
}

/// Raw POST, for the replies the request primitive refuses to decode
fn post_raw(url: &str, body: &str) -> reqwest::blocking::Response {
    reqwest::blocking::Client::new()
        .post(url)
        .header("Content-Type", "application/json")
        .header("X-M2M-RI", "raw-1")
        .body(body.to_string())
        .send()
        .expect("request failed")
}

#[test]
fn test_notification_reaches_handler() {
    let (listener, base) = start_listener();
    let (tx, rx) = mpsc::channel();

    listener.register("/PN_CSE/cnt/sub1", move |callback| {
        if let Callback::Notification(n) = callback {
            tx.send(n).ok();
        }
        Ok(NotificationReply::ok())
    });

    let response = notifier()
        .notify(
            Some(&format!("{base}/notify")),
            None,
            &notification("/PN_CSE/cnt/sub1"),
        )
        .unwrap();
    assert!(response.is_ok());
    assert_eq!(response.fr, "/notify");
    assert!(!response.rqi.is_empty());

    let received = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(received.sur, "/PN_CSE/cnt/sub1");
    assert_eq!(
        received.event_type(),
        Some(NotificationEventType::CreateOfDirectChildResource)
    );
    assert_eq!(
        received.representation(),
        Some(&json!({"m2m:cin": {"con": "21.5"}}))
    );

    listener.stop().unwrap();
    assert_eq!(listener.state(), ListenerState::Stopped);
}

#[test]
fn test_handlers_correlated_by_subscription() {
    let (listener, base) = start_listener();
    let hits_a = Arc::new(AtomicUsize::new(0));
    let hits_b = Arc::new(AtomicUsize::new(0));

    let a = hits_a.clone();
    listener.register("sub-a", move |_| {
        a.fetch_add(1, Ordering::SeqCst);
        Ok(NotificationReply::ok())
    });
    let b = hits_b.clone();
    listener.register("sub-b", move |_| {
        b.fetch_add(1, Ordering::SeqCst);
        Ok(NotificationReply::new(ResponseStatusCode::Created).with_body(json!({"seen": true})))
    });

    let request = notifier();
    let to = format!("{base}/");
    request.notify(Some(&to), None, &notification("sub-a")).unwrap();
    request.notify(Some(&to), None, &notification("sub-a")).unwrap();
    let response = request.notify(Some(&to), None, &notification("sub-b")).unwrap();

    // The handler's reply is what the notifier sees
    assert!(response.is_created());
    assert_eq!(response.pc, Some(json!({"seen": true})));
    assert_eq!(hits_a.load(Ordering::SeqCst), 2);
    assert_eq!(hits_b.load(Ordering::SeqCst), 1);

    listener.stop().unwrap();
}

#[test]
fn test_register_once_and_deregister() {
    let (listener, base) = start_listener();
    let url = format!("{base}/notify");

    listener.register_once("once", |_| Ok(NotificationReply::ok()));
    let response = notifier()
        .notify(Some(&url), None, &notification("once"))
        .unwrap();
    assert!(response.is_ok());
    assert!(!listener.registry().contains("once"));

    let err = notifier()
        .notify(Some(&url), None, &notification("once"))
        .unwrap_err();
    assert!(matches!(err, OneM2MError::HttpStatus { status: 404, .. }));

    listener.register("gone", |_| Ok(NotificationReply::ok()));
    assert!(listener.deregister("gone"));
    let err = notifier()
        .notify(Some(&url), None, &notification("gone"))
        .unwrap_err();
    assert!(matches!(err, OneM2MError::HttpStatus { status: 404, .. }));

    listener.stop().unwrap();
}

#[test]
fn test_error_replies_carry_status_codes() {
    let (listener, base) = start_listener();
    let url = format!("{base}/notify");

    // No handler
    let response = post_raw(&url, &notification("nobody").to_string());
    assert_eq!(response.status().as_u16(), 404);
    assert_eq!(response.headers()["X-M2M-RSC"], "4004");
    assert_eq!(response.headers()["X-M2M-RI"], "raw-1");

    // Handler error
    listener.register("failing", |_| {
        Err(OneM2MError::Handler("sensor offline".to_string()))
    });
    let response = post_raw(&url, &notification("failing").to_string());
    assert_eq!(response.status().as_u16(), 500);
    assert_eq!(response.headers()["X-M2M-RSC"], "5000");
    let body: Value = response.json().unwrap();
    assert!(body["m2m:dbg"].as_str().unwrap().contains("sensor offline"));

    // Not a notification at all
    let response = post_raw(&url, "{\"hello\": 1}");
    assert_eq!(response.status().as_u16(), 500);

    // The listener keeps serving after errors
    listener.register("fine", |_| Ok(NotificationReply::ok()));
    let response = post_raw(&url, &notification("fine").to_string());
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.headers()["X-M2M-RSC"], "2000");

    listener.stop().unwrap();
}

#[test]
fn test_restart_binds_again() {
    let (listener, _) = start_listener();
    listener.register("kept", |_| Ok(NotificationReply::ok()));
    listener.stop().unwrap();
    assert_eq!(listener.state(), ListenerState::Stopped);

    // Handlers survive a restart
    let addr = listener.start_and_wait().unwrap();
    let response = post_raw(
        &format!("http://{addr}/notify"),
        &notification("kept").to_string(),
    );
    assert_eq!(response.status().as_u16(), 200);

    listener.stop().unwrap();
}

#[test]
fn test_supervisor_shares_one_listener() {
    let supervisor = ListenerSupervisor::new();
    let first = supervisor.get_or_init(&ListenerConfig::localhost(0));
    let second = supervisor.get_or_init(&ListenerConfig::localhost(0));
    assert!(NotificationListener::ptr_eq(&first, &second));

    let addr = first.start_and_wait().unwrap();
    second.register("shared", |_| Ok(NotificationReply::ok()));

    let response = post_raw(
        &format!("http://{addr}/"),
        &notification("shared").to_string(),
    );
    assert_eq!(response.status().as_u16(), 200);

    // Starting twice through either handle is refused
    assert!(second.start().is_err());
    first.stop().unwrap();
}

#[test]
fn test_dropping_last_handle_stops_listener() {
    let (listener, _) = start_listener();
    let addr = listener.local_addr().unwrap();

    // Another handle going away leaves the listener running
    let clone = listener.clone();
    drop(clone);
    drop(TcpStream::connect(addr).expect("listener should still accept"));
    assert_eq!(listener.state(), ListenerState::Listening);

    drop(listener);
    let err = TcpStream::connect(addr).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConnectionRefused);
}
