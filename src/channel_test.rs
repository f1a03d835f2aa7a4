use super::*;

#[test]
fn default_channel_is_disconnected() {
    assert!(!MemoryChannel::default().is_connected());
    assert!(MemoryChannel::connected().is_connected());
}

#[test]
fn records_published_messages() {
    let mut channel = MemoryChannel::connected();
    channel.publish("a/commands/movement", "{}").unwrap();
    assert_eq!(
        channel.sent,
        vec![Published { topic: "a/commands/movement".into(), payload: "{}".into() }]
    );
}

#[test]
fn failing_channel_reports_reason() {
    let mut channel = MemoryChannel { fail_with: Some("broker offline".into()), ..MemoryChannel::connected() };
    let err = channel.publish("t", "{}").unwrap_err();
    assert!(matches!(err, PublishError::Channel(ref reason) if reason == "broker offline"));
    assert!(channel.sent.is_empty());
}
