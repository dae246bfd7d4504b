use super::*;

#[test]
fn constructors_set_level() {
    assert_eq!(Notice::success("a", "b").level, NoticeLevel::Success);
    assert_eq!(Notice::info("a", "b").level, NoticeLevel::Info);
    assert_eq!(Notice::warning("a", "b").level, NoticeLevel::Warning);
    assert_eq!(Notice::error("a", "b").level, NoticeLevel::Error);
}

#[test]
fn level_display_is_lowercase() {
    assert_eq!(NoticeLevel::Warning.to_string(), "warning");
    assert_eq!(NoticeLevel::Error.to_string(), "error");
}

#[test]
fn channel_notifier_delivers_in_order() {
    let (notifier, mut rx) = ChannelNotifier::new();
    notifier.notify(Notice::error("Login Failed", "bad creds"));
    notifier.notify(Notice::success("Welcome", "hi"));

    assert_eq!(rx.try_recv().unwrap().message, "bad creds");
    assert_eq!(rx.try_recv().unwrap().message, "hi");
    assert!(rx.try_recv().is_err());
}

#[test]
fn channel_notifier_survives_closed_receiver() {
    let (notifier, rx) = ChannelNotifier::new();
    drop(rx);
    notifier.notify(Notice::info("x", "y"));
}

#[test]
fn tracing_notifier_is_callable() {
    TracingNotifier.notify(Notice::warning("Offline", "No Internet"));
}
