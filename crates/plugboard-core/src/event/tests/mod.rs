
#[cfg(test)]
mod tests {
    use crate::event::{Event, EventPayload, Topic};
    use crate::plugin_system::error::LifecycleError;

    #[test]
    fn test_event_display_includes_error_message() {
        let event = Event::error(
            Topic::plugin_error("cache"),
            LifecycleError::UnknownPlugin { name: "cache".to_string() },
        );
        assert_eq!(event.to_string(), "plugin:cache:error: No such plugin `cache`");
    }

    #[test]
    fn test_error_payload_downcast() {
        let event = Event::error(Topic::plugin_error(""), LifecycleError::MissingName);
        assert!(matches!(event.error_as::<LifecycleError>(), Some(LifecycleError::MissingName)));
        assert!(event.error_as::<std::io::Error>().is_none());

        let signal = Event::signal(Topic::plugin("cache", "initializer"));
        assert!(matches!(signal.payload, EventPayload::Empty));
        assert!(signal.error_payload().is_none());
    }
}
