#![cfg(test)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::json;

use crate::event::{create_dispatcher, EventPayload, TopicPattern};
use crate::kernel::bootstrap::Application;
use crate::plugin_system::{FnPlugin, Hook, HookResult, LifecycleError};
use crate::storage::{AppConfig, PluginOptions};

use super::super::common::{entries, record_events, tracker, TrackedPlugin};

#[tokio::test]
async fn test_plug_then_unplug_leaves_plugin_absent() {
    let app = Application::default();
    app.plug(FnPlugin::new("cache")).await.unwrap();
    assert!(app.is_plugged("cache").await);

    app.unplug("cache").await.unwrap();
    assert!(!app.is_plugged("cache").await);
    assert!(app.plugin_names().await.is_empty());
}

#[tokio::test]
async fn test_initializer_runs_and_success_event_fires() {
    let app = Application::default();
    let events = record_events(&app).await;
    let flag = Arc::new(AtomicBool::new(false));

    let flag_clone = Arc::clone(&flag);
    let plugin = FnPlugin::new("P").on_initialize(move |_ctx, _options| {
        let flag = Arc::clone(&flag_clone);
        async move {
            flag.store(true, Ordering::SeqCst);
            Ok(())
        }
    });

    let result = app.plug(plugin).await;
    assert!(result.is_ok());
    assert!(flag.load(Ordering::SeqCst));
    assert_eq!(entries(&events), vec!["plugin:P:initializer"]);
}

#[tokio::test]
async fn test_options_accumulate_across_plugs() {
    let app = Application::default();
    app.plug_with_options(FnPlugin::new("cache"), PluginOptions::new().with("a", 1))
        .await
        .unwrap();
    app.plug_with_options(FnPlugin::new("cache"), PluginOptions::new().with("b", 2))
        .await
        .unwrap();

    assert_eq!(
        app.options("cache").await.unwrap(),
        PluginOptions::new().with("a", 1).with("b", 2)
    );
}

#[tokio::test]
async fn test_call_options_overwrite_same_keys() {
    let app = Application::default();
    app.plug_with_options(FnPlugin::new("cache"), PluginOptions::new().with("a", 1).with("keep", true))
        .await
        .unwrap();
    app.plug_with_options(FnPlugin::new("cache"), PluginOptions::new().with("a", 5))
        .await
        .unwrap();

    let options = app.options("cache").await.unwrap();
    assert_eq!(options.get_value("a"), Some(&json!(5)));
    assert_eq!(options.get_value("keep"), Some(&json!(true)));
}

#[tokio::test]
async fn test_initializer_receives_config_merged_with_call_options() {
    let config = AppConfig::new().with_plugin("P", PluginOptions::new().with("foo", true));
    let app = Application::new(config);
    let log = tracker();
    let plugin = TrackedPlugin::new("P", "p", &log);
    let seen = plugin.seen_options();

    app.plug_with_options(plugin, PluginOptions::new().with("bar", true))
        .await
        .unwrap();

    let seen = seen.lock().unwrap().clone().expect("initializer called");
    assert_eq!(seen.get::<bool>("foo"), Some(true));
    assert_eq!(seen.get::<bool>("bar"), Some(true));
}

#[tokio::test]
async fn test_unnamed_plugin_is_rejected() {
    let app = Application::default();
    let anonymous = record_events(&app).await;
    let log = tracker();
    let result = app.plug(TrackedPlugin::new("", "nameless", &log)).await;

    let err = result.unwrap_err();
    assert!(matches!(err, LifecycleError::MissingName));
    assert!(err.to_string().contains("Name property required"));
    assert_eq!(entries(&anonymous), vec!["plugin:anonymous:error: Name property required."]);
    assert!(entries(&log).is_empty(), "no hook runs for an unnamed plugin");
    assert!(app.plugin_names().await.is_empty());
    assert!(app.options("").await.is_none());
}

#[tokio::test]
async fn test_unnamed_plugin_error_payload_is_typed() {
    let bus = create_dispatcher();
    let app = Application::with_event_bus(AppConfig::default(), Arc::new(bus.clone()));

    let rx = bus.listen_once(TopicPattern::parse("plugin:anonymous:error").unwrap()).await;
    let _ = app.plug(FnPlugin::new("")).await;

    let event = rx.await.unwrap();
    assert!(matches!(event.error_as::<LifecycleError>(), Some(LifecycleError::MissingName)));
}

#[tokio::test]
async fn test_unplug_unknown_plugin() {
    let app = Application::default();
    let events = record_events(&app).await;

    let err = app.unplug("ghost").await.unwrap_err();
    assert!(matches!(err, LifecycleError::UnknownPlugin { ref name } if name == "ghost"));
    assert!(err.to_string().contains("No such plugin"));
    assert_eq!(entries(&events), vec!["plugin:ghost:error: No such plugin `ghost`"]);
}

#[tokio::test]
async fn test_unplug_twice() {
    let app = Application::default();
    app.plug(FnPlugin::new("P")).await.unwrap();
    let events = record_events(&app).await;

    assert!(app.unplug("P").await.is_ok());
    let second = app.unplug("P").await;
    assert!(second.unwrap_err().to_string().contains("No such plugin"));
    assert!(!app.is_plugged("P").await);
    assert_eq!(
        entries(&events),
        vec!["plugin:P:destructor", "plugin:P:error: No such plugin `P`"]
    );
}

#[tokio::test]
async fn test_missing_destructor_is_success() {
    let app = Application::default();
    let events = record_events(&app).await;
    app.plug(FnPlugin::new("P")).await.unwrap();

    assert!(app.unplug("P").await.is_ok());
    assert_eq!(entries(&events), vec!["plugin:P:initializer", "plugin:P:destructor"]);
}

#[tokio::test]
async fn test_initializer_failure_is_routed_and_plugin_stays_registered() {
    let app = Application::default();
    let events = record_events(&app).await;
    let log = tracker();

    let err = app
        .plug(TrackedPlugin::new("P", "p", &log).failing_init())
        .await
        .unwrap_err();

    assert!(matches!(err, LifecycleError::Hook { hook: Hook::Initializer, .. }));
    assert_eq!(err.to_string(), "p refused to start");
    assert_eq!(entries(&events), vec!["plugin:P:error: p refused to start"]);
    assert!(app.is_plugged("P").await);
}

#[tokio::test]
async fn test_destructor_failure_still_removes_plugin() {
    let app = Application::default();
    let log = tracker();
    app.plug(TrackedPlugin::new("P", "p", &log).failing_destroy())
        .await
        .unwrap();
    let events = record_events(&app).await;

    let err = app.unplug("P").await.unwrap_err();
    assert!(matches!(err, LifecycleError::Hook { hook: Hook::Destructor, .. }));
    assert!(!app.is_plugged("P").await);
    assert_eq!(entries(&events), vec!["plugin:P:error: p refused to stop"]);
}

#[tokio::test]
async fn test_configuration_survives_unplug() {
    let app = Application::default();
    app.plug_with_options(FnPlugin::new("P"), PluginOptions::new().with("a", 1))
        .await
        .unwrap();
    app.unplug("P").await.unwrap();
    assert_eq!(app.options("P").await.unwrap().get::<i64>("a"), Some(1));

    let log = tracker();
    let plugin = TrackedPlugin::new("P", "p", &log);
    let seen = plugin.seen_options();
    app.plug(plugin).await.unwrap();
    assert_eq!(seen.lock().unwrap().as_ref().and_then(|o| o.get::<i64>("a")), Some(1));
}

#[tokio::test]
async fn test_error_event_carries_hook_error() {
    let bus = create_dispatcher();
    let app = Application::with_event_bus(AppConfig::default(), Arc::new(bus.clone()));
    let rx = bus.listen_once(TopicPattern::parse("plugin:P:error").unwrap()).await;

    let _ = app
        .plug(FnPlugin::new("P").on_initialize(|_ctx, _options| async {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "socket missing").into())
        }))
        .await;

    let event = rx.await.unwrap();
    let lifecycle = event.error_as::<LifecycleError>().expect("lifecycle error payload");
    let hook_error = lifecycle.hook_error().expect("hook error");
    assert_eq!(
        hook_error.downcast_ref::<std::io::Error>().map(|e| e.kind()),
        Some(std::io::ErrorKind::NotFound)
    );
    assert!(matches!(event.payload, EventPayload::Error(_)));
}

#[tokio::test]
async fn test_initializer_may_unplug_itself() {
    let app = Application::default();
    let events = record_events(&app).await;

    let handle = app.clone();
    let plugin = FnPlugin::new("P").on_initialize(move |ctx, _options| {
        let handle = handle.clone();
        async move {
            let result: HookResult = handle.unplug(ctx.name()).await.map_err(Into::into);
            result
        }
    });

    let result = tokio::time::timeout(std::time::Duration::from_secs(2), app.plug(plugin))
        .await
        .expect("a hook re-entering its own name does not wait on itself");

    assert!(result.is_ok());
    assert!(!app.is_plugged("P").await);
    assert_eq!(entries(&events), vec!["plugin:P:destructor", "plugin:P:initializer"]);
}

#[tokio::test]
async fn test_destructor_may_replug_its_name() {
    let app = Application::default();
    let log = tracker();
    let replugged = Arc::new(AtomicBool::new(false));

    let handle = app.clone();
    let replug_log = Arc::clone(&log);
    let plugin = FnPlugin::new("P").on_destroy(move |ctx| {
        let handle = handle.clone();
        let log = Arc::clone(&replug_log);
        let replugged = Arc::clone(&replugged);
        async move {
            // Replacing this instance runs its destructor once more
            if replugged.swap(true, Ordering::SeqCst) {
                return Ok(());
            }
            let result: HookResult = handle
                .plug(TrackedPlugin::new(ctx.name(), "successor", &log))
                .await
                .map_err(Into::into);
            result
        }
    });
    app.plug(plugin).await.unwrap();

    let result = tokio::time::timeout(std::time::Duration::from_secs(2), app.unplug("P"))
        .await
        .expect("a destructor re-entering its own name does not wait on itself");

    assert!(result.is_ok());
    // The successor plugged from the destructor survives the unplug
    assert_eq!(entries(&log), vec!["successor:initializer"]);
    assert!(app.is_plugged("P").await);
}
