//! Integration tests for the full dispatch pipeline.
//!
//! Tests: Manager → Transport → (Queue → Consumer) → Dispatcher → Listeners
//!
//! Verifies:
//! - Local mode runs entries inline and in submission order
//! - Remote mode round-trips through the queue and notification channel
//! - Chained entries travel on the transport their parent arrived on
//! - Audit sinks see every lifecycle event

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use anyhow::bail;
    use proptest::prelude::*;
    use serde_json::{Value as JsonValue, json};

    use taskrail_core::{
        DispatchManager, EntryValidator, FieldKind, ObjectSchema, ProcessorDescriptor,
        ProcessorRegistry, TaskEntry,
    };
    use taskrail_events::{
        InMemoryEventLog, LifecycleEventKind, LifecycleListener, ListenerSet, decode_entry,
    };
    use taskrail_observability::with_trace_id;

    use crate::audit::{AuditTableSink, InMemoryAuditStore, LogTableSink};
    use crate::consumer::{NotificationOutcome, RemoteConsumer};
    use crate::dispatcher::ExecutionDispatcher;
    use crate::processors::{CHAIN, ECHO, builtin_processors, builtin_schemas};
    use crate::transport::{
        InMemoryNotifier, InMemoryQueue, LOCAL_START_SENTINEL, LocalTransport, RemoteTransport,
    };

    use LifecycleEventKind::*;

    type Seen = Arc<Mutex<Vec<(JsonValue, JsonValue)>>>;

    struct Harness {
        log: Arc<InMemoryEventLog>,
        seen: Seen,
        validator: Arc<EntryValidator>,
        dispatcher: Arc<ExecutionDispatcher>,
    }

    impl Harness {
        fn local_manager(&self) -> DispatchManager {
            let transport = Arc::new(LocalTransport::new(self.dispatcher.clone()));
            DispatchManager::new(transport, self.validator.clone())
        }
    }

    /// Built-ins plus:
    /// - `Record`: remembers every (data, metadata) it runs with
    /// - `Flaky`: fails when `data.fail` is true
    /// - `Validated`: requires `data.nameParam: string`
    async fn harness(extra: Vec<Arc<dyn LifecycleListener>>) -> Harness {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = seen.clone();

        let mut processors = builtin_processors();
        processors.push(ProcessorDescriptor::from_fn("Record", move |data, metadata| {
            recorder.lock().unwrap().push((data.clone(), metadata.clone()));
            Ok(())
        }));
        processors.push(ProcessorDescriptor::from_fn("Flaky", |data, _| {
            if data["fail"] == json!(true) {
                bail!("flaky processor gave up");
            }
            Ok(())
        }));
        processors.push(
            ProcessorDescriptor::from_fn("Validated", |_, _| Ok(())).with_data_schema("Person"),
        );

        let schemas = Arc::new(
            builtin_schemas()
                .with_schema("Person", ObjectSchema::new().required("nameParam", FieldKind::String)),
        );
        let registry = ProcessorRegistry::build(processors, &*schemas)
            .await
            .unwrap();
        let validator = Arc::new(EntryValidator::new(Arc::new(registry), schemas));

        let log = Arc::new(InMemoryEventLog::new());
        let mut listeners = ListenerSet::new(vec![log.clone() as Arc<dyn LifecycleListener>]);
        for listener in extra {
            listeners.push(listener);
        }
        let dispatcher = Arc::new(ExecutionDispatcher::new(validator.clone(), listeners));

        Harness {
            log,
            seen,
            validator,
            dispatcher,
        }
    }

    fn recorded_indices(seen: &Seen) -> Vec<i64> {
        seen.lock()
            .unwrap()
            .iter()
            .filter_map(|(data, _)| data["i"].as_i64())
            .collect()
    }

    #[tokio::test]
    async fn echo_runs_inline_with_one_correlation_id() {
        let h = harness(vec![]).await;
        let manager = h.local_manager();

        let entry = h
            .validator
            .create(ECHO, json!({"msg": "hi"}), json!({}), true)
            .await
            .unwrap()
            .expect("echo accepts anything");
        assert_eq!(entry.task_type(), "Echo");
        assert_eq!(entry.data(), &json!({"msg": "hi"}));

        let id = manager.submit(&entry).await.expect("local submit confirms");

        let events = h.log.events();
        assert_eq!(h.log.kinds(), vec![ProcessStarting, ExecutionSuccessfullyComplete]);
        let cid = events[0].correlation_id();
        assert_eq!(events[1].correlation_id(), cid);
        assert_eq!(id, format!("local:{cid}:ExecutionSuccessfullyComplete"));
        assert_eq!(events[0].payload()["entry"]["data"], json!({"msg": "hi"}));
    }

    #[tokio::test]
    async fn invalid_entries_are_refused_at_creation() {
        let h = harness(vec![]).await;

        let lenient = h
            .validator
            .create("Validated", json!({}), json!({}), true)
            .await
            .unwrap();
        assert!(lenient.is_none());

        let err = h
            .validator
            .create("Validated", json!({}), json!({}), false)
            .await
            .unwrap_err();
        assert_eq!(err.violations, vec!["nameParam required".to_string()]);

        let err = h
            .local_manager()
            .submit_new("Validated", json!({"nameParam": 3}), json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.violations, vec!["nameParam must be a string".to_string()]);
        assert!(h.log.events().is_empty());
    }

    #[tokio::test]
    async fn unvalidated_bad_entry_stops_before_execution() {
        let h = harness(vec![]).await;
        let entry = TaskEntry::new("Validated", json!({}), json!({}));

        let id = h.local_manager().submit(&entry).await.unwrap();

        assert!(id.ends_with(":DataValidationError"));
        assert_eq!(h.log.kinds(), vec![DataValidationError]);
        assert_eq!(
            h.log.events()[0].payload()["violations"],
            json!(["nameParam required"])
        );
    }

    #[tokio::test]
    async fn unknown_type_is_unconfirmed() {
        let h = harness(vec![]).await;
        let manager = h.local_manager();
        let entry = TaskEntry::new("Nope", json!({}), json!({}));

        assert_eq!(manager.submit(&entry).await, None);
        assert_eq!(h.log.kinds(), vec![NoMatchProcessorName]);

        let slots = manager.submit_batch(&[entry]).await;
        assert!(slots[0].as_ref().unwrap_err().contains("Nope"));
    }

    #[tokio::test]
    async fn failing_entry_does_not_stop_the_batch() {
        let h = harness(vec![]).await;
        let batch = vec![
            TaskEntry::new("Flaky", json!({"fail": false}), json!({})),
            TaskEntry::new("Flaky", json!({"fail": true}), json!({})),
            TaskEntry::new("Flaky", json!({}), json!({})),
        ];

        let slots = h.local_manager().submit_batch(&batch).await;

        assert_eq!(slots.len(), 3);
        assert!(slots[0].as_ref().unwrap().ends_with(":ExecutionSuccessfullyComplete"));
        assert!(slots[1].as_ref().unwrap().ends_with(":ExecutionFailedError"));
        assert!(slots[2].as_ref().unwrap().ends_with(":ExecutionSuccessfullyComplete"));

        let failures: Vec<_> = h
            .log
            .events()
            .into_iter()
            .filter(|e| e.kind() == ExecutionFailedError)
            .collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].payload()["error"], json!("flaky processor gave up"));
    }

    #[tokio::test]
    async fn local_signals_are_noops() {
        let h = harness(vec![]).await;
        let manager = h.local_manager();

        assert_eq!(
            manager.fire_start_signal().await.as_deref(),
            Some(LOCAL_START_SENTINEL)
        );
        assert_eq!(manager.backlog_size().await, 0);
        assert!(h.log.events().is_empty());

        let immediate = TaskEntry::new(ECHO, json!({}), json!({}));
        assert!(manager.fire_immediate(&immediate).await.is_some());
        assert_eq!(h.log.kinds(), vec![ProcessStarting, ExecutionSuccessfullyComplete]);
    }

    #[tokio::test]
    async fn chain_fans_out_depth_first_locally() {
        let h = harness(vec![]).await;
        let entry = TaskEntry::new(
            CHAIN,
            json!({"entries": [
                {"type": "Record", "data": {"i": 1}},
                {"type": "Record", "data": {"i": 2}, "metadata": {"tenant": "b"}},
            ]}),
            json!({"tenant": "a"}),
        );

        let id = h.local_manager().submit(&entry).await.unwrap();
        assert!(id.ends_with(":ExecutionSuccessfullyComplete"));

        let types_and_kinds: Vec<_> = h
            .log
            .events()
            .iter()
            .map(|e| (e.processor_type().to_string(), e.kind()))
            .collect();
        assert_eq!(
            types_and_kinds,
            vec![
                ("Chain".to_string(), ProcessStarting),
                ("Record".to_string(), ProcessStarting),
                ("Record".to_string(), ExecutionSuccessfullyComplete),
                ("Record".to_string(), ProcessStarting),
                ("Record".to_string(), ExecutionSuccessfullyComplete),
                ("Chain".to_string(), ExecutionSuccessfullyComplete),
            ]
        );

        let seen = h.seen.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![
                (json!({"i": 1}), json!({"tenant": "a"})),
                (json!({"i": 2}), json!({"tenant": "b"})),
            ]
        );
    }

    #[tokio::test]
    async fn chain_fails_when_a_child_is_not_accepted() {
        let h = harness(vec![]).await;
        let entry = TaskEntry::new(
            CHAIN,
            json!({"entries": [{"type": "Echo"}, {"type": "Missing"}]}),
            json!({}),
        );

        let id = h.local_manager().submit(&entry).await.unwrap();

        assert!(id.ends_with(":ExecutionFailedError"));
        let last = h.log.events().pop().unwrap();
        assert_eq!(last.processor_type(), "Chain");
        let error = last.payload()["error"].as_str().unwrap().to_string();
        assert!(error.starts_with("1 of 2 chained entries were not accepted"), "{error}");
    }

    #[tokio::test]
    async fn remote_round_trip_through_queue_and_notifications() {
        let h = harness(vec![]).await;
        let queue = Arc::new(InMemoryQueue::new());
        let notifier = Arc::new(InMemoryNotifier::new());
        let remote = Arc::new(RemoteTransport::new(queue.clone(), notifier.clone()));
        let manager = DispatchManager::new(remote.clone(), h.validator.clone());
        let consumer = RemoteConsumer::new(h.dispatcher.clone(), remote);

        let slots = manager
            .submit_batch(&[
                TaskEntry::new("Record", json!({"i": 0}), json!({})),
                TaskEntry::new("Record", json!({"i": 1}), json!({})),
            ])
            .await;
        assert!(slots.iter().all(|s| s.as_ref().unwrap().starts_with("mem-")));
        assert_eq!(manager.backlog_size().await, 2);
        assert!(h.log.events().is_empty());

        for message in queue.drain() {
            assert_eq!(message.group_key, "Record");
            let outcome = consumer.on_queue_message(&message.body).await.unwrap();
            assert!(outcome.succeeded());
        }
        assert_eq!(recorded_indices(&h.seen), vec![0, 1]);
        assert_eq!(manager.backlog_size().await, 0);

        manager.fire_start_signal().await.unwrap();
        manager
            .fire_immediate(&TaskEntry::new("Record", json!({"i": 9}), json!({})))
            .await
            .unwrap();

        let bodies = notifier.drain();
        assert_eq!(bodies.len(), 2);
        assert_eq!(
            consumer.on_notification(&bodies[0]).await.unwrap(),
            NotificationOutcome::Woken
        );
        match consumer.on_notification(&bodies[1]).await.unwrap() {
            NotificationOutcome::Dispatched(outcome) => {
                assert!(outcome.succeeded());
                assert_eq!(outcome.processor_type, "Record");
            }
            other => panic!("expected a dispatch, got {other:?}"),
        }
        assert_eq!(recorded_indices(&h.seen), vec![0, 1, 9]);
    }

    #[tokio::test]
    async fn remote_chain_children_are_enqueued_not_run() {
        let h = harness(vec![]).await;
        let queue = Arc::new(InMemoryQueue::new());
        let remote = Arc::new(RemoteTransport::new(
            queue.clone(),
            Arc::new(InMemoryNotifier::new()),
        ));
        let manager = DispatchManager::new(remote.clone(), h.validator.clone());
        let consumer = RemoteConsumer::new(h.dispatcher.clone(), remote);

        let parent = TaskEntry::new(
            CHAIN,
            json!({"entries": [{"type": "Echo", "data": {"n": 1}}]}),
            json!({"tenant": "a"}),
        );
        manager.submit(&parent).await.unwrap();

        let parent_message = queue.pop_group(CHAIN).unwrap();
        let outcome = consumer.on_queue_message(&parent_message.body).await.unwrap();
        assert!(outcome.succeeded());

        let children = queue.drain();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].group_key, "Echo");
        let child = decode_entry(&children[0].body).unwrap();
        assert_eq!(child.data(), &json!({"n": 1}));
        assert_eq!(child.metadata(), &json!({"tenant": "a"}));
        assert!(h.log.events().iter().all(|e| e.processor_type() == "Chain"));
    }

    #[tokio::test]
    async fn remote_outage_degrades_to_unconfirmed() {
        let h = harness(vec![]).await;
        let queue = Arc::new(InMemoryQueue::new());
        queue.set_unavailable(true);
        let manager = DispatchManager::new(
            Arc::new(RemoteTransport::new(queue, Arc::new(InMemoryNotifier::new()))),
            h.validator.clone(),
        );
        let entry = TaskEntry::new(ECHO, json!({}), json!({}));

        assert_eq!(manager.submit(&entry).await, None);
        assert_eq!(manager.backlog_size().await, 0);
        let slots = manager.submit_batch(&[entry.clone(), entry]).await;
        assert!(slots.iter().all(|s| s.is_err()));
    }

    #[tokio::test]
    async fn garbage_on_the_queue_is_reported_not_dispatched() {
        let h = harness(vec![]).await;
        let consumer = RemoteConsumer::new(
            h.dispatcher.clone(),
            Arc::new(LocalTransport::new(h.dispatcher.clone())),
        );

        assert!(consumer.on_queue_message("{not json").await.is_err());
        assert!(consumer.on_notification(r#"{"marker":"later"}"#).await.is_err());
        assert!(h.log.events().is_empty());
    }

    #[tokio::test]
    async fn audit_sinks_record_every_event() {
        let audit = Arc::new(InMemoryAuditStore::new());
        let logs = Arc::new(InMemoryAuditStore::new());
        let h = harness(vec![
            Arc::new(AuditTableSink::new(audit.clone(), "test")) as Arc<dyn LifecycleListener>,
            Arc::new(LogTableSink::new(logs.clone(), "test")),
        ])
        .await;
        let manager = h.local_manager();

        let entry = TaskEntry::new(ECHO, json!({"msg": "audited"}), json!({}));
        with_trace_id("req-42", manager.submit(&entry)).await.unwrap();

        let audit = audit.records();
        let event_types: Vec<_> = audit.iter().map(|r| r.event_type.as_str()).collect();
        assert_eq!(event_types, vec!["ProcessStarting", "ExecutionSuccessfullyComplete"]);
        assert!(audit.iter().all(|r| r.environment == "test" && r.trace_id.is_none()));
        assert_eq!(audit[0].correlation_id, audit[1].correlation_id);

        let logs = logs.records();
        assert_eq!(logs.len(), 2);
        assert!(logs.iter().all(|r| r.trace_id.as_deref() == Some("req-42")));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn local_batch_runs_in_submission_order(n in 0usize..24) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap();
            rt.block_on(async {
                let h = harness(vec![]).await;
                let batch: Vec<_> = (0..n)
                    .map(|i| TaskEntry::new("Record", json!({"i": i}), json!({})))
                    .collect();

                let slots = h.local_manager().submit_batch(&batch).await;

                prop_assert_eq!(slots.len(), n);
                prop_assert!(slots.iter().all(|s| s.is_ok()));
                let expected: Vec<i64> = (0..n as i64).collect();
                prop_assert_eq!(recorded_indices(&h.seen), expected);
                Ok(())
            })?;
        }
    }
}
