//! Dispatch, logging order and reply wiring of `ParticipantAdapter`.

use std::sync::Arc;

use serde_json::json;

use skynet::participant::{ParticipantAdapter, ParticipantError};
use skynet::transport::{ChannelTransport, Reply};
use skynet::workitem::WorkItem;
use tokio::sync::mpsc::UnboundedReceiver;

use super::support::{capture_info_logs, traced_workitem, RecordingHandler, Timeline};

fn attach(
    handler: Arc<RecordingHandler>,
) -> (ParticipantAdapter<RecordingHandler>, UnboundedReceiver<Reply>) {
    let (transport, replies) = ChannelTransport::new("ruote_workitems");
    let adapter =
        ParticipantAdapter::new("worker1", handler, Arc::new(transport)).expect("attach handler");
    (adapter, replies)
}

#[tokio::test]
async fn construction_installs_reply_callback() {
    let handler = Arc::new(RecordingHandler::default());
    assert!(!handler.slot.is_installed());

    let (adapter, _replies) = attach(Arc::clone(&handler));
    assert!(handler.slot.is_installed());
    assert_eq!(adapter.name(), "worker1");
    assert!(Arc::ptr_eq(adapter.handler(), &handler));
}

#[tokio::test]
async fn trace_is_logged_before_dispatch() {
    let timeline = Timeline::default();
    let _guard = capture_info_logs(&timeline);
    let handler = Arc::new(RecordingHandler::with_timeline(timeline.clone()));
    let (adapter, _replies) = attach(Arc::clone(&handler));

    adapter.consume(traced_workitem()).await.expect("consume");

    assert_eq!(
        timeline.entries(),
        [
            "log: Taking workitem #42 for acme: worker1 timeout=30",
            "handle_work_item",
        ]
    );
    assert_eq!(handler.workitems(), [traced_workitem()]);
}

#[tokio::test]
async fn no_flags_means_no_logs() {
    let timeline = Timeline::default();
    let _guard = capture_info_logs(&timeline);
    let handler = Arc::new(RecordingHandler::with_timeline(timeline.clone()));
    let (adapter, _replies) = attach(Arc::clone(&handler));

    let mut workitem = traced_workitem();
    workitem.fields.debug_trace = Some(json!(false));
    adapter.consume(workitem).await.expect("consume");

    assert_eq!(timeline.entries(), ["handle_work_item"]);
    assert_eq!(handler.workitems().len(), 1);
}

#[tokio::test]
async fn params_debug_dump_logs_full_workitem_after_summary() {
    let timeline = Timeline::default();
    let _guard = capture_info_logs(&timeline);
    let handler = Arc::new(RecordingHandler::with_timeline(timeline.clone()));
    let (adapter, _replies) = attach(Arc::clone(&handler));

    let mut workitem = traced_workitem();
    workitem.params_mut().insert("debug_dump", true);
    let expected_dump = workitem.dump();
    adapter.consume(workitem).await.expect("consume");

    let entries = timeline.entries();
    assert_eq!(entries.len(), 3);
    assert_eq!(
        entries[0],
        "log: Taking workitem #42 for acme: worker1 timeout=30 debug_dump=true"
    );
    assert_eq!(entries[1], format!("log: {expected_dump}"));
    assert_eq!(entries[2], "handle_work_item");
}

#[tokio::test]
async fn fields_debug_dump_alone_logs_only_the_dump() {
    let timeline = Timeline::default();
    let _guard = capture_info_logs(&timeline);
    let handler = Arc::new(RecordingHandler::with_timeline(timeline.clone()));
    let (adapter, _replies) = attach(handler);

    let mut workitem = WorkItem::default();
    workitem.fields.debug_dump = Some(json!(1));
    adapter.consume(workitem.clone()).await.expect("consume");

    assert_eq!(timeline.logs(), [workitem.dump()]);
}

#[tokio::test]
async fn cancel_sends_one_unpredicated_signal() {
    let handler = Arc::new(RecordingHandler::default());
    let (adapter, _replies) = attach(Arc::clone(&handler));

    adapter.cancel(&traced_workitem()).await.expect("cancel");

    let signals = handler.item_signals();
    assert_eq!(signals.len(), 1);
    let signal = &signals[0];
    assert_eq!(signal.reason(), "cancel");
    assert!(!signal.is_start());
    assert!(!signal.is_stop());
    assert!(!signal.is_die());
    assert!(handler.lifecycle_signals().is_empty());
    assert!(handler.workitems().is_empty());
}

#[tokio::test]
async fn stop_sends_one_lifecycle_stop() {
    let handler = Arc::new(RecordingHandler::default());
    let (adapter, _replies) = attach(Arc::clone(&handler));

    adapter.stop(&WorkItem::default()).await.expect("stop");

    let signals = handler.lifecycle_signals();
    assert_eq!(signals.len(), 1);
    assert!(signals[0].is_stop());
    assert!(handler.item_signals().is_empty());
}

#[tokio::test]
async fn adapter_send_to_engine_tags_reply() {
    let handler = Arc::new(RecordingHandler::default());
    let (adapter, mut replies) = attach(handler);

    adapter
        .send_to_engine(traced_workitem())
        .expect("send reply");

    let reply = replies.try_recv().expect("reply delivered");
    assert_eq!(reply.reply_queue, "ruote_workitems");
    assert_eq!(reply.workitem, traced_workitem());
    assert!(replies.try_recv().is_err());
}

#[tokio::test]
async fn handler_replies_from_a_foreign_thread() {
    let handler = Arc::new(RecordingHandler::default());
    let (_adapter, mut replies) = attach(Arc::clone(&handler));

    let reply = handler.slot.reply().expect("callback installed");
    let mut workitem = traced_workitem();
    workitem.set_result(json!({"built": 3}));
    let sent = workitem.clone();

    let worker = std::thread::spawn(move || reply.send_to_engine(workitem));
    worker
        .join()
        .expect("worker thread")
        .expect("reply accepted");

    let delivered = replies.recv().await.expect("reply delivered");
    assert_eq!(delivered.workitem, sent);
    assert!(replies.try_recv().is_err());
}

#[tokio::test]
async fn replies_overlap_with_consume() {
    let handler = Arc::new(RecordingHandler::default());
    let (adapter, mut replies) = attach(Arc::clone(&handler));
    let adapter = Arc::new(adapter);

    let threads: Vec<_> = (0..4)
        .map(|n| {
            let slot_reply = handler.slot.reply().expect("callback installed");
            std::thread::spawn(move || {
                let mut workitem = WorkItem::default();
                workitem.set_result(n);
                slot_reply.send_to_engine(workitem)
            })
        })
        .collect();

    for _ in 0..4 {
        adapter
            .consume(WorkItem::default())
            .await
            .expect("consume");
    }
    for t in threads {
        t.join().expect("worker thread").expect("reply accepted");
    }

    let mut results = Vec::new();
    while let Ok(reply) = replies.try_recv() {
        results.push(reply.workitem.result().cloned().expect("result set"));
    }
    results.sort_by_key(|v| v.as_i64());
    assert_eq!(results, [json!(0), json!(1), json!(2), json!(3)]);
    assert_eq!(handler.workitems().len(), 4);
}

#[tokio::test]
async fn reply_fails_once_engine_side_is_gone() {
    let handler = Arc::new(RecordingHandler::default());
    let (adapter, replies) = attach(handler);
    drop(replies);

    let result = adapter.send_to_engine(WorkItem::default());
    assert!(matches!(result, Err(ParticipantError::Transport(_))));
}
