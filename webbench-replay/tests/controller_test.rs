mod support;

use assert_matches::assert_matches;
use support::{ScriptedTransport, memory_store, save};
use webbench_replay::{
    DiffLine, DiffOp, DiffOptions, DiffOutcome, InterceptorController, NoHooks,
    REPLAY_FAILED_PREFIX, ReplayController, ReplayError, ReplayPhase, RequestForm, ViewMode,
};
use webbench_storage::{RecordPatch, ReplayPolicy};

#[test]
fn select_on_empty_store_stays_idle() {
    let mut store = memory_store();
    let mut controller = ReplayController::default();

    assert_matches!(
        controller.select(&mut store, "missing"),
        Err(ReplayError::EmptyStore)
    );
    assert_eq!(controller.phase(), ReplayPhase::Idle);
}

#[test]
fn select_unknown_id_returns_to_idle() {
    let mut store = memory_store();
    let record = save(&mut store, "GET", "http://example.com/a");
    let mut controller = ReplayController::default();
    controller.select(&mut store, &record.id).unwrap();

    assert_matches!(
        controller.select(&mut store, "nope"),
        Err(ReplayError::RecordNotFound(id)) if id == "nope"
    );
    assert_eq!(controller.phase(), ReplayPhase::Idle);
}

#[test]
fn replay_without_selection_is_rejected() {
    let mut store = memory_store();
    save(&mut store, "GET", "http://example.com/a");
    let mut controller = ReplayController::default();

    assert_matches!(
        controller.begin_replay(&mut store),
        Err(ReplayError::NoSelection)
    );
    assert_eq!(controller.phase(), ReplayPhase::Idle);
}

#[tokio::test]
async fn second_replay_diffs_against_first() {
    let mut store = memory_store();
    let record = save(&mut store, "GET", "http://example.com/ping");
    let transport = ScriptedTransport::new().reply("ping").reply("pong2");
    let mut controller = ReplayController::default();

    let selected = controller.select(&mut store, &record.id).unwrap();
    assert_eq!(selected.id, record.id);
    assert_eq!(controller.phase(), ReplayPhase::Selected);

    let first = controller
        .replay_selected(&mut store, &NoHooks, &transport)
        .await
        .unwrap();
    assert_eq!(first.diff, Some(DiffOutcome::NoBaseline));
    assert_eq!(controller.baseline(&record.id), Some("ping"));
    assert_eq!(controller.phase(), ReplayPhase::Replayed);

    let second = controller
        .replay_selected(&mut store, &NoHooks, &transport)
        .await
        .unwrap();
    let diff = second.diff.clone().unwrap();
    let ops: Vec<DiffOp> = diff.lines().unwrap().iter().map(|line| line.op).collect();
    assert_eq!(ops, vec![DiffOp::Inserted, DiffOp::Deleted]);
    assert_eq!(second.diff_text(), "+ pong2\n- ping");
    assert_eq!(controller.baseline(&record.id), Some("pong2"));

    controller.set_view_mode(ViewMode::Diff);
    assert_eq!(controller.rendered().unwrap(), "+ pong2\n- ping");
    controller.set_view_mode(ViewMode::Raw);
    let raw = controller.rendered().unwrap();
    let response = second.outcome.response().unwrap();
    assert_eq!(
        raw,
        format!(
            "200 OK • {}ms\n\ncontent-type: text/plain\n\npong2",
            response.elapsed_ms
        )
    );
}

#[tokio::test]
async fn baselines_are_kept_per_record() {
    let mut store = memory_store();
    let a = save(&mut store, "GET", "http://example.com/a");
    let b = save(&mut store, "GET", "http://example.com/b");
    let transport = ScriptedTransport::new().reply("a1").reply("b1").reply("a2");
    let mut controller = ReplayController::default();

    controller.select(&mut store, &a.id).unwrap();
    controller
        .replay_selected(&mut store, &NoHooks, &transport)
        .await
        .unwrap();

    controller.select(&mut store, &b.id).unwrap();
    assert!(controller.display().is_none());
    let view_b = controller
        .replay_selected(&mut store, &NoHooks, &transport)
        .await
        .unwrap();
    assert_eq!(view_b.diff, Some(DiffOutcome::NoBaseline));

    controller.select(&mut store, &a.id).unwrap();
    let view_a = controller
        .replay_selected(&mut store, &NoHooks, &transport)
        .await
        .unwrap();
    assert_eq!(view_a.diff_text(), "+ a2\n- a1");
    assert_eq!(controller.baseline(&a.id), Some("a2"));
    assert_eq!(controller.baseline(&b.id), Some("b1"));
}

#[tokio::test]
async fn failed_replay_leaves_baseline_alone() {
    let mut store = memory_store();
    let record = save(&mut store, "GET", "http://example.com/a");
    let transport = ScriptedTransport::new().reply("ok").fail("connection refused");
    let mut controller = ReplayController::default();
    controller.select(&mut store, &record.id).unwrap();

    controller
        .replay_selected(&mut store, &NoHooks, &transport)
        .await
        .unwrap();
    let failed = controller
        .replay_selected(&mut store, &NoHooks, &transport)
        .await
        .unwrap();

    assert!(failed.diff.is_none());
    assert!(failed.raw_text().starts_with(REPLAY_FAILED_PREFIX));
    assert!(failed.raw_text().contains("connection refused"));
    assert_eq!(failed.diff_text(), failed.raw_text());
    assert_eq!(controller.baseline(&record.id), Some("ok"));
}

#[tokio::test]
async fn replay_reads_latest_record_contents() {
    let mut store = memory_store();
    let record = save(&mut store, "GET", "http://example.com/old");
    let mut controller = ReplayController::default();
    controller.select(&mut store, &record.id).unwrap();

    store
        .upsert_by_id(
            &record.id,
            RecordPatch {
                url: Some("http://example.com/new".to_string()),
                ..RecordPatch::default()
            },
        )
        .unwrap();

    let ticket = controller.begin_replay(&mut store).unwrap();
    assert_eq!(ticket.request().url, "http://example.com/new");
    assert_eq!(controller.phase(), ReplayPhase::Replaying);

    let transport = ScriptedTransport::new().reply("body");
    let completed = ticket.run(&NoHooks, &transport).await;
    controller.complete_replay(completed).unwrap();
    assert_eq!(controller.phase(), ReplayPhase::Replayed);
    assert_eq!(transport.seen()[0].url, "http://example.com/new");
}

#[tokio::test]
async fn overlapping_replays_apply_in_completion_order() {
    let mut store = memory_store();
    let record = save(&mut store, "GET", "http://example.com/a");
    let mut controller = ReplayController::default();
    controller.select(&mut store, &record.id).unwrap();

    let older = controller.begin_replay(&mut store).unwrap();
    let newer = controller.begin_replay(&mut store).unwrap();

    let newer_done = newer
        .run(&NoHooks, &ScriptedTransport::new().reply("two"))
        .await;
    let older_done = older
        .run(&NoHooks, &ScriptedTransport::new().reply("one"))
        .await;

    controller.complete_replay(newer_done).unwrap();
    assert_eq!(controller.phase(), ReplayPhase::Replaying);
    let last = controller.complete_replay(older_done).unwrap();
    assert_eq!(last.diff_text(), "+ one\n- two");
    assert_eq!(controller.baseline(&record.id), Some("one"));
    assert_eq!(controller.phase(), ReplayPhase::Replayed);
}

#[tokio::test]
async fn latest_wins_discards_older_completion() {
    let mut store = memory_store();
    let record = save(&mut store, "GET", "http://example.com/a");
    let mut controller = ReplayController::new(ReplayPolicy::LatestWins, DiffOptions::default());
    controller.select(&mut store, &record.id).unwrap();

    let older = controller.begin_replay(&mut store).unwrap();
    let newer = controller.begin_replay(&mut store).unwrap();
    let newer_done = newer
        .run(&NoHooks, &ScriptedTransport::new().reply("two"))
        .await;
    let older_done = older
        .run(&NoHooks, &ScriptedTransport::new().reply("one"))
        .await;

    controller.complete_replay(newer_done).unwrap();
    assert_matches!(
        controller.complete_replay(older_done),
        Err(ReplayError::Superseded(_))
    );
    assert_eq!(controller.baseline(&record.id), Some("two"));
    assert_eq!(controller.phase(), ReplayPhase::Replayed);
}

#[tokio::test]
async fn clear_all_resets_session_and_drops_late_results() {
    let mut store = memory_store();
    let record = save(&mut store, "GET", "http://example.com/a");
    let transport = ScriptedTransport::new().reply("one").reply("two");
    let mut controller = ReplayController::default();
    controller.select(&mut store, &record.id).unwrap();
    controller
        .replay_selected(&mut store, &NoHooks, &transport)
        .await
        .unwrap();

    let pending = controller.begin_replay(&mut store).unwrap();
    assert!(controller.clear_all(&mut store).is_persisted());

    assert_eq!(controller.phase(), ReplayPhase::Idle);
    assert!(controller.display().is_none());
    assert!(controller.baseline(&record.id).is_none());
    assert!(store.load_all().is_empty());

    let late = pending.run(&NoHooks, &transport).await;
    assert_matches!(
        controller.complete_replay(late),
        Err(ReplayError::RecordNotFound(_))
    );
    assert!(controller.baseline(&record.id).is_none());
}

#[tokio::test]
async fn removing_selected_record_deselects_it() {
    let mut store = memory_store();
    let keep = save(&mut store, "GET", "http://example.com/keep");
    let gone = save(&mut store, "GET", "http://example.com/drop");
    let transport = ScriptedTransport::new().reply("x");
    let mut controller = ReplayController::default();
    controller.select(&mut store, &gone.id).unwrap();
    controller
        .replay_selected(&mut store, &NoHooks, &transport)
        .await
        .unwrap();

    controller.remove(&mut store, &gone.id).unwrap();

    assert_eq!(controller.phase(), ReplayPhase::Idle);
    assert!(controller.baseline(&gone.id).is_none());
    assert_matches!(
        controller.remove(&mut store, &gone.id),
        Err(ReplayError::Store(_))
    );

    let records = controller.refresh(&mut store);
    assert_eq!(records.len(), 1);
    assert_eq!(controller.selected_id(), Some(keep.id.as_str()));
}

#[test]
fn refresh_selects_first_record_and_drops_vanished_selection() {
    let mut store = memory_store();
    let older = save(&mut store, "GET", "http://example.com/older");
    let newer = save(&mut store, "GET", "http://example.com/newer");
    let mut controller = ReplayController::default();

    controller.refresh(&mut store);
    assert_eq!(controller.selected_id(), Some(newer.id.as_str()));

    controller.select(&mut store, &older.id).unwrap();
    store.remove_by_id(&older.id).unwrap();
    controller.refresh(&mut store);
    assert_eq!(controller.selected_id(), Some(newer.id.as_str()));

    store.clear_all();
    controller.refresh(&mut store);
    assert_eq!(controller.phase(), ReplayPhase::Idle);
}

#[tokio::test]
async fn saved_ping_replays_pong_then_pong2() {
    let mut store = memory_store();
    let mut interceptor = InterceptorController::new();
    let form = RequestForm {
        method: "GET".to_string(),
        url: "https://api.example.com/ping".to_string(),
        ..RequestForm::default()
    };

    let (record, _) = interceptor.save_as_new(&mut store, &form).unwrap();
    let records = store.load_all();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, record.id);

    let transport = ScriptedTransport::new().reply("pong").reply("pong2");
    let mut controller = ReplayController::default();
    controller.select(&mut store, &record.id).unwrap();

    let first = controller
        .replay_selected(&mut store, &NoHooks, &transport)
        .await
        .unwrap();
    assert_eq!(first.diff, Some(DiffOutcome::NoBaseline));

    let second = controller
        .replay_selected(&mut store, &NoHooks, &transport)
        .await
        .unwrap();
    assert_eq!(
        second.diff,
        Some(DiffOutcome::Lines {
            lines: vec![
                DiffLine {
                    op: DiffOp::Inserted,
                    text: "pong2".to_string()
                },
                DiffLine {
                    op: DiffOp::Deleted,
                    text: "pong".to_string()
                },
            ]
        })
    );
    assert_eq!(transport.seen()[0].url, "https://api.example.com/ping");
}
