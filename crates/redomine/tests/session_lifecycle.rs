//! Session lifecycle integration tests.
//!
//! Runs full `Idle` → `Ended` lifecycles against the scripted connection and
//! checks statement ordering, idempotent edges, and failure propagation.

mod harness;

use harness::patterns;
use harness::*;
use redomine::{
    MinerConfig, MinerError, MiningSession, MiningWindow, RedoOperation, Row, Scn, SessionState,
    Value,
};

fn config() -> MinerConfig {
    MinerConfig::builder()
        .url("//db1:1521/orcl")
        .username("miner")
        .password("secret")
        .build()
        .unwrap()
}

fn window() -> MiningWindow {
    MiningWindow::new(Scn::new(13_196_034), Scn::new(14_777_862))
}

fn segment_rows() -> Vec<Row> {
    vec![
        archived_segment_row("arch_10.log", 13_000_000, 13_200_000, 10),
        archived_segment_row("arch_11.log", 13_200_000, 14_800_000, 11),
        online_segment_row("redo_12.log", 14_800_000, 15_000_000, "CURRENT", 12),
    ]
}

#[tokio::test]
async fn test_full_lifecycle() {
    init_test_logging();

    let conn = MockConnection::new()
        .on_query(patterns::REGISTERED, vec![registered_row("stale_09.log")])
        .on_query(patterns::SELECTION, segment_rows())
        .on_query(
            patterns::SEGMENT_BYTES,
            vec![Row::new(vec![Value::Int64(3 * 1024 * 1024)])],
        )
        .on_query(
            patterns::CONTENTS,
            vec![
                content_row(13_196_100, 1, "0A000B", "INSERT INTO orders ", 1),
                content_row(13_196_100, 1, "0A000B", "VALUES (1)", 0),
                content_row(13_196_101, 7, "0A000B", "commit", 0),
            ],
        );

    let mut session = MiningSession::new(conn, config());
    assert_eq!(session.state(), SessionState::Idle);

    session.build_dictionary().await.unwrap();
    assert_eq!(session.state(), SessionState::DictionaryReady);

    let registered = session.register_segments(window()).await.unwrap();
    assert_eq!(registered, 3);
    assert_eq!(session.state(), SessionState::SegmentsRegistered);

    session.start_mining(window()).await.unwrap();
    assert_eq!(session.state(), SessionState::Mining);

    let records = session.mine_records(window()).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].sql_text, "INSERT INTO orders VALUES (1)");
    assert_eq!(records[1].operation, RedoOperation::Commit);

    session.end_mining().await.unwrap();
    assert_eq!(session.state(), SessionState::Ended);

    let metrics = session.metrics();
    assert_eq!(metrics.segments_selected, 3);
    assert_eq!(metrics.segments_registered, 3);
    assert_eq!(metrics.segment_bytes, 3 * 1024 * 1024);
    assert_eq!(metrics.records_mined, 2);
    assert_eq!(metrics.records_truncated, 0);

    // Statement order: dictionary build, stale segment removal, three
    // registrations in selection order, session start, session end.
    let conn = session.into_connection();
    let executed = conn.executed();
    assert!(executed[0].contains("DBMS_LOGMNR_D.BUILD"));
    assert!(executed[1].contains("REMOVE_LOGFILE"));
    assert!(executed[1].contains("stale_09.log"));

    let additions = conn.executed_matching("ADD_LOGFILE");
    assert_eq!(additions.len(), 3);
    assert!(additions[0].contains("arch_10.log"));
    assert!(additions[1].contains("arch_11.log"));
    assert!(additions[2].contains("redo_12.log"));

    assert!(executed[executed.len() - 2].contains("START_LOGMNR"));
    assert!(executed[executed.len() - 1].contains("END_LOGMNR"));
}

#[tokio::test]
async fn test_reset_survives_remove_failures() {
    init_test_logging();

    // The stale file vanished between listing and removal; registration
    // still proceeds
    let conn = MockConnection::new()
        .on_query(patterns::REGISTERED, vec![registered_row("gone_01.log")])
        .on_query(patterns::SELECTION, segment_rows())
        .fail_statement("gone_01.log", "ORA-01290: cannot remove unlisted logfile");

    let mut session = MiningSession::new(conn, config());
    session.build_dictionary().await.unwrap();
    session.register_segments(window()).await.unwrap();
    assert_eq!(session.state(), SessionState::SegmentsRegistered);
}

#[tokio::test]
async fn test_registration_failure_is_fatal_for_attempt() {
    init_test_logging();

    let conn = MockConnection::new()
        .on_query(patterns::SELECTION, segment_rows())
        .fail_statement(
            "arch_11.log",
            "ORA-01284: file /logs/arch_11.log cannot be opened",
        );

    let mut session = MiningSession::new(conn, config());
    session.build_dictionary().await.unwrap();

    let err = session.register_segments(window()).await.unwrap_err();
    match err {
        MinerError::Registration { ref segment, .. } => {
            assert_eq!(segment, "arch_11.log");
        }
        other => panic!("expected registration error, got {other:?}"),
    }
    assert!(err.is_retriable());
    // The attempt is dead; the caller restarts from a fresh session
    assert_eq!(session.state(), SessionState::DictionaryReady);
}

#[tokio::test]
async fn test_end_mining_is_idempotent() {
    init_test_logging();

    let conn = MockConnection::new().on_query(patterns::SELECTION, segment_rows());
    let mut session = MiningSession::new(conn, config());
    session.build_dictionary().await.unwrap();
    session.register_segments(window()).await.unwrap();
    session.start_mining(window()).await.unwrap();

    session.end_mining().await.unwrap();
    assert_eq!(session.state(), SessionState::Ended);

    // Second call is a no-op success, no further statement issued
    session.end_mining().await.unwrap();
    assert_eq!(session.state(), SessionState::Ended);

    let conn = session.into_connection();
    assert_eq!(conn.executed_matching("END_LOGMNR").len(), 1);
}

#[tokio::test]
async fn test_end_mining_swallows_already_closed() {
    init_test_logging();

    let conn = MockConnection::new()
        .on_query(patterns::SELECTION, segment_rows())
        .fail_statement(
            "END_LOGMNR",
            "ORA-01307: no LogMiner session is currently active",
        );

    let mut session = MiningSession::new(conn, config());
    session.build_dictionary().await.unwrap();
    session.register_segments(window()).await.unwrap();
    session.start_mining(window()).await.unwrap();

    // The engine says there is nothing to end; that is success
    session.end_mining().await.unwrap();
    assert_eq!(session.state(), SessionState::Ended);
}

#[tokio::test]
async fn test_end_mining_other_failures_propagate() {
    init_test_logging();

    let conn = MockConnection::new()
        .on_query(patterns::SELECTION, segment_rows())
        .fail_statement("END_LOGMNR", "ORA-00600: internal error");

    let mut session = MiningSession::new(conn, config());
    session.build_dictionary().await.unwrap();
    session.register_segments(window()).await.unwrap();
    session.start_mining(window()).await.unwrap();

    let err = session.end_mining().await.unwrap_err();
    assert!(matches!(err, MinerError::Database(_)));
    assert_ne!(session.state(), SessionState::Ended);
}

#[tokio::test]
async fn test_truncated_records_are_counted_not_fatal() {
    init_test_logging();

    let mut cfg = config();
    cfg.max_continuation_rows = 1;

    let conn = MockConnection::new()
        .on_query(patterns::SELECTION, segment_rows())
        .on_query(
            patterns::CONTENTS,
            vec![
                content_row(13_196_100, 3, "0A000B", "UPDATE t SET a = '", 1),
                content_row(13_196_100, 3, "0A000B", "xxxx", 1),
                content_row(13_196_100, 3, "0A000B", "yyyy", 1),
                content_row(13_196_100, 3, "0A000B", "'", 0),
            ],
        );

    let mut session = MiningSession::new(conn, cfg);
    session.build_dictionary().await.unwrap();
    session.register_segments(window()).await.unwrap();
    session.start_mining(window()).await.unwrap();

    let records = session.mine_records(window()).await.unwrap();
    assert_eq!(records.len(), 1);
    assert!(records[0].truncated);
    assert_eq!(records[0].sql_text, "UPDATE t SET a = 'xxxx");
    assert_eq!(session.metrics().records_truncated, 1);
}

#[tokio::test]
async fn test_malformed_record_stream_aborts_pass() {
    init_test_logging();

    let conn = MockConnection::new()
        .on_query(patterns::SELECTION, segment_rows())
        .on_query(
            patterns::CONTENTS,
            vec![content_row(13_196_100, 1, "0A000B", "INSERT INTO ", 1)],
        );

    let mut session = MiningSession::new(conn, config());
    session.build_dictionary().await.unwrap();
    session.register_segments(window()).await.unwrap();
    session.start_mining(window()).await.unwrap();

    let err = session.mine_records(window()).await.unwrap_err();
    assert!(matches!(
        err,
        MinerError::MalformedStream { scn } if scn == Scn::new(13_196_100)
    ));
}

#[tokio::test]
async fn test_registration_requires_dictionary() {
    init_test_logging();

    let conn = MockConnection::new().on_query(patterns::SELECTION, segment_rows());
    let mut session = MiningSession::new(conn, config());

    let err = session.register_segments(window()).await.unwrap_err();
    assert!(matches!(
        err,
        MinerError::InvalidState {
            operation: "register_segments",
            ..
        }
    ));
    assert_eq!(session.state(), SessionState::Idle);

    // No statement reached the connection
    let conn = session.into_connection();
    assert!(conn.executed().is_empty());
    assert!(conn.queried().is_empty());
}
