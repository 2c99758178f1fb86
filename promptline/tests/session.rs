//! Expect loop behavior against a scripted remote side.

mod common;

use std::time::Duration;

use common::{ScriptedTransport, exchange, init_logging, session};
use promptline::error::{ChannelError, Error};
use promptline::{PatternSet, Session, StreamTransport};

const PROMPT: &str = r"^(?P<name>router)#\s*$";

fn prompt() -> PatternSet {
    PatternSet::single(PROMPT).unwrap()
}

async fn show_date(chunk_size: Option<usize>) -> promptline::ExpectMatch {
    let mut transport = ScriptedTransport::new(vec![exchange(
        "show date\r",
        "show date\r\nThu Sep 12 19:50:51 GMT 2013\r\nrouter#",
    )]);
    if let Some(size) = chunk_size {
        transport = transport.with_chunk_size(size);
    }
    let mut session = session(transport);
    session
        .send_line_and_wait("show date", &prompt(), Duration::from_secs(2))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_output_excludes_prompt() {
    init_logging();
    let found = show_date(None).await;
    assert_eq!(found.output, "show date\nThu Sep 12 19:50:51 GMT 2013");
    assert_eq!(found.matched, "router#");
    assert_eq!(found.index, 0);
    assert_eq!(found.name.as_deref(), Some("router"));
}

#[tokio::test]
async fn test_chunking_does_not_change_the_match() {
    let whole = show_date(None).await;
    for size in [1, 2, 3, 7, 10] {
        assert_eq!(show_date(Some(size)).await, whole, "chunk size {}", size);
    }
}

#[tokio::test]
async fn test_prompt_split_across_reads() {
    let transport = ScriptedTransport::new(vec![exchange("\r", "\r\nrou"), exchange("x", "ter#")]);
    let mut session = session(transport);
    let err = session
        .send_line_and_wait("", &prompt(), Duration::from_millis(50))
        .await
        .unwrap_err();
    assert!(err.is_timeout());

    // The rest of the prompt shows up on a later read.
    session.send("x").await.unwrap();
    let found = session.expect(&prompt(), Duration::from_secs(2)).await.unwrap();
    assert_eq!(found.matched, "router#");
    assert_eq!(found.output, "");
}

#[tokio::test]
async fn test_first_pattern_wins() {
    let longer_first = PatternSet::new(["^AB", "^A"]).unwrap();
    let mut first = session(ScriptedTransport::new(vec![]).with_initial("ABC\n"));
    let found = first.expect(&longer_first, Duration::from_secs(1)).await.unwrap();
    assert_eq!(found.index, 0);
    assert_eq!(found.pattern, "^AB");

    let shorter_first = PatternSet::new(["^A", "^AB"]).unwrap();
    let mut second = session(ScriptedTransport::new(vec![]).with_initial("ABC\n"));
    let found = second.expect(&shorter_first, Duration::from_secs(1)).await.unwrap();
    assert_eq!(found.index, 0);
    assert_eq!(found.matched, "A");
}

#[tokio::test]
async fn test_text_after_prompt_stays_buffered() {
    let transport = ScriptedTransport::new(vec![]).with_initial("router#\nlate banner\nrouter#");
    let mut session = session(transport);

    let first = session.expect(&prompt(), Duration::from_secs(1)).await.unwrap();
    assert_eq!(first.output, "");

    let second = session.expect(&prompt(), Duration::from_secs(1)).await.unwrap();
    assert_eq!(second.output, "\nlate banner");
}

#[tokio::test]
async fn test_timeout_carries_received_text() {
    let transport = ScriptedTransport::new(vec![]).with_initial("booting...\r\nstill booting");
    let mut session = session(transport);

    let err = session
        .expect(&prompt(), Duration::from_millis(100))
        .await
        .unwrap_err();
    match err {
        Error::Channel(ChannelError::Timeout {
            output, patterns, ..
        }) => {
            assert_eq!(output, "booting...\nstill booting");
            assert_eq!(patterns, vec![PROMPT.to_string()]);
        }
        other => panic!("expected a timeout, got {:?}", other),
    }
    // A timeout leaves the session usable.
    assert!(session.is_open());
}

#[tokio::test]
async fn test_timeout_with_nothing_received() {
    let mut session = session(ScriptedTransport::new(vec![]));
    let err = session
        .expect(&prompt(), Duration::from_millis(30))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Channel(ChannelError::Timeout { ref output, .. }) if output.is_empty()
    ));
}

#[tokio::test]
async fn test_remote_exit_is_not_a_timeout() {
    let transport = ScriptedTransport::new(vec![exchange("exit\r", "exit\r\nlogout\r\n")]).close_after_script();
    let mut session = session(transport);

    let err = session
        .send_line_and_wait("exit", &prompt(), Duration::ZERO)
        .await
        .unwrap_err();
    assert!(err.is_connection_closed());
    assert!(!err.is_timeout());
    assert!(!session.is_open());

    // Nothing can be sent on a closed session.
    let err = session.send("show clock\r").await.unwrap_err();
    assert!(err.is_connection_closed());
}

#[tokio::test]
async fn test_empty_pattern_set_is_rejected() {
    let mut session = session(ScriptedTransport::new(vec![]));
    let none = PatternSet::new(Vec::<&str>::new()).unwrap();
    let err = session.expect(&none, Duration::from_secs(1)).await.unwrap_err();
    assert!(matches!(err, Error::Channel(ChannelError::EmptyPatterns)));
}

#[tokio::test]
async fn test_cancel_while_waiting() {
    let mut session = session(ScriptedTransport::new(vec![]));
    let token = session.cancel_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
    });

    // Zero waits forever, so only cancellation ends this.
    let err = session.expect(&prompt(), Duration::ZERO).await.unwrap_err();
    assert!(matches!(err, Error::Channel(ChannelError::Cancelled)));
}

#[tokio::test]
async fn test_buffered_prompt_matches_even_when_cancelled() {
    let transport = ScriptedTransport::new(vec![]).with_initial("router#\nrouter#");
    let mut session = session(transport);
    session.expect(&prompt(), Duration::from_secs(1)).await.unwrap();
    assert!(!session.buffer().is_empty());

    // Text already buffered is scanned before the token is looked at.
    session.cancel_token().cancel();
    let found = session.expect(&prompt(), Duration::from_secs(1)).await.unwrap();
    assert_eq!(found.matched, "router#");
}

#[tokio::test]
async fn test_cancelled_token_ignores_unread_transport_data() {
    let transport = ScriptedTransport::new(vec![]).with_initial("router#");
    let mut session = session(transport);
    session.cancel_token().cancel();

    let err = session.expect(&prompt(), Duration::from_secs(1)).await.unwrap_err();
    assert!(matches!(err, Error::Channel(ChannelError::Cancelled)));
}

#[tokio::test]
async fn test_receive_all_flushes_leftovers() {
    let transport = ScriptedTransport::new(vec![]).with_initial("router#\nstale line\n");
    let mut session = session(transport);
    session.expect(&prompt(), Duration::from_secs(1)).await.unwrap();

    let flushed = session.receive_all().await.unwrap();
    assert_eq!(flushed, "\nstale line\n");
    assert!(session.buffer().is_empty());
}

#[tokio::test]
async fn test_flush_discards_stale_prompt() {
    let transport = ScriptedTransport::new(vec![exchange(
        "show clock\r",
        "show clock\r\n19:50:51.123 GMT\r\nrouter#",
    )])
    .with_initial("router#\r\nrouter#");
    let mut session = session(transport);

    // Without the flush the stale second prompt would match right away.
    let found = session
        .flush_send_and_wait("show clock\r", &prompt(), Duration::from_secs(1))
        .await
        .unwrap();
    assert_eq!(found.output, "show clock\n19:50:51.123 GMT");
}

#[tokio::test]
async fn test_escape_codes_do_not_hide_prompt() {
    let transport = ScriptedTransport::new(vec![]).with_initial("\x1b[1mrouter\x1b[0m#");
    let mut session = session(transport);
    let found = session.expect(&prompt(), Duration::from_secs(1)).await.unwrap();
    assert_eq!(found.matched, "router#");
}

#[tokio::test]
async fn test_login() {
    let ready = PatternSet::new([r"^router>\s*$", PROMPT]).unwrap();
    let transport = ScriptedTransport::new(vec![
        exchange("admin\r", "admin\r\nPassword: "),
        exchange("secret\r", "\r\nWelcome\r\nrouter#"),
    ])
    .with_initial("\r\nUser Access Verification\r\n\r\nrouter login: ");
    let writes = transport.writes();
    let mut session = session(transport);

    let found = session
        .login("admin", "secret", &ready, Duration::from_secs(2))
        .await
        .unwrap();
    assert_eq!(found.index, 1);
    assert_eq!(found.matched, "router#");
    assert_eq!(*writes.lock().unwrap(), vec!["admin\r", "secret\r"]);
}

#[tokio::test]
async fn test_login_rejected() {
    let ready = prompt();
    let transport = ScriptedTransport::new(vec![
        exchange("admin\r", "admin\r\nPassword: "),
        exchange("wrong\r", "\r\nLogin incorrect\r\nrouter login: "),
    ])
    .with_initial("router login: ");
    let mut session = session(transport);

    let err = session
        .login("admin", "wrong", &ready, Duration::from_secs(2))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Channel(ChannelError::LoginFailed { ref prompt }) if prompt == "login"
    ));
}

#[tokio::test]
async fn test_over_byte_stream() {
    let mock = tokio_test::io::Builder::new()
        .read(b"Last login: Mon\r\nrouter#")
        .write(b"show clock\r")
        .read(b"show clock\r\n19:50:51.000 GMT Thu Sep 12 2013\r\n")
        .read(b"router#")
        .build();
    let mut session = Session::new(StreamTransport::new(mock), common::fast_config());

    let banner = session.expect(&prompt(), Duration::from_secs(1)).await.unwrap();
    assert_eq!(banner.output, "Last login: Mon");

    let found = session
        .send_line_and_wait("show clock", &prompt(), Duration::from_secs(1))
        .await
        .unwrap();
    assert_eq!(found.output, "show clock\n19:50:51.000 GMT Thu Sep 12 2013");
}
