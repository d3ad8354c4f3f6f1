/*!
 * Mailbox Channel Tests
 * Single-slot hand-off, waiting disciplines, interruption and metadata
 */

use ai_os_mailbox::core::types::unix_now;
use ai_os_mailbox::{
    CallContext, Caller, Channel, ControlReply, InterruptFlag, IoMode, MailboxError, Pid,
    TransferMetadata,
};
use pretty_assertions::assert_eq;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const PARK_DELAY: Duration = Duration::from_millis(100);

fn caller(pid: Pid) -> Caller {
    Caller::new(pid, 1000 + pid as u32)
}

fn send(channel: &Channel, pid: Pid, message: &[u8]) -> Result<usize, MailboxError> {
    let flag = InterruptFlag::new();
    channel.send(&CallContext::new(caller(pid), &flag), message, 0)
}

fn receive(channel: &Channel, pid: Pid, len: usize) -> Result<Vec<u8>, MailboxError> {
    let flag = InterruptFlag::new();
    let mut buf = vec![0u8; len];
    let mut cursor = 0;
    let read = channel.receive(&CallContext::new(caller(pid), &flag), &mut buf[..], &mut cursor)?;
    buf.truncate(read);
    Ok(buf)
}

#[test]
fn test_writer_reader_scenario() {
    let channel = Channel::new(20);
    let payload = b"Message from writer\n";
    assert_eq!(payload.len(), 20);

    let before = unix_now();
    assert_eq!(send(&channel, 200, payload).unwrap(), 20);
    assert!(channel.is_occupied());

    let read = receive(&channel, 100, 100).unwrap();
    assert_eq!(read, payload.to_vec());
    assert!(!channel.is_occupied());

    let info = channel.query_info();
    assert_eq!(info.last_write_pid, 200);
    assert_eq!(info.last_write_owner, 1200);
    assert_eq!(info.last_read_pid, 100);
    assert_eq!(info.last_read_owner, 1100);
    assert!(info.last_write_time >= before);
    assert!(info.last_read_time >= info.last_write_time);
}

#[test]
fn test_nonblocking_receive_on_empty() {
    let channel = Channel::new(1024);
    channel.set_mode(IoMode::NonBlocking);

    let flag = InterruptFlag::new();
    let mut buf = [0xabu8; 16];
    let mut cursor = 0;
    let err = channel
        .receive(&CallContext::new(caller(1), &flag), &mut buf[..], &mut cursor)
        .unwrap_err();

    assert!(matches!(err, MailboxError::WouldBlock(_)));
    assert!(err.is_retryable());
    assert_eq!(buf, [0xab; 16]);
    assert_eq!(cursor, 0);
    assert_eq!(channel.query_info(), TransferMetadata::default());
}

#[test]
fn test_nonblocking_send_on_full_keeps_message() {
    let channel = Channel::with_mode(8, IoMode::NonBlocking);
    send(&channel, 1, b"first").unwrap();

    let err = send(&channel, 2, b"second").unwrap_err();
    assert!(matches!(err, MailboxError::WouldBlock(_)));
    assert_eq!(channel.query_info().last_write_pid, 1);

    assert_eq!(receive(&channel, 3, 8).unwrap(), b"first".to_vec());
    assert_eq!(send(&channel, 2, b"second").unwrap(), 6);
}

#[test]
fn test_unknown_control_command_changes_nothing() {
    let channel = Channel::new(32);
    send(&channel, 5, b"hello").unwrap();
    let before = channel.query_info();

    let err = channel.control(99).unwrap_err();
    assert!(matches!(err, MailboxError::InvalidArgument(_)));
    assert!(!err.is_retryable());
    assert_eq!(channel.query_info(), before);
    assert_eq!(channel.mode(), IoMode::Blocking);
    assert_eq!(channel.pending_len(), Some(5));
}

#[test]
fn test_control_query_matches_query_info() {
    let channel = Channel::new(32);
    send(&channel, 9, b"x").unwrap();
    assert_eq!(
        channel.control(2).unwrap(),
        ControlReply::BufferInfo(channel.query_info())
    );
}

#[test]
fn test_oversize_message_rejected_whole() {
    let channel = Channel::new(4);
    send(&channel, 1, b"abcd").unwrap();

    // Rejected even though the slot is full and the mode is blocking
    let err = send(&channel, 2, b"abcde").unwrap_err();
    assert!(matches!(err, MailboxError::InvalidArgument(_)));
    assert_eq!(channel.query_info().last_write_pid, 1);
    assert_eq!(receive(&channel, 3, 10).unwrap(), b"abcd".to_vec());

    assert!(matches!(
        send(&channel, 2, b"abcde"),
        Err(MailboxError::InvalidArgument(_))
    ));
    assert!(!channel.is_occupied());
}

#[test]
fn test_blocking_receive_waits_for_send() {
    let channel = Arc::new(Channel::new(64));
    let done = Arc::new(AtomicBool::new(false));

    let reader = {
        let channel = channel.clone();
        let done = done.clone();
        thread::spawn(move || {
            let data = receive(&channel, 10, 64);
            done.store(true, Ordering::SeqCst);
            data
        })
    };

    thread::sleep(PARK_DELAY);
    assert!(!done.load(Ordering::SeqCst), "reader returned before any send");

    send(&channel, 20, b"wake up").unwrap();
    assert_eq!(reader.join().unwrap().unwrap(), b"wake up".to_vec());
    assert!(!channel.is_occupied());
}

#[test]
fn test_blocking_send_waits_for_drain() {
    let channel = Arc::new(Channel::new(16));
    send(&channel, 1, b"one").unwrap();
    let done = Arc::new(AtomicBool::new(false));

    let writer = {
        let channel = channel.clone();
        let done = done.clone();
        thread::spawn(move || {
            let written = send(&channel, 2, b"two");
            done.store(true, Ordering::SeqCst);
            written
        })
    };

    thread::sleep(PARK_DELAY);
    assert!(!done.load(Ordering::SeqCst), "writer overwrote an undrained message");

    assert_eq!(receive(&channel, 3, 16).unwrap(), b"one".to_vec());
    assert_eq!(writer.join().unwrap().unwrap(), 3);
    assert_eq!(receive(&channel, 3, 16).unwrap(), b"two".to_vec());
}

#[test]
fn test_short_receive_releases_parked_sender() {
    let channel = Arc::new(Channel::new(16));
    send(&channel, 1, b"a long message").unwrap();

    let writer = {
        let channel = channel.clone();
        thread::spawn(move || send(&channel, 2, b"next"))
    };
    thread::sleep(PARK_DELAY);

    // Reading only part of the message still completes the receive
    assert_eq!(receive(&channel, 3, 6).unwrap(), b"a long".to_vec());
    assert_eq!(writer.join().unwrap().unwrap(), 4);
    assert_eq!(receive(&channel, 3, 16).unwrap(), b"next".to_vec());
}

#[test]
fn test_interrupt_aborts_parked_receive() {
    let channel = Arc::new(Channel::new(16));
    let flag = Arc::new(InterruptFlag::new());

    let reader = {
        let channel = channel.clone();
        let flag = flag.clone();
        thread::spawn(move || {
            let mut buf = [0u8; 16];
            let mut cursor = 0;
            let result = channel.receive(
                &CallContext::new(caller(10), &flag),
                &mut buf[..],
                &mut cursor,
            );
            (result, cursor)
        })
    };

    thread::sleep(PARK_DELAY);
    flag.raise();
    channel.wake_all();

    let (result, cursor) = reader.join().unwrap();
    assert!(matches!(result, Err(MailboxError::Interrupted(_))));
    assert_eq!(cursor, 0);
    assert!(!flag.is_pending());
    assert_eq!(channel.query_info(), TransferMetadata::default());

    // The channel is unaffected
    send(&channel, 20, b"still works").unwrap();
    assert_eq!(receive(&channel, 10, 16).unwrap(), b"still works".to_vec());
}

#[test]
fn test_interrupt_aborts_parked_send() {
    let channel = Arc::new(Channel::new(16));
    send(&channel, 1, b"occupied").unwrap();
    let flag = Arc::new(InterruptFlag::new());

    let writer = {
        let channel = channel.clone();
        let flag = flag.clone();
        thread::spawn(move || {
            channel.send(&CallContext::new(caller(2), &flag), &b"late"[..], 0)
        })
    };

    thread::sleep(PARK_DELAY);
    flag.raise();
    channel.wake_all();

    assert!(matches!(
        writer.join().unwrap(),
        Err(MailboxError::Interrupted(_))
    ));
    assert_eq!(channel.query_info().last_write_pid, 1);
    assert_eq!(receive(&channel, 3, 16).unwrap(), b"occupied".to_vec());
}

#[test]
fn test_interrupted_sender_does_not_strand_other_sender() {
    let channel = Arc::new(Channel::new(16));
    send(&channel, 1, b"full").unwrap();

    let flag_a = Arc::new(InterruptFlag::new());
    let spawn_sender = |flag: Arc<InterruptFlag>, pid: Pid, msg: &'static [u8]| {
        let channel = channel.clone();
        thread::spawn(move || channel.send(&CallContext::new(caller(pid), &flag), msg, 0))
    };
    let sender_a = spawn_sender(flag_a.clone(), 2, b"from a");
    let sender_b = spawn_sender(Arc::new(InterruptFlag::new()), 3, b"from b");

    thread::sleep(PARK_DELAY);
    flag_a.raise();
    channel.wake_all();
    assert!(matches!(
        sender_a.join().unwrap(),
        Err(MailboxError::Interrupted(_))
    ));

    assert_eq!(receive(&channel, 4, 16).unwrap(), b"full".to_vec());
    assert_eq!(sender_b.join().unwrap().unwrap(), 6);
    assert_eq!(receive(&channel, 4, 16).unwrap(), b"from b".to_vec());
}

#[test]
fn test_mode_change_does_not_release_parked_reader() {
    let channel = Arc::new(Channel::new(16));
    let done = Arc::new(AtomicBool::new(false));

    let reader = {
        let channel = channel.clone();
        let done = done.clone();
        thread::spawn(move || {
            let data = receive(&channel, 10, 16);
            done.store(true, Ordering::SeqCst);
            data
        })
    };

    thread::sleep(PARK_DELAY);
    channel.set_mode(IoMode::NonBlocking);
    thread::sleep(PARK_DELAY);
    assert!(!done.load(Ordering::SeqCst));

    send(&channel, 20, b"late data").unwrap();
    assert_eq!(reader.join().unwrap().unwrap(), b"late data".to_vec());
}

#[test]
fn test_many_writers_many_readers_lose_nothing() {
    const PAIRS: usize = 8;
    let channel = Arc::new(Channel::new(32));

    let readers: Vec<_> = (0..PAIRS)
        .map(|i| {
            let channel = channel.clone();
            thread::spawn(move || receive(&channel, 100 + i as Pid, 32).unwrap())
        })
        .collect();

    let writers: Vec<_> = (0..PAIRS)
        .map(|i| {
            let channel = channel.clone();
            thread::spawn(move || {
                let msg = format!("message #{}", i);
                send(&channel, 200 + i as Pid, msg.as_bytes()).unwrap()
            })
        })
        .collect();

    for writer in writers {
        writer.join().unwrap();
    }
    let received: HashSet<String> = readers
        .into_iter()
        .map(|r| String::from_utf8(r.join().unwrap()).unwrap())
        .collect();

    let expected: HashSet<String> = (0..PAIRS).map(|i| format!("message #{}", i)).collect();
    assert_eq!(received, expected);
    assert!(!channel.is_occupied());
}
