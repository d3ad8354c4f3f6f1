/*!
 * AI-OS Mailbox - Demo Entry Point
 *
 * Registers a mailbox device and runs one writer/reader hand-off through it:
 * - The reader opens first and parks until a message lands
 * - The writer sends one message (first CLI argument, or a default)
 * - The buffer metadata is queried through the control plane
 * - Non-blocking mode is exercised on the now-empty mailbox
 *
 * Ctrl+C interrupts any session still parked.
 */

use ai_os_mailbox::core::limits::BUFFER_INFO_SIZE;
use ai_os_mailbox::ipc::mailbox::format_timestamp;
use ai_os_mailbox::{
    init_tracing, Caller, ControlCommand, MailboxConfig, MailboxDevice, MailboxError,
    TransferMetadata,
};
use miette::IntoDiagnostic;
use tracing::{info, warn};

const DEFAULT_MESSAGE: &str = "Message from writer\n";
const READ_SIZE: usize = 100;

#[tokio::main]
async fn main() -> miette::Result<()> {
    init_tracing();

    let config = MailboxConfig::from_env()?;
    info!(device = %config.device_name, capacity = config.capacity, "mailbox starting");
    let device = MailboxDevice::new(&config);

    let message = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_MESSAGE.to_string());

    let mut reader = device.open(Caller::current());
    let mut writer = device.open(Caller::current());
    let interrupters = [reader.interrupter(), writer.interrupter()];

    let reader_task = tokio::task::spawn_blocking(move || {
        println!("reader: waiting for writer");
        let mut buf = vec![0u8; READ_SIZE];
        let read = reader.read(&mut buf[..])?;
        buf.truncate(read);
        Ok::<_, MailboxError>(buf)
    });

    let writer_task = tokio::task::spawn_blocking(move || {
        println!("writer: writing buffer: {:?}", message);
        writer.write(message.as_bytes())
    });

    let handoff = async { (reader_task.await, writer_task.await) };
    tokio::pin!(handoff);

    let (read, written) = tokio::select! {
        out = &mut handoff => out,
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupt received, aborting parked sessions");
            for interrupter in &interrupters {
                interrupter.interrupt();
            }
            handoff.await
        }
    };

    let written = written.into_diagnostic()??;
    let read = read.into_diagnostic()??;
    println!("writer: wrote {} bytes", written);
    println!("reader: read buffer: {:?}", String::from_utf8_lossy(&read));

    let mut control = device.open(Caller::current());
    let mut record = [0u8; BUFFER_INFO_SIZE];
    control.ioctl(ControlCommand::QueryBufferInfo.code(), &mut record[..])?;
    let info = TransferMetadata::from_bytes(&record)?;
    println!("{}", info);
    println!("{}", serde_json::to_string_pretty(&info).into_diagnostic()?);

    let mut no_arg: [u8; 0] = [];
    control.ioctl(ControlCommand::SetNonBlocking.code(), &mut no_arg[..])?;
    let mut probe = [0u8; READ_SIZE];
    match control.read(&mut probe[..]) {
        Err(e @ MailboxError::WouldBlock(_)) => {
            println!("non-blocking read on empty mailbox: {} ({})", e, e.errno())
        }
        other => warn!(?other, "unexpected non-blocking read outcome"),
    }
    control.ioctl(ControlCommand::SetBlocking.code(), &mut no_arg[..])?;

    info!(
        last_write = %format_timestamp(info.last_write_time),
        open_sessions = device.open_sessions(),
        "mailbox demo complete"
    );
    Ok(())
}
