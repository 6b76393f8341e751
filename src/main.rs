use clap::Parser;
use mailsink::SmtpServer;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Dummy SMTP sink: accepts every message and prints what it received.
#[derive(Parser, Debug)]
#[command(about, version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = 1025)]
    port: u16,

    /// Host name announced in the SMTP greeting
    #[arg(long, default_value = "localhost")]
    host: String,

    /// How often to poll the capture queue, in milliseconds
    #[arg(long, default_value_t = 1000)]
    poll_interval: u64,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let server = match SmtpServer::start_with_host(args.port, &args.host) {
        Ok(server) => server,
        Err(err) => {
            eprintln!("cannot listen on port {}: {err}", args.port);
            return ExitCode::FAILURE;
        }
    };

    println!("mailsink is waiting for emails on port {}...", server.port());

    let inbox = server.received();
    loop {
        while let Some(message) = inbox.poll() {
            if let Some(subject) = message.header_value("Subject") {
                println!(
                    "received '{}' from: {} to: {}",
                    subject,
                    message.header_value("From").unwrap_or("-"),
                    message.header_value("To").unwrap_or("-"),
                );
            }
        }
        thread::sleep(Duration::from_millis(args.poll_interval));
    }
}
