//! Log in on a serial console server (raw TCP, telnet-style) and probe the
//! CLI mode.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example console_login -- <HOST> <PORT> <USER> <PASSWORD> [DIALECT]
//! ```

use std::env;
use std::time::Duration;

use promptline::platform::DialectRegistry;
use promptline::{CliDriver, ExecOptions, GenericDriver, Session, SessionConfig, StreamTransport};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 5 {
        eprintln!("USAGE: console_login <HOST> <PORT> <USER> <PASSWORD> [DIALECT]");
        std::process::exit(1);
    }
    let port: u16 = args[2].parse()?;
    let dialect = DialectRegistry::lookup(args.get(5).map(String::as_str).unwrap_or("generic"))?;

    let transport = StreamTransport::connect_tcp(&args[1], port, Duration::from_secs(10)).await?;
    let config = SessionConfig {
        timeout: Duration::from_secs(30),
        ..SessionConfig::default()
    };
    let mut driver = GenericDriver::new(Session::new(transport, config), dialect);

    // Console servers often show nothing until a key is pressed.
    driver.session_mut().send("\r").await?;
    driver.start_with_login(&args[3], &args[4]).await?;

    println!("Mode: {:?}", driver.current_mode().await?);
    let output = driver
        .exec("show version", &ExecOptions::new().in_current_mode())
        .await?;
    println!("{}", output);

    driver.close().await?;
    Ok(())
}
