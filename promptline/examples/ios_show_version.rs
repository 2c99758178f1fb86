//! Connect to a Cisco IOS device over SSH and run a few show commands.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example ios_show_version -- --host 192.168.1.1 --user admin --password secret
//! ```
//!
//! Set `RUST_LOG=debug` to watch every send, expect and mode change.

use std::env;
use std::time::Duration;

use promptline::{CliDriver, DriverBuilder, ExecOptions, Mode, ModeProbe};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    println!("Connecting to {}:{}...", args.host, args.port);

    let mut builder = DriverBuilder::new(&args.host)
        .port(args.port)
        .username(&args.user)
        .password(&args.password)
        .dialect(&args.dialect)
        .timeout(Duration::from_secs(args.timeout));
    if let Some(enable) = &args.enable {
        builder = builder.enable_password(enable);
    }

    let mut driver = builder.connect().await?;

    match driver.current_mode().await? {
        ModeProbe::Known(mode) => println!("Session is in {} mode", mode),
        ModeProbe::Unrecognized { prompt } => println!("Unrecognized prompt '{}'", prompt),
    }

    let enable = ExecOptions::new().in_mode(Mode::Enable);
    for command in ["show version", "show clock"] {
        println!("\n{}\n{}", command, "-".repeat(50));
        println!("{}", driver.exec(command, &enable).await?);
    }

    // An invalid command comes back as output instead of an error here.
    let output = driver
        .exec("show no-such-thing", &enable.clone().error_expected(true))
        .await?;
    println!("\nError output as expected:\n{}", output);

    driver.close().await?;
    println!("Done!");
    Ok(())
}

/// Simple argument parser (avoiding external dependencies)
struct Args {
    host: String,
    port: u16,
    user: String,
    password: String,
    enable: Option<String>,
    dialect: String,
    timeout: u64,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut parsed = Self {
            host: "localhost".to_string(),
            port: 22,
            user: env::var("USER").unwrap_or_else(|_| "admin".to_string()),
            password: String::new(),
            enable: None,
            dialect: "cisco_ios".to_string(),
            timeout: 30,
        };

        let mut i = 1;
        while i < args.len() {
            let value = args.get(i + 1).cloned();
            match (args[i].as_str(), value) {
                ("--host" | "-h", Some(v)) => parsed.host = v,
                ("--port" | "-p", Some(v)) => parsed.port = v.parse().unwrap_or(22),
                ("--user" | "-u", Some(v)) => parsed.user = v,
                ("--password" | "-P", Some(v)) => parsed.password = v,
                ("--enable" | "-e", Some(v)) => parsed.enable = Some(v),
                ("--dialect" | "-d", Some(v)) => parsed.dialect = v,
                ("--timeout" | "-t", Some(v)) => parsed.timeout = v.parse().unwrap_or(30),
                ("--help", _) => {
                    println!(
                        "USAGE: ios_show_version --host <HOST> --user <USER> --password <PASS> \
                         [--enable <PASS>] [--dialect <NAME>] [--port <PORT>] [--timeout <SECS>]"
                    );
                    std::process::exit(0);
                }
                (other, _) => {
                    eprintln!("Unknown argument: {}", other);
                    i += 1;
                    continue;
                }
            }
            i += 2;
        }
        parsed
    }
}
