//! # Ground command line
//!
//! Interactive client for the drone control server. Each line is parsed as a telecommand, sent to
//! the server, and the response printed once it arrives. `help` lists the telecommands, `exit`
//! leaves.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use color_eyre::{eyre::WrapErr, Result};
use rustyline::{error::ReadlineError, DefaultEditor};
use std::iter;
use std::path::PathBuf;
use structopt::StructOpt;

use comms_if::{
    net::{zmq, MonitoredSocket, NetParams, SocketOptions},
    tc::{Tc, TcResponse},
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

const PROMPT: &str = "drone $ ";
const HISTORY_FILE: &str = "gnd_cli_history.txt";

/// How long to wait for a response. Moves only complete once flown, so this is generous.
///
/// Units: milliseconds
const RESPONSE_TIMEOUT_MS: i32 = 120_000;

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {
    color_eyre::install()?;

    let net_params: NetParams =
        util::params::load("net.toml").wrap_err("Could not load net params")?;

    let ctx = zmq::Context::new();
    let socket = MonitoredSocket::new(
        &ctx,
        zmq::REQ,
        SocketOptions {
            block_on_first_connect: false,
            connect_timeout: 1000,
            linger: 1,
            recv_timeout: RESPONSE_TIMEOUT_MS,
            send_timeout: 1000,
            req_correlate: true,
            req_relaxed: true,
            ..Default::default()
        },
        &net_params.tc_client_endpoint,
    )
    .wrap_err("Could not create the TC socket")?;

    let mut rl = DefaultEditor::new().wrap_err("Could not start the line editor")?;
    let history_path = history_path();
    if rl.load_history(&history_path).is_err() {
        println!("No history detected");
    }

    println!("Connecting to {}", net_params.tc_client_endpoint);

    loop {
        let line = match rl.readline(PROMPT) {
            Ok(l) => l,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                println!("Unhandled Error: {:?}", e);
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        rl.add_history_entry(line).ok();

        if line == "exit" || line == "quit" {
            break;
        }

        let tc = match parse(line) {
            Ok(tc) => tc,
            // Also carries the help text
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        if !socket.connected() {
            println!("Not connected to the control server");
            continue;
        }

        match send(&socket, &tc) {
            Ok(r) => print_response(&r),
            Err(e) => println!("Error: {:#}", e),
        }
    }

    rl.save_history(&history_path).ok();

    println!("Exiting...");

    Ok(())
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn history_path() -> PathBuf {
    util::host::get_sw_root()
        .map(|root| root.join(HISTORY_FILE))
        .unwrap_or_else(|_| PathBuf::from(HISTORY_FILE))
}

/// Parse a command line into a telecommand.
fn parse(line: &str) -> std::result::Result<Tc, structopt::clap::Error> {
    Tc::from_iter_safe(iter::once("tc").chain(line.split_whitespace()))
}

/// Send a telecommand and wait for the response.
fn send(socket: &MonitoredSocket, tc: &Tc) -> Result<TcResponse> {
    let tc_str = tc.to_json().wrap_err("Could not serialize the TC")?;

    socket
        .send(&tc_str, 0)
        .wrap_err("Could not send the TC")?;

    let msg = socket
        .recv_string(0)
        .wrap_err("No response from the control server")?
        .map_err(|_| color_eyre::eyre::eyre!("The response was not valid UTF-8"))?;

    serde_json::from_str(&msg).wrap_err("Could not parse the response")
}

fn print_response(response: &TcResponse) {
    match response {
        TcResponse::Completed(c) if c.completed => println!("Completed"),
        TcResponse::Completed(c) => println!(
            "Failed: {}",
            c.error_description.as_deref().unwrap_or("no description")
        ),
        TcResponse::State(s) => match serde_json::to_string_pretty(&s.state) {
            Ok(s) => println!("{}", s),
            Err(_) => println!("{:?}", s.state),
        },
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::tc::{Direction, LimitKind};

    #[test]
    fn test_parse() {
        assert_eq!(
            parse("move forward 2.5").unwrap(),
            Tc::Move {
                direction: Direction::Forward,
                magnitude: 2.5
            }
        );
        assert_eq!(
            parse("set-limit angular_speed 45").unwrap(),
            Tc::SetLimit {
                limit: LimitKind::AngularSpeed,
                value: 45.0
            }
        );
        assert_eq!(
            parse("velocity 0.1 -0.2 0 -15").unwrap(),
            Tc::SetVelocity {
                x: 0.1,
                y: -0.2,
                z: 0.0,
                yaw_rate: -15.0
            }
        );
        assert!(parse("move sideways 1").is_err());
        assert!(parse("help").is_err());
    }
}
