//! CLI parsing and command execution against a scripted transport.

use clap::Parser;
use labstage::cli::{execute, Cli, Command};
use labstage_core::mock::MockTransport;
use labstage_driver_optosigma::Sbis26;
use std::sync::Arc;

fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
    Cli::try_parse_from(std::iter::once("labstage").chain(args.iter().copied()))
}

async fn stage_with(replies: &[&str]) -> (Sbis26, Arc<MockTransport>) {
    let mock = Arc::new(MockTransport::new().with_replies(replies.iter().copied()));
    let stage = Sbis26::with_transport(mock.clone()).await.unwrap();
    mock.clear_sent();
    (stage, mock)
}

#[test]
fn parses_subcommands_and_global_flags() {
    let cli = parse(&["move", "2", "-5000", "--port", "COM4", "--baud", "9600"]).unwrap();
    assert_eq!(cli.command, Command::Move { axis: 2, position: -5000 });

    let overrides = cli.overrides();
    assert_eq!(overrides.port.as_deref(), Some("COM4"));
    assert_eq!(overrides.baud_rate, Some(9600));
    assert_eq!(overrides.log_level, None);

    let cli = parse(&["--log-level", "debug", "speed", "1", "1000", "2000", "50"]).unwrap();
    assert_eq!(
        cli.command,
        Command::Speed {
            axis: 1,
            speed: 1000,
            range: 2000,
            acceleration: 50
        }
    );
    assert_eq!(cli.log_level.as_deref(), Some("debug"));

    assert_eq!(parse(&["move-rel", "3", "-10"]).unwrap().command, Command::MoveRel { axis: 3, delta: -10 });
    assert_eq!(parse(&["stop"]).unwrap().command, Command::Stop);
}

#[test]
fn rejects_bad_axis_numbers() {
    assert!(parse(&["home", "0"]).is_err());
    assert!(parse(&["home", "4"]).is_err());
    assert!(parse(&["status", "x"]).is_err());
    assert!(parse(&["position"]).is_err());
}

#[tokio::test]
async fn executes_queries() {
    let (stage, mock) = stage_with(&["3", "Q,2,-1500", "C,1,K,K,K,B", "C,3,K,C,K,R"]).await;

    assert_eq!(execute(&stage, &Command::Count).await.unwrap(), "3");
    assert_eq!(execute(&stage, &Command::Position { axis: 2 }).await.unwrap(), "-1500");
    assert_eq!(execute(&stage, &Command::Status { axis: 1 }).await.unwrap(), "B");

    let report = execute(&stage, &Command::Report { axis: 3 }).await.unwrap();
    assert!(report.ends_with("(LimitCw)"), "{report}");

    assert_eq!(mock.sent(), vec!["CONNECT?", "Q:D,2", "SRQ:D,1", "SRQ:D,3"]);
}

#[tokio::test]
async fn ng_is_marked_but_not_an_error() {
    let (stage, mock) = stage_with(&["D,1,NG"]).await;

    let out = execute(
        &stage,
        &Command::Speed {
            axis: 1,
            speed: 1000,
            range: 2000,
            acceleration: 50,
        },
    )
    .await
    .unwrap();
    assert_eq!(out, "D,1,NG [NG]");

    let out = execute(
        &stage,
        &Command::Speed {
            axis: 1,
            speed: 0,
            range: 2000,
            acceleration: 50,
        },
    )
    .await
    .unwrap();
    assert_eq!(out, "NG [NG]");
    assert_eq!(mock.sent(), vec!["D:D,1,+1000,2000,50"]);
}

#[tokio::test]
async fn motion_commands_wait_then_print_reply() {
    let (stage, mock) = stage_with(&["C,2,K,K,K,R", "OK", "OK"]).await;

    assert_eq!(execute(&stage, &Command::Home { axis: 2 }).await.unwrap(), "OK");
    assert_eq!(execute(&stage, &Command::Stop).await.unwrap(), "OK");
    assert_eq!(mock.sent(), vec!["H:D,2", "SRQ:D,2", "LE:A"]);
}

#[tokio::test]
async fn transport_errors_fail_the_command() {
    let (stage, _mock) = stage_with(&[]).await;

    assert!(execute(&stage, &Command::Init).await.is_err());
}
