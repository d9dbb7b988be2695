//! SBIS26 over a framed byte link, with a scripted device on the far end.

use labstage_core::mock_serial::{self, MockDevice};
use labstage_core::LineTransport;
use labstage_driver_optosigma::{
    AxisState, NullObserver, PollSettings, Reply, Sbis26, StageError,
};
use std::sync::Arc;
use std::time::Duration;

const BATCH_DEFAULT: &str = "D:B,1,200000,200000,100,2,200000,200000,100,3,200000,200000,100";

fn fast_poll() -> PollSettings {
    PollSettings {
        interval: Duration::from_millis(5),
        timeout: Duration::from_secs(2),
    }
}

async fn open_stage() -> (Sbis26, MockDevice) {
    open_stage_with_timeout(Duration::from_millis(500)).await
}

async fn open_stage_with_timeout(read_timeout: Duration) -> (Sbis26, MockDevice) {
    let (port, mut device) = mock_serial::pair();
    let transport = LineTransport::new(port).with_read_timeout(read_timeout);
    let opening = tokio::spawn(async move {
        device.expect_line(BATCH_DEFAULT).await;
        device
    });
    let stage = Sbis26::open(Arc::new(transport), Arc::new(NullObserver), fast_poll())
        .await
        .unwrap();
    (stage, opening.await.unwrap())
}

#[tokio::test]
async fn move_polls_over_the_wire() {
    let (stage, mut device) = open_stage().await;

    let script = tokio::spawn(async move {
        device.expect_line("A:D,2,+5000").await;
        device.expect_and_reply("SRQ:D,2", "C,2,K,K,K,B").await;
        device.expect_and_reply("SRQ:D,2", "C,2,K,K,K,R").await;
        device.reply("OK").await;
        device
    });

    let reply = stage.axis(2).unwrap().move_to(5000).await.unwrap();
    assert_eq!(reply, Reply::Ok("OK".into()));
    script.await.unwrap();
}

#[tokio::test]
async fn setup_queries_over_the_wire() {
    let (stage, mut device) = open_stage().await;

    let script = tokio::spawn(async move {
        device.expect_and_reply("CONNECT?", "3").await;
        device.expect_and_reply("#CONNECT:", "OK").await;
        device.expect_and_reply("Q:D,1", "Q,1,-2500").await;
        device.expect_and_reply("SRQ:D,3", "C,3,K,K,E,R").await;
        device.expect_and_reply("D:D,1,+1000,2000,50", "D,1,NG").await;
        device
    });

    assert_eq!(stage.count_devices().await.unwrap(), 3);
    assert!(stage.initialize().await.unwrap().is_ok());
    assert_eq!(stage.axis(1).unwrap().position().await.unwrap(), -2500);

    let report = stage.axis(3).unwrap().report().await.unwrap();
    assert_eq!(report.state(), AxisState::HardwareAlarm);

    let reply = stage.axis(1).unwrap().set_speed(1000, 2000, 50).await.unwrap();
    assert!(reply.is_not_good());

    script.await.unwrap();
}

#[tokio::test]
async fn silent_device_times_out() {
    let (stage, _device) = open_stage().await;

    let err = stage.count_devices().await.unwrap_err();
    assert!(matches!(err, StageError::Transport(ref e) if e.is_timeout()));
}

#[tokio::test]
async fn hung_up_device_is_disconnected() {
    let (stage, device) = open_stage().await;
    drop(device);

    let err = stage.axis(1).unwrap().position().await.unwrap_err();
    assert!(err.is_transport());
}

#[tokio::test]
async fn late_reply_does_not_answer_the_next_query() {
    let (stage, mut device) = open_stage_with_timeout(Duration::from_millis(100)).await;
    let stage = Arc::new(stage);

    let err = stage.axis(1).unwrap().position().await.unwrap_err();
    assert!(matches!(err, StageError::Transport(ref e) if e.is_timeout()));

    // The controller answers axis 1 after the host has given up on it.
    device.expect_line("Q:D,1").await;
    device.reply("Q,1,+100").await;

    let host = tokio::spawn({
        let stage = stage.clone();
        async move { stage.axis(2)?.position().await }
    });
    device.expect_and_reply("Q:D,2", "Q,2,+999").await;

    assert_eq!(host.await.unwrap().unwrap(), 999);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_callers_get_their_own_replies() {
    let (stage, mut device) = open_stage().await;
    let stage = Arc::new(stage);

    // Status and the final move reply go out back to back, so a query
    // slipped in between them would read the move's "OK".
    let script = tokio::spawn(async move {
        let mut seen = Vec::new();
        for _ in 0..3 {
            let line = device.next_line().await;
            match line.as_str() {
                "A:D,2,+5000" => {}
                "SRQ:D,2" => {
                    device.reply("C,2,K,K,K,R").await;
                    device.reply("OK").await;
                }
                "CONNECT?" => device.reply("3").await,
                other => panic!("unexpected command {other:?}"),
            }
            seen.push(line);
        }
        seen
    });

    let mover = tokio::spawn({
        let stage = stage.clone();
        async move { stage.axis(2)?.move_to(5000).await }
    });
    let counter = tokio::spawn({
        let stage = stage.clone();
        async move { stage.count_devices().await }
    });

    assert_eq!(mover.await.unwrap().unwrap(), Reply::Ok("OK".into()));
    assert_eq!(counter.await.unwrap().unwrap(), 3);

    let seen = script.await.unwrap();
    let move_at = seen.iter().position(|l| l == "A:D,2,+5000").unwrap();
    assert_eq!(seen[move_at + 1], "SRQ:D,2", "a command landed inside the move: {seen:?}");
}
