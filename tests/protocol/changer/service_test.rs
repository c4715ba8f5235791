//! Changer service tests: one runner step at a time against a simulated bus.
mod helpers {
    include!("../../helpers/mod.rs");
}

use embassy_sync::{blocking_mutex::raw::NoopRawMutex, channel::Channel};
use helpers::{encode_frame, MockTimer, SimBus, SimClock, SimLine};
use korri_j1850::{
    core::{Frame, MAX_FRAME_LEN},
    protocol::{
        changer::{
            service::{BusStats, ChangerCommand, ChangerService, ServiceConfig, StepOutcome},
            CdChanger,
        },
        transport::vpw_bus::{VpwBus, VpwConfig},
    },
};

type Commands = Channel<NoopRawMutex, ChangerCommand, 4>;
type Heard = Channel<NoopRawMutex, Frame, 4>;

fn bus_on(sim: &SimBus) -> VpwBus<SimLine, SimClock> {
    VpwBus::new(sim.line(), sim.clock(), VpwConfig::default())
}

/// Decode every frame found in what `sim` transmitted.
fn decode_transmitted(sim: &SimBus) -> Vec<Vec<u8>> {
    let listener = SimBus::new();
    listener.script(&sim.transmitted_intervals(20));
    let mut rx = bus_on(&listener);
    let mut frames = Vec::new();
    let mut buffer = [0u8; MAX_FRAME_LEN];
    while let Ok(len) = rx.receive_timeout(&mut buffer) {
        frames.push(buffer[..len].to_vec());
    }
    frames
}

#[tokio::test]
/// A position query is answered with a single checksummed reply.
async fn test_position_query_answered() {
    let sim = SimBus::new();
    sim.script(&encode_frame(&[0x8D, 0x0F, 0x24, 0xE4], 20));
    let service = ChangerService::<_, _, _, _, NoopRawMutex, 4, 4>::new(
        bus_on(&sim),
        MockTimer,
        CdChanger::new(),
        ServiceConfig::default(),
        None,
        None,
    );
    let mut runner = service.into_parts().runner;

    assert_eq!(runner.step().await, StepOutcome::Handled { replies: 1 });
    assert_eq!(runner.handler().queries(), 1);
    assert_eq!(
        runner.stats(),
        BusStats {
            frames_received: 1,
            frames_sent: 1,
            ..BusStats::default()
        }
    );
    assert_eq!(decode_transmitted(&sim), vec![vec![0x8D, 0x94, 0x00, 0x00, 0xFD]]);
}

#[tokio::test]
/// A corrupted trailer is dropped before reaching the handler.
async fn test_bad_checksum_rejected() {
    let sim = SimBus::new();
    sim.script(&encode_frame(&[0x8D, 0x0F, 0x24, 0xE5], 20));
    let service = ChangerService::<_, _, _, _, NoopRawMutex, 4, 4>::new(
        bus_on(&sim),
        MockTimer,
        CdChanger::new(),
        ServiceConfig::default(),
        None,
        None,
    );
    let mut runner = service.into_parts().runner;

    assert_eq!(runner.step().await, StepOutcome::Rejected);
    assert_eq!(runner.handler().queries(), 0);
    assert_eq!(runner.stats().checksum_errors, 1);
    assert!(sim.trace().is_empty());
}

#[tokio::test]
/// With checksum checking disabled the same frame is answered.
async fn test_checksum_not_required() {
    let sim = SimBus::new();
    sim.script(&encode_frame(&[0x8D, 0x0F, 0x24, 0xE5], 20));
    let config = ServiceConfig {
        require_checksum: false,
        ..ServiceConfig::default()
    };
    let service = ChangerService::<_, _, _, _, NoopRawMutex, 4, 4>::new(
        bus_on(&sim),
        MockTimer,
        CdChanger::new(),
        config,
        None,
        None,
    );
    let mut runner = service.into_parts().runner;

    assert_eq!(runner.step().await, StepOutcome::Handled { replies: 1 });
}

#[tokio::test]
/// Frames heard on the bus are forwarded, including foreign ones.
async fn test_frames_forwarded_to_listener() {
    let foreign = Frame::with_checksum(&[0x48, 0x6B, 0x10]).unwrap();
    let sim = SimBus::new();
    sim.script(&encode_frame(foreign.as_bytes(), 20));
    let heard = Heard::new();
    let service = ChangerService::<_, _, _, _, NoopRawMutex, 4, 4>::new(
        bus_on(&sim),
        MockTimer,
        CdChanger::new(),
        ServiceConfig::default(),
        None,
        Some(&heard),
    );
    let parts = service.into_parts();
    let mut runner = parts.runner;
    let mut frames = parts.frames.expect("frame channel configured");

    assert_eq!(runner.step().await, StepOutcome::Handled { replies: 0 });
    assert_eq!(frames.try_recv(), Some(foreign));
    assert_eq!(frames.try_recv(), None);
    assert!(sim.trace().is_empty());
}

#[tokio::test]
/// A frame queued through the handle goes out on the next idle step.
async fn test_queued_payload_transmitted() {
    let sim = SimBus::new();
    let commands = Commands::new();
    let service = ChangerService::<_, _, _, _, NoopRawMutex, 4, 4>::new(
        bus_on(&sim),
        MockTimer,
        CdChanger::new(),
        ServiceConfig::default(),
        Some(&commands),
        None,
    );
    let parts = service.into_parts();
    let handle = parts.handle.expect("command channel configured");
    let mut runner = parts.runner;

    handle
        .send_payload(&[0x8D, 0x93, 0x01, 0x00, 0x00])
        .await
        .unwrap();
    assert_eq!(runner.step().await, StepOutcome::Command);
    assert_eq!(runner.stats().frames_sent, 1);
    assert_eq!(
        decode_transmitted(&sim),
        vec![vec![0x8D, 0x93, 0x01, 0x00, 0x00, 0xBE]]
    );
}

#[tokio::test]
async fn test_oversized_payload_refused() {
    let commands = Commands::new();
    let sim = SimBus::new();
    let service = ChangerService::<_, _, _, _, NoopRawMutex, 4, 4>::new(
        bus_on(&sim),
        MockTimer,
        CdChanger::new(),
        ServiceConfig::default(),
        Some(&commands),
        None,
    );
    let handle = service.into_parts().handle.unwrap();

    assert!(handle.send_payload(&[0u8; MAX_FRAME_LEN]).await.is_err());
    assert!(handle.send_payload(&[]).await.is_err());
    assert!(commands.is_empty());
}

#[tokio::test]
/// Without traffic or commands the step reports idle after the poll gap.
async fn test_idle_step() {
    let sim = SimBus::new();
    let commands = Commands::new();
    let service = ChangerService::<_, _, _, _, NoopRawMutex, 4, 4>::new(
        bus_on(&sim),
        MockTimer,
        CdChanger::new(),
        ServiceConfig::default(),
        Some(&commands),
        None,
    );
    let mut runner = service.into_parts().runner;

    assert_eq!(runner.step().await, StepOutcome::Idle);
    assert_eq!(runner.stats(), BusStats::default());
    assert!(sim.trace().is_empty());
}

#[tokio::test]
/// The multiplier set through the handle bounds how long a silent step listens.
async fn test_timeout_multiplier_command() {
    let sim = SimBus::new();
    let commands = Commands::new();
    let service = ChangerService::<_, _, _, _, NoopRawMutex, 4, 4>::new(
        bus_on(&sim),
        MockTimer,
        CdChanger::new(),
        ServiceConfig::default(),
        Some(&commands),
        None,
    );
    let parts = service.into_parts();
    let handle = parts.handle.unwrap();
    let mut runner = parts.runner;

    handle.set_timeout_multiplier(1).await;
    let started = sim.now();
    assert_eq!(runner.step().await, StepOutcome::Command);
    assert_eq!(runner.bus().timeout_multiplier(), 1);
    let default_round = sim.now() - started;
    assert!((100_000..=101_000).contains(&default_round), "listened {default_round} ticks");

    // One 4 ms step: 40 listen windows of 100 ticks.
    let started = sim.now();
    assert_eq!(runner.step().await, StepOutcome::Idle);
    let short_round = sim.now() - started;
    assert!((4_000..=4_100).contains(&short_round), "listened {short_round} ticks");

    handle.set_timeout_multiplier(3).await;
    runner.step().await;
    let started = sim.now();
    assert_eq!(runner.step().await, StepOutcome::Idle);
    let long_round = sim.now() - started;
    assert!((12_000..=12_300).contains(&long_round), "listened {long_round} ticks");
}

#[tokio::test]
/// A truncated SOF is counted and nothing is answered.
async fn test_bus_error_counted() {
    let sim = SimBus::new();
    sim.drive_remote(20, 100);
    let service = ChangerService::<_, _, _, _, NoopRawMutex, 4, 4>::new(
        bus_on(&sim),
        MockTimer,
        CdChanger::new(),
        ServiceConfig::default(),
        None,
        None,
    );
    let mut runner = service.into_parts().runner;

    assert_eq!(runner.step().await, StepOutcome::BusError);
    assert_eq!(runner.stats().bus_errors, 1);
    assert_eq!(runner.step().await, StepOutcome::Idle);
}
