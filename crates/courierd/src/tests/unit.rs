//! Unit tests for the bootstrap and lifecycle wiring.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use courier_config::Config;
use courier_wire::{Client, ClientError, Failure, Request, Response};
use rstest::rstest;

use crate::bootstrap::{StaticConfigLoader, bootstrap_with};
use crate::service::echo_dispatcher;

use super::support::{
    HealthEvent, RecordingHealthReporter, ServerWorld, TestConfigLoader, faulty_dispatcher,
    is_server_close,
};

#[rstest]
fn bootstrap_binds_before_serving() {
    let reporter = Arc::new(RecordingHealthReporter::default());
    let dispatcher = echo_dispatcher().expect("echo dispatcher");
    let daemon = match bootstrap_with(&TestConfigLoader::new(), reporter.clone(), dispatcher) {
        Ok(daemon) => daemon,
        Err(error) => panic!("bootstrap should succeed: {error}"),
    };

    assert_ne!(daemon.local_addr().port(), 0);
    assert!(
        !reporter
            .events()
            .iter()
            .any(|event| matches!(event, HealthEvent::ServerListening(_))),
        "nothing is served until the daemon starts"
    );
}

#[rstest]
fn static_loader_returns_its_configuration() {
    let config = Config {
        listen_host: "127.0.0.1".to_owned(),
        listen_port: 0,
        ..Config::default()
    };
    let reporter = Arc::new(RecordingHealthReporter::default());
    let dispatcher = echo_dispatcher().expect("echo dispatcher");
    let daemon = match bootstrap_with(&StaticConfigLoader::new(config.clone()), reporter, dispatcher)
    {
        Ok(daemon) => daemon,
        Err(error) => panic!("bootstrap should succeed: {error}"),
    };
    assert_eq!(daemon.config(), &config);
}

#[rstest]
fn running_daemon_reports_listening_and_stopping() {
    let reporter = Arc::new(RecordingHealthReporter::default());
    let dispatcher = faulty_dispatcher();
    let Ok(daemon) = bootstrap_with(&TestConfigLoader::new(), reporter.clone(), dispatcher) else {
        panic!("bootstrap should succeed");
    };
    let Ok(running) = daemon.start() else {
        panic!("daemon should start");
    };
    let addr = running.local_addr();

    let mut client = Client::connect(addr).expect("connect");
    let response = client.call(&Request::new("explode")).expect("call");
    assert_eq!(response, Response::failure(Failure::InvocationFailed));

    running.shutdown().expect("shutdown");
    let events = reporter.events();
    assert!(events.contains(&HealthEvent::ServerListening(addr)));
    assert_eq!(events.last(), Some(&HealthEvent::ServerStopped(addr)));
}

#[rstest]
#[case::closed(ClientError::Closed, true)]
#[case::reset(ClientError::Io(io::ErrorKind::ConnectionReset.into()), true)]
#[case::timed_out(ClientError::Io(io::ErrorKind::TimedOut.into()), false)]
#[case::would_block(ClientError::Io(io::ErrorKind::WouldBlock.into()), false)]
fn only_peer_closes_count_as_server_close(#[case] error: ClientError, #[case] expected: bool) {
    assert_eq!(is_server_close(&error), expected);
}

#[rstest]
fn idle_open_connection_is_not_reported_closed() {
    let mut world = ServerWorld::default();
    world
        .start(echo_dispatcher().expect("echo dispatcher"))
        .expect("start");
    world
        .connect_with_timeout("idle", Duration::from_millis(200))
        .expect("connect");

    assert!(
        world.expect_closed("idle").is_err(),
        "a read timeout on an open connection must not pass as a close"
    );
}
