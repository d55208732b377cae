use confctl::{
    Command, Communicator, ConfCtlError, DeviceScript, EndpointConfig, ReadMode, SessionState,
    StreamTransport,
};
use std::time::Duration;
use tokio::time::Instant;

/// Pacing and response attribution tests, run on virtual time
#[cfg(test)]
mod timing_tests {
    use super::*;

    fn delayed_device() -> DeviceScript {
        DeviceScript::new()
            .banner("Hi, my name is : HDX\r\n")
            .reply_after(
                "getcallstate",
                Duration::from_millis(350),
                "CALLSTATE: ALERTING\r\n",
            )
            .reply("hangup all", "hanging up\r\n")
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_delay_late_reply_surfaces_on_next_command() {
        let (client, device) = tokio::io::duplex(4096);
        let _device = delayed_device().spawn_on(device);

        let endpoint = EndpointConfig::new("127.0.0.1")
            .with_timeout_ms(100)
            .with_read_mode(ReadMode::FixedDelay { deadline_ms: 200 });
        let communicator = Communicator::new(endpoint);
        communicator.open_with(StreamTransport::new(client)).await.unwrap();

        // Reply arrives 350ms after the write, the read window closes at 300ms
        let first = communicator.get_call_state().await.unwrap();
        assert!(first.is_empty());

        // ...so it is handed to the next command instead
        let second = communicator.hangup_all().await.unwrap();
        assert!(second.text().starts_with("CALLSTATE: ALERTING\r\n"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_delay_applies_both_pacing_delays() {
        let (client, device) = tokio::io::duplex(4096);
        let _device = DeviceScript::new()
            .banner("ready\r\n")
            .reply("hangup all", "hanging up\r\n")
            .spawn_on(device);

        let endpoint = EndpointConfig::new("127.0.0.1")
            .with_read_mode(ReadMode::FixedDelay { deadline_ms: 10_000 });
        let communicator = Communicator::new(endpoint);

        let started = Instant::now();
        communicator.open_with(StreamTransport::new(client)).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(2000));
        assert!(started.elapsed() < Duration::from_millis(2100));

        let started = Instant::now();
        let response = communicator.hangup_all().await.unwrap();
        assert_eq!(response.text(), "hanging up\r\n");
        assert!(started.elapsed() >= Duration::from_millis(4000));
        assert!(started.elapsed() < Duration::from_millis(4100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_quiescent_never_cross_attributes() {
        let (client, device) = tokio::io::duplex(4096);
        let _device = delayed_device().spawn_on(device);

        let endpoint = EndpointConfig::new("127.0.0.1").with_read_mode(ReadMode::Quiescent {
            idle_gap_ms: 100,
            deadline_ms: 2000,
        });
        let communicator = Communicator::new(endpoint);
        communicator.open_with(StreamTransport::new(client)).await.unwrap();

        let first = communicator.get_call_state().await.unwrap();
        assert_eq!(first.text(), "CALLSTATE: ALERTING\r\n");

        let second = communicator.hangup_all().await.unwrap();
        assert_eq!(second.text(), "hanging up\r\n");
    }

    #[tokio::test(start_paused = true)]
    async fn test_quiescent_read_is_bounded_by_deadline() {
        let (client, device) = tokio::io::duplex(4096);
        // Never answers getcallstate
        let _device = DeviceScript::new().banner("ready\r\n").spawn_on(device);

        let endpoint = EndpointConfig::new("127.0.0.1").with_read_mode(ReadMode::Quiescent {
            idle_gap_ms: 100,
            deadline_ms: 1500,
        });
        let communicator = Communicator::new(endpoint);
        communicator.open_with(StreamTransport::new(client)).await.unwrap();

        let started = Instant::now();
        let response = communicator.execute(Command::GetCallState).await.unwrap();
        assert!(response.is_empty());
        assert!(started.elapsed() >= Duration::from_millis(1500));
        assert!(started.elapsed() < Duration::from_millis(1600));
        assert_eq!(communicator.statistics().await.empty_responses, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_session_performs_no_io() {
        let (client, device) = tokio::io::duplex(4096);
        let device = DeviceScript::new().banner("ready\r\n").spawn_on(device);

        let communicator = Communicator::new(EndpointConfig::new("127.0.0.1"));
        communicator.open_with(StreamTransport::new(client)).await.unwrap();
        communicator.close().await.unwrap();
        assert_eq!(communicator.state().await, SessionState::Closed);

        let started = Instant::now();
        let result = communicator.reboot().await;
        assert!(matches!(result, Err(ConfCtlError::NotConnected)));
        // Fails immediately, without pacing
        assert!(started.elapsed() < Duration::from_millis(1));
        assert!(device.received_commands().await.is_empty());
    }
}
