use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use baflink_proto::{Encoding, FrameDecoder, Message};
use baflink_transport::{LinkEvent, LinkListener, SerialLink};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{MonitorError, Result};
use crate::poller::{PollConfig, PollContext, Poller};
use crate::status::LinkStatus;

/// Monitor configuration.
#[derive(Debug, Clone, Default)]
pub struct MonitorConfig {
    /// Request wire-encoding mode used for all outgoing frames.
    pub encoding: Encoding,
    /// Poll scheduling knobs.
    pub poll: PollConfig,
}

/// Bridges the raw serial link and typed display messages.
///
/// Consumes [`LinkEvent`]s, feeds received bytes through the
/// [`FrameDecoder`], tracks the connection lifecycle, and publishes four
/// live streams: link status, latest decoded message, latest error, and an
/// echo of the latest sent request. Each stream always has a current value
/// and broadcasts changes to any number of observers.
pub struct DisplayMonitor {
    link: Arc<dyn SerialLink>,
    config: MonitorConfig,
    decoder: Mutex<FrameDecoder>,
    bound: AtomicBool,
    status_tx: watch::Sender<LinkStatus>,
    received_tx: watch::Sender<Message>,
    error_tx: watch::Sender<Message>,
    sent_tx: watch::Sender<Message>,
    poller: Poller,
}

impl DisplayMonitor {
    pub fn new(link: Arc<dyn SerialLink>, config: MonitorConfig) -> Arc<Self> {
        Arc::new(Self {
            link,
            config,
            decoder: Mutex::new(FrameDecoder::new()),
            bound: AtomicBool::new(false),
            status_tx: watch::Sender::new(LinkStatus::ServiceUnbound),
            received_tx: watch::Sender::new(Message::NoOp),
            error_tx: watch::Sender::new(Message::NoOp),
            sent_tx: watch::Sender::new(Message::NoOp),
            poller: Poller::new(),
        })
    }

    /// Bind to the link service and start device discovery.
    pub fn start_monitoring(self: &Arc<Self>) {
        debug!("binding link service");
        self.link
            .set_listener(Some(self.clone() as Arc<dyn LinkListener>));
        self.bound.store(true, Ordering::SeqCst);
        self.set_status(LinkStatus::ServiceBound);
        if let Err(err) = self.link.find_and_connect() {
            warn!(%err, "initial connect attempt failed");
        }
    }

    /// Unbind from the link service. Stops polling; safe to call when not
    /// bound.
    pub fn stop_monitoring(&self) {
        self.stop_polling();
        if self.bound.swap(false, Ordering::SeqCst) {
            debug!("unbinding link service");
            self.link.set_listener(None);
            self.set_status(LinkStatus::ServiceUnbound);
        }
    }

    /// Trigger device discovery on the bound link.
    ///
    /// Calling this before [`start_monitoring`][Self::start_monitoring] is
    /// a reported error and leaves the status unchanged.
    pub fn find_and_connect(&self) -> Result<()> {
        if !self.bound.load(Ordering::SeqCst) {
            warn!("cannot connect: service not bound");
            return Err(MonitorError::NotBound);
        }
        if !self.status_tx.borrow().can_connect() {
            debug!("connect ignored, already connected");
            return Ok(());
        }
        self.link.find_and_connect()?;
        Ok(())
    }

    /// Disconnect from the current device. Idempotent.
    pub fn disconnect(&self) {
        if self.bound.load(Ordering::SeqCst) {
            self.link.disconnect();
        }
        self.stop_polling();
    }

    /// Encode `message` with the configured mode and send it.
    ///
    /// On success the message is echoed on the sent stream. A send may race
    /// a disconnect; that surfaces as a transport error, not a crash.
    pub fn send_read_request(&self, message: &Message) -> Result<()> {
        if !self.bound.load(Ordering::SeqCst) {
            warn!("cannot send: service not bound");
            return Err(MonitorError::NotBound);
        }
        let bytes = message.to_bytes(self.config.encoding);
        self.link.send(&bytes)?;
        debug!(frame = %hex::encode(&bytes), "sent request");
        self.sent_tx.send_replace(message.clone());
        Ok(())
    }

    /// Start polling `request` every `interval` while connected.
    ///
    /// At most one poll task runs; a duplicate start reports success
    /// without spawning another. Waits (bounded by the configured retry
    /// budget) for the link to connect first, and fails the call if the
    /// budget runs out. A running task skips ticks while disconnected but
    /// only [`stop_polling`][Self::stop_polling] ends it.
    pub async fn start_polling(&self, request: Message, interval: Duration) -> Result<()> {
        let ctx = PollContext {
            link: self.link.clone(),
            status: self.status_tx.subscribe(),
            sent_tx: self.sent_tx.clone(),
            request,
            encoding: self.config.encoding,
        };
        let config = PollConfig {
            interval,
            ..self.config.poll.clone()
        };
        self.poller.start(ctx, &config).await
    }

    /// Cancel the poll task. Idempotent.
    pub fn stop_polling(&self) {
        self.poller.stop();
    }

    pub fn is_polling(&self) -> bool {
        self.poller.is_active()
    }

    /// Current link status plus change stream.
    pub fn status(&self) -> watch::Receiver<LinkStatus> {
        self.status_tx.subscribe()
    }

    /// Latest decoded message plus change stream. Starts at
    /// [`Message::NoOp`].
    pub fn received(&self) -> watch::Receiver<Message> {
        self.received_tx.subscribe()
    }

    /// Latest error message plus change stream.
    pub fn errors(&self) -> watch::Receiver<Message> {
        self.error_tx.subscribe()
    }

    /// Echo of the latest successfully sent request.
    pub fn sent(&self) -> watch::Receiver<Message> {
        self.sent_tx.subscribe()
    }

    fn set_status(&self, status: LinkStatus) {
        info!(%status, "link status");
        self.status_tx.send_replace(status);
    }

    fn on_data(&self, data: &[u8]) {
        let messages = self
            .decoder
            .lock()
            .expect("frame decoder")
            .ingest(data);
        for message in messages {
            match message {
                Message::ProcessingError { .. } => {
                    self.error_tx.send_replace(message);
                }
                other => {
                    self.received_tx.send_replace(other);
                }
            }
        }
    }
}

impl LinkListener for DisplayMonitor {
    fn on_event(&self, event: LinkEvent) {
        match event {
            LinkEvent::DataReceived(data) => self.on_data(&data),
            LinkEvent::DeviceAttached { device } => {
                info!(device, "device attached");
                self.set_status(LinkStatus::Connected { device });
            }
            LinkEvent::DeviceDetached => {
                info!("device detached");
                self.set_status(LinkStatus::Disconnected);
                self.stop_polling();
            }
            LinkEvent::ConnectionError(message) => {
                warn!(message, "connection error");
                self.set_status(LinkStatus::Error { message });
                self.stop_polling();
            }
            LinkEvent::ReadError(err) => {
                warn!(%err, "read error");
                self.set_status(LinkStatus::Error {
                    message: format!("read error: {err}"),
                });
                self.error_tx.send_replace(Message::ProcessingError {
                    message: err.to_string(),
                });
            }
            LinkEvent::WriteError(err) => {
                // The send call's own result already gave the caller
                // immediate feedback; surface it for observers too.
                warn!(%err, "write error");
                self.error_tx.send_replace(Message::ProcessingError {
                    message: err.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use baflink_proto::FwVersion;
    use baflink_transport::LoopbackLink;

    use super::*;

    fn quick_poll_config() -> MonitorConfig {
        MonitorConfig {
            encoding: Encoding::Plain,
            poll: PollConfig {
                interval: Duration::from_millis(10),
                connect_retries: 3,
                retry_interval: Duration::from_millis(5),
            },
        }
    }

    #[tokio::test]
    async fn starts_unbound_with_noop_streams() {
        let link = LoopbackLink::new();
        let monitor = DisplayMonitor::new(link, MonitorConfig::default());

        assert_eq!(*monitor.status().borrow(), LinkStatus::ServiceUnbound);
        assert_eq!(*monitor.received().borrow(), Message::NoOp);
        assert_eq!(*monitor.errors().borrow(), Message::NoOp);
        assert_eq!(*monitor.sent().borrow(), Message::NoOp);
    }

    #[tokio::test]
    async fn connect_while_unbound_fails_without_state_change() {
        let link = LoopbackLink::new();
        let monitor = DisplayMonitor::new(link, MonitorConfig::default());

        let err = monitor.find_and_connect().unwrap_err();
        assert!(matches!(err, MonitorError::NotBound));
        assert_eq!(*monitor.status().borrow(), LinkStatus::ServiceUnbound);
    }

    #[tokio::test]
    async fn bind_connects_and_detach_disconnects() {
        let link = LoopbackLink::new();
        let monitor = DisplayMonitor::new(link.clone(), MonitorConfig::default());

        monitor.start_monitoring();
        assert_eq!(
            *monitor.status().borrow(),
            LinkStatus::Connected {
                device: "loopback0".into()
            }
        );

        link.inject(LinkEvent::DeviceDetached);
        assert_eq!(*monitor.status().borrow(), LinkStatus::Disconnected);
    }

    #[tokio::test]
    async fn stop_monitoring_unbinds() {
        let link = LoopbackLink::new();
        let monitor = DisplayMonitor::new(link.clone(), MonitorConfig::default());

        monitor.start_monitoring();
        monitor.stop_monitoring();
        assert_eq!(*monitor.status().borrow(), LinkStatus::ServiceUnbound);

        // Listener is gone: further events change nothing.
        link.inject_bytes(&[0x20, 0x01, 0x02]);
        assert_eq!(*monitor.received().borrow(), Message::NoOp);
    }

    #[tokio::test]
    async fn received_bytes_become_typed_messages() {
        let link = LoopbackLink::new();
        let monitor = DisplayMonitor::new(link.clone(), MonitorConfig::default());
        monitor.start_monitoring();

        // Firmware response split across two deliveries.
        link.inject_bytes(&[0x01, 0x01, 0x02, 0x03]);
        assert_eq!(*monitor.received().borrow(), Message::NoOp);

        link.inject_bytes(&[0x04, 0x05, 0xAA, 0xBB]);
        assert_eq!(
            *monitor.received().borrow(),
            Message::FirmwareVersion(FwVersion {
                major: 2,
                minor: 3,
                patch: 4
            })
        );
        assert_eq!(*monitor.errors().borrow(), Message::NoOp);
    }

    #[tokio::test]
    async fn read_error_updates_status_and_error_stream() {
        let link = LoopbackLink::new();
        let monitor = DisplayMonitor::new(link.clone(), MonitorConfig::default());
        monitor.start_monitoring();

        link.inject(LinkEvent::ReadError(std::io::Error::other("port gone")));

        assert!(matches!(
            &*monitor.status().borrow(),
            LinkStatus::Error { message } if message.contains("port gone")
        ));
        assert!(matches!(
            &*monitor.errors().borrow(),
            Message::ProcessingError { message } if message.contains("port gone")
        ));
    }

    #[tokio::test]
    async fn send_echoes_on_sent_stream() {
        let link = LoopbackLink::new();
        let monitor = DisplayMonitor::new(link.clone(), MonitorConfig::default());
        monitor.start_monitoring();

        monitor
            .send_read_request(&Message::FirmwareVersionRequest)
            .unwrap();

        assert_eq!(link.sent(), vec![vec![0x01, 0x01, 0x02]]);
        assert_eq!(*monitor.sent().borrow(), Message::FirmwareVersionRequest);
    }

    #[tokio::test]
    async fn send_while_unbound_is_rejected() {
        let link = LoopbackLink::new();
        let monitor = DisplayMonitor::new(link, MonitorConfig::default());

        let err = monitor
            .send_read_request(&Message::SpeedRequest)
            .unwrap_err();
        assert!(matches!(err, MonitorError::NotBound));
    }

    #[tokio::test]
    async fn duplicate_start_polling_is_a_successful_noop() {
        let link = LoopbackLink::new();
        let monitor = DisplayMonitor::new(link.clone(), quick_poll_config());
        monitor.start_monitoring();

        let interval = Duration::from_millis(10);
        monitor
            .start_polling(Message::SpeedRequest, interval)
            .await
            .unwrap();
        monitor
            .start_polling(Message::SpeedRequest, interval)
            .await
            .unwrap();
        assert!(monitor.is_polling());

        tokio::time::sleep(Duration::from_millis(60)).await;
        let sent = link.sent();
        assert!(!sent.is_empty());
        assert!(sent.iter().all(|frame| frame == &vec![0x11, 0x20]));
        assert_eq!(*monitor.sent().borrow(), Message::SpeedRequest);

        monitor.stop_polling();
    }

    #[tokio::test]
    async fn stop_polling_halts_sends() {
        let link = LoopbackLink::new();
        let monitor = DisplayMonitor::new(link.clone(), quick_poll_config());
        monitor.start_monitoring();

        monitor
            .start_polling(Message::SpeedRequest, Duration::from_millis(10))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;

        monitor.stop_polling();
        monitor.stop_polling(); // idempotent
        tokio::time::sleep(Duration::from_millis(30)).await;

        let after_stop = link.sent().len();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(link.sent().len(), after_stop);
        assert!(!monitor.is_polling());
    }

    #[tokio::test]
    async fn start_polling_times_out_when_never_connected() {
        let link = LoopbackLink::new();
        let monitor = DisplayMonitor::new(link.clone(), quick_poll_config());
        monitor.start_monitoring();
        link.inject(LinkEvent::DeviceDetached);

        let err = monitor
            .start_polling(Message::SpeedRequest, Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(matches!(err, MonitorError::ConnectWaitTimeout { .. }));
        assert!(!monitor.is_polling());
    }

    #[tokio::test]
    async fn detach_stops_active_poller() {
        let link = LoopbackLink::new();
        let monitor = DisplayMonitor::new(link.clone(), quick_poll_config());
        monitor.start_monitoring();

        monitor
            .start_polling(Message::SpeedRequest, Duration::from_millis(10))
            .await
            .unwrap();
        assert!(monitor.is_polling());

        link.inject(LinkEvent::DeviceDetached);
        assert!(!monitor.is_polling());

        tokio::time::sleep(Duration::from_millis(30)).await;
        let after_detach = link.sent().len();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(link.sent().len(), after_detach);
    }

    #[tokio::test]
    async fn failed_sends_do_not_kill_the_poll_loop() {
        let link = LoopbackLink::new();
        let monitor = DisplayMonitor::new(link.clone(), quick_poll_config());
        monitor.start_monitoring();

        monitor
            .start_polling(Message::SpeedRequest, Duration::from_millis(10))
            .await
            .unwrap();

        link.set_fail_sends(true);
        tokio::time::sleep(Duration::from_millis(40)).await;
        let during_failure = link.sent().len();

        link.set_fail_sends(false);
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(link.sent().len() > during_failure);

        monitor.stop_polling();
    }
}
