use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::error::{Result, TransportError};
use crate::traits::{LinkEvent, LinkListener, SerialLink};

/// In-memory serial link.
///
/// Stands in for a real USB/UART port in tests and CLI demos: sent frames
/// are recorded instead of written to hardware, and inbound traffic is
/// injected by the test driving the link.
#[derive(Default)]
pub struct LoopbackLink {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    listener: Option<Arc<dyn LinkListener>>,
    connected: bool,
    sent: Vec<Vec<u8>>,
    fail_sends: bool,
}

impl LoopbackLink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Deliver an event to the registered listener, as a real port's
    /// delivery thread would.
    pub fn inject(&self, event: LinkEvent) {
        let listener = self.state.lock().expect("loopback state").listener.clone();
        if let Some(listener) = listener {
            listener.on_event(event);
        }
    }

    /// Deliver inbound bytes as a `DataReceived` event.
    pub fn inject_bytes(&self, bytes: &[u8]) {
        self.inject(LinkEvent::DataReceived(bytes.to_vec()));
    }

    /// Frames recorded by [`SerialLink::send`], oldest first.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.state.lock().expect("loopback state").sent.clone()
    }

    /// Make subsequent sends fail with an I/O error.
    pub fn set_fail_sends(&self, fail: bool) {
        self.state.lock().expect("loopback state").fail_sends = fail;
    }
}

impl SerialLink for LoopbackLink {
    fn set_listener(&self, listener: Option<Arc<dyn LinkListener>>) {
        self.state.lock().expect("loopback state").listener = listener;
    }

    fn find_and_connect(&self) -> Result<()> {
        {
            let mut state = self.state.lock().expect("loopback state");
            if state.connected {
                debug!("loopback already connected");
                return Ok(());
            }
            state.connected = true;
        }
        self.inject(LinkEvent::DeviceAttached {
            device: "loopback0".to_string(),
        });
        Ok(())
    }

    fn disconnect(&self) {
        let was_connected = {
            let mut state = self.state.lock().expect("loopback state");
            std::mem::replace(&mut state.connected, false)
        };
        if was_connected {
            self.inject(LinkEvent::DeviceDetached);
        }
    }

    fn send(&self, bytes: &[u8]) -> Result<()> {
        let mut state = self.state.lock().expect("loopback state");
        if !state.connected {
            return Err(TransportError::NotConnected);
        }
        if state.fail_sends {
            return Err(TransportError::Io(std::io::Error::other(
                "loopback send failure",
            )));
        }
        state.sent.push(bytes.to_vec());
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.state.lock().expect("loopback state").connected
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Default)]
    struct CountingListener {
        attaches: AtomicUsize,
        detaches: AtomicUsize,
        bytes: Mutex<Vec<u8>>,
    }

    impl LinkListener for CountingListener {
        fn on_event(&self, event: LinkEvent) {
            match event {
                LinkEvent::DeviceAttached { .. } => {
                    self.attaches.fetch_add(1, Ordering::SeqCst);
                }
                LinkEvent::DeviceDetached => {
                    self.detaches.fetch_add(1, Ordering::SeqCst);
                }
                LinkEvent::DataReceived(data) => {
                    self.bytes.lock().unwrap().extend_from_slice(&data);
                }
                _ => {}
            }
        }
    }

    #[test]
    fn connect_emits_attach_once() {
        let link = LoopbackLink::new();
        let listener = Arc::new(CountingListener::default());
        link.set_listener(Some(listener.clone()));

        link.find_and_connect().unwrap();
        link.find_and_connect().unwrap();

        assert_eq!(listener.attaches.load(Ordering::SeqCst), 1);
        assert!(link.is_connected());
    }

    #[test]
    fn disconnect_is_idempotent() {
        let link = LoopbackLink::new();
        let listener = Arc::new(CountingListener::default());
        link.set_listener(Some(listener.clone()));

        link.find_and_connect().unwrap();
        link.disconnect();
        link.disconnect();

        assert_eq!(listener.detaches.load(Ordering::SeqCst), 1);
        assert!(!link.is_connected());
    }

    #[test]
    fn send_requires_connection() {
        let link = LoopbackLink::new();
        let err = link.send(&[0x01]).unwrap_err();
        assert!(matches!(err, TransportError::NotConnected));

        link.find_and_connect().unwrap();
        link.send(&[0x01, 0x02]).unwrap();
        assert_eq!(link.sent(), vec![vec![0x01, 0x02]]);
    }

    #[test]
    fn injected_bytes_reach_listener() {
        let link = LoopbackLink::new();
        let listener = Arc::new(CountingListener::default());
        link.set_listener(Some(listener.clone()));

        link.inject_bytes(&[0x20, 0xAB, 0xCD]);

        assert_eq!(*listener.bytes.lock().unwrap(), vec![0x20, 0xAB, 0xCD]);
    }

    #[test]
    fn forced_send_failure() {
        let link = LoopbackLink::new();
        link.find_and_connect().unwrap();
        link.set_fail_sends(true);
        assert!(matches!(
            link.send(&[0x00]),
            Err(TransportError::Io(_))
        ));
    }
}
