//! Mock port environment for tests and hardware-free development.

use super::{CecSession, ComPortHandle, PortEnvironment};
use crate::comspec::DriverComSpec;
use crate::error::{BridgeError, BridgeResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// A COM port that records the spec applied to it.
pub struct MockComPort {
    name: String,
    needs_registration: bool,
    fail_registration: bool,
    registered: AtomicBool,
    applied_spec: Mutex<Option<DriverComSpec>>,
}

impl MockComPort {
    /// Creates a port that never needs registration.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            needs_registration: false,
            fail_registration: false,
            registered: AtomicBool::new(false),
            applied_spec: Mutex::new(None),
        }
    }

    /// Marks the port as owned by the control system, so it must register
    /// before use.
    pub fn requiring_registration(mut self) -> Self {
        self.needs_registration = true;
        self
    }

    /// Makes the one-time registration fail.
    pub fn failing_registration(mut self) -> Self {
        self.needs_registration = true;
        self.fail_registration = true;
        self
    }

    /// Whether [`ComPortHandle::register`] succeeded on this port.
    pub fn is_registered(&self) -> bool {
        self.registered.load(Ordering::SeqCst)
    }

    /// The last spec applied via [`ComPortHandle::apply_spec`].
    pub fn applied_spec(&self) -> Option<DriverComSpec> {
        *self
            .applied_spec
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl ComPortHandle for MockComPort {
    fn name(&self) -> &str {
        &self.name
    }

    fn needs_registration(&self) -> bool {
        self.needs_registration
    }

    fn register(&self) -> BridgeResult<()> {
        if self.fail_registration {
            return Err(BridgeError::PortRegistration {
                port: self.name.clone(),
                reason: "simulated registration failure".to_string(),
            });
        }
        self.registered.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn apply_spec(&self, spec: &DriverComSpec) -> BridgeResult<()> {
        let mut guard = self
            .applied_spec
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = Some(*spec);
        Ok(())
    }
}

/// A command-bus session that records whether it was started.
pub struct MockCecSession {
    started: AtomicBool,
}

impl MockCecSession {
    /// Creates an unstarted session.
    pub fn new() -> Self {
        Self {
            started: AtomicBool::new(false),
        }
    }

    /// Whether [`CecSession::start`] ran.
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }
}

impl Default for MockCecSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CecSession for MockCecSession {
    fn start(&self) -> BridgeResult<()> {
        self.started.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Port environment handing out pre-seeded mock ports and sessions.
pub struct MockPortEnvironment {
    ports: Mutex<Vec<Arc<MockComPort>>>,
    session: Arc<MockCecSession>,
}

impl MockPortEnvironment {
    /// Creates an environment with no seeded ports; ports are created on
    /// demand with no registration requirement.
    pub fn new() -> Self {
        Self {
            ports: Mutex::new(Vec::new()),
            session: Arc::new(MockCecSession::new()),
        }
    }

    /// Seeds a specific port so tests can pre-shape registration behavior
    /// and inspect it afterwards.
    pub fn with_port(self, port: Arc<MockComPort>) -> Self {
        self.ports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(port);
        self
    }

    /// The shared CEC session handed to callers.
    pub fn cec_session(&self) -> Arc<MockCecSession> {
        Arc::clone(&self.session)
    }
}

impl Default for MockPortEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl PortEnvironment for MockPortEnvironment {
    fn acquire_com_port(&self, name: &str) -> BridgeResult<Arc<dyn ComPortHandle>> {
        let mut ports = self.ports.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(port) = ports.iter().find(|p| p.name() == name) {
            return Ok(Arc::clone(port) as Arc<dyn ComPortHandle>);
        }
        let port = Arc::new(MockComPort::new(name));
        ports.push(Arc::clone(&port));
        Ok(port)
    }

    fn acquire_cec_session(&self) -> BridgeResult<Arc<dyn CecSession>> {
        Ok(Arc::clone(&self.session) as Arc<dyn CecSession>)
    }
}
