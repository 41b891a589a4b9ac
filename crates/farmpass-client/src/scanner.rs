//! Camera lifecycle around the external QR decoding engine.
//!
//! [`Scanner`] owns at most one [`CameraSession`]. Every exit path releases
//! it: explicit stop, a successful decode, starting a new session, and drop.

use tracing::{debug, info, warn};

use farmpass_shared::{classify, ScanPayload, ValidationError};

use crate::error::CameraError;

/// Boundary to the platform's camera and decoder.
pub trait Camera {
    fn open(&mut self) -> Result<Box<dyn CameraSession>, CameraError>;
}

impl<C: Camera + ?Sized> Camera for Box<C> {
    fn open(&mut self) -> Result<Box<dyn CameraSession>, CameraError> {
        (**self).open()
    }
}

pub trait CameraSession {
    fn stop(&mut self) -> Result<(), CameraError>;
}

pub struct Scanner<C: Camera> {
    camera: C,
    active: Option<Box<dyn CameraSession>>,
}

impl<C: Camera> Scanner<C> {
    pub fn new(camera: C) -> Self {
        Self { camera, active: None }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Start decoding. An already running session is stopped first.
    pub fn start(&mut self) -> Result<(), CameraError> {
        self.stop();
        let session = self.camera.open()?;
        self.active = Some(session);
        info!("camera started");
        Ok(())
    }

    /// Idempotent; stop failures are logged, not returned.
    pub fn stop(&mut self) {
        if let Some(mut session) = self.active.take() {
            match session.stop() {
                Ok(()) => info!("camera stopped"),
                Err(e) => warn!(error = %e, "camera stop failed, session dropped"),
            }
        }
    }

    /// A frame decoded to `text`. The camera is released before the result
    /// is handed on; blank decodes are ignored and scanning continues.
    pub fn on_decoded(&mut self, text: &str) -> Option<ScanPayload> {
        if text.trim().is_empty() {
            debug!("ignoring blank decode");
            return None;
        }
        self.stop();
        let payload = classify(text);
        debug!(receipt = payload.is_receipt(), "decoded scan");
        Some(payload)
    }
}

impl<C: Camera> Drop for Scanner<C> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Typed-in code. Empty input never reaches the classifier.
pub fn manual_entry(raw: &str) -> Result<ScanPayload, ValidationError> {
    if raw.trim().is_empty() {
        return Err(ValidationError::EmptyCode);
    }
    Ok(classify(raw))
}
