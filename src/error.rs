// src/error.rs
//! Unified error handling for scope acquisition
//!
//! Every component funnels its failures into [`AcqError`] so the owner of a
//! session sees one error type regardless of whether a failure came from
//! configuration, the instrument driver, or the worker thread. Each variant
//! carries an [`ErrorContext`] recording where and on which thread it happened.

use crate::config::ConfigError;
use crate::hal::{DeviceError, DeviceType};
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;
use std::time::SystemTime;

/// Crate-wide error type
#[derive(Debug, Clone)]
pub enum AcqError {
    /// Setup failed before any sample was acquired
    Configuration {
        component: String,
        reason: String,
        context: ErrorContext,
    },

    /// The instrument reported a failure
    Device {
        device_type: DeviceType,
        error: Arc<dyn Error + Send + Sync>,
        context: ErrorContext,
    },

    /// Caller supplied data that violates a contract
    InvalidData {
        data_type: String,
        reason: String,
        expected: Option<String>,
        actual: Option<String>,
        context: ErrorContext,
    },

    /// Worker thread ended abnormally (panic or lost handle)
    Worker {
        reason: String,
        context: ErrorContext,
    },

    /// Operating system level failures (thread spawn, IO)
    System {
        subsystem: String,
        error_code: Option<i32>,
        reason: String,
        context: ErrorContext,
    },
}

/// Error context for debugging and analysis
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub timestamp: SystemTime,
    pub thread_id: Option<String>,
    pub component: String,
    pub operation: String,
    pub file: Option<&'static str>,
    pub line: Option<u32>,
    pub additional_info: HashMap<String, String>,
    pub chain: Vec<String>,
}

impl ErrorContext {
    /// Create a new error context
    pub fn new(component: &str, operation: &str) -> Self {
        Self {
            timestamp: SystemTime::now(),
            thread_id: Self::current_thread_id(),
            component: component.to_string(),
            operation: operation.to_string(),
            file: None,
            line: None,
            additional_info: HashMap::new(),
            chain: Vec::new(),
        }
    }

    /// Create error context with file and line information
    pub fn with_location(component: &str, operation: &str, file: &'static str, line: u32) -> Self {
        let mut context = Self::new(component, operation);
        context.file = Some(file);
        context.line = Some(line);
        context
    }

    /// Add additional information to the context
    pub fn add_info<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.additional_info.insert(key.into(), value.into());
        self
    }

    /// Add to the error chain
    pub fn add_to_chain(mut self, error: &str) -> Self {
        self.chain.push(error.to_string());
        self
    }

    fn current_thread_id() -> Option<String> {
        std::thread::current().name().map(|s| s.to_string())
    }
}

/// Build an [`ErrorContext`] tagged with the caller's file and line
#[macro_export]
macro_rules! error_context {
    ($component:expr, $operation:expr) => {
        $crate::error::ErrorContext::with_location($component, $operation, file!(), line!())
    };
}

impl AcqError {
    /// Context attached to any variant
    pub fn context(&self) -> &ErrorContext {
        match self {
            AcqError::Configuration { context, .. }
            | AcqError::Device { context, .. }
            | AcqError::InvalidData { context, .. }
            | AcqError::Worker { context, .. }
            | AcqError::System { context, .. } => context,
        }
    }

    /// Whether the failure happened before acquisition could start
    pub fn is_setup_failure(&self) -> bool {
        match self {
            AcqError::Configuration { .. } => true,
            AcqError::Device { error, .. } => error
                .downcast_ref::<DeviceError>()
                .is_some_and(|e| matches!(e, DeviceError::CapacityMismatch { .. })),
            _ => false,
        }
    }

    /// Wrap a device error raised during `operation`, tagged with the caller's location
    #[track_caller]
    pub fn device(device_type: DeviceType, err: DeviceError, operation: &str) -> Self {
        let caller = Location::caller();
        AcqError::Device {
            device_type,
            error: Arc::new(err),
            context: ErrorContext::with_location("device", operation, caller.file(), caller.line()),
        }
    }
}

impl fmt::Display for AcqError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcqError::Configuration { component, reason, context } => {
                write!(f, "[CONFIG] Configuration error in {}: {} ({})",
                       component, reason, context.operation)
            }
            AcqError::Device { device_type, error, context } => {
                write!(f, "[{}] Device error in {}: {} (at {}:{})",
                       device_type, context.operation, error,
                       context.file.unwrap_or("unknown"), context.line.unwrap_or(0))
            }
            AcqError::InvalidData { data_type, reason, expected, actual, context } => {
                match (expected, actual) {
                    (Some(exp), Some(act)) => write!(f, "[DATA] Invalid {}: {} (expected: {}, got: {}) ({})",
                                                     data_type, reason, exp, act, context.operation),
                    _ => write!(f, "[DATA] Invalid {}: {} ({})", data_type, reason, context.operation),
                }
            }
            AcqError::Worker { reason, context } => {
                write!(f, "[WORKER] Acquisition worker failed: {} ({})", reason, context.operation)
            }
            AcqError::System { subsystem, error_code, reason, context } => {
                match error_code {
                    Some(code) => write!(f, "[SYSTEM] {} error (code: {}): {} ({})",
                                         subsystem, code, reason, context.operation),
                    None => write!(f, "[SYSTEM] {} error: {} ({})", subsystem, reason, context.operation),
                }
            }
        }
    }
}

impl Error for AcqError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AcqError::Device { error, .. } => Some(error.as_ref()),
            _ => None,
        }
    }
}

/// Conversion from configuration errors
impl From<ConfigError> for AcqError {
    fn from(err: ConfigError) -> Self {
        AcqError::Configuration {
            component: "config".to_string(),
            reason: err.to_string(),
            context: error_context!("config", "load"),
        }
    }
}

/// Conversion from raw device errors of unknown origin
impl From<DeviceError> for AcqError {
    fn from(err: DeviceError) -> Self {
        AcqError::Device {
            device_type: DeviceType::Unknown("unspecified".to_string()),
            error: Arc::new(err),
            context: error_context!("device", "device_operation"),
        }
    }
}

/// Result type alias for acquisition operations
pub type AcqResult<T> = Result<T, AcqError>;

/// Error builder for convenient error construction
///
/// Extra `info` pairs and `chain` entries end up in the [`ErrorContext`], which
/// also records the location of the call that finishes the builder.
pub struct AcqErrorBuilder {
    component: String,
    operation: String,
    info: Vec<(String, String)>,
    chain: Vec<String>,
}

impl AcqErrorBuilder {
    pub fn new(component: &str, operation: &str) -> Self {
        Self {
            component: component.to_string(),
            operation: operation.to_string(),
            info: Vec::new(),
            chain: Vec::new(),
        }
    }

    /// Attach a key/value pair to the context
    pub fn info(mut self, key: &str, value: impl ToString) -> Self {
        self.info.push((key.to_string(), value.to_string()));
        self
    }

    /// Record an underlying cause
    pub fn chain(mut self, entry: &str) -> Self {
        self.chain.push(entry.to_string());
        self
    }

    #[track_caller]
    fn build_context(&mut self) -> ErrorContext {
        let caller = Location::caller();
        let context = ErrorContext::with_location(&self.component, &self.operation, caller.file(), caller.line());
        let context = self
            .info
            .drain(..)
            .fold(context, |context, (key, value)| context.add_info(key, value));
        self.chain
            .drain(..)
            .fold(context, |context, entry| context.add_to_chain(&entry))
    }

    #[track_caller]
    pub fn configuration(mut self, reason: &str) -> AcqError {
        let context = self.build_context();
        AcqError::Configuration {
            component: self.component,
            reason: reason.to_string(),
            context,
        }
    }

    #[track_caller]
    pub fn invalid_data(mut self, data_type: &str, reason: &str) -> AcqError {
        AcqError::InvalidData {
            data_type: data_type.to_string(),
            reason: reason.to_string(),
            expected: None,
            actual: None,
            context: self.build_context(),
        }
    }

    #[track_caller]
    pub fn mismatch(mut self, data_type: &str, expected: impl ToString, actual: impl ToString) -> AcqError {
        AcqError::InvalidData {
            data_type: data_type.to_string(),
            reason: "value mismatch".to_string(),
            expected: Some(expected.to_string()),
            actual: Some(actual.to_string()),
            context: self.build_context(),
        }
    }

    #[track_caller]
    pub fn worker(mut self, reason: &str) -> AcqError {
        AcqError::Worker {
            reason: reason.to_string(),
            context: self.build_context(),
        }
    }
}

/// Convenience trait for error building
pub trait IntoAcqError<T> {
    fn acq_err(self, component: &str, operation: &str) -> AcqResult<T>;
}

impl<T, E> IntoAcqError<T> for Result<T, E>
where
    E: Error + Send + Sync + 'static,
{
    fn acq_err(self, component: &str, operation: &str) -> AcqResult<T> {
        self.map_err(|err| AcqError::System {
            subsystem: component.to_string(),
            error_code: None,
            reason: err.to_string(),
            context: ErrorContext::new(component, operation),
        })
    }
}
