// Macros file - tracing macros are imported within the macro definitions

/// Standardized logging macros so every module emits the same field names:
/// `operation`, `handle`, `provider`, `key_slot`, `duration_ms`.
///
/// API keys are never logged; providers log the rotator slot instead.

// ============================================================================
// API Operation Logging Macros
// ============================================================================

/// Log the start of an API operation
#[macro_export]
macro_rules! log_api_start {
    ($operation:expr, handle = $handle:expr) => {
        tracing::debug!(
            operation = $operation,
            handle = %$handle,
            "API operation started"
        );
    };
    ($operation:expr) => {
        tracing::debug!(
            operation = $operation,
            "API operation started"
        );
    };
}

/// Log successful completion of an API operation
#[macro_export]
macro_rules! log_api_success {
    ($operation:expr, handle = $handle:expr, $msg:expr) => {
        tracing::info!(
            operation = $operation,
            handle = %$handle,
            "API operation completed: {}", $msg
        );
    };
    ($operation:expr, count = $count:expr, $msg:expr) => {
        tracing::info!(
            operation = $operation,
            count = $count,
            "API operation completed: {}", $msg
        );
    };
    ($operation:expr, $msg:expr) => {
        tracing::info!(
            operation = $operation,
            "API operation completed: {}", $msg
        );
    };
}

/// Log API warnings with context
#[macro_export]
macro_rules! log_api_warn {
    ($operation:expr, handle = $handle:expr, error = $error:expr, $msg:expr) => {
        tracing::warn!(
            operation = $operation,
            handle = %$handle,
            error = %$error,
            "API operation warning: {}", $msg
        );
    };
    ($operation:expr, $msg:expr) => {
        tracing::warn!(
            operation = $operation,
            "API operation warning: {}", $msg
        );
    };
}

// ============================================================================
// Service Layer Logging Macros
// ============================================================================

#[macro_export]
macro_rules! log_service_start {
    ($service:expr, $operation:expr, count = $count:expr) => {
        tracing::info!(
            service = $service,
            operation = $operation,
            count = $count,
            "Service operation started"
        );
    };
    ($service:expr, $operation:expr) => {
        tracing::info!(
            service = $service,
            operation = $operation,
            "Service operation started"
        );
    };
}

#[macro_export]
macro_rules! log_service_success {
    ($service:expr, $operation:expr, count = $count:expr, duration_ms = $duration:expr) => {
        tracing::info!(
            service = $service,
            operation = $operation,
            count = $count,
            duration_ms = $duration,
            "Service operation completed successfully"
        );
    };
    ($service:expr, $operation:expr, $msg:expr) => {
        tracing::info!(
            service = $service,
            operation = $operation,
            "Service operation completed: {}", $msg
        );
    };
}

#[macro_export]
macro_rules! log_service_error {
    ($service:expr, $operation:expr, error = $error:expr) => {
        tracing::error!(
            service = $service,
            operation = $operation,
            error = %$error,
            "Service operation failed"
        );
    };
}

#[macro_export]
macro_rules! log_service_warn {
    ($service:expr, $operation:expr, $msg:expr) => {
        tracing::warn!(
            service = $service,
            operation = $operation,
            "Service warning: {}",
            $msg
        );
    };
}

// ============================================================================
// Document Storage Logging Macros
// ============================================================================

#[macro_export]
macro_rules! log_storage_operation {
    (debug, $operation:expr, handle = $handle:expr, bytes = $bytes:expr) => {
        tracing::debug!(
            component = "document_store",
            operation = $operation,
            handle = %$handle,
            bytes = $bytes,
            "Storage operation completed"
        );
    };
    (info, $operation:expr, handle = $handle:expr, $msg:expr) => {
        tracing::info!(
            component = "document_store",
            operation = $operation,
            handle = %$handle,
            "Storage operation: {}", $msg
        );
    };
    (error, $operation:expr, handle = $handle:expr, error = $error:expr) => {
        tracing::error!(
            component = "document_store",
            operation = $operation,
            handle = %$handle,
            error = %$error,
            "Storage operation failed"
        );
    };
}

// ============================================================================
// LLM Provider Logging Macros
// ============================================================================

#[macro_export]
macro_rules! log_llm_operation {
    (start, $operation:expr, provider = $provider:expr, key_slot = $slot:expr) => {
        tracing::info!(
            component = "llm_providers",
            operation = $operation,
            provider = %$provider,
            key_slot = $slot,
            "LLM operation started"
        );
    };
    (success, $operation:expr, provider = $provider:expr, duration_ms = $duration:expr, response_length = $len:expr) => {
        tracing::info!(
            component = "llm_providers",
            operation = $operation,
            provider = %$provider,
            duration_ms = $duration,
            response_length = $len,
            "LLM operation completed successfully"
        );
    };
}

// ============================================================================
// System Event Logging Macros
// ============================================================================

#[macro_export]
macro_rules! log_system_event {
    (startup, component = $component:expr, $msg:expr) => {
        tracing::info!(
            event_type = "startup",
            component = $component,
            "System event: {}",
            $msg
        );
    };
    (config, $msg:expr) => {
        tracing::info!(event_type = "configuration", "System event: {}", $msg);
    };
}

#[macro_export]
macro_rules! log_validation {
    (success, $component:expr, $msg:expr) => {
        tracing::debug!(
            event_type = "validation",
            component = $component,
            result = "success",
            "Validation completed: {}", $msg
        );
    };
    (failure, $component:expr, error = $error:expr) => {
        tracing::warn!(
            event_type = "validation",
            component = $component,
            result = "failure",
            error = %$error,
            "Validation failed"
        );
    };
}
