//! Logging service

use crate::models::{LogLevel, RequestId, RequestStatus, UserId};

/// Initialize logging with the specified level
pub fn init_logging(level: LogLevel) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = match level {
        LogLevel::Error => "checkflow=error,checkflow_core=error",
        LogLevel::Warn => "checkflow=warn,checkflow_core=warn",
        LogLevel::Info => "checkflow=info,checkflow_core=info",
        LogLevel::Debug => "checkflow=debug,checkflow_core=debug",
        LogLevel::Trace => "checkflow=trace,checkflow_core=trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()?;

    Ok(())
}

/// Log a request state transition
pub fn log_transition(
    request: RequestId,
    actor: UserId,
    from: RequestStatus,
    to: RequestStatus,
) {
    tracing::info!(
        request = %request,
        actor = %actor,
        from = %from,
        to = %to,
        "Request transition"
    );
}

/// Log a security event (always logged regardless of level)
pub fn log_security_event(event_type: &str, actor: Option<UserId>, details: &str) {
    tracing::warn!(
        event_type = event_type,
        actor = %actor.map(|a| a.to_string()).unwrap_or_else(|| "unknown".to_string()),
        details = details,
        "Security event"
    );
}

/// Log an administrative change to users, roles or units
pub fn log_admin_action(action: &str, actor: UserId, target: &str) {
    tracing::info!(
        action = action,
        actor = %actor,
        target = target,
        "Administrative change"
    );
}
