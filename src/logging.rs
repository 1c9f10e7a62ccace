use std::fmt;

/// Structured logger scoped to one role-management statement.
///
/// Every event carries the acting role and the target role, so the
/// history of a whitelist can be reconstructed from the logs.
///
/// `StatementLog` only borrows the names and cannot outlive the statement
/// that created it.
#[derive(Debug, Clone, Copy)]
pub struct StatementLog<'a> {
    actor: &'a str,
    target: &'a str,
}

impl<'a> StatementLog<'a> {
    /// Creates a logger for a statement issued by `actor` against `target`.
    pub fn new(actor: &'a str, target: &'a str) -> Self {
        Self { actor, target }
    }

    /// Logs an info-level message.
    ///
    /// ```
    /// # use audit_whitelist::StatementLog;
    /// let log = StatementLog::new("super_user", "temporary_user");
    /// log.info(format_args!("granted {} on {}", "SELECT", "data"));
    /// ```
    pub fn info(&self, args: fmt::Arguments<'_>) {
        tracing::info!(
            target: "audit_whitelist",
            actor = %self.actor,
            grantee = %self.target,
            "{}",
            args
        );
    }

    /// Logs a warning-level message.
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        tracing::warn!(
            target: "audit_whitelist",
            actor = %self.actor,
            grantee = %self.target,
            "{}",
            args
        );
    }

    /// Logs a debug-level message.
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        tracing::debug!(
            target: "audit_whitelist",
            actor = %self.actor,
            grantee = %self.target,
            "{}",
            args
        );
    }
}
