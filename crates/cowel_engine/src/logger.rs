//! Logger implementations beyond the in-memory collector.

use cowel_base::{Diagnostic, Logger, Severity};

/// Discards every diagnostic. The default service.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLogger;

impl Logger for NoLogger {
    fn min_severity(&self) -> Severity {
        Severity::None
    }

    fn log(&mut self, _diagnostic: Diagnostic) {}
}

/// Forwards diagnostics to the `log` crate facade, so embedders that
/// already run `env_logger` (or any other backend) see cowel
/// diagnostics alongside their own.
#[derive(Debug, Clone, Copy)]
pub struct FacadeLogger {
    min_severity: Severity,
}

impl FacadeLogger {
    pub fn new(min_severity: Severity) -> Self {
        Self { min_severity }
    }
}

impl Logger for FacadeLogger {
    fn min_severity(&self) -> Severity {
        self.min_severity
    }

    fn log(&mut self, diagnostic: Diagnostic) {
        let level = match diagnostic.severity {
            Severity::Trace => log::Level::Trace,
            Severity::Debug => log::Level::Debug,
            Severity::Info | Severity::SoftWarning => log::Level::Info,
            Severity::Warning => log::Level::Warn,
            Severity::Error | Severity::Fatal => log::Level::Error,
            Severity::None => return,
        };
        log::log!(
            level,
            "[{}] {}:{}: {}",
            diagnostic.id,
            diagnostic.location.span.begin.line + 1,
            diagnostic.location.span.begin.column + 1,
            diagnostic.message
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cowel_base::diag::ids;
    use cowel_base::FileSpan;

    #[test]
    fn no_logger_accepts_nothing() {
        let mut logger = NoLogger;
        assert_eq!(logger.min_severity(), Severity::None);
        logger.log(Diagnostic {
            severity: Severity::Error,
            id: ids::TYPE_MISMATCH,
            location: FileSpan::default(),
            message: "dropped".into(),
        });
    }

    #[test]
    fn facade_logger_forwards_without_panicking() {
        let mut logger = FacadeLogger::new(Severity::Warning);
        assert_eq!(logger.min_severity(), Severity::Warning);
        logger.log(Diagnostic {
            severity: Severity::Error,
            id: ids::TYPE_MISMATCH,
            location: FileSpan::default(),
            message: "forwarded to the log facade".into(),
        });
    }
}
