//! The five-state result shared by every evaluation step.
//!
//! Every directive invocation, splice, and matcher returns a
//! [`ProcessingStatus`]. The states order by severity so that the most
//! severe of two statuses wins when combining results:
//!
//! - `Ok` — processing succeeded.
//! - `Brk` — an early non-error return (e.g. return from a macro).
//! - `Error` — a recoverable error; processing continues.
//! - `ErrorBrk` — a recoverable error combined with an early return.
//! - `Fatal` — unwinds to the generator; output is discarded.

/// The result of one evaluation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum ProcessingStatus {
    #[default]
    Ok,
    Brk,
    Error,
    ErrorBrk,
    Fatal,
}

impl ProcessingStatus {
    /// Returns the most severe of two statuses.
    pub fn max(self, other: ProcessingStatus) -> ProcessingStatus {
        Ord::max(self, other)
    }

    /// Returns `true` for `Error`, `ErrorBrk`, and `Fatal`.
    pub fn is_error(self) -> bool {
        matches!(
            self,
            ProcessingStatus::Error | ProcessingStatus::ErrorBrk | ProcessingStatus::Fatal
        )
    }

    /// Returns `true` for `Brk` and `ErrorBrk`.
    pub fn is_break(self) -> bool {
        matches!(self, ProcessingStatus::Brk | ProcessingStatus::ErrorBrk)
    }

    /// Returns `true` if processing may continue after this status.
    ///
    /// `Brk` is not an error but still stops the current sequence.
    pub fn is_continuable(self) -> bool {
        matches!(self, ProcessingStatus::Ok | ProcessingStatus::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_takes_most_severe() {
        use ProcessingStatus::*;
        assert_eq!(Ok.max(Error), Error);
        assert_eq!(Error.max(Brk), Error);
        assert_eq!(ErrorBrk.max(Fatal), Fatal);
        assert_eq!(Ok.max(Ok), Ok);
    }

    #[test]
    fn classification() {
        use ProcessingStatus::*;
        assert!(!Ok.is_error());
        assert!(!Brk.is_error());
        assert!(Error.is_error());
        assert!(ErrorBrk.is_error());
        assert!(Fatal.is_error());

        assert!(Brk.is_break());
        assert!(ErrorBrk.is_break());
        assert!(!Error.is_break());

        assert!(Ok.is_continuable());
        assert!(Error.is_continuable());
        assert!(!Fatal.is_continuable());
    }
}
