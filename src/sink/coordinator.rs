use super::SinkError;

/// Sink-wide synchronization authority.
///
/// A coordinator is either idle or writing. [`Coordinator::writing`] starts a
/// batch, [`Coordinator::sync`] ends it and marks a synchronization point at
/// which every stream of the sink is consistent and deliverable.
pub trait Coordinator: Send {
    fn writing(&mut self) -> Result<(), SinkError>;

    fn sync(&mut self) -> Result<(), SinkError>;

    /// Fails if [`Coordinator::sync`] would be rejected in the current state.
    /// The sink calls this before touching any stream.
    fn check_sync(&self) -> Result<(), SinkError> {
        Ok(())
    }

    /// Ends the current batch and starts the next.
    fn intermediate(&mut self) -> Result<(), SinkError> {
        self.sync()?;
        self.writing()
    }
}

/// Coordinator for sinks with no synchronization requirements.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCoordinator;

impl Coordinator for NoopCoordinator {
    fn writing(&mut self) -> Result<(), SinkError> {
        Ok(())
    }

    fn sync(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Idle/writing state machine shared by coordinators that enforce alternation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorState {
    writing: bool,
}

impl CoordinatorState {
    pub fn is_writing(&self) -> bool {
        self.writing
    }

    /// Idle -> writing.
    pub fn begin(&mut self) -> Result<(), SinkError> {
        if self.writing {
            return Err(SinkError::AlreadyWriting);
        }
        self.writing = true;
        Ok(())
    }

    /// Writing -> idle.
    pub fn end(&mut self) -> Result<(), SinkError> {
        self.ensure_writing("sync")?;
        self.writing = false;
        Ok(())
    }

    pub fn ensure_writing(&self, op: &'static str) -> Result<(), SinkError> {
        if self.writing {
            Ok(())
        } else {
            Err(SinkError::NotWriting { op })
        }
    }
}
