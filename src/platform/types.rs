use crate::error::WakefulError;

/// Identifies one acquisition attempt and the handle it produced.
pub type Ticket = u64;

/// A live grant from the platform. Dropping it without `release` is allowed;
/// implementations give the grant back on drop.
pub trait LockHandle {
    fn release(&mut self) -> Result<(), WakefulError>;

    /// True once the platform revoked the grant on its own (or after `release`).
    fn is_released(&self) -> bool;
}

pub enum Acquisition {
    Granted(Box<dyn LockHandle>),
    Denied(WakefulError),
    /// Completion arrives later through `WakeLockResource::complete_acquisition`.
    Pending,
}

pub trait WakeLockProvider {
    fn name(&self) -> &'static str;
    fn supported(&self) -> bool;
    fn acquire(&mut self, ticket: Ticket) -> Acquisition;
}
