pub mod balance;
pub mod instrument;
pub mod notification;
pub mod outcome;
pub mod simulation;

pub use balance::TokenBalanceResult;
pub use instrument::{Instrument, RawCatalog, RawPool, RawTranche};
pub use notification::{DeliveryReceipt, Notification};
pub use outcome::{TrancheEvaluationResult, TrancheStatus, UserDispatchOutcome};
pub use simulation::{NetworkId, SimulationOptions};
