//! Plain data types for the projection engine: accounts and their
//! declarative schedules, the materialized event/segment types, and the
//! stable output wire type.

mod account;
mod activity;
mod bill;
mod consolidated_activity;
mod event;
mod ids;
mod interest;
mod retirement_record;
mod rmd;
mod segment;
mod spending;
mod variables;

pub use account::{Account, AccountType};
pub use activity::{Activity, AmountSpec, DateSpec, SymbolicAmount};
pub use bill::{Bill, MAX_GENERATOR_OCCURRENCES, apply_ceiling};
pub use consolidated_activity::ConsolidatedActivity;
pub use event::{EventPayload, EventType, TimelineEvent};
pub use ids::{
    AccountId, ActivityId, BillId, CategoryId, EventId, InterestId, PensionId, SegmentId,
    SocialSecurityId,
};
pub use interest::Interest;
pub use retirement_record::{
    AverageWageIndex, BendPointTable, Pension, ReductionRateTable, ServiceRequirement,
    SocialSecurity,
};
pub use rmd::{RmdTable, RmdTableEntry};
pub use segment::{Segment, compute_cache_key, epoch_millis};
pub use spending::{SpendingCategory, SpendingTrackerCategoryState, ThresholdChange};
pub use variables::{AmountOrDate, SimulationId};
