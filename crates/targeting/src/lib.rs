//! Audience targeting for interventions.
//!
//! Filters the agent population through sparse AND criteria sets and
//! scores how specifically each audience was selected. Ships the
//! standing segments used by intervention campaigns.

pub mod audience;
pub mod criteria;

pub use audience::{
    estimate_audience, find_audience, predefined_segment, predefined_segments, AudienceMember,
    AudienceReport, PredefinedSegment, DEFAULT_AUDIENCE_LIMIT,
};
pub use criteria::CriteriaSet;
