//! Visitor analytics: tracking payloads, report rows and the pure
//! aggregation steps the reports are built from.

mod functions;
mod traits;
mod types;

pub use functions::{
    bucket_durations, engagement_milestones, utm_performance, visitor_split,
    TIME_ON_PAGE_BUCKETS,
};
pub use traits::AnalyticsRepository;
pub use types::{
    BrowserCount, DeviceCount, EngagementMilestone, HeatmapPoint, MetadataCount, NewEvent,
    NewHeatmapPoint, NewPageview, NewVisitorSession, PathViews, Summary, TimeOnPageBucket,
    UtmPerformance, VisitorSession, VisitorSplit, EVENT_RETURNING_VISITOR, EVENT_TIME_MILESTONE,
    EVENT_UTM_TRACKING,
};
