//! Job scheduling and processing: turns scheduled monitoring jobs into
//! stored posts, analysis alerts and gamification events.

pub mod processor;
pub mod scheduler;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use processor::{
    AnalysisSummary, CycleSummary, JobError, JobProcessor, PipelineStores, ProcessSummary,
    ProcessorConfig, DEFAULT_JOB_TIMEOUT,
};
pub use scheduler::{
    calculate_next_run, MonitoringRequest, MonitoringScheduler, MonitoringUpdate,
    SchedulerError, UpdateSummary, DEFAULT_RESULT_RETENTION_DAYS,
};
pub use store::{
    AlertStore, CompetitorDirectory, DueJobs, JobPatch, JobStore, PgStore, PostStore, StoreError,
};
