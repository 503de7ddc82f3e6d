pub mod infrastructure;
pub mod monitor_engagement_use_case;
pub mod pipeline_logger;
