pub mod frame_pipeline;
pub mod pipeline_logger;
