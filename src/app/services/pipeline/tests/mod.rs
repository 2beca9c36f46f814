//! Tests for the pipeline driver and partitioned workers


use crate::app::services::aggregate_store::AggregateStore;
use crate::app::services::average_publisher::{AveragePublisher, MemoryGauges, MemorySink};
use crate::app::services::pipeline::Pipeline;
use std::sync::Arc;

/// Pipeline wired to in-memory side effects
pub struct TestPipeline {
    pub pipeline: Arc<Pipeline>,
    pub sink: Arc<MemorySink>,
    pub gauges: Arc<MemoryGauges>,
}

pub fn create_test_pipeline(threshold: f64) -> TestPipeline {
    let sink = Arc::new(MemorySink::new());
    let gauges = Arc::new(MemoryGauges::new());
    let publisher = AveragePublisher::new(sink.clone(), gauges.clone());
    let pipeline = Pipeline::new(
        threshold,
        Arc::new(AggregateStore::in_memory()),
        Arc::new(publisher),
    );

    TestPipeline {
        pipeline: Arc::new(pipeline),
        sink,
        gauges,
    }
}
