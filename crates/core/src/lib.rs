pub mod analysis {
    pub mod domain {
        pub mod analyzer;
        pub mod analyzer_result;
    }
    pub mod infrastructure;
}

pub mod pipeline {
    pub mod analyzer_executor;
    pub mod detection_logger;
    pub mod detector;
    pub mod infrastructure {
        pub mod inline_analyzer_executor;
        pub mod threaded_analyzer_executor;
    }
}

pub mod scoring {
    pub mod domain {
        pub mod anomaly_collector;
        pub mod verdict_calculator;
    }
}

pub mod shared {
    pub mod constants;
    pub mod detection_result;
    pub mod detector_config;
    pub mod frame;
    pub mod video_metadata;
}

pub mod video {
    pub mod domain {
        pub mod frame_batcher;
        pub mod frame_source;
    }
    pub mod infrastructure {
        pub mod ffmpeg_frame_source;
        pub mod image_frame_source;
    }
}
