//! Face enrollment capture pipeline: camera, snapshot, face descriptors, and
//! submission to an enrollment service.

pub mod capture {
    pub mod domain {
        pub mod camera;
        pub mod capture_source;
        pub mod snapshot;
    }
    pub mod infrastructure;
}

pub mod detection {
    pub mod domain {
        pub mod descriptor_extractor;
        pub mod face_detector;
        pub mod face_landmarks;
        pub mod landmark_detector;
    }
    pub mod infrastructure;
}

pub mod enrollment {
    pub mod domain {
        pub mod enrollment_api;
        pub mod enrollment_request;
        pub mod enrollment_session;
        pub mod face_descriptor;
    }
    pub mod infrastructure;
}

pub mod models {
    pub mod domain {
        pub mod model_loader;
        pub mod model_ports;
        pub mod model_state;
    }
    pub mod infrastructure;
}

pub mod pipeline {
    pub mod enrollment_submitter;
    pub mod enrollment_workflow;
    pub mod face_extractor;
    pub mod frame_snapshotter;
    pub mod pipeline_logger;
    #[cfg(test)]
    mod test_doubles;
}

pub mod shared {
    pub mod constants;
    pub mod data_url;
    pub mod frame;
}
