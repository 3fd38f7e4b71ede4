pub mod http_enrollment_api;
