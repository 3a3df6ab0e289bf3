pub mod api;
pub mod capture;
pub mod flow;

pub use api::client::ApiClient;
pub use api::confirm::UploadConfirm;
pub use capture::controller::VideoCapture;
pub use capture::document::DocumentMultiFrame;
pub use capture::face::FaceVideo;
pub use capture::types::{CaptureError, CapturePayload, SdkMetadata};
pub use flow::options::FlowOptions;
pub use flow::router::FlowRouter;
