pub mod cascade;
pub mod model_resolver;
pub mod onnx_network;
pub mod pcn_detector;
pub mod tensor;
pub mod tracker;
