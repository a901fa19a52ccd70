pub mod web_rpc;

pub use web_rpc::WebRpcPlugin;
