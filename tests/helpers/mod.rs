// Test helpers shared by the integration and unit test targets.
//
// Usage:
//   #[path = "../helpers/mod.rs"]
//   mod helpers;
//
//   let transport = MockTransport::new();
//   transport.push_ok(json!({ "result": 100, "trackId": 1 }));
//   let gateway = ZibalGateway::with_transport(config, shared(&transport));

#![allow(dead_code)]

pub mod mock_transport;
pub mod test_data;

pub use mock_transport::*;
pub use test_data::*;
