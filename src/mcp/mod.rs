// JSON-RPC plumbing and the Polkadot tools it exposes
pub mod handler;
pub mod protocol;
pub mod tools;
