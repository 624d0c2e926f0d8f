pub mod fibos_rpc;

pub use fibos_rpc::{ChainInfo, FibosRpcClient, Tapos};
