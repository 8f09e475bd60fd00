// # Record Source Implementations
//
// In-crate implementations of the RecordSource trait. File-backed sources
// live in their own crates (see `dnsrec-source-yaml`).

pub mod memory;

pub use memory::MemoryRecordSource;
