pub mod fault_injection;
pub mod fixtures;

pub use fault_injection::{FaultStats, FaultType, FaultyTransport};
pub use fixtures::{
    init_test_logging, leader_check, page, page_of_ids, RecordBuilder, RAW_VALID_RECORD,
};
