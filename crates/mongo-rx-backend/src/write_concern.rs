//! Mapping from [`WriteOption`] to driver write concerns

use mongo_rx_core::WriteOption;
use mongodb::options::{Acknowledgment, WriteConcern};

/// Translate a write option into the driver's write concern
///
/// `Fsynced` has no separate meaning in current servers and is treated as
/// `Journaled`.
pub fn write_concern(write_option: WriteOption) -> WriteConcern {
	match write_option {
		WriteOption::Acknowledged => WriteConcern::builder().w(Acknowledgment::Nodes(1)).build(),
		WriteOption::Unacknowledged => WriteConcern::builder().w(Acknowledgment::Nodes(0)).build(),
		WriteOption::Fsynced | WriteOption::Journaled => WriteConcern::builder()
			.w(Acknowledgment::Nodes(1))
			.journal(true)
			.build(),
		WriteOption::ReplicaAcknowledged => {
			WriteConcern::builder().w(Acknowledgment::Nodes(2)).build()
		}
		WriteOption::Majority => WriteConcern::builder().w(Acknowledgment::Majority).build(),
	}
}
