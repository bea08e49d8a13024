pub mod model;
pub mod provisioner;
pub mod store;

pub use model::Group;
pub use provisioner::ChatGroupProvisioner;
pub use store::GroupStore;
