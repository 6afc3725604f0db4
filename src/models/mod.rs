pub mod campaign;
pub mod contact;
pub mod email_record;

pub use campaign::Campaign;
pub use contact::Contact;
pub use email_record::{EmailRecord, TrackingDetail};
