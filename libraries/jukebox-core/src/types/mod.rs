mod destination;
mod ids;
mod media;

pub use destination::{Destination, Requester};
pub use ids::{DestinationId, EntryId, RequesterId};
pub use media::{MediaDescriptor, StreamHandle};
