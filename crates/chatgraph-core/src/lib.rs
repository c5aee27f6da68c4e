pub mod id;
pub mod record;
pub mod remote;
pub mod signal;
pub mod team;

// Re-export commonly used types
pub use id::{ChannelId, EdgeKey, RemoteId, UserId};
pub use record::{ChannelRecord, UserRecord};
pub use remote::{GraphDump, RemoteEdge, RemoteGraph, RemoteNode};
pub use signal::{Confirmation, NodeProperties, NodeType, PrevProperties, Relation, Signal};
pub use team::{MembershipEvent, MessageEvent, TeamChannel, TeamUser, UserProfile};
