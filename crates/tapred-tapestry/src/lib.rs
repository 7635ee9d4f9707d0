pub mod client;
pub mod error;
pub mod types;

pub use client::{ProfileLookup, TapestryClient};
pub use error::TapestryError;
pub use types::{
    Comment, Content, ContentCounts, ContentProperty, CreateCommentRequest, CreateContentRequest,
    CreateProfileRequest, FeedItem, Profile, ProfileItem, SocialCounts, UpdateProfileRequest,
    Wallet,
};
