pub(crate) mod answers;
pub(crate) mod attempts;
pub(crate) mod behavior_profiles;
pub(crate) mod catalog;
pub(crate) mod reports;
pub(crate) mod sessions;
pub(crate) mod users;
