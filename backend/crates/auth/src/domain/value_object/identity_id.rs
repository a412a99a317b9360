use kernel::id::Id;

pub struct IdentityMarker;
pub type IdentityId = Id<IdentityMarker>;

pub struct VerificationMarker;
pub type VerificationId = Id<VerificationMarker>;
