use nix::unistd::{self, Uid, User};
use thiserror::Error;

/// Who is submitting, from the calling process's point of view. Read once
/// at startup and injected into the compiler, never queried from inside it.
#[derive(Clone, Debug)]
pub struct Identity {
    pub user: String,
    pub hostname: String,
}

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("failed to look up the calling user: {0}")]
    User(nix::Error),
    #[error("uid {0} has no passwd entry")]
    UnknownUid(Uid),
    #[error("failed to retrieve hostname: {0}")]
    Hostname(nix::Error),
}

pub fn current() -> Result<Identity, IdentityError> {
    let uid = Uid::current();
    let user = User::from_uid(uid)
        .map_err(IdentityError::User)?
        .ok_or(IdentityError::UnknownUid(uid))?;
    let hostname = unistd::gethostname().map_err(IdentityError::Hostname)?;

    Ok(Identity {
        user: user.name,
        hostname: hostname.to_string_lossy().into_owned(),
    })
}
