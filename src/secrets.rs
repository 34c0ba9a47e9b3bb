use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::Rng;
use rand::distr::Alphanumeric;

/// Length of generated database and Redis passwords.
pub const PASSWORD_LENGTH: usize = 32;

/// Random bytes behind the JWT secret before base64 encoding.
pub const JWT_SECRET_BYTES: usize = 64;

/// Credentials generated once per install and written into the
/// environment file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Secrets {
    pub postgres_password: String,
    pub redis_password: String,
    pub jwt_secret: String,
}

impl Secrets {
    /// Generate fresh random secrets.
    ///
    /// Passwords are alphanumeric so they can be embedded in
    /// `postgresql://` and `redis://` URLs without escaping.
    #[must_use]
    pub fn generate() -> Self {
        Self {
            postgres_password: random_password(PASSWORD_LENGTH),
            redis_password: random_password(PASSWORD_LENGTH),
            jwt_secret: random_base64(JWT_SECRET_BYTES),
        }
    }

    /// Stand-in values for previews that must not leak or persist
    /// real credentials.
    #[must_use]
    pub fn placeholder() -> Self {
        Self {
            postgres_password: "<generated>".to_string(),
            redis_password: "<generated>".to_string(),
            jwt_secret: "<generated>".to_string(),
        }
    }
}

/// `len` random alphanumeric characters.
#[must_use]
pub fn random_password(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// `bytes` random bytes, standard base64 with padding.
#[must_use]
pub fn random_base64(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::rng().fill(buf.as_mut_slice());
    STANDARD.encode(buf)
}
